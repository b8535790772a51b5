//! Time, task and operating-mode services the control loop depends on.

use alloc::boxed::Box;
use core::{fmt::Debug, future::Future, pin::Pin, time::Duration};

/// A monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed epoch, usually boot.
    fn now(&self) -> Duration;
}

#[async_trait::async_trait(?Send)]
pub trait Delay: Clock {
    /// Suspends the calling task for at least `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Everything the chassis scheduler needs from the runtime it lives on.
pub trait Platform: Delay {
    /// The competition or operating state. Only equality is relied upon.
    type Mode: PartialEq + Copy + Debug + 'static;

    fn mode(&self) -> Self::Mode;

    /// Starts a detached task that runs for the life of the program.
    fn spawn(&self, future: Pin<Box<dyn Future<Output = ()>>>);
}
