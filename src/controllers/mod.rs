/// A stateful transform run once per control tick.
pub trait Controller<In, Out> {
    fn update(&mut self, input: In) -> Out;

    /// Clears all accumulated state so the next update behaves like the first.
    fn reset(&mut self);
}

pub mod pid;
pub mod vapid;
