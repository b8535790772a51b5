//! Timestamped log output over the brain's serial console.

use core::time::Duration;

use log::{set_logger, set_max_level, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use vexide::io::println;

const RESET: &str = "\x1B[0m";

fn colour(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1B[31m",
        Level::Warn => "\x1B[33m",
        Level::Info => "\x1B[34m",
        Level::Debug => "\x1B[36m",
        Level::Trace => "\x1B[37m",
    }
}

/// Prints every record at or above `level` with the time since boot and its module.
///
/// # Examples
/// ```ignore
/// static LOGGER: SerialLogger = SerialLogger::new(LevelFilter::Info);
/// LOGGER.init().ok();
/// ```
pub struct SerialLogger {
    level: LevelFilter,
}

impl SerialLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    pub fn init(&'static self) -> Result<(), SetLoggerError> {
        set_logger(self)?;
        set_max_level(self.level);
        Ok(())
    }
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let uptime = Duration::from_micros(unsafe { vex_sdk::vexSystemHighResTimeGet() });
        println!(
            "{:02}:{:02}.{:03} {}{:<5}{} {}: {}",
            uptime.as_secs() / 60,
            uptime.as_secs() % 60,
            uptime.subsec_millis(),
            colour(record.level()),
            record.level(),
            RESET,
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}
