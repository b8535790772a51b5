#![no_std]
extern crate alloc;

pub mod controllers;
pub mod devices;
pub mod differential;
#[cfg(feature = "vexide")]
pub mod logger;
pub mod tracking;

#[macro_use]
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
