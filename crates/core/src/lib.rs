#![forbid(unsafe_code)]

pub mod access;
pub mod format;
pub mod model;
pub mod navigation;
pub mod time;

pub use time::Clock;
