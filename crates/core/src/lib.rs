#![forbid(unsafe_code)]

pub mod analytics;
pub mod error;
pub mod generated_quiz;
pub mod model;
pub mod progress;
pub mod time;

pub use error::Error;
pub use time::Clock;
