#![warn(clippy::pedantic)]

pub mod clock;
pub mod log;
pub mod runner;
mod service;
mod settings;

pub use service::Service;
pub use settings::*;
