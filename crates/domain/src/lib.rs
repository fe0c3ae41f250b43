#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod completion;
mod error;
mod exercise;
mod gamification;
mod history;
mod live_session;
mod name;
mod profile;
mod schedule;
mod service;
mod step;

pub use completion::*;
pub use error::*;
pub use exercise::*;
pub use gamification::*;
pub use history::*;
pub use live_session::*;
pub use name::*;
pub use profile::*;
pub use schedule::*;
pub use service::*;
pub use step::*;
