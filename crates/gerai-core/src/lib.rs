pub mod admin;
pub mod clock;
pub mod config;
pub mod error;
pub mod hours;
pub mod io;
pub mod notify;
pub mod registry;
pub mod render;
pub mod service;
pub mod status;
pub mod subscribers;
pub mod sweep;
pub mod voting;

pub use error::{GeraiError, Result};
pub use service::GeraiService;
