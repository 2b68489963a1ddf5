mod routes;

pub mod app;
pub mod config;
pub mod error;
pub mod prediction;
pub mod server;
pub mod telemetry;
pub mod upload;

#[cfg(test)]
mod testing;

pub use app::start_app;
pub use routes::{CaptionBody, ErrorBody, FILE_FIELD, SESSION_HEADER};
