pub mod catalog;
pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod time;

pub use error::{ExporterError, Result};
