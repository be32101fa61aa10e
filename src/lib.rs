// Synthetic vital-signs generation and write pipeline
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{Result, VitalError};
