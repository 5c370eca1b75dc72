//! Photo-to-text extraction: an image preprocessing pipeline, local and
//! cloud recognition engines, and cleanup of the merged output.

pub mod api;
pub mod config;
pub mod error;
pub mod imaging;
pub mod ocr;
pub mod services;
pub mod text;

pub use error::{LegibleError, Result};
