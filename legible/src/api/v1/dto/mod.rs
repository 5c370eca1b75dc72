//! v1 API Data Transfer Objects.
//!
//! Wire types for the v1 REST API, kept separate from the service layer's
//! result types.

pub mod ocr;

pub use ocr::*;
