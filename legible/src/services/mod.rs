mod extraction;

pub use extraction::{validate_mime, CloudExtraction, Extraction, ExtractionService};
