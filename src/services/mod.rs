//! Services backing the upload pipeline
//!
//! Validation and decoding are kept apart from orchestration so each step can
//! be tested on its own.

pub mod decoder;
pub mod validation;

pub use decoder::ImageDecoder;
pub use validation::FileValidator;
