//! # cds-model
//!
//! [`GenerativeModel`](cds_core::GenerativeModel) backends:
//!
//! - [`GeminiModel`] — Google Gemini over the `generateContent` REST endpoint
//! - [`MockModel`] — scripted responses for deterministic tests

pub mod gemini;
pub mod mock;

pub use gemini::GeminiModel;
pub use mock::MockModel;
