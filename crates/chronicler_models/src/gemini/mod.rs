//! Google Gemini REST driver.
//!
//! Talks to the `generateContent` and `batchEmbedContents` endpoints with
//! `reqwest`, mapping HTTP failures onto [`GenerationErrorKind`] so the
//! generation client can tell transient failures from permanent ones.
//!
//! [`GenerationErrorKind`]: chronicler_error::GenerationErrorKind

mod client;
mod conversion;
mod dto;

pub use client::GeminiDriver;
