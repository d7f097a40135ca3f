//! Speech synthesis engines.
//!
//! This module contains implementations of text-to-speech engines.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `kitten` - KittenTTS (ONNX format, espeak-ng required), enabled by default

#[cfg(feature = "kitten")]
pub mod kitten;
