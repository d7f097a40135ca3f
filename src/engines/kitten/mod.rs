//! KittenTTS text-to-speech engine implementation.
//!
//! This module runs the KittenTTS ONNX models (15M parameters, 24 kHz mono
//! output) with espeak-ng for phonemization. Models are fetched from the
//! Hugging Face Hub or loaded from a local directory.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed on your system:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Model Directory Layout
//!
//! ```text
//! models/kitten-tts-nano-0.1/
//! ├── config.json                  # {"type": "ONNX1", "model_file": ..., "voices": ...}
//! ├── kitten_tts_nano_v0_1.onnx    # Inference graph
//! └── voices.npz                   # Style vectors, one .npy entry per voice
//! ```
//!
//! # Voices
//!
//! | Voice | Gender |
//! |---|---|
//! | `expr-voice-2-m`, `expr-voice-3-m`, `expr-voice-4-m`, `expr-voice-5-m` | male |
//! | `expr-voice-2-f`, `expr-voice-3-f`, `expr-voice-4-f`, `expr-voice-5-f` | female |
//!
//! # Examples
//!
//! ## From the Hub
//!
//! ```rust,no_run
//! use kitten_tts::engines::kitten::KittenTts;
//!
//! let mut tts = KittenTts::new("kitten-tts-nano-0.1", None)?;
//! let audio = tts.generate("Hello, world!", "expr-voice-2-f", 1.0)?;
//! println!("Generated {} samples", audio.len());
//! # Ok::<(), kitten_tts::engines::kitten::KittenError>(())
//! ```
//!
//! ## From a Local Directory
//!
//! ```rust,no_run
//! use kitten_tts::{SynthesisEngine, engines::kitten::{KittenEngine, KittenInferenceParams}};
//! use std::path::PathBuf;
//!
//! let mut engine = KittenEngine::new();
//! engine.load_model(&PathBuf::from("models/kitten-tts-nano-0.1"))?;
//!
//! let params = KittenInferenceParams {
//!     voice: "expr-voice-3-f".to_string(),
//!     speed: 0.9,
//! };
//!
//! engine.synthesize_to_file("Hello from voice three!", &PathBuf::from("out.wav"), Some(params))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod download;
pub mod engine;
pub mod model;
pub mod phonemizer;
pub mod tts;
pub mod vocab;
pub mod voices;

pub use download::{ModelConfig, ModelRegistry, DEFAULT_MODEL};
pub use engine::{
    KittenEngine, KittenInferenceParams, KittenInferenceParamsBuilder, KittenModelParams,
    DEFAULT_SPEED, DEFAULT_VOICE,
};
pub use model::{KittenError, KittenModel, SAMPLE_RATE};
pub use tts::KittenTts;
pub use voices::AVAILABLE_VOICES;
