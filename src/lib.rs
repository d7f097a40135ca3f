//! # kitten-tts
//!
//! A Rust client for the KittenTTS ultra-lightweight text-to-speech models.
//!
//! ## Features
//!
//! - **KittenTTS**: 15M-parameter ONNX models with eight expressive voices
//! - **Hub Download**: Fetch and cache models from the Hugging Face Hub
//! - **Local Loading**: Load a model directory without network access
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! kitten-tts = "0.1"
//! ```
//!
//! ```ignore
//! use kitten_tts::engines::kitten::KittenTts;
//!
//! let mut tts = KittenTts::from_pretrained()?;
//! let samples = tts.generate("Hello, world!", "expr-voice-5-m", 1.0)?;
//! tts.generate_to_file("Hello, world!", "output.wav".as_ref(), "expr-voice-5-m", 1.0, 24000)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engines;

use std::path::Path;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio (24000 for KittenTTS)
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a mono 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// Each engine may have different parameter types for model loading and inference configuration.
pub trait SynthesisEngine {
    /// Parameters for configuring inference behavior (voice, speed, etc.)
    type SynthesisParams;
    /// Parameters for configuring model loading (threads, etc.)
    type ModelParams: Default;

    /// Load a model from the specified path using default parameters.
    fn load_model(&mut self, model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.load_model_with_params(model_path, Self::ModelParams::default())
    }

    /// Load a model from the specified path with custom parameters.
    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>>;

    /// Synthesize speech from the given text and write to a WAV file.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        wav_path: &Path,
        params: Option<Self::SynthesisParams>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.synthesize(text, params)?.write_wav(wav_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SynthesisResult;

    #[test]
    fn wav_header_matches_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let result = SynthesisResult {
            samples: vec![0.0, 0.25, -0.5, 1.0],
            sample_rate: 22050,
        };

        result.write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 32);
        let samples: Vec<f32> = reader.samples::<f32>().map(Result::unwrap).collect();
        assert_eq!(samples, result.samples);
    }

    #[test]
    fn duration_uses_sample_rate() {
        let result = SynthesisResult {
            samples: vec![0.0; 12000],
            sample_rate: 24000,
        };
        assert_eq!(result.duration_secs(), 0.5);
    }
}
