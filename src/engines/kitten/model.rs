use std::path::Path;

use ndarray::{Array1, Array2, ArrayD};
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use crate::SynthesisResult;

use super::phonemizer::{normalize_phonemes, EspeakConfig, EspeakPhonemizer, Phonemizer};
use super::vocab::{SymbolTable, PAD_ID};
use super::voices::{validate_voice, VoiceStore, AVAILABLE_VOICES};

/// Output sample rate of the KittenTTS models.
pub const SAMPLE_RATE: u32 = 24000;

/// Samples dropped from the start of every raw waveform.
pub const TRIM_START_SAMPLES: usize = 5000;

/// Samples dropped from the end of every raw waveform.
pub const TRIM_END_SAMPLES: usize = 10000;

#[derive(thiserror::Error, Debug)]
pub enum KittenError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Model download failed: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),
    #[error("Invalid config.json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write WAV file: {0}")]
    Wav(#[from] hound::Error),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Phonemization failed: {0}")]
    PhonemizerFailed(String),
    #[error("Unsupported model type {0:?}, expected \"ONNX1\"")]
    UnsupportedModelType(Option<String>),
    #[error("Voice '{voice}' not available. Choose from: {available}")]
    InvalidVoice { voice: String, available: String },
    #[error("Voice '{0}' is missing from the voices archive")]
    VoiceNotFound(String),
    #[error("Failed to parse voice file: {0}")]
    VoiceParse(String),
    #[error("Speed must be a positive number, got {0}")]
    InvalidSpeed(f32),
    #[error("Model produced no output tensor")]
    EmptyOutput,
    #[error("Model not loaded. Call load_model() first.")]
    ModelNotLoaded,
}

/// The three named tensors fed to the KittenTTS graph.
#[derive(Debug, Clone)]
pub struct ModelInputs {
    /// `[1, N]` token IDs, padded with [`PAD_ID`] on both ends.
    pub input_ids: Array2<i64>,
    /// Style embedding in the shape stored in the voices archive.
    pub style: ArrayD<f32>,
    /// `[1]` speed multiplier.
    pub speed: Array1<f32>,
}

/// Runs the inference graph and returns its first output as a flat waveform.
pub trait InferenceBackend: Send {
    fn run(&mut self, inputs: &ModelInputs) -> Result<Vec<f32>, KittenError>;
}

/// [`InferenceBackend`] backed by an ONNX Runtime session.
pub struct OrtBackend {
    session: Session,
}

impl OrtBackend {
    pub fn load(
        onnx_path: &Path,
        num_threads: Option<usize>,
        optimized_cache_path: Option<&Path>,
    ) -> Result<Self, KittenError> {
        log::info!("Loading KittenTTS model from {}", onnx_path.display());
        let session = init_session(onnx_path, num_threads, optimized_cache_path)?;
        Ok(Self { session })
    }
}

impl InferenceBackend for OrtBackend {
    fn run(&mut self, model_inputs: &ModelInputs) -> Result<Vec<f32>, KittenError> {
        let inputs = inputs![
            "input_ids" => TensorRef::from_array_view(model_inputs.input_ids.view())?,
            "style" => TensorRef::from_array_view(model_inputs.style.view())?,
            "speed" => TensorRef::from_array_view(model_inputs.speed.view())?,
        ];
        let output = self.session.run(inputs)?;

        let first_output = output.iter().next().ok_or(KittenError::EmptyOutput)?;
        let waveform = first_output.1.try_extract_array::<f32>()?;

        Ok(waveform.iter().copied().collect())
    }
}

/// Loaded KittenTTS model: inference backend, voices, symbols and phonemizer.
pub struct KittenModel {
    backend: Box<dyn InferenceBackend>,
    voice_store: VoiceStore,
    symbols: SymbolTable,
    phonemizer: Box<dyn Phonemizer>,
}

impl KittenModel {
    /// Load the ONNX graph and voices archive from disk.
    pub fn load(
        model_path: &Path,
        voices_path: &Path,
        num_threads: Option<usize>,
        optimized_cache_path: Option<&Path>,
        espeak: EspeakConfig,
    ) -> Result<Self, KittenError> {
        let backend = OrtBackend::load(model_path, num_threads, optimized_cache_path)?;
        let voice_store = VoiceStore::load(voices_path)?;

        Ok(Self::from_parts(
            Box::new(backend),
            voice_store,
            Box::new(EspeakPhonemizer::new(espeak)),
        ))
    }

    /// Assemble a model from already constructed collaborators.
    pub fn from_parts(
        backend: Box<dyn InferenceBackend>,
        voice_store: VoiceStore,
        phonemizer: Box<dyn Phonemizer>,
    ) -> Self {
        Self {
            backend,
            voice_store,
            symbols: SymbolTable::new(),
            phonemizer,
        }
    }

    /// Phonemize `text` and build the graph inputs for `voice` and `speed`.
    ///
    /// Voice and speed are validated before the phonemizer runs.
    pub fn prepare_inputs(
        &self,
        text: &str,
        voice: &str,
        speed: f32,
    ) -> Result<ModelInputs, KittenError> {
        validate_voice(voice)?;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(KittenError::InvalidSpeed(speed));
        }
        let style = self.voice_store.style(voice)?;

        let phonemes = self.phonemizer.phonemize(text)?;
        let normalized = normalize_phonemes(&phonemes);
        let tokens = self.symbols.encode(&normalized);

        let mut ids = Vec::with_capacity(tokens.len() + 2);
        ids.push(PAD_ID);
        ids.extend_from_slice(&tokens);
        ids.push(PAD_ID);
        log::debug!("Encoded {:?} into {} tokens", normalized, ids.len());

        let seq_len = ids.len();
        Ok(ModelInputs {
            input_ids: Array2::from_shape_vec((1, seq_len), ids)?,
            style: style.clone(),
            speed: ndarray::arr1(&[speed]),
        })
    }

    /// Synthesize `text` with `voice` at `speed`, returning trimmed samples.
    pub fn generate(
        &mut self,
        text: &str,
        voice: &str,
        speed: f32,
    ) -> Result<Vec<f32>, KittenError> {
        let inputs = self.prepare_inputs(text, voice, speed)?;
        let raw = self.backend.run(&inputs)?;
        log::debug!("Model returned {} samples", raw.len());
        Ok(trim_waveform(raw))
    }

    /// Synthesize `text` and write it as a mono float WAV file.
    pub fn generate_to_file(
        &mut self,
        text: &str,
        output_path: &Path,
        voice: &str,
        speed: f32,
        sample_rate: u32,
    ) -> Result<(), KittenError> {
        let samples = self.generate(text, voice, speed)?;
        SynthesisResult {
            samples,
            sample_rate,
        }
        .write_wav(output_path)?;
        log::info!("Audio saved to {}", output_path.display());
        Ok(())
    }

    /// The fixed set of voices this model accepts.
    pub fn available_voices(&self) -> &'static [&'static str] {
        &AVAILABLE_VOICES
    }

    /// Voice names found in the loaded voices archive.
    pub fn loaded_voices(&self) -> Vec<&str> {
        self.voice_store.voice_names()
    }
}

/// Drop the start and end artifact regions of a raw waveform.
///
/// Returns an empty waveform when the input is not longer than both regions
/// combined.
pub fn trim_waveform(mut raw: Vec<f32>) -> Vec<f32> {
    if raw.len() <= TRIM_START_SAMPLES + TRIM_END_SAMPLES {
        log::warn!(
            "Model output has {} samples, not more than the {} trimmed; returning empty audio",
            raw.len(),
            TRIM_START_SAMPLES + TRIM_END_SAMPLES
        );
        return Vec::new();
    }

    raw.truncate(raw.len() - TRIM_END_SAMPLES);
    raw.drain(..TRIM_START_SAMPLES);
    raw
}

/// Initialize an ONNX session with optional on-disk graph caching.
///
/// The first load runs Level3 graph optimization and serialises the result to
/// `optimized_cache_path`. Later loads read the pre-optimized file at
/// `Disable` optimization level.
fn init_session(
    onnx_path: &Path,
    num_threads: Option<usize>,
    optimized_cache_path: Option<&Path>,
) -> Result<Session, KittenError> {
    let providers = vec![CPUExecutionProvider::default().build()];

    let (load_path, opt_level, write_cache) = match optimized_cache_path {
        Some(cache) if cache.exists() => {
            log::info!("Loading pre-optimized KittenTTS graph from {:?}", cache);
            (cache, GraphOptimizationLevel::Disable, None)
        }
        Some(cache) => {
            log::info!(
                "First load: running Level3 optimization; saving graph to {:?}",
                cache
            );
            (onnx_path, GraphOptimizationLevel::Level3, Some(cache))
        }
        None => (onnx_path, GraphOptimizationLevel::Level3, None),
    };

    let mut builder = Session::builder()?
        .with_optimization_level(opt_level)?
        .with_execution_providers(providers)?;

    if let Some(cache) = write_cache {
        builder = builder.with_optimized_model_path(cache)?;
    }

    if let Some(threads) = num_threads {
        builder = builder
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?;
    }

    Ok(builder.commit_from_file(load_path)?)
}
