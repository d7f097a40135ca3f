use std::path::{Path, PathBuf};

use derive_builder::Builder;

use crate::{SynthesisEngine, SynthesisResult};

use super::download::{
    fetch_model_files, resolve_repo_id, HubRegistry, ModelFiles, ModelRegistry,
};
use super::model::{KittenError, KittenModel, SAMPLE_RATE};
use super::phonemizer::EspeakConfig;
use super::voices::AVAILABLE_VOICES;

/// Voice used when a request does not name one.
pub const DEFAULT_VOICE: &str = "expr-voice-5-m";

/// Normal speaking rate.
pub const DEFAULT_SPEED: f32 = 1.0;

/// Parameters for configuring KittenTTS model loading.
#[derive(Debug, Clone, Default)]
pub struct KittenModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
    /// Path for caching the Level3-optimized ONNX graph.
    ///
    /// Must be writable; the first load writes it and later loads skip
    /// graph optimization.
    pub optimized_model_cache_path: Option<PathBuf>,
}

/// Parameters for configuring a KittenTTS synthesis request.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct KittenInferenceParams {
    /// Voice name, one of [`AVAILABLE_VOICES`].
    #[builder(setter(into))]
    pub voice: String,
    /// Speech speed multiplier, 1.0 is normal.
    pub speed: f32,
}

impl Default for KittenInferenceParams {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            speed: DEFAULT_SPEED,
        }
    }
}

/// KittenTTS text-to-speech engine.
///
/// # Quick Start
///
/// ```rust,no_run
/// use kitten_tts::{SynthesisEngine, engines::kitten::KittenEngine};
/// use std::path::PathBuf;
///
/// // Directory holding config.json and the files it names
/// let mut engine = KittenEngine::new();
/// engine.load_model(&PathBuf::from("models/kitten-tts-nano-0.1"))?;
/// let result = engine.synthesize("Hello, world!", None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct KittenEngine {
    model: Option<KittenModel>,
    espeak: EspeakConfig,
}

impl Default for KittenEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KittenEngine {
    /// Create a new engine that uses `espeak-ng` from PATH.
    pub fn new() -> Self {
        Self::with_espeak(None, None)
    }

    /// Create a new engine with explicit espeak-ng binary and data paths.
    ///
    /// Either path can be `None` to fall back to the system default.
    pub fn with_espeak(bin_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Self {
        Self {
            model: None,
            espeak: EspeakConfig {
                bin_path,
                data_path,
            },
        }
    }

    /// Wrap an already loaded model.
    pub fn from_model(model: KittenModel) -> Self {
        Self {
            model: Some(model),
            espeak: EspeakConfig::default(),
        }
    }

    /// Download `model_name` from the Hugging Face Hub and load it.
    pub fn load_from_hub(
        &mut self,
        model_name: &str,
        cache_dir: Option<&Path>,
        params: KittenModelParams,
    ) -> Result<(), KittenError> {
        let registry = HubRegistry::new(cache_dir)?;
        self.load_from_registry(&registry, model_name, params)
    }

    /// Fetch `model_name` from `registry` and load it.
    pub fn load_from_registry(
        &mut self,
        registry: &dyn ModelRegistry,
        model_name: &str,
        params: KittenModelParams,
    ) -> Result<(), KittenError> {
        let repo_id = resolve_repo_id(model_name);
        let files = fetch_model_files(registry, &repo_id)?;
        self.load_files(&files, params)
    }

    fn load_files(
        &mut self,
        files: &ModelFiles,
        params: KittenModelParams,
    ) -> Result<(), KittenError> {
        let model = KittenModel::load(
            &files.model_path,
            &files.voices_path,
            params.num_threads,
            params.optimized_model_cache_path.as_deref(),
            self.espeak.clone(),
        )?;
        self.model = Some(model);
        Ok(())
    }

    /// The fixed set of voices KittenTTS accepts.
    pub fn available_voices(&self) -> &'static [&'static str] {
        &AVAILABLE_VOICES
    }

    /// List voice names found in the voices archive (requires model to be loaded).
    pub fn list_voices(&self) -> Vec<&str> {
        self.model
            .as_ref()
            .map(|m| m.loaded_voices())
            .unwrap_or_default()
    }

    pub fn model_mut(&mut self) -> Result<&mut KittenModel, KittenError> {
        self.model.as_mut().ok_or(KittenError::ModelNotLoaded)
    }
}

impl SynthesisEngine for KittenEngine {
    type SynthesisParams = KittenInferenceParams;
    type ModelParams = KittenModelParams;

    fn load_model_with_params(
        &mut self,
        model_path: &Path,
        params: Self::ModelParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let files = ModelFiles::from_dir(model_path)?;
        self.load_files(&files, params)?;
        Ok(())
    }

    fn unload_model(&mut self) {
        self.model = None;
    }

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        let p = params.unwrap_or_default();
        let samples = self.model_mut()?.generate(text, &p.voice, p.speed)?;

        Ok(SynthesisResult {
            samples,
            sample_rate: SAMPLE_RATE,
        })
    }
}
