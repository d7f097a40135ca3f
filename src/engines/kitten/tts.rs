use std::path::Path;

use super::download::{resolve_repo_id, ModelRegistry, DEFAULT_MODEL};
use super::engine::{KittenEngine, KittenModelParams};
use super::model::KittenError;
use super::phonemizer::EspeakConfig;

/// Main entry point: a KittenTTS model fetched from the Hugging Face Hub.
///
/// ```rust,no_run
/// use kitten_tts::engines::kitten::{KittenTts, DEFAULT_VOICE};
///
/// let mut tts = KittenTts::from_pretrained()?;
/// tts.generate_to_file("Hello, world!", "out.wav".as_ref(), DEFAULT_VOICE, 1.0, 24000)?;
/// # Ok::<(), kitten_tts::engines::kitten::KittenError>(())
/// ```
pub struct KittenTts {
    repo_id: String,
    engine: KittenEngine,
}

impl KittenTts {
    /// Load [`DEFAULT_MODEL`] into the default cache.
    pub fn from_pretrained() -> Result<Self, KittenError> {
        Self::new(DEFAULT_MODEL, None)
    }

    /// Load `model_name`, either `publisher/name` or a bare name under
    /// `KittenML`, caching downloads in `cache_dir` when given.
    pub fn new(model_name: &str, cache_dir: Option<&Path>) -> Result<Self, KittenError> {
        Self::with_options(
            model_name,
            cache_dir,
            KittenModelParams::default(),
            EspeakConfig::default(),
        )
    }

    pub fn with_options(
        model_name: &str,
        cache_dir: Option<&Path>,
        params: KittenModelParams,
        espeak: EspeakConfig,
    ) -> Result<Self, KittenError> {
        let mut engine = KittenEngine::with_espeak(espeak.bin_path, espeak.data_path);
        engine.load_from_hub(model_name, cache_dir, params)?;
        Ok(Self::from_engine(model_name, engine))
    }

    /// Load `model_name` from a custom registry.
    pub fn from_registry(
        registry: &dyn ModelRegistry,
        model_name: &str,
        params: KittenModelParams,
        espeak: EspeakConfig,
    ) -> Result<Self, KittenError> {
        let mut engine = KittenEngine::with_espeak(espeak.bin_path, espeak.data_path);
        engine.load_from_registry(registry, model_name, params)?;
        Ok(Self::from_engine(model_name, engine))
    }

    fn from_engine(model_name: &str, engine: KittenEngine) -> Self {
        Self {
            repo_id: resolve_repo_id(model_name),
            engine,
        }
    }

    /// Synthesize `text`, returning mono samples at [`super::SAMPLE_RATE`].
    pub fn generate(
        &mut self,
        text: &str,
        voice: &str,
        speed: f32,
    ) -> Result<Vec<f32>, KittenError> {
        self.engine.model_mut()?.generate(text, voice, speed)
    }

    /// Synthesize `text` and save it as a WAV file at `sample_rate`.
    pub fn generate_to_file(
        &mut self,
        text: &str,
        output_path: &Path,
        voice: &str,
        speed: f32,
        sample_rate: u32,
    ) -> Result<(), KittenError> {
        self.engine
            .model_mut()?
            .generate_to_file(text, output_path, voice, speed, sample_rate)
    }

    pub fn available_voices(&self) -> &'static [&'static str] {
        self.engine.available_voices()
    }

    /// Hub repository the model was loaded from.
    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }
}
