//! Model acquisition from the Hugging Face Hub.
//!
//! A KittenTTS repository holds a `config.json` naming the ONNX graph and
//! the voices archive:
//!
//! ```json
//! { "type": "ONNX1", "model_file": "kitten_tts_nano_v0_1.onnx", "voices": "voices.npz" }
//! ```

use std::path::{Path, PathBuf};

use hf_hub::api::sync::{Api, ApiBuilder};
use serde::Deserialize;
use serde_json::Value;

use super::model::KittenError;

/// Publisher namespace assumed for bare model names.
pub const DEFAULT_PUBLISHER: &str = "KittenML";

/// Repository used when no model is specified.
pub const DEFAULT_MODEL: &str = "KittenML/kitten-tts-nano-0.1";

/// The only model format this crate can run.
pub const SUPPORTED_MODEL_TYPE: &str = "ONNX1";

pub const CONFIG_FILE: &str = "config.json";

/// Contents of a model repository's `config.json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    #[serde(rename = "type")]
    pub model_type: Option<String>,
    pub model_file: String,
    pub voices: String,
}

impl ModelConfig {
    pub fn from_file(path: &Path) -> Result<Self, KittenError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a `config.json` payload.
    ///
    /// The `type` field is checked before anything else, so a config for a
    /// different model format is reported as unsupported even when the rest
    /// of its schema differs.
    pub fn from_json(content: &str) -> Result<Self, KittenError> {
        let value: Value = serde_json::from_str(content)?;
        check_model_type(value.get("type"))?;
        Ok(serde_json::from_value(value)?)
    }
}

fn check_model_type(model_type: Option<&Value>) -> Result<(), KittenError> {
    match model_type {
        Some(Value::String(t)) if t == SUPPORTED_MODEL_TYPE => Ok(()),
        Some(Value::String(t)) => Err(KittenError::UnsupportedModelType(Some(t.clone()))),
        None | Some(Value::Null) => Err(KittenError::UnsupportedModelType(None)),
        Some(other) => Err(KittenError::UnsupportedModelType(Some(other.to_string()))),
    }
}

/// Local paths of a downloaded (or locally present) model.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: ModelConfig,
    pub model_path: PathBuf,
    pub voices_path: PathBuf,
}

impl ModelFiles {
    /// Resolve the files of a model stored in a local directory.
    pub fn from_dir(model_dir: &Path) -> Result<Self, KittenError> {
        let config = ModelConfig::from_file(&model_dir.join(CONFIG_FILE))?;

        let files = Self {
            model_path: model_dir.join(&config.model_file),
            voices_path: model_dir.join(&config.voices),
            config,
        };
        for path in [&files.model_path, &files.voices_path] {
            if !path.exists() {
                return Err(KittenError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} named in config.json does not exist", path.display()),
                )));
            }
        }
        Ok(files)
    }
}

/// Source of model files, keyed by repository and filename.
pub trait ModelRegistry {
    fn fetch(&self, repo_id: &str, filename: &str) -> Result<PathBuf, KittenError>;
}

/// [`ModelRegistry`] backed by the Hugging Face Hub download cache.
pub struct HubRegistry {
    api: Api,
}

impl HubRegistry {
    /// `cache_dir` overrides the default Hugging Face cache location.
    pub fn new(cache_dir: Option<&Path>) -> Result<Self, KittenError> {
        let mut builder = ApiBuilder::new();
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(dir.to_path_buf());
        }
        Ok(Self {
            api: builder.build()?,
        })
    }
}

impl ModelRegistry for HubRegistry {
    fn fetch(&self, repo_id: &str, filename: &str) -> Result<PathBuf, KittenError> {
        log::debug!("Fetching {filename} from {repo_id}");
        Ok(self.api.model(repo_id.to_string()).get(filename)?)
    }
}

/// Normalize a model name to a `publisher/name` repository id.
pub fn resolve_repo_id(model_name: &str) -> String {
    if model_name.contains('/') {
        model_name.to_string()
    } else {
        format!("{DEFAULT_PUBLISHER}/{model_name}")
    }
}

/// Fetch `config.json`, validate it, then fetch the files it names.
///
/// Nothing beyond `config.json` is downloaded when the model type is not
/// supported.
pub fn fetch_model_files(
    registry: &dyn ModelRegistry,
    repo_id: &str,
) -> Result<ModelFiles, KittenError> {
    let config_path = registry.fetch(repo_id, CONFIG_FILE)?;
    let config = ModelConfig::from_file(&config_path)?;

    let model_path = registry.fetch(repo_id, &config.model_file)?;
    let voices_path = registry.fetch(repo_id, &config.voices)?;
    log::info!(
        "Model files for {repo_id}: {} and {}",
        model_path.display(),
        voices_path.display()
    );

    Ok(ModelFiles {
        config,
        model_path,
        voices_path,
    })
}
