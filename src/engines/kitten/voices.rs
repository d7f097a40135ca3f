use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use ndarray::ArrayD;
use ndarray_npy::NpzReader;

use super::model::KittenError;

/// Voices every KittenTTS model ships: four expressive tiers, male and female.
pub const AVAILABLE_VOICES: [&str; 8] = [
    "expr-voice-2-m",
    "expr-voice-2-f",
    "expr-voice-3-m",
    "expr-voice-3-f",
    "expr-voice-4-m",
    "expr-voice-4-f",
    "expr-voice-5-m",
    "expr-voice-5-f",
];

/// Check `voice` against [`AVAILABLE_VOICES`].
pub fn validate_voice(voice: &str) -> Result<(), KittenError> {
    if AVAILABLE_VOICES.contains(&voice) {
        Ok(())
    } else {
        Err(KittenError::InvalidVoice {
            voice: voice.to_string(),
            available: AVAILABLE_VOICES.join(", "),
        })
    }
}

/// Storage for all loaded voice style vectors, kept in the shape stored in
/// the archive (typically `[1, 256]`).
pub struct VoiceStore {
    voices: HashMap<String, ArrayD<f32>>,
}

impl VoiceStore {
    /// Load all voices from a .npz (numpy zip) file.
    ///
    /// Each entry is a float32 array named after the voice
    /// (e.g., `expr-voice-5-m.npy`).
    pub fn load(path: &Path) -> Result<Self, KittenError> {
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file)
            .map_err(|e| KittenError::VoiceParse(format!("Failed to open npz archive: {e}")))?;

        let names = npz
            .names()
            .map_err(|e| KittenError::VoiceParse(format!("Failed to list npz entries: {e}")))?;

        let mut voices = HashMap::new();
        for name in names {
            let style: ArrayD<f32> = npz
                .by_name(&name)
                .map_err(|e| KittenError::VoiceParse(format!("{name}: {e}")))?;
            voices.insert(name.trim_end_matches(".npy").to_string(), style);
        }

        log::info!("Loaded {} voices from {}", voices.len(), path.display());
        Ok(Self { voices })
    }

    /// Style vector for `voice`.
    pub fn style(&self, voice: &str) -> Result<&ArrayD<f32>, KittenError> {
        self.voices
            .get(voice)
            .ok_or_else(|| KittenError::VoiceNotFound(voice.to_string()))
    }

    /// Voice names present in the archive, sorted.
    pub fn voice_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.voices.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, ArrayD<f32>)> for VoiceStore {
    fn from_iter<I: IntoIterator<Item = (String, ArrayD<f32>)>>(iter: I) -> Self {
        Self {
            voices: iter.into_iter().collect(),
        }
    }
}
