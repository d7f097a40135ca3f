use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::KittenError;

/// espeak-ng voice used for all KittenTTS models.
pub const ESPEAK_LANGUAGE: &str = "en-us";

static WORD_OR_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+|[^\w\s]").expect("valid regex"));

/// Converts raw text into a phonetic (IPA) transcription.
pub trait Phonemizer: Send {
    fn phonemize(&self, text: &str) -> Result<String, KittenError>;
}

/// Location of the espeak-ng binary and its data directory.
///
/// `None` falls back to `espeak-ng` on PATH and its compiled-in data path.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

/// [`Phonemizer`] backed by an `espeak-ng` subprocess.
///
/// Punctuation is kept in the transcription and stress marks are emitted.
#[derive(Debug, Clone)]
pub struct EspeakPhonemizer {
    config: EspeakConfig,
}

impl Default for EspeakPhonemizer {
    fn default() -> Self {
        Self::new(EspeakConfig::default())
    }
}

impl EspeakPhonemizer {
    pub fn new(config: EspeakConfig) -> Self {
        Self { config }
    }
}

impl Phonemizer for EspeakPhonemizer {
    fn phonemize(&self, text: &str) -> Result<String, KittenError> {
        let parts = split_text_parts(text);

        let text_segments: Vec<&str> = parts
            .iter()
            .filter_map(|part| match part {
                TextPart::Text(segment) => Some(segment.as_str()),
                TextPart::Punct(_) => None,
            })
            .collect();

        let transcriptions = if text_segments.is_empty() {
            Vec::new()
        } else {
            self.phonemize_segments_batch(&text_segments)?
        };

        let mut out = String::new();
        let mut segment_index = 0usize;
        let mut attach_next = false;
        let mut quote_open = false;
        for part in parts {
            match part {
                TextPart::Text(_) => {
                    if let Some(ipa) = transcriptions.get(segment_index) {
                        if !out.is_empty() && !out.ends_with(' ') && !attach_next {
                            out.push(' ');
                        }
                        out.push_str(ipa);
                        attach_next = false;
                    }
                    segment_index += 1;
                }
                TextPart::Punct(ch) => {
                    let opening = if ch == '"' {
                        quote_open = !quote_open;
                        quote_open
                    } else {
                        is_opening_punctuation(ch)
                    };

                    if opening {
                        // Opening marks attach to the following word.
                        if !out.is_empty() && !out.ends_with(' ') && !attach_next {
                            out.push(' ');
                        }
                        out.push(ch);
                        attach_next = true;
                    } else {
                        // Everything else attaches to the preceding word.
                        if out.ends_with(' ') {
                            out.pop();
                        }
                        out.push(ch);
                        out.push(' ');
                        attach_next = false;
                    }
                }
            }
        }

        Ok(out.trim_end().to_string())
    }
}

impl EspeakPhonemizer {
    fn phonemize_segments_batch(&self, segments: &[&str]) -> Result<Vec<String>, KittenError> {
        let batched_input = segments.join("\n");
        let output = self.run_espeak(&batched_input)?;
        let lines: Vec<&str> = output.lines().collect();

        // espeak-ng should emit one line per input line for stdin mode.
        // If this assumption breaks, fall back to per-segment invocation.
        if lines.len() != segments.len() {
            log::debug!(
                "espeak-ng returned {} lines for {} segments, phonemizing one by one",
                lines.len(),
                segments.len()
            );
            return segments
                .iter()
                .map(|segment| Ok(clean_ipa(&self.run_espeak(segment)?)))
                .collect();
        }

        Ok(lines.iter().map(|line| clean_ipa(line)).collect())
    }

    fn run_espeak(&self, input: &str) -> Result<String, KittenError> {
        let program = self
            .config
            .bin_path
            .as_deref()
            .map(|p| p.as_os_str())
            .unwrap_or_else(|| OsStr::new("espeak-ng"));

        let mut command = Command::new(program);
        command
            .args(["--ipa", "--stdin", "-q", "-v", ESPEAK_LANGUAGE])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(data_path) = &self.config.data_path {
            command.env("ESPEAK_DATA_PATH", data_path);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KittenError::EspeakNotFound
            } else {
                KittenError::Io(e)
            }
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Without a final line terminator espeak-ng can under-process the last token.
            let stdin_payload = canonicalize_espeak_stdin_payload(input);
            stdin.write_all(stdin_payload.as_bytes())?;
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KittenError::PhonemizerFailed(format!(
                "espeak-ng exited with code {:?}: {stderr}",
                output.status.code()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Split text into word runs and single punctuation marks.
///
/// Matches are maximal runs of word characters or one character that is
/// neither a word character nor whitespace.
pub fn basic_english_tokenize(text: &str) -> Vec<&str> {
    WORD_OR_PUNCT.find_iter(text).map(|m| m.as_str()).collect()
}

/// Re-space a transcription so words and punctuation are separated by exactly
/// one space.
pub fn normalize_phonemes(phonemes: &str) -> String {
    basic_english_tokenize(phonemes).join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TextPart {
    Text(String),
    Punct(char),
}

fn split_text_parts(text: &str) -> Vec<TextPart> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if is_preserved_punctuation(ch) {
            flush_text_part(&mut parts, &mut current);
            parts.push(TextPart::Punct(ch));
            continue;
        }

        if ch.is_whitespace() {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
            }
            continue;
        }

        current.push(ch);
    }

    flush_text_part(&mut parts, &mut current);
    parts
}

fn flush_text_part(parts: &mut Vec<TextPart>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        parts.push(TextPart::Text(trimmed.to_string()));
    }
    current.clear();
}

fn is_preserved_punctuation(ch: char) -> bool {
    matches!(
        ch,
        ';' | ':'
            | ','
            | '.'
            | '!'
            | '?'
            | '¡'
            | '¿'
            | '—'
            | '…'
            | '"'
            | '«'
            | '»'
            | '\u{201c}'
            | '\u{201d}'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
    )
}

fn is_opening_punctuation(ch: char) -> bool {
    matches!(ch, '¡' | '¿' | '«' | '\u{201c}' | '(' | '[' | '{')
}

fn canonicalize_espeak_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

/// Collapse multi-line espeak-ng output into one space-separated line.
fn clean_ipa(ipa: &str) -> String {
    ipa.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{
        basic_english_tokenize, canonicalize_espeak_stdin_payload, clean_ipa,
        normalize_phonemes, split_text_parts, EspeakConfig, EspeakPhonemizer, Phonemizer,
        TextPart,
    };
    use crate::engines::kitten::model::KittenError;
    use std::path::PathBuf;
    use std::process::Command;

    fn espeak_available() -> bool {
        Command::new("espeak-ng").arg("--version").output().is_ok()
    }

    /// Installs a shell script standing in for espeak-ng.
    #[cfg(unix)]
    fn scripted_espeak(
        dir: &std::path::Path,
        body: &str,
        data_path: Option<PathBuf>,
    ) -> EspeakPhonemizer {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("espeak-ng");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        EspeakPhonemizer::new(EspeakConfig {
            bin_path: Some(path),
            data_path,
        })
    }

    #[test]
    fn splits_text_and_punctuation_parts() {
        let parts = split_text_parts("Hello, world. Testing!");
        assert_eq!(
            parts,
            vec![
                TextPart::Text("Hello".to_string()),
                TextPart::Punct(','),
                TextPart::Text("world".to_string()),
                TextPart::Punct('.'),
                TextPart::Text("Testing".to_string()),
                TextPart::Punct('!'),
            ]
        );
    }

    #[test]
    fn collapses_multiline_padding() {
        let parts = split_text_parts("\n    It begins with an\n   \"Ugh!\"  \n");
        assert_eq!(
            parts,
            vec![
                TextPart::Text("It begins with an".to_string()),
                TextPart::Punct('"'),
                TextPart::Text("Ugh".to_string()),
                TextPart::Punct('!'),
                TextPart::Punct('"'),
            ]
        );
    }

    #[test]
    fn tokenizes_words_and_single_punctuation() {
        assert_eq!(
            basic_english_tokenize("həlˈoʊ,  wˈɜːld!?"),
            vec!["həlˈoʊ", ",", "wˈɜːld", "!", "?"]
        );
        assert_eq!(
            basic_english_tokenize("the cat, sat."),
            vec!["the", "cat", ",", "sat", "."]
        );
    }

    #[test]
    fn stress_and_length_marks_stay_inside_words() {
        assert_eq!(basic_english_tokenize("kˈæt sˈɜːt"), vec!["kˈæt", "sˈɜːt"]);
    }

    #[test]
    fn normalizes_irregular_spacing() {
        assert_eq!(normalize_phonemes("  ðə   kæt,sæt . "), "ðə kæt , sæt .");
        assert_eq!(normalize_phonemes(""), "");
    }

    #[test]
    fn appends_trailing_newline_for_espeak_stdin() {
        assert_eq!(canonicalize_espeak_stdin_payload("America"), "America\n");
    }

    #[test]
    fn keeps_single_trailing_newline_for_espeak_stdin() {
        assert_eq!(canonicalize_espeak_stdin_payload("America\n"), "America\n");
    }

    #[test]
    fn joins_multiline_espeak_output() {
        assert_eq!(clean_ipa(" həlˈoʊ\n\n wˈɜːld \n"), "həlˈoʊ wˈɜːld");
    }

    #[test]
    fn missing_binary_is_reported() {
        let phonemizer = EspeakPhonemizer::new(EspeakConfig {
            bin_path: Some(PathBuf::from("/nonexistent/espeak-ng")),
            data_path: None,
        });
        let err = phonemizer.phonemize("hello").unwrap_err();
        assert!(matches!(err, KittenError::EspeakNotFound));
    }

    #[test]
    fn punctuation_only_input_skips_espeak() {
        let phonemizer = EspeakPhonemizer::new(EspeakConfig {
            bin_path: Some(PathBuf::from("/nonexistent/espeak-ng")),
            data_path: None,
        });
        assert_eq!(phonemizer.phonemize("?!").unwrap(), "?!");
    }

    #[cfg(unix)]
    #[test]
    fn reinserts_punctuation_around_transcribed_words() {
        let dir = tempfile::tempdir().unwrap();
        let phonemizer = scripted_espeak(dir.path(), "tr 'a-z' 'A-Z'", None);

        let ipa = phonemizer
            .phonemize("\n  \"Hello,\" she   said (twice)... ok\n")
            .unwrap();
        assert_eq!(ipa, "\"HELLO,\" SHE SAID (TWICE)... OK");
        assert_eq!(
            normalize_phonemes(&ipa),
            "\" HELLO , \" SHE SAID ( TWICE ) . . . OK"
        );
    }

    #[cfg(unix)]
    #[test]
    fn opening_marks_attach_to_the_next_word() {
        let dir = tempfile::tempdir().unwrap();
        let phonemizer = scripted_espeak(dir.path(), "tr 'a-z' 'A-Z'", None);

        assert_eq!(
            phonemizer.phonemize("¿que? [see] \u{201c}this\u{201d}").unwrap(),
            "¿QUE? [SEE] \u{201c}THIS\u{201d}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn line_count_mismatch_falls_back_to_one_call_per_segment() {
        let dir = tempfile::tempdir().unwrap();
        // Multi-line input gets a trailing extra line, and every call is logged.
        let body = r#"echo call >> "$(dirname "$0")/calls"
input=$(cat)
printf '%s\n' "$input" | tr 'a-z' 'A-Z'
case "$input" in
  *"
"*) echo EXTRA ;;
esac"#;
        let phonemizer = scripted_espeak(dir.path(), body, None);

        let ipa = phonemizer.phonemize("hello, big world. bye").unwrap();
        assert_eq!(ipa, "HELLO, BIG WORLD. BYE");

        let calls = std::fs::read_to_string(dir.path().join("calls")).unwrap();
        assert_eq!(calls.lines().count(), 4, "one batch call plus three segments");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_phonemizer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let phonemizer = scripted_espeak(
            dir.path(),
            "cat > /dev/null\necho 'unknown voice' >&2\nexit 3",
            None,
        );

        let err = phonemizer.phonemize("hello").unwrap_err();
        match err {
            KittenError::PhonemizerFailed(message) => {
                assert!(message.contains("Some(3)"), "{message}");
                assert!(message.contains("unknown voice"), "{message}");
            }
            other => panic!("expected PhonemizerFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn passes_voice_and_data_path_to_espeak() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("espeak-ng-data");
        let phonemizer = scripted_espeak(
            dir.path(),
            "cat > /dev/null\necho \"$* $ESPEAK_DATA_PATH\"",
            Some(data.clone()),
        );

        let output = phonemizer.phonemize("hello").unwrap();
        assert_eq!(
            output,
            format!("--ipa --stdin -q -v en-us {}", data.display())
        );
    }

    #[test]
    fn preserves_punctuation_in_transcription() {
        // Skip when espeak-ng is unavailable in the execution environment.
        if !espeak_available() {
            return;
        }

        let ipa = EspeakPhonemizer::default()
            .phonemize("Hello, world.")
            .expect("espeak should succeed");
        assert!(ipa.contains(','), "{ipa}");
        assert!(ipa.ends_with('.'), "{ipa}");
        assert!(ipa.contains('ˈ'), "stress marks expected in {ipa}");
    }

    #[test]
    fn transcription_keeps_terminal_schwa_for_america() {
        if !espeak_available() {
            return;
        }

        let ipa = EspeakPhonemizer::default()
            .phonemize("America")
            .expect("espeak should succeed");
        assert!(ipa.ends_with('ə'), "{ipa}");
    }
}
