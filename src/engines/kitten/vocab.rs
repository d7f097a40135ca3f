use std::collections::HashMap;

/// Padding symbol. Always token ID 0, used as both start and end token.
pub const PAD: char = '$';

/// Token ID of [`PAD`].
pub const PAD_ID: i64 = 0;

const PUNCTUATION: &str = ";:,.!?¡¿—…\"«»\"\" ";
const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const LETTERS_IPA: &str = "ɑɐɒæɓʙβɔɕçɗɖðʤəɘɚɛɜɝɞɟʄɡɠɢʛɦɧħɥʜɨɪʝɭɬɫɮʟɱɯɰŋɳɲɴøɵɸθœɶʘɹɺɾɻʀʁɽʂʃʈʧʉʊʋⱱʌɣɤʍχʎʏʑʐʒʔʡʕʢǀǁǂǃˈˌːˑʼʴʰʱʲʷˠˤ˞↓↑→↗↘'̩'ᵻ";

/// Fixed mapping from phonetic characters to KittenTTS token IDs.
///
/// IDs are positions in `[pad] + punctuation + letters + IPA`. A character
/// listed more than once keeps the ID of its last occurrence.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    ids: HashMap<char, i64>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let symbols = std::iter::once(PAD)
            .chain(PUNCTUATION.chars())
            .chain(LETTERS.chars())
            .chain(LETTERS_IPA.chars());

        let mut ids = HashMap::new();
        for (idx, ch) in symbols.enumerate() {
            ids.insert(ch, idx as i64);
        }

        Self { ids }
    }

    /// Token ID for `ch`, or `None` when the model has no symbol for it.
    pub fn lookup(&self, ch: char) -> Option<i64> {
        self.ids.get(&ch).copied()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Encode a normalized phoneme string into token IDs.
    ///
    /// Characters without a symbol are dropped rather than replaced, so the
    /// output can be shorter than the input.
    pub fn encode(&self, phonemes: &str) -> Vec<i64> {
        phonemes.chars().filter_map(|ch| self.lookup(ch)).collect()
    }
}
