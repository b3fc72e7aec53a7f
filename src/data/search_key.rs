use pinyin::ToPinyin;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Transliterator – name → phonetic syllables
// ---------------------------------------------------------------------------

/// Splits a display name into Latin-alphabet syllables.
///
/// Implementations must be pure and must not fail: text they cannot
/// transliterate is returned as-is.
pub trait Transliterator {
    fn syllables(&self, text: &str) -> Vec<String>;
}

/// Mandarin pinyin (tone marks dropped) for Han characters.
///
/// Consecutive characters without a pinyin reading are kept together as a
/// single syllable, one per whitespace-separated word.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinyinTransliterator;

impl Transliterator for PinyinTransliterator {
    fn syllables(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut pending = String::new();

        for ch in text.chars() {
            match ch.to_pinyin() {
                Some(py) => {
                    flush_words(&mut pending, &mut out);
                    out.push(py.plain().to_string());
                }
                None => pending.push(ch),
            }
        }
        flush_words(&mut pending, &mut out);
        out
    }
}

/// Pass-through: every whitespace-separated word is one syllable.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransliterator;

impl Transliterator for IdentityTransliterator {
    fn syllables(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

fn flush_words(pending: &mut String, out: &mut Vec<String>) {
    out.extend(pending.split_whitespace().map(str::to_string));
    pending.clear();
}

// ---------------------------------------------------------------------------
// SearchKeys – derived lookup keys for one name
// ---------------------------------------------------------------------------

/// Romanised name and initials derived from a record's name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SearchKeys {
    pub romanized_name: String,
    pub initials: String,
}

impl SearchKeys {
    pub fn build(name: &str, transliterator: &dyn Transliterator) -> Self {
        let syllables = transliterator.syllables(name);
        let romanized_name = syllables.concat().to_lowercase();
        let initials = syllables
            .iter()
            .filter_map(|s| s.chars().next())
            .flat_map(char::to_lowercase)
            .collect();
        SearchKeys {
            romanized_name,
            initials,
        }
    }
}
