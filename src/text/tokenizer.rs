// Tokenizer: normalizes raw text and hands it to a Segmenter.
//
// The default `RegexSegmenter` collects maximal runs of one script family
// (CJK ideographs with kana, Hangul, Latin with digits, Cyrillic) and drops
// single-character runs as noise. It is the fallback when no segmentation
// engine is configured; for whitespace-delimited languages it is all you need.

use regex_lite::Regex;

use super::traits::Segmenter;
use crate::corpus::FieldValue;
use crate::error::PipelineError;

/// Runs of, in order: CJK ideographs (plus Extension A) mixed with Hiragana
/// and Katakana; Hangul syllables and jamo; lowercase Latin (ASCII, Latin-1,
/// Latin Extended-A/B, combining diacritics) with digits; Cyrillic.
/// Text is lowercased before matching, so only lowercase Latin is listed.
pub const DEFAULT_TOKEN_PATTERN: &str = concat!(
    r"[\x{3400}-\x{4DBF}\x{4E00}-\x{9FFF}\x{3040}-\x{30FF}]+",
    r"|[\x{AC00}-\x{D7AF}\x{1100}-\x{11FF}\x{3130}-\x{318F}]+",
    r"|[a-z0-9\x{00DF}-\x{00F6}\x{00F8}-\x{024F}\x{0300}-\x{036F}]+",
    r"|[\x{0400}-\x{04FF}]+",
);

/// Regex-based character-class segmenter.
pub struct RegexSegmenter {
    pattern: Regex,
    min_chars: usize,
}

impl RegexSegmenter {
    /// Build a segmenter from a custom pattern. Runs shorter than two
    /// characters are discarded.
    pub fn new(pattern: &str) -> Result<Self, PipelineError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| PipelineError::invalid(format!("bad token pattern: {e}")))?;
        Ok(Self {
            pattern,
            min_chars: 2,
        })
    }
}

impl Default for RegexSegmenter {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_TOKEN_PATTERN).expect("built-in token pattern is valid"),
            min_chars: 2,
        }
    }
}

impl Segmenter for RegexSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>, PipelineError> {
        Ok(self
            .pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|run| run.chars().count() >= self.min_chars)
            .map(str::to_string)
            .collect())
    }

    fn name(&self) -> &str {
        "regex"
    }
}

/// Turns raw text into an ordered token sequence.
pub struct Tokenizer {
    segmenter: Box<dyn Segmenter>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(Box::new(RegexSegmenter::default()))
    }
}

impl Tokenizer {
    pub fn new(segmenter: Box<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    /// Tokenize one text. Blank input yields no tokens without consulting
    /// the segmenter; segmenter failures propagate unchanged.
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>, PipelineError> {
        let normalized = normalize(text);
        if normalized.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tokens = self.segmenter.segment(&normalized)?;
        Ok(tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }

    /// Tokenize a raw field value. Numbers are tokenized as their decimal
    /// text; nulls yield no tokens.
    pub fn tokenize_value(&self, value: &FieldValue) -> Result<Vec<String>, PipelineError> {
        match value.to_text() {
            Some(text) => self.tokenize(&text),
            None => Ok(Vec::new()),
        }
    }

    pub fn segmenter_name(&self) -> &str {
        self.segmenter.name()
    }
}

/// Fold full-width ASCII to half-width and lowercase everything.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_full_width() {
        assert_eq!(normalize("ＧＯＯＤ　Service"), "good service");
    }

    #[test]
    fn test_regex_segmenter_drops_single_chars() {
        let seg = RegexSegmenter::default();
        let tokens = seg.segment("a good day, i think").unwrap();
        assert_eq!(tokens, vec!["good", "day", "think"]);
    }

    #[test]
    fn test_regex_segmenter_cjk_runs() {
        let seg = RegexSegmenter::default();
        let tokens = seg.segment("服务很好，环境 ok 是").unwrap();
        assert_eq!(tokens, vec!["服务很好", "环境", "ok"]);
    }

    #[test]
    fn test_regex_segmenter_accented_latin() {
        let seg = RegexSegmenter::default();
        assert_eq!(seg.segment("café très bon").unwrap(), vec!["café", "très", "bon"]);
        assert_eq!(seg.segment("größe œuvre").unwrap(), vec!["größe", "œuvre"]);
    }

    #[test]
    fn test_regex_segmenter_hangul_and_kana() {
        let seg = RegexSegmenter::default();
        assert_eq!(seg.segment("서비스가 좋아요").unwrap(), vec!["서비스가", "좋아요"]);
        assert_eq!(seg.segment("サービスが良い。").unwrap(), vec!["サービスが良い"]);
    }

    #[test]
    fn test_regex_segmenter_cyrillic() {
        let tokens = Tokenizer::default().tokenize("Очень хорошо, Doctor").unwrap();
        assert_eq!(tokens, vec!["очень", "хорошо", "doctor"]);
    }

    #[test]
    fn test_tokenize_blank_is_empty() {
        let tokenizer = Tokenizer::default();
        assert!(tokenizer.tokenize("").unwrap().is_empty());
        assert!(tokenizer.tokenize("   \n").unwrap().is_empty());
        assert_eq!(
            tokenizer.tokenize_value(&FieldValue::Number(2024.0)).unwrap(),
            vec!["2024"]
        );
        assert!(tokenizer.tokenize_value(&FieldValue::Null).unwrap().is_empty());
    }

    #[test]
    fn test_custom_pattern_rejected_when_invalid() {
        assert!(RegexSegmenter::new("[unclosed").is_err());
    }
}
