//! Incremental segmentation of streamed text into speakable chunks.
//!
//! The decision to cut looks at the newest fragment only, not the whole
//! buffer: a cut happens when that fragment contains a clause delimiter and
//! the accumulated buffer, trimmed, is longer than [`MIN_SEGMENT_CHARS`].
//! Several sentences arriving in one fragment therefore stay together in one
//! segment.

/// Characters that end a sentence or clause.
pub const DELIMITERS: [char; 6] = ['.', '!', '?', ',', ';', ':'];

/// A buffer must be strictly longer than this (trimmed, in chars) to be cut.
pub const MIN_SEGMENT_CHARS: usize = 10;

/// A unit of text ready for synthesis and playback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeechSegment {
    text: String,
    final_flush: bool,
}

impl SpeechSegment {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this segment came from `flush()` at end of stream.
    pub fn is_final_flush(&self) -> bool {
        self.final_flush
    }
}

/// Accumulates fragments of one reply and emits segments in arrival order.
#[derive(Debug, Default)]
pub struct Segmenter {
    buffer: String,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `fragment`, returning a segment if the buffer is ready to speak.
    pub fn feed(&mut self, fragment: &str) -> Option<SpeechSegment> {
        self.buffer.push_str(fragment);

        if fragment.contains(DELIMITERS) && self.trimmed_len() > MIN_SEGMENT_CHARS {
            return Some(self.take(false));
        }
        None
    }

    /// Emit whatever is left once the source is exhausted.
    pub fn flush(&mut self) -> Option<SpeechSegment> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.take(true))
    }

    /// Text buffered since the last emitted segment.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    fn trimmed_len(&self) -> usize {
        self.buffer.trim().chars().count()
    }

    fn take(&mut self, final_flush: bool) -> SpeechSegment {
        SpeechSegment {
            text: std::mem::take(&mut self.buffer),
            final_flush,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fragments: &[&str]) -> Vec<SpeechSegment> {
        let mut segmenter = Segmenter::new();
        let mut out: Vec<SpeechSegment> =
            fragments.iter().filter_map(|f| segmenter.feed(f)).collect();
        out.extend(segmenter.flush());
        out
    }

    #[test]
    fn test_short_clause_is_merged_into_next_segment() {
        let mut segmenter = Segmenter::new();
        assert_eq!(segmenter.feed("Hi"), None);
        assert_eq!(segmenter.feed(" there, "), None);
        assert_eq!(segmenter.buffered(), "Hi there, ");

        let segment = segmenter.feed(" friend.").expect("should emit");
        assert_eq!(segment.text(), "Hi there,  friend.");
        assert!(!segment.is_final_flush());
        assert_eq!(segmenter.buffered(), "");
        assert_eq!(segmenter.flush(), None);
    }

    #[test]
    fn test_delimiter_must_be_in_latest_fragment() {
        let mut segmenter = Segmenter::new();
        assert_eq!(segmenter.feed("Well,"), None);
        // Buffer now long and contains a comma, but the new fragment does not.
        assert_eq!(segmenter.feed(" howdy partner and welcome"), None);
        let segment = segmenter.feed("!").unwrap();
        assert_eq!(segment.text(), "Well, howdy partner and welcome!");
    }

    #[test]
    fn test_multiple_sentences_in_one_fragment_stay_together() {
        let segments = run(&["First one. Second one. Third"]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text(), "First one. Second one. Third");
    }

    #[test]
    fn test_leading_whitespace_does_not_count_towards_length() {
        let mut segmenter = Segmenter::new();
        // 12 raw chars but only 9 once trimmed
        assert_eq!(segmenter.feed("   Howdy yo."), None);
        assert!(segmenter.feed(" Yes sir.").is_some());
    }

    #[test]
    fn test_flush_emits_short_remainder() {
        let segments = run(&["Ok"]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text(), "Ok");
        assert!(segments[0].is_final_flush());
    }

    #[test]
    fn test_flush_on_empty_buffer_emits_nothing() {
        let mut segmenter = Segmenter::new();
        assert_eq!(segmenter.flush(), None);
        assert!(run(&[]).is_empty());
        assert!(run(&["", ""]).is_empty());
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let mut segmenter = Segmenter::new();
        // 10 chars, 20+ bytes
        assert_eq!(segmenter.feed("ééééééééé."), None);
        assert!(segmenter.feed("é.").is_some());
    }

    #[test]
    fn test_concatenation_is_preserved_and_short_segments_only_at_flush() {
        let cases: Vec<Vec<&str>> = vec![
            vec!["Hi", " there, ", " friend."],
            vec!["The sky", " is blue.", " Grass", " is green", "; water is wet", "!"],
            vec![".", ",", "a", "bbbbbbbbbbbbb", "?", "  ", "tail"],
            vec!["Howdy partner, how are you doing today? I am", " fine: thanks."],
            vec!["   ", "\n", ".", "      x,"],
        ];

        for fragments in cases {
            let segments = run(&fragments);
            let joined: String = segments.iter().map(|s| s.text()).collect();
            assert_eq!(joined, fragments.concat());

            for segment in &segments {
                if !segment.is_final_flush() {
                    assert!(segment.text().trim().chars().count() > MIN_SEGMENT_CHARS);
                }
            }
            assert!(segments.iter().rev().skip(1).all(|s| !s.is_final_flush()));
        }
    }
}
