use log::debug;

use super::buffer::HypothesisBuffer;
use super::similarity::SimilarityScorer;

/// The reference words of one page. Never changes once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedText(Vec<String>);

impl ExpectedText {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            words
                .into_iter()
                .map(Into::into)
                .filter(|w: &String| !w.trim().is_empty())
                .collect(),
        )
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_whitespace())
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.0
    }
}

/// Index of the next expected word. Only moves forward, never past the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
    len: usize,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self { position: 0, len }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.len
    }

    /// Returns false when already at the end.
    pub fn advance(&mut self) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.position += 1;
        true
    }
}

/// Greedy leftmost matching of buffered tokens against the expected words.
#[derive(Debug, Clone, Copy)]
pub struct MatchReconciler {
    scorer: SimilarityScorer,
    match_threshold: f64,
}

impl Default for MatchReconciler {
    fn default() -> Self {
        Self::new(SimilarityScorer::default(), 0.8)
    }
}

impl MatchReconciler {
    pub fn new(scorer: SimilarityScorer, match_threshold: f64) -> Self {
        Self {
            scorer,
            match_threshold,
        }
    }

    pub fn is_match(&self, heard: &str, expected: &str) -> bool {
        self.scorer.similarity(heard, expected) >= self.match_threshold
    }

    /// Advances `cursor` over as many expected words as the buffer allows.
    ///
    /// For each target the first sufficiently similar token wins; it and
    /// every token before it are removed. Scanning stops at the first
    /// target with no match, leaving the buffer untouched for that target.
    /// Returns the number of words advanced.
    pub fn reconcile(
        &self,
        expected: &ExpectedText,
        cursor: &mut Cursor,
        buffer: &mut HypothesisBuffer,
    ) -> usize {
        let mut matched = 0;

        while !buffer.is_empty() {
            let Some(target) = expected.get(cursor.position()) else {
                break;
            };
            debug!(
                "looking for {target:?} in pile of {} words: {:?}",
                buffer.len(),
                buffer.words()
            );

            let found = buffer.position(|token| {
                let score = self.scorer.similarity(&token.word, target);
                debug!("  {:?} vs {target:?} = {score:.2}", token.word);
                score >= self.match_threshold
            });

            match found {
                Some(index) => {
                    let consumed = buffer.consume_through(index);
                    debug!(
                        "  matched {target:?}, dropping {} noise word(s)",
                        consumed.len() - 1
                    );
                    cursor.advance();
                    matched += 1;
                }
                None => break,
            }
        }

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RecognitionEvent;

    fn buffer_of(transcript: &str) -> HypothesisBuffer {
        let mut buffer = HypothesisBuffer::new(15);
        buffer.append(&RecognitionEvent::single(transcript, 0.9, true));
        buffer
    }

    #[test]
    fn expected_text_skips_blank_words() {
        let text = ExpectedText::new(["The", " ", "cat", ""]);
        assert_eq!(text.words(), ["The", "cat"]);
        assert_eq!(ExpectedText::from_text("  a  b\nc ").len(), 3);
    }

    #[test]
    fn cursor_stops_at_end() {
        let mut cursor = Cursor::new(1);
        assert!(cursor.advance());
        assert!(!cursor.advance());
        assert_eq!(cursor.position(), 1);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn discards_noise_before_match() {
        let expected = ExpectedText::new(["the", "cat", "sat"]);
        let mut cursor = Cursor::new(expected.len());
        let mut buffer = buffer_of("uh the kat");

        let matched = MatchReconciler::default().reconcile(&expected, &mut cursor, &mut buffer);

        assert_eq!(matched, 1);
        assert_eq!(cursor.position(), 1);
        assert_eq!(buffer.words(), ["kat"]);
    }

    #[test]
    fn leftmost_match_wins_over_better_one() {
        // "bat" (0.67) is below threshold, "cats" (0.75) too, "cat" matches.
        // With a 0.7 threshold "cats" comes first and wins even though a
        // perfect "cat" follows it.
        let expected = ExpectedText::new(["cat"]);
        let mut cursor = Cursor::new(1);
        let mut buffer = buffer_of("bat cats cat");
        let lax = MatchReconciler::new(SimilarityScorer::default(), 0.7);

        assert_eq!(lax.reconcile(&expected, &mut cursor, &mut buffer), 1);
        assert_eq!(buffer.words(), ["cat"]);
    }

    #[test]
    fn stops_at_end_of_page() {
        let expected = ExpectedText::new(["hi"]);
        let mut cursor = Cursor::new(1);
        let mut buffer = buffer_of("hi hi hi");
        let reconciler = MatchReconciler::default();

        assert_eq!(reconciler.reconcile(&expected, &mut cursor, &mut buffer), 1);
        assert_eq!(buffer.len(), 2);
        assert_eq!(reconciler.reconcile(&expected, &mut cursor, &mut buffer), 0);
        assert_eq!(buffer.len(), 2);
    }
}
