use serde::Serialize;

use super::buffer::HypothesisBuffer;
use super::reconciler::{Cursor, ExpectedText, MatchReconciler};
use crate::ports::RecognitionEvent;

/// Consecutive final results that matched nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoMatchStreak {
    count: u32,
    threshold: u32,
}

impl NoMatchStreak {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    /// Counts a miss. Returns true when the threshold is reached, in which
    /// case the counter starts over.
    pub fn record_miss(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Outcome of feeding one recognition event to a page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PassOutcome {
    pub matched: usize,
    pub trimmed: usize,
    /// Set once, on the pass that finished the page.
    pub completed: bool,
    /// The expected word to encourage, when the streak threshold was hit.
    pub encourage: Option<String>,
}

/// Diagnostic view of a page in progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSnapshot {
    pub cursor: usize,
    pub total: usize,
    pub expected_word: Option<String>,
    pub pile: Vec<String>,
    pub no_match_streak: u32,
}

/// Everything that lives for one page: reference words, cursor, word pile
/// and no-match streak.
#[derive(Debug, Clone)]
pub struct PageContext {
    expected: ExpectedText,
    cursor: Cursor,
    buffer: HypothesisBuffer,
    streak: NoMatchStreak,
    completion_reported: bool,
}

impl PageContext {
    pub fn new(expected: ExpectedText, buffer_capacity: usize, streak_threshold: u32) -> Self {
        let cursor = Cursor::new(expected.len());
        Self {
            expected,
            cursor,
            buffer: HypothesisBuffer::new(buffer_capacity),
            streak: NoMatchStreak::new(streak_threshold),
            completion_reported: false,
        }
    }

    /// Buffers `event`, reconciles, then trims the pile.
    ///
    /// Empty events are ignored entirely. A final event that matches
    /// nothing extends the no-match streak unless the page is already
    /// complete.
    pub fn process(&mut self, event: &RecognitionEvent, reconciler: &MatchReconciler) -> PassOutcome {
        let mut outcome = PassOutcome::default();
        if event.is_empty() {
            return outcome;
        }

        self.buffer.append(event);
        outcome.matched = reconciler.reconcile(&self.expected, &mut self.cursor, &mut self.buffer);
        outcome.trimmed = self.buffer.trim();

        if outcome.matched > 0 {
            self.streak.reset();
            outcome.completed = self.take_completion();
        } else if event.is_final && !self.is_complete() && self.streak.record_miss() {
            outcome.encourage = self.expected_word().map(str::to_owned);
        }
        outcome
    }

    /// Moves past the current word without hearing it. Returns false once
    /// the page is complete.
    pub fn skip(&mut self) -> bool {
        if !self.cursor.advance() {
            return false;
        }
        self.streak.reset();
        true
    }

    /// True exactly once, the first time it is called on a complete page.
    pub fn take_completion(&mut self) -> bool {
        if self.is_complete() && !self.completion_reported {
            self.completion_reported = true;
            return true;
        }
        false
    }

    /// Drops the pile and the streak; the cursor is kept.
    pub fn clear_session(&mut self) {
        self.buffer.clear();
        self.streak.reset();
    }

    pub fn is_complete(&self) -> bool {
        self.cursor.is_at_end()
    }

    pub fn cursor(&self) -> usize {
        self.cursor.position()
    }

    pub fn expected(&self) -> &ExpectedText {
        &self.expected
    }

    pub fn expected_word(&self) -> Option<&str> {
        self.expected.get(self.cursor.position())
    }

    pub fn buffer(&self) -> &HypothesisBuffer {
        &self.buffer
    }

    pub fn no_match_streak(&self) -> u32 {
        self.streak.count()
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            cursor: self.cursor.position(),
            total: self.expected.len(),
            expected_word: self.expected_word().map(str::to_owned),
            pile: self.buffer.words(),
            no_match_streak: self.streak.count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(words: &[&str]) -> PageContext {
        PageContext::new(ExpectedText::new(words.iter().copied()), 15, 3)
    }

    #[test]
    fn streak_resets_at_threshold() {
        let mut streak = NoMatchStreak::new(3);
        assert!(!streak.record_miss());
        assert!(!streak.record_miss());
        assert!(streak.record_miss());
        assert_eq!(streak.count(), 0);
    }

    #[test]
    fn interim_misses_do_not_count() {
        let mut page = page(&["elephant"]);
        let reconciler = MatchReconciler::default();
        for _ in 0..5 {
            let outcome = page.process(&RecognitionEvent::single("zzz", 0.5, false), &reconciler);
            assert_eq!(outcome.encourage, None);
        }
        assert_eq!(page.no_match_streak(), 0);
    }

    #[test]
    fn completion_is_reported_once() {
        let mut page = page(&["hi"]);
        let reconciler = MatchReconciler::default();
        let first = page.process(&RecognitionEvent::single("hi", 0.9, true), &reconciler);
        assert!(first.completed);
        let again = page.process(&RecognitionEvent::single("hi", 0.9, true), &reconciler);
        assert!(!again.completed);
        assert_eq!(again.encourage, None);
        assert!(!page.take_completion());
    }

    #[test]
    fn skip_advances_and_completes() {
        let mut page = page(&["a", "b"]);
        assert!(page.skip());
        assert_eq!(page.expected_word(), Some("b"));
        assert!(page.skip());
        assert!(!page.skip());
        assert!(page.take_completion());
    }

    #[test]
    fn pile_is_trimmed_after_pass() {
        let mut page = PageContext::new(ExpectedText::new(["nothing"]), 4, 3);
        let outcome = page.process(
            &RecognitionEvent::single("a b c d e f", 0.5, true),
            &MatchReconciler::default(),
        );
        assert_eq!(outcome.trimmed, 2);
        assert_eq!(page.snapshot().pile, ["c", "d", "e", "f"]);
    }
}
