use std::collections::VecDeque;

use crate::ports::{RecognitionEvent, Token};

/// The "word pile": recognized tokens waiting to be matched, oldest first.
#[derive(Debug, Clone)]
pub struct HypothesisBuffer {
    tokens: VecDeque<Token>,
    capacity: usize,
}

impl HypothesisBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            tokens: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes the tokens of every alternative, in order. Lower-ranked
    /// alternatives are buffered too. Returns how many tokens were added.
    pub fn append(&mut self, event: &RecognitionEvent) -> usize {
        let before = self.tokens.len();
        self.tokens.extend(
            event
                .alternatives
                .iter()
                .flat_map(|alt| alt.tokens.iter())
                .filter(|t| !t.word.trim().is_empty())
                .cloned(),
        );
        self.tokens.len() - before
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push_back(token);
    }

    /// Index of the first token satisfying `pred`.
    pub fn position(&self, pred: impl FnMut(&Token) -> bool) -> Option<usize> {
        self.tokens.iter().position(pred)
    }

    /// Removes tokens `0..=index`.
    pub fn consume_through(&mut self, index: usize) -> Vec<Token> {
        let end = (index + 1).min(self.tokens.len());
        self.tokens.drain(..end).collect()
    }

    /// Drops the oldest tokens beyond capacity. Returns how many were dropped.
    pub fn trim(&mut self) -> usize {
        let excess = self.tokens.len().saturating_sub(self.capacity);
        self.tokens.drain(..excess);
        excess
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn words(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.word.clone()).collect()
    }
}
