use serde::Serialize;

/// Progress reported to the page layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Feedback {
    /// `count` expected words were recognized in one pass.
    WordsMatched {
        count: usize,
        cursor: usize,
        is_final: bool,
    },
    /// Several final results in a row matched nothing.
    NoMatchStreak { expected_word: String },
    /// Fired once per page.
    PageComplete,
    /// Fired once per engine; nothing will ever start afterwards.
    RecognitionUnsupported,
    WordSkipped { cursor: usize },
}

/// How enthusiastic the caller should be about a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PraiseLevel {
    /// Interim single-word progress; nothing worth announcing yet.
    Quiet,
    /// One word confirmed by a final result.
    Good,
    /// Several words in one go.
    Great,
}

impl PraiseLevel {
    pub fn for_match(count: usize, is_final: bool) -> Self {
        match count {
            0 => PraiseLevel::Quiet,
            1 if is_final => PraiseLevel::Good,
            1 => PraiseLevel::Quiet,
            _ => PraiseLevel::Great,
        }
    }
}

pub trait FeedbackSink {
    fn emit(&mut self, feedback: Feedback);
}

impl FeedbackSink for Vec<Feedback> {
    fn emit(&mut self, feedback: Feedback) {
        self.push(feedback);
    }
}
