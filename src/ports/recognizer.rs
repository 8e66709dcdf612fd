use serde::{Deserialize, Serialize};

use crate::config::RecognizerSettings;

/// A single recognized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub word: String,
    pub confidence: f32,
}

/// One transcript guess, already split into tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisAlternative {
    pub tokens: Vec<Token>,
    pub confidence: f32,
}

impl HypothesisAlternative {
    /// Splits `transcript` on whitespace; every token inherits the
    /// alternative's confidence.
    pub fn from_transcript(transcript: &str, confidence: f32) -> Self {
        let tokens = transcript
            .split_whitespace()
            .map(|w| Token {
                word: w.to_owned(),
                confidence,
            })
            .collect();
        Self { tokens, confidence }
    }

    pub fn transcript(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.word.as_str())
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

/// One recognizer callback worth of hypotheses, best guess first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecognitionEvent {
    pub alternatives: Vec<HypothesisAlternative>,
    pub is_final: bool,
}

impl RecognitionEvent {
    pub fn new(alternatives: Vec<HypothesisAlternative>, is_final: bool) -> Self {
        Self {
            alternatives,
            is_final,
        }
    }

    /// Shorthand for an event carrying a single alternative.
    pub fn single(transcript: &str, confidence: f32, is_final: bool) -> Self {
        Self::new(
            vec![HypothesisAlternative::from_transcript(transcript, confidence)],
            is_final,
        )
    }

    /// True when there is nothing to buffer: no alternatives, or only
    /// empty transcripts.
    pub fn is_empty(&self) -> bool {
        self.alternatives.iter().all(|a| a.tokens.is_empty())
    }

    pub fn top_transcript(&self) -> Option<String> {
        self.alternatives.first().map(HypothesisAlternative::transcript)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognizerError {
    #[error("speech recognition is not supported on this platform")]
    Unsupported,
    #[error("recognizer failed to start: {0}")]
    Start(String),
    #[error("recognizer error: {0}")]
    Transient(String),
}

/// Control surface of the external speech recognizer.
///
/// Results are not pulled through this trait: the recognizer delivers
/// them asynchronously (see `app::session::SignalSender`), and the host
/// forwards them to the controller's `on_result`/`on_error`/`on_end`.
pub trait SpeechRecognizer {
    /// Whether the capability exists at all. Checked once per engine.
    fn is_supported(&self) -> bool {
        true
    }
    fn start(&mut self, settings: &RecognizerSettings) -> Result<(), RecognizerError>;
    fn stop(&mut self);
}

/// The channel a recognizer reports through: `onResult`, `onError` and
/// `onEnd`. Returns false once nobody is listening any more.
pub trait RecognizerSignals {
    fn result(&mut self, event: RecognitionEvent) -> bool;
    fn error(&mut self, message: String) -> bool;
    fn end(&mut self) -> bool;
}

impl<T: SpeechRecognizer + ?Sized> SpeechRecognizer for Box<T> {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }
    fn start(&mut self, settings: &RecognizerSettings) -> Result<(), RecognizerError> {
        (**self).start(settings)
    }
    fn stop(&mut self) {
        (**self).stop()
    }
}
