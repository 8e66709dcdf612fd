pub mod feedback;
pub mod recognizer;
pub mod scheduler;

pub use feedback::{Feedback, FeedbackSink, PraiseLevel};
pub use recognizer::{
    HypothesisAlternative, RecognitionEvent, RecognizerError, RecognizerSignals, SpeechRecognizer,
    Token,
};
pub use scheduler::{Scheduler, TaskHandle};
