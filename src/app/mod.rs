pub mod controller;
pub mod session;

pub use controller::{RecognitionLifecycleController, SessionState, Snapshot};
pub use session::{BoxedRecognizer, InMsg, Msg, ReadAlongSession, SignalSender};
