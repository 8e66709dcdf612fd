pub mod scripted;
#[cfg(feature = "vosk")]
pub mod vosk;

pub use scripted::{parse_script, ScriptStep, ScriptedRecognizer};
#[cfg(feature = "vosk")]
pub use self::vosk::VoskRecognizer;
