pub mod recognizer;
pub mod scheduler;
