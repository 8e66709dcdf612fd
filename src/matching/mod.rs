//! Word matching: similarity scoring, the word pile and the reconciler that
//! moves the read-along cursor.

pub mod buffer;
pub mod page;
pub mod reconciler;
pub mod similarity;
pub mod tables;

pub use buffer::HypothesisBuffer;
pub use page::{NoMatchStreak, PageContext, PageSnapshot, PassOutcome};
pub use reconciler::{Cursor, ExpectedText, MatchReconciler};
pub use similarity::{edit_distance, edit_similarity, normalize, similarity, SimilarityScorer};
