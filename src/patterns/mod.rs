//! Patterns Module
//!
//! Learns route-to-route navigation frequencies and predicts likely next
//! routes from them.

mod learner;
mod record;
mod store;
mod writer;


pub use learner::PatternLearner;
pub use record::{Prediction, TransitionRecord};
pub use store::{JsonFilePatternStore, MemoryPatternStore, PatternStore};
pub use writer::PatternWriter;
