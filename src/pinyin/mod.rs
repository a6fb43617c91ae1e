pub mod corrector;
pub mod vocabulary;

pub use corrector::{correct, MatchMode};
pub use vocabulary::Vocabulary;
