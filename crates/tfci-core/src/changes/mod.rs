//! Change list parsing and test target classification

pub mod classifier;
pub mod parser;

pub use classifier::{ChangeMode, Classification, PathClassifier};
pub use parser::{parse_changes, ChangeItem};
