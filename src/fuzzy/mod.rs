//! Fuzzy message handling: template normalization and similarity clustering

pub mod grouper;
pub mod normalizer;

pub use grouper::{group, group_with_threshold, MessageGroup};
pub use normalizer::normalize;
