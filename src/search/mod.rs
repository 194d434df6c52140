//! Query resolution engine.
//!
//! - **[`flatten`]**: Catalog modules to tagged, sequence-numbered documents.
//! - **[`canonicalize`]**: Text normalization shared by the matchers.
//! - **[`tantivy`]**: Per-call in-memory tantivy index over flattened documents.
//! - **[`query`]**: Staged fallback matcher (boolean, fuzzy, substring).
//! - **[`similarity`]**: Scored-similarity matcher (experimental).
//! - **[`resolver`]**: Matcher trait, strategy selection, cancellation.

pub mod canonicalize;
pub mod flatten;
pub mod query;
pub mod resolver;
pub mod similarity;
pub mod tantivy;

pub use flatten::{flatten, flatten_nonempty};
pub use query::{FuzzyMode, StagedConfig, StagedMatcher, staged_resolve};
pub use resolver::{CancelToken, Matcher, MatcherKind, Resolver};
pub use similarity::{ScoredConfig, ScoredMatcher, SimilarityMetric, scored_resolve};
