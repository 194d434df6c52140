//! Strategy selection and the resolve entry point.
//!
//! A [`Resolver`] is built with exactly one matcher. The staged matcher is
//! the production path; the scored matcher is the experimental alternative.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ResolveError;
use crate::model::types::{Module, Resolution};
use crate::search::canonicalize::is_blank;
use crate::search::flatten::flatten_nonempty;
use crate::search::query::{StagedConfig, StagedMatcher};
use crate::search::similarity::{ScoredConfig, ScoredMatcher};

/// Cooperative cancellation flag, checked between stages and per module.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<(), ResolveError> {
        if self.is_cancelled() {
            Err(ResolveError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A query-to-module resolution strategy.
pub trait Matcher: Send + Sync {
    fn kind(&self) -> MatcherKind;

    fn resolve(
        &self,
        query: &str,
        modules: &[Module],
        cancel: &CancelToken,
    ) -> Result<Resolution, ResolveError>;
}

impl Matcher for StagedMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Staged
    }

    fn resolve(
        &self,
        query: &str,
        modules: &[Module],
        cancel: &CancelToken,
    ) -> Result<Resolution, ResolveError> {
        let documents = flatten_nonempty(modules)?;
        self.resolve_documents(query, &documents, cancel)
    }
}

impl Matcher for ScoredMatcher {
    fn kind(&self) -> MatcherKind {
        MatcherKind::Scored
    }

    fn resolve(
        &self,
        query: &str,
        modules: &[Module],
        cancel: &CancelToken,
    ) -> Result<Resolution, ResolveError> {
        self.resolve_modules(query, modules, cancel)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MatcherKind {
    /// Boolean, then fuzzy, then substring search.
    #[default]
    Staged,
    /// Per-field similarity ratios (experimental).
    Scored,
}

impl MatcherKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatcherKind::Staged => "staged",
            MatcherKind::Scored => "scored",
        }
    }
}

impl std::str::FromStr for MatcherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staged" => Ok(MatcherKind::Staged),
            "scored" => Ok(MatcherKind::Scored),
            other => Err(format!("unknown matcher: {other}")),
        }
    }
}

pub struct Resolver {
    matcher: Box<dyn Matcher>,
}

impl Resolver {
    pub fn new(matcher: Box<dyn Matcher>) -> Self {
        Self { matcher }
    }

    pub fn staged(config: StagedConfig) -> Self {
        Self::new(Box::new(StagedMatcher::new(config)))
    }

    pub fn scored(config: ScoredConfig) -> Self {
        Self::new(Box::new(ScoredMatcher::new(config)))
    }

    pub fn from_kind(kind: MatcherKind, staged: StagedConfig, scored: ScoredConfig) -> Self {
        match kind {
            MatcherKind::Staged => Self::staged(staged),
            MatcherKind::Scored => Self::scored(scored),
        }
    }

    pub fn kind(&self) -> MatcherKind {
        self.matcher.kind()
    }

    pub fn resolve(&self, query: &str, modules: &[Module]) -> Result<Resolution, ResolveError> {
        self.resolve_with(query, modules, &CancelToken::default())
    }

    /// Resolve `query` against a catalog snapshot. Blank queries and empty
    /// catalogs are errors, never `NotFound`.
    pub fn resolve_with(
        &self,
        query: &str,
        modules: &[Module],
        cancel: &CancelToken,
    ) -> Result<Resolution, ResolveError> {
        if is_blank(query) {
            return Err(ResolveError::EmptyQuery);
        }
        if modules.is_empty() {
            return Err(ResolveError::EmptyCatalog);
        }
        debug!(
            matcher = self.kind().as_str(),
            query,
            modules = modules.len(),
            "resolve_start"
        );
        self.matcher.resolve(query, modules, cancel)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::staged(StagedConfig::default())
    }
}
