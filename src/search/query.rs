//! Staged fallback matcher.
//!
//! Three strategies run against a per-call [`EphemeralIndex`] in fixed
//! priority order, and the first one with at least one hit decides:
//!
//! 1. **Boolean**: the query parsed as a disjunction of its tokens, BM25
//!    ranked.
//! 2. **Fuzzy**: the query as one fuzzy term (edit distance 1, exact
//!    two-character prefix). [`FuzzyMode::PerToken`] fuzzes each token
//!    instead and unions the hits.
//! 3. **Substring**: documents containing the query verbatim.
//!
//! Ties within a stage go to the lowest sequence number, i.e. the document
//! flattened first.

use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ResolveError;
use crate::model::types::{Document, MatchStage, ModuleMatch, Resolution};
use crate::search::canonicalize::is_blank;
use crate::search::resolver::CancelToken;
use crate::search::tantivy::{EphemeralIndex, IndexHit};

/// How the fuzzy stage treats multi-word queries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FuzzyMode {
    /// The whole query is a single fuzzy term, so multi-word queries almost
    /// never match here.
    #[default]
    WholeQuery,
    /// Each whitespace token is fuzzed on its own.
    PerToken,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StagedConfig {
    pub fuzzy_max_distance: usize,
    pub fuzzy_prefix_len: usize,
    pub fuzzy_mode: FuzzyMode,
    pub substring_case_sensitive: bool,
}

impl Default for StagedConfig {
    fn default() -> Self {
        Self {
            fuzzy_max_distance: 1,
            fuzzy_prefix_len: 2,
            fuzzy_mode: FuzzyMode::WholeQuery,
            substring_case_sensitive: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StagedMatcher {
    config: StagedConfig,
}

impl StagedMatcher {
    pub fn new(config: StagedConfig) -> Self {
        Self { config }
    }

    /// Resolve `query` against already-flattened documents. No documents
    /// means nothing can match, so the result is `NotFound`.
    pub fn resolve_documents(
        &self,
        query: &str,
        documents: &[Document],
        cancel: &CancelToken,
    ) -> Result<Resolution, ResolveError> {
        if is_blank(query) {
            return Err(ResolveError::EmptyQuery);
        }
        if documents.is_empty() {
            debug!(query, "staged_resolve: no documents");
            return Ok(Resolution::NotFound);
        }

        let started = Instant::now();
        let index = EphemeralIndex::build(documents)?;

        for stage in [MatchStage::Boolean, MatchStage::Fuzzy, MatchStage::Substring] {
            cancel.check()?;
            let hits = self.run_stage(&index, stage, query)?;
            debug!(query, stage = stage.as_str(), hits = hits.len(), "stage_done");
            if let Some(best) = hits.first() {
                info!(
                    query,
                    stage = stage.as_str(),
                    module_id = best.owner_id,
                    field = best.field_tag.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "staged_resolve_found"
                );
                return Ok(Resolution::Found(ModuleMatch {
                    module_id: best.owner_id,
                    matched_field: Some(best.field_tag),
                    stage,
                    score: best.score,
                }));
            }
        }

        info!(
            query,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "staged_resolve_not_found"
        );
        Ok(Resolution::NotFound)
    }

    fn run_stage(
        &self,
        index: &EphemeralIndex,
        stage: MatchStage,
        query: &str,
    ) -> Result<Vec<IndexHit>, ResolveError> {
        match stage {
            MatchStage::Boolean => {
                let q = index.parse_disjunction(query)?;
                index.search_ranked(&*q)
            }
            MatchStage::Fuzzy => self.fuzzy_hits(index, query),
            MatchStage::Substring => {
                index.scan_substring(query, self.config.substring_case_sensitive)
            }
            MatchStage::Similarity => Ok(Vec::new()),
        }
    }

    fn fuzzy_hits(&self, index: &EphemeralIndex, query: &str) -> Result<Vec<IndexHit>, ResolveError> {
        // Indexed terms are lowercased by the default analyzer.
        let lowered = query.to_lowercase();
        let fuzzy_terms: Vec<&str> = match self.config.fuzzy_mode {
            FuzzyMode::WholeQuery => vec![lowered.as_str()],
            FuzzyMode::PerToken => lowered.split_whitespace().collect(),
        };

        let mut expanded = BTreeSet::new();
        for term in fuzzy_terms {
            expanded.extend(index.expand_fuzzy_terms(
                term,
                self.config.fuzzy_max_distance,
                self.config.fuzzy_prefix_len,
            )?);
        }
        match index.terms_query(&expanded) {
            Some(q) => index.search_ranked(&*q),
            None => Ok(Vec::new()),
        }
    }
}

/// Staged resolution with default settings.
pub fn staged_resolve(query: &str, documents: &[Document]) -> Result<Resolution, ResolveError> {
    StagedMatcher::default().resolve_documents(query, documents, &CancelToken::default())
}
