//! Scored-similarity matcher.
//!
//! Every module yields three observations (name, description, commands)
//! scored in `[0, 1]` against the query. Observations below the confidence
//! floor are discarded and the single highest survivor across the whole
//! catalog wins. Ties go to catalog order, then name < description <
//! commands.

use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ResolveError;
use crate::model::types::{FieldTag, MatchObservation, MatchStage, Module, ModuleMatch, Resolution};
use crate::search::canonicalize::{canonicalize_for_similarity, is_blank};
use crate::search::resolver::CancelToken;

/// Edit-similarity metrics from `strsim`, all normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SimilarityMetric {
    #[default]
    NormalizedLevenshtein,
    JaroWinkler,
    SorensenDice,
}

impl SimilarityMetric {
    /// Similarity of two canonicalized strings. Empty input on either side
    /// is 0.
    pub fn ratio(self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let score = match self {
            SimilarityMetric::NormalizedLevenshtein => strsim::normalized_levenshtein(a, b),
            SimilarityMetric::JaroWinkler => strsim::jaro_winkler(a, b),
            SimilarityMetric::SorensenDice => strsim::sorensen_dice(a, b),
        };
        if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoredConfig {
    pub metric: SimilarityMetric,
    /// Observations scoring below this are discarded.
    pub min_confidence: f64,
}

impl Default for ScoredConfig {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::NormalizedLevenshtein,
            min_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoredMatcher {
    config: ScoredConfig,
}

impl ScoredMatcher {
    pub fn new(config: ScoredConfig) -> Self {
        Self { config }
    }

    /// All observations for the catalog, in catalog then field order.
    pub fn observe(
        &self,
        query: &str,
        modules: &[Module],
        cancel: &CancelToken,
    ) -> Result<Vec<MatchObservation>, ResolveError> {
        let query = canonicalize_for_similarity(query);
        let metric = self.config.metric;

        let per_module: Vec<[MatchObservation; 3]> = modules
            .par_iter()
            .map(|module| {
                cancel.check()?;
                Ok(observe_module(metric, &query, module))
            })
            .collect::<Result<_, ResolveError>>()?;

        Ok(per_module.into_iter().flatten().collect())
    }

    pub fn resolve_modules(
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

        let started = Instant::now();
        let observations = self.observe(query, modules, cancel)?;
        debug!(
            query,
            observations = observations.len(),
            min_confidence = self.config.min_confidence,
            "scored_observations"
        );

        let Some(best) = select_best(&observations, self.config.min_confidence) else {
            info!(
                query,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "scored_resolve_not_found"
            );
            return Ok(Resolution::NotFound);
        };

        info!(
            query,
            module_id = best.module_id,
            found_by = best.field_tag.label(),
            score = best.score,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scored_resolve_found"
        );
        Ok(Resolution::Found(ModuleMatch {
            module_id: best.module_id,
            matched_field: Some(best.field_tag),
            stage: MatchStage::Similarity,
            score: best.score as f32,
        }))
    }
}

fn observe_module(metric: SimilarityMetric, query: &str, module: &Module) -> [MatchObservation; 3] {
    let ratio = |text: &str| metric.ratio(query, &canonicalize_for_similarity(text));

    let commands = match module.commands.as_slice() {
        [] => 0.0,
        [only] => ratio(&only.command),
        many => many.iter().map(|c| ratio(&c.command)).sum::<f64>() / many.len() as f64,
    };

    [
        MatchObservation {
            module_id: module.id,
            score: ratio(&module.name),
            field_tag: FieldTag::Name,
        },
        MatchObservation {
            module_id: module.id,
            score: ratio(&module.description),
            field_tag: FieldTag::Description,
        },
        MatchObservation {
            module_id: module.id,
            score: commands,
            field_tag: FieldTag::CommandName,
        },
    ]
}

/// Highest observation at or above `floor`; the earliest wins a tie.
pub fn select_best(observations: &[MatchObservation], floor: f64) -> Option<MatchObservation> {
    observations
        .iter()
        .filter(|o| o.score >= floor && o.score > 0.0)
        .fold(None, |best: Option<&MatchObservation>, o| match best {
            Some(b) if o.score.partial_cmp(&b.score) != Some(Ordering::Greater) => Some(b),
            _ => Some(o),
        })
        .copied()
}

/// Scored resolution with default settings.
pub fn scored_resolve(query: &str, modules: &[Module]) -> Result<Resolution, ResolveError> {
    ScoredMatcher::default().resolve_modules(query, modules, &CancelToken::default())
}
