//! The matcher facade.

use std::sync::Arc;

use em_model::{
    BlockingConfig, DEFAULT_THRESHOLD, FieldColumn, MatchConfig, MatchError, Result,
    SimilarityMethod,
};
use em_scoring::{EmbeddingProvider, ScorerRegistry, score_pairs};
use polars::prelude::DataFrame;
use tracing::{debug, info, info_span};

use crate::aggregate::{MatchTable, decide_aligned};
use crate::candidates::generate_candidates;
use crate::cluster::cluster;
use crate::labels::GroupLabels;
use crate::resource::{ResourcePolicy, SystemMemory, pair_footprint};
use crate::table::{field_column, require_columns};

/// Outcome of one resolution run.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub labels: GroupLabels,
    pub matches: MatchTable,
    /// Blocking that was actually applied; `None` means all pairs.
    pub blocking: Option<BlockingConfig>,
    /// True when default blocking replaced an unblocked run to stay within
    /// the memory budget.
    pub blocking_adapted: bool,
    pub candidate_count: usize,
}

impl Resolution {
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn group_count(&self) -> usize {
        self.labels.groups().len()
    }
}

/// Resolves duplicate records in a table according to a [`MatchConfig`].
///
/// ```no_run
/// use em_core::{EntityMatcher, MatchConfig};
/// # fn run(df: &polars::prelude::DataFrame) -> em_core::Result<()> {
/// let config = MatchConfig::from_json_str(r#"{"scoring": {"title": "fuzzy"}}"#)?;
/// let labels = EntityMatcher::new(config).with_threshold(0.8).get_matches(df)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EntityMatcher {
    config: MatchConfig,
    threshold: f64,
    resource_policy: Arc<dyn ResourcePolicy>,
    registry: ScorerRegistry,
}

impl EntityMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            threshold: DEFAULT_THRESHOLD,
            resource_policy: Arc::new(SystemMemory),
            registry: ScorerRegistry::new(),
        }
    }

    /// Aggregate score a pair must strictly exceed to match. Must lie in
    /// `[0, 1]`; [`Self::resolve`] rejects anything else.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_resource_policy(mut self, policy: impl ResourcePolicy + 'static) -> Self {
        self.resource_policy = Arc::new(policy);
        self
    }

    #[must_use]
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.registry = self.registry.with_embedding_provider(provider);
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Group label per row of `df`.
    pub fn get_matches(&self, df: &DataFrame) -> Result<GroupLabels> {
        self.resolve(df).map(|resolution| resolution.labels)
    }

    /// Run the full pipeline over `df`.
    ///
    /// # Errors
    ///
    /// - [`MatchError::MissingColumn`] when a scored field is not a column.
    /// - [`MatchError::Config`] when the threshold is outside `[0, 1]` or
    ///   embedding similarity is configured without a provider.
    ///
    /// Both are detected before any pair is generated.
    pub fn resolve(&self, df: &DataFrame) -> Result<Resolution> {
        let record_count = df.height();
        let span = info_span!("resolve", records = record_count, threshold = self.threshold);
        let _guard = span.enter();

        self.validate(df)?;
        let (blocking, blocking_adapted) = self.effective_blocking(record_count);

        let columns: Vec<(&str, FieldColumn)> = self
            .config
            .fields()
            .map(|field| Ok((field, field_column(df, field)?)))
            .collect::<Result<_>>()?;
        let column_refs: Vec<&[_]> = columns.iter().map(|(_, column)| column.as_slice()).collect();

        let candidates = {
            let _stage = info_span!("candidates").entered();
            generate_candidates(blocking.as_ref(), &column_refs, record_count)
        };

        let mut field_scores = Vec::with_capacity(columns.len());
        for (entry, (field, column)) in self.config.scoring().iter().zip(&columns) {
            let _stage = info_span!("score", field = %field, method = entry.method.name()).entered();
            let scores = score_pairs(entry.method, column, &candidates, &self.registry)?;
            field_scores.push(scores);
        }

        let matches = decide_aligned(&candidates, &field_scores, self.threshold);
        let labels = cluster(&matches.pairs(), record_count);
        info!(
            candidates = candidates.len(),
            matches = matches.len(),
            labeled = labels.labeled_count(),
            "resolution complete"
        );
        Ok(Resolution {
            labels,
            matches,
            blocking,
            blocking_adapted,
            candidate_count: candidates.len(),
        })
    }

    fn validate(&self, df: &DataFrame) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MatchError::config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        require_columns(df, self.config.fields())?;
        let needs_provider = self
            .config
            .scoring()
            .iter()
            .any(|entry| !self.registry.supports(entry.method));
        if needs_provider {
            return Err(MatchError::config(format!(
                "'{}' similarity requires an embedding provider",
                SimilarityMethod::Embedding.name()
            )));
        }
        Ok(())
    }

    /// The configured blocking, or default blocking when an unblocked run
    /// would not fit the resource policy.
    fn effective_blocking(&self, record_count: usize) -> (Option<BlockingConfig>, bool) {
        if let Some(blocking) = self.config.blocking() {
            return (Some(*blocking), false);
        }
        if self
            .resource_policy
            .exceeds_budget(record_count, pair_footprint(self.config.scoring().len()))
        {
            let fallback = BlockingConfig::default();
            info!(
                records = record_count,
                blocking = %fallback,
                "all-pairs comparison exceeds the memory budget, applying default blocking"
            );
            return (Some(fallback), true);
        }
        debug!(records = record_count, "comparing all pairs");
        (None, false)
    }
}

impl std::fmt::Debug for EntityMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMatcher")
            .field("config", &self.config)
            .field("threshold", &self.threshold)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use em_model::FieldScoring;
    use polars::prelude::{IntoColumn, NamedFrom, Series};

    use crate::resource::MemoryBudget;

    use super::*;

    struct AlwaysOver;

    impl ResourcePolicy for AlwaysOver {
        fn exceeds_budget(&self, _record_count: usize, _item_size: usize) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct CountingPolicy {
        calls: AtomicUsize,
        item_size: AtomicUsize,
    }

    impl ResourcePolicy for Arc<CountingPolicy> {
        fn exceeds_budget(&self, _record_count: usize, item_size: usize) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.item_size.store(item_size, Ordering::SeqCst);
            false
        }
    }

    fn songs() -> DataFrame {
        DataFrame::new(vec![
            Series::new("title".into(), vec!["hey jude", "hey jude", "let it be"]).into_column(),
        ])
        .unwrap()
    }

    fn title_config(method: SimilarityMethod) -> MatchConfig {
        MatchConfig::new(vec![FieldScoring::new("title", method)]).unwrap()
    }

    #[test]
    fn missing_field_fails_before_matching() {
        let config = MatchConfig::new(vec![FieldScoring::new("album", SimilarityMethod::Exact)])
            .unwrap();
        let err = EntityMatcher::new(config).resolve(&songs()).unwrap_err();
        assert_eq!(err.column(), Some("album"));
    }

    #[test]
    fn embedding_without_provider_is_rejected() {
        let err = EntityMatcher::new(title_config(SimilarityMethod::Embedding))
            .resolve(&songs())
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn exact_duplicates_share_a_group() {
        let resolution = EntityMatcher::new(title_config(SimilarityMethod::Exact))
            .with_resource_policy(MemoryBudget::new(u64::MAX))
            .resolve(&songs())
            .unwrap();
        assert_eq!(resolution.labels.as_slice(), &[Some(0), Some(0), None]);
        assert_eq!(resolution.candidate_count, 3);
        assert_eq!(resolution.match_count(), 1);
        assert_eq!(resolution.blocking, None);
        assert!(!resolution.blocking_adapted);
    }

    #[test]
    fn over_budget_switches_to_default_blocking() {
        let resolution = EntityMatcher::new(title_config(SimilarityMethod::fuzzy()))
            .with_resource_policy(AlwaysOver)
            .resolve(&songs())
            .unwrap();
        assert_eq!(resolution.blocking, Some(BlockingConfig::default()));
        assert!(resolution.blocking_adapted);
        assert_eq!(resolution.candidate_count, 1);
        assert_eq!(resolution.labels.as_slice(), &[Some(0), Some(0), None]);
    }

    #[test]
    fn configured_blocking_is_never_replaced() {
        let config = title_config(SimilarityMethod::Exact).with_blocking(BlockingConfig {
            operation: em_model::BlockingOperation::Token,
            process: None,
        });
        let resolution = EntityMatcher::new(config)
            .with_resource_policy(AlwaysOver)
            .resolve(&songs())
            .unwrap();
        assert!(!resolution.blocking_adapted);
        assert_eq!(resolution.match_count(), 1);
    }

    #[test]
    fn threshold_outside_unit_range_is_rejected() {
        for threshold in [f64::NAN, 1.5, -0.1] {
            let err = EntityMatcher::new(title_config(SimilarityMethod::Exact))
                .with_threshold(threshold)
                .resolve(&songs())
                .unwrap_err();
            assert!(err.is_config(), "{threshold} accepted");
        }
        for threshold in [0.0, 1.0] {
            assert!(
                EntityMatcher::new(title_config(SimilarityMethod::Exact))
                    .with_threshold(threshold)
                    .resolve(&songs())
                    .is_ok()
            );
        }
    }

    #[test]
    fn policy_is_consulted_on_every_resolve() {
        let policy = Arc::new(CountingPolicy::default());
        let matcher = EntityMatcher::new(title_config(SimilarityMethod::Exact))
            .with_resource_policy(Arc::clone(&policy));
        matcher.resolve(&songs()).unwrap();
        matcher.resolve(&songs()).unwrap();
        assert_eq!(policy.calls.load(Ordering::SeqCst), 2);
        assert_eq!(policy.item_size.load(Ordering::SeqCst), pair_footprint(1));
    }

    #[test]
    fn empty_table_resolves_to_nothing() {
        let df = DataFrame::new(vec![
            Series::new("title".into(), Vec::<String>::new()).into_column(),
        ])
        .unwrap();
        let labels = EntityMatcher::new(title_config(SimilarityMethod::fuzzy()))
            .get_matches(&df)
            .unwrap();
        assert!(labels.is_empty());
    }
}
