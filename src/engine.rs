use crate::anchors::{find_anchor, ContainsLabelMatcher, LabelMatcher};
use crate::schema::{
    AnalysisWarning, AnchorKind, EnrichedRow, Liquidity, Row, StatementAnalysis, StatementHeaders,
    StatementTable,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Stand-in denominator for an exact zero in growth and composition ratios.
pub const ZERO_DENOMINATOR_EPSILON: f64 = 1e-9;

fn epsilon_denominator(value: f64) -> f64 {
    if value == 0.0 {
        ZERO_DENOMINATOR_EPSILON
    } else {
        value
    }
}

pub(crate) fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}

/// Percentage change from `prior` to `current`. A zero `prior` yields a large
/// finite value carrying the sign of the change.
pub fn growth_pct(prior: f64, current: f64) -> f64 {
    saturate((current - prior) / epsilon_denominator(prior) * 100.0)
}

/// `value` as a percentage of `anchor`, with the same zero policy as growth.
pub fn share_pct(value: f64, anchor: f64) -> f64 {
    saturate(value / epsilon_denominator(anchor) * 100.0)
}

/// Assets over liabilities; exactly 0 when there are no liabilities.
pub fn liquidity_ratio(assets: f64, liabilities: f64) -> f64 {
    if liabilities == 0.0 {
        0.0
    } else {
        saturate(assets / liabilities)
    }
}

pub struct RatioEngine<M = ContainsLabelMatcher> {
    matcher: M,
}

impl Default for RatioEngine<ContainsLabelMatcher> {
    fn default() -> Self {
        Self::with_matcher(ContainsLabelMatcher::default())
    }
}

impl<M: LabelMatcher> RatioEngine<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn analyze(&self, table: &StatementTable) -> StatementAnalysis {
        info!("Deriving ratios for statement with {} rows", table.len());

        let mut warnings = Vec::new();

        let mut rows = self.derive_growth(table.rows());
        if let Err(warning) = self.apply_composition(table.rows(), &mut rows) {
            warnings.push(warning);
        }

        let (liquidity, liquidity_warnings) = self.derive_liquidity(table.rows());
        warnings.extend(liquidity_warnings);

        let short_term_asset_growth = self
            .locate(table.rows(), AnchorKind::ShortTermAssets)
            .map(|idx| rows[idx].growth_pct);

        for warning in &warnings {
            warn!("{}", warning);
        }

        StatementAnalysis {
            headers: table.headers().clone(),
            rows,
            liquidity,
            short_term_asset_growth,
            warnings,
        }
    }

    /// One enriched row per input row, in input order, with shares still 0.
    pub fn derive_growth(&self, rows: &[Row]) -> Vec<EnrichedRow> {
        rows.iter()
            .map(|row| EnrichedRow {
                label: row.label.clone(),
                prior: row.prior,
                current: row.current,
                growth_pct: growth_pct(row.prior, row.current),
                prior_share_pct: 0.0,
                current_share_pct: 0.0,
            })
            .collect()
    }

    /// Fills the share columns from the unmodified `rows` values. Without a
    /// total-assets row every share stays 0 and the warning is returned.
    pub fn apply_composition(
        &self,
        rows: &[Row],
        enriched: &mut [EnrichedRow],
    ) -> std::result::Result<(), AnalysisWarning> {
        for row in enriched.iter_mut() {
            row.prior_share_pct = 0.0;
            row.current_share_pct = 0.0;
        }

        let anchor = self
            .locate(rows, AnchorKind::TotalAssets)
            .map(|idx| &rows[idx])
            .ok_or(AnalysisWarning::AnchorNotFound {
                anchor: AnchorKind::TotalAssets,
            })?;

        debug!(
            "Total assets anchor '{}': prior={}, current={}",
            anchor.label, anchor.prior, anchor.current
        );

        for (source, row) in rows.iter().zip(enriched.iter_mut()) {
            row.prior_share_pct = share_pct(source.prior, anchor.prior);
            row.current_share_pct = share_pct(source.current, anchor.current);
        }

        Ok(())
    }

    pub fn derive_liquidity(&self, rows: &[Row]) -> (Liquidity, Vec<AnalysisWarning>) {
        let assets = self.locate(rows, AnchorKind::ShortTermAssets);
        let liabilities = self.locate(rows, AnchorKind::ShortTermLiabilities);

        match (assets, liabilities) {
            (Some(a), Some(l)) => {
                let (assets, liabilities) = (&rows[a], &rows[l]);
                let liquidity = Liquidity::Available {
                    prior: liquidity_ratio(assets.prior, liabilities.prior),
                    current: liquidity_ratio(assets.current, liabilities.current),
                };
                debug!("Liquidity ratio: {:?}", liquidity);
                (liquidity, Vec::new())
            }
            (assets, liabilities) => {
                let mut warnings = Vec::new();
                if assets.is_none() {
                    warnings.push(AnalysisWarning::AnchorNotFound {
                        anchor: AnchorKind::ShortTermAssets,
                    });
                }
                if liabilities.is_none() {
                    warnings.push(AnalysisWarning::AnchorNotFound {
                        anchor: AnchorKind::ShortTermLiabilities,
                    });
                }
                (Liquidity::NotAvailable, warnings)
            }
        }
    }

    fn locate(&self, rows: &[Row], anchor: AnchorKind) -> Option<usize> {
        find_anchor(rows.iter().map(|r| r.label.as_str()), anchor, &self.matcher)
    }
}

/// Content of a table reduced to hashable parts. Values are keyed by their
/// bit patterns so that equal keys always produce bit-identical analyses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableKey {
    headers: StatementHeaders,
    rows: Vec<(String, u64, u64)>,
}

impl TableKey {
    fn of(table: &StatementTable) -> Self {
        Self {
            headers: table.headers().clone(),
            rows: table
                .rows()
                .iter()
                .map(|r| (r.label.clone(), r.prior.to_bits(), r.current.to_bits()))
                .collect(),
        }
    }
}

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Memoizes analyses by table content. Safe to share between threads.
pub struct AnalysisCache<M = ContainsLabelMatcher> {
    engine: RatioEngine<M>,
    capacity: usize,
    entries: Mutex<HashMap<TableKey, Arc<StatementAnalysis>>>,
}

impl Default for AnalysisCache<ContainsLabelMatcher> {
    fn default() -> Self {
        Self::new(RatioEngine::default(), DEFAULT_CACHE_CAPACITY)
    }
}

impl<M: LabelMatcher> AnalysisCache<M> {
    pub fn new(engine: RatioEngine<M>, capacity: usize) -> Self {
        Self {
            engine,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn analyze(&self, table: &StatementTable) -> Arc<StatementAnalysis> {
        let key = TableKey::of(table);

        if let Some(hit) = self.lock().get(&key) {
            debug!("Analysis cache hit ({} rows)", table.len());
            return Arc::clone(hit);
        }

        let analysis = Arc::new(self.engine.analyze(table));

        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            entries.clear();
        }
        entries.insert(key, Arc::clone(&analysis));

        analysis
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TableKey, Arc<StatementAnalysis>>> {
        // Entries are inserted whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::{AnchorLabels, ExactLabelMatcher};

    fn sample_table() -> StatementTable {
        StatementTable::new(vec![
            Row::new("TOTAL ASSETS", 1000.0, 1200.0),
            Row::new("SHORT-TERM ASSETS", 400.0, 600.0),
            Row::new("SHORT-TERM LIABILITIES", 200.0, 300.0),
        ])
    }

    #[test]
    fn test_growth_with_nonzero_prior() {
        assert_eq!(growth_pct(400.0, 600.0), (600.0 - 400.0) / 400.0 * 100.0);
        assert_eq!(growth_pct(200.0, 150.0), -25.0);
    }

    #[test]
    fn test_growth_with_zero_prior_is_large_and_signed() {
        let up = growth_pct(0.0, 5.0);
        assert!(up.is_finite());
        assert!(up > 1e9);

        let down = growth_pct(0.0, -5.0);
        assert!(down.is_finite());
        assert!(down < -1e9);

        assert_eq!(growth_pct(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_growth_saturates_instead_of_overflowing() {
        let g = growth_pct(0.0, 1e300);
        assert!(g.is_finite());
        assert_eq!(g, f64::MAX);
    }

    #[test]
    fn test_liquidity_ratio_zero_liabilities() {
        assert_eq!(liquidity_ratio(400.0, 0.0), 0.0);
        assert_eq!(liquidity_ratio(400.0, 200.0), 2.0);
    }

    #[test]
    fn test_composition_anchor_is_hundred_percent() {
        let analysis = RatioEngine::default().analyze(&sample_table());
        assert_eq!(analysis.rows[0].prior_share_pct, 100.0);
        assert_eq!(analysis.rows[0].current_share_pct, 100.0);
        assert_eq!(analysis.rows[1].prior_share_pct, 40.0);
        assert_eq!(analysis.rows[1].current_share_pct, 50.0);
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn test_zero_total_assets_uses_epsilon() {
        let table = StatementTable::new(vec![
            Row::new("Total assets", 0.0, 100.0),
            Row::new("Cash", 1.0, 50.0),
        ]);
        let analysis = RatioEngine::default().analyze(&table);
        assert_eq!(analysis.rows[1].prior_share_pct, 1.0 / ZERO_DENOMINATOR_EPSILON * 100.0);
        assert_eq!(analysis.rows[1].current_share_pct, 50.0);
    }

    #[test]
    fn test_first_total_assets_row_wins() {
        let table = StatementTable::new(vec![
            Row::new("Cash", 100.0, 100.0),
            Row::new("Total assets", 500.0, 400.0),
            Row::new("Total assets (restated)", 1000.0, 1000.0),
        ]);
        let analysis = RatioEngine::default().analyze(&table);
        assert_eq!(analysis.rows[0].prior_share_pct, 20.0);
        assert_eq!(analysis.rows[0].current_share_pct, 25.0);
    }

    #[test]
    fn test_missing_liquidity_anchor() {
        let table = StatementTable::new(vec![
            Row::new("TOTAL ASSETS", 1000.0, 1200.0),
            Row::new("SHORT-TERM ASSETS", 400.0, 600.0),
        ]);
        let analysis = RatioEngine::default().analyze(&table);
        assert_eq!(analysis.liquidity, Liquidity::NotAvailable);
        assert_eq!(
            analysis.warnings,
            vec![AnalysisWarning::AnchorNotFound {
                anchor: AnchorKind::ShortTermLiabilities
            }]
        );
        assert_eq!(analysis.short_term_asset_growth, Some(50.0));
    }

    #[test]
    fn test_custom_matcher() {
        let labels = AnchorLabels {
            total_assets: vec!["270".to_string()],
            short_term_assets: vec!["100".to_string()],
            short_term_liabilities: vec!["310".to_string()],
        };
        let engine = RatioEngine::with_matcher(ExactLabelMatcher::new(labels));
        let table = StatementTable::new(vec![
            Row::new("270", 1000.0, 1000.0),
            Row::new("100", 300.0, 500.0),
            Row::new("310", 100.0, 250.0),
        ]);
        let analysis = engine.analyze(&table);
        assert_eq!(
            analysis.liquidity,
            Liquidity::Available {
                prior: 3.0,
                current: 2.0
            }
        );
        assert_eq!(analysis.rows[1].current_share_pct, 50.0);
    }

    #[test]
    fn test_cache_returns_same_analysis() {
        let cache = AnalysisCache::default();
        let first = cache.analyze(&sample_table());
        let second = cache.analyze(&sample_table());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let other = StatementTable::new(vec![Row::new("Cash", 1.0, 2.0)]);
        let third = cache.analyze(&other);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_evicts_when_full() {
        let cache = AnalysisCache::new(RatioEngine::default(), 1);
        cache.analyze(&sample_table());
        cache.analyze(&StatementTable::new(vec![Row::new("Cash", 1.0, 2.0)]));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
