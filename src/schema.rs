use crate::engine::saturate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_LABEL_HEADER: &str = "Line item";
pub const DEFAULT_PRIOR_HEADER: &str = "Prior period";
pub const DEFAULT_CURRENT_HEADER: &str = "Current period";

/// A single raw cell as handed over by the file-ingestion side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    /// Numeric coercion. Anything that is not a finite number becomes 0.
    ///
    /// Text is trimmed before parsing; thousands separators are not stripped,
    /// so "1,200" coerces to 0 just like any other unparseable text.
    pub fn to_number(&self) -> f64 {
        let value = match self {
            CellValue::Empty => 0.0,
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            CellValue::Bool(true) => 1.0,
            CellValue::Bool(false) => 0.0,
        };

        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    pub fn to_label(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub label: String,
    pub prior: f64,
    pub current: f64,
}

impl Row {
    pub fn new(label: impl Into<String>, prior: f64, current: f64) -> Self {
        Self {
            label: label.into(),
            prior,
            current,
        }
    }
}

/// Column captions of the three declared input columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementHeaders {
    pub label: String,
    pub prior: String,
    pub current: String,
}

impl Default for StatementHeaders {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL_HEADER.to_string(),
            prior: DEFAULT_PRIOR_HEADER.to_string(),
            current: DEFAULT_CURRENT_HEADER.to_string(),
        }
    }
}

/// Ordered two-period statement. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    headers: StatementHeaders,
    rows: Vec<Row>,
}

impl StatementTable {
    pub fn new(rows: Vec<Row>) -> Self {
        Self::with_headers(StatementHeaders::default(), rows)
    }

    pub fn with_headers(headers: StatementHeaders, rows: Vec<Row>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| Row {
                prior: CellValue::Number(row.prior).to_number(),
                current: CellValue::Number(row.current).to_number(),
                label: row.label,
            })
            .collect();

        Self { headers, rows }
    }

    pub fn headers(&self) -> &StatementHeaders {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRow {
    pub label: String,
    pub prior: f64,
    pub current: f64,
    /// Percentage change of `current` over `prior`
    pub growth_pct: f64,
    /// `prior` as a percentage of the prior total-assets anchor
    pub prior_share_pct: f64,
    /// `current` as a percentage of the current total-assets anchor
    pub current_share_pct: f64,
}

/// Short-term assets over short-term liabilities for both periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Liquidity {
    Available { prior: f64, current: f64 },
    /// One of the short-term anchor rows is missing.
    NotAvailable,
}

impl Liquidity {
    pub fn prior(&self) -> Option<f64> {
        match self {
            Liquidity::Available { prior, .. } => Some(*prior),
            Liquidity::NotAvailable => None,
        }
    }

    pub fn current(&self) -> Option<f64> {
        match self {
            Liquidity::Available { current, .. } => Some(*current),
            Liquidity::NotAvailable => None,
        }
    }

    /// Change from the prior to the current ratio, clamped to a finite value.
    pub fn delta(&self) -> Option<f64> {
        match self {
            Liquidity::Available { prior, current } => Some(saturate(current - prior)),
            Liquidity::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Liquidity::Available { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnchorKind {
    TotalAssets,
    ShortTermAssets,
    ShortTermLiabilities,
}

impl AnchorKind {
    pub fn caption(&self) -> &'static str {
        match self {
            AnchorKind::TotalAssets => "TOTAL ASSETS",
            AnchorKind::ShortTermAssets => "SHORT-TERM ASSETS",
            AnchorKind::ShortTermLiabilities => "SHORT-TERM LIABILITIES",
        }
    }
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.caption())
    }
}

/// Non-fatal signals raised while deriving ratios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AnalysisWarning {
    AnchorNotFound { anchor: AnchorKind },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::AnchorNotFound {
                anchor: AnchorKind::TotalAssets,
            } => write!(
                f,
                "Anchor row '{}' not found; composition shares set to 0",
                AnchorKind::TotalAssets
            ),
            AnalysisWarning::AnchorNotFound { anchor } => write!(
                f,
                "Anchor row '{}' not found; liquidity ratio not available",
                anchor
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementAnalysis {
    pub headers: StatementHeaders,
    pub rows: Vec<EnrichedRow>,
    pub liquidity: Liquidity,
    /// Growth of the short-term assets row, if that row exists
    pub short_term_asset_growth: Option<f64>,
    pub warnings: Vec<AnalysisWarning>,
}

impl StatementAnalysis {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_coercion() {
        assert_eq!(CellValue::Number(12.5).to_number(), 12.5);
        assert_eq!(CellValue::Text(" 1200 ".to_string()).to_number(), 1200.0);
        assert_eq!(CellValue::Text("1e3".to_string()).to_number(), 1000.0);
        assert_eq!(CellValue::Text("1,200".to_string()).to_number(), 0.0);
        assert_eq!(CellValue::Text("n/a".to_string()).to_number(), 0.0);
        assert_eq!(CellValue::Text("NaN".to_string()).to_number(), 0.0);
        assert_eq!(CellValue::Number(f64::INFINITY).to_number(), 0.0);
        assert_eq!(CellValue::Empty.to_number(), 0.0);
        assert_eq!(CellValue::Bool(true).to_number(), 1.0);
    }

    #[test]
    fn test_label_coercion() {
        assert_eq!(CellValue::Empty.to_label(), "");
        assert_eq!(CellValue::Number(100.0).to_label(), "100");
        assert_eq!(CellValue::from("Cash").to_label(), "Cash");
        assert_eq!(CellValue::from(""), CellValue::Empty);
    }

    #[test]
    fn test_table_construction_sanitizes_values() {
        let table = StatementTable::new(vec![Row::new("Cash", f64::NAN, 10.0)]);
        assert_eq!(table.rows()[0].prior, 0.0);
        assert_eq!(table.rows()[0].current, 10.0);
        assert_eq!(table.headers().label, DEFAULT_LABEL_HEADER);
    }

    #[test]
    fn test_liquidity_accessors() {
        let liquidity = Liquidity::Available {
            prior: 1.5,
            current: 2.0,
        };
        assert_eq!(liquidity.delta(), Some(0.5));
        assert_eq!(liquidity.prior(), Some(1.5));
        assert!(Liquidity::NotAvailable.delta().is_none());
        assert!(!Liquidity::NotAvailable.is_available());
    }

    #[test]
    fn test_liquidity_delta_stays_finite_at_extremes() {
        let falling = Liquidity::Available {
            prior: f64::MAX,
            current: f64::MIN,
        };
        assert_eq!(falling.delta(), Some(f64::MIN));

        let rising = Liquidity::Available {
            prior: f64::MIN,
            current: f64::MAX,
        };
        assert_eq!(rising.delta(), Some(f64::MAX));
    }

    #[test]
    fn test_liquidity_json_shape() {
        let json = serde_json::to_string(&Liquidity::NotAvailable).unwrap();
        assert_eq!(json, r#"{"status":"notAvailable"}"#);
    }
}
