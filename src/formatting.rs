use crate::schema::{EnrichedRow, Liquidity, StatementHeaders};

/// Shown wherever a ratio could not be derived.
pub const NOT_AVAILABLE: &str = "N/A";

/// Whole number with thousands separators, e.g. `-1,234,568`.
pub fn format_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0.0 && grouped.chars().any(|c| c != '0') {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

pub fn format_ratio(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_optional_percent(value: Option<f64>) -> String {
    value
        .map(format_percent)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Display strings for the two liquidity metrics and their change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityDisplay {
    pub prior: String,
    pub current: String,
    pub delta: Option<String>,
}

impl From<&Liquidity> for LiquidityDisplay {
    fn from(liquidity: &Liquidity) -> Self {
        Self {
            prior: format_ratio(liquidity.prior()),
            current: format_ratio(liquidity.current()),
            delta: liquidity.delta().map(|d| format!("{:.2}", d)),
        }
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Renders enriched rows as a pipe table: raw values with thousands
/// separators, derived columns as 2-decimal percentages.
pub fn render_markdown_table(headers: &StatementHeaders, rows: &[EnrichedRow]) -> String {
    let mut out = format!(
        "| {} | {} | {} | Growth (%) | Prior share (%) | Current share (%) |\n",
        escape_cell(&headers.label),
        escape_cell(&headers.prior),
        escape_cell(&headers.current)
    );
    out.push_str("|:---|---:|---:|---:|---:|---:|\n");

    for row in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            escape_cell(&row.label),
            format_thousands(row.prior),
            format_thousands(row.current),
            format_percent(row.growth_pct),
            format_percent(row.prior_share_pct),
            format_percent(row.current_share_pct)
        ));
    }

    out
}
