use crate::formatting::{format_optional_percent, format_ratio, render_markdown_table};
use crate::schema::StatementAnalysis;

pub const DEFAULT_PREAMBLE: &str = "You are a professional financial analyst. Based on the \
financial indicators below, give an objective and concise assessment of the company's \
financial position. Focus the assessment on the growth rate, the shift in asset composition, \
and short-term liquidity (the current ratio).";

pub const DEFAULT_PARAGRAPHS: &str = "3-4";

/// Builds the plain-text payload for a one-shot advisory request.
pub struct NarrativeRequestBuilder<'a> {
    analysis: &'a StatementAnalysis,
    preamble: String,
    paragraphs: String,
}

impl<'a> NarrativeRequestBuilder<'a> {
    pub fn new(analysis: &'a StatementAnalysis) -> Self {
        Self {
            analysis,
            preamble: DEFAULT_PREAMBLE.to_string(),
            paragraphs: DEFAULT_PARAGRAPHS.to_string(),
        }
    }

    #[must_use]
    pub fn preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Requested length, e.g. "2-3" short paragraphs.
    #[must_use]
    pub fn paragraphs(mut self, paragraphs: impl Into<String>) -> Self {
        self.paragraphs = paragraphs.into();
        self
    }

    pub fn build(&self) -> String {
        let analysis = self.analysis;
        let mut payload = format!(
            "{}\nKeep it to about {} short paragraphs.\n\n",
            self.preamble.trim(),
            self.paragraphs
        );

        payload.push_str("Full analysis table (raw values and derived ratios):\n\n");
        payload.push_str(&render_markdown_table(&analysis.headers, &analysis.rows));
        payload.push('\n');

        payload.push_str("| Metric | Value |\n|:---|---:|\n");
        payload.push_str(&format!(
            "| Short-term assets growth (%) | {} |\n",
            format_optional_percent(analysis.short_term_asset_growth)
        ));
        payload.push_str(&format!(
            "| Current ratio (prior period) | {} |\n",
            format_ratio(analysis.liquidity.prior())
        ));
        payload.push_str(&format!(
            "| Current ratio (current period) | {} |\n",
            format_ratio(analysis.liquidity.current())
        ));

        payload
    }
}
