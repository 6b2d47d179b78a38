use crate::schema::AnchorKind;
use serde::{Deserialize, Serialize};

/// Decides whether a row label identifies an anchor row.
///
/// Lookups go through [`find_anchor`], so a different matching strategy
/// (exact labels, account codes) only needs a new implementation of this trait.
pub trait LabelMatcher {
    fn matches(&self, label: &str, anchor: AnchorKind) -> bool;
}

impl<M: LabelMatcher + ?Sized> LabelMatcher for &M {
    fn matches(&self, label: &str, anchor: AnchorKind) -> bool {
        (**self).matches(label, anchor)
    }
}

impl<M: LabelMatcher + ?Sized> LabelMatcher for Box<M> {
    fn matches(&self, label: &str, anchor: AnchorKind) -> bool {
        (**self).matches(label, anchor)
    }
}

/// Label patterns per anchor row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorLabels {
    pub total_assets: Vec<String>,
    pub short_term_assets: Vec<String>,
    pub short_term_liabilities: Vec<String>,
}

impl Default for AnchorLabels {
    fn default() -> Self {
        Self {
            total_assets: vec![AnchorKind::TotalAssets.caption().to_string()],
            short_term_assets: vec![AnchorKind::ShortTermAssets.caption().to_string()],
            short_term_liabilities: vec![AnchorKind::ShortTermLiabilities.caption().to_string()],
        }
    }
}

impl AnchorLabels {
    /// Labels used by Vietnamese balance sheets (VAS B01-DN layout).
    pub fn vietnamese() -> Self {
        Self {
            total_assets: vec!["TỔNG CỘNG TÀI SẢN".to_string()],
            short_term_assets: vec!["TÀI SẢN NGẮN HẠN".to_string()],
            short_term_liabilities: vec!["NỢ NGẮN HẠN".to_string()],
        }
    }

    pub fn bilingual() -> Self {
        let mut labels = Self::default();
        let vietnamese = Self::vietnamese();
        labels.total_assets.extend(vietnamese.total_assets);
        labels.short_term_assets.extend(vietnamese.short_term_assets);
        labels
            .short_term_liabilities
            .extend(vietnamese.short_term_liabilities);
        labels
    }

    pub fn patterns(&self, anchor: AnchorKind) -> &[String] {
        match anchor {
            AnchorKind::TotalAssets => &self.total_assets,
            AnchorKind::ShortTermAssets => &self.short_term_assets,
            AnchorKind::ShortTermLiabilities => &self.short_term_liabilities,
        }
    }
}

/// Case-insensitive substring match against any configured pattern.
#[derive(Debug, Clone, Default)]
pub struct ContainsLabelMatcher {
    labels: AnchorLabels,
}

impl ContainsLabelMatcher {
    pub fn new(labels: AnchorLabels) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &AnchorLabels {
        &self.labels
    }
}

impl LabelMatcher for ContainsLabelMatcher {
    fn matches(&self, label: &str, anchor: AnchorKind) -> bool {
        if label.is_empty() {
            return false;
        }

        let haystack = label.to_uppercase();
        self.labels
            .patterns(anchor)
            .iter()
            .filter(|pattern| !pattern.is_empty())
            .any(|pattern| haystack.contains(&pattern.to_uppercase()))
    }
}

/// Whole-label match, ignoring case and surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct ExactLabelMatcher {
    labels: AnchorLabels,
}

impl ExactLabelMatcher {
    pub fn new(labels: AnchorLabels) -> Self {
        Self { labels }
    }
}

impl LabelMatcher for ExactLabelMatcher {
    fn matches(&self, label: &str, anchor: AnchorKind) -> bool {
        let label = label.trim().to_uppercase();
        self.labels
            .patterns(anchor)
            .iter()
            .any(|pattern| pattern.trim().to_uppercase() == label)
    }
}

/// Index of the first row whose label identifies `anchor`.
pub fn find_anchor<'a, I, M>(labels: I, anchor: AnchorKind, matcher: &M) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
    M: LabelMatcher + ?Sized,
{
    labels
        .into_iter()
        .position(|label| matcher.matches(label, anchor))
}
