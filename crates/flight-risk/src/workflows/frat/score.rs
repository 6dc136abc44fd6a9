use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::catalog::ChecklistCatalog;
use super::domain::Selection;

/// Highest total still classified as [`RiskTier::Low`].
pub const LOW_TIER_CEILING: u64 = 10;
/// Highest total still classified as [`RiskTier::Medium`].
pub const MEDIUM_TIER_CEILING: u64 = 20;

/// Risk classification derived solely from a total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const fn from_total(total: u64) -> Self {
        if total <= LOW_TIER_CEILING {
            Self::Low
        } else if total <= MEDIUM_TIER_CEILING {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub const fn requires_mitigation(self) -> bool {
        !matches!(self, Self::Low)
    }
}

pub const fn mitigation_required(total: u64) -> bool {
    total > LOW_TIER_CEILING
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSubtotal {
    pub title: String,
    pub subtotal: u64,
}

/// Result of aggregating a selection against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub per_section: Vec<SectionSubtotal>,
    pub total: u64,
    pub tier: RiskTier,
    pub mitigation_required: bool,
    /// Catalog ids selected, zero-weight flags included, in catalog order.
    pub selected_items: Vec<String>,
}

impl ScoreBreakdown {
    pub fn subtotal(&self, title: &str) -> Option<u64> {
        self.per_section
            .iter()
            .find(|entry| entry.title == title)
            .map(|entry| entry.subtotal)
    }
}

/// Sum the weights of every selected catalog item.
///
/// Ids in `selection` that the catalog does not know contribute nothing and raise no error.
pub fn score(catalog: &ChecklistCatalog, selection: &Selection) -> ScoreBreakdown {
    let mut per_section = Vec::with_capacity(catalog.sections().len());
    let mut selected_items = Vec::new();
    let mut total: u64 = 0;

    for section in catalog.sections() {
        let mut subtotal: u64 = 0;
        for item in &section.items {
            if selection.is_selected(&item.id) {
                subtotal += u64::from(item.weight);
                selected_items.push(item.id.clone());
            }
        }
        total += subtotal;
        per_section.push(SectionSubtotal {
            title: section.title.clone(),
            subtotal,
        });
    }

    ScoreBreakdown {
        per_section,
        total,
        tier: RiskTier::from_total(total),
        mitigation_required: mitigation_required(total),
        selected_items,
    }
}

/// Ids present in `selection` but absent from the catalog, sorted.
pub fn unrecognized_ids(catalog: &ChecklistCatalog, selection: &Selection) -> Vec<String> {
    selection
        .ids()
        .filter(|id| !catalog.contains(id))
        .map(str::to_string)
        .collect()
}

/// Catalog-bound scorer shared by the lifecycle service and the HTTP router.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    catalog: Arc<ChecklistCatalog>,
}

impl ScoreAggregator {
    pub fn new(catalog: Arc<ChecklistCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ChecklistCatalog {
        &self.catalog
    }

    pub fn score(&self, selection: &Selection) -> ScoreBreakdown {
        score(&self.catalog, selection)
    }

    pub fn unrecognized_ids(&self, selection: &Selection) -> Vec<String> {
        unrecognized_ids(&self.catalog, selection)
    }
}
