use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One weighted checklist question.
///
/// Zero-weight items are informational flags: they render as selected but never move the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub weight: u32,
}

/// Titled group of checklist items, e.g. "Weather".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSection {
    pub title: String,
    pub items: Vec<ChecklistItem>,
}

/// Static FRAT catalog, loaded once at process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistCatalog {
    sections: Vec<ChecklistSection>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read checklist catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid checklist catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("checklist section titles must not be empty")]
    EmptySectionTitle,
    #[error("checklist section '{title}' appears more than once")]
    DuplicateSection { title: String },
    #[error("checklist item ids must not be empty (section '{section}')")]
    EmptyItemId { section: String },
    #[error("checklist item id '{id}' appears more than once in the catalog")]
    DuplicateItem { id: String },
}

#[derive(Deserialize)]
struct CatalogDocument {
    sections: Vec<ChecklistSection>,
}

impl ChecklistCatalog {
    /// Build a catalog, enforcing catalog-wide unique item ids and unique section titles.
    pub fn new(sections: Vec<ChecklistSection>) -> Result<Self, CatalogError> {
        let mut titles = HashSet::new();
        let mut ids = HashSet::new();

        for section in &sections {
            if section.title.trim().is_empty() {
                return Err(CatalogError::EmptySectionTitle);
            }
            if !titles.insert(section.title.as_str()) {
                return Err(CatalogError::DuplicateSection {
                    title: section.title.clone(),
                });
            }
            for item in &section.items {
                if item.id.trim().is_empty() {
                    return Err(CatalogError::EmptyItemId {
                        section: section.title.clone(),
                    });
                }
                if !ids.insert(item.id.as_str()) {
                    return Err(CatalogError::DuplicateItem {
                        id: item.id.clone(),
                    });
                }
            }
        }

        Ok(Self { sections })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse a `{"sections": [...]}` document.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_reader(reader)?;
        Self::new(document.sections)
    }

    /// Built-in Part 91/135 style FRAT used when no catalog file is configured.
    pub fn standard() -> Self {
        Self {
            sections: standard_sections(),
        }
    }

    pub fn sections(&self) -> &[ChecklistSection] {
        &self.sections
    }

    pub fn item(&self, id: &str) -> Option<&ChecklistItem> {
        self.sections
            .iter()
            .flat_map(|section| section.items.iter())
            .find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.item(id).is_some()
    }

    pub fn max_total(&self) -> u64 {
        self.sections
            .iter()
            .flat_map(|section| section.items.iter())
            .map(|item| u64::from(item.weight))
            .sum()
    }
}

fn item(id: &str, label: &str, weight: u32) -> ChecklistItem {
    ChecklistItem {
        id: id.to_string(),
        label: label.to_string(),
        weight,
    }
}

fn section(title: &str, items: Vec<ChecklistItem>) -> ChecklistSection {
    ChecklistSection {
        title: title.to_string(),
        items,
    }
}

fn standard_sections() -> Vec<ChecklistSection> {
    vec![
        section(
            "Weather",
            vec![
                item(
                    "wx_dest_ifr",
                    "Destination forecast below 1000 ft ceiling or 3 SM visibility",
                    4,
                ),
                item("wx_icing", "Known or forecast icing along route", 5),
                item("wx_convective", "Convective activity along route", 5),
                item("wx_crosswind", "Crosswind component above 15 kt", 3),
                item("wx_night", "Night departure or arrival", 2),
            ],
        ),
        section(
            "Pilot Qualifications",
            vec![
                item("pq_long_duty", "Planned duty day exceeds 12 hours", 4),
                item("pq_low_time_in_type", "PIC has fewer than 100 hours in type", 4),
                item(
                    "pq_not_recent",
                    "Fewer than 3 landings in type within 90 days",
                    3,
                ),
                item("pq_new_pairing", "First trip flown together as a crew", 2),
                item("pq_third_pilot", "3rd pilot will be used", 0),
            ],
        ),
        section(
            "Aircraft",
            vec![
                item("ac_mel", "Dispatching with an open MEL item", 3),
                item(
                    "ac_recent_maintenance",
                    "First flight after maintenance within 24 hours",
                    2,
                ),
                item("ac_near_mtow", "Takeoff weight within 5% of MTOW", 2),
            ],
        ),
        section(
            "Airport & Environment",
            vec![
                item("ap_unfamiliar", "First visit to departure or destination", 3),
                item(
                    "ap_special",
                    "Special airport or mountainous terrain procedures",
                    4,
                ),
                item("ap_short_runway", "Runway shorter than 5000 ft", 3),
                item("ap_non_towered", "Non-towered field", 2),
                item("ap_international", "International leg with customs", 1),
            ],
        ),
        section(
            "Operational",
            vec![
                item("op_schedule_pressure", "Passenger or schedule pressure", 3),
                item("op_late_change", "Trip change within 2 hours of departure", 2),
                item("op_tech_stop", "Technical fuel stop required", 1),
            ],
        ),
    ]
}
