use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::validation::ValidationError;

/// Upper bound (inclusive) of the `Expiring` window, in days.
pub const EXPIRING_WINDOW_DAYS: i64 = 30;
/// Upper bound (inclusive) of the `DueSoon` window, in days.
pub const DUE_SOON_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Medical,
    FlightReview,
    TypeRating,
    InstrumentProficiency,
    RecurrentTraining,
    Passport,
}

impl CredentialKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Medical => "Medical Certificate",
            Self::FlightReview => "Flight Review",
            Self::TypeRating => "Type Rating",
            Self::InstrumentProficiency => "Instrument Proficiency Check",
            Self::RecurrentTraining => "Recurrent Training",
            Self::Passport => "Passport",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "medical" => Some(Self::Medical),
            "flight_review" => Some(Self::FlightReview),
            "type_rating" => Some(Self::TypeRating),
            "instrument_proficiency" | "ipc" => Some(Self::InstrumentProficiency),
            "recurrent_training" | "recurrent" => Some(Self::RecurrentTraining),
            "passport" => Some(Self::Passport),
            _ => None,
        }
    }
}

/// Currency bucket for one expiring qualification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    NotApplicable,
    Expired,
    Expiring,
    DueSoon,
    Current,
}

impl CredentialStatus {
    /// Classify a day count. Ranges are contiguous, so the checks run lowest first.
    pub const fn from_days_remaining(days: i64) -> Self {
        if days < 0 {
            Self::Expired
        } else if days <= EXPIRING_WINDOW_DAYS {
            Self::Expiring
        } else if days <= DUE_SOON_WINDOW_DAYS {
            Self::DueSoon
        } else {
            Self::Current
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotApplicable => "N/A",
            Self::Expired => "Expired",
            Self::Expiring => "Expiring",
            Self::DueSoon => "Due Soon",
            Self::Current => "Current",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClassification {
    pub status: CredentialStatus,
    pub days_remaining: i64,
}

impl CredentialClassification {
    const NOT_APPLICABLE: Self = Self {
        status: CredentialStatus::NotApplicable,
        days_remaining: 0,
    };

    fn from_days(days_remaining: i64) -> Self {
        Self {
            status: CredentialStatus::from_days_remaining(days_remaining),
            days_remaining,
        }
    }
}

/// Classify an expiry instant against `as_of`, rounding partial days up.
///
/// An item that lapsed earlier on the reference day reports 0 days (still `Expiring`).
pub fn classify(expiry: Option<DateTime<Utc>>, as_of: DateTime<Utc>) -> CredentialClassification {
    match expiry {
        None => CredentialClassification::NOT_APPLICABLE,
        Some(expiry) => CredentialClassification::from_days(ceil_days(expiry - as_of)),
    }
}

/// Calendar-date form of [`classify`]; whole days need no rounding.
pub fn classify_date(expiry: Option<NaiveDate>, as_of: NaiveDate) -> CredentialClassification {
    match expiry {
        None => CredentialClassification::NOT_APPLICABLE,
        Some(expiry) => CredentialClassification::from_days((expiry - as_of).num_days()),
    }
}

/// Entry point for loosely-typed callers: a missing `as_of` is an error, never "today".
pub fn classify_window(
    expiry: Option<NaiveDate>,
    as_of: Option<NaiveDate>,
) -> Result<CredentialClassification, ValidationError> {
    let as_of = as_of.ok_or(ValidationError::MissingField { field: "as_of" })?;
    Ok(classify_date(expiry, as_of))
}

// `num_days` truncates toward zero, so only a positive remainder needs rounding up.
fn ceil_days(delta: Duration) -> i64 {
    let whole = delta.num_days();
    if delta - Duration::days(whole) > Duration::zero() {
        whole + 1
    } else {
        whole
    }
}

/// One expiring qualification held by a crew member. `None` means not applicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialWindow {
    pub kind: CredentialKind,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl CredentialWindow {
    pub fn classify(&self, as_of: NaiveDate) -> CredentialClassification {
        classify_date(self.expiry_date, as_of)
    }
}
