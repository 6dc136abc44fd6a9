use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::credentials::{CredentialKind, CredentialWindow};
use super::report::CrewMember;

#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("failed to read crew roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid crew roster CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unknown credential '{value}'")]
    UnknownCredential { row: usize, value: String },
    #[error("row {row}: expiry date '{value}' is not YYYY-MM-DD")]
    InvalidDate { row: usize, value: String },
    #[error("row {row}: crew {crew_id} is named '{found}' here but '{expected}' earlier")]
    NameMismatch {
        row: usize,
        crew_id: String,
        expected: String,
        found: String,
    },
}

/// Loads crew credential rosters exported as `crew_id,name,credential,expiry_date` CSV.
///
/// Rows for the same `crew_id` are grouped in first-seen order. A blank expiry marks the
/// credential as not applicable to that crew member.
pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CrewMember>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CrewMember>, RosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut members: Vec<CrewMember> = Vec::new();

        for (index, row) in csv_reader.deserialize::<RosterRow>().enumerate() {
            let row = row?;
            // Header is line 1.
            let line = index + 2;

            let kind = CredentialKind::parse(&row.credential).ok_or_else(|| {
                RosterImportError::UnknownCredential {
                    row: line,
                    value: row.credential.clone(),
                }
            })?;
            let expiry_date = row
                .expiry_date
                .as_deref()
                .map(|raw| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                        RosterImportError::InvalidDate {
                            row: line,
                            value: raw.to_string(),
                        }
                    })
                })
                .transpose()?;

            let window = CredentialWindow { kind, expiry_date };
            match members
                .iter()
                .position(|member| member.crew_id == row.crew_id)
            {
                Some(position) => {
                    let member = &mut members[position];
                    if member.name != row.name {
                        return Err(RosterImportError::NameMismatch {
                            row: line,
                            crew_id: row.crew_id,
                            expected: member.name.clone(),
                            found: row.name,
                        });
                    }
                    member.credentials.push(window);
                }
                None => members.push(CrewMember {
                    crew_id: row.crew_id,
                    name: row.name,
                    credentials: vec![window],
                    duty: None,
                }),
            }
        }

        Ok(members)
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    crew_id: String,
    name: String,
    credential: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    expiry_date: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
