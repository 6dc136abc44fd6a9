use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::credentials::{
    CredentialClassification, CredentialKind, CredentialStatus, CredentialWindow,
};
use super::duty::{assess_duty, DutyAssessment, DutyRecord, FatigueBand};
use crate::workflows::validation::ValidationError;

/// Duty utilisation at or above this percentage raises a warning.
pub const DUTY_UTILIZATION_WARNING_PCT: f64 = 90.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub crew_id: String,
    pub name: String,
    #[serde(default)]
    pub credentials: Vec<CredentialWindow>,
    #[serde(default)]
    pub duty: Option<DutyRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

/// Alert-worthy finding for the notification layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceAlert {
    pub severity: AlertSeverity,
    pub severity_label: &'static str,
    pub topic: String,
    pub detail: String,
}

impl ComplianceAlert {
    fn new(severity: AlertSeverity, topic: impl Into<String>, detail: String) -> Self {
        Self {
            severity,
            severity_label: severity.label(),
            topic: topic.into(),
            detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialFinding {
    pub kind: CredentialKind,
    pub kind_label: &'static str,
    pub expiry_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub classification: CredentialClassification,
    pub status_label: &'static str,
}

/// Currency and duty picture for one crew member on a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrewComplianceReport {
    pub crew_id: String,
    pub name: String,
    pub as_of: NaiveDate,
    pub credentials: Vec<CredentialFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duty: Option<DutyAssessment>,
    pub alerts: Vec<ComplianceAlert>,
}

impl CrewComplianceReport {
    pub fn build(member: &CrewMember, as_of: NaiveDate) -> Result<Self, ValidationError> {
        let mut alerts = Vec::new();

        let credentials: Vec<CredentialFinding> = member
            .credentials
            .iter()
            .map(|window| {
                let classification = window.classify(as_of);
                CredentialFinding {
                    kind: window.kind,
                    kind_label: window.kind.label(),
                    expiry_date: window.expiry_date,
                    classification,
                    status_label: classification.status.label(),
                }
            })
            .collect();

        for finding in &credentials {
            let days = finding.classification.days_remaining;
            match finding.classification.status {
                CredentialStatus::Expired => alerts.push(ComplianceAlert::new(
                    AlertSeverity::Critical,
                    finding.kind_label,
                    format!("expired {} day(s) ago", -days),
                )),
                CredentialStatus::Expiring => alerts.push(ComplianceAlert::new(
                    AlertSeverity::Warning,
                    finding.kind_label,
                    format!("expires in {days} day(s)"),
                )),
                CredentialStatus::DueSoon
                | CredentialStatus::Current
                | CredentialStatus::NotApplicable => {}
            }
        }

        let duty = member.duty.as_ref().map(assess_duty).transpose()?;
        if let Some(assessment) = &duty {
            duty_alerts(assessment, &mut alerts);
        }

        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));

        Ok(Self {
            crew_id: member.crew_id.clone(),
            name: member.name.clone(),
            as_of,
            credentials,
            duty,
            alerts,
        })
    }

    pub fn has_critical(&self) -> bool {
        self.alerts
            .iter()
            .any(|alert| alert.severity == AlertSeverity::Critical)
    }
}

fn duty_alerts(assessment: &DutyAssessment, alerts: &mut Vec<ComplianceAlert>) {
    if assessment.rest_deficient {
        alerts.push(ComplianceAlert::new(
            AlertSeverity::Critical,
            "Rest",
            "rest below the required minimum".to_string(),
        ));
    }

    match assessment.fatigue_band {
        FatigueBand::Critical => alerts.push(ComplianceAlert::new(
            AlertSeverity::Critical,
            "Fatigue",
            format!("fatigue level {} is critical", assessment.fatigue_level),
        )),
        FatigueBand::High => alerts.push(ComplianceAlert::new(
            AlertSeverity::Warning,
            "Fatigue",
            format!("fatigue level {} is high", assessment.fatigue_level),
        )),
        FatigueBand::Low | FatigueBand::Moderate => {}
    }

    if assessment.duty_utilization_pct >= DUTY_UTILIZATION_WARNING_PCT {
        alerts.push(ComplianceAlert::new(
            AlertSeverity::Warning,
            "Duty",
            format!(
                "{:.0}% of the duty limit used",
                assessment.duty_utilization_pct
            ),
        ));
    }
}
