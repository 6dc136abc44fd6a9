use serde::{Deserialize, Serialize};

use crate::workflows::validation::ValidationError;

/// Highest fatigue level on the observation scale.
pub const MAX_FATIGUE_LEVEL: u8 = 10;

/// Duty and rest figures for one crew member at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DutyRecord {
    pub current_duty_hours: f64,
    pub max_duty_hours: f64,
    pub rest_hours: f64,
    pub min_rest_hours: f64,
    /// Observed fatigue on a 0-10 scale; not derived from duty hours.
    pub fatigue_level_current: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueBand {
    Low,
    Moderate,
    High,
    Critical,
}

impl FatigueBand {
    pub const fn from_level(level: u8) -> Self {
        match level {
            0..=2 => Self::Low,
            3..=4 => Self::Moderate,
            5..=6 => Self::High,
            _ => Self::Critical,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DutyAssessment {
    pub duty_utilization_pct: f64,
    pub rest_deficient: bool,
    pub fatigue_level: u8,
    pub fatigue_band: FatigueBand,
}

/// Derive utilisation, rest compliance, and fatigue band from a duty record.
pub fn assess_duty(record: &DutyRecord) -> Result<DutyAssessment, ValidationError> {
    non_negative("current_duty_hours", record.current_duty_hours)?;
    non_negative("rest_hours", record.rest_hours)?;
    non_negative("min_rest_hours", record.min_rest_hours)?;
    if !record.max_duty_hours.is_finite() || record.max_duty_hours <= 0.0 {
        return Err(ValidationError::out_of_range(
            "max_duty_hours",
            "a positive number of hours",
            record.max_duty_hours,
        ));
    }
    if record.fatigue_level_current > MAX_FATIGUE_LEVEL {
        return Err(ValidationError::out_of_range(
            "fatigue_level_current",
            "between 0 and 10",
            record.fatigue_level_current,
        ));
    }

    let utilization = record.current_duty_hours / record.max_duty_hours * 100.0;

    Ok(DutyAssessment {
        duty_utilization_pct: utilization.clamp(0.0, 100.0),
        // Resting exactly the minimum is compliant.
        rest_deficient: record.rest_hours < record.min_rest_hours,
        fatigue_level: record.fatigue_level_current,
        fatigue_band: FatigueBand::from_level(record.fatigue_level_current),
    })
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::out_of_range(
            field,
            "a non-negative number of hours",
            value,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DutyRecord {
        DutyRecord {
            current_duty_hours: 7.0,
            max_duty_hours: 14.0,
            rest_hours: 10.0,
            min_rest_hours: 10.0,
            fatigue_level_current: 2,
        }
    }

    #[test]
    fn utilization_is_a_percentage_of_max_duty() {
        let assessment = assess_duty(&record()).expect("valid record");
        assert!((assessment.duty_utilization_pct - 50.0).abs() < f64::EPSILON);
        assert_eq!(assessment.fatigue_band, FatigueBand::Low);
    }

    #[test]
    fn utilization_clamps_at_one_hundred() {
        let mut over = record();
        over.current_duty_hours = 16.5;
        let assessment = assess_duty(&over).expect("valid record");
        assert!((assessment.duty_utilization_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rest_equal_to_minimum_is_compliant() {
        assert!(!assess_duty(&record()).expect("valid").rest_deficient);

        let mut short = record();
        short.rest_hours = 9.5;
        assert!(assess_duty(&short).expect("valid").rest_deficient);
    }

    #[test]
    fn fatigue_bands_follow_fixed_thresholds() {
        let expected = [
            (0, FatigueBand::Low),
            (2, FatigueBand::Low),
            (3, FatigueBand::Moderate),
            (4, FatigueBand::Moderate),
            (5, FatigueBand::High),
            (6, FatigueBand::High),
            (7, FatigueBand::Critical),
            (10, FatigueBand::Critical),
        ];
        for (level, band) in expected {
            assert_eq!(FatigueBand::from_level(level), band, "level {level}");
        }
    }

    #[test]
    fn rejects_zero_max_duty_and_out_of_scale_fatigue() {
        let mut zero = record();
        zero.max_duty_hours = 0.0;
        assert!(matches!(
            assess_duty(&zero),
            Err(ValidationError::OutOfRange {
                field: "max_duty_hours",
                ..
            })
        ));

        let mut fatigued = record();
        fatigued.fatigue_level_current = 11;
        assert!(matches!(
            assess_duty(&fatigued),
            Err(ValidationError::OutOfRange {
                field: "fatigue_level_current",
                ..
            })
        ));

        let mut negative = record();
        negative.rest_hours = -1.0;
        assert!(assess_duty(&negative).is_err());
    }
}
