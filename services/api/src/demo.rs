use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::Args;
use flight_risk::clock::SystemClock;
use flight_risk::config::AppConfig;
use flight_risk::error::AppError;
use flight_risk::workflows::crew::{
    CredentialKind, CredentialWindow, CrewComplianceReport, CrewMember, DutyRecord,
    RosterImporter,
};
use flight_risk::workflows::frat::{
    AssessmentLifecycle, ChecklistCatalog, DepartureEvent, LegId, ScoreBreakdown, Selection,
};
use flight_risk::workflows::fuel::{
    FuelOrder, FuelPriority, FuelRequestLifecycle, FuelRequestStatus, FuelUnit, TripId,
};
use flight_risk::workflows::lifecycle::LifecycleState;

use crate::infra::{InMemoryAssessmentRepository, InMemoryFuelRequestRepository};

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Checklist catalog JSON (defaults to FRAT_CATALOG_PATH, then the built-in catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Checklist ids to mark as selected, comma separated or repeated
    #[arg(long, value_delimiter = ',', required = true)]
    pub(crate) select: Vec<String>,
    /// Checklist catalog JSON (defaults to FRAT_CATALOG_PATH, then the built-in catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct CrewClassifyArgs {
    /// Roster CSV with crew_id,name,credential,expiry_date columns
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Reference date for the currency windows (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: NaiveDate,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Leg identifier used for the walkthrough
    #[arg(long, default_value = "N650GX-KTEB-KPBI")]
    pub(crate) leg: String,
    /// Reference date for crew currency (defaults to today, UTC)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

fn load_catalog(path: Option<PathBuf>) -> Result<ChecklistCatalog, AppError> {
    let catalog = match path {
        Some(path) => ChecklistCatalog::from_path(path)?,
        None => AppConfig::load()?.frat.load_catalog()?,
    };
    Ok(catalog)
}

pub(crate) fn run_frat_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let catalog = load_catalog(args.catalog)?;

    println!("FRAT checklist ({} points maximum)", catalog.max_total());
    for section in catalog.sections() {
        println!("\n{}", section.title);
        for item in &section.items {
            println!("  [{:>2}] {:<24} {}", item.weight, item.id, item.label);
        }
    }
    Ok(())
}

pub(crate) fn run_frat_score(args: ScoreArgs) -> Result<(), AppError> {
    let catalog = load_catalog(args.catalog)?;
    let selection: Selection = args.select.iter().map(|id| (id.as_str(), true)).collect();

    let breakdown = flight_risk::workflows::frat::score(&catalog, &selection);
    render_breakdown(&breakdown);

    let unknown = flight_risk::workflows::frat::unrecognized_ids(&catalog, &selection);
    if !unknown.is_empty() {
        println!("Ignored unknown ids: {}", unknown.join(", "));
    }
    Ok(())
}

pub(crate) fn run_crew_classify(args: CrewClassifyArgs) -> Result<(), AppError> {
    let members = RosterImporter::from_path(&args.roster)?;
    println!(
        "Crew currency as of {} ({} crew members)",
        args.as_of,
        members.len()
    );

    for member in &members {
        match CrewComplianceReport::build(member, args.as_of) {
            Ok(report) => render_crew_report(&report),
            Err(err) => println!("\n{} ({}): {}", member.name, member.crew_id, err),
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { leg, as_of } = args;
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
    let clock = Arc::new(SystemClock);

    println!("Flight risk engine demo");

    let lifecycle = AssessmentLifecycle::new(
        Arc::new(InMemoryAssessmentRepository::default()),
        Arc::new(ChecklistCatalog::standard()),
        clock.clone(),
    );
    let leg_id = LegId(leg);

    println!("\nRisk assessment for leg {leg_id}");
    let record = match lifecycle.observe(&leg_id) {
        Ok(record) => record,
        Err(err) => {
            println!("  Assessment unavailable: {err}");
            return Ok(());
        }
    };
    println!("- Opened -> {}", record.status().display_label());

    let draft = Selection::from_iter([("wx_night", true), ("ap_non_towered", true)]);
    match lifecycle.edit(&leg_id, draft) {
        Ok(record) => println!(
            "- Draft saved -> {} points ({})",
            record.total_score(),
            record.tier().label()
        ),
        Err(err) => println!("  Edit rejected: {err}"),
    }

    let final_answers = Selection::from_iter([
        ("wx_night", true),
        ("ap_non_towered", true),
        ("wx_icing", true),
        ("pq_long_duty", true),
        ("pq_third_pilot", true),
    ]);
    match lifecycle.submit(&leg_id, Some(final_answers)) {
        Ok(record) => {
            println!(
                "- Submitted -> {} points ({}), mitigation required: {}",
                record.total_score(),
                record.tier().label(),
                record.mitigation_required()
            );
            if record.mitigation_required() {
                let notes = "Augmented crew; icing plan briefed".to_string();
                if let Err(err) = lifecycle.record_mitigation(&leg_id, Some(notes)) {
                    println!("  Mitigation not recorded: {err}");
                }
            }
        }
        Err(err) => println!("  Submission rejected: {err}"),
    }

    let fuel = FuelRequestLifecycle::new(Arc::new(InMemoryFuelRequestRepository::default()), clock);
    let trip_id = TripId(format!("TRIP-{leg_id}"));
    println!("\nFuel request for {trip_id}");
    match fuel.create(FuelOrder {
        trip_id: trip_id.clone(),
        priority: FuelPriority::Urgent,
        amount_requested: 650,
        unit: FuelUnit::Gallons,
        notes: Some("Jet-A with Prist".to_string()),
    }) {
        Ok(request) => {
            println!(
                "- {} created ({} {} {:?})",
                request.request_id(),
                request.priority().label(),
                request.amount_requested(),
                request.unit()
            );
            for next in [
                FuelRequestStatus::Acknowledged,
                FuelRequestStatus::SentToFarm,
                FuelRequestStatus::Fueling,
                FuelRequestStatus::Completed,
            ] {
                match fuel.advance(request.request_id(), next) {
                    Ok(record) => println!("  -> {}", record.status().display_label()),
                    Err(err) => {
                        println!("  Fuel request stalled: {err}");
                        break;
                    }
                }
            }
        }
        Err(err) => println!("  Fuel request rejected: {err}"),
    }

    println!("\nDeparture");
    let departure = DepartureEvent {
        leg_id: leg_id.clone(),
        departed: true,
    };
    match lifecycle.record_departure(&departure) {
        Ok(record) => println!(
            "- Assessment {} at {} points; further edits are rejected",
            record.status().label(),
            record.submitted_total().unwrap_or(record.total_score())
        ),
        Err(err) => println!("  Lock failed: {err}"),
    }
    if let Err(err) = lifecycle.edit(&leg_id, Selection::default()) {
        println!("- Post-departure edit: {err}");
    }

    println!("\nCrew currency as of {as_of}");
    for member in demo_crew(as_of) {
        match CrewComplianceReport::build(&member, as_of) {
            Ok(report) => render_crew_report(&report),
            Err(err) => println!("  {}: {err}", member.name),
        }
    }

    Ok(())
}

fn demo_crew(as_of: NaiveDate) -> Vec<CrewMember> {
    let days = |offset: i64| Some(as_of + chrono::Duration::days(offset));
    vec![
        CrewMember {
            crew_id: "C-101".to_string(),
            name: "Captain A. Reyes".to_string(),
            credentials: vec![
                CredentialWindow {
                    kind: CredentialKind::Medical,
                    expiry_date: days(12),
                },
                CredentialWindow {
                    kind: CredentialKind::TypeRating,
                    expiry_date: days(200),
                },
            ],
            duty: Some(DutyRecord {
                current_duty_hours: 11.5,
                max_duty_hours: 12.0,
                rest_hours: 10.0,
                min_rest_hours: 10.0,
                fatigue_level_current: 5,
            }),
        },
        CrewMember {
            crew_id: "C-202".to_string(),
            name: "First Officer J. Park".to_string(),
            credentials: vec![
                CredentialWindow {
                    kind: CredentialKind::FlightReview,
                    expiry_date: days(-3),
                },
                CredentialWindow {
                    kind: CredentialKind::Passport,
                    expiry_date: None,
                },
            ],
            duty: Some(DutyRecord {
                current_duty_hours: 4.0,
                max_duty_hours: 14.0,
                rest_hours: 8.0,
                min_rest_hours: 10.0,
                fatigue_level_current: 2,
            }),
        },
    ]
}

fn render_breakdown(breakdown: &ScoreBreakdown) {
    println!("Risk score: {} ({})", breakdown.total, breakdown.tier.label());
    for section in &breakdown.per_section {
        println!("  - {}: {}", section.title, section.subtotal);
    }
    if breakdown.mitigation_required {
        println!("Mitigation plan required before release.");
    }
}

fn render_crew_report(report: &CrewComplianceReport) {
    println!("\n{} ({})", report.name, report.crew_id);
    for finding in &report.credentials {
        let expiry = finding
            .expiry_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  - {:<30} {:<10} {:>5} day(s)  expires {}",
            finding.kind_label,
            finding.status_label,
            finding.classification.days_remaining,
            expiry
        );
    }
    if let Some(duty) = &report.duty {
        println!(
            "  Duty {:.0}% of limit | rest deficient: {} | fatigue {} ({})",
            duty.duty_utilization_pct,
            duty.rest_deficient,
            duty.fatigue_level,
            duty.fatigue_band.label()
        );
    }
    if report.alerts.is_empty() {
        println!("  No alerts");
    }
    for alert in &report.alerts {
        println!(
            "  ! {}: {} {}",
            alert.severity_label, alert.topic, alert.detail
        );
    }
}
