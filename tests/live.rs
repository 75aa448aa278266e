use std::path::PathBuf;

use t20_win_predictor::error::{EncodeError, PredictError};
use t20_win_predictor::features::Sentinel;
use t20_win_predictor::live::{LiveSnapshot, build_live_row};
use t20_win_predictor::model::ModelBundle;
use t20_win_predictor::predict::{Predictor, PredictorOptions};
use t20_win_predictor::venue_stats::VenueStatsTable;

fn model_fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("models");
    path.push(name);
    path
}

fn predictor(extended: bool) -> Predictor {
    let bundle = ModelBundle::load(&model_fixture("model_bundle.json")).expect("bundle should load");
    let venues = VenueStatsTable::load(&model_fixture("venue_stats.csv")).expect("stats should load");
    Predictor::from_bundle(
        bundle,
        venues,
        PredictorOptions {
            match_overs: 20,
            extended,
        },
    )
}

fn chase(runs: u32, overs: f64, wickets: u32, target: u32) -> LiveSnapshot {
    LiveSnapshot {
        batting_team: "Pakistan".to_string(),
        bowling_team: "India".to_string(),
        venue: "Eden Gardens".to_string(),
        toss_winner: "India".to_string(),
        toss_decision: "bat".to_string(),
        innings: 2,
        target_runs: Some(target),
        runs_so_far: runs,
        overs,
        wickets_so_far: wickets,
    }
}

#[test]
fn worked_chase_example() {
    let row = build_live_row(&chase(90, 12.3, 2, 160), 20);
    assert_eq!(row.balls_faced, 75);
    assert_eq!(row.balls_left, 45);
    assert_eq!(row.runs_left(), Some(70));
    let rrr = row.required_run_rate.value().unwrap();
    assert!((rrr - 9.333333333333334).abs() < 1e-9);
}

#[test]
fn first_innings_row_carries_markers() {
    let mut snap = chase(45, 6.0, 1, 0);
    snap.innings = 1;
    snap.target_runs = None;
    let row = build_live_row(&snap, 20);
    assert_eq!(row.target_runs, Sentinel::NotApplicable);
    assert_eq!(row.required_run_rate, Sentinel::NotApplicable);
    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json["target_runs"], -1.0);
    assert_eq!(json["required_run_rate"], -1.0);
}

#[test]
fn model_probabilities_sum_to_one() {
    let p = predictor(true);
    for (runs, overs, wickets) in [(0, 0.0, 0), (45, 6.2, 1), (90, 12.3, 4), (140, 17.5, 8)] {
        let out = p.predict(&chase(runs, overs, wickets, 160)).unwrap();
        assert!(!out.overridden);
        let sum = out.probability.win + out.probability.loss;
        assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
    }
}

#[test]
fn all_out_short_of_target_is_zero() {
    let out = predictor(true).predict(&chase(120, 17.1, 10, 160)).unwrap();
    assert!(out.overridden);
    assert_eq!(out.probability.win, 0.0);
    assert_eq!(out.probability.loss, 1.0);
}

#[test]
fn target_reached_is_one() {
    let out = predictor(true).predict(&chase(160, 17.1, 5, 160)).unwrap();
    assert_eq!(out.probability.win, 1.0);
    assert_eq!(out.probability.loss, 0.0);
}

#[test]
fn extended_row_projects_against_venue_average() {
    let out = predictor(true).predict(&chase(60, 10.0, 2, 160)).unwrap();
    let proj = out.row.projection.expect("extended rows carry a projection");
    assert_eq!(proj.projected_score, 120.0);
    assert_eq!(proj.venue_avg_score, Some(158.5));
    assert_eq!(proj.score_vs_avg, Some(60.0 - 158.5));
    assert_eq!(proj.proj_vs_avg, Some(120.0 - 158.5));
}

#[test]
fn unseen_team_is_reported_by_column() {
    let mut snap = chase(60, 10.0, 2, 160);
    snap.batting_team = "Ireland".to_string();
    let err = predictor(false).predict(&snap).unwrap_err();
    assert!(matches!(
        &err,
        PredictError::Encode(EncodeError::UnrecognizedCategory { column, .. }) if column == "batting_team"
    ));
    assert_eq!(
        err.to_string(),
        "Value 'Ireland' not recognized in 'batting_team' encoder."
    );
}

#[test]
fn invalid_snapshot_is_rejected_before_scoring() {
    let mut snap = chase(60, 10.0, 2, 160);
    snap.overs = 21.0;
    assert!(matches!(
        predictor(true).predict(&snap),
        Err(PredictError::Snapshot(_))
    ));
}
