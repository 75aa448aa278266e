//! Single point-in-time feature row for an interactive prediction request.
//!
//! Uses the same field names as the batch table but the live conventions: overs are read in
//! cricket notation (`12.4` = 12 overs and 4 balls), run rate divides by those decimal overs
//! directly, and inapplicable second-innings fields carry the `-1` marker.

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::features::{RunRateStrategy, Sentinel, decimal_overs_run_rate};
use crate::model::WinProbability;
use crate::venue_stats::VenueStatsTable;

pub const ALL_OUT_WICKETS: u32 = 10;

/// What the user has told us about the match right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub batting_team: String,
    pub bowling_team: String,
    pub venue: String,
    pub toss_winner: String,
    pub toss_decision: String,
    pub innings: u8,
    #[serde(default)]
    pub target_runs: Option<u32>,
    pub runs_so_far: u32,
    pub overs: f64,
    pub wickets_so_far: u32,
}

impl LiveSnapshot {
    pub fn validate(&self, match_overs: u32) -> Result<(), SnapshotError> {
        if !matches!(self.innings, 1 | 2) {
            return Err(SnapshotError::Innings(self.innings));
        }
        if self.innings == 2 && self.target_runs.is_none_or(|t| t < 1) {
            return Err(SnapshotError::MissingTarget);
        }
        if !self.overs.is_finite() || self.overs < 0.0 || self.overs > f64::from(match_overs) {
            return Err(SnapshotError::Overs {
                got: self.overs,
                max: match_overs,
            });
        }
        if !has_single_ball_digit(self.overs) {
            return Err(SnapshotError::OversPrecision(self.overs));
        }
        if self.wickets_so_far > ALL_OUT_WICKETS {
            return Err(SnapshotError::Wickets(self.wickets_so_far));
        }
        Ok(())
    }
}

/// Venue-relative extension of a live row. Aggregate fields are `None` when the venue is not in
/// the stats table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VenueProjection {
    pub projected_score: f64,
    pub venue_avg_score: Option<f64>,
    pub score_vs_avg: Option<f64>,
    pub proj_vs_avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveFeatureRow {
    pub venue: String,
    pub toss_winner: String,
    pub toss_decision: String,
    pub batting_team: String,
    pub bowling_team: String,
    pub innings: u8,
    pub runs_so_far: u32,
    pub wickets_so_far: u32,
    pub balls_faced: u32,
    pub run_rate: f64,
    pub target_runs: Sentinel<u32>,
    pub required_run_rate: Sentinel<f64>,
    #[serde(skip)]
    pub balls_left: i64,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub projection: Option<VenueProjection>,
}

impl LiveFeatureRow {
    pub const RUN_RATE: RunRateStrategy = RunRateStrategy::DecimalOvers;

    /// Runs still needed in a chase, if this is one.
    pub fn runs_left(&self) -> Option<i64> {
        self.target_runs
            .value()
            .map(|t| i64::from(t) - i64::from(self.runs_so_far))
    }

    /// Numeric value of a named column for the scorer. Categorical columns are not numeric and
    /// return `None` here; projection columns return `None` when absent.
    pub fn numeric(&self, column: &str) -> Option<Option<f64>> {
        let proj = self.projection.as_ref();
        let value = match column {
            "innings" => Some(f64::from(self.innings)),
            "runs_so_far" => Some(f64::from(self.runs_so_far)),
            "wickets_so_far" => Some(f64::from(self.wickets_so_far)),
            "balls_faced" => Some(f64::from(self.balls_faced)),
            "run_rate" => Some(self.run_rate),
            "target_runs" => Some(self.target_runs.as_model_input()),
            "required_run_rate" => Some(self.required_run_rate.as_model_input()),
            "projected_score" => proj.map(|p| p.projected_score),
            "venue_avg_score" => proj.and_then(|p| p.venue_avg_score),
            "score_vs_avg" => proj.and_then(|p| p.score_vs_avg),
            "proj_vs_avg" => proj.and_then(|p| p.proj_vs_avg),
            _ => return None,
        };
        Some(value)
    }

    pub fn categorical(&self, column: &str) -> Option<&str> {
        match column {
            "venue" => Some(&self.venue),
            "toss_winner" => Some(&self.toss_winner),
            "toss_decision" => Some(&self.toss_decision),
            "batting_team" => Some(&self.batting_team),
            "bowling_team" => Some(&self.bowling_team),
            _ => None,
        }
    }
}

/// Cricket-notation overs to balls: the digit after the point counts balls, not tenths of an
/// over. A digit of 6 or more is passed through as typed. Ties round to even, matching how the
/// training rows were produced.
pub fn balls_from_overs(overs: f64) -> u32 {
    let whole = overs.trunc();
    let fraction = overs - whole;
    (whole as u32) * 6 + (fraction * 10.0).round_ties_even() as u32
}

fn has_single_ball_digit(overs: f64) -> bool {
    let tenths = overs * 10.0;
    (tenths - tenths.round()).abs() < 1e-6
}

pub fn build_live_row(snapshot: &LiveSnapshot, match_overs: u32) -> LiveFeatureRow {
    let balls_faced = balls_from_overs(snapshot.overs);
    let run_rate = decimal_overs_run_rate(snapshot.runs_so_far, snapshot.overs);
    let balls_left = i64::from(match_overs) * 6 - i64::from(balls_faced);

    let (target_runs, required_run_rate) = match (snapshot.innings, snapshot.target_runs) {
        (2, Some(target)) => {
            let runs_left = i64::from(target) - i64::from(snapshot.runs_so_far);
            let rrr = if balls_left > 0 {
                Sentinel::Value((runs_left * 6) as f64 / balls_left as f64)
            } else {
                Sentinel::NotApplicable
            };
            (Sentinel::Value(target), rrr)
        }
        _ => (Sentinel::NotApplicable, Sentinel::NotApplicable),
    };

    LiveFeatureRow {
        venue: snapshot.venue.clone(),
        toss_winner: snapshot.toss_winner.clone(),
        toss_decision: snapshot.toss_decision.clone(),
        batting_team: snapshot.batting_team.clone(),
        bowling_team: snapshot.bowling_team.clone(),
        innings: snapshot.innings,
        runs_so_far: snapshot.runs_so_far,
        wickets_so_far: snapshot.wickets_so_far,
        balls_faced,
        run_rate,
        target_runs,
        required_run_rate,
        balls_left,
        projection: None,
    }
}

/// Attaches the venue-relative projection to a row.
pub fn with_venue_projection(mut row: LiveFeatureRow, venues: &VenueStatsTable) -> LiveFeatureRow {
    let runs = f64::from(row.runs_so_far);
    let projected_score = if row.balls_faced > 0 {
        runs + (runs / f64::from(row.balls_faced)) * row.balls_left as f64
    } else {
        runs
    };
    let venue_avg_score = venues.avg_first_innings_score(&row.venue);
    row.projection = Some(VenueProjection {
        projected_score,
        venue_avg_score,
        score_vs_avg: venue_avg_score.map(|avg| runs - avg),
        proj_vs_avg: venue_avg_score.map(|avg| projected_score - avg),
    });
    row
}

/// Settled chases override the model: a target already reached is a certain win, ten wickets
/// down short of it a certain loss.
pub fn settled_outcome(row: &LiveFeatureRow) -> Option<WinProbability> {
    if row.innings != 2 {
        return None;
    }
    let target = row.target_runs.value()?;
    if row.runs_so_far >= target {
        Some(WinProbability::certain_win())
    } else if row.wickets_so_far >= ALL_OUT_WICKETS {
        Some(WinProbability::certain_loss())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue_stats::VenueStats;

    fn snapshot(innings: u8, target: Option<u32>, runs: u32, overs: f64, wickets: u32) -> LiveSnapshot {
        LiveSnapshot {
            batting_team: "India".to_string(),
            bowling_team: "Pakistan".to_string(),
            venue: "Eden Gardens".to_string(),
            toss_winner: "India".to_string(),
            toss_decision: "field".to_string(),
            innings,
            target_runs: target,
            runs_so_far: runs,
            overs,
            wickets_so_far: wickets,
        }
    }

    #[test]
    fn cricket_notation_balls() {
        assert_eq!(balls_from_overs(0.0), 0);
        assert_eq!(balls_from_overs(12.3), 75);
        assert_eq!(balls_from_overs(19.5), 119);
        assert_eq!(balls_from_overs(20.0), 120);
        // Not corrected: .7 is seven balls.
        assert_eq!(balls_from_overs(3.7), 25);
    }

    #[test]
    fn half_ball_ties_round_to_even() {
        assert_eq!(balls_from_overs(1.25), 8);
        assert_eq!(balls_from_overs(3.25), 20);
        assert_eq!(balls_from_overs(12.45), 76);
    }

    #[test]
    fn overs_with_two_fraction_digits_are_rejected() {
        assert_eq!(
            snapshot(1, None, 10, 1.25, 0).validate(20),
            Err(SnapshotError::OversPrecision(1.25))
        );
        assert!(snapshot(1, None, 90, 12.3, 0).validate(20).is_ok());
        assert!(snapshot(1, None, 90, 19.5, 0).validate(20).is_ok());
    }

    #[test]
    fn chase_required_rate() {
        let row = build_live_row(&snapshot(2, Some(160), 90, 12.3, 3), 20);
        assert_eq!(row.balls_faced, 75);
        assert_eq!(row.balls_left, 45);
        assert_eq!(row.runs_left(), Some(70));
        let rrr = row.required_run_rate.value().unwrap();
        assert!((rrr - 70.0 * 6.0 / 45.0).abs() < 1e-12);
        assert!((rrr - 9.33).abs() < 0.01);
        assert!((row.run_rate - 90.0 / 12.3).abs() < 1e-12);
    }

    #[test]
    fn first_innings_uses_markers() {
        let row = build_live_row(&snapshot(1, None, 45, 5.0, 1), 20);
        assert_eq!(row.target_runs, Sentinel::NotApplicable);
        assert_eq!(row.required_run_rate, Sentinel::NotApplicable);
        assert_eq!(row.numeric("target_runs"), Some(Some(-1.0)));
        assert_eq!(row.numeric("required_run_rate"), Some(Some(-1.0)));
    }

    #[test]
    fn no_balls_left_is_marker_not_division() {
        let row = build_live_row(&snapshot(2, Some(180), 170, 20.0, 6), 20);
        assert_eq!(row.balls_left, 0);
        assert_eq!(row.target_runs, Sentinel::Value(180));
        assert_eq!(row.required_run_rate, Sentinel::NotApplicable);
    }

    #[test]
    fn zero_overs_run_rate_is_zero() {
        let row = build_live_row(&snapshot(1, None, 0, 0.0, 0), 20);
        assert_eq!(row.run_rate, 0.0);
    }

    #[test]
    fn projection_joins_venue_average() {
        let venues = VenueStatsTable::from_rows([VenueStats {
            venue: "Eden Gardens".to_string(),
            matches: 10,
            avg_first_innings_score: 165.0,
            avg_second_innings_score: None,
        }]);
        let row = with_venue_projection(build_live_row(&snapshot(1, None, 60, 10.0, 2), 20), &venues);
        let proj = row.projection.unwrap();
        assert_eq!(proj.projected_score, 120.0);
        assert_eq!(proj.score_vs_avg, Some(-105.0));
        assert_eq!(proj.proj_vs_avg, Some(-45.0));
    }

    #[test]
    fn projection_fails_closed_on_unknown_venue() {
        let row = with_venue_projection(
            build_live_row(&snapshot(1, None, 0, 0.0, 0), 20),
            &VenueStatsTable::default(),
        );
        let proj = row.projection.unwrap();
        assert_eq!(proj.projected_score, 0.0);
        assert_eq!(proj.venue_avg_score, None);
        assert_eq!(proj.score_vs_avg, None);
        assert_eq!(row.numeric("proj_vs_avg"), Some(None));
    }

    #[test]
    fn settled_chases_have_certain_outcomes() {
        let all_out = build_live_row(&snapshot(2, Some(150), 140, 18.2, 10), 20);
        assert_eq!(
            settled_outcome(&all_out),
            Some(WinProbability { loss: 1.0, win: 0.0 })
        );

        let reached = build_live_row(&snapshot(2, Some(150), 150, 18.2, 4), 20);
        assert_eq!(settled_outcome(&reached).map(|p| p.win), Some(1.0));

        let open = build_live_row(&snapshot(2, Some(150), 140, 18.2, 9), 20);
        assert_eq!(settled_outcome(&open), None);

        let first = build_live_row(&snapshot(1, None, 140, 18.2, 10), 20);
        assert_eq!(settled_outcome(&first), None);
    }

    #[test]
    fn validation_mirrors_form_limits() {
        assert!(snapshot(2, Some(150), 0, 0.0, 0).validate(20).is_ok());
        assert_eq!(
            snapshot(2, None, 0, 0.0, 0).validate(20),
            Err(SnapshotError::MissingTarget)
        );
        assert_eq!(
            snapshot(3, None, 0, 0.0, 0).validate(20),
            Err(SnapshotError::Innings(3))
        );
        assert!(matches!(
            snapshot(1, None, 0, 20.1, 0).validate(20),
            Err(SnapshotError::Overs { .. })
        ));
        assert_eq!(
            snapshot(1, None, 0, 1.0, 11).validate(20),
            Err(SnapshotError::Wickets(11))
        );
    }
}
