use std::path::Path;

use crate::error::ExtractError;
use crate::features::{FeatureRow, RunRateStrategy, over_completion_run_rate};
use crate::match_record::{Innings, MatchRecord};

/// Match identifier as used in the training table: the source file name without extension.
pub fn match_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Target for the chasing side. Only a two-innings match has one; an abandoned match or one with
/// super-over innings appended never emits a target.
pub fn target_runs(record: &MatchRecord) -> Option<u32> {
    if record.innings.len() != 2 {
        return None;
    }
    Some(record.innings[0].total_runs() + 1)
}

pub fn bowling_team(teams: &[String], batting_team: Option<&str>) -> Option<String> {
    if teams.len() != 2 {
        return None;
    }
    teams
        .iter()
        .find(|t| Some(t.as_str()) != batting_team)
        .cloned()
}

/// Reads and parses one match file and collects all of its rows.
pub fn extract_match_file(path: &Path) -> Result<Vec<FeatureRow>, ExtractError> {
    let record = MatchRecord::from_path(path)?;
    let match_id = match_id_from_path(path);
    Ok(extract_match(&record, match_id).collect())
}

pub fn extract_match(record: &MatchRecord, match_id: impl Into<String>) -> MatchFeatures<'_> {
    MatchFeatures::new(record, match_id.into())
}

struct MatchContext {
    match_id: String,
    venue: Option<String>,
    toss_winner: Option<String>,
    toss_decision: Option<String>,
    winner: Option<String>,
    target_runs: Option<u32>,
    scheduled_balls: i64,
}

#[derive(Default)]
struct Cursor {
    innings: usize,
    over: usize,
    delivery: usize,
}

#[derive(Default)]
struct Tally {
    runs: u32,
    wickets: u32,
    balls: u32,
}

/// Per-delivery rows of one match, produced on demand in (innings, over, delivery) order.
pub struct MatchFeatures<'a> {
    record: &'a MatchRecord,
    ctx: MatchContext,
    cursor: Cursor,
    tally: Tally,
    bowling_team: Option<String>,
}

impl<'a> MatchFeatures<'a> {
    pub const RUN_RATE: RunRateStrategy = RunRateStrategy::OverCompletion;

    fn new(record: &'a MatchRecord, match_id: String) -> Self {
        let info = &record.info;
        let ctx = MatchContext {
            match_id,
            venue: info.venue.clone(),
            toss_winner: info.toss.winner.clone(),
            toss_decision: info.toss.decision.clone(),
            winner: info.outcome.winner.clone(),
            target_runs: target_runs(record),
            scheduled_balls: i64::from(record.balls_per_over()) * i64::from(record.scheduled_overs()),
        };
        let bowling_team = record
            .innings
            .first()
            .and_then(|inn| bowling_team(&info.teams, inn.team.as_deref()));
        Self {
            record,
            ctx,
            cursor: Cursor::default(),
            tally: Tally::default(),
            bowling_team,
        }
    }

    fn current_innings(&self) -> Option<&'a Innings> {
        self.record.innings.get(self.cursor.innings)
    }

    fn next_innings(&mut self) {
        self.cursor.innings += 1;
        self.cursor.over = 0;
        self.cursor.delivery = 0;
        self.tally = Tally::default();
        self.bowling_team = self
            .current_innings()
            .and_then(|inn| bowling_team(&self.record.info.teams, inn.team.as_deref()));
    }

    fn required_run_rate(&self, innings_no: u32) -> Option<f64> {
        if innings_no != 2 {
            return None;
        }
        let target = self.ctx.target_runs?;
        let balls_remaining = self.ctx.scheduled_balls - i64::from(self.tally.balls);
        if balls_remaining <= 0 {
            return None;
        }
        let runs_required = f64::from(target) - f64::from(self.tally.runs);
        Some(runs_required / (balls_remaining as f64 / 6.0))
    }
}

impl Iterator for MatchFeatures<'_> {
    type Item = FeatureRow;

    fn next(&mut self) -> Option<FeatureRow> {
        loop {
            let innings = self.current_innings()?;
            let Some(over) = innings.overs.get(self.cursor.over) else {
                self.next_innings();
                continue;
            };
            let Some(delivery) = over.deliveries.get(self.cursor.delivery) else {
                self.cursor.over += 1;
                self.cursor.delivery = 0;
                continue;
            };
            self.cursor.delivery += 1;

            self.tally.runs += delivery.runs.total;
            if delivery.is_legal() {
                self.tally.balls += 1;
            }
            self.tally.wickets += delivery.wicket_count();

            let innings_no = (self.cursor.innings + 1) as u32;
            let run_rate =
                over_completion_run_rate(self.tally.runs, over.over, over.deliveries.len());

            return Some(FeatureRow {
                match_id: self.ctx.match_id.clone(),
                venue: self.ctx.venue.clone(),
                toss_winner: self.ctx.toss_winner.clone(),
                toss_decision: self.ctx.toss_decision.clone(),
                batting_team: innings.team.clone(),
                bowling_team: self.bowling_team.clone(),
                innings: innings_no,
                runs_so_far: self.tally.runs,
                wickets_so_far: self.tally.wickets,
                balls_faced: self.tally.balls,
                run_rate,
                target_runs: if innings_no == 2 { self.ctx.target_runs } else { None },
                required_run_rate: self.required_run_rate(innings_no),
                winner: self.ctx.winner.clone(),
            });
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.record.delivery_count();
        let done: usize = self
            .record
            .innings
            .iter()
            .take(self.cursor.innings)
            .flat_map(|inn| inn.overs.iter())
            .map(|o| o.deliveries.len())
            .sum::<usize>()
            + self
                .current_innings()
                .map(|inn| {
                    inn.overs
                        .iter()
                        .take(self.cursor.over)
                        .map(|o| o.deliveries.len())
                        .sum::<usize>()
                        + self.cursor.delivery
                })
                .unwrap_or(0);
        let left = total.saturating_sub(done);
        (left, Some(left))
    }
}
