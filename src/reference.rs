use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use tracing::info;

use crate::config::AppConfig;
use crate::dataset;
use crate::features::FeatureRow;
use crate::model::ModelBundle;
use crate::predict::{Predictor, PredictorOptions};
use crate::venue_stats::VenueStatsTable;

static REFERENCE: OnceCell<ReferenceData> = OnceCell::new();

/// Read-only tables a live session needs: the form's option lists and the predictor.
pub struct ReferenceData {
    pub teams: Vec<String>,
    pub venues: Vec<String>,
    pub predictor: Predictor,
}

impl ReferenceData {
    pub fn load(config: &AppConfig) -> Result<Self> {
        let rows = dataset::read_table(&config.feature_table)?;
        let (teams, venues) = form_choices(&rows);
        if teams.len() < 2 {
            return Err(anyhow!(
                "feature table {} lists fewer than two teams",
                config.feature_table.display()
            ));
        }
        if venues.is_empty() {
            return Err(anyhow!(
                "feature table {} lists no venues",
                config.feature_table.display()
            ));
        }

        let bundle = ModelBundle::load(&config.model_bundle)?;
        let venue_stats = load_venue_stats(&config.venue_stats, config.extended)?;
        info!(
            teams = teams.len(),
            venues = venues.len(),
            venue_stats = venue_stats.len(),
            "reference data loaded"
        );

        let predictor = Predictor::from_bundle(
            bundle,
            venue_stats,
            PredictorOptions {
                match_overs: config.match_overs,
                extended: config.extended,
            },
        );
        Ok(Self {
            teams,
            venues,
            predictor,
        })
    }
}

/// Loads the process-wide reference data on first call; later calls return the same instance.
pub fn init(config: &AppConfig) -> Result<&'static ReferenceData> {
    REFERENCE.get_or_try_init(|| ReferenceData::load(config))
}

pub fn get() -> Option<&'static ReferenceData> {
    REFERENCE.get()
}

/// Teams seen on either side of the ball and venues seen at all, sorted.
pub fn form_choices(rows: &[FeatureRow]) -> (Vec<String>, Vec<String>) {
    let mut teams = BTreeSet::new();
    let mut venues = BTreeSet::new();
    for row in rows {
        for team in [&row.batting_team, &row.bowling_team].into_iter().flatten() {
            if !team.is_empty() {
                teams.insert(team.clone());
            }
        }
        if let Some(venue) = row.venue.as_ref().filter(|v| !v.is_empty()) {
            venues.insert(venue.clone());
        }
    }
    (teams.into_iter().collect(), venues.into_iter().collect())
}

// The plain variant never reads venue stats, so a missing file only matters when extended.
fn load_venue_stats(path: &Path, extended: bool) -> Result<VenueStatsTable> {
    if !extended && !path.exists() {
        return Ok(VenueStatsTable::default());
    }
    VenueStatsTable::load(path).with_context(|| format!("load venue stats {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(batting: Option<&str>, bowling: Option<&str>, venue: Option<&str>) -> FeatureRow {
        FeatureRow {
            match_id: "1".to_string(),
            venue: venue.map(str::to_string),
            toss_winner: None,
            toss_decision: None,
            batting_team: batting.map(str::to_string),
            bowling_team: bowling.map(str::to_string),
            innings: 1,
            runs_so_far: 0,
            wickets_so_far: 0,
            balls_faced: 0,
            run_rate: 0.0,
            target_runs: None,
            required_run_rate: None,
            winner: None,
        }
    }

    #[test]
    fn choices_are_sorted_and_deduplicated() {
        let rows = vec![
            row(Some("Nepal"), Some("Oman"), Some("Kirtipur")),
            row(Some("Oman"), None, None),
            row(Some("Ireland"), Some("Nepal"), Some("Al Amerat")),
        ];
        let (teams, venues) = form_choices(&rows);
        assert_eq!(teams, ["Ireland", "Nepal", "Oman"]);
        assert_eq!(venues, ["Al Amerat", "Kirtipur"]);
    }
}
