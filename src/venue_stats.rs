use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::features::FeatureRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueStats {
    pub venue: String,
    pub matches: usize,
    pub avg_first_innings_score: f64,
    pub avg_second_innings_score: Option<f64>,
}

/// Per-venue aggregates keyed by venue name. Lookups on an unknown venue return `None`.
#[derive(Debug, Clone, Default)]
pub struct VenueStatsTable {
    by_venue: HashMap<String, VenueStats>,
}

impl VenueStatsTable {
    pub fn from_rows(rows: impl IntoIterator<Item = VenueStats>) -> Self {
        Self {
            by_venue: rows.into_iter().map(|r| (r.venue.clone(), r)).collect(),
        }
    }

    pub fn get(&self, venue: &str) -> Option<&VenueStats> {
        self.by_venue.get(venue)
    }

    pub fn avg_first_innings_score(&self, venue: &str) -> Option<f64> {
        self.get(venue).map(|s| s.avg_first_innings_score)
    }

    pub fn len(&self) -> usize {
        self.by_venue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_venue.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("open venue stats {}", path.display()))?;
        let mut rows = Vec::new();
        for record in reader.deserialize::<VenueStats>() {
            rows.push(record.with_context(|| format!("parse venue stats {}", path.display()))?);
        }
        Ok(Self::from_rows(rows))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)
                .with_context(|| format!("create venue stats {}", tmp.display()))?;
            let mut rows = self.by_venue.values().collect::<Vec<_>>();
            rows.sort_by(|a, b| a.venue.cmp(&b.venue));
            for row in rows {
                writer.serialize(row).context("write venue stats row")?;
            }
            writer.flush().context("flush venue stats")?;
        }
        std::fs::rename(&tmp, path).context("swap venue stats")?;
        Ok(())
    }
}

/// Final score of each innings of each match, then averaged per venue. Rows without a venue are
/// ignored.
pub fn compute_venue_stats(rows: &[FeatureRow]) -> VenueStatsTable {
    // (match_id, innings) -> (venue, final runs)
    let mut finals: BTreeMap<(&str, u32), (&str, u32)> = BTreeMap::new();
    for row in rows {
        let Some(venue) = row.venue.as_deref() else {
            continue;
        };
        let entry = finals
            .entry((row.match_id.as_str(), row.innings))
            .or_insert((venue, 0));
        entry.1 = entry.1.max(row.runs_so_far);
    }

    #[derive(Default)]
    struct Acc {
        first_sum: f64,
        first_n: usize,
        second_sum: f64,
        second_n: usize,
    }

    let mut per_venue: BTreeMap<&str, Acc> = BTreeMap::new();
    for (&(_, innings), &(venue, runs)) in &finals {
        let acc = per_venue.entry(venue).or_default();
        match innings {
            1 => {
                acc.first_sum += f64::from(runs);
                acc.first_n += 1;
            }
            2 => {
                acc.second_sum += f64::from(runs);
                acc.second_n += 1;
            }
            _ => {}
        }
    }

    VenueStatsTable::from_rows(per_venue.into_iter().filter(|(_, acc)| acc.first_n > 0).map(
        |(venue, acc)| VenueStats {
            venue: venue.to_string(),
            matches: acc.first_n,
            avg_first_innings_score: acc.first_sum / acc.first_n as f64,
            avg_second_innings_score: (acc.second_n > 0)
                .then(|| acc.second_sum / acc.second_n as f64),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(match_id: &str, venue: Option<&str>, innings: u32, runs: u32) -> FeatureRow {
        FeatureRow {
            match_id: match_id.to_string(),
            venue: venue.map(str::to_string),
            toss_winner: None,
            toss_decision: None,
            batting_team: None,
            bowling_team: None,
            innings,
            runs_so_far: runs,
            wickets_so_far: 0,
            balls_faced: 0,
            run_rate: 0.0,
            target_runs: None,
            required_run_rate: None,
            winner: None,
        }
    }

    #[test]
    fn averages_final_first_innings_scores() {
        let rows = vec![
            row("1", Some("MCG"), 1, 50),
            row("1", Some("MCG"), 1, 160),
            row("1", Some("MCG"), 2, 120),
            row("2", Some("MCG"), 1, 180),
            row("3", Some("SCG"), 2, 90),
            row("4", None, 1, 200),
        ];
        let table = compute_venue_stats(&rows);
        let mcg = table.get("MCG").unwrap();
        assert_eq!(mcg.matches, 2);
        assert_eq!(mcg.avg_first_innings_score, 170.0);
        assert_eq!(mcg.avg_second_innings_score, Some(120.0));
        // Only a chase recorded there: no first-innings average to offer.
        assert!(table.get("SCG").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unknown_venue_is_none() {
        let table = VenueStatsTable::default();
        assert_eq!(table.avg_first_innings_score("Nowhere"), None);
    }
}
