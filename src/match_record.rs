use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

pub const DEFAULT_BALLS_PER_OVER: u32 = 6;
pub const DEFAULT_MATCH_OVERS: u32 = 20;

/// One ball-by-ball match file. Only the keys the feature pipeline reads are modelled; anything
/// else in the file is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub info: MatchInfo,
    #[serde(default)]
    pub innings: Vec<Innings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchInfo {
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub toss: Toss,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub outcome: Outcome,
    #[serde(default)]
    pub balls_per_over: Option<u32>,
    #[serde(default)]
    pub overs: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Toss {
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub decision: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub winner: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Innings {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub overs: Vec<Over>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Over {
    pub over: u32,
    #[serde(default)]
    pub deliveries: Vec<Delivery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub runs: DeliveryRuns,
    #[serde(default)]
    pub extras: Extras,
    #[serde(default)]
    pub wickets: Vec<Wicket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRuns {
    #[serde(default)]
    pub batter: u32,
    #[serde(default)]
    pub extras: u32,
    pub total: u32,
}

// Presence of a key matters more than its value: a wide worth 0 runs is still a wide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wides: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noballs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legbyes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wicket {
    #[serde(default)]
    pub player_out: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl MatchRecord {
    pub fn from_json_str(raw: &str) -> Result<Self, ExtractError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn balls_per_over(&self) -> u32 {
        self.info.balls_per_over.unwrap_or(DEFAULT_BALLS_PER_OVER)
    }

    pub fn scheduled_overs(&self) -> u32 {
        self.info.overs.unwrap_or(DEFAULT_MATCH_OVERS)
    }

    pub fn delivery_count(&self) -> usize {
        self.innings
            .iter()
            .flat_map(|inn| inn.overs.iter())
            .map(|over| over.deliveries.len())
            .sum()
    }
}

impl Innings {
    pub fn total_runs(&self) -> u32 {
        self.overs
            .iter()
            .flat_map(|over| over.deliveries.iter())
            .map(|d| d.runs.total)
            .sum()
    }
}

impl Delivery {
    pub fn is_legal(&self) -> bool {
        self.extras.wides.is_none() && self.extras.noballs.is_none()
    }

    pub fn wicket_count(&self) -> u32 {
        self.wickets.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wides_and_noballs_are_illegal() {
        let raw = r#"{
            "innings": [{
                "team": "A",
                "overs": [{
                    "over": 0,
                    "deliveries": [
                        {"runs": {"batter": 0, "extras": 1, "total": 1}, "extras": {"wides": 1}},
                        {"runs": {"batter": 1, "extras": 1, "total": 2}, "extras": {"noballs": 1}},
                        {"runs": {"batter": 0, "extras": 1, "total": 1}, "extras": {"legbyes": 1}},
                        {"runs": {"batter": 4, "extras": 0, "total": 4}}
                    ]
                }]
            }]
        }"#;
        let record = MatchRecord::from_json_str(raw).unwrap();
        let legal = record.innings[0].overs[0]
            .deliveries
            .iter()
            .map(Delivery::is_legal)
            .collect::<Vec<_>>();
        assert_eq!(legal, vec![false, false, true, true]);
        assert_eq!(record.innings[0].total_runs(), 8);
    }

    #[test]
    fn missing_info_uses_defaults() {
        let record = MatchRecord::from_json_str(r#"{"innings": []}"#).unwrap();
        assert_eq!(record.balls_per_over(), 6);
        assert_eq!(record.scheduled_overs(), 20);
        assert!(record.info.teams.is_empty());
        assert!(record.info.venue.is_none());
    }

    #[test]
    fn missing_total_runs_is_a_parse_error() {
        let raw = r#"{"innings": [{"team": "A", "overs": [{"over": 0, "deliveries": [{"runs": {"batter": 1}}]}]}]}"#;
        assert!(matches!(
            MatchRecord::from_json_str(raw),
            Err(ExtractError::Json(_))
        ));
    }
}
