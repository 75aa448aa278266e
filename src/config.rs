use std::path::PathBuf;

use crate::match_record::DEFAULT_MATCH_OVERS;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub matches_dir: PathBuf,
    pub feature_table: PathBuf,
    pub model_bundle: PathBuf,
    pub venue_stats: PathBuf,
    pub match_overs: u32,
    pub extended: bool,
    pub jobs: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            matches_dir: PathBuf::from("t20s_json"),
            feature_table: PathBuf::from("t20_data.csv"),
            model_bundle: PathBuf::from("model_bundle.json"),
            venue_stats: PathBuf::from("venue_stats.csv"),
            match_overs: DEFAULT_MATCH_OVERS,
            extended: true,
            jobs: 1,
        }
    }
}

/// Loads `.env.local` then `.env` into the process environment. Missing files are fine.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

impl AppConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            matches_dir: env_path("T20_MATCHES_DIR").unwrap_or(d.matches_dir),
            feature_table: env_path("T20_FEATURE_TABLE").unwrap_or(d.feature_table),
            model_bundle: env_path("T20_MODEL_BUNDLE").unwrap_or(d.model_bundle),
            venue_stats: env_path("T20_VENUE_STATS").unwrap_or(d.venue_stats),
            match_overs: std::env::var("T20_MATCH_OVERS")
                .ok()
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(d.match_overs),
            extended: std::env::var("T20_EXTENDED")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(d.extended),
            jobs: std::env::var("T20_JOBS")
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(d.jobs)
                .max(1),
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn defaults_match_t20_format() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.match_overs, 20);
        assert_eq!(cfg.jobs, 1);
        assert!(cfg.extended);
    }
}
