use tracing::debug;

use crate::encoding::LabelEncoders;
use crate::error::PredictError;
use crate::live::{
    LiveFeatureRow, LiveSnapshot, build_live_row, settled_outcome, with_venue_projection,
};
use crate::model::{ModelBundle, WinProbability, WinScorer};
use crate::venue_stats::VenueStatsTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorOptions {
    pub match_overs: u32,
    /// Venue projection and settled-chase overrides.
    pub extended: bool,
}

impl Default for PredictorOptions {
    fn default() -> Self {
        Self {
            match_overs: crate::match_record::DEFAULT_MATCH_OVERS,
            extended: true,
        }
    }
}

pub struct InningsModel {
    pub scorer: Box<dyn WinScorer>,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub row: LiveFeatureRow,
    pub features: Vec<f64>,
    pub model_probability: WinProbability,
    pub probability: WinProbability,
    pub overridden: bool,
}

/// Scores live snapshots. Immutable once built, so one instance can serve any number of
/// concurrent requests.
pub struct Predictor {
    encoders: LabelEncoders,
    innings1: InningsModel,
    innings2: InningsModel,
    venues: VenueStatsTable,
    options: PredictorOptions,
}

impl Predictor {
    pub fn new(
        encoders: LabelEncoders,
        innings1: InningsModel,
        innings2: InningsModel,
        venues: VenueStatsTable,
        options: PredictorOptions,
    ) -> Self {
        Self {
            encoders,
            innings1,
            innings2,
            venues,
            options,
        }
    }

    pub fn from_bundle(
        bundle: ModelBundle,
        venues: VenueStatsTable,
        options: PredictorOptions,
    ) -> Self {
        Self::new(
            bundle.label_encoders,
            InningsModel {
                scorer: Box::new(bundle.model_inn1),
                features: bundle.features_inn1,
            },
            InningsModel {
                scorer: Box::new(bundle.model_inn2),
                features: bundle.features_inn2,
            },
            venues,
            options,
        )
    }

    pub fn options(&self) -> PredictorOptions {
        self.options
    }

    pub fn encoders(&self) -> &LabelEncoders {
        &self.encoders
    }

    pub fn build_row(&self, snapshot: &LiveSnapshot) -> Result<LiveFeatureRow, PredictError> {
        snapshot.validate(self.options.match_overs)?;
        let row = build_live_row(snapshot, self.options.match_overs);
        Ok(if self.options.extended {
            with_venue_projection(row, &self.venues)
        } else {
            row
        })
    }

    /// Encodes every categorical column the encoders know about, then lays out the innings'
    /// feature list in order.
    pub fn feature_vector(
        &self,
        row: &LiveFeatureRow,
        features: &[String],
    ) -> Result<Vec<f64>, PredictError> {
        let mut codes = Vec::new();
        for column in self.encoders.columns() {
            if let Some(value) = row.categorical(column) {
                codes.push((column, f64::from(self.encoders.encode(column, value)?)));
            }
        }

        features
            .iter()
            .map(|name| {
                if let Some((_, code)) = codes.iter().find(|(c, _)| *c == name.as_str()) {
                    return Ok(*code);
                }
                match row.numeric(name) {
                    Some(Some(v)) => Ok(v),
                    Some(None) => Err(PredictError::MissingFeature(name.clone())),
                    None => Err(PredictError::UnknownFeature(name.clone())),
                }
            })
            .collect()
    }

    pub fn predict(&self, snapshot: &LiveSnapshot) -> Result<Prediction, PredictError> {
        let row = self.build_row(snapshot)?;
        let model = if row.innings == 1 {
            &self.innings1
        } else {
            &self.innings2
        };
        let features = self.feature_vector(&row, &model.features)?;
        let model_probability = model.scorer.predict_proba(&features)?;

        let settled = if self.options.extended {
            settled_outcome(&row)
        } else {
            None
        };
        let probability = settled.unwrap_or(model_probability);
        debug!(
            innings = row.innings,
            balls_faced = row.balls_faced,
            run_rate = row.run_rate,
            run_rate_strategy = LiveFeatureRow::RUN_RATE.label(),
            win = probability.win,
            overridden = settled.is_some(),
            "scored live snapshot"
        );

        Ok(Prediction {
            row,
            features,
            model_probability,
            probability,
            overridden: settled.is_some(),
        })
    }
}
