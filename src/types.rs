use crate::gaussian;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean / standard deviation pair for a normally distributed parameter
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalParams {
    pub mean: f64,
    pub std: f64,
}

impl NormalParams {
    pub const fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    /// Draw `std * z + mean`. No clamping: negative draws are kept.
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        self.std * gaussian::normal(rng) + self.mean
    }
}

/// One simulated competitor
///
/// `rating` is the observed state, everything else is latent. Only `rating`
/// and `ability` change after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub rating: i32,
    /// Current skill, drifts toward `max_ability`
    pub ability: f64,
    /// Personal ceiling, fixed at creation
    pub max_ability: f64,
    /// Std of per-match performance noise
    pub inconsistency: f64,
    /// Base fraction of the remaining gap closed per match
    pub evolution_rate: f64,
    /// Std of the noise on `evolution_rate`
    pub evolution_variation: f64,
}

#[cfg(test)]
impl Player {
    /// No performance noise and no drift, so outcomes follow ability exactly
    pub(crate) fn new(rating: i32, ability: f64) -> Self {
        Self {
            rating,
            ability,
            max_ability: ability,
            inconsistency: 0.0,
            evolution_rate: 0.0,
            evolution_variation: 0.0,
        }
    }
}

/// Largest accepted `|start_rating|`
pub const MAX_START_RATING: i32 = 1_000_000;
/// Largest accepted rating delta of any kind
pub const MAX_RATING_DELTA: i32 = 10_000;
/// Largest accepted histogram bucket count
pub const MAX_BUCKETS: usize = 10_000;

/// Fixed-step rating deltas keyed on the pre-match rating gap
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingPolicy {
    /// Gaps strictly larger than this count as a mismatch
    pub gap_threshold: i32,
    /// Favourite beats underdog
    pub expected_win_delta: i32,
    /// Ratings within the threshold
    pub close_win_delta: i32,
    /// Underdog beats favourite
    pub upset_win_delta: i32,
    /// Points moved from the higher to the lower rated player on a mismatched draw
    pub draw_delta: i32,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            gap_threshold: 50,
            expected_win_delta: 6,
            close_win_delta: 8,
            upset_win_delta: 10,
            draw_delta: 1,
        }
    }
}

/// Layout of the reported rating histogram
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub bucket_count: usize,
    pub bucket_width: i32,
}

impl HistogramConfig {
    /// Exclusive upper bound of the reported rating range
    pub fn upper_bound(&self) -> i64 {
        self.bucket_count as i64 * self.bucket_width as i64
    }

    /// Bucket index for a rating, `None` when outside `[0, upper_bound)`
    pub fn bucket_of(&self, rating: i32) -> Option<usize> {
        if rating < 0 || rating as i64 >= self.upper_bound() {
            return None;
        }
        Some((rating / self.bucket_width) as usize)
    }
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bucket_count: 40,
            bucket_width: 100,
        }
    }
}

/// Simulation configuration parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub start_rating: i32,
    pub ability: NormalParams,
    pub max_ability: NormalParams,
    pub inconsistency: NormalParams,
    pub evolution_rate: NormalParams,
    pub evolution_variation: NormalParams,
    pub population_size: usize,
    /// Pairing attempts per simulated day
    pub daily_matches: usize,
    /// Retry out-of-range pairings until `daily_matches` matches are resolved
    pub strict_match_count: bool,
    pub rating_policy: RatingPolicy,
    pub histogram: HistogramConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_rating: 1000,
            ability: NormalParams::new(100.0, 10.0),
            max_ability: NormalParams::new(200.0, 20.0),
            inconsistency: NormalParams::new(5.0, 1.0),
            evolution_rate: NormalParams::new(0.01, 0.01),
            evolution_variation: NormalParams::new(0.005, 0.001),
            population_size: 1000,
            daily_matches: 100,
            strict_match_count: false,
            rating_policy: RatingPolicy::default(),
            histogram: HistogramConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be finite, got mean {mean} and std {std}")]
    NonFinite {
        field: &'static str,
        mean: f64,
        std: f64,
    },

    #[error("{field} has negative standard deviation {std}")]
    NegativeStd { field: &'static str, std: f64 },

    #[error("histogram needs at least one bucket of width >= 1 (got {bucket_count} x {bucket_width})")]
    EmptyHistogram { bucket_count: usize, bucket_width: i32 },

    #[error("histogram bucket count {bucket_count} exceeds {max}")]
    TooManyBuckets { bucket_count: usize, max: usize },

    #[error("rating delta {field} must be within 0..={max}, got {value}")]
    DeltaOutOfRange {
        field: &'static str,
        value: i32,
        max: i32,
    },

    #[error("gap_threshold must not be negative, got {0}")]
    NegativeGapThreshold(i32),

    #[error("start_rating must be within -{max}..={max}, got {value}")]
    StartRatingOutOfRange { value: i32, max: i32 },
}

impl SimulationConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Draw margin: performances closer than this end in a draw
    pub fn draw_margin(&self) -> f64 {
        self.inconsistency.mean / 4.0
    }

    /// Reject configs the simulation can't run. Sampled values are never
    /// checked, so negative latent draws stay possible.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, params) in self.latent_params() {
            if !params.mean.is_finite() || !params.std.is_finite() {
                return Err(ConfigError::NonFinite {
                    field,
                    mean: params.mean,
                    std: params.std,
                });
            }
            if params.std < 0.0 {
                return Err(ConfigError::NegativeStd {
                    field,
                    std: params.std,
                });
            }
        }

        if self.histogram.bucket_count == 0 || self.histogram.bucket_width < 1 {
            return Err(ConfigError::EmptyHistogram {
                bucket_count: self.histogram.bucket_count,
                bucket_width: self.histogram.bucket_width,
            });
        }

        if self.histogram.bucket_count > MAX_BUCKETS {
            return Err(ConfigError::TooManyBuckets {
                bucket_count: self.histogram.bucket_count,
                max: MAX_BUCKETS,
            });
        }

        if !(-MAX_START_RATING..=MAX_START_RATING).contains(&self.start_rating) {
            return Err(ConfigError::StartRatingOutOfRange {
                value: self.start_rating,
                max: MAX_START_RATING,
            });
        }

        let policy = &self.rating_policy;
        if policy.gap_threshold < 0 {
            return Err(ConfigError::NegativeGapThreshold(policy.gap_threshold));
        }
        for (field, value) in [
            ("expected_win_delta", policy.expected_win_delta),
            ("close_win_delta", policy.close_win_delta),
            ("upset_win_delta", policy.upset_win_delta),
            ("draw_delta", policy.draw_delta),
        ] {
            if !(0..=MAX_RATING_DELTA).contains(&value) {
                return Err(ConfigError::DeltaOutOfRange {
                    field,
                    value,
                    max: MAX_RATING_DELTA,
                });
            }
        }

        Ok(())
    }

    fn latent_params(&self) -> [(&'static str, NormalParams); 5] {
        [
            ("ability", self.ability),
            ("max_ability", self.max_ability),
            ("inconsistency", self.inconsistency),
            ("evolution_rate", self.evolution_rate),
            ("evolution_variation", self.evolution_variation),
        ]
    }
}

/// What the presentation layer receives once per simulated day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaySnapshot {
    /// 1-based day counter
    pub day: u64,
    /// Raw rating sums per bucket, not normalized
    pub histogram: Vec<i64>,
}

/// Match bookkeeping for a single day
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    /// Pairing draws made (includes skipped ones)
    pub attempted: usize,
    /// Matches actually resolved
    pub realized: usize,
    /// Pairings dropped because the partner index fell outside the population
    pub skipped: usize,
    pub decisive: usize,
    pub draws: usize,
    /// Decisive wins by the lower rated player across a mismatched gap
    pub upsets: usize,
}

impl DayStats {
    pub fn accumulate(&mut self, other: &DayStats) {
        self.attempted += other.attempted;
        self.realized += other.realized;
        self.skipped += other.skipped;
        self.decisive += other.decisive;
        self.draws += other.draws;
        self.upsets += other.upsets;
    }
}

/// Running statistics across the whole run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub days: u64,
    pub totals: DayStats,
    pub last_day: DayStats,
}

/// Point-in-time description of the population
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub player_count: usize,
    pub min_rating: i32,
    pub max_rating: i32,
    pub mean_rating: f64,
    pub mean_ability: f64,
    pub mean_max_ability: f64,
    /// Players the histogram does not report
    pub out_of_range: usize,
    pub negative_evolution_rate: usize,
    pub negative_inconsistency: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.draw_margin(), 1.25);
        assert_eq!(config.histogram.upper_bound(), 4000);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = SimulationConfig::from_json(r#"{"daily_matches": 250, "rating_policy": {"gap_threshold": 75}}"#)
            .unwrap();
        assert_eq!(config.daily_matches, 250);
        assert_eq!(config.rating_policy.gap_threshold, 75);
        assert_eq!(config.rating_policy.close_win_delta, 8);
        assert_eq!(config.population_size, 1000);
        assert_eq!(config.start_rating, 1000);
    }

    #[test]
    fn test_invalid_json_reports_parse_error() {
        let err = SimulationConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_negative_std_rejected() {
        let mut config = SimulationConfig::default();
        config.inconsistency.std = -1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::NegativeStd { field: "inconsistency", .. }));
    }

    #[test]
    fn test_negative_mean_is_allowed() {
        let mut config = SimulationConfig::default();
        config.evolution_rate.mean = -0.01;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_histogram_rejected() {
        let mut config = SimulationConfig::default();
        config.histogram.bucket_count = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyHistogram { .. })
        ));
    }

    #[test]
    fn test_negative_delta_rejected() {
        let mut config = SimulationConfig::default();
        config.rating_policy.upset_win_delta = -10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DeltaOutOfRange { field: "upset_win_delta", .. })
        ));
    }

    #[test]
    fn test_huge_delta_rejected() {
        let mut config = SimulationConfig::default();
        config.rating_policy.close_win_delta = i32::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DeltaOutOfRange { field: "close_win_delta", .. })
        ));
    }

    #[test]
    fn test_extreme_start_rating_rejected() {
        let err = SimulationConfig::from_json(r#"{"start_rating": 2147483647, "population_size": 50}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::StartRatingOutOfRange { value: i32::MAX, .. }));

        let mut config = SimulationConfig::default();
        config.start_rating = -MAX_START_RATING - 1;
        assert!(config.validate().is_err());
        config.start_rating = MAX_START_RATING;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_gap_threshold_rejected() {
        let err = SimulationConfig::from_json(r#"{"rating_policy": {"gap_threshold": -1}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NegativeGapThreshold(-1)));

        let mut config = SimulationConfig::default();
        config.rating_policy.gap_threshold = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bucket_count_capped() {
        let mut config = SimulationConfig::default();
        config.histogram.bucket_count = usize::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyBuckets { .. })
        ));
        config.histogram.bucket_count = MAX_BUCKETS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bucket_of_edges() {
        let hist = HistogramConfig::default();
        assert_eq!(hist.bucket_of(0), Some(0));
        assert_eq!(hist.bucket_of(99), Some(0));
        assert_eq!(hist.bucket_of(100), Some(1));
        assert_eq!(hist.bucket_of(3999), Some(39));
        assert_eq!(hist.bucket_of(4000), None);
        assert_eq!(hist.bucket_of(-1), None);
    }
}
