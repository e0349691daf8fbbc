use crate::error::PipelineError;
use crate::trial::TrialType;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "benchsum.toml";

/// Top-level configuration loaded from benchsum.toml.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
#[derive(Default)]
pub struct BenchConfig {
    pub input: InputConfig,
    pub sweep: SweepConfig,
    pub primary: PrimaryLayout,
    pub log: LogLayout,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub results_dir: PathBuf,
    pub log_suffix: String,
}

/// The `types × rates × trials` space a run walks.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    pub types: Vec<TrialType>,
    pub rates: RateRange,
    /// Trials per configuration; database indices run `0..trials`.
    pub trials: u32,
}

/// Inclusive `start..=end` in increments of `step`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateRange {
    pub start: u32,
    pub end: u32,
    pub step: u32,
}

/// Line offsets in a primary results file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrimaryLayout {
    pub phase1_row: usize,
    pub phase1_time: usize,
    pub phase2_row: usize,
    pub phase2_time: usize,
    pub phase3_count: usize,
    pub phase3_time: usize,
}

/// Counter names and line offsets in a companion `-log` file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogLayout {
    pub threshold_counter: String,
    /// `used` in most harness builds, `seen` in some.
    pub probabilistic_counter: String,
    pub threshold: LogOffsets,
    pub probabilistic: LogOffsets,
    /// Subtract 1 from the probabilistic R/S counts too, not only `pgreq1`.
    pub adjust_probabilistic_rs: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct LogOffsets {
    pub pgreq1: usize,
    pub pgreqr3: usize,
    pub pgreqs3: usize,
}

// --- Default implementations ---

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            log_suffix: "-log".to_string(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            types: TrialType::ALL.to_vec(),
            rates: RateRange::default(),
            trials: 10,
        }
    }
}

impl Default for RateRange {
    fn default() -> Self {
        Self {
            start: 10,
            end: 100,
            step: 10,
        }
    }
}

impl Default for PrimaryLayout {
    fn default() -> Self {
        Self {
            phase1_row: 4,
            phase1_time: 7,
            phase2_row: 10,
            phase2_time: 13,
            phase3_count: 16,
            phase3_time: 19,
        }
    }
}

impl Default for LogLayout {
    fn default() -> Self {
        Self {
            threshold_counter: "rs_nblocks".to_string(),
            probabilistic_counter: "used".to_string(),
            threshold: LogOffsets {
                pgreq1: 0,
                pgreqr3: 4,
                pgreqs3: 6,
            },
            probabilistic: LogOffsets {
                pgreq1: 1,
                pgreqr3: 5,
                pgreqs3: 7,
            },
            adjust_probabilistic_rs: false,
        }
    }
}

impl RateRange {
    /// Rates in ascending order. A zero step yields just `start`.
    pub fn values(&self) -> Vec<u32> {
        if self.step == 0 {
            return vec![self.start];
        }
        (self.start..=self.end).step_by(self.step as usize).collect()
    }
}

impl BenchConfig {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist and parse. Without one,
    /// `benchsum.toml` in the working directory is used when present and
    /// defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let p = Path::new(DEFAULT_CONFIG_FILE);
                if p.exists() {
                    Self::from_file(p)
                } else {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| PipelineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let cfg: Self = toml::from_str(&contents).map_err(|e| PipelineError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        cfg.validate(path)?;
        Ok(cfg)
    }

    fn validate(&self, path: &Path) -> Result<(), PipelineError> {
        let invalid = |message: &str| PipelineError::Config {
            path: path.to_path_buf(),
            message: message.to_string(),
        };
        if self.sweep.types.is_empty() {
            return Err(invalid("sweep.types must name at least one trial type"));
        }
        if self.sweep.rates.start > self.sweep.rates.end {
            return Err(invalid("sweep.rates.start must not exceed sweep.rates.end"));
        }
        if self.log.threshold_counter.is_empty() || self.log.probabilistic_counter.is_empty() {
            return Err(invalid("log counter names must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_cover_the_full_sweep() {
        let cfg = BenchConfig::default();
        assert_eq!(
            cfg.sweep.types,
            vec![TrialType::Threshold, TrialType::Probabilistic]
        );
        assert_eq!(
            cfg.sweep.rates.values(),
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
        assert_eq!(cfg.sweep.trials, 10);
        assert_eq!(cfg.input.results_dir, PathBuf::from("results"));
        assert_eq!(cfg.log.probabilistic_counter, "used");
        assert!(!cfg.log.adjust_probabilistic_rs);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: BenchConfig = toml::from_str(
            r#"
[sweep]
types = ["p"]
rates = { start = 50, end = 50 }

[log]
probabilistic_counter = "seen"
"#,
        )
        .unwrap();
        assert_eq!(cfg.sweep.types, vec![TrialType::Probabilistic]);
        assert_eq!(cfg.sweep.rates.values(), vec![50]);
        assert_eq!(cfg.sweep.trials, 10);
        assert_eq!(cfg.log.probabilistic_counter, "seen");
        assert_eq!(cfg.log.threshold.pgreqr3, 4);
        assert_eq!(cfg.primary.phase3_time, 19);
    }

    #[test]
    fn rs_adjustment_can_be_enabled() {
        let cfg: BenchConfig =
            toml::from_str("[log]\nadjust_probabilistic_rs = true\n").unwrap();
        assert!(cfg.log.adjust_probabilistic_rs);
        assert_eq!(cfg.log.probabilistic.pgreq1, 1);
    }

    #[test]
    fn long_type_names_are_accepted() {
        let cfg: BenchConfig = toml::from_str(
            r#"
[sweep]
types = ["threshold", "probabilistic"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.sweep.types.len(), 2);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result: Result<BenchConfig, _> = toml::from_str(
            r#"
[sweep]
types = ["q"]
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = BenchConfig::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn inverted_rate_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("benchsum.toml");
        std::fs::write(&path, "[sweep]\nrates = { start = 90, end = 10, step = 10 }\n").unwrap();
        let err = BenchConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("sweep.rates.start"));
    }

    #[test]
    fn zero_step_yields_single_rate() {
        let r = RateRange {
            start: 30,
            end: 90,
            step: 0,
        };
        assert_eq!(r.values(), vec![30]);
    }
}
