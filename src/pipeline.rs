//! Walks a sweep of configurations, loads each trial's file pair into a
//! record, and feeds records or per-configuration summaries to a reporter.
//!
//! Trials are processed one at a time; both files of a trial are read and
//! closed before the next trial starts.

use crate::aggregate::{self, Query, TrialGroup};
use crate::config::{BenchConfig, SweepConfig};
use crate::error::PipelineError;
use crate::pagereq::LogExtractor;
use crate::report::{Reporter, RowKind};
use crate::results_dir::{read_lines, ResultsDir};
use crate::schema::PrimarySchema;
use crate::trial::{Configuration, ResultRecord, TrialKey, TrialType};
use std::io::Write;

/// The `types × rates × trials` space to walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    pub types: Vec<TrialType>,
    pub rates: Vec<u32>,
    pub trials: Vec<u32>,
}

impl Sweep {
    pub fn from_config(cfg: &SweepConfig) -> Self {
        Self {
            types: cfg.types.clone(),
            rates: cfg.rates.values(),
            trials: (0..cfg.trials).collect(),
        }
    }

    /// A sweep over a single configuration.
    pub fn single(trial_type: TrialType, rate: u32, trials: u32) -> Self {
        Self {
            types: vec![trial_type],
            rates: vec![rate],
            trials: (0..trials).collect(),
        }
    }

    /// Configurations in output order: type outer, rate inner.
    pub fn configurations(&self) -> Vec<Configuration> {
        self.types
            .iter()
            .flat_map(|&trial_type| {
                self.rates
                    .iter()
                    .map(move |&rate| Configuration { trial_type, rate })
            })
            .collect()
    }

    pub fn keys(&self, config: Configuration) -> impl Iterator<Item = TrialKey> + '_ {
        self.trials.iter().map(move |&db| TrialKey { config, db })
    }
}

pub struct Pipeline {
    dir: ResultsDir,
    schema: PrimarySchema,
    logs: LogExtractor,
}

impl Pipeline {
    pub fn new(cfg: &BenchConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            dir: ResultsDir::new(&cfg.input.results_dir, &cfg.input.log_suffix),
            schema: PrimarySchema::from_layout(&cfg.primary),
            logs: LogExtractor::new(&cfg.log)?,
        })
    }

    pub fn results_dir(&self) -> &ResultsDir {
        &self.dir
    }

    pub fn schema(&self) -> &PrimarySchema {
        &self.schema
    }

    /// Read and extract one trial's file pair.
    pub fn load_trial(&self, key: TrialKey, query: Query) -> Result<ResultRecord, PipelineError> {
        let required = query.required_fields();
        let mut record = ResultRecord::new(key);

        let primary = self.dir.trial_file(&key);
        let lines = read_lines(&primary)?;
        self.schema
            .extract(&primary, &lines, &required, &mut record)?;

        let log = self.dir.log_file(&key);
        let log_lines = read_lines(&log)?;
        self.logs.extract(&log, &log_lines, &required, &mut record)?;

        tracing::debug!(trial = %key, lines = lines.len(), log_lines = log_lines.len(), "loaded trial");
        Ok(record)
    }

    pub fn load_group(
        &self,
        sweep: &Sweep,
        config: Configuration,
        query: Query,
    ) -> Result<TrialGroup, PipelineError> {
        let records = sweep
            .keys(config)
            .map(|key| self.load_trial(key, query))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TrialGroup { config, records })
    }

    /// Print one comma-separated row per trial. Returns the number of rows.
    pub fn report_trials<W: Write>(
        &self,
        sweep: &Sweep,
        query: Query,
        out: W,
    ) -> Result<usize, PipelineError> {
        let mut reporter = Reporter::new(out, query, RowKind::Trial);
        for config in sweep.configurations() {
            for key in sweep.keys(config) {
                let record = self.load_trial(key, query)?;
                reporter
                    .write_trial(&record)
                    .map_err(PipelineError::Output)?;
            }
        }
        reporter.finish().map_err(PipelineError::Output)
    }

    /// Print one tab-separated summary row per configuration. Returns the
    /// number of rows.
    pub fn report_summary<W: Write>(
        &self,
        sweep: &Sweep,
        query: Query,
        out: W,
    ) -> Result<usize, PipelineError> {
        let mut records = Vec::new();
        for config in sweep.configurations() {
            records.extend(self.load_group(sweep, config, query)?.records);
        }
        let groups = aggregate::group_records(records);
        let rows = aggregate::aggregate(&groups, query)?;

        let mut reporter = Reporter::new(out, query, RowKind::Summary);
        for row in &rows {
            reporter
                .write_summary(row)
                .map_err(PipelineError::Output)?;
        }
        reporter.finish().map_err(PipelineError::Output)
    }
}
