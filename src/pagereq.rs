//! Page-request counts from a trial's companion `-log` file.
//!
//! The two trial types log their page counter under different names and on
//! different lines:
//!
//! - threshold: `... rs_nblocks = N ...` on lines 0, 4, 6
//! - probabilistic: `... used = N ...` (some builds: `seen = N`) on lines 1, 5, 7
//!
//! Each type is a [`PageRequestStrategy`]; only the strategy for the trial's
//! own type reads the log, so lines that belong to the other type are never
//! required to match.

use crate::config::{LogLayout, LogOffsets};
use crate::error::{ExtractError, PipelineError};
use crate::trial::{Field, ResultRecord, TrialType, Value};
use regex::Regex;
use std::path::Path;

/// The log fields page-request strategies fill.
pub const PAGE_REQUEST_FIELDS: [Field; 3] = [Field::PgReq1, Field::PgReqR3, Field::PgReqS3];

/// Type-specific rule for reading page-request counts out of a log.
pub trait PageRequestStrategy {
    fn trial_type(&self) -> TrialType;

    /// Pattern with one capture group holding the counter value.
    fn pattern(&self) -> &Regex;

    /// Log line the counter for `field` is written on.
    fn offset(&self, field: Field) -> Option<usize>;

    /// Correction added to the captured value.
    fn adjustment(&self, _field: Field) -> i64 {
        0
    }
}

pub struct ThresholdStrategy {
    pattern: Regex,
    offsets: LogOffsets,
}

pub struct ProbabilisticStrategy {
    pattern: Regex,
    offsets: LogOffsets,
    adjust_rs: bool,
}

fn counter_pattern(counter: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"{} = (\d+)", regex::escape(counter)))
}

fn offset_of(offsets: &LogOffsets, field: Field) -> Option<usize> {
    match field {
        Field::PgReq1 => Some(offsets.pgreq1),
        Field::PgReqR3 => Some(offsets.pgreqr3),
        Field::PgReqS3 => Some(offsets.pgreqs3),
        _ => None,
    }
}

impl ThresholdStrategy {
    pub fn new(counter: &str, offsets: LogOffsets) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: counter_pattern(counter)?,
            offsets,
        })
    }
}

impl ProbabilisticStrategy {
    /// With `adjust_rs` the R/S counts of query 3 get the same -1 as the
    /// single-scan count.
    pub fn new(
        counter: &str,
        offsets: LogOffsets,
        adjust_rs: bool,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: counter_pattern(counter)?,
            offsets,
            adjust_rs,
        })
    }
}

impl PageRequestStrategy for ThresholdStrategy {
    fn trial_type(&self) -> TrialType {
        TrialType::Threshold
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn offset(&self, field: Field) -> Option<usize> {
        offset_of(&self.offsets, field)
    }
}

impl PageRequestStrategy for ProbabilisticStrategy {
    fn trial_type(&self) -> TrialType {
        TrialType::Probabilistic
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn offset(&self, field: Field) -> Option<usize> {
        offset_of(&self.offsets, field)
    }

    // The probabilistic counter logs one more page than the threshold
    // counter for the single-scan query. The R/S counts of query 3 are
    // reported as logged unless `adjust_rs` is set.
    fn adjustment(&self, field: Field) -> i64 {
        match field {
            Field::PgReq1 => -1,
            Field::PgReqR3 | Field::PgReqS3 if self.adjust_rs => -1,
            _ => 0,
        }
    }
}

/// One strategy per trial type, built once from the log layout.
pub struct LogExtractor {
    threshold: ThresholdStrategy,
    probabilistic: ProbabilisticStrategy,
}

impl LogExtractor {
    pub fn new(layout: &LogLayout) -> Result<Self, PipelineError> {
        let config_err = |e: regex::Error| PipelineError::Config {
            path: "[log]".into(),
            message: e.to_string(),
        };
        Ok(Self {
            threshold: ThresholdStrategy::new(&layout.threshold_counter, layout.threshold)
                .map_err(config_err)?,
            probabilistic: ProbabilisticStrategy::new(
                &layout.probabilistic_counter,
                layout.probabilistic,
                layout.adjust_probabilistic_rs,
            )
            .map_err(config_err)?,
        })
    }

    pub fn strategy(&self, trial_type: TrialType) -> &dyn PageRequestStrategy {
        match trial_type {
            TrialType::Threshold => &self.threshold,
            TrialType::Probabilistic => &self.probabilistic,
        }
    }

    /// Fill the page-request fields of `record` from its companion log.
    ///
    /// A field whose line is past the end of the log is skipped unless it is
    /// in `required`.
    pub fn extract(
        &self,
        path: &Path,
        lines: &[String],
        required: &[Field],
        record: &mut ResultRecord,
    ) -> Result<(), ExtractError> {
        let strategy = self.strategy(record.key.config.trial_type);
        for field in PAGE_REQUEST_FIELDS {
            match extract_page_requests(path, lines, strategy, field) {
                Ok(Some(v)) => record.set(field, Value::Int(v)),
                Ok(None) if required.contains(&field) => {
                    return Err(ExtractError::MissingLine {
                        path: path.to_path_buf(),
                        line: strategy.offset(field).unwrap_or(0),
                        field: field.name(),
                        len: lines.len(),
                    });
                }
                Ok(None) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Read the page-request count for `field` using `strategy`.
///
/// Returns `Ok(None)` when the log has no line at the field's offset, and an
/// error when the line is there but does not carry the strategy's counter.
pub fn extract_page_requests(
    path: &Path,
    lines: &[String],
    strategy: &dyn PageRequestStrategy,
    field: Field,
) -> Result<Option<i64>, ExtractError> {
    let Some(offset) = strategy.offset(field) else {
        return Ok(None);
    };
    let Some(line) = lines.get(offset) else {
        return Ok(None);
    };
    let malformed = || ExtractError::Malformed {
        path: path.to_path_buf(),
        line: offset,
        expected: format!("'{}'", strategy.pattern().as_str().replace(r"(\d+)", "<int>")),
        found: line.clone(),
    };
    let captured = strategy
        .pattern()
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(malformed)?;
    let value = captured + strategy.adjustment(field);
    tracing::trace!(
        path = %path.display(),
        field = field.name(),
        trial_type = %strategy.trial_type(),
        captured,
        value,
        "page requests"
    );
    Ok(Some(value))
}
