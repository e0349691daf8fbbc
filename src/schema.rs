//! Primary results file layout and the field extractor that applies it.
//!
//! The harness writes psql output with fixed line positions: an `avg | count`
//! row and a `Time: N ms` line for each of three phases. The layout is
//! captured as an ordered list of `(offset, rule)` pairs so it can be read
//! and tested on its own.

use crate::config::PrimaryLayout;
use crate::error::ExtractError;
use crate::trial::{Field, ResultRecord, Value};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Time: (.*) ms").unwrap());

/// How to parse one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// `<float> | <int>`: first segment into `avg`, second into `count`.
    AvgCount { avg: Field, count: Field },
    /// `Time: <float> ms`.
    Time(Field),
    /// The whole trimmed line as an integer.
    Count(Field),
}

impl Rule {
    fn fields(&self) -> Vec<Field> {
        match *self {
            Rule::AvgCount { avg, count } => vec![avg, count],
            Rule::Time(f) | Rule::Count(f) => vec![f],
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Rule::AvgCount { .. } => "'<float> | <int>'",
            Rule::Time(_) => "'Time: <number> ms'",
            Rule::Count(_) => "an integer",
        }
    }

    /// Parse `line` into `(field, value)` pairs, or `None` when it does not match.
    fn apply(&self, line: &str) -> Option<Vec<(Field, Value)>> {
        match *self {
            Rule::AvgCount { avg, count } => {
                let mut parts = line.split('|');
                let a = parts.next()?.trim().parse::<f64>().ok()?;
                let c = parts.next()?.trim().parse::<i64>().ok()?;
                Some(vec![(avg, Value::Float(a)), (count, Value::Int(c))])
            }
            Rule::Time(field) => {
                let caps = TIME_PATTERN.captures(line)?;
                let t = caps.get(1)?.as_str().trim().parse::<f64>().ok()?;
                Some(vec![(field, Value::Float(t))])
            }
            Rule::Count(field) => {
                let c = line.trim().parse::<i64>().ok()?;
                Some(vec![(field, Value::Int(c))])
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineRule {
    pub offset: usize,
    pub rule: Rule,
}

/// Ordered `(offset, rule)` layout of a primary results file.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimarySchema {
    rules: Vec<LineRule>,
}

impl PrimarySchema {
    pub fn new(mut rules: Vec<LineRule>) -> Self {
        rules.sort_by_key(|r| r.offset);
        Self { rules }
    }

    pub fn from_layout(layout: &PrimaryLayout) -> Self {
        Self::new(vec![
            LineRule {
                offset: layout.phase1_row,
                rule: Rule::AvgCount {
                    avg: Field::Avg1,
                    count: Field::Count1,
                },
            },
            LineRule {
                offset: layout.phase1_time,
                rule: Rule::Time(Field::Time1),
            },
            LineRule {
                offset: layout.phase2_row,
                rule: Rule::AvgCount {
                    avg: Field::Avg2,
                    count: Field::Count2,
                },
            },
            LineRule {
                offset: layout.phase2_time,
                rule: Rule::Time(Field::Time2),
            },
            LineRule {
                offset: layout.phase3_count,
                rule: Rule::Count(Field::Count3),
            },
            LineRule {
                offset: layout.phase3_time,
                rule: Rule::Time(Field::Time3),
            },
        ])
    }

    pub fn rules(&self) -> &[LineRule] {
        &self.rules
    }

    /// Populate `record` from the lines of a primary results file.
    ///
    /// Every schema line present in `lines` must match its rule. A file that
    /// ends before the line of a field in `required` is an error; rules past
    /// the end that nothing requires are skipped.
    pub fn extract(
        &self,
        path: &Path,
        lines: &[String],
        required: &[Field],
        record: &mut ResultRecord,
    ) -> Result<(), ExtractError> {
        for lr in &self.rules {
            let Some(line) = lines.get(lr.offset) else {
                if let Some(field) = lr.rule.fields().into_iter().find(|f| required.contains(f)) {
                    return Err(ExtractError::MissingLine {
                        path: path.to_path_buf(),
                        line: lr.offset,
                        field: field.name(),
                        len: lines.len(),
                    });
                }
                continue;
            };

            let values = lr.rule.apply(line).ok_or_else(|| ExtractError::Malformed {
                path: path.to_path_buf(),
                line: lr.offset,
                expected: lr.rule.expected().to_string(),
                found: line.clone(),
            })?;
            for (field, value) in values {
                record.set(field, value);
            }
        }
        Ok(())
    }
}

impl Default for PrimarySchema {
    fn default() -> Self {
        Self::from_layout(&PrimaryLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::{Configuration, TrialKey, TrialType};
    use std::path::PathBuf;

    fn record() -> ResultRecord {
        ResultRecord::new(TrialKey {
            config: Configuration {
                trial_type: TrialType::Threshold,
                rate: 50,
            },
            db: 0,
        })
    }

    /// Twenty lines shaped like psql output for the three phases.
    fn primary_lines(avg1: &str, count1: i64, time1: f64) -> Vec<String> {
        let mut lines: Vec<String> = (0..20).map(|i| format!("filler {i}")).collect();
        lines[4] = format!(" {avg1} | {count1}");
        lines[7] = format!("Time: {time1:.3} ms");
        lines[10] = " 7.25 | 12".to_string();
        lines[13] = "Time: 3.100 ms".to_string();
        lines[16] = "   99".to_string();
        lines[19] = "Time: 44.000 ms".to_string();
        lines
    }

    fn all_fields() -> Vec<Field> {
        vec![
            Field::Avg1,
            Field::Count1,
            Field::Time1,
            Field::Count3,
            Field::Time3,
        ]
    }

    #[test]
    fn extracts_avg_and_count_from_pipe_row() {
        let mut r = record();
        let lines = primary_lines("12.5", 37, 100.0);
        PrimarySchema::default()
            .extract(Path::new("f"), &lines, &all_fields(), &mut r)
            .unwrap();
        assert_eq!(r.avg1, Some(12.5));
        assert_eq!(r.count1, Some(37));
        assert_eq!(r.time1, Some(100.0));
        assert_eq!(r.avg2, Some(7.25));
        assert_eq!(r.count2, Some(12));
        assert_eq!(r.time2, Some(3.1));
        assert_eq!(r.count3, Some(99));
        assert_eq!(r.time3, Some(44.0));
    }

    #[test]
    fn non_schema_lines_are_ignored() {
        let mut r = record();
        let mut lines = primary_lines("1.0", 1, 1.0);
        lines[0] = "anything at all".to_string();
        lines[18] = "| not | a | number".to_string();
        assert!(PrimarySchema::default()
            .extract(Path::new("f"), &lines, &[], &mut r)
            .is_ok());
    }

    #[test]
    fn malformed_time_line_is_an_error() {
        let mut r = record();
        let mut lines = primary_lines("1.0", 1, 1.0);
        lines[7] = "Elapsed: 12 ms".to_string();
        let err = PrimarySchema::default()
            .extract(Path::new("results/t-50-0"), &lines, &[], &mut r)
            .unwrap_err();
        match err {
            ExtractError::Malformed { line, path, .. } => {
                assert_eq!(line, 7);
                assert_eq!(path, PathBuf::from("results/t-50-0"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn row_without_delimiter_is_an_error() {
        let mut r = record();
        let mut lines = primary_lines("1.0", 1, 1.0);
        lines[4] = "12.5".to_string();
        assert!(matches!(
            PrimarySchema::default().extract(Path::new("f"), &lines, &[], &mut r),
            Err(ExtractError::Malformed { line: 4, .. })
        ));
    }

    #[test]
    fn short_file_fails_when_phase_three_required() {
        let mut r = record();
        let mut lines = primary_lines("1.0", 1, 1.0);
        lines.truncate(14);
        let err = PrimarySchema::default()
            .extract(Path::new("f"), &lines, &[Field::Count3, Field::Time3], &mut r)
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MissingLine {
                line: 16,
                field: "count3",
                len: 14,
                ..
            }
        ));
    }

    #[test]
    fn short_file_is_fine_when_only_phase_one_required() {
        let mut r = record();
        let mut lines = primary_lines("2.5", 4, 9.0);
        lines.truncate(8);
        PrimarySchema::default()
            .extract(Path::new("f"), &lines, &[Field::Time1, Field::Count1], &mut r)
            .unwrap();
        assert_eq!(r.time1, Some(9.0));
        assert_eq!(r.time3, None);
    }

    #[test]
    fn layout_offsets_can_be_moved() {
        let layout = PrimaryLayout {
            phase1_row: 1,
            phase1_time: 2,
            ..PrimaryLayout::default()
        };
        let schema = PrimarySchema::from_layout(&layout);
        assert_eq!(schema.rules()[0].offset, 1);
        assert_eq!(schema.rules()[1].rule, Rule::Time(Field::Time1));

        let lines: Vec<String> = vec!["x".into(), "3.0|4".into(), "Time: 5 ms".into()];
        let mut r = record();
        schema
            .extract(Path::new("f"), &lines, &[Field::Time1], &mut r)
            .unwrap();
        assert_eq!(r.count1, Some(4));
        assert_eq!(r.time1, Some(5.0));
    }
}
