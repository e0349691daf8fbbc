//! Per-configuration summaries.
//!
//! Query 1 covers the single-scan phase (time1, pgreq1, count1, avg1);
//! query 3 covers the R/S phase (time3, pgreqr3, pgreqs3, count3). Times
//! summarize as the median over a configuration's trials, everything else as
//! the mean.

use crate::error::PipelineError;
use crate::stats;
use crate::trial::{Configuration, Field, ResultRecord};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    One,
    Three,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Median,
    Mean,
}

/// A named output column fed by one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    pub field: Field,
}

/// A summary column: a field reduced by a statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryColumn {
    pub header: &'static str,
    pub field: Field,
    pub statistic: Statistic,
}

const QUERY1_TRIAL: &[Column] = &[
    Column {
        header: "time",
        field: Field::Time1,
    },
    Column {
        header: "#page requests",
        field: Field::PgReq1,
    },
    Column {
        header: "tuple count",
        field: Field::Count1,
    },
    Column {
        header: "avg",
        field: Field::Avg1,
    },
];

const QUERY3_TRIAL: &[Column] = &[
    Column {
        header: "time",
        field: Field::Time3,
    },
    Column {
        header: "#page requests R",
        field: Field::PgReqR3,
    },
    Column {
        header: "#page requests S",
        field: Field::PgReqS3,
    },
    Column {
        header: "tuple count",
        field: Field::Count3,
    },
];

const QUERY1_SUMMARY: &[SummaryColumn] = &[
    SummaryColumn {
        header: "time",
        field: Field::Time1,
        statistic: Statistic::Median,
    },
    SummaryColumn {
        header: "#page requests",
        field: Field::PgReq1,
        statistic: Statistic::Mean,
    },
    SummaryColumn {
        header: "tuple count",
        field: Field::Count1,
        statistic: Statistic::Mean,
    },
    SummaryColumn {
        header: "avg",
        field: Field::Avg1,
        statistic: Statistic::Mean,
    },
];

const QUERY3_SUMMARY: &[SummaryColumn] = &[
    SummaryColumn {
        header: "time",
        field: Field::Time3,
        statistic: Statistic::Median,
    },
    SummaryColumn {
        header: "#page requests R",
        field: Field::PgReqR3,
        statistic: Statistic::Mean,
    },
    SummaryColumn {
        header: "#page requests S",
        field: Field::PgReqS3,
        statistic: Statistic::Mean,
    },
    SummaryColumn {
        header: "tuple count",
        field: Field::Count3,
        statistic: Statistic::Mean,
    },
];

impl Query {
    /// Value columns of a per-trial row, after `type,rate,db#`.
    pub fn trial_columns(self) -> &'static [Column] {
        match self {
            Query::One => QUERY1_TRIAL,
            Query::Three => QUERY3_TRIAL,
        }
    }

    /// Value columns of a summary row, after `type,rate`.
    pub fn summary_columns(self) -> &'static [SummaryColumn] {
        match self {
            Query::One => QUERY1_SUMMARY,
            Query::Three => QUERY3_SUMMARY,
        }
    }

    /// Fields every trial must provide for this query.
    pub fn required_fields(self) -> Vec<Field> {
        self.trial_columns().iter().map(|c| c.field).collect()
    }
}

impl FromStr for Query {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Query::One),
            "3" => Ok(Query::Three),
            other => Err(format!("unsupported query '{other}' (expected 1 or 3)")),
        }
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::One => f.write_str("1"),
            Query::Three => f.write_str("3"),
        }
    }
}

/// The trials of one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialGroup {
    pub config: Configuration,
    pub records: Vec<ResultRecord>,
}

/// One aggregated row: a configuration and one value per summary column.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub config: Configuration,
    pub values: Vec<f64>,
}

/// Split records into per-configuration groups, keeping the order in which
/// each configuration first appears.
pub fn group_records(records: Vec<ResultRecord>) -> Vec<TrialGroup> {
    let mut groups: Vec<TrialGroup> = Vec::new();
    for record in records {
        let config = record.key.config;
        match groups.iter_mut().find(|g| g.config == config) {
            Some(g) => g.records.push(record),
            None => groups.push(TrialGroup {
                config,
                records: vec![record],
            }),
        }
    }
    groups
}

/// Reduce one group to its summary row.
pub fn summarize(group: &TrialGroup, query: Query) -> Result<SummaryRow, PipelineError> {
    if group.records.is_empty() {
        return Err(PipelineError::EmptyGroup {
            trial_type: group.config.trial_type,
            rate: group.config.rate,
        });
    }

    let mut values = Vec::with_capacity(query.summary_columns().len());
    for col in query.summary_columns() {
        let column = field_values(&group.records, col.field)?;
        let v = match col.statistic {
            Statistic::Median => stats::median(&column),
            Statistic::Mean => stats::mean(&column),
        };
        // Non-empty column, so a statistic always exists.
        values.push(v.unwrap_or(f64::NAN));
    }

    tracing::debug!(
        trial_type = %group.config.trial_type,
        rate = group.config.rate,
        trials = group.records.len(),
        "summarized configuration"
    );
    Ok(SummaryRow {
        config: group.config,
        values,
    })
}

/// One summary row per group, in group order.
pub fn aggregate(groups: &[TrialGroup], query: Query) -> Result<Vec<SummaryRow>, PipelineError> {
    groups.iter().map(|g| summarize(g, query)).collect()
}

fn field_values(records: &[ResultRecord], field: Field) -> Result<Vec<f64>, PipelineError> {
    records
        .iter()
        .map(|r| {
            r.get(field)
                .map(|v| v.as_f64())
                .ok_or_else(|| PipelineError::Unset {
                    trial: r.key.to_string(),
                    field: field.name(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::{TrialKey, TrialType, Value};

    fn config(trial_type: TrialType, rate: u32) -> Configuration {
        Configuration { trial_type, rate }
    }

    fn record(config: Configuration, db: u32, time1: f64) -> ResultRecord {
        let mut r = ResultRecord::new(TrialKey { config, db });
        r.set(Field::Time1, Value::Float(time1));
        r.set(Field::PgReq1, Value::Int(40));
        r.set(Field::Count1, Value::Int(37));
        r.set(Field::Avg1, Value::Float(12.5));
        r
    }

    fn full_record(config: Configuration, db: u32) -> ResultRecord {
        let mut r = ResultRecord::new(TrialKey { config, db });
        for f in [
            Field::Avg1,
            Field::Count1,
            Field::Time1,
            Field::Avg2,
            Field::Count2,
            Field::Time2,
            Field::Count3,
            Field::Time3,
            Field::PgReq1,
            Field::PgReqR3,
            Field::PgReqS3,
        ] {
            r.set(f, Value::Int(7));
        }
        r
    }

    #[test]
    fn query_parses_one_and_three() {
        assert_eq!("1".parse::<Query>().unwrap(), Query::One);
        assert_eq!("3".parse::<Query>().unwrap(), Query::Three);
        assert!("2".parse::<Query>().is_err());
    }

    #[test]
    fn required_fields_follow_trial_columns() {
        assert_eq!(
            Query::Three.required_fields(),
            vec![Field::Time3, Field::PgReqR3, Field::PgReqS3, Field::Count3]
        );
    }

    #[test]
    fn query1_summary_uses_median_time_and_means() {
        let c = config(TrialType::Threshold, 50);
        let times = [
            100.0, 105.0, 110.0, 95.0, 120.0, 90.0, 115.0, 102.0, 98.0, 108.0,
        ];
        let records: Vec<_> = times
            .iter()
            .enumerate()
            .map(|(db, &t)| record(c, db as u32, t))
            .collect();
        let group = TrialGroup { config: c, records };
        let row = summarize(&group, Query::One).unwrap();
        assert_eq!(row.config, c);
        assert_eq!(row.values, vec![103.5, 40.0, 37.0, 12.5]);
    }

    #[test]
    fn identical_records_summarize_to_their_value() {
        for query in [Query::One, Query::Three] {
            let c = config(TrialType::Probabilistic, 20);
            let group = TrialGroup {
                config: c,
                records: (0..10).map(|db| full_record(c, db)).collect(),
            };
            let row = summarize(&group, query).unwrap();
            assert!(row.values.iter().all(|&v| v == 7.0), "{row:?}");
        }
    }

    #[test]
    fn group_size_is_not_fixed() {
        let c = config(TrialType::Threshold, 10);
        let group = TrialGroup {
            config: c,
            records: vec![record(c, 0, 4.0), record(c, 1, 8.0), record(c, 2, 5.0)],
        };
        let row = summarize(&group, Query::One).unwrap();
        assert_eq!(row.values[0], 5.0);
    }

    #[test]
    fn one_row_per_distinct_configuration() {
        let a = config(TrialType::Threshold, 10);
        let b = config(TrialType::Threshold, 20);
        let p = config(TrialType::Probabilistic, 10);
        let records = vec![
            record(a, 0, 1.0),
            record(a, 1, 1.0),
            record(b, 0, 1.0),
            record(p, 0, 1.0),
            record(p, 1, 1.0),
            record(p, 2, 1.0),
        ];
        let groups = group_records(records);
        assert_eq!(groups.len(), 3);
        let rows = aggregate(&groups, Query::One).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows.iter().map(|r| r.config).collect::<Vec<_>>(),
            vec![a, b, p]
        );
    }

    #[test]
    fn unset_field_is_an_error() {
        let c = config(TrialType::Threshold, 10);
        let group = TrialGroup {
            config: c,
            records: vec![record(c, 4, 1.0)],
        };
        let err = summarize(&group, Query::Three).unwrap_err();
        assert!(err.to_string().contains("t-10-4"));
        assert!(err.to_string().contains("time3"));
    }

    #[test]
    fn empty_group_is_an_error() {
        let group = TrialGroup {
            config: config(TrialType::Threshold, 10),
            records: Vec::new(),
        };
        assert!(matches!(
            summarize(&group, Query::One),
            Err(PipelineError::EmptyGroup { rate: 10, .. })
        ));
    }
}
