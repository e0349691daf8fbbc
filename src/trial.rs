//! Trial identity and the per-trial result record.
//!
//! A trial is one benchmark execution for a given database instance index,
//! run under a configuration of `(type, rate)`. Its primary results file and
//! companion log populate one [`ResultRecord`].

use serde::Deserialize;
use std::str::FromStr;

/// The two benchmark variants. Companion logs name their page counter
/// differently for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum TrialType {
    Threshold,
    Probabilistic,
}

impl TrialType {
    pub const ALL: [TrialType; 2] = [TrialType::Threshold, TrialType::Probabilistic];

    /// Token used in result file names (`t-50-3`).
    pub fn token(self) -> &'static str {
        match self {
            TrialType::Threshold => "t",
            TrialType::Probabilistic => "p",
        }
    }

    /// Numeric code printed in per-trial rows.
    pub fn code(self) -> u8 {
        match self {
            TrialType::Threshold => 0,
            TrialType::Probabilistic => 1,
        }
    }
}

impl std::fmt::Display for TrialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for TrialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "t" | "threshold" => Ok(TrialType::Threshold),
            "p" | "probabilistic" => Ok(TrialType::Probabilistic),
            other => Err(format!(
                "unknown trial type '{other}' (expected t, threshold, p or probabilistic)"
            )),
        }
    }
}

impl TryFrom<String> for TrialType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A `(type, rate)` pair. Trials are grouped and aggregated per configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Configuration {
    pub trial_type: TrialType,
    pub rate: u32,
}

/// Identifies one trial: a configuration plus the database index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrialKey {
    pub config: Configuration,
    pub db: u32,
}

impl std::fmt::Display for TrialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.config.trial_type, self.config.rate, self.db
        )
    }
}

/// Every numeric field a trial can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Avg1,
    Count1,
    Time1,
    Avg2,
    Count2,
    Time2,
    Count3,
    Time3,
    PgReq1,
    PgReqR3,
    PgReqS3,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Avg1 => "avg1",
            Field::Count1 => "count1",
            Field::Time1 => "time1",
            Field::Avg2 => "avg2",
            Field::Count2 => "count2",
            Field::Time2 => "time2",
            Field::Count3 => "count3",
            Field::Time3 => "time3",
            Field::PgReq1 => "pgreq1",
            Field::PgReqR3 => "pgreqr3",
            Field::PgReqS3 => "pgreqs3",
        }
    }
}

/// A parsed field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Float(v) => v,
            Value::Int(v) => v as f64,
        }
    }
}

/// All extracted fields for one trial. Unset fields are `None` and print as
/// the `-1` sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub key: TrialKey,
    pub avg1: Option<f64>,
    pub count1: Option<i64>,
    pub time1: Option<f64>,
    pub avg2: Option<f64>,
    pub count2: Option<i64>,
    pub time2: Option<f64>,
    pub count3: Option<i64>,
    pub time3: Option<f64>,
    pub pgreq1: Option<i64>,
    pub pgreqr3: Option<i64>,
    pub pgreqs3: Option<i64>,
}

impl ResultRecord {
    pub fn new(key: TrialKey) -> Self {
        Self {
            key,
            avg1: None,
            count1: None,
            time1: None,
            avg2: None,
            count2: None,
            time2: None,
            count3: None,
            time3: None,
            pgreq1: None,
            pgreqr3: None,
            pgreqs3: None,
        }
    }

    /// Store a value. Integer fields truncate a float, float fields widen an int.
    pub fn set(&mut self, field: Field, value: Value) {
        let int = match value {
            Value::Int(v) => v,
            Value::Float(v) => v as i64,
        };
        let float = value.as_f64();
        match field {
            Field::Avg1 => self.avg1 = Some(float),
            Field::Count1 => self.count1 = Some(int),
            Field::Time1 => self.time1 = Some(float),
            Field::Avg2 => self.avg2 = Some(float),
            Field::Count2 => self.count2 = Some(int),
            Field::Time2 => self.time2 = Some(float),
            Field::Count3 => self.count3 = Some(int),
            Field::Time3 => self.time3 = Some(float),
            Field::PgReq1 => self.pgreq1 = Some(int),
            Field::PgReqR3 => self.pgreqr3 = Some(int),
            Field::PgReqS3 => self.pgreqs3 = Some(int),
        }
    }

    pub fn get(&self, field: Field) -> Option<Value> {
        let float = |v: Option<f64>| v.map(Value::Float);
        let int = |v: Option<i64>| v.map(Value::Int);
        match field {
            Field::Avg1 => float(self.avg1),
            Field::Count1 => int(self.count1),
            Field::Time1 => float(self.time1),
            Field::Avg2 => float(self.avg2),
            Field::Count2 => int(self.count2),
            Field::Time2 => float(self.time2),
            Field::Count3 => int(self.count3),
            Field::Time3 => float(self.time3),
            Field::PgReq1 => int(self.pgreq1),
            Field::PgReqR3 => int(self.pgreqr3),
            Field::PgReqS3 => int(self.pgreqs3),
        }
    }
}
