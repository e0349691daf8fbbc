//! CSV/TSV output.
//!
//! Per-trial rows are comma-separated and start with `type,rate,db#` (type
//! as its numeric code). Summary rows are tab-separated and start with the
//! type token and rate. Each writer emits its header once, before the first
//! row, built from the same column list as the rows.

use crate::aggregate::{Query, SummaryRow};
use crate::trial::{ResultRecord, Value};
use std::io::Write;

/// Printed for a field that was never populated.
pub const UNSET: &str = "-1";

/// Shortest round-trip form, with `.0` kept on integral values (`37.0`).
pub fn format_float(v: f64) -> String {
    format!("{v:?}")
}

fn format_value(v: Option<Value>) -> String {
    match v {
        Some(Value::Float(f)) => format_float(f),
        Some(Value::Int(i)) => i.to_string(),
        None => UNSET.to_string(),
    }
}

pub fn trial_header(query: Query) -> Vec<&'static str> {
    let mut cols = vec!["type", "rate", "db#"];
    cols.extend(query.trial_columns().iter().map(|c| c.header));
    cols
}

pub fn trial_row(record: &ResultRecord, query: Query) -> Vec<String> {
    let key = &record.key;
    let mut cols = vec![
        key.config.trial_type.code().to_string(),
        key.config.rate.to_string(),
        key.db.to_string(),
    ];
    cols.extend(
        query
            .trial_columns()
            .iter()
            .map(|c| format_value(record.get(c.field))),
    );
    cols
}

pub fn summary_header(query: Query) -> Vec<&'static str> {
    let mut cols = vec!["type", "rate"];
    cols.extend(query.summary_columns().iter().map(|c| c.header));
    cols
}

pub fn summary_row(row: &SummaryRow) -> Vec<String> {
    let mut cols = vec![
        row.config.trial_type.token().to_string(),
        row.config.rate.to_string(),
    ];
    cols.extend(row.values.iter().map(|&v| format_float(v)));
    cols
}

/// Which kind of rows a [`Reporter`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Trial,
    Summary,
}

impl RowKind {
    fn delimiter(self) -> u8 {
        match self {
            RowKind::Trial => b',',
            RowKind::Summary => b'\t',
        }
    }
}

/// Writes a header record before the first row it emits.
pub struct Reporter<W: Write> {
    out: csv::Writer<W>,
    query: Query,
    kind: RowKind,
    header_written: bool,
    rows: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, query: Query, kind: RowKind) -> Self {
        let out = csv::WriterBuilder::new()
            .delimiter(kind.delimiter())
            .from_writer(out);
        Self {
            out,
            query,
            kind,
            header_written: false,
            rows: 0,
        }
    }

    fn ensure_header(&mut self) -> csv::Result<()> {
        if !self.header_written {
            let header = match self.kind {
                RowKind::Trial => trial_header(self.query),
                RowKind::Summary => summary_header(self.query),
            };
            self.out.write_record(&header)?;
            self.header_written = true;
        }
        Ok(())
    }

    pub fn write_trial(&mut self, record: &ResultRecord) -> csv::Result<()> {
        debug_assert_eq!(self.kind, RowKind::Trial);
        self.ensure_header()?;
        self.out.write_record(trial_row(record, self.query))?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_summary(&mut self, row: &SummaryRow) -> csv::Result<()> {
        debug_assert_eq!(self.kind, RowKind::Summary);
        self.ensure_header()?;
        self.out.write_record(summary_row(row))?;
        self.rows += 1;
        Ok(())
    }

    /// Write the header if no row has been written, then flush.
    pub fn finish(mut self) -> csv::Result<usize> {
        self.ensure_header()?;
        self.out.flush()?;
        Ok(self.rows)
    }
}
