// Generic tabular-text parser engine
//
// Turns whitespace-aligned command output (netstat, df, last, top) into
// TableRow records. Parsing never fails: short lines degrade field-by-field
// to empty strings, overflow tokens merge into the final field.

use super::result::TableRow;

/// Ordered field names describing one probe's expected columns.
///
/// The last name absorbs all remaining whitespace-delimited tokens on a row,
/// which keeps command lines and timestamps with embedded spaces intact.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSchema {
    columns: &'static [&'static str],
}

impl ColumnSchema {
    pub const fn new(columns: &'static [&'static str]) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Zip one tokenized line against the schema positionally.
    pub fn apply(&self, line: &str) -> TableRow {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut row = TableRow::new();
        let last = self.columns.len().saturating_sub(1);

        for (idx, name) in self.columns.iter().enumerate() {
            let value = if idx == last && tokens.len() > self.columns.len() {
                tokens[idx..].join(" ")
            } else {
                tokens.get(idx).copied().unwrap_or("").to_string()
            };
            row.push(*name, value);
        }
        row
    }
}

/// How many leading lines of raw output are titles/headers.
#[derive(Debug, Clone, Copy)]
pub enum HeaderSkip {
    /// Drop a fixed number of leading lines.
    Lines(usize),
    /// Drop everything up to and including the first blank line, plus
    /// `extra` more lines (e.g. the column-header line of `top`).
    PastBlank { extra: usize },
}

/// Fixed per-probe parsing configuration.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub schema: ColumnSchema,
    pub skip: HeaderSkip,
    /// Stop at the first blank data line instead of skipping it. Used for
    /// `last`, whose footer is separated from the records by a blank line.
    pub stop_at_blank: bool,
}

impl TableSpec {
    pub fn parse(&self, text: &str) -> Vec<TableRow> {
        let lines: Vec<&str> = text.lines().collect();

        let start = match self.skip {
            HeaderSkip::Lines(n) => n,
            HeaderSkip::PastBlank { extra } => lines
                .iter()
                .position(|l| l.trim().is_empty())
                .map(|p| p + 1 + extra)
                .unwrap_or(0),
        };

        let mut rows = Vec::new();
        for line in lines.iter().skip(start) {
            if line.trim().is_empty() {
                if self.stop_at_blank {
                    break;
                }
                continue;
            }
            rows.push(self.schema.apply(line));
        }
        rows
    }
}
