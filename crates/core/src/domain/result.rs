// Probe result shapes shared by every platform strategy

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// One parsed record keyed by schema field names, in schema order.
///
/// Field order is part of the output contract, so this is a small ordered
/// pair list rather than a map type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    fields: Vec<(String, String)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Duplicate names are not expected from schemas and
    /// are not deduplicated.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl Serialize for TableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Normalized probe output: a scalar, a key/value record, or an ordered
/// sequence of table rows. The shape is identical across platform
/// strategies for a given probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Record(Vec<(String, ProbeResult)>),
    Table(Vec<TableRow>),
}

impl ProbeResult {
    pub fn text(value: impl Into<String>) -> Self {
        ProbeResult::Text(value.into())
    }

    pub fn record(fields: Vec<(&str, ProbeResult)>) -> Self {
        ProbeResult::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    pub fn as_table(&self) -> Option<&[TableRow]> {
        match self {
            ProbeResult::Table(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ProbeResult::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for ProbeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProbeResult::Bool(b) => serializer.serialize_bool(*b),
            ProbeResult::Int(n) => serializer.serialize_i64(*n),
            ProbeResult::Float(f) => serializer.serialize_f64(*f),
            ProbeResult::Text(s) => serializer.serialize_str(s),
            ProbeResult::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            ProbeResult::Table(rows) => rows.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_field_order() {
        let result = ProbeResult::record(vec![
            ("1m", ProbeResult::text("0.50")),
            ("5m", ProbeResult::text("0.25")),
            ("15m", ProbeResult::text("0.10")),
        ]);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"1m":"0.50","5m":"0.25","15m":"0.10"}"#);
    }

    #[test]
    fn test_row_serializes_as_object() {
        let mut row = TableRow::new();
        row.push("proto", "tcp");
        row.push("state", "LISTEN");
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"proto":"tcp","state":"LISTEN"}"#);
    }

    #[test]
    fn test_row_get() {
        let mut row = TableRow::new();
        row.push("user", "root");
        assert_eq!(row.get("user"), Some("root"));
        assert_eq!(row.get("missing"), None);
    }
}
