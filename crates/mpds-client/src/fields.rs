//! Field extraction from MPDS entries.
//!
//! MPDS returns three kinds of entries, distinguished by `object_type`:
//! crystalline structures (S), physical properties (P) and phase
//! diagrams (C). A [`Fields`] selection maps each kind to a list of
//! [`FieldExpr`]s; every entry is turned into one row with a value per
//! expression. Paths use dotted keys with bracketed list indexes, e.g.
//! `sample.measurement[0].property.scalar`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Kind of an MPDS entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    /// Crystalline structure.
    S,
    /// Physical property.
    P,
    /// Phase diagram.
    C,
}

impl EntryKind {
    pub const ALL: [Self; 3] = [Self::S, Self::P, Self::C];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::P => "P",
            Self::C => "C",
        }
    }

    /// Kind of a raw entry, taken from its `object_type`.
    pub fn of(entry: &Value) -> ApiResult<Self> {
        let object_type = entry.get("object_type").and_then(Value::as_str).unwrap_or("");
        object_type.parse()
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = ApiError;

    fn from_str(s: &str) -> ApiResult<Self> {
        match s {
            "S" => Ok(Self::S),
            "P" => Ok(Self::P),
            "C" => Ok(Self::C),
            other => Err(ApiError::UnknownEntryType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed path into a JSON entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    source: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(expr: &str) -> ApiResult<Self> {
        let invalid = |reason: &str| ApiError::InvalidField {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        for part in expr.split('.') {
            let (key, mut rest) = part.find('[').map_or((part, ""), |i| part.split_at(i));
            if key.is_empty() && rest.is_empty() {
                return Err(invalid("empty path component"));
            }
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }
            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(invalid("unexpected text after index"));
                };
                let Some(close) = inner.find(']') else {
                    return Err(invalid("unclosed bracket"));
                };
                let index = inner[..close]
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| invalid("index is not a non-negative integer"))?;
                segments.push(Segment::Index(index));
                rest = &inner[close + 1..];
            }
        }

        Ok(Self {
            source: expr.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Resolve the path in `entry`; missing keys and indexes give null.
    pub fn search(&self, entry: &Value) -> Value {
        let mut current = entry;
        for segment in &self.segments {
            let next = match segment {
                Segment::Key(key) => current.get(key.as_str()),
                Segment::Index(index) => current.get(*index),
            };
            match next {
                Some(value) => current = value,
                None => return Value::Null,
            }
        }
        current.clone()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// One column of an extracted row.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldExpr {
    /// A value looked up in the entry.
    Path(FieldPath),
    /// A value that ignores the entry.
    Const(Value),
}

impl FieldExpr {
    pub fn path(expr: &str) -> ApiResult<Self> {
        FieldPath::parse(expr).map(Self::Path)
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Const(value.into())
    }

    pub fn evaluate(&self, entry: &Value) -> Value {
        match self {
            Self::Path(path) => path.search(entry),
            Self::Const(value) => value.clone(),
        }
    }
}

/// Parses a path, or a constant when prefixed with `=`.
///
/// Constants are read as JSON when possible, so `=null` and `=1.5` give a
/// null and a number, while `=phase diagram` gives a string.
impl FromStr for FieldExpr {
    type Err = ApiError;

    fn from_str(s: &str) -> ApiResult<Self> {
        match s.strip_prefix('=') {
            Some(literal) => Ok(Self::Const(
                serde_json::from_str(literal).unwrap_or_else(|_| Value::String(literal.to_string())),
            )),
            None => Self::path(s),
        }
    }
}

/// Per-kind column selection.
///
/// Entries of a kind absent from the selection produce empty rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    by_kind: BTreeMap<EntryKind, Vec<FieldExpr>>,
}

/// Column names of [`Fields::default_set`].
pub const DEFAULT_COLUMNS: [&str; 7] = ["Phase", "Formula", "SG", "Entry", "Property", "Units", "Value"];

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, kind: EntryKind, exprs: Vec<FieldExpr>) -> Self {
        self.by_kind.insert(kind, exprs);
        self
    }

    pub fn with_paths(self, kind: EntryKind, paths: &[&str]) -> ApiResult<Self> {
        let exprs = paths
            .iter()
            .map(|p| FieldExpr::path(p))
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(self.with(kind, exprs))
    }

    pub fn get(&self, kind: EntryKind) -> Option<&[FieldExpr]> {
        self.by_kind.get(&kind).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    /// Seven columns per kind, aligned with [`DEFAULT_COLUMNS`].
    pub fn default_set() -> ApiResult<Self> {
        let p = |s: &str| FieldExpr::path(s);
        Ok(Self::new()
            .with(
                EntryKind::S,
                vec![
                    p("phase_id")?,
                    p("chemical_formula")?,
                    p("sg_n")?,
                    p("entry")?,
                    FieldExpr::constant("crystal structure"),
                    FieldExpr::constant("angstrom"),
                    p("cell_abc")?,
                ],
            )
            .with(
                EntryKind::P,
                vec![
                    p("sample.material.phase_id")?,
                    p("sample.material.chemical_formula")?,
                    p("sample.material.condition[0].scalar[0].value")?,
                    p("sample.material.entry")?,
                    p("sample.measurement[0].property.name")?,
                    p("sample.measurement[0].property.units")?,
                    p("sample.measurement[0].property.scalar")?,
                ],
            )
            .with(
                EntryKind::C,
                vec![
                    FieldExpr::Const(Value::Null),
                    p("title")?,
                    FieldExpr::Const(Value::Null),
                    p("entry")?,
                    FieldExpr::constant("phase diagram"),
                    p("naxes")?,
                    p("arity")?,
                ],
            ))
    }

    /// Turn one raw entry into a row.
    pub fn extract(&self, entry: &Value) -> ApiResult<Vec<Value>> {
        let kind = EntryKind::of(entry)?;
        Ok(self
            .get(kind)
            .map(|exprs| exprs.iter().map(|e| e.evaluate(entry)).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property_entry() -> Value {
        json!({
            "object_type": "P",
            "sample": {
                "material": {
                    "phase_id": 1234,
                    "chemical_formula": "MgO",
                    "entry": "P600001",
                    "condition": [{"scalar": [{"value": 225}]}]
                },
                "measurement": [{
                    "property": {"name": "band gap", "units": "eV", "scalar": 7.8}
                }]
            }
        })
    }

    #[test]
    fn test_parse_path_segments() {
        let path = FieldPath::parse("sample.measurement[0].property.scalar").unwrap();
        assert_eq!(
            path.segments,
            vec![
                Segment::Key("sample".into()),
                Segment::Key("measurement".into()),
                Segment::Index(0),
                Segment::Key("property".into()),
                Segment::Key("scalar".into()),
            ]
        );
        assert_eq!(path.to_string(), "sample.measurement[0].property.scalar");
    }

    #[test]
    fn test_parse_nested_indexes() {
        let path = FieldPath::parse("cell_abc[1][0]").unwrap();
        assert_eq!(path.segments.len(), 3);
        assert_eq!(path.search(&json!({"cell_abc": [[1], [2, 3]]})), json!(2));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "a..b", "a[", "a[x]", "a[-1]", "a[0]b"] {
            assert!(FieldPath::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_search_missing_is_null() {
        let path = FieldPath::parse("sample.measurement[3].property").unwrap();
        assert_eq!(path.search(&property_entry()), Value::Null);
        let path = FieldPath::parse("nothing.here").unwrap();
        assert_eq!(path.search(&property_entry()), Value::Null);
    }

    #[test]
    fn test_field_expr_from_str() {
        assert_eq!("=null".parse::<FieldExpr>().unwrap(), FieldExpr::Const(Value::Null));
        assert_eq!("=1.5".parse::<FieldExpr>().unwrap(), FieldExpr::Const(json!(1.5)));
        assert_eq!(
            "=phase diagram".parse::<FieldExpr>().unwrap(),
            FieldExpr::Const(json!("phase diagram"))
        );
        assert!(matches!("title".parse::<FieldExpr>().unwrap(), FieldExpr::Path(_)));
    }

    #[test]
    fn test_default_set_property_row() {
        let fields = Fields::default_set().unwrap();
        let row = fields.extract(&property_entry()).unwrap();
        assert_eq!(
            row,
            vec![
                json!(1234),
                json!("MgO"),
                json!(225),
                json!("P600001"),
                json!("band gap"),
                json!("eV"),
                json!(7.8)
            ]
        );
    }

    #[test]
    fn test_default_set_has_seven_columns_per_kind() {
        let fields = Fields::default_set().unwrap();
        for kind in EntryKind::ALL {
            assert_eq!(fields.get(kind).unwrap().len(), DEFAULT_COLUMNS.len());
        }
    }

    #[test]
    fn test_default_set_phase_diagram_row() {
        let fields = Fields::default_set().unwrap();
        let entry = json!({"object_type": "C", "title": "Cu-Zn", "entry": "C100001", "naxes": 2, "arity": 2});
        let row = fields.extract(&entry).unwrap();
        assert_eq!(row[0], Value::Null);
        assert_eq!(row[1], json!("Cu-Zn"));
        assert_eq!(row[4], json!("phase diagram"));
    }

    #[test]
    fn test_kind_not_selected_gives_empty_row() {
        let fields = Fields::new().with_paths(EntryKind::S, &["phase_id"]).unwrap();
        assert!(fields.extract(&property_entry()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_kind_is_error() {
        let fields = Fields::default_set().unwrap();
        let err = fields.extract(&json!({"object_type": "X"})).unwrap_err();
        assert!(matches!(err, ApiError::UnknownEntryType(t) if t == "X"));
        assert!(fields.extract(&json!({})).is_err());
    }
}
