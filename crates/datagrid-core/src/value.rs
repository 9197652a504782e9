//! Cell values, row identifiers and row models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// A single cell value.
///
/// Serialized untagged, so JSON `null`, booleans, numbers, strings and arrays map directly onto
/// the corresponding variants. Dates are produced by value getters or parsers, never by JSON
/// deserialization (a date string deserializes as [`CellValue::Text`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
    /// Date and time value.
    Date(NaiveDateTime),
    /// List of values (used by `isAnyOf` filter values).
    List(Vec<CellValue>),
}

impl CellValue {
    /// Returns true for [`CellValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns true for null or empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// JavaScript-like truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(value) => *value,
            CellValue::Number(value) => *value != 0.0 && !value.is_nan(),
            CellValue::Text(text) => !text.is_empty(),
            CellValue::Date(_) | CellValue::List(_) => true,
        }
    }

    /// Numeric conversion. Text is parsed, booleans map to 0/1, everything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) if !value.is_nan() => Some(*value),
            CellValue::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            CellValue::Text(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Borrow the text of a [`CellValue::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the items of a [`CellValue::List`].
    pub fn as_list(&self) -> Option<&[CellValue]> {
        match self {
            CellValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// String form used by the text operators and the quick filter.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(value) => write!(f, "{}", value),
            CellValue::Number(value) => write!(f, "{}", format_number(*value)),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%dT%H:%M:%S")),
            CellValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Date(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

impl<T: Into<CellValue>> From<Vec<T>> for CellValue {
    fn from(values: Vec<T>) -> Self {
        CellValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Identifier of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridRowId {
    /// Numeric id.
    Number(i64),
    /// Textual id.
    Text(String),
}

impl GridRowId {
    /// Derive a row id from a cell value. Only integral numbers and text qualify.
    pub fn from_value(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                Some(GridRowId::Number(*n as i64))
            }
            CellValue::Text(text) => Some(GridRowId::Text(text.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for GridRowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridRowId::Number(n) => write!(f, "{}", n),
            GridRowId::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for GridRowId {
    fn from(value: i64) -> Self {
        GridRowId::Number(value)
    }
}

impl From<i32> for GridRowId {
    fn from(value: i32) -> Self {
        GridRowId::Number(value as i64)
    }
}

impl From<&str> for GridRowId {
    fn from(value: &str) -> Self {
        GridRowId::Text(value.to_string())
    }
}

impl From<String> for GridRowId {
    fn from(value: String) -> Self {
        GridRowId::Text(value)
    }
}

/// A row: field name to cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridRowModel(BTreeMap<String, CellValue>);

impl GridRowModel {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Read a field. Missing fields read as `None`.
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.0.get(field)
    }

    /// Write a field.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<CellValue>) {
        self.0.insert(field.into(), value.into());
    }

    /// Remove a field.
    pub fn remove(&mut self, field: &str) -> Option<CellValue> {
        self.0.remove(field)
    }

    /// Iterate over `(field, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CellValue)> {
        self.0.iter()
    }

    /// Shallow merge: every field of `other` overwrites the one in `self`.
    pub fn merged_with(&self, other: &GridRowModel) -> GridRowModel {
        let mut merged = self.clone();
        for (field, value) in other.iter() {
            merged.0.insert(field.clone(), value.clone());
        }
        merged
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for GridRowModel {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Primary collation key: canonical decomposition without combining marks, lowercased.
fn base_form(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Collation used for text comparisons.
///
/// Strings are ordered on their base letters first, ignoring case and accents. Ties are broken
/// by accents (unaccented first), then by case (lowercase first).
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let primary = base_form(a).cmp(&base_form(b));
    if primary != Ordering::Equal {
        return primary;
    }
    let secondary = a
        .nfd()
        .flat_map(char::to_lowercase)
        .cmp(b.nfd().flat_map(char::to_lowercase));
    if secondary != Ordering::Equal {
        return secondary;
    }
    // Reversed byte order puts lowercase letters first.
    b.cmp(a)
}

/// Base-sensitivity equality: case and accent differences are ignored.
pub fn locale_equals(a: &str, b: &str) -> bool {
    base_form(a) == base_form(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_compare_orders_case_insensitively() {
        assert_eq!(locale_compare("adidas", "Nike"), Ordering::Less);
        assert_eq!(locale_compare("Puma", "nike"), Ordering::Greater);
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("abc", "abc"), Ordering::Equal);
    }

    #[test]
    fn test_locale_collation_ignores_accents() {
        assert!(locale_equals("Résumé", "resume"));
        assert!(locale_equals("ÉCOLE", "école"));
        assert!(!locale_equals("resume", "resumes"));

        assert_eq!(locale_compare("éclair", "zebra"), Ordering::Less);
        assert_eq!(locale_compare("Ångström", "azure"), Ordering::Less);
        // Same base letters: the unaccented string comes first.
        assert_eq!(locale_compare("resume", "résumé"), Ordering::Less);
        assert_eq!(locale_compare("résumé", "Résumé"), Ordering::Less);
    }

    #[test]
    fn test_cell_value_display_matches_number_formatting() {
        assert_eq!(CellValue::Number(3.0).to_display_string(), "3");
        assert_eq!(CellValue::Number(2.5).to_display_string(), "2.5");
        assert_eq!(CellValue::Null.to_display_string(), "");
        assert_eq!(CellValue::from(vec!["a", "b"]).to_display_string(), "a,b");
    }

    #[test]
    fn test_row_model_deserializes_from_json() {
        let row: GridRowModel =
            serde_json::from_str(r#"{"id": 1, "brand": "Nike", "price": null}"#).unwrap();
        assert_eq!(row.get("id"), Some(&CellValue::Number(1.0)));
        assert_eq!(row.get("brand"), Some(&CellValue::from("Nike")));
        assert_eq!(row.get("price"), Some(&CellValue::Null));
        assert_eq!(
            GridRowId::from_value(row.get("id").unwrap()),
            Some(GridRowId::Number(1))
        );
    }
}
