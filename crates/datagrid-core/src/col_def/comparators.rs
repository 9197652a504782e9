use crate::value::{CellValue, locale_compare};
use std::cmp::Ordering;

/// Nulls sort before every defined value; two nulls are equal.
fn compare_nil(a: &CellValue, b: &CellValue) -> Option<Ordering> {
    match (a.is_null(), b.is_null()) {
        (true, true) => Some(Ordering::Equal),
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        (false, false) => None,
    }
}

fn compare_numbers(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Default comparator of string columns: text is collated, anything else compares numerically.
pub fn grid_string_or_number_comparator(a: &CellValue, b: &CellValue) -> Ordering {
    if let Some(ordering) = compare_nil(a, b) {
        return ordering;
    }
    match (a, b) {
        (CellValue::Text(a), CellValue::Text(b)) => locale_compare(a, b),
        _ => match (a.as_number(), b.as_number()) {
            (Some(a), Some(b)) => compare_numbers(a, b),
            _ => locale_compare(&a.to_display_string(), &b.to_display_string()),
        },
    }
}

/// Default comparator of number columns.
pub fn grid_number_comparator(a: &CellValue, b: &CellValue) -> Ordering {
    if let Some(ordering) = compare_nil(a, b) {
        return ordering;
    }
    compare_numbers(
        a.as_number().unwrap_or(f64::NAN),
        b.as_number().unwrap_or(f64::NAN),
    )
}

/// Default comparator of date columns.
pub fn grid_date_comparator(a: &CellValue, b: &CellValue) -> Ordering {
    if let Some(ordering) = compare_nil(a, b) {
        return ordering;
    }
    match (a, b) {
        (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
        _ => grid_string_or_number_comparator(a, b),
    }
}

/// Default comparator of boolean columns: `false` before `true`.
pub fn grid_boolean_comparator(a: &CellValue, b: &CellValue) -> Ordering {
    if let Some(ordering) = compare_nil(a, b) {
        return ordering;
    }
    a.is_truthy().cmp(&b.is_truthy())
}
