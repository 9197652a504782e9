use super::{GridCellParams, GridFilterOperator, GridFilterPredicate};
use crate::features::filter::GridFilterItem;
use crate::value::CellValue;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::rc::Rc;

/// Parse a filter input: `YYYY-MM-DD`, or `YYYY-MM-DDTHH:MM` when `show_time` is set.
pub fn parse_filter_date(text: &str, show_time: bool) -> Option<NaiveDateTime> {
    let text = text.trim();
    if show_time {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
            return Some(date_time);
        }
        if let Ok(date_time) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
            return truncate(date_time, true);
        }
    }
    // A date-only input still filters a date-time column, from midnight.
    let date_part = text.split('T').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn cell_date(value: &CellValue) -> Option<NaiveDateTime> {
    match value {
        CellValue::Date(date) => Some(*date),
        CellValue::Text(text) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M").ok())
            .or_else(|| parse_filter_date(text, false)),
        _ => None,
    }
}

/// Drop seconds, or the whole time of day when `show_time` is unset.
fn truncate(date: NaiveDateTime, show_time: bool) -> Option<NaiveDateTime> {
    if show_time {
        date.with_second(0)?.with_nanosecond(0)
    } else {
        date.date().and_hms_opt(0, 0, 0)
    }
}

fn date_operator(
    value: &str,
    show_time: bool,
    keep_hours: bool,
    compare: fn(NaiveDateTime, NaiveDateTime) -> bool,
) -> GridFilterOperator {
    GridFilterOperator::new(value, move |item: &GridFilterItem, _| {
        let filter_value = match item.value.as_ref()? {
            CellValue::Date(date) => truncate(*date, show_time)?,
            CellValue::Text(text) => parse_filter_date(text, show_time)?,
            _ => return None,
        };
        let predicate: GridFilterPredicate = Rc::new(move |params: &GridCellParams<'_>| {
            let Some(cell) = cell_date(&params.value) else {
                return false;
            };
            let cell = if keep_hours {
                Some(cell)
            } else {
                truncate(cell, show_time)
            };
            cell.is_some_and(|cell| compare(cell, filter_value))
        });
        Some(predicate)
    })
}

/// Operators of date (`show_time == false`) and date-time columns.
pub fn grid_date_operators(show_time: bool) -> Vec<GridFilterOperator> {
    vec![
        date_operator("is", show_time, false, |cell, value| cell == value),
        date_operator("not", show_time, false, |cell, value| cell != value),
        date_operator("after", show_time, false, |cell, value| cell > value),
        date_operator("onOrAfter", show_time, false, |cell, value| cell >= value),
        date_operator("before", show_time, !show_time, |cell, value| cell < value),
        date_operator("onOrBefore", show_time, false, |cell, value| cell <= value),
        GridFilterOperator::new("isEmpty", |_, _| {
            let predicate: GridFilterPredicate =
                Rc::new(|params: &GridCellParams<'_>| params.value.is_null());
            Some(predicate)
        })
        .without_value(),
        GridFilterOperator::new("isNotEmpty", |_, _| {
            let predicate: GridFilterPredicate =
                Rc::new(|params: &GridCellParams<'_>| !params.value.is_null());
            Some(predicate)
        })
        .without_value(),
    ]
}
