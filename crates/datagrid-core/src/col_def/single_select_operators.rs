use super::{GridCellParams, GridFilterOperator, GridFilterPredicate, GridStateColDef};
use crate::value::CellValue;
use regex::RegexBuilder;
use std::rc::Rc;

fn option_key(value: &CellValue) -> String {
    value.to_display_string()
}

/// Operators of single-select columns: `is`, `not` and `isAnyOf`.
pub fn grid_single_select_operators() -> Vec<GridFilterOperator> {
    vec![
        GridFilterOperator::new("is", |item, _| {
            let value = item.value.as_ref().filter(|value| !value.is_empty())?;
            let expected = option_key(value);
            let predicate: GridFilterPredicate =
                Rc::new(move |params: &GridCellParams<'_>| option_key(&params.value) == expected);
            Some(predicate)
        }),
        GridFilterOperator::new("not", |item, _| {
            let value = item.value.as_ref().filter(|value| !value.is_empty())?;
            let expected = option_key(value);
            let predicate: GridFilterPredicate =
                Rc::new(move |params: &GridCellParams<'_>| option_key(&params.value) != expected);
            Some(predicate)
        }),
        GridFilterOperator::new("isAnyOf", |item, _| {
            let values = item.value.as_ref()?.as_list()?;
            if values.is_empty() {
                return None;
            }
            let keys: Vec<String> = values.iter().map(option_key).collect();
            let predicate: GridFilterPredicate = Rc::new(move |params: &GridCellParams<'_>| {
                let cell = option_key(&params.value);
                keys.iter().any(|key| *key == cell)
            });
            Some(predicate)
        }),
    ]
}

/// Quick filter of single-select columns: case-insensitive `contains` on the option value.
pub fn get_grid_single_select_quick_filter_fn(
    value: &str,
    _column: &GridStateColDef,
) -> Option<GridFilterPredicate> {
    if value.is_empty() {
        return None;
    }
    let regex = RegexBuilder::new(&regex::escape(value))
        .case_insensitive(true)
        .build()
        .ok()?;
    Some(Rc::new(move |params: &GridCellParams<'_>| {
        !params.value.is_null() && regex.is_match(&option_key(&params.value))
    }))
}
