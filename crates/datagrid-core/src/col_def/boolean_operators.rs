use super::{GridCellParams, GridFilterOperator, GridFilterPredicate};
use crate::value::CellValue;
use std::rc::Rc;

/// Operators of boolean columns: `is`.
pub fn grid_boolean_operators() -> Vec<GridFilterOperator> {
    vec![GridFilterOperator::new("is", |item, _| {
        let expected = match item.value.as_ref()? {
            CellValue::Bool(value) => *value,
            CellValue::Text(text) if text.is_empty() => return None,
            CellValue::Text(text) => text == "true",
            _ => return None,
        };
        let predicate: GridFilterPredicate =
            Rc::new(move |params: &GridCellParams<'_>| params.value.is_truthy() == expected);
        Some(predicate)
    })]
}
