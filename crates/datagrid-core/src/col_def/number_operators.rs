use super::{GridCellParams, GridFilterOperator, GridFilterPredicate, GridStateColDef};
use crate::features::filter::GridFilterItem;
use crate::value::CellValue;
use std::rc::Rc;

fn filter_number(item: &GridFilterItem) -> Option<f64> {
    match item.value.as_ref()? {
        CellValue::Number(value) if !value.is_nan() => Some(*value),
        CellValue::Text(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn comparison_operator(value: &str, compare: fn(f64, f64) -> bool) -> GridFilterOperator {
    GridFilterOperator::new(value, move |item, _| {
        let filter_value = filter_number(item)?;
        let predicate: GridFilterPredicate = Rc::new(move |params: &GridCellParams<'_>| {
            params
                .value
                .as_number()
                .is_some_and(|cell| compare(cell, filter_value))
        });
        Some(predicate)
    })
}

/// Operators of number columns: `=`, `!=`, `>`, `>=`, `<`, `<=`, `isEmpty`, `isNotEmpty` and
/// `isAnyOf`.
pub fn grid_numeric_operators() -> Vec<GridFilterOperator> {
    vec![
        comparison_operator("=", |cell, value| cell == value),
        GridFilterOperator::new("!=", |item, _| {
            let filter_value = filter_number(item)?;
            let predicate: GridFilterPredicate = Rc::new(move |params: &GridCellParams<'_>| {
                params.value.as_number() != Some(filter_value)
            });
            Some(predicate)
        }),
        comparison_operator(">", |cell, value| cell > value),
        comparison_operator(">=", |cell, value| cell >= value),
        comparison_operator("<", |cell, value| cell < value),
        comparison_operator("<=", |cell, value| cell <= value),
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
        GridFilterOperator::new("isAnyOf", |item, _| {
            let values: Vec<f64> = item
                .value
                .as_ref()?
                .as_list()?
                .iter()
                .filter_map(CellValue::as_number)
                .collect();
            if values.is_empty() {
                return None;
            }
            let predicate: GridFilterPredicate = Rc::new(move |params: &GridCellParams<'_>| {
                params
                    .value
                    .as_number()
                    .is_some_and(|cell| values.contains(&cell))
            });
            Some(predicate)
        }),
    ]
}

/// Quick filter of number columns: exact numeric equality with the token.
pub fn get_grid_numeric_quick_filter_fn(
    value: &str,
    _column: &GridStateColDef,
) -> Option<GridFilterPredicate> {
    let number = value.trim().parse::<f64>().ok().filter(|n| !n.is_nan())?;
    Some(Rc::new(move |params: &GridCellParams<'_>| {
        params.value.as_number() == Some(number)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::col_def::{GridColDef, GridColType};
    use crate::value::{GridRowId, GridRowModel};

    fn matches(operator: &str, filter: CellValue, cell: CellValue) -> Option<bool> {
        let column =
            GridStateColDef::resolve(GridColDef::new("year").with_type(GridColType::Number));
        let item = GridFilterItem::new("year", operator, column.parse_value(&filter));
        let predicate = (column.filter_operator(operator)?.get_apply_filter_fn)(&item, &column)?;
        let row = GridRowModel::new();
        let id = GridRowId::Number(0);
        Some(predicate(&GridCellParams {
            id: &id,
            field: "year",
            value: cell,
            row: &row,
        }))
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(matches(">", 1984.into(), 1985.into()), Some(true));
        assert_eq!(matches(">", 1984.into(), 1984.into()), Some(false));
        assert_eq!(matches(">=", 1984.into(), 1984.into()), Some(true));
        assert_eq!(matches("<", "1984".into(), 1983.into()), Some(true));
        assert_eq!(matches("=", 1984.into(), 1984.into()), Some(true));
        assert_eq!(matches("!=", 1984.into(), CellValue::Null), Some(true));
        assert_eq!(matches(">", 1984.into(), CellValue::Null), Some(false));
    }

    #[test]
    fn test_missing_or_invalid_value_disables_the_item() {
        assert_eq!(matches("=", CellValue::Null, 1.into()), None);
        assert_eq!(matches("=", "abc".into(), 1.into()), None);
        assert_eq!(matches("isAnyOf", CellValue::List(vec![]), 1.into()), None);
        assert_eq!(
            matches("isAnyOf", vec![1, 2].into(), 2.into()),
            Some(true)
        );
    }
}
