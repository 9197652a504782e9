use super::{GridSortItem, GridSortModel};
use crate::col_def::{GridComparatorFn, GridSortDirection, GridStateColDef};
use crate::features::columns::GridColumnsState;
use crate::features::rows::GridRowsState;
use crate::value::{CellValue, GridRowId, GridRowModel};
use std::cmp::Ordering;
use std::rc::Rc;

/// Sorts a list of row ids. The order of rows comparing equal is kept.
pub type GridSortRowList = Rc<dyn Fn(&[GridRowId]) -> Vec<GridRowId>>;

/// Keep only the first item when multi-column sorting is disabled.
pub fn sanitize_sort_model(
    model: &GridSortModel,
    disable_multiple_column_sorting: bool,
) -> GridSortModel {
    if disable_multiple_column_sorting && model.len() > 1 {
        tracing::warn!(
            "the sort model holds {} items but multi-column sorting is disabled, keeping the first one",
            model.len()
        );
        return model.iter().take(1).cloned().collect();
    }
    model.clone()
}

/// Direction following `current` in `sorting_order`, wrapping around.
pub fn get_next_grid_sort_direction(
    sorting_order: &[Option<GridSortDirection>],
    current: Option<GridSortDirection>,
) -> Option<GridSortDirection> {
    let first = sorting_order.first().copied().flatten();
    let Some(current) = current else {
        return first;
    };
    match sorting_order
        .iter()
        .position(|direction| *direction == Some(current))
    {
        Some(index) if index + 1 < sorting_order.len() => sorting_order[index + 1],
        _ => first,
    }
}

struct ParsedSortItem {
    column: GridStateColDef,
    comparator: GridComparatorFn,
}

fn parse_sort_item(item: &GridSortItem, columns: &GridColumnsState) -> Option<ParsedSortItem> {
    let direction = item.sort?;
    let column = columns.column(&item.field)?.clone();
    let ascending = column.sort_comparator.clone();
    let comparator: GridComparatorFn = match direction {
        GridSortDirection::Asc => ascending,
        GridSortDirection::Desc => {
            Rc::new(move |a: &CellValue, b: &CellValue| ascending(a, b).reverse())
        }
    };
    Some(ParsedSortItem { column, comparator })
}

/// Compile a sort model into a row list sorter, or `None` when no item applies.
///
/// Items on unknown columns or without direction are skipped. Rows are compared on the first
/// item, ties fall through to the next ones, and rows equal on every item keep their order.
/// Nodes without row model (auto-generated tree parents) compare as empty rows.
pub fn build_aggregated_sorting_applier(
    model: &GridSortModel,
    columns: &GridColumnsState,
    rows: Rc<GridRowsState>,
) -> Option<GridSortRowList> {
    let items: Vec<ParsedSortItem> = model
        .iter()
        .filter_map(|item| parse_sort_item(item, columns))
        .collect();
    if items.is_empty() {
        return None;
    }
    Some(Rc::new(move |ids: &[GridRowId]| {
        let empty = GridRowModel::new();
        let mut decorated: Vec<(&GridRowId, Vec<CellValue>)> = ids
            .iter()
            .map(|id| {
                let row = rows.row(id).unwrap_or(&empty);
                let values = items
                    .iter()
                    .map(|item| item.column.cell_value(id, row))
                    .collect();
                (id, values)
            })
            .collect();
        decorated.sort_by(|(_, a), (_, b)| {
            items
                .iter()
                .zip(a.iter().zip(b.iter()))
                .map(|(item, (a, b))| (item.comparator)(a, b))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        decorated.into_iter().map(|(id, _)| id.clone()).collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::col_def::{GridColDef, GridColType};
    use crate::features::columns::create_columns_state;
    use std::collections::HashMap;

    fn fixture(
        rows: Vec<(i64, &str, CellValue)>,
    ) -> (GridColumnsState, Rc<GridRowsState>, Vec<GridRowId>) {
        let columns = create_columns_state(
            &GridColumnsState::default(),
            &[
                GridColDef::new("brand"),
                GridColDef::new("price").with_type(GridColType::Number),
            ],
            true,
        );
        let ids: Vec<GridRowId> = rows.iter().map(|(id, _, _)| GridRowId::Number(*id)).collect();
        let lookup: HashMap<GridRowId, GridRowModel> = rows
            .into_iter()
            .map(|(id, brand, price)| {
                (
                    GridRowId::Number(id),
                    GridRowModel::new().with("brand", brand).with("price", price),
                )
            })
            .collect();
        let state = GridRowsState {
            ids: Rc::new(ids.clone()),
            id_rows_lookup: Rc::new(lookup),
            ..GridRowsState::default()
        };
        (columns, Rc::new(state), ids)
    }

    fn item(field: &str, sort: GridSortDirection) -> GridSortItem {
        GridSortItem {
            field: field.into(),
            sort: Some(sort),
        }
    }

    fn ids(values: &[i64]) -> Vec<GridRowId> {
        values.iter().map(|value| GridRowId::Number(*value)).collect()
    }

    #[test]
    fn test_next_direction_cycles() {
        let order = crate::props::default_sorting_order();
        assert_eq!(get_next_grid_sort_direction(&order, None), Some(GridSortDirection::Asc));
        assert_eq!(
            get_next_grid_sort_direction(&order, Some(GridSortDirection::Asc)),
            Some(GridSortDirection::Desc)
        );
        assert_eq!(get_next_grid_sort_direction(&order, Some(GridSortDirection::Desc)), None);

        let desc_first = vec![Some(GridSortDirection::Desc), Some(GridSortDirection::Asc)];
        assert_eq!(
            get_next_grid_sort_direction(&desc_first, Some(GridSortDirection::Asc)),
            Some(GridSortDirection::Desc)
        );
    }

    #[test]
    fn test_ties_fall_through_and_stay_stable() {
        let (columns, rows, all) = fixture(vec![
            (1, "Nike", 10.into()),
            (2, "Adidas", 20.into()),
            (3, "Nike", 5.into()),
            (4, "Adidas", 20.into()),
        ]);
        let model = vec![
            item("brand", GridSortDirection::Asc),
            item("price", GridSortDirection::Desc),
        ];
        let sort = build_aggregated_sorting_applier(&model, &columns, rows).unwrap();
        assert_eq!(sort(&all), ids(&[2, 4, 1, 3]));
    }

    #[test]
    fn test_nulls_keep_their_relative_order_in_both_directions() {
        let (columns, rows, all) = fixture(vec![
            (1, "a", CellValue::Null),
            (2, "b", 3.into()),
            (3, "c", CellValue::Null),
            (4, "d", 1.into()),
        ]);
        let asc = vec![item("price", GridSortDirection::Asc)];
        let sort = build_aggregated_sorting_applier(&asc, &columns, rows.clone()).unwrap();
        assert_eq!(sort(&all), ids(&[1, 3, 4, 2]));

        let desc = vec![item("price", GridSortDirection::Desc)];
        let sort = build_aggregated_sorting_applier(&desc, &columns, rows).unwrap();
        assert_eq!(sort(&all), ids(&[2, 4, 1, 3]));
    }

    #[test]
    fn test_unknown_columns_and_empty_directions_are_skipped() {
        let (columns, rows, _) = fixture(vec![(1, "a", 1.into())]);
        let model = vec![
            item("missing", GridSortDirection::Asc),
            GridSortItem {
                field: "brand".into(),
                sort: None,
            },
        ];
        assert!(build_aggregated_sorting_applier(&model, &columns, rows).is_none());
        let model = vec![
            item("a", GridSortDirection::Asc),
            item("b", GridSortDirection::Asc),
        ];
        assert_eq!(sanitize_sort_model(&model, true).len(), 1);
        assert_eq!(sanitize_sort_model(&model, false).len(), 2);
    }
}
