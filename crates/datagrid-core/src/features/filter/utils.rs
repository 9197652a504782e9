use super::model::{GridFilterItem, GridFilterModel, GridLinkOperator};
use crate::col_def::{GridCellParams, GridFilterPredicate, GridStateColDef};
use crate::error::GridError;
use crate::features::columns::GridColumnsState;
use crate::value::{GridRowId, GridRowModel};
use rand::Rng;
use std::collections::HashSet;
use std::rc::Rc;

/// Restricts an applier to the columns for which it returns true.
pub type GridShouldApplyFilter<'a> = Option<&'a dyn Fn(&str) -> bool>;

/// Tells whether a row passes a filter model.
pub type GridAggregatedFilterApplier =
    Rc<dyn Fn(&GridRowId, &GridRowModel, GridShouldApplyFilter<'_>) -> bool>;

/// Split a quick filter input into tokens on spaces.
pub fn split_quick_filter_text(text: &str) -> Vec<String> {
    text.split(' ')
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn random_item_id(taken: &HashSet<u64>) -> u64 {
    let mut rng = rand::thread_rng();
    loop {
        let id = rng.gen_range(0..=100_000);
        if !taken.contains(&id) {
            return id;
        }
    }
}

/// Fill the id (random) and the operator (first operator of the column) of an item.
pub fn clean_filter_item(
    item: GridFilterItem,
    columns: &GridColumnsState,
    taken_ids: &mut HashSet<u64>,
) -> GridFilterItem {
    let mut item = item;
    if item.id.is_none() {
        let id = random_item_id(taken_ids);
        taken_ids.insert(id);
        item.id = Some(id);
    }
    if item.operator_value.is_none() {
        item.operator_value = columns
            .column(&item.column_field)
            .and_then(|column| column.filter_operators.first())
            .map(|operator| operator.value.clone());
    }
    item
}

/// Normalize a filter model before it enters the state.
///
/// Only the first item is kept when multi-column filtering is disabled. When several items lack
/// an id, or any item lacks an operator, every item is cleaned with [`clean_filter_item`].
pub fn sanitize_filter_model(
    model: &GridFilterModel,
    disable_multiple_column_filtering: bool,
    columns: &GridColumnsState,
) -> GridFilterModel {
    let has_several_items = model.items.len() > 1;
    let items: Vec<GridFilterItem> = if has_several_items && disable_multiple_column_filtering {
        tracing::warn!(
            "the filter model holds {} items but multi-column filtering is disabled, keeping the first one",
            model.items.len()
        );
        model.items.iter().take(1).cloned().collect()
    } else {
        model.items.clone()
    };

    let has_items_without_ids = has_several_items && items.iter().any(|item| item.id.is_none());
    let has_item_without_operator = items.iter().any(|item| item.operator_value.is_none());
    if has_items_without_ids {
        tracing::warn!("filter items need an id when the filter model holds several items");
    }
    if has_item_without_operator {
        tracing::warn!("filter items need an operator value");
    }
    if !has_items_without_ids && !has_item_without_operator {
        return GridFilterModel {
            items,
            ..model.clone()
        };
    }

    let mut taken: HashSet<u64> = items.iter().filter_map(|item| item.id).collect();
    GridFilterModel {
        items: items
            .into_iter()
            .map(|item| clean_filter_item(item, columns, &mut taken))
            .collect(),
        ..model.clone()
    }
}

struct ItemApplier {
    field: String,
    column: GridStateColDef,
    predicate: GridFilterPredicate,
}

impl ItemApplier {
    fn matches(&self, id: &GridRowId, row: &GridRowModel) -> bool {
        (self.predicate)(&GridCellParams {
            id,
            field: &self.field,
            value: self.column.cell_value(id, row),
            row,
        })
    }
}

fn item_applier(
    item: &GridFilterItem,
    columns: &GridColumnsState,
) -> Result<Option<ItemApplier>, GridError> {
    let Some(operator_value) = item.operator_value.as_deref() else {
        return Ok(None);
    };
    if item.column_field.is_empty() {
        return Ok(None);
    }
    let Some(column) = columns.column(&item.column_field) else {
        tracing::debug!("skipping filter item on unknown column {}", item.column_field);
        return Ok(None);
    };
    let parsed = GridFilterItem {
        value: item.value.as_ref().map(|value| column.parse_value(value)),
        ..item.clone()
    };
    if column.filter_operators.is_empty() {
        return Err(GridError::MissingFilterOperators {
            field: column.field.clone(),
        });
    }
    let operator =
        column
            .filter_operator(operator_value)
            .ok_or_else(|| GridError::UnknownFilterOperator {
                field: column.field.clone(),
                operator: operator_value.to_string(),
            })?;
    Ok(
        (operator.get_apply_filter_fn)(&parsed, column).map(|predicate| ItemApplier {
            field: column.field.clone(),
            column: column.clone(),
            predicate,
        }),
    )
}

/// Applier of the filter items, or `None` when no item can filter.
pub fn build_aggregated_filter_items_applier(
    model: &GridFilterModel,
    columns: &GridColumnsState,
) -> Result<Option<GridAggregatedFilterApplier>, GridError> {
    let mut appliers = Vec::new();
    for item in &model.items {
        if let Some(applier) = item_applier(item, columns)? {
            appliers.push(applier);
        }
    }
    if appliers.is_empty() {
        return Ok(None);
    }
    let link_operator = model.link_operator;
    Ok(Some(Rc::new(
        move |id: &GridRowId, row: &GridRowModel, should_apply: GridShouldApplyFilter<'_>| {
            let mut active = appliers.iter().filter(|applier| {
                should_apply.is_none_or(|should_apply| should_apply(applier.field.as_str()))
            });
            match link_operator {
                GridLinkOperator::And => active.all(|applier| applier.matches(id, row)),
                GridLinkOperator::Or => active.any(|applier| applier.matches(id, row)),
            }
        },
    )))
}

struct QuickFilterColumn {
    column: GridStateColDef,
    // One entry per kept token.
    predicates: Vec<Option<GridFilterPredicate>>,
}

/// Applier of the quick filter tokens, or `None` when there is no token.
///
/// Tokens no column can match are dropped. With `And`, every token must match at least one
/// column; with `Or`, one token matching one column is enough.
pub fn build_aggregated_quick_filter_applier(
    model: &GridFilterModel,
    columns: &GridColumnsState,
) -> Option<GridAggregatedFilterApplier> {
    if model.quick_filter_values.is_empty() {
        return None;
    }

    let mut per_column: Vec<(String, GridStateColDef, Vec<Option<GridFilterPredicate>>)> =
        Vec::new();
    for field in &columns.all {
        let Some(column) = columns.column(field) else {
            continue;
        };
        let Some(quick_filter_fn) = &column.quick_filter_fn else {
            continue;
        };
        let predicates = model
            .quick_filter_values
            .iter()
            .map(|value| quick_filter_fn(value, column))
            .collect();
        per_column.push((field.clone(), column.clone(), predicates));
    }

    let used: Vec<usize> = (0..model.quick_filter_values.len())
        .filter(|index| {
            per_column
                .iter()
                .any(|(_, _, predicates)| predicates[*index].is_some())
        })
        .collect();
    let columns: Vec<(String, QuickFilterColumn)> = per_column
        .into_iter()
        .map(|(field, column, predicates)| {
            let predicates = used.iter().map(|index| predicates[*index].clone()).collect();
            (field, QuickFilterColumn { column, predicates })
        })
        .collect();
    let token_count = used.len();
    let logic_operator = model.quick_filter_logic_operator;

    Some(Rc::new(
        move |id: &GridRowId, row: &GridRowModel, should_apply: GridShouldApplyFilter<'_>| {
            let active: Vec<(&str, &QuickFilterColumn, _)> = columns
                .iter()
                .filter(|(field, _)| {
                    should_apply.is_none_or(|should_apply| should_apply(field.as_str()))
                })
                .map(|(field, quick)| (field.as_str(), quick, quick.column.cell_value(id, row)))
                .collect();
            let token_matches = |token: usize| {
                active.iter().any(|(field, quick, value)| {
                    quick.predicates[token].as_ref().is_some_and(|predicate| {
                        predicate(&GridCellParams {
                            id,
                            field: *field,
                            value: value.clone(),
                            row,
                        })
                    })
                })
            };
            match logic_operator {
                GridLinkOperator::And => (0..token_count).all(token_matches),
                GridLinkOperator::Or => (0..token_count).any(token_matches),
            }
        },
    ))
}

/// Combination of the items applier and the quick filter applier. `None` means every row
/// passes.
pub fn build_aggregated_filter_applier(
    model: &GridFilterModel,
    columns: &GridColumnsState,
) -> Result<Option<GridAggregatedFilterApplier>, GridError> {
    let items = build_aggregated_filter_items_applier(model, columns)?;
    let quick_filter = build_aggregated_quick_filter_applier(model, columns);
    Ok(match (items, quick_filter) {
        (None, None) => None,
        (Some(applier), None) | (None, Some(applier)) => Some(applier),
        (Some(items), Some(quick_filter)) => Some(Rc::new(
            move |id: &GridRowId, row: &GridRowModel, should_apply: GridShouldApplyFilter<'_>| {
                items(id, row, should_apply) && quick_filter(id, row, should_apply)
            },
        )),
    })
}
