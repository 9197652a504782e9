//! Sorting.
//!
//! The sorting slice holds the sort model and the ids of every row in sorted order. Sorting runs
//! through the `sorting` strategy with a row list sorter compiled from the model (see
//! [`build_aggregated_sorting_applier`]). In server mode the rows keep the order they were
//! provided in. Every pass publishes `sortedRowsSet`.
//!
//! Clicking a column header moves the column to the next direction of its sorting order; holding
//! a multi-sort modifier adds the column to the model instead of replacing it.

mod utils;

pub use crate::col_def::GridSortDirection;
pub use utils::{
    GridSortRowList, build_aggregated_sorting_applier, get_next_grid_sort_direction,
    sanitize_sort_model,
};

use crate::api::GridApi;
use crate::col_def::GridStateColDef;
use crate::control_state::GridControlStateItem;
use crate::error::GridError;
use crate::events::{GridEvent, GridEventName};
use crate::pipe_processing::{ExportState, RestoreState};
use crate::props::{
    GridCallback, GridChangeReason, GridFeatureMode, GridInitialState, GridProps,
    GridSortingInitialState,
};
use crate::state::GridState;
use crate::strategy_processing::{GridStrategyCapability, Sorting};
use crate::value::{GridRowId, GridRowModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

const GROUP: &str = "sorting";

/// Name of the flat sorting strategy.
pub const FLAT_SORTING_STRATEGY: &str = "none";

/// Sort applied to one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSortItem {
    /// Column field.
    pub field: String,
    /// Direction. An item without direction does not sort.
    pub sort: Option<GridSortDirection>,
}

impl GridSortItem {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sort: Some(GridSortDirection::Asc),
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            sort: Some(GridSortDirection::Desc),
        }
    }
}

/// Sort items, by priority.
pub type GridSortModel = Vec<GridSortItem>;

/// Sorting slice.
#[derive(Debug, Clone, Default)]
pub struct GridSortingState {
    /// Current sort model.
    pub sort_model: GridSortModel,
    /// Every row id in sorted order.
    pub sorted_rows: Rc<Vec<GridRowId>>,
}

/// Parameters of the `sorting` strategies.
#[derive(Clone, Default)]
pub struct GridSortingMethodParams {
    /// Compiled sort model. `None` keeps the original order.
    pub sort_row_list: Option<GridSortRowList>,
}

impl fmt::Debug for GridSortingMethodParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridSortingMethodParams")
            .field("sort_row_list", &self.sort_row_list.is_some())
            .finish()
    }
}

fn with_sorting(state: &GridState, sorting: GridSortingState) -> GridState {
    GridState {
        sorting: Rc::new(sorting),
        ..state.clone()
    }
}

fn with_sort_model(state: &GridState, sort_model: GridSortModel) -> GridState {
    with_sorting(
        state,
        GridSortingState {
            sort_model,
            ..(*state.sorting).clone()
        },
    )
}

fn sort_model(state: &GridState) -> &GridSortModel {
    &state.sorting.sort_model
}

fn restore_sort_model(previous: &GridState, next: &GridState) -> GridState {
    with_sort_model(next, previous.sorting.sort_model.clone())
}

fn sort_model_prop(props: &GridProps) -> Option<&GridSortModel> {
    props.sort_model.as_ref()
}

fn on_sort_model_change(props: &GridProps) -> Option<&GridCallback<GridSortModel>> {
    props.on_sort_model_change.as_ref()
}

fn sort_model_change(model: &GridSortModel, _: Option<GridChangeReason>) -> GridEvent {
    GridEvent::SortModelChange {
        model: model.clone(),
    }
}

impl GridApi {
    /// Current sort model.
    pub fn get_sort_model(&self) -> GridSortModel {
        self.state_ref().sorting.sort_model.clone()
    }

    /// Store a sort model, then apply it.
    pub fn set_sort_model(&mut self, model: GridSortModel) -> Result<(), GridError> {
        if self.state_ref().sorting.sort_model == model {
            return Ok(());
        }
        tracing::debug!("setting sort model {:?}", model);
        let model = sanitize_sort_model(&model, self.props().disable_multiple_column_sorting);
        self.set_state(|state| with_sort_model(state, model));
        self.apply_sorting()
    }

    /// Sort the rows with the active `sorting` strategy and publish `sortedRowsSet`.
    pub fn apply_sorting(&mut self) -> Result<(), GridError> {
        if !self.is_mounted() {
            return Ok(());
        }
        let state = self.state();
        let sorted_rows = match self.props().sorting_mode {
            GridFeatureMode::Server => {
                tracing::debug!("skipping sorting in server mode");
                state.rows.tree.depth_first()
            }
            GridFeatureMode::Client => {
                let sort_row_list = build_aggregated_sorting_applier(
                    &state.sorting.sort_model,
                    &state.columns,
                    state.rows.clone(),
                );
                self.apply_strategy_processor::<Sorting>(GridSortingMethodParams {
                    sort_row_list,
                })?
            }
        };
        self.set_state(|state| {
            with_sorting(
                state,
                GridSortingState {
                    sorted_rows: Rc::new(sorted_rows),
                    ..(*state.sorting).clone()
                },
            )
        });
        self.publish_event(GridEvent::SortedRowsSet);
        Ok(())
    }

    fn create_sort_item(
        &self,
        column: &GridStateColDef,
        direction: Option<Option<GridSortDirection>>,
    ) -> Option<GridSortItem> {
        let sorting_order = column
            .sorting_order
            .as_deref()
            .unwrap_or(&self.props().sorting_order);
        let existing = self
            .state_ref()
            .sorting
            .sort_model
            .iter()
            .find(|item| item.field == column.field);
        let current = existing.and_then(|item| item.sort);
        let sort = match direction {
            Some(direction) => direction,
            None if existing.is_some() => get_next_grid_sort_direction(sorting_order, current),
            None => get_next_grid_sort_direction(sorting_order, None),
        };
        if existing.is_some() && sort.is_none() {
            return None;
        }
        Some(GridSortItem {
            field: column.field.clone(),
            sort,
        })
    }

    /// Sort a column.
    ///
    /// `direction` forces a direction (`Some(None)` removes the sort); `None` moves to the next
    /// direction of the sorting order. With `allow_multiple_sorting` (and multi-column sorting
    /// enabled) the column is upserted into the model, otherwise the model is replaced.
    pub fn sort_column(
        &mut self,
        field: &str,
        direction: Option<Option<GridSortDirection>>,
        allow_multiple_sorting: bool,
    ) -> Result<(), GridError> {
        let column = self
            .get_column(field)
            .cloned()
            .ok_or_else(|| GridError::ColumnNotFound(field.to_string()))?;
        if !column.sortable {
            return Ok(());
        }
        let sort_item = self.create_sort_item(&column, direction);
        let model = if !allow_multiple_sorting || self.props().disable_multiple_column_sorting {
            sort_item.into_iter().collect()
        } else {
            let mut model = self.get_sort_model();
            match (model.iter().position(|item| item.field == field), sort_item) {
                (Some(index), Some(item)) => model[index] = item,
                (Some(index), None) => {
                    model.remove(index);
                }
                (None, Some(item)) => model.push(item),
                (None, None) => {}
            }
            model
        };
        self.set_sort_model(model)
    }

    /// Every row id in sorted order.
    pub fn get_sorted_row_ids(&self) -> Rc<Vec<GridRowId>> {
        self.state_ref().sorting.sorted_rows.clone()
    }

    /// Every row model in sorted order. Auto-generated tree nodes are skipped.
    pub fn get_sorted_rows(&self) -> Vec<(GridRowId, GridRowModel)> {
        let rows = &self.state_ref().rows;
        self.state_ref()
            .sorting
            .sorted_rows
            .iter()
            .filter_map(|id| rows.row(id).map(|row| (id.clone(), row.clone())))
            .collect()
    }

    /// Index of a row in the sorted rows.
    pub fn get_row_index(&self, id: &GridRowId) -> Option<usize> {
        self.state_ref()
            .sorting
            .sorted_rows
            .iter()
            .position(|sorted| sorted == id)
    }

    /// Id of the row at `index` in the sorted rows.
    pub fn get_row_id_from_row_index(&self, index: usize) -> Option<GridRowId> {
        self.state_ref().sorting.sorted_rows.get(index).cloned()
    }
}

fn flat_sorting(
    api: &GridApi,
    params: GridSortingMethodParams,
) -> Result<Vec<GridRowId>, GridError> {
    let ids = api.state_ref().rows.ids.clone();
    Ok(match params.sort_row_list {
        Some(sort_row_list) => sort_row_list(&ids),
        None => ids.to_vec(),
    })
}

fn drop_items_of_removed_columns(api: &mut GridApi) -> Result<(), GridError> {
    let model = api.get_sort_model();
    let columns = api.state().columns.clone();
    let kept: GridSortModel = model
        .iter()
        .filter(|item| columns.column(&item.field).is_some())
        .cloned()
        .collect();
    if kept.len() < model.len() {
        return api.set_sort_model(kept);
    }
    if model.is_empty() {
        return Ok(());
    }
    api.apply_sorting()
}

/// Initialize the sorting slice and register the sorting handlers.
pub fn register_sorting(api: &mut GridApi) -> Result<(), GridError> {
    let props = api.props().clone();
    let initial = props
        .sort_model
        .clone()
        .or_else(|| {
            props
                .initial_state
                .as_ref()
                .and_then(|state| state.sorting.as_ref())
                .and_then(|sorting| sorting.sort_model.clone())
        })
        .unwrap_or_default();
    let initial = sanitize_sort_model(&initial, props.disable_multiple_column_sorting);
    api.initialize_state(|state| {
        with_sorting(
            state,
            GridSortingState {
                sort_model: initial,
                sorted_rows: state.rows.ids.clone(),
            },
        )
    });

    api.register_control_state(GridControlStateItem {
        state_id: "sorting",
        state_selector: sort_model,
        restore_previous: restore_sort_model,
        prop_model: sort_model_prop,
        prop_on_change: on_sort_model_change,
        change_event: sort_model_change,
    });

    api.register_strategy_processor::<Sorting>(
        GROUP,
        FLAT_SORTING_STRATEGY,
        |_| true,
        flat_sorting,
    );

    api.subscribe_event(GridEventName::ColumnHeaderClick, |api, event, meta| {
        let GridEvent::ColumnHeaderClick { field, multi } = event else {
            return Ok(());
        };
        if meta.is_default_prevented() {
            return Ok(());
        }
        api.sort_column(field, None, *multi)
    });
    api.subscribe_event(GridEventName::RowsSet, |api, _, _| api.apply_sorting());
    api.subscribe_event(GridEventName::ColumnsChange, |api, _, _| {
        drop_items_of_removed_columns(api)
    });
    api.subscribe_event(
        GridEventName::ActiveStrategyProcessorChange,
        |api, event, _| match event {
            GridEvent::ActiveStrategyProcessorChange { capability, .. }
                if *capability == Sorting::NAME =>
            {
                api.apply_sorting()
            }
            _ => Ok(()),
        },
    );

    api.register_pipe_processor::<ExportState>(GROUP, |api, state: GridInitialState, _| {
        let sort_model = &api.state_ref().sorting.sort_model;
        if sort_model.is_empty() {
            return state;
        }
        GridInitialState {
            sorting: Some(GridSortingInitialState {
                sort_model: Some(sort_model.clone()),
            }),
            ..state
        }
    });

    api.register_pipe_processor::<RestoreState>(GROUP, |api, mut value, context| {
        let Some(model) = context
            .sorting
            .as_ref()
            .and_then(|sorting| sorting.sort_model.as_ref())
        else {
            return value;
        };
        let model = sanitize_sort_model(model, api.props().disable_multiple_column_sorting);
        value
            .state_updates
            .push(Box::new(move |state: &mut GridState| {
                *state = with_sort_model(state, model);
            }));
        value
            .callbacks
            .push(Box::new(|api: &mut GridApi| api.apply_sorting()));
        value
    });

    api.register_props_effect(GROUP, |api, previous| {
        let props = api.props().clone();
        if let Some(model) = props.sort_model.clone()
            && previous.sort_model.as_ref() != Some(&model)
        {
            api.set_sort_model(model)?;
        }
        if previous.sorting_mode != props.sorting_mode {
            api.apply_sorting()?;
        }
        Ok(())
    });
    Ok(())
}
