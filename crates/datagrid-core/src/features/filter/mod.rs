//! Filtering.
//!
//! The filter slice holds the filter model and the result of the last filtering pass: the
//! visibility of every row and, for trees, the number of visible descendants of every node.
//!
//! Filtering runs through the `filtering` strategy. In client mode the model is compiled into an
//! aggregated applier (see [`build_aggregated_filter_applier`]) handed to the active strategy; in
//! server mode the strategy receives no applier and every row stays visible. Every pass publishes
//! `filteredRowsSet`.
//!
//! The model is controllable through [`GridProps::filter_model`](crate::GridProps::filter_model):
//! every mutation below goes through the control state reconciliation.

mod model;
mod utils;

pub use model::{GridFilterItem, GridFilterModel, GridLinkOperator};
pub use utils::{
    GridAggregatedFilterApplier, GridShouldApplyFilter, build_aggregated_filter_applier,
    build_aggregated_filter_items_applier, build_aggregated_quick_filter_applier,
    clean_filter_item, sanitize_filter_model, split_quick_filter_text,
};

use crate::api::GridApi;
use crate::control_state::GridControlStateItem;
use crate::error::GridError;
use crate::events::{GridEvent, GridEventName};
use crate::features::preference_panel::GridPreferencePanelsValue;
use crate::pipe_processing::{ExportState, RestoreState};
use crate::props::{
    GridCallback, GridChangeReason, GridFeatureMode, GridFilterInitialState, GridInitialState,
    GridProps,
};
use crate::state::GridState;
use crate::strategy_processing::{Filtering, GridStrategyCapability};
use crate::timers::GridTimerKey;
use crate::value::{GridRowId, GridRowModel};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

const GROUP: &str = "filter";

/// Name of the flat filtering strategy.
pub const FLAT_FILTERING_STRATEGY: &str = "none";

/// Filter slice.
#[derive(Debug, Clone, Default)]
pub struct GridFilterState {
    /// Current filter model.
    pub filter_model: GridFilterModel,
    /// Filtering result by row. A row absent from the lookup is visible.
    pub visible_rows_lookup: Rc<HashMap<GridRowId, bool>>,
    /// Number of visible descendants of each visible tree node.
    pub filtered_descendant_count_lookup: Rc<HashMap<GridRowId, usize>>,
}

/// Parameters of the `filtering` strategies.
#[derive(Clone, Default)]
pub struct GridFilteringMethodParams {
    /// Compiled filter model. `None` means every row passes.
    pub is_row_matching_filters: Option<GridAggregatedFilterApplier>,
}

impl fmt::Debug for GridFilteringMethodParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridFilteringMethodParams")
            .field(
                "is_row_matching_filters",
                &self.is_row_matching_filters.is_some(),
            )
            .finish()
    }
}

/// Output of the `filtering` strategies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridFilteringMethodValue {
    /// Filtering result by row.
    pub visible_rows_lookup: HashMap<GridRowId, bool>,
    /// Number of visible descendants of each visible tree node.
    pub filtered_descendant_count_lookup: HashMap<GridRowId, usize>,
}

fn with_filter(state: &GridState, filter: GridFilterState) -> GridState {
    GridState {
        filter: Rc::new(filter),
        ..state.clone()
    }
}

fn with_filter_model(state: &GridState, filter_model: GridFilterModel) -> GridState {
    with_filter(
        state,
        GridFilterState {
            filter_model,
            ..(*state.filter).clone()
        },
    )
}

fn filter_model(state: &GridState) -> &GridFilterModel {
    &state.filter.filter_model
}

fn restore_filter_model(previous: &GridState, next: &GridState) -> GridState {
    with_filter_model(next, previous.filter.filter_model.clone())
}

fn filter_model_prop(props: &GridProps) -> Option<&GridFilterModel> {
    props.filter_model.as_ref()
}

fn on_filter_model_change(props: &GridProps) -> Option<&GridCallback<GridFilterModel>> {
    props.on_filter_model_change.as_ref()
}

fn filter_model_change(model: &GridFilterModel, reason: Option<GridChangeReason>) -> GridEvent {
    GridEvent::FilterModelChange {
        model: model.clone(),
        reason,
    }
}

impl GridApi {
    /// Current filter model.
    pub fn get_filter_model(&self) -> GridFilterModel {
        self.state_ref().filter.filter_model.clone()
    }

    /// Sanitize and store a filter model, then apply it.
    pub fn set_filter_model(
        &mut self,
        model: GridFilterModel,
        reason: Option<GridChangeReason>,
    ) -> Result<(), GridError> {
        if self.state_ref().filter.filter_model == model {
            return Ok(());
        }
        tracing::debug!("setting filter model");
        let model = sanitize_filter_model(
            &model,
            self.props().disable_multiple_column_filtering,
            &self.state_ref().columns,
        );
        self.set_state_with_reason(|state| with_filter_model(state, model), reason);
        self.apply_filters()
    }

    /// Recompute the visible rows with the active `filtering` strategy and publish
    /// `filteredRowsSet`.
    pub fn apply_filters(&mut self) -> Result<(), GridError> {
        if !self.is_mounted() {
            return Ok(());
        }
        let state = self.state();
        let is_row_matching_filters = match self.props().filter_mode {
            GridFeatureMode::Client => {
                build_aggregated_filter_applier(&state.filter.filter_model, &state.columns)?
            }
            GridFeatureMode::Server => None,
        };
        let result = self.apply_strategy_processor::<Filtering>(GridFilteringMethodParams {
            is_row_matching_filters,
        })?;
        tracing::debug!(
            "filtering applied, {} row(s) hidden",
            result
                .visible_rows_lookup
                .values()
                .filter(|visible| !**visible)
                .count()
        );
        self.set_state(|state| {
            with_filter(
                state,
                GridFilterState {
                    visible_rows_lookup: Rc::new(result.visible_rows_lookup),
                    filtered_descendant_count_lookup: Rc::new(
                        result.filtered_descendant_count_lookup,
                    ),
                    ..(*state.filter).clone()
                },
            )
        });
        self.publish_event(GridEvent::FilteredRowsSet);
        Ok(())
    }

    /// Add an item, or replace the item with the same id.
    pub fn upsert_filter_item(&mut self, item: GridFilterItem) -> Result<(), GridError> {
        let mut model = self.get_filter_model();
        match model.items.iter().position(|existing| existing.id == item.id) {
            Some(index) => model.items[index] = item,
            None => model.items.push(item),
        }
        self.set_filter_model(model, Some(GridChangeReason::UpsertFilterItem))
    }

    /// Add or replace several items at once.
    pub fn upsert_filter_items(&mut self, items: Vec<GridFilterItem>) -> Result<(), GridError> {
        let mut model = self.get_filter_model();
        for item in items {
            match model.items.iter().position(|existing| existing.id == item.id) {
                Some(index) => model.items[index] = item,
                None => model.items.push(item),
            }
        }
        self.set_filter_model(model, Some(GridChangeReason::UpsertFilterItems))
    }

    /// Remove the item with the same id. Does nothing if there is none.
    pub fn delete_filter_item(&mut self, item: &GridFilterItem) -> Result<(), GridError> {
        let mut model = self.get_filter_model();
        let before = model.items.len();
        model.items.retain(|existing| existing.id != item.id);
        if model.items.len() == before {
            return Ok(());
        }
        if let Some(id) = item.id {
            self.timers.cancel(&GridTimerKey::FilterItemValue(id));
        }
        self.set_filter_model(model, Some(GridChangeReason::DeleteFilterItem))
    }

    /// Change how the items combine.
    pub fn set_filter_link_operator(
        &mut self,
        link_operator: GridLinkOperator,
    ) -> Result<(), GridError> {
        let model = self.get_filter_model();
        if model.link_operator == link_operator {
            return Ok(());
        }
        self.set_filter_model(
            GridFilterModel {
                link_operator,
                ..model
            },
            Some(GridChangeReason::ChangeLogicOperator),
        )
    }

    /// Replace the quick filter tokens.
    pub fn set_quick_filter_values(&mut self, values: Vec<String>) -> Result<(), GridError> {
        let model = self.get_filter_model();
        if model.quick_filter_values == values {
            return Ok(());
        }
        self.set_filter_model(
            GridFilterModel {
                quick_filter_values: values,
                ..model
            },
            None,
        )
    }

    /// Upsert an item once no newer value was given for it during `debounce_ms`.
    ///
    /// The pending value is dropped if the item is deleted in the meantime. Items without id
    /// and a zero delay are applied immediately.
    pub fn set_filter_item_value_debounced(
        &mut self,
        item: GridFilterItem,
        debounce_ms: u64,
    ) -> Result<(), GridError> {
        let Some(id) = item.id.filter(|_| debounce_ms > 0) else {
            return self.upsert_filter_item(item);
        };
        self.timers.schedule(
            GridTimerKey::FilterItemValue(id),
            Duration::from_millis(debounce_ms),
            Box::new(move |api: &mut GridApi| {
                let is_current = api
                    .state_ref()
                    .filter
                    .filter_model
                    .items
                    .iter()
                    .any(|existing| existing.id == Some(id));
                if !is_current {
                    tracing::debug!("dropping debounced value of deleted filter item {}", id);
                    return Ok(());
                }
                api.upsert_filter_item(item)
            }),
        );
        Ok(())
    }

    /// Open the filter panel, adding an empty item on `target_field` when it has none.
    ///
    /// Items without value are dropped, unless their operator needs no value.
    pub fn show_filter_panel(&mut self, target_field: Option<&str>) -> Result<(), GridError> {
        if let Some(target_field) = target_field {
            let model = self.get_filter_model();
            let columns = self.state().columns.clone();
            let items_with_value: Vec<GridFilterItem> = model
                .items
                .iter()
                .filter(|item| {
                    if item.value.is_some() {
                        return true;
                    }
                    let requires_filter_value = columns
                        .column(&item.column_field)
                        .and_then(|column| {
                            column.filter_operator(item.operator_value.as_deref().unwrap_or(""))
                        })
                        .is_none_or(|operator| operator.requires_filter_value);
                    !requires_filter_value
                })
                .cloned()
                .collect();
            let has_target = items_with_value
                .iter()
                .any(|item| item.column_field == target_field);
            let items = if has_target {
                items_with_value
            } else {
                let mut taken: HashSet<u64> =
                    items_with_value.iter().filter_map(|item| item.id).collect();
                let new_item = clean_filter_item(
                    GridFilterItem {
                        column_field: target_field.to_string(),
                        ..GridFilterItem::default()
                    },
                    &columns,
                    &mut taken,
                );
                if self.props().disable_multiple_column_filtering {
                    vec![new_item]
                } else {
                    let mut items = items_with_value;
                    items.push(new_item);
                    items
                }
            };
            self.set_filter_model(GridFilterModel { items, ..model }, None)?;
        }
        self.show_preferences(GridPreferencePanelsValue::Filters);
        Ok(())
    }

    /// Close the filter panel.
    pub fn hide_filter_panel(&mut self) {
        self.hide_preferences();
    }

    /// Rows passing the filters, in display order, skipping the children of collapsed nodes.
    pub fn get_visible_row_ids(&self) -> Rc<Vec<GridRowId>> {
        self.selectors()
            .visible_sorted_row_ids
            .select(self.state_ref())
    }

    /// Row models of [`get_visible_row_ids`](Self::get_visible_row_ids). Auto-generated tree
    /// nodes have no model and are skipped.
    pub fn get_visible_row_models(&self) -> Vec<(GridRowId, GridRowModel)> {
        let rows = &self.state_ref().rows;
        self.get_visible_row_ids()
            .iter()
            .filter_map(|id| rows.row(id).map(|row| (id.clone(), row.clone())))
            .collect()
    }
}

fn flat_filtering(
    api: &GridApi,
    params: GridFilteringMethodParams,
) -> Result<GridFilteringMethodValue, GridError> {
    let mut value = GridFilteringMethodValue::default();
    if api.props().filter_mode == GridFeatureMode::Client
        && let Some(is_row_matching_filters) = params.is_row_matching_filters
    {
        let rows = &api.state_ref().rows;
        for id in rows.ids.iter() {
            if let Some(row) = rows.row(id) {
                value
                    .visible_rows_lookup
                    .insert(id.clone(), is_row_matching_filters(id, row, None));
            }
        }
    }
    Ok(value)
}

fn drop_items_of_removed_columns(api: &mut GridApi) -> Result<(), GridError> {
    let model = api.get_filter_model();
    let columns = api.state().columns.clone();
    let items: Vec<GridFilterItem> = model
        .items
        .iter()
        .filter(|item| columns.column(&item.column_field).is_some())
        .cloned()
        .collect();
    if items.len() < model.items.len() {
        tracing::debug!(
            "dropping {} filter item(s) of removed columns",
            model.items.len() - items.len()
        );
        return api.set_filter_model(GridFilterModel { items, ..model }, None);
    }
    if model.is_default() {
        return Ok(());
    }
    api.apply_filters()
}

/// Initialize the filter slice and register the filtering handlers.
///
/// Must run after the columns are registered: the initial model is sanitized against them.
pub fn register_filter(api: &mut GridApi) -> Result<(), GridError> {
    let props = api.props().clone();
    let initial = props
        .filter_model
        .clone()
        .or_else(|| {
            props
                .initial_state
                .as_ref()
                .and_then(|state| state.filter.as_ref())
                .and_then(|filter| filter.filter_model.clone())
        })
        .unwrap_or_default();
    let initial = sanitize_filter_model(
        &initial,
        props.disable_multiple_column_filtering,
        &api.state_ref().columns,
    );
    api.initialize_state(|state| {
        with_filter(
            state,
            GridFilterState {
                filter_model: initial,
                ..GridFilterState::default()
            },
        )
    });

    api.register_control_state(GridControlStateItem {
        state_id: "filter",
        state_selector: filter_model,
        restore_previous: restore_filter_model,
        prop_model: filter_model_prop,
        prop_on_change: on_filter_model_change,
        change_event: filter_model_change,
    });

    api.register_strategy_processor::<Filtering>(
        GROUP,
        FLAT_FILTERING_STRATEGY,
        |_| true,
        flat_filtering,
    );

    api.subscribe_event(GridEventName::RowsSet, |api, _, _| api.apply_filters());
    api.subscribe_event(GridEventName::ColumnsChange, |api, _, _| {
        drop_items_of_removed_columns(api)
    });
    api.subscribe_event(
        GridEventName::ActiveStrategyProcessorChange,
        |api, event, _| match event {
            GridEvent::ActiveStrategyProcessorChange { capability, .. }
                if *capability == Filtering::NAME =>
            {
                api.apply_filters()
            }
            _ => Ok(()),
        },
    );

    api.register_pipe_processor::<ExportState>(GROUP, |api, state: GridInitialState, _| {
        let model = &api.state_ref().filter.filter_model;
        if model.items.is_empty()
            && model.link_operator == GridLinkOperator::default()
            && model.quick_filter_values.is_empty()
        {
            return state;
        }
        GridInitialState {
            filter: Some(GridFilterInitialState {
                filter_model: Some(model.clone()),
            }),
            ..state
        }
    });

    api.register_pipe_processor::<RestoreState>(GROUP, |api, mut value, context| {
        let Some(model) = context
            .filter
            .as_ref()
            .and_then(|filter| filter.filter_model.as_ref())
        else {
            return value;
        };
        let model = sanitize_filter_model(
            model,
            api.props().disable_multiple_column_filtering,
            &api.state_ref().columns,
        );
        value
            .state_updates
            .push(Box::new(move |state: &mut GridState| {
                *state = with_filter_model(state, model);
            }));
        value
            .callbacks
            .push(Box::new(|api: &mut GridApi| api.apply_filters()));
        value
    });

    api.register_props_effect(GROUP, |api, previous| {
        let props = api.props().clone();
        if let Some(model) = props.filter_model.clone()
            && previous.filter_model.as_ref() != Some(&model)
        {
            api.set_filter_model(model, None)?;
        }
        if previous.disable_multiple_column_filtering != props.disable_multiple_column_filtering {
            let model = sanitize_filter_model(
                &api.get_filter_model(),
                props.disable_multiple_column_filtering,
                &api.state_ref().columns,
            );
            api.set_filter_model(model, None)?;
        }
        if previous.filter_mode != props.filter_mode {
            api.apply_filters()?;
        }
        Ok(())
    });
    Ok(())
}
