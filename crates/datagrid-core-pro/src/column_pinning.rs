//! Column pinning.
//!
//! Pinned columns are kept at the edges of the column order: the `hydrateColumns` processor moves
//! left-pinned fields first and right-pinned fields last. To put an unpinned column back where it
//! was, the processor remembers the order the columns would have without pinning. That order is
//! updated when columns are added, removed or reordered, so a column pinned, moved around and
//! unpinned again lands next to the columns it was moved next to.
//!
//! Pinning also takes part in horizontal scrolling (pinned widths hide part of the viewport), in
//! the column menu and in column reordering (nothing can be dropped inside a pinned area).

use datagrid_core::events::{GridEvent, GridEventName};
use datagrid_core::features::columns::filter_columns;
use datagrid_core::pipe_processing::{
    CanBeReordered, ColumnMenu, ExportState, HydrateColumns, RestoreState, ScrollToIndexes,
};
use datagrid_core::props::GridCallback;
use datagrid_core::state::GridState;
use datagrid_core::{
    GridApi, GridChangeReason, GridColumnMenuItem, GridColumnsState, GridControlStateItem,
    GridError, GridInitialState, GridPinnedColumns, GridPinnedPosition, GridProps,
    GridScrollPosition,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

const GROUP: &str = "columnPinning";

const DISABLE_PROP: &str = "disableColumnPinning";

/// Column pinning operations, available on [`GridApi`] once
/// [`register_column_pinning`] ran.
pub trait GridColumnPinningApi {
    /// Pin a column to an edge. A column pinned to the other edge moves.
    fn pin_column(&mut self, field: &str, side: GridPinnedPosition) -> Result<(), GridError>;

    /// Unpin a column. It goes back to where it would be had it never been pinned.
    fn unpin_column(&mut self, field: &str) -> Result<(), GridError>;

    /// Current pinned columns, including fields that do not exist (anymore).
    fn get_pinned_columns(&self) -> GridPinnedColumns;

    /// Replace the pinned columns.
    fn set_pinned_columns(&mut self, pinned_columns: GridPinnedColumns) -> Result<(), GridError>;

    /// Edge a column is pinned to.
    fn is_column_pinned(&self, field: &str) -> Option<GridPinnedPosition>;
}

fn ensure_enabled(api: &GridApi, method: &'static str) -> Result<(), GridError> {
    if api.props().disable_column_pinning {
        return Err(GridError::FeatureDisabled {
            method,
            prop: DISABLE_PROP,
        });
    }
    Ok(())
}

fn with_pinned_columns(state: &GridState, pinned_columns: GridPinnedColumns) -> GridState {
    GridState {
        pinned_columns: Rc::new(pinned_columns),
        ..state.clone()
    }
}

fn pinned_side(pinned: &GridPinnedColumns, field: &str) -> Option<GridPinnedPosition> {
    if pinned.left.iter().any(|left| left == field) {
        Some(GridPinnedPosition::Left)
    } else if pinned.right.iter().any(|right| right == field) {
        Some(GridPinnedPosition::Right)
    } else {
        None
    }
}

impl GridColumnPinningApi for GridApi {
    fn pin_column(&mut self, field: &str, side: GridPinnedPosition) -> Result<(), GridError> {
        ensure_enabled(self, "pinColumn")?;
        if self.is_column_pinned(field) == Some(side) {
            return Ok(());
        }
        let mut pinned = self.get_pinned_columns();
        let (target, other) = match side {
            GridPinnedPosition::Left => (&mut pinned.left, &mut pinned.right),
            GridPinnedPosition::Right => (&mut pinned.right, &mut pinned.left),
        };
        other.retain(|existing| existing != field);
        target.push(field.to_string());
        self.set_pinned_columns(pinned)
    }

    fn unpin_column(&mut self, field: &str) -> Result<(), GridError> {
        ensure_enabled(self, "unpinColumn")?;
        let mut pinned = self.get_pinned_columns();
        pinned.left.retain(|existing| existing != field);
        pinned.right.retain(|existing| existing != field);
        self.set_pinned_columns(pinned)
    }

    fn get_pinned_columns(&self) -> GridPinnedColumns {
        (*self.state_ref().pinned_columns).clone()
    }

    fn set_pinned_columns(&mut self, pinned_columns: GridPinnedColumns) -> Result<(), GridError> {
        ensure_enabled(self, "setPinnedColumns")?;
        if *self.state_ref().pinned_columns == pinned_columns {
            return Ok(());
        }
        tracing::debug!(
            "pinning {:?} left and {:?} right",
            pinned_columns.left,
            pinned_columns.right
        );
        if self.set_state(|state| with_pinned_columns(state, pinned_columns)) {
            self.request_pipe_processors_application::<HydrateColumns>()?;
        }
        self.force_update();
        Ok(())
    }

    fn is_column_pinned(&self, field: &str) -> Option<GridPinnedPosition> {
        pinned_side(&self.state_ref().pinned_columns, field)
    }
}

/// Column order as it would be without pinning, and the fields pinned at the last hydration.
#[derive(Debug, Default)]
struct PinningCache {
    ordered_fields_before_pinning: Option<Vec<String>>,
    previous_pinned: Vec<String>,
}

/// Put `field` at `preferred` when that slot is free, otherwise in the first free slot.
fn place(slots: &mut [Option<String>], preferred: Option<usize>, field: &str) {
    let index = preferred
        .filter(|index| slots.get(*index).is_some_and(Option::is_none))
        .or_else(|| slots.iter().position(Option::is_none));
    if let Some(index) = index {
        slots[index] = Some(field.to_string());
    }
}

fn restore_positions(
    before: &[String],
    previous_pinned: &[String],
    all_pinned: &[String],
    columns: &GridColumnsState,
) -> Vec<String> {
    let mut slots: Vec<Option<String>> = vec![None; columns.all.len()];
    let mut placed: HashSet<&str> = HashSet::new();

    // Columns unpinned since the last hydration go back to their position before pinning.
    for field in previous_pinned {
        if all_pinned.contains(field) || !columns.lookup.contains_key(field) {
            continue;
        }
        let preferred = before.iter().position(|existing| existing == field);
        place(&mut slots, preferred, field);
        placed.insert(field.as_str());
    }

    // Columns still pinned keep their remembered position. New ones use their current index.
    for field in all_pinned {
        let preferred = before
            .iter()
            .position(|existing| existing == field)
            .filter(|index| *index < slots.len())
            .or_else(|| columns.all.iter().position(|existing| existing == field));
        place(&mut slots, preferred, field);
        placed.insert(field.as_str());
    }

    for field in &columns.all {
        if !placed.contains(field.as_str()) {
            place(&mut slots, None, field);
        }
    }
    slots.into_iter().flatten().collect()
}

fn reorder_pinned_columns(
    cache: &mut PinningCache,
    pinned: &GridPinnedColumns,
    mut columns: GridColumnsState,
) -> GridColumnsState {
    let (left, right) = filter_columns(pinned, &columns.all);
    let all_pinned: Vec<String> = left.iter().chain(&right).cloned().collect();
    let ordered = match cache.ordered_fields_before_pinning.take() {
        Some(before) => restore_positions(&before, &cache.previous_pinned, &all_pinned, &columns),
        None => columns.all.clone(),
    };
    let center: Vec<String> = ordered
        .iter()
        .filter(|field| !all_pinned.contains(field))
        .cloned()
        .collect();
    cache.ordered_fields_before_pinning = Some(ordered);
    cache.previous_pinned = all_pinned;
    columns.all = left.into_iter().chain(center).chain(right).collect();
    columns
}

/// Replay a column move on the order before pinning.
///
/// The moved field is swapped step by step towards the field it now sits next to, jumping over
/// pinned fields.
fn move_in_order_before_pinning(
    ordered: &mut [String],
    field: &str,
    sibling: &str,
    forward: bool,
    is_pinned: impl Fn(&str) -> bool,
) {
    let (Some(mut i), Some(stop)) = (
        ordered.iter().position(|existing| existing == field),
        ordered.iter().position(|existing| existing == sibling),
    ) else {
        return;
    };
    let step = |index: usize| {
        if forward {
            index.checked_add(1)
        } else {
            index.checked_sub(1)
        }
    };
    let before_stop = |index: usize| if forward { index < stop } else { index > stop };
    while before_stop(i) {
        let mut j = step(i);
        while let Some(index) = j
            && index < ordered.len()
            && is_pinned(ordered[index].as_str())
        {
            j = step(index);
        }
        let Some(j) = j.filter(|index| *index < ordered.len()) else {
            return;
        };
        ordered.swap(i, j);
        i = j;
    }
}

fn scroll_left_with_pinned_columns(
    api: &GridApi,
    position: GridScrollPosition,
    col_index: usize,
) -> GridScrollPosition {
    let state = api.state();
    let selectors = api.selectors();
    let pinned = selectors.visible_pinned_columns.select(&state);
    if pinned.is_empty() {
        return position;
    }
    let columns = selectors.visible_columns.select(&state);
    let Some(column) = columns.get(col_index) else {
        return position;
    };
    if pinned_side(&pinned, &column.field).is_some() {
        return GridScrollPosition {
            left: None,
            ..position
        };
    }
    let positions = selectors.column_positions.select(&state);
    let total_width = *selectors.columns_total_width.select(&state);
    let position_at = |index: usize| positions.get(index).copied().unwrap_or(total_width);

    let dimensions = &state.dimensions;
    let offset_left = position_at(col_index);
    let offset_right = offset_left + column.computed_width;
    let left_pinned_width = position_at(pinned.left.len());
    let right_pinned_width =
        total_width - position_at(positions.len().saturating_sub(pinned.right.len()));

    let center_width = dimensions.viewport_width - right_pinned_width;
    if offset_right - center_width > dimensions.scroll_left {
        return GridScrollPosition {
            left: Some(offset_right - center_width),
            ..position
        };
    }
    if offset_left < dimensions.scroll_left + left_pinned_width {
        return GridScrollPosition {
            left: Some(offset_left - left_pinned_width),
            ..position
        };
    }
    position
}

fn pinned_columns(state: &GridState) -> &GridPinnedColumns {
    &state.pinned_columns
}

fn restore_pinned_columns(previous: &GridState, next: &GridState) -> GridState {
    GridState {
        pinned_columns: previous.pinned_columns.clone(),
        ..next.clone()
    }
}

fn pinned_columns_prop(props: &GridProps) -> Option<&GridPinnedColumns> {
    props.pinned_columns.as_ref()
}

fn on_pinned_columns_change(props: &GridProps) -> Option<&GridCallback<GridPinnedColumns>> {
    props.on_pinned_columns_change.as_ref()
}

fn pinned_columns_change(pinned: &GridPinnedColumns, _: Option<GridChangeReason>) -> GridEvent {
    GridEvent::PinnedColumnsChange {
        pinned_columns: pinned.clone(),
    }
}

/// Initialize the pinned columns and register the pinning processors.
///
/// Must run after the columns are registered.
pub fn register_column_pinning(api: &mut GridApi) -> Result<(), GridError> {
    let props = api.props().clone();
    let initial = if props.disable_column_pinning {
        GridPinnedColumns::default()
    } else {
        props
            .pinned_columns
            .clone()
            .or_else(|| {
                props
                    .initial_state
                    .as_ref()
                    .and_then(|state| state.pinned_columns.clone())
            })
            .unwrap_or_default()
    };
    api.initialize_state(|state| with_pinned_columns(state, initial));

    api.register_control_state(GridControlStateItem {
        state_id: "pinnedColumns",
        state_selector: pinned_columns,
        restore_previous: restore_pinned_columns,
        prop_model: pinned_columns_prop,
        prop_on_change: on_pinned_columns_change,
        change_event: pinned_columns_change,
    });

    let cache = Rc::new(RefCell::new(PinningCache::default()));

    {
        let cache = cache.clone();
        api.register_pipe_processor::<HydrateColumns>(GROUP, move |api, columns, _| {
            if columns.all.is_empty() || api.props().disable_column_pinning {
                return columns;
            }
            reorder_pinned_columns(
                &mut cache.borrow_mut(),
                &api.state_ref().pinned_columns,
                columns,
            )
        });
    }

    api.subscribe_event(GridEventName::ColumnOrderChange, move |api, event, _| {
        let GridEvent::ColumnOrderChange {
            field,
            target_index,
            old_index,
        } = event
        else {
            return Ok(());
        };
        let mut cache = cache.borrow_mut();
        let Some(ordered) = cache.ordered_fields_before_pinning.as_mut() else {
            return Ok(());
        };
        let forward = target_index > old_index;
        let sibling_index = if forward {
            target_index.checked_sub(1)
        } else {
            target_index.checked_add(1)
        };
        let Some(sibling) = sibling_index.and_then(|index| api.state_ref().columns.all.get(index))
        else {
            return Ok(());
        };
        let pinned = api.state_ref().pinned_columns.clone();
        move_in_order_before_pinning(ordered, field, sibling, forward, |candidate| {
            pinned_side(&pinned, candidate).is_some()
        });
        Ok(())
    });

    api.register_pipe_processor::<ScrollToIndexes>(GROUP, |api, position, coordinates| {
        if api.props().disable_column_pinning {
            return position;
        }
        // The first column keeps the default scroll, pinned or not.
        match coordinates.col_index {
            Some(col_index) if col_index > 0 => {
                scroll_left_with_pinned_columns(api, position, col_index)
            }
            _ => position,
        }
    });

    api.register_pipe_processor::<ColumnMenu>(GROUP, |api, mut items, column| {
        if api.props().disable_column_pinning || !column.pinnable {
            return items;
        }
        items.push(GridColumnMenuItem::Divider);
        match api.is_column_pinned(&column.field) {
            Some(GridPinnedPosition::Left) => {
                items.extend([GridColumnMenuItem::PinToRight, GridColumnMenuItem::Unpin]);
            }
            Some(GridPinnedPosition::Right) => {
                items.extend([GridColumnMenuItem::PinToLeft, GridColumnMenuItem::Unpin]);
            }
            None => {
                items.extend([GridColumnMenuItem::PinToLeft, GridColumnMenuItem::PinToRight]);
            }
        }
        items
    });

    api.register_pipe_processor::<CanBeReordered>(GROUP, |api, can_be_reordered, params| {
        let state = api.state();
        let pinned = api.selectors().visible_pinned_columns.select(&state);
        if !pinned.left.is_empty() && params.target_index < pinned.left.len() {
            return false;
        }
        if !pinned.right.is_empty() {
            let visible_count = api.selectors().visible_columns.select(&state).len();
            let first_right_pinned_index = visible_count.saturating_sub(pinned.right.len());
            if params.target_index >= first_right_pinned_index {
                return false;
            }
        }
        can_be_reordered
    });

    api.register_pipe_processor::<ExportState>(GROUP, |api, state: GridInitialState, _| {
        let pinned = api.get_pinned_columns();
        if pinned.is_empty() {
            return state;
        }
        GridInitialState {
            pinned_columns: Some(pinned),
            ..state
        }
    });

    api.register_pipe_processor::<RestoreState>(GROUP, |_, mut value, context| {
        let Some(pinned) = context.pinned_columns.clone() else {
            return value;
        };
        value
            .state_updates
            .push(Box::new(move |state: &mut GridState| {
                *state = with_pinned_columns(state, pinned);
            }));
        value.callbacks.push(Box::new(|api: &mut GridApi| {
            api.request_pipe_processors_application::<HydrateColumns>()
        }));
        value
    });

    api.register_props_effect(GROUP, |api, previous| {
        let props = api.props().clone();
        if let Some(pinned) = props.pinned_columns
            && previous.pinned_columns.as_ref() != Some(&pinned)
        {
            api.set_pinned_columns(pinned)?;
        }
        if previous.disable_column_pinning != props.disable_column_pinning {
            api.request_pipe_processors_application::<HydrateColumns>()?;
        }
        Ok(())
    });
    Ok(())
}
