//! Columns: definitions, display order, visibility and widths.
//!
//! The columns slice keeps the resolved column of every field, the display order of all fields
//! and the visibility model. The visibility model is the only source of truth for visibility:
//! the legacy [`GridColDef::hide`] flag only seeds it while no model was ever provided.
//!
//! Whenever the set of columns changes, the slice is rebuilt and goes through the
//! `hydrateColumns` pipe (where pinning moves pinned columns to the edges), then through width
//! hydration (min/max clamping and flex distribution over the viewport width).

use crate::api::GridApi;
use crate::col_def::{GridColDef, GridStateColDef};
use crate::control_state::GridControlStateItem;
use crate::error::GridError;
use crate::events::GridEvent;
use crate::pipe_processing::{
    CanBeReordered, ExportState, GridCanBeReorderedParams, HydrateColumns, RestoreState,
};
use crate::props::{
    GridCallback, GridChangeReason, GridColumnDimensions, GridColumnsInitialState,
    GridInitialState, GridProps,
};
use crate::state::GridState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

const GROUP: &str = "columns";

/// Visibility by field. A field absent from the model is visible.
pub type GridColumnVisibilityModel = BTreeMap<String, bool>;

/// Columns pinned to each edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridPinnedColumns {
    /// Fields pinned to the left edge, in display order.
    pub left: Vec<String>,
    /// Fields pinned to the right edge, in display order.
    pub right: Vec<String>,
}

impl GridPinnedColumns {
    /// Whether no column is pinned.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// Edge a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridPinnedPosition {
    /// Left edge.
    Left,
    /// Right edge.
    Right,
}

/// Restrict pinned columns to existing fields.
///
/// Fields pinned to both sides stay on the left. Unknown fields are tolerated in the state and
/// dropped here.
pub fn filter_columns(
    pinned: &GridPinnedColumns,
    fields: &[String],
) -> (Vec<String>, Vec<String>) {
    let existing: HashSet<&str> = fields.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let left: Vec<String> = pinned
        .left
        .iter()
        .filter(|field| existing.contains(field.as_str()) && seen.insert(field.as_str()))
        .cloned()
        .collect();
    let right = pinned
        .right
        .iter()
        .filter(|field| existing.contains(field.as_str()) && seen.insert(field.as_str()))
        .cloned()
        .collect();
    (left, right)
}

/// Columns slice.
#[derive(Debug, Clone, Default)]
pub struct GridColumnsState {
    /// Every field, in display order.
    pub all: Vec<String>,
    /// Resolved columns by field.
    pub lookup: HashMap<String, GridStateColDef>,
    /// Visibility model.
    pub column_visibility_model: GridColumnVisibilityModel,
    /// Whether the visibility model was provided (prop, initial state or API) rather than
    /// seeded from `hide`.
    pub is_visibility_model_provided: bool,
}

impl GridColumnsState {
    /// Resolved column of a field.
    pub fn column(&self, field: &str) -> Option<&GridStateColDef> {
        self.lookup.get(field)
    }

    /// Whether a field is visible.
    pub fn is_visible(&self, field: &str) -> bool {
        self.column_visibility_model.get(field) != Some(&false)
    }

    /// Visible fields, in display order.
    pub fn visible_fields(&self) -> Vec<String> {
        self.all
            .iter()
            .filter(|field| self.is_visible(field))
            .cloned()
            .collect()
    }

    fn seed_visibility_from_hide(&mut self) {
        if self.is_visibility_model_provided {
            return;
        }
        self.column_visibility_model = self
            .all
            .iter()
            .filter_map(|field| self.lookup.get(field))
            .filter(|column| column.hide == Some(true))
            .map(|column| (column.field.clone(), false))
            .collect();
    }

    /// Move the listed fields first, in the listed order. Unknown fields are ignored.
    fn apply_ordered_fields(&mut self, ordered_fields: &[String]) {
        let mut all: Vec<String> = Vec::with_capacity(self.all.len());
        for field in ordered_fields {
            if self.lookup.contains_key(field) && !all.contains(field) {
                all.push(field.clone());
            }
        }
        for field in &self.all {
            if !all.contains(field) {
                all.push(field.clone());
            }
        }
        self.all = all;
    }

    fn apply_dimensions(&mut self, dimensions: &BTreeMap<String, GridColumnDimensions>) {
        for (field, dimensions) in dimensions {
            let Some(column) = self.lookup.get_mut(field) else {
                tracing::warn!("ignoring dimensions of unknown column {}", field);
                continue;
            };
            let def = column.def_mut();
            if dimensions.width.is_some() {
                def.width = dimensions.width;
            }
            def.flex = dimensions.flex;
            if dimensions.min_width.is_some() {
                def.min_width = dimensions.min_width;
            }
            if dimensions.max_width.is_some() {
                def.max_width = dimensions.max_width;
            }
            column.has_been_resized = dimensions.width.is_some() || dimensions.flex.is_some();
        }
    }
}

/// Rebuild the slice from column definitions.
///
/// With `keep_only_definitions`, the result holds exactly the given columns in the given order;
/// otherwise the definitions are upserted into the existing columns and new fields are appended.
/// Existing columns keep the dimensions the user set.
pub fn create_columns_state(
    previous: &GridColumnsState,
    defs: &[GridColDef],
    keep_only_definitions: bool,
) -> GridColumnsState {
    let mut next = if keep_only_definitions {
        GridColumnsState {
            column_visibility_model: previous.column_visibility_model.clone(),
            is_visibility_model_provided: previous.is_visibility_model_provided,
            ..GridColumnsState::default()
        }
    } else {
        previous.clone()
    };
    for def in defs {
        let column = match previous.lookup.get(&def.field) {
            Some(existing) => existing.upsert(def.clone()),
            None => GridStateColDef::resolve(def.clone()),
        };
        if !next.lookup.contains_key(&def.field) {
            next.all.push(def.field.clone());
        }
        next.lookup.insert(def.field.clone(), column);
    }
    next.seed_visibility_from_hide();
    next
}

fn clamp_width(column: &GridStateColDef, width: f64) -> f64 {
    width.max(column.min_width()).min(column.max_width())
}

/// Compute the width of every column.
///
/// Columns without flex get their width clamped to their bounds. When the viewport has room
/// left, visible flex columns share it in proportion to their flex factor.
pub fn hydrate_column_widths(
    mut columns: GridColumnsState,
    viewport_width: f64,
) -> GridColumnsState {
    let visible = columns.visible_fields();
    let mut total_flex = 0.0;
    let mut allocated = 0.0;
    let mut flex_fields = Vec::new();
    for field in &columns.all {
        let Some(column) = columns.lookup.get_mut(field) else {
            continue;
        };
        let is_visible = visible.contains(field);
        match column.flex {
            Some(flex) if flex > 0.0 && is_visible => {
                total_flex += flex;
                flex_fields.push(field.clone());
            }
            _ => {
                column.computed_width = clamp_width(column, column.width());
                if is_visible {
                    allocated += column.computed_width;
                }
            }
        }
    }
    let per_flex_unit = if viewport_width > 0.0 && total_flex > 0.0 {
        Some(((viewport_width - allocated) / total_flex).max(0.0))
    } else {
        None
    };
    for field in flex_fields {
        if let Some(column) = columns.lookup.get_mut(&field) {
            let width = match (per_flex_unit, column.flex) {
                (Some(per_unit), Some(flex)) => (flex * per_unit).max(column.min_width()),
                _ => column.width(),
            };
            column.computed_width = clamp_width(column, width);
        }
    }
    columns
}

fn with_columns(state: &GridState, columns: GridColumnsState) -> GridState {
    GridState {
        columns: Rc::new(columns),
        ..state.clone()
    }
}

fn column_visibility_model(state: &GridState) -> &GridColumnVisibilityModel {
    &state.columns.column_visibility_model
}

fn restore_column_visibility_model(previous: &GridState, next: &GridState) -> GridState {
    with_columns(
        next,
        GridColumnsState {
            column_visibility_model: previous.columns.column_visibility_model.clone(),
            is_visibility_model_provided: previous.columns.is_visibility_model_provided,
            ..(*next.columns).clone()
        },
    )
}

fn column_visibility_model_prop(props: &GridProps) -> Option<&GridColumnVisibilityModel> {
    props.column_visibility_model.as_ref()
}

fn on_column_visibility_model_change(
    props: &GridProps,
) -> Option<&GridCallback<GridColumnVisibilityModel>> {
    props.on_column_visibility_model_change.as_ref()
}

fn column_visibility_model_change(
    model: &GridColumnVisibilityModel,
    _: Option<GridChangeReason>,
) -> GridEvent {
    GridEvent::ColumnVisibilityModelChange {
        model: model.clone(),
    }
}

impl GridApi {
    /// Resolved column of a field.
    pub fn get_column(&self, field: &str) -> Option<&GridStateColDef> {
        self.state_ref().columns.column(field)
    }

    /// Every column, in display order.
    pub fn get_all_columns(&self) -> Vec<GridStateColDef> {
        let columns = &self.state_ref().columns;
        columns
            .all
            .iter()
            .filter_map(|field| columns.column(field).cloned())
            .collect()
    }

    /// Visible columns, in display order.
    pub fn get_visible_columns(&self) -> Rc<Vec<GridStateColDef>> {
        self.selectors().visible_columns.select(self.state_ref())
    }

    /// Index of a column among all columns, or among visible columns.
    pub fn get_column_index(&self, field: &str, use_visible_columns: bool) -> Option<usize> {
        if use_visible_columns {
            self.get_visible_columns()
                .iter()
                .position(|column| column.field == field)
        } else {
            self.state_ref().columns.all.iter().position(|all| all == field)
        }
    }

    /// Left offset of a visible column.
    pub fn get_column_position(&self, field: &str) -> Option<f64> {
        let index = self.get_column_index(field, true)?;
        let positions = self.selectors().column_positions.select(self.state_ref());
        positions.get(index).copied()
    }

    /// Current visibility model.
    pub fn get_column_visibility_model(&self) -> GridColumnVisibilityModel {
        self.state_ref().columns.column_visibility_model.clone()
    }

    /// Replace every column with the given definitions.
    pub fn set_columns(&mut self, defs: Vec<GridColDef>) -> Result<(), GridError> {
        let columns = create_columns_state(&self.state().columns, &defs, true);
        self.commit_columns(columns)
    }

    /// Upsert column definitions, appending new fields.
    pub fn update_columns(&mut self, defs: Vec<GridColDef>) -> Result<(), GridError> {
        let columns = create_columns_state(&self.state().columns, &defs, false);
        self.commit_columns(columns)
    }

    fn commit_columns(&mut self, columns: GridColumnsState) -> Result<(), GridError> {
        let columns = self.hydrated(columns);
        let fields = columns.all.clone();
        tracing::debug!("updating columns: {:?}", fields);
        self.set_state(|state| with_columns(state, columns));
        self.publish_event(GridEvent::ColumnsChange { fields });
        Ok(())
    }

    fn hydrated(&self, columns: GridColumnsState) -> GridColumnsState {
        let columns = self.apply_pipe_processors::<HydrateColumns>(columns, &());
        hydrate_column_widths(columns, self.state_ref().dimensions.viewport_width)
    }

    /// Run the `hydrateColumns` pipe and width hydration on the current columns.
    pub fn hydrate_columns(&mut self) -> Result<(), GridError> {
        let columns = self.hydrated((*self.state().columns).clone());
        self.set_state(|state| with_columns(state, columns));
        Ok(())
    }

    /// Recompute the column widths, e.g. after a viewport resize.
    pub fn hydrate_column_widths(&mut self) {
        let viewport_width = self.state_ref().dimensions.viewport_width;
        let columns = hydrate_column_widths((*self.state().columns).clone(), viewport_width);
        self.set_state(|state| with_columns(state, columns));
    }

    /// Move a column to `target_index` among all columns and publish `columnOrderChange`.
    pub fn set_column_index(&mut self, field: &str, target_index: usize) -> Result<(), GridError> {
        let mut all = self.state().columns.all.clone();
        let old_index = all
            .iter()
            .position(|existing| existing == field)
            .ok_or_else(|| GridError::ColumnNotFound(field.to_string()))?;
        let target_index = target_index.min(all.len().saturating_sub(1));
        if old_index == target_index {
            return Ok(());
        }
        tracing::debug!("moving column {} to index {}", field, target_index);
        let moved = all.remove(old_index);
        all.insert(target_index, moved);
        self.set_state(|state| {
            with_columns(
                state,
                GridColumnsState {
                    all,
                    ..(*state.columns).clone()
                },
            )
        });
        self.publish_event(GridEvent::ColumnOrderChange {
            field: field.to_string(),
            target_index,
            old_index,
        });
        Ok(())
    }

    /// Whether a column may be dropped at `target_index` among the visible columns.
    pub fn can_column_be_reordered(&self, field: &str, target_index: usize) -> bool {
        if self.props().disable_column_reorder {
            return false;
        }
        match self.get_column(field) {
            Some(column) if !column.disable_reorder => self.apply_pipe_processors::<CanBeReordered>(
                true,
                &GridCanBeReorderedParams {
                    field: field.to_string(),
                    target_index,
                },
            ),
            _ => false,
        }
    }

    /// Resize a column. The column stops flexing and keeps this width across updates.
    pub fn set_column_width(&mut self, field: &str, width: f64) -> Result<(), GridError> {
        let mut columns = (*self.state().columns).clone();
        let column = columns
            .lookup
            .get_mut(field)
            .ok_or_else(|| GridError::ColumnNotFound(field.to_string()))?;
        let def = column.def_mut();
        def.width = Some(width);
        def.flex = None;
        column.has_been_resized = true;
        column.computed_width = clamp_width(column, width);
        let width = column.computed_width;
        let columns = hydrate_column_widths(columns, self.state_ref().dimensions.viewport_width);
        self.set_state(|state| with_columns(state, columns));
        self.publish_event(GridEvent::ColumnWidthChange {
            field: field.to_string(),
            width,
        });
        Ok(())
    }

    /// Replace the visibility model.
    pub fn set_column_visibility_model(&mut self, model: GridColumnVisibilityModel) {
        let committed = self.set_state(|state| {
            with_columns(
                state,
                GridColumnsState {
                    column_visibility_model: model,
                    is_visibility_model_provided: true,
                    ..(*state.columns).clone()
                },
            )
        });
        if committed {
            self.hydrate_column_widths();
        }
    }

    /// Show or hide one column. Does nothing if the column already has that visibility.
    pub fn set_column_visibility(&mut self, field: &str, is_visible: bool) {
        let columns = self.state().columns.clone();
        if columns.is_visible(field) == is_visible {
            return;
        }
        let mut model = columns.column_visibility_model.clone();
        model.insert(field.to_string(), is_visible);
        self.set_column_visibility_model(model);
    }
}

fn export_columns(api: &GridApi) -> Option<GridColumnsInitialState> {
    let columns = &api.state_ref().columns;
    let definition_order: Vec<&str> = api
        .props()
        .columns
        .iter()
        .map(|def| def.field.as_str())
        .collect();
    let ordered_fields = (columns.all.iter().map(String::as_str).collect::<Vec<_>>()
        != definition_order)
        .then(|| columns.all.clone());
    let dimensions: BTreeMap<String, GridColumnDimensions> = columns
        .all
        .iter()
        .filter_map(|field| columns.column(field))
        .filter(|column| column.has_been_resized)
        .map(|column| {
            (
                column.field.clone(),
                GridColumnDimensions {
                    width: column.width,
                    flex: column.flex,
                    min_width: column.min_width,
                    max_width: column.max_width,
                },
            )
        })
        .collect();
    let exported = GridColumnsInitialState {
        column_visibility_model: (!columns.column_visibility_model.is_empty())
            .then(|| columns.column_visibility_model.clone()),
        ordered_fields,
        dimensions: (!dimensions.is_empty()).then_some(dimensions),
    };
    (exported != GridColumnsInitialState::default()).then_some(exported)
}

/// Build the columns slice from the props and register the columns handlers.
pub fn register_columns(api: &mut GridApi) -> Result<(), GridError> {
    let props = api.props().clone();
    let initial = props
        .initial_state
        .as_ref()
        .and_then(|state| state.columns.clone())
        .unwrap_or_default();

    let mut columns = GridColumnsState::default();
    if let Some(model) = props
        .column_visibility_model
        .clone()
        .or(initial.column_visibility_model)
    {
        columns.column_visibility_model = model;
        columns.is_visibility_model_provided = true;
    }
    let mut columns = create_columns_state(&columns, &props.columns, true);
    if let Some(ordered_fields) = &initial.ordered_fields {
        columns.apply_ordered_fields(ordered_fields);
    }
    if let Some(dimensions) = &initial.dimensions {
        columns.apply_dimensions(dimensions);
    }
    let columns = hydrate_column_widths(columns, api.state_ref().dimensions.viewport_width);
    api.initialize_state(|state| with_columns(state, columns));

    api.register_control_state(GridControlStateItem {
        state_id: "columnVisibilityModel",
        state_selector: column_visibility_model,
        restore_previous: restore_column_visibility_model,
        prop_model: column_visibility_model_prop,
        prop_on_change: on_column_visibility_model_change,
        change_event: column_visibility_model_change,
    });

    api.register_pipe_applier::<HydrateColumns>(GROUP, |api| api.hydrate_columns());

    api.register_pipe_processor::<ExportState>(GROUP, |api, state: GridInitialState, _| {
        GridInitialState {
            columns: export_columns(api),
            ..state
        }
    });

    api.register_pipe_processor::<RestoreState>(GROUP, |_, mut value, context| {
        let Some(restored) = context.columns.clone() else {
            return value;
        };
        value.state_updates.push(Box::new(move |state: &mut GridState| {
            let mut columns = (*state.columns).clone();
            if let Some(model) = restored.column_visibility_model {
                columns.column_visibility_model = model;
                columns.is_visibility_model_provided = true;
            }
            if let Some(ordered_fields) = &restored.ordered_fields {
                columns.apply_ordered_fields(ordered_fields);
            }
            if let Some(dimensions) = &restored.dimensions {
                columns.apply_dimensions(dimensions);
            }
            state.columns = Rc::new(columns);
        }));
        value
            .callbacks
            .push(Box::new(|api: &mut GridApi| api.hydrate_columns()));
        value
    });

    api.register_props_effect(GROUP, |api, previous| {
        let props = api.props().clone();
        if !Rc::ptr_eq(&previous.columns, &props.columns) {
            api.set_columns((*props.columns).clone())?;
        }
        if let Some(model) = props.column_visibility_model
            && previous.column_visibility_model.as_ref() != Some(&model)
        {
            api.set_column_visibility_model(model);
        }
        Ok(())
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_filter_columns_drops_unknown_and_duplicated_fields() {
        let pinned = GridPinnedColumns {
            left: fields(&["a", "missing", "b"]),
            right: fields(&["b", "c"]),
        };
        let (left, right) = filter_columns(&pinned, &fields(&["a", "b", "c"]));
        assert_eq!(left, fields(&["a", "b"]));
        assert_eq!(right, fields(&["c"]));
    }

    #[test]
    fn test_hide_seeds_visibility_until_a_model_is_provided() {
        let mut hidden = GridColDef::new("b");
        hidden.hide = Some(true);
        let columns = create_columns_state(
            &GridColumnsState::default(),
            &[GridColDef::new("a"), hidden.clone()],
            true,
        );
        assert_eq!(columns.visible_fields(), fields(&["a"]));

        let provided = GridColumnsState {
            is_visibility_model_provided: true,
            ..GridColumnsState::default()
        };
        let columns = create_columns_state(&provided, &[GridColDef::new("a"), hidden], true);
        assert_eq!(columns.visible_fields(), fields(&["a", "b"]));
    }

    #[test]
    fn test_flex_columns_share_remaining_width() {
        let columns = create_columns_state(
            &GridColumnsState::default(),
            &[
                GridColDef::new("fixed").with_width(200.0),
                GridColDef::new("one").with_flex(1.0),
                GridColDef::new("three").with_flex(3.0),
            ],
            true,
        );
        let columns = hydrate_column_widths(columns, 600.0);
        assert_eq!(columns.lookup["fixed"].computed_width, 200.0);
        assert_eq!(columns.lookup["one"].computed_width, 100.0);
        assert_eq!(columns.lookup["three"].computed_width, 300.0);

        // Without room left, flex columns fall back to their minimum width.
        let columns = hydrate_column_widths(columns, 150.0);
        assert_eq!(columns.lookup["one"].computed_width, 50.0);
    }
}
