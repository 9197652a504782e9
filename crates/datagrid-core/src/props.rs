//! Grid configuration.
//!
//! [`GridProps`] carries everything the host hands to one grid instance: the rows, the column
//! definitions, the initial state, every controllable model with its change callback, the modes,
//! the flags and the user callbacks. It is built with struct-update syntax over
//! [`GridProps::default`] and replaced at runtime through
//! [`GridApi::set_props`](crate::GridApi::set_props).
//!
//! [`GridInitialState`] is the serializable shape used both for the initial state and for
//! [`GridApi::export_state`](crate::GridApi::export_state).

use crate::col_def::{GridColDef, GridSortDirection};
use crate::error::GridError;
use crate::features::columns::{GridColumnVisibilityModel, GridPinnedColumns};
use crate::features::filter::GridFilterModel;
use crate::features::preference_panel::GridPreferencePanelState;
use crate::features::sorting::GridSortModel;
use crate::value::{GridRowId, GridRowModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Why a model changed, handed to change callbacks and change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridChangeReason {
    /// One filter item was added or updated.
    UpsertFilterItem,
    /// Several filter items were added or updated.
    UpsertFilterItems,
    /// One filter item was removed.
    DeleteFilterItem,
    /// The filter link operator changed.
    ChangeLogicOperator,
    /// The state was restored.
    RestoreState,
}

impl GridChangeReason {
    /// Public reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            GridChangeReason::UpsertFilterItem => "upsertFilterItem",
            GridChangeReason::UpsertFilterItems => "upsertFilterItems",
            GridChangeReason::DeleteFilterItem => "deleteFilterItem",
            GridChangeReason::ChangeLogicOperator => "changeLogicOperator",
            GridChangeReason::RestoreState => "restoreState",
        }
    }
}

impl fmt::Display for GridChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra information handed to change callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridCallbackDetails {
    /// Why the model changed.
    pub reason: Option<GridChangeReason>,
}

/// Change callback of a controllable model.
pub type GridCallback<T> = Rc<dyn Fn(&T, &GridCallbackDetails)>;

/// Where a feature runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridFeatureMode {
    /// Computed by the grid.
    #[default]
    Client,
    /// Computed by the host; the grid displays what it receives.
    Server,
}

/// Resolves the id of a row.
pub type GridRowIdGetter = Rc<dyn Fn(&GridRowModel) -> Option<GridRowId>>;

/// Commits an edited row. Receives the new row and the row before edition.
pub type GridProcessRowUpdate =
    Rc<dyn Fn(&GridRowModel, &GridRowModel) -> Result<GridRowModel, GridError>>;

/// Receives errors.
pub type GridErrorHandler = Rc<dyn Fn(&GridError)>;

/// Path of a row in a tree.
pub type GridTreeDataPathGetter = Rc<dyn Fn(&GridRowModel) -> Vec<String>>;

/// Callback of the infinite loader.
pub type GridRowsScrollEndHandler = Rc<dyn Fn(&GridRowsScrollEndParams)>;

/// Parameters of `on_rows_scroll_end`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRowsScrollEndParams {
    /// Number of rows fitting in the viewport.
    pub viewport_page_size: usize,
    /// Number of rows displayed.
    pub virtual_row_count: usize,
    /// Fields of the visible columns.
    pub visible_columns: Vec<String>,
}

/// Default sort cycle.
pub fn default_sorting_order() -> Vec<Option<GridSortDirection>> {
    vec![
        Some(GridSortDirection::Asc),
        Some(GridSortDirection::Desc),
        None,
    ]
}

/// Props of one grid instance.
#[derive(Clone)]
pub struct GridProps {
    /// Row models.
    pub rows: Rc<Vec<GridRowModel>>,
    /// Column definitions.
    pub columns: Rc<Vec<GridColDef>>,
    /// Row id accessor. Defaults to the `id` field.
    pub get_row_id: Option<GridRowIdGetter>,
    /// State applied at construction.
    pub initial_state: Option<GridInitialState>,

    /// Controlled filter model.
    pub filter_model: Option<GridFilterModel>,
    /// Filter model change callback.
    pub on_filter_model_change: Option<GridCallback<GridFilterModel>>,
    /// Filtering mode.
    pub filter_mode: GridFeatureMode,
    /// Keep at most one filter item.
    pub disable_multiple_column_filtering: bool,
    /// Disable filtering from the column menu.
    pub disable_column_filter: bool,

    /// Controlled sort model.
    pub sort_model: Option<GridSortModel>,
    /// Sort model change callback.
    pub on_sort_model_change: Option<GridCallback<GridSortModel>>,
    /// Sorting mode.
    pub sorting_mode: GridFeatureMode,
    /// Sort cycle applied on header clicks.
    pub sorting_order: Vec<Option<GridSortDirection>>,
    /// Keep at most one sort item.
    pub disable_multiple_column_sorting: bool,

    /// Controlled column visibility model.
    pub column_visibility_model: Option<GridColumnVisibilityModel>,
    /// Column visibility model change callback.
    pub on_column_visibility_model_change: Option<GridCallback<GridColumnVisibilityModel>>,
    /// Hide the column management items from the column menu.
    pub disable_column_selector: bool,
    /// Forbid column reordering.
    pub disable_column_reorder: bool,

    /// Controlled pinned columns.
    pub pinned_columns: Option<GridPinnedColumns>,
    /// Pinned columns change callback.
    pub on_pinned_columns_change: Option<GridCallback<GridPinnedColumns>>,
    /// Disable column pinning.
    pub disable_column_pinning: bool,

    /// Split the rows in pages.
    pub pagination: bool,
    /// Pagination mode.
    pub pagination_mode: GridFeatureMode,
    /// Total row count in server mode.
    pub row_count: Option<usize>,
    /// Controlled page.
    pub page: Option<usize>,
    /// Page change callback.
    pub on_page_change: Option<GridCallback<usize>>,
    /// Controlled page size.
    pub page_size: Option<usize>,
    /// Page size change callback.
    pub on_page_size_change: Option<GridCallback<usize>>,

    /// Height of every row.
    pub row_height: f64,
    /// Distance from the bottom below which `rowsScrollEnd` fires.
    pub scroll_end_threshold: f64,
    /// Infinite loader callback.
    pub on_rows_scroll_end: Option<GridRowsScrollEndHandler>,

    /// Commits edited rows.
    pub process_row_update: Option<GridProcessRowUpdate>,
    /// Receives `process_row_update` failures.
    pub on_process_row_update_error: Option<GridErrorHandler>,

    /// Build a tree from `get_tree_data_path`.
    pub tree_data: bool,
    /// Path of each row in the tree.
    pub get_tree_data_path: Option<GridTreeDataPathGetter>,
    /// Depth down to which groups start expanded. `-1` expands everything.
    pub default_grouping_expansion_depth: i32,
    /// Filter only the top-level rows of a tree.
    pub disable_children_filtering: bool,
    /// Sort only the top-level rows of a tree.
    pub disable_children_sorting: bool,

    /// Receives errors raised by event handlers and deferred tasks.
    pub on_error: Option<GridErrorHandler>,
}

impl Default for GridProps {
    fn default() -> Self {
        Self {
            rows: Rc::new(Vec::new()),
            columns: Rc::new(Vec::new()),
            get_row_id: None,
            initial_state: None,
            filter_model: None,
            on_filter_model_change: None,
            filter_mode: GridFeatureMode::Client,
            disable_multiple_column_filtering: false,
            disable_column_filter: false,
            sort_model: None,
            on_sort_model_change: None,
            sorting_mode: GridFeatureMode::Client,
            sorting_order: default_sorting_order(),
            disable_multiple_column_sorting: false,
            column_visibility_model: None,
            on_column_visibility_model_change: None,
            disable_column_selector: false,
            disable_column_reorder: false,
            pinned_columns: None,
            on_pinned_columns_change: None,
            disable_column_pinning: false,
            pagination: false,
            pagination_mode: GridFeatureMode::Client,
            row_count: None,
            page: None,
            on_page_change: None,
            page_size: None,
            on_page_size_change: None,
            row_height: 52.0,
            scroll_end_threshold: 80.0,
            on_rows_scroll_end: None,
            process_row_update: None,
            on_process_row_update_error: None,
            tree_data: false,
            get_tree_data_path: None,
            default_grouping_expansion_depth: 0,
            disable_children_filtering: false,
            disable_children_sorting: false,
            on_error: None,
        }
    }
}

impl GridProps {
    /// Props for the given rows and columns.
    pub fn new(rows: Vec<GridRowModel>, columns: Vec<GridColDef>) -> Self {
        Self {
            rows: Rc::new(rows),
            columns: Rc::new(columns),
            ..Self::default()
        }
    }
}

impl fmt::Debug for GridProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridProps")
            .field("rows", &self.rows.len())
            .field("columns", &self.columns)
            .field("filter_model", &self.filter_model)
            .field("filter_mode", &self.filter_mode)
            .field("sort_model", &self.sort_model)
            .field("sorting_mode", &self.sorting_mode)
            .field("column_visibility_model", &self.column_visibility_model)
            .field("pinned_columns", &self.pinned_columns)
            .field("pagination", &self.pagination)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("tree_data", &self.tree_data)
            .finish_non_exhaustive()
    }
}

/// Stored dimensions of one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridColumnDimensions {
    /// Width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Flex factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex: Option<f64>,
    /// Minimum width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    /// Maximum width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
}

/// Column part of the initial state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridColumnsInitialState {
    /// Visibility model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_visibility_model: Option<GridColumnVisibilityModel>,
    /// Display order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_fields: Option<Vec<String>>,
    /// Dimensions by field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<BTreeMap<String, GridColumnDimensions>>,
}

/// Filter part of the initial state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridFilterInitialState {
    /// Filter model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_model: Option<GridFilterModel>,
}

/// Sorting part of the initial state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSortingInitialState {
    /// Sort model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_model: Option<GridSortModel>,
}

/// Pagination part of the initial state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPaginationInitialState {
    /// Current page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

/// Initial or exported state, keyed by feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridInitialState {
    /// Columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<GridColumnsInitialState>,
    /// Filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<GridFilterInitialState>,
    /// Sorting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<GridSortingInitialState>,
    /// Pagination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<GridPaginationInitialState>,
    /// Pinned columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_columns: Option<GridPinnedColumns>,
    /// Preference panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference_panel: Option<GridPreferencePanelState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_serializes_camel_case_and_skips_absent_slices() {
        let state = GridInitialState {
            pagination: Some(GridPaginationInitialState {
                page: Some(2),
                page_size: None,
            }),
            pinned_columns: Some(GridPinnedColumns {
                left: vec!["name".into()],
                right: vec![],
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"pagination":{"page":2},"pinnedColumns":{"left":["name"],"right":[]}}"#
        );
        let back: GridInitialState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
