//! Column menu content.
//!
//! The core computes the base items from the column flags and the props, then the `columnMenu`
//! pipe lets other features append theirs (pinning adds a divider and its pin items).

use crate::api::GridApi;
use crate::col_def::GridStateColDef;
use crate::error::GridError;
use crate::pipe_processing::ColumnMenu;

/// Items of a column menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridColumnMenuItem {
    /// Remove the sort of the column.
    Unsort,
    /// Sort ascending.
    SortAsc,
    /// Sort descending.
    SortDesc,
    /// Open the filter panel on the column.
    Filter,
    /// Hide the column.
    HideColumn,
    /// Open the column management panel.
    ManageColumns,
    /// Visual separator.
    Divider,
    /// Pin to the left edge.
    PinToLeft,
    /// Pin to the right edge.
    PinToRight,
    /// Unpin.
    Unpin,
}

impl GridApi {
    fn base_column_menu_items(&self, column: &GridStateColDef) -> Vec<GridColumnMenuItem> {
        let props = self.props();
        let mut items = Vec::new();
        if column.sortable {
            items.extend([
                GridColumnMenuItem::Unsort,
                GridColumnMenuItem::SortAsc,
                GridColumnMenuItem::SortDesc,
            ]);
        }
        if column.filterable && !props.disable_column_filter {
            items.push(GridColumnMenuItem::Filter);
        }
        if !props.disable_column_selector {
            if column.hideable {
                items.push(GridColumnMenuItem::HideColumn);
            }
            items.push(GridColumnMenuItem::ManageColumns);
        }
        items
    }

    /// Items of the menu of a column. Empty when the column disables its menu.
    pub fn get_column_menu_items(
        &self,
        field: &str,
    ) -> Result<Vec<GridColumnMenuItem>, GridError> {
        let column = self
            .get_column(field)
            .cloned()
            .ok_or_else(|| GridError::ColumnNotFound(field.to_string()))?;
        if column.disable_column_menu {
            return Ok(Vec::new());
        }
        let items = self.base_column_menu_items(&column);
        Ok(self.apply_pipe_processors::<ColumnMenu>(items, &column))
    }
}
