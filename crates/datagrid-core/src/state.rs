//! Grid state snapshot and store.
//!
//! # Overview
//!
//! The whole state of one grid instance lives in a single immutable [`GridState`] value. Each
//! feature owns one slice, stored behind an [`Rc`]. Updates never mutate a snapshot in place:
//! every committed update produces a new top-level value that shares the untouched slices with
//! the previous one, so selectors can detect changes with pointer comparisons.
//!
//! ```rust
//! use datagrid_core::state::{GridState, GridStore};
//! use datagrid_core::GridPaginationState;
//! use std::rc::Rc;
//!
//! let mut store = GridStore::new(GridState::default());
//! let before = store.state();
//! store.replace(GridState {
//!     pagination: Rc::new(GridPaginationState { page: 2, page_size: 25 }),
//!     ..(*before).clone()
//! });
//!
//! assert!(store.has_changed_since(0));
//! assert!(Rc::ptr_eq(&before.filter, &store.state().filter));
//! ```

use crate::features::columns::{GridColumnsState, GridPinnedColumns};
use crate::features::dimensions::GridDimensionsState;
use crate::features::editing::GridEditingState;
use crate::features::filter::GridFilterState;
use crate::features::pagination::GridPaginationState;
use crate::features::preference_panel::GridPreferencePanelState;
use crate::features::rows::GridRowsState;
use crate::features::sorting::GridSortingState;
use std::rc::Rc;

/// Immutable snapshot of a grid instance.
#[derive(Debug, Clone, Default)]
pub struct GridState {
    /// Row models and row tree.
    pub rows: Rc<GridRowsState>,
    /// Column definitions, order and visibility.
    pub columns: Rc<GridColumnsState>,
    /// Filter model and filtering result.
    pub filter: Rc<GridFilterState>,
    /// Sort model and sorted row ids.
    pub sorting: Rc<GridSortingState>,
    /// Current page and page size.
    pub pagination: Rc<GridPaginationState>,
    /// Columns pinned to the left and right edges.
    pub pinned_columns: Rc<GridPinnedColumns>,
    /// Preference panel visibility.
    pub preference_panel: Rc<GridPreferencePanelState>,
    /// Rows in edit mode.
    pub editing: Rc<GridEditingState>,
    /// Viewport size and scroll position.
    pub dimensions: Rc<GridDimensionsState>,
}

impl GridState {
    /// Names of the slices that differ (by pointer) between two snapshots.
    pub fn changed_slices(&self, other: &GridState) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if !Rc::ptr_eq(&self.rows, &other.rows) {
            changed.push("rows");
        }
        if !Rc::ptr_eq(&self.columns, &other.columns) {
            changed.push("columns");
        }
        if !Rc::ptr_eq(&self.filter, &other.filter) {
            changed.push("filter");
        }
        if !Rc::ptr_eq(&self.sorting, &other.sorting) {
            changed.push("sorting");
        }
        if !Rc::ptr_eq(&self.pagination, &other.pagination) {
            changed.push("pagination");
        }
        if !Rc::ptr_eq(&self.pinned_columns, &other.pinned_columns) {
            changed.push("pinnedColumns");
        }
        if !Rc::ptr_eq(&self.preference_panel, &other.preference_panel) {
            changed.push("preferencePanel");
        }
        if !Rc::ptr_eq(&self.editing, &other.editing) {
            changed.push("editing");
        }
        if !Rc::ptr_eq(&self.dimensions, &other.dimensions) {
            changed.push("dimensions");
        }
        changed
    }
}

/// Versioned holder of the current snapshot.
#[derive(Debug)]
pub struct GridStore {
    state: Rc<GridState>,
    version: u64,
}

impl GridStore {
    /// Create a store at version 0.
    pub fn new(state: GridState) -> Self {
        Self {
            state: Rc::new(state),
            version: 0,
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> Rc<GridState> {
        self.state.clone()
    }

    /// Borrow the current snapshot.
    pub fn state_ref(&self) -> &GridState {
        &self.state
    }

    /// Current version. Incremented on every commit.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether a commit happened after `version`.
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.version > version
    }

    /// Commit a new snapshot.
    pub fn replace(&mut self, state: GridState) {
        self.state = Rc::new(state);
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pagination::GridPaginationState;

    #[test]
    fn test_replace_shares_untouched_slices() {
        let mut store = GridStore::new(GridState::default());
        let before = store.state();
        store.replace(GridState {
            pagination: Rc::new(GridPaginationState {
                page: 1,
                page_size: 10,
            }),
            ..(*before).clone()
        });
        let after = store.state();

        assert_eq!(store.version(), 1);
        assert!(store.has_changed_since(0));
        assert!(!store.has_changed_since(1));
        assert_eq!(after.changed_slices(&before), vec!["pagination"]);
        assert!(Rc::ptr_eq(&before.columns, &after.columns));
    }
}
