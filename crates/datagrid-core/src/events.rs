//! Per-instance event bus.
//!
//! Events are published synchronously: every handler subscribed to the event name runs in
//! subscription order (handlers subscribed with `is_first` run before the others) before
//! [`GridApi::publish_event`](crate::GridApi::publish_event) returns. A handler can stop later
//! handlers with [`GridEventMeta::stop_propagation`] or ask the grid to skip its default
//! behavior with [`GridEventMeta::prevent_default`]. A handler returning an error does not
//! prevent later handlers from running; the error goes to the global error handler.

use crate::api::GridApi;
use crate::error::GridError;
use crate::features::columns::{GridColumnVisibilityModel, GridPinnedColumns};
use crate::features::filter::GridFilterModel;
use crate::features::preference_panel::GridPreferencePanelsValue;
use crate::features::sorting::GridSortModel;
use crate::props::GridChangeReason;
use crate::value::{CellValue, GridRowId};
use std::fmt;
use std::rc::Rc;

/// Names of the events published by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridEventName {
    /// Any committed state update.
    StateChange,
    /// The filter model changed.
    FilterModelChange,
    /// The sort model changed.
    SortModelChange,
    /// The pinned columns changed.
    PinnedColumnsChange,
    /// The column visibility model changed.
    ColumnVisibilityModelChange,
    /// The current page changed.
    PageChange,
    /// The page size changed.
    PageSizeChange,
    /// A column moved.
    ColumnOrderChange,
    /// A column was resized.
    ColumnWidthChange,
    /// The set of columns changed.
    ColumnsChange,
    /// A column header was clicked.
    ColumnHeaderClick,
    /// The rows were replaced or updated.
    RowsSet,
    /// Filtering was applied.
    FilteredRowsSet,
    /// Sorting was applied.
    SortedRowsSet,
    /// The viewport scrolled.
    RowsScroll,
    /// The viewport reached the bottom of the rows.
    RowsScrollEnd,
    /// A preference panel opened.
    PreferencePanelOpen,
    /// The preference panel closed.
    PreferencePanelClose,
    /// A row entered edit mode.
    RowEditStart,
    /// A row left edit mode.
    RowEditStop,
    /// An edited cell value changed.
    EditCellValueChange,
    /// A tree node was expanded or collapsed.
    RowExpansionChange,
    /// The viewport was resized.
    ViewportInnerSizeChange,
    /// The strategy selected for a capability changed.
    ActiveStrategyProcessorChange,
}

impl GridEventName {
    /// Public event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            GridEventName::StateChange => "stateChange",
            GridEventName::FilterModelChange => "filterModelChange",
            GridEventName::SortModelChange => "sortModelChange",
            GridEventName::PinnedColumnsChange => "pinnedColumnsChange",
            GridEventName::ColumnVisibilityModelChange => "columnVisibilityModelChange",
            GridEventName::PageChange => "pageChange",
            GridEventName::PageSizeChange => "pageSizeChange",
            GridEventName::ColumnOrderChange => "columnOrderChange",
            GridEventName::ColumnWidthChange => "columnWidthChange",
            GridEventName::ColumnsChange => "columnsChange",
            GridEventName::ColumnHeaderClick => "columnHeaderClick",
            GridEventName::RowsSet => "rowsSet",
            GridEventName::FilteredRowsSet => "filteredRowsSet",
            GridEventName::SortedRowsSet => "sortedRowsSet",
            GridEventName::RowsScroll => "rowsScroll",
            GridEventName::RowsScrollEnd => "rowsScrollEnd",
            GridEventName::PreferencePanelOpen => "preferencePanelOpen",
            GridEventName::PreferencePanelClose => "preferencePanelClose",
            GridEventName::RowEditStart => "rowEditStart",
            GridEventName::RowEditStop => "rowEditStop",
            GridEventName::EditCellValueChange => "editCellValueChange",
            GridEventName::RowExpansionChange => "rowExpansionChange",
            GridEventName::ViewportInnerSizeChange => "viewportInnerSizeChange",
            GridEventName::ActiveStrategyProcessorChange => "activeStrategyProcessorChange",
        }
    }
}

impl fmt::Display for GridEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// Any committed state update; carries the new state version.
    StateChange {
        /// Version after the commit.
        version: u64,
    },
    /// The filter model changed.
    FilterModelChange {
        /// New model.
        model: GridFilterModel,
        /// Why the model changed.
        reason: Option<GridChangeReason>,
    },
    /// The sort model changed.
    SortModelChange {
        /// New model.
        model: GridSortModel,
    },
    /// The pinned columns changed.
    PinnedColumnsChange {
        /// New pinned columns.
        pinned_columns: GridPinnedColumns,
    },
    /// The column visibility model changed.
    ColumnVisibilityModelChange {
        /// New model.
        model: GridColumnVisibilityModel,
    },
    /// The current page changed.
    PageChange {
        /// New page.
        page: usize,
    },
    /// The page size changed.
    PageSizeChange {
        /// New page size.
        page_size: usize,
    },
    /// A column moved.
    ColumnOrderChange {
        /// Column moved.
        field: String,
        /// New index among all columns.
        target_index: usize,
        /// Previous index among all columns.
        old_index: usize,
    },
    /// A column was resized.
    ColumnWidthChange {
        /// Column resized.
        field: String,
        /// New width.
        width: f64,
    },
    /// The set of columns changed.
    ColumnsChange {
        /// Fields in display order.
        fields: Vec<String>,
    },
    /// A column header was clicked.
    ColumnHeaderClick {
        /// Column clicked.
        field: String,
        /// Whether a multi-sort modifier (shift / ctrl / meta) was held.
        multi: bool,
    },
    /// The rows were replaced or updated.
    RowsSet,
    /// Filtering was applied.
    FilteredRowsSet,
    /// Sorting was applied.
    SortedRowsSet,
    /// The viewport scrolled.
    RowsScroll {
        /// Horizontal offset.
        left: f64,
        /// Vertical offset.
        top: f64,
    },
    /// The viewport reached the bottom of the rows.
    RowsScrollEnd {
        /// Number of rows fitting in the viewport.
        viewport_page_size: usize,
        /// Number of rows displayed.
        virtual_row_count: usize,
        /// Fields of the visible columns.
        visible_columns: Vec<String>,
    },
    /// A preference panel opened.
    PreferencePanelOpen {
        /// Panel opened.
        panel: GridPreferencePanelsValue,
    },
    /// The preference panel closed.
    PreferencePanelClose {
        /// Panel closed.
        panel: Option<GridPreferencePanelsValue>,
    },
    /// A row entered edit mode.
    RowEditStart {
        /// Row id.
        id: GridRowId,
    },
    /// A row left edit mode.
    RowEditStop {
        /// Row id.
        id: GridRowId,
        /// Whether the modifications were discarded.
        ignore_modifications: bool,
    },
    /// An edited cell value changed.
    EditCellValueChange {
        /// Row id.
        id: GridRowId,
        /// Column field.
        field: String,
        /// Value applied.
        value: CellValue,
    },
    /// A tree node was expanded or collapsed.
    RowExpansionChange {
        /// Row id.
        id: GridRowId,
        /// New expansion state.
        expanded: bool,
    },
    /// The viewport was resized.
    ViewportInnerSizeChange {
        /// Inner width.
        width: f64,
        /// Inner height.
        height: f64,
    },
    /// The strategy selected for a capability changed.
    ActiveStrategyProcessorChange {
        /// Capability name.
        capability: &'static str,
        /// Newly selected strategy, if any is available.
        strategy: Option<&'static str>,
    },
}

impl GridEvent {
    /// Name of the event.
    pub fn name(&self) -> GridEventName {
        match self {
            GridEvent::StateChange { .. } => GridEventName::StateChange,
            GridEvent::FilterModelChange { .. } => GridEventName::FilterModelChange,
            GridEvent::SortModelChange { .. } => GridEventName::SortModelChange,
            GridEvent::PinnedColumnsChange { .. } => GridEventName::PinnedColumnsChange,
            GridEvent::ColumnVisibilityModelChange { .. } => {
                GridEventName::ColumnVisibilityModelChange
            }
            GridEvent::PageChange { .. } => GridEventName::PageChange,
            GridEvent::PageSizeChange { .. } => GridEventName::PageSizeChange,
            GridEvent::ColumnOrderChange { .. } => GridEventName::ColumnOrderChange,
            GridEvent::ColumnWidthChange { .. } => GridEventName::ColumnWidthChange,
            GridEvent::ColumnsChange { .. } => GridEventName::ColumnsChange,
            GridEvent::ColumnHeaderClick { .. } => GridEventName::ColumnHeaderClick,
            GridEvent::RowsSet => GridEventName::RowsSet,
            GridEvent::FilteredRowsSet => GridEventName::FilteredRowsSet,
            GridEvent::SortedRowsSet => GridEventName::SortedRowsSet,
            GridEvent::RowsScroll { .. } => GridEventName::RowsScroll,
            GridEvent::RowsScrollEnd { .. } => GridEventName::RowsScrollEnd,
            GridEvent::PreferencePanelOpen { .. } => GridEventName::PreferencePanelOpen,
            GridEvent::PreferencePanelClose { .. } => GridEventName::PreferencePanelClose,
            GridEvent::RowEditStart { .. } => GridEventName::RowEditStart,
            GridEvent::RowEditStop { .. } => GridEventName::RowEditStop,
            GridEvent::EditCellValueChange { .. } => GridEventName::EditCellValueChange,
            GridEvent::RowExpansionChange { .. } => GridEventName::RowExpansionChange,
            GridEvent::ViewportInnerSizeChange { .. } => GridEventName::ViewportInnerSizeChange,
            GridEvent::ActiveStrategyProcessorChange { .. } => {
                GridEventName::ActiveStrategyProcessorChange
            }
        }
    }
}

/// Dispatch flags shared by the handlers of one publication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridEventMeta {
    default_prevented: bool,
    propagation_stopped: bool,
}

impl GridEventMeta {
    /// Ask the grid to skip its default handling of this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether a handler called [`prevent_default`](Self::prevent_default).
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Skip the remaining handlers.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether a handler called [`stop_propagation`](Self::stop_propagation).
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Event handler.
pub type GridEventHandler =
    Rc<dyn Fn(&mut GridApi, &GridEvent, &mut GridEventMeta) -> Result<(), GridError>>;

/// Handle returned by a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridListenerId(u64);

/// Subscription options.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridSubscribeOptions {
    /// Run before the handlers subscribed without this flag.
    pub is_first: bool,
}

#[derive(Clone)]
struct Listener {
    id: GridListenerId,
    name: GridEventName,
    is_first: bool,
    handler: GridEventHandler,
}

/// Listener registry.
#[derive(Default)]
pub struct GridEventBus {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl GridEventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    pub fn subscribe(
        &mut self,
        name: GridEventName,
        options: GridSubscribeOptions,
        handler: GridEventHandler,
    ) -> GridListenerId {
        self.next_id += 1;
        let id = GridListenerId(self.next_id);
        self.listeners.push(Listener {
            id,
            name,
            is_first: options.is_first,
            handler,
        });
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: GridListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Whether a handler is still registered.
    pub fn is_subscribed(&self, id: GridListenerId) -> bool {
        self.listeners.iter().any(|listener| listener.id == id)
    }

    /// Handlers of an event in dispatch order.
    pub fn handlers(&self, name: GridEventName) -> Vec<(GridListenerId, GridEventHandler)> {
        let first = self
            .listeners
            .iter()
            .filter(|listener| listener.name == name && listener.is_first);
        let regular = self
            .listeners
            .iter()
            .filter(|listener| listener.name == name && !listener.is_first);
        first
            .chain(regular)
            .map(|listener| (listener.id, listener.handler.clone()))
            .collect()
    }

    /// Number of handlers for an event.
    pub fn listener_count(&self, name: GridEventName) -> usize {
        self.listeners
            .iter()
            .filter(|listener| listener.name == name)
            .count()
    }
}

impl fmt::Debug for GridEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridEventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
