#![warn(missing_docs)]
//! Datagrid Core - Headless Data Grid Engine
//!
//! # Overview
//!
//! `datagrid-core` is the state and derivation engine of a data grid. It holds the rows, the
//! columns and every user-facing model (filter, sort, pagination, visibility, editing) in one
//! immutable snapshot, derives what a renderer needs through memoized selectors, and notifies
//! the host through a synchronous event bus. It does no rendering.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  DataGrid / DataGridPro (composition root)  │  ← Tier assembly
//! ├─────────────────────────────────────────────┤
//! │  Features (rows, columns, filter, sort ...) │  ← impl GridApi blocks
//! ├─────────────────────────────────────────────┤
//! │  Pipes & Strategies                         │  ← Cross-feature extension
//! ├─────────────────────────────────────────────┤
//! │  Controlled State & Event Bus               │  ← Notifications
//! ├─────────────────────────────────────────────┤
//! │  Selectors                                  │  ← Memoized derivations
//! ├─────────────────────────────────────────────┤
//! │  State Store                                │  ← Immutable snapshots
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use datagrid_core::{
//!     DataGrid, GridColDef, GridColType, GridFilterItem, GridFilterModel, GridLinkOperator,
//!     GridProps, GridRowId, GridRowModel,
//! };
//!
//! let rows = vec![
//!     GridRowModel::new().with("id", 0).with("brand", "Nike").with("price", 100),
//!     GridRowModel::new().with("id", 1).with("brand", "Adidas").with("price", 80),
//!     GridRowModel::new().with("id", 2).with("brand", "Puma").with("price", 60),
//! ];
//! let columns = vec![
//!     GridColDef::new("brand"),
//!     GridColDef::new("price").with_type(GridColType::Number),
//! ];
//! let mut grid = DataGrid::new(GridProps::new(rows, columns)).unwrap();
//!
//! grid.set_filter_model(
//!     GridFilterModel::new(
//!         vec![GridFilterItem::new("price", ">", 70)],
//!         GridLinkOperator::And,
//!     ),
//!     None,
//! )
//! .unwrap();
//!
//! assert_eq!(*grid.get_visible_row_ids(), vec![GridRowId::from(0), GridRowId::from(1)]);
//! ```
//!
//! # Module Description
//!
//! - [`state`] - Immutable snapshot and versioned store
//! - [`selectors`] - Memoized selectors
//! - [`events`] - Event names, payloads and the event bus
//! - [`pipe_processing`] - Pipes shared between features
//! - [`strategy_processing`] - Strategy selection per capability
//! - [`control_state`] - Controlled models
//! - [`timers`] - Host-driven debounce timers
//! - [`features`] - Community features
//! - [`col_def`] - Column definitions, operators and comparators

pub mod api;
pub mod col_def;
pub mod control_state;
pub mod error;
pub mod events;
pub mod features;
mod grid;
pub mod pipe_processing;
pub mod props;
pub mod selectors;
pub mod state;
pub mod strategy_processing;
pub mod timers;
pub mod value;

pub use api::{GridApi, GridPropsEffect, GridPropsNormalizer};
pub use col_def::{
    GridCellParams, GridColDef, GridColType, GridEditCellProps, GridFilterOperator,
    GridSortDirection, GridStateColDef,
};
pub use control_state::{GridControlStateItem, GridStateMode};
pub use error::GridError;
pub use events::{GridEvent, GridEventMeta, GridEventName, GridListenerId, GridSubscribeOptions};
pub use features::column_menu::GridColumnMenuItem;
pub use features::columns::{
    GridColumnVisibilityModel, GridColumnsState, GridPinnedColumns, GridPinnedPosition,
};
pub use features::dimensions::{
    GridCellIndexCoordinates, GridDimensionsState, GridScrollPosition,
};
pub use features::editing::{
    GridEditCellState, GridEditCellValueParams, GridEditingState, GridRowMode,
};
pub use features::filter::{GridFilterItem, GridFilterModel, GridFilterState, GridLinkOperator};
pub use features::pagination::GridPaginationState;
pub use features::preference_panel::{GridPreferencePanelState, GridPreferencePanelsValue};
pub use features::rows::{GridRowTree, GridRowTreeNode, GridRowsState};
pub use features::sorting::{GridSortItem, GridSortModel, GridSortingState};
pub use grid::{DataGrid, community_props, register_community_features};
pub use props::{
    GridCallback, GridCallbackDetails, GridChangeReason, GridFeatureMode, GridInitialState,
    GridProps,
};
pub use state::{GridState, GridStore};
pub use timers::GridTimerKey;
pub use value::{CellValue, GridRowId, GridRowModel};
