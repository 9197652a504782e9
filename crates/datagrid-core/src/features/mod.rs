//! Community features.
//!
//! Each feature owns one slice of [`GridState`](crate::GridState), exposes its operations as
//! `impl GridApi` blocks and provides a `register_*` function that initializes its slice from
//! the props and registers its event handlers, pipe processors, strategies, controlled items and
//! props effects. [`DataGrid`](crate::DataGrid) calls them in a fixed order.

pub mod column_menu;
pub mod columns;
pub mod dimensions;
pub mod editing;
pub mod filter;
pub mod pagination;
pub mod preference_panel;
pub mod rows;
pub mod sorting;
pub mod state_persistence;
