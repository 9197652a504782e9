#![warn(missing_docs)]
//! `datagrid-core-pro` - pro-tier features for `datagrid-core`.
//!
//! Everything here is built on the public extension points of the core: pipe processors,
//! strategies, event subscriptions and controlled state. Nothing in the core knows about these
//! features.
//!
//! - [`column_pinning`] - Pin columns to the left or right edge ([`GridColumnPinningApi`])
//! - [`tree_data`] - Rows arranged by path, with tree-aware filtering and sorting
//! - [`infinite_loader`] - `rowsScrollEnd` when the viewport reaches the last rows
//!
//! [`DataGridPro`] assembles the community features and the pro ones. Unlike
//! [`DataGrid`](datagrid_core::DataGrid), it leaves multi-column filtering and sorting enabled.

pub mod column_pinning;
mod grid;
pub mod infinite_loader;
pub mod tree_data;

pub use column_pinning::{GridColumnPinningApi, register_column_pinning};
pub use grid::{DataGridPro, register_pro_features};
pub use infinite_loader::register_infinite_loader;
pub use tree_data::{TREE_DATA_STRATEGY, build_tree_data_tree, register_tree_data};
