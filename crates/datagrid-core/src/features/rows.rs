//! Rows: row models, row ids and the row tree.
//!
//! Row models are indexed by id. The row tree is built by the `rowTreeCreation` strategy: the
//! default `none` strategy produces a flat tree, the tree data feature replaces it with a
//! hierarchy built from row paths. Every row, including the auto-generated parents of a tree, has
//! a node in the tree.

use crate::api::GridApi;
use crate::error::GridError;
use crate::events::{GridEvent, GridEventName};
use crate::props::GridProps;
use crate::state::GridState;
use crate::strategy_processing::{GridStrategyCapability, RowTreeCreation};
use crate::value::{CellValue, GridRowId, GridRowModel};
use std::collections::HashMap;
use std::rc::Rc;

const GROUP: &str = "rows";

/// Name of the flat row tree strategy.
pub const FLAT_ROW_TREE_STRATEGY: &str = "none";

/// Field marking a row update as a deletion when set to `"delete"`.
pub const ROW_ACTION_FIELD: &str = "_action";

/// One node of the row tree.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRowTreeNode {
    /// Row id.
    pub id: GridRowId,
    /// Depth, 0 for top-level rows.
    pub depth: usize,
    /// Parent node.
    pub parent: Option<GridRowId>,
    /// Child nodes, in insertion order.
    pub children: Vec<GridRowId>,
    /// Whether the node has no row model (a parent created to hold its children).
    pub is_auto_generated: bool,
    /// Key of the node within its parent.
    pub group_key: Option<String>,
    /// Whether the children are displayed.
    pub children_expanded: bool,
}

impl GridRowTreeNode {
    /// A top-level leaf.
    pub fn leaf(id: GridRowId) -> Self {
        Self {
            id,
            depth: 0,
            parent: None,
            children: Vec::new(),
            is_auto_generated: false,
            group_key: None,
            children_expanded: false,
        }
    }
}

/// Row hierarchy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridRowTree {
    /// Nodes by id.
    pub nodes: HashMap<GridRowId, GridRowTreeNode>,
    /// Top-level nodes, in insertion order.
    pub roots: Vec<GridRowId>,
}

impl GridRowTree {
    /// A tree where every row is a top-level leaf.
    pub fn flat(ids: &[GridRowId]) -> Self {
        Self {
            nodes: ids
                .iter()
                .map(|id| (id.clone(), GridRowTreeNode::leaf(id.clone())))
                .collect(),
            roots: ids.to_vec(),
        }
    }

    /// Node of a row.
    pub fn node(&self, id: &GridRowId) -> Option<&GridRowTreeNode> {
        self.nodes.get(id)
    }

    /// Every id, parents before children, siblings in insertion order.
    pub fn depth_first(&self) -> Vec<GridRowId> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&GridRowId> = self.roots.iter().rev().collect();
        while let Some(id) = stack.pop() {
            ordered.push(id.clone());
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev());
            }
        }
        ordered
    }

    /// Every descendant of a node, depth first.
    pub fn descendants(&self, id: &GridRowId) -> Vec<GridRowId> {
        let mut descendants = Vec::new();
        let mut stack: Vec<&GridRowId> = match self.nodes.get(id) {
            Some(node) => node.children.iter().rev().collect(),
            None => return descendants,
        };
        while let Some(child) = stack.pop() {
            descendants.push(child.clone());
            if let Some(node) = self.nodes.get(child) {
                stack.extend(node.children.iter().rev());
            }
        }
        descendants
    }
}

/// Rows slice.
#[derive(Debug, Clone, Default)]
pub struct GridRowsState {
    /// Row models by id.
    pub id_rows_lookup: Rc<HashMap<GridRowId, GridRowModel>>,
    /// Ids of the row models, in the order they were provided.
    pub ids: Rc<Vec<GridRowId>>,
    /// Row hierarchy.
    pub tree: Rc<GridRowTree>,
    /// Maximum depth of the tree plus one.
    pub tree_depth: usize,
    /// Strategy that built the tree.
    pub grouping_name: String,
}

impl GridRowsState {
    /// Row model of an id.
    pub fn row(&self, id: &GridRowId) -> Option<&GridRowModel> {
        self.id_rows_lookup.get(id)
    }
}

/// Parameters of the `rowTreeCreation` strategies.
#[derive(Debug, Clone)]
pub struct GridRowTreeCreationParams {
    /// Row ids, in the order they were provided.
    pub ids: Rc<Vec<GridRowId>>,
    /// Row models by id.
    pub id_rows_lookup: Rc<HashMap<GridRowId, GridRowModel>>,
    /// Tree before this update, used to keep the expansion state.
    pub previous_tree: Rc<GridRowTree>,
}

/// Output of the `rowTreeCreation` strategies.
#[derive(Debug, Clone)]
pub struct GridRowTreeCreationValue {
    /// New tree.
    pub tree: GridRowTree,
    /// Maximum depth plus one.
    pub tree_depth: usize,
    /// Strategy name.
    pub grouping_name: String,
}

/// Resolve the id of a row through `get_row_id`, or its `id` field.
pub fn resolve_row_id(props: &GridProps, row: &GridRowModel) -> Result<GridRowId, GridError> {
    let id = match &props.get_row_id {
        Some(get_row_id) => get_row_id(row),
        None => row.get("id").and_then(GridRowId::from_value),
    };
    id.ok_or(GridError::MissingRowId)
}

fn index_rows(
    props: &GridProps,
    rows: &[GridRowModel],
) -> Result<(Vec<GridRowId>, HashMap<GridRowId, GridRowModel>), GridError> {
    let mut ids = Vec::with_capacity(rows.len());
    let mut lookup = HashMap::with_capacity(rows.len());
    for row in rows {
        let id = resolve_row_id(props, row)?;
        if lookup.insert(id.clone(), row.clone()).is_some() {
            tracing::warn!("duplicate row id {}, keeping the last row", id);
        } else {
            ids.push(id);
        }
    }
    Ok((ids, lookup))
}

fn with_rows(state: &GridState, rows: GridRowsState) -> GridState {
    GridState {
        rows: Rc::new(rows),
        ..state.clone()
    }
}

impl GridApi {
    /// Replace every row.
    pub fn set_rows(&mut self, rows: Vec<GridRowModel>) -> Result<(), GridError> {
        let (ids, lookup) = index_rows(self.props(), &rows)?;
        tracing::debug!("updating all rows, new length {}", ids.len());
        self.commit_rows(ids, lookup)
    }

    /// Insert, merge or delete rows by id.
    ///
    /// A row whose `_action` field is `"delete"` is removed; an unknown id is appended.
    pub fn update_rows(&mut self, updates: Vec<GridRowModel>) -> Result<(), GridError> {
        let rows = self.state().rows.clone();
        let mut ids = (*rows.ids).clone();
        let mut lookup = (*rows.id_rows_lookup).clone();
        for update in updates {
            let id = resolve_row_id(self.props(), &update)?;
            let is_delete = update
                .get(ROW_ACTION_FIELD)
                .and_then(CellValue::as_str)
                .is_some_and(|action| action == "delete");
            if is_delete {
                if lookup.remove(&id).is_some() {
                    ids.retain(|existing| existing != &id);
                }
                continue;
            }
            match lookup.get_mut(&id) {
                Some(existing) => *existing = existing.merged_with(&update),
                None => {
                    ids.push(id.clone());
                    lookup.insert(id, update);
                }
            }
        }
        self.commit_rows(ids, lookup)
    }

    fn commit_rows(
        &mut self,
        ids: Vec<GridRowId>,
        lookup: HashMap<GridRowId, GridRowModel>,
    ) -> Result<(), GridError> {
        let update = move |state: &GridState| {
            with_rows(
                state,
                GridRowsState {
                    ids: Rc::new(ids),
                    id_rows_lookup: Rc::new(lookup),
                    ..(*state.rows).clone()
                },
            )
        };
        if !self.is_mounted() {
            self.initialize_state(update);
            return Ok(());
        }
        self.set_state(update);
        self.regenerate_row_tree()
    }

    /// Rebuild the row tree with the active `rowTreeCreation` strategy and publish `rowsSet`.
    pub fn regenerate_row_tree(&mut self) -> Result<(), GridError> {
        let rows = self.state().rows.clone();
        let value = self.apply_strategy_processor::<RowTreeCreation>(GridRowTreeCreationParams {
            ids: rows.ids.clone(),
            id_rows_lookup: rows.id_rows_lookup.clone(),
            previous_tree: rows.tree.clone(),
        })?;
        self.set_state(|state| {
            with_rows(
                state,
                GridRowsState {
                    tree: Rc::new(value.tree),
                    tree_depth: value.tree_depth,
                    grouping_name: value.grouping_name,
                    ..(*state.rows).clone()
                },
            )
        });
        self.publish_event(GridEvent::RowsSet);
        Ok(())
    }

    /// Row model of an id.
    pub fn get_row(&self, id: &GridRowId) -> Option<&GridRowModel> {
        self.state_ref().rows.row(id)
    }

    /// Every row id, in the order the rows were provided.
    pub fn get_row_ids(&self) -> Vec<GridRowId> {
        self.state_ref().rows.ids.to_vec()
    }

    /// Every row model with its id, in the order the rows were provided.
    pub fn get_row_models(&self) -> Vec<(GridRowId, GridRowModel)> {
        let rows = &self.state_ref().rows;
        rows.ids
            .iter()
            .filter_map(|id| rows.row(id).map(|row| (id.clone(), row.clone())))
            .collect()
    }

    /// Number of row models.
    pub fn get_rows_count(&self) -> usize {
        self.state_ref().rows.ids.len()
    }

    /// Tree node of a row.
    pub fn get_row_node(&self, id: &GridRowId) -> Option<&GridRowTreeNode> {
        self.state_ref().rows.tree.node(id)
    }

    /// Value of a cell, through the column's value getter when the column exists.
    pub fn get_cell_value(&self, id: &GridRowId, field: &str) -> Result<CellValue, GridError> {
        let state = self.state_ref();
        let row = state
            .rows
            .row(id)
            .ok_or_else(|| GridError::RowNotFound(id.clone()))?;
        Ok(match state.columns.lookup.get(field) {
            Some(column) => column.cell_value(id, row),
            None => row.get(field).cloned().unwrap_or_default(),
        })
    }

    /// Expand or collapse the children of a node.
    pub fn set_row_children_expansion(
        &mut self,
        id: &GridRowId,
        expanded: bool,
    ) -> Result<(), GridError> {
        let rows = self.state().rows.clone();
        let node = rows
            .tree
            .node(id)
            .ok_or_else(|| GridError::RowNotFound(id.clone()))?;
        if node.children_expanded == expanded {
            return Ok(());
        }
        let mut tree = (*rows.tree).clone();
        if let Some(node) = tree.nodes.get_mut(id) {
            node.children_expanded = expanded;
        }
        self.set_state(|state| {
            with_rows(
                state,
                GridRowsState {
                    tree: Rc::new(tree),
                    ..(*state.rows).clone()
                },
            )
        });
        self.publish_event(GridEvent::RowExpansionChange {
            id: id.clone(),
            expanded,
        });
        Ok(())
    }
}

/// Index the rows of the props and register the flat row tree strategy.
pub fn register_rows(api: &mut GridApi) -> Result<(), GridError> {
    let rows = api.props().rows.clone();
    api.set_rows((*rows).clone())?;

    api.register_strategy_processor::<RowTreeCreation>(
        GROUP,
        FLAT_ROW_TREE_STRATEGY,
        |_| true,
        |_, params| {
            Ok(GridRowTreeCreationValue {
                tree: GridRowTree::flat(&params.ids),
                tree_depth: 1,
                grouping_name: FLAT_ROW_TREE_STRATEGY.to_string(),
            })
        },
    );

    api.subscribe_event(
        GridEventName::ActiveStrategyProcessorChange,
        |api, event, _| match event {
            GridEvent::ActiveStrategyProcessorChange { capability, .. }
                if *capability == RowTreeCreation::NAME =>
            {
                api.regenerate_row_tree()
            }
            _ => Ok(()),
        },
    );

    api.register_props_effect(GROUP, |api, previous| {
        let rows = api.props().rows.clone();
        if Rc::ptr_eq(&previous.rows, &rows) {
            return Ok(());
        }
        api.set_rows((*rows).clone())
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[i64]) -> Vec<GridRowId> {
        values.iter().map(|value| GridRowId::Number(*value)).collect()
    }

    #[test]
    fn test_depth_first_lists_parents_before_children() {
        let mut tree = GridRowTree::flat(&ids(&[1, 4]));
        for (child, parent) in [(2, 1), (3, 2)] {
            let parent_id = GridRowId::Number(parent);
            let depth = tree.nodes[&parent_id].depth + 1;
            tree.nodes.insert(
                GridRowId::Number(child),
                GridRowTreeNode {
                    depth,
                    parent: Some(parent_id.clone()),
                    ..GridRowTreeNode::leaf(GridRowId::Number(child))
                },
            );
            if let Some(node) = tree.nodes.get_mut(&parent_id) {
                node.children.push(GridRowId::Number(child));
            }
        }

        assert_eq!(tree.depth_first(), ids(&[1, 2, 3, 4]));
        assert_eq!(tree.descendants(&GridRowId::Number(1)), ids(&[2, 3]));
        assert!(tree.descendants(&GridRowId::Number(9)).is_empty());
    }

    #[test]
    fn test_resolve_row_id_uses_accessor() {
        let row = GridRowModel::new().with("code", "A-1");
        assert_eq!(
            resolve_row_id(&GridProps::default(), &row),
            Err(GridError::MissingRowId)
        );
        let props = GridProps {
            get_row_id: Some(Rc::new(|row: &GridRowModel| {
                row.get("code").and_then(GridRowId::from_value)
            })),
            ..GridProps::default()
        };
        assert_eq!(
            resolve_row_id(&props, &row),
            Ok(GridRowId::Text("A-1".into()))
        );
    }
}
