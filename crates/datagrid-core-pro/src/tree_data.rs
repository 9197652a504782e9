//! Tree data.
//!
//! With `tree_data`, rows are arranged by the path `get_tree_data_path` returns for each of them.
//! Missing intermediate levels get auto-generated parent nodes that hold no row model. The
//! feature provides `treeData` strategies for the three row capabilities:
//!
//! - row tree creation, keeping the expansion of nodes that already existed;
//! - filtering, where a node passes when it matches or when one of its descendants passes;
//! - sorting, where each group of siblings is sorted on its own.

use datagrid_core::features::filter::{
    GridAggregatedFilterApplier, GridFilteringMethodParams, GridFilteringMethodValue,
};
use datagrid_core::features::rows::{GridRowTreeCreationParams, GridRowTreeCreationValue};
use datagrid_core::features::sorting::GridSortingMethodParams;
use datagrid_core::props::GridTreeDataPathGetter;
use datagrid_core::strategy_processing::{Filtering, RowTreeCreation, Sorting};
use datagrid_core::{
    GridApi, GridError, GridRowId, GridRowModel, GridRowTree, GridRowTreeNode, GridRowsState,
};
use std::collections::HashMap;
use std::rc::Rc;

const GROUP: &str = "treeData";

/// Name of the tree data strategies.
pub const TREE_DATA_STRATEGY: &str = "treeData";

/// Prefix of the ids of auto-generated parent nodes.
pub const AUTO_GENERATED_ROW_PREFIX: &str = "auto-generated-row-";

fn is_tree_data(api: &GridApi) -> bool {
    api.props().tree_data
}

fn auto_generated_id(path: &[String]) -> GridRowId {
    GridRowId::Text(format!("{}{}", AUTO_GENERATED_ROW_PREFIX, path.join("/")))
}

/// Builds a tree out of row paths.
struct TreeBuilder<'a> {
    previous: &'a GridRowTree,
    expansion_depth: i32,
    tree: GridRowTree,
    ids_by_path: HashMap<Vec<String>, GridRowId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(previous: &'a GridRowTree, expansion_depth: i32) -> Self {
        Self {
            previous,
            expansion_depth,
            tree: GridRowTree::default(),
            ids_by_path: HashMap::new(),
        }
    }

    fn is_expanded(&self, id: &GridRowId, depth: usize) -> bool {
        match self.previous.node(id) {
            Some(node) => node.children_expanded,
            None => self.expansion_depth == -1 || (depth as i64) < i64::from(self.expansion_depth),
        }
    }

    fn attach(&mut self, node: GridRowTreeNode, path: &[String]) {
        match &node.parent {
            Some(parent) => {
                if let Some(parent) = self.tree.nodes.get_mut(parent) {
                    parent.children.push(node.id.clone());
                }
            }
            None => self.tree.roots.push(node.id.clone()),
        }
        self.ids_by_path.insert(path.to_vec(), node.id.clone());
        self.tree.nodes.insert(node.id.clone(), node);
    }

    /// Id of the node at `path`, creating auto-generated nodes for the missing levels.
    fn ensure_group(&mut self, path: &[String]) -> GridRowId {
        let mut parent: Option<GridRowId> = None;
        for depth in 0..path.len() {
            let prefix = &path[..=depth];
            if let Some(id) = self.ids_by_path.get(prefix) {
                parent = Some(id.clone());
                continue;
            }
            let id = auto_generated_id(prefix);
            let node = GridRowTreeNode {
                depth,
                parent: parent.clone(),
                is_auto_generated: true,
                group_key: Some(prefix[depth].clone()),
                children_expanded: self.is_expanded(&id, depth),
                ..GridRowTreeNode::leaf(id.clone())
            };
            self.attach(node, prefix);
            parent = Some(id);
        }
        parent.unwrap_or_else(|| auto_generated_id(path))
    }

    /// Swap an auto-generated node for the row that turned out to live at its path.
    fn replace_auto_generated(&mut self, auto_id: &GridRowId, id: GridRowId, path: &[String]) {
        let Some(mut node) = self.tree.nodes.remove(auto_id) else {
            return;
        };
        for child in &node.children {
            if let Some(child) = self.tree.nodes.get_mut(child) {
                child.parent = Some(id.clone());
            }
        }
        let siblings = match &node.parent {
            Some(parent) => self
                .tree
                .nodes
                .get_mut(parent)
                .map(|parent| &mut parent.children),
            None => Some(&mut self.tree.roots),
        };
        if let Some(sibling) = siblings
            .into_iter()
            .flat_map(|siblings| siblings.iter_mut())
            .find(|sibling| *sibling == auto_id)
        {
            *sibling = id.clone();
        }
        node.children_expanded = self.is_expanded(&id, node.depth);
        node.id = id.clone();
        node.is_auto_generated = false;
        self.ids_by_path.insert(path.to_vec(), id.clone());
        self.tree.nodes.insert(id, node);
    }

    fn insert_row(&mut self, id: &GridRowId, path: Vec<String>) {
        let Some((key, parent_path)) = path.split_last() else {
            tracing::warn!("row {} has an empty tree path, skipping it", id);
            return;
        };
        if let Some(existing) = self.ids_by_path.get(&path).cloned() {
            let is_auto_generated = self
                .tree
                .node(&existing)
                .is_some_and(|node| node.is_auto_generated);
            if is_auto_generated {
                self.replace_auto_generated(&existing, id.clone(), &path);
            } else {
                tracing::warn!(
                    "duplicate tree path {:?}: rows {} and {} share it, skipping {}",
                    path,
                    existing,
                    id,
                    id
                );
            }
            return;
        }
        let parent = (!parent_path.is_empty()).then(|| self.ensure_group(parent_path));
        let depth = parent_path.len();
        let node = GridRowTreeNode {
            depth,
            parent,
            group_key: Some(key.clone()),
            children_expanded: self.is_expanded(id, depth),
            ..GridRowTreeNode::leaf(id.clone())
        };
        self.attach(node, &path);
    }

    fn finish(self) -> GridRowTreeCreationValue {
        let tree_depth = self
            .tree
            .nodes
            .values()
            .map(|node| node.depth + 1)
            .max()
            .unwrap_or(1);
        GridRowTreeCreationValue {
            tree: self.tree,
            tree_depth,
            grouping_name: TREE_DATA_STRATEGY.to_string(),
        }
    }
}

/// Build the row tree from the path of every row.
pub fn build_tree_data_tree(
    params: &GridRowTreeCreationParams,
    get_tree_data_path: &GridTreeDataPathGetter,
    default_grouping_expansion_depth: i32,
) -> GridRowTreeCreationValue {
    let mut builder = TreeBuilder::new(&params.previous_tree, default_grouping_expansion_depth);
    for id in params.ids.iter() {
        if let Some(row) = params.id_rows_lookup.get(id) {
            builder.insert_row(id, get_tree_data_path(row));
        }
    }
    builder.finish()
}

fn create_tree(
    api: &GridApi,
    params: GridRowTreeCreationParams,
) -> Result<GridRowTreeCreationValue, GridError> {
    let props = api.props();
    let get_tree_data_path = props
        .get_tree_data_path
        .as_ref()
        .ok_or(GridError::MissingProp {
            prop: "getTreeDataPath",
            feature: "treeData",
        })?;
    let value = build_tree_data_tree(
        &params,
        get_tree_data_path,
        props.default_grouping_expansion_depth,
    );
    tracing::debug!(
        "built tree of {} node(s), depth {}",
        value.tree.nodes.len(),
        value.tree_depth
    );
    Ok(value)
}

struct TreeFilter<'a> {
    rows: &'a GridRowsState,
    is_row_matching_filters: Option<&'a GridAggregatedFilterApplier>,
    disable_children_filtering: bool,
    empty_row: GridRowModel,
    value: GridFilteringMethodValue,
}

impl TreeFilter<'_> {
    /// Filter a subtree. Returns the number of nodes of the subtree passing the filters.
    fn filter_node(&mut self, id: &GridRowId, is_parent_matching: bool) -> usize {
        let rows = self.rows;
        let Some(node) = rows.tree.node(id) else {
            return 0;
        };
        let is_matching = if self.disable_children_filtering && node.depth > 0 {
            None
        } else {
            Some(match self.is_row_matching_filters {
                Some(is_row_matching_filters) => {
                    let row = rows.row(id).unwrap_or(&self.empty_row);
                    is_row_matching_filters(id, row, None)
                }
                None => true,
            })
        };

        let descendants: usize = node
            .children
            .iter()
            .map(|child| self.filter_node(child, is_matching.unwrap_or(is_parent_matching)))
            .sum();

        let passes = match is_matching {
            Some(true) => true,
            Some(false) => descendants > 0,
            None => is_parent_matching,
        };
        self.value.visible_rows_lookup.insert(id.clone(), passes);
        if !passes {
            return 0;
        }
        self.value
            .filtered_descendant_count_lookup
            .insert(id.clone(), descendants);
        descendants + 1
    }
}

fn tree_filtering(
    api: &GridApi,
    params: GridFilteringMethodParams,
) -> Result<GridFilteringMethodValue, GridError> {
    let rows = &api.state_ref().rows;
    let mut filter = TreeFilter {
        rows,
        is_row_matching_filters: params.is_row_matching_filters.as_ref(),
        disable_children_filtering: api.props().disable_children_filtering,
        empty_row: GridRowModel::new(),
        value: GridFilteringMethodValue::default(),
    };
    for root in rows.tree.roots.iter() {
        filter.filter_node(root, true);
    }
    Ok(filter.value)
}

fn tree_sorting(
    api: &GridApi,
    params: GridSortingMethodParams,
) -> Result<Vec<GridRowId>, GridError> {
    let tree = &api.state_ref().rows.tree;
    let disable_children_sorting = api.props().disable_children_sorting;
    let sort_siblings = |siblings: &[GridRowId], depth: usize| match &params.sort_row_list {
        Some(sort_row_list) if !(disable_children_sorting && depth > 0) => sort_row_list(siblings),
        _ => siblings.to_vec(),
    };

    let mut sorted = Vec::with_capacity(tree.nodes.len());
    let mut stack: Vec<GridRowId> = sort_siblings(&tree.roots, 0).into_iter().rev().collect();
    while let Some(id) = stack.pop() {
        if let Some(node) = tree.node(&id)
            && !node.children.is_empty()
        {
            stack.extend(sort_siblings(&node.children, node.depth + 1).into_iter().rev());
        }
        sorted.push(id);
    }
    Ok(sorted)
}

fn same_getter(a: &Option<GridTreeDataPathGetter>, b: &Option<GridTreeDataPathGetter>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Register the `treeData` strategies, active while `tree_data` is set.
pub fn register_tree_data(api: &mut GridApi) -> Result<(), GridError> {
    api.register_strategy_processor::<RowTreeCreation>(
        GROUP,
        TREE_DATA_STRATEGY,
        is_tree_data,
        create_tree,
    );
    api.register_strategy_processor::<Filtering>(
        GROUP,
        TREE_DATA_STRATEGY,
        is_tree_data,
        tree_filtering,
    );
    api.register_strategy_processor::<Sorting>(
        GROUP,
        TREE_DATA_STRATEGY,
        is_tree_data,
        tree_sorting,
    );

    api.register_props_effect(GROUP, |api, previous| {
        let props = api.props().clone();
        if !props.tree_data || !previous.tree_data {
            // Toggling tree data changes the active strategies, which rebuilds everything.
            return Ok(());
        }
        if !same_getter(&previous.get_tree_data_path, &props.get_tree_data_path)
            || previous.default_grouping_expansion_depth != props.default_grouping_expansion_depth
        {
            return api.regenerate_row_tree();
        }
        if previous.disable_children_filtering != props.disable_children_filtering {
            api.apply_filters()?;
        }
        if previous.disable_children_sorting != props.disable_children_sorting {
            api.apply_sorting()?;
        }
        Ok(())
    });
    Ok(())
}
