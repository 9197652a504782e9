use datagrid_core::props::GridTreeDataPathGetter;
use datagrid_core::{
    GridColDef, GridError, GridFilterItem, GridFilterModel, GridLinkOperator, GridProps,
    GridRowId, GridRowModel, GridSortItem,
};
use datagrid_core_pro::DataGridPro;
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn rows() -> Vec<GridRowModel> {
    [
        (1, "A", "Sarah"),
        (2, "A/B", "Thomas"),
        (3, "A/B/C", "Robert"),
        (4, "A/B/D", "Karen"),
        (5, "E", "Mary"),
        (6, "E/F", "Tom"),
    ]
    .into_iter()
    .map(|(id, path, name)| {
        GridRowModel::new()
            .with("id", id)
            .with("path", path)
            .with("name", name)
    })
    .collect()
}

fn path_getter() -> GridTreeDataPathGetter {
    Rc::new(|row: &GridRowModel| {
        row.get("path")
            .and_then(|value| value.as_str())
            .map(|path| path.split('/').map(str::to_string).collect())
            .unwrap_or_default()
    })
}

fn tree_props(expansion_depth: i32) -> GridProps {
    GridProps {
        tree_data: true,
        get_tree_data_path: Some(path_getter()),
        default_grouping_expansion_depth: expansion_depth,
        ..GridProps::new(rows(), vec![GridColDef::new("name")])
    }
}

fn ids(values: &[i64]) -> Vec<GridRowId> {
    values.iter().map(|id| GridRowId::from(*id)).collect()
}

#[test]
fn test_rows_are_nested_by_path() {
    let grid = DataGridPro::new(tree_props(-1)).unwrap();
    let rows = &grid.state_ref().rows;

    assert_eq!(rows.tree.roots, ids(&[1, 5]));
    assert_eq!(rows.tree_depth, 3);
    assert_eq!(rows.grouping_name, "treeData");
    assert_eq!(rows.tree.node(&GridRowId::from(2)).unwrap().children, ids(&[3, 4]));
    assert_eq!(*grid.get_visible_row_ids(), ids(&[1, 2, 3, 4, 5, 6]));
}

#[test]
fn test_collapsed_groups_hide_their_children() {
    let mut grid = DataGridPro::new(tree_props(0)).unwrap();
    assert_eq!(*grid.get_visible_row_ids(), ids(&[1, 5]));

    grid.set_row_children_expansion(&GridRowId::from(1), true)
        .unwrap();
    assert_eq!(*grid.get_visible_row_ids(), ids(&[1, 2, 5]));

    grid.set_row_children_expansion(&GridRowId::from(1), false)
        .unwrap();
    assert_eq!(*grid.get_visible_row_ids(), ids(&[1, 5]));
}

#[test]
fn test_expansion_survives_row_updates() {
    let mut grid = DataGridPro::new(tree_props(0)).unwrap();
    grid.set_row_children_expansion(&GridRowId::from(5), true)
        .unwrap();

    let mut updated = rows();
    updated.push(
        GridRowModel::new()
            .with("id", 7)
            .with("path", "E/G")
            .with("name", "Anna"),
    );
    grid.set_rows(updated).unwrap();
    assert_eq!(*grid.get_visible_row_ids(), ids(&[1, 5, 6, 7]));
}

#[test]
fn test_sorting_sorts_each_group_of_siblings() {
    let mut grid = DataGridPro::new(tree_props(-1)).unwrap();
    grid.set_sort_model(vec![GridSortItem::asc("name")]).unwrap();
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[5, 6, 1, 2, 4, 3]));

    grid.update_props(|props| props.disable_children_sorting = true);
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[5, 6, 1, 2, 3, 4]));
}

#[test]
fn test_ancestors_of_matching_rows_stay_visible() {
    let mut grid = DataGridPro::new(tree_props(-1)).unwrap();
    grid.set_filter_model(
        GridFilterModel::new(
            vec![GridFilterItem::new("name", "contains", "Karen")],
            GridLinkOperator::And,
        ),
        None,
    )
    .unwrap();

    assert_eq!(*grid.get_visible_row_ids(), ids(&[1, 2, 4]));
    let filter = &grid.state_ref().filter;
    assert_eq!(
        filter.filtered_descendant_count_lookup.get(&GridRowId::from(1)),
        Some(&2)
    );
    assert_eq!(
        filter.filtered_descendant_count_lookup.get(&GridRowId::from(2)),
        Some(&1)
    );
    assert_eq!(filter.visible_rows_lookup.get(&GridRowId::from(5)), Some(&false));
}

#[test]
fn test_children_follow_their_parent_when_children_filtering_is_disabled() {
    let props = GridProps {
        disable_children_filtering: true,
        ..tree_props(-1)
    };
    let mut grid = DataGridPro::new(props).unwrap();
    grid.set_filter_model(
        GridFilterModel::new(
            vec![GridFilterItem::new("name", "equals", "Mary")],
            GridLinkOperator::And,
        ),
        None,
    )
    .unwrap();

    // "Tom" does not match but its parent does.
    assert_eq!(*grid.get_visible_row_ids(), ids(&[5, 6]));
}

#[test]
fn test_missing_levels_get_auto_generated_parents() {
    let rows = vec![
        GridRowModel::new().with("id", 1).with("path", "X/Y").with("name", "Leaf"),
    ];
    let props = GridProps {
        tree_data: true,
        get_tree_data_path: Some(path_getter()),
        default_grouping_expansion_depth: -1,
        ..GridProps::new(rows, vec![GridColDef::new("name")])
    };
    let grid = DataGridPro::new(props).unwrap();

    let group = GridRowId::from("auto-generated-row-X");
    let node = grid.get_row_node(&group).unwrap();
    assert!(node.is_auto_generated);
    assert_eq!(node.children, ids(&[1]));
    assert_eq!(grid.get_row(&group), None);
    assert_eq!(*grid.get_visible_row_ids(), vec![group, GridRowId::from(1)]);
}

#[test]
fn test_tree_data_requires_a_path_getter() {
    let props = GridProps {
        tree_data: true,
        ..GridProps::new(rows(), vec![GridColDef::new("name")])
    };
    assert!(matches!(
        DataGridPro::new(props),
        Err(GridError::MissingProp {
            prop: "getTreeDataPath",
            ..
        })
    ));
}

#[test]
fn test_turning_tree_data_off_flattens_the_rows() {
    let mut grid = DataGridPro::new(tree_props(0)).unwrap();
    assert_eq!(grid.get_visible_row_ids().len(), 2);

    grid.update_props(|props| props.tree_data = false);
    assert_eq!(grid.state_ref().rows.tree_depth, 1);
    assert_eq!(*grid.get_visible_row_ids(), ids(&[1, 2, 3, 4, 5, 6]));
}
