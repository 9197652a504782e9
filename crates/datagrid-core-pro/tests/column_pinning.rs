use datagrid_core::{
    GridCallbackDetails, GridCellIndexCoordinates, GridColDef, GridColumnMenuItem, GridError,
    GridPinnedColumns, GridPinnedPosition, GridProps, GridRowModel,
};
use datagrid_core_pro::{DataGridPro, GridColumnPinningApi};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn columns(fields: &[&str]) -> Vec<GridColDef> {
    fields.iter().map(|field| GridColDef::new(*field)).collect()
}

fn rows() -> Vec<GridRowModel> {
    (0..3)
        .map(|id| GridRowModel::new().with("id", id).with("a", "x"))
        .collect()
}

fn grid(fields: &[&str]) -> DataGridPro {
    DataGridPro::new(GridProps::new(rows(), columns(fields))).unwrap()
}

fn order(grid: &DataGridPro) -> Vec<String> {
    grid.state_ref().columns.all.clone()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn test_pinned_columns_from_props_move_to_edges() {
    let props = GridProps {
        pinned_columns: Some(GridPinnedColumns {
            left: strings(&["price"]),
            right: strings(&["id"]),
        }),
        ..GridProps::new(rows(), columns(&["id", "brand", "price", "year"]))
    };
    let grid = DataGridPro::new(props).unwrap();
    assert_eq!(order(&grid), strings(&["price", "brand", "year", "id"]));
    assert_eq!(grid.is_column_pinned("price"), Some(GridPinnedPosition::Left));
    assert_eq!(grid.is_column_pinned("id"), Some(GridPinnedPosition::Right));
    assert_eq!(grid.is_column_pinned("brand"), None);
}

#[test]
fn test_unpin_after_reorder_follows_the_move() {
    let mut grid = grid(&["id", "cp", "1M", "2M"]);

    grid.pin_column("1M", GridPinnedPosition::Left).unwrap();
    assert_eq!(order(&grid), strings(&["1M", "id", "cp", "2M"]));

    grid.set_column_index("id", 2).unwrap();
    assert_eq!(order(&grid), strings(&["1M", "cp", "id", "2M"]));

    grid.unpin_column("1M").unwrap();
    assert_eq!(order(&grid), strings(&["cp", "id", "1M", "2M"]));
}

#[test]
fn test_unpin_restores_position_across_column_updates() {
    let mut grid = grid(&["a", "b", "c"]);

    grid.pin_column("b", GridPinnedPosition::Right).unwrap();
    assert_eq!(order(&grid), strings(&["a", "c", "b"]));

    grid.update_columns(columns(&["d"])).unwrap();
    assert_eq!(order(&grid), strings(&["a", "c", "d", "b"]));

    grid.unpin_column("b").unwrap();
    assert_eq!(order(&grid), strings(&["a", "b", "c", "d"]));

    grid.pin_column("b", GridPinnedPosition::Right).unwrap();
    grid.set_columns(columns(&["a", "b", "d"])).unwrap();
    assert_eq!(order(&grid), strings(&["a", "d", "b"]));

    grid.unpin_column("b").unwrap();
    assert_eq!(order(&grid), strings(&["a", "b", "d"]));
}

#[test]
fn test_pin_to_other_side_moves_the_column() {
    let mut grid = grid(&["a", "b", "c"]);
    grid.pin_column("a", GridPinnedPosition::Left).unwrap();
    grid.pin_column("a", GridPinnedPosition::Right).unwrap();

    assert_eq!(
        grid.get_pinned_columns(),
        GridPinnedColumns {
            left: Vec::new(),
            right: strings(&["a"]),
        }
    );
    assert_eq!(order(&grid), strings(&["b", "c", "a"]));

    let version = grid.version();
    grid.pin_column("a", GridPinnedPosition::Right).unwrap();
    assert!(!grid.has_changed_since(version));
}

#[test]
fn test_disabled_pinning_rejects_api_calls() {
    let props = GridProps {
        disable_column_pinning: true,
        pinned_columns: Some(GridPinnedColumns {
            left: strings(&["b"]),
            right: Vec::new(),
        }),
        ..GridProps::new(rows(), columns(&["a", "b"]))
    };
    let mut grid = DataGridPro::new(props).unwrap();

    assert_eq!(grid.get_pinned_columns(), GridPinnedColumns::default());
    assert_eq!(order(&grid), strings(&["a", "b"]));
    assert_eq!(
        grid.pin_column("a", GridPinnedPosition::Left),
        Err(GridError::FeatureDisabled {
            method: "pinColumn",
            prop: "disableColumnPinning",
        })
    );
    assert!(matches!(
        grid.unpin_column("a"),
        Err(GridError::FeatureDisabled { .. })
    ));
    assert!(matches!(
        grid.set_pinned_columns(GridPinnedColumns::default()),
        Err(GridError::FeatureDisabled { .. })
    ));
}

#[test]
fn test_controlled_pinned_columns_wait_for_the_prop() {
    let calls: Rc<RefCell<Vec<GridPinnedColumns>>> = Rc::new(RefCell::new(Vec::new()));
    let seen = calls.clone();
    let props = GridProps {
        pinned_columns: Some(GridPinnedColumns::default()),
        on_pinned_columns_change: Some(Rc::new(
            move |pinned: &GridPinnedColumns, _: &GridCallbackDetails| {
                seen.borrow_mut().push(pinned.clone());
            },
        )),
        ..GridProps::new(rows(), columns(&["a", "b"]))
    };
    let mut grid = DataGridPro::new(props).unwrap();

    grid.pin_column("b", GridPinnedPosition::Left).unwrap();
    let requested = GridPinnedColumns {
        left: strings(&["b"]),
        right: Vec::new(),
    };
    assert_eq!(*calls.borrow(), vec![requested.clone()]);
    assert_eq!(grid.get_pinned_columns(), GridPinnedColumns::default());
    assert_eq!(order(&grid), strings(&["a", "b"]));

    grid.update_props(|props| props.pinned_columns = Some(requested.clone()));
    assert_eq!(grid.get_pinned_columns(), requested);
    assert_eq!(order(&grid), strings(&["b", "a"]));
}

#[test]
fn test_reordering_into_pinned_areas_is_refused() {
    let mut grid = grid(&["a", "b", "c", "d", "e"]);
    assert!(grid.can_column_be_reordered("c", 0));

    grid.pin_column("a", GridPinnedPosition::Left).unwrap();
    grid.pin_column("e", GridPinnedPosition::Right).unwrap();

    assert!(!grid.can_column_be_reordered("c", 0));
    assert!(grid.can_column_be_reordered("c", 1));
    assert!(grid.can_column_be_reordered("c", 3));
    assert!(!grid.can_column_be_reordered("c", 4));
}

#[test]
fn test_column_menu_lists_pin_items() {
    let mut locked = GridColDef::new("locked");
    locked.pinnable = false;
    let mut defs = columns(&["a", "b"]);
    defs.push(locked);
    let mut grid = DataGridPro::new(GridProps::new(rows(), defs)).unwrap();

    let items = grid.get_column_menu_items("a").unwrap();
    assert!(items.ends_with(&[
        GridColumnMenuItem::Divider,
        GridColumnMenuItem::PinToLeft,
        GridColumnMenuItem::PinToRight,
    ]));

    grid.pin_column("a", GridPinnedPosition::Left).unwrap();
    let items = grid.get_column_menu_items("a").unwrap();
    assert!(items.ends_with(&[
        GridColumnMenuItem::Divider,
        GridColumnMenuItem::PinToRight,
        GridColumnMenuItem::Unpin,
    ]));

    let items = grid.get_column_menu_items("locked").unwrap();
    assert!(!items.contains(&GridColumnMenuItem::Divider));
}

#[test]
fn test_scroll_to_column_accounts_for_pinned_widths() {
    let mut grid = grid(&["a", "b", "c", "d", "e"]);
    grid.set_viewport_size(250.0, 500.0);
    grid.pin_column("a", GridPinnedPosition::Left).unwrap();
    grid.pin_column("e", GridPinnedPosition::Right).unwrap();

    // "d" ends at 400 and the right pinned column hides the last 100 pixels.
    let scrolled = grid
        .scroll_to_indexes(GridCellIndexCoordinates {
            row_index: None,
            col_index: Some(3),
        })
        .unwrap();
    assert!(scrolled);
    assert_eq!(grid.get_dimensions().scroll_left, 250.0);

    // "b" starts at 100, right after the left pinned column.
    grid.scroll_to_indexes(GridCellIndexCoordinates {
        row_index: None,
        col_index: Some(1),
    })
    .unwrap();
    assert_eq!(grid.get_dimensions().scroll_left, 0.0);
}

#[test]
fn test_scroll_to_first_column_uses_the_default_scroll() {
    let mut grid = grid(&["a", "b", "c"]);
    grid.set_viewport_size(150.0, 500.0);
    grid.pin_column("c", GridPinnedPosition::Left).unwrap();

    grid.scroll_to_indexes(GridCellIndexCoordinates {
        row_index: None,
        col_index: Some(2),
    })
    .unwrap();
    assert_eq!(grid.get_dimensions().scroll_left, 150.0);

    // Index 0 is the pinned "c", but the viewport still scrolls back to the start.
    let scrolled = grid
        .scroll_to_indexes(GridCellIndexCoordinates {
            row_index: None,
            col_index: Some(0),
        })
        .unwrap();
    assert!(scrolled);
    assert_eq!(grid.get_dimensions().scroll_left, 0.0);
}

#[test]
fn test_export_and_restore_pinned_columns() {
    let mut source = grid(&["a", "b", "c"]);
    assert_eq!(source.export_state().pinned_columns, None);

    source.pin_column("c", GridPinnedPosition::Left).unwrap();
    let exported = source.export_state();
    assert_eq!(
        exported.pinned_columns,
        Some(GridPinnedColumns {
            left: strings(&["c"]),
            right: Vec::new(),
        })
    );

    let mut target = grid(&["a", "b", "c"]);
    target.restore_state(exported.clone()).unwrap();
    assert_eq!(target.get_pinned_columns(), source.get_pinned_columns());
    assert_eq!(order(&target), strings(&["c", "a", "b"]));
    assert_eq!(target.export_state(), exported);
}

#[test]
fn test_pinned_columns_survive_a_json_round_trip() {
    let mut source = grid(&["a", "b", "c"]);
    source.pin_column("a", GridPinnedPosition::Right).unwrap();

    let json = source.export_state_json().unwrap();
    let document: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        document["pinnedColumns"],
        serde_json::json!({ "left": [], "right": ["a"] })
    );

    let mut target = grid(&["a", "b", "c"]);
    target.restore_state_json(&json).unwrap();
    assert_eq!(target.is_column_pinned("a"), Some(GridPinnedPosition::Right));
    assert_eq!(order(&target), strings(&["b", "c", "a"]));
}
