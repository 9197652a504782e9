use datagrid_core::col_def::GridPreProcessEditCellProps;
use datagrid_core::{
    CellValue, DataGrid, GridColDef, GridColType, GridEditCellProps, GridEditCellValueParams,
    GridError, GridEvent, GridEventName, GridProps, GridRowId, GridRowMode, GridRowModel,
    GridTimerKey,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn rows() -> Vec<GridRowModel> {
    vec![
        GridRowModel::new()
            .with("id", 1)
            .with("name", "Nike")
            .with("price", 100)
            .with("country", "USA"),
        GridRowModel::new()
            .with("id", 2)
            .with("name", "Puma")
            .with("price", 60)
            .with("country", "Germany"),
    ]
}

fn columns() -> Vec<GridColDef> {
    vec![
        GridColDef::new("name").editable(),
        GridColDef::new("price")
            .with_type(GridColType::Number)
            .editable(),
        GridColDef::new("country"),
    ]
}

fn grid_with(props: GridProps) -> DataGrid {
    DataGrid::new(props).unwrap()
}

fn grid() -> DataGrid {
    grid_with(GridProps::new(rows(), columns()))
}

fn id() -> GridRowId {
    GridRowId::from(1)
}

fn edit(
    field: &str,
    value: impl Into<CellValue>,
    debounce_ms: Option<u64>,
) -> GridEditCellValueParams {
    GridEditCellValueParams {
        id: id(),
        field: field.to_string(),
        value: value.into(),
        debounce_ms,
    }
}

#[test]
fn test_edited_row_is_committed_on_stop() {
    let mut grid = grid();
    grid.start_row_edit_mode(&id()).unwrap();
    assert_eq!(grid.get_row_mode(&id()), GridRowMode::Edit);

    // Number columns parse the text typed in.
    grid.set_edit_cell_value(edit("price", "120", None)).unwrap();
    grid.set_edit_cell_value(edit("name", "Nike Air", None)).unwrap();
    assert_eq!(
        grid.get_row(&id()).unwrap().get("price"),
        Some(&CellValue::from(100))
    );

    grid.stop_row_edit_mode(&id(), false).unwrap();
    assert_eq!(grid.get_row_mode(&id()), GridRowMode::View);
    let row = grid.get_row(&id()).unwrap();
    assert_eq!(row.get("price"), Some(&CellValue::from(120)));
    assert_eq!(row.get("name"), Some(&CellValue::from("Nike Air")));
    assert_eq!(row.get("country"), Some(&CellValue::from("USA")));
}

#[test]
fn test_ignored_modifications_leave_the_row_untouched() {
    let mut grid = grid();
    grid.start_row_edit_mode(&id()).unwrap();
    grid.set_edit_cell_value(edit("name", "Reebok", None)).unwrap();

    grid.stop_row_edit_mode(&id(), true).unwrap();
    assert_eq!(
        grid.get_row(&id()).unwrap().get("name"),
        Some(&CellValue::from("Nike"))
    );
}

#[test]
fn test_only_editable_cells_can_change() {
    let mut grid = grid();
    assert_eq!(
        grid.set_edit_cell_value(edit("name", "x", None)),
        Err(GridError::RowNotInEditMode(id()))
    );

    grid.start_row_edit_mode(&id()).unwrap();
    assert_eq!(
        grid.start_row_edit_mode(&id()),
        Err(GridError::RowAlreadyInEditMode(id()))
    );
    assert_eq!(
        grid.set_edit_cell_value(edit("country", "France", None)),
        Err(GridError::CellNotInEditMode {
            id: id(),
            field: "country".to_string(),
        })
    );
    assert_eq!(
        grid.start_row_edit_mode(&GridRowId::from(9)),
        Err(GridError::RowNotFound(GridRowId::from(9)))
    );
}

#[test]
fn test_debounced_values_collapse_into_the_last_one() {
    let mut grid = grid();
    let applied = Rc::new(RefCell::new(Vec::new()));
    let seen = applied.clone();
    grid.subscribe_event(GridEventName::EditCellValueChange, move |_, event, _| {
        if let GridEvent::EditCellValueChange { value, .. } = event {
            seen.borrow_mut().push(value.clone());
        }
        Ok(())
    });
    grid.start_row_edit_mode(&id()).unwrap();

    grid.set_edit_cell_value(edit("name", "N", Some(200))).unwrap();
    grid.advance_timers(Duration::from_millis(150));
    grid.set_edit_cell_value(edit("name", "Ne", Some(200))).unwrap();
    grid.advance_timers(Duration::from_millis(150));
    assert!(applied.borrow().is_empty());

    grid.advance_timers(Duration::from_millis(50));
    assert_eq!(*applied.borrow(), vec![CellValue::from("Ne")]);
    assert_eq!(
        grid.get_edit_row(&id()).unwrap().get("name"),
        Some(&CellValue::from("Ne"))
    );
}

#[test]
fn test_stop_flushes_pending_values() {
    let mut grid = grid();
    grid.start_row_edit_mode(&id()).unwrap();
    grid.set_edit_cell_value(edit("name", "Nike Air", Some(500))).unwrap();

    grid.stop_row_edit_mode(&id(), false).unwrap();
    let key = GridTimerKey::EditCellValue {
        id: id(),
        field: "name".to_string(),
    };
    assert!(!grid.has_pending_timer(&key));
    assert_eq!(
        grid.get_row(&id()).unwrap().get("name"),
        Some(&CellValue::from("Nike Air"))
    );
}

#[test]
fn test_rejected_cell_keeps_the_row_in_edit_mode() {
    let reject_negative: GridPreProcessEditCellProps = Rc::new(
        |_: &GridRowId, _: &GridRowModel, props: GridEditCellProps| GridEditCellProps {
            error: props.value.as_number().is_some_and(|price| price < 0.0),
            ..props
        },
    );
    let mut price = GridColDef::new("price")
        .with_type(GridColType::Number)
        .editable();
    price.pre_process_edit_cell_props = Some(reject_negative);
    let mut grid = grid_with(GridProps::new(rows(), vec![price]));

    grid.start_row_edit_mode(&id()).unwrap();
    grid.set_edit_cell_value(edit("price", -5, None)).unwrap();
    grid.stop_row_edit_mode(&id(), false).unwrap();
    assert_eq!(grid.get_row_mode(&id()), GridRowMode::Edit);

    grid.set_edit_cell_value(edit("price", 5, None)).unwrap();
    grid.stop_row_edit_mode(&id(), false).unwrap();
    assert_eq!(grid.get_row_mode(&id()), GridRowMode::View);
    assert_eq!(
        grid.get_row(&id()).unwrap().get("price"),
        Some(&CellValue::from(5))
    );
}

#[test]
fn test_process_row_update_can_rewrite_or_reject() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let seen = errors.clone();
    let props = GridProps {
        process_row_update: Some(Rc::new(|new_row: &GridRowModel, _: &GridRowModel| {
            match new_row.get("name").and_then(CellValue::as_str) {
                Some("") => Err(GridError::ProcessRowUpdate("name is required".to_string())),
                Some(name) => Ok(new_row.clone().with("name", name.to_uppercase())),
                None => Ok(new_row.clone()),
            }
        })),
        on_process_row_update_error: Some(Rc::new(move |err: &GridError| {
            seen.borrow_mut().push(err.clone());
        })),
        ..GridProps::new(rows(), columns())
    };
    let mut grid = grid_with(props);

    grid.start_row_edit_mode(&id()).unwrap();
    grid.set_edit_cell_value(edit("name", "", None)).unwrap();
    grid.stop_row_edit_mode(&id(), false).unwrap();
    assert_eq!(grid.get_row_mode(&id()), GridRowMode::Edit);
    assert_eq!(
        *errors.borrow(),
        vec![GridError::ProcessRowUpdate("name is required".to_string())]
    );

    grid.set_edit_cell_value(edit("name", "air max", None)).unwrap();
    grid.stop_row_edit_mode(&id(), false).unwrap();
    assert_eq!(grid.get_row_mode(&id()), GridRowMode::View);
    assert_eq!(
        grid.get_row(&id()).unwrap().get("name"),
        Some(&CellValue::from("AIR MAX"))
    );
}
