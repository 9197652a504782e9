use datagrid_core::props::{
    GridColumnDimensions, GridColumnsInitialState, GridFilterInitialState,
    GridPaginationInitialState, GridSortingInitialState,
};
use datagrid_core::{
    DataGrid, GridColDef, GridColType, GridError, GridFilterItem, GridFilterModel,
    GridInitialState, GridLinkOperator, GridProps, GridRowModel, GridSortItem,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn props() -> GridProps {
    let rows = (0..25)
        .map(|id| {
            GridRowModel::new()
                .with("id", id)
                .with("brand", format!("brand {id}"))
                .with("price", id * 10)
                .with("country", "France")
        })
        .collect();
    GridProps {
        pagination: true,
        ..GridProps::new(
            rows,
            vec![
                GridColDef::new("brand"),
                GridColDef::new("price").with_type(GridColType::Number),
                GridColDef::new("country"),
            ],
        )
    }
}

fn filter_model() -> GridFilterModel {
    GridFilterModel::new(
        vec![GridFilterItem::new("price", ">", 50).with_id(1)],
        GridLinkOperator::And,
    )
}

/// A grid with every persistable slice away from its default.
fn customized_grid() -> DataGrid {
    let mut grid = DataGrid::new(props()).unwrap();
    grid.set_filter_model(filter_model(), None).unwrap();
    grid.set_sort_model(vec![GridSortItem::desc("price")]).unwrap();
    grid.set_page_size(10);
    grid.set_page(1);
    grid.set_column_visibility("country", false);
    grid.set_column_index("price", 0).unwrap();
    grid.set_column_width("brand", 150.0).unwrap();
    grid
}

#[test]
fn test_default_grid_exports_nothing() {
    let grid = DataGrid::new(props()).unwrap();
    assert_eq!(grid.export_state(), GridInitialState::default());
}

#[test]
fn test_export_lists_every_changed_slice() {
    let grid = customized_grid();
    let expected = GridInitialState {
        columns: Some(GridColumnsInitialState {
            column_visibility_model: Some(BTreeMap::from([("country".to_string(), false)])),
            ordered_fields: Some(vec![
                "price".to_string(),
                "brand".to_string(),
                "country".to_string(),
            ]),
            dimensions: Some(BTreeMap::from([(
                "brand".to_string(),
                GridColumnDimensions {
                    width: Some(150.0),
                    ..GridColumnDimensions::default()
                },
            )])),
        }),
        filter: Some(GridFilterInitialState {
            filter_model: Some(filter_model()),
        }),
        sorting: Some(GridSortingInitialState {
            sort_model: Some(vec![GridSortItem::desc("price")]),
        }),
        pagination: Some(GridPaginationInitialState {
            page: Some(1),
            page_size: Some(10),
        }),
        pinned_columns: None,
        preference_panel: None,
    };
    assert_eq!(grid.export_state(), expected);
}

#[test]
fn test_restore_reproduces_the_exported_grid() {
    let source = customized_grid();
    let exported = source.export_state();

    let mut target = DataGrid::new(props()).unwrap();
    target.restore_state(exported.clone()).unwrap();

    assert_eq!(target.export_state(), exported);
    assert_eq!(target.get_paginated_row_ids(), source.get_paginated_row_ids());
    assert_eq!(
        target.get_visible_columns().len(),
        source.get_visible_columns().len()
    );
    assert_eq!(target.get_column("brand").unwrap().computed_width, 150.0);

    target.restore_state(exported.clone()).unwrap();
    assert_eq!(target.export_state(), exported);
    assert_eq!(target.get_paginated_row_ids(), source.get_paginated_row_ids());
}

#[test]
fn test_initial_state_prop_matches_a_restore() {
    let exported = customized_grid().export_state();
    let grid = DataGrid::new(GridProps {
        initial_state: Some(exported.clone()),
        ..props()
    })
    .unwrap();
    assert_eq!(grid.export_state(), exported);
}

#[test]
fn test_json_round_trip() {
    let source = customized_grid();
    let json = source.export_state_json().unwrap();
    assert!(json.contains(r#""sortModel":[{"field":"price","sort":"desc"}]"#));

    let mut target = DataGrid::new(props()).unwrap();
    target.restore_state_json(&json).unwrap();
    assert_eq!(target.export_state(), source.export_state());

    assert!(matches!(
        target.restore_state_json("{not json"),
        Err(GridError::Serialization(_))
    ));
}
