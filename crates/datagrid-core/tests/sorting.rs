use datagrid_core::{
    DataGrid, GridApi, GridColDef, GridColType, GridEvent, GridEventName, GridFeatureMode,
    GridProps, GridRowId, GridRowModel, GridSortDirection, GridSortItem, GridSubscribeOptions,
    register_community_features,
};
use pretty_assertions::assert_eq;

fn rows() -> Vec<GridRowModel> {
    [
        (0, "Nike", 100),
        (1, "Adidas", 80),
        (2, "Puma", 80),
        (3, "Reebok", 120),
        (4, "Asics", 100),
    ]
    .into_iter()
    .map(|(id, brand, price)| {
        GridRowModel::new()
            .with("id", id)
            .with("brand", brand)
            .with("price", price)
    })
    .collect()
}

fn props() -> GridProps {
    GridProps::new(
        rows(),
        vec![
            GridColDef::new("brand"),
            GridColDef::new("price").with_type(GridColType::Number),
        ],
    )
}

fn multi_sort_grid() -> GridApi {
    let mut api = GridApi::new(props());
    register_community_features(&mut api).unwrap();
    api.mount().unwrap();
    api
}

fn ids(values: &[i64]) -> Vec<GridRowId> {
    values.iter().map(|id| GridRowId::from(*id)).collect()
}

fn click_header(api: &mut GridApi, field: &str, multi: bool) {
    api.publish_event(GridEvent::ColumnHeaderClick {
        field: field.to_string(),
        multi,
    });
}

#[test]
fn test_equal_values_keep_their_order() {
    let mut grid = DataGrid::new(props()).unwrap();

    grid.set_sort_model(vec![GridSortItem::asc("price")]).unwrap();
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[1, 2, 0, 4, 3]));

    grid.set_sort_model(vec![GridSortItem::desc("price")]).unwrap();
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[3, 0, 4, 1, 2]));
}

#[test]
fn test_header_click_cycles_through_the_sorting_order() {
    let mut grid = DataGrid::new(props()).unwrap();

    click_header(grid.api_mut(), "brand", false);
    assert_eq!(grid.get_sort_model(), vec![GridSortItem::asc("brand")]);
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[1, 4, 0, 2, 3]));

    click_header(grid.api_mut(), "brand", false);
    assert_eq!(grid.get_sort_model(), vec![GridSortItem::desc("brand")]);

    click_header(grid.api_mut(), "brand", false);
    assert!(grid.get_sort_model().is_empty());
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[0, 1, 2, 3, 4]));
}

#[test]
fn test_custom_sorting_order() {
    let props = GridProps {
        sorting_order: vec![Some(GridSortDirection::Desc), Some(GridSortDirection::Asc)],
        ..props()
    };
    let mut grid = DataGrid::new(props).unwrap();

    click_header(grid.api_mut(), "price", false);
    assert_eq!(grid.get_sort_model(), vec![GridSortItem::desc("price")]);
    click_header(grid.api_mut(), "price", false);
    assert_eq!(grid.get_sort_model(), vec![GridSortItem::asc("price")]);
    click_header(grid.api_mut(), "price", false);
    assert_eq!(grid.get_sort_model(), vec![GridSortItem::desc("price")]);
}

#[test]
fn test_multi_sorting_needs_the_modifier_and_the_feature() {
    let mut api = multi_sort_grid();
    click_header(&mut api, "price", false);
    click_header(&mut api, "brand", true);
    click_header(&mut api, "brand", true);

    assert_eq!(
        api.get_sort_model(),
        vec![GridSortItem::asc("price"), GridSortItem::desc("brand")]
    );
    assert_eq!(*api.get_sorted_row_ids(), ids(&[2, 1, 0, 4, 3]));

    // Without the modifier the clicked column replaces the model.
    click_header(&mut api, "price", false);
    assert_eq!(api.get_sort_model(), vec![GridSortItem::desc("price")]);

    let mut grid = DataGrid::new(props()).unwrap();
    click_header(grid.api_mut(), "price", false);
    click_header(grid.api_mut(), "brand", true);
    assert_eq!(grid.get_sort_model(), vec![GridSortItem::asc("brand")]);
}

#[test]
fn test_unsortable_column_ignores_clicks() {
    let mut brand = GridColDef::new("brand");
    brand.sortable = false;
    let mut grid = DataGrid::new(GridProps::new(rows(), vec![brand])).unwrap();

    click_header(grid.api_mut(), "brand", false);
    assert!(grid.get_sort_model().is_empty());
}

#[test]
fn test_sort_column_forces_a_direction() {
    let mut grid = DataGrid::new(props()).unwrap();
    grid.sort_column("price", Some(Some(GridSortDirection::Desc)), false)
        .unwrap();
    assert_eq!(grid.get_sort_model(), vec![GridSortItem::desc("price")]);
    assert_eq!(grid.get_row_index(&GridRowId::from(3)), Some(0));
    assert_eq!(grid.get_row_id_from_row_index(1), Some(GridRowId::from(0)));

    grid.sort_column("price", Some(None), false).unwrap();
    assert!(grid.get_sort_model().is_empty());
}

#[test]
fn test_new_rows_are_sorted() {
    let mut grid = DataGrid::new(props()).unwrap();
    grid.set_sort_model(vec![GridSortItem::asc("price")]).unwrap();

    grid.update_rows(vec![
        GridRowModel::new()
            .with("id", 5)
            .with("brand", "Fila")
            .with("price", 10),
    ])
    .unwrap();
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[5, 1, 2, 0, 4, 3]));
}

#[test]
fn test_removing_a_column_drops_its_sort_item() {
    let mut grid = DataGrid::new(props()).unwrap();
    grid.set_sort_model(vec![GridSortItem::asc("price")]).unwrap();

    grid.set_columns(vec![GridColDef::new("brand")]).unwrap();
    assert!(grid.get_sort_model().is_empty());
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[0, 1, 2, 3, 4]));
}

#[test]
fn test_server_sorting_keeps_the_row_order() {
    let props = GridProps {
        sorting_mode: GridFeatureMode::Server,
        ..props()
    };
    let mut grid = DataGrid::new(props).unwrap();
    grid.set_sort_model(vec![GridSortItem::asc("price")]).unwrap();

    assert_eq!(grid.get_sort_model(), vec![GridSortItem::asc("price")]);
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[0, 1, 2, 3, 4]));
}

#[test]
fn test_accented_text_sorts_on_base_letters() {
    let rows = ["zèbre", "Éclair", "abricot", "eclair"]
        .into_iter()
        .enumerate()
        .map(|(id, name)| GridRowModel::new().with("id", id as i64).with("name", name))
        .collect();
    let mut grid = DataGrid::new(GridProps::new(rows, vec![GridColDef::new("name")])).unwrap();

    grid.set_sort_model(vec![GridSortItem::asc("name")]).unwrap();
    assert_eq!(*grid.get_sorted_row_ids(), ids(&[2, 3, 1, 0]));
}

#[test]
fn test_prevented_header_click_does_not_sort() {
    let mut grid = DataGrid::new(props()).unwrap();
    grid.subscribe_event_with(
        GridEventName::ColumnHeaderClick,
        GridSubscribeOptions { is_first: true },
        |_, event, meta| {
            if let GridEvent::ColumnHeaderClick { field, .. } = event
                && field == "brand"
            {
                meta.prevent_default();
            }
            Ok(())
        },
    );

    click_header(grid.api_mut(), "brand", false);
    assert!(grid.get_sort_model().is_empty());

    click_header(grid.api_mut(), "price", false);
    assert_eq!(grid.get_sort_model(), vec![GridSortItem::asc("price")]);
}
