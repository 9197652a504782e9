use datagrid_core::{
    CellValue, DataGrid, GridApi, GridCallbackDetails, GridChangeReason, GridColDef, GridColType,
    GridEvent, GridEventName, GridFilterItem, GridFilterModel, GridLinkOperator, GridProps,
    GridRowId, GridRowModel, GridTimerKey, register_community_features,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn rows() -> Vec<GridRowModel> {
    [(0, "Nike", 100), (1, "Adidas", 80), (2, "Puma", 60), (3, "Reebok", 120)]
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

/// A grid with multi-column filtering enabled.
fn multi_filter_grid() -> GridApi {
    let mut api = GridApi::new(props());
    register_community_features(&mut api).unwrap();
    api.mount().unwrap();
    api
}

fn ids(values: &[i64]) -> Vec<GridRowId> {
    values.iter().map(|id| GridRowId::from(*id)).collect()
}

fn two_items(link_operator: GridLinkOperator) -> GridFilterModel {
    GridFilterModel::new(
        vec![
            GridFilterItem::new("brand", "contains", "i").with_id(1),
            GridFilterItem::new("price", ">", 70).with_id(2),
        ],
        link_operator,
    )
}

#[test]
fn test_items_combine_with_the_link_operator() {
    let mut api = multi_filter_grid();

    api.set_filter_model(two_items(GridLinkOperator::And), None)
        .unwrap();
    assert_eq!(*api.get_visible_row_ids(), ids(&[0, 1]));

    api.set_filter_link_operator(GridLinkOperator::Or).unwrap();
    assert_eq!(*api.get_visible_row_ids(), ids(&[0, 1, 3]));
}

#[test]
fn test_community_grid_keeps_only_the_first_item() {
    let mut grid = DataGrid::new(props()).unwrap();
    grid.set_filter_model(two_items(GridLinkOperator::And), None)
        .unwrap();

    let model = grid.get_filter_model();
    assert_eq!(model.items.len(), 1);
    assert_eq!(model.items[0].column_field, "brand");
    assert_eq!(*grid.get_visible_row_ids(), ids(&[0, 1]));
}

#[test]
fn test_upsert_and_delete_items() {
    let mut api = multi_filter_grid();
    let item = GridFilterItem::new("brand", "contains", "a").with_id(4);

    api.upsert_filter_item(item.clone()).unwrap();
    assert_eq!(*api.get_visible_row_ids(), ids(&[1, 2]));

    api.upsert_filter_item(GridFilterItem::new("brand", "equals", "puma").with_id(4))
        .unwrap();
    assert_eq!(api.get_filter_model().items.len(), 1);
    assert_eq!(*api.get_visible_row_ids(), ids(&[2]));

    api.delete_filter_item(&item).unwrap();
    assert!(api.get_filter_model().items.is_empty());
    assert_eq!(api.get_visible_row_ids().len(), 4);
}

#[test]
fn test_item_without_value_does_not_filter() {
    let mut api = multi_filter_grid();
    let item = GridFilterItem {
        value: None,
        ..GridFilterItem::new("brand", "contains", "x")
    };
    api.set_filter_model(GridFilterModel::new(vec![item], GridLinkOperator::And), None)
        .unwrap();
    assert_eq!(api.get_visible_row_ids().len(), 4);
}

#[test]
fn test_quick_filter_matches_any_column() {
    let mut api = multi_filter_grid();

    api.set_quick_filter_values(vec!["NI".to_string()]).unwrap();
    assert_eq!(*api.get_visible_row_ids(), ids(&[0]));

    // Tokens are combined with AND by default.
    api.set_quick_filter_values(vec!["a".to_string(), "m".to_string()])
        .unwrap();
    assert_eq!(*api.get_visible_row_ids(), ids(&[2]));

    api.set_quick_filter_values(vec!["120".to_string()]).unwrap();
    assert_eq!(*api.get_visible_row_ids(), ids(&[3]));

    api.set_quick_filter_values(Vec::new()).unwrap();
    assert_eq!(api.get_visible_row_ids().len(), 4);
}

#[test]
fn test_debounced_values_collapse_into_the_last_one() {
    let mut api = multi_filter_grid();
    api.upsert_filter_item(GridFilterItem::new("brand", "contains", "n").with_id(7))
        .unwrap();
    assert_eq!(*api.get_visible_row_ids(), ids(&[0]));

    api.set_filter_item_value_debounced(
        GridFilterItem::new("brand", "contains", "p").with_id(7),
        300,
    )
    .unwrap();
    api.advance_timers(Duration::from_millis(100));
    api.set_filter_item_value_debounced(
        GridFilterItem::new("brand", "contains", "pu").with_id(7),
        300,
    )
    .unwrap();

    api.advance_timers(Duration::from_millis(250));
    assert!(api.has_pending_timer(&GridTimerKey::FilterItemValue(7)));
    assert_eq!(*api.get_visible_row_ids(), ids(&[0]));

    api.advance_timers(Duration::from_millis(50));
    assert!(!api.has_pending_timer(&GridTimerKey::FilterItemValue(7)));
    assert_eq!(
        api.get_filter_model().items[0].value,
        Some(CellValue::from("pu"))
    );
    assert_eq!(*api.get_visible_row_ids(), ids(&[2]));
}

#[test]
fn test_deleting_an_item_drops_its_pending_value() {
    let mut api = multi_filter_grid();
    let item = GridFilterItem::new("brand", "contains", "n").with_id(7);
    api.upsert_filter_item(item.clone()).unwrap();

    api.set_filter_item_value_debounced(
        GridFilterItem::new("brand", "contains", "pu").with_id(7),
        300,
    )
    .unwrap();
    api.delete_filter_item(&item).unwrap();
    api.advance_timers(Duration::from_millis(300));

    assert!(api.get_filter_model().items.is_empty());
    assert_eq!(api.get_visible_row_ids().len(), 4);
}

#[test]
fn test_controlled_filter_model_waits_for_the_prop() {
    let calls: Rc<RefCell<Vec<GridFilterModel>>> = Rc::new(RefCell::new(Vec::new()));
    let seen = calls.clone();
    let props = GridProps {
        filter_model: Some(GridFilterModel::default()),
        on_filter_model_change: Some(Rc::new(
            move |model: &GridFilterModel, _: &GridCallbackDetails| {
                seen.borrow_mut().push(model.clone());
            },
        )),
        ..props()
    };
    let mut grid = DataGrid::new(props).unwrap();
    let events = Rc::new(RefCell::new(0));
    let counter = events.clone();
    grid.subscribe_event(GridEventName::FilterModelChange, move |_, _, _| {
        *counter.borrow_mut() += 1;
        Ok(())
    });

    let requested = GridFilterModel::new(
        vec![GridFilterItem::new("brand", "equals", "Puma").with_id(1)],
        GridLinkOperator::And,
    );
    grid.set_filter_model(requested.clone(), None).unwrap();

    assert_eq!(*calls.borrow(), vec![requested.clone()]);
    assert_eq!(*events.borrow(), 0);
    assert_eq!(grid.get_filter_model(), GridFilterModel::default());
    assert_eq!(grid.get_visible_row_ids().len(), 4);

    grid.update_props(|props| props.filter_model = Some(requested.clone()));
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(*events.borrow(), 1);
    assert_eq!(*grid.get_visible_row_ids(), ids(&[2]));
}

#[test]
fn test_uncontrolled_change_notifies_with_its_reason() {
    let reasons = Rc::new(RefCell::new(Vec::new()));
    let seen = reasons.clone();
    let mut grid = DataGrid::new(props()).unwrap();
    grid.subscribe_event(GridEventName::FilterModelChange, move |_, event, _| {
        if let GridEvent::FilterModelChange { reason, .. } = event {
            seen.borrow_mut().push(*reason);
        }
        Ok(())
    });

    grid.upsert_filter_item(GridFilterItem::new("brand", "contains", "a").with_id(1))
        .unwrap();
    assert_eq!(
        *reasons.borrow(),
        vec![Some(GridChangeReason::UpsertFilterItem)]
    );
}

#[test]
fn test_removing_a_column_drops_its_items() {
    let mut api = multi_filter_grid();
    api.set_filter_model(two_items(GridLinkOperator::And), None)
        .unwrap();

    api.set_columns(vec![GridColDef::new("brand")]).unwrap();
    let model = api.get_filter_model();
    assert_eq!(model.items.len(), 1);
    assert_eq!(model.items[0].column_field, "brand");
    assert_eq!(*api.get_visible_row_ids(), ids(&[0, 1]));
}

#[test]
fn test_equals_ignores_accents_and_case() {
    let rows = ["Résumé", "Resumes", "CAFÉ"]
        .into_iter()
        .enumerate()
        .map(|(id, title)| GridRowModel::new().with("id", id as i64).with("title", title))
        .collect();
    let mut grid = DataGrid::new(GridProps::new(rows, vec![GridColDef::new("title")])).unwrap();

    grid.upsert_filter_item(GridFilterItem::new("title", "equals", "resume").with_id(1))
        .unwrap();
    assert_eq!(*grid.get_visible_row_ids(), ids(&[0]));

    grid.upsert_filter_item(GridFilterItem::new("title", "equals", "cafe").with_id(1))
        .unwrap();
    assert_eq!(*grid.get_visible_row_ids(), ids(&[2]));
}
