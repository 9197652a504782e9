use super::{GridCellParams, GridFilterOperator, GridFilterPredicate, GridStateColDef};
use crate::features::filter::GridFilterItem;
use crate::value::{CellValue, locale_equals};
use regex::{Regex, RegexBuilder};
use std::rc::Rc;

fn case_insensitive(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!("failed to build filter pattern {:?}: {}", pattern, err);
            None
        }
    }
}

/// Text of the filter item, trimmed unless the column disables trimming.
fn filter_text(item: &GridFilterItem, column: &GridStateColDef) -> Option<String> {
    let text = match item.value.as_ref()? {
        CellValue::Null | CellValue::List(_) => return None,
        value => value.to_display_string(),
    };
    let text = if column.disable_trim {
        text
    } else {
        text.trim().to_string()
    };
    (!text.is_empty()).then_some(text)
}

fn regex_operator(value: &str, build_pattern: fn(&str) -> String) -> GridFilterOperator {
    GridFilterOperator::new(value, move |item, column| {
        let text = filter_text(item, column)?;
        let regex = case_insensitive(&build_pattern(&regex::escape(&text)))?;
        let predicate: GridFilterPredicate = Rc::new(move |params: &GridCellParams<'_>| {
            !params.value.is_null() && regex.is_match(&params.value.to_display_string())
        });
        Some(predicate)
    })
}

/// Operators of string columns: `contains`, `equals`, `startsWith`, `endsWith`, `isEmpty`,
/// `isNotEmpty` and `isAnyOf`.
pub fn grid_string_operators() -> Vec<GridFilterOperator> {
    vec![
        regex_operator("contains", |escaped| escaped.to_string()),
        GridFilterOperator::new("equals", |item, column| {
            let text = filter_text(item, column)?;
            let predicate: GridFilterPredicate = Rc::new(move |params: &GridCellParams<'_>| {
                !params.value.is_null() && locale_equals(&text, &params.value.to_display_string())
            });
            Some(predicate)
        }),
        regex_operator("startsWith", |escaped| format!("^{}", escaped)),
        regex_operator("endsWith", |escaped| format!("{}$", escaped)),
        GridFilterOperator::new("isEmpty", |_, _| {
            let predicate: GridFilterPredicate =
                Rc::new(|params: &GridCellParams<'_>| params.value.is_empty());
            Some(predicate)
        })
        .without_value(),
        GridFilterOperator::new("isNotEmpty", |_, _| {
            let predicate: GridFilterPredicate =
                Rc::new(|params: &GridCellParams<'_>| !params.value.is_empty());
            Some(predicate)
        })
        .without_value(),
        GridFilterOperator::new("isAnyOf", |item, column| {
            let values = item.value.as_ref()?.as_list()?;
            if values.is_empty() {
                return None;
            }
            let candidates: Vec<String> = values
                .iter()
                .map(|value| {
                    let text = value.to_display_string();
                    if column.disable_trim {
                        text
                    } else {
                        text.trim().to_string()
                    }
                })
                .collect();
            let predicate: GridFilterPredicate = Rc::new(move |params: &GridCellParams<'_>| {
                if params.value.is_null() {
                    return false;
                }
                let cell = params.value.to_display_string();
                candidates
                    .iter()
                    .any(|candidate| locale_equals(candidate, &cell))
            });
            Some(predicate)
        }),
    ]
}

/// Quick filter of string columns: case-insensitive `contains`.
pub fn get_grid_string_quick_filter_fn(
    value: &str,
    _column: &GridStateColDef,
) -> Option<GridFilterPredicate> {
    if value.is_empty() {
        return None;
    }
    let regex = case_insensitive(&regex::escape(value))?;
    Some(Rc::new(move |params: &GridCellParams<'_>| {
        !params.value.is_null() && regex.is_match(&params.value.to_display_string())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::col_def::GridColDef;
    use crate::value::{GridRowId, GridRowModel};

    fn matches(operator: &str, filter: CellValue, cell: CellValue) -> Option<bool> {
        let column = GridStateColDef::resolve(GridColDef::new("brand"));
        let item = GridFilterItem::new("brand", operator, filter);
        let predicate = (column.filter_operator(operator)?.get_apply_filter_fn)(&item, &column)?;
        let row = GridRowModel::new();
        let id = GridRowId::Number(0);
        Some(predicate(&GridCellParams {
            id: &id,
            field: "brand",
            value: cell,
            row: &row,
        }))
    }

    #[test]
    fn test_contains_is_case_insensitive_and_trims() {
        assert_eq!(matches("contains", " a ".into(), "Adidas".into()), Some(true));
        assert_eq!(matches("contains", "a".into(), "Nike".into()), Some(false));
        assert_eq!(matches("contains", "a".into(), CellValue::Null), Some(false));
        assert_eq!(matches("contains", "".into(), "Nike".into()), None);
    }

    #[test]
    fn test_regex_special_characters_are_escaped() {
        assert_eq!(matches("contains", "a.b".into(), "a.b".into()), Some(true));
        assert_eq!(matches("contains", "a.b".into(), "axb".into()), Some(false));
        assert_eq!(matches("startsWith", "(n".into(), "(nike".into()), Some(true));
    }

    #[test]
    fn test_starts_ends_and_equals() {
        assert_eq!(matches("startsWith", "ni".into(), "Nike".into()), Some(true));
        assert_eq!(matches("startsWith", "ke".into(), "Nike".into()), Some(false));
        assert_eq!(matches("endsWith", "KE".into(), "Nike".into()), Some(true));
        assert_eq!(matches("equals", "nike".into(), "Nike".into()), Some(true));
        assert_eq!(matches("equals", "nik".into(), "Nike".into()), Some(false));
        assert_eq!(matches("equals", "resume".into(), "Résumé".into()), Some(true));
    }

    #[test]
    fn test_empty_operators_and_is_any_of() {
        assert_eq!(matches("isEmpty", CellValue::Null, "".into()), Some(true));
        assert_eq!(matches("isEmpty", CellValue::Null, CellValue::Null), Some(true));
        assert_eq!(matches("isNotEmpty", CellValue::Null, "x".into()), Some(true));
        assert_eq!(
            matches("isAnyOf", vec!["puma", "nike"].into(), "Nike".into()),
            Some(true)
        );
        assert_eq!(
            matches("isAnyOf", vec!["puma"].into(), "Nike".into()),
            Some(false)
        );
        assert_eq!(
            matches("isAnyOf", vec!["creme brulee"].into(), "Crème Brûlée".into()),
            Some(true)
        );
        assert_eq!(matches("isAnyOf", CellValue::List(vec![]), "Nike".into()), None);
    }
}
