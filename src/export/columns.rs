use std::collections::BTreeSet;
use tracing::debug;

use crate::models::{Column, Table};

/// Resolves the ordered list of columns an export renders.
///
/// Order of operations:
/// 1. declared columns (the cached set, hidden ones included, when `show_hidden`)
/// 2. developer-declared `with_columns` merged in
/// 3. include filter, keeping declared order
/// 4. extra columns appended in the order given
///
/// Names stay unique: a later column replaces an earlier one with the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnResolver {
    pub show_hidden: bool,
}

impl ColumnResolver {
    pub fn new(show_hidden: bool) -> Self {
        Self { show_hidden }
    }

    pub fn resolve(
        &self,
        table: &Table,
        with_columns: &[Column],
        include: &[String],
        extra: &[Column],
    ) -> Vec<Column> {
        let declared = if self.show_hidden {
            table.cached_columns()
        } else {
            table.columns.clone()
        };

        let mut columns = Vec::with_capacity(declared.len() + with_columns.len() + extra.len());
        for column in declared.into_iter().chain(with_columns.iter().cloned()) {
            merge(&mut columns, column);
        }

        if !include.is_empty() {
            let keep: BTreeSet<&str> = include.iter().map(String::as_str).collect();
            columns.retain(|column| keep.contains(column.name.as_str()));
        }

        for column in extra {
            merge(&mut columns, column.clone());
        }

        debug!(
            columns = columns.len(),
            show_hidden = self.show_hidden,
            filtered = !include.is_empty(),
            extra = extra.len(),
            "Resolved export columns"
        );

        columns
    }
}

/// Append `column`, dropping any earlier column with the same name.
fn merge(columns: &mut Vec<Column>, column: Column) {
    columns.retain(|existing| existing.name != column.name);
    columns.push(column);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(columns: &[Column]) -> Vec<String> {
        columns.iter().map(|c| c.name.clone()).collect()
    }

    fn table(names: &[&str]) -> Table {
        Table::new(names.iter().map(|n| Column::new(*n)).collect())
    }

    #[test]
    fn test_no_filter_keeps_declared_order() {
        let resolved = ColumnResolver::default().resolve(&table(&["a", "b", "c"]), &[], &[], &[]);
        assert_eq!(names(&resolved), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_filter_keeps_declared_order_not_filter_order() {
        let include = vec!["c".to_string(), "a".to_string(), "zzz".to_string()];
        let resolved =
            ColumnResolver::default().resolve(&table(&["a", "b", "c"]), &[], &include, &[]);
        assert_eq!(names(&resolved), vec!["a", "c"]);
    }

    #[test]
    fn test_hidden_columns_only_when_requested() {
        let table = table(&["a"]).with_hidden_columns(vec![Column::new("secret")]);
        assert_eq!(names(&ColumnResolver::new(false).resolve(&table, &[], &[], &[])), vec!["a"]);
        assert_eq!(
            names(&ColumnResolver::new(true).resolve(&table, &[], &[], &[])),
            vec!["a", "secret"]
        );
    }

    #[test]
    fn test_with_columns_are_filterable() {
        let with = vec![Column::new("computed")];
        let resolved = ColumnResolver::default().resolve(
            &table(&["a", "b"]),
            &with,
            &["b".to_string()],
            &[],
        );
        assert_eq!(names(&resolved), vec!["b"]);

        let unfiltered = ColumnResolver::default().resolve(&table(&["a", "b"]), &with, &[], &[]);
        assert_eq!(names(&unfiltered), vec!["a", "b", "computed"]);
    }

    #[test]
    fn test_extra_columns_appended_after_filter() {
        let extra = vec![Column::constant("note", "x"), Column::constant("status", "ok")];
        let resolved = ColumnResolver::default().resolve(
            &table(&["a", "b"]),
            &[],
            &["a".to_string()],
            &extra,
        );
        assert_eq!(names(&resolved), vec!["a", "note", "status"]);
    }

    #[test]
    fn test_colliding_extra_column_replaces_base() {
        let extra = vec![Column::constant("a", "override").with_label("A!")];
        let resolved = ColumnResolver::default().resolve(&table(&["a", "b"]), &[], &[], &extra);
        assert_eq!(names(&resolved), vec!["b", "a"]);
        assert_eq!(resolved[1].label(), "A!");
    }

    #[test]
    fn test_empty_result_is_fine() {
        let resolved = ColumnResolver::default().resolve(
            &table(&["a"]),
            &[],
            &["missing".to_string()],
            &[],
        );
        assert!(resolved.is_empty());
    }

    fn unique_names(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set("[a-z]{1,4}", 0..max)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    }

    proptest! {
        #[test]
        fn prop_filter_is_intersection_in_declared_order(
            declared in unique_names(12),
            filter in prop::collection::vec("[a-z]{1,4}", 0..12),
        ) {
            let table = Table::new(declared.iter().map(Column::new).collect());
            let resolved = ColumnResolver::default().resolve(&table, &[], &filter, &[]);

            let expected: Vec<String> = if filter.is_empty() {
                declared.clone()
            } else {
                declared.iter().filter(|n| filter.contains(n)).cloned().collect()
            };
            prop_assert_eq!(names(&resolved), expected);
        }

        #[test]
        fn prop_extra_columns_end_the_list_in_order(
            declared in unique_names(8),
            extra in unique_names(6),
            filter in prop::collection::vec("[a-z]{1,4}", 0..6),
        ) {
            let table = Table::new(declared.iter().map(Column::new).collect());
            let extra_columns: Vec<Column> = extra.iter().map(|n| Column::constant(n.as_str(), "v")).collect();
            let resolved = ColumnResolver::default().resolve(&table, &[], &filter, &extra_columns);

            let resolved_names = names(&resolved);
            prop_assert!(resolved_names.ends_with(&extra));

            let mut seen = BTreeSet::new();
            prop_assert!(resolved_names.iter().all(|n| seen.insert(n.clone())));
        }
    }
}
