//! Property-based tests for the filter/edit engine.

#![allow(clippy::unwrap_used)]

use datasheet::{
    ColumnType, Condition, EditQueue, FileFormat, Predicate, Table, Value, SIGNATURE_COLUMN,
};
use proptest::prelude::*;

const CITIES: &[&str] = &["Paris", "Lyon", "Marseille", "Lille", "Nice"];
const TYPED_FORMATS: &[FileFormat] =
    &[FileFormat::Json, FileFormat::JsonLines, FileFormat::Parquet];

/// Text that reads as a number: leading zeros, trailing zeros, exponents.
fn code_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "0[0-9]{1,3}",
        "[0-9]{1,2}\\.[0-9]0",
        "[1-9]e[0-9]",
        "[A-Za-z0-9]{1,6}",
    ]
}

fn table_strategy() -> impl Strategy<Value = Table> {
    prop::collection::vec(
        (
            "[A-Za-z][A-Za-z0-9]{0,7}",
            0i64..100,
            prop::sample::select(CITIES),
            -50.0f64..50.0,
            code_strategy(),
        ),
        0..30,
    )
    .prop_map(|rows| {
        Table::builder()
            .text("nom", rows.iter().map(|r| r.0.clone()))
            .int("age", rows.iter().map(|r| r.1))
            .text("ville", rows.iter().map(|r| r.2))
            .float("score", rows.iter().map(|r| r.3))
            .text("code", rows.iter().map(|r| r.4.clone()))
            .build()
            .unwrap()
    })
}

fn predicate_strategy() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        (0i64..100).prop_map(|n| Predicate::greater_than("age", n)),
        (0i64..100).prop_map(|n| Predicate::less_than("age", n)),
        (-50.0f64..50.0).prop_map(|x| Predicate::greater_than("score", x)),
        (0i64..100, 0i64..100).prop_map(|(a, b)| Predicate::between("age", a, b)),
        prop::sample::select(CITIES).prop_map(|c| Predicate::equals("ville", c)),
        "[a-z]{1,2}".prop_map(|s| Predicate::contains("nom", s)),
        code_strategy().prop_map(|c| Predicate::equals("code", c)),
    ]
}

/// Every row of `sub` appears in `table`, in the same relative order.
fn is_row_subsequence(sub: &Table, table: &Table) -> bool {
    let mut rows = (0..table.row_count()).map(|i| table.row(i).unwrap());
    (0..sub.row_count()).all(|i| {
        let wanted = sub.row(i).unwrap();
        rows.any(|row| row == wanted)
    })
}

proptest! {
    #[test]
    fn prop_filter_advanced_is_subsequence(
        table in table_strategy(),
        predicates in prop::collection::vec(predicate_strategy(), 0..4),
    ) {
        let mut previous = table.clone();
        for n in 0..=predicates.len() {
            let filtered = table.filter_advanced(&predicates[..n]).unwrap();
            prop_assert!(filtered.row_count() <= previous.row_count());
            prop_assert!(is_row_subsequence(&filtered, &table));
            previous = filtered;
        }
    }

    #[test]
    fn prop_filter_simple_is_idempotent(table in table_strategy(), term in "[a-zA-Z]{0,3}") {
        let once = table.filter_simple("nom", &term).unwrap();
        let twice = once.filter_simple("nom", &term).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_filter_range_is_idempotent(
        table in table_strategy(),
        a in -60.0f64..60.0,
        b in -60.0f64..60.0,
    ) {
        let once = table.filter_range("score", a, b).unwrap();
        let twice = once.filter_range("score", a, b).unwrap();
        prop_assert_eq!(&once, &twice);
        if a > b {
            prop_assert!(once.is_empty());
        }
    }

    #[test]
    fn prop_add_drop_column_restores_columns(
        table in table_strategy(),
        ty in prop::sample::select(vec![ColumnType::Text, ColumnType::Int, ColumnType::Float]),
    ) {
        let restored = table.add_column("extra", ty).unwrap().drop_column("extra").unwrap();
        prop_assert_eq!(restored.column_names(), table.column_names());
        prop_assert_eq!(restored.row_count(), table.row_count());
    }

    #[test]
    fn prop_signature_stays_last(
        table in table_strategy(),
        ops in prop::collection::vec(0u8..5, 1..8),
    ) {
        prop_assume!(!table.is_empty());
        let signature = datasheet::Signature::new("Alice").unwrap();
        let mut current = table.stamp_signature(&signature).unwrap();
        prop_assert!(current.signature_is_last());

        for (i, op) in ops.into_iter().enumerate() {
            let name = format!("col{}", i);
            current = match op {
                0 => current.add_column(&name, ColumnType::Int).unwrap(),
                1 => current.drop_column("score").unwrap_or(current),
                2 => current.add_row().unwrap(),
                3 if current.row_count() > 1 => current.drop_row(0).unwrap(),
                _ => current.stamp_signature(&signature).unwrap(),
            };
            prop_assert!(current.signature_is_last());
            let last = current.column_names().last().cloned();
            prop_assert_eq!(last.as_deref(), Some(SIGNATURE_COLUMN));
        }
    }

    #[test]
    fn prop_out_of_range_edits_are_skipped(table in table_strategy(), extra in 0usize..10) {
        let row = table.row_count() + extra;
        let queue = EditQueue::new().queue(row, "ville", "Nowhere");
        let edited = table.apply_edits(&queue).unwrap();
        prop_assert_eq!(edited, table);
    }

    #[test]
    fn prop_csv_round_trip(table in table_strategy()) {
        prop_assume!(!table.is_empty());
        // CSV carries no types; an all-digit text column reloads as numbers
        let table = table.drop_column("code").unwrap();
        let bytes = table.export(FileFormat::Csv).unwrap();
        let loaded = Table::load(&bytes, FileFormat::Csv).unwrap();
        prop_assert_eq!(loaded.column_names(), table.column_names());
        for row in 0..table.row_count() {
            let as_text = |t: &Table| -> Vec<String> {
                t.row(row).unwrap().iter().map(ToString::to_string).collect()
            };
            prop_assert_eq!(as_text(&loaded), as_text(&table));
        }
    }

    #[test]
    fn prop_typed_formats_keep_text_verbatim(
        table in table_strategy(),
        format in prop::sample::select(TYPED_FORMATS),
    ) {
        prop_assume!(!table.is_empty());
        let bytes = table.export(format).unwrap();
        let loaded = Table::load(&bytes, format).unwrap();
        prop_assert_eq!(loaded.column_type("code").unwrap(), ColumnType::Text);
        prop_assert_eq!(loaded.column("code").unwrap(), table.column("code").unwrap());
    }

    #[test]
    fn prop_predicate_display_parses_back(predicate in predicate_strategy()) {
        let parsed: Predicate = predicate.to_string().parse().unwrap();
        prop_assert_eq!(parsed.column(), predicate.column());
        let same_kind = matches!(
            (parsed.condition(), predicate.condition()),
            (Condition::Equals(_), Condition::Equals(_))
                | (Condition::Contains(_), Condition::Contains(_))
                | (Condition::GreaterThan(_), Condition::GreaterThan(_))
                | (Condition::LessThan(_), Condition::LessThan(_))
                | (Condition::Between(..), Condition::Between(..))
        );
        prop_assert!(same_kind);
    }

    #[test]
    fn prop_equals_on_text_matches_verbatim(
        table in table_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!table.is_empty());
        let code = table.value(pick.index(table.row_count()), "code").unwrap().to_string();
        let predicate: Predicate = format!("code = {}", code).parse().unwrap();
        let filtered = table.filter_advanced(&[predicate]).unwrap();

        let codes = table.column("code").unwrap();
        let expected = codes.iter().filter(|v| v.to_string() == code).count();
        prop_assert_eq!(filtered.row_count(), expected);
        for value in filtered.column("code").unwrap() {
            prop_assert_eq!(value, Value::from(code.as_str()));
        }
    }

    #[test]
    fn prop_text_edit_is_stored_verbatim(table in table_strategy(), code in code_strategy()) {
        prop_assume!(!table.is_empty());
        let queue = EditQueue::new().queue(0, "code", code.as_str()).queue(0, "nom", code.as_str());
        let edited = table.apply_edits(&queue).unwrap();
        prop_assert_eq!(edited.value(0, "code").unwrap(), Value::from(code.as_str()));
        prop_assert_eq!(edited.value(0, "nom").unwrap(), Value::from(code.as_str()));
    }
}
