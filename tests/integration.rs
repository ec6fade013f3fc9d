//! Integration tests for datasheet.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::uninlined_format_args)]

use datasheet::{
    ColumnType, Contains, EditMode, EditQueue, EngineConfig, Error, FileFormat, Predicate,
    Session, Table, Value, SIGNATURE_COLUMN,
};

const PEOPLE_CSV: &[u8] = b"nom,age,ville\nAlice,25,Paris\nBob,30,Lyon\nCharlie,35,Marseille\n";

fn people() -> Table {
    Table::load(PEOPLE_CSV, FileFormat::Csv).unwrap()
}

fn names(table: &Table) -> Vec<String> {
    table
        .column("nom")
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn test_range_scenario() {
    let filtered = people().filter_range("age", 28.0, 40.0).unwrap();
    assert_eq!(names(&filtered), ["Bob", "Charlie"]);
}

#[test]
fn test_search_scenario_is_case_insensitive() {
    let filtered = people().filter_simple("ville", "par").unwrap();
    assert_eq!(names(&filtered), ["Alice"]);
}

#[test]
fn test_add_then_drop_column_restores_schema() {
    let table = people();
    let restored = table
        .add_column("score", ColumnType::Int)
        .unwrap()
        .drop_column("score")
        .unwrap();
    assert_eq!(restored.schema(), table.schema());
    assert_eq!(restored.batch(), table.batch());
}

#[test]
fn test_end_to_end_session_workflow() {
    let mut session = Session::new().unwrap();
    session.load(PEOPLE_CSV, FileFormat::Csv).unwrap();

    session.queue_edit(1, "ville", "Lille");
    session.queue_edit(2, "age", 36);
    session.queue_edit(7, "age", 99);
    let report = session.apply_edits().unwrap();
    assert_eq!((report.applied, report.skipped), (2, 1));

    let signature = session.stamp_signature("  Alice ").unwrap().clone();
    assert_eq!(signature.author(), "Alice");

    session.queue_filter(Predicate::greater_than("age", 26));
    session.queue_filter("ville contains Li".parse().unwrap());
    let view = session.apply_filters().unwrap();
    assert_eq!(names(view), ["Bob"]);
    assert_eq!(view.column_names().last().unwrap(), SIGNATURE_COLUMN);

    // Export writes the view
    let csv = String::from_utf8(session.export(FileFormat::Csv).unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.starts_with("nom,age,ville,Signature"));
    assert!(csv.contains("Bob,30,Lille,"));

    // The working table still holds every row
    assert_eq!(session.table().row_count(), 3);
    assert_eq!(
        session.table().value(0, SIGNATURE_COLUMN).unwrap(),
        Value::Text(signature.text())
    );
}

#[test]
fn test_failures_leave_session_usable() {
    let mut session = Session::new().unwrap();
    session.load(PEOPLE_CSV, FileFormat::Csv).unwrap();

    assert!(matches!(
        session.load(b"{not json", FileFormat::Json),
        Err(Error::Format { .. })
    ));
    assert!(matches!(
        session.add_column("age", ColumnType::Int),
        Err(Error::DuplicateColumn { .. })
    ));
    assert!(matches!(
        session.drop_row(3),
        Err(Error::IndexOutOfBounds { index: 3, len: 3 })
    ));
    assert!(matches!(
        session.stamp_signature(""),
        Err(Error::MissingAuthor)
    ));
    assert!(matches!(
        session.stamp_signature("Bob"),
        Err(Error::PrecursorNotApplied)
    ));
    assert!(matches!(
        session.filter_range("nom", 0.0, 1.0),
        Err(Error::TypeCoercion { .. })
    ));

    assert_eq!(session.table().row_count(), 3);
    assert_eq!(session.table().column_count(), 3);
    assert!(session.view().is_none());
}

#[test]
fn test_strict_mode_rejects_whole_queue() {
    let config = EngineConfig::new().with_edit_mode(EditMode::Strict);
    let mut session = Session::with_config(config).unwrap();
    session.load(PEOPLE_CSV, FileFormat::Csv).unwrap();

    session.queue_edit(0, "nom", "Alicia");
    session.queue_edit(1, "age", "trente");
    assert!(matches!(
        session.apply_edits(),
        Err(Error::TypeCoercion { .. })
    ));
    assert_eq!(session.table().value(0, "nom").unwrap(), Value::from("Alice"));
    assert!(!session.edits_applied());
}

#[test]
fn test_lenient_mode_converts_column_to_text() {
    let queue = EditQueue::new().queue(1, "age", "trente");
    let edited = people().apply_edits(&queue).unwrap();
    assert_eq!(edited.column_type("age").unwrap(), ColumnType::Text);
    assert_eq!(
        edited.column("age").unwrap(),
        vec![Value::from("25"), Value::from("trente"), Value::from("35")]
    );
}

#[test]
fn test_format_round_trips() {
    let table = people()
        .add_column("score", ColumnType::Float)
        .unwrap()
        .apply_edits(&EditQueue::new().queue(0, "score", 0.5))
        .unwrap();

    for format in FileFormat::ALL {
        let bytes = table.export(format).unwrap();
        let loaded = Table::load(&bytes, format).unwrap();
        assert_eq!(loaded.column_names(), table.column_names(), "{}", format);
        assert_eq!(loaded.batch(), table.batch(), "{}", format);
    }
}

#[test]
fn test_file_round_trip_through_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.jsonl");

    let mut session = Session::from_table(people());
    session.add_row().unwrap();
    session.queue_edit(3, "nom", "Dora");
    session.apply_edits().unwrap();
    session.save(&path).unwrap();

    let mut reloaded = Session::new().unwrap();
    reloaded.load_path(&path).unwrap();
    assert_eq!(reloaded.source(), Some(path.as_path()));
    assert_eq!(names(reloaded.table()), ["Alice", "Bob", "Charlie", "Dora"]);
    assert_eq!(reloaded.table().value(3, "age").unwrap(), Value::Null);
}

#[test]
fn test_reset_restores_loaded_table() {
    let mut session = Session::from_table(people());
    session.drop_column("ville").unwrap();
    session.queue_edit(0, "nom", "Zoe");
    session.apply_edits().unwrap();
    session.reset();

    assert_eq!(session.table(), session.original());
    assert!(!session.edits_applied());
    assert!(session.pending_edits().is_empty());
}

#[test]
fn test_custom_transform_chain() {
    let chain = datasheet::Chain::new()
        .then(Contains::case_insensitive("nom", "a"))
        .then(datasheet::MaskFilter::new(|batch| {
            // Keep only the last remaining row
            let last = batch.num_rows().saturating_sub(1);
            Ok(arrow::array::BooleanArray::from_iter(
                (0..batch.num_rows()).map(|i| Some(i == last)),
            ))
        }));
    let filtered = people().with_transform(&chain).unwrap();
    assert_eq!(names(&filtered), ["Charlie"]);
}

#[test]
fn test_session_edits_keep_numeric_looking_text() {
    let mut session = Session::from_table(people());
    session.add_column("code", ColumnType::Text).unwrap();
    session.queue_edit(0, "code", "007");
    session.queue_edit(1, "code", "1.50");
    session.apply_edits().unwrap();

    let expected = vec![Value::from("007"), Value::from("1.50"), Value::from("")];
    for format in [FileFormat::Json, FileFormat::JsonLines, FileFormat::Parquet] {
        let bytes = session.export(format).unwrap();
        let reloaded = Table::load(&bytes, format).unwrap();
        assert_eq!(reloaded.column_type("code").unwrap(), ColumnType::Text, "{format}");
        assert_eq!(reloaded.column("code").unwrap(), expected, "{format}");
    }

    let csv = String::from_utf8(session.export(FileFormat::Csv).unwrap()).unwrap();
    assert!(csv.contains("Alice,25,Paris,007\n"));
    assert!(csv.contains("Bob,30,Lyon,1.50\n"));
}
