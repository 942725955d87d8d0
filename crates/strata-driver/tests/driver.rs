use strata_driver::{Driver, DriverError};
use strata_model::{FamilyDescriptor, ROW_ID_KEY, Timestamp};
use strata_store::MemoryStore;

const TABLE: &str = "people";

fn driver() -> Driver<MemoryStore> {
    let driver = Driver::open(MemoryStore::new()).unwrap();
    driver
        .create_table(
            TABLE,
            vec![
                FamilyDescriptor::new("info"),
                FamilyDescriptor::new("misc"),
            ],
        )
        .unwrap();
    driver
}

fn cell(column: &str, value: &str) -> (String, Vec<u8>) {
    (column.to_string(), value.as_bytes().to_vec())
}

#[test]
fn update_then_get_latest() {
    let driver = driver();
    driver
        .update(TABLE, "person|1", &[cell("info:name", "Alice")], None)
        .unwrap();

    let values = driver.get(TABLE, "person|1", "info:name", 1, None).unwrap();
    assert_eq!(values, vec![b"Alice".to_vec()]);
}

#[test]
fn versioned_reads_at_and_before_timestamps() {
    let driver = driver();
    let t1 = Timestamp::from_parts(100, 0);
    let t2 = Timestamp::from_parts(200, 0);
    let t3 = Timestamp::from_parts(300, 0);

    driver
        .update(TABLE, "row", &[cell("info:size", "medium")], Some(t1))
        .unwrap();
    driver
        .update(TABLE, "row", &[cell("info:size", "small")], Some(t2))
        .unwrap();
    driver
        .update(TABLE, "row", &[cell("info:size", "big")], Some(t3))
        .unwrap();

    let latest = driver.get(TABLE, "row", "info:size", 1, None).unwrap();
    assert_eq!(latest, vec![b"big".to_vec()]);

    let at_t2 = driver.get(TABLE, "row", "info:size", 1, Some(t2)).unwrap();
    assert_eq!(at_t2, vec![b"small".to_vec()]);

    let all_at_t3 = driver.get(TABLE, "row", "info:size", 10, Some(t3)).unwrap();
    assert_eq!(
        all_at_t3,
        vec![b"big".to_vec(), b"small".to_vec(), b"medium".to_vec()]
    );

    let before_first = driver
        .get(TABLE, "row", "info:size", 1, Some(Timestamp(t1.0 - 1)))
        .unwrap();
    assert!(before_first.is_empty());
}

#[test]
fn surplus_versions_are_pruned() {
    let driver = Driver::open(MemoryStore::new()).unwrap();
    driver
        .create_table(
            "logs",
            vec![FamilyDescriptor::new("raw").with_max_versions(2)],
        )
        .unwrap();

    for (i, value) in ["one", "two", "three", "four"].iter().enumerate() {
        let ts = Timestamp::from_parts(100 + i as u64, 0);
        driver
            .update("logs", "row", &[cell("raw:line", value)], Some(ts))
            .unwrap();
    }

    let values = driver.get("logs", "row", "raw:line", 10, None).unwrap();
    assert_eq!(values, vec![b"four".to_vec(), b"three".to_vec()]);
}

#[test]
fn update_covers_all_columns_in_one_call() {
    let driver = driver();
    driver
        .update(
            TABLE,
            "person|1",
            &[
                cell("info:name", "Alice"),
                cell("info:email", "alice@test.com"),
                cell("misc:note", "first"),
            ],
            None,
        )
        .unwrap();

    let row = driver
        .get_columns(
            TABLE,
            "person|1",
            &["info:".to_string(), "misc:".to_string()],
            None,
        )
        .unwrap()
        .unwrap();
    assert_eq!(row.get("info:name").unwrap(), b"Alice");
    assert_eq!(row.get("info:email").unwrap(), b"alice@test.com");
    assert_eq!(row.get("misc:note").unwrap(), b"first");
}

#[test]
fn update_rejects_wildcards_and_unknown_families() {
    let driver = driver();
    let err = driver
        .update(TABLE, "row", &[cell("info:", "x")], None)
        .unwrap_err();
    assert!(matches!(err, DriverError::InvalidArgument(_)));

    let err = driver
        .update(TABLE, "row", &[cell("addresses:street", "x")], None)
        .unwrap_err();
    assert!(matches!(err, DriverError::FamilyNotFound { .. }));
}

#[test]
fn get_zero_versions_is_an_argument_error() {
    let driver = driver();
    let err = driver.get(TABLE, "row", "info:name", 0, None).unwrap_err();
    assert!(matches!(err, DriverError::InvalidArgument(_)));
}

#[test]
fn absent_rows_read_as_empty_not_errors() {
    let driver = driver();
    assert!(driver.get(TABLE, "ghost", "info:name", 1, None).unwrap().is_empty());
    assert!(driver
        .get_columns(TABLE, "ghost", &["info:".to_string()], None)
        .unwrap()
        .is_none());
}

#[test]
fn family_wildcard_expands_to_present_qualifiers_only() {
    let driver = driver();
    driver
        .update(
            TABLE,
            "person|1",
            &[
                cell("info:name", "Alice"),
                cell("info:email", "alice@test.com"),
                cell("misc:note", "unrelated"),
            ],
            None,
        )
        .unwrap();

    let row = driver
        .get_columns(TABLE, "person|1", &["info:".to_string()], None)
        .unwrap()
        .unwrap();

    let mut keys: Vec<_> = row.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec![ROW_ID_KEY, "info:email", "info:name"]);
    assert_eq!(row.get(ROW_ID_KEY).unwrap(), b"person|1");
}

#[test]
fn get_columns_respects_timestamp_bound_per_qualifier() {
    let driver = driver();
    let t1 = Timestamp::from_parts(100, 0);
    let t2 = Timestamp::from_parts(200, 0);

    driver
        .update(TABLE, "row", &[cell("info:name", "old")], Some(t1))
        .unwrap();
    driver
        .update(TABLE, "row", &[cell("info:name", "new")], Some(t2))
        .unwrap();
    driver
        .update(TABLE, "row", &[cell("info:late", "later")], Some(t2))
        .unwrap();

    let row = driver
        .get_columns(TABLE, "row", &["info:".to_string()], Some(t1))
        .unwrap()
        .unwrap();
    assert_eq!(row.get("info:name").unwrap(), b"old");
    assert!(!row.contains_key("info:late"));
}

#[test]
fn delete_removes_the_whole_row() {
    let driver = driver();
    driver
        .update(TABLE, "person|1", &[cell("info:name", "Alice")], None)
        .unwrap();
    driver.delete(TABLE, "person|1").unwrap();

    assert!(driver
        .get_columns(TABLE, "person|1", &["info:".to_string()], None)
        .unwrap()
        .is_none());

    // Deleting an absent row stays a no-op.
    driver.delete(TABLE, "person|1").unwrap();
}

#[test]
fn scan_returns_rows_in_row_id_order() {
    let driver = driver();
    for id in ["mouse", "cat", "fish", "dog"] {
        driver
            .update(TABLE, id, &[cell("info:name", id)], None)
            .unwrap();
    }

    let rows = driver.scan(TABLE, None, None, &[], None).unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["cat", "dog", "fish", "mouse"]);
}

#[test]
fn scan_bounds_are_start_inclusive_stop_exclusive() {
    let driver = driver();
    for id in ["cat", "dog", "fish", "mouse"] {
        driver
            .update(TABLE, id, &[cell("info:name", id)], None)
            .unwrap();
    }

    let rows = driver
        .scan(TABLE, Some("dog"), Some("mouse"), &[], None)
        .unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["dog", "fish"]);
}

#[test]
fn scan_limit_caps_row_count() {
    let driver = driver();
    for id in ["cat", "dog", "fish", "mouse"] {
        driver
            .update(TABLE, id, &[cell("info:name", id)], None)
            .unwrap();
    }

    let rows = driver.scan(TABLE, None, None, &[], Some(2)).unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["cat", "dog"]);

    let rows = driver.scan(TABLE, None, None, &[], Some(100)).unwrap();
    assert_eq!(rows.len(), 4);
}

#[test]
fn scan_filters_columns_and_takes_latest_versions() {
    let driver = driver();
    let t1 = Timestamp::from_parts(100, 0);
    let t2 = Timestamp::from_parts(200, 0);
    driver
        .update(
            TABLE,
            "row",
            &[cell("info:name", "old"), cell("misc:note", "kept")],
            Some(t1),
        )
        .unwrap();
    driver
        .update(TABLE, "row", &[cell("info:name", "new")], Some(t2))
        .unwrap();

    let rows = driver
        .scan(TABLE, None, None, &["info:name".to_string()], None)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cell("info:name").unwrap(), b"new");
    assert!(rows[0].cell("misc:note").is_none());
}

// ── Schema operations ───────────────────────────────────────────

#[test]
fn create_existing_table_fails() {
    let driver = driver();
    let err = driver
        .create_table(TABLE, vec![FamilyDescriptor::new("info")])
        .unwrap_err();
    assert!(matches!(err, DriverError::TableAlreadyExists(_)));
}

#[test]
fn operations_on_missing_tables_fail() {
    let driver = driver();
    let err = driver
        .update("nope", "row", &[cell("info:name", "x")], None)
        .unwrap_err();
    assert!(matches!(err, DriverError::TableNotFound(_)));

    let err = driver.get("nope", "row", "info:name", 1, None).unwrap_err();
    assert!(matches!(err, DriverError::TableNotFound(_)));

    let err = driver.drop_table("nope").unwrap_err();
    assert!(matches!(err, DriverError::TableNotFound(_)));
}

#[test]
fn dropped_table_stops_serving() {
    let driver = driver();
    driver
        .update(TABLE, "row", &[cell("info:name", "x")], None)
        .unwrap();
    driver.drop_table(TABLE).unwrap();

    assert!(!driver.table_exists(TABLE).unwrap());
    let err = driver.get(TABLE, "row", "info:name", 1, None).unwrap_err();
    assert!(matches!(err, DriverError::TableNotFound(_)));
}

#[test]
fn truncate_clears_data_but_keeps_schema() {
    let driver = driver();
    driver
        .update(TABLE, "row", &[cell("info:name", "x")], None)
        .unwrap();
    driver.truncate_table(TABLE).unwrap();

    assert!(driver.table_exists(TABLE).unwrap());
    assert!(driver.get(TABLE, "row", "info:name", 1, None).unwrap().is_empty());

    // Schema survived, so writes still work.
    driver
        .update(TABLE, "row", &[cell("info:name", "y")], None)
        .unwrap();
}

#[test]
fn add_family_makes_it_writable() {
    let driver = driver();
    let err = driver
        .update(TABLE, "row", &[cell("extra:x", "1")], None)
        .unwrap_err();
    assert!(matches!(err, DriverError::FamilyNotFound { .. }));

    driver
        .add_family(TABLE, FamilyDescriptor::new("extra"))
        .unwrap();
    driver
        .update(TABLE, "row", &[cell("extra:x", "1")], None)
        .unwrap();
}

#[test]
fn add_duplicate_family_fails() {
    let driver = driver();
    let err = driver
        .add_family(TABLE, FamilyDescriptor::new("info"))
        .unwrap_err();
    assert!(matches!(err, DriverError::InvalidArgument(_)));
}

#[test]
fn remove_family_purges_its_cells() {
    let driver = driver();
    driver
        .update(
            TABLE,
            "row",
            &[cell("info:name", "Alice"), cell("misc:note", "gone")],
            None,
        )
        .unwrap();

    driver.remove_family(TABLE, "misc").unwrap();

    let err = driver.get(TABLE, "row", "misc:note", 1, None).unwrap_err();
    assert!(matches!(err, DriverError::FamilyNotFound { .. }));

    // Other families untouched.
    let values = driver.get(TABLE, "row", "info:name", 1, None).unwrap();
    assert_eq!(values, vec![b"Alice".to_vec()]);
}

#[test]
fn remove_missing_family_fails() {
    let driver = driver();
    let err = driver.remove_family(TABLE, "addresses").unwrap_err();
    assert!(matches!(err, DriverError::FamilyNotFound { .. }));
}

#[test]
fn modify_family_changes_version_cap_for_new_writes() {
    let driver = driver();
    driver
        .modify_family(TABLE, FamilyDescriptor::new("info").with_max_versions(1))
        .unwrap();

    for (i, value) in ["one", "two"].iter().enumerate() {
        let ts = Timestamp::from_parts(100 + i as u64, 0);
        driver
            .update(TABLE, "row", &[cell("info:name", value)], Some(ts))
            .unwrap();
    }
    let values = driver.get(TABLE, "row", "info:name", 10, None).unwrap();
    assert_eq!(values, vec![b"two".to_vec()]);
}

#[test]
fn modify_missing_family_fails() {
    let driver = driver();
    let err = driver
        .modify_family(TABLE, FamilyDescriptor::new("addresses"))
        .unwrap_err();
    assert!(matches!(err, DriverError::FamilyNotFound { .. }));
}

#[test]
fn list_tables_reflects_ddl() {
    let driver = driver();
    driver
        .create_table("animals", vec![FamilyDescriptor::new("info")])
        .unwrap();

    let mut tables = driver.list_tables().unwrap();
    tables.sort_unstable();
    assert_eq!(tables, vec!["animals", "people"]);

    driver.drop_table("animals").unwrap();
    assert_eq!(driver.list_tables().unwrap(), vec!["people"]);
}

#[test]
fn invalid_names_are_rejected() {
    let driver = driver();
    for name in ["", "_meta", "has\0nul"] {
        let err = driver
            .create_table(name, vec![FamilyDescriptor::new("info")])
            .unwrap_err();
        assert!(matches!(err, DriverError::InvalidArgument(_)), "{name:?}");
    }

    let err = driver
        .create_table("ok", vec![FamilyDescriptor::new("bad:name")])
        .unwrap_err();
    assert!(matches!(err, DriverError::InvalidArgument(_)));

    let err = driver
        .create_table("ok", vec![FamilyDescriptor::new("info").with_max_versions(0)])
        .unwrap_err();
    assert!(matches!(err, DriverError::InvalidArgument(_)));
}

#[test]
fn handle_cache_survives_invalidation() {
    let driver = driver();
    driver
        .update(TABLE, "row", &[cell("info:name", "Alice")], None)
        .unwrap();

    driver.invalidate_handles();

    // Handles repopulate lazily; data is unaffected.
    let values = driver.get(TABLE, "row", "info:name", 1, None).unwrap();
    assert_eq!(values, vec![b"Alice".to_vec()]);
}
