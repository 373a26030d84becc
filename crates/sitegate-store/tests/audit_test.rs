//! Integration test: the audit trail's append-only and privacy contracts.
//!
//! ## Scenarios
//! 1. Rows persist with the sorted comma-joined missing set.
//! 2. The live schema carries no identity-shaped column.
//! 3. Multiple appends accumulate; reads come back newest first.
//! 4. Reopening an existing database keeps prior rows.

use sitegate_core::{GateAction, PpeKind};
use sitegate_store::AuditLog;
use std::collections::BTreeSet;

fn temp_db() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("events.db");
    (dir, path)
}

fn missing(kinds: &[PpeKind]) -> BTreeSet<PpeKind> {
    kinds.iter().copied().collect()
}

#[test]
fn test_append_stores_sorted_missing_set() {
    let (_dir, path) = temp_db();
    let log = AuditLog::open(path).unwrap();

    log.append(
        "default",
        &missing(&[PpeKind::Vest, PpeKind::Helmet]),
        GateAction::Block,
    )
    .unwrap();

    let rows = log.recent(10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].zone_id, "default");
    assert_eq!(rows[0].missing_ppe, "helmet,vest");
    assert_eq!(rows[0].action_taken, "BLOCK");
    assert!(rows[0].ts > 0);
}

#[test]
fn test_allow_row_has_empty_missing_set() {
    let (_dir, path) = temp_db();
    let log = AuditLog::open(path).unwrap();

    log.append("default", &BTreeSet::new(), GateAction::Allow)
        .unwrap();

    let rows = log.recent(1).unwrap();
    assert_eq!(rows[0].missing_ppe, "");
    assert_eq!(rows[0].action_taken, "ALLOW");
}

#[test]
fn test_schema_carries_no_identity_columns() {
    let (_dir, path) = temp_db();
    let log = AuditLog::open(path).unwrap();

    let columns = log.columns().unwrap();
    assert_eq!(
        columns,
        vec!["id", "ts", "zone_id", "missing_ppe", "action_taken"]
    );

    let forbidden = ["name", "face", "worker_id", "employee_id", "id_card"];
    for column in &columns {
        assert!(
            !forbidden.contains(&column.to_lowercase().as_str()),
            "identity column {column:?} in audit schema"
        );
    }
}

#[test]
fn test_multiple_events_accumulate_newest_first() {
    let (_dir, path) = temp_db();
    let log = AuditLog::open(path).unwrap();

    log.append("default", &BTreeSet::new(), GateAction::Allow)
        .unwrap();
    log.append("default", &missing(&[PpeKind::Helmet]), GateAction::Block)
        .unwrap();
    log.append("hazard", &missing(&[PpeKind::Gloves]), GateAction::Block)
        .unwrap();

    assert_eq!(log.count().unwrap(), 3);
    let rows = log.recent(2).unwrap();
    assert_eq!(rows[0].zone_id, "hazard");
    assert_eq!(rows[1].missing_ppe, "helmet");
}

#[test]
fn test_reopen_keeps_existing_rows() {
    let (_dir, path) = temp_db();
    {
        let log = AuditLog::open(path.clone()).unwrap();
        log.append("default", &missing(&[PpeKind::Vest]), GateAction::Block)
            .unwrap();
    }
    let log = AuditLog::open(path).unwrap();
    assert_eq!(log.count().unwrap(), 1);
    assert_eq!(log.recent(1).unwrap()[0].missing_ppe, "vest");
}
