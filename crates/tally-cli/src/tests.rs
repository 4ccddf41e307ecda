//! CLI command tests

use std::io::Write;

use tally_core::db::Database;
use tally_core::models::ImportStatus;
use tally_core::upload_statement;

use crate::commands::{self, truncate};

const CSV_TWO_ROWS: &str = "data,descricao,valor,tipo\n\
                            2026-01-15,PAG BOLETO ACME LTDA,1500.00,DEBIT\n\
                            2026-01-16,TED RECEBIDA BETA SA,320.50,CREDIT\n";

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

#[test]
fn test_cli_args_are_consistent() {
    use clap::CommandFactory;
    crate::cli::Cli::command().debug_assert();
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a very long description", 10), "a very ...");
}

// ========== Upload Command Tests ==========

#[test]
fn test_cmd_upload_creates_session() {
    let db = setup_test_db();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extrato.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(CSV_TWO_ROWS.as_bytes()).unwrap();

    commands::cmd_upload(&db, &path).unwrap();

    let sessions = db.list_import_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].total_records, 2);
}

#[test]
fn test_cmd_upload_rejects_unknown_extension() {
    let db = setup_test_db();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extrato.txt");
    std::fs::write(&path, CSV_TWO_ROWS).unwrap();

    assert!(commands::cmd_upload(&db, &path).is_err());
    assert!(db.list_import_sessions().unwrap().is_empty());
}

// ========== Review Command Tests ==========

#[test]
fn test_cmd_imports_list_and_show() {
    let db = setup_test_db();
    let session = upload_statement(&db, "extrato.csv", CSV_TWO_ROWS.as_bytes()).unwrap();

    commands::cmd_imports_list(&db).unwrap();
    commands::cmd_imports_show(db.clone(), session.session.id, 0, false).unwrap();
    commands::cmd_imports_show(db, session.session.id, 0, true).unwrap();
}

#[test]
fn test_cmd_imports_classify_all_then_confirm() {
    let db = setup_test_db();
    let supplier = db.create_supplier("Acme Ltda").unwrap();
    let category = db.create_category("Servicos").unwrap();
    let session = upload_statement(&db, "extrato.csv", CSV_TWO_ROWS.as_bytes()).unwrap();
    let id = session.session.id;

    commands::cmd_imports_classify(
        db.clone(),
        id,
        "all",
        Some(supplier.id),
        Some(category.id),
        None,
    )
    .unwrap();

    commands::cmd_imports_confirm(db.clone(), id).unwrap();

    let session = db.get_import_session(id).unwrap().unwrap();
    assert_eq!(session.session.status, ImportStatus::Completed);
    assert_eq!(db.list_ledger_entries_for_session(id).unwrap().len(), 2);

    // Terminal: a second confirm fails
    assert!(commands::cmd_imports_confirm(db, id).is_err());
}

#[test]
fn test_cmd_imports_classify_by_item_ids() {
    let db = setup_test_db();
    let supplier = db.create_supplier("Acme Ltda").unwrap();
    let session = upload_statement(&db, "extrato.csv", CSV_TWO_ROWS.as_bytes()).unwrap();
    let first_item = session.items[0].id;

    commands::cmd_imports_classify(
        db.clone(),
        session.session.id,
        &first_item.to_string(),
        Some(supplier.id),
        None,
        None,
    )
    .unwrap();

    let session = db.get_import_session(session.session.id).unwrap().unwrap();
    assert_eq!(session.items[0].counterparty_id, Some(supplier.id));
    assert_eq!(session.items[1].counterparty_id, None);
}

#[test]
fn test_cmd_imports_classify_requires_patch_fields() {
    let db = setup_test_db();
    let session = upload_statement(&db, "extrato.csv", CSV_TWO_ROWS.as_bytes()).unwrap();

    let result = commands::cmd_imports_classify(db, session.session.id, "all", None, None, None);
    assert!(result.is_err());
}

#[test]
fn test_cmd_imports_cancel() {
    let db = setup_test_db();
    let session = upload_statement(&db, "extrato.csv", CSV_TWO_ROWS.as_bytes()).unwrap();
    let id = session.session.id;

    commands::cmd_imports_cancel(db.clone(), id).unwrap();

    let session = db.get_import_session(id).unwrap().unwrap();
    assert_eq!(session.session.status, ImportStatus::Cancelled);
}

// ========== Lookup Command Tests ==========

#[test]
fn test_lookup_commands() {
    let db = setup_test_db();

    commands::cmd_categories_add(&db, "Servicos").unwrap();
    commands::cmd_suppliers_add(&db, "Acme Ltda").unwrap();
    commands::cmd_clients_add(&db, "Beta SA").unwrap();

    assert_eq!(db.list_categories().unwrap().len(), 1);
    assert_eq!(db.list_suppliers().unwrap().len(), 1);
    assert_eq!(db.list_clients().unwrap().len(), 1);

    commands::cmd_categories_list(&db).unwrap();
    commands::cmd_suppliers_list(&db).unwrap();
    commands::cmd_clients_list(&db).unwrap();
}
