//! Statement upload and review-driving commands
//!
//! The review commands (`show`, `classify`, `confirm`, `cancel`) drive the
//! same `ReviewController` the interactive UI uses, so the CLI sees exactly
//! the store's semantics: replace-by-id reconciliation, readiness gating,
//! and terminal transitions.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tally_core::db::Database;
use tally_core::models::{ItemPatch, LedgerType, LineItem};
use tally_core::{upload_statement, ReviewController};

use super::truncate;

pub fn cmd_upload(db: &Database, file: &Path) -> Result<()> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid file name")?;
    let data = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let session = upload_statement(db, file_name, &data)?;

    let classified = session.items.iter().filter(|i| i.is_classified()).count();
    let duplicates = session
        .items
        .iter()
        .filter(|i| i.possible_duplicate)
        .count();

    println!("Uploaded {} ({})", file_name, session.session.file_kind);
    println!("   Session:         {}", session.session.id);
    println!("   Line items:      {}", session.session.total_records);
    println!("   Auto-classified: {}", classified);
    if duplicates > 0 {
        println!("   Possible dups:   {} (advisory only)", duplicates);
    }
    println!();
    println!("Review with: tally imports show {}", session.session.id);

    Ok(())
}

pub fn cmd_imports_list(db: &Database) -> Result<()> {
    let sessions = db.list_import_sessions()?;

    if sessions.is_empty() {
        println!("No import sessions. Upload a statement with:");
        println!("  tally upload --file extrato.ofx");
        return Ok(());
    }

    println!();
    println!("Import Sessions");
    println!("   ─────────────────────────────────────────────────────────────");
    for session in sessions {
        println!(
            "   {:>4}  {:<14}  {:>5} items  {:<10}  {}",
            session.id,
            session.status.to_string(),
            session.total_records,
            session.file_kind.to_string(),
            truncate(&session.file_name, 32),
        );
    }

    Ok(())
}

pub fn cmd_imports_show(db: Database, id: i64, page: usize, json: bool) -> Result<()> {
    let mut controller = ReviewController::new(db);
    controller.load(id)?;

    {
        let session = controller.session().context("session not loaded")?;

        if json {
            println!("{}", serde_json::to_string_pretty(session)?);
            return Ok(());
        }

        println!();
        println!(
            "Session {} - {} ({})",
            session.session.id, session.session.file_name, session.session.status
        );
        println!(
            "   Ready: {}/{}   Page: {}/{}",
            controller.ready_count(),
            controller.total_count(),
            page + 1,
            controller.total_pages().max(1),
        );
        println!("   ─────────────────────────────────────────────────────────────");
    }

    controller.go_to_page(page);
    for item in controller.paged_items() {
        print_item(item);
    }

    if controller.all_ready() {
        println!();
        println!("All items classified. Confirm with: tally imports confirm {}", id);
    }

    Ok(())
}

fn print_item(item: &LineItem) {
    let marker = if item.possible_duplicate { "!" } else { " " };
    println!(
        "   {:>4}{} {}  {:>12.2}  {:<10}  {:<20}  {:<16}  {}",
        item.id,
        marker,
        item.date,
        item.amount,
        item.ledger_type.to_string(),
        truncate(item.counterparty_name.as_deref().unwrap_or("-"), 20),
        truncate(item.category_name.as_deref().unwrap_or("-"), 16),
        truncate(&item.description, 32),
    );
}

pub fn cmd_imports_classify(
    db: Database,
    id: i64,
    items: &str,
    counterparty: Option<i64>,
    category: Option<i64>,
    ledger: Option<&str>,
) -> Result<()> {
    let ledger_type: Option<LedgerType> = ledger
        .map(|s| s.parse().map_err(|e: String| anyhow::anyhow!(e)))
        .transpose()?;

    let patch = ItemPatch {
        counterparty_id: counterparty,
        category_id: category,
        ledger_type,
    };
    if patch.is_empty() {
        bail!("Nothing to apply; pass --counterparty, --category, or --ledger");
    }

    let mut controller = ReviewController::new(db);
    controller.load(id)?;

    if items.eq_ignore_ascii_case("all") {
        controller.toggle_select_all();
    } else {
        for part in items.split(',') {
            let item_id: i64 = part
                .trim()
                .parse()
                .with_context(|| format!("Invalid item id: {}", part))?;
            controller.toggle_select(item_id);
        }
    }

    let updated = controller.apply_bulk(&patch)?;

    println!(
        "Updated {} item(s). Ready: {}/{}",
        updated,
        controller.ready_count(),
        controller.total_count(),
    );
    if controller.all_ready() {
        println!("All items classified. Confirm with: tally imports confirm {}", id);
    }

    Ok(())
}

pub fn cmd_imports_confirm(db: Database, id: i64) -> Result<()> {
    let mut controller = ReviewController::new(db);
    controller.load(id)?;

    let total = controller.total_count();
    controller.confirm()?;

    println!("Confirmed session {}: {} ledger entries created.", id, total);
    Ok(())
}

pub fn cmd_imports_cancel(db: Database, id: i64) -> Result<()> {
    let mut controller = ReviewController::new(db);
    controller.load(id)?;
    controller.cancel()?;

    println!("Cancelled session {}. No ledger entries were created.", id);
    Ok(())
}
