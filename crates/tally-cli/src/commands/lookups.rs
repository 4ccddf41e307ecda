//! Category, supplier, and client management commands

use anyhow::Result;
use tally_core::db::Database;

use super::truncate;

pub fn cmd_categories_list(db: &Database) -> Result<()> {
    let categories = db.list_categories()?;

    if categories.is_empty() {
        println!("No categories. Add one with: tally categories add \"Servicos\"");
        return Ok(());
    }

    println!();
    println!("Categories");
    println!("   ──────────────────────────────");
    for category in categories {
        println!("   {:>4}  {}", category.id, truncate(&category.name, 40));
    }

    Ok(())
}

pub fn cmd_categories_add(db: &Database, name: &str) -> Result<()> {
    let category = db.create_category(name.trim())?;
    println!("Added category {} ({})", category.name, category.id);
    Ok(())
}

pub fn cmd_suppliers_list(db: &Database) -> Result<()> {
    let suppliers = db.list_suppliers()?;

    if suppliers.is_empty() {
        println!("No suppliers. Add one with: tally suppliers add \"Acme Ltda\"");
        return Ok(());
    }

    println!();
    println!("Suppliers");
    println!("   ──────────────────────────────");
    for supplier in suppliers {
        println!("   {:>4}  {}", supplier.id, truncate(&supplier.name, 40));
    }

    Ok(())
}

pub fn cmd_suppliers_add(db: &Database, name: &str) -> Result<()> {
    let supplier = db.create_supplier(name.trim())?;
    println!("Added supplier {} ({})", supplier.name, supplier.id);
    Ok(())
}

pub fn cmd_clients_list(db: &Database) -> Result<()> {
    let clients = db.list_clients()?;

    if clients.is_empty() {
        println!("No clients. Add one with: tally clients add \"Beta SA\"");
        return Ok(());
    }

    println!();
    println!("Clients");
    println!("   ──────────────────────────────");
    for client in clients {
        println!("   {:>4}  {}", client.id, truncate(&client.name, 40));
    }

    Ok(())
}

pub fn cmd_clients_add(db: &Database, name: &str) -> Result<()> {
    let client = db.create_client(name.trim())?;
    println!("Added client {} ({})", client.name, client.id);
    Ok(())
}
