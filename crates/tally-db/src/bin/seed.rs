//! # Seed Data Loader
//!
//! Populates a database with the demo catalog (four products, their stock
//! and three promotions) for trying the checkout by hand.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally.db (default)
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```

use std::env;
use tally_db::fixtures::{seed_demo_catalog, DEMO_STOCK};
use tally_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("TALLY_DB_PATH").unwrap_or_else(|_| String::from("./tally.db"));

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally POS Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $TALLY_DB_PATH or ./tally.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally POS Seed Data Loader");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let catalog = seed_demo_catalog(&db).await?;

    println!();
    for product in &catalog.products {
        println!(
            "  {:>3}  {:<8} {:<16} {:>10}  stock {}",
            product.id,
            product.serial,
            product.name,
            product.price().to_string(),
            DEMO_STOCK
        );
    }
    println!();
    println!("✓ Seeded {} products, {} promotions", catalog.products.len(), catalog.promotions.len());

    db.close().await;
    Ok(())
}
