//! # Seed Data Generator
//!
//! Populates a database with a demo catalog and campaign rules for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the default dev database
//! cargo run -p lodos-db --bin seed
//!
//! # Specify database path
//! cargo run -p lodos-db --bin seed -- --db ./data/lodos.db
//! ```

use std::env;

use lodos_core::DiscountKind;
use lodos_db::{Database, DbConfig};
use tracing::info;

/// Demo catalog: name, unit price in cents, stock on hand.
const ITEMS: &[(&str, i64, i64)] = &[
    ("Black Tea 500g", 4500, 40),
    ("Filter Coffee 250g", 9900, 25),
    ("Olive Oil 1L", 28000, 12),
    ("Honey 850g", 19900, 10),
    ("Dried Apricots 400g", 7500, 30),
    ("Hazelnut Spread 350g", 8900, 18),
    ("Sparkling Water 6-Pack", 3600, 60),
    ("Dark Chocolate 80g", 2900, 50),
    ("Rice 2kg", 9800, 22),
    ("Lentils 1kg", 5400, 35),
];

/// Demo campaigns, indexed into `ITEMS`: (item index, kind, value,
/// min_quantity). Values are basis points for percent rules, cents for
/// fixed rules.
const CAMPAIGNS: &[(usize, DiscountKind, i64, i64)] = &[
    // Tea: 5% from 3 units, 12% from 10
    (0, DiscountKind::Percent, 500, 3),
    (0, DiscountKind::Percent, 1200, 10),
    // Coffee: flat 15.00 off from 5 units
    (1, DiscountKind::Fixed, 1500, 5),
    // Sparkling water: 10% from 4 packs
    (6, DiscountKind::Percent, 1000, 4),
    // Chocolate: flat 2.00 off from 6 bars
    (7, DiscountKind::Fixed, 200, 6),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./lodos_dev.db");

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
                println!("Lodos POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./lodos_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let mut item_ids = Vec::with_capacity(ITEMS.len());
    for (name, price_cents, stock) in ITEMS {
        let item = db.items().insert(name, *price_cents, *stock).await?;
        item_ids.push(item.id);
    }
    info!(count = item_ids.len(), "Catalog seeded");

    for (index, kind, value, min_quantity) in CAMPAIGNS {
        db.campaigns()
            .insert(item_ids[*index], *kind, *value, *min_quantity)
            .await?;
    }
    info!(count = CAMPAIGNS.len(), "Campaign rules seeded");

    db.close().await;
    Ok(())
}
