//! # Seed Data Generator
//!
//! Populates a local store with demo products and, optionally, queued sales.
//!
//! ## Usage
//! ```bash
//! # Cache 200 products (default)
//! cargo run -p shoppos-db --bin seed
//!
//! # Custom amount, plus 20 unsynced sales
//! cargo run -p shoppos-db --bin seed -- --count 1000 --sales 20
//!
//! # Specify database path
//! cargo run -p shoppos-db --bin seed -- --db ./data/shoppos.db
//! ```
//!
//! Every product gets a barcode `893{:010}` (Vietnam GS1 prefix, checksum
//! not valid) and a VND price rounded to 500.

use chrono::{Duration, Utc};
use shoppos_core::{assemble_sale, Cart, PaymentMethod, Product};
use shoppos_db::{Database, DbConfig};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEMO_SHOP_ID: &str = "demo-shop";

/// Product groups for realistic demo data
const GROUPS: &[&[&str]] = &[
    &[
        "Coca Cola", "Pepsi", "7 Up", "Sting dâu", "Trà xanh 0 độ", "Nước suối Lavie",
        "Bò húc", "Trà Ô Long", "Cà phê sữa đá", "Nước cam ép",
    ],
    &[
        "Mì Hảo Hảo", "Mì Omachi", "Phở bò ăn liền", "Bánh Chocopie", "Bánh quy Cosy",
        "Snack Oishi", "Kẹo Alpenliebe", "Hạt điều rang", "Bánh mì que", "Xúc xích Vissan",
    ],
    &[
        "Sữa tươi Vinamilk", "Sữa chua TH", "Sữa đặc Ông Thọ", "Phô mai Con bò cười",
        "Trứng gà (10 quả)", "Bơ lạt", "Sữa đậu nành Fami", "Yakult", "Sữa Milo", "Kem Merino",
    ],
];

const SIZES: &[(&str, i64)] = &[("", 0), ("lớn", 5_000), ("lốc 6", 40_000), ("thùng", 150_000)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut sales: usize = 0;
    let mut db_path = String::from("./shoppos_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(0);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ShopPOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to cache (default: 200)");
                println!("  -s, --sales <N>    Number of unsynced sales to queue (default: 0)");
                println!("  -d, --db <PATH>    Database file path (default: ./shoppos_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, count, sales, "Seeding local store");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Product cache is not empty, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let products = generate_products(count);
    let written = db.products().replace_all(&products).await?;
    info!(written, elapsed = ?start.elapsed(), "Products cached");

    let hits = db.products().search("sữa", 10).await?;
    info!(hits = hits.len(), "Search 'sữa'");

    let queue = db.sales_queue();
    let sales = if products.is_empty() { 0 } else { sales };
    for n in 0..sales {
        let mut cart = Cart::new();
        for offset in 0..(1 + n % 3) {
            cart.add_product(&products[(n * 7 + offset) % products.len()])?;
        }
        let method = if n % 2 == 0 { PaymentMethod::Cash } else { PaymentMethod::Transfer };
        let at = Utc::now() - Duration::minutes((sales - n) as i64);
        let sale = assemble_sale(DEMO_SHOP_ID, &cart, method, at)?;
        queue.insert(&sale, at).await?;
    }
    if sales > 0 {
        info!(pending = queue.count_by_synced(false).await?, "Sales queued");
    }

    info!("Seed complete");
    Ok(())
}

/// Generates `count` products, newest last.
fn generate_products(count: usize) -> Vec<Product> {
    let now = Utc::now();
    let mut products = Vec::with_capacity(count);

    'outer: for (group_idx, names) in GROUPS.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if products.len() >= count {
                    break 'outer;
                }
                let seed = group_idx * 1000 + name_idx * 20 + size_idx;
                let price = 5_000 + ((seed * 17) % 60) as i64 * 500 + addon;
                let full_name = if size.is_empty() {
                    name.to_string()
                } else {
                    format!("{} {}", name, size)
                };

                products.push(Product {
                    id: Uuid::new_v4().to_string(),
                    shop_id: DEMO_SHOP_ID.to_string(),
                    barcode: Some(format!("893{:010}", seed)),
                    name: full_name,
                    price,
                    cost_price: price * (60 + (seed % 20) as i64) / 100,
                    stock_quantity: (seed % 101) as i64,
                    image: None,
                    is_active: true,
                    created_at: Some(now - Duration::seconds((count - products.len()) as i64)),
                });
            }
        }
    }

    products
}
