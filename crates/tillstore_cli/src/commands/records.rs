//! Record listing and editing commands.

use crate::error::CliError;
use serde_json::Value;
use tillstore_core::{CollectionKind, DataManager, Record};

/// Prints all records of a collection as a JSON array.
pub fn list(store: &DataManager, kind: CollectionKind) -> Result<(), Box<dyn std::error::Error>> {
    let records = store.collection(kind).get_all();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Adds or merges one record into a collection.
///
/// Adding to `sales` goes through the sale engine, so stock is adjusted.
pub fn add(
    store: &DataManager,
    kind: CollectionKind,
    json: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let value = parse_json(json)?;

    let saved = match kind {
        CollectionKind::Products => store.add_product(value)?,
        CollectionKind::Clients => store.add_client(value)?,
        CollectionKind::Sales => store.add_sale(value)?,
    };
    store.flush()?;

    print_last(kind, &saved)
}

/// Records a sale and reports the resulting stock.
pub fn sell(store: &DataManager, json: &str) -> Result<(), Box<dyn std::error::Error>> {
    let sale = parse_json(json)?;
    let saved = store.add_sale(sale)?;
    store.flush()?;

    print_last(CollectionKind::Sales, &saved)?;

    let products = store.get_products();
    for item in saved.last().map(tillstore_core::line_items).unwrap_or_default() {
        if let Some(product) = products.iter().find(|p| p.id_key() == item.product) {
            println!(
                "  product {}: stock {}",
                item.product,
                product.get_i64("stock").unwrap_or(0)
            );
        }
    }

    Ok(())
}

fn print_last(kind: CollectionKind, saved: &[Record]) -> Result<(), Box<dyn std::error::Error>> {
    println!("✓ {kind}: {} record(s)", saved.len());
    if let Some(record) = saved.last() {
        println!("{}", serde_json::to_string_pretty(record)?);
    }
    Ok(())
}

fn parse_json(text: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str(text)?)
}
