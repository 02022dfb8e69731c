//! # Catalog
//!
//! Marketplace products and the little bits of formatting the screens need.

use serde::{Deserialize, Serialize};

/// A product as listed on the marketplace.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
}

/// A single product with its stats.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub id: u64,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u64,
    #[serde(default)]
    pub sold: u64,
    #[serde(default)]
    pub image: Option<String>,
}

/// Products whose name contains `query`, ignoring case. A blank query keeps everything.
pub fn filter_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return products.iter().collect();
    }
    products
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect()
}

/// `999` → `999`, `1234` → `1.2k`.
pub fn format_count(n: u64) -> String {
    if n >= 1000 {
        format!("{:.1}k", n as f64 / 1000.0)
    } else {
        n.to_string()
    }
}

/// `1199999.0` → `1,199,999.00`.
pub fn format_price(price: f64) -> String {
    let cents = (price.max(0.0) * 100.0).round() as u64;
    format!("{}.{:02}", group_thousands(cents / 100), cents % 100)
}

/// `12000` → `12,000`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
