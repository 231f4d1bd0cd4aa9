//! # CSV Export
//!
//! Person- and product-grouped exports of an order's visible items. The
//! caller applies the privacy filter; this module only formats.
//!
//! Quantities are opaque strings. The product view best-effort-parses them
//! as integers for totals; a non-numeric quantity degrades the total to a
//! concatenated string ("3+a dozen") instead of failing.

use std::fmt;

use crate::orders::{Order, OrderItem};

/// How to group exported rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportGroup {
    Person,
    Product,
}

impl ExportGroup {
    /// Anything other than "product" falls back to person grouping
    pub fn parse(raw: &str) -> Self {
        match raw {
            "product" => ExportGroup::Product,
            _ => ExportGroup::Person,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportGroup::Person => "person",
            ExportGroup::Product => "product",
        }
    }
}

/// Download filename for an export
pub fn export_filename(order: &Order, group: ExportGroup) -> String {
    let short_id: String = order.id.chars().take(8).collect();
    format!("order-{}-{}.csv", short_id, group.as_str())
}

/// Render the CSV text for the given grouping
pub fn export_csv(items: &[OrderItem], group: ExportGroup) -> String {
    match group {
        ExportGroup::Person => person_csv(items),
        ExportGroup::Product => product_csv(items),
    }
}

fn person_csv(items: &[OrderItem]) -> String {
    let mut sorted: Vec<&OrderItem> = items.iter().collect();
    sorted.sort_by(|a, b| a.contributor_name.cmp(&b.contributor_name));

    let mut out = String::from("person,product,sku,quantity,note,url\n");
    for item in sorted {
        push_row(
            &mut out,
            &[
                &item.contributor_name,
                &item.product_name,
                item.product_sku.as_deref().unwrap_or(""),
                &item.quantity,
                item.note.as_deref().unwrap_or(""),
                item.product_url.as_deref().unwrap_or(""),
            ],
        );
    }
    out
}

/// Running total that degrades to text on the first non-numeric quantity
#[derive(Debug, Clone)]
enum Total {
    Count(i64),
    Text(String),
}

impl Total {
    fn add(&mut self, quantity: &str) {
        match (quantity.trim().parse::<i64>(), &*self) {
            (Ok(n), Total::Count(total)) => *self = Total::Count(total + n),
            // Once degraded, stay degraded
            (Ok(n), Total::Text(text)) => *self = Total::Text(format!("{}+{}", text, n)),
            (Err(_), Total::Count(total)) => {
                *self = Total::Text(format!("{}+{}", total, quantity));
            }
            (Err(_), Total::Text(text)) => *self = Total::Text(format!("{}+{}", text, quantity)),
        }
    }
}

impl fmt::Display for Total {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Total::Count(n) => write!(f, "{}", n),
            Total::Text(t) => write!(f, "{}", t),
        }
    }
}

struct ProductRow {
    product: String,
    sku: String,
    url: String,
    note: String,
    total: Total,
    contributors: Vec<String>,
}

fn product_csv(items: &[OrderItem]) -> String {
    let mut rows: Vec<ProductRow> = Vec::new();

    for item in items {
        let sku = item.product_sku.as_deref().unwrap_or("");
        let url = item.product_url.as_deref().unwrap_or("");
        let note = item.note.as_deref().unwrap_or("");

        // Group only when product name, SKU, URL and note all match
        let idx = rows
            .iter()
            .position(|r| {
                r.product == item.product_name && r.sku == sku && r.url == url && r.note == note
            })
            .unwrap_or_else(|| {
                rows.push(ProductRow {
                    product: item.product_name.clone(),
                    sku: sku.to_string(),
                    url: url.to_string(),
                    note: note.to_string(),
                    total: Total::Count(0),
                    contributors: Vec::new(),
                });
                rows.len() - 1
            });

        rows[idx].total.add(&item.quantity);
        rows[idx]
            .contributors
            .push(format!("{}×{}", item.contributor_name, item.quantity));
    }

    rows.sort_by(|a, b| a.product.cmp(&b.product));

    let mut out = String::from("product,sku,total_quantity,contributors,url,note\n");
    for row in rows {
        push_row(
            &mut out,
            &[
                &row.product,
                &row.sku,
                &row.total.to_string(),
                &row.contributors.join("; "),
                &row.url,
                &row.note,
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(field));
    }
    out.push('\n');
}

/// Quote fields containing separators, quotes, or newlines
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
