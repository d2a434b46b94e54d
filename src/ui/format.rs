use time::macros::format_description;
use time::{Duration, OffsetDateTime};

use crate::catalog::{Categoria, Product};

pub const MISSING: &str = "—";
const NEW_WINDOW: Duration = Duration::days(7);

/// Brazilian real, e.g. `R$ 1.234,50`.
pub fn format_brl(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = (value.abs() * 100.0).round() as u64;
    let (units, fraction) = (cents / 100, cents % 100);

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{fraction:02}")
}

pub fn format_date(value: Option<OffsetDateTime>) -> String {
    value
        .and_then(|dt| {
            dt.format(&format_description!("[day]/[month]/[year]"))
                .ok()
        })
        .unwrap_or_else(|| MISSING.to_string())
}

pub fn format_stock(estoque: Option<i64>) -> String {
    estoque
        .map(|n| n.to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

/// Created at most seven days before `now`.
pub fn is_new(product: &Product, now: OffsetDateTime) -> bool {
    product
        .created_at()
        .map(|created| now - created <= NEW_WINDOW)
        .unwrap_or(false)
}

/// Cuts `text` to `limit` characters, appending `…` when anything was dropped.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn category_icon(categoria: &str) -> &'static str {
    categoria
        .parse::<Categoria>()
        .map(Categoria::icon)
        .unwrap_or("🌿")
}
