use serde::Serialize;

use stockdash_core::ItemId;

/// Stock level below which an item counts as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Stock status, derived from the stock count and never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Low,
    Out,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 3] = [ItemStatus::Active, ItemStatus::Low, ItemStatus::Out];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Low => "low",
            ItemStatus::Out => "out",
        }
    }
}

impl core::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single place stock thresholds live. Every mutating path goes through it.
pub fn status_of(stock: u32) -> ItemStatus {
    match stock {
        0 => ItemStatus::Out,
        s if s < LOW_STOCK_THRESHOLD => ItemStatus::Low,
        _ => ItemStatus::Active,
    }
}

/// Caller-supplied item fields (everything except `id` and `status`).
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: u32,
}

impl ItemFields {
    pub fn new(name: impl Into<String>, category: impl Into<String>, price: f64, stock: u32) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            price,
            stock,
        }
    }
}

/// Raw form input, numbers still as typed.
///
/// Converting into [`ItemFields`] never fails: unparseable or negative numbers
/// become `0` (see [`coerce_price`] / [`coerce_stock`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemInput {
    pub name: String,
    pub category: String,
    pub price: String,
    pub stock: String,
}

impl From<ItemInput> for ItemFields {
    fn from(input: ItemInput) -> Self {
        Self {
            price: coerce_price(&input.price),
            stock: coerce_stock(&input.stock),
            name: input.name,
            category: input.category,
        }
    }
}

/// Lenient price parse: leading decimal prefix of the trimmed input, exponent
/// included (`"12.5 USD"` → `12.5`, `"1e3"` → `1000`), `0` when there is none,
/// it is negative, or it overflows.
pub fn coerce_price(raw: &str) -> f64 {
    let raw = raw.trim_start();
    let end = numeric_prefix_len(raw, true);
    raw[..end]
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && p.is_sign_positive())
        .unwrap_or(0.0)
}

/// Lenient stock parse: leading integer prefix of the trimmed input
/// (`"7.9"` → `7`), `0` when there is none, it is negative, or it overflows.
pub fn coerce_stock(raw: &str) -> u32 {
    let raw = raw.trim_start();
    let end = numeric_prefix_len(raw, false);
    raw[..end].parse::<u32>().unwrap_or(0)
}

fn numeric_prefix_len(s: &str, allow_fraction: bool) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let digits_start = i;
    i = skip_digits(bytes, i);
    let mut has_digits = i > digits_start;

    if !allow_fraction {
        return i;
    }

    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        i = skip_digits(bytes, frac_start);
        has_digits |= i > frac_start;
    }

    // Exponent only counts after a mantissa digit and with at least one digit of its own.
    if has_digits && matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = skip_digits(bytes, j);
        if exp_end > j {
            i = exp_end;
        }
    }
    i
}

fn skip_digits(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    i
}

/// An inventory item as owned by the store.
///
/// Fields are private: `status` must stay in lockstep with `stock`, so the only
/// way to change an item is through the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    id: ItemId,
    name: String,
    category: String,
    price: f64,
    stock: u32,
    status: ItemStatus,
}

impl Item {
    pub(crate) fn from_fields(id: ItemId, fields: ItemFields) -> Self {
        let price = if fields.price.is_finite() && fields.price > 0.0 {
            fields.price
        } else {
            0.0
        };
        Self {
            id,
            name: fields.name,
            category: fields.category,
            price,
            stock: fields.stock,
            status: status_of(fields.stock),
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// `price × stock`.
    pub fn stock_value(&self) -> f64 {
        self.price * f64::from(self.stock)
    }

    /// Case-insensitive substring match on name or category.
    ///
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.category.to_lowercase().contains(needle)
    }
}
