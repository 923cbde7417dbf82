//! Typed cart document.
//!
//! The cart is stored as a JSON object on the user row, keyed by product id.
//! Older clients wrote bare numbers (`{"<id>": 2}`), current ones write
//! `{"<id>": {"quantity": 2}}`; both are accepted on read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_LINE_QUANTITY: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct Cart {
    #[schema(value_type = Object)]
    lines: BTreeMap<Uuid, CartLine>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart must be a JSON object")]
    NotAnObject,
    #[error("'{0}' is not a product id")]
    InvalidProductId(String),
    #[error("invalid quantity for product {0}")]
    InvalidQuantity(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLine {
    Bare(i64),
    Line { quantity: i64 },
}

fn parse_line(key: &str, value: &Value) -> Result<(Uuid, CartLine), CartError> {
    let product_id =
        Uuid::parse_str(key).map_err(|_| CartError::InvalidProductId(key.to_string()))?;
    let quantity = match serde_json::from_value::<RawLine>(value.clone()) {
        Ok(RawLine::Bare(q)) | Ok(RawLine::Line { quantity: q }) => q,
        Err(_) => return Err(CartError::InvalidQuantity(key.to_string())),
    };
    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
        .ok_or_else(|| CartError::InvalidQuantity(key.to_string()))?;
    Ok((product_id, CartLine { quantity }))
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse client input; any bad entry rejects the whole cart.
    pub fn parse(value: &Value) -> Result<Self, CartError> {
        let object = value.as_object().ok_or(CartError::NotAnObject)?;
        let lines = object
            .iter()
            .map(|(key, value)| parse_line(key, value))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { lines })
    }

    /// Read a stored document, dropping entries that no longer validate.
    ///
    /// Returns the cart and the number of discarded entries.
    pub fn from_stored(value: &Value) -> (Self, usize) {
        let Some(object) = value.as_object() else {
            // `null`, `[]` and other legacy shapes read as empty.
            return (Self::default(), 0);
        };
        let mut dropped = 0;
        let mut lines = BTreeMap::new();
        for (key, value) in object {
            match parse_line(key, value) {
                Ok((id, line)) => {
                    lines.insert(id, line);
                }
                Err(_) => dropped += 1,
            }
        }
        (Self { lines }, dropped)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.lines).unwrap_or_else(|_| Value::Object(Default::default()))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn quantity(&self, product_id: &Uuid) -> u32 {
        self.lines.get(product_id).map_or(0, |line| line.quantity)
    }

    pub fn total_quantity(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.lines.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &CartLine)> {
        self.lines.iter()
    }

    /// Set a line's quantity; zero removes it.
    pub fn set(&mut self, product_id: Uuid, quantity: u32) {
        if quantity == 0 {
            self.lines.remove(&product_id);
        } else {
            self.lines.insert(
                product_id,
                CartLine {
                    quantity: quantity.min(MAX_LINE_QUANTITY),
                },
            );
        }
    }

    pub fn add_one(&mut self, product_id: Uuid) {
        let next = self.quantity(&product_id).saturating_add(1);
        self.set(product_id, next);
    }

    pub fn remove_one(&mut self, product_id: Uuid) {
        let next = self.quantity(&product_id).saturating_sub(1);
        self.set(product_id, next);
    }

    pub fn delete(&mut self, product_id: &Uuid) {
        self.lines.remove(product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Keep only the lines whose product is still in the catalog.
    pub fn retain_products(&mut self, mut exists: impl FnMut(&Uuid) -> bool) -> usize {
        let before = self.lines.len();
        self.lines.retain(|id, _| exists(id));
        before - self.lines.len()
    }
}
