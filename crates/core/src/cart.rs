use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartAddOutcome {
    Added,
    AlreadyPresent,
}

/// Session-local selection of products. Never holds the same id twice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<Product>,
}

impl Cart {
    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == product_id)
    }

    pub fn add(&mut self, product: &Product) -> CartAddOutcome {
        if self.contains(&product.id) {
            return CartAddOutcome::AlreadyPresent;
        }

        self.items.push(product.clone());
        CartAddOutcome::Added
    }

    /// Drops every entry with `product_id` and returns how many were removed.
    pub fn remove(&mut self, product_id: &ProductId) -> usize {
        let before = self.items.len();
        self.items.retain(|item| &item.id != product_id);
        before - self.items.len()
    }

    /// Sum of the prices that parse as decimals.
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().filter_map(Product::amount).sum()
    }
}
