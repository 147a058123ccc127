use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};

/// Products known to the client, in the order the API delivered them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == product_id)
    }

    pub fn replace_all(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    pub fn append(&mut self, product: Product) {
        self.products.push(product);
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn view(&self, filter: &str) -> Vec<&Product> {
        filter_products(&self.products, filter)
    }
}

/// Products whose name contains `filter`, ignoring case. An empty filter keeps
/// everything; relative order is preserved.
pub fn filter_products<'a>(products: &'a [Product], filter: &str) -> Vec<&'a Product> {
    let needle = filter.to_lowercase();
    products.iter().filter(|product| product.name_matches(&needle)).collect()
}
