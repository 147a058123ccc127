use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned product identifier.
///
/// The product API is free to hand out numeric or string ids; both are kept in
/// their textual form so that `1` and `"1"` name the same product. Surrounding
/// whitespace is dropped whether the id comes off the wire or from user input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(#[serde(deserialize_with = "deserialize_id")] pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_owned())
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub price: String,
}

impl Product {
    /// Decimal value of `price`, when the text is a plain number.
    pub fn amount(&self) -> Option<Decimal> {
        self.price.trim().parse::<Decimal>().ok()
    }

    pub fn name_matches(&self, needle_lowercase: &str) -> bool {
        self.name.to_lowercase().contains(needle_lowercase)
    }
}

/// Unsubmitted new-product form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub price: String,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self { name: name.into(), price: price.into() }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireText {
    Number(serde_json::Number),
    Text(String),
}

impl WireText {
    fn into_string(self) -> String {
        match self {
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text,
        }
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    WireText::deserialize(deserializer).map(WireText::into_string)
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_text(deserializer).map(|text| text.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Product, ProductDraft, ProductId};

    #[test]
    fn numeric_and_string_ids_decode_to_the_same_identifier() {
        let numeric: Product =
            serde_json::from_str(r#"{"id":5,"name":"Pen","price":"2.00"}"#).expect("numeric id");
        let text: Product =
            serde_json::from_str(r#"{"id":"5","name":"Pen","price":"2.00"}"#).expect("text id");

        assert_eq!(numeric.id, ProductId::from("5"));
        assert_eq!(numeric, text);
    }

    #[test]
    fn padded_wire_id_matches_typed_id() {
        let product: Product =
            serde_json::from_str(r#"{"id":" 7 ","name":"Ink","price":"4.00"}"#).expect("decode");

        assert_eq!(product.id, ProductId::from("7"));
        assert_eq!(product.id.as_str(), "7");
    }

    #[test]
    fn numeric_price_is_kept_as_text() {
        let product: Product =
            serde_json::from_str(r#"{"id":"a1","name":"Mug","price":7.5}"#).expect("decode");

        assert_eq!(product.price, "7.5");
        assert_eq!(product.amount(), Some(Decimal::new(75, 1)));
    }

    #[test]
    fn unparsable_price_has_no_amount() {
        let product = Product {
            id: ProductId::from("1"),
            name: "Gift card".to_owned(),
            price: "ask".to_owned(),
        };

        assert_eq!(product.amount(), None);
    }

    #[test]
    fn draft_serializes_as_name_and_price_only() {
        let body = serde_json::to_value(ProductDraft::new("Pen", "2.00")).expect("encode");

        assert_eq!(body, serde_json::json!({ "name": "Pen", "price": "2.00" }));
    }
}
