use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::EtlError;

/// Customer reference record, fetched from the remote API and persisted
/// verbatim in the customers artifact. Immutable for the duration of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub phone_number: String,
    pub state: String,
    pub city: String,
    pub zip_code: String,
}

/// Product reference record. Immutable for the duration of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    pub product_description: String,
    pub product_price: Decimal,
}

/// Order header as extracted. The embedded one-to-many relationship to
/// products travels in `product_quantities` as a string-encoded map and stays
/// opaque until the transform stage decodes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub order_total: Decimal,
    pub order_date: NaiveDate,
    pub product_quantities: String,
}

impl Order {
    /// Decodes the embedded product-quantity map. Sorted map so flattening
    /// emits rows in a deterministic order.
    pub fn decoded_product_quantities(&self) -> Result<BTreeMap<String, i32>, EtlError> {
        decode_product_quantities(&self.product_quantities, &self.order_id)
    }
}

/// One denormalized row of the transform output: the natural key
/// (order_id, customer_id, product_id) plus quantity, order attributes, and
/// left-joined customer/product attributes. Unmatched joins leave the
/// `Option` fields empty rather than dropping the row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub order_total: Decimal,
    pub order_date: NaiveDate,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub product_price: Option<Decimal>,
}

/// Decodes a string-encoded product-quantity map into (product_id, quantity)
/// pairs.
///
/// The upstream encoder uses single-quoted keys and values, which no strict
/// JSON decoder accepts; quoting is normalized first, then parsed strictly so
/// malformed input fails the run loudly instead of being guessed at.
pub fn decode_product_quantities(
    raw: &str,
    order_id: &str,
) -> Result<BTreeMap<String, i32>, EtlError> {
    let normalized = normalize_quoting(raw);
    serde_json::from_str(&normalized).map_err(|source| EtlError::MalformedField {
        field: "product_quantities",
        record: order_id.to_string(),
        source,
    })
}

fn normalize_quoting(raw: &str) -> String {
    raw.replace('\'', "\"")
}
