use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::artifacts::{ArtifactStore, CUSTOMERS, ORDERS, PRODUCTS, TRANSFORMED};
use crate::errors::EtlError;
use crate::models::{Customer, Order, OrderLine, Product};
use crate::stages::StageOutcome;

/// Transform stage: flatten-then-join.
///
/// Expands each order's embedded product-quantity map into one row per
/// (order, product), then left-joins customer and product reference data
/// onto every row. Missing or empty input artifacts make the stage a
/// deliberate skip; malformed data is a hard failure.
#[instrument(skip(store), fields(date = %date))]
pub fn transform(store: &ArtifactStore, date: NaiveDate) -> Result<StageOutcome, EtlError> {
    for name in [CUSTOMERS, ORDERS, PRODUCTS] {
        if !store.has_rows(name, date)? {
            info!(artifact = name, "input artifact missing or empty; skipping transform");
            return Ok(StageOutcome::Skipped {
                reason: format!("{name} artifact missing or empty"),
            });
        }
    }

    let customers: Vec<Customer> = store.read_rows(CUSTOMERS, date)?;
    let orders: Vec<Order> = store.read_rows(ORDERS, date)?;
    let products: Vec<Product> = store.read_rows(PRODUCTS, date)?;

    let lines = flatten_and_join(&orders, &customers, &products)?;
    store.write_rows(TRANSFORMED, date, &lines)?;

    info!(
        orders = orders.len(),
        lines = lines.len(),
        "orders flattened and joined"
    );

    Ok(StageOutcome::Completed { rows: lines.len() })
}

/// Expands every order into (order, product_id, quantity) rows and left-joins
/// the reference collections by ID. Rows without a matching customer or
/// product keep empty joined fields instead of being dropped, so an order
/// line survives missing master data.
pub fn flatten_and_join(
    orders: &[Order],
    customers: &[Customer],
    products: &[Product],
) -> Result<Vec<OrderLine>, EtlError> {
    let customers_by_id: HashMap<&str, &Customer> = customers
        .iter()
        .map(|c| (c.customer_id.as_str(), c))
        .collect();
    let products_by_id: HashMap<&str, &Product> =
        products.iter().map(|p| (p.product_id.as_str(), p)).collect();

    let mut lines = Vec::new();
    for order in orders {
        // An order with an empty product map contributes zero rows; the rest
        // of the batch proceeds untouched.
        let quantities = order.decoded_product_quantities()?;

        for (product_id, quantity) in quantities {
            let customer = customers_by_id.get(order.customer_id.as_str()).copied();
            if customer.is_none() {
                warn!(
                    order_id = %order.order_id,
                    customer_id = %order.customer_id,
                    "no matching customer record; emitting row with empty customer fields"
                );
            }
            let product = products_by_id.get(product_id.as_str()).copied();
            if product.is_none() {
                warn!(
                    order_id = %order.order_id,
                    product_id = %product_id,
                    "no matching product record; emitting row with empty product fields"
                );
            }

            lines.push(OrderLine {
                order_id: order.order_id.clone(),
                customer_id: order.customer_id.clone(),
                product_id,
                quantity,
                order_total: order.order_total,
                order_date: order.order_date,
                first_name: customer.map(|c| c.first_name.clone()),
                last_name: customer.map(|c| c.last_name.clone()),
                email: customer.map(|c| c.email.clone()),
                address: customer.map(|c| c.address.clone()),
                phone_number: customer.map(|c| c.phone_number.clone()),
                state: customer.map(|c| c.state.clone()),
                city: customer.map(|c| c.city.clone()),
                zip_code: customer.map(|c| c.zip_code.clone()),
                product_name: product.map(|p| p.product_name.clone()),
                product_description: product.map(|p| p.product_description.clone()),
                product_price: product.map(|p| p.product_price),
            });
        }
    }

    Ok(lines)
}
