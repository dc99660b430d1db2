use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use sea_orm::{EntityTrait, Set, TransactionTrait};
use tracing::{debug, info, instrument};

use crate::artifacts::{ArtifactStore, TRANSFORMED};
use crate::db::DbPool;
use crate::entities::final_record::{ActiveModel, Column, Entity as FinalRecord};
use crate::errors::EtlError;
use crate::models::OrderLine;
use crate::stages::StageOutcome;

/// Load stage: durably upserts every transformed row into `final_data`.
///
/// The natural key is (order_id, customer_id, product_id): an existing row
/// has all its non-key fields overwritten, a new key is inserted, so loading
/// the same day twice leaves storage exactly as loading it once.
///
/// All of a run's rows go through one transaction, chunked into grouped
/// insert-on-conflict statements; a failure anywhere rolls the whole run
/// back, never leaving the table half-updated.
#[instrument(skip(db, store), fields(date = %date))]
pub async fn load(
    db: &DbPool,
    store: &ArtifactStore,
    date: NaiveDate,
    batch_size: usize,
) -> Result<StageOutcome, EtlError> {
    if !store.has_rows(TRANSFORMED, date)? {
        info!("transformed artifact missing or empty; skipping load");
        return Ok(StageOutcome::Skipped {
            reason: "transformed artifact missing or empty".to_string(),
        });
    }

    let lines: Vec<OrderLine> = store.read_rows(TRANSFORMED, date)?;
    let models: Vec<ActiveModel> = lines
        .into_iter()
        .map(|line| to_active_model(line, date))
        .collect();

    let txn = db.begin().await?;
    let mut upserted = 0usize;
    for chunk in models.chunks(batch_size.max(1)) {
        FinalRecord::insert_many(chunk.to_vec())
            .on_conflict(
                OnConflict::columns([Column::OrderId, Column::CustomerId, Column::ProductId])
                    .update_columns([
                        Column::ProductName,
                        Column::ProductDescription,
                        Column::ProductPrice,
                        Column::Quantity,
                        Column::OrderDate,
                        Column::OrderTotal,
                        Column::FirstName,
                        Column::LastName,
                        Column::Email,
                        Column::Address,
                        Column::PhoneNumber,
                        Column::State,
                        Column::City,
                        Column::ZipCode,
                    ])
                    .to_owned(),
            )
            .exec(&txn)
            .await?;
        upserted += chunk.len();
    }
    txn.commit().await?;

    info!(rows = upserted, "rows upserted into final_data");
    Ok(StageOutcome::Completed { rows: upserted })
}

/// Maps one transformed row onto the entity, stamping the partition date as
/// the canonical order_date. The extracted order_date is overridden
/// unconditionally; the partition date is authoritative for the run.
fn to_active_model(line: OrderLine, partition_date: NaiveDate) -> ActiveModel {
    if line.order_date != partition_date {
        debug!(
            order_id = %line.order_id,
            extracted = %line.order_date,
            partition = %partition_date,
            "overriding extracted order_date with partition date"
        );
    }
    ActiveModel {
        order_id: Set(line.order_id),
        customer_id: Set(line.customer_id),
        product_id: Set(line.product_id),
        product_name: Set(line.product_name),
        product_description: Set(line.product_description),
        product_price: Set(line.product_price),
        quantity: Set(line.quantity),
        order_date: Set(partition_date),
        order_total: Set(line.order_total),
        first_name: Set(line.first_name),
        last_name: Set(line.last_name),
        email: Set(line.email),
        address: Set(line.address),
        phone_number: Set(line.phone_number),
        state: Set(line.state),
        city: Set(line.city),
        zip_code: Set(line.zip_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(order_date: NaiveDate) -> OrderLine {
        OrderLine {
            order_id: "O1".to_string(),
            customer_id: "C1".to_string(),
            product_id: "P1".to_string(),
            quantity: 2,
            order_total: dec!(23.48),
            order_date,
            first_name: None,
            last_name: None,
            email: None,
            address: None,
            phone_number: None,
            state: None,
            city: None,
            zip_code: None,
            product_name: Some("Widget".to_string()),
            product_description: None,
            product_price: Some(dec!(9.99)),
        }
    }

    #[test]
    fn partition_date_overrides_extracted_order_date() {
        let extracted = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let partition = NaiveDate::from_ymd_opt(2024, 6, 17).unwrap();

        let model = to_active_model(line(extracted), partition);

        assert_eq!(model.order_date.clone().unwrap(), partition);
        assert_eq!(model.order_id.clone().unwrap(), "O1");
        assert_eq!(model.quantity.clone().unwrap(), 2);
    }
}
