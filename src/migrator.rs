use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240617_000001_create_final_data_table::Migration)]
    }
}

// Migration implementations

mod m20240617_000001_create_final_data_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240617_000001_create_final_data_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create final_data aligned with entities::final_record Model.
            // Create-if-absent only; this pipeline never drops the table.
            manager
                .create_table(
                    Table::create()
                        .table(FinalData::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(FinalData::OrderId).string().not_null())
                        .col(ColumnDef::new(FinalData::CustomerId).string().not_null())
                        .col(ColumnDef::new(FinalData::ProductId).string().not_null())
                        .col(ColumnDef::new(FinalData::ProductName).string().null())
                        .col(ColumnDef::new(FinalData::ProductDescription).string().null())
                        .col(ColumnDef::new(FinalData::ProductPrice).decimal().null())
                        .col(ColumnDef::new(FinalData::Quantity).integer().not_null())
                        .col(ColumnDef::new(FinalData::OrderDate).date().not_null())
                        .col(
                            ColumnDef::new(FinalData::OrderTotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(FinalData::FirstName).string().null())
                        .col(ColumnDef::new(FinalData::LastName).string().null())
                        .col(ColumnDef::new(FinalData::Email).string().null())
                        .col(ColumnDef::new(FinalData::Address).string().null())
                        .col(ColumnDef::new(FinalData::PhoneNumber).string().null())
                        .col(ColumnDef::new(FinalData::State).string().null())
                        .col(ColumnDef::new(FinalData::City).string().null())
                        .col(ColumnDef::new(FinalData::ZipCode).string().null())
                        .primary_key(
                            Index::create()
                                .col(FinalData::OrderId)
                                .col(FinalData::CustomerId)
                                .col(FinalData::ProductId),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_final_data_order_date")
                        .table(FinalData::Table)
                        .col(FinalData::OrderDate)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FinalData::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum FinalData {
        Table,
        OrderId,
        CustomerId,
        ProductId,
        ProductName,
        ProductDescription,
        ProductPrice,
        Quantity,
        OrderDate,
        OrderTotal,
        FirstName,
        LastName,
        Email,
        Address,
        PhoneNumber,
        State,
        City,
        ZipCode,
    }
}
