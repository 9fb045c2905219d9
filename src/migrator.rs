use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_parties_tables::Migration),
            Box::new(m20240101_000003_create_invoices_tables::Migration),
            Box::new(m20240101_000004_create_payments_table::Migration),
            Box::new(m20240101_000005_add_reporting_indexes::Migration),
        ]
    }
}

mod m20240101_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Username)
                                .string_len(80)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::FullName).string_len(200).not_null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        FullName,
        CreatedAt,
    }
}

mod m20240101_000002_create_parties_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_parties_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Customers::Name).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Customers::Email)
                                .string_len(120)
                                .null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::Phone).string_len(20).null())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Suppliers::ContactInfo).string_len(200).null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_name")
                        .table(Customers::Table)
                        .col(Customers::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_suppliers_name")
                        .table(Suppliers::Table)
                        .col(Suppliers::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        Name,
        Email,
        Phone,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        Name,
        ContactInfo,
        CreatedAt,
    }
}

mod m20240101_000003_create_invoices_tables {
    use super::m20240101_000002_create_parties_tables::{Customers, Suppliers};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_invoices_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Invoices::InvoiceNumber)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Invoices::CustomerId).integer().null())
                        .col(
                            ColumnDef::new(Invoices::CustomerName)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(money(Invoices::Subtotal))
                        .col(money(Invoices::TaxAmount))
                        .col(money(Invoices::Discount))
                        .col(money(Invoices::TotalAmount))
                        .col(
                            ColumnDef::new(Invoices::Status)
                                .string_len(20)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Invoices::InvoiceType)
                                .string_len(20)
                                .not_null()
                                .default("sales"),
                        )
                        .col(ColumnDef::new(Invoices::Notes).text().null())
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_customer_id")
                                .from(Invoices::Table, Invoices::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseInvoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseInvoices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseInvoices::InvoiceNumber)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseInvoices::SupplierId).integer().null())
                        .col(
                            ColumnDef::new(PurchaseInvoices::SupplierName)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseInvoices::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(money(PurchaseInvoices::Subtotal))
                        .col(money(PurchaseInvoices::TaxAmount))
                        .col(money(PurchaseInvoices::Discount))
                        .col(money(PurchaseInvoices::TotalAmount))
                        .col(
                            ColumnDef::new(PurchaseInvoices::Status)
                                .string_len(20)
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(PurchaseInvoices::Notes).text().null())
                        .col(
                            ColumnDef::new(PurchaseInvoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_invoices_supplier_id")
                                .from(PurchaseInvoices::Table, PurchaseInvoices::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseInvoices::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    fn money<T: IntoIden>(col: T) -> ColumnDef {
        ColumnDef::new(col)
            .decimal_len(12, 2)
            .not_null()
            .default(0)
            .to_owned()
    }

    #[derive(DeriveIden)]
    pub(super) enum Invoices {
        Table,
        Id,
        InvoiceNumber,
        CustomerId,
        CustomerName,
        Date,
        Subtotal,
        TaxAmount,
        Discount,
        TotalAmount,
        Status,
        InvoiceType,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum PurchaseInvoices {
        Table,
        Id,
        InvoiceNumber,
        SupplierId,
        SupplierName,
        Date,
        Subtotal,
        TaxAmount,
        Discount,
        TotalAmount,
        Status,
        Notes,
        CreatedAt,
    }
}

mod m20240101_000004_create_payments_table {
    use super::m20240101_000003_create_invoices_tables::Invoices;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_payments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Payments::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Payments::Date)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::Amount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::PaymentMethod)
                                .string_len(20)
                                .not_null()
                                .default("cash"),
                        )
                        .col(
                            ColumnDef::new(Payments::PaymentType)
                                .string_len(20)
                                .not_null()
                                .default("received"),
                        )
                        .col(ColumnDef::new(Payments::ReferenceNumber).string_len(50).null())
                        .col(ColumnDef::new(Payments::InvoiceId).integer().null())
                        .col(ColumnDef::new(Payments::CustomerName).string_len(100).null())
                        .col(ColumnDef::new(Payments::SupplierName).string_len(100).null())
                        .col(ColumnDef::new(Payments::Notes).text().null())
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_invoice_id")
                                .from(Payments::Table, Payments::InvoiceId)
                                .to(Invoices::Table, Invoices::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Payments {
        Table,
        Id,
        Date,
        Amount,
        PaymentMethod,
        PaymentType,
        ReferenceNumber,
        InvoiceId,
        CustomerName,
        SupplierName,
        Notes,
        CreatedAt,
    }
}

mod m20240101_000005_add_reporting_indexes {
    use super::m20240101_000003_create_invoices_tables::{Invoices, PurchaseInvoices};
    use super::m20240101_000004_create_payments_table::Payments;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_add_reporting_indexes"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let indexes = [
                Index::create()
                    .if_not_exists()
                    .name("idx_invoices_date")
                    .table(Invoices::Table)
                    .col(Invoices::Date)
                    .to_owned(),
                Index::create()
                    .if_not_exists()
                    .name("idx_invoices_status")
                    .table(Invoices::Table)
                    .col(Invoices::Status)
                    .to_owned(),
                Index::create()
                    .if_not_exists()
                    .name("idx_invoices_customer_date")
                    .table(Invoices::Table)
                    .col(Invoices::CustomerName)
                    .col(Invoices::Date)
                    .to_owned(),
                Index::create()
                    .if_not_exists()
                    .name("idx_purchase_invoices_date")
                    .table(PurchaseInvoices::Table)
                    .col(PurchaseInvoices::Date)
                    .to_owned(),
                Index::create()
                    .if_not_exists()
                    .name("idx_payments_date")
                    .table(Payments::Table)
                    .col(Payments::Date)
                    .to_owned(),
                Index::create()
                    .if_not_exists()
                    .name("idx_payments_invoice_id")
                    .table(Payments::Table)
                    .col(Payments::InvoiceId)
                    .to_owned(),
                Index::create()
                    .if_not_exists()
                    .name("idx_payments_type_date")
                    .table(Payments::Table)
                    .col(Payments::PaymentType)
                    .col(Payments::Date)
                    .to_owned(),
            ];

            for index in indexes {
                manager.create_index(index).await?;
            }
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let names = [
                ("idx_invoices_date", "invoices"),
                ("idx_invoices_status", "invoices"),
                ("idx_invoices_customer_date", "invoices"),
                ("idx_purchase_invoices_date", "purchase_invoices"),
                ("idx_payments_date", "payments"),
                ("idx_payments_invoice_id", "payments"),
                ("idx_payments_type_date", "payments"),
            ];
            for (name, table) in names {
                manager
                    .drop_index(Index::drop().name(name).table(Alias::new(table)).to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}
