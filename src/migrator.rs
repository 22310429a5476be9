use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_order_tables::Migration),
            Box::new(m20250601_000002_create_fulfillment_tables::Migration),
            Box::new(m20250601_000003_create_billing_tables::Migration),
        ]
    }
}

mod m20250601_000001_create_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000001_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductSku).string().not_null())
                        .col(
                            ColumnDef::new(OrderItems::RequestedQty)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::UnitPrice).decimal().not_null())
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Assignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Assignments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Assignments::OrderItemId).uuid().not_null())
                        .col(ColumnDef::new(Assignments::OrderId).uuid().not_null())
                        .col(ColumnDef::new(Assignments::VendorId).uuid().not_null())
                        .col(
                            ColumnDef::new(Assignments::RequestedQty)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Assignments::ConfirmedQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Assignments::BackorderQty)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Assignments::Status).string().not_null())
                        .col(ColumnDef::new(Assignments::DeclineReason).string().null())
                        .col(
                            ColumnDef::new(Assignments::DecidedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Assignments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Assignments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Assignments::Version)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assignments_order_item")
                                .from(Assignments::Table, Assignments::OrderItemId)
                                .to(OrderItems::Table, OrderItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Assignments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductSku,
        RequestedQty,
        UnitPrice,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Assignments {
        Table,
        Id,
        OrderItemId,
        OrderId,
        VendorId,
        RequestedQty,
        ConfirmedQty,
        BackorderQty,
        Status,
        DeclineReason,
        DecidedAt,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}

mod m20250601_000002_create_fulfillment_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000002_create_fulfillment_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::PoNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::OrderId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::VendorId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::GeneratedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Version)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::AssignmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::OrderItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::ProductSku)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderLines::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_po_lines_po")
                                .from(
                                    PurchaseOrderLines::Table,
                                    PurchaseOrderLines::PurchaseOrderId,
                                )
                                .to(PurchaseOrders::Table, PurchaseOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Dispatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Dispatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Dispatches::AwbNumber).string().not_null())
                        .col(
                            ColumnDef::new(Dispatches::LogisticsPartner)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::DispatchDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::EstimatedDeliveryDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dispatches_po")
                                .from(Dispatches::Table, Dispatches::PurchaseOrderId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DispatchLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DispatchLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispatchLines::DispatchId).uuid().not_null())
                        .col(
                            ColumnDef::new(DispatchLines::PurchaseOrderLineId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchLines::DispatchedQty)
                                .integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dispatch_lines_dispatch")
                                .from(DispatchLines::Table, DispatchLines::DispatchId)
                                .to(Dispatches::Table, Dispatches::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dispatch_lines_po_line")
                                .from(DispatchLines::Table, DispatchLines::PurchaseOrderLineId)
                                .to(PurchaseOrderLines::Table, PurchaseOrderLines::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceipts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceipts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceipts::DispatchId).uuid().not_null())
                        .col(ColumnDef::new(GoodsReceipts::Status).string().not_null())
                        .col(
                            ColumnDef::new(GoodsReceipts::ReceivedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceipts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_goods_receipts_dispatch")
                                .from(GoodsReceipts::Table, GoodsReceipts::DispatchId)
                                .to(Dispatches::Table, Dispatches::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceiptLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceiptLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptLines::GoodsReceiptId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptLines::DispatchLineId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptLines::DispatchedQty)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptLines::ReceivedQty)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptLines::DiscrepancyQty)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptLines::DamageReported)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(GoodsReceiptLines::Status)
                                .string()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_grn_lines_grn")
                                .from(GoodsReceiptLines::Table, GoodsReceiptLines::GoodsReceiptId)
                                .to(GoodsReceipts::Table, GoodsReceipts::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                Table::drop().table(GoodsReceiptLines::Table).to_owned(),
                Table::drop().table(GoodsReceipts::Table).to_owned(),
                Table::drop().table(DispatchLines::Table).to_owned(),
                Table::drop().table(Dispatches::Table).to_owned(),
                Table::drop().table(PurchaseOrderLines::Table).to_owned(),
                Table::drop().table(PurchaseOrders::Table).to_owned(),
            ] {
                manager.drop_table(table).await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrders {
        Table,
        Id,
        PoNumber,
        OrderId,
        VendorId,
        Status,
        TotalAmount,
        GeneratedAt,
        CreatedAt,
        UpdatedAt,
        Version,
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrderLines {
        Table,
        Id,
        PurchaseOrderId,
        AssignmentId,
        OrderItemId,
        ProductSku,
        Quantity,
        UnitPrice,
    }

    #[derive(DeriveIden)]
    pub enum Dispatches {
        Table,
        Id,
        PurchaseOrderId,
        AwbNumber,
        LogisticsPartner,
        DispatchDate,
        EstimatedDeliveryDate,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum DispatchLines {
        Table,
        Id,
        DispatchId,
        PurchaseOrderLineId,
        DispatchedQty,
    }

    #[derive(DeriveIden)]
    pub enum GoodsReceipts {
        Table,
        Id,
        DispatchId,
        Status,
        ReceivedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum GoodsReceiptLines {
        Table,
        Id,
        GoodsReceiptId,
        DispatchLineId,
        DispatchedQty,
        ReceivedQty,
        DiscrepancyQty,
        DamageReported,
        Status,
    }
}

mod m20250601_000003_create_billing_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250601_000003_create_billing_tables"
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
                        .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Invoices::PurchaseOrderId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::VendorId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::Status).string().not_null())
                        .col(
                            ColumnDef::new(Invoices::Amount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Invoices::VendorFileName).string().null())
                        .col(ColumnDef::new(Invoices::VendorFileUrl).string().null())
                        .col(ColumnDef::new(Invoices::AccountsFileName).string().null())
                        .col(ColumnDef::new(Invoices::AccountsFileUrl).string().null())
                        .col(ColumnDef::new(Invoices::RejectionReason).string().null())
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::Version)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(Payments::PurchaseOrderId).uuid().not_null())
                        .col(ColumnDef::new(Payments::VendorId).uuid().not_null())
                        .col(
                            ColumnDef::new(Payments::InvoiceAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::DeliveryVerified)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Payments::Status).string().not_null())
                        .col(
                            ColumnDef::new(Payments::DueDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::ReleaseDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Payments::ReferenceId).string().null())
                        .col(ColumnDef::new(Payments::AdjustmentReason).string().null())
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Payments::Version)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payments_invoice")
                                .from(Payments::Table, Payments::InvoiceId)
                                .to(Invoices::Table, Invoices::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Invoices {
        Table,
        Id,
        PurchaseOrderId,
        VendorId,
        Status,
        Amount,
        VendorFileName,
        VendorFileUrl,
        AccountsFileName,
        AccountsFileUrl,
        RejectionReason,
        CreatedAt,
        UpdatedAt,
        Version,
    }

    #[derive(DeriveIden)]
    pub enum Payments {
        Table,
        Id,
        InvoiceId,
        PurchaseOrderId,
        VendorId,
        InvoiceAmount,
        DeliveryVerified,
        Status,
        DueDate,
        ReleaseDate,
        ReferenceId,
        AdjustmentReason,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}
