// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_inquiry_tables::{Inquiries, InquiryItems};

/// 成本核算、审批、报价与生产订单表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CostCalculations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CostCalculations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CostCalculations::InquiryItemId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CostCalculations::MaterialCost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CostCalculations::LaborCost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CostCalculations::OverheadCost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CostCalculations::TotalCost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CostCalculations::Status)
                            .string()
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(
                        ColumnDef::new(CostCalculations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cost_calculations_item")
                            .from(CostCalculations::Table, CostCalculations::InquiryItemId)
                            .to(InquiryItems::Table, InquiryItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Approvals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Approvals::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Approvals::CostCalculationId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Approvals::ApproverId).string().not_null())
                    .col(
                        ColumnDef::new(Approvals::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Approvals::Comment).text())
                    .col(
                        ColumnDef::new(Approvals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approvals_cost_calculation")
                            .from(Approvals::Table, Approvals::CostCalculationId)
                            .to(CostCalculations::Table, CostCalculations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Quotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Quotes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Quotes::InquiryId).string().not_null())
                    .col(
                        ColumnDef::new(Quotes::TotalAmount)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Quotes::Currency)
                            .string()
                            .not_null()
                            .default("CNY"),
                    )
                    .col(
                        ColumnDef::new(Quotes::Status)
                            .string()
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(ColumnDef::new(Quotes::ValidUntil).string())
                    .col(
                        ColumnDef::new(Quotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quotes_inquiry")
                            .from(Quotes::Table, Quotes::InquiryId)
                            .to(Inquiries::Table, Inquiries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionOrders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductionOrders::QuoteId).string().not_null())
                    .col(
                        ColumnDef::new(ProductionOrders::OrderNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::Status)
                            .string()
                            .not_null()
                            .default("PLANNED"),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_orders_quote")
                            .from(ProductionOrders::Table, ProductionOrders::QuoteId)
                            .to(Quotes::Table, Quotes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductionOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Quotes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Approvals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CostCalculations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CostCalculations {
    Table,
    Id,
    InquiryItemId,
    MaterialCost,
    LaborCost,
    OverheadCost,
    TotalCost,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Approvals {
    Table,
    Id,
    CostCalculationId,
    ApproverId,
    Status,
    Comment,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Quotes {
    Table,
    Id,
    InquiryId,
    TotalAmount,
    Currency,
    Status,
    ValidUntil,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProductionOrders {
    Table,
    Id,
    QuoteId,
    OrderNumber,
    Status,
    CreatedAt,
}
