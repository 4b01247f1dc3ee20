// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 用户、询价单与询价明细表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    /// 应用数据库迁移
    ///
    /// # 参数
    ///
    /// * `manager` - 数据库模式管理器
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 迁移成功
    /// * `Err(DbErr)` - 迁移失败
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. users (no dependencies)
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("USER"),
                    )
                    .col(ColumnDef::new(Users::Department).string())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. inquiries
        manager
            .create_table(
                Table::create()
                    .table(Inquiries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inquiries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Inquiries::Title).string().not_null())
                    .col(ColumnDef::new(Inquiries::CustomerName).string().not_null())
                    .col(
                        ColumnDef::new(Inquiries::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Inquiries::Priority)
                            .string()
                            .not_null()
                            .default("MEDIUM"),
                    )
                    .col(ColumnDef::new(Inquiries::CreatedBy).string())
                    .col(
                        ColumnDef::new(Inquiries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 3. inquiry_items (depends on inquiries)
        manager
            .create_table(
                Table::create()
                    .table(InquiryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InquiryItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InquiryItems::InquiryId).string().not_null())
                    .col(ColumnDef::new(InquiryItems::Name).string().not_null())
                    .col(
                        ColumnDef::new(InquiryItems::Quantity)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(InquiryItems::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(InquiryItems::AssignedTo).string())
                    .col(
                        ColumnDef::new(InquiryItems::Position)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InquiryItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inquiry_items_inquiry")
                            .from(InquiryItems::Table, InquiryItems::InquiryId)
                            .to(Inquiries::Table, Inquiries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inquiry_items_inquiry")
                    .table(InquiryItems::Table)
                    .col(InquiryItems::InquiryId)
                    .col(InquiryItems::Position)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inquiry_items_assignee")
                    .table(InquiryItems::Table)
                    .col(InquiryItems::AssignedTo)
                    .col(InquiryItems::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InquiryItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Inquiries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Email,
    Name,
    Role,
    Department,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Inquiries {
    Table,
    Id,
    Title,
    CustomerName,
    Status,
    Priority,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum InquiryItems {
    Table,
    Id,
    InquiryId,
    Name,
    Quantity,
    Status,
    AssignedTo,
    Position,
    CreatedAt,
}
