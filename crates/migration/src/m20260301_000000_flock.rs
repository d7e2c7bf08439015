//! Flock tables.
//!
//! - `hens`: one row per hen, profile fields nullable so partial rows load
//!   with defaults
//! - `egg_logs`: laying events with a hen name snapshot
//!
//! `egg_logs.hen_id` carries no foreign key: events may outlive their hen and
//! cascade deletion is done by the engine inside a transaction.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Hens {
    Table,
    Id,
    Name,
    Breed,
    Age,
    Color,
    CreatedAt,
}

#[derive(Iden)]
enum EggLogs {
    Table,
    Id,
    HenId,
    HenName,
    Weight,
    Quantity,
    Timestamp,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Hens::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Hens::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Hens::Name).string())
                    .col(ColumnDef::new(Hens::Breed).string())
                    .col(ColumnDef::new(Hens::Age).string())
                    .col(ColumnDef::new(Hens::Color).string())
                    .col(ColumnDef::new(Hens::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EggLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EggLogs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EggLogs::HenId).string().not_null())
                    .col(ColumnDef::new(EggLogs::HenName).string())
                    .col(ColumnDef::new(EggLogs::Weight).double())
                    .col(ColumnDef::new(EggLogs::Quantity).big_integer())
                    .col(ColumnDef::new(EggLogs::Timestamp).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-egg_logs-hen_id")
                    .table(EggLogs::Table)
                    .col(EggLogs::HenId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-egg_logs-timestamp")
                    .table(EggLogs::Table)
                    .col(EggLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EggLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Hens::Table).to_owned())
            .await?;
        Ok(())
    }
}
