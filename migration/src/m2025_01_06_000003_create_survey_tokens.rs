//! Migration to create the survey_tokens table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SurveyTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SurveyTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SurveyTokens::ClientId).uuid().not_null())
                    .col(ColumnDef::new(SurveyTokens::EmployeeId).uuid().null())
                    .col(
                        ColumnDef::new(SurveyTokens::Channel)
                            .string_len(16)
                            .not_null()
                            .default("web"),
                    )
                    .col(
                        ColumnDef::new(SurveyTokens::Status)
                            .string_len(16)
                            .not_null()
                            .default("issued"),
                    )
                    .col(
                        ColumnDef::new(SurveyTokens::ValidUntil)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SurveyTokens::ConsumedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SurveyTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-survey_tokens-client_id")
                            .from(SurveyTokens::Table, SurveyTokens::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-survey_tokens-client-status")
                    .table(SurveyTokens::Table)
                    .col(SurveyTokens::ClientId)
                    .col(SurveyTokens::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SurveyTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SurveyTokens {
    Table,
    Id,
    ClientId,
    EmployeeId,
    Channel,
    Status,
    ValidUntil,
    ConsumedAt,
    CreatedAt,
}
