//! Migration to create the survey_responses table.
//!
//! Responses are append-only. `token_id` is unique so a token can back at
//! most one row; synthetic rows carry no token. Org columns are copied from
//! the employee at submission time and serve as grouping keys.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table
            .table(SurveyResponses::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(SurveyResponses::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(SurveyResponses::TokenId).uuid().null())
            .col(ColumnDef::new(SurveyResponses::ClientId).uuid().not_null())
            .col(ColumnDef::new(SurveyResponses::EmployeeId).uuid().null())
            .col(ColumnDef::new(SurveyResponses::DivisionId).uuid().null())
            .col(ColumnDef::new(SurveyResponses::DepartmentId).uuid().null())
            .col(ColumnDef::new(SurveyResponses::TeamId).uuid().null());

        for column in [
            SurveyResponses::Sentiment3,
            SurveyResponses::Sentiment5,
            SurveyResponses::Clarity3,
            SurveyResponses::Clarity5,
            SurveyResponses::Workload3,
            SurveyResponses::Workload5,
            SurveyResponses::Safety3,
            SurveyResponses::Safety5,
            SurveyResponses::Leadership3,
            SurveyResponses::Leadership5,
        ] {
            table.col(ColumnDef::new(column).integer().null());
        }

        table
            .col(ColumnDef::new(SurveyResponses::CommentText).text().null())
            .col(
                ColumnDef::new(SurveyResponses::SupportRequested)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(
                ColumnDef::new(SurveyResponses::SupportContactMethod)
                    .text()
                    .null(),
            )
            .col(
                ColumnDef::new(SurveyResponses::SupportContactValue)
                    .text()
                    .null(),
            )
            .col(ColumnDef::new(SurveyResponses::SupportTimeframe).text().null())
            .col(
                ColumnDef::new(SurveyResponses::HighRiskFlag)
                    .boolean()
                    .not_null()
                    .default(false),
            )
            .col(ColumnDef::new(SurveyResponses::RiskFactors).json_binary().null())
            .col(ColumnDef::new(SurveyResponses::Meta).json_binary().null())
            .col(
                ColumnDef::new(SurveyResponses::Source)
                    .string_len(32)
                    .not_null()
                    .default("survey"),
            )
            .col(
                ColumnDef::new(SurveyResponses::SubmittedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk-survey_responses-client_id")
                    .from(SurveyResponses::Table, SurveyResponses::ClientId)
                    .to(Clients::Table, Clients::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );

        manager.create_table(table.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-survey_responses-token_id")
                    .table(SurveyResponses::Table)
                    .col(SurveyResponses::TokenId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-survey_responses-client-submitted")
                    .table(SurveyResponses::Table)
                    .col(SurveyResponses::ClientId)
                    .col(SurveyResponses::SubmittedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-survey_responses-client-source")
                    .table(SurveyResponses::Table)
                    .col(SurveyResponses::ClientId)
                    .col(SurveyResponses::Source)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SurveyResponses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SurveyResponses {
    Table,
    Id,
    TokenId,
    ClientId,
    EmployeeId,
    DivisionId,
    DepartmentId,
    TeamId,
    #[sea_orm(iden = "sentiment_3")]
    Sentiment3,
    #[sea_orm(iden = "sentiment_5")]
    Sentiment5,
    #[sea_orm(iden = "clarity_3")]
    Clarity3,
    #[sea_orm(iden = "clarity_5")]
    Clarity5,
    #[sea_orm(iden = "workload_3")]
    Workload3,
    #[sea_orm(iden = "workload_5")]
    Workload5,
    #[sea_orm(iden = "safety_3")]
    Safety3,
    #[sea_orm(iden = "safety_5")]
    Safety5,
    #[sea_orm(iden = "leadership_3")]
    Leadership3,
    #[sea_orm(iden = "leadership_5")]
    Leadership5,
    CommentText,
    SupportRequested,
    SupportContactMethod,
    SupportContactValue,
    SupportTimeframe,
    HighRiskFlag,
    RiskFactors,
    Meta,
    Source,
    SubmittedAt,
}
