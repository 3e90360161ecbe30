use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::DocKey)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::Text).string().not_null())
                    .col(ColumnDef::new(Questions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Questions::Options)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Questions::Ans).string().null())
                    .col(ColumnDef::new(Questions::Image).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GameState::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GameState::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(GameState::CurrentIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GameState::Started)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GameState::Phase)
                            .string()
                            .not_null()
                            .default("not_started"),
                    )
                    .col(
                        ColumnDef::new(GameState::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GameState::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Responses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Responses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Responses::QuestionId).integer().not_null())
                    .col(ColumnDef::new(Responses::Nickname).string().not_null())
                    .col(ColumnDef::new(Responses::Answer).string().not_null())
                    .col(
                        ColumnDef::new(Responses::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One counted answer per player per question
        manager
            .create_index(
                Index::create()
                    .name("idx_responses_question_nickname")
                    .table(Responses::Table)
                    .col(Responses::QuestionId)
                    .col(Responses::Nickname)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Participants::Nickname).string().not_null())
                    .col(
                        ColumnDef::new(Participants::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Participants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Responses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GameState::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    DocKey,
    Text,
    Kind,
    Options,
    Ans,
    Image,
}

#[derive(DeriveIden)]
enum GameState {
    Table,
    Id,
    CurrentIndex,
    Started,
    Phase,
    Version,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Responses {
    Table,
    Id,
    QuestionId,
    Nickname,
    Answer,
    Timestamp,
}

#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    Nickname,
    Timestamp,
}
