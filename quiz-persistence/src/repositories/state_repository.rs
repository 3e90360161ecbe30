use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, SqlErr};

use crate::entities::{game_state, prelude::*};
use quiz_core::SyncError;
use quiz_types::{GamePhase, GameState};

pub struct GameStateRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwapResult {
    Swapped(GameState),
    Conflict,
}

impl GameStateRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_state(model: game_state::Model) -> Result<GameState> {
        let phase = GamePhase::parse(&model.phase).ok_or_else(|| SyncError::MalformedRecord {
            key: format!("game_state/{}", model.id),
            reason: format!("unknown phase '{}'", model.phase),
        })?;

        Ok(GameState {
            current_index: u32::try_from(model.current_index)?,
            started: model.started,
            phase,
            version: u64::try_from(model.version)?,
        })
    }

    /// The stored state, or `None` before the first write.
    pub async fn find_current(&self) -> Result<Option<GameState>> {
        let model = GameStates::find_by_id(game_state::CURRENT.to_string())
            .one(&self.db)
            .await?;
        model.map(Self::model_to_state).transpose()
    }

    /// Writes `next` with version `expected_version + 1`, but only if the
    /// stored version is still `expected_version`.
    pub async fn compare_and_swap(
        &self,
        expected_version: u64,
        next: &GameState,
    ) -> Result<SwapResult> {
        let new_version = expected_version + 1;
        let result = GameStates::update_many()
            .col_expr(
                game_state::Column::CurrentIndex,
                Expr::value(i32::try_from(next.current_index)?),
            )
            .col_expr(game_state::Column::Started, Expr::value(next.started))
            .col_expr(game_state::Column::Phase, Expr::value(next.phase.as_str()))
            .col_expr(
                game_state::Column::Version,
                Expr::value(i64::try_from(new_version)?),
            )
            .col_expr(game_state::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(game_state::Column::Id.eq(game_state::CURRENT))
            .filter(game_state::Column::Version.eq(i64::try_from(expected_version)?))
            .exec(&self.db)
            .await?;

        let stored = GameState {
            version: new_version,
            ..next.clone()
        };

        if result.rows_affected == 1 {
            return Ok(SwapResult::Swapped(stored));
        }

        // No document yet: the first write creates it at version 1
        if expected_version == 0 && self.find_current().await?.is_none() {
            let model = game_state::ActiveModel {
                id: sea_orm::ActiveValue::Set(game_state::CURRENT.to_string()),
                current_index: sea_orm::ActiveValue::Set(i32::try_from(next.current_index)?),
                started: sea_orm::ActiveValue::Set(next.started),
                phase: sea_orm::ActiveValue::Set(next.phase.as_str().to_string()),
                version: sea_orm::ActiveValue::Set(1),
                updated_at: sea_orm::ActiveValue::Set(chrono::Utc::now()),
            };

            // A concurrent first write wins the primary key
            return match GameStates::insert(model).exec(&self.db).await {
                Ok(_) => Ok(SwapResult::Swapped(stored)),
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    tracing::warn!("Initial game state insert lost a race: {}", err);
                    Ok(SwapResult::Conflict)
                }
                Err(err) => Err(err.into()),
            };
        }

        Ok(SwapResult::Conflict)
    }
}
