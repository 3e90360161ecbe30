use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{prelude::*, responses};
use quiz_types::{Ordinal, ResponseRecord};

pub struct ResponseRepository {
    db: DatabaseConnection,
}

impl ResponseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_record(model: responses::Model) -> Result<ResponseRecord> {
        Ok(ResponseRecord {
            question_id: u32::try_from(model.question_id)?,
            nickname: model.nickname,
            answer: model.answer,
            timestamp: model.timestamp,
        })
    }

    /// Inserts a response unless `(question_id, nickname)` already has one.
    /// Returns the stored record, or `None` when the insert was skipped.
    pub async fn insert_unique(
        &self,
        question_id: Ordinal,
        nickname: &str,
        answer: &str,
    ) -> Result<Option<ResponseRecord>> {
        let question_id = i32::try_from(question_id)?;
        let model = responses::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            question_id: sea_orm::ActiveValue::Set(question_id),
            nickname: sea_orm::ActiveValue::Set(nickname.to_string()),
            answer: sea_orm::ActiveValue::Set(answer.to_string()),
            timestamp: sea_orm::ActiveValue::Set(chrono::Utc::now()),
        };

        let inserted = Responses::insert(model)
            .on_conflict(
                OnConflict::columns([responses::Column::QuestionId, responses::Column::Nickname])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted == 0 {
            return Ok(None);
        }

        let stored = Responses::find()
            .filter(responses::Column::QuestionId.eq(question_id))
            .filter(responses::Column::Nickname.eq(nickname))
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve stored response"))?;

        Ok(Some(Self::model_to_record(stored)?))
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = Responses::delete_many().exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    /// Responses in insertion order, optionally for a single question.
    pub async fn find(&self, question_id: Option<Ordinal>) -> Result<Vec<ResponseRecord>> {
        let mut query = Responses::find().order_by_asc(responses::Column::Id);
        if let Some(question_id) = question_id {
            query = query.filter(responses::Column::QuestionId.eq(i32::try_from(question_id)?));
        }

        query
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_record)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> ResponseRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        ResponseRepository::new(db)
    }

    #[tokio::test]
    async fn test_insert_and_filter_by_question() {
        let repo = setup_test_db().await;

        repo.insert_unique(1, "A", "B").await.unwrap().unwrap();
        repo.insert_unique(1, "B", "B").await.unwrap().unwrap();
        repo.insert_unique(2, "A", "C").await.unwrap().unwrap();

        let question_one = repo.find(Some(1)).await.unwrap();
        assert_eq!(question_one.len(), 2);
        assert_eq!(question_one[0].nickname, "A");
        assert_eq!(question_one[1].nickname, "B");

        assert_eq!(repo.find(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_response_is_skipped() {
        let repo = setup_test_db().await;

        let first = repo.insert_unique(0, "alice", "A").await.unwrap();
        assert_eq!(first.unwrap().answer, "A");

        let second = repo.insert_unique(0, "alice", "B").await.unwrap();
        assert!(second.is_none());

        let stored = repo.find(Some(0)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].answer, "A");
    }

    #[tokio::test]
    async fn test_delete_all_frees_the_unique_slot() {
        let repo = setup_test_db().await;

        repo.insert_unique(0, "alice", "B").await.unwrap();
        repo.insert_unique(1, "alice", "B").await.unwrap();
        assert_eq!(repo.delete_all().await.unwrap(), 2);

        let replay = repo.insert_unique(0, "alice", "A").await.unwrap();
        assert_eq!(replay.unwrap().answer, "A");
        assert_eq!(repo.find(None).await.unwrap().len(), 1);
    }
}
