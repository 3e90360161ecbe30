use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, TransactionTrait};

use crate::entities::{prelude::*, questions};
use quiz_core::SyncError;
use quiz_types::{QuestionKind, QuestionRecord};

pub struct QuestionRepository {
    db: DatabaseConnection,
}

fn kind_to_str(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::MultipleChoice => "mc",
        QuestionKind::FreeText => "free",
    }
}

impl QuestionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_record(model: questions::Model) -> Result<(String, QuestionRecord)> {
        let malformed = |reason: String| SyncError::MalformedRecord {
            key: model.doc_key.clone(),
            reason,
        };

        let kind = match model.kind.as_str() {
            "mc" => QuestionKind::MultipleChoice,
            "free" => QuestionKind::FreeText,
            other => return Err(malformed(format!("unknown question type '{}'", other)).into()),
        };
        let options: Vec<String> = serde_json::from_str(&model.options)
            .map_err(|e| malformed(format!("options are not a string list: {}", e)))?;

        Ok((
            model.doc_key,
            QuestionRecord {
                text: model.text,
                kind,
                options,
                ans: model.ans,
                image: model.image,
            },
        ))
    }

    /// All questions ordered by key string, the same order a document
    /// store lists them in.
    pub async fn find_all(&self) -> Result<Vec<(String, QuestionRecord)>> {
        Questions::find()
            .order_by_asc(questions::Column::DocKey)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_record)
            .collect()
    }

    pub async fn find_by_key(&self, key: &str) -> Result<Option<QuestionRecord>> {
        let model = Questions::find_by_id(key.to_string()).one(&self.db).await?;
        model
            .map(|m| Self::model_to_record(m).map(|(_, record)| record))
            .transpose()
    }

    fn record_to_model(key: String, record: QuestionRecord) -> Result<questions::ActiveModel> {
        Ok(questions::ActiveModel {
            doc_key: sea_orm::ActiveValue::Set(key),
            text: sea_orm::ActiveValue::Set(record.text),
            kind: sea_orm::ActiveValue::Set(kind_to_str(record.kind).to_string()),
            options: sea_orm::ActiveValue::Set(serde_json::to_string(&record.options)?),
            ans: sea_orm::ActiveValue::Set(record.ans),
            image: sea_orm::ActiveValue::Set(record.image),
        })
    }

    /// Swaps the whole collection for `documents` in one transaction.
    pub async fn replace_all(&self, documents: Vec<(String, QuestionRecord)>) -> Result<()> {
        let models = documents
            .into_iter()
            .map(|(key, record)| Self::record_to_model(key, record))
            .collect::<Result<Vec<_>>>()?;

        let txn = self.db.begin().await?;
        Questions::delete_many().exec(&txn).await?;
        if !models.is_empty() {
            Questions::insert_many(models)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Questions::find().count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::ActiveModelTrait;

    async fn setup_test_db() -> QuestionRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        QuestionRepository::new(db)
    }

    fn numbered(count: usize) -> Vec<(String, QuestionRecord)> {
        (0..count)
            .map(|i| (i.to_string(), QuestionRecord::free_text(&format!("Q{}", i))))
            .collect()
    }

    #[tokio::test]
    async fn test_replace_and_find() {
        let repo = setup_test_db().await;

        let record = QuestionRecord::multiple_choice("Capital of France?", &["Paris", "Rome"], "Paris");
        repo.replace_all(vec![("0".to_string(), record.clone())])
            .await
            .unwrap();

        let found = repo.find_by_key("0").await.unwrap().unwrap();
        assert_eq!(found, record);
        assert!(repo.find_by_key("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_with_fewer_questions_drops_the_rest() {
        let repo = setup_test_db().await;

        repo.replace_all(numbered(5)).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 5);

        let shorter = vec![("0".to_string(), QuestionRecord::free_text("Only"))];
        repo.replace_all(shorter).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.find_by_key("0").await.unwrap().unwrap().text, "Only");
        assert!(repo.find_by_key("4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_all_uses_key_string_order() {
        let repo = setup_test_db().await;

        let documents = [0, 1, 2, 10]
            .into_iter()
            .map(|i| (i.to_string(), QuestionRecord::free_text(&format!("Q{}", i))))
            .collect();
        repo.replace_all(documents).await.unwrap();

        let keys: Vec<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec!["0", "1", "10", "2"]);
    }

    #[tokio::test]
    async fn test_unknown_type_is_malformed() {
        let repo = setup_test_db().await;

        let broken = questions::ActiveModel {
            doc_key: sea_orm::ActiveValue::Set("0".to_string()),
            text: sea_orm::ActiveValue::Set("Broken".to_string()),
            kind: sea_orm::ActiveValue::Set("essay".to_string()),
            options: sea_orm::ActiveValue::Set("[]".to_string()),
            ans: sea_orm::ActiveValue::Set(None),
            image: sea_orm::ActiveValue::Set(None),
        };
        broken.insert(&repo.db).await.unwrap();

        let err = repo.find_all().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::MalformedRecord { .. })
        ));
    }
}
