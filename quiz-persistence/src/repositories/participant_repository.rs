use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::entities::{participants, prelude::*};
use quiz_types::ParticipantRecord;

pub struct ParticipantRepository {
    db: DatabaseConnection,
}

impl ParticipantRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_record(model: participants::Model) -> ParticipantRecord {
        ParticipantRecord {
            nickname: model.nickname,
            timestamp: model.timestamp,
        }
    }

    pub async fn append(&self, nickname: &str) -> Result<ParticipantRecord> {
        let model = participants::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            nickname: sea_orm::ActiveValue::Set(nickname.to_string()),
            timestamp: sea_orm::ActiveValue::Set(chrono::Utc::now()),
        };

        let saved = Participants::insert(model).exec(&self.db).await?;

        let created = Participants::find_by_id(saved.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created participant"))?;

        Ok(Self::model_to_record(created))
    }

    pub async fn find_all(&self) -> Result<Vec<ParticipantRecord>> {
        let models = Participants::find()
            .order_by_asc(participants::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Self::model_to_record).collect())
    }
}
