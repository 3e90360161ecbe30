use quiz_types::{Ordinal, QuestionKind, QuestionRecord};
use std::str::FromStr;
use tracing::{info, warn};

use crate::{QuizStore, SyncError};

/// How question keys are turned into quiz order.
///
/// Keys are stringified ordinals. `Lexical` keeps the store's string order,
/// which puts "10" before "2"; `Numeric` parses the keys and requires them to
/// be exactly `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogOrder {
    #[default]
    Numeric,
    Lexical,
}

impl FromStr for CatalogOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "numeric" => Ok(CatalogOrder::Numeric),
            "lexical" => Ok(CatalogOrder::Lexical),
            other => Err(format!("unknown question order '{}'", other)),
        }
    }
}

/// The loaded, validated question sequence.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<(String, QuestionRecord)>,
}

impl Catalog {
    pub fn from_documents(
        mut documents: Vec<(String, QuestionRecord)>,
        order: CatalogOrder,
    ) -> Result<Self, SyncError> {
        if documents.is_empty() {
            return Err(SyncError::EmptyCatalog);
        }

        for (key, record) in &documents {
            validate_record(key, record)?;
        }

        match order {
            CatalogOrder::Lexical => documents.sort_by(|(a, _), (b, _)| a.cmp(b)),
            CatalogOrder::Numeric => {
                let mut keyed = Vec::with_capacity(documents.len());
                for (key, record) in documents {
                    let ordinal: Ordinal =
                        key.parse().map_err(|_| SyncError::MalformedRecord {
                            key: key.clone(),
                            reason: "key is not a question ordinal".to_string(),
                        })?;
                    keyed.push((ordinal, key, record));
                }
                keyed.sort_by_key(|(ordinal, _, _)| *ordinal);

                for (position, (ordinal, key, _)) in keyed.iter().enumerate() {
                    if *ordinal as usize != position {
                        return Err(SyncError::MalformedRecord {
                            key: key.clone(),
                            reason: format!("expected ordinal {}", position),
                        });
                    }
                }

                documents = keyed
                    .into_iter()
                    .map(|(_, key, record)| (key, record))
                    .collect();
            }
        }

        Ok(Self { entries: documents })
    }

    /// Loads and validates every question in the store.
    pub async fn load(store: &dyn QuizStore, order: CatalogOrder) -> Result<Self, SyncError> {
        let documents = store.load_questions().await.map_err(|e| match e {
            SyncError::Store(message) => SyncError::CatalogUnavailable(message),
            other => other,
        })?;

        let catalog = Self::from_documents(documents, order)?;
        info!(
            "Loaded {} questions in {:?} order",
            catalog.len(),
            order
        );
        Ok(catalog)
    }

    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: Ordinal) -> Option<&QuestionRecord> {
        self.entries.get(index as usize).map(|(_, record)| record)
    }

    pub fn key(&self, index: Ordinal) -> Option<&str> {
        self.entries.get(index as usize).map(|(key, _)| key.as_str())
    }

    /// Reads the current document for `index` from the store, looked up by
    /// the key this catalog assigned to that position.
    pub async fn fetch(
        &self,
        store: &dyn QuizStore,
        index: Ordinal,
    ) -> Result<QuestionRecord, SyncError> {
        let key = self.key(index).ok_or(SyncError::QuestionNotFound { index })?;
        store
            .get_question(key)
            .await?
            .ok_or(SyncError::QuestionNotFound { index })
    }
}

/// Rejects records that would fail later when rendered or scored.
pub fn validate_record(key: &str, record: &QuestionRecord) -> Result<(), SyncError> {
    let malformed = |reason: &str| SyncError::MalformedRecord {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if record.text.trim().is_empty() {
        return Err(malformed("missing question text"));
    }

    if record.kind == QuestionKind::MultipleChoice {
        if record.options.is_empty() {
            return Err(malformed("multiple-choice question has no options"));
        }
        match &record.ans {
            None => return Err(malformed("multiple-choice question has no answer")),
            Some(ans) if !record.options.contains(ans) => {
                warn!("Question {} answer '{}' is not one of its options", key, ans);
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Assigns the keys `"0"`, `"1"`, ... to a question list for seeding.
pub fn keyed_documents(questions: Vec<QuestionRecord>) -> Vec<(String, QuestionRecord)> {
    questions
        .into_iter()
        .enumerate()
        .map(|(ordinal, record)| (ordinal.to_string(), record))
        .collect()
}
