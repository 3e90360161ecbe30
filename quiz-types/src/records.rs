use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::Ordinal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseRecord {
    pub question_id: Ordinal,
    pub nickname: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>, // assigned by the store
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParticipantRecord {
    pub nickname: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of writing a response to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SubmitOutcome {
    Recorded(ResponseRecord),
    /// A response for this (nickname, question) was already stored; nothing
    /// was written.
    AlreadySubmitted,
}

/// Per-nickname correct counts for a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionTally {
    pub question_id: Ordinal,
    pub counts: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FirstCorrect {
    pub nickname: String,
    pub timestamp: DateTime<Utc>,
}

/// One row of the end-of-quiz ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankedPlayer {
    pub rank: u32,
    pub nickname: String,
    pub correct_count: u32,
    pub average_correct_time: DateTime<Utc>,
}
