use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Zero-based position of a question in the quiz.
pub type Ordinal = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum QuestionKind {
    #[serde(rename = "mc")]
    MultipleChoice,
    #[serde(rename = "free")]
    FreeText,
}

/// A stored question document. Field names follow the stored document layout
/// (`type`, `ans`) so existing question sets load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionRecord {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub ans: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl QuestionRecord {
    pub fn multiple_choice(text: &str, options: &[&str], ans: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: QuestionKind::MultipleChoice,
            options: options.iter().map(|o| o.to_string()).collect(),
            ans: Some(ans.to_string()),
            image: None,
        }
    }

    pub fn free_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: QuestionKind::FreeText,
            options: Vec::new(),
            ans: None,
            image: None,
        }
    }

    pub fn is_multiple_choice(&self) -> bool {
        self.kind == QuestionKind::MultipleChoice
    }

    /// Only multiple-choice answers can be correct; free-text answers are
    /// never scored.
    pub fn is_correct(&self, answer: &str) -> bool {
        match (&self.kind, &self.ans) {
            (QuestionKind::MultipleChoice, Some(ans)) => ans == answer,
            _ => false,
        }
    }
}

/// Player-facing view of a question. The correct answer is only filled in
/// once the host has revealed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionView {
    pub index: Ordinal,
    pub total: u32,
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub image: Option<String>,
    pub revealed_answer: Option<String>,
}

impl QuestionView {
    pub fn new(index: Ordinal, total: u32, record: &QuestionRecord, revealed: bool) -> Self {
        QuestionView {
            index,
            total,
            text: record.text.clone(),
            kind: record.kind,
            options: record.options.clone(),
            image: record.image.clone(),
            revealed_answer: if revealed { record.ans.clone() } else { None },
        }
    }
}
