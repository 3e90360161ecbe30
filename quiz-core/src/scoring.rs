use chrono::{DateTime, Utc};
use quiz_types::{FirstCorrect, Ordinal, QuestionRecord, QuestionTally, RankedPlayer, ResponseRecord};
use std::collections::BTreeMap;

use crate::Catalog;

pub struct ScoringEngine;

impl ScoringEngine {
    /// Per-nickname correct counts for one question. Every nickname that
    /// responded appears, with 0 when none of its answers were correct.
    pub fn question_tally(
        question_id: Ordinal,
        question: &QuestionRecord,
        responses: &[ResponseRecord],
    ) -> QuestionTally {
        let mut counts = BTreeMap::new();

        for response in responses.iter().filter(|r| r.question_id == question_id) {
            let count = counts.entry(response.nickname.clone()).or_insert(0);
            if question.is_correct(&response.answer) {
                *count += 1;
            }
        }

        QuestionTally {
            question_id,
            counts,
        }
    }

    /// Earliest correct response for a question. Equal timestamps resolve to
    /// the record stored first.
    pub fn first_correct_responder(
        question_id: Ordinal,
        question: &QuestionRecord,
        responses: &[ResponseRecord],
    ) -> Option<FirstCorrect> {
        responses
            .iter()
            .filter(|r| r.question_id == question_id && question.is_correct(&r.answer))
            .fold(None::<&ResponseRecord>, |best, r| match best {
                Some(b) if b.timestamp <= r.timestamp => Some(b),
                _ => Some(r),
            })
            .map(|r| FirstCorrect {
                nickname: r.nickname.clone(),
                timestamp: r.timestamp,
            })
    }

    /// End-of-quiz ranking over the whole response log: correct count
    /// descending, then average time of the correct answers ascending, then
    /// nickname. Players with no correct answers are not ranked.
    pub fn final_results(catalog: &Catalog, responses: &[ResponseRecord]) -> Vec<RankedPlayer> {
        let mut correct_times: BTreeMap<&str, Vec<DateTime<Utc>>> = BTreeMap::new();

        for response in responses {
            let Some(question) = catalog.get(response.question_id) else {
                continue;
            };
            if question.is_correct(&response.answer) {
                correct_times
                    .entry(response.nickname.as_str())
                    .or_default()
                    .push(response.timestamp);
            }
        }

        let mut standings: Vec<(String, u32, DateTime<Utc>)> = correct_times
            .into_iter()
            .filter_map(|(nickname, times)| {
                Some((
                    nickname.to_string(),
                    times.len() as u32,
                    average_time(&times)?,
                ))
            })
            .collect();

        standings.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)).then(a.0.cmp(&b.0)));

        standings
            .into_iter()
            .enumerate()
            .map(|(index, (nickname, correct_count, average_correct_time))| RankedPlayer {
                rank: (index + 1) as u32,
                nickname,
                correct_count,
                average_correct_time,
            })
            .collect()
    }
}

/// Mean of `times` at millisecond precision. `None` for an empty slice or
/// when the sum does not fit.
fn average_time(times: &[DateTime<Utc>]) -> Option<DateTime<Utc>> {
    let total = times
        .iter()
        .try_fold(0i64, |sum, t| sum.checked_add(t.timestamp_millis()))?;
    let mean = total.checked_div(i64::try_from(times.len()).ok()?)?;
    DateTime::from_timestamp_millis(mean)
}
