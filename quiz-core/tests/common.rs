use quiz_core::{Catalog, CatalogOrder, HostController, MemoryStore, PlayerClient, SharedStore};
use quiz_types::QuestionRecord;
use std::sync::Arc;

/// Three-question quiz: Q0 and Q1 are multiple choice, Q2 is free text.
pub fn sample_questions() -> Vec<QuestionRecord> {
    vec![
        QuestionRecord::multiple_choice("Q0", &["A", "B", "C"], "A"),
        QuestionRecord::multiple_choice("Q1", &["A", "B", "C"], "B"),
        QuestionRecord::free_text("Q2"),
    ]
}

/// `count` multiple-choice questions "Q0".."Q{count-1}"; the answer to
/// question i is "A{i}".
pub fn numbered_questions(count: usize) -> Vec<QuestionRecord> {
    (0..count)
        .map(|i| {
            let ans = format!("A{}", i);
            QuestionRecord::multiple_choice(&format!("Q{}", i), &[ans.as_str(), "none"], &ans)
        })
        .collect()
}

pub async fn create_store(questions: Vec<QuestionRecord>) -> SharedStore {
    Arc::new(MemoryStore::with_questions(questions).await)
}

pub async fn create_host(store: &SharedStore) -> HostController {
    create_host_with_order(store, CatalogOrder::Numeric).await
}

pub async fn create_host_with_order(store: &SharedStore, order: CatalogOrder) -> HostController {
    let catalog = Catalog::load(store.as_ref(), order).await.unwrap();
    HostController::new(store.clone(), catalog)
}

/// A player that has already joined under `nickname`.
pub async fn create_player(store: &SharedStore, nickname: &str) -> PlayerClient {
    let catalog = Catalog::load(store.as_ref(), CatalogOrder::Numeric)
        .await
        .unwrap();
    join_player(store, catalog, nickname).await
}

pub async fn join_player(store: &SharedStore, catalog: Catalog, nickname: &str) -> PlayerClient {
    let mut player = PlayerClient::new(store.clone(), catalog);
    player.join(nickname).await.unwrap();
    player
}
