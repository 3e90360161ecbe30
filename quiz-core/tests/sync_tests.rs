mod common;

use common::*;
use quiz_core::{CatalogOrder, HostAction, ObserveMode, PlayerView, QuizStore, SyncError};
use quiz_types::{GamePhase, QuestionRecord, SubmitOutcome};
use std::time::Duration;

#[tokio::test]
async fn test_three_advances_wrap_to_first_question() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;

    host.start().await.unwrap();
    assert_eq!(host.state().await.unwrap().current_index, 0);

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(host.advance().await.unwrap().current_index);
    }
    assert_eq!(seen, vec![1, 2, 0]);
}

#[tokio::test]
async fn test_stale_host_view_conflicts() {
    let store = create_store(sample_questions()).await;
    let host_tab_one = create_host(&store).await;
    let host_tab_two = create_host(&store).await;

    let started = host_tab_one.start().await.unwrap();
    let advanced = host_tab_one
        .apply(HostAction::Advance, Some(started.version))
        .await
        .unwrap();
    assert_eq!(advanced.current_index, 1);

    // Second tab still holds the version it saw before the advance
    let result = host_tab_two
        .apply(HostAction::Advance, Some(started.version))
        .await;
    assert!(matches!(result, Err(SyncError::StateConflict { .. })));
    assert_eq!(host_tab_two.state().await.unwrap().current_index, 1);
}

#[tokio::test]
async fn test_reveal_is_shared_between_hosts() {
    let store = create_store(sample_questions()).await;
    let host_tab_one = create_host(&store).await;
    let host_tab_two = create_host(&store).await;

    host_tab_one.start().await.unwrap();
    host_tab_one.reveal_answer().await.unwrap();

    let seen_by_two = host_tab_two.active_question().await.unwrap();
    assert_eq!(seen_by_two.state.phase, GamePhase::Revealed);
    assert_eq!(seen_by_two.record.ans.as_deref(), Some("A"));
}

#[tokio::test]
async fn test_scenario_leaderboard_for_question_one() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    host.start().await.unwrap();
    host.advance().await.unwrap();

    let mut alice = create_player(&store, "A").await;
    let mut bob = create_player(&store, "B").await;
    for player in [&mut alice, &mut bob] {
        player.observe_active_question().await.unwrap();
        let outcome = player.submit("B").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Recorded(_)));
    }

    let tally = host.compute_leaderboard(1).await.unwrap();
    assert_eq!(tally.counts.len(), 2);
    assert_eq!(tally.counts["A"], 1);
    assert_eq!(tally.counts["B"], 1);

    let first = host.first_correct_responder(1).await.unwrap().unwrap();
    assert!(first.nickname == "A" || first.nickname == "B");
}

#[tokio::test]
async fn test_submit_writes_once_per_session() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    host.start().await.unwrap();

    let mut player = create_player(&store, "alice").await;
    player.observe_active_question().await.unwrap();

    assert!(matches!(
        player.submit("A").await.unwrap(),
        SubmitOutcome::Recorded(_)
    ));
    assert_eq!(
        player.submit("B").await.unwrap(),
        SubmitOutcome::AlreadySubmitted
    );
    assert_eq!(store.responses(Some(0)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reloaded_client_is_not_counted_twice() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    host.start().await.unwrap();

    let mut before_reload = create_player(&store, "alice").await;
    before_reload.observe_active_question().await.unwrap();
    before_reload.submit("B").await.unwrap();

    // A fresh session has no local flag; the store still refuses the write
    let mut after_reload = create_player(&store, "alice").await;
    after_reload.observe_active_question().await.unwrap();
    assert_eq!(
        after_reload.submit("A").await.unwrap(),
        SubmitOutcome::AlreadySubmitted
    );
    assert!(after_reload.has_submitted());

    let responses = store.responses(Some(0)).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].answer, "B");
}

#[tokio::test]
async fn test_new_question_clears_submitted_flag() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    host.start().await.unwrap();

    let mut player = create_player(&store, "alice").await;
    player.observe_active_question().await.unwrap();
    player.submit("A").await.unwrap();
    assert!(player.has_submitted());

    // Revealing keeps the same question, so the flag stays
    host.reveal_answer().await.unwrap();
    player.observe_active_question().await.unwrap();
    assert!(player.has_submitted());

    host.advance().await.unwrap();
    let view = player.observe_active_question().await.unwrap();
    assert!(!player.has_submitted());
    match view {
        Some(PlayerView::Question(question)) => {
            assert_eq!(question.index, 1);
            assert_eq!(question.total, 3);
            assert!(question.revealed_answer.is_none());
        }
        other => panic!("Expected question view, got {:?}", other),
    }

    assert!(matches!(
        player.submit("B").await.unwrap(),
        SubmitOutcome::Recorded(_)
    ));
}

#[tokio::test]
async fn test_answers_closed_after_reveal() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    host.start().await.unwrap();
    host.reveal_answer().await.unwrap();

    let mut player = create_player(&store, "alice").await;
    match player.observe_active_question().await.unwrap() {
        Some(PlayerView::Question(question)) => {
            assert_eq!(question.revealed_answer.as_deref(), Some("A"));
        }
        other => panic!("Expected question view, got {:?}", other),
    }

    let result = player.submit("A").await;
    assert!(matches!(
        result,
        Err(SyncError::NotAcceptingAnswers {
            phase: GamePhase::Revealed
        })
    ));
    assert!(store.responses(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_player_waits_before_start_and_sees_results() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    let mut player = create_player(&store, "alice").await;

    assert_eq!(
        player.observe_active_question().await.unwrap(),
        Some(PlayerView::Waiting)
    );
    // Unchanged state yields nothing new
    assert_eq!(player.observe_active_question().await.unwrap(), None);

    host.start().await.unwrap();
    host.show_results().await.unwrap();
    assert_eq!(
        player.observe_active_question().await.unwrap(),
        Some(PlayerView::Results)
    );
}

#[tokio::test]
async fn test_join_requires_nickname() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    let mut player = quiz_core::PlayerClient::new(store.clone(), host.catalog().clone());

    assert!(matches!(
        player.join("   ").await,
        Err(SyncError::InvalidNickname)
    ));
    assert!(matches!(
        player.submit("A").await,
        Err(SyncError::InvalidNickname)
    ));
    assert!(store.participants().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_question_document_is_reported() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    host.start().await.unwrap();
    host.advance().await.unwrap();

    // Host catalog was loaded before the document disappeared from the store
    let emptied = create_store(vec![QuestionRecord::free_text("only")]).await;
    emptied
        .compare_and_swap_state(0, store.get_state().await.unwrap())
        .await
        .unwrap();

    let mut player = join_player(&emptied, host.catalog().clone(), "alice").await;
    let result = player.observe_active_question().await;
    assert!(matches!(
        result,
        Err(SyncError::QuestionNotFound { index: 1 })
    ));
}

#[tokio::test]
async fn test_push_observer_wakes_on_advance() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    host.start().await.unwrap();

    let mut player = create_player(&store, "alice").await;
    player.observe_active_question().await.unwrap();

    let waiter = tokio::spawn(async move {
        let view = player.wait_for_change(ObserveMode::Push).await.unwrap();
        (view, player)
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    host.advance().await.unwrap();

    let (view, player) = tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .unwrap()
        .unwrap();
    match view {
        PlayerView::Question(question) => assert_eq!(question.index, 1),
        other => panic!("Expected question view, got {:?}", other),
    }
    assert_eq!(player.observed_state().unwrap().current_index, 1);
}

#[tokio::test]
async fn test_poll_observer_picks_up_change() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;

    let mut player = create_player(&store, "alice").await;
    player.observe_active_question().await.unwrap();

    host.start().await.unwrap();
    let view = tokio::time::timeout(
        Duration::from_secs(2),
        player.wait_for_change(ObserveMode::Poll(Duration::from_millis(10))),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(matches!(view, PlayerView::Question(q) if q.index == 0));
}

#[tokio::test]
async fn test_final_results_over_whole_log() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    host.start().await.unwrap();

    let mut alice = create_player(&store, "alice").await;
    let mut bob = create_player(&store, "bob").await;

    // Q0: both correct
    for player in [&mut alice, &mut bob] {
        player.observe_active_question().await.unwrap();
        player.submit("A").await.unwrap();
    }

    // Q1: only alice correct
    host.advance().await.unwrap();
    alice.observe_active_question().await.unwrap();
    alice.submit("B").await.unwrap();
    bob.observe_active_question().await.unwrap();
    bob.submit("C").await.unwrap();

    host.show_results().await.unwrap();
    let results = host.final_results().await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].nickname, "alice");
    assert_eq!(results[0].correct_count, 2);
    assert_eq!(results[1].nickname, "bob");
    assert_eq!(results[1].rank, 2);
}

#[tokio::test]
async fn test_lexical_order_host_and_player_agree() {
    let store = create_store(numbered_questions(12)).await;
    let host = create_host_with_order(&store, CatalogOrder::Lexical).await;
    host.start().await.unwrap();
    host.advance().await.unwrap();
    host.advance().await.unwrap();

    // Lexical key order is 0, 1, 10, 11, 2, ... so position 2 holds "Q10"
    let active = host.active_question().await.unwrap();
    assert_eq!(active.index, 2);
    assert_eq!(active.record.text, "Q10");

    let mut player = join_player(&store, host.catalog().clone(), "alice").await;
    match player.observe_active_question().await.unwrap() {
        Some(PlayerView::Question(question)) => {
            assert_eq!(question.index, 2);
            assert_eq!(question.text, active.record.text);
            assert_eq!(question.total, 12);
        }
        other => panic!("Expected question view, got {:?}", other),
    }

    player.submit("A10").await.unwrap();
    let tally = host.compute_leaderboard(2).await.unwrap();
    assert_eq!(tally.counts["alice"], 1);
}

#[tokio::test]
async fn test_reset_starts_a_fresh_game() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    host.start().await.unwrap();

    let mut first_game = create_player(&store, "alice").await;
    first_game.observe_active_question().await.unwrap();
    first_game.submit("B").await.unwrap();

    host.reset().await.unwrap();
    assert!(store.responses(None).await.unwrap().is_empty());
    host.start().await.unwrap();

    let mut replay = create_player(&store, "alice").await;
    replay.observe_active_question().await.unwrap();
    assert!(matches!(
        replay.submit("A").await.unwrap(),
        SubmitOutcome::Recorded(_)
    ));

    let tally = host.compute_leaderboard(0).await.unwrap();
    assert_eq!(tally.counts["alice"], 1);

    host.show_results().await.unwrap();
    let results = host.final_results().await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].correct_count, 1);
}

#[tokio::test]
async fn test_stale_reset_keeps_responses() {
    let store = create_store(sample_questions()).await;
    let host = create_host(&store).await;
    let started = host.start().await.unwrap();

    let mut player = create_player(&store, "alice").await;
    player.observe_active_question().await.unwrap();
    player.submit("A").await.unwrap();
    host.advance().await.unwrap();

    let result = host.apply(HostAction::Reset, Some(started.version)).await;
    assert!(matches!(result, Err(SyncError::StateConflict { .. })));
    assert_eq!(store.responses(None).await.unwrap().len(), 1);
}
