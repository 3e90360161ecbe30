use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::auth::{AuthError, PassphraseGate};
use crate::quiz_service::QuizService;
use crate::websocket::ConnectionManager;
use quiz_core::{HostAction, SyncError};
use quiz_types::{GameState, Ordinal, QuestionRecord, QuestionView, SubmitOutcome};

pub mod auth;
pub mod config;
pub mod quiz_service;
pub mod websocket;

pub const HOST_PASSWORD_HEADER: &str = "x-host-password";

#[derive(Deserialize)]
struct HostActionQuery {
    version: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRequest {
    pub nickname: String,
    pub join_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub nickname: String,
    pub join_code: Option<String>,
    pub question_id: Ordinal,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub outcome: SubmitOutcome,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentQuestionResponse {
    pub state: GameState,
    pub question: Option<QuestionView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HostQuestionResponse {
    pub index: Ordinal,
    pub total: u32,
    pub question: QuestionRecord,
    pub state: GameState,
}

type JsonReply = WithStatus<Json>;

fn json_error(message: &str, status: StatusCode) -> JsonReply {
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({ "error": message })),
        status,
    )
}

fn json_ok<T: Serialize>(body: &T) -> JsonReply {
    warp::reply::with_status(warp::reply::json(body), StatusCode::OK)
}

fn sync_error_reply(err: SyncError) -> JsonReply {
    let status = match &err {
        SyncError::QuestionNotFound { .. } => StatusCode::NOT_FOUND,
        SyncError::StateConflict { .. }
        | SyncError::InvalidTransition { .. }
        | SyncError::NotAcceptingAnswers { .. }
        | SyncError::WrongQuestion { .. } => StatusCode::CONFLICT,
        SyncError::InvalidNickname => StatusCode::BAD_REQUEST,
        SyncError::EmptyCatalog
        | SyncError::CatalogUnavailable(_)
        | SyncError::MalformedRecord { .. }
        | SyncError::Store(_) => {
            tracing::error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    json_error(&err.to_string(), status)
}

fn auth_error_reply(err: AuthError) -> JsonReply {
    let status = match err {
        AuthError::MissingHostPassword => StatusCode::UNAUTHORIZED,
        AuthError::InvalidHostPassword | AuthError::InvalidJoinCode => StatusCode::FORBIDDEN,
    };
    json_error(&err.to_string(), status)
}

fn parse_host_action(action: &str) -> Option<HostAction> {
    match action {
        "start" => Some(HostAction::Start),
        "advance" => Some(HostAction::Advance),
        "reveal" => Some(HostAction::ToggleReveal),
        "results" => Some(HostAction::ShowResults),
        "reset" => Some(HostAction::Reset),
        _ => None,
    }
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let quiz_filter = warp::any().map({
        let quiz_service = quiz_service.clone();
        move || quiz_service.clone()
    });

    let gate_filter = warp::any().map({
        let gate = gate.clone();
        move || gate.clone()
    });

    let host_password = warp::header::optional::<String>(HOST_PASSWORD_HEADER);

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(quiz_filter.clone())
        .and(gate_filter.clone())
        .map(|ws: warp::ws::Ws, conn_mgr, quiz, gate| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, quiz, gate))
        });

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    // Player routes
    let state = warp::path("state")
        .and(warp::path::end())
        .and(warp::get())
        .and(quiz_filter.clone())
        .and_then(handle_state_request);

    let current_question = warp::path!("question" / "current")
        .and(warp::get())
        .and(quiz_filter.clone())
        .and_then(handle_current_question_request);

    let join = warp::path("join")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<JoinRequest>())
        .and(quiz_filter.clone())
        .and(gate_filter.clone())
        .and_then(handle_join_request);

    let submit = warp::path("responses")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<SubmitRequest>())
        .and(quiz_filter.clone())
        .and(gate_filter.clone())
        .and_then(handle_submit_request);

    // Host routes
    let host_action = warp::path!("host" / String)
        .and(warp::post())
        .and(warp::query::<HostActionQuery>())
        .and(host_password.clone())
        .and(quiz_filter.clone())
        .and(gate_filter.clone())
        .and_then(handle_host_action);

    let host_question = warp::path!("host" / "question")
        .and(warp::get())
        .and(host_password.clone())
        .and(quiz_filter.clone())
        .and(gate_filter.clone())
        .and_then(handle_host_question_request);

    let host_leaderboard = warp::path!("host" / "leaderboard" / Ordinal)
        .and(warp::get())
        .and(host_password.clone())
        .and(quiz_filter.clone())
        .and(gate_filter.clone())
        .and_then(handle_leaderboard_request);

    let host_first_correct = warp::path!("host" / "first-correct" / Ordinal)
        .and(warp::get())
        .and(host_password.clone())
        .and(quiz_filter.clone())
        .and(gate_filter.clone())
        .and_then(handle_first_correct_request);

    let host_results = warp::path!("host" / "results")
        .and(warp::get())
        .and(host_password.clone())
        .and(quiz_filter.clone())
        .and(gate_filter.clone())
        .and_then(handle_results_request);

    let host_participants = warp::path!("host" / "participants")
        .and(warp::get())
        .and(host_password)
        .and(quiz_filter)
        .and(gate_filter)
        .and_then(handle_participants_request);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", HOST_PASSWORD_HEADER])
        .allow_methods(vec!["GET", "POST"]);

    websocket
        .or(health)
        .or(state)
        .or(current_question)
        .or(join)
        .or(submit)
        .or(host_action)
        .or(host_question)
        .or(host_leaderboard)
        .or(host_first_correct)
        .or(host_results)
        .or(host_participants)
        .with(cors)
        .with(warp::log("quiz_sync"))
}

async fn handle_state_request(
    quiz_service: Arc<QuizService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(match quiz_service.state().await {
        Ok(state) => json_ok(&state),
        Err(err) => sync_error_reply(err),
    })
}

async fn handle_current_question_request(
    quiz_service: Arc<QuizService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let state = match quiz_service.state().await {
        Ok(state) => state,
        Err(err) => return Ok(sync_error_reply(err)),
    };

    Ok(match quiz_service.question_view(&state).await {
        Ok(question) => json_ok(&CurrentQuestionResponse { state, question }),
        Err(err) => sync_error_reply(err),
    })
}

async fn handle_join_request(
    request: JoinRequest,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(err) = gate.verify_join_code(request.join_code.as_deref()) {
        return Ok(auth_error_reply(err));
    }

    Ok(match quiz_service.join(&request.nickname).await {
        Ok(participant) => warp::reply::with_status(
            warp::reply::json(&participant),
            StatusCode::CREATED,
        ),
        Err(err) => sync_error_reply(err),
    })
}

async fn handle_submit_request(
    request: SubmitRequest,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(err) = gate.verify_join_code(request.join_code.as_deref()) {
        return Ok(auth_error_reply(err));
    }

    Ok(match quiz_service
        .submit_answer(&request.nickname, request.question_id, &request.answer)
        .await
    {
        Ok(outcome) => json_ok(&SubmitResponse { outcome }),
        Err(err) => sync_error_reply(err),
    })
}

async fn handle_host_action(
    action: String,
    query: HostActionQuery,
    password: Option<String>,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(err) = gate.verify_host(password.as_deref()) {
        return Ok(auth_error_reply(err));
    }

    let Some(action) = parse_host_action(&action) else {
        return Ok(json_error("Unknown host action", StatusCode::NOT_FOUND));
    };

    Ok(match quiz_service.host().apply(action, query.version).await {
        Ok(state) => json_ok(&state),
        Err(err) => sync_error_reply(err),
    })
}

async fn handle_host_question_request(
    password: Option<String>,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(err) = gate.verify_host(password.as_deref()) {
        return Ok(auth_error_reply(err));
    }

    Ok(match quiz_service.host().active_question().await {
        Ok(active) => json_ok(&HostQuestionResponse {
            index: active.index,
            total: active.total,
            question: active.record,
            state: active.state,
        }),
        Err(err) => sync_error_reply(err),
    })
}

async fn handle_leaderboard_request(
    question_index: Ordinal,
    password: Option<String>,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(err) = gate.verify_host(password.as_deref()) {
        return Ok(auth_error_reply(err));
    }

    Ok(match quiz_service.host().compute_leaderboard(question_index).await {
        Ok(tally) => json_ok(&tally),
        Err(err) => sync_error_reply(err),
    })
}

async fn handle_first_correct_request(
    question_index: Ordinal,
    password: Option<String>,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(err) = gate.verify_host(password.as_deref()) {
        return Ok(auth_error_reply(err));
    }

    Ok(match quiz_service
        .host()
        .first_correct_responder(question_index)
        .await
    {
        Ok(first) => json_ok(&first),
        Err(err) => sync_error_reply(err),
    })
}

async fn handle_results_request(
    password: Option<String>,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(err) = gate.verify_host(password.as_deref()) {
        return Ok(auth_error_reply(err));
    }

    Ok(match quiz_service.host().final_results().await {
        Ok(results) => json_ok(&results),
        Err(err) => sync_error_reply(err),
    })
}

async fn handle_participants_request(
    password: Option<String>,
    quiz_service: Arc<QuizService>,
    gate: Arc<PassphraseGate>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Err(err) = gate.verify_host(password.as_deref()) {
        return Ok(auth_error_reply(err));
    }

    Ok(match quiz_service.host().participants().await {
        Ok(participants) => json_ok(&participants),
        Err(err) => sync_error_reply(err),
    })
}
