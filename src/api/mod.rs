use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

use crate::agent::{AgentError, MedicalAgent};

pub mod format;

const CHAT_PAGE: &str = include_str!("../../templates/chat.html");

const GENERIC_FAILURE: &str = "Sorry, something went wrong while answering your question. Please try again.";
const RETRIEVAL_FAILURE: &str = "Medical references are unavailable right now. Please try again shortly.";
const DEADLINE_FAILURE: &str = "Answering took too long. Please try again.";
const INVALID_QUESTION: &str = "Please enter a question.";

#[derive(Clone)]
pub struct AppState {
    agent: Arc<MedicalAgent>,
    request_deadline: Duration,
}

#[derive(Deserialize, Validate)]
pub struct ChatForm {
    #[validate(length(min = 1, max = 2000))]
    msg: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    model: String,
}

/// Create and configure the API router
pub fn create_api(agent: Arc<MedicalAgent>, request_deadline: Duration, max_concurrent_requests: usize) -> Router {
    let state = AppState {
        agent,
        request_deadline,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/", get(index_handler))
        .route("/get", get(chat_handler).post(chat_handler))
        .route("/health", get(health_check))
        // One semaphore shared by every route and method
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_requests.max(1)))
        .layer(cors)
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

async fn chat_handler(
    State(state): State<AppState>,
    form: Result<Form<ChatForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            log::info!("Rejected chat request: {}", rejection);
            return failure(StatusCode::BAD_REQUEST, INVALID_QUESTION);
        }
    };

    if let Err(e) = form.validate() {
        log::info!("Rejected chat request: {}", e);
        return failure(StatusCode::BAD_REQUEST, INVALID_QUESTION);
    }

    log::info!("User: {}", form.msg);

    let outcome = tokio::time::timeout(state.request_deadline, state.agent.invoke(form.msg)).await;

    match outcome {
        Ok(Ok(result)) => Html(format::render_answer(&result)).into_response(),
        Ok(Err(e)) => {
            log::error!("Pipeline failed: {}", e);
            match e {
                AgentError::RetrievalUnavailable(_) => failure(StatusCode::SERVICE_UNAVAILABLE, RETRIEVAL_FAILURE),
                AgentError::AnswerGenerationFailed(_) => failure(StatusCode::BAD_GATEWAY, GENERIC_FAILURE),
                _ => failure(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE),
            }
        }
        Err(_) => {
            log::error!("Request exceeded deadline of {:?}", state.request_deadline);
            failure(StatusCode::GATEWAY_TIMEOUT, DEADLINE_FAILURE)
        }
    }
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Html(format::render_error(message))).into_response()
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Server is running and healthy".to_string(),
        model: state.agent.model_name().to_string(),
    })
}
