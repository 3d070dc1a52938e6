//! Slash-command webhook.
//!
//! Every path is served by one handler:
//! - `GET ?ssl_check=1`: Slack certificate check, answered with an empty 200
//! - `POST` form: `token` and `text`, dispatched through the command router
//!
//! Anything else is rejected with 405; a token mismatch with 400.

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Form, Router,
};
use icecream_core::errors::{ApplicationError, InterfaceError};
use icecream_slack::commands::{
    parse_backlog_command, CommandRouter, SlashCommandPayload,
};
use icecream_slack::message::SlashReply;
use icecream_slack::verification::TokenVerifier;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::service::RepositoryCommandService;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

#[derive(Clone)]
pub struct WebhookState {
    verifier: TokenVerifier,
    router: Arc<CommandRouter<RepositoryCommandService>>,
}

impl WebhookState {
    pub fn new(verifier: TokenVerifier, service: RepositoryCommandService) -> Self {
        Self { verifier, router: Arc::new(CommandRouter::new(service)) }
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new().fallback(handle_command).with_state(state)
}

pub async fn handle_command(
    State(state): State<WebhookState>,
    method: Method,
    payload: Result<Form<SlashCommandPayload>, FormRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let payload = match payload {
        Ok(Form(payload)) => payload,
        Err(rejection) => {
            debug!(
                event_name = "webhook.request.form_rejected",
                correlation_id = %correlation_id,
                error = %rejection,
                "request form could not be decoded; treating as empty"
            );
            SlashCommandPayload::default()
        }
    };

    if method == Method::GET && payload.is_ssl_check() {
        debug!(
            event_name = "webhook.request.ssl_check",
            correlation_id = %correlation_id,
            "ssl check acknowledged"
        );
        return StatusCode::OK.into_response();
    }

    if method != Method::POST {
        return abort(InterfaceError::MethodNotAllowed {
            method: method.to_string(),
            correlation_id,
        });
    }

    if !state.verifier.verify(&payload.token) {
        return abort(InterfaceError::Unauthorized {
            message: "verification token mismatch".to_owned(),
            correlation_id,
        });
    }

    let command = parse_backlog_command(&payload.text);
    let verb = command.verb();
    match state.router.route(command).await {
        Ok(Some(reply)) => {
            info!(
                event_name = "webhook.command.completed",
                correlation_id = %correlation_id,
                verb,
                user_id = %payload.user_id,
                channel_id = %payload.channel_id,
                "slash command handled"
            );
            render(&reply, correlation_id)
        }
        Ok(None) => {
            debug!(
                event_name = "webhook.command.ignored",
                correlation_id = %correlation_id,
                user_id = %payload.user_id,
                "unrecognized command text"
            );
            StatusCode::OK.into_response()
        }
        Err(route_error) => {
            let failure = ApplicationError::from(route_error);
            error!(
                event_name = "webhook.command.failed",
                correlation_id = %correlation_id,
                verb,
                error = %failure,
                "slash command failed"
            );
            abort(failure.into_interface(correlation_id))
        }
    }
}

fn render(reply: &SlashReply, correlation_id: String) -> Response {
    match serde_json::to_vec(reply) {
        Ok(body) => ([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response(),
        Err(serialize_error) => abort(InterfaceError::Internal {
            message: format!("reply serialization failed: {serialize_error}"),
            correlation_id,
        }),
    }
}

/// Plain status-text response; details stay in the logs.
fn abort(error: InterfaceError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(
            event_name = "webhook.request.aborted",
            correlation_id = %error.correlation_id(),
            status = status.as_u16(),
            error = %error,
            "request aborted"
        );
    } else {
        warn!(
            event_name = "webhook.request.rejected",
            correlation_id = %error.correlation_id(),
            status = status.as_u16(),
            error = %error,
            "request rejected"
        );
    }

    (status, status.canonical_reason().unwrap_or_default()).into_response()
}
