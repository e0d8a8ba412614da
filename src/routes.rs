//! REST endpoints: contacts, reply checks, threads and outreach.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;
use uuid::Uuid;

use crate::error::Error;
use crate::outbound::OutreachService;
use crate::replies::{ReplyTracker, build_thread};
use crate::store::{Contact, ContactUpdate, Database};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub tracker: Arc<ReplyTracker>,
    pub outreach: Arc<OutreachService>,
}

/// Build the full application router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/check-replies", post(check_replies))
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/contacts/{id}",
            put(update_contact).delete(delete_contact),
        )
        .route("/api/contacts/{id}/thread", get(contact_thread))
        .route("/api/send-email", post(send_email))
        .route("/api/sent-emails", get(list_sent_emails))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map a service error onto a status code and `{"error": ...}` body.
fn error_response(err: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        Error::Mailbox(_) | Error::Send(_) => StatusCode::BAD_GATEWAY,
        Error::ContactNotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {err}");
    }
    (status, Json(json!({"error": err.to_string()})))
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "placement-pitcher"
    }))
}

// ── Replies ─────────────────────────────────────────────────────────────

/// POST /api/check-replies
async fn check_replies(State(state): State<AppState>) -> impl IntoResponse {
    match state.tracker.check_replies().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "checked": summary.checked,
                "saved": summary.saved,
                "message": summary.message(),
            })),
        ),
        Err(e) => error_response(&e),
    }
}

/// GET /api/contacts/{id}/thread
///
/// Sent mail and replies for one contact, oldest first.
async fn contact_thread(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Ok(contact_id) = Uuid::parse_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid contact ID"})),
        );
    };

    let result: Result<_, Error> = async {
        state
            .db
            .get_contact(contact_id)
            .await?
            .ok_or_else(|| Error::ContactNotFound(id.clone()))?;
        let sent = state.db.list_sent_emails_for_contact(contact_id).await?;
        let replies = state.db.list_replies_for_contact(contact_id).await?;
        Ok(build_thread(&sent, &replies))
    }
    .await;

    match result {
        Ok(entries) => (StatusCode::OK, Json(json!(entries))),
        Err(e) => error_response(&e),
    }
}

// ── Contacts ────────────────────────────────────────────────────────────

async fn list_contacts(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_contacts().await {
        Ok(contacts) => (StatusCode::OK, Json(json!(contacts))),
        Err(e) => error_response(&Error::from(e)),
    }
}

#[derive(Debug, Deserialize)]
struct CreateContactRequest {
    #[serde(default)]
    company_name: String,
    hr_name: Option<String>,
    email: Option<String>,
    context: Option<String>,
}

/// POST /api/contacts
async fn create_contact(
    State(state): State<AppState>,
    Json(req): Json<CreateContactRequest>,
) -> impl IntoResponse {
    let company_name = req.company_name.trim();
    if company_name.is_empty() {
        return error_response(&Error::InvalidRequest("company_name is required".into()));
    }

    let contact = Contact::new(company_name, req.hr_name, req.email, req.context);
    match state.db.insert_contact(&contact).await {
        Ok(()) => (StatusCode::CREATED, Json(json!(contact))),
        Err(e) => error_response(&Error::from(e)),
    }
}

/// PUT /api/contacts/{id}
async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ContactUpdate>,
) -> impl IntoResponse {
    let Ok(contact_id) = Uuid::parse_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid contact ID"})),
        );
    };

    let result: Result<_, Error> = async {
        let mut contact = state
            .db
            .get_contact(contact_id)
            .await?
            .ok_or_else(|| Error::ContactNotFound(id.clone()))?;
        contact.apply(update);
        if !state.db.update_contact(&contact).await? {
            return Err(Error::ContactNotFound(id.clone()));
        }
        Ok(contact)
    }
    .await;

    match result {
        Ok(contact) => (StatusCode::OK, Json(json!(contact))),
        Err(e) => error_response(&e),
    }
}

/// DELETE /api/contacts/{id}
async fn delete_contact(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Ok(contact_id) = Uuid::parse_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid contact ID"})),
        );
    };

    match state.db.delete_contact(contact_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({"message": "Contact deleted successfully"})),
        ),
        Ok(false) => error_response(&Error::ContactNotFound(id)),
        Err(e) => error_response(&Error::from(e)),
    }
}

// ── Outreach ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SendEmailRequest {
    contact_id: Uuid,
    subject: String,
    body: String,
}

/// POST /api/send-email
async fn send_email(
    State(state): State<AppState>,
    Json(req): Json<SendEmailRequest>,
) -> impl IntoResponse {
    match state
        .outreach
        .send_to_contact(req.contact_id, &req.subject, &req.body)
        .await
    {
        Ok(sent) => (
            StatusCode::OK,
            Json(json!({"message": "Email sent successfully", "email": sent})),
        ),
        Err(e) => error_response(&e),
    }
}

/// GET /api/sent-emails
async fn list_sent_emails(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_sent_emails().await {
        Ok(sent) => (StatusCode::OK, Json(json!(sent))),
        Err(e) => error_response(&Error::from(e)),
    }
}
