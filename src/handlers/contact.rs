use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::client_ip::client_key;
use crate::email::MailError;
use crate::error::{AppError, Result};
use crate::metrics::{
    CONTACT_REQUESTS, EMAIL_FAILURES, EMAILS_SENT, RATE_LIMITED, RATE_LIMITER_KEYS,
    REQUEST_LATENCY,
};
use crate::models::ContactRequest;
use crate::state::{AppState, now_millis};
use crate::validate::contact_form;

pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    CONTACT_REQUESTS.inc();
    let start_time = Instant::now();

    let payload: Value = serde_json::from_slice(&body).map_err(|_| AppError::InvalidJson)?;
    let form = contact_form(&ContactRequest::from_body(payload))?;

    // only well-formed submissions count against the client's quota
    let key = client_key(&headers);
    let decision = state.rate_limiter.check(&key, now_millis());
    RATE_LIMITER_KEYS.set(state.rate_limiter.len() as f64);
    if !decision.is_allowed() {
        RATE_LIMITED.inc();
        debug!(key = %key, count = decision.count, "contact form rate limited");
        return Err(AppError::RateLimited);
    }

    if !state.mailer.is_configured() {
        error!("BREVO_API_KEY is not set");
        return Err(AppError::NotConfigured("Server not configured".into()));
    }

    let email = state.mailer.contact_payload(&form);
    let result = state.mailer.send(&email).await;
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    match result {
        Ok(()) => {
            EMAILS_SENT.inc();
            info!(key = %key, "contact email sent");
            Ok(Json(json!({ "ok": true })))
        }
        Err(MailError::Rejected { status, body }) => {
            EMAIL_FAILURES.inc();
            Err(AppError::Provider { status, body })
        }
        Err(MailError::Transport(e)) => {
            EMAIL_FAILURES.inc();
            error!(error = %e, "Brevo request failed");
            Err(AppError::Delivery(e.to_string()))
        }
    }
}
