use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{ContactSubmission, escape_html};
use crate::AppState;
use crate::mail::MailMessage;

// A real person takes longer than this to fill the form.
const MIN_FILL_TIME_MS: i64 = 3_000;

const SEND_TIMEOUT: Duration = Duration::from_secs(20);

/// Relays a contact-form submission to the configured recipient. Bots that
/// fill the honeypot or submit implausibly fast get a fake success so they
/// have nothing to learn from the response.
pub async fn contact_handler(
    State(app_state): State<AppState>,
    Json(submission): Json<ContactSubmission>,
) -> Result<impl IntoResponse, (StatusCode, &'static str)> {
    let (Some(mailer), Some(mail_config)) = (&app_state.mailer, &app_state.config.mail) else {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "mail is not configured"));
    };

    let name = submission.name.trim();
    let email = submission.email.trim();
    let body = submission.message.trim();
    if name.is_empty() || email.is_empty() || body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "missing fields"));
    }

    if submission
        .hp
        .as_deref()
        .is_some_and(|honeypot| !honeypot.trim().is_empty())
    {
        warn!("contact submission dropped: honeypot filled");
        return Ok(Json(json!({ "ok": true })));
    }
    if let Some(started_at) = submission.started_at {
        let elapsed_ms = chrono::Utc::now().timestamp_millis() - started_at;
        if elapsed_ms < MIN_FILL_TIME_MS {
            warn!("contact submission dropped: submitted after {elapsed_ms}ms");
            return Ok(Json(json!({ "ok": true })));
        }
    }

    let mut subject = format!("[Portfolio] {name}");
    if let Some(topic) = submission
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
    {
        subject.push_str(" - ");
        subject.push_str(topic);
    }

    let text = format!("From: {name} <{email}>\n\n{body}");
    let html = format!(
        "<div style=\"font-family:system-ui,sans-serif\">\
         <p><strong>From:</strong> {} &lt;{}&gt;</p>\
         <hr/>\
         <pre style=\"white-space:pre-wrap;font:inherit\">{}</pre>\
         </div>",
        escape_html(name),
        escape_html(email),
        escape_html(body),
    );

    let message = MailMessage::new(&mail_config.recipient, mail_config.format_from(), subject, text)
        .with_html(html)
        .with_reply_to(email);

    match tokio::time::timeout(SEND_TIMEOUT, mailer.send(message)).await {
        Ok(Ok(())) => {
            info!("contact submission relayed to {}", mail_config.recipient);
            Ok(Json(json!({ "ok": true })))
        }
        Ok(Err(send_error)) => {
            error!("contact send failed: {}", send_error);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "send failed"))
        }
        Err(_) => {
            error!("contact send timed out");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "send timed out"))
        }
    }
}
