//! Best-effort email dispatch.
//!
//! Handlers commit their transaction first and then hand the committed rows to
//! [`dispatch`]. Sending happens on a spawned task; a failure is logged at WARN
//! and never reaches the HTTP response.

use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::db::models::{locations::ContactInquiryDBResponse, private_events::EventInquiryDBResponse};
use crate::email::EmailService;
use crate::errors::Error;

/// Something that happened which people should hear about by email.
#[derive(Debug, Clone)]
pub enum Notification {
    /// Admin notification plus client confirmation
    EventInquiry(EventInquiryDBResponse),
    /// Admin notification plus client confirmation
    ContactInquiry(ContactInquiryDBResponse),
    PasswordReset {
        email: String,
        name: String,
        token_id: Uuid,
        token: String,
    },
}

impl Notification {
    fn kind(&self) -> &'static str {
        match self {
            Notification::EventInquiry(_) => "event_inquiry",
            Notification::ContactInquiry(_) => "contact_inquiry",
            Notification::PasswordReset { .. } => "password_reset",
        }
    }
}

/// Send `notification` in the background. The handle is only awaited by tests.
pub fn dispatch(config: &Config, notification: Notification) -> JoinHandle<()> {
    let config = config.clone();
    let span = tracing::info_span!("notification", kind = notification.kind());

    tokio::spawn(
        async move {
            let email_service = match EmailService::new(&config) {
                Ok(service) => service,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create email service, notification dropped");
                    return;
                }
            };

            for (recipient, result) in deliver(&email_service, &notification).await {
                match result {
                    Ok(()) => tracing::info!(recipient, "Sent notification"),
                    Err(e) => tracing::warn!(recipient, error = %e, "Failed to send notification"),
                }
            }
        }
        .instrument(span),
    )
}

/// Attempt every message for `notification`. One failed send does not stop the rest.
async fn deliver(email_service: &EmailService, notification: &Notification) -> Vec<(&'static str, Result<(), Error>)> {
    match notification {
        Notification::EventInquiry(inquiry) => vec![
            ("admin", email_service.send_event_inquiry_notification(inquiry).await),
            ("client", email_service.send_event_inquiry_confirmation(inquiry).await),
        ],
        Notification::ContactInquiry(inquiry) => vec![
            ("admin", email_service.send_contact_inquiry_notification(inquiry).await),
            ("client", email_service.send_contact_inquiry_confirmation(inquiry).await),
        ],
        Notification::PasswordReset {
            email,
            name,
            token_id,
            token,
        } => vec![(
            "user",
            email_service
                .send_password_reset_email(email, Some(name), token_id, token)
                .await,
        )],
    }
}
