//! Notification rendering and dispatch. Templates are plain configuration
//! rendered by pure functions; delivery goes through an injected sink and
//! a failure there never fails the operation that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::DeliveryError;
use crate::model::{Registration, TentRequest, TrekEvent, UserId};

#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: UserId,
    pub subject: String,
    pub body: String,
    pub channels: Vec<String>,
}

/// Message bodies with `{placeholder}` slots. The defaults match the copy
/// the booking platform sends; deployments may override any of them.
#[derive(Debug, Clone)]
pub struct NotificationTemplates {
    pub registration_confirmed: String,
    pub payment_proof_received: String,
    pub registration_cancelled: String,
    pub tent_request_approved: String,
}

impl Default for NotificationTemplates {
    fn default() -> Self {
        Self {
            registration_confirmed: "Your spot on {trek} is reserved. Upload your payment proof \
                                     to confirm the booking."
                .to_owned(),
            payment_proof_received: "We received the payment proof for your booking #{booking}. \
                                     It will be verified shortly."
                .to_owned(),
            registration_cancelled: "Your booking #{booking} has been cancelled.".to_owned(),
            tent_request_approved: "Your request for {quantity} x {kind} tent has been approved."
                .to_owned(),
        }
    }
}

impl NotificationTemplates {
    #[must_use]
    pub fn registration_confirmed(&self, trek: &TrekEvent) -> (&'static str, String) {
        (
            "Registration received",
            self.registration_confirmed.replace("{trek}", &trek.name),
        )
    }

    #[must_use]
    pub fn payment_proof_received(&self, registration: &Registration) -> (&'static str, String) {
        (
            "Payment proof received",
            self.payment_proof_received
                .replace("{booking}", &registration.id.to_string()),
        )
    }

    #[must_use]
    pub fn registration_cancelled(&self, registration: &Registration) -> (&'static str, String) {
        (
            "Booking cancelled",
            self.registration_cancelled
                .replace("{booking}", &registration.id.to_string()),
        )
    }

    #[must_use]
    pub fn tent_request_approved(&self, request: &TentRequest) -> (&'static str, String) {
        (
            "Tent request approved",
            self.tent_request_approved
                .replace("{quantity}", &request.quantity.to_string())
                .replace("{kind}", &request.kind.0),
        )
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Sink that only logs. Stands in until a real mail/SMS gateway is wired
/// up and keeps local deployments dependency-free.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        info!(
            recipient = %notification.recipient,
            channels = ?notification.channels,
            subject = %notification.subject,
            "dispatching notification: {}",
            notification.body
        );
        Ok(())
    }
}

/// Renders templates and hands the result to the sink, swallowing (but
/// logging) delivery failures.
#[derive(Clone)]
pub struct Notifier {
    templates: NotificationTemplates,
    channels: Vec<String>,
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    pub fn new(
        templates: NotificationTemplates,
        channels: Vec<String>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            templates,
            channels,
            sink,
        }
    }

    pub async fn registration_confirmed(&self, user: &UserId, trek: &TrekEvent) {
        let (subject, body) = self.templates.registration_confirmed(trek);
        self.dispatch(user, subject, body).await;
    }

    pub async fn payment_proof_received(&self, registration: &Registration) {
        let (subject, body) = self.templates.payment_proof_received(registration);
        self.dispatch(&registration.user_id, subject, body).await;
    }

    pub async fn registration_cancelled(&self, registration: &Registration) {
        let (subject, body) = self.templates.registration_cancelled(registration);
        self.dispatch(&registration.user_id, subject, body).await;
    }

    pub async fn tent_request_approved(&self, request: &TentRequest) {
        let (subject, body) = self.templates.tent_request_approved(request);
        self.dispatch(&request.user_id, subject, body).await;
    }

    async fn dispatch(&self, recipient: &UserId, subject: &str, body: String) {
        if self.channels.is_empty() {
            return;
        }
        let notification = Notification {
            recipient: recipient.clone(),
            subject: subject.to_owned(),
            body,
            channels: self.channels.clone(),
        };
        if let Err(error) = self.sink.deliver(&notification).await {
            warn!(%error, subject, "notification delivery failed");
        }
    }
}
