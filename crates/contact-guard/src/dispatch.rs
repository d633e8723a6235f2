//! Email delivery via EmailJS

#[cfg(feature = "emailjs")]
use crate::config::DispatchConfig;
use crate::error::DeliveryError;
use crate::types::{DeliveryReceipt, DispatchTarget, EmailPayload};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// Hands an accepted submission to an email delivery service.
///
/// The guard only looks at success or failure.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        target: &DispatchTarget,
        payload: &EmailPayload,
    ) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Request body for the EmailJS send endpoint
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a EmailPayload,
}

impl<'a> SendRequest<'a> {
    fn new(target: &'a DispatchTarget, payload: &'a EmailPayload) -> Result<Self, DeliveryError> {
        let required = [
            ("service_id", &target.service_id),
            ("template_id", &target.template_id),
            ("public_key", &target.public_key),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(DeliveryError::MissingConfig(*name));
        }

        Ok(Self {
            service_id: &target.service_id,
            template_id: &target.template_id,
            user_id: &target.public_key,
            template_params: payload,
        })
    }
}

/// Sender that posts to the EmailJS REST API
#[cfg(feature = "emailjs")]
pub struct EmailJsSender {
    endpoint: String,
    client: reqwest::Client,
}

#[cfg(feature = "emailjs")]
impl EmailJsSender {
    /// Create a new sender
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            endpoint: config.api_endpoint.clone(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_millis(config.timeout_ms))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[cfg(feature = "emailjs")]
#[async_trait]
impl EmailSender for EmailJsSender {
    async fn send(
        &self,
        target: &DispatchTarget,
        payload: &EmailPayload,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let request = SendRequest::new(target, payload)?;

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(DeliveryReceipt {
            status: status.as_u16(),
            text,
        })
    }
}

/// Sender that only logs what it would deliver. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSender;

#[async_trait]
impl EmailSender for LogSender {
    async fn send(
        &self,
        target: &DispatchTarget,
        payload: &EmailPayload,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let request = SendRequest::new(target, payload)?;
        info!(
            service_id = request.service_id,
            template_id = request.template_id,
            subject_len = payload.subject.chars().count(),
            message_len = payload.message.chars().count(),
            "Dry run: email not sent"
        );
        Ok(DeliveryReceipt {
            status: 200,
            text: "OK (dry run)".to_string(),
        })
    }
}
