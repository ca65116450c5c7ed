//! WhatsApp Cloud API sender
//!
//! Template messages posted to `{base}/{version}/{phone_number_id}/messages` with a
//! bearer token. Success means the response lists at least one message id.

use super::{InvitationNotice, NotificationSender, SentMessages};
use crate::core::{AppError, config::WhatsAppConfig};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, instrument, warn};

const INVITE_TEMPLATE: &str = "tschwaa_invite_member_to_join";
const OTP_TEMPLATE: &str = "tschwaa_otp";
/// Used in the greeting when the invitee never gave a name.
const FALLBACK_MEMBER_NAME: &str = "Membre";

#[derive(Deserialize, Debug)]
struct MessageId {
    id: String,
}

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<MessageId>,
}

#[derive(Clone)]
pub struct WhatsAppSender {
    config: WhatsAppConfig,
    join_link_base_url: String,
    client: reqwest::Client,
}

impl WhatsAppSender {
    pub fn new(config: WhatsAppConfig, join_link_base_url: impl Into<String>) -> Self {
        Self {
            config,
            join_link_base_url: join_link_base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.api_version,
            self.config.phone_number_id
        )
    }

    fn join_link(&self, token: &str) -> String {
        format!("{}{}", self.join_link_base_url, token)
    }

    fn invitation_payload(&self, notice: &InvitationNotice<'_>) -> Value {
        let member_name = notice
            .member
            .display_name()
            .unwrap_or_else(|| FALLBACK_MEMBER_NAME.to_string());

        json!({
            "messaging_product": "whatsapp",
            "to": notice.member.phone,
            "type": "template",
            "template": {
                "name": INVITE_TEMPLATE,
                "language": { "code": self.config.language },
                "components": [{
                    "type": "body",
                    "parameters": [
                        { "type": "text", "text": member_name },
                        { "type": "text", "text": notice.organization_name },
                        { "type": "text", "text": self.join_link(notice.token) },
                        { "type": "text", "text": notice.requester_name },
                    ]
                }]
            }
        })
    }

    fn otp_payload(phone: &str, language: &str, code: &str) -> Value {
        json!({
            "messaging_product": "whatsapp",
            "to": phone,
            "type": "template",
            "template": {
                "name": OTP_TEMPLATE,
                "language": { "code": language },
                "components": [{
                    "type": "body",
                    "parameters": [{ "type": "text", "text": code }]
                }]
            }
        })
    }

    async fn post(&self, payload: &Value) -> Result<SentMessages, AppError> {
        let resp = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.config.access_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!("WhatsApp request failed: {}", e);
                AppError::service_unavailable("Notification request failed")
                    .with_details(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("WhatsApp answered {}: {}", status, body);
            return Err(AppError::service_unavailable("Notification provider rejected the message")
                .with_details(format!("status {}", status)));
        }

        let body: MessagesResponse = resp.json().await.map_err(|e| {
            error!("WhatsApp response parse failed: {}", e);
            AppError::service_unavailable("Notification provider sent an unreadable response")
        })?;

        debug!("WhatsApp accepted {} message(s)", body.messages.len());
        Ok(SentMessages {
            message_ids: body.messages.into_iter().map(|m| m.id).collect(),
        })
    }
}

#[async_trait]
impl NotificationSender for WhatsAppSender {
    #[instrument(skip(self, notice), fields(to = %notice.member.phone))]
    async fn send_invitation(&self, notice: InvitationNotice<'_>) -> Result<SentMessages, AppError> {
        let payload = self.invitation_payload(&notice);
        self.post(&payload).await
    }

    #[instrument(skip(self, code))]
    async fn send_otp(
        &self,
        phone: &str,
        language: &str,
        code: &str,
    ) -> Result<SentMessages, AppError> {
        let payload = Self::otp_payload(phone, language, code);
        self.post(&payload).await
    }
}
