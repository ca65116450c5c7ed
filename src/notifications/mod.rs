//! Notifications - Canale esterno per link di invito e OTP
//!
//! [`NotificationSender`] is the seam the invitation dispatcher talks to. Calls are
//! treated as slow, fallible remote operations; callers bound them with a timeout.

pub mod whatsapp;

use crate::core::AppError;
use crate::entities::Member;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use whatsapp::WhatsAppSender;

/// Ids of the messages the provider accepted.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SentMessages {
    pub message_ids: Vec<String>,
}

impl SentMessages {
    pub fn is_empty(&self) -> bool {
        self.message_ids.is_empty()
    }
}

/// Invitation data handed to the sender.
#[derive(Debug, Clone)]
pub struct InvitationNotice<'a> {
    pub member: &'a Member,
    pub organization_name: &'a str,
    pub token: &'a str,
    pub requester_name: &'a str,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_invitation(&self, notice: InvitationNotice<'_>) -> Result<SentMessages, AppError>;

    async fn send_otp(&self, phone: &str, language: &str, code: &str)
    -> Result<SentMessages, AppError>;
}
