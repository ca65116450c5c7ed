#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tschwaa_server::core::{AppError, AppState, Config, encode_jwt};
use tschwaa_server::dtos::CreateMemberDTO;
use tschwaa_server::entities::Member;
use tschwaa_server::notifications::{InvitationNotice, NotificationSender, SentMessages};
use tschwaa_server::repositories::Gateway;

pub const JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";

/// Notification sender with scripted behavior per phone number.
#[derive(Default)]
pub struct FakeSender {
    failing: HashSet<String>,
    silent: HashSet<String>,
    slow: HashSet<String>,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// The provider returns an error for this phone.
    pub fn failing(mut self, phone: &str) -> Self {
        self.failing.insert(phone.to_string());
        self
    }

    /// The provider accepts the call but delivers no message.
    pub fn silent(mut self, phone: &str) -> Self {
        self.silent.insert(phone.to_string());
        self
    }

    /// The provider never answers in time.
    pub fn slow(mut self, phone: &str) -> Self {
        self.slow.insert(phone.to_string());
        self
    }

    /// (phone, token) pairs of every delivered invitation.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn token_for(&self, phone: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(p, _)| p == phone)
            .map(|(_, token)| token)
    }
}

#[async_trait]
impl NotificationSender for FakeSender {
    async fn send_invitation(&self, notice: InvitationNotice<'_>) -> Result<SentMessages, AppError> {
        let phone = notice.member.phone.clone();
        if self.slow.contains(&phone) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if self.failing.contains(&phone) {
            return Err(AppError::service_unavailable("Notification request failed"));
        }
        if self.silent.contains(&phone) {
            return Ok(SentMessages::default());
        }
        self.sent
            .lock()
            .unwrap()
            .push((phone.clone(), notice.token.to_string()));
        Ok(SentMessages {
            message_ids: vec![format!("wamid.{}", phone)],
        })
    }

    async fn send_otp(
        &self,
        phone: &str,
        _language: &str,
        _code: &str,
    ) -> Result<SentMessages, AppError> {
        Ok(SentMessages {
            message_ids: vec![format!("wamid.otp.{}", phone)],
        })
    }
}

pub fn test_config() -> Config {
    Config {
        jwt_secret: JWT_SECRET.to_string(),
        notification_timeout_secs: 1,
        invite_concurrency: 4,
        ..Config::default()
    }
}

/// Fresh in-memory database with the schema applied.
pub async fn create_test_gateway() -> Gateway {
    Gateway::connect("sqlite::memory:", 1, 3)
        .await
        .expect("Failed to open in-memory database")
}

/// Crea un AppState per i test
pub async fn create_test_state(sender: Arc<FakeSender>) -> Arc<AppState> {
    create_test_state_with(sender, &test_config()).await
}

pub async fn create_test_state_with(sender: Arc<FakeSender>, config: &Config) -> Arc<AppState> {
    let gateway = create_test_gateway().await;
    Arc::new(AppState::new(gateway, sender, config))
}

/// AppState on a database file under `dir`, with a real multi-connection pool.
pub async fn create_file_state(
    sender: Arc<FakeSender>,
    dir: &Path,
    config: &Config,
) -> Arc<AppState> {
    let url = format!("sqlite://{}", dir.join("tschwaa.db").display());
    let gateway = Gateway::connect(&url, config.max_connections, config.tx_max_attempts)
        .await
        .expect("Failed to open database file");
    Arc::new(AppState::new(gateway, sender, config))
}

/// Crea un TestServer per i test
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = tschwaa_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token per testing
pub fn create_test_jwt(member: &Member) -> String {
    encode_jwt(member.id, member.phone.clone(), JWT_SECRET).expect("Failed to create JWT token")
}

pub async fn create_member(state: &AppState, first_name: &str, phone: &str) -> Member {
    state
        .memberships
        .create_member(&CreateMemberDTO {
            first_name: first_name.to_string(),
            last_name: String::new(),
            sex: String::new(),
            phone: phone.to_string(),
            email: None,
        })
        .await
        .expect("Failed to create member")
}
