use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use account_service::account::errors::EmailSenderError;
use account_service::account::models::DeliveryResult;
use account_service::account::models::EmailAddress;
use account_service::account::ports::EmailSender;
use account_service::account::service::AccountService;
use account_service::account::service::LinkSettings;
use account_service::config::JwtConfig;
use account_service::inbound::http::router::create_router;
use account_service::outbound::events::spawn_email_verification_worker;
use account_service::outbound::events::ChannelEventPublisher;
use account_service::outbound::identity::RsaTokenIssuer;
use account_service::stores::InMemoryUserStore;
use async_trait::async_trait;
use problem::ProblemTranslator;
use serde_json::json;
use tokio::sync::Mutex;
use url::Url;

/// Kind of message captured by [`RecordingEmailSender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Confirmation,
    PasswordReset,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub kind: EmailKind,
    pub to: String,
    pub link: Url,
}

/// Email sender that keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailSender {
    async fn record(&self, kind: EmailKind, address: &EmailAddress, link: &Url) {
        self.sent.lock().await.push(SentEmail {
            kind,
            to: address.as_str().to_string(),
            link: link.clone(),
        });
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_confirmation_email(
        &self,
        address: &EmailAddress,
        link: &Url,
    ) -> Result<DeliveryResult, EmailSenderError> {
        self.record(EmailKind::Confirmation, address, link).await;
        Ok(DeliveryResult::delivered(202))
    }

    async fn send_password_reset_email(
        &self,
        address: &EmailAddress,
        link: &Url,
    ) -> Result<DeliveryResult, EmailSenderError> {
        self.record(EmailKind::PasswordReset, address, link).await;
        Ok(DeliveryResult::delivered(202))
    }
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../auth/tests/fixtures")
        .join(name)
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub emails: Arc<RecordingEmailSender>,
}

impl TestApp {
    /// Spawn the application with the fixture key pair
    pub async fn spawn() -> Self {
        Self::spawn_with_public_key(fixture("public.pem")).await
    }

    /// Spawn the application reading its public key from `public_key_path`
    pub async fn spawn_with_public_key(public_key_path: PathBuf) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let jwt = JwtConfig {
            issuer: "account-service".to_string(),
            audience: "account-service-tests".to_string(),
            private_key_path: fixture("private.pem"),
            public_key_path,
            access_token_minutes: 30,
        };

        let emails = Arc::new(RecordingEmailSender::default());
        let (event_publisher, event_receiver) = ChannelEventPublisher::channel(16);

        let service = Arc::new(AccountService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::clone(&emails),
            Arc::new(RsaTokenIssuer::new(jwt.issuer_settings())),
            Arc::new(event_publisher),
            LinkSettings::new(address.clone(), "auth"),
        ));
        spawn_email_verification_worker(event_receiver, service.clone());

        let router = create_router(service, ProblemTranslator::new(address.clone()));

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            emails,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Register an account with a policy-compliant password
    pub async fn register(&self, username: &str, email: &str) -> reqwest::Response {
        self.post("/auth/register")
            .json(&json!({
                "firstName": "Alice",
                "lastName": "Smith",
                "email": email,
                "username": username,
                "password": "Str0ng!pass"
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Wait for the next email of `kind` sent to `to`
    pub async fn wait_for_email(&self, kind: EmailKind, to: &str) -> SentEmail {
        for _ in 0..100 {
            let found = self
                .emails
                .sent
                .lock()
                .await
                .iter()
                .rev()
                .find(|e| e.kind == kind && e.to == to)
                .cloned();
            if let Some(email) = found {
                return email;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("No {:?} email sent to {}", kind, to);
    }

    pub async fn emails_sent(&self) -> usize {
        self.emails.sent.lock().await.len()
    }

    /// Register, confirm and log in; returns the login response body
    pub async fn verified_login(&self, username: &str, email: &str) -> serde_json::Value {
        self.register(username, email).await;
        let confirmation = self.wait_for_email(EmailKind::Confirmation, email).await;
        let response = self
            .api_client
            .get(confirmation.link)
            .send()
            .await
            .expect("Failed to execute request");
        assert!(response.status().is_success());

        self.post("/auth/login")
            .json(&json!({ "username": username, "password": "Str0ng!pass" }))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse response")
    }
}
