use crate::domain::models::{SessionToken, UserProfile};
use crate::infrastructure::backend_http::{
    endpoint, ensure_non_empty, envelope_message, optional_field, parse_envelope, required_field,
    session_from_headers, with_session,
};
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method};
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Result of an auth call: the backend's message plus, for login and signup,
/// the session it issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub message: Option<String>,
    pub session: Option<SessionToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub message: Option<String>,
    pub user: Option<UserProfile>,
}

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, InfraError>;

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, InfraError>;

    async fn logout(&self, session: &SessionToken) -> Result<Option<String>, InfraError>;

    async fn fetch_user(&self, session: &SessionToken) -> Result<UserProfile, InfraError>;

    async fn update_user(
        &self,
        session: &SessionToken,
        name: &str,
        email: &str,
    ) -> Result<ProfileUpdate, InfraError>;

    async fn change_password(
        &self,
        session: &SessionToken,
        current_password: &str,
        new_password: &str,
    ) -> Result<Option<String>, InfraError>;

    async fn send_reset_otp(&self, email: &str) -> Result<Option<String>, InfraError>;

    async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<Option<String>, InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestAuthClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateUserRequest<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Serialize)]
struct ResetOtpRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    email: &'a str,
    otp: &'a str,
    new_password: &'a str,
}

struct RawResponse {
    envelope: serde_json::Value,
    session: Option<SessionToken>,
}

impl ReqwestAuthClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        action: &str,
        method: Method,
        segments: &[&str],
        session: Option<&SessionToken>,
        body: Option<&B>,
    ) -> Result<RawResponse, InfraError> {
        let url = endpoint(&self.base_url, segments)?;
        tracing::debug!(action, %url, "sending auth request");

        let mut request = self.client.request(method, url);
        if let Some(session) = session {
            request = with_session(request, session);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|error| InfraError::Http(format!("network error during {action}: {error}")))?;

        let status = response.status();
        let session = session_from_headers(response.headers(), Utc::now());
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Http(format!("failed reading {action} response: {error}")))?;
        tracing::debug!(action, status = status.as_u16(), "auth response received");

        let envelope = parse_envelope(action, status, &body)?;
        Ok(RawResponse { envelope, session })
    }

    fn require_session(action: &str, raw: RawResponse) -> Result<AuthResponse, InfraError> {
        let session = raw.session.ok_or_else(|| {
            InfraError::Http(format!("{action} response did not set a session cookie"))
        })?;
        Ok(AuthResponse {
            message: envelope_message(&raw.envelope),
            session: Some(session),
        })
    }
}

#[async_trait]
impl AuthClient for ReqwestAuthClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, InfraError> {
        ensure_non_empty(&credentials.email, "email")?;
        ensure_non_empty(&credentials.password, "password")?;

        let request = LoginRequest {
            email: credentials.email.trim(),
            password: &credentials.password,
        };
        let raw = self
            .send("login", Method::POST, &["auth", "login"], None, Some(&request))
            .await?;
        Self::require_session("login", raw)
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, InfraError> {
        ensure_non_empty(&registration.name, "name")?;
        ensure_non_empty(&registration.email, "email")?;
        ensure_non_empty(&registration.password, "password")?;

        let request = RegisterRequest {
            name: registration.name.trim(),
            email: registration.email.trim(),
            password: &registration.password,
        };
        let raw = self
            .send("signup", Method::POST, &["auth", "register"], None, Some(&request))
            .await?;
        Self::require_session("signup", raw)
    }

    async fn logout(&self, session: &SessionToken) -> Result<Option<String>, InfraError> {
        let raw = self
            .send::<()>("logout", Method::POST, &["auth", "logout"], Some(session), None)
            .await?;
        Ok(envelope_message(&raw.envelope))
    }

    async fn fetch_user(&self, session: &SessionToken) -> Result<UserProfile, InfraError> {
        let raw = self
            .send::<()>("fetch user", Method::GET, &["user", "data"], Some(session), None)
            .await?;
        required_field(&raw.envelope, "userData", "fetch user")
    }

    async fn update_user(
        &self,
        session: &SessionToken,
        name: &str,
        email: &str,
    ) -> Result<ProfileUpdate, InfraError> {
        ensure_non_empty(name, "name")?;
        ensure_non_empty(email, "email")?;

        let request = UpdateUserRequest {
            name: name.trim(),
            email: email.trim(),
        };
        let raw = self
            .send(
                "update profile",
                Method::PUT,
                &["user", "update"],
                Some(session),
                Some(&request),
            )
            .await?;
        Ok(ProfileUpdate {
            message: envelope_message(&raw.envelope),
            user: optional_field(&raw.envelope, "userData", "update profile")?,
        })
    }

    async fn change_password(
        &self,
        session: &SessionToken,
        current_password: &str,
        new_password: &str,
    ) -> Result<Option<String>, InfraError> {
        ensure_non_empty(current_password, "current password")?;
        ensure_non_empty(new_password, "new password")?;

        let request = ChangePasswordRequest {
            current_password,
            new_password,
        };
        let raw = self
            .send(
                "change password",
                Method::POST,
                &["auth", "change-password"],
                Some(session),
                Some(&request),
            )
            .await?;
        Ok(envelope_message(&raw.envelope))
    }

    async fn send_reset_otp(&self, email: &str) -> Result<Option<String>, InfraError> {
        ensure_non_empty(email, "email")?;

        let request = ResetOtpRequest {
            email: email.trim(),
        };
        let raw = self
            .send(
                "send reset code",
                Method::POST,
                &["auth", "send-reset-otp"],
                None,
                Some(&request),
            )
            .await?;
        Ok(envelope_message(&raw.envelope))
    }

    async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<Option<String>, InfraError> {
        ensure_non_empty(email, "email")?;
        ensure_non_empty(otp, "otp")?;
        ensure_non_empty(new_password, "new password")?;

        let request = ResetPasswordRequest {
            email: email.trim(),
            otp: otp.trim(),
            new_password,
        };
        let raw = self
            .send(
                "reset password",
                Method::POST,
                &["auth", "reset-password"],
                None,
                Some(&request),
            )
            .await?;
        Ok(envelope_message(&raw.envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_payloads_use_backend_field_names() {
        let change = serde_json::to_value(ChangePasswordRequest {
            current_password: "Old12345",
            new_password: "New12345",
        })
        .expect("serialize");
        assert_eq!(
            change,
            serde_json::json!({"currentPassword": "Old12345", "newPassword": "New12345"})
        );

        let reset = serde_json::to_value(ResetPasswordRequest {
            email: "ada@example.com",
            otp: "123456",
            new_password: "New12345",
        })
        .expect("serialize");
        assert_eq!(
            reset,
            serde_json::json!({"email": "ada@example.com", "otp": "123456", "newPassword": "New12345"})
        );
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected_before_sending() {
        // Port 9 is discard; nothing should ever be sent there.
        let client = ReqwestAuthClient::new(Url::parse("http://127.0.0.1:9/api").expect("url"));
        let error = client
            .login(&Credentials {
                email: "  ".to_string(),
                password: "secret".to_string(),
            })
            .await
            .expect_err("blank email");
        assert!(matches!(error, InfraError::Validation(_)));

        let error = client
            .reset_password("ada@example.com", "", "New12345")
            .await
            .expect_err("blank otp");
        assert!(matches!(error, InfraError::Validation(_)));
    }

    #[test]
    fn missing_session_cookie_is_an_error() {
        let raw = RawResponse {
            envelope: serde_json::json!({"success": true, "message": "Welcome"}),
            session: None,
        };
        assert!(matches!(
            ReqwestAuthClient::require_session("login", raw),
            Err(InfraError::Http(_))
        ));
    }
}
