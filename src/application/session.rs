use crate::domain::models::{
    SessionToken, UserProfile, validate_non_empty, validate_otp, validate_password,
};
use crate::infrastructure::auth_client::{AuthClient, AuthResponse, Credentials, Registration};
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::InfraError;
use std::sync::{Arc, Mutex, MutexGuard};

/// Who is signed in, as last confirmed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub user: Option<UserProfile>,
    pub logged_in: bool,
}

impl SessionContext {
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map(UserProfile::display_name)
            .unwrap_or("User")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChange {
    pub message: Option<String>,
    pub user: UserProfile,
}

/// Single writer of the session context. Every auth flow goes through here so
/// the stored token and the in-memory context never disagree.
pub struct SessionManager<S, C>
where
    S: CredentialStore + ?Sized,
    C: AuthClient + ?Sized,
{
    credential_store: Arc<S>,
    auth_client: Arc<C>,
    context: Mutex<SessionContext>,
}

fn validation(result: Result<(), String>) -> Result<(), InfraError> {
    result.map_err(InfraError::Validation)
}

impl<S, C> SessionManager<S, C>
where
    S: CredentialStore + ?Sized,
    C: AuthClient + ?Sized,
{
    pub fn new(credential_store: Arc<S>, auth_client: Arc<C>) -> Self {
        Self {
            credential_store,
            auth_client,
            context: Mutex::new(SessionContext::default()),
        }
    }

    pub fn snapshot(&self) -> SessionContext {
        self.lock_context()
            .map(|context| context.clone())
            .unwrap_or_default()
    }

    fn lock_context(&self) -> Result<MutexGuard<'_, SessionContext>, InfraError> {
        self.context
            .lock()
            .map_err(|error| InfraError::Credential(format!("session lock poisoned: {error}")))
    }

    fn set_context(&self, context: SessionContext) -> Result<(), InfraError> {
        *self.lock_context()? = context;
        Ok(())
    }

    /// Stored token for commands that need a signed-in user.
    pub fn require_token(&self) -> Result<SessionToken, InfraError> {
        match self.credential_store.load_token()? {
            Some(token) if token.is_usable() => Ok(token),
            _ => Err(InfraError::AuthenticationRequired),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Option<String>, InfraError> {
        validation(validate_non_empty(email, "email"))?;
        validation(validate_non_empty(password, "password"))?;

        let response = self
            .auth_client
            .login(&Credentials {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        self.start_session(response).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<String>, InfraError> {
        validation(validate_non_empty(name, "name"))?;
        validation(validate_non_empty(email, "email"))?;
        validation(validate_password(password, "password"))?;

        let response = self
            .auth_client
            .register(&Registration {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        self.start_session(response).await
    }

    async fn start_session(&self, response: AuthResponse) -> Result<Option<String>, InfraError> {
        let token = response.session.ok_or(InfraError::AuthenticationRequired)?;
        self.credential_store.save_token(&token)?;

        // A failed profile fetch leaves the user signed in without details.
        let user = match self.auth_client.fetch_user(&token).await {
            Ok(user) => Some(user),
            Err(error) => {
                tracing::warn!(%error, "signed in but user data could not be loaded");
                None
            }
        };
        self.set_context(SessionContext {
            user,
            logged_in: true,
        })?;
        Ok(response.message)
    }

    /// Rebuilds the context from the stored token. A token the backend no
    /// longer accepts is discarded.
    pub async fn restore(&self) -> Result<SessionContext, InfraError> {
        let Some(token) = self.credential_store.load_token()? else {
            self.set_context(SessionContext::default())?;
            return Ok(SessionContext::default());
        };
        if !token.is_usable() {
            self.credential_store.delete_token()?;
            self.set_context(SessionContext::default())?;
            return Ok(SessionContext::default());
        }

        match self.auth_client.fetch_user(&token).await {
            Ok(user) => {
                let context = SessionContext {
                    user: Some(user),
                    logged_in: true,
                };
                self.set_context(context.clone())?;
                Ok(context)
            }
            Err(InfraError::Backend(message)) => {
                tracing::info!(%message, "stored session rejected; clearing it");
                self.credential_store.delete_token()?;
                self.set_context(SessionContext::default())?;
                Ok(SessionContext::default())
            }
            Err(error) => Err(error),
        }
    }

    pub async fn logout(&self) -> Result<Option<String>, InfraError> {
        let mut message = None;
        if let Some(token) = self.credential_store.load_token()? {
            match self.auth_client.logout(&token).await {
                Ok(reply) => message = reply,
                Err(error) => tracing::warn!(%error, "backend logout failed; clearing local session"),
            }
        }
        self.credential_store.delete_token()?;
        self.set_context(SessionContext::default())?;
        Ok(message)
    }

    pub async fn update_profile(&self, name: &str, email: &str) -> Result<ProfileChange, InfraError> {
        validation(validate_non_empty(name, "name"))?;
        validation(validate_non_empty(email, "email"))?;
        let token = self.require_token()?;

        let update = self.auth_client.update_user(&token, name, email).await?;
        let user = match self.auth_client.fetch_user(&token).await {
            Ok(user) => user,
            Err(error) => {
                tracing::warn!(%error, "profile updated but refresh failed");
                update.user.clone().ok_or(error)?
            }
        };
        self.set_context(SessionContext {
            user: Some(user.clone()),
            logged_in: true,
        })?;
        Ok(ProfileChange {
            message: update.message,
            user,
        })
    }

    /// On success the session ends; the user signs in again with the new
    /// password.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Option<String>, InfraError> {
        if current_password.is_empty() || new_password.is_empty() || confirm_password.is_empty() {
            return Err(InfraError::Validation("All fields are required".to_string()));
        }
        if new_password != confirm_password {
            return Err(InfraError::Validation(
                "New password and confirm password do not match".to_string(),
            ));
        }
        validation(validate_password(new_password, "new password"))?;
        let token = self.require_token()?;

        let message = self
            .auth_client
            .change_password(&token, current_password, new_password)
            .await?;
        self.logout().await?;
        Ok(message)
    }

    pub async fn send_reset_otp(&self, email: &str) -> Result<Option<String>, InfraError> {
        validation(validate_non_empty(email, "email"))?;
        self.auth_client.send_reset_otp(email.trim()).await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<Option<String>, InfraError> {
        validation(validate_non_empty(email, "email"))?;
        validation(validate_otp(otp.trim()))?;
        validation(validate_password(new_password, "new password"))?;
        self.auth_client
            .reset_password(email.trim(), otp.trim(), new_password)
            .await
    }
}
