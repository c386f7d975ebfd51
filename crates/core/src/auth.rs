//! Staff sign-in against the backend's auth endpoints.
//!
//! Sign-in hands the session back to the caller. Looking up the current user and signing
//! out act on the access token of the [`Clinic`](crate::Clinic) handle the service came
//! from, never on state shared with other callers.

use crate::backend::{Authenticator, Session, SessionUser};
use crate::constants::messages;
use crate::events::EventBus;
use crate::{ClinicError, ClinicResult};
use std::sync::Arc;

pub struct AuthService<B> {
    backend: Arc<B>,
    events: EventBus,
    token: Option<Arc<str>>,
}

impl<B: Authenticator> AuthService<B> {
    pub(crate) fn new(backend: Arc<B>, events: EventBus, token: Option<Arc<str>>) -> Self {
        Self {
            backend,
            events,
            token,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ClinicResult<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClinicError::InvalidInput(
                "email and password are required".into(),
            ));
        }

        match self.backend.sign_in(email, password).await {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "signed in");
                Ok(session)
            }
            Err(e) => {
                tracing::warn!("{}: {e}", messages::SIGN_IN);
                self.events.error(messages::SIGN_IN);
                Err(e)
            }
        }
    }

    fn require_token(&self) -> ClinicResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| ClinicError::Unauthenticated("no access token".into()))
    }

    /// The user this handle's token belongs to, or `Unauthenticated`.
    pub async fn current_user(&self) -> ClinicResult<SessionUser> {
        let token = self.require_token()?;
        self.backend.user(token).await
    }

    /// Revokes this handle's token. Other callers' tokens are untouched.
    pub async fn sign_out(&self) -> ClinicResult<()> {
        let token = self.require_token()?;
        if let Err(e) = self.backend.sign_out(token).await {
            tracing::warn!("{}: {e}", messages::SIGN_OUT);
            self.events.error(messages::SIGN_OUT);
            return Err(e);
        }
        tracing::info!("signed out");
        Ok(())
    }
}
