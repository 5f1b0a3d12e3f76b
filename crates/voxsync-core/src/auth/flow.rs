//! Two-step login state machine.
//!
//! `Idle → AwaitingEmail → AwaitingOtp → Authenticated`. A failed step stays
//! where it was so the user can resubmit; nothing here panics or bubbles a
//! failure past the caller without also reporting it through the presenter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::store::CredentialStore;
use crate::error::{Error, Result};
use crate::guard::InFlightGuard;
use crate::presenter::{Presenter, Prompt};
use crate::remote::RemoteService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    AwaitingEmail,
    AwaitingOtp,
    Authenticated,
}

/// What a submission achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    /// Login accepted; a code is on its way to the user.
    CodeRequested,
    /// Code accepted; the bearer token is stored.
    Authenticated,
    /// Another auth request is still in flight; nothing was sent.
    Busy,
}

pub struct AuthFlow<R, P> {
    store: Arc<CredentialStore>,
    remote: Arc<R>,
    presenter: Arc<P>,
    state: Mutex<AuthState>,
    login_open: AtomicBool,
    request_in_flight: AtomicBool,
}

impl<R: RemoteService, P: Presenter> AuthFlow<R, P> {
    /// Start in the state implied by what the store already holds.
    pub fn new(store: Arc<CredentialStore>, remote: Arc<R>, presenter: Arc<P>) -> Self {
        let credential = store.get();
        let state = if credential.is_authenticated() {
            AuthState::Authenticated
        } else if credential.pending_request().is_some() {
            AuthState::AwaitingOtp
        } else {
            AuthState::Idle
        };

        Self {
            store,
            remote,
            presenter,
            state: Mutex::new(state),
            login_open: AtomicBool::new(false),
            request_in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> AuthState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Whether a login prompt is currently open.
    pub fn is_login_open(&self) -> bool {
        self.login_open.load(Ordering::Acquire)
    }

    /// Open the email step. Returns `false` when a login flow is already open.
    pub fn begin_login(&self) -> bool {
        if self
            .login_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("login flow already open");
            return false;
        }

        self.set_state(AuthState::AwaitingEmail);
        self.presenter.show_email_prompt();
        true
    }

    /// Reopen login where it left off: the code prompt when a request is
    /// pending, otherwise the email prompt.
    pub fn resume_login(&self) -> bool {
        if self.store.get().pending_request().is_none() {
            return self.begin_login();
        }
        if self
            .login_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        self.set_state(AuthState::AwaitingOtp);
        self.presenter.show_otp_prompt();
        true
    }

    /// Ask the service to email a one-time code.
    pub async fn submit_email(&self, email: &str) -> Result<AuthStep> {
        let email = email.trim();
        if email.is_empty() {
            return Err(self.report(Error::InvalidInput("Email is required".to_string())));
        }

        let Some(_in_flight) = InFlightGuard::try_acquire(&self.request_in_flight) else {
            tracing::debug!("auth request already in flight; ignoring email submission");
            return Ok(AuthStep::Busy);
        };
        self.login_open.store(true, Ordering::Release);

        let auth_request_id = match self.remote.login(email).await {
            Ok(id) => id,
            Err(error) => {
                self.set_state(AuthState::AwaitingEmail);
                return Err(self.report(error));
            }
        };

        let recorded = self
            .persist(move |store| store.set_pending_auth_request(&auth_request_id))
            .await;
        if let Err(error) = recorded {
            self.set_state(AuthState::AwaitingEmail);
            return Err(self.report(error));
        }

        self.set_state(AuthState::AwaitingOtp);
        self.presenter.notify("Code sent to your email.");
        self.presenter.dismiss(Prompt::Email);
        self.presenter.show_otp_prompt();
        tracing::info!("login code requested");
        Ok(AuthStep::CodeRequested)
    }

    /// Verify the emailed code against the pending request.
    ///
    /// The pending request survives a failed verification so the user can
    /// retry without requesting a new email.
    pub async fn submit_otp(&self, code: &str) -> Result<AuthStep> {
        let Some(auth_request_id) = self.store.get().pending_request().map(str::to_string) else {
            return Err(self.report(Error::InvalidState(
                "No pending login request. Please submit your email again.".to_string(),
            )));
        };

        let code = code.trim();
        if code.is_empty() {
            return Err(self.report(Error::InvalidInput("Code is required".to_string())));
        }

        let Some(_in_flight) = InFlightGuard::try_acquire(&self.request_in_flight) else {
            tracing::debug!("auth request already in flight; ignoring code submission");
            return Ok(AuthStep::Busy);
        };

        let token = match self.remote.verify_code(&auth_request_id, code).await {
            Ok(token) => token,
            Err(error) => {
                self.set_state(AuthState::AwaitingOtp);
                return Err(self.report(error));
            }
        };

        if let Err(error) = self.persist(move |store| store.set_token(&token)).await {
            self.set_state(AuthState::AwaitingOtp);
            return Err(self.report(error));
        }

        self.set_state(AuthState::Authenticated);
        self.login_open.store(false, Ordering::Release);
        self.presenter.dismiss(Prompt::Otp);
        self.presenter.notify("Login successful!");
        tracing::info!("login completed");
        Ok(AuthStep::Authenticated)
    }

    /// Close an open login flow and forget its pending request.
    pub fn abandon(&self) {
        if let Err(error) = self.store.clear_pending_auth_request() {
            tracing::warn!("Failed to clear pending auth request: {}", error);
        }
        self.presenter.dismiss(Prompt::Email);
        self.presenter.dismiss(Prompt::Otp);
        self.set_state(if self.store.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Idle
        });
        self.login_open.store(false, Ordering::Release);
    }

    /// Run a credential write on the blocking pool; it touches the settings file.
    async fn persist<F>(&self, write: F) -> Result<()>
    where
        F: FnOnce(&CredentialStore) -> Result<()> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || write(&store))
            .await
            .unwrap_or_else(|error| {
                Err(Error::InvalidState(format!(
                    "credential write did not finish: {error}"
                )))
            })
    }

    fn set_state(&self, state: AuthState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn report(&self, error: Error) -> Error {
        tracing::warn!("auth step failed: {}", error);
        self.presenter.notify(&error.to_string());
        error
    }
}
