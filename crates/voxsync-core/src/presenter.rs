//! Presentation seam between the core and its host.
//!
//! The core asks the host to show or dismiss the email and code prompts and
//! to surface notices. The host answers a prompt by calling
//! [`AuthFlow::submit_email`](crate::auth::AuthFlow::submit_email) or
//! [`AuthFlow::submit_otp`](crate::auth::AuthFlow::submit_otp).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prompt {
    Email,
    Otp,
}

pub trait Presenter: Send + Sync + 'static {
    fn show_email_prompt(&self);
    fn show_otp_prompt(&self);
    fn dismiss(&self, prompt: Prompt);
    /// Surface a single human-readable message.
    fn notify(&self, message: &str);
}

/// Headless presenter that routes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn show_email_prompt(&self) {
        tracing::info!("Login required: submit an email address to receive a code");
    }

    fn show_otp_prompt(&self) {
        tracing::info!("Enter the code sent to your email");
    }

    fn dismiss(&self, prompt: Prompt) {
        tracing::debug!(?prompt, "prompt dismissed");
    }

    fn notify(&self, message: &str) {
        tracing::info!("{message}");
    }
}
