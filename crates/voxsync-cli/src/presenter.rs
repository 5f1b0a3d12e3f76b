use tokio::sync::mpsc;
use voxsync_core::presenter::{Presenter, Prompt};

/// Prints notices to the terminal.
///
/// One-shot commands print instructions for the next command to run.
/// Interactive mode forwards prompts to the input loop instead.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    prompts: Option<mpsc::UnboundedSender<Prompt>>,
}

impl TerminalPresenter {
    pub fn interactive() -> (Self, mpsc::UnboundedReceiver<Prompt>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { prompts: Some(tx) }, rx)
    }

    fn forward(&self, prompt: Prompt) -> bool {
        self.prompts
            .as_ref()
            .is_some_and(|prompts| prompts.send(prompt).is_ok())
    }
}

impl Presenter for TerminalPresenter {
    fn show_email_prompt(&self) {
        if !self.forward(Prompt::Email) {
            println!("Not logged in. Run `voxsync auth login --email <email>`.");
        }
    }

    fn show_otp_prompt(&self) {
        if !self.forward(Prompt::Otp) {
            println!("Check your email, then run `voxsync auth verify --code <code>`.");
        }
    }

    fn dismiss(&self, prompt: Prompt) {
        tracing::debug!(?prompt, "prompt closed");
    }

    fn notify(&self, message: &str) {
        println!("{message}");
    }
}
