use std::path::Path;
use std::sync::Arc;

use voxsync_core::auth::{AuthFlow, AuthState, CredentialStore, SettingsCredentialPersistence};
use voxsync_core::remote::HttpRemoteClient;

use crate::cli::AuthCommands;
use crate::error::CliError;
use crate::presenter::TerminalPresenter;
use crate::settings::load_effective_settings;

type CliAuthFlow = AuthFlow<HttpRemoteClient, TerminalPresenter>;

pub async fn run_auth(command: AuthCommands, settings_path: &Path) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { email } => {
            let flow = open_auth_flow(settings_path)?;
            flow.submit_email(&email)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            Ok(())
        }
        AuthCommands::Verify { code } => {
            let flow = open_auth_flow(settings_path)?;
            flow.submit_otp(&code)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            Ok(())
        }
        AuthCommands::Status => {
            let flow = open_auth_flow(settings_path)?;
            println!("{}", status_line(flow.state()));
            Ok(())
        }
    }
}

fn open_auth_flow(settings_path: &Path) -> Result<CliAuthFlow, CliError> {
    let settings = load_effective_settings(settings_path)?;
    let store = CredentialStore::open(SettingsCredentialPersistence::new(settings_path))?;
    let remote = HttpRemoteClient::from_settings(&settings)?;
    Ok(AuthFlow::new(
        Arc::new(store),
        Arc::new(remote),
        Arc::new(TerminalPresenter::default()),
    ))
}

pub fn status_line(state: AuthState) -> &'static str {
    match state {
        AuthState::Authenticated => "Logged in.",
        AuthState::AwaitingOtp => {
            "Waiting for the emailed code. Run `voxsync auth verify --code <code>`."
        }
        AuthState::Idle | AuthState::AwaitingEmail => "Not logged in.",
    }
}
