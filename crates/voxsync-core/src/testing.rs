//! Test doubles for the remote service and the presenter.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::models::Upload;
use crate::presenter::{Presenter, Prompt};
use crate::remote::RemoteService;

pub fn upload(id: &str, label: Option<&str>, transcription: &str, url: &str) -> Upload {
    Upload {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        label: label.map(str::to_string),
        url: url.to_string(),
        transcription: transcription.to_string(),
        created_at: None,
    }
}

#[derive(Default)]
pub struct FakeRemote {
    login_responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    login_emails: Mutex<Vec<String>>,
    login_gate: Mutex<Option<Arc<Notify>>>,
    login_entered: Notify,
    verify_responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    verify_calls: Mutex<Vec<(String, String)>>,
    upload_responses: Mutex<VecDeque<std::result::Result<Vec<Upload>, String>>>,
    list_calls: AtomicUsize,
    list_gate: Mutex<Option<Arc<Notify>>>,
    list_entered: Notify,
    ack_failures: Mutex<HashSet<String>>,
    ack_attempts: Mutex<Vec<String>>,
    acked: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn push_login(&self, response: std::result::Result<&str, &str>) {
        self.login_responses
            .lock()
            .unwrap()
            .push_back(response.map(str::to_string).map_err(str::to_string));
    }

    pub fn push_verify(&self, response: std::result::Result<&str, &str>) {
        self.verify_responses
            .lock()
            .unwrap()
            .push_back(response.map(str::to_string).map_err(str::to_string));
    }

    pub fn push_uploads(&self, uploads: Vec<Upload>) {
        self.upload_responses.lock().unwrap().push_back(Ok(uploads));
    }

    pub fn push_uploads_error(&self, message: &str) {
        self.upload_responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn fail_ack(&self, upload_id: &str) {
        self.ack_failures
            .lock()
            .unwrap()
            .insert(upload_id.to_string());
    }

    /// Hold every `login` call until the returned notify fires.
    pub fn gate_login(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.login_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Hold every `list_uploads` call until the returned notify fires.
    pub fn gate_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub async fn wait_for_login_call(&self) {
        self.login_entered.notified().await;
    }

    pub async fn wait_for_list_call(&self) {
        self.list_entered.notified().await;
    }

    pub fn login_emails(&self) -> Vec<String> {
        self.login_emails.lock().unwrap().clone()
    }

    pub fn verify_calls(&self) -> Vec<(String, String)> {
        self.verify_calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn ack_attempts(&self) -> Vec<String> {
        self.ack_attempts.lock().unwrap().clone()
    }

    pub fn acked(&self) -> Vec<String> {
        self.acked.lock().unwrap().clone()
    }
}

impl RemoteService for FakeRemote {
    async fn login(&self, email: &str) -> Result<String> {
        self.login_emails.lock().unwrap().push(email.to_string());
        self.login_entered.notify_one();
        let gate = self.login_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let response = self.login_responses.lock().unwrap().pop_front();
        response
            .unwrap_or_else(|| Err("no login response queued".to_string()))
            .map_err(Error::Application)
    }

    async fn verify_code(&self, auth_request_id: &str, code: &str) -> Result<String> {
        self.verify_calls
            .lock()
            .unwrap()
            .push((auth_request_id.to_string(), code.to_string()));
        let response = self.verify_responses.lock().unwrap().pop_front();
        response
            .unwrap_or_else(|| Err("no verify response queued".to_string()))
            .map_err(Error::Application)
    }

    async fn list_uploads(&self, _token: &str) -> Result<Vec<Upload>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_entered.notify_one();
        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let response = self.upload_responses.lock().unwrap().pop_front();
        response
            .unwrap_or_else(|| Ok(Vec::new()))
            .map_err(Error::Application)
    }

    async fn acknowledge(&self, _token: &str, upload_id: &str) -> Result<()> {
        self.ack_attempts
            .lock()
            .unwrap()
            .push(upload_id.to_string());
        if self.ack_failures.lock().unwrap().contains(upload_id) {
            return Err(Error::Application(format!("ack rejected for {upload_id}")));
        }
        self.acked.lock().unwrap().push(upload_id.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    ShowEmail,
    ShowOtp,
    Dismiss(Prompt),
    Notify(String),
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &PresenterEvent) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|recorded| *recorded == event)
            .count()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::Notify(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: PresenterEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn show_email_prompt(&self) {
        self.record(PresenterEvent::ShowEmail);
    }

    fn show_otp_prompt(&self) {
        self.record(PresenterEvent::ShowOtp);
    }

    fn dismiss(&self, prompt: Prompt) {
        self.record(PresenterEvent::Dismiss(prompt));
    }

    fn notify(&self, message: &str) {
        self.record(PresenterEvent::Notify(message.to_string()));
    }
}
