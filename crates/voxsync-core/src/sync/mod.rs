//! Upload synchronization: engine, scheduler, ledger and note materializer.

mod engine;
mod ledger;
mod materializer;
mod scheduler;

pub use engine::{CycleOutcome, SyncEngine, SyncOptions, SyncReport};
pub use ledger::{AckLedger, LedgerWrite, DEFAULT_LEDGER_CAPACITY};
pub use materializer::{
    append_sections, combined_section_for, disambiguated_note_name, note_body_for,
    note_name_for, sanitize_note_name, NoteMaterializer,
};
pub use scheduler::{SchedulerMessage, SyncScheduler};
