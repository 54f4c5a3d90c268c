//! Document store client and the save tracker.
//!
//! The store is a single file behind two unauthenticated endpoints: a plain
//! GET for the document and a full-body overwrite for saves. There is no
//! versioning, locking, or merge logic; last writer wins. Behavior under
//! concurrent writers from other processes is undefined.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};

pub const DEFAULT_SAVE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub document_url: String,
    pub save_url: String,
    pub timeout_ms: u64,
    /// When off, mutations stay local; only a forced save transmits.
    pub persist: bool,
}

#[derive(Clone)]
pub struct StoreClient {
    config: StoreConfig,
    http: Client,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("build http client")?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn fetch(&self) -> anyhow::Result<String> {
        let res = self
            .http
            .get(&self.config.document_url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .with_context(|| format!("fetch {}", self.config.document_url))?;
        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("document fetch failed: {status}");
        }
        res.text().context("read document body")
    }

    /// Transmits the full serialized document as the overwrite body. Never
    /// retried; the four outcomes map one-to-one onto what the endpoint and
    /// the transport can do.
    pub fn save(&self, body: String) -> SaveOutcome {
        let res = self
            .http
            .post(&self.config.save_url)
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(body)
            .send();
        match res {
            Ok(res) if res.status().is_success() => SaveOutcome::Saved,
            Ok(res) => {
                let status = res.status().as_u16();
                let body = res.text().unwrap_or_default();
                SaveOutcome::Rejected { status, body }
            }
            Err(e) if e.is_timeout() => SaveOutcome::TimedOut,
            Err(e) => SaveOutcome::TransportFailed {
                message: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved,
    Rejected { status: u16, body: String },
    TimedOut,
    TransportFailed { message: String },
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }

    pub fn code(&self) -> &'static str {
        match self {
            SaveOutcome::Saved => "saved",
            SaveOutcome::Rejected { .. } => "rejected",
            SaveOutcome::TimedOut => "timed_out",
            SaveOutcome::TransportFailed { .. } => "transport_failed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            SaveOutcome::Saved => "saved".to_string(),
            SaveOutcome::Rejected { status, body } => {
                if body.is_empty() {
                    format!("server rejected save: {status}")
                } else {
                    format!("server rejected save: {status}: {body}")
                }
            }
            SaveOutcome::TimedOut => "save timed out".to_string(),
            SaveOutcome::TransportFailed { message } => format!("save failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SavePhase {
    #[default]
    Idle,
    Saving,
    Succeeded,
    Failed,
}

impl SavePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SavePhase::Idle => "idle",
            SavePhase::Saving => "saving",
            SavePhase::Succeeded => "succeeded",
            SavePhase::Failed => "failed",
        }
    }
}

/// Observable save status. `submitted`/`settled` are sequence numbers; the
/// phase always describes the newest submission.
#[derive(Debug, Clone, Default)]
pub struct SaveStatus {
    pub phase: SavePhase,
    pub submitted: u64,
    pub settled: u64,
    pub last_outcome: Option<SaveOutcome>,
    pub last_attempt_at: Option<String>,
    pub last_settled_at: Option<String>,
}

/// Fire-and-forget save submission with an observable state machine:
/// idle -> saving -> succeeded | failed.
///
/// Nothing awaits an in-flight save before submitting the next one, so two
/// rapid edits race and the later overwrite wins on the wire regardless of
/// completion order. A completing older save never clobbers the status of a
/// newer one.
pub struct Saver {
    status: Arc<Mutex<SaveStatus>>,
    seq: u64,
    last_handle: Option<JoinHandle<()>>,
}

impl Saver {
    pub fn new() -> Self {
        Self {
            status: Arc::new(Mutex::new(SaveStatus::default())),
            seq: 0,
            last_handle: None,
        }
    }

    fn begin(&mut self) -> u64 {
        self.seq += 1;
        let seq = self.seq;
        if let Ok(mut st) = self.status.lock() {
            st.phase = SavePhase::Saving;
            st.submitted = seq;
            st.last_attempt_at = Some(Utc::now().to_rfc3339());
        }
        seq
    }

    pub fn submit(&mut self, client: &StoreClient, body: String) -> u64 {
        let seq = self.begin();
        let client = client.clone();
        let status = Arc::clone(&self.status);
        self.last_handle = Some(thread::spawn(move || {
            let outcome = client.save(body);
            settle_at(&status, seq, outcome);
        }));
        seq
    }

    /// Blocks until the newest submitted save settles.
    pub fn wait(&mut self) -> SaveStatus {
        if let Some(handle) = self.last_handle.take() {
            let _ = handle.join();
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> SaveStatus {
        self.status
            .lock()
            .map(|st| st.clone())
            .unwrap_or_default()
    }
}

fn settle_at(status: &Mutex<SaveStatus>, seq: u64, outcome: SaveOutcome) {
    let Ok(mut st) = status.lock() else {
        return;
    };
    // Stale completion: a newer save already settled.
    if seq <= st.settled {
        return;
    }
    st.settled = seq;
    st.last_settled_at = Some(Utc::now().to_rfc3339());
    if seq == st.submitted {
        st.phase = if outcome.is_success() {
            SavePhase::Succeeded
        } else {
            SavePhase::Failed
        };
    }
    st.last_outcome = Some(outcome);
}
