//! Fire-and-forget error reporting.
//!
//! Reports go onto a bounded queue drained by a single background task that
//! POSTs them as JSON to the configured endpoint. Callers never wait on
//! delivery and never see its failures.
//!
//! Config env vars:
//!   ERROR_REPORT_URL              = https://errors.example.com/api/report
//!   ERROR_REPORT_SECRET           = optional HMAC-SHA256 signing key
//!   ERROR_REPORT_FLUSH_TIMEOUT_MS = 2000 (default)

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TelemetryConfig;
use crate::models::log::LogStatus;

const QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Fatal,
}

/// A structured error report.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub level: Level,
    pub message: String,
    pub tags: BTreeMap<String, String>,
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// ISO-8601 timestamp of when the error occurred.
    pub timestamp: String,
    pub environment: Option<String>,
    pub release: Option<String>,
}

impl ErrorReport {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            tags: BTreeMap::new(),
            extra: serde_json::Map::new(),
            timestamp: Utc::now().to_rfc3339(),
            environment: None,
            release: None,
        }
    }

    pub fn with_tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.tags.insert(key.to_string(), value.into());
        self
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Report for a bot log entry. Only `Error` and `Critical` entries
    /// produce one; `Critical` maps to `fatal`.
    pub fn bot_log(
        bot_id: Uuid,
        project_code: &str,
        bot_name: &str,
        status: LogStatus,
        msg: &str,
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        let level = match status {
            LogStatus::Error => Level::Error,
            LogStatus::Critical => Level::Fatal,
            _ => return None,
        };

        let mut report = ErrorReport::error(msg)
            .with_tag("project_code", project_code)
            .with_tag("bot_id", bot_id.to_string())
            .with_tag("bot_name", bot_name)
            .with_extra("log_status", status.as_str())
            .with_extra("created_at", created_at.to_rfc3339());
        report.level = level;
        Some(report)
    }
}

// ── HMAC Signing ─────────────────────────────────────────────

/// Returns `sha256=<lowercase hex>` of the HMAC-SHA256 of `payload`.
fn sign(secret: &str, payload: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid signing key: {}", e))?;
    mac.update(payload);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

// ── Reporter ─────────────────────────────────────────────────

struct Endpoint {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
}

impl Endpoint {
    /// Deliver one report. Retries once after 1s.
    async fn deliver(&self, report: &ErrorReport) -> Result<()> {
        let payload = serde_json::to_vec(report)?;
        let report_id = Uuid::new_v4().to_string();
        let signature = self.secret.as_deref().map(|s| sign(s, &payload)).transpose()?;

        let backoff_secs: &[u64] = &[0, 1];
        for (attempt, &delay) in backoff_secs.iter().enumerate() {
            if delay > 0 {
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }

            let mut req = self
                .client
                .post(&self.url)
                .header("content-type", "application/json")
                .header("x-report-id", &report_id);
            if let Some(ref sig) = signature {
                req = req.header("x-report-signature", sig.as_str());
            }

            match req.body(payload.clone()).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!(report_id = %report_id, attempt, "error report delivered");
                    return Ok(());
                }
                Ok(resp) => {
                    warn!(report_id = %report_id, attempt, status = %resp.status(), "error report rejected");
                }
                Err(e) => {
                    warn!(report_id = %report_id, attempt, error = %e, "error report request failed");
                }
            }
        }

        Err(anyhow::anyhow!("error report {} not delivered", report_id))
    }
}

struct Inner {
    tx: mpsc::Sender<ErrorReport>,
    stop: Arc<Notify>,
    worker: Mutex<Option<JoinHandle<()>>>,
    environment: String,
    release: Option<String>,
}

/// Handle to the reporting queue. Cheap to clone; a disabled reporter
/// silently discards reports.
#[derive(Clone)]
pub struct ErrorReporter {
    inner: Option<Arc<Inner>>,
}

impl ErrorReporter {
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Spawns the delivery task, so it must be called inside a tokio runtime.
    pub fn from_config(cfg: &TelemetryConfig) -> Result<Self> {
        let Some(url) = cfg.report_url.clone() else {
            info!("ERROR_REPORT_URL not set, error reporting disabled");
            return Ok(Self::disabled());
        };

        let endpoint = Endpoint {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .user_agent("logging-api-reporter/1.0")
                .build()?,
            url,
            secret: cfg.signing_secret.clone(),
        };

        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let stop = Arc::new(Notify::new());
        let worker = tokio::spawn(run_worker(endpoint, rx, stop.clone()));

        info!(environment = %cfg.environment, "error reporting enabled");
        Ok(Self {
            inner: Some(Arc::new(Inner {
                tx,
                stop,
                worker: Mutex::new(Some(worker)),
                environment: cfg.environment.clone(),
                release: cfg.release.clone(),
            })),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Queue a report. Never blocks; a full or closed queue drops it.
    pub fn report(&self, mut report: ErrorReport) {
        let Some(inner) = &self.inner else {
            debug!(report = %report.message, "error reporting disabled, dropping report");
            return;
        };

        if report.environment.is_none() {
            report.environment = Some(inner.environment.clone());
        }
        if report.release.is_none() {
            report.release = inner.release.clone();
        }

        match inner.tx.try_send(report) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("error report queue full, dropping report");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("error reporter shut down, dropping report");
            }
        }
    }

    /// Stop accepting reports and drain the queue, waiting at most `timeout`.
    pub async fn shutdown(&self, timeout: Duration) {
        let Some(inner) = &self.inner else { return };
        let Some(mut worker) = inner.worker.lock().await.take() else { return };

        inner.stop.notify_one();
        if tokio::time::timeout(timeout, &mut worker).await.is_err() {
            worker.abort();
            warn!(?timeout, "error report flush timed out, pending reports dropped");
        }
    }
}

async fn run_worker(endpoint: Endpoint, mut rx: mpsc::Receiver<ErrorReport>, stop: Arc<Notify>) {
    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(report) => {
                    if let Err(e) = endpoint.deliver(&report).await {
                        warn!(error = %e, "error report dropped");
                    }
                }
                None => return,
            },
            _ = stop.notified() => break,
        }
    }

    rx.close();
    while let Some(report) = rx.recv().await {
        if let Err(e) = endpoint.deliver(&report).await {
            warn!(error = %e, "error report dropped during flush");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────
