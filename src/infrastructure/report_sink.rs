//! Report delivery
//!
//! Mail transport is not part of this crate. The outbox sink writes each
//! composed message as a file for an external mailer to pick up.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::info;

use crate::infrastructure::config::MailConfig;

/// A composed report ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub body: String,
    /// Chart image to attach, when one exists
    pub attachment: Option<PathBuf>,
}

/// Destination for composed reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, report: &Report) -> Result<()>;
}

/// Writes reports as message files into an outbox directory
pub struct OutboxReportSink {
    outbox_dir: PathBuf,
    mail: MailConfig,
    /// Keeps file names distinct within one timestamp tick
    sequence: AtomicU64,
}

impl OutboxReportSink {
    pub fn new(outbox_dir: impl Into<PathBuf>, mail: MailConfig) -> Self {
        Self {
            outbox_dir: outbox_dir.into(),
            mail,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn outbox_dir(&self) -> &Path {
        &self.outbox_dir
    }

    /// Message text: headers, a blank line, then the body
    pub fn render(&self, report: &Report) -> String {
        let mut message = format!(
            "From: {}\nTo: {}\nBcc: {}\nSubject: {}\nDate: {}\n",
            self.mail.sender,
            self.mail.receiver,
            self.mail.receiver,
            report.subject,
            Utc::now().to_rfc2822()
        );
        if let Some(attachment) = &report.attachment {
            message.push_str(&format!("X-Attachment: {}\n", attachment.display()));
        }
        message.push('\n');
        message.push_str(&report.body);
        if !report.body.ends_with('\n') {
            message.push('\n');
        }
        message
    }

    /// Write the report and return the file it landed in
    pub async fn write(&self, report: &Report) -> Result<PathBuf> {
        fs::create_dir_all(&self.outbox_dir)
            .await
            .with_context(|| format!("Failed to create outbox directory {:?}", self.outbox_dir))?;

        let file_name = format!(
            "report-{}-{}.txt",
            Utc::now().format("%Y%m%dT%H%M%S%.6f"),
            self.sequence.fetch_add(1, Ordering::Relaxed)
        );
        let path = self.outbox_dir.join(file_name);
        fs::write(&path, self.render(report))
            .await
            .with_context(|| format!("Failed to write report {:?}", path))?;

        info!("Report '{}' written to {:?}", report.subject, path);
        Ok(path)
    }
}

#[async_trait]
impl ReportSink for OutboxReportSink {
    async fn deliver(&self, report: &Report) -> Result<()> {
        self.write(report).await.map(|_| ())
    }
}
