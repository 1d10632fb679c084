use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    pub external_id: String,
    pub thread_id: String,
    pub from: String,
    pub to: String,
    pub cc: String,
    pub subject: String,
    pub snippet: String,
    pub labels: Vec<String>,
    pub folder: String,
    pub is_read: bool,
    pub is_starred: bool,
    pub has_attachment: bool,
    pub received_at: DateTime<Utc>,
    /// Raw RFC headers relevant to classification (§6), keyed by header name.
    pub headers: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    pub external_id: String,
    pub filename: String,
    pub mime: String,
    pub size: i64,
    pub content_id: Option<String>,
    pub is_inline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub text: String,
    pub html: String,
    pub attachments: Vec<AttachmentDescriptor>,
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub folder: Option<String>,
    pub search: Option<String>,
    pub page_token: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct ListPage {
    pub messages: Vec<MessageSummary>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Initial,
    Watch,
    Incremental,
}

#[derive(Debug, Clone)]
pub struct IncrementalSyncResult {
    pub new_messages: Vec<MessageSummary>,
    pub deleted_ids: Vec<String>,
    pub next_sync_state: String,
    pub has_more: bool,
}

#[derive(Debug, Clone)]
pub struct UploadSession {
    pub session_id: String,
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
    pub chunk_size: u64,
    pub max_chunk_size: u64,
}

#[derive(Debug, Clone)]
pub struct UploadStatus {
    pub bytes_uploaded: u64,
    pub next_range_start: u64,
    pub is_complete: bool,
    pub attachment_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    MarkRead,
    MarkUnread,
    Star,
    Unstar,
    Archive,
    Trash,
    Restore,
    Delete,
}

/// Fixed header whitelist for the metadata-format batch fetch (§4.2): basic
/// headers plus classification and developer-service markers (§6).
pub const CLASSIFICATION_HEADER_WHITELIST: &[&str] = &[
    "From", "To", "Cc", "Bcc", "Subject", "Date", "Message-ID", "In-Reply-To", "References",
    "Content-Type", "List-Unsubscribe", "List-Unsubscribe-Post", "List-Id", "Precedence",
    "Auto-Submitted", "X-Auto-Response-Suppress", "X-Mailer", "Feedback-ID",
    "X-MC-User", "X-SG-EID", "X-SES-Outgoing", "X-Mailgun-Variables", "X-PM-Message-Id",
    "X-Campaign-ID", "X-GitHub-Reason", "X-GitHub-Severity", "X-GitHub-Sender",
    "X-GitLab-Project", "X-GitLab-Pipeline-Id", "X-GitLab-NotificationReason",
    "X-JIRA-FingerPrint", "X-Atlassian-Token", "X-Linear-Team", "X-Linear-Project",
    "X-Sentry-Project", "X-Vercel-Deployment-Url", "X-AWS-Service",
];
