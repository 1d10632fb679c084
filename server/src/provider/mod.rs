pub mod circuit_breaker;
pub mod gmail;
pub mod graph;
pub mod types;

use async_trait::async_trait;

use crate::error::ProviderError;

pub use circuit_breaker::CircuitBreaker;
pub use types::*;

/// Uniform capability set (§4.2, §9): consumers depend on this trait, not on
/// a concrete adapter, per the "interface-based polymorphism" REDESIGN FLAG.
/// Provider-specific extensions (e.g. Graph delta tokens vs. Gmail history
/// ids) stay behind the opaque `String` sync-state parameters rather than
/// leaking provider types into the signature.
#[async_trait]
pub trait MailProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn refresh_token(&self, refresh_token: &str) -> Result<(String, chrono::DateTime<chrono::Utc>), ProviderError>;

    async fn validate_token(&self, access_token: &str) -> Result<bool, ProviderError>;

    async fn sync_initial(
        &self,
        access_token: &str,
        start_date: Option<chrono::DateTime<chrono::Utc>>,
        label_filter: Option<&str>,
    ) -> Result<ListPage, ProviderError>;

    async fn sync_incremental(
        &self,
        access_token: &str,
        sync_state: &str,
    ) -> Result<IncrementalSyncResult, ProviderError>;

    async fn watch_start(&self, access_token: &str) -> Result<String, ProviderError>;

    async fn watch_stop(&self, access_token: &str, watch_id: &str) -> Result<(), ProviderError>;

    async fn get_message(&self, access_token: &str, external_id: &str) -> Result<MessageBody, ProviderError>;

    /// Parallel batch fetch (§4.2 algorithm): width 10, 15s metadata-format /
    /// 30s full-format per-message timeout. Failed fetches are dropped;
    /// results keep insertion order.
    async fn get_messages_batch(
        &self,
        access_token: &str,
        external_ids: &[String],
        full_format: bool,
    ) -> Vec<MessageSummary>;

    /// Provider-accurate attachment presence via `has:attachment` query,
    /// capped at 2000 ids for safety.
    async fn ids_with_attachments(
        &self,
        access_token: &str,
        candidate_ids: &[String],
    ) -> Result<std::collections::HashSet<String>, ProviderError>;

    async fn list_messages(&self, access_token: &str, query: &ListQuery) -> Result<ListPage, ProviderError>;

    async fn send_message(&self, access_token: &str, raw_rfc822: &str) -> Result<String, ProviderError>;

    async fn create_draft(&self, access_token: &str, raw_rfc822: &str) -> Result<String, ProviderError>;

    async fn modify_message(
        &self,
        access_token: &str,
        external_id: &str,
        mutation: MutationKind,
    ) -> Result<(), ProviderError>;

    async fn batch_modify(
        &self,
        access_token: &str,
        external_ids: &[String],
        mutation: MutationKind,
    ) -> Result<(), ProviderError>;

    async fn add_label(&self, access_token: &str, external_id: &str, label: &str) -> Result<(), ProviderError>;

    async fn remove_label(&self, access_token: &str, external_id: &str, label: &str) -> Result<(), ProviderError>;

    async fn list_labels(&self, access_token: &str) -> Result<Vec<String>, ProviderError>;

    async fn get_attachment_bytes(
        &self,
        access_token: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, ProviderError>;

    async fn create_upload_session(
        &self,
        access_token: &str,
        filename: &str,
        total_size: u64,
    ) -> Result<UploadSession, ProviderError>;

    async fn upload_status(&self, access_token: &str, session: &UploadSession) -> Result<UploadStatus, ProviderError>;

    /// Idempotent: a 404 on cancel is success (§4.2).
    async fn cancel_upload(&self, access_token: &str, session: &UploadSession) -> Result<(), ProviderError>;

    fn breaker(&self) -> &CircuitBreaker;
}
