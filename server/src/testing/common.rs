//! In-memory test harness. Grounded on the teacher's `testing/common.rs` /
//! `tests/common/mod.rs` `setup()` helper, generalized from "connect to the
//! real Postgres/Gmail services" to "build fakes for the collaborators
//! classification and job-handler tests actually exercise" — no live
//! Postgres, Redis, Neo4j, or Mistral endpoint required.
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

use crate::classify::{
    auto_label::EmbeddingLookup,
    llm::LlmClassifier,
    semantic_cache::{SemanticCacheEntry, SemanticCacheStore},
    ClassificationResult, RuleUsageSink,
};
use crate::error::{ProviderError, ProviderErrorKind};
use crate::provider::{
    CircuitBreaker, ListPage, ListQuery, MailProvider, MessageBody, MutationKind, UploadSession, UploadStatus,
};
use crate::realtime::{RealtimeBus, SharedRealtimeBus};
use crate::stream::memory_backend::InMemoryStreamBackend;
use crate::stream::StreamBackend;

/// An empty mock connection: every query against it returns zero rows unless
/// the caller primes it with `sea_orm::MockDatabase::append_query_results`
/// before building the `ServerState`/`Pipeline` under test.
pub fn mock_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

pub fn in_memory_stream() -> std::sync::Arc<dyn StreamBackend> {
    std::sync::Arc::new(InMemoryStreamBackend::new())
}

pub fn realtime_bus() -> SharedRealtimeBus {
    std::sync::Arc::new(RealtimeBus::new())
}

/// Records every rule hit instead of writing to a database.
#[derive(Default)]
pub struct FakeRuleUsageSink {
    pub hits: Mutex<Vec<i32>>,
}

#[async_trait]
impl RuleUsageSink for FakeRuleUsageSink {
    async fn increment_rule_hit(&self, rule_id: i32) {
        self.hits.lock().unwrap().push(rule_id);
    }
}

/// A mailbox with canned contents instead of a live Gmail/Graph connection.
/// `bodies` is keyed by `external_id`; `sync_page` is returned verbatim by
/// `sync_initial`/`sync_incremental`.
#[derive(Default)]
pub struct FakeMailProvider {
    pub bodies: Mutex<HashMap<String, MessageBody>>,
    pub sync_page: Mutex<ListPage>,
    breaker: CircuitBreaker,
}

impl FakeMailProvider {
    pub fn new() -> Self {
        Self { bodies: Mutex::new(HashMap::new()), sync_page: Mutex::new(ListPage { messages: vec![], next_page_token: None }), breaker: CircuitBreaker::new() }
    }
}

#[async_trait]
impl MailProvider for FakeMailProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<(String, chrono::DateTime<chrono::Utc>), ProviderError> {
        Ok(("fake-token".into(), chrono::Utc::now() + chrono::Duration::hours(1)))
    }

    async fn validate_token(&self, _access_token: &str) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn sync_initial(
        &self,
        _access_token: &str,
        _start_date: Option<chrono::DateTime<chrono::Utc>>,
        _label_filter: Option<&str>,
    ) -> Result<ListPage, ProviderError> {
        Ok(self.sync_page.lock().unwrap().clone())
    }

    async fn sync_incremental(&self, _access_token: &str, sync_state: &str) -> Result<crate::provider::IncrementalSyncResult, ProviderError> {
        let page = self.sync_page.lock().unwrap().clone();
        Ok(crate::provider::IncrementalSyncResult {
            new_messages: page.messages,
            deleted_ids: vec![],
            next_sync_state: sync_state.to_string(),
            has_more: false,
        })
    }

    async fn watch_start(&self, _access_token: &str) -> Result<String, ProviderError> {
        Ok("fake-watch".into())
    }

    async fn watch_stop(&self, _access_token: &str, _watch_id: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn get_message(&self, _access_token: &str, external_id: &str) -> Result<MessageBody, ProviderError> {
        self.bodies
            .lock()
            .unwrap()
            .get(external_id)
            .cloned()
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::NotFound, "no fake body for this id"))
    }

    async fn get_messages_batch(&self, _access_token: &str, external_ids: &[String], _full_format: bool) -> Vec<crate::provider::MessageSummary> {
        let page = self.sync_page.lock().unwrap();
        page.messages.iter().filter(|m| external_ids.contains(&m.external_id)).cloned().collect()
    }

    async fn ids_with_attachments(&self, _access_token: &str, candidate_ids: &[String]) -> Result<HashSet<String>, ProviderError> {
        Ok(candidate_ids.iter().cloned().collect())
    }

    async fn list_messages(&self, _access_token: &str, _query: &ListQuery) -> Result<ListPage, ProviderError> {
        Ok(self.sync_page.lock().unwrap().clone())
    }

    async fn send_message(&self, _access_token: &str, _raw_rfc822: &str) -> Result<String, ProviderError> {
        Ok("fake-sent-id".into())
    }

    async fn create_draft(&self, _access_token: &str, _raw_rfc822: &str) -> Result<String, ProviderError> {
        Ok("fake-draft-id".into())
    }

    async fn modify_message(&self, _access_token: &str, _external_id: &str, _mutation: MutationKind) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn batch_modify(&self, _access_token: &str, _external_ids: &[String], _mutation: MutationKind) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn add_label(&self, _access_token: &str, _external_id: &str, _label: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn remove_label(&self, _access_token: &str, _external_id: &str, _label: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn list_labels(&self, _access_token: &str) -> Result<Vec<String>, ProviderError> {
        Ok(vec![])
    }

    async fn get_attachment_bytes(&self, _access_token: &str, _message_id: &str, _attachment_id: &str) -> Result<Vec<u8>, ProviderError> {
        Ok(vec![])
    }

    async fn create_upload_session(&self, _access_token: &str, filename: &str, total_size: u64) -> Result<UploadSession, ProviderError> {
        Ok(UploadSession {
            session_id: "fake-session".into(),
            upload_url: format!("https://fake.invalid/upload/{filename}"),
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
            chunk_size: total_size.max(1),
            max_chunk_size: total_size.max(1),
        })
    }

    async fn upload_status(&self, _access_token: &str, _session: &UploadSession) -> Result<UploadStatus, ProviderError> {
        Ok(UploadStatus { bytes_uploaded: 0, next_range_start: 0, is_complete: true, attachment_id: Some("fake-attachment".into()) })
    }

    async fn cancel_upload(&self, _access_token: &str, _session: &UploadSession) -> Result<(), ProviderError> {
        Ok(())
    }

    fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

/// A semantic cache that never has candidates and discards writes — enough
/// for tests that only need stage 3 to be a clean no-op.
#[derive(Default)]
pub struct FakeSemanticCacheStore {
    pub entries: Mutex<Vec<SemanticCacheEntry>>,
    pub written: Mutex<Vec<ClassificationResult>>,
}

#[async_trait]
impl SemanticCacheStore for FakeSemanticCacheStore {
    async fn query_similar(&self, _user_id: i32, _embedding: &[f32], _min_similarity: f64, top_k: usize) -> anyhow::Result<Vec<SemanticCacheEntry>> {
        let mut entries = self.entries.lock().unwrap().clone();
        entries.truncate(top_k);
        Ok(entries)
    }

    async fn increment_usage(&self, _entry_id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn has_near_duplicate(&self, _user_id: i32, _embedding: &[f32], _min_similarity: f64) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn write_entry(&self, _user_id: i32, _embedding: &[f32], result: &ClassificationResult) -> anyhow::Result<()> {
        self.written.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Looks embeddings up from an in-memory map instead of the personalization
/// graph.
#[derive(Default)]
pub struct FakeEmbeddingLookup {
    pub embeddings: HashMap<String, Vec<f32>>,
}

#[async_trait]
impl EmbeddingLookup for FakeEmbeddingLookup {
    async fn get_embedding(&self, ref_id: &str) -> anyhow::Result<Option<Vec<f32>>> {
        Ok(self.embeddings.get(ref_id).cloned())
    }
}

/// Returns a fixed JSON answer string instead of calling Mistral.
pub struct FakeLlmClassifier {
    pub answer: String,
}

impl FakeLlmClassifier {
    pub fn new(answer: impl Into<String>) -> Self {
        Self { answer: answer.into() }
    }
}

#[async_trait]
impl LlmClassifier for FakeLlmClassifier {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> anyhow::Result<String> {
        Ok(self.answer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_mail_provider_returns_primed_sync_page() {
        let provider = FakeMailProvider::new();
        *provider.sync_page.lock().unwrap() = ListPage {
            messages: vec![crate::provider::MessageSummary {
                external_id: "1".into(),
                thread_id: "t1".into(),
                from: "a@example.com".into(),
                to: "b@example.com".into(),
                cc: String::new(),
                subject: "hi".into(),
                snippet: String::new(),
                labels: vec![],
                folder: "inbox".into(),
                is_read: false,
                is_starred: false,
                has_attachment: false,
                received_at: chrono::Utc::now(),
                headers: HashMap::new(),
            }],
            next_page_token: None,
        };
        let page = provider.sync_initial("token", None, None).await.unwrap();
        assert_eq!(page.messages.len(), 1);
    }

    #[tokio::test]
    async fn fake_semantic_cache_store_records_writes() {
        let store = FakeSemanticCacheStore::default();
        let result = ClassificationResult {
            category: "work".into(),
            sub_category: None,
            priority: 0.5,
            labels: vec![],
            score: 0.9,
            stage: "llm".into(),
            source: "test".into(),
            signals: vec![],
            llm_used: true,
            processing_time_ms: 0,
        };
        store.write_entry(1, &[0.1, 0.2], &result).await.unwrap();
        assert_eq!(store.written.lock().unwrap().len(), 1);
    }
}
