use async_trait::async_trait;

/// Typed handler dispatched to by topic. Handler errors are always retriable
/// unless the reaper escalates them past `MaxRetries` (§4.1) — there is no
/// in-band exception taxonomy here, matching the source's "errors surface,
/// the consumer decides fate" design.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, payload: &str) -> anyhow::Result<()>;
}
