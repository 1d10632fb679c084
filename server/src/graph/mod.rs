//! Personalization graph (§4.7): per-user style, contact relationships, and
//! classification-pattern memory, stored in Neo4j via `neo4rs`. Node kinds:
//! user, contact, trait, writing-style, tone preference, frequent phrase,
//! signature, topic expertise, classification pattern, communication
//! pattern. All relationships are outbound from the user node.
pub mod contacts;
pub mod patterns;
pub mod personalization;

use neo4rs::Graph;

use crate::config::GraphConfig;

#[derive(Clone)]
pub struct GraphStore {
    pub(crate) graph: Graph,
}

impl GraphStore {
    pub async fn connect(cfg: &GraphConfig) -> Result<Self, neo4rs::Error> {
        let graph = Graph::new(&cfg.uri, &cfg.user, &cfg.password).await?;
        Ok(Self { graph })
    }

    /// Ensures the vector index on classification-pattern embeddings exists.
    /// Idempotent; safe to call on every startup.
    pub async fn ensure_indexes(&self, embedding_dim: usize) -> Result<(), neo4rs::Error> {
        let stmt = format!(
            "CREATE VECTOR INDEX classification_pattern_embedding IF NOT EXISTS \
             FOR (p:ClassificationPattern) ON p.embedding \
             OPTIONS {{indexConfig: {{`vector.dimensions`: {embedding_dim}, `vector.similarity_function`: 'cosine'}}}}"
        );
        self.graph.run(neo4rs::query(&stmt)).await
    }
}
