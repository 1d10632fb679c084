#![allow(dead_code)]
mod cache;
mod classify;
mod config;
mod error;
mod graph;
mod job;
mod provider;
mod realtime;
mod request_tracing;
mod routes;
mod stream;
#[cfg(test)]
mod testing;
mod unified_list;

use std::{env, net::SocketAddr, sync::Arc};

use axum::{extract::FromRef, Router};
use entity::connection;
use mimalloc::MiMalloc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait};
use tokio::{signal, sync::watch};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache::CacheCore;
use classify::{auto_label::EmbeddingLookup, llm::LlmClassifier, SemanticCacheStore};
use config::cfg;
use graph::GraphStore;
use job::{
    handlers::{ClassifyHandler, MailModifyHandler, MailSyncHandler},
    JobConsumer,
};
use realtime::{RealtimeBus, SharedRealtimeBus};
use routes::AppRouter;
use stream::{memory_backend::InMemoryStreamBackend, redis_backend::RedisStreamBackend, topics, StreamBackend};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub type HttpClient = reqwest::Client;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub http_client: HttpClient,
    pub conn: DatabaseConnection,
    pub cache: Arc<CacheCore>,
    pub graph: Arc<GraphStore>,
    pub stream: Arc<dyn StreamBackend>,
    pub realtime: SharedRealtimeBus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env::set_var("RUST_LOG", env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_env("RUST_LOG"))
        .with(tracing_subscriber::fmt::Layer::default().with_ansi(false))
        .init();

    println!("{}", *cfg);

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL is not set in .env file");
    let mut db_options = ConnectOptions::new(db_url);
    db_options.sqlx_logging(false);
    let conn = Database::connect(db_options).await.expect("database connection failed");

    let http_client = reqwest::ClientBuilder::new().build()?;

    let graph = Arc::new(GraphStore::connect(&cfg.graph).await.expect("neo4j connection failed"));
    graph.ensure_indexes(cfg.classification.embedding_dim).await.expect("failed to ensure graph indexes");

    let cache = Arc::new(CacheCore::new(conn.clone()));

    let stream: Arc<dyn StreamBackend> = if cfg.stream.redis_url.is_empty() {
        tracing::warn!("stream.redis_url is empty, falling back to the in-process memory backend");
        Arc::new(InMemoryStreamBackend::new())
    } else {
        Arc::new(RedisStreamBackend::new(&cfg.stream.redis_url).expect("failed to build redis stream backend"))
    };

    let realtime: SharedRealtimeBus = Arc::new(RealtimeBus::new());

    let state = ServerState {
        http_client: http_client.clone(),
        conn: conn.clone(),
        cache,
        graph: graph.clone(),
        stream: stream.clone(),
        realtime: realtime.clone(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let consumer = Arc::new(build_consumer(stream.clone(), conn.clone(), http_client.clone(), graph.clone(), realtime.clone()));
    consumer.ensure_groups().await.expect("failed to ensure consumer groups");
    let consumer_handle = tokio::spawn(consumer.run(shutdown_rx.clone()));

    let scheduler = build_scheduler(stream.clone(), conn.clone()).await.expect("failed to build cron scheduler");
    scheduler.start().await.expect("failed to start cron scheduler");

    let router = AppRouter::create(state);

    let shutdown_signal = {
        let shutdown_tx = shutdown_tx.clone();
        async move {
            signal::ctrl_c().await.expect("failed to listen for ctrl_c");
            tracing::info!("received ctrl_c, shutting down");
            let _ = shutdown_tx.send(true);
        }
    };

    let port = env::var("PORT").unwrap_or_else(|_| "5006".to_string());
    let addr = SocketAddr::from(([0, 0, 0, 0], port.parse::<u16>().expect("PORT must be a valid u16")));
    tracing::info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal).await?;

    let _ = consumer_handle.await;
    Ok(())
}

fn build_consumer(
    stream: Arc<dyn StreamBackend>,
    conn: DatabaseConnection,
    http: reqwest::Client,
    graph: Arc<GraphStore>,
    realtime: SharedRealtimeBus,
) -> JobConsumer {
    let mut consumer = JobConsumer::new(stream.clone(), consumer_name());

    let semantic_cache: Arc<dyn SemanticCacheStore> = graph.clone();
    let embeddings: Arc<dyn EmbeddingLookup> = graph.clone();
    let llm: Arc<dyn LlmClassifier> = Arc::new(classify::llm::MistralClassifier::new(http.clone()));

    consumer.register(
        topics::AI_CLASSIFY,
        Arc::new(ClassifyHandler { db: conn.clone(), semantic_cache, embeddings, llm, realtime: realtime.clone() }),
    );
    consumer.register(topics::MAIL_SYNC, Arc::new(MailSyncHandler { db: conn.clone(), http: http.clone(), stream, realtime }));
    consumer.register(topics::MAIL_MODIFY, Arc::new(MailModifyHandler { db: conn, http }));

    consumer
}

fn consumer_name() -> String {
    format!("worker-{}", uuid::Uuid::new_v4())
}

/// Periodically fans out a `mail:sync` job per connection (§4.1 "sync
/// progress"). Mirrors the teacher's `JobScheduler`-driven full-sync job,
/// generalized from a single queue push to a stream publish per connection.
async fn build_scheduler(stream: Arc<dyn StreamBackend>, conn: DatabaseConnection) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    scheduler
        .add(Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
            let stream = stream.clone();
            let conn = conn.clone();
            Box::pin(async move {
                let connections = match connection::Entity::find().all(&conn).await {
                    Ok(connections) => connections,
                    Err(err) => {
                        tracing::error!(?err, "failed to list connections for scheduled sync");
                        return;
                    }
                };
                for row in connections {
                    let payload = serde_json::json!({"connection_id": row.id}).to_string();
                    if let Err(err) = stream.publish(topics::MAIL_SYNC, &payload).await {
                        tracing::error!(connection_id = row.id, ?err, "failed to publish scheduled sync job");
                    }
                }
            })
        })?)
        .await?;

    Ok(scheduler)
}
