//! Contact relationships (§3, §4.7): `(user)-[:communicates_with]->(contact)`
//! edges carrying engagement statistics. `first_contact` is write-once,
//! coalesced on upsert with `ON CREATE SET` / `ON MATCH SET`.
use chrono::{DateTime, Utc};
use neo4rs::{query, Row};
use serde::{Deserialize, Serialize};

use super::GraphStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRelationship {
    pub contact_email: String,
    pub relation_type: String,
    pub emails_sent: i64,
    pub emails_received: i64,
    pub last_contact: DateTime<Utc>,
    pub first_contact: DateTime<Utc>,
    pub tone_used: Option<String>,
    pub formality_level: Option<String>,
    pub avg_reply_time_secs: Option<f64>,
    pub importance_score: f64,
    pub is_frequent: bool,
    pub is_important: bool,
}

fn row_to_relationship(row: &Row) -> Option<ContactRelationship> {
    Some(ContactRelationship {
        contact_email: row.get("contact_email").ok()?,
        relation_type: row.get("relation_type").ok()?,
        emails_sent: row.get("emails_sent").unwrap_or(0),
        emails_received: row.get("emails_received").unwrap_or(0),
        last_contact: row.get::<String>("last_contact").ok()?.parse().ok()?,
        first_contact: row.get::<String>("first_contact").ok()?.parse().ok()?,
        tone_used: row.get("tone_used").ok(),
        formality_level: row.get("formality_level").ok(),
        avg_reply_time_secs: row.get("avg_reply_time_secs").ok(),
        importance_score: row.get("importance_score").unwrap_or(0.0),
        is_frequent: row.get("is_frequent").unwrap_or(false),
        is_important: row.get("is_important").unwrap_or(false),
    })
}

/// Direction-aware touch: increments `emails_sent` or `emails_received`,
/// coalesces `first_contact`, and always advances `last_contact`.
pub async fn record_contact(
    store: &GraphStore,
    user_id: i32,
    contact_email: &str,
    relation_type: &str,
    sent: bool,
    at: DateTime<Utc>,
) -> Result<(), neo4rs::Error> {
    let counter_field = if sent { "emails_sent" } else { "emails_received" };
    let stmt = format!(
        "MERGE (u:User {{id: $user_id}}) \
         MERGE (c:Contact {{email: $contact_email}}) \
         MERGE (u)-[r:communicates_with]->(c) \
         ON CREATE SET r.relation_type = $relation_type, r.first_contact = $at, r.last_contact = $at, \
             r.emails_sent = 0, r.emails_received = 0, r.importance_score = 0.0, \
             r.is_frequent = false, r.is_important = false, r.{counter_field} = 1 \
         ON MATCH SET r.last_contact = $at, r.{counter_field} = coalesce(r.{counter_field}, 0) + 1"
    );
    store
        .graph
        .run(
            query(&stmt)
                .param("user_id", user_id as i64)
                .param("contact_email", contact_email)
                .param("relation_type", relation_type)
                .param("at", at.to_rfc3339()),
        )
        .await
}

pub async fn set_engagement_fields(
    store: &GraphStore,
    user_id: i32,
    contact_email: &str,
    tone_used: Option<&str>,
    formality_level: Option<&str>,
    avg_reply_time_secs: Option<f64>,
    importance_score: f64,
    is_frequent: bool,
    is_important: bool,
) -> Result<(), neo4rs::Error> {
    store
        .graph
        .run(
            query(
                "MATCH (u:User {id: $user_id})-[r:communicates_with]->(c:Contact {email: $contact_email}) \
                 SET r.tone_used = $tone_used, r.formality_level = $formality_level, \
                     r.avg_reply_time_secs = $avg_reply_time_secs, r.importance_score = $importance_score, \
                     r.is_frequent = $is_frequent, r.is_important = $is_important",
            )
            .param("user_id", user_id as i64)
            .param("contact_email", contact_email)
            .param("tone_used", tone_used)
            .param("formality_level", formality_level)
            .param("avg_reply_time_secs", avg_reply_time_secs)
            .param("importance_score", importance_score)
            .param("is_frequent", is_frequent)
            .param("is_important", is_important),
        )
        .await
}

async fn fetch(store: &GraphStore, user_id: i32, extra_filter: &str) -> Result<Vec<ContactRelationship>, neo4rs::Error> {
    let stmt = format!(
        "MATCH (u:User {{id: $user_id}})-[r:communicates_with]->(c:Contact) {extra_filter} \
         RETURN c.email AS contact_email, r.relation_type AS relation_type, r.emails_sent AS emails_sent, \
             r.emails_received AS emails_received, r.last_contact AS last_contact, r.first_contact AS first_contact, \
             r.tone_used AS tone_used, r.formality_level AS formality_level, r.avg_reply_time_secs AS avg_reply_time_secs, \
             r.importance_score AS importance_score, r.is_frequent AS is_frequent, r.is_important AS is_important \
         ORDER BY r.importance_score DESC, r.last_contact DESC"
    );
    let mut result = store.graph.execute(query(&stmt).param("user_id", user_id as i64)).await?;
    let mut relationships = Vec::new();
    while let Some(row) = result.next().await? {
        if let Some(relationship) = row_to_relationship(&row) {
            relationships.push(relationship);
        }
    }
    Ok(relationships)
}

pub async fn all_contacts(store: &GraphStore, user_id: i32) -> Result<Vec<ContactRelationship>, neo4rs::Error> {
    fetch(store, user_id, "").await
}

pub async fn frequent_contacts(store: &GraphStore, user_id: i32) -> Result<Vec<ContactRelationship>, neo4rs::Error> {
    fetch(store, user_id, "WHERE r.is_frequent = true").await
}

pub async fn important_contacts(store: &GraphStore, user_id: i32) -> Result<Vec<ContactRelationship>, neo4rs::Error> {
    fetch(store, user_id, "WHERE r.is_important = true").await
}
