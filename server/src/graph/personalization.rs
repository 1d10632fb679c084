//! Personalization nodes (§4.7): trait, writing-style, tone preference,
//! frequent phrase, signature, topic expertise, communication pattern — all
//! reachable outbound from the user node. Upserts are idempotent merges.
use chrono::Utc;
use neo4rs::{query, Row};
use serde::{Deserialize, Serialize};

use super::contacts::{self, ContactRelationship};
use super::GraphStore;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserProfile {
    pub traits: Vec<String>,
    pub writing_style: Option<String>,
    pub tone_preferences: Vec<TonePreference>,
    pub signature: Option<String>,
    pub topic_expertise: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TonePreference {
    pub relation_type: String,
    pub tone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequentPhrase {
    pub phrase: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationPattern {
    pub context: String,
    pub description: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutocompleteContext {
    pub profile: UserProfile,
    pub contact: Option<ContactRelationship>,
    pub tone_for_relation: Option<String>,
    pub frequent_phrases: Vec<FrequentPhrase>,
    pub patterns: Vec<CommunicationPattern>,
}

async fn upsert_scalar_node(
    store: &GraphStore,
    user_id: i32,
    label: &str,
    relation: &str,
    key_field: &str,
    value: &str,
) -> Result<(), neo4rs::Error> {
    let stmt = format!(
        "MERGE (u:User {{id: $user_id}}) \
         MERGE (n:{label} {{{key_field}: $value}}) \
         MERGE (u)-[r:{relation}]->(n) \
         ON CREATE SET r.created_at = $now \
         SET n.updated_at = $now"
    );
    store
        .graph
        .run(query(&stmt).param("user_id", user_id as i64).param("value", value).param("now", Utc::now().to_rfc3339()))
        .await
}

pub async fn add_trait(store: &GraphStore, user_id: i32, trait_name: &str) -> Result<(), neo4rs::Error> {
    upsert_scalar_node(store, user_id, "Trait", "has_trait", "name", trait_name).await
}

pub async fn set_writing_style(store: &GraphStore, user_id: i32, style: &str) -> Result<(), neo4rs::Error> {
    upsert_scalar_node(store, user_id, "WritingStyle", "has_writing_style", "name", style).await
}

pub async fn set_signature(store: &GraphStore, user_id: i32, signature: &str) -> Result<(), neo4rs::Error> {
    upsert_scalar_node(store, user_id, "Signature", "has_signature", "text", signature).await
}

pub async fn add_topic_expertise(store: &GraphStore, user_id: i32, topic: &str) -> Result<(), neo4rs::Error> {
    upsert_scalar_node(store, user_id, "TopicExpertise", "has_expertise", "topic", topic).await
}

pub async fn set_tone_preference(store: &GraphStore, user_id: i32, relation_type: &str, tone: &str) -> Result<(), neo4rs::Error> {
    store
        .graph
        .run(
            query(
                "MERGE (u:User {id: $user_id}) \
                 MERGE (t:TonePreference {relation_type: $relation_type}) \
                 MERGE (u)-[:has_tone_pref]->(t) \
                 SET t.tone = $tone",
            )
            .param("user_id", user_id as i64)
            .param("relation_type", relation_type)
            .param("tone", tone),
        )
        .await
}

/// Increments usage count for a phrase, tracked so patterns are monotone.
pub async fn record_phrase_usage(store: &GraphStore, user_id: i32, phrase: &str) -> Result<(), neo4rs::Error> {
    store
        .graph
        .run(
            query(
                "MERGE (u:User {id: $user_id}) \
                 MERGE (p:FrequentPhrase {phrase: $phrase}) \
                 MERGE (u)-[:uses_phrase]->(p) \
                 ON CREATE SET p.count = 1 \
                 ON MATCH SET p.count = p.count + 1",
            )
            .param("user_id", user_id as i64)
            .param("phrase", phrase),
        )
        .await
}

pub async fn record_pattern(store: &GraphStore, user_id: i32, context: &str, description: &str) -> Result<(), neo4rs::Error> {
    store
        .graph
        .run(
            query(
                "MERGE (u:User {id: $user_id}) \
                 MERGE (p:CommunicationPattern {context: $context, description: $description}) \
                 MERGE (u)-[:has_pattern]->(p) \
                 ON CREATE SET p.count = 1 \
                 ON MATCH SET p.count = p.count + 1",
            )
            .param("user_id", user_id as i64)
            .param("context", context)
            .param("description", description),
        )
        .await
}

pub async fn load_profile(store: &GraphStore, user_id: i32) -> Result<UserProfile, neo4rs::Error> {
    let mut result = store
        .graph
        .execute(
            query(
                "MATCH (u:User {id: $user_id}) \
                 OPTIONAL MATCH (u)-[:has_trait]->(t:Trait) \
                 OPTIONAL MATCH (u)-[:has_writing_style]->(w:WritingStyle) \
                 OPTIONAL MATCH (u)-[:has_signature]->(s:Signature) \
                 OPTIONAL MATCH (u)-[:has_expertise]->(e:TopicExpertise) \
                 RETURN collect(DISTINCT t.name) AS traits, w.name AS writing_style, s.text AS signature, \
                     collect(DISTINCT e.topic) AS topic_expertise",
            )
            .param("user_id", user_id as i64),
        )
        .await?;

    let mut profile = match result.next().await? {
        Some(row) => row_to_profile(&row),
        None => UserProfile::default(),
    };

    let mut tone_result = store
        .graph
        .execute(
            query("MATCH (u:User {id: $user_id})-[:has_tone_pref]->(tp:TonePreference) RETURN tp.relation_type AS relation_type, tp.tone AS tone")
                .param("user_id", user_id as i64),
        )
        .await?;
    while let Some(row) = tone_result.next().await? {
        if let (Ok(relation_type), Ok(tone)) = (row.get::<String>("relation_type"), row.get::<String>("tone")) {
            profile.tone_preferences.push(TonePreference { relation_type, tone });
        }
    }

    Ok(profile)
}

fn row_to_profile(row: &Row) -> UserProfile {
    UserProfile {
        traits: row.get("traits").unwrap_or_default(),
        writing_style: row.get("writing_style").ok(),
        tone_preferences: Vec::new(),
        signature: row.get("signature").ok(),
        topic_expertise: row.get("topic_expertise").unwrap_or_default(),
    }
}

fn tone_bucket(relation_type: &str) -> &'static str {
    match relation_type {
        "boss" | "client" => "formal",
        "colleague" | "friend" => "casual",
        _ => "general",
    }
}

/// Assembles the context an autocomplete/reply-generation prompt needs:
/// profile, optional contact, tone keyed by the contact's relation type,
/// top-10 frequent phrases, top-5 patterns matching the relation's context
/// bucket.
pub async fn autocomplete_context(store: &GraphStore, user_id: i32, contact_email: Option<&str>) -> Result<AutocompleteContext, neo4rs::Error> {
    let profile = load_profile(store, user_id).await?;

    let contact = if let Some(email) = contact_email {
        contacts::all_contacts(store, user_id).await?.into_iter().find(|c| c.contact_email == email)
    } else {
        None
    };

    let tone_for_relation = contact.as_ref().and_then(|c| {
        profile.tone_preferences.iter().find(|t| t.relation_type == c.relation_type).map(|t| t.tone.clone())
    });

    let mut phrase_result = store
        .graph
        .execute(
            query(
                "MATCH (u:User {id: $user_id})-[:uses_phrase]->(p:FrequentPhrase) \
                 RETURN p.phrase AS phrase, p.count AS count ORDER BY p.count DESC LIMIT 10",
            )
            .param("user_id", user_id as i64),
        )
        .await?;
    let mut frequent_phrases = Vec::new();
    while let Some(row) = phrase_result.next().await? {
        if let (Ok(phrase), Ok(count)) = (row.get::<String>("phrase"), row.get::<i64>("count")) {
            frequent_phrases.push(FrequentPhrase { phrase, count });
        }
    }

    let context_bucket = contact.as_ref().map(|c| tone_bucket(&c.relation_type)).unwrap_or("general");
    let mut pattern_result = store
        .graph
        .execute(
            query(
                "MATCH (u:User {id: $user_id})-[:has_pattern]->(p:CommunicationPattern {context: $context}) \
                 RETURN p.context AS context, p.description AS description, p.count AS count ORDER BY p.count DESC LIMIT 5",
            )
            .param("user_id", user_id as i64)
            .param("context", context_bucket),
        )
        .await?;
    let mut patterns = Vec::new();
    while let Some(row) = pattern_result.next().await? {
        if let (Ok(context), Ok(description), Ok(count)) = (row.get::<String>("context"), row.get::<String>("description"), row.get::<i64>("count")) {
            patterns.push(CommunicationPattern { context, description, count });
        }
    }

    Ok(AutocompleteContext { profile, contact, tone_for_relation, frequent_phrases, patterns })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_bucket_maps_relation_types() {
        assert_eq!(tone_bucket("boss"), "formal");
        assert_eq!(tone_bucket("client"), "formal");
        assert_eq!(tone_bucket("colleague"), "casual");
        assert_eq!(tone_bucket("friend"), "casual");
        assert_eq!(tone_bucket("acquaintance"), "general");
    }
}
