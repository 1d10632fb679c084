//! Stream topic key tables (§6). Each family gets a base name; DLQ topics
//! are `dlq:<original>`.
pub const MAIL_SEND: &str = "mail:send";
pub const MAIL_SYNC: &str = "mail:sync";
pub const MAIL_BATCH: &str = "mail:batch";
pub const MAIL_SAVE: &str = "mail:save";
pub const MAIL_MODIFY: &str = "mail:modify";

pub const CALENDAR_SYNC: &str = "calendar:sync";
pub const CALENDAR_EVENT: &str = "calendar:event";

pub const AI_CLASSIFY: &str = "ai:classify";
pub const AI_SUMMARIZE: &str = "ai:summarize";
pub const AI_TRANSLATE: &str = "ai:translate";
pub const AI_AUTOCOMPLETE: &str = "ai:autocomplete";
pub const AI_CHAT: &str = "ai:chat";
pub const AI_GENERATE_REPLY: &str = "ai:generate_reply";

pub const RAG_INDEX: &str = "rag:index";
pub const RAG_BATCH: &str = "rag:batch";
pub const RAG_SEARCH: &str = "rag:search";

pub const PROFILE_ANALYZE: &str = "profile:analyze";

/// Every topic the job consumer joins groups on at startup.
pub const ALL_TOPICS: &[&str] = &[
    MAIL_SEND, MAIL_SYNC, MAIL_BATCH, MAIL_SAVE, MAIL_MODIFY,
    CALENDAR_SYNC, CALENDAR_EVENT,
    AI_CLASSIFY, AI_SUMMARIZE, AI_TRANSLATE, AI_AUTOCOMPLETE, AI_CHAT, AI_GENERATE_REPLY,
    RAG_INDEX, RAG_BATCH, RAG_SEARCH,
    PROFILE_ANALYZE,
];

pub fn priority_variant(topic: &str) -> String {
    format!("{topic}:priority")
}

pub fn dlq_topic(topic: &str) -> String {
    format!("dlq:{topic}")
}

pub fn sync_status_key(connection_id: i32) -> String {
    format!("sync:status:{connection_id}")
}
