//! Concrete job handlers (§3 control flow): dispatch target for the job
//! consumer, wiring the stream bus to the provider adapters, cache, the
//! classification pipeline, the relational store, the personalization
//! graph, and the real-time bus.
pub mod classify_handler;
pub mod mail_modify_handler;
pub mod mail_sync_handler;
pub mod rule_sink;

pub use classify_handler::ClassifyHandler;
pub use mail_modify_handler::MailModifyHandler;
pub use mail_sync_handler::MailSyncHandler;
pub use rule_sink::DbRuleUsageSink;
