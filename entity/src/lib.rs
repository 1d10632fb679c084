pub mod classification_rule;
pub mod connection;
pub mod mail_body_cache;
pub mod mail_message;
pub mod sender_profile;
pub mod user;
pub mod user_token_usage;

pub mod prelude {
    pub use super::classification_rule::Entity as ClassificationRule;
    pub use super::connection::Entity as Connection;
    pub use super::mail_body_cache::Entity as MailBodyCache;
    pub use super::mail_message::Entity as MailMessage;
    pub use super::sender_profile::Entity as SenderProfile;
    pub use super::user::Entity as User;
    pub use super::user_token_usage::Entity as UserTokenUsage;
}
