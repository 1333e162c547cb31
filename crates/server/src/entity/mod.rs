//! SeaORM entities for the email analytics data model.
//!
//! `email_event`, `email_send` and `email_recipient` are owned by this crate.
//! `member` and `post` belong to the member-management and authoring features;
//! only their email counters are written here.

pub mod email_event;
pub mod email_recipient;
pub mod email_send;
pub mod member;
pub mod post;

pub use email_send::EmailStatus;
