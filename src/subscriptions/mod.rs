//! Subscription records: storage, wire mapping and HTTP endpoints.

pub mod api;
pub mod models;
pub mod payload;
pub mod query;
pub mod store;

pub use api::{routes, SharedStore};
pub use models::{ListFilter, Subscription, SubscriptionDraft, SummaryFilter};
pub use payload::{
    ListParams, SubscriptionPayload, SubscriptionResponse, SummaryParams, SummaryResponse,
};
pub use store::{PgSubscriptionStore, SubscriptionStore};
