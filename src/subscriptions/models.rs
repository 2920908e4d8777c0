use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// key: subscription-model -> stored record
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Validated, caller-owned fields of a subscription.
///
/// `id` is only honoured by `create`; when absent the store generates one.
/// Dates are expected to be normalized to the first of the month already.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDraft {
    pub id: Option<Uuid>,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl SubscriptionDraft {
    pub fn into_subscription(self, id: Uuid, created_at: DateTime<Utc>) -> Subscription {
        Subscription {
            id,
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at,
        }
    }
}

/// Optional narrowing for `list`. Non-positive `limit`/`offset` mean unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Closed month interval `[period_start, period_end]` plus the `list` predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryFilter {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
}
