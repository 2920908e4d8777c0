use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{ListFilter, SummaryFilter};

pub(crate) const SUBSCRIPTION_COLUMNS: &str =
    "id, service_name, price, user_id, start_date, end_date, created_at";

/// `QueryBuilder` that emits ` WHERE ` before the first condition and ` AND `
/// before every later one. Placeholders are numbered by `push_bind` order.
pub struct FilteredQuery {
    builder: QueryBuilder<'static, Postgres>,
    has_condition: bool,
}

impl FilteredQuery {
    pub fn new(head: impl Into<String>) -> Self {
        Self {
            builder: QueryBuilder::new(head),
            has_condition: false,
        }
    }

    /// Opens the next condition with `clause`; the caller binds its value.
    pub fn condition(&mut self, clause: &str) -> &mut QueryBuilder<'static, Postgres> {
        self.builder
            .push(if self.has_condition { " AND " } else { " WHERE " });
        self.has_condition = true;
        self.builder.push(clause)
    }

    /// Owner and service-name predicates shared by listing and summaries.
    pub fn owner_and_service(&mut self, user_id: Option<Uuid>, service_name: Option<&str>) {
        if let Some(user_id) = user_id {
            self.condition("user_id = ").push_bind(user_id);
        }
        if let Some(name) = service_name {
            self.condition("service_name ILIKE ")
                .push_bind(service_name_pattern(name));
        }
    }

    pub fn into_builder(self) -> QueryBuilder<'static, Postgres> {
        self.builder
    }
}

/// Case-insensitive substring pattern for `ILIKE`. `%` and `_` typed by the
/// caller keep their wildcard meaning.
pub fn service_name_pattern(name: &str) -> String {
    format!("%{name}%")
}

/// Newest first. Non-positive `limit`/`offset` are left out entirely.
pub fn list_query(filter: &ListFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = FilteredQuery::new(format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions"
    ));
    query.owner_and_service(filter.user_id, filter.service_name.as_deref());

    let mut builder = query.into_builder();
    builder.push(" ORDER BY created_at DESC");
    if filter.limit > 0 {
        builder.push(" LIMIT ").push_bind(filter.limit);
    }
    if filter.offset > 0 {
        builder.push(" OFFSET ").push_bind(filter.offset);
    }
    builder
}

/// Sums prices of subscriptions whose active interval overlaps the period.
/// A missing `end_date` counts as still active.
pub fn summary_query(filter: &SummaryFilter) -> QueryBuilder<'static, Postgres> {
    let mut query =
        FilteredQuery::new("SELECT COALESCE(SUM(price), 0)::BIGINT FROM subscriptions");
    query
        .condition("start_date <= ")
        .push_bind(filter.period_end);
    query
        .condition("(end_date IS NULL OR end_date >= ")
        .push_bind(filter.period_start)
        .push(")");
    query.owner_and_service(filter.user_id, filter.service_name.as_deref());
    query.into_builder()
}
