use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{ListFilter, Subscription, SubscriptionDraft, SummaryFilter};
use super::query::{list_query, summary_query, SUBSCRIPTION_COLUMNS};
use crate::cancel::CallContext;
use crate::error::{StoreError, StoreResult};

/// key: subscription-store -> crud,summary
///
/// Persistence seam for subscription records. Every call takes the caller's
/// [`CallContext`] and must give up once it is cancelled or past its deadline.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Persists `draft`, generating an id when none was supplied.
    async fn create(&self, ctx: &CallContext, draft: SubscriptionDraft)
        -> StoreResult<Subscription>;

    async fn get(&self, ctx: &CallContext, id: Uuid) -> StoreResult<Subscription>;

    async fn list(&self, ctx: &CallContext, filter: &ListFilter) -> StoreResult<Vec<Subscription>>;

    /// Overwrites every mutable field of `id`. `draft.id` is ignored.
    async fn update(
        &self,
        ctx: &CallContext,
        id: Uuid,
        draft: SubscriptionDraft,
    ) -> StoreResult<Subscription>;

    async fn delete(&self, ctx: &CallContext, id: Uuid) -> StoreResult<()>;

    /// Total price of subscriptions overlapping the filter's period, 0 if none.
    async fn summary(&self, ctx: &CallContext, filter: &SummaryFilter) -> StoreResult<i64>;
}

#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn create(
        &self,
        ctx: &CallContext,
        draft: SubscriptionDraft,
    ) -> StoreResult<Subscription> {
        let id = draft.id.unwrap_or_else(Uuid::new_v4);
        let created_at: DateTime<Utc> = ctx
            .run(
                sqlx::query_scalar(
                    r#"
                    INSERT INTO subscriptions (id, service_name, price, user_id, start_date, end_date)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING created_at
                    "#,
                )
                .bind(id)
                .bind(&draft.service_name)
                .bind(draft.price)
                .bind(draft.user_id)
                .bind(draft.start_date)
                .bind(draft.end_date)
                .fetch_one(&self.pool),
            )
            .await?;

        tracing::debug!(%id, "subscription created");
        Ok(draft.into_subscription(id, created_at))
    }

    async fn get(&self, ctx: &CallContext, id: Uuid) -> StoreResult<Subscription> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1");
        ctx.run(
            sqlx::query_as::<_, Subscription>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn list(&self, ctx: &CallContext, filter: &ListFilter) -> StoreResult<Vec<Subscription>> {
        let mut query = list_query(filter);
        ctx.run(
            query
                .build_query_as::<Subscription>()
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn update(
        &self,
        ctx: &CallContext,
        id: Uuid,
        draft: SubscriptionDraft,
    ) -> StoreResult<Subscription> {
        let created_at: Option<DateTime<Utc>> = ctx
            .run(
                sqlx::query_scalar(
                    r#"
                    UPDATE subscriptions
                    SET service_name = $1, price = $2, user_id = $3, start_date = $4, end_date = $5
                    WHERE id = $6
                    RETURNING created_at
                    "#,
                )
                .bind(&draft.service_name)
                .bind(draft.price)
                .bind(draft.user_id)
                .bind(draft.start_date)
                .bind(draft.end_date)
                .bind(id)
                .fetch_optional(&self.pool),
            )
            .await?;

        let created_at = created_at.ok_or(StoreError::NotFound)?;
        Ok(draft.into_subscription(id, created_at))
    }

    async fn delete(&self, ctx: &CallContext, id: Uuid) -> StoreResult<()> {
        let result = ctx
            .run(
                sqlx::query("DELETE FROM subscriptions WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn summary(&self, ctx: &CallContext, filter: &SummaryFilter) -> StoreResult<i64> {
        let mut query = summary_query(filter);
        let (total,) = ctx
            .run(query.build_query_as::<(i64,)>().fetch_one(&self.pool))
            .await?;
        Ok(total)
    }
}
