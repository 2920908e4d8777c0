#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

use subscription_service::cancel::{CallBudget, CallContext};
use subscription_service::error::{StoreError, StoreResult};
use subscription_service::routes::api_routes;
use subscription_service::subscriptions::query::service_name_pattern;
use subscription_service::subscriptions::{
    ListFilter, SharedStore, Subscription, SubscriptionDraft, SubscriptionStore, SummaryFilter,
};

/// In-process store with the same filtering rules as the Postgres one.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Subscription>>,
    calls: AtomicUsize,
    inserted: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of store operations invoked so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every later call fail the way an unreachable database would.
    pub fn fail_with_database_error(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Counts the call and runs it through `ctx`, or fails when the store is
    /// switched to failing.
    async fn begin(&self, ctx: &CallContext) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing.load(Ordering::SeqCst);
        ctx.run(async move {
            if failing {
                Err(sqlx::Error::PoolTimedOut)
            } else {
                Ok(())
            }
        })
        .await
    }

    /// Strictly increasing insert timestamps keep `created_at` ordering stable.
    fn next_created_at(&self) -> DateTime<Utc> {
        let sequence = self.inserted.fetch_add(1, Ordering::SeqCst) as i64;
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(sequence)
    }

    fn matches(&self, record: &Subscription, user_id: Option<Uuid>, name: Option<&str>) -> bool {
        user_id.map_or(true, |user_id| record.user_id == user_id)
            && name.map_or(true, |name| {
                ilike(&service_name_pattern(name), &record.service_name)
            })
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn create(
        &self,
        ctx: &CallContext,
        draft: SubscriptionDraft,
    ) -> StoreResult<Subscription> {
        self.begin(ctx).await?;
        let id = draft.id.unwrap_or_else(Uuid::new_v4);
        let record = draft.into_subscription(id, self.next_created_at());
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn get(&self, ctx: &CallContext, id: Uuid) -> StoreResult<Subscription> {
        self.begin(ctx).await?;
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, ctx: &CallContext, filter: &ListFilter) -> StoreResult<Vec<Subscription>> {
        self.begin(ctx).await?;
        let mut found: Vec<Subscription> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| self.matches(record, filter.user_id, filter.service_name.as_deref()))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let skip = if filter.offset > 0 { filter.offset as usize } else { 0 };
        let take = if filter.limit > 0 { filter.limit as usize } else { usize::MAX };
        Ok(found.into_iter().skip(skip).take(take).collect())
    }

    async fn update(
        &self,
        ctx: &CallContext,
        id: Uuid,
        draft: SubscriptionDraft,
    ) -> StoreResult<Subscription> {
        self.begin(ctx).await?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(StoreError::NotFound)?;
        *record = draft.into_subscription(id, record.created_at);
        Ok(record.clone())
    }

    async fn delete(&self, ctx: &CallContext, id: Uuid) -> StoreResult<()> {
        self.begin(ctx).await?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn summary(&self, ctx: &CallContext, filter: &SummaryFilter) -> StoreResult<i64> {
        self.begin(ctx).await?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.start_date <= filter.period_end)
            .filter(|record| record.end_date.map_or(true, |end| end >= filter.period_start))
            .filter(|record| self.matches(record, filter.user_id, filter.service_name.as_deref()))
            .map(|record| i64::from(record.price))
            .sum())
    }
}

/// Case-insensitive SQL `LIKE` with `%` and `_` wildcards.
pub fn ilike(pattern: &str, value: &str) -> bool {
    fn matches(pattern: &[char], value: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('%', rest)) => (0..=value.len()).any(|skip| matches(rest, &value[skip..])),
            Some(('_', rest)) => !value.is_empty() && matches(rest, &value[1..]),
            Some((ch, rest)) => value.first() == Some(ch) && matches(rest, &value[1..]),
        }
    }
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let value: Vec<char> = value.to_lowercase().chars().collect();
    matches(&pattern, &value)
}

pub fn budget() -> CallBudget {
    CallBudget::new(CancellationToken::new(), Duration::from_secs(5))
}

pub fn app_with(store: Arc<MemoryStore>, budget: CallBudget) -> Router {
    let store: SharedStore = store;
    api_routes(store, budget, Path::new("docs"))
}

pub fn app(store: Arc<MemoryStore>) -> Router {
    app_with(store, budget())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    send_request(app, builder.body(body).unwrap()).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let raw = hyper::body::to_bytes(response.into_body())
        .await
        .unwrap()
        .to_vec();
    let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        body,
        raw,
    }
}
