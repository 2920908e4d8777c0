//! Wire payloads for the subscriptions API and their validation into store
//! types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{ListFilter, Subscription, SubscriptionDraft, SummaryFilter};
use crate::error::{ApiError, ApiResult};
use crate::period::{end_of_month, format_month_token, parse_month_token, start_of_month};

/// Create/update body. Missing fields deserialize to their empty value so
/// that validation reports which one is wrong.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionPayload {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub price: i32,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl SubscriptionPayload {
    pub fn into_draft(self) -> ApiResult<SubscriptionDraft> {
        if self.service_name.trim().is_empty() {
            return Err(ApiError::validation("service_name is required"));
        }
        if self.price < 0 {
            return Err(ApiError::validation("price must be non-negative"));
        }
        let user_id = parse_user_id(&self.user_id)?;
        if self.start_date.trim().is_empty() {
            return Err(ApiError::validation("start_date is required"));
        }
        let start_date = start_of_month(parse_month_token(&self.start_date)?);
        let end_date = match self.end_date.as_deref() {
            Some(token) => Some(start_of_month(parse_month_token(token)?)),
            None => None,
        };

        Ok(SubscriptionDraft {
            id: None,
            service_name: self.service_name,
            price: self.price,
            user_id,
            start_date,
            end_date,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionResponse {
    pub id: String,
    pub service_name: String,
    pub price: i32,
    pub user_id: String,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id.to_string(),
            service_name: subscription.service_name,
            price: subscription.price,
            user_id: subscription.user_id.to_string(),
            start_date: format_month_token(subscription.start_date),
            end_date: subscription.end_date.map(format_month_token),
            created_at: subscription.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryResponse {
    pub total_price: i64,
}

/// `GET /subscriptions` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub user_id: Option<String>,
    pub service_name: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListParams {
    pub fn into_filter(self) -> ApiResult<ListFilter> {
        let mut filter = ListFilter::default();
        if let Some(user_id) = present(self.user_id) {
            filter.user_id = Some(parse_user_id(&user_id)?);
        }
        filter.service_name = present(self.service_name);
        if let Some(limit) = present(self.limit) {
            filter.limit = limit
                .parse()
                .map_err(|_| ApiError::validation("limit must be an integer"))?;
        }
        if let Some(offset) = present(self.offset) {
            filter.offset = offset
                .parse()
                .map_err(|_| ApiError::validation("offset must be an integer"))?;
        }
        Ok(filter)
    }
}

/// `GET /subscriptions/summary` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

impl SummaryParams {
    pub fn into_filter(self) -> ApiResult<SummaryFilter> {
        let (Some(start), Some(end)) = (present(self.start), present(self.end)) else {
            return Err(ApiError::validation(
                "start and end query parameters are required (format MM-YYYY)",
            ));
        };

        let start = parse_month_token(&start)
            .map_err(|_| ApiError::validation("invalid start format"))?;
        let end =
            parse_month_token(&end).map_err(|_| ApiError::validation("invalid end format"))?;
        if end < start {
            return Err(ApiError::validation("end must not be before start"));
        }

        let user_id = present(self.user_id)
            .map(|value| parse_user_id(&value))
            .transpose()?;

        Ok(SummaryFilter {
            period_start: start_of_month(start),
            period_end: end_of_month(end),
            user_id,
            service_name: present(self.service_name),
        })
    }
}

pub fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::validation("invalid id"))
}

fn parse_user_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::validation("invalid user_id"))
}

/// Trimmed value, or `None` when absent or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
