use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::payload::{
    parse_id, ListParams, SubscriptionPayload, SubscriptionResponse, SummaryParams,
    SummaryResponse,
};
use super::store::SubscriptionStore;
use crate::cancel::CallContext;
use crate::error::{ApiError, ApiResult};

pub type SharedStore = Arc<dyn SubscriptionStore>;

/// key: subscriptions-api -> rest endpoints
pub fn routes() -> Router {
    Router::new()
        .route(
            "/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .route("/subscriptions/summary", get(subscription_summary))
        .route(
            "/subscriptions/:id",
            get(get_subscription)
                .put(update_subscription)
                .delete(delete_subscription),
        )
}

pub async fn create_subscription(
    Extension(store): Extension<SharedStore>,
    ctx: CallContext,
    payload: Result<Json<SubscriptionPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let Json(payload) = payload.map_err(invalid_body)?;
    let draft = payload.into_draft()?;

    let created = store
        .create(&ctx, draft)
        .await
        .map_err(|err| ApiError::from_store(err, "unable to persist subscription"))?;

    tracing::info!(id = %created.id, user_id = %created.user_id, "subscription created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn list_subscriptions(
    Extension(store): Extension<SharedStore>,
    ctx: CallContext,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<SubscriptionResponse>>> {
    let Query(params) = params.map_err(invalid_query)?;
    let filter = params.into_filter()?;

    let subscriptions = store
        .list(&ctx, &filter)
        .await
        .map_err(|err| ApiError::from_store(err, "unable to fetch subscriptions"))?;

    Ok(Json(subscriptions.into_iter().map(Into::into).collect()))
}

pub async fn get_subscription(
    Extension(store): Extension<SharedStore>,
    ctx: CallContext,
    Path(id): Path<String>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let id = parse_id(&id)?;
    let subscription = store
        .get(&ctx, id)
        .await
        .map_err(|err| ApiError::from_store(err, "failed to load subscription"))?;
    Ok(Json(subscription.into()))
}

/// Replaces every mutable field; the id comes from the path, never the body.
pub async fn update_subscription(
    Extension(store): Extension<SharedStore>,
    ctx: CallContext,
    Path(id): Path<String>,
    payload: Result<Json<SubscriptionPayload>, JsonRejection>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let id = parse_id(&id)?;
    let Json(payload) = payload.map_err(invalid_body)?;
    let draft = payload.into_draft()?;

    let updated = store
        .update(&ctx, id, draft)
        .await
        .map_err(|err| ApiError::from_store(err, "unable to update subscription"))?;

    tracing::info!(%id, "subscription updated");
    Ok(Json(updated.into()))
}

pub async fn delete_subscription(
    Extension(store): Extension<SharedStore>,
    ctx: CallContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    store
        .delete(&ctx, id)
        .await
        .map_err(|err| ApiError::from_store(err, "unable to remove subscription"))?;

    tracing::info!(%id, "subscription deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn subscription_summary(
    Extension(store): Extension<SharedStore>,
    ctx: CallContext,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> ApiResult<Json<SummaryResponse>> {
    let Query(params) = params.map_err(invalid_query)?;
    let filter = params.into_filter()?;

    let total_price = store
        .summary(&ctx, &filter)
        .await
        .map_err(|err| ApiError::from_store(err, "unable to calculate total"))?;

    Ok(Json(SummaryResponse { total_price }))
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError::Malformed {
        message: "invalid body",
        detail: rejection.body_text(),
    }
}

fn invalid_query(rejection: QueryRejection) -> ApiError {
    ApiError::Malformed {
        message: "invalid query parameters",
        detail: rejection.body_text(),
    }
}
