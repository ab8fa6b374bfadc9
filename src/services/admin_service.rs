use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set, sea_query::LockType};
use uuid::Uuid;

use crate::{
    audit,
    db::begin_write,
    dto::orders::{OrderWithItems, UpdateOrderStatusRequest},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Order,
    response::ApiResponse,
    services::order_service::single_with_details,
    state::AppState,
};

/// Moves any order to any status. Unlike `cancel_order`, no transition is
/// refused here.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;

    let txn = begin_write(&state.orm).await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    let previous = Order::try_from(existing.clone())?.status;

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let details = single_with_details(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(
        admin_id = %user.user_id,
        order_id = %id,
        from = %previous,
        to = %payload.status,
        "order status updated"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": id, "from": previous, "to": payload.status }),
    )
    .await;

    Ok(ApiResponse::success("Order updated", details))
}
