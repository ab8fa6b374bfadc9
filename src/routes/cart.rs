use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    domain::cart::CartTotals,
    dto::cart::{
        AddItemRequest, CartList, CartMutation, ClearedCart, RemoveItemRequest,
        SetQuantityRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartLine,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list))
        .route("/total", get(cart_total))
        .route("/add-item", post(add_item))
        .route("/remove-item", post(remove_item))
        .route("/lines/{line_id}/quantity", post(set_quantity))
        .route("/clear", post(clear_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines of the current user, empty when anonymous", body = ApiResponse<CartList>)
    ),
    security((), ("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    Ok(Json(cart_service::list_cart(&state, user.as_ref()).await?))
}

#[utoipa::path(
    get,
    path = "/api/cart/total",
    responses(
        (status = 200, description = "Cart total and item count, zeros when anonymous", body = ApiResponse<CartTotals>)
    ),
    security((), ("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_total(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> AppResult<Json<ApiResponse<CartTotals>>> {
    Ok(Json(cart_service::cart_totals(&state, user.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/cart/add-item",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Line created or incremented", body = ApiResponse<CartLine>),
        (status = 400, description = "Invalid quantity"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<CartLine>>> {
    Ok(Json(cart_service::add_item(&state, &user, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/cart/remove-item",
    request_body = RemoveItemRequest,
    responses(
        (status = 200, description = "Line decremented or removed", body = ApiResponse<CartMutation>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Item not found in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RemoveItemRequest>,
) -> AppResult<Json<ApiResponse<CartMutation>>> {
    Ok(Json(
        cart_service::remove_item(&state, &user, payload.product_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/cart/lines/{line_id}/quantity",
    params(("line_id" = Uuid, Path, description = "Cart line ID")),
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Quantity set, or line removed when quantity <= 0", body = ApiResponse<CartMutation>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn set_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(line_id): Path<Uuid>,
    Json(payload): Json<SetQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartMutation>>> {
    Ok(Json(
        cart_service::set_line_quantity(&state, &user, line_id, payload.quantity).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/cart/clear",
    responses(
        (status = 200, description = "Cart cleared", body = ApiResponse<ClearedCart>),
        (status = 401, description = "Authentication required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ClearedCart>>> {
    Ok(Json(cart_service::clear_cart(&state, &user).await?))
}
