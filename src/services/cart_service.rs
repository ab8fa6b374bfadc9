use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    ActiveValue::NotSet,
    sea_query::{Expr, LockType, OnConflict},
};
use uuid::Uuid;

use crate::{
    audit,
    db::begin_write,
    domain::cart::{self, CartTotals, LineChange},
    dto::cart::{AddItemRequest, CartList, CartMutation, ClearedCart},
    entity::{
        cart_items::{
            ActiveModel as CartActive, Column as CartCol, Entity as CartItems,
            Model as CartModel,
        },
        products::{Entity as Products, Model as ProductModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartLine, CartLineDetail},
    response::ApiResponse,
    services::catalog_service::find_product,
    state::AppState,
};

/// How a set-quantity request addresses a line.
#[derive(Debug, Clone, Copy)]
enum LineKey {
    Product(Uuid),
    Line(Uuid),
}

impl LineKey {
    fn condition(self, user_id: Uuid) -> Condition {
        let owner = Condition::all().add(CartCol::UserId.eq(user_id));
        match self {
            LineKey::Product(product_id) => owner.add(CartCol::ProductId.eq(product_id)),
            LineKey::Line(line_id) => owner.add(CartCol::Id.eq(line_id)),
        }
    }

    fn product_id(self) -> Option<Uuid> {
        match self {
            LineKey::Product(product_id) => Some(product_id),
            LineKey::Line(_) => None,
        }
    }
}

async fn lines_with_products(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<Vec<(CartModel, ProductModel)>> {
    let rows = CartItems::find()
        .find_also_related(Products)
        .filter(CartCol::UserId.eq(user_id))
        .order_by_desc(CartCol::CreatedAt)
        .order_by_desc(CartCol::Id)
        .all(&state.orm)
        .await?;

    // Lines cascade with their product, so a missing product only shows up
    // when a delete races this read.
    Ok(rows
        .into_iter()
        .filter_map(|(line, product)| product.map(|product| (line, product)))
        .collect())
}

pub async fn list_cart(
    state: &AppState,
    user: Option<&AuthUser>,
) -> AppResult<ApiResponse<CartList>> {
    let Some(user) = user else {
        return Ok(ApiResponse::success("OK", CartList { items: Vec::new() }));
    };

    let items = lines_with_products(state, user.user_id)
        .await?
        .into_iter()
        .map(|(line, product)| CartLineDetail::new(line, product))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success("OK", CartList { items }))
}

pub async fn cart_totals(
    state: &AppState,
    user: Option<&AuthUser>,
) -> AppResult<ApiResponse<CartTotals>> {
    let Some(user) = user else {
        return Ok(ApiResponse::success(
            "User not authenticated",
            CartTotals::default(),
        ));
    };

    let lines = lines_with_products(state, user.user_id).await?;
    let totals = CartTotals::from_lines(
        lines
            .iter()
            .map(|(line, product)| (product.price, line.quantity)),
    )?;

    Ok(ApiResponse::success("OK", totals))
}

/// Inserts the line or increments the existing one in a single upsert, so
/// concurrent adds for the same product never lose an increment.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddItemRequest,
) -> AppResult<ApiResponse<CartLine>> {
    let quantity = cart::validate_add_quantity(payload.quantity)?;

    let txn = begin_write(&state.orm).await?;
    ensure_owner(&txn, user.user_id).await?;
    find_product(&txn, payload.product_id).await?;

    let line = CartItems::insert(CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(payload.product_id),
        quantity: Set(quantity),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([CartCol::UserId, CartCol::ProductId])
            .value(
                CartCol::Quantity,
                Expr::col((CartItems, CartCol::Quantity)).add(quantity),
            )
            .value(CartCol::UpdatedAt, Expr::current_timestamp())
            .to_owned(),
    )
    .exec_with_returning(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        product_id = %line.product_id,
        quantity = line.quantity,
        "cart item added"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::success("OK", line.into()))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartMutation>> {
    let key = LineKey::Product(product_id);
    let txn = begin_write(&state.orm).await?;
    let line = lock_line(&txn, user.user_id, key).await?;

    let change = cart::remove_one(line.as_ref().map(|line| line.quantity))?;
    let mutation = apply_change(&txn, key, line, change).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, %product_id, "cart item decremented");
    audit::record(
        &state.orm,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(message_for(&mutation), mutation))
}

pub async fn set_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<CartMutation>> {
    set_quantity_by(state, user, LineKey::Product(product_id), quantity).await
}

pub async fn set_line_quantity(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
    quantity: i32,
) -> AppResult<ApiResponse<CartMutation>> {
    set_quantity_by(state, user, LineKey::Line(line_id), quantity).await
}

async fn set_quantity_by(
    state: &AppState,
    user: &AuthUser,
    key: LineKey,
    quantity: i32,
) -> AppResult<ApiResponse<CartMutation>> {
    let txn = begin_write(&state.orm).await?;
    let line = lock_line(&txn, user.user_id, key).await?;

    let change = cart::set_quantity(line.as_ref().map(|line| line.quantity), quantity)?;
    let mutation = apply_change(&txn, key, line, change).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, ?key, quantity, "cart quantity set");
    audit::record(
        &state.orm,
        user.user_id,
        "cart_set_quantity",
        "cart_items",
        serde_json::json!({ "key": format!("{key:?}"), "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::success(message_for(&mutation), mutation))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ClearedCart>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    tracing::info!(user_id = %user.user_id, removed = result.rows_affected, "cart cleared");
    audit::record(
        &state.orm,
        user.user_id,
        "cart_clear",
        "cart_items",
        serde_json::json!({ "removed_lines": result.rows_affected }),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart cleared successfully",
        ClearedCart {
            removed_lines: result.rows_affected,
        },
    ))
}

/// A validly signed token can still name a user that has no account row.
async fn ensure_owner(txn: &DatabaseTransaction, user_id: Uuid) -> AppResult<()> {
    Users::find_by_id(user_id)
        .one(txn)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(())
}

async fn lock_line(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    key: LineKey,
) -> AppResult<Option<CartModel>> {
    let line = CartItems::find()
        .filter(key.condition(user_id))
        .lock(LockType::Update)
        .one(txn)
        .await?;
    Ok(line)
}

async fn apply_change(
    txn: &DatabaseTransaction,
    key: LineKey,
    line: Option<CartModel>,
    change: LineChange,
) -> AppResult<CartMutation> {
    match (line, change) {
        (Some(line), LineChange::Keep(quantity)) => {
            let mut active: CartActive = line.into();
            active.quantity = Set(quantity);
            active.updated_at = Set(Utc::now().into());
            let line = active.update(txn).await?;
            Ok(CartMutation::Updated { line: line.into() })
        }
        (Some(line), LineChange::Remove) => {
            CartItems::delete_by_id(line.id).exec(txn).await?;
            Ok(CartMutation::Removed {
                product_id: Some(line.product_id),
            })
        }
        (None, LineChange::Remove) => Ok(CartMutation::Removed {
            product_id: key.product_id(),
        }),
        (None, LineChange::Keep(_)) => Err(AppError::NotFound("Cart item")),
    }
}

fn message_for(mutation: &CartMutation) -> &'static str {
    match mutation {
        CartMutation::Updated { .. } => "OK",
        CartMutation::Removed { .. } => "Item removed from cart",
    }
}
