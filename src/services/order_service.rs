use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    ActiveValue::NotSet,
    sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    db::begin_write,
    domain::order::{OrderSnapshot, PricedLine},
    dto::orders::{CheckoutRequest, DeletedOrder, OrderList, OrderWithItems, RecordPaymentRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderLine, Payment},
    response::ApiResponse,
    state::AppState,
};

/// Turns the caller's cart into an order and empties the cart, all in one
/// transaction. Cart rows are locked first, so a concurrent checkout of the
/// same cart waits and then finds it empty.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let status = payload.status.unwrap_or_default();
    let txn = begin_write(&state.orm).await?;

    let cart_lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .order_by_asc(CartCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    let product_ids: Vec<Uuid> = cart_lines.iter().map(|line| line.product_id).collect();
    let prices: HashMap<Uuid, i64> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product.price))
        .collect();

    let priced = cart_lines
        .iter()
        .map(|line| {
            let unit_price = prices
                .get(&line.product_id)
                .copied()
                .ok_or(AppError::NotFound("Product"))?;
            Ok(PricedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    let snapshot = OrderSnapshot::from_cart(priced)?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        status: Set(status.as_str().to_string()),
        total_amount: Set(snapshot.total),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderLine> = Vec::with_capacity(snapshot.lines.len());
    for line in &snapshot.lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(OrderLine::try_from(item)?);
    }

    // Only the locked lines: a line added after the snapshot stays in the cart.
    let consumed: Vec<Uuid> = cart_lines.iter().map(|line| line.id).collect();
    CartItems::delete_many()
        .filter(CartCol::Id.is_in(consumed))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        order_id = %order.id,
        total = order.total_amount,
        lines = items.len(),
        "checkout completed"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: Order::try_from(order)?,
            items,
            payment: None,
        },
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: Option<&AuthUser>,
) -> AppResult<ApiResponse<OrderList>> {
    let Some(user) = user else {
        return Ok(ApiResponse::success(
            "User not authenticated",
            OrderList { items: Vec::new() },
        ));
    };

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .order_by_desc(OrderCol::Id)
        .all(&state.orm)
        .await?;
    let items = with_details(&state.orm, orders).await?;

    Ok(ApiResponse::success("Ok", OrderList { items }))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_owned(&state.orm, user.user_id, id, false).await?;
    let details = single_with_details(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", details))
}

/// Cancels a pending or processing order. Delivered orders are final.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = begin_write(&state.orm).await?;
    let order = find_owned(&txn, user.user_id, id, true).await?;

    let current = Order::try_from(order.clone())?.status;
    let next = current.cancel()?;

    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let details = single_with_details(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, order_id = %id, from = %current, "order cancelled");
    audit::record(
        &state.orm,
        user.user_id,
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": id, "previous_status": current }),
    )
    .await;

    Ok(ApiResponse::success("Order cancelled", details))
}

/// Deletes an order; its lines and payment go with it.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<DeletedOrder>> {
    let txn = begin_write(&state.orm).await?;
    let order = find_owned(&txn, user.user_id, id, true).await?;

    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Payments::delete_many()
        .filter(PaymentCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(order.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, order_id = %id, "order deleted");
    audit::record(
        &state.orm,
        user.user_id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Order deleted", DeletedOrder { id }))
}

/// Stores the order's payment record. The amount is the order total; method
/// and status are kept as given.
pub async fn record_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RecordPaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    let method = payload.method.trim();
    if method.is_empty() {
        return Err(AppError::Validation("payment method is required".into()));
    }

    let txn = begin_write(&state.orm).await?;
    let order = find_owned(&txn, user.user_id, id, true).await?;
    Order::try_from(order.clone())?.status.ensure_payable()?;

    let existing = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Order already has a payment".into()));
    }

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        amount: Set(order.total_amount),
        method: Set(method.to_string()),
        status: Set(payload.status),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        order_id = %order.id,
        amount = payment.amount,
        "payment recorded"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "order_payment",
        "payments",
        serde_json::json!({ "order_id": order.id, "payment_id": payment.id }),
    )
    .await;

    Ok(ApiResponse::success("Payment recorded", payment.into()))
}

/// Loads an order owned by `user_id`, optionally locking it for update.
/// Orders of other users are reported as missing.
pub(crate) async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
    lock: bool,
) -> AppResult<OrderModel> {
    let mut finder = Orders::find().filter(
        Condition::all()
            .add(OrderCol::UserId.eq(user_id))
            .add(OrderCol::Id.eq(id)),
    );
    if lock {
        finder = finder.lock(LockType::Update);
    }

    finder.one(conn).await?.ok_or(AppError::NotFound("Order"))
}

pub(crate) async fn single_with_details<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    with_details(conn, vec![order])
        .await?
        .pop()
        .ok_or(AppError::NotFound("Order"))
}

/// Attaches lines and payment to each order, keeping the input order.
async fn with_details<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithItems>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();

    let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids.clone()))
        .order_by_asc(OrderItemCol::CreatedAt)
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?
    {
        let order_id = item.order_id;
        lines.entry(order_id).or_default().push(OrderLine::try_from(item)?);
    }

    let mut payments: HashMap<Uuid, Payment> = Payments::find()
        .filter(PaymentCol::OrderId.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|payment| (payment.order_id, payment.into()))
        .collect();

    orders
        .into_iter()
        .map(|order| {
            let id = order.id;
            Ok(OrderWithItems {
                order: Order::try_from(order)?,
                items: lines.remove(&id).unwrap_or_default(),
                payment: payments.remove(&id),
            })
        })
        .collect()
}
