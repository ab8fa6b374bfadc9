mod common;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use shop_checkout::{
    dto::{
        cart::{AddItemRequest, CartMutation},
        orders::CheckoutRequest,
    },
    entity::cart_items::{Column as CartCol, Entity as CartItems},
    error::AppError,
    services::{cart_service, order_service},
};
use uuid::Uuid;

fn add(product_id: Uuid, quantity: i32) -> AddItemRequest {
    AddItemRequest {
        product_id,
        quantity,
    }
}

#[tokio::test]
async fn repeated_adds_accumulate_quantity() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let product = common::create_product(&state, "Ferris Mug", 1_200).await?;

    let mut last = None;
    for _ in 0..4 {
        let resp = cart_service::add_item(&state, &user, add(product.id, 1)).await?;
        last = resp.data;
    }

    let line = last.expect("cart line");
    assert_eq!(line.quantity, 4);
    assert_eq!(line.product_id, product.id);

    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?;
    assert_eq!(lines.len(), 1, "one line per (owner, product)");
    Ok(())
}

#[tokio::test]
async fn add_unknown_product_is_not_found() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;

    let err = cart_service::add_item(&state, &user, add(Uuid::new_v4(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Product")));
    Ok(())
}

#[tokio::test]
async fn removing_past_zero_deletes_the_line() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let product = common::create_product(&state, "Sticker Pack", 500).await?;

    cart_service::add_item(&state, &user, add(product.id, 2)).await?;

    let first = cart_service::remove_item(&state, &user, product.id).await?;
    match first.data.expect("mutation") {
        CartMutation::Updated { line } => assert_eq!(line.quantity, 1),
        other => panic!("expected update, got {other:?}"),
    }

    let second = cart_service::remove_item(&state, &user, product.id).await?;
    assert!(matches!(
        second.data,
        Some(CartMutation::Removed { product_id: Some(id) }) if id == product.id
    ));

    let err = cart_service::remove_item(&state, &user, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn set_quantity_zero_is_idempotent_removal() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let product = common::create_product(&state, "Hoodie", 5_500).await?;

    cart_service::add_item(&state, &user, add(product.id, 3)).await?;

    cart_service::set_quantity(&state, &user, product.id, 0).await?;
    cart_service::set_quantity(&state, &user, product.id, 0).await?;

    let remaining = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?;
    assert!(remaining.is_empty());

    let err = cart_service::set_quantity(&state, &user, product.id, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn set_line_quantity_addresses_line_by_id() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let other = common::create_user(&state, "user").await?;
    let product = common::create_product(&state, "E-book", 2_500).await?;

    let line = cart_service::add_item(&state, &user, add(product.id, 1))
        .await?
        .data
        .expect("cart line");

    let resp = cart_service::set_line_quantity(&state, &user, line.id, 6).await?;
    assert!(matches!(
        resp.data,
        Some(CartMutation::Updated { line: updated }) if updated.quantity == 6
    ));

    // Another owner cannot touch the line.
    let err = cart_service::set_line_quantity(&state, &other, line.id, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn totals_match_the_worked_example_and_clear_resets_them() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let a = common::create_product(&state, "Product A", 5_000).await?;
    let b = common::create_product(&state, "Product B", 3_000).await?;

    cart_service::add_item(&state, &user, add(a.id, 1)).await?;
    cart_service::add_item(&state, &user, add(a.id, 1)).await?;
    cart_service::add_item(&state, &user, add(b.id, 1)).await?;

    let totals = cart_service::cart_totals(&state, Some(&user))
        .await?
        .data
        .expect("totals");
    assert_eq!((totals.total, totals.count), (13_000, 3));

    let listing = cart_service::list_cart(&state, Some(&user))
        .await?
        .data
        .expect("cart list");
    assert_eq!(listing.items.len(), 2);
    assert_eq!(listing.items.iter().map(|l| l.subtotal).sum::<i64>(), 13_000);

    let cleared = cart_service::clear_cart(&state, &user).await?.data.expect("cleared");
    assert_eq!(cleared.removed_lines, 2);

    let totals = cart_service::cart_totals(&state, Some(&user))
        .await?
        .data
        .expect("totals");
    assert_eq!((totals.total, totals.count), (0, 0));

    // Clearing an empty cart still succeeds.
    cart_service::clear_cart(&state, &user).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_adds_do_not_lose_updates() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let product = common::create_product(&state, "Contended Widget", 100).await?;

    let (first, second) = tokio::join!(
        cart_service::add_item(&state, &user, add(product.id, 1)),
        cart_service::add_item(&state, &user, add(product.id, 1)),
    );
    first?;
    second?;

    let line = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product.id))
        .one(&state.orm)
        .await?
        .expect("cart line");
    assert_eq!(line.quantity, 2);
    Ok(())
}

#[tokio::test]
async fn token_for_unknown_account_cannot_add_items() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let ghost = common::auth(Uuid::new_v4(), "user");
    let product = common::create_product(&state, "Orphan Sticker", 300).await?;

    let err = cart_service::add_item(&state, &ghost, add(product.id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
    assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);

    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(ghost.user_id))
        .all(&state.orm)
        .await?;
    assert!(lines.is_empty());
    Ok(())
}

#[tokio::test]
async fn oversized_cart_is_rejected_instead_of_overflowing() -> anyhow::Result<()> {
    let Some(state) = common::database_state().await? else {
        return Ok(());
    };
    let user = common::create_user(&state, "user").await?;
    let product = common::create_product(&state, "Gold Bar", 10_000_000_000).await?;

    cart_service::add_item(&state, &user, add(product.id, i32::MAX)).await?;

    let err = cart_service::cart_totals(&state, Some(&user))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = order_service::checkout(&state, &user, CheckoutRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .all(&state.orm)
        .await?;
    assert_eq!(lines.len(), 1, "rejected checkout leaves the cart alone");
    Ok(())
}
