use shop_checkout::{
    domain::order::{OrderSnapshot, OrderStatus, PricedLine},
    error::AppError,
};
use uuid::Uuid;

#[test]
fn pending_and_processing_orders_can_be_cancelled() {
    assert_eq!(OrderStatus::Pending.cancel().unwrap(), OrderStatus::Cancelled);
    assert_eq!(OrderStatus::Processing.cancel().unwrap(), OrderStatus::Cancelled);
}

#[test]
fn delivered_orders_cannot_be_cancelled() {
    assert!(matches!(
        OrderStatus::Delivered.cancel(),
        Err(AppError::InvalidTransition(_))
    ));
}

#[test]
fn cancelling_twice_is_accepted() {
    assert_eq!(OrderStatus::Cancelled.cancel().unwrap(), OrderStatus::Cancelled);
}

#[test]
fn new_orders_default_to_pending() {
    assert_eq!(OrderStatus::default(), OrderStatus::Pending);
}

#[test]
fn cancelled_orders_do_not_accept_payments() {
    assert!(OrderStatus::Pending.ensure_payable().is_ok());
    assert!(OrderStatus::Delivered.ensure_payable().is_ok());
    assert!(matches!(
        OrderStatus::Cancelled.ensure_payable(),
        Err(AppError::InvalidTransition(_))
    ));
}

#[test]
fn status_parses_from_its_stored_form() {
    assert_eq!("processing".parse::<OrderStatus>().unwrap(), OrderStatus::Processing);
    assert_eq!(OrderStatus::Delivered.to_string(), "delivered");
    assert!(matches!(
        "shipped".parse::<OrderStatus>(),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn status_uses_lowercase_on_the_wire() {
    let status: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
    assert_eq!(status, OrderStatus::Cancelled);
    assert_eq!(serde_json::to_string(&OrderStatus::Pending).unwrap(), "\"pending\"");
}

#[test]
fn snapshot_total_is_sum_of_line_subtotals() {
    let a = PricedLine {
        product_id: Uuid::new_v4(),
        quantity: 2,
        unit_price: 5_000,
    };
    let b = PricedLine {
        product_id: Uuid::new_v4(),
        quantity: 1,
        unit_price: 3_000,
    };

    let snapshot = OrderSnapshot::from_cart(vec![a, b]).unwrap();
    assert_eq!(snapshot.total, 13_000);
    assert_eq!(snapshot.lines, vec![a, b]);
    assert_eq!(
        snapshot
            .lines
            .iter()
            .map(|line| line.subtotal().unwrap())
            .sum::<i64>(),
        snapshot.total
    );
}

#[test]
fn empty_cart_cannot_be_snapshotted() {
    assert!(matches!(
        OrderSnapshot::from_cart(Vec::new()),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn snapshot_rejects_non_positive_quantities() {
    let line = PricedLine {
        product_id: Uuid::new_v4(),
        quantity: 0,
        unit_price: 100,
    };
    assert!(matches!(
        OrderSnapshot::from_cart(vec![line]),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn snapshot_total_that_overflows_is_rejected() {
    let line = PricedLine {
        product_id: Uuid::new_v4(),
        quantity: i32::MAX,
        unit_price: 10_000_000_000,
    };
    assert!(matches!(
        OrderSnapshot::from_cart(vec![line]),
        Err(AppError::Validation(_))
    ));

    let big = PricedLine {
        product_id: Uuid::new_v4(),
        quantity: 1,
        unit_price: i64::MAX / 2 + 1,
    };
    assert!(matches!(
        OrderSnapshot::from_cart(vec![big, big]),
        Err(AppError::Validation(_))
    ));
}
