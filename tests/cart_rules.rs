use shop_checkout::{
    domain::cart::{self, CartTotals, LineChange},
    error::AppError,
};

#[test]
fn add_quantity_must_be_positive() {
    assert_eq!(cart::validate_add_quantity(1).unwrap(), 1);
    assert_eq!(cart::validate_add_quantity(5).unwrap(), 5);
    assert!(matches!(
        cart::validate_add_quantity(0),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        cart::validate_add_quantity(-3),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn remove_one_decrements_until_the_line_is_gone() {
    assert_eq!(cart::remove_one(Some(3)).unwrap(), LineChange::Keep(2));
    assert_eq!(cart::remove_one(Some(2)).unwrap(), LineChange::Keep(1));
    assert_eq!(cart::remove_one(Some(1)).unwrap(), LineChange::Remove);
}

#[test]
fn remove_one_on_missing_line_is_not_found() {
    assert!(matches!(cart::remove_one(None), Err(AppError::NotFound(_))));
}

#[test]
fn repeated_removals_never_leave_a_non_positive_line() {
    let mut quantity = Some(4);
    let mut removals = 0;
    while let Some(current) = quantity {
        removals += 1;
        quantity = match cart::remove_one(Some(current)).unwrap() {
            LineChange::Keep(next) => {
                assert!(next >= 1, "kept quantity must stay positive");
                Some(next)
            }
            LineChange::Remove => None,
        };
    }
    assert_eq!(removals, 4);
    assert!(cart::remove_one(quantity).is_err());
}

#[test]
fn set_quantity_to_zero_or_below_removes_even_when_absent() {
    assert_eq!(cart::set_quantity(Some(2), 0).unwrap(), LineChange::Remove);
    assert_eq!(cart::set_quantity(Some(2), -1).unwrap(), LineChange::Remove);
    assert_eq!(cart::set_quantity(None, 0).unwrap(), LineChange::Remove);
}

#[test]
fn set_quantity_overwrites_existing_line_only() {
    assert_eq!(cart::set_quantity(Some(1), 7).unwrap(), LineChange::Keep(7));
    assert!(matches!(
        cart::set_quantity(None, 7),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn totals_sum_subtotals_and_quantities() {
    // 50.00 x 2 + 30.00 x 1, in minor units.
    let totals = CartTotals::from_lines([(5_000, 2), (3_000, 1)]).unwrap();
    assert_eq!(totals, CartTotals { total: 13_000, count: 3 });
}

#[test]
fn totals_of_empty_cart_are_zero() {
    let totals = CartTotals::from_lines(std::iter::empty()).unwrap();
    assert_eq!(totals, CartTotals { total: 0, count: 0 });
}

#[test]
fn subtotal_does_not_overflow_i32_quantities() {
    assert_eq!(
        cart::subtotal(1_000_000, i32::MAX).unwrap(),
        1_000_000 * i64::from(i32::MAX)
    );
}

#[test]
fn oversized_line_is_rejected_instead_of_wrapping() {
    assert!(matches!(
        cart::subtotal(10_000_000_000, i32::MAX),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        CartTotals::from_lines([(10_000_000_000, i32::MAX)]),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn totals_reject_a_sum_past_the_money_range() {
    let half = i64::MAX / 2 + 1;
    assert!(matches!(
        CartTotals::from_lines([(half, 1), (half, 1)]),
        Err(AppError::Validation(_))
    ));
}
