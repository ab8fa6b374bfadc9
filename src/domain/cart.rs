use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Quantity used by add-item when the caller does not send one.
pub const DEFAULT_ADD_QUANTITY: i32 = 1;

/// What should happen to a cart line after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// Keep the line with this quantity (always >= 1).
    Keep(i32),
    Remove,
}

pub fn validate_add_quantity(quantity: i32) -> AppResult<i32> {
    if quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }
    Ok(quantity)
}

/// Decrement by one; the line goes away once it would reach zero.
pub fn remove_one(current: Option<i32>) -> AppResult<LineChange> {
    let current = current.ok_or(AppError::NotFound("Cart item"))?;
    let next = current.saturating_sub(1);
    if next <= 0 {
        Ok(LineChange::Remove)
    } else {
        Ok(LineChange::Keep(next))
    }
}

/// A non-positive quantity removes the line and is accepted even when the line
/// is already gone. A positive quantity only applies to an existing line.
pub fn set_quantity(current: Option<i32>, requested: i32) -> AppResult<LineChange> {
    if requested <= 0 {
        return Ok(LineChange::Remove);
    }
    match current {
        Some(_) => Ok(LineChange::Keep(requested)),
        None => Err(AppError::NotFound("Cart item")),
    }
}

fn total_too_large() -> AppError {
    AppError::Validation("cart total is too large".to_string())
}

pub fn subtotal(unit_price: i64, quantity: i32) -> AppResult<i64> {
    unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(total_too_large)
}

/// Adds subtotals without wrapping.
pub fn sum_money<I>(amounts: I) -> AppResult<i64>
where
    I: IntoIterator<Item = AppResult<i64>>,
{
    amounts.into_iter().try_fold(0i64, |acc, amount| {
        acc.checked_add(amount?).ok_or_else(total_too_large)
    })
}

/// Money total and item count of a cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartTotals {
    pub total: i64,
    pub count: i64,
}

impl CartTotals {
    /// Sums `(unit_price, quantity)` pairs.
    pub fn from_lines<I>(lines: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (i64, i32)>,
    {
        lines
            .into_iter()
            .try_fold(Self::default(), |acc, (unit_price, quantity)| {
                Ok(Self {
                    total: acc
                        .total
                        .checked_add(subtotal(unit_price, quantity)?)
                        .ok_or_else(total_too_large)?,
                    count: acc
                        .count
                        .checked_add(i64::from(quantity))
                        .ok_or_else(total_too_large)?,
                })
            })
    }
}
