use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::cart::{subtotal, sum_money},
    error::{AppError, AppResult},
};

/// Order lifecycle:
///
/// ```text
/// Pending -> Processing -> Delivered
///    \           \
///     +-----------+-----> Cancelled
/// ```
///
/// Only `cancel` is guarded. Administrative updates may set any status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn cancel(self) -> AppResult<Self> {
        match self {
            OrderStatus::Delivered => Err(AppError::InvalidTransition(
                "cannot cancel a delivered order".to_string(),
            )),
            _ => Ok(OrderStatus::Cancelled),
        }
    }

    pub fn ensure_payable(self) -> AppResult<()> {
        match self {
            OrderStatus::Cancelled => Err(AppError::InvalidTransition(
                "cannot record a payment for a cancelled order".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(AppError::Validation(format!("unknown order status `{other}`"))),
        }
    }
}

/// A cart line priced at checkout time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

impl PricedLine {
    pub fn subtotal(&self) -> AppResult<i64> {
        subtotal(self.unit_price, self.quantity)
    }
}

/// The lines and total an order is created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub lines: Vec<PricedLine>,
    pub total: i64,
}

impl OrderSnapshot {
    /// Rejects an empty cart, so every order has at least one line.
    pub fn from_cart(lines: Vec<PricedLine>) -> AppResult<Self> {
        if lines.is_empty() {
            return Err(AppError::Validation("Cart is empty".into()));
        }
        if lines.iter().any(|line| line.quantity <= 0) {
            return Err(AppError::Validation("Cart has invalid quantity".into()));
        }

        let total = sum_money(lines.iter().map(PricedLine::subtotal))?;
        Ok(Self { lines, total })
    }
}
