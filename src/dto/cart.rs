use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::cart::DEFAULT_ADD_QUANTITY,
    models::{CartLine, CartLineDetail},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_add_quantity")]
    pub quantity: i32,
}

fn default_add_quantity() -> i32 {
    DEFAULT_ADD_QUANTITY
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveItemRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartLineDetail>,
}

/// Result of a cart mutation that may delete the line.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CartMutation {
    Updated { line: CartLine },
    /// `product_id` is `None` when a line addressed by id was already gone.
    Removed { product_id: Option<Uuid> },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearedCart {
    pub removed_lines: u64,
}
