use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder};
use uuid::Uuid;

use crate::{
    dto::products::ProductList,
    entity::products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    models::Product,
    response::ApiResponse,
    state::AppState,
};

/// Catalog lookup used by the cart. Fails with `NotFound` for unknown ids.
pub async fn find_product<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Product"))
}

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let items = Products::find()
        .order_by_desc(ProdCol::CreatedAt)
        .order_by_desc(ProdCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success("Products", ProductList { items }))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = find_product(&state.orm, id).await?;
    Ok(ApiResponse::success("Product", product.into()))
}
