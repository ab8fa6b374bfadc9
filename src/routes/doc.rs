use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{cart::CartTotals, order::OrderStatus},
    dto::{
        cart::{AddItemRequest, CartList, CartMutation, ClearedCart, RemoveItemRequest, SetQuantityRequest},
        orders::{
            CheckoutRequest, DeletedOrder, OrderList, OrderWithItems, RecordPaymentRequest,
            UpdateOrderStatusRequest,
        },
        products::ProductList,
    },
    models::{CartLine, CartLineDetail, Order, OrderLine, Payment, Product},
    routes::{admin, cart, health, orders, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        cart::cart_list,
        cart::cart_total,
        cart::add_item,
        cart::remove_item,
        cart::set_quantity,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::delete_order,
        orders::cancel_order,
        orders::record_payment,
        admin::update_order_status
    ),
    components(
        schemas(
            Product,
            ProductList,
            CartLine,
            CartLineDetail,
            CartList,
            CartTotals,
            CartMutation,
            ClearedCart,
            AddItemRequest,
            RemoveItemRequest,
            SetQuantityRequest,
            Order,
            OrderLine,
            OrderStatus,
            OrderWithItems,
            OrderList,
            Payment,
            CheckoutRequest,
            RecordPaymentRequest,
            UpdateOrderStatusRequest,
            DeletedOrder
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Read-only catalog lookups"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout, order lifecycle and payment records"),
        (name = "Admin", description = "Administrative order status updates"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
