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
    clients::geocoding::{PlaceDetails, PlaceSuggestion},
    domain::cart::{Cart, CartLine},
    dto::{
        addresses::{AddressList, AddressRequest},
        admin::{DashboardData, RevenuePoint},
        cart::{CartEntry, CartView, SetCartRequest},
        coupons::{CouponList, CreateCouponRequest, VerifyCouponRequest},
        location::PlaceSuggestionList,
        orders::{
            OrderItemDetail, OrderLineRequest, OrderList, OrderWithItems, PlaceOrderRequest,
            PlaceOrderResponse, StoreOrder, StoreOrderList, UpdateOrderStatusRequest,
        },
        products::{BulkLocationResult, ProductList, ProductLocationRequest, UpdateProductRequest},
        stores::{
            ApproveStoreRequest, CreateStoreRequest, StoreDecision, StoreList, StoreWithProducts,
            ToggleStoreRequest,
        },
        webhooks::WebhookAck,
    },
    entity::{OrderStatus, PaymentMethod, StockStatus, StoreStatus},
    models::{Address, Coupon, GeoLocation, Order, OrderItem, Product, Store, User},
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, cart, coupons, health, location, orders, params, products, stores,
        webhooks,
    },
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
        products::filter_products,
        products::get_product,
        cart::get_cart,
        cart::set_cart,
        addresses::list_addresses,
        addresses::create_address,
        addresses::update_address,
        addresses::delete_address,
        orders::list_orders,
        orders::place_order,
        coupons::verify_coupon,
        stores::create_store,
        stores::seller_store,
        stores::store_page,
        stores::list_store_products,
        stores::create_product,
        stores::update_product,
        stores::list_store_orders,
        stores::update_order_status,
        admin::dashboard,
        admin::list_stores,
        admin::approve_store,
        admin::toggle_store,
        admin::list_coupons,
        admin::create_coupon,
        admin::delete_coupon,
        admin::filter_products,
        admin::products_without_location,
        admin::set_product_location,
        admin::copy_store_locations,
        location::autocomplete,
        location::place_details,
        webhooks::payment_webhook,
        webhooks::identity_webhook
    ),
    components(
        schemas(
            User,
            Store,
            GeoLocation,
            Product,
            Address,
            Coupon,
            Order,
            OrderItem,
            StoreStatus,
            StockStatus,
            OrderStatus,
            PaymentMethod,
            Cart,
            CartLine,
            CartEntry,
            CartView,
            SetCartRequest,
            AddressRequest,
            AddressList,
            OrderLineRequest,
            PlaceOrderRequest,
            PlaceOrderResponse,
            OrderItemDetail,
            OrderWithItems,
            OrderList,
            StoreOrder,
            StoreOrderList,
            UpdateOrderStatusRequest,
            VerifyCouponRequest,
            CreateCouponRequest,
            CouponList,
            UpdateProductRequest,
            ProductLocationRequest,
            ProductList,
            BulkLocationResult,
            CreateStoreRequest,
            StoreWithProducts,
            StoreList,
            ToggleStoreRequest,
            StoreDecision,
            ApproveStoreRequest,
            RevenuePoint,
            DashboardData,
            PlaceSuggestion,
            PlaceSuggestionList,
            PlaceDetails,
            WebhookAck,
            params::Pagination,
            params::SortOrder,
            params::ProductSort,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderList>,
            ApiResponse<PlaceOrderResponse>,
            ApiResponse<DashboardData>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Public catalog"),
        (name = "Cart", description = "Buyer cart"),
        (name = "Addresses", description = "Buyer shipping addresses"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Coupons", description = "Coupon verification"),
        (name = "Stores", description = "Seller onboarding and store management"),
        (name = "Admin", description = "Marketplace administration"),
        (name = "Location", description = "Place search proxy"),
        (name = "Webhooks", description = "Payment and identity provider callbacks"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_checkout_and_webhooks() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/orders"));
        assert!(doc.paths.paths.contains_key("/api/webhooks/payments"));
        assert!(doc.paths.paths.contains_key("/api/admin/products/{id}/location"));
    }
}
