use std::collections::{BTreeMap, HashMap};

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    clients::payments::ChargeLine,
    domain::pricing::{PricedLine, PricingRules, StoreOrderDraft, price_checkout},
    dto::orders::{OrderItemDetail, OrderList, OrderWithItems, PlaceOrderRequest, PlaceOrderResponse},
    entity::{
        Addresses, OrderItems, OrderStatus, Orders, PaymentMethod, Products, Stores, addresses,
        order_items, orders, products, stores,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, Coupon, Order, OrderItem, Product},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{cart_service::clear_cart, coupon_service::evaluate_coupon, identity_service::ensure_user},
    state::AppState,
};

/// A checkout request after field validation, duplicate lines merged.
#[derive(Debug)]
struct ValidatedCheckout {
    address_id: Uuid,
    lines: BTreeMap<Uuid, i32>,
    coupon_code: Option<String>,
    payment_method: PaymentMethod,
}

fn validate(payload: PlaceOrderRequest) -> AppResult<ValidatedCheckout> {
    let (Some(address_id), Some(payment_method)) = (payload.address_id, payload.payment_method)
    else {
        return Err(AppError::BadRequest("missing order details".into()));
    };
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("missing order details".into()));
    }

    let mut lines: BTreeMap<Uuid, i32> = BTreeMap::new();
    for item in payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(format!(
                "quantity for product {} must be greater than 0",
                item.product_id
            )));
        }
        let quantity = lines.entry(item.product_id).or_insert(0);
        *quantity = quantity
            .checked_add(item.quantity)
            .ok_or_else(|| AppError::BadRequest("quantity is too large".into()))?;
    }

    let coupon_code = payload
        .coupon_code
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty());

    Ok(ValidatedCheckout {
        address_id,
        lines,
        coupon_code,
        payment_method,
    })
}

/// Decrement stock only if enough is left. Returns false when it was not.
async fn reserve_stock<C: ConnectionTrait>(conn: &C, product_id: Uuid, quantity: i32) -> AppResult<bool> {
    let result = Products::update_many()
        .col_expr(
            products::Column::Stock,
            Expr::col(products::Column::Stock).sub(quantity),
        )
        .col_expr(products::Column::UpdatedAt, Expr::current_timestamp().into())
        .filter(products::Column::Id.eq(product_id))
        .filter(products::Column::Stock.gte(quantity))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Put the quantities of the given orders' items back on the shelf.
pub(crate) async fn restore_stock<C: ConnectionTrait>(conn: &C, order_ids: &[Uuid]) -> AppResult<()> {
    if order_ids.is_empty() {
        return Ok(());
    }
    let items = OrderItems::find()
        .filter(order_items::Column::OrderId.is_in(order_ids.iter().copied()))
        .all(conn)
        .await?;
    for item in items {
        Products::update_many()
            .col_expr(
                products::Column::Stock,
                Expr::col(products::Column::Stock).add(item.quantity),
            )
            .col_expr(products::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(products::Column::Id.eq(item.product_id))
            .exec(conn)
            .await?;
    }
    Ok(())
}

async fn persist_draft<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    address_id: Uuid,
    payment_method: PaymentMethod,
    coupon: Option<&Coupon>,
    draft: &StoreOrderDraft,
) -> AppResult<(orders::Model, Vec<order_items::Model>)> {
    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id.to_string()),
        store_id: Set(draft.store_id),
        address_id: Set(address_id),
        total: Set(draft.total),
        status: Set(OrderStatus::OrderPlaced),
        payment_method: Set(payment_method),
        is_paid: Set(false),
        is_coupon_used: Set(coupon.is_some()),
        coupon: Set(coupon
            .and_then(|c| serde_json::to_value(c).ok())
            .unwrap_or_else(|| json!({}))),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    let mut items = Vec::with_capacity(draft.lines.len());
    for line in &draft.lines {
        let item = order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
        items.push(item);
    }
    Ok((order, items))
}

/// Split a checkout into one order per seller.
///
/// Everything runs in one transaction: stock reservation, order rows, the
/// cart reset and, for card payments, opening the checkout session. Any
/// failure leaves the database untouched.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlaceOrderResponse>> {
    let checkout = validate(payload)?;
    let is_member = user.is_member(&state.config.checkout.member_plan);

    ensure_user(&state.orm, &user.user_id).await?;
    let txn = state.orm.begin().await?;

    let address = Addresses::find_by_id(checkout.address_id)
        .filter(addresses::Column::UserId.eq(user.user_id.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Address not found"))?;

    let catalog: HashMap<Uuid, products::Model> = Products::find()
        .filter(products::Column::Id.is_in(checkout.lines.keys().copied()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut priced = Vec::with_capacity(checkout.lines.len());
    for (product_id, quantity) in &checkout.lines {
        let product = catalog
            .get(product_id)
            .ok_or_else(|| AppError::not_found(format!("Product {product_id} not found")))?;
        if !product.stock_status.is_orderable() {
            return Err(AppError::Conflict(format!(
                "{} is currently unavailable",
                product.name
            )));
        }
        priced.push(PricedLine {
            product_id: *product_id,
            store_id: product.store_id,
            quantity: *quantity,
            unit_price: product.price,
        });
    }

    let coupon = match &checkout.coupon_code {
        Some(code) => Some(
            evaluate_coupon(&txn, code, user, &state.config.checkout.member_plan).await?,
        ),
        None => None,
    };

    let drafts = price_checkout(
        priced,
        PricingRules {
            discount_percent: coupon.as_ref().map(|c| c.discount),
            shipping_fee: state.config.checkout.shipping_fee,
            waive_shipping: is_member,
        },
    )
    .map_err(|err| AppError::BadRequest(err.to_string()))?;

    let mut placed = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        for line in &draft.lines {
            if !reserve_stock(&txn, line.product_id, line.quantity).await? {
                let name = catalog
                    .get(&line.product_id)
                    .map_or("product", |p| p.name.as_str());
                return Err(AppError::Conflict(format!("Insufficient stock for {name}")));
            }
        }
        placed.push(
            persist_draft(
                &txn,
                &user.user_id,
                address.id,
                checkout.payment_method,
                coupon.as_ref(),
                draft,
            )
            .await?,
        );
    }

    clear_cart(&txn, &user.user_id).await?;

    let grand_total: i64 = drafts.iter().map(|d| d.total).sum();

    let checkout_url = if checkout.payment_method.is_deferred() {
        let store_names: HashMap<Uuid, String> = Stores::find()
            .filter(stores::Column::Id.is_in(drafts.iter().map(|d| d.store_id)))
            .all(&txn)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        let charges: Vec<ChargeLine> = placed
            .iter()
            .map(|(order, _)| ChargeLine {
                order_id: order.id,
                label: match store_names.get(&order.store_id) {
                    Some(name) => format!("Order from {name}"),
                    None => "Marketplace order".to_string(),
                },
                amount: order.total,
            })
            .collect();
        let session = state
            .payments
            .create_checkout_session(&user.user_id, &charges)
            .await?;
        session.url
    } else {
        None
    };

    txn.commit().await?;

    let order_ids: Vec<Uuid> = placed.iter().map(|(order, _)| order.id).collect();
    tracing::info!(
        user_id = %user.user_id,
        orders = order_ids.len(),
        grand_total,
        payment_method = ?checkout.payment_method,
        "order placed"
    );
    audit::record(
        &state.pool,
        Some(&user.user_id),
        "order_create",
        "orders",
        json!({ "order_ids": order_ids, "grand_total": grand_total }),
    )
    .await;

    let address = Address::from(address);
    let orders = placed
        .into_iter()
        .map(|(order, items)| OrderWithItems {
            order: Order::from(order),
            items: items
                .into_iter()
                .map(|item| {
                    let product = catalog.get(&item.product_id).cloned().map(Product::from);
                    OrderItemDetail {
                        item: OrderItem::from(item),
                        product,
                    }
                })
                .collect(),
            address: Some(address.clone()),
        })
        .collect();

    Ok(ApiResponse::success(
        "Order placed successfully",
        PlaceOrderResponse {
            orders,
            grand_total,
            checkout_url,
        },
        Some(Meta::empty()),
    ))
}

/// Attach items (with their products) and the delivery address to orders.
pub async fn hydrate_orders<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<orders::Model>,
) -> AppResult<Vec<OrderWithItems>> {
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let address_ids: Vec<Uuid> = orders.iter().map(|o| o.address_id).collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
    for (item, product) in OrderItems::find()
        .filter(order_items::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_items::Column::CreatedAt)
        .find_also_related(Products)
        .all(conn)
        .await?
    {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItemDetail {
                item: OrderItem::from(item),
                product: product.map(Product::from),
            });
    }

    let addresses: HashMap<Uuid, addresses::Model> = Addresses::find()
        .filter(addresses::Column::Id.is_in(address_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    Ok(orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            address: addresses.get(&order.address_id).cloned().map(Address::from),
            order: Order::from(order),
        })
        .collect())
}

/// The buyer's orders: cash on delivery ones, and card ones once paid.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let visible = Condition::any()
        .add(orders::Column::PaymentMethod.eq(PaymentMethod::Cod))
        .add(
            Condition::all()
                .add(orders::Column::PaymentMethod.eq(PaymentMethod::Stripe))
                .add(orders::Column::IsPaid.eq(true)),
        );
    let mut finder = Orders::find()
        .filter(orders::Column::UserId.eq(user.user_id.as_str()))
        .filter(visible);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(orders::Column::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(orders::Column::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = hydrate_orders(&state.orm, orders).await?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::orders::OrderLineRequest;

    fn request(items: Vec<(Uuid, i32)>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            address_id: Some(Uuid::new_v4()),
            items: items
                .into_iter()
                .map(|(product_id, quantity)| OrderLineRequest {
                    product_id,
                    quantity,
                })
                .collect(),
            coupon_code: Some("  ".into()),
            payment_method: Some(PaymentMethod::Cod),
        }
    }

    #[test]
    fn merges_duplicate_lines_and_drops_blank_coupon() {
        let product = Uuid::new_v4();
        let checkout = validate(request(vec![(product, 2), (product, 3)])).expect("valid");
        assert_eq!(checkout.lines.len(), 1);
        assert_eq!(checkout.lines[&product], 5);
        assert!(checkout.coupon_code.is_none());
    }

    #[test]
    fn rejects_missing_details_and_bad_quantities() {
        let mut missing_method = request(vec![(Uuid::new_v4(), 1)]);
        missing_method.payment_method = None;
        assert!(matches!(validate(missing_method), Err(AppError::BadRequest(_))));

        assert!(matches!(validate(request(vec![])), Err(AppError::BadRequest(_))));
        assert!(matches!(
            validate(request(vec![(Uuid::new_v4(), 0)])),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn accepts_storefront_item_shape() {
        let payload: PlaceOrderRequest = serde_json::from_str(&format!(
            r#"{{"address_id":"{}","items":[{{"id":"{}","quantity":1}}],"payment_method":"STRIPE"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        ))
        .expect("payload");
        let checkout = validate(payload).expect("valid");
        assert_eq!(checkout.payment_method, PaymentMethod::Stripe);
    }
}
