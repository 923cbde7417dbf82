//! Checkout pricing: split a basket by seller and total each seller's order.
//!
//! All amounts are integer cents. The coupon discount is applied per seller
//! group and rounded half-up to the cent. The flat shipping fee is charged at
//! most once per checkout and always lands on the group with the lowest
//! store id, so the split does not depend on the order items were submitted.

use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("order amount is too large")]
    AmountOverflow,
}

/// A basket line resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub quantity: i32,
    /// Unit price captured at checkout time.
    pub unit_price: i64,
}

/// One seller's share of a checkout, ready to be persisted as an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOrderDraft {
    pub store_id: Uuid,
    pub lines: Vec<PricedLine>,
    pub subtotal: i64,
    pub discount: i64,
    pub shipping: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct PricingRules {
    /// Coupon discount in percent, 1..=100.
    pub discount_percent: Option<i32>,
    pub shipping_fee: i64,
    pub waive_shipping: bool,
}

/// `amount * percent / 100`, rounded half-up.
pub fn percent_of(amount: i64, percent: i32) -> i64 {
    let scaled = i128::from(amount) * i128::from(percent);
    let rounded = (scaled + 50).div_euclid(100);
    i64::try_from(rounded).unwrap_or(i64::MAX)
}

/// Group lines by owning store, merging repeated products.
///
/// Groups come back ordered by store id; lines inside a group by product id.
pub fn split_by_store(lines: Vec<PricedLine>) -> BTreeMap<Uuid, Vec<PricedLine>> {
    let mut groups: BTreeMap<Uuid, BTreeMap<Uuid, PricedLine>> = BTreeMap::new();
    for line in lines {
        groups
            .entry(line.store_id)
            .or_default()
            .entry(line.product_id)
            .and_modify(|existing| existing.quantity = existing.quantity.saturating_add(line.quantity))
            .or_insert(line);
    }
    groups
        .into_iter()
        .map(|(store_id, by_product)| (store_id, by_product.into_values().collect()))
        .collect()
}

fn line_amount(line: &PricedLine) -> Result<i64, PricingError> {
    line.unit_price
        .checked_mul(i64::from(line.quantity))
        .ok_or(PricingError::AmountOverflow)
}

/// Price each seller group. Fails instead of wrapping when an amount does
/// not fit in `i64` cents.
pub fn price_checkout(
    lines: Vec<PricedLine>,
    rules: PricingRules,
) -> Result<Vec<StoreOrderDraft>, PricingError> {
    let mut shipping_pending = !rules.waive_shipping && rules.shipping_fee > 0;

    split_by_store(lines)
        .into_iter()
        .map(|(store_id, lines)| {
            let subtotal = lines.iter().try_fold(0_i64, |acc, line| {
                acc.checked_add(line_amount(line)?)
                    .ok_or(PricingError::AmountOverflow)
            })?;
            let discount = rules
                .discount_percent
                .map_or(0, |percent| percent_of(subtotal, percent));
            let shipping = if shipping_pending {
                shipping_pending = false;
                rules.shipping_fee
            } else {
                0
            };
            let total = (subtotal - discount)
                .checked_add(shipping)
                .ok_or(PricingError::AmountOverflow)?;
            Ok(StoreOrderDraft {
                store_id,
                lines,
                subtotal,
                discount,
                shipping,
                total,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(store: Uuid, unit_price: i64, quantity: i32) -> PricedLine {
        PricedLine {
            product_id: Uuid::new_v4(),
            store_id: store,
            quantity,
            unit_price,
        }
    }

    fn ordered_stores() -> (Uuid, Uuid) {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        if a < b { (a, b) } else { (b, a) }
    }

    const NO_COUPON: PricingRules = PricingRules {
        discount_percent: None,
        shipping_fee: 500,
        waive_shipping: false,
    };

    #[test]
    fn one_draft_per_seller_with_only_its_lines() {
        let (s1, s2) = ordered_stores();
        let s3 = Uuid::new_v4();
        let drafts = price_checkout(
            vec![line(s1, 100, 1), line(s2, 200, 1), line(s3, 300, 2), line(s1, 50, 4)],
            NO_COUPON,
        )
        .expect("priced");
        assert_eq!(drafts.len(), 3);
        for draft in &drafts {
            assert!(draft.lines.iter().all(|l| l.store_id == draft.store_id));
        }
        let first = drafts.iter().find(|d| d.store_id == s1).expect("store 1");
        assert_eq!(first.lines.len(), 2);
        assert_eq!(first.subtotal, 300);
    }

    #[test]
    fn worked_example_two_sellers_no_coupon() {
        let (s1, s2) = ordered_stores();
        let drafts = price_checkout(vec![line(s2, 2000, 1), line(s1, 1000, 2)], NO_COUPON)
            .expect("priced");
        assert_eq!(drafts[0].store_id, s1);
        assert_eq!(drafts[0].total, 2500);
        assert_eq!(drafts[1].store_id, s2);
        assert_eq!(drafts[1].total, 2000);
    }

    #[test]
    fn shipping_charged_once_regardless_of_seller_count() {
        let lines: Vec<_> = (0..5).map(|_| line(Uuid::new_v4(), 1000, 1)).collect();
        let drafts = price_checkout(lines, NO_COUPON).expect("priced");
        let shipping: i64 = drafts.iter().map(|d| d.shipping).sum();
        assert_eq!(shipping, 500);
        assert_eq!(drafts[0].shipping, 500);
    }

    #[test]
    fn members_pay_no_shipping() {
        let (s1, s2) = ordered_stores();
        let drafts = price_checkout(
            vec![line(s1, 1000, 1), line(s2, 1000, 1)],
            PricingRules {
                waive_shipping: true,
                ..NO_COUPON
            },
        )
        .expect("priced");
        assert!(drafts.iter().all(|d| d.shipping == 0 && d.total == 1000));
    }

    #[test]
    fn coupon_discounts_each_group_before_shipping() {
        let (s1, s2) = ordered_stores();
        let drafts = price_checkout(
            vec![line(s1, 1999, 1), line(s2, 1000, 3)],
            PricingRules {
                discount_percent: Some(10),
                ..NO_COUPON
            },
        )
        .expect("priced");
        // 1999 - 199.9 rounds to 1799, plus shipping.
        assert_eq!(drafts[0].discount, 200);
        assert_eq!(drafts[0].total, 1999 - 200 + 500);
        assert_eq!(drafts[1].discount, 300);
        assert_eq!(drafts[1].total, 2700);
    }

    #[test]
    fn repeated_products_are_merged() {
        let store = Uuid::new_v4();
        let product = Uuid::new_v4();
        let mk = |quantity| PricedLine {
            product_id: product,
            store_id: store,
            quantity,
            unit_price: 250,
        };
        let groups = split_by_store(vec![mk(1), mk(2)]);
        assert_eq!(groups[&store].len(), 1);
        assert_eq!(groups[&store][0].quantity, 3);
    }

    #[test]
    fn oversized_amounts_are_an_error_not_a_wrap() {
        let store = Uuid::new_v4();
        assert_eq!(
            price_checkout(vec![line(store, i64::MAX / 2, 3)], NO_COUPON),
            Err(PricingError::AmountOverflow)
        );
        assert_eq!(
            price_checkout(
                vec![line(store, i64::MAX / 2, 1), line(store, i64::MAX / 2, 1)],
                NO_COUPON
            ),
            Err(PricingError::AmountOverflow)
        );
        assert_eq!(
            price_checkout(vec![line(store, i64::MAX - 100, 1)], NO_COUPON),
            Err(PricingError::AmountOverflow)
        );
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(1999, 10), 200);
        assert_eq!(percent_of(1994, 10), 199);
        assert_eq!(percent_of(1995, 10), 200);
        assert_eq!(percent_of(1000, 100), 1000);
        assert_eq!(percent_of(0, 50), 0);
    }
}
