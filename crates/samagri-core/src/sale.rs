//! # Sale Planning
//!
//! Turns a validated [`TransactionRequest`] into the two orderings a sale
//! needs, and prices it once the server-side prices are known.
//!
//! ## Two Orders, One Sale
//! ```text
//! request items          lock order (dedup + sort)      receipt order
//! ─────────────          ─────────────────────────      ─────────────
//! {p:5, q:1}             {p:1, q:3}                      {p:5, q:1}
//! {p:1, q:1}   ──────►   {p:5, q:1}                      {p:1, q:1}
//! {p:1, q:2}                                             {p:1, q:2}
//!
//! Inventory rows are locked in ascending product id, one lock per product.
//! Every sale uses the same global order, so two sales can never wait on
//! each other in a cycle. Items are written in request order.
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::api::TransactionRequest;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::validate_transaction_request;

/// A product and a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// A validated sale, ready to run inside a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    customer_id: i64,
    lines: Vec<SaleLine>,
    lock_order: Vec<SaleLine>,
}

impl SalePlan {
    /// Validates the request and builds the plan.
    ///
    /// ```rust
    /// use samagri_core::api::{TransactionItemRequest, TransactionRequest};
    /// use samagri_core::money::Money;
    /// use samagri_core::sale::{SaleLine, SalePlan};
    ///
    /// let item = |product_id, quantity| TransactionItemRequest {
    ///     product_id,
    ///     quantity,
    ///     price: Money::zero(),
    /// };
    /// let req = TransactionRequest {
    ///     customer_id: 7,
    ///     items: vec![item(5, 1), item(1, 1), item(1, 2)],
    /// };
    /// let plan = SalePlan::from_request(&req).unwrap();
    /// assert_eq!(
    ///     plan.lock_order(),
    ///     &[
    ///         SaleLine { product_id: 1, quantity: 3 },
    ///         SaleLine { product_id: 5, quantity: 1 },
    ///     ]
    /// );
    /// assert_eq!(plan.lines().len(), 3);
    /// ```
    pub fn from_request(req: &TransactionRequest) -> CoreResult<Self> {
        validate_transaction_request(req)?;

        let lines: Vec<SaleLine> = req
            .items
            .iter()
            .map(|item| SaleLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();

        let mut merged: BTreeMap<i64, i64> = BTreeMap::new();
        for line in &lines {
            let entry = merged.entry(line.product_id).or_insert(0);
            *entry = entry.checked_add(line.quantity).ok_or_else(|| {
                CoreError::from(ValidationError::invalid_format("quantity", "too large"))
            })?;
        }

        let lock_order = merged
            .into_iter()
            .map(|(product_id, quantity)| SaleLine {
                product_id,
                quantity,
            })
            .collect();

        Ok(SalePlan {
            customer_id: req.customer_id,
            lines,
            lock_order,
        })
    }

    pub fn customer_id(&self) -> i64 {
        self.customer_id
    }

    /// Lines in request order.
    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    /// One line per product, summed, ascending by product id.
    pub fn lock_order(&self) -> &[SaleLine] {
        &self.lock_order
    }

    /// Prices every request line with the server snapshot.
    ///
    /// `prices` must hold an entry for every product in the plan.
    pub fn price(&self, prices: &HashMap<i64, Money>) -> CoreResult<PricedSale> {
        let overflow =
            || CoreError::from(ValidationError::invalid_format("total_amount", "too large"));

        let mut total = Money::zero();
        let mut priced = Vec::with_capacity(self.lines.len());

        for line in &self.lines {
            let price = *prices
                .get(&line.product_id)
                .ok_or(CoreError::ProductNotFound(line.product_id))?;
            let line_total = price
                .checked_mul_quantity(line.quantity)
                .ok_or_else(overflow)?;
            total = total.checked_add(line_total).ok_or_else(overflow)?;
            priced.push(PricedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                price,
                line_total,
            });
        }

        Ok(PricedSale {
            lines: priced,
            total,
        })
    }
}

/// A request line with its price snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub price: Money,
    pub line_total: Money,
}

/// All lines priced, in request order, with the grand total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSale {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TransactionItemRequest;
    use proptest::prelude::*;

    fn request(items: &[(i64, i64, i64)]) -> TransactionRequest {
        TransactionRequest {
            customer_id: 7,
            items: items
                .iter()
                .map(|&(product_id, quantity, cents)| TransactionItemRequest {
                    product_id,
                    quantity,
                    price: Money::from_cents(cents),
                })
                .collect(),
        }
    }

    #[test]
    fn test_duplicate_lines_are_merged_for_locking_only() {
        let plan = SalePlan::from_request(&request(&[(1, 1, 0), (1, 2, 0)])).unwrap();
        assert_eq!(
            plan.lock_order(),
            &[SaleLine {
                product_id: 1,
                quantity: 3
            }]
        );
        assert_eq!(plan.lines().len(), 2);
        assert_eq!(plan.lines()[0].quantity, 1);
        assert_eq!(plan.lines()[1].quantity, 2);
    }

    #[test]
    fn test_invalid_request_is_rejected() {
        assert!(matches!(
            SalePlan::from_request(&request(&[])),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            SalePlan::from_request(&request(&[(1, 0, 100)])),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_price_uses_server_snapshot() {
        let plan = SalePlan::from_request(&request(&[(1, 1, 100)])).unwrap();
        let prices = HashMap::from([(1, Money::from_cents(300))]);
        let priced = plan.price(&prices).unwrap();
        assert_eq!(priced.total, Money::from_cents(300));
        assert_eq!(priced.lines[0].price, Money::from_cents(300));
    }

    #[test]
    fn test_price_requires_every_product() {
        let plan = SalePlan::from_request(&request(&[(1, 1, 100), (2, 1, 100)])).unwrap();
        let prices = HashMap::from([(1, Money::from_cents(300))]);
        assert!(matches!(
            plan.price(&prices),
            Err(CoreError::ProductNotFound(2))
        ));
    }

    #[test]
    fn test_price_overflow_is_a_validation_error() {
        let plan = SalePlan::from_request(&request(&[(1, 2, 0)])).unwrap();
        let prices = HashMap::from([(1, Money::from_cents(i64::MAX))]);
        assert!(matches!(plan.price(&prices), Err(CoreError::Validation(_))));
    }

    proptest! {
        #[test]
        fn lock_order_is_sorted_unique_and_preserves_sums(
            items in prop::collection::vec((1i64..20, 1i64..50), 1..30)
        ) {
            let triples: Vec<_> = items.iter().map(|&(p, q)| (p, q, 0)).collect();
            let plan = SalePlan::from_request(&request(&triples)).unwrap();

            let ids: Vec<i64> = plan.lock_order().iter().map(|l| l.product_id).collect();
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));

            for line in plan.lock_order() {
                let expected: i64 = items
                    .iter()
                    .filter(|(p, _)| *p == line.product_id)
                    .map(|(_, q)| q)
                    .sum();
                prop_assert_eq!(line.quantity, expected);
            }
        }

        #[test]
        fn total_is_sum_of_price_times_quantity(
            items in prop::collection::vec((1i64..20, 1i64..50), 1..30),
            price_seed in prop::collection::vec(0i64..100_000, 20)
        ) {
            let triples: Vec<_> = items.iter().map(|&(p, q)| (p, q, 0)).collect();
            let plan = SalePlan::from_request(&request(&triples)).unwrap();
            let prices: HashMap<i64, Money> = (1..20)
                .map(|id| (id, Money::from_cents(price_seed[id as usize])))
                .collect();

            let priced = plan.price(&prices).unwrap();
            let expected: i64 = items
                .iter()
                .map(|&(p, q)| price_seed[p as usize] * q)
                .sum();
            prop_assert_eq!(priced.total.cents(), expected);
            prop_assert_eq!(priced.lines.len(), items.len());
        }
    }
}
