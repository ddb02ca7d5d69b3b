//! Pricing
//!
//! Prices a cart by supplier group: goods subtotal, coupon discount and the region dependent
//! delivery fee, summed into order totals.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    coupons::{CouponError, CouponRedemption},
    money::{Amount, percent_points},
    regions::{Region, RegionError, WarehouseDirectory},
    routing::{RoutingError, delivery_fee},
};

/// Errors that can occur while pricing a cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// There is nothing to price.
    #[error("cart is empty")]
    EmptyCart,

    /// A line has a zero quantity.
    #[error("product {0} has an invalid quantity")]
    InvalidQuantity(Uuid),

    /// The coupon cannot be applied.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// A supplier or destination region has no warehouse.
    #[error(transparent)]
    Region(#[from] RegionError),

    /// Amount arithmetic overflowed.
    #[error("order total overflowed")]
    Overflow,
}

impl From<RoutingError> for PricingError {
    fn from(error: RoutingError) -> Self {
        match error {
            RoutingError::Region(error) => Self::Region(error),
            RoutingError::Overflow => Self::Overflow,
        }
    }
}

/// Platform fee constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSchedule {
    /// Added to the delivery fee when goods cross regions.
    pub cross_region_surcharge: Amount,

    /// Share of the final amount credited to the buyer at order creation.
    pub cashback: Percentage,

    /// Share of each delivery fee kept by the platform.
    pub platform_cut: Percentage,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            cross_region_surcharge: 2_000,
            cashback: percent_points(5),
            platform_cut: percent_points(15),
        }
    }
}

/// A cart line bound to its product's current price and supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Uuid,
    pub supplier: Uuid,
    pub supplier_region: Region,
    pub unit_price: Amount,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl CartLine {
    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Option<Amount> {
        self.unit_price.checked_mul(Amount::from(self.quantity))
    }
}

/// Order totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Amount,
    pub discount: Amount,
    pub delivery_fee: Amount,
    pub final_amount: Amount,
}

impl Totals {
    /// Build totals, deriving `final_amount = subtotal - discount + delivery_fee`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the discount exceeds the subtotal or the sum
    /// overflows.
    pub fn new(
        subtotal: Amount,
        discount: Amount,
        delivery_fee: Amount,
    ) -> Result<Self, PricingError> {
        let final_amount = subtotal
            .checked_sub(discount)
            .and_then(|net| net.checked_add(delivery_fee))
            .ok_or(PricingError::Overflow)?;

        Ok(Self {
            subtotal,
            discount,
            delivery_fee,
            final_amount,
        })
    }

    fn checked_add(self, other: Self) -> Result<Self, PricingError> {
        let sum = |a: Amount, b: Amount| a.checked_add(b).ok_or(PricingError::Overflow);

        Totals::new(
            sum(self.subtotal, other.subtotal)?,
            sum(self.discount, other.discount)?,
            sum(self.delivery_fee, other.delivery_fee)?,
        )
    }
}

/// Priced goods of a single supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierQuote {
    pub supplier: Uuid,
    pub supplier_region: Region,
    pub lines: Vec<CartLine>,
    pub totals: Totals,

    /// Set when the coupon discounted this group.
    pub coupon: Option<Uuid>,
}

impl SupplierQuote {
    /// Goods value net of coupon discount, the supplier's proceeds basis.
    pub fn net_goods_value(&self) -> Amount {
        self.totals.subtotal.saturating_sub(self.totals.discount)
    }

    /// Split the group discount over its lines in proportion to their totals.
    ///
    /// Shares round down and the last line takes the remainder, so they always add up to the
    /// group discount.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when a line total overflows.
    pub fn discount_shares(&self) -> Result<Vec<Amount>, PricingError> {
        let subtotal = u128::from(self.totals.subtotal);
        let discount = u128::from(self.totals.discount);
        let mut shares = Vec::with_capacity(self.lines.len());
        let mut allocated: Amount = 0;

        for (position, line) in self.lines.iter().enumerate() {
            let share = if position + 1 == self.lines.len() {
                self.totals
                    .discount
                    .checked_sub(allocated)
                    .ok_or(PricingError::Overflow)?
            } else if subtotal == 0 {
                0
            } else {
                let total = line.line_total().ok_or(PricingError::Overflow)?;

                Amount::try_from(u128::from(total) * discount / subtotal)
                    .map_err(|_| PricingError::Overflow)?
            };

            allocated = allocated.checked_add(share).ok_or(PricingError::Overflow)?;
            shares.push(share);
        }

        Ok(shares)
    }
}

/// Priced cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub destination: Region,
    pub groups: Vec<SupplierQuote>,
    pub totals: Totals,
}

impl Quote {
    /// The coupon applied to this quote, if any.
    pub fn coupon(&self) -> Option<Uuid> {
        self.groups.iter().find_map(|group| group.coupon)
    }
}

/// Everything the pricing engine needs to quote a cart.
#[derive(Debug, Clone, Copy)]
pub struct PricingRequest<'a> {
    pub lines: &'a [CartLine],
    pub destination: &'a Region,
    pub coupon: Option<&'a CouponRedemption>,
    pub now: Timestamp,
}

/// Group lines by supplier, preserving first appearance order.
fn group_by_supplier(lines: &[CartLine]) -> Vec<(Uuid, Vec<CartLine>)> {
    let mut index: FxHashMap<Uuid, usize> = FxHashMap::default();
    let mut groups: Vec<(Uuid, Vec<CartLine>)> = Vec::new();

    for line in lines {
        let position = *index.entry(line.supplier).or_insert_with(|| {
            groups.push((line.supplier, Vec::new()));
            groups.len() - 1
        });

        if let Some((_, group)) = groups.get_mut(position) {
            group.push(line.clone());
        }
    }

    groups
}

/// Price a cart.
///
/// # Errors
///
/// - [`PricingError::EmptyCart`]: no lines were given.
/// - [`PricingError::InvalidQuantity`]: a line has a zero quantity.
/// - [`PricingError::Coupon`]: the coupon fails validation or matches no supplier group.
/// - [`PricingError::Region`]: a supplier or the destination region has no warehouse.
/// - [`PricingError::Overflow`]: totals overflowed.
pub fn quote(
    directory: &WarehouseDirectory,
    fees: &FeeSchedule,
    request: PricingRequest<'_>,
) -> Result<Quote, PricingError> {
    if request.lines.is_empty() {
        return Err(PricingError::EmptyCart);
    }

    if let Some(line) = request.lines.iter().find(|line| line.quantity == 0) {
        return Err(PricingError::InvalidQuantity(line.product));
    }

    directory.lookup(request.destination)?;

    let mut groups = Vec::new();
    let mut totals = Totals::default();

    for (supplier, lines) in group_by_supplier(request.lines) {
        let subtotal = lines.iter().try_fold(0, |acc: Amount, line| {
            line.line_total()
                .and_then(|total| acc.checked_add(total))
                .ok_or(PricingError::Overflow)
        })?;

        let supplier_region = lines
            .first()
            .map(|line| line.supplier_region.clone())
            .ok_or(PricingError::EmptyCart)?;

        let mut discount = 0;
        let mut coupon = None;

        if let Some(redemption) = request.coupon.filter(|r| r.coupon.supplier == supplier) {
            redemption
                .coupon
                .validate(redemption.prior_uses_by_user, subtotal, request.now)?;

            discount = redemption.coupon.discount_for(subtotal)?;
            coupon = Some(redemption.coupon.uuid);
        }

        let fee = delivery_fee(
            directory,
            &supplier_region,
            request.destination,
            fees.cross_region_surcharge,
        )?;

        let group_totals = Totals::new(subtotal, discount, fee)?;

        totals = totals.checked_add(group_totals)?;

        groups.push(SupplierQuote {
            supplier,
            supplier_region,
            lines,
            totals: group_totals,
            coupon,
        });
    }

    if let Some(redemption) = request.coupon
        && groups.iter().all(|group| group.coupon.is_none())
    {
        return Err(CouponError::NotApplicable(redemption.coupon.code.clone()).into());
    }

    Ok(Quote {
        destination: request.destination.clone(),
        groups,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        coupons::CouponDiscount,
        fixtures::{coupon, directory},
    };

    use super::*;

    fn line(supplier: Uuid, region: &str, unit_price: Amount, quantity: u32) -> CartLine {
        CartLine {
            product: Uuid::now_v7(),
            supplier,
            supplier_region: Region::new(region),
            unit_price,
            quantity,
            color: None,
            size: None,
        }
    }

    fn request<'a>(
        lines: &'a [CartLine],
        destination: &'a Region,
        coupon: Option<&'a CouponRedemption>,
    ) -> PricingRequest<'a> {
        PricingRequest {
            lines,
            destination,
            coupon,
            now: Timestamp::now(),
        }
    }

    #[test]
    fn same_region_cart_pays_local_fee() -> TestResult {
        let supplier = Uuid::now_v7();
        let lines = [line(supplier, "Cairo", 5_000, 2)];
        let cairo = Region::new("Cairo");

        let quote = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &cairo, None),
        )?;

        assert_eq!(quote.groups.len(), 1);
        assert_eq!(
            quote.totals,
            Totals {
                subtotal: 10_000,
                discount: 0,
                delivery_fee: 3_000,
                final_amount: 13_000,
            }
        );

        Ok(())
    }

    #[test]
    fn cross_region_cart_pays_both_fees_and_surcharge() -> TestResult {
        let supplier = Uuid::now_v7();
        let lines = [line(supplier, "Cairo", 5_000, 2)];
        let giza = Region::new("Giza");

        let quote = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &giza, None),
        )?;

        assert_eq!(quote.totals.delivery_fee, 2_500 + 3_000 + 2_000);
        assert_eq!(quote.totals.final_amount, 10_000 + 7_500);

        Ok(())
    }

    #[test]
    fn lines_are_grouped_per_supplier() -> TestResult {
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();
        let lines = [
            line(first, "Cairo", 1_000, 1),
            line(second, "Giza", 2_000, 1),
            line(first, "Cairo", 500, 4),
        ];
        let cairo = Region::new("Cairo");

        let quote = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &cairo, None),
        )?;

        let suppliers: Vec<Uuid> = quote.groups.iter().map(|g| g.supplier).collect();

        assert_eq!(suppliers, vec![first, second]);
        assert_eq!(
            quote.groups.first().map(|g| g.totals.subtotal),
            Some(3_000)
        );
        assert_eq!(quote.totals.subtotal, 5_000);
        assert_eq!(quote.totals.delivery_fee, 3_000 + 7_500);

        Ok(())
    }

    #[test]
    fn coupon_discounts_only_its_supplier() -> TestResult {
        let mut coupon = coupon(CouponDiscount::PercentageOff { percentage: 10 });
        let other = Uuid::now_v7();
        let lines = [
            line(coupon.supplier, "Cairo", 10_000, 1),
            line(other, "Cairo", 10_000, 1),
        ];
        coupon.min_purchase_amount = 5_000;
        let redemption = CouponRedemption {
            coupon,
            prior_uses_by_user: 0,
        };
        let cairo = Region::new("Cairo");

        let quote = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &cairo, Some(&redemption)),
        )?;

        assert_eq!(quote.totals.discount, 1_000);
        assert_eq!(quote.coupon(), Some(redemption.coupon.uuid));
        assert_eq!(
            quote.groups.get(1).map(|g| g.totals.discount),
            Some(0)
        );
        assert_eq!(
            quote.totals.final_amount,
            quote.totals.subtotal - quote.totals.discount + quote.totals.delivery_fee
        );

        Ok(())
    }

    #[test]
    fn discount_is_shared_across_lines_by_value() -> TestResult {
        let coupon = coupon(CouponDiscount::FixedAmountOff { amount: 1_000 });
        let lines = [
            line(coupon.supplier, "Cairo", 1_000, 1),
            line(coupon.supplier, "Cairo", 1_000, 1),
            line(coupon.supplier, "Cairo", 1_000, 1),
        ];
        let redemption = CouponRedemption {
            coupon,
            prior_uses_by_user: 0,
        };
        let cairo = Region::new("Cairo");

        let quote = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &cairo, Some(&redemption)),
        )?;

        let group = quote.groups.first().ok_or("missing group")?;
        let shares = group.discount_shares()?;

        assert_eq!(shares, vec![333, 333, 334]);
        assert_eq!(shares.iter().sum::<Amount>(), group.totals.discount);

        Ok(())
    }

    #[test]
    fn undiscounted_lines_carry_no_share() -> TestResult {
        let supplier = Uuid::now_v7();
        let lines = [
            line(supplier, "Cairo", 5_000, 2),
            line(supplier, "Cairo", 700, 1),
        ];
        let cairo = Region::new("Cairo");

        let quote = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &cairo, None),
        )?;

        let group = quote.groups.first().ok_or("missing group")?;

        assert_eq!(group.discount_shares()?, vec![0, 0]);

        Ok(())
    }

    #[test]
    fn coupon_without_matching_supplier_is_not_applicable() {
        let redemption = CouponRedemption {
            coupon: coupon(CouponDiscount::FixedAmountOff { amount: 100 }),
            prior_uses_by_user: 0,
        };
        let lines = [line(Uuid::now_v7(), "Cairo", 1_000, 1)];
        let cairo = Region::new("Cairo");

        let result = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &cairo, Some(&redemption)),
        );

        assert_eq!(
            result,
            Err(PricingError::Coupon(CouponError::NotApplicable(
                "SAVE".to_string()
            )))
        );
    }

    #[test]
    fn exhausted_coupon_fails_the_quote() {
        let mut coupon = coupon(CouponDiscount::FixedAmountOff { amount: 100 });
        coupon.uses_count = coupon.max_uses;
        let lines = [line(coupon.supplier, "Cairo", 1_000, 1)];
        let redemption = CouponRedemption {
            coupon,
            prior_uses_by_user: 0,
        };
        let cairo = Region::new("Cairo");

        let result = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &cairo, Some(&redemption)),
        );

        assert_eq!(
            result,
            Err(PricingError::Coupon(CouponError::UsageLimitReached(
                "SAVE".to_string()
            )))
        );
    }

    #[test]
    fn empty_cart_is_rejected() {
        let cairo = Region::new("Cairo");

        let result = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&[], &cairo, None),
        );

        assert_eq!(result, Err(PricingError::EmptyCart));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let lines = [line(Uuid::now_v7(), "Cairo", 1_000, 0)];
        let product = lines.first().map(|l| l.product);
        let cairo = Region::new("Cairo");

        let result = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &cairo, None),
        );

        assert_eq!(result.err(), product.map(PricingError::InvalidQuantity));
    }

    #[test]
    fn unresolvable_destination_is_rejected() {
        let lines = [line(Uuid::now_v7(), "Cairo", 1_000, 1)];
        let aswan = Region::new("Aswan");

        let result = quote(
            &directory(),
            &FeeSchedule::default(),
            request(&lines, &aswan, None),
        );

        assert_eq!(
            result,
            Err(PricingError::Region(RegionError::NotFound(aswan)))
        );
    }
}
