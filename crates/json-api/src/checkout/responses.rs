//! Checkout Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq::pricing::{CartLine, Quote, SupplierQuote};
use souq_app::domain::checkout::data::CheckoutOutcome;

use crate::{
    orders::responses::{OrderResponse, TotalsResponse},
    payments::responses::PaymentResponse,
};

/// Quoted cart line
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuoteLineResponse {
    pub product_uuid: Uuid,
    pub unit_price: u64,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl From<CartLine> for QuoteLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            product_uuid: line.product,
            unit_price: line.unit_price,
            quantity: line.quantity,
            color: line.color,
            size: line.size,
        }
    }
}

/// One supplier's share of a quote
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SupplierQuoteResponse {
    pub supplier_uuid: Uuid,
    pub supplier_region: String,
    pub lines: Vec<QuoteLineResponse>,
    pub totals: TotalsResponse,

    /// Coupon that discounted this group
    pub coupon_uuid: Option<Uuid>,
}

impl From<SupplierQuote> for SupplierQuoteResponse {
    fn from(group: SupplierQuote) -> Self {
        Self {
            supplier_uuid: group.supplier,
            supplier_region: group.supplier_region.to_string(),
            lines: group.lines.into_iter().map(Into::into).collect(),
            totals: group.totals.into(),
            coupon_uuid: group.coupon,
        }
    }
}

/// Quote Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct QuoteResponse {
    pub destination_region: String,
    pub groups: Vec<SupplierQuoteResponse>,
    pub totals: TotalsResponse,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            destination_region: quote.destination.to_string(),
            groups: quote.groups.into_iter().map(Into::into).collect(),
            totals: quote.totals.into(),
        }
    }
}

/// Checkout Response
///
/// Exactly one of `order` and `payment` is set, matching `outcome`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutResponse {
    /// `order_placed` or `payment_pending`
    pub outcome: String,

    pub order: Option<OrderResponse>,
    pub payment: Option<PaymentResponse>,
}

impl From<CheckoutOutcome> for CheckoutResponse {
    fn from(outcome: CheckoutOutcome) -> Self {
        match outcome {
            CheckoutOutcome::Order(order) => Self {
                outcome: "order_placed".to_string(),
                order: Some(order.into()),
                payment: None,
            },
            CheckoutOutcome::PaymentPending(payment) => Self {
                outcome: "payment_pending".to_string(),
                order: None,
                payment: Some(payment.into()),
            },
        }
    }
}
