//! Order Assembler
//!
//! Turns a customer's cart, or the lines frozen onto a card payment, into an order, its items
//! and shipment legs, the upfront ledger postings, stock decrements and coupon redemption. Everything runs inside the caller's
//! transaction; any failure leaves no trace once it rolls back.

use jiff::Timestamp;
use sqlx::{Postgres, Transaction};

use souq::{
    coupons::{CouponError, CouponRedemption},
    ledger::{LedgerError, RelatedObject, SettlementPolicy, ensure_covers},
    money::{display_amount, signed},
    orders::{OrderStatus, PaymentMethod},
    pricing::{CartLine, FeeSchedule, PricingRequest, Quote, quote},
    regions::WarehouseDirectory,
    routing::{Direction, Stop, plan_legs},
    shipments::ConfirmationCode,
};

use crate::{
    domain::{
        carts::{records::CheckoutLineRecord, repositories::PgCartItemsRepository},
        checkout::errors::CheckoutServiceError,
        coupons::repository::PgCouponsRepository,
        ledger::repository::PgLedgerRepository,
        orders::{
            data::{NewOrder, NewOrderItem},
            records::{OrderItemUuid, OrderRecord, OrderUuid},
            repository::PgOrdersRepository,
        },
        payments::{records::PaymentUuid, repository::PgPaymentsRepository},
        products::repository::PgProductsRepository,
        shipments::{records::ShipmentOwner, repository::PgShipmentsRepository},
        users::{
            records::{AddressRecord, AddressUuid, UserUuid},
            repository::PgUsersRepository,
        },
        warehouses::repository::PgWarehousesRepository,
    },
    notifications::Notification,
};

/// A priced cart together with the rows it was priced from.
#[derive(Debug, Clone)]
pub(crate) struct PricedCart {
    pub address: AddressRecord,
    pub lines: Vec<CheckoutLineRecord>,
    pub directory: WarehouseDirectory,
    pub quote: Quote,
}

/// Where priced lines are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineSource {
    /// The user's cart as it is now.
    Cart,

    /// Lines and unit prices frozen onto a card payment at checkout.
    Payment(PaymentUuid),
}

/// Order to assemble for a user.
#[derive(Debug, Clone)]
pub(crate) struct Assembly<'a> {
    pub user: UserUuid,
    pub address: AddressUuid,
    pub coupon_code: Option<&'a str>,
    pub payment_method: PaymentMethod,
    pub lines: LineSource,

    /// Payment was already captured by the gateway.
    pub prepaid: bool,
    pub now: Timestamp,
}

#[derive(Debug, Clone)]
pub(crate) struct Assembler {
    users: PgUsersRepository,
    cart_items: PgCartItemsRepository,
    payments: PgPaymentsRepository,
    coupons: PgCouponsRepository,
    warehouses: PgWarehousesRepository,
    orders: PgOrdersRepository,
    shipments: PgShipmentsRepository,
    products: PgProductsRepository,
    ledger: PgLedgerRepository,
    fees: FeeSchedule,
    policy: SettlementPolicy,
    currency: String,
}

impl Assembler {
    #[must_use]
    pub(crate) fn new(policy: SettlementPolicy, currency: String) -> Self {
        Self {
            users: PgUsersRepository::new(),
            cart_items: PgCartItemsRepository::new(),
            payments: PgPaymentsRepository::new(),
            coupons: PgCouponsRepository::new(),
            warehouses: PgWarehousesRepository::new(),
            orders: PgOrdersRepository::new(),
            shipments: PgShipmentsRepository::new(),
            products: PgProductsRepository::new(),
            ledger: PgLedgerRepository::new(),
            fees: policy.fees,
            policy,
            currency,
        }
    }

    /// Price the user's lines for delivery to one of their addresses.
    ///
    /// With `lock_coupon` the coupon row stays locked until the transaction ends.
    #[expect(
        clippy::too_many_arguments,
        reason = "pricing inputs are independent and all required"
    )]
    pub(crate) async fn price(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        source: LineSource,
        address: AddressUuid,
        coupon_code: Option<&str>,
        lock_coupon: bool,
        now: Timestamp,
    ) -> Result<PricedCart, CheckoutServiceError> {
        let address = self.users.get_address(tx, address).await?;

        if address.user_uuid != user {
            return Err(CheckoutServiceError::AddressNotOwned);
        }

        let lines = match source {
            LineSource::Cart => self.cart_items.get_checkout_lines(tx, user).await?,
            LineSource::Payment(payment) => self.payments.get_payment_lines(tx, payment).await?,
        };

        let cart_lines = lines
            .iter()
            .map(|line| {
                let supplier_region = line
                    .supplier_region
                    .clone()
                    .ok_or(CheckoutServiceError::SupplierWithoutAddress(line.product_uuid))?;

                Ok(CartLine {
                    product: line.product_uuid.into_uuid(),
                    supplier: line.supplier_uuid.into_uuid(),
                    supplier_region,
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    color: line.color.clone(),
                    size: line.size.clone(),
                })
            })
            .collect::<Result<Vec<_>, CheckoutServiceError>>()?;

        let redemption = match coupon_code {
            Some(code) => {
                let coupon = if lock_coupon {
                    self.coupons.lock_coupon(tx, code).await
                } else {
                    self.coupons.get_coupon(tx, code).await
                }
                .map_err(|error| match error {
                    sqlx::Error::RowNotFound => {
                        CheckoutServiceError::CouponNotFound(code.to_string())
                    }
                    other => other.into(),
                })?;

                let prior_uses_by_user = self
                    .coupons
                    .count_user_usages(tx, coupon.uuid, user)
                    .await?;

                Some(CouponRedemption {
                    coupon,
                    prior_uses_by_user,
                })
            }
            None => None,
        };

        let directory = WarehouseDirectory::new(self.warehouses.list_warehouses(tx).await?)?;

        let quote = quote(
            &directory,
            &self.fees,
            PricingRequest {
                lines: &cart_lines,
                destination: &address.region,
                coupon: redemption.as_ref(),
                now,
            },
        )?;

        Ok(PricedCart {
            address,
            lines,
            directory,
            quote,
        })
    }

    /// Create the order and everything hanging off it.
    ///
    /// Returns the order and the notifications to send once the transaction commits.
    pub(crate) async fn assemble(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        assembly: Assembly<'_>,
    ) -> Result<(OrderRecord, Vec<Notification>), CheckoutServiceError> {
        let buyer = self.users.lock_user(tx, assembly.user).await?;

        let priced = self
            .price(
                tx,
                assembly.user,
                assembly.lines,
                assembly.address,
                assembly.coupon_code,
                true,
                assembly.now,
            )
            .await?;

        let totals = priced.quote.totals;

        if assembly.payment_method == PaymentMethod::Balance {
            ensure_covers(buyer.balance, totals.final_amount)?;
        }

        let order = self
            .orders
            .create_order(
                tx,
                &NewOrder {
                    uuid: OrderUuid::new(),
                    user_uuid: assembly.user,
                    address_uuid: priced.address.uuid,
                    destination_region: priced.address.region.clone(),
                    destination_address: priced.address.line.clone(),
                    payment_method: assembly.payment_method,
                    paid: assembly.prepaid || assembly.payment_method == PaymentMethod::Balance,
                    status: OrderStatus::Created,
                    totals,
                    coupon_uuid: priced.quote.coupon(),
                    confirmation_code: ConfirmationCode::generate(),
                },
            )
            .await?;

        let customer = Stop::customer(
            assembly.user.into_uuid(),
            priced.address.region.clone(),
            priced.address.line.clone(),
        );

        let mut notifications = Vec::new();

        for group in &priced.quote.groups {
            let group_lines: Vec<&CheckoutLineRecord> = priced
                .lines
                .iter()
                .filter(|line| line.supplier_uuid.into_uuid() == group.supplier)
                .collect();

            let shares = group.discount_shares()?;
            let mut carried: Vec<(OrderItemUuid, u32)> = Vec::with_capacity(group_lines.len());
            let mut supplier_address = None;

            for (line, discount) in group_lines.iter().zip(shares) {
                let item = self
                    .orders
                    .create_order_item(
                        tx,
                        &NewOrderItem {
                            uuid: OrderItemUuid::new(),
                            order_uuid: order.uuid,
                            product_uuid: line.product_uuid,
                            supplier_uuid: line.supplier_uuid,
                            quantity: line.quantity,
                            unit_price: line.unit_price,
                            discount,
                            color: line.color.clone(),
                            size: line.size.clone(),
                        },
                    )
                    .await?;

                carried.push((item.uuid, item.quantity));
                supplier_address = supplier_address.or_else(|| line.supplier_address.clone());
            }

            let supplier = Stop::supplier(
                group.supplier,
                group.supplier_region.clone(),
                supplier_address.unwrap_or_default(),
            );

            let plans = plan_legs(
                &priced.directory,
                Direction::Outbound,
                &supplier,
                &customer,
                self.fees.cross_region_surcharge,
            )?;

            self.shipments
                .create_legs(
                    tx,
                    ShipmentOwner::Order(order.uuid),
                    Direction::Outbound,
                    group.supplier.into(),
                    plans,
                    group.net_goods_value(),
                    &carried,
                )
                .await?;

            notifications.push(
                Notification::new(group.supplier, "You have a new order to prepare")
                    .about(RelatedObject::Order(order.uuid.into_uuid())),
            );
        }

        let purchase = self.policy.purchase(
            assembly.user.into_uuid(),
            order.uuid.into_uuid(),
            assembly.payment_method,
            totals.final_amount,
        )?;

        self.ledger.post_all(tx, purchase.iter()).await?;

        if let Some(cashback) = self.policy.cashback(
            assembly.user.into_uuid(),
            order.uuid.into_uuid(),
            totals.final_amount,
        )? {
            self.ledger.post(tx, &cashback).await?;
        }

        if let Some(coupon) = order.coupon_uuid {
            if !self
                .coupons
                .redeem(tx, coupon, assembly.user, order.uuid.into_uuid())
                .await?
            {
                return Err(CouponError::UsageLimitReached(
                    assembly.coupon_code.unwrap_or_default().to_string(),
                )
                .into());
            }
        }

        for line in &priced.lines {
            if !self
                .products
                .take_stock(tx, line.product_uuid, line.quantity)
                .await?
            {
                return Err(CheckoutServiceError::InsufficientStock(line.product_uuid));
            }
        }

        let consumed: Vec<_> = priced.lines.iter().map(|line| line.item_uuid).collect();

        self.cart_items.delete_cart_items(tx, &consumed).await?;

        notifications.insert(
            0,
            Notification::new(
                assembly.user.into_uuid(),
                format!(
                    "Order placed for {}, your delivery code is {}",
                    display_amount(
                        signed(totals.final_amount).map_err(LedgerError::from)?,
                        &self.currency
                    ),
                    order.confirmation_code.as_str()
                ),
            )
            .about(RelatedObject::Order(order.uuid.into_uuid())),
        );

        Ok((order, notifications))
    }
}
