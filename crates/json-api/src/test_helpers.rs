//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use souq::{
    actors::{Actor, Role},
    ledger::{RelatedObject, TransactionType},
    orders::{OrderStatus, PaymentMethod},
    pricing::Totals,
    regions::Region,
    returns::ReturnStatus,
    routing::{Direction, Stop},
    shipments::{ConfirmationCode, ShipmentStatus},
    withdrawals::{TransferType, WithdrawStatus},
};
use souq_app::{
    auth::MockAuthService,
    context::AppContext,
    domain::{
        carts::MockCartsService,
        checkout::MockCheckoutService,
        coupons::MockCouponsService,
        ledger::{MockLedgerService, records::TransactionRecord},
        orders::{
            MockOrdersService,
            records::{OrderRecord, OrderUuid},
        },
        payments::{
            MockPaymentsService,
            records::{PaymentRecord, PaymentStatus, PaymentUuid},
        },
        products::{
            MockProductsService,
            records::{ProductRecord, ProductUuid},
        },
        returns::{
            MockReturnsService,
            records::{ReturnRequestRecord, ReturnRequestUuid},
        },
        shipments::{
            MockShipmentsService,
            records::{ShipmentOwner, ShipmentRecord, ShipmentUuid},
        },
        users::MockUsersService,
        warehouses::MockWarehousesService,
        withdrawals::{
            MockWithdrawalsService,
            records::{WithdrawalRecord, WithdrawalUuid},
        },
    },
};

use crate::{extensions::*, state::State};

pub(crate) const CUSTOMER: Uuid = Uuid::from_u128(0x0199_0000_0000_7000_8000_0000_0000_0001);
pub(crate) const SUPPLIER: Uuid = Uuid::from_u128(0x0199_0000_0000_7000_8000_0000_0000_0002);
pub(crate) const COURIER: Uuid = Uuid::from_u128(0x0199_0000_0000_7000_8000_0000_0000_0003);
pub(crate) const ADMIN: Uuid = Uuid::from_u128(0x0199_0000_0000_7000_8000_0000_0000_0004);

/// One mock per service; any call without an expectation fails the test.
#[derive(Default)]
pub(crate) struct Mocks {
    pub(crate) auth: MockAuthService,
    pub(crate) users: MockUsersService,
    pub(crate) warehouses: MockWarehousesService,
    pub(crate) products: MockProductsService,
    pub(crate) carts: MockCartsService,
    pub(crate) coupons: MockCouponsService,
    pub(crate) ledger: MockLedgerService,
    pub(crate) orders: MockOrdersService,
    pub(crate) shipments: MockShipmentsService,
    pub(crate) returns: MockReturnsService,
    pub(crate) checkout: MockCheckoutService,
    pub(crate) payments: MockPaymentsService,
    pub(crate) withdrawals: MockWithdrawalsService,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            auth: Arc::new(self.auth),
            users: Arc::new(self.users),
            warehouses: Arc::new(self.warehouses),
            products: Arc::new(self.products),
            carts: Arc::new(self.carts),
            coupons: Arc::new(self.coupons),
            ledger: Arc::new(self.ledger),
            orders: Arc::new(self.orders),
            shipments: Arc::new(self.shipments),
            returns: Arc::new(self.returns),
            checkout: Arc::new(self.checkout),
            payments: Arc::new(self.payments),
            withdrawals: Arc::new(self.withdrawals),
        })
    }
}

/// Stands in for the auth middleware with a fixed actor.
pub(crate) struct AuthenticateAs(pub(crate) Actor);

#[handler]
impl AuthenticateAs {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        depot.insert_actor(self.0.clone());
        ctrl.call_next(req, depot, res).await;
    }
}

pub(crate) fn customer() -> Actor {
    Actor::new(CUSTOMER, Role::Customer, None)
}

pub(crate) fn supplier() -> Actor {
    Actor::new(SUPPLIER, Role::Supplier, None)
}

pub(crate) fn courier() -> Actor {
    Actor::new(COURIER, Role::DeliveryPerson, Some(Region::new("giza")))
}

pub(crate) fn admin() -> Actor {
    Actor::new(ADMIN, Role::Admin, None)
}

/// A service whose requests are made by `actor`.
pub(crate) fn service_as(actor: Actor, mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(AuthenticateAs(actor))
            .push(route),
    )
}

/// A service without any authenticated actor.
pub(crate) fn anonymous_service(mocks: Mocks, route: Router) -> Service {
    Service::new(Router::new().hoop(inject(mocks.into_state())).push(route))
}

pub(crate) fn make_totals() -> Totals {
    Totals {
        subtotal: 10_000,
        discount: 0,
        delivery_fee: 3_000,
        final_amount: 13_000,
    }
}

pub(crate) fn make_order(uuid: OrderUuid) -> OrderRecord {
    OrderRecord {
        uuid,
        user_uuid: CUSTOMER.into(),
        address_uuid: Uuid::now_v7().into(),
        destination_region: Region::new("cairo"),
        destination_address: "12 Tahrir Square".to_string(),
        payment_method: PaymentMethod::CashOnDelivery,
        paid: false,
        status: OrderStatus::Created,
        totals: make_totals(),
        coupon_uuid: None,
        confirmation_code: ConfirmationCode::from("123456".to_string()),
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_shipment(uuid: ShipmentUuid, status: ShipmentStatus) -> ShipmentRecord {
    ShipmentRecord {
        uuid,
        owner: ShipmentOwner::Order(OrderUuid::new()),
        direction: Direction::Outbound,
        sequence: 1,
        supplier_uuid: SUPPLIER.into(),
        from: Stop::supplier(SUPPLIER, Region::new("giza"), "5 Pyramids Road"),
        to: Stop::customer(CUSTOMER, Region::new("giza"), "9 Nile Street"),
        status,
        delivery_person_uuid: None,
        fee: 2_500,
        goods_value: 10_000,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_return(uuid: ReturnRequestUuid, status: ReturnStatus) -> ReturnRequestRecord {
    ReturnRequestRecord {
        uuid,
        order_item_uuid: Uuid::now_v7().into(),
        order_uuid: OrderUuid::new(),
        product_uuid: Uuid::now_v7().into(),
        customer_uuid: CUSTOMER.into(),
        supplier_uuid: SUPPLIER.into(),
        quantity: 1,
        amount: 5_000,
        reason: "Wrong size".to_string(),
        status,
        confirmation_code: ConfirmationCode::from("654321".to_string()),
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_withdrawal(uuid: WithdrawalUuid, status: WithdrawStatus) -> WithdrawalRecord {
    WithdrawalRecord {
        uuid,
        user_uuid: SUPPLIER.into(),
        amount: 20_000,
        transfer_type: TransferType::BankTransfer,
        destination: "EG380019000500000000263180002".to_string(),
        status,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_payment(uuid: PaymentUuid, status: PaymentStatus) -> PaymentRecord {
    PaymentRecord {
        uuid,
        user_uuid: CUSTOMER.into(),
        address_uuid: Uuid::now_v7().into(),
        coupon_code: None,
        amount: 13_000,
        status,
        provider_reference: None,
        order_uuid: None,
        refunded_at: None,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_transaction(kind: TransactionType, amount: i64) -> TransactionRecord {
    TransactionRecord {
        uuid: Uuid::now_v7().into(),
        user_uuid: CUSTOMER.into(),
        kind,
        amount,
        related: RelatedObject::Order(Uuid::now_v7()),
        created_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_product(uuid: ProductUuid) -> ProductRecord {
    ProductRecord {
        uuid,
        supplier_uuid: SUPPLIER.into(),
        name: "Brass lamp".to_string(),
        price: 5_000,
        stock: 10,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
