//! Test Helpers

use testresult::TestResult;
use uuid::Uuid;

use souq::{
    actors::{Actor, Role},
    ledger::{Posting, RelatedObject, TransactionType},
    money::Amount,
    orders::PaymentMethod,
    regions::Region,
};

use crate::{
    domain::{
        carts::{
            data::NewCartItem,
            records::{CartItemRecord, CartItemUuid},
        },
        checkout::data::{Checkout, CheckoutOutcome},
        ledger::repository::PgLedgerRepository,
        orders::records::{OrderItemUuid, OrderRecord, OrderUuid},
        products::{data::NewProduct, records::ProductUuid},
        shipments::records::ShipmentUuid,
        users::{
            data::{NewAddress, NewUser},
            records::{AddressUuid, UserUuid},
        },
    },
    test::TestContext,
};

/// An order placed through checkout together with its parties.
#[derive(Debug, Clone)]
pub struct Placed {
    pub customer: UserUuid,
    pub supplier: UserUuid,
    pub product: ProductUuid,
    pub order: OrderRecord,
}

impl TestContext {
    pub fn actor(&self, user: UserUuid, role: Role) -> Actor {
        Actor::new(user.into_uuid(), role, None)
    }

    fn admin(&self) -> Actor {
        self.actor(self.house_account, Role::Admin)
    }

    async fn user(&self, role: Role, region: Option<Region>) -> TestResult<UserUuid> {
        let user = self
            .users
            .create_user(NewUser {
                uuid: UserUuid::new(),
                name: format!("{role} user"),
                role,
                region,
            })
            .await?;

        Ok(user.uuid)
    }

    pub async fn customer(&self) -> TestResult<UserUuid> {
        self.user(Role::Customer, None).await
    }

    /// A supplier shipping from an address in `region`.
    pub async fn supplier(&self, region: &str) -> TestResult<UserUuid> {
        let supplier = self.user(Role::Supplier, None).await?;

        self.address(supplier, region).await?;

        Ok(supplier)
    }

    /// A delivery person serving `region`.
    pub async fn courier(&self, region: &str) -> TestResult<Actor> {
        let region = Region::new(region);
        let courier = self
            .user(Role::DeliveryPerson, Some(region.clone()))
            .await?;

        Ok(Actor::new(
            courier.into_uuid(),
            Role::DeliveryPerson,
            Some(region),
        ))
    }

    pub async fn address(&self, user: UserUuid, region: &str) -> TestResult<AddressUuid> {
        let address = self
            .users
            .create_address(NewAddress {
                uuid: AddressUuid::new(),
                user_uuid: user,
                region: Region::new(region),
                line: format!("12 Tahrir St, {region}"),
            })
            .await?;

        Ok(address.uuid)
    }

    pub async fn product(
        &self,
        supplier: UserUuid,
        price: Amount,
        stock: u64,
    ) -> TestResult<ProductUuid> {
        let product = self
            .products
            .create_product(
                &self.actor(supplier, Role::Supplier),
                NewProduct {
                    uuid: ProductUuid::new(),
                    supplier_uuid: supplier,
                    name: "Cotton scarf".to_string(),
                    price,
                    stock,
                },
            )
            .await?;

        Ok(product.uuid)
    }

    pub async fn add_to_cart(
        &self,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> TestResult<CartItemRecord> {
        let item = self
            .carts
            .add_item(
                user,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity,
                    color: None,
                    size: None,
                },
            )
            .await?;

        Ok(item)
    }

    /// Give a user spendable balance through a gateway refund.
    pub async fn credit(&self, user: UserUuid, amount: Amount) -> TestResult {
        let posting = Posting {
            user: user.into_uuid(),
            kind: TransactionType::Refund,
            amount: i64::try_from(amount)?,
            related: RelatedObject::Payment(Uuid::now_v7()),
        };

        let mut tx = self.db().begin().await?;

        PgLedgerRepository::new().post(&mut tx, &posting).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Check out two units of a 50.00 product for a fresh customer.
    pub async fn place_order(
        &self,
        customer_region: &str,
        supplier_region: &str,
        payment_method: PaymentMethod,
        starting_balance: Amount,
    ) -> TestResult<Placed> {
        let customer = self.customer().await?;
        let address = self.address(customer, customer_region).await?;
        let supplier = self.supplier(supplier_region).await?;
        let product = self.product(supplier, 5_000, 10).await?;

        self.add_to_cart(customer, product, 2).await?;

        if starting_balance > 0 {
            self.credit(customer, starting_balance).await?;
        }

        let outcome = self
            .checkout
            .place_order(
                &self.actor(customer, Role::Customer),
                Checkout {
                    address_uuid: address,
                    coupon_code: None,
                    payment_method,
                },
            )
            .await?;

        let CheckoutOutcome::Order(order) = outcome else {
            return Err("checkout is waiting for a payment".into());
        };

        Ok(Placed {
            customer,
            supplier,
            product,
            order,
        })
    }

    pub async fn first_leg(&self, order: OrderUuid) -> TestResult<ShipmentUuid> {
        let details = self.orders.get_order(&self.admin(), order).await?;

        match details.shipments.first() {
            Some(leg) => Ok(leg.uuid),
            None => Err("order has no shipments".into()),
        }
    }

    pub async fn first_item(&self, order: OrderUuid) -> TestResult<OrderItemUuid> {
        let details = self.orders.get_order(&self.admin(), order).await?;

        match details.items.first() {
            Some(item) => Ok(item.uuid),
            None => Err("order has no items".into()),
        }
    }

    /// Drive every leg of an order through to the customer.
    pub async fn deliver(&self, placed: &Placed) -> TestResult {
        let legs = self
            .orders
            .get_order(&self.admin(), placed.order.uuid)
            .await?
            .shipments;

        let supplier = self.actor(placed.supplier, Role::Supplier);

        for (index, leg) in legs.iter().enumerate() {
            let courier = self.courier(leg.from.region.as_str()).await?;

            if index == 0 {
                self.shipments.mark_ready(&supplier, leg.uuid).await?;
            }

            self.shipments.accept(&courier, leg.uuid).await?;

            if index + 1 < legs.len() {
                self.shipments
                    .arrive_at_warehouse(&courier, leg.uuid)
                    .await?;
            } else {
                self.shipments
                    .confirm_delivery(&courier, leg.uuid, placed.order.confirmation_code.as_str())
                    .await?;
            }
        }

        Ok(())
    }
}
