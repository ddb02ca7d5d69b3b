//! Shipment Records

use jiff::Timestamp;

use souq::{
    money::Amount,
    routing::{Direction, Stop},
    shipments::{Leg, ShipmentStatus},
};

use crate::{
    domain::{
        orders::records::OrderUuid, returns::records::ReturnRequestUuid,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Shipment UUID
pub type ShipmentUuid = TypedUuid<ShipmentRecord>;

/// What a leg moves goods for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentOwner {
    Order(OrderUuid),
    Return(ReturnRequestUuid),
}

/// One leg of physical movement.
#[derive(Debug, Clone)]
pub struct ShipmentRecord {
    pub uuid: ShipmentUuid,
    pub owner: ShipmentOwner,
    pub direction: Direction,
    pub sequence: u8,
    pub supplier_uuid: UserUuid,
    pub from: Stop,
    pub to: Stop,
    pub status: ShipmentStatus,
    pub delivery_person_uuid: Option<UserUuid>,
    pub fee: Amount,

    /// Value of the goods carried, net of coupon discount.
    pub goods_value: Amount,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ShipmentRecord {
    /// Snapshot used by the transition rules.
    #[must_use]
    pub fn leg(&self) -> Leg {
        Leg {
            uuid: self.uuid.into_uuid(),
            direction: self.direction,
            sequence: self.sequence,
            from: self.from.party.clone(),
            to: self.to.party.clone(),
            from_region: self.from.region.clone(),
            to_region: self.to.region.clone(),
            status: self.status,
            delivery_person: self.delivery_person_uuid.map(UserUuid::into_uuid),
        }
    }

    #[must_use]
    pub fn order_uuid(&self) -> Option<OrderUuid> {
        match self.owner {
            ShipmentOwner::Order(order) => Some(order),
            ShipmentOwner::Return(_) => None,
        }
    }
}
