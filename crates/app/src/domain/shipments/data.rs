//! Shipment Data

use souq::{
    money::Amount,
    routing::{Direction, LegPlan},
};

use crate::domain::{
    shipments::records::{ShipmentOwner, ShipmentUuid},
    users::records::UserUuid,
};

/// New Shipment Data
#[derive(Debug, Clone)]
pub struct NewShipment {
    pub uuid: ShipmentUuid,
    pub owner: ShipmentOwner,
    pub direction: Direction,
    pub supplier_uuid: UserUuid,
    pub plan: LegPlan,
    pub goods_value: Amount,
}
