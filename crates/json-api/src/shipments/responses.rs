//! Shipment Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq::routing::{Party, Stop};
use souq_app::domain::shipments::records::{ShipmentOwner, ShipmentRecord};

/// One end of a leg
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct StopResponse {
    /// `supplier`, `customer` or `warehouse`
    pub party: String,

    /// The supplier or customer, absent for warehouses
    pub user_uuid: Option<Uuid>,

    pub region: String,
    pub address: String,
}

impl From<Stop> for StopResponse {
    fn from(stop: Stop) -> Self {
        let (party, user_uuid) = match stop.party {
            Party::Supplier(user) => ("supplier", Some(user)),
            Party::Customer(user) => ("customer", Some(user)),
            Party::Warehouse(_) => ("warehouse", None),
        };

        Self {
            party: party.to_string(),
            user_uuid,
            region: stop.region.to_string(),
            address: stop.address,
        }
    }
}

/// Shipment Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ShipmentResponse {
    pub uuid: Uuid,

    /// Set for outbound legs
    pub order_uuid: Option<Uuid>,

    /// Set for legs carrying a return
    pub return_request_uuid: Option<Uuid>,

    pub direction: String,

    /// `1` for the first leg, `2` for the onward leg out of a warehouse
    pub sequence: u8,

    pub supplier_uuid: Uuid,
    pub from: StopResponse,
    pub to: StopResponse,
    pub status: String,
    pub delivery_person_uuid: Option<Uuid>,

    /// Delivery fee for this leg in minor units
    pub fee: u64,

    pub created_at: String,
    pub updated_at: String,
}

impl From<ShipmentRecord> for ShipmentResponse {
    fn from(shipment: ShipmentRecord) -> Self {
        let (order_uuid, return_request_uuid) = match shipment.owner {
            ShipmentOwner::Order(order) => (Some(order.into_uuid()), None),
            ShipmentOwner::Return(request) => (None, Some(request.into_uuid())),
        };

        Self {
            uuid: shipment.uuid.into_uuid(),
            order_uuid,
            return_request_uuid,
            direction: shipment.direction.to_str().to_string(),
            sequence: shipment.sequence,
            supplier_uuid: shipment.supplier_uuid.into_uuid(),
            from: shipment.from.into(),
            to: shipment.to.into(),
            status: shipment.status.to_string(),
            delivery_person_uuid: shipment.delivery_person_uuid.map(Into::into),
            fee: shipment.fee,
            created_at: shipment.created_at.to_string(),
            updated_at: shipment.updated_at.to_string(),
        }
    }
}
