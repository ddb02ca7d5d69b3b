//! Return Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use souq::actors::Actor;
use souq_app::domain::returns::records::{ReturnDetails, ReturnRequestRecord};

use crate::shipments::responses::ShipmentResponse;

/// Return Request Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReturnResponse {
    pub uuid: Uuid,
    pub order_uuid: Uuid,
    pub order_item_uuid: Uuid,
    pub product_uuid: Uuid,
    pub customer_uuid: Uuid,
    pub supplier_uuid: Uuid,
    pub quantity: u32,

    /// Amount credited back to the customer on completion
    pub amount: u64,

    pub reason: String,
    pub status: String,

    /// Only shown to the supplier, who hands it over when the goods arrive
    pub confirmation_code: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

impl ReturnResponse {
    pub(crate) fn for_actor(request: ReturnRequestRecord, actor: &Actor) -> Self {
        let supplier = request.supplier_uuid.into_uuid();
        let confirmation_code = (actor.user == supplier || actor.is_admin())
            .then(|| request.confirmation_code.as_str().to_string());

        Self {
            uuid: request.uuid.into_uuid(),
            order_uuid: request.order_uuid.into_uuid(),
            order_item_uuid: request.order_item_uuid.into_uuid(),
            product_uuid: request.product_uuid.into_uuid(),
            customer_uuid: request.customer_uuid.into_uuid(),
            supplier_uuid: supplier,
            quantity: request.quantity,
            amount: request.amount,
            reason: request.reason,
            status: request.status.to_string(),
            confirmation_code,
            created_at: request.created_at.to_string(),
            updated_at: request.updated_at.to_string(),
        }
    }
}

/// Return Details Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReturnDetailsResponse {
    pub request: ReturnResponse,

    /// Legs back to the supplier, empty until approved
    pub shipments: Vec<ShipmentResponse>,
}

impl ReturnDetailsResponse {
    pub(crate) fn for_actor(details: ReturnDetails, actor: &Actor) -> Self {
        Self {
            request: ReturnResponse::for_actor(details.request, actor),
            shipments: details.shipments.into_iter().map(Into::into).collect(),
        }
    }
}
