//! Shipment Routing
//!
//! Goods move between a supplier and a customer through at most one regional warehouse. When both
//! parties share a region the goods travel directly; otherwise they are dropped at the warehouse
//! serving the recipient's region and delivered onward from there. Outbound orders and returns use
//! the same routine with the roles of origin and recipient swapped.

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    money::Amount,
    regions::{Region, RegionError, WarehouseDirectory},
};

/// Errors raised while planning legs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// One side of the route has no warehouse.
    #[error(transparent)]
    Region(#[from] RegionError),

    /// Fee arithmetic overflowed.
    #[error("delivery fee overflowed")]
    Overflow,
}

/// Which way goods travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Supplier to customer.
    Outbound,

    /// Customer back to supplier.
    Return,
}

impl Direction {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Outbound => "outbound",
            Self::Return => "return",
        }
    }
}

/// Who sits at one end of a leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Party {
    Supplier(Uuid),
    Customer(Uuid),
    Warehouse(Region),
}

/// A party together with where it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    pub party: Party,
    pub region: Region,
    pub address: String,
}

impl Stop {
    #[must_use]
    pub fn supplier(user: Uuid, region: Region, address: impl Into<String>) -> Self {
        Self {
            party: Party::Supplier(user),
            region,
            address: address.into(),
        }
    }

    #[must_use]
    pub fn customer(user: Uuid, region: Region, address: impl Into<String>) -> Self {
        Self {
            party: Party::Customer(user),
            region,
            address: address.into(),
        }
    }
}

/// One planned leg of movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegPlan {
    /// `1` for the first leg, `2` for the onward leg out of a warehouse.
    pub sequence: u8,
    pub from: Stop,
    pub to: Stop,
    pub fee: Amount,
}

impl LegPlan {
    /// Whether the leg ends at a warehouse rather than at the recipient.
    #[must_use]
    pub fn ends_at_warehouse(&self) -> bool {
        matches!(self.to.party, Party::Warehouse(_))
    }
}

/// Planned legs for one supplier group or return.
pub type Legs = SmallVec<[LegPlan; 2]>;

/// Plan the legs moving goods between `supplier` and `customer`.
///
/// # Errors
///
/// Returns [`RoutingError::Region`] when either region has no warehouse.
pub fn plan_legs(
    directory: &WarehouseDirectory,
    direction: Direction,
    supplier: &Stop,
    customer: &Stop,
    cross_region_surcharge: Amount,
) -> Result<Legs, RoutingError> {
    let (origin, recipient) = match direction {
        Direction::Outbound => (supplier, customer),
        Direction::Return => (customer, supplier),
    };

    let origin_warehouse = directory.lookup(&origin.region)?;

    if origin.region == recipient.region {
        return Ok(smallvec![LegPlan {
            sequence: 1,
            from: origin.clone(),
            to: recipient.clone(),
            fee: origin_warehouse.flat_fee,
        }]);
    }

    let recipient_warehouse = directory.lookup(&recipient.region)?;

    let hub = Stop {
        party: Party::Warehouse(recipient_warehouse.region.clone()),
        region: recipient_warehouse.region.clone(),
        address: recipient_warehouse.address.clone(),
    };

    let first_fee = origin_warehouse
        .flat_fee
        .checked_add(cross_region_surcharge)
        .ok_or(RoutingError::Overflow)?;

    Ok(smallvec![
        LegPlan {
            sequence: 1,
            from: origin.clone(),
            to: hub.clone(),
            fee: first_fee,
        },
        LegPlan {
            sequence: 2,
            from: hub,
            to: recipient.clone(),
            fee: recipient_warehouse.flat_fee,
        },
    ])
}

/// Delivery fee for moving goods between two regions, equal to the sum of the planned leg fees.
///
/// # Errors
///
/// Returns [`RoutingError::Region`] when either region has no warehouse.
pub fn delivery_fee(
    directory: &WarehouseDirectory,
    from: &Region,
    to: &Region,
    cross_region_surcharge: Amount,
) -> Result<Amount, RoutingError> {
    let origin = directory.lookup(from)?;

    if from == to {
        return Ok(origin.flat_fee);
    }

    let recipient = directory.lookup(to)?;

    origin
        .flat_fee
        .checked_add(recipient.flat_fee)
        .and_then(|fee| fee.checked_add(cross_region_surcharge))
        .ok_or(RoutingError::Overflow)
}
