//! Shipments
//!
//! Every leg moves through `created → ready_to_ship → on_my_way` and then ends either at a
//! warehouse (`delivered_to_warehouse`) or at the recipient (`delivered_successfully` or
//! `failed_delivery`). Legs that have not been picked up can be cancelled.
//!
//! The functions here only decide whether a transition is allowed and what the next status is.
//! Callers persist the result with a conditional update on the current status.

use std::{fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    actors::{Actor, Role},
    regions::Region,
    routing::{Direction, Party},
};

/// Errors raised by shipment transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShipmentError {
    /// The actor may not perform this action on this leg.
    #[error("actor is not permitted to {0} this shipment")]
    Forbidden(Action),

    /// The leg is not in a state that allows the action.
    #[error("cannot {action} a shipment that is {status}")]
    InvalidTransition {
        /// Attempted action.
        action: Action,
        /// Current status.
        status: ShipmentStatus,
    },

    /// Another delivery person already holds the leg.
    #[error("shipment has already been taken")]
    AlreadyTaken,

    /// Submitted code does not match the stored code.
    #[error("invalid confirmation code")]
    InvalidConfirmationCode,

    /// The leg starts outside the delivery person's serviced region.
    #[error("shipment departs from {leg}, outside serviced region {serviced}")]
    RegionMismatch {
        /// Region the leg departs from.
        leg: Region,
        /// Region serviced by the delivery person.
        serviced: String,
    },

    /// Stored status string is not recognised.
    #[error("unknown shipment status: {0}")]
    UnknownStatus(String),
}

/// Shipment leg status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Created,
    ReadyToShip,
    OnMyWay,
    DeliveredToWarehouse,
    DeliveredSuccessfully,
    FailedDelivery,
    Cancelled,
}

impl ShipmentStatus {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::ReadyToShip => "ready_to_ship",
            Self::OnMyWay => "on_my_way",
            Self::DeliveredToWarehouse => "delivered_to_warehouse",
            Self::DeliveredSuccessfully => "delivered_successfully",
            Self::FailedDelivery => "failed_delivery",
            Self::Cancelled => "cancelled",
        }
    }

    /// Not yet picked up.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Created | Self::ReadyToShip)
    }

    /// The leg has finished moving goods.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::DeliveredToWarehouse | Self::DeliveredSuccessfully)
    }

    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::DeliveredToWarehouse
                | Self::DeliveredSuccessfully
                | Self::FailedDelivery
                | Self::Cancelled
        )
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = ShipmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "ready_to_ship" => Ok(Self::ReadyToShip),
            "on_my_way" => Ok(Self::OnMyWay),
            "delivered_to_warehouse" => Ok(Self::DeliveredToWarehouse),
            "delivered_successfully" => Ok(Self::DeliveredSuccessfully),
            "failed_delivery" => Ok(Self::FailedDelivery),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ShipmentError::UnknownStatus(other.to_string())),
        }
    }
}

/// Shipment action, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MarkReady,
    Accept,
    ArriveAtWarehouse,
    ConfirmDelivery,
    FailDelivery,
    Release,
    Cancel,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MarkReady => "mark ready",
            Self::Accept => "accept",
            Self::ArriveAtWarehouse => "drop at warehouse",
            Self::ConfirmDelivery => "confirm delivery of",
            Self::FailDelivery => "fail delivery of",
            Self::Release => "release",
            Self::Cancel => "cancel",
        })
    }
}

/// One-time numeric code the recipient hands over on final delivery.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationCode(String);

impl ConfirmationCode {
    /// Generate a random six digit code.
    #[must_use]
    pub fn generate() -> Self {
        let code: u32 = rand::thread_rng().gen_range(0..1_000_000);

        Self(format!("{code:06}"))
    }

    /// Whether a submitted code matches, ignoring surrounding whitespace.
    #[must_use]
    pub fn matches(&self, submitted: &str) -> bool {
        self.0 == submitted.trim()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConfirmationCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConfirmationCode(******)")
    }
}

/// Snapshot of a leg as needed to decide transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub uuid: Uuid,
    pub direction: Direction,
    pub sequence: u8,
    pub from: Party,
    pub to: Party,
    pub from_region: Region,
    pub to_region: Region,
    pub status: ShipmentStatus,
    pub delivery_person: Option<Uuid>,
}

impl Leg {
    /// Whether the leg ends at a warehouse rather than at the recipient.
    #[must_use]
    pub fn ends_at_warehouse(&self) -> bool {
        matches!(self.to, Party::Warehouse(_))
    }

    fn require(&self, action: Action, status: ShipmentStatus) -> Result<(), ShipmentError> {
        if self.status == status {
            Ok(())
        } else {
            Err(ShipmentError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }

    fn require_holder(&self, actor: &Actor, action: Action) -> Result<(), ShipmentError> {
        if actor.role == Role::DeliveryPerson && self.delivery_person == Some(actor.user) {
            Ok(())
        } else {
            Err(ShipmentError::Forbidden(action))
        }
    }

    /// Origin party hands the goods over for pickup.
    ///
    /// # Errors
    ///
    /// - [`ShipmentError::Forbidden`]: the actor is not the sending supplier or customer.
    /// - [`ShipmentError::InvalidTransition`]: the leg is not `created`.
    pub fn mark_ready(&self, actor: &Actor) -> Result<ShipmentStatus, ShipmentError> {
        let is_origin = match &self.from {
            Party::Supplier(user) => actor.role == Role::Supplier && *user == actor.user,
            Party::Customer(user) => actor.role == Role::Customer && *user == actor.user,
            Party::Warehouse(_) => false,
        };

        if !is_origin && !actor.is_admin() {
            return Err(ShipmentError::Forbidden(Action::MarkReady));
        }

        self.require(Action::MarkReady, ShipmentStatus::Created)?;

        Ok(ShipmentStatus::ReadyToShip)
    }

    /// Onward leg becomes available once the previous leg reached the warehouse.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentError::InvalidTransition`] unless this is a `created` leg departing a
    /// warehouse.
    pub fn release(&self) -> Result<ShipmentStatus, ShipmentError> {
        if !matches!(self.from, Party::Warehouse(_)) {
            return Err(ShipmentError::InvalidTransition {
                action: Action::Release,
                status: self.status,
            });
        }

        self.require(Action::Release, ShipmentStatus::Created)?;

        Ok(ShipmentStatus::ReadyToShip)
    }

    /// Delivery person claims an unclaimed leg in their region.
    ///
    /// # Errors
    ///
    /// - [`ShipmentError::Forbidden`]: the actor is not a delivery person.
    /// - [`ShipmentError::AlreadyTaken`]: the leg has a delivery person.
    /// - [`ShipmentError::InvalidTransition`]: the leg is not `ready_to_ship`.
    /// - [`ShipmentError::RegionMismatch`]: the leg departs outside the serviced region.
    pub fn accept(&self, actor: &Actor) -> Result<ShipmentStatus, ShipmentError> {
        if actor.role != Role::DeliveryPerson {
            return Err(ShipmentError::Forbidden(Action::Accept));
        }

        if self.delivery_person.is_some() {
            return Err(ShipmentError::AlreadyTaken);
        }

        self.require(Action::Accept, ShipmentStatus::ReadyToShip)?;

        if actor.region.as_ref() != Some(&self.from_region) {
            return Err(ShipmentError::RegionMismatch {
                leg: self.from_region.clone(),
                serviced: actor
                    .region
                    .as_ref()
                    .map_or_else(|| "none".to_string(), ToString::to_string),
            });
        }

        Ok(ShipmentStatus::OnMyWay)
    }

    /// Holder drops the goods at the intermediate warehouse.
    ///
    /// # Errors
    ///
    /// - [`ShipmentError::Forbidden`]: the actor does not hold the leg.
    /// - [`ShipmentError::InvalidTransition`]: the leg is not `on_my_way` or ends at the recipient.
    pub fn arrive_at_warehouse(&self, actor: &Actor) -> Result<ShipmentStatus, ShipmentError> {
        self.require_holder(actor, Action::ArriveAtWarehouse)?;
        self.require(Action::ArriveAtWarehouse, ShipmentStatus::OnMyWay)?;

        if !self.ends_at_warehouse() {
            return Err(ShipmentError::InvalidTransition {
                action: Action::ArriveAtWarehouse,
                status: self.status,
            });
        }

        Ok(ShipmentStatus::DeliveredToWarehouse)
    }

    /// Holder hands the goods to the recipient against the confirmation code.
    ///
    /// # Errors
    ///
    /// - [`ShipmentError::Forbidden`]: the actor does not hold the leg.
    /// - [`ShipmentError::InvalidTransition`]: the leg is not `on_my_way` or ends at a warehouse.
    /// - [`ShipmentError::InvalidConfirmationCode`]: the code does not match.
    pub fn confirm_delivery(
        &self,
        actor: &Actor,
        expected: &ConfirmationCode,
        submitted: &str,
    ) -> Result<ShipmentStatus, ShipmentError> {
        self.require_holder(actor, Action::ConfirmDelivery)?;
        self.require(Action::ConfirmDelivery, ShipmentStatus::OnMyWay)?;

        if self.ends_at_warehouse() {
            return Err(ShipmentError::InvalidTransition {
                action: Action::ConfirmDelivery,
                status: self.status,
            });
        }

        if !expected.matches(submitted) {
            return Err(ShipmentError::InvalidConfirmationCode);
        }

        Ok(ShipmentStatus::DeliveredSuccessfully)
    }

    /// Holder reports that the recipient could not be reached.
    ///
    /// # Errors
    ///
    /// - [`ShipmentError::Forbidden`]: the actor does not hold the leg.
    /// - [`ShipmentError::InvalidTransition`]: the leg is not `on_my_way` or ends at a warehouse.
    pub fn fail_delivery(&self, actor: &Actor) -> Result<ShipmentStatus, ShipmentError> {
        self.require_holder(actor, Action::FailDelivery)?;
        self.require(Action::FailDelivery, ShipmentStatus::OnMyWay)?;

        if self.ends_at_warehouse() {
            return Err(ShipmentError::InvalidTransition {
                action: Action::FailDelivery,
                status: self.status,
            });
        }

        Ok(ShipmentStatus::FailedDelivery)
    }

    /// Cancel a leg that has not been picked up.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentError::InvalidTransition`] once the leg is in transit or finished.
    pub fn cancel(&self) -> Result<ShipmentStatus, ShipmentError> {
        if !self.status.is_cancellable() {
            return Err(ShipmentError::InvalidTransition {
                action: Action::Cancel,
                status: self.status,
            });
        }

        Ok(ShipmentStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    struct Scenario {
        supplier: Actor,
        customer: Actor,
        courier: Actor,
    }

    fn scenario() -> Scenario {
        Scenario {
            supplier: Actor::new(Uuid::now_v7(), Role::Supplier, None),
            customer: Actor::new(Uuid::now_v7(), Role::Customer, None),
            courier: Actor::new(
                Uuid::now_v7(),
                Role::DeliveryPerson,
                Some(Region::new("Cairo")),
            ),
        }
    }

    fn direct_leg(s: &Scenario, status: ShipmentStatus) -> Leg {
        Leg {
            uuid: Uuid::now_v7(),
            direction: Direction::Outbound,
            sequence: 1,
            from: Party::Supplier(s.supplier.user),
            to: Party::Customer(s.customer.user),
            from_region: Region::new("Cairo"),
            to_region: Region::new("Cairo"),
            status,
            delivery_person: None,
        }
    }

    fn hub_leg(s: &Scenario, status: ShipmentStatus) -> Leg {
        Leg {
            to: Party::Warehouse(Region::new("Giza")),
            to_region: Region::new("Giza"),
            ..direct_leg(s, status)
        }
    }

    #[test]
    fn supplier_marks_own_leg_ready() -> TestResult {
        let s = scenario();
        let leg = direct_leg(&s, ShipmentStatus::Created);

        assert_eq!(leg.mark_ready(&s.supplier)?, ShipmentStatus::ReadyToShip);

        let stranger = Actor::new(Uuid::now_v7(), Role::Supplier, None);

        assert_eq!(
            leg.mark_ready(&stranger),
            Err(ShipmentError::Forbidden(Action::MarkReady))
        );

        Ok(())
    }

    #[test]
    fn onward_leg_cannot_be_marked_ready_by_hand() {
        let s = scenario();
        let mut leg = direct_leg(&s, ShipmentStatus::Created);
        leg.from = Party::Warehouse(Region::new("Cairo"));

        assert_eq!(
            leg.mark_ready(&s.supplier),
            Err(ShipmentError::Forbidden(Action::MarkReady))
        );
        assert_eq!(leg.release(), Ok(ShipmentStatus::ReadyToShip));
    }

    #[test]
    fn courier_accepts_unclaimed_leg_in_region() -> TestResult {
        let s = scenario();
        let leg = direct_leg(&s, ShipmentStatus::ReadyToShip);

        assert_eq!(leg.accept(&s.courier)?, ShipmentStatus::OnMyWay);

        Ok(())
    }

    #[test]
    fn claimed_leg_is_already_taken() {
        let s = scenario();
        let mut leg = direct_leg(&s, ShipmentStatus::ReadyToShip);
        leg.delivery_person = Some(Uuid::now_v7());

        assert_eq!(leg.accept(&s.courier), Err(ShipmentError::AlreadyTaken));
    }

    #[test]
    fn courier_outside_region_cannot_accept() {
        let s = scenario();
        let leg = direct_leg(&s, ShipmentStatus::ReadyToShip);
        let giza_courier = Actor::new(
            Uuid::now_v7(),
            Role::DeliveryPerson,
            Some(Region::new("Giza")),
        );

        assert_eq!(
            leg.accept(&giza_courier),
            Err(ShipmentError::RegionMismatch {
                leg: Region::new("cairo"),
                serviced: "giza".to_string(),
            })
        );
    }

    #[test]
    fn leg_not_ready_cannot_be_accepted() {
        let s = scenario();
        let leg = direct_leg(&s, ShipmentStatus::Created);

        assert_eq!(
            leg.accept(&s.courier),
            Err(ShipmentError::InvalidTransition {
                action: Action::Accept,
                status: ShipmentStatus::Created,
            })
        );
    }

    #[test]
    fn delivery_requires_matching_code() -> TestResult {
        let s = scenario();
        let mut leg = direct_leg(&s, ShipmentStatus::OnMyWay);
        leg.delivery_person = Some(s.courier.user);
        let code = ConfirmationCode::from("042917".to_string());

        assert_eq!(
            leg.confirm_delivery(&s.courier, &code, "000000"),
            Err(ShipmentError::InvalidConfirmationCode)
        );
        assert_eq!(
            leg.confirm_delivery(&s.courier, &code, " 042917 ")?,
            ShipmentStatus::DeliveredSuccessfully
        );

        Ok(())
    }

    #[test]
    fn only_holder_can_deliver() {
        let s = scenario();
        let mut leg = direct_leg(&s, ShipmentStatus::OnMyWay);
        leg.delivery_person = Some(Uuid::now_v7());
        let code = ConfirmationCode::generate();

        assert_eq!(
            leg.confirm_delivery(&s.courier, &code, code.as_str()),
            Err(ShipmentError::Forbidden(Action::ConfirmDelivery))
        );
        assert_eq!(
            leg.fail_delivery(&s.courier),
            Err(ShipmentError::Forbidden(Action::FailDelivery))
        );
    }

    #[test]
    fn warehouse_leg_ends_at_warehouse_without_code() -> TestResult {
        let s = scenario();
        let mut leg = hub_leg(&s, ShipmentStatus::OnMyWay);
        leg.delivery_person = Some(s.courier.user);
        let code = ConfirmationCode::generate();

        assert_eq!(
            leg.confirm_delivery(&s.courier, &code, code.as_str()),
            Err(ShipmentError::InvalidTransition {
                action: Action::ConfirmDelivery,
                status: ShipmentStatus::OnMyWay,
            })
        );
        assert_eq!(
            leg.arrive_at_warehouse(&s.courier)?,
            ShipmentStatus::DeliveredToWarehouse
        );

        Ok(())
    }

    #[test]
    fn only_legs_not_picked_up_can_be_cancelled() {
        let s = scenario();

        assert_eq!(
            direct_leg(&s, ShipmentStatus::ReadyToShip).cancel(),
            Ok(ShipmentStatus::Cancelled)
        );
        assert_eq!(
            direct_leg(&s, ShipmentStatus::OnMyWay).cancel(),
            Err(ShipmentError::InvalidTransition {
                action: Action::Cancel,
                status: ShipmentStatus::OnMyWay,
            })
        );
    }

    #[test]
    fn generated_codes_are_six_digits() {
        let code = ConfirmationCode::generate();

        assert_eq!(code.as_str().len(), 6);
        assert!(
            code.as_str().chars().all(|c| c.is_ascii_digit()),
            "code should be numeric"
        );
    }

    #[test]
    fn statuses_parse_from_storage() -> TestResult {
        assert_eq!(
            "delivered_to_warehouse".parse::<ShipmentStatus>()?,
            ShipmentStatus::DeliveredToWarehouse
        );
        assert_eq!(
            "lost".parse::<ShipmentStatus>(),
            Err(ShipmentError::UnknownStatus("lost".to_string()))
        );

        Ok(())
    }
}
