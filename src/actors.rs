//! Actors

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::regions::Region;

/// Unknown role name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// Marketplace role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Supplier,
    DeliveryPerson,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Supplier => "supplier",
            Self::DeliveryPerson => "delivery_person",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "supplier" => Ok(Self::Supplier),
            "delivery_person" => Ok(Self::DeliveryPerson),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Authenticated user acting on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user: Uuid,
    pub role: Role,

    /// Serviced region, only meaningful for delivery personnel.
    pub region: Option<Region>,
}

impl Actor {
    #[must_use]
    pub fn new(user: Uuid, role: Role, region: Option<Region>) -> Self {
        Self { user, role, region }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the actor is `user` or an admin.
    #[must_use]
    pub fn is_or_admin(&self, user: Uuid) -> bool {
        self.user == user || self.is_admin()
    }
}
