//! Core domain model.
//!
//! A work order is a single service job tracked through a status lifecycle.
//! Companies are the tenant boundary: technicians, customers, service types,
//! and work orders all hang off one company and never cross it.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::geo::Point;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                // Short display: first 8 chars of UUID
                write!(f, "{}", &self.0.to_string()[..8])
            }
        }
    };
}

uuid_id!(CompanyId);
uuid_id!(TechnicianId);
uuid_id!(CustomerId);
uuid_id!(ServiceTypeId);
uuid_id!(OrderId);
uuid_id!(ExpenseId);

// ---------------------------------------------------------------------------
// Order status
// ---------------------------------------------------------------------------

/// Lifecycle status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, waiting for a technician.
    Pending,
    /// Technician bound, not yet moving.
    Assigned,
    /// Technician travelling to the service address.
    EnRoute,
    /// Technician on location, work in progress.
    OnSite,
    /// Done. Terminal.
    Completed,
    /// Called off before completion. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Assigned)
                | (Assigned, EnRoute)
                | (Assigned, Pending) // unassign / reassign
                | (EnRoute, OnSite)
                | (OnSite, Completed)
                | (Pending, Cancelled)
                | (Assigned, Cancelled)
                | (EnRoute, Cancelled)
                | (OnSite, Cancelled)
        )
    }

    /// Is this a terminal status?
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Does this order occupy a technician (counts toward workload)?
    pub fn is_active(self) -> bool {
        matches!(
            self,
            OrderStatus::Assigned | OrderStatus::EnRoute | OrderStatus::OnSite
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Assigned => "assigned",
            OrderStatus::EnRoute => "en_route",
            OrderStatus::OnSite => "on_site",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "assigned" => Ok(OrderStatus::Assigned),
            "en_route" => Ok(OrderStatus::EnRoute),
            "on_site" => Ok(OrderStatus::OnSite),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(Error::InvalidValue(format!("unknown order status: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Work order priority. Urgent orders weigh extra in workload scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(Error::InvalidValue(format!("unknown priority: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Technician status (derived, never persisted)
// ---------------------------------------------------------------------------

/// Display status of a technician, derived from their active orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicianStatus {
    /// Deactivated account.
    Offline,
    /// Active with no work in flight.
    Available,
    /// Has assigned orders but has not left yet.
    Assigned,
    /// Travelling to a job.
    EnRoute,
    /// Working a job on location.
    OnSite,
}

impl std::fmt::Display for TechnicianStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TechnicianStatus::Offline => "offline",
            TechnicianStatus::Available => "available",
            TechnicianStatus::Assigned => "assigned",
            TechnicianStatus::EnRoute => "en_route",
            TechnicianStatus::OnSite => "on_site",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

/// Tenant. Owns customers, technicians, service types, and work orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Technician
// ---------------------------------------------------------------------------

/// Mobile worker fulfilling work orders for one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub id: TechnicianId,
    pub company_id: CompanyId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub vehicle_plate: Option<String>,
    pub is_active: bool,

    /// Last reported position, if any.
    pub location: Option<Point>,
    pub last_location_update: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// A location report is considered fresh for this long.
pub const ONLINE_WINDOW_MINUTES: i64 = 5;

impl Technician {
    /// Online means a location report within the last 5 minutes.
    /// No report ever → offline.
    pub fn is_online(&self, now: DateTime<Utc>) -> bool {
        match self.last_location_update {
            Some(at) => at > now - Duration::minutes(ONLINE_WINDOW_MINUTES),
            None => false,
        }
    }

    /// Great-circle distance from the technician's last known position.
    /// None when no position has ever been reported.
    pub fn distance_km_from(&self, point: Point) -> Option<f64> {
        self.location.map(|loc| crate::geo::haversine_km(loc, point))
    }
}

// ---------------------------------------------------------------------------
// Customer
// ---------------------------------------------------------------------------

/// End customer of a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub company_id: CompanyId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    /// Geocoded position, when known. Used for routing hints only.
    pub location: Option<Point>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Service type
// ---------------------------------------------------------------------------

/// A kind of intervention a company offers (e.g. "boiler service").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: ServiceTypeId,
    pub company_id: CompanyId,
    pub name: String,
    pub description: Option<String>,
    pub estimated_duration_minutes: u32,
    pub default_price: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Work order
// ---------------------------------------------------------------------------

/// A single service job tracked through the status lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: OrderId,

    /// Human-facing number, unique per company. Assigned exactly once,
    /// at first persistence (see `dispatch::numbering`).
    pub order_number: String,

    pub company_id: CompanyId,
    pub customer_id: CustomerId,
    pub technician_id: Option<TechnicianId>,
    pub service_type_id: Option<ServiceTypeId>,

    pub title: String,
    pub description: String,
    pub status: OrderStatus,
    pub priority: Priority,

    pub scheduled_date: Option<DateTime<Utc>>,
    pub estimated_duration_minutes: u32,

    /// Where the work happens. May differ from the customer's address.
    pub service_address: String,
    pub service_location: Option<Point>,

    pub technician_notes: Option<String>,
    pub work_performed: Option<String>,
    pub materials_used: Option<String>,

    pub estimated_price: Option<Decimal>,
    pub final_price: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    /// When the technician arrived on site.
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkOrder {
    /// Elapsed on-site time, when both timestamps are present.
    pub fn completion_hours(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => {
                Some((end - start).num_seconds() as f64 / 3600.0)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Expense
// ---------------------------------------------------------------------------

/// Category of a cost incurred while working an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Parking,
    Fuel,
    Materials,
    Tolls,
    Other,
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExpenseCategory::Parking => "parking",
            ExpenseCategory::Fuel => "fuel",
            ExpenseCategory::Materials => "materials",
            ExpenseCategory::Tolls => "tolls",
            ExpenseCategory::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "parking" => Ok(ExpenseCategory::Parking),
            "fuel" => Ok(ExpenseCategory::Fuel),
            "materials" => Ok(ExpenseCategory::Materials),
            "tolls" => Ok(ExpenseCategory::Tolls),
            "other" => Ok(ExpenseCategory::Other),
            other => Err(Error::InvalidValue(format!(
                "unknown expense category: {other}"
            ))),
        }
    }
}

/// A cost incurred by a technician while working an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub order_id: OrderId,
    pub technician_id: TechnicianId,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for creating new work orders. The public API for order submission.
pub struct NewWorkOrder {
    pub(crate) company_id: CompanyId,
    pub(crate) customer_id: CustomerId,
    pub(crate) service_type_id: Option<ServiceTypeId>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) priority: Priority,
    pub(crate) scheduled_date: Option<DateTime<Utc>>,
    pub(crate) estimated_duration_minutes: u32,
    pub(crate) service_address: String,
    pub(crate) service_location: Option<Point>,
    pub(crate) estimated_price: Option<Decimal>,
}

impl NewWorkOrder {
    pub fn new(
        company_id: CompanyId,
        customer_id: CustomerId,
        title: impl Into<String>,
        service_address: impl Into<String>,
    ) -> Self {
        Self {
            company_id,
            customer_id,
            service_type_id: None,
            title: title.into(),
            description: String::new(),
            priority: Priority::Normal,
            scheduled_date: None,
            estimated_duration_minutes: 60,
            service_address: service_address.into(),
            service_location: None,
            estimated_price: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn service_type(mut self, id: ServiceTypeId) -> Self {
        self.service_type_id = Some(id);
        self
    }

    pub fn scheduled(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_date = Some(at);
        self
    }

    pub fn estimated_duration_minutes(mut self, minutes: u32) -> Self {
        self.estimated_duration_minutes = minutes;
        self
    }

    pub fn service_location(mut self, point: Point) -> Self {
        self.service_location = Some(point);
        self
    }

    pub fn estimated_price(mut self, price: Decimal) -> Self {
        self.estimated_price = Some(price);
        self
    }
}
