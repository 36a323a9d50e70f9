//! Company, customer, and service-type operations, plus role resolution.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::auth::{AuthContext, Role};
use crate::error::{Error, Result};
use crate::geo::Point;
use crate::model::*;

/// What a company looks like before it exists.
pub struct NewCompany {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub owner_email: String,
}

impl super::Db {
    /// Register a new company (tenant).
    pub async fn create_company(&self, new: NewCompany) -> Result<Company> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO companies (id, name, address, phone, email, owner_email)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.owner_email)
        .execute(self.pool())
        .await?;

        self.get_company(CompanyId(id)).await
    }

    pub async fn get_company(&self, id: CompanyId) -> Result<Company> {
        let row: Option<CompanyRow> = sqlx::query_as(
            "SELECT id, name, address, phone, email, created_at FROM companies WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;

        row.map(CompanyRow::into_company)
            .ok_or_else(|| Error::NotFound(format!("company {id}")))
    }

    /// Resolve who a principal is, once per request.
    ///
    /// Checks company ownership first, then technician membership. A miss on
    /// both is `Role::Unknown` — callers reject it, nothing is guessed.
    pub async fn resolve_role(&self, email: &str) -> Result<Role> {
        let owner: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM companies WHERE owner_email = $1")
                .bind(email)
                .fetch_optional(self.pool())
                .await?;
        if let Some((company_id,)) = owner {
            return Ok(Role::Owner {
                company_id: CompanyId(company_id),
            });
        }

        let tech: Option<(Uuid, Uuid)> =
            sqlx::query_as("SELECT id, company_id FROM technicians WHERE email = $1")
                .bind(email)
                .fetch_optional(self.pool())
                .await?;
        if let Some((technician_id, company_id)) = tech {
            return Ok(Role::Technician {
                company_id: CompanyId(company_id),
                technician_id: TechnicianId(technician_id),
            });
        }

        Ok(Role::Unknown)
    }

    /// Add a customer to the context's company.
    pub async fn create_customer(
        &self,
        ctx: &AuthContext,
        name: &str,
        phone: &str,
        email: Option<&str>,
        address: &str,
        location: Option<Point>,
    ) -> Result<Customer> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO customers (id, company_id, name, phone, email, address, lat, lon)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(ctx.company_id.0)
        .bind(name)
        .bind(phone)
        .bind(email)
        .bind(address)
        .bind(location.map(|p| p.lat))
        .bind(location.map(|p| p.lon))
        .execute(self.pool())
        .await?;

        self.get_customer(ctx, CustomerId(id)).await
    }

    pub async fn get_customer(&self, ctx: &AuthContext, id: CustomerId) -> Result<Customer> {
        let row: Option<CustomerRow> = sqlx::query_as(
            "SELECT id, company_id, name, phone, email, address, lat, lon, notes, created_at
             FROM customers WHERE id = $1 AND company_id = $2",
        )
        .bind(id.0)
        .bind(ctx.company_id.0)
        .fetch_optional(self.pool())
        .await?;

        row.map(CustomerRow::into_customer)
            .ok_or_else(|| Error::NotFound(format!("customer {id}")))
    }

    pub async fn list_customers(&self, ctx: &AuthContext) -> Result<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            "SELECT id, company_id, name, phone, email, address, lat, lon, notes, created_at
             FROM customers WHERE company_id = $1 ORDER BY name",
        )
        .bind(ctx.company_id.0)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(CustomerRow::into_customer).collect())
    }

    /// Add a service type the company offers.
    pub async fn create_service_type(
        &self,
        ctx: &AuthContext,
        name: &str,
        description: Option<&str>,
        estimated_duration_minutes: u32,
        default_price: Option<Decimal>,
    ) -> Result<ServiceType> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO service_types (id, company_id, name, description, estimated_duration_minutes, default_price)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(ctx.company_id.0)
        .bind(name)
        .bind(description)
        .bind(estimated_duration_minutes as i32)
        .bind(default_price)
        .execute(self.pool())
        .await?;

        let row: ServiceTypeRow = sqlx::query_as(
            "SELECT id, company_id, name, description, estimated_duration_minutes, default_price
             FROM service_types WHERE id = $1",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await?;

        Ok(row.into_service_type())
    }

    pub async fn list_service_types(&self, ctx: &AuthContext) -> Result<Vec<ServiceType>> {
        let rows: Vec<ServiceTypeRow> = sqlx::query_as(
            "SELECT id, company_id, name, description, estimated_duration_minutes, default_price
             FROM service_types WHERE company_id = $1 ORDER BY name",
        )
        .bind(ctx.company_id.0)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(ServiceTypeRow::into_service_type).collect())
    }
}

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
    address: String,
    phone: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl CompanyRow {
    fn into_company(self) -> Company {
        Company {
            id: CompanyId(self.id),
            name: self.name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    company_id: Uuid,
    name: String,
    phone: String,
    email: Option<String>,
    address: String,
    lat: Option<f64>,
    lon: Option<f64>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self) -> Customer {
        Customer {
            id: CustomerId(self.id),
            company_id: CompanyId(self.company_id),
            name: self.name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            location: point_from(self.lat, self.lon),
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ServiceTypeRow {
    id: Uuid,
    company_id: Uuid,
    name: String,
    description: Option<String>,
    estimated_duration_minutes: i32,
    default_price: Option<Decimal>,
}

impl ServiceTypeRow {
    fn into_service_type(self) -> ServiceType {
        ServiceType {
            id: ServiceTypeId(self.id),
            company_id: CompanyId(self.company_id),
            name: self.name,
            description: self.description,
            estimated_duration_minutes: self.estimated_duration_minutes.max(0) as u32,
            default_price: self.default_price,
        }
    }
}

/// Both halves present → a point; anything less → no coordinates.
pub(crate) fn point_from(lat: Option<f64>, lon: Option<f64>) -> Option<Point> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Point { lat, lon }),
        _ => None,
    }
}
