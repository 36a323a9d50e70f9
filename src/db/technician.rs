//! Technician operations: registration, location reports, derived status,
//! workload and performance reads.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::dispatch::ScoringPolicy;
use crate::dispatch::performance::{PerformanceStats, performance_stats};
use crate::dispatch::scoring::{can_accept, workload_score};
use crate::dispatch::status::resolve_status;
use crate::error::{Error, Result};
use crate::geo::Point;
use crate::model::*;

impl super::Db {
    /// Register a technician with the context's company.
    pub async fn create_technician(
        &self,
        ctx: &AuthContext,
        name: &str,
        email: &str,
        phone: &str,
        vehicle_plate: Option<&str>,
    ) -> Result<Technician> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO technicians (id, company_id, name, email, phone, vehicle_plate)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(ctx.company_id.0)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(vehicle_plate)
        .execute(self.pool())
        .await?;

        self.get_technician(ctx, TechnicianId(id)).await
    }

    pub async fn get_technician(&self, ctx: &AuthContext, id: TechnicianId) -> Result<Technician> {
        let row: Option<TechnicianRow> = sqlx::query_as(
            "SELECT id, company_id, name, email, phone, vehicle_plate, is_active,
                    current_lat, current_lon, last_location_update, created_at
             FROM technicians WHERE id = $1 AND company_id = $2",
        )
        .bind(id.0)
        .bind(ctx.company_id.0)
        .fetch_optional(self.pool())
        .await?;

        row.map(TechnicianRow::into_technician)
            .ok_or_else(|| Error::NotFound(format!("technician {id}")))
    }

    pub async fn list_technicians(&self, ctx: &AuthContext) -> Result<Vec<Technician>> {
        let rows: Vec<TechnicianRow> = sqlx::query_as(
            "SELECT id, company_id, name, email, phone, vehicle_plate, is_active,
                    current_lat, current_lon, last_location_update, created_at
             FROM technicians WHERE company_id = $1 ORDER BY name",
        )
        .bind(ctx.company_id.0)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(TechnicianRow::into_technician).collect())
    }

    /// Activate or deactivate a technician. Inactive technicians resolve to
    /// offline and accept no work.
    pub async fn set_technician_active(
        &self,
        ctx: &AuthContext,
        id: TechnicianId,
        is_active: bool,
    ) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE technicians SET is_active = $1 WHERE id = $2 AND company_id = $3",
        )
        .bind(is_active)
        .bind(id.0)
        .bind(ctx.company_id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(Error::NotFound(format!("technician {id}")));
        }
        Ok(())
    }

    /// Record a location report, refreshing the online window.
    pub async fn update_location(
        &self,
        ctx: &AuthContext,
        id: TechnicianId,
        point: Point,
    ) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE technicians
             SET current_lat = $1, current_lon = $2, last_location_update = now()
             WHERE id = $3 AND company_id = $4",
        )
        .bind(point.lat)
        .bind(point.lon)
        .bind(id.0)
        .bind(ctx.company_id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(Error::NotFound(format!("technician {id}")));
        }
        crate::telemetry::metrics::location_updates().add(1, &[]);
        Ok(())
    }

    /// Derived display status for the dashboard/map.
    ///
    /// Active orders are fetched oldest-first so the resolver's tie-break is
    /// stable across calls.
    pub async fn technician_status(
        &self,
        ctx: &AuthContext,
        id: TechnicianId,
    ) -> Result<TechnicianStatus> {
        let technician = self.get_technician(ctx, id).await?;
        let orders = self.active_orders_for(ctx, id).await?;
        Ok(resolve_status(technician.is_active, &orders))
    }

    /// Workload score in [0, 100] from the technician's in-flight orders.
    pub async fn workload_score(&self, ctx: &AuthContext, id: TechnicianId) -> Result<u8> {
        let (active, urgent) = self.active_order_counts(ctx, id).await?;
        Ok(workload_score(active, urgent))
    }

    /// Admission check: could this technician take one more order right now?
    ///
    /// Point-in-time read. `assign_order` re-checks under a row lock; this
    /// variant is for display and pre-filtering candidates.
    pub async fn can_accept_order(
        &self,
        ctx: &AuthContext,
        id: TechnicianId,
        policy: &ScoringPolicy,
    ) -> Result<bool> {
        let technician = self.get_technician(ctx, id).await?;
        let (active, _) = self.active_order_counts(ctx, id).await?;
        Ok(can_accept(technician.is_active, active, policy.max_active_orders))
    }

    /// Windowed performance statistics for a technician.
    pub async fn performance_stats(
        &self,
        ctx: &AuthContext,
        id: TechnicianId,
        policy: &ScoringPolicy,
    ) -> Result<PerformanceStats> {
        // Existence check first so an unknown id is an error, not empty stats.
        self.get_technician(ctx, id).await?;

        let now = Utc::now();
        let since = now - chrono::Duration::days(policy.window_days);
        let orders = self.orders_for_technician_since(ctx, id, since).await?;
        Ok(performance_stats(&orders, now, policy))
    }

    /// Active (assigned / en-route / on-site) orders, oldest first.
    pub(crate) async fn active_orders_for(
        &self,
        ctx: &AuthContext,
        id: TechnicianId,
    ) -> Result<Vec<WorkOrder>> {
        self.list_orders_where(
            ctx,
            "technician_id = $2 AND status IN ('assigned', 'en_route', 'on_site')
             ORDER BY created_at ASC",
            Some(id),
            None,
        )
        .await
    }

    pub(crate) async fn active_order_counts(
        &self,
        ctx: &AuthContext,
        id: TechnicianId,
    ) -> Result<(u32, u32)> {
        let (active, urgent): (i64, i64) = sqlx::query_as(
            "SELECT count(*),
                    count(*) FILTER (WHERE priority = 'urgent')
             FROM work_orders
             WHERE company_id = $1 AND technician_id = $2
               AND status IN ('assigned', 'en_route', 'on_site')",
        )
        .bind(ctx.company_id.0)
        .bind(id.0)
        .fetch_one(self.pool())
        .await?;

        Ok((active as u32, urgent as u32))
    }

    async fn orders_for_technician_since(
        &self,
        ctx: &AuthContext,
        id: TechnicianId,
        since: DateTime<Utc>,
    ) -> Result<Vec<WorkOrder>> {
        self.list_orders_where(
            ctx,
            "technician_id = $2 AND created_at >= $3 ORDER BY created_at ASC",
            Some(id),
            Some(since),
        )
        .await
    }
}

#[derive(sqlx::FromRow)]
struct TechnicianRow {
    id: Uuid,
    company_id: Uuid,
    name: String,
    email: String,
    phone: String,
    vehicle_plate: Option<String>,
    is_active: bool,
    current_lat: Option<f64>,
    current_lon: Option<f64>,
    last_location_update: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TechnicianRow {
    fn into_technician(self) -> Technician {
        Technician {
            id: TechnicianId(self.id),
            company_id: CompanyId(self.company_id),
            name: self.name,
            email: self.email,
            phone: self.phone,
            vehicle_plate: self.vehicle_plate,
            is_active: self.is_active,
            location: super::company::point_from(self.current_lat, self.current_lon),
            last_location_update: self.last_location_update,
            created_at: self.created_at,
        }
    }
}
