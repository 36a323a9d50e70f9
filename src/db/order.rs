//! Work order operations: creation with per-company numbering, assignment
//! under a technician row lock, validated status transitions, expenses.

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::auth::{AuthContext, Role};
use crate::dispatch::ScoringPolicy;
use crate::dispatch::numbering::next_order_number;
use crate::dispatch::scoring::can_accept;
use crate::error::{Error, Result};
use crate::model::*;
use crate::telemetry::metrics;

/// Bounded retries for the count-then-insert numbering race. Each retry
/// recounts after the competing writer committed, so one extra pass usually
/// settles it.
const MAX_NUMBERING_ATTEMPTS: u32 = 5;

const ORDER_COLUMNS: &str = "id, order_number, company_id, customer_id, technician_id, service_type_id, \
     title, description, status, priority, scheduled_date, estimated_duration_minutes, \
     service_address, service_lat, service_lon, technician_notes, work_performed, \
     materials_used, estimated_price, final_price, created_at, assigned_at, started_at, \
     completed_at";

/// Validate a status transition, returning an error if disallowed.
fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

impl super::Db {
    /// Create a new work order in Pending, assigning its order number.
    ///
    /// The number is `<3-letter prefix><year><seq>` where seq counts the
    /// company's orders this calendar year. Counting and inserting are not
    /// atomic, so a concurrent creator can pick the same number; the unique
    /// `(company_id, order_number)` index rejects the loser and we recount.
    pub async fn create_order(&self, ctx: &AuthContext, new: NewWorkOrder) -> Result<WorkOrder> {
        if new.company_id != ctx.company_id {
            return Err(Error::InvalidValue(
                "order company does not match authorization context".to_string(),
            ));
        }
        let company = self.get_company(ctx.company_id).await?;
        // Customer must exist within the tenant.
        self.get_customer(ctx, new.customer_id).await?;

        for attempt in 1..=MAX_NUMBERING_ATTEMPTS {
            // Prefix year and counted window come from the same clock, the
            // database's, so they cannot disagree around New Year.
            let (count, year): (i64, i32) = sqlx::query_as(
                "SELECT count(*), extract(year FROM now())::int
                 FROM work_orders
                 WHERE company_id = $1
                   AND created_at >= date_trunc('year', now())
                   AND created_at < date_trunc('year', now()) + interval '1 year'",
            )
            .bind(ctx.company_id.0)
            .fetch_one(self.pool())
            .await?;

            let number = next_order_number(&company.name, year, count as u32);
            let id = Uuid::new_v4();

            let res = sqlx::query(
                "INSERT INTO work_orders (id, order_number, company_id, customer_id, service_type_id,
                     title, description, status, priority, scheduled_date,
                     estimated_duration_minutes, service_address, service_lat, service_lon,
                     estimated_price)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, $10, $11, $12, $13, $14)",
            )
            .bind(id)
            .bind(&number)
            .bind(ctx.company_id.0)
            .bind(new.customer_id.0)
            .bind(new.service_type_id.map(|s| s.0))
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.priority.to_string())
            .bind(new.scheduled_date)
            .bind(new.estimated_duration_minutes as i32)
            .bind(&new.service_address)
            .bind(new.service_location.map(|p| p.lat))
            .bind(new.service_location.map(|p| p.lon))
            .bind(new.estimated_price)
            .execute(self.pool())
            .await;

            match res {
                Ok(_) => {
                    metrics::orders_created().add(
                        1,
                        &[KeyValue::new("priority", new.priority.to_string())],
                    );
                    return self.get_order(ctx, OrderId(id)).await;
                }
                Err(e) if super::is_unique_violation(&e) => {
                    tracing::warn!(
                        order_number = %number,
                        attempt,
                        "order number collision, recounting"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::OrderNumberConflict {
            company: company.name,
            attempts: MAX_NUMBERING_ATTEMPTS,
        })
    }

    pub async fn get_order(&self, ctx: &AuthContext, id: OrderId) -> Result<WorkOrder> {
        let sql =
            format!("SELECT {ORDER_COLUMNS} FROM work_orders WHERE id = $1 AND company_id = $2");
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .bind(ctx.company_id.0)
            .fetch_optional(self.pool())
            .await?;

        row.ok_or_else(|| Error::NotFound(format!("work order {id}")))?
            .try_into_order()
    }

    /// List the company's orders, newest first, with optional filters.
    ///
    /// Technician contexts only see their own orders.
    pub async fn list_orders(
        &self,
        ctx: &AuthContext,
        status: Option<OrderStatus>,
        priority: Option<Priority>,
        limit: i64,
    ) -> Result<Vec<WorkOrder>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM work_orders WHERE company_id = $1");
        let mut idx = 2;

        let own_only = match ctx.role {
            Role::Technician { technician_id, .. } => Some(technician_id),
            _ => None,
        };
        if own_only.is_some() {
            sql.push_str(&format!(" AND technician_id = ${idx}"));
            idx += 1;
        }
        if status.is_some() {
            sql.push_str(&format!(" AND status = ${idx}"));
            idx += 1;
        }
        if priority.is_some() {
            sql.push_str(&format!(" AND priority = ${idx}"));
            idx += 1;
        }
        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ${idx}"));

        let mut query = sqlx::query_as::<_, OrderRow>(&sql).bind(ctx.company_id.0);
        if let Some(tech) = own_only {
            query = query.bind(tech.0);
        }
        if let Some(status) = status {
            query = query.bind(status.to_string());
        }
        if let Some(priority) = priority {
            query = query.bind(priority.to_string());
        }
        let rows = query.bind(limit).fetch_all(self.pool()).await?;

        rows.into_iter().map(OrderRow::try_into_order).collect()
    }

    /// Assign a pending order to a technician: Pending → Assigned.
    ///
    /// Runs in one transaction with the technician row locked, so two
    /// dispatchers racing on the same technician cannot both pass the
    /// eligibility check.
    pub async fn assign_order(
        &self,
        ctx: &AuthContext,
        order_id: OrderId,
        technician_id: TechnicianId,
        policy: &ScoringPolicy,
    ) -> Result<WorkOrder> {
        let mut tx = self.pool().begin().await?;

        let tech: Option<(bool,)> = sqlx::query_as(
            "SELECT is_active FROM technicians
             WHERE id = $1 AND company_id = $2
             FOR UPDATE",
        )
        .bind(technician_id.0)
        .bind(ctx.company_id.0)
        .fetch_optional(&mut *tx)
        .await?;
        let (is_active,) =
            tech.ok_or_else(|| Error::NotFound(format!("technician {technician_id}")))?;

        let (active,): (i64,) = sqlx::query_as(
            "SELECT count(*) FROM work_orders
             WHERE technician_id = $1 AND status IN ('assigned', 'en_route', 'on_site')",
        )
        .bind(technician_id.0)
        .fetch_one(&mut *tx)
        .await?;

        if !can_accept(is_active, active as u32, policy.max_active_orders) {
            metrics::order_assignments().add(1, &[KeyValue::new("result", "rejected")]);
            return Err(Error::TechnicianUnavailable(technician_id.to_string()));
        }

        let rows = sqlx::query(
            "UPDATE work_orders
             SET status = 'assigned', technician_id = $1, assigned_at = now()
             WHERE id = $2 AND company_id = $3 AND status = 'pending'",
        )
        .bind(technician_id.0)
        .bind(order_id.0)
        .bind(ctx.company_id.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows == 0 {
            let current = self.get_order(ctx, order_id).await?;
            return Err(Error::InvalidTransition {
                from: current.status.to_string(),
                to: OrderStatus::Assigned.to_string(),
            });
        }

        tx.commit().await?;

        metrics::order_assignments().add(1, &[KeyValue::new("result", "ok")]);
        metrics::order_status_transitions().add(
            1,
            &[KeyValue::new("from", "pending"), KeyValue::new("to", "assigned")],
        );

        self.get_order(ctx, order_id).await
    }

    /// Return an assigned order to the pending pool (reassignment path).
    pub async fn unassign_order(&self, ctx: &AuthContext, order_id: OrderId) -> Result<WorkOrder> {
        let rows = sqlx::query(
            "UPDATE work_orders
             SET status = 'pending', technician_id = NULL, assigned_at = NULL
             WHERE id = $1 AND company_id = $2 AND status = 'assigned'",
        )
        .bind(order_id.0)
        .bind(ctx.company_id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows == 0 {
            let current = self.get_order(ctx, order_id).await?;
            return Err(Error::InvalidTransition {
                from: current.status.to_string(),
                to: OrderStatus::Pending.to_string(),
            });
        }

        metrics::order_status_transitions().add(
            1,
            &[KeyValue::new("from", "assigned"), KeyValue::new("to", "pending")],
        );

        self.get_order(ctx, order_id).await
    }

    /// Transition an order's status with optimistic concurrency.
    ///
    /// Entering OnSite stamps `started_at` (the technician arrived);
    /// entering Completed stamps `completed_at`. A lost race (the row is no
    /// longer in `from`) reports an invalid transition.
    pub async fn transition_order(
        &self,
        ctx: &AuthContext,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<WorkOrder> {
        validate_transition(from, to)?;
        if to == OrderStatus::Assigned {
            return Err(Error::InvalidValue(
                "assignment must go through assign_order".to_string(),
            ));
        }

        let now = Utc::now();
        let started_at = (to == OrderStatus::OnSite).then_some(now);
        let completed_at = (to == OrderStatus::Completed).then_some(now);

        let rows = sqlx::query(
            "UPDATE work_orders
             SET status = $1,
                 started_at = COALESCE($2, started_at),
                 completed_at = COALESCE($3, completed_at)
             WHERE id = $4 AND company_id = $5 AND status = $6",
        )
        .bind(to.to_string())
        .bind(started_at)
        .bind(completed_at)
        .bind(id.0)
        .bind(ctx.company_id.0)
        .bind(from.to_string())
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(Error::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        metrics::order_status_transitions().add(
            1,
            &[
                KeyValue::new("from", from.to_string()),
                KeyValue::new("to", to.to_string()),
            ],
        );

        self.get_order(ctx, id).await
    }

    /// Record work results on an order that reached the site.
    ///
    /// Results only make sense once the technician is (or was) on location;
    /// pending, merely-assigned, en-route, and cancelled orders reject them.
    pub async fn record_work_results(
        &self,
        ctx: &AuthContext,
        id: OrderId,
        technician_notes: Option<&str>,
        work_performed: Option<&str>,
        materials_used: Option<&str>,
        final_price: Option<Decimal>,
    ) -> Result<WorkOrder> {
        let order = self.get_order(ctx, id).await?;
        if !matches!(order.status, OrderStatus::OnSite | OrderStatus::Completed) {
            return Err(Error::InvalidValue(format!(
                "work results require an on-site or completed order, not {}",
                order.status
            )));
        }

        let rows = sqlx::query(
            "UPDATE work_orders
             SET technician_notes = COALESCE($1, technician_notes),
                 work_performed = COALESCE($2, work_performed),
                 materials_used = COALESCE($3, materials_used),
                 final_price = COALESCE($4, final_price)
             WHERE id = $5 AND company_id = $6",
        )
        .bind(technician_notes)
        .bind(work_performed)
        .bind(materials_used)
        .bind(final_price)
        .bind(id.0)
        .bind(ctx.company_id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(Error::NotFound(format!("work order {id}")));
        }
        self.get_order(ctx, id).await
    }

    /// Record a cost incurred while working an order.
    pub async fn add_expense(
        &self,
        ctx: &AuthContext,
        order_id: OrderId,
        technician_id: TechnicianId,
        category: ExpenseCategory,
        description: &str,
        amount: Decimal,
    ) -> Result<Expense> {
        // Both ends of the relation must live in the tenant.
        self.get_order(ctx, order_id).await?;
        self.get_technician(ctx, technician_id).await?;

        let id = Uuid::new_v4();
        let row: ExpenseRow = sqlx::query_as(
            "INSERT INTO expenses (id, order_id, technician_id, category, description, amount)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, order_id, technician_id, category, description, amount, created_at",
        )
        .bind(id)
        .bind(order_id.0)
        .bind(technician_id.0)
        .bind(category.to_string())
        .bind(description)
        .bind(amount)
        .fetch_one(self.pool())
        .await?;

        row.try_into_expense()
    }

    pub async fn list_expenses(&self, ctx: &AuthContext, order_id: OrderId) -> Result<Vec<Expense>> {
        self.get_order(ctx, order_id).await?;

        let rows: Vec<ExpenseRow> = sqlx::query_as(
            "SELECT id, order_id, technician_id, category, description, amount, created_at
             FROM expenses WHERE order_id = $1 ORDER BY created_at ASC",
        )
        .bind(order_id.0)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(ExpenseRow::try_into_expense).collect()
    }

    /// Shared filtered fetch for the technician read paths. `clause` refers
    /// to $2 (technician id) and optionally $3 (created-at floor).
    pub(crate) async fn list_orders_where(
        &self,
        ctx: &AuthContext,
        clause: &str,
        technician: Option<TechnicianId>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<WorkOrder>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM work_orders WHERE company_id = $1 AND {clause}");
        let mut query = sqlx::query_as::<_, OrderRow>(&sql).bind(ctx.company_id.0);
        if let Some(tech) = technician {
            query = query.bind(tech.0);
        }
        if let Some(since) = since {
            query = query.bind(since);
        }
        let rows = query.fetch_all(self.pool()).await?;
        rows.into_iter().map(OrderRow::try_into_order).collect()
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    company_id: Uuid,
    customer_id: Uuid,
    technician_id: Option<Uuid>,
    service_type_id: Option<Uuid>,
    title: String,
    description: String,
    status: String,
    priority: String,
    scheduled_date: Option<DateTime<Utc>>,
    estimated_duration_minutes: i32,
    service_address: String,
    service_lat: Option<f64>,
    service_lon: Option<f64>,
    technician_notes: Option<String>,
    work_performed: Option<String>,
    materials_used: Option<String>,
    estimated_price: Option<Decimal>,
    final_price: Option<Decimal>,
    created_at: DateTime<Utc>,
    assigned_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn try_into_order(self) -> Result<WorkOrder> {
        Ok(WorkOrder {
            id: OrderId(self.id),
            order_number: self.order_number,
            company_id: CompanyId(self.company_id),
            customer_id: CustomerId(self.customer_id),
            technician_id: self.technician_id.map(TechnicianId),
            service_type_id: self.service_type_id.map(ServiceTypeId),
            title: self.title,
            description: self.description,
            status: self.status.parse()?,
            priority: self.priority.parse()?,
            scheduled_date: self.scheduled_date,
            estimated_duration_minutes: self.estimated_duration_minutes.max(0) as u32,
            service_address: self.service_address,
            service_location: super::company::point_from(self.service_lat, self.service_lon),
            technician_notes: self.technician_notes,
            work_performed: self.work_performed,
            materials_used: self.materials_used,
            estimated_price: self.estimated_price,
            final_price: self.final_price,
            created_at: self.created_at,
            assigned_at: self.assigned_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: Uuid,
    order_id: Uuid,
    technician_id: Uuid,
    category: String,
    description: String,
    amount: Decimal,
    created_at: DateTime<Utc>,
}

impl ExpenseRow {
    fn try_into_expense(self) -> Result<Expense> {
        Ok(Expense {
            id: ExpenseId(self.id),
            order_id: OrderId(self.order_id),
            technician_id: TechnicianId(self.technician_id),
            category: self.category.parse()?,
            description: self.description,
            amount: self.amount,
            created_at: self.created_at,
        })
    }
}
