//! dispatchlight CLI — operator interface to the dispatch core.

use clap::{Parser, Subcommand};
use dispatchlight::auth::AuthContext;
use dispatchlight::config::Config;
use dispatchlight::db::Db;
use dispatchlight::db::company::NewCompany;
use dispatchlight::dispatch::ScoringPolicy;
use dispatchlight::geo::Point;
use dispatchlight::model::*;
use dispatchlight::telemetry::{TelemetryConfig, init_telemetry};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dispatchlight", about = "Field-service dispatch core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Company (tenant) operations
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },
    /// Technician operations
    Tech {
        /// Company ID the context acts for
        #[arg(long)]
        company: Uuid,
        #[command(subcommand)]
        action: TechAction,
    },
    /// Work order operations
    Order {
        /// Company ID the context acts for
        #[arg(long)]
        company: Uuid,
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Show the company dashboard
    Dashboard {
        /// Company ID
        #[arg(long)]
        company: Uuid,
        /// Emit JSON instead of the table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CompanyAction {
    /// Register a new company
    Create {
        name: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        owner_email: String,
    },
}

#[derive(Subcommand)]
enum TechAction {
    /// Register a technician
    Add {
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        vehicle_plate: Option<String>,
    },
    /// Report a technician's position
    Locate { id: Uuid, lat: f64, lon: f64 },
    /// Show derived status and workload
    Status { id: Uuid },
    /// Show windowed performance statistics
    Stats {
        id: Uuid,
        /// Window length in days
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// List the company's technicians
    List,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Create a work order
    Create {
        /// Customer ID
        #[arg(long)]
        customer: Uuid,
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        address: String,
        /// low | normal | high | urgent
        #[arg(long, default_value = "normal")]
        priority: String,
        #[arg(long)]
        estimated_price: Option<Decimal>,
    },
    /// List work orders
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Filter by priority
        #[arg(long)]
        priority: Option<String>,
        /// Maximum orders to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show a work order
    Show {
        /// Order ID (full UUID or prefix)
        id: String,
    },
    /// Assign a pending order to a technician
    Assign { id: Uuid, technician: Uuid },
    /// Return an assigned order to the pending pool
    Unassign { id: Uuid },
    /// Move an order through its lifecycle
    Transition {
        id: Uuid,
        /// Current status
        from: String,
        /// Target status
        to: String,
    },
    /// Record work results on an on-site or completed order
    Record {
        id: Uuid,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        work_performed: Option<String>,
        #[arg(long)]
        materials: Option<String>,
        #[arg(long)]
        final_price: Option<Decimal>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "dispatchlight".to_string(),
    })?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.migrate().await?;

    match cli.command {
        Command::Company { action } => cmd_company(&db, action).await,
        Command::Tech { company, action } => {
            let ctx = AuthContext::owner(CompanyId(company));
            cmd_tech(&db, &ctx, action).await
        }
        Command::Order { company, action } => {
            let ctx = AuthContext::owner(CompanyId(company));
            cmd_order(&db, &ctx, action).await
        }
        Command::Dashboard { company, json } => {
            let ctx = AuthContext::owner(CompanyId(company));
            cmd_dashboard(&db, &ctx, json).await
        }
    }
}

async fn cmd_company(db: &Db, action: CompanyAction) -> anyhow::Result<()> {
    match action {
        CompanyAction::Create {
            name,
            address,
            phone,
            email,
            owner_email,
        } => {
            let company = db
                .create_company(NewCompany {
                    name,
                    address,
                    phone,
                    email,
                    owner_email,
                })
                .await?;
            println!("Created company {} ({})", company.name, company.id.0);
        }
    }
    Ok(())
}

async fn cmd_tech(db: &Db, ctx: &AuthContext, action: TechAction) -> anyhow::Result<()> {
    match action {
        TechAction::Add {
            name,
            email,
            phone,
            vehicle_plate,
        } => {
            let tech = db
                .create_technician(ctx, &name, &email, &phone, vehicle_plate.as_deref())
                .await?;
            println!("Created technician {} ({})", tech.name, tech.id.0);
        }
        TechAction::Locate { id, lat, lon } => {
            db.update_location(ctx, TechnicianId(id), Point::new(lat, lon))
                .await?;
            println!("Location recorded.");
        }
        TechAction::Status { id } => {
            let id = TechnicianId(id);
            let status = db.technician_status(ctx, id).await?;
            let score = db.workload_score(ctx, id).await?;
            println!("Status:    {status}");
            println!("Workload:  {score}/100");
        }
        TechAction::Stats { id, days } => {
            let policy = ScoringPolicy {
                window_days: days,
                ..ScoringPolicy::default()
            };
            let stats = db.performance_stats(ctx, TechnicianId(id), &policy).await?;
            println!("Orders ({days}d):   {}", stats.total_orders);
            println!("Completed:        {}", stats.completed_orders);
            println!("Cancelled:        {}", stats.cancelled_orders);
            println!("Completion rate:  {:.1}%", stats.completion_rate);
            match stats.avg_completion_hours {
                Some(hours) => println!("Avg completion:   {hours:.1}h"),
                None => println!("Avg completion:   -"),
            }
            println!("Efficiency:       {:.1}", stats.efficiency_score);
        }
        TechAction::List => {
            let techs = db.list_technicians(ctx).await?;
            if techs.is_empty() {
                println!("No technicians.");
                return Ok(());
            }
            let now = chrono::Utc::now();
            println!("{:<8}  {:<20}  {:<7}  ONLINE", "ID", "NAME", "ACTIVE");
            println!("{}", "-".repeat(50));
            for tech in &techs {
                println!(
                    "{:<8}  {:<20}  {:<7}  {}",
                    tech.id,
                    tech.name,
                    tech.is_active,
                    tech.is_online(now)
                );
            }
        }
    }
    Ok(())
}

async fn cmd_order(db: &Db, ctx: &AuthContext, action: OrderAction) -> anyhow::Result<()> {
    match action {
        OrderAction::Create {
            customer,
            title,
            description,
            address,
            priority,
            estimated_price,
        } => {
            let priority: Priority = priority
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid priority: {priority}"))?;
            let mut new = NewWorkOrder::new(ctx.company_id, CustomerId(customer), title, address)
                .description(description)
                .priority(priority);
            if let Some(price) = estimated_price {
                new = new.estimated_price(price);
            }
            let order = db.create_order(ctx, new).await?;
            println!("Created: {} ({})", order.order_number, order.id.0);
        }
        OrderAction::List {
            status,
            priority,
            limit,
        } => {
            let status = status
                .map(|s| s.parse::<OrderStatus>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            let priority = priority
                .map(|p| p.parse::<Priority>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            let orders = db.list_orders(ctx, status, priority, limit).await?;
            if orders.is_empty() {
                println!("No work orders found.");
                return Ok(());
            }

            println!(
                "{:<12}  {:<10}  {:<8}  {:<25}  CREATED",
                "NUMBER", "STATUS", "PRI", "TITLE"
            );
            println!("{}", "-".repeat(80));
            for order in &orders {
                let title = truncate_chars(&order.title, 25);
                println!(
                    "{:<12}  {:<10}  {:<8}  {:<25}  {}",
                    order.order_number,
                    order.status,
                    order.priority,
                    title,
                    order.created_at.format("%Y-%m-%d %H:%M")
                );
            }
            println!("\n{} order(s)", orders.len());
        }
        OrderAction::Show { id } => {
            let order = find_order(db, ctx, &id).await?;
            print_order(&order);
        }
        OrderAction::Assign { id, technician } => {
            let order = db
                .assign_order(
                    ctx,
                    OrderId(id),
                    TechnicianId(technician),
                    &ScoringPolicy::default(),
                )
                .await?;
            println!("Assigned {} (status: {})", order.order_number, order.status);
        }
        OrderAction::Unassign { id } => {
            let order = db.unassign_order(ctx, OrderId(id)).await?;
            println!(
                "Unassigned {} (status: {})",
                order.order_number, order.status
            );
        }
        OrderAction::Transition { id, from, to } => {
            let from: OrderStatus = from.parse().map_err(|e| anyhow::anyhow!("{e}"))?;
            let to: OrderStatus = to.parse().map_err(|e| anyhow::anyhow!("{e}"))?;
            let order = db.transition_order(ctx, OrderId(id), from, to).await?;
            println!(
                "{} is now {}",
                order.order_number, order.status
            );
        }
        OrderAction::Record {
            id,
            notes,
            work_performed,
            materials,
            final_price,
        } => {
            let order = db
                .record_work_results(
                    ctx,
                    OrderId(id),
                    notes.as_deref(),
                    work_performed.as_deref(),
                    materials.as_deref(),
                    final_price,
                )
                .await?;
            println!("Recorded results on {}", order.order_number);
        }
    }
    Ok(())
}

async fn cmd_dashboard(db: &Db, ctx: &AuthContext, json: bool) -> anyhow::Result<()> {
    let summary = db.dashboard(ctx).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("Pending orders:      {}", summary.pending_orders);
    println!("Created today:       {}", summary.today_orders);
    println!("Total orders:        {}", summary.total_orders);
    println!("Completed orders:    {}", summary.completed_orders);
    println!("Active technicians:  {}", summary.active_technicians);
    println!("Completion rate:     {:.1}%", summary.completion_rate);
    match summary.avg_order_value {
        Some(avg) => println!("Avg order value:     {avg}"),
        None => println!("Avg order value:     -"),
    }
    println!("Last 7 days:         {:?}", summary.orders_last_7_days);
    Ok(())
}

/// Truncate to at most `max` characters. Slicing by byte offset would panic
/// on a multibyte character straddling the cut.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Support prefix matching — find the order whose ID starts with the given string.
async fn find_order(db: &Db, ctx: &AuthContext, id_str: &str) -> anyhow::Result<WorkOrder> {
    if id_str.len() == 36 {
        let uuid = Uuid::parse_str(id_str)?;
        return Ok(db.get_order(ctx, OrderId(uuid)).await?);
    }

    let orders = db.list_orders(ctx, None, None, 100).await?;
    let matches: Vec<_> = orders
        .iter()
        .filter(|o| o.id.0.to_string().starts_with(id_str) || o.order_number.starts_with(id_str))
        .collect();
    match matches.len() {
        0 => anyhow::bail!("no work order matching '{id_str}'"),
        1 => Ok(matches[0].clone()),
        n => anyhow::bail!("{n} work orders match '{id_str}' — be more specific"),
    }
}

fn print_order(order: &WorkOrder) {
    println!("Number:     {}", order.order_number);
    println!("ID:         {}", order.id.0);
    println!("Title:      {}", order.title);
    println!("Status:     {}", order.status);
    println!("Priority:   {}", order.priority);
    println!("Customer:   {}", order.customer_id);
    println!(
        "Technician: {}",
        order
            .technician_id
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Address:    {}", order.service_address);
    if let Some(point) = order.service_location {
        println!("Location:   {:.5}, {:.5}", point.lat, point.lon);
    }
    println!("Created:    {}", order.created_at);
    if let Some(at) = order.assigned_at {
        println!("Assigned:   {at}");
    }
    if let Some(at) = order.started_at {
        println!("On site:    {at}");
    }
    if let Some(at) = order.completed_at {
        println!("Completed:  {at}");
    }
    if let Some(hours) = order.completion_hours() {
        println!("Duration:   {hours:.1}h");
    }
    if let Some(ref price) = order.final_price {
        println!("Final:      {price}");
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn truncation_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("short", 25), "short");

        // 13 chars but 26 bytes: byte 25 is mid-character, so a byte slice
        // at 25 would panic. Under the limit in chars, keep it whole.
        let accented = "è".repeat(13);
        assert_eq!(truncate_chars(&accented, 25), accented);

        let long = "è".repeat(30);
        assert_eq!(truncate_chars(&long, 25).chars().count(), 25);

        assert_eq!(
            truncate_chars("Manutenzione straordinarietà caldaia", 25),
            "Manutenzione straordinari"
        );
    }
}
