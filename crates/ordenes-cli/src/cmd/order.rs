use crate::output::{or_dash, print_json, print_table, timestamp};
use chrono::Utc;
use clap::Subcommand;
use ordenes_core::engine::TransitionRequest;
use ordenes_core::order::{NewOrder, Order};
use ordenes_core::report::OrderSummary;
use ordenes_core::types::{GlobalState, PartialState, Priority};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum OrderSubcommand {
    /// Create a new order
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        creator: String,
        /// LOW, MEDIUM, HIGH or CRITICAL
        #[arg(long)]
        priority: Option<String>,
        /// Area id to route the order to (repeatable)
        #[arg(long = "area")]
        areas: Vec<u64>,
        #[arg(long)]
        assignee: Option<String>,
    },

    /// List orders, most recently updated first
    List {
        /// Only orders in this global state
        #[arg(long)]
        estado: Option<String>,
    },

    /// Show one order with its area assignments
    Show { id: u64 },

    /// Show an order's history (newest first)
    History {
        id: u64,
        /// Oldest first
        #[arg(long)]
        asc: bool,
    },

    /// Route an order to more areas
    Assign {
        id: u64,
        /// Area id (repeatable)
        #[arg(long = "area", required = true)]
        areas: Vec<u64>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        actor: Option<String>,
    },

    /// Remove an area assignment from an order
    Unassign {
        id: u64,
        area: u64,
        #[arg(long)]
        actor: Option<String>,
    },

    /// Move one area of an order to a new state
    Transition {
        id: u64,
        area: u64,
        /// Target state, e.g. IN_PROGRESS, PAUSED, COMPLETED
        state: String,
        /// Required when closing an area
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        actor: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: OrderSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        OrderSubcommand::Create {
            title,
            description,
            creator,
            priority,
            areas,
            assignee,
        } => {
            let priority = match priority {
                Some(p) => p.parse::<Priority>()?,
                None => Priority::default(),
            };
            let new = NewOrder {
                title,
                description,
                creator,
                priority,
                area_ids: areas,
                assignee,
            };
            create(root, new, json)
        }
        OrderSubcommand::List { estado } => list(root, estado.as_deref(), json),
        OrderSubcommand::Show { id } => show(root, id, json),
        OrderSubcommand::History { id, asc } => history(root, id, asc, json),
        OrderSubcommand::Assign {
            id,
            areas,
            assignee,
            actor,
        } => assign(root, id, &areas, assignee.as_deref(), actor.as_deref(), json),
        OrderSubcommand::Unassign { id, area, actor } => {
            unassign(root, id, area, actor.as_deref(), json)
        }
        OrderSubcommand::Transition {
            id,
            area,
            state,
            notes,
            actor,
        } => {
            let target: PartialState = state.parse()?;
            let req = TransitionRequest {
                order_id: id,
                area_id: area,
                target,
                notes,
                actor,
            };
            transition(root, &req, json)
        }
    }
}

// ---------------------------------------------------------------------------
// create / list / show
// ---------------------------------------------------------------------------

fn create(root: &Path, new: NewOrder, json: bool) -> anyhow::Result<()> {
    let engine = super::open_engine(root)?;
    let order = engine.create_order(new, Utc::now())?;
    if json {
        return print_json(&order);
    }
    println!(
        "Created order {} '{}' [{}]",
        order.id, order.title, order.global_state
    );
    Ok(())
}

fn list(root: &Path, estado: Option<&str>, json: bool) -> anyhow::Result<()> {
    let filter = estado.map(str::parse::<GlobalState>).transpose()?;
    let engine = super::open_engine(root)?;
    let now = Utc::now();
    let summaries: Vec<OrderSummary> = engine
        .store()
        .list_orders(filter)?
        .iter()
        .map(|o| OrderSummary::from_order(o, now))
        .collect();

    if json {
        return print_json(&summaries);
    }
    if summaries.is_empty() {
        println!("No orders.");
        return Ok(());
    }
    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.titulo.clone(),
                s.estado_global.to_string(),
                s.prioridad.to_string(),
                format!("{}/{}", s.areas_completadas, s.num_areas),
                s.total_segundos.to_string(),
                timestamp(s.fecha_actualizacion),
            ]
        })
        .collect();
    print_table(
        &["ID", "TITLE", "STATE", "PRIORITY", "DONE", "SECONDS", "UPDATED"],
        rows,
    );
    Ok(())
}

fn show(root: &Path, id: u64, json: bool) -> anyhow::Result<()> {
    let engine = super::open_engine(root)?;
    let order = engine.store().get_order(id)?;
    if json {
        return print_json(&order);
    }
    print_order(&order);
    Ok(())
}

fn print_order(order: &Order) {
    let now = Utc::now();
    println!("Order {}: {}", order.id, order.title);
    println!("  State:    {}", order.global_state);
    println!("  Priority: {}", order.priority);
    println!("  Creator:  {}", order.creator);
    println!("  Created:  {}", timestamp(order.created_at));
    println!("  Updated:  {}", timestamp(order.updated_at));
    println!("  {}", order.description);
    if order.areas.is_empty() {
        println!("\nNo areas assigned.");
        return;
    }
    println!();
    let rows = order
        .areas
        .iter()
        .map(|a| {
            vec![
                a.area_id.to_string(),
                a.label(),
                a.state.to_string(),
                a.live_secs(now).to_string(),
                or_dash(a.assignee.as_deref()),
                or_dash(a.notes.as_deref()),
            ]
        })
        .collect();
    print_table(
        &["AREA", "NAME", "STATE", "SECONDS", "ASSIGNEE", "NOTES"],
        rows,
    );
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

fn history(root: &Path, id: u64, asc: bool, json: bool) -> anyhow::Result<()> {
    let engine = super::open_engine(root)?;
    let mut events = engine.store().history(id)?;
    if !asc {
        events.reverse();
    }
    if json {
        return print_json(&events);
    }
    let rows = events
        .iter()
        .map(|e| {
            vec![
                e.seq.to_string(),
                timestamp(e.timestamp),
                e.kind.to_string(),
                or_dash(e.actor.as_deref()),
                e.detail.clone(),
            ]
        })
        .collect();
    print_table(&["SEQ", "TIME", "EVENT", "ACTOR", "DETAIL"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// assign / unassign / transition
// ---------------------------------------------------------------------------

fn assign(
    root: &Path,
    id: u64,
    areas: &[u64],
    assignee: Option<&str>,
    actor: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let engine = super::open_engine(root)?;
    let order = engine.assign_areas(id, areas, assignee, actor, Utc::now())?;
    if json {
        return print_json(&order);
    }
    println!(
        "Order {} now has {} area(s) [{}]",
        order.id,
        order.areas.len(),
        order.global_state
    );
    Ok(())
}

fn unassign(
    root: &Path,
    id: u64,
    area: u64,
    actor: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let engine = super::open_engine(root)?;
    let order = engine.remove_area(id, area, actor, Utc::now())?;
    if json {
        return print_json(&order);
    }
    println!(
        "Removed area {area} from order {} [{}]",
        order.id, order.global_state
    );
    Ok(())
}

fn transition(root: &Path, req: &TransitionRequest, json: bool) -> anyhow::Result<()> {
    let engine = super::open_engine(root)?;
    let area = engine.apply_transition(req, Utc::now())?;
    if json {
        return print_json(&area);
    }
    let order = engine.store().get_order(req.order_id)?;
    println!(
        "Area {} of order {} is now {} (order: {})",
        area.label(),
        req.order_id,
        area.state,
        order.global_state
    );
    Ok(())
}
