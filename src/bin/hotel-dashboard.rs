use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hotel_dashboard::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_STORE: &str = ".hotel-dashboard-session.json";

#[derive(Parser, Debug)]
#[command(name = "hotel-dashboard", version)]
#[command(about = "Hotel management dashboard from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session file. Falls back to HOTEL_DASHBOARD_STORE, then ./.hotel-dashboard-session.json
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Catalog JSON file. The bundled sample data is used when omitted.
    #[arg(long, global = true)]
    data: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in with it
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// Show what opening a page does for the current session
    Open { path: String },
    /// Print the rows of a list view as JSON lines
    List {
        /// admin-hotels, admin-rooms, admin-bookings, admin-users, rooms or bookings
        view: String,
        #[arg(long)]
        search: Option<String>,
        /// Sort key, optionally with a direction suffix such as price-desc
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Select a multi-select value, category=value
        #[arg(long = "select")]
        select: Vec<String>,
        /// Restrict a range category, category=min..max
        #[arg(long = "range")]
        range: Vec<String>,
        /// Restrict a date category, category=YYYY-MM-DD..YYYY-MM-DD (either side may be empty)
        #[arg(long = "dates")]
        dates: Vec<String>,
        /// Require a minimum, category=value
        #[arg(long = "at-least")]
        at_least: Vec<String>,
    },
    /// Print the values a multi-select filter can take
    Options { view: String, category: String },
    /// Book a room for the signed-in user
    Book {
        room_id: u64,
        check_in: NaiveDate,
        check_out: NaiveDate,
        #[arg(long, default_value = "1")]
        guests: u32,
        #[arg(long, default_value = "Credit Card")]
        payment_method: String,
        #[arg(long, default_value = "")]
        special_requests: String,
    },
    /// Cancel a booking
    Cancel { id: u64 },
}

fn split_pair<'a>(text: &'a str, separator: &str, what: &str) -> anyhow::Result<(&'a str, &'a str)> {
    text.split_once(separator)
        .map(|(left, right)| (left.trim(), right.trim()))
        .ok_or_else(|| anyhow!("expected {} in {:?}", what, text))
}

fn build_query(
    dashboard: &Dashboard,
    view: View,
    command: &Commands,
) -> anyhow::Result<QueryState> {
    let mut state = dashboard.default_state(view);
    let Commands::List {
        search,
        sort,
        desc,
        select,
        range,
        dates,
        at_least,
        ..
    } = command
    else {
        return Ok(state);
    };

    if let Some(term) = search {
        state.search(term);
    }
    for pair in select {
        let (category, value) = split_pair(pair, "=", "category=value")?;
        state.select(category, value)?;
    }
    for pair in range {
        let (category, bounds) = split_pair(pair, "=", "category=min..max")?;
        let (min, max) = split_pair(bounds, "..", "min..max")?;
        let min: f64 = min.parse().with_context(|| format!("invalid minimum {:?}", min))?;
        let max: f64 = max.parse().with_context(|| format!("invalid maximum {:?}", max))?;
        state.set_range(category, min, max)?;
    }
    for pair in dates {
        let (category, bounds) = split_pair(pair, "=", "category=start..end")?;
        let (start, end) = split_pair(bounds, "..", "start..end")?;
        state.set_dates(category, start, end)?;
    }
    for pair in at_least {
        let (category, value) = split_pair(pair, "=", "category=value")?;
        let value: f64 = value.parse().with_context(|| format!("invalid minimum {:?}", value))?;
        state.set_at_least(category, Some(value))?;
    }
    if let Some(key) = sort {
        state.set_sort(SortSpec::parse(key));
    }
    if *desc {
        state.sort.order = SortOrder::Descending;
    }
    Ok(state)
}

async fn save_catalog(dashboard: &Dashboard, data: &Option<PathBuf>) -> anyhow::Result<()> {
    match data {
        Some(path) => {
            dashboard
                .catalog()
                .save(path)
                .await
                .with_context(|| format!("Failed to save catalog to {}", path.display()))?;
        }
        None => tracing::warn!("no --data file given; the change is not saved"),
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut options = DashboardOptions::from_env()?;
    if let Some(store) = cli.store.clone() {
        options = options.with_store_path(store);
    } else if options.store_path.is_none() {
        options = options.with_store_path(DEFAULT_STORE);
    }

    let catalog = match &cli.data {
        Some(path) => Catalog::load(path)
            .await
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => Catalog::sample()?,
    };

    let dashboard = Dashboard::new(&options, catalog)?;
    dashboard.restore().await;

    match &cli.command {
        Commands::Login { email, password } => {
            let identity = dashboard.login(email, password).await?;
            println!("Signed in as {} ({})", identity.username, identity.role);
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let identity = dashboard.register(username, email, password).await?;
            println!("Registered and signed in as {} ({})", identity.username, identity.role);
        }
        Commands::Logout => {
            dashboard.logout().await?;
            println!("Signed out");
        }
        Commands::Whoami => match dashboard.session().identity {
            Some(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
            None => println!("Not signed in"),
        },
        Commands::Open { path } => match dashboard.navigate(path) {
            GuardDecision::Render => println!("render {}", path),
            GuardDecision::Redirect(target) => println!("redirect {}", target),
            GuardDecision::Pending => println!("pending"),
        },
        Commands::List { view, .. } => {
            let view: View = view.parse()?;
            let state = build_query(&dashboard, view, &cli.command)?;
            let rows = dashboard.list_json(view, &state)?;
            if rows.is_empty() {
                tracing::info!(view = %view, "no matching rows");
            }
            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        Commands::Options { view, category } => {
            let view: View = view.parse()?;
            for option in dashboard.filter_options(view, category)? {
                println!("{}", option);
            }
        }
        Commands::Book {
            room_id,
            check_in,
            check_out,
            guests,
            payment_method,
            special_requests,
        } => {
            let request = BookingRequest::new(*room_id, *check_in, *check_out)
                .with_guests(*guests)
                .with_payment_method(payment_method)
                .with_special_requests(special_requests);
            let booking = dashboard.create_booking(&request)?;
            println!("{}", serde_json::to_string_pretty(&booking)?);
            save_catalog(&dashboard, &cli.data).await?;
        }
        Commands::Cancel { id } => {
            let booking = dashboard.cancel_booking(*id)?;
            println!("{}", serde_json::to_string_pretty(&booking)?);
            save_catalog(&dashboard, &cli.data).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}
