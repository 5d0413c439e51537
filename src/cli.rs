//! CLI definition and dispatch.
//!
//! Status and errors go to stderr, report data to stdout.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::adapters::clock_adapter::SystemClock;
use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_adapter::MemoryAdapter;
use crate::domain::alert::{AlertBook, AlertDraft, AlertPatch, AlertStatus, AlertType};
use crate::domain::config_validation::{validate_marketing_config, validate_storage_config};
use crate::domain::contract::{Contract, ContractDraft, ContractFilter, ContractPatch, DeliveryWindow};
use crate::domain::crop::{ContractStatus, ContractType, Crop};
use crate::domain::elevator::{elevator_board, elevators_from_config};
use crate::domain::error::GrainError;
use crate::domain::exposure::{
    average_price_by_type, compute_exposure, position_summary, rank_contracts, ExposureSummary,
};
use crate::domain::ledger::ContractLedger;
use crate::domain::marketing_plan::{milestones_from_config, plan_progress, target_price};
use crate::domain::settings::MarketingSettings;
use crate::domain::snapshot::{parse_since_days, SnapshotEntry, SnapshotStore};
use crate::ports::clock_port::ClockPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::StoragePort;

#[derive(Parser, Debug)]
#[command(name = "grainledger", about = "Grain forward-contract position and pricing ledger")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Use a throwaway in-memory store instead of SQLite
    #[arg(long, global = true)]
    pub memory: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage forward contracts
    #[command(subcommand)]
    Contract(ContractCommand),
    /// Record and query market snapshots
    #[command(subcommand)]
    Market(MarketCommand),
    /// Manage price and basis alerts
    #[command(subcommand)]
    Alert(AlertCommand),
    /// Position and marketing reports
    #[command(subcommand)]
    Report(ReportCommand),
    /// Check the configuration file
    Validate,
}

#[derive(Args, Debug, Default)]
pub struct ContractFields {
    #[arg(long)]
    pub crop: Option<Crop>,
    #[arg(long = "type")]
    pub contract_type: Option<ContractType>,
    #[arg(long)]
    pub bushels: Option<f64>,
    /// Futures price, $/bu
    #[arg(long)]
    pub futures_price: Option<f64>,
    /// Basis, cents/bu
    #[arg(long, allow_hyphen_values = true)]
    pub basis: Option<f64>,
    /// Futures month label, e.g. Dec26
    #[arg(long)]
    pub futures_month: Option<String>,
    #[arg(long)]
    pub elevator: Option<String>,
    #[arg(long)]
    pub delivery_start: Option<NaiveDate>,
    #[arg(long)]
    pub delivery_end: Option<NaiveDate>,
    #[arg(long)]
    pub status: Option<ContractStatus>,
    #[arg(long)]
    pub crop_year: Option<i32>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearField {
    Basis,
    FuturesMonth,
    DeliveryStart,
    DeliveryEnd,
    CropYear,
    Notes,
}

#[derive(Args, Debug, Default)]
pub struct ListFilter {
    #[arg(long)]
    pub crop: Option<Crop>,
    #[arg(long)]
    pub crop_year: Option<i32>,
    #[arg(long = "type")]
    pub contract_type: Option<ContractType>,
    #[arg(long)]
    pub status: Option<ContractStatus>,
}

#[derive(Subcommand, Debug)]
pub enum ContractCommand {
    /// Record a new contract
    Add(ContractFields),
    /// Change fields of an existing contract
    Update {
        id: String,
        #[command(flatten)]
        fields: ContractFields,
        /// Clear a nullable field
        #[arg(long, value_enum)]
        clear: Vec<ClearField>,
    },
    /// Mark a contract delivered
    Deliver { id: String },
    Delete { id: String },
    Show { id: String },
    List(ListFilter),
    /// Contracts whose explicit crop year disagrees with their futures month
    Audit,
    /// Write every contract to a CSV file
    Export { path: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum MarketCommand {
    /// Record one market observation
    Record {
        #[arg(long)]
        crop: Crop,
        #[arg(long)]
        futures_month: String,
        #[arg(long)]
        futures_price: f64,
        #[arg(long)]
        cash_price: f64,
        /// Basis in cents/bu; derived from the prices when omitted
        #[arg(long, allow_hyphen_values = true)]
        basis: Option<f64>,
        #[arg(long)]
        implied_vol: Option<f64>,
    },
    /// Latest snapshot per crop
    Latest {
        #[arg(long)]
        crop: Option<Crop>,
    },
    /// Snapshots from the last N days
    History {
        #[arg(long)]
        crop: Crop,
        #[arg(long, default_value = "30", allow_hyphen_values = true)]
        days: String,
        /// One closing row per day
        #[arg(long)]
        daily: bool,
    },
    /// Record every row of a CSV file under one timestamp
    Import { path: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum AlertCommand {
    Add {
        #[arg(long)]
        crop: Crop,
        #[arg(long = "type")]
        alert_type: AlertType,
        /// $/bu for price alerts, cents/bu for basis alerts
        #[arg(long, allow_hyphen_values = true)]
        target: f64,
        #[arg(long)]
        futures_month: Option<String>,
    },
    List {
        /// Only active alerts
        #[arg(long)]
        active: bool,
    },
    Update {
        id: String,
        #[arg(long, allow_hyphen_values = true)]
        target: Option<f64>,
        #[arg(long)]
        futures_month: Option<String>,
        #[arg(long, conflicts_with = "futures_month")]
        clear_month: bool,
        #[arg(long)]
        active: Option<bool>,
        #[arg(long)]
        notified: Option<bool>,
    },
    /// Deactivate an alert
    Dismiss { id: String },
    Delete { id: String },
    /// Evaluate active alerts against the latest market
    Check {
        #[arg(long)]
        crop: Option<Crop>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Marketing exposure per crop
    Exposure {
        #[arg(long)]
        crop: Option<Crop>,
        #[arg(long)]
        crop_year: Option<i32>,
    },
    /// Open positions grouped by crop and crop year
    Positions,
    /// Average price by contract type
    Types,
    /// Best and worst priced open contracts
    Rank {
        #[arg(long)]
        top: Option<usize>,
    },
    /// Contracts delivering in a month (default: this month)
    Deliveries {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Marketing plan progress
    Plan {
        #[arg(long)]
        crop: Crop,
        #[arg(long)]
        crop_year: Option<i32>,
    },
    /// Elevator basis board
    Elevators {
        #[arg(long)]
        crop: Crop,
    },
}

/// Services wired to one store, config and clock.
pub struct Session<'a> {
    pub config: &'a dyn ConfigPort,
    pub settings: MarketingSettings,
    pub clock: &'a dyn ClockPort,
    pub ledger: ContractLedger<'a>,
    pub market: SnapshotStore<'a>,
    pub alerts: AlertBook<'a>,
}

impl<'a> Session<'a> {
    pub fn new<S: StoragePort>(
        store: &'a S,
        config: &'a dyn ConfigPort,
        clock: &'a dyn ClockPort,
    ) -> Result<Self, GrainError> {
        validate_marketing_config(config)?;
        let settings = MarketingSettings::from_config(config)?;
        Ok(Session {
            config,
            ledger: ContractLedger::new(store, clock, settings.default_crop_year),
            market: SnapshotStore::new(store, clock),
            alerts: AlertBook::new(store, clock),
            settings,
            clock,
        })
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let clock = SystemClock;

    let result = if cli.memory {
        let store = MemoryAdapter::new();
        Session::new(&store, &config, &clock).and_then(|s| execute(&s, cli.command))
    } else {
        run_with_sqlite(&config, &clock, cli.command)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

#[cfg(feature = "sqlite")]
fn run_with_sqlite(
    config: &FileConfigAdapter,
    clock: &SystemClock,
    command: Command,
) -> Result<(), GrainError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    validate_storage_config(config)?;
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    let session = Session::new(&store, config, clock)?;
    execute(&session, command)
}

#[cfg(not(feature = "sqlite"))]
fn run_with_sqlite(
    config: &FileConfigAdapter,
    _clock: &SystemClock,
    _command: Command,
) -> Result<(), GrainError> {
    validate_storage_config(config)?;
    Err(GrainError::ConfigInvalid {
        section: "sqlite".into(),
        key: "path".into(),
        reason: "sqlite feature is disabled; run with --memory".into(),
    })
}

/// Load the INI file, or an empty configuration when none is given.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, ExitCode> {
    let loaded = match path {
        Some(p) => FileConfigAdapter::from_file(p).map_err(|e| GrainError::ConfigParse {
            file: p.display().to_string(),
            reason: e.to_string(),
        }),
        None => FileConfigAdapter::from_string("").map_err(|reason| GrainError::ConfigParse {
            file: "<empty>".into(),
            reason,
        }),
    };
    loaded.map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn execute(session: &Session<'_>, command: Command) -> Result<(), GrainError> {
    match command {
        Command::Contract(c) => run_contract(session, c),
        Command::Market(m) => run_market(session, m),
        Command::Alert(a) => run_alert(session, a),
        Command::Report(r) => run_report(session, r),
        Command::Validate => {
            validate_storage_config(session.config)?;
            let elevators = elevators_from_config(session.config)?;
            for crop in Crop::ALL {
                milestones_from_config(session.config, crop, session.settings.default_crop_year)?;
            }
            eprintln!("Configuration OK ({} elevators)", elevators.len());
            Ok(())
        }
    }
}

pub fn build_draft(fields: ContractFields) -> ContractDraft {
    ContractDraft {
        crop: fields.crop,
        contract_type: fields.contract_type,
        bushels: fields.bushels.unwrap_or(0.0),
        futures_price: fields.futures_price.unwrap_or(0.0),
        basis: fields.basis,
        futures_month: fields.futures_month,
        elevator: fields.elevator.unwrap_or_default(),
        delivery: DeliveryWindow {
            start: fields.delivery_start,
            end: fields.delivery_end,
        },
        status: fields.status,
        crop_year: fields.crop_year,
        notes: fields.notes,
    }
}

/// Supplied fields are set; cleared fields become null. A field both set
/// and cleared ends up cleared.
pub fn build_patch(fields: ContractFields, clear: &[ClearField]) -> ContractPatch {
    let cleared = |f: ClearField| clear.contains(&f);
    ContractPatch {
        crop: fields.crop,
        contract_type: fields.contract_type,
        bushels: fields.bushels,
        futures_price: fields.futures_price,
        basis: if cleared(ClearField::Basis) {
            Some(None)
        } else {
            fields.basis.map(Some)
        },
        futures_month: if cleared(ClearField::FuturesMonth) {
            Some(None)
        } else {
            fields.futures_month.map(Some)
        },
        elevator: fields.elevator,
        delivery_start: if cleared(ClearField::DeliveryStart) {
            Some(None)
        } else {
            fields.delivery_start.map(Some)
        },
        delivery_end: if cleared(ClearField::DeliveryEnd) {
            Some(None)
        } else {
            fields.delivery_end.map(Some)
        },
        status: fields.status,
        crop_year: if cleared(ClearField::CropYear) {
            Some(None)
        } else {
            fields.crop_year.map(Some)
        },
        notes: if cleared(ClearField::Notes) {
            Some(None)
        } else {
            fields.notes.map(Some)
        },
    }
}

fn price(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

fn cents(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

fn dollars(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn print_contract_header() {
    println!(
        "{:<36}  {:<8}  {:<11}  {:>4}  {:<6}  {:>10}  {:>8}  {:>7}  {:>8}  {:<10}  {:<9}  {}",
        "id", "crop", "type", "year", "month", "bushels", "futures", "basis", "cash", "delivery", "status",
        "elevator"
    );
}

fn print_contract(c: &Contract, default_year: i32) {
    println!(
        "{:<36}  {:<8}  {:<11}  {:>4}  {:<6}  {:>10.0}  {:>8}  {:>7}  {:>8}  {:<10}  {:<9}  {}",
        c.id,
        c.crop,
        c.contract_type,
        c.effective_crop_year(default_year),
        c.futures_month.as_deref().unwrap_or("-"),
        c.bushels,
        price(Some(c.futures_price)),
        cents(c.basis),
        price(Some(c.cash_price())),
        c.delivery.end.map_or_else(|| "-".to_string(), |d| d.to_string()),
        c.status,
        c.elevator
    );
}

fn print_contracts(contracts: &[Contract], default_year: i32) {
    print_contract_header();
    for c in contracts {
        print_contract(c, default_year);
    }
}

fn run_contract(s: &Session<'_>, command: ContractCommand) -> Result<(), GrainError> {
    let year = s.ledger.default_crop_year();
    match command {
        ContractCommand::Add(fields) => {
            let c = s.ledger.create(build_draft(fields))?;
            eprintln!("Created contract {}", c.id);
            println!("{}", c.id);
        }
        ContractCommand::Update { id, fields, clear } => {
            let patch = build_patch(fields, &clear);
            if patch.is_empty() {
                return Err(GrainError::validation("update", "no fields to update"));
            }
            let c = s.ledger.update(&id, patch)?;
            eprintln!("Updated contract {}", c.id);
        }
        ContractCommand::Deliver { id } => {
            let c = s.ledger.mark_delivered(&id)?;
            eprintln!("Contract {} is {}", c.id, c.status);
        }
        ContractCommand::Delete { id } => {
            s.ledger.delete(&id)?;
            eprintln!("Deleted contract {id}");
        }
        ContractCommand::Show { id } => {
            let c = s.ledger.get(&id)?;
            print_contracts(std::slice::from_ref(&c), year);
            if let Some(notes) = &c.notes {
                println!("notes: {notes}");
            }
        }
        ContractCommand::List(f) => {
            let filter = ContractFilter {
                crop: f.crop,
                crop_year: f.crop_year,
                contract_type: f.contract_type,
                status: f.status,
            };
            print_contracts(&s.ledger.list(&filter)?, year);
        }
        ContractCommand::Audit => {
            let conflicts = s.ledger.crop_year_conflicts()?;
            if conflicts.is_empty() {
                eprintln!("No crop-year conflicts");
            }
            for c in conflicts {
                if let Some(conflict) = c.crop_year_conflict() {
                    println!(
                        "{}  {}  crop_year={}  futures_month={} ({})",
                        c.id,
                        c.crop,
                        conflict.explicit,
                        c.futures_month.as_deref().unwrap_or("-"),
                        conflict.derived
                    );
                }
            }
        }
        ContractCommand::Export { path } => {
            let contracts = s.ledger.list_all()?;
            csv_adapter::write_contract_file(&path, &contracts, year)?;
            eprintln!("Exported {} contracts to {}", contracts.len(), path.display());
        }
    }
    Ok(())
}

fn run_market(s: &Session<'_>, command: MarketCommand) -> Result<(), GrainError> {
    match command {
        MarketCommand::Record {
            crop,
            futures_month,
            futures_price,
            cash_price,
            basis,
            implied_vol,
        } => {
            let snap = s.market.record(SnapshotEntry {
                crop,
                futures_month,
                futures_price,
                cash_price,
                basis_cents: basis,
                implied_vol,
            })?;
            eprintln!("Recorded {} {} at {}", snap.crop, snap.futures_month, snap.snapshot_at);
        }
        MarketCommand::Latest { crop } => {
            let crops = crop.map_or_else(|| Crop::ALL.to_vec(), |c| vec![c]);
            println!(
                "{:<8}  {:<6}  {:>8}  {:>8}  {:>7}  {:>6}  {}",
                "crop", "month", "futures", "cash", "basis", "vol", "at"
            );
            for crop in crops {
                match s.market.latest(crop)? {
                    Some(snap) => println!(
                        "{:<8}  {:<6}  {:>8}  {:>8}  {:>7}  {:>6}  {}",
                        snap.crop,
                        snap.futures_month,
                        price(Some(snap.futures_price)),
                        price(Some(snap.cash_price)),
                        cents(Some(snap.basis)),
                        snap.implied_vol.map_or_else(|| "-".to_string(), |v| format!("{v:.3}")),
                        snap.snapshot_at.format("%Y-%m-%d %H:%M:%S")
                    ),
                    None => println!("{crop:<8}  no market data"),
                }
            }
        }
        MarketCommand::History { crop, days, daily } => {
            let days = parse_since_days(&days)?;
            if daily {
                println!("{:<10}  {:>8}  {:>8}  {:>7}", "date", "futures", "cash", "basis");
                for d in s.market.daily_series(crop, days)? {
                    println!(
                        "{:<10}  {:>8}  {:>8}  {:>7}",
                        d.date,
                        price(Some(d.futures_price)),
                        price(Some(d.cash_price)),
                        cents(Some(d.basis))
                    );
                }
            } else {
                println!("{:<19}  {:<6}  {:>8}  {:>8}  {:>7}", "at", "month", "futures", "cash", "basis");
                for snap in s.market.history(crop, days)? {
                    println!(
                        "{:<19}  {:<6}  {:>8}  {:>8}  {:>7}",
                        snap.snapshot_at.format("%Y-%m-%d %H:%M:%S"),
                        snap.futures_month,
                        price(Some(snap.futures_price)),
                        price(Some(snap.cash_price)),
                        cents(Some(snap.basis))
                    );
                }
            }
        }
        MarketCommand::Import { path } => {
            let entries = csv_adapter::read_snapshot_file(&path)?;
            debug!(rows = entries.len(), path = %path.display(), "importing snapshots");
            let recorded = s.market.record_all(entries)?;
            eprintln!("Imported {} snapshots from {}", recorded.len(), path.display());
        }
    }
    Ok(())
}

fn print_alert_status(st: &AlertStatus) {
    let state = match st.satisfied {
        Some(true) => "TRIGGERED",
        Some(false) => "waiting",
        None => "no data",
    };
    println!(
        "{:<36}  {:<8}  {:<11}  {:>8}  {:<6}  {:>8}  {}",
        st.alert.id,
        st.alert.crop,
        st.alert.alert_type,
        st.alert.target_value,
        st.alert.futures_month.as_deref().unwrap_or("-"),
        st.observed.map_or_else(|| "-".to_string(), |v| format!("{v:.4}")),
        state
    );
}

fn run_alert(s: &Session<'_>, command: AlertCommand) -> Result<(), GrainError> {
    match command {
        AlertCommand::Add {
            crop,
            alert_type,
            target,
            futures_month,
        } => {
            let alert = s.alerts.create(AlertDraft {
                crop,
                alert_type,
                target_value: target,
                futures_month,
            })?;
            eprintln!("Created alert {}", alert.id);
            println!("{}", alert.id);
        }
        AlertCommand::List { active } => {
            let alerts = if active {
                s.alerts.list_active()?
            } else {
                s.alerts.list()?
            };
            println!(
                "{:<36}  {:<8}  {:<11}  {:>8}  {:<6}  {:<6}  {}",
                "id", "crop", "type", "target", "month", "active", "notified"
            );
            for a in alerts {
                println!(
                    "{:<36}  {:<8}  {:<11}  {:>8}  {:<6}  {:<6}  {}",
                    a.id,
                    a.crop,
                    a.alert_type,
                    a.target_value,
                    a.futures_month.as_deref().unwrap_or("-"),
                    a.active,
                    a.notified
                );
            }
        }
        AlertCommand::Update {
            id,
            target,
            futures_month,
            clear_month,
            active,
            notified,
        } => {
            let patch = AlertPatch {
                target_value: target,
                futures_month: if clear_month {
                    Some(None)
                } else {
                    futures_month.map(Some)
                },
                active,
                notified,
            };
            let alert = s.alerts.update(&id, patch)?;
            eprintln!("Updated alert {}", alert.id);
        }
        AlertCommand::Dismiss { id } => {
            s.alerts.dismiss(&id)?;
            eprintln!("Dismissed alert {id}");
        }
        AlertCommand::Delete { id } => {
            s.alerts.delete(&id)?;
            eprintln!("Deleted alert {id}");
        }
        AlertCommand::Check { crop } => {
            let statuses = s.alerts.evaluate_all(crop, &s.market)?;
            let triggered = statuses.iter().filter(|st| st.satisfied == Some(true)).count();
            for st in &statuses {
                print_alert_status(st);
            }
            eprintln!("{triggered} of {} active alerts triggered", statuses.len());
        }
    }
    Ok(())
}

fn print_exposure(e: &ExposureSummary) {
    let year = e.crop_year.map_or_else(|| "all".to_string(), |y| y.to_string());
    println!("{} ({year})", e.crop);
    println!("  open contracts       {}", e.contract_count);
    println!("  contracted bushels   {:.0}", e.contracted_bushels);
    println!("  estimated production {:.0}", e.estimated_total_bushels);
    println!(
        "  percent sold         {}",
        e.percent_sold_display()
            .map_or_else(|| "-".to_string(), |p| format!("{p:.1}%"))
    );
    println!(
        "  status               {}",
        e.status.map_or_else(|| "-".to_string(), |s| s.to_string())
    );
    println!("  avg contract price   {}", price(e.weighted_average_price));
    println!("  contracted revenue   {}", dollars(Some(e.contracted_revenue)));
    println!("  uncontracted bushels {:.0}", e.uncontracted_bushels);
    println!("  market cash price    {}", price(e.market_cash_price));
    println!("  uncontracted value   {}", dollars(e.uncontracted_potential_revenue));
    println!("  total potential      {}", dollars(e.total_potential_revenue));
}

fn run_report(s: &Session<'_>, command: ReportCommand) -> Result<(), GrainError> {
    let year = s.settings.default_crop_year;
    match command {
        ReportCommand::Exposure { crop, crop_year } => {
            let contracts = s.ledger.list_all()?;
            let crops = crop.map_or_else(|| Crop::ALL.to_vec(), |c| vec![c]);
            for crop in crops {
                let latest = s.market.latest(crop)?;
                let summary =
                    compute_exposure(&contracts, crop, crop_year, latest.as_ref(), &s.settings);
                print_exposure(&summary);
            }
        }
        ReportCommand::Positions => {
            println!("{:<8}  {:>4}  {:>5}  {:>10}  {:>8}", "crop", "year", "count", "bushels", "avg");
            for row in position_summary(&s.ledger.list_all()?, year) {
                println!(
                    "{:<8}  {:>4}  {:>5}  {:>10.0}  {:>8}",
                    row.crop,
                    row.crop_year,
                    row.contract_count,
                    row.bushels,
                    price(row.average_price)
                );
            }
        }
        ReportCommand::Types => {
            println!("{:<8}  {:<11}  {:>10}  {:>8}", "crop", "type", "bushels", "avg");
            for row in average_price_by_type(&s.ledger.list_all()?) {
                println!(
                    "{:<8}  {:<11}  {:>10.0}  {:>8}",
                    row.crop,
                    row.contract_type,
                    row.bushels,
                    price(row.average_price)
                );
            }
        }
        ReportCommand::Rank { top } => {
            let k = top.unwrap_or(s.settings.rank_size).max(1);
            let ranking = rank_contracts(&s.ledger.list_all()?, k);
            println!("best {k}");
            print_contracts(&ranking.best, year);
            println!("worst {k}");
            print_contracts(&ranking.worst, year);
        }
        ReportCommand::Deliveries { year: y, month } => {
            let today = s.clock.now().date_naive();
            let y = y.unwrap_or(today.year());
            let m = month.unwrap_or(today.month());
            if !(1..=12).contains(&m) {
                return Err(GrainError::validation("month", format!("{m} is not a month")));
            }
            let due = s.ledger.deliveries_in(y, m)?;
            let bushels: f64 = due.iter().map(|c| c.bushels).sum();
            print_contracts(&due, year);
            eprintln!("{} contracts, {bushels:.0} bu delivering {y}-{m:02}", due.len());
        }
        ReportCommand::Plan { crop, crop_year } => {
            let plan_year = crop_year.unwrap_or(year);
            let contracts = s.ledger.list_all()?;
            let latest = s.market.latest(crop)?;
            let exposure =
                compute_exposure(&contracts, crop, Some(plan_year), latest.as_ref(), &s.settings);
            let cs = s.settings.crop(crop);
            let target = target_price(cs.cost_per_bushel, cs.target_margin_pct);
            println!(
                "{crop} {plan_year}: cost {} + {:.1}% margin = target {}",
                price(Some(cs.cost_per_bushel)),
                cs.target_margin_pct,
                price(Some(target))
            );
            println!(
                "  avg contract {}  market cash {}  sold {}",
                price(exposure.weighted_average_price),
                price(exposure.market_cash_price),
                exposure
                    .percent_sold_display()
                    .map_or_else(|| "-".to_string(), |p| format!("{p:.1}%"))
            );
            let milestones = milestones_from_config(s.config, crop, plan_year)?;
            let today = s.clock.now().date_naive();
            println!(
                "{:<24}  {:<10}  {:>6}  {:>6}  {:>8}  {:>7}  {}",
                "milestone", "date", "pct", "cum", "futures", "basis", "status"
            );
            for p in plan_progress(&milestones, exposure.percent_sold, today) {
                println!(
                    "{:<24}  {:<10}  {:>6.1}  {:>6.1}  {:>8}  {:>7}  {}",
                    p.milestone.name,
                    p.milestone.target_date,
                    p.milestone.pct_to_sell,
                    p.cumulative_pct,
                    price(Some(p.milestone.target_futures)),
                    cents(Some(p.milestone.target_basis)),
                    p.status
                );
            }
        }
        ReportCommand::Elevators { crop } => {
            let elevators = elevators_from_config(s.config)?;
            if elevators.is_empty() {
                eprintln!("No [elevator.*] sections configured");
                return Ok(());
            }
            let latest = s.market.latest(crop)?;
            let board = elevator_board(&elevators, crop, latest.as_ref());
            println!("{crop} futures {}", price(board.futures_price));
            println!("{:<24}  {:>7}  {:>8}  {}", "elevator", "basis", "net cash", "");
            for q in &board.quotes {
                let mut marks = Vec::new();
                if q.best_cash {
                    marks.push("best cash");
                }
                if q.best_basis {
                    marks.push("best basis");
                }
                println!(
                    "{:<24}  {:>7}  {:>8}  {}",
                    q.name,
                    cents(q.basis),
                    price(q.net_cash),
                    marks.join(", ")
                );
            }
        }
    }
    Ok(())
}
