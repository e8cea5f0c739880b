//! These structs provide the CLI interface for the fuel CLI.

use crate::config::UserMode;
use crate::model::{date, TransactionFields};
use crate::report::Period;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// fuel: A command-line tracker for fuel expenses.
///
/// Log each fill-up with its liters, price per liter and odometer readings, then look at totals
/// and day, week, month or year reports. Data is kept in a local storage file under the fuel
/// home directory. In registered mode it is also kept in a remote metadata API.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the fuel home directory with a default config.json and an empty storage file.
    Init,
    /// Record a fill-up.
    Add(AddArgs),
    /// Change fields of an existing transaction. Fields that are not given keep their value.
    Update(UpdateArgs),
    /// Delete a transaction by id. Deleting an id that does not exist is not an error.
    Delete(IdArgs),
    /// Copy a transaction under a new id, dated today.
    Duplicate(IdArgs),
    /// List all transactions, newest first.
    List,
    /// Show totals and averages over all transactions.
    Stats,
    /// Show a report of the last 7 days, 8 weeks, 12 months or 5 years.
    Report(ReportArgs),
    /// Import transactions from a CSV file.
    ///
    /// Columns are read by position: Date, Liters, Price/L, TotalCost, LastKm, CurrentKm,
    /// DistanceKm, Location, Notes. The first row is skipped. Rows without a readable date, or
    /// without a positive amount and price, are dropped.
    Import(ImportArgs),
    /// Export transactions as a CSV spreadsheet or a Markdown document.
    Export(ExportArgs),
    /// Record a fill-up by voice.
    Voice(VoiceArgs),
    /// Switch between guest and registered mode.
    Mode(ModeArgs),
    /// Sign in and switch to registered mode.
    SignIn,
    /// Sign out and return to guest mode.
    SignOut,
    /// Upload to or download from the remote API, or sync to the cloud.
    Sync(SyncArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where fuel data and configuration is held. Defaults to ~/fuel
    #[arg(long, env = "FUEL_HOME", default_value_t = default_fuel_home())]
    fuel_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, fuel_home: PathBuf) -> Self {
        Self {
            log_level,
            fuel_home: fuel_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn fuel_home(&self) -> &DisplayPath {
        &self.fuel_home
    }
}

/// Args for the `fuel add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// Liters of fuel.
    #[arg(long)]
    amount: f64,

    /// Price per liter.
    #[arg(long)]
    price: f64,

    /// The date of the fill-up, YYYY-MM-DD or DD/MM/YYYY. Defaults to today.
    #[arg(long, value_parser = parse_date_arg)]
    date: Option<NaiveDate>,

    /// The total paid. Defaults to amount times price.
    #[arg(long)]
    total_cost: Option<f64>,

    /// The odometer before this fill-up.
    #[arg(long)]
    last_km: Option<f64>,

    /// The odometer at this fill-up.
    #[arg(long)]
    km: Option<f64>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

impl AddArgs {
    pub fn new(amount: f64, price: f64) -> Self {
        Self {
            amount,
            price,
            date: None,
            total_cost: None,
            last_km: None,
            km: None,
            location: None,
            notes: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_km(mut self, last_km: Option<f64>, km: Option<f64>) -> Self {
        self.last_km = last_km;
        self.km = km;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Turns the arguments into transaction fields, dated today if no date was given.
    pub fn fields(&self) -> TransactionFields {
        let mut fields =
            TransactionFields::new(self.date.unwrap_or_else(date::today), self.amount, self.price)
                .with_km(self.last_km, self.km)
                .with_location(self.location.clone().unwrap_or_default())
                .with_notes(self.notes.clone().unwrap_or_default());
        fields.total_cost = self.total_cost;
        fields
    }
}

/// Args for the `fuel update` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct UpdateArgs {
    /// The id of the transaction to change.
    id: String,

    #[arg(long)]
    amount: Option<f64>,

    #[arg(long)]
    price: Option<f64>,

    #[arg(long, value_parser = parse_date_arg)]
    date: Option<NaiveDate>,

    /// The total paid. When amount or price change and this is not given, the total is
    /// recomputed.
    #[arg(long)]
    total_cost: Option<f64>,

    #[arg(long)]
    last_km: Option<f64>,

    #[arg(long)]
    km: Option<f64>,

    /// The location. Pass an empty string to clear it.
    #[arg(long)]
    location: Option<String>,

    /// The notes. Pass an empty string to clear them.
    #[arg(long)]
    notes: Option<String>,
}

impl UpdateArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Applies the given arguments on top of `current`.
    pub fn apply(&self, mut current: TransactionFields) -> TransactionFields {
        if self.amount.is_some() || self.price.is_some() {
            current.total_cost = None;
        }
        if let Some(amount) = self.amount {
            current.amount = amount;
        }
        if let Some(price) = self.price {
            current.price_per_liter = price;
        }
        if let Some(date) = self.date {
            current.date = date;
        }
        if let Some(total) = self.total_cost {
            current.total_cost = Some(total);
        }
        if let Some(last_km) = self.last_km {
            current.last_km_reading = Some(last_km);
        }
        if let Some(km) = self.km {
            current.km_reading = Some(km);
        }
        if let Some(location) = &self.location {
            current = current.with_location(location.clone());
        }
        if let Some(notes) = &self.notes {
            current = current.with_notes(notes.clone());
        }
        current
    }
}

/// Args for commands that take a single transaction id.
#[derive(Debug, Parser, Clone)]
pub struct IdArgs {
    id: String,
}

impl IdArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Args for the `fuel report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// The bucket size: day, week, month or year.
    #[arg(default_value_t = Period::Month)]
    period: Period,
}

impl ReportArgs {
    pub fn new(period: Period) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Period {
        self.period
    }
}

/// Args for the `fuel import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The CSV file to read.
    file: PathBuf,
}

impl ImportArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// A CSV spreadsheet.
    Csv,
    /// A Markdown document.
    Doc,
}

serde_plain::derive_display_from_serialize!(ExportFormat);
serde_plain::derive_fromstr_from_deserialize!(ExportFormat);

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Doc => "md",
        }
    }
}

/// Args for the `fuel export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    format: ExportFormat,

    /// Where to write the file. Defaults to `fuel-transactions-YYYY-MM-DD.{csv,md}` in the current
    /// directory.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(format: ExportFormat, output: Option<PathBuf>) -> Self {
        Self { format, output }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// Args for the `fuel voice` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct VoiceArgs {
    /// A recording to recognize. Without it an empty recording is used.
    #[arg(long)]
    audio: Option<PathBuf>,
}

impl VoiceArgs {
    pub fn new(audio: Option<PathBuf>) -> Self {
        Self { audio }
    }

    pub fn audio(&self) -> Option<&Path> {
        self.audio.as_deref()
    }
}

/// Args for the `fuel mode` command.
#[derive(Debug, Parser, Clone)]
pub struct ModeArgs {
    user_mode: UserMode,
}

impl ModeArgs {
    pub fn new(user_mode: UserMode) -> Self {
        Self { user_mode }
    }

    pub fn user_mode(&self) -> UserMode {
        self.user_mode
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// Post every local transaction to the remote API.
    Up,
    /// Replace the local transactions with the remote ones.
    Down,
    /// Sync to the cloud for the signed-in user.
    Cloud,
}

serde_plain::derive_display_from_serialize!(SyncDirection);
serde_plain::derive_fromstr_from_deserialize!(SyncDirection);

/// Args for the `fuel sync` command.
#[derive(Debug, Parser, Clone)]
pub struct SyncArgs {
    direction: SyncDirection,
}

impl SyncArgs {
    pub fn new(direction: SyncDirection) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> SyncDirection {
        self.direction
    }
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    date::parse_date(s).ok_or_else(|| format!("'{s}' is not a date, use YYYY-MM-DD or DD/MM/YYYY"))
}

fn default_fuel_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("fuel"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --fuel-home or FUEL_HOME instead of relying on the default \
                fuel home directory.",
            );
            PathBuf::from("fuel")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
