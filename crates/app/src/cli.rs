use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "henhouse")]
#[command(about = "Egg production and flock finances")]
pub struct Cli {
    /// Settings file, with or without the `.toml` extension.
    #[arg(long, default_value = "settings")]
    pub config: String,

    /// Override the configured time zone (IANA name).
    #[arg(long)]
    pub timezone: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Totals, rankings, finances and flock health for a window.
    Summary(SummaryArgs),
    Hen(Hen),
    /// Record a laying event.
    Lay(LayArgs),
    Egg(Egg),
    Expense(Expense),
    Price(Price),
    /// Remove egg events without a hen or without a weight.
    Cleanup,
    /// Remove every hen and every egg event.
    Reset(ConfirmArgs),
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// month, year or all
    #[arg(long, default_value = "month")]
    pub granularity: String,
    /// Periods away from the current one, negative goes back.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i32,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    /// Confirm the deletion.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct Hen {
    #[command(subcommand)]
    pub command: HenCommand,
}

#[derive(Subcommand, Debug)]
pub enum HenCommand {
    Add(HenProfileArgs),
    Edit {
        id: String,
        #[command(flatten)]
        profile: HenProfileArgs,
    },
    /// Delete a hen together with all her egg events.
    Remove {
        id: String,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    List,
}

#[derive(Args, Debug)]
pub struct HenProfileArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub breed: String,
    #[arg(long, default_value = "")]
    pub age: String,
    #[arg(long, default_value = "")]
    pub color: String,
}

#[derive(Args, Debug)]
pub struct LayArgs {
    #[arg(long)]
    pub hen: String,
    /// Grams.
    #[arg(long, default_value_t = 0.0)]
    pub weight: f64,
    #[arg(long)]
    pub quantity: Option<u32>,
    /// RFC 3339 instant or YYYY-MM-DD; now when omitted.
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args, Debug)]
pub struct Egg {
    #[command(subcommand)]
    pub command: EggCommand,
}

#[derive(Subcommand, Debug)]
pub enum EggCommand {
    Edit {
        id: String,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long)]
        at: Option<String>,
    },
    Remove {
        id: String,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    /// Delete every egg event.
    Clear(ConfirmArgs),
    List,
}

#[derive(Args, Debug)]
pub struct Expense {
    #[command(subcommand)]
    pub command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    Add {
        /// feed, medicine, equipment or other
        #[arg(long)]
        category: String,
        /// Decimal amount, e.g. 12.50
        #[arg(long)]
        amount: String,
        /// YYYY-MM-DD; today when omitted.
        #[arg(long)]
        date: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    Remove {
        id: String,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    List,
}

#[derive(Args, Debug)]
pub struct Price {
    #[command(subcommand)]
    pub command: PriceCommand,
}

#[derive(Subcommand, Debug)]
pub enum PriceCommand {
    /// Set the price of one egg.
    Set { value: String },
    Show,
}
