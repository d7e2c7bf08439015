//! Egg production and flock finance engine.
//!
//! Records (hens, egg events, expenses, the egg price) live in SQLite behind
//! [`Engine`]. Statistics are pure functions of the collections the engine
//! lists: [`window::resolve`] picks a calendar window,
//! [`aggregate::aggregate`] counts eggs in it and
//! [`finance::compute_financials`] turns counts and expenses into money.

pub use aggregate::{Aggregation, HenDirectory, HenRanking, LogRow, SeriesPoint};
pub use dashboard::{Dashboard, DashboardReport, Selection, WindowSummary};
pub use editing::{EditState, EggDraft, ExpenseDraft, RecordEditor};
pub use egg_logs::EggEvent;
pub use error::EngineError;
pub use expenses::{ExpenseCategory, ExpenseEvent};
pub use finance::{CategoryTotal, FinancialSummary};
pub use global_settings::GlobalSettings;
pub use health::{HealthStatus, HenHealth, WeightTrend};
pub use hens::{Hen, HenProfile};
pub use money::MoneyCents;
pub use ops::{CascadeReport, Engine, EngineBuilder, ResetReport};
pub use price::{AutosaveStatus, DEFAULT_QUIET_PERIOD, PriceAutosave, PriceSink};
pub use window::{Granularity, TimeWindow};

pub mod aggregate;
mod dashboard;
mod editing;
mod egg_logs;
mod error;
mod expenses;
pub mod finance;
mod global_settings;
pub mod health;
mod hens;
mod money;
mod ops;
mod price;
mod util;
pub mod window;

pub type ResultEngine<T> = Result<T, EngineError>;
