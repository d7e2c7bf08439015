//! Memoized view over the latest collections snapshot.
//!
//! The window statistics are recomputed only when an input changed, the
//! selection moved or the local calendar day rolled over. Flock health depends
//! on the exact instant and is assessed on every report.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Serialize;

use crate::{
    Aggregation, EggEvent, ExpenseEvent, FinancialSummary, Hen, HenHealth, MoneyCents,
    aggregate::aggregate,
    finance::{compute_financials, windowed_expenses},
    health::assess_flock,
    window::{Granularity, TimeWindow, resolve},
};

/// Granularity plus signed offset from the current period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Selection {
    pub granularity: Granularity,
    pub offset: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WindowSummary {
    pub window: TimeWindow,
    pub aggregation: Aggregation,
    pub financials: FinancialSummary,
}

#[derive(Debug, Serialize)]
pub struct DashboardReport<'a> {
    #[serde(flatten)]
    pub summary: &'a WindowSummary,
    pub health: Vec<HenHealth>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CacheKey {
    generation: u64,
    selection: Selection,
    day: NaiveDate,
}

#[derive(Debug, Default)]
pub struct Dashboard {
    hens: Vec<Hen>,
    events: Vec<EggEvent>,
    expenses: Vec<ExpenseEvent>,
    price: MoneyCents,
    selection: Selection,
    generation: u64,
    cache: Option<(CacheKey, WindowSummary)>,
    recomputations: u64,
}

impl Dashboard {
    pub fn new(
        hens: Vec<Hen>,
        events: Vec<EggEvent>,
        expenses: Vec<ExpenseEvent>,
        price: MoneyCents,
    ) -> Self {
        Self {
            hens,
            events,
            expenses,
            price,
            ..Default::default()
        }
    }

    /// Times the window statistics were actually computed.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    pub fn set_hens(&mut self, hens: Vec<Hen>) {
        self.hens = hens;
        self.generation += 1;
    }

    pub fn set_events(&mut self, events: Vec<EggEvent>) {
        self.events = events;
        self.generation += 1;
    }

    pub fn set_expenses(&mut self, expenses: Vec<ExpenseEvent>) {
        self.expenses = expenses;
        self.generation += 1;
    }

    pub fn set_price(&mut self, price: MoneyCents) {
        if self.price != price {
            self.price = price;
            self.generation += 1;
        }
    }

    pub fn select(&mut self, granularity: Granularity, offset: i32) {
        self.selection = Selection {
            granularity,
            offset,
        };
    }

    /// Move the selection `delta` periods, keeping the granularity.
    pub fn step(&mut self, delta: i32) {
        self.selection.offset = self.selection.offset.saturating_add(delta);
    }

    pub fn report<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> DashboardReport<'_> {
        let key = CacheKey {
            generation: self.generation,
            selection: self.selection,
            day: now.date_naive(),
        };
        let summary = match self.cache.take() {
            Some((cached, summary)) if cached == key => summary,
            _ => {
                self.recomputations += 1;
                self.compute(now)
            }
        };

        let health = assess_flock(&self.hens, &self.events, now.timestamp_millis());
        let (_, summary) = self.cache.insert((key, summary));
        DashboardReport { summary, health }
    }

    fn compute<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> WindowSummary {
        let window = resolve(self.selection.granularity, self.selection.offset, now);
        let aggregation = aggregate(&self.events, &self.hens, &window, now);
        let financials = compute_financials(
            aggregation.window_total,
            windowed_expenses(&self.expenses, &window),
            self.price,
        );
        WindowSummary {
            window,
            aggregation,
            financials,
        }
    }
}
