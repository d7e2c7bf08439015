//! Production statistics over a time window.
//!
//! Everything here is a pure function of the collections passed in. Hen names
//! are resolved through a [`HenDirectory`] built fresh on every pass, so a
//! renamed hen keeps her history and shows her current name everywhere.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::{
    EggEvent, Hen,
    window::{Granularity, TimeWindow, local_date},
};

/// Name shown for a hen that no longer exists and left no usable snapshot.
pub const REMOVED_HEN_NAME: &str = "Removed hen";
/// Points in the trailing daily series.
pub const DAILY_SERIES_DAYS: i64 = 14;

/// Lookup table `hen id -> current display name`.
#[derive(Debug, Default)]
pub struct HenDirectory<'a> {
    names: HashMap<&'a str, &'a str>,
}

impl<'a> HenDirectory<'a> {
    pub fn new(hens: &'a [Hen]) -> Self {
        Self {
            names: hens
                .iter()
                .map(|hen| (hen.id.as_str(), hen.name.as_str()))
                .collect(),
        }
    }

    pub fn current_name(&self, hen_id: &str) -> Option<&'a str> {
        self.names.get(hen_id).copied()
    }

    /// Current name of the owning hen, else the snapshot stored on the event.
    pub fn display_name<'e>(&self, event: &'e EggEvent) -> &'e str
    where
        'a: 'e,
    {
        self.current_name(&event.hen_id)
            .unwrap_or(event.hen_name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HenRanking {
    pub hen_id: String,
    pub name: String,
    pub eggs: u64,
    /// The hen no longer exists; `name` is a fallback.
    pub removed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    /// First day of the bucket.
    pub date: NaiveDate,
    pub eggs: u64,
}

/// An egg event paired with the name it should be displayed under.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub display_name: String,
    #[serde(flatten)]
    pub event: EggEvent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub windowed_events: Vec<EggEvent>,
    pub window_total: u64,
    /// Largest producer first.
    pub rankings: Vec<HenRanking>,
    pub total_all_time: u64,
    /// `sum(weight * quantity) / sum(quantity)` over every event, 0 if none.
    pub avg_weight_all_time: f64,
    pub series: Vec<SeriesPoint>,
}

/// Aggregate `events` for `window`.
///
/// All-time figures ignore the window. The series depends on the
/// granularity: `Month` and `All` get the trailing daily series ending on the
/// local day of `now` drawn from every event, `Year` gets one point per month
/// of the inspected year drawn from the windowed events.
pub fn aggregate<Tz: TimeZone>(
    events: &[EggEvent],
    hens: &[Hen],
    window: &TimeWindow,
    now: &DateTime<Tz>,
) -> Aggregation {
    let windowed_events: Vec<EggEvent> = events
        .iter()
        .filter(|event| window.contains(event.timestamp))
        .cloned()
        .collect();
    let window_total = total_quantity(&windowed_events);

    let directory = HenDirectory::new(hens);
    let rankings = rank_hens(&windowed_events, &directory);

    let total_all_time = total_quantity(events);
    let avg_weight_all_time = average_weight(events);

    let tz = now.timezone();
    let series = match window.granularity {
        Granularity::Year => {
            let year = window.year.unwrap_or_else(|| now.year());
            monthly_series(&windowed_events, year, &tz)
        }
        Granularity::Month | Granularity::All => daily_series(events, now.date_naive(), &tz),
    };

    Aggregation {
        windowed_events,
        window_total,
        rankings,
        total_all_time,
        avg_weight_all_time,
        series,
    }
}

/// Pair every event with its resolved display name, keeping input order.
pub fn named_logs(events: &[EggEvent], hens: &[Hen]) -> Vec<LogRow> {
    let directory = HenDirectory::new(hens);
    events
        .iter()
        .map(|event| LogRow {
            display_name: directory.display_name(event).to_string(),
            event: event.clone(),
        })
        .collect()
}

pub fn total_quantity(events: &[EggEvent]) -> u64 {
    events.iter().map(|event| u64::from(event.quantity)).sum()
}

pub fn average_weight(events: &[EggEvent]) -> f64 {
    let eggs = total_quantity(events);
    if eggs == 0 {
        return 0.0;
    }
    let grams: f64 = events.iter().map(EggEvent::total_weight).sum();
    grams / eggs as f64
}

struct RankingAcc<'e> {
    hen_id: &'e str,
    eggs: u64,
    snapshot: Option<(&'e str, i64)>,
}

/// Group by hen id, sum quantities and sort by `(eggs desc, hen id asc)`.
fn rank_hens(events: &[EggEvent], directory: &HenDirectory<'_>) -> Vec<HenRanking> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut acc: Vec<RankingAcc<'_>> = Vec::new();

    for event in events {
        let slot = *index.entry(event.hen_id.as_str()).or_insert_with(|| {
            acc.push(RankingAcc {
                hen_id: event.hen_id.as_str(),
                eggs: 0,
                snapshot: None,
            });
            acc.len() - 1
        });
        let entry = &mut acc[slot];
        entry.eggs += u64::from(event.quantity);
        let newer = entry
            .snapshot
            .is_none_or(|(_, timestamp)| event.timestamp > timestamp);
        if newer && !event.hen_name.trim().is_empty() {
            entry.snapshot = Some((event.hen_name.as_str(), event.timestamp));
        }
    }

    acc.sort_by(|a, b| b.eggs.cmp(&a.eggs).then_with(|| a.hen_id.cmp(b.hen_id)));

    acc.into_iter()
        .map(|entry| {
            let current = directory.current_name(entry.hen_id);
            let name = current
                .or(entry.snapshot.map(|(name, _)| name))
                .unwrap_or(REMOVED_HEN_NAME);
            HenRanking {
                hen_id: entry.hen_id.to_string(),
                name: name.to_string(),
                eggs: entry.eggs,
                removed: current.is_none(),
            }
        })
        .collect()
}

fn daily_series<Tz: TimeZone>(events: &[EggEvent], today: NaiveDate, tz: &Tz) -> Vec<SeriesPoint> {
    let first = today - Duration::days(DAILY_SERIES_DAYS - 1);
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for event in events {
        if let Some(day) = local_date(tz, event.timestamp)
            && day >= first
            && day <= today
        {
            *per_day.entry(day).or_insert(0) += u64::from(event.quantity);
        }
    }

    first
        .iter_days()
        .take(DAILY_SERIES_DAYS as usize)
        .map(|date| SeriesPoint {
            label: date.format("%b %d").to_string(),
            date,
            eggs: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

fn monthly_series<Tz: TimeZone>(events: &[EggEvent], year: i32, tz: &Tz) -> Vec<SeriesPoint> {
    let mut per_month = [0u64; 12];
    for event in events {
        if let Some(day) = local_date(tz, event.timestamp)
            && day.year() == year
        {
            per_month[day.month0() as usize] += u64::from(event.quantity);
        }
    }

    (1..=12u32)
        .filter_map(|month| NaiveDate::from_ymd_opt(year, month, 1))
        .map(|date| SeriesPoint {
            label: date.format("%b").to_string(),
            date,
            eggs: per_month[date.month0() as usize],
        })
        .collect()
}
