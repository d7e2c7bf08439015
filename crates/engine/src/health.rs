//! Laying-based health signals per hen.

use serde::{Deserialize, Serialize};

use crate::{EggEvent, Hen};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
/// Without laying for this long, a hen is put under observation.
pub const OBSERVATION_AFTER_MS: i64 = 3 * DAY_MS;
/// Without laying for this long, a hen is flagged as critical.
pub const CRITICAL_AFTER_MS: i64 = 5 * DAY_MS;
/// Grams between the two newest eggs above which a trend is reported.
pub const WEIGHT_TREND_GRAMS: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Optimal,
    Observation,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTrend {
    Up,
    Stable,
    Down,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HenHealth {
    pub hen_id: String,
    pub name: String,
    pub status: HealthStatus,
    pub last_laid_at: Option<i64>,
    pub weight_trend: WeightTrend,
}

/// Assess every live hen at instant `now` (milliseconds since the epoch).
///
/// Output follows the order of `hens`.
pub fn assess_flock(hens: &[Hen], events: &[EggEvent], now: i64) -> Vec<HenHealth> {
    hens.iter()
        .map(|hen| {
            let mut own: Vec<&EggEvent> = events.iter().filter(|e| e.hen_id == hen.id).collect();
            own.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

            let last_laid_at = own.first().map(|e| e.timestamp);
            let status = match last_laid_at {
                None => HealthStatus::Critical,
                Some(at) => {
                    let since = now.saturating_sub(at);
                    if since >= CRITICAL_AFTER_MS {
                        HealthStatus::Critical
                    } else if since >= OBSERVATION_AFTER_MS {
                        HealthStatus::Observation
                    } else {
                        HealthStatus::Optimal
                    }
                }
            };

            let weight_trend = match own.as_slice() {
                [newest, previous, ..] => {
                    let diff = newest.weight - previous.weight;
                    if diff < -WEIGHT_TREND_GRAMS {
                        WeightTrend::Down
                    } else if diff > WEIGHT_TREND_GRAMS {
                        WeightTrend::Up
                    } else {
                        WeightTrend::Stable
                    }
                }
                _ => WeightTrend::Stable,
            };

            HenHealth {
                hen_id: hen.id.clone(),
                name: hen.name.clone(),
                status,
                last_laid_at,
                weight_trend,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 100 * DAY_MS;

    fn egg(hen_id: &str, weight: f64, timestamp: i64) -> EggEvent {
        EggEvent::new(format!("{hen_id}-{timestamp}"), hen_id, "", weight, 1, timestamp)
    }

    #[test]
    fn status_follows_time_since_last_lay() {
        let hens = vec![
            Hen::new("fresh", "Fresh", 0),
            Hen::new("slow", "Slow", 0),
            Hen::new("stuck", "Stuck", 0),
            Hen::new("never", "Never", 0),
        ];
        let events = vec![
            egg("fresh", 55.0, NOW - DAY_MS),
            egg("slow", 55.0, NOW - OBSERVATION_AFTER_MS),
            egg("stuck", 55.0, NOW - CRITICAL_AFTER_MS - 1),
        ];
        let report = assess_flock(&hens, &events, NOW);
        let statuses: Vec<HealthStatus> = report.iter().map(|h| h.status).collect();
        assert_eq!(
            statuses,
            vec![
                HealthStatus::Optimal,
                HealthStatus::Observation,
                HealthStatus::Critical,
                HealthStatus::Critical,
            ]
        );
        assert_eq!(report[3].last_laid_at, None);
    }

    #[test]
    fn weight_trend_compares_two_newest_eggs() {
        let hens = vec![
            Hen::new("a", "A", 0),
            Hen::new("b", "B", 0),
            Hen::new("c", "C", 0),
        ];
        let events = vec![
            egg("a", 60.0, NOW - 2 * DAY_MS),
            egg("a", 52.0, NOW - DAY_MS),
            egg("b", 50.0, NOW - 2 * DAY_MS),
            egg("b", 58.0, NOW - DAY_MS),
            egg("c", 55.0, NOW - 2 * DAY_MS),
            egg("c", 59.0, NOW - DAY_MS),
        ];
        let report = assess_flock(&hens, &events, NOW);
        assert_eq!(report[0].weight_trend, WeightTrend::Down);
        assert_eq!(report[1].weight_trend, WeightTrend::Up);
        assert_eq!(report[2].weight_trend, WeightTrend::Stable);
    }
}
