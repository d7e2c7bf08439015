//! Egg laying events.
//!
//! An `EggEvent` may stand for several eggs (`quantity`). The hen name stored
//! with it is a snapshot taken at write time and is only a fallback for
//! display: the live hen name always wins.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

pub(crate) const UNKNOWN_HEN_NAME: &str = "Unknown Hen";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EggEvent {
    pub id: String,
    pub hen_id: String,
    /// Hen name at the time the event was recorded. Never updated afterwards.
    pub hen_name: String,
    /// Weight in grams, `>= 0`.
    pub weight: f64,
    /// Eggs represented by this event, `>= 1`.
    pub quantity: u32,
    /// Occurrence instant in milliseconds since the epoch.
    pub timestamp: i64,
}

impl EggEvent {
    /// Build a sanitized event: an invalid quantity becomes 1 and an invalid
    /// weight becomes 0.
    pub fn new(
        id: impl Into<String>,
        hen_id: impl Into<String>,
        hen_name: impl Into<String>,
        weight: f64,
        quantity: i64,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            hen_id: hen_id.into(),
            hen_name: hen_name.into(),
            weight: sanitize_weight(Some(weight)),
            quantity: sanitize_quantity(Some(quantity)),
            timestamp,
        }
    }

    /// `weight * quantity`, the grams this event contributes to averages.
    pub fn total_weight(&self) -> f64 {
        self.weight * f64::from(self.quantity)
    }
}

pub(crate) fn sanitize_quantity(value: Option<i64>) -> u32 {
    match value {
        Some(q) if q >= 1 => u32::try_from(q).unwrap_or(u32::MAX),
        _ => 1,
    }
}

pub(crate) fn sanitize_weight(value: Option<f64>) -> f64 {
    match value {
        Some(w) if w.is_finite() && w >= 0.0 => w,
        _ => 0.0,
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "egg_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub hen_id: String,
    pub hen_name: Option<String>,
    pub weight: Option<f64>,
    pub quantity: Option<i64>,
    pub timestamp: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for EggEvent {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            hen_id: model.hen_id,
            hen_name: model
                .hen_name
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_HEN_NAME.to_string()),
            weight: sanitize_weight(model.weight),
            quantity: sanitize_quantity(model.quantity),
            timestamp: model.timestamp,
        }
    }
}

impl From<&EggEvent> for ActiveModel {
    fn from(event: &EggEvent) -> Self {
        Self {
            id: ActiveValue::Set(event.id.clone()),
            hen_id: ActiveValue::Set(event.hen_id.clone()),
            hen_name: ActiveValue::Set(Some(event.hen_name.clone())),
            weight: ActiveValue::Set(Some(event.weight)),
            quantity: ActiveValue::Set(Some(i64::from(event.quantity))),
            timestamp: ActiveValue::Set(event.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_sanitizes_numbers() {
        let event = EggEvent::new("e1", "h1", "Rosie", -3.0, 0, 10);
        assert_eq!(event.weight, 0.0);
        assert_eq!(event.quantity, 1);

        let event = EggEvent::new("e2", "h1", "Rosie", f64::NAN, -4, 10);
        assert_eq!(event.weight, 0.0);
        assert_eq!(event.quantity, 1);

        let event = EggEvent::new("e3", "h1", "Rosie", 58.5, 3, 10);
        assert_eq!(event.weight, 58.5);
        assert_eq!(event.quantity, 3);
        assert_eq!(event.total_weight(), 175.5);
    }

    #[test]
    fn missing_row_fields_degrade_to_defaults() {
        let event = EggEvent::from(Model {
            id: "e1".to_string(),
            hen_id: "h1".to_string(),
            hen_name: None,
            weight: None,
            quantity: None,
            timestamp: 42,
        });
        assert_eq!(event.hen_name, UNKNOWN_HEN_NAME);
        assert_eq!(event.weight, 0.0);
        assert_eq!(event.quantity, 1);
    }
}
