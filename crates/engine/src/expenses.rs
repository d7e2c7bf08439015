//! Operating cost entries.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, window::day_start_millis};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Feed,
    Medicine,
    Equipment,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Medicine => "medicine",
            Self::Equipment => "equipment",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<&str> for ExpenseCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "feed" => Ok(Self::Feed),
            "medicine" => Ok(Self::Medicine),
            "equipment" => Ok(Self::Equipment),
            "other" => Ok(Self::Other),
            other => Err(EngineError::Validation(format!(
                "invalid expense category: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseEvent {
    pub id: String,
    pub category: ExpenseCategory,
    /// Non-negative amount.
    pub amount: MoneyCents,
    /// Calendar date as entered by the user.
    pub date: NaiveDate,
    /// Start of `date` in milliseconds since the epoch, used for windowing.
    pub timestamp: i64,
}

impl ExpenseEvent {
    /// Build an expense whose timestamp is the start of `date` in `tz`.
    pub fn on_date<Tz: TimeZone>(
        id: impl Into<String>,
        category: ExpenseCategory,
        amount: MoneyCents,
        date: NaiveDate,
        tz: &Tz,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            amount: sanitize_amount(amount),
            date,
            timestamp: day_start_millis(tz, date),
        }
    }
}

fn sanitize_amount(amount: MoneyCents) -> MoneyCents {
    if amount.is_negative() {
        MoneyCents::ZERO
    } else {
        amount
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub category: String,
    pub amount_minor: Option<i64>,
    pub date: String,
    pub timestamp: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ExpenseEvent {
    fn from(model: Model) -> Self {
        let date = NaiveDate::parse_from_str(model.date.trim(), DATE_FORMAT).unwrap_or_else(|_| {
            DateTime::<Utc>::from_timestamp_millis(model.timestamp)
                .map(|dt| dt.date_naive())
                .unwrap_or_default()
        });
        Self {
            id: model.id,
            category: ExpenseCategory::try_from(model.category.as_str())
                .unwrap_or(ExpenseCategory::Other),
            amount: sanitize_amount(MoneyCents::new(model.amount_minor.unwrap_or(0))),
            date,
            timestamp: model.timestamp,
        }
    }
}

impl From<&ExpenseEvent> for ActiveModel {
    fn from(expense: &ExpenseEvent) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.clone()),
            category: ActiveValue::Set(expense.category.as_str().to_string()),
            amount_minor: ActiveValue::Set(Some(expense.amount.cents())),
            date: ActiveValue::Set(expense.date.format(DATE_FORMAT).to_string()),
            timestamp: ActiveValue::Set(expense.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(
            ExpenseCategory::try_from(" Feed ").unwrap(),
            ExpenseCategory::Feed
        );
        assert!(ExpenseCategory::try_from("toys").is_err());
    }

    #[test]
    fn timestamp_is_start_of_day_in_zone() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let expense =
            ExpenseEvent::on_date("x1", ExpenseCategory::Feed, MoneyCents::new(800), date, &Utc);
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(expense.timestamp, expected.timestamp_millis());
    }

    #[test]
    fn unreadable_row_fields_are_sanitized() {
        let expense = ExpenseEvent::from(Model {
            id: "x1".to_string(),
            category: "snacks".to_string(),
            amount_minor: Some(-50),
            date: "not a date".to_string(),
            timestamp: 0,
        });
        assert_eq!(expense.category, ExpenseCategory::Other);
        assert_eq!(expense.amount, MoneyCents::ZERO);
        assert_eq!(expense.date, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    }
}
