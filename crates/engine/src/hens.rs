//! The module contains the `Hen` record and its storage model.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_NAME: &str = "Unnamed Hen";
pub(crate) const DEFAULT_BREED: &str = "Heritage";
pub(crate) const DEFAULT_AGE: &str = "1";
pub(crate) const DEFAULT_COLOR: &str = "#FDF5E6";

/// A hen of the flock.
///
/// `id` is the identity every statistic is grouped by. `name` can change over
/// the hen's lifetime without fragmenting her history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hen {
    pub id: String,
    pub name: String,
    pub breed: String,
    /// Free-form age or laying cycle descriptor.
    pub age: String,
    pub color: String,
    /// Creation instant in milliseconds since the epoch.
    pub created_at: i64,
}

impl Hen {
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            breed: DEFAULT_BREED.to_string(),
            age: DEFAULT_AGE.to_string(),
            color: DEFAULT_COLOR.to_string(),
            created_at,
        }
    }
}

/// Editable profile fields, as submitted by the hen form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HenProfile {
    pub name: String,
    pub breed: String,
    pub age: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "hens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: Option<String>,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub color: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl From<Model> for Hen {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: or_default(model.name, DEFAULT_NAME),
            breed: or_default(model.breed, DEFAULT_BREED),
            age: or_default(model.age, DEFAULT_AGE),
            color: or_default(model.color, DEFAULT_COLOR),
            created_at: model.created_at,
        }
    }
}

impl From<&Hen> for ActiveModel {
    fn from(hen: &Hen) -> Self {
        Self {
            id: ActiveValue::Set(hen.id.clone()),
            name: ActiveValue::Set(Some(hen.name.clone())),
            breed: ActiveValue::Set(Some(hen.breed.clone())),
            age: ActiveValue::Set(Some(hen.age.clone())),
            color: ActiveValue::Set(Some(hen.color.clone())),
            created_at: ActiveValue::Set(hen.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_profile_fields_fall_back_to_defaults() {
        let hen = Hen::from(Model {
            id: "h1".to_string(),
            name: None,
            breed: Some("  ".to_string()),
            age: None,
            color: None,
            created_at: 7,
        });
        assert_eq!(hen.name, DEFAULT_NAME);
        assert_eq!(hen.breed, DEFAULT_BREED);
        assert_eq!(hen.age, DEFAULT_AGE);
        assert_eq!(hen.color, DEFAULT_COLOR);
        assert_eq!(hen.created_at, 7);
    }
}
