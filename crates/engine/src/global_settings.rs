//! The singleton settings row.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::MoneyCents;

pub(crate) const SINGLETON_ID: &str = "global";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Price of one egg, used to derive revenue.
    pub price_per_egg: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub price_per_egg_minor: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for GlobalSettings {
    fn from(model: Model) -> Self {
        let price = model.price_per_egg_minor.unwrap_or(0).max(0);
        Self {
            price_per_egg: MoneyCents::new(price),
        }
    }
}

impl From<&GlobalSettings> for ActiveModel {
    fn from(settings: &GlobalSettings) -> Self {
        Self {
            id: ActiveValue::Set(SINGLETON_ID.to_string()),
            price_per_egg_minor: ActiveValue::Set(Some(settings.price_per_egg.cents())),
        }
    }
}
