use async_trait::async_trait;
use sea_orm::{prelude::*, sea_query::OnConflict};

use crate::{
    GlobalSettings, MoneyCents, PriceSink, ResultEngine,
    global_settings::{self, SINGLETON_ID},
    util::validate_amount,
};

use super::Engine;

impl Engine {
    /// The stored settings, or the defaults when none were ever saved.
    pub async fn get_settings(&self) -> ResultEngine<GlobalSettings> {
        let settings = global_settings::Entity::find_by_id(SINGLETON_ID.to_string())
            .one(&self.database)
            .await?
            .map(GlobalSettings::from)
            .unwrap_or_default();
        Ok(settings)
    }

    pub async fn set_price_per_egg(&self, price: MoneyCents) -> ResultEngine<()> {
        let price = validate_amount(price, "price per egg")?;
        let settings = GlobalSettings {
            price_per_egg: price,
        };
        global_settings::Entity::insert(global_settings::ActiveModel::from(&settings))
            .on_conflict(
                OnConflict::column(global_settings::Column::Id)
                    .update_column(global_settings::Column::PricePerEggMinor)
                    .to_owned(),
            )
            .exec(&self.database)
            .await?;
        tracing::debug!("price per egg set to {price}");
        Ok(())
    }
}

#[async_trait]
impl PriceSink for Engine {
    async fn save_price(&self, price: MoneyCents) -> ResultEngine<()> {
        self.set_price_per_egg(price).await
    }
}
