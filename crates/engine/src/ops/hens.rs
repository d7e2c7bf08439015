use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{
    EngineError, Hen, HenProfile, ResultEngine, egg_logs,
    hens::{self, DEFAULT_AGE, DEFAULT_BREED, DEFAULT_COLOR},
    util::{
        new_record_id, normalize_optional_text, normalize_required_text, now_millis,
        require_record_id,
    },
};

use super::{Engine, with_tx};

/// What a cascade delete removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub hen_removed: bool,
    pub events_removed: u64,
}

struct CleanProfile {
    name: String,
    breed: String,
    age: String,
    color: String,
}

fn clean_profile(profile: &HenProfile) -> ResultEngine<CleanProfile> {
    Ok(CleanProfile {
        name: normalize_required_text(&profile.name, "hen name")?,
        breed: normalize_optional_text(&profile.breed).unwrap_or_else(|| DEFAULT_BREED.to_string()),
        age: normalize_optional_text(&profile.age).unwrap_or_else(|| DEFAULT_AGE.to_string()),
        color: normalize_optional_text(&profile.color).unwrap_or_else(|| DEFAULT_COLOR.to_string()),
    })
}

impl Engine {
    /// Every hen, newest first.
    pub async fn list_hens(&self) -> ResultEngine<Vec<Hen>> {
        let models = hens::Entity::find()
            .order_by_desc(hens::Column::CreatedAt)
            .order_by_desc(hens::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Hen::from).collect())
    }

    pub async fn hen(&self, hen_id: &str) -> ResultEngine<Hen> {
        let hen_id = require_record_id(hen_id, "hen")?;
        hens::Entity::find_by_id(hen_id.to_string())
            .one(&self.database)
            .await?
            .map(Hen::from)
            .ok_or_else(|| EngineError::KeyNotFound(hen_id.to_string()))
    }

    /// Create a hen when `hen_id` is `None`, otherwise overwrite the profile
    /// of an existing one. Returns the hen id.
    ///
    /// Renaming never touches the name snapshots stored on egg events.
    pub async fn upsert_hen(
        &self,
        hen_id: Option<&str>,
        profile: HenProfile,
    ) -> ResultEngine<String> {
        let profile = clean_profile(&profile)?;

        let Some(hen_id) = hen_id else {
            let hen = Hen {
                id: new_record_id(),
                name: profile.name,
                breed: profile.breed,
                age: profile.age,
                color: profile.color,
                created_at: now_millis(),
            };
            hens::ActiveModel::from(&hen).insert(&self.database).await?;
            tracing::debug!("created hen {} ({})", hen.id, hen.name);
            return Ok(hen.id);
        };

        let hen_id = require_record_id(hen_id, "hen")?;
        with_tx!(self, |db_tx| {
            let model = hens::Entity::find_by_id(hen_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(hen_id.to_string()))?;

            let mut active: hens::ActiveModel = model.into();
            active.name = ActiveValue::Set(Some(profile.name));
            active.breed = ActiveValue::Set(Some(profile.breed));
            active.age = ActiveValue::Set(Some(profile.age));
            active.color = ActiveValue::Set(Some(profile.color));
            active.update(&db_tx).await?;

            tracing::debug!("updated hen {hen_id}");
            Ok(hen_id.to_string())
        })
    }

    /// Delete a hen and every egg event that references her, atomically.
    ///
    /// Orphaned events are removed even when the hen row is already gone. If
    /// the transaction fails, nothing is removed.
    pub async fn delete_hen_cascade(&self, hen_id: &str) -> ResultEngine<CascadeReport> {
        let hen_id = require_record_id(hen_id, "hen")?;

        let outcome: Result<CascadeReport, DbErr> = async {
            let db_tx = self.database.begin().await?;
            let events = egg_logs::Entity::delete_many()
                .filter(egg_logs::Column::HenId.eq(hen_id))
                .exec(&db_tx)
                .await?;
            let hen = hens::Entity::delete_by_id(hen_id.to_string())
                .exec(&db_tx)
                .await?;
            db_tx.commit().await?;
            Ok::<_, DbErr>(CascadeReport {
                hen_removed: hen.rows_affected > 0,
                events_removed: events.rows_affected,
            })
        }
        .await;

        match outcome {
            Ok(report) => {
                tracing::info!(
                    "deleted hen {hen_id} with {} egg events",
                    report.events_removed
                );
                Ok(report)
            }
            Err(source) => Err(EngineError::CascadeAborted {
                hen_id: hen_id.to_string(),
                source,
            }),
        }
    }
}
