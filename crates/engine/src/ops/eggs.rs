use sea_orm::{ActiveValue, Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{
    EggDraft, EggEvent, EngineError, Hen, LogRow, RecordEditor, ResultEngine,
    aggregate::named_logs,
    egg_logs, hens,
    util::{new_record_id, require_record_id, require_reference_id, validate_weight},
};

use super::{Engine, with_tx};

/// What a full reset removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    pub hens_removed: u64,
    pub events_removed: u64,
}

impl Engine {
    /// Every egg event, most recent first.
    pub async fn list_egg_events(&self) -> ResultEngine<Vec<EggEvent>> {
        let models = egg_logs::Entity::find()
            .order_by_desc(egg_logs::Column::Timestamp)
            .order_by_desc(egg_logs::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(EggEvent::from).collect())
    }

    /// Egg events paired with the name they should be shown under.
    pub async fn list_egg_logs(&self) -> ResultEngine<Vec<LogRow>> {
        let hens = self.list_hens().await?;
        let events = self.list_egg_events().await?;
        Ok(named_logs(&events, &hens))
    }

    /// Record a laying event for an existing hen and return its id.
    ///
    /// The current hen name is stored with the event as a snapshot. A missing
    /// or zero `quantity` counts as one egg.
    pub async fn record_egg(
        &self,
        hen_id: &str,
        weight: f64,
        quantity: Option<u32>,
        timestamp: i64,
    ) -> ResultEngine<String> {
        let hen_id = require_reference_id(hen_id, "hen")?;
        let weight = validate_weight(weight)?;
        let quantity = quantity.filter(|q| *q >= 1).unwrap_or(1);

        with_tx!(self, |db_tx| {
            let hen = hens::Entity::find_by_id(hen_id.to_string())
                .one(&db_tx)
                .await?
                .map(Hen::from)
                .ok_or_else(|| EngineError::KeyNotFound(hen_id.to_string()))?;

            let event = EggEvent::new(
                new_record_id(),
                hen.id,
                hen.name,
                weight,
                i64::from(quantity),
                timestamp,
            );
            egg_logs::ActiveModel::from(&event).insert(&db_tx).await?;

            tracing::debug!(
                "recorded {} egg(s) for hen {} as {}",
                event.quantity,
                event.hen_id,
                event.id
            );
            Ok(event.id)
        })
    }

    /// Replace weight, quantity and timestamp of an egg event.
    pub async fn update_egg(
        &self,
        event_id: &str,
        weight: f64,
        quantity: u32,
        timestamp: i64,
    ) -> ResultEngine<()> {
        let event_id = require_record_id(event_id, "egg event")?;
        let weight = validate_weight(weight)?;
        let quantity = quantity.max(1);

        with_tx!(self, |db_tx| {
            let model = egg_logs::Entity::find_by_id(event_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(event_id.to_string()))?;

            let mut active: egg_logs::ActiveModel = model.into();
            active.weight = ActiveValue::Set(Some(weight));
            active.quantity = ActiveValue::Set(Some(i64::from(quantity)));
            active.timestamp = ActiveValue::Set(timestamp);
            active.update(&db_tx).await?;

            tracing::debug!("updated egg event {event_id}");
            Ok(())
        })
    }

    pub async fn delete_egg(&self, event_id: &str) -> ResultEngine<()> {
        let event_id = require_record_id(event_id, "egg event")?;
        let result = egg_logs::Entity::delete_by_id(event_id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(event_id.to_string()));
        }
        tracing::debug!("deleted egg event {event_id}");
        Ok(())
    }

    /// Delete every egg event. Returns how many were removed.
    pub async fn clear_all_eggs(&self) -> ResultEngine<u64> {
        let result = egg_logs::Entity::delete_many()
            .exec(&self.database)
            .await?;
        tracing::info!("cleared {} egg events", result.rows_affected);
        Ok(result.rows_affected)
    }

    /// Delete egg events without an owning hen id or without a weight.
    pub async fn cleanup_legacy_data(&self) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let result = egg_logs::Entity::delete_many()
                .filter(
                    Condition::any()
                        .add(egg_logs::Column::HenId.eq(""))
                        .add(egg_logs::Column::Weight.is_null())
                        .add(egg_logs::Column::Weight.eq(0.0)),
                )
                .exec(&db_tx)
                .await?;
            tracing::info!("removed {} legacy egg events", result.rows_affected);
            Ok(result.rows_affected)
        })
    }

    /// Delete every hen and every egg event in one transaction.
    ///
    /// Expenses and the egg price are kept.
    pub async fn reset_all_data(&self) -> ResultEngine<ResetReport> {
        with_tx!(self, |db_tx| {
            let events = egg_logs::Entity::delete_many().exec(&db_tx).await?;
            let flock = hens::Entity::delete_many().exec(&db_tx).await?;
            let report = ResetReport {
                hens_removed: flock.rows_affected,
                events_removed: events.rows_affected,
            };
            tracing::info!(
                "reset flock: {} hens and {} egg events removed",
                report.hens_removed,
                report.events_removed
            );
            Ok(report)
        })
    }

    /// Persist the draft of an editor in `Editing`.
    ///
    /// On failure the editor goes back to `Editing` with the error attached
    /// and the error is returned.
    pub async fn save_egg_edit(&self, editor: &mut RecordEditor<EggDraft>) -> ResultEngine<()> {
        let draft = editor.submit()?;
        let event_id = editor.record_id().to_string();
        match self
            .update_egg(&event_id, draft.weight, draft.quantity, draft.timestamp)
            .await
        {
            Ok(()) => editor.save_succeeded(),
            Err(err) => {
                editor.save_failed(&err)?;
                Err(err)
            }
        }
    }

    /// Delete the record of an editor in `PendingDelete`.
    ///
    /// The editor reaches `Deleted` only once the store confirmed the delete.
    pub async fn delete_egg_confirmed(
        &self,
        editor: &mut RecordEditor<EggDraft>,
    ) -> ResultEngine<()> {
        editor.ensure_pending_delete()?;
        self.delete_egg(editor.record_id()).await?;
        editor.confirm_delete()
    }
}
