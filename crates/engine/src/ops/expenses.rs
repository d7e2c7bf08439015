use chrono::{NaiveDate, TimeZone};
use sea_orm::{ActiveValue, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, ExpenseCategory, ExpenseDraft, ExpenseEvent, MoneyCents, RecordEditor,
    ResultEngine, expenses,
    util::{new_record_id, require_record_id, validate_amount},
};

use super::{Engine, with_tx};

impl Engine {
    /// Every expense, most recent first.
    pub async fn list_expense_events(&self) -> ResultEngine<Vec<ExpenseEvent>> {
        let models = expenses::Entity::find()
            .order_by_desc(expenses::Column::Timestamp)
            .order_by_desc(expenses::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(ExpenseEvent::from).collect())
    }

    /// Record an expense dated `date`; its timestamp is the start of that day
    /// in `tz`.
    pub async fn record_expense<Tz: TimeZone>(
        &self,
        category: ExpenseCategory,
        amount: MoneyCents,
        date: NaiveDate,
        tz: &Tz,
    ) -> ResultEngine<String> {
        let amount = validate_amount(amount, "expense amount")?;
        let expense = ExpenseEvent::on_date(new_record_id(), category, amount, date, tz);
        expenses::ActiveModel::from(&expense)
            .insert(&self.database)
            .await?;
        tracing::debug!("recorded {category} expense {} of {amount}", expense.id);
        Ok(expense.id)
    }

    pub async fn update_expense<Tz: TimeZone>(
        &self,
        expense_id: &str,
        category: ExpenseCategory,
        amount: MoneyCents,
        date: NaiveDate,
        tz: &Tz,
    ) -> ResultEngine<()> {
        let expense_id = require_record_id(expense_id, "expense")?;
        let amount = validate_amount(amount, "expense amount")?;
        let updated = ExpenseEvent::on_date(expense_id, category, amount, date, tz);

        with_tx!(self, |db_tx| {
            let exists = expenses::Entity::find_by_id(expense_id.to_string())
                .one(&db_tx)
                .await?
                .is_some();
            if !exists {
                return Err(EngineError::KeyNotFound(expense_id.to_string()));
            }

            let mut active = expenses::ActiveModel::from(&updated);
            active.id = ActiveValue::Unchanged(expense_id.to_string());
            active.update(&db_tx).await?;

            tracing::debug!("updated expense {expense_id}");
            Ok(())
        })
    }

    pub async fn delete_expense(&self, expense_id: &str) -> ResultEngine<()> {
        let expense_id = require_record_id(expense_id, "expense")?;
        let result = expenses::Entity::delete_by_id(expense_id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(expense_id.to_string()));
        }
        tracing::debug!("deleted expense {expense_id}");
        Ok(())
    }

    /// Persist the draft of an expense editor in `Editing`.
    pub async fn save_expense_edit<Tz: TimeZone>(
        &self,
        editor: &mut RecordEditor<ExpenseDraft>,
        tz: &Tz,
    ) -> ResultEngine<()> {
        let draft = editor.submit()?;
        let expense_id = editor.record_id().to_string();
        match self
            .update_expense(&expense_id, draft.category, draft.amount, draft.date, tz)
            .await
        {
            Ok(()) => editor.save_succeeded(),
            Err(err) => {
                editor.save_failed(&err)?;
                Err(err)
            }
        }
    }

    pub async fn delete_expense_confirmed(
        &self,
        editor: &mut RecordEditor<ExpenseDraft>,
    ) -> ResultEngine<()> {
        editor.ensure_pending_delete()?;
        self.delete_expense(editor.record_id()).await?;
        editor.confirm_delete()
    }
}
