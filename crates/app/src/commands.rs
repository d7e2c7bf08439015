use std::{error::Error, fmt::Display, sync::Arc, time::Duration};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use engine::{
    Dashboard, DashboardReport, EggDraft, Engine, EngineError, ExpenseCategory, ExpenseDraft,
    Granularity, HealthStatus, HenProfile, MoneyCents, PriceAutosave, RecordEditor, WeightTrend,
};

use crate::cli::{
    Command, ConfirmArgs, EggCommand, ExpenseCommand, HenCommand, HenProfileArgs, LayArgs,
    PriceCommand, SummaryArgs,
};

pub type CmdResult = Result<(), Box<dyn Error + Send + Sync>>;

pub struct Context<Tz: TimeZone> {
    pub engine: Engine,
    pub tz: Tz,
    pub quiet: Duration,
}

impl<Tz> Context<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// RFC 3339 instant, or a calendar date taken at local noon.
    fn parse_instant(&self, raw: &str) -> Result<i64, String> {
        if let Ok(instant) = DateTime::parse_from_rfc3339(raw.trim()) {
            return Ok(instant.timestamp_millis());
        }
        let date = parse_date(raw)?;
        date.and_hms_opt(12, 0, 0)
            .and_then(|noon| self.tz.from_local_datetime(&noon).earliest())
            .map(|instant| instant.timestamp_millis())
            .ok_or_else(|| format!("no such local time: {raw}"))
    }

    fn format_instant(&self, timestamp: i64) -> String {
        DateTime::from_timestamp_millis(timestamp)
            .map(|dt| {
                dt.with_timezone(&self.tz)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| "-".to_string())
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("invalid date {raw}: {err}"))
}

fn status_label(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Optimal => "optimal",
        HealthStatus::Observation => "observation",
        HealthStatus::Critical => "critical",
    }
}

fn trend_label(trend: WeightTrend) -> &'static str {
    match trend {
        WeightTrend::Up => "up",
        WeightTrend::Stable => "stable",
        WeightTrend::Down => "down",
    }
}

fn profile(args: HenProfileArgs) -> HenProfile {
    HenProfile {
        name: args.name,
        breed: args.breed,
        age: args.age,
        color: args.color,
    }
}

pub async fn run<Tz>(ctx: &Context<Tz>, command: Command) -> CmdResult
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match command {
        Command::Summary(args) => summary(ctx, args).await,
        Command::Hen(hen) => hen_command(ctx, hen.command).await,
        Command::Lay(args) => lay(ctx, args).await,
        Command::Egg(egg) => egg_command(ctx, egg.command).await,
        Command::Expense(expense) => expense_command(ctx, expense.command).await,
        Command::Price(price) => price_command(ctx, price.command).await,
        Command::Cleanup => {
            let removed = ctx.engine.cleanup_legacy_data().await?;
            println!("removed {removed} legacy egg events");
            Ok(())
        }
        Command::Reset(ConfirmArgs { yes }) => {
            if !yes {
                println!("this deletes every hen and egg event; pass --yes to confirm");
                return Ok(());
            }
            let report = ctx.engine.reset_all_data().await?;
            println!(
                "removed {} hens and {} egg events",
                report.hens_removed, report.events_removed
            );
            Ok(())
        }
    }
}

async fn summary<Tz>(ctx: &Context<Tz>, args: SummaryArgs) -> CmdResult
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let granularity = Granularity::try_from(args.granularity.as_str())?;
    let engine = &ctx.engine;
    let mut dashboard = Dashboard::new(
        engine.list_hens().await?,
        engine.list_egg_events().await?,
        engine.list_expense_events().await?,
        engine.get_settings().await?.price_per_egg,
    );
    dashboard.select(granularity, args.offset);

    let now = ctx.now();
    let report = dashboard.report(&now);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(ctx, &report);
    }
    Ok(())
}

fn print_report<Tz>(ctx: &Context<Tz>, report: &DashboardReport<'_>)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let summary = report.summary;
    let aggregation = &summary.aggregation;
    let financials = &summary.financials;

    println!("{}: {} eggs", summary.window.label, aggregation.window_total);
    println!(
        "all time: {} eggs, {:.1} g average",
        aggregation.total_all_time, aggregation.avg_weight_all_time
    );

    if !aggregation.rankings.is_empty() {
        println!("\nTop layers");
        for (rank, entry) in aggregation.rankings.iter().enumerate() {
            let removed = if entry.removed { " (removed)" } else { "" };
            println!("  {:>2}. {}{removed}: {}", rank + 1, entry.name, entry.eggs);
        }
    }

    println!("\nProduction");
    for point in &aggregation.series {
        println!("  {:<7} {}", point.label, point.eggs);
    }

    println!("\nFinances");
    println!("  revenue       {}", financials.total_revenue);
    println!("  expenses      {}", financials.total_expense);
    println!("  net profit    {}", financials.net_profit);
    println!("  cost per egg  {}", financials.cost_per_egg);
    for line in &financials.expense_breakdown {
        println!(
            "    {:<10} {} ({:.0}%)",
            line.category,
            line.total,
            line.share * 100.0
        );
    }

    if !report.health.is_empty() {
        println!("\nFlock health");
        for hen in &report.health {
            let last = hen
                .last_laid_at
                .map(|at| ctx.format_instant(at))
                .unwrap_or_else(|| "never".to_string());
            println!(
                "  {}: {}, last laid {last}, weight {}",
                hen.name,
                status_label(hen.status),
                trend_label(hen.weight_trend)
            );
        }
    }
}

async fn hen_command<Tz>(ctx: &Context<Tz>, command: HenCommand) -> CmdResult
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let engine = &ctx.engine;
    match command {
        HenCommand::Add(args) => {
            let id = engine.upsert_hen(None, profile(args)).await?;
            println!("added hen {id}");
        }
        HenCommand::Edit { id, profile: args } => {
            engine.upsert_hen(Some(&id), profile(args)).await?;
            println!("updated hen {id}");
        }
        HenCommand::Remove { id, confirm } => {
            let hen = engine.hen(&id).await?;
            if !confirm.yes {
                let events = engine
                    .list_egg_events()
                    .await?
                    .iter()
                    .filter(|event| event.hen_id == hen.id)
                    .count();
                println!(
                    "this deletes {} and {events} egg events; pass --yes to confirm",
                    hen.name
                );
                return Ok(());
            }
            let report = engine.delete_hen_cascade(&hen.id).await?;
            println!(
                "removed {} with {} egg events",
                hen.name, report.events_removed
            );
        }
        HenCommand::List => {
            for hen in engine.list_hens().await? {
                println!(
                    "{}  {}  {}  age {}  {}  since {}",
                    hen.id,
                    hen.name,
                    hen.breed,
                    hen.age,
                    hen.color,
                    ctx.format_instant(hen.created_at)
                );
            }
        }
    }
    Ok(())
}

async fn lay<Tz>(ctx: &Context<Tz>, args: LayArgs) -> CmdResult
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let timestamp = match args.at.as_deref() {
        Some(raw) => ctx.parse_instant(raw)?,
        None => ctx.now().timestamp_millis(),
    };
    let id = ctx
        .engine
        .record_egg(&args.hen, args.weight, args.quantity, timestamp)
        .await?;
    println!("recorded egg event {id}");
    Ok(())
}

async fn egg_command<Tz>(ctx: &Context<Tz>, command: EggCommand) -> CmdResult
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let engine = &ctx.engine;
    match command {
        EggCommand::Edit {
            id,
            weight,
            quantity,
            at,
        } => {
            let event = engine
                .list_egg_events()
                .await?
                .into_iter()
                .find(|event| event.id == id)
                .ok_or_else(|| EngineError::KeyNotFound(id.clone()))?;
            let timestamp = at.as_deref().map(|raw| ctx.parse_instant(raw)).transpose()?;

            let mut editor = RecordEditor::new(id.clone());
            editor.begin_edit(EggDraft::from(&event))?;
            if let Some(draft) = editor.draft_mut() {
                draft.weight = weight.unwrap_or(draft.weight);
                draft.quantity = quantity.unwrap_or(draft.quantity);
                draft.timestamp = timestamp.unwrap_or(draft.timestamp);
            }
            engine.save_egg_edit(&mut editor).await?;
            println!("updated egg event {id}");
        }
        EggCommand::Remove { id, confirm } => {
            let mut editor: RecordEditor<EggDraft> = RecordEditor::new(id.clone());
            editor.request_delete()?;
            if !confirm.yes {
                editor.cancel_delete()?;
                println!("pass --yes to delete egg event {id}");
                return Ok(());
            }
            engine.delete_egg_confirmed(&mut editor).await?;
            println!("deleted egg event {id}");
        }
        EggCommand::Clear(ConfirmArgs { yes }) => {
            if !yes {
                println!("this deletes every egg event; pass --yes to confirm");
                return Ok(());
            }
            let removed = engine.clear_all_eggs().await?;
            println!("removed {removed} egg events");
        }
        EggCommand::List => {
            for row in engine.list_egg_logs().await? {
                println!(
                    "{}  {}  {}  x{}  {:.1} g",
                    row.event.id,
                    ctx.format_instant(row.event.timestamp),
                    row.display_name,
                    row.event.quantity,
                    row.event.weight
                );
            }
        }
    }
    Ok(())
}

async fn expense_command<Tz>(ctx: &Context<Tz>, command: ExpenseCommand) -> CmdResult
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let engine = &ctx.engine;
    match command {
        ExpenseCommand::Add {
            category,
            amount,
            date,
        } => {
            let category = ExpenseCategory::try_from(category.as_str())?;
            let amount: MoneyCents = amount.parse()?;
            let date = match date.as_deref() {
                Some(raw) => parse_date(raw)?,
                None => ctx.now().date_naive(),
            };
            let id = engine
                .record_expense(category, amount, date, &ctx.tz)
                .await?;
            println!("recorded expense {id}");
        }
        ExpenseCommand::Edit {
            id,
            category,
            amount,
            date,
        } => {
            let expense = engine
                .list_expense_events()
                .await?
                .into_iter()
                .find(|expense| expense.id == id)
                .ok_or_else(|| EngineError::KeyNotFound(id.clone()))?;
            let category = category
                .as_deref()
                .map(ExpenseCategory::try_from)
                .transpose()?;
            let amount = amount
                .as_deref()
                .map(str::parse::<MoneyCents>)
                .transpose()?;
            let date = date.as_deref().map(parse_date).transpose()?;

            let mut editor = RecordEditor::new(id.clone());
            editor.begin_edit(ExpenseDraft::from(&expense))?;
            if let Some(draft) = editor.draft_mut() {
                draft.category = category.unwrap_or(draft.category);
                draft.amount = amount.unwrap_or(draft.amount);
                draft.date = date.unwrap_or(draft.date);
            }
            engine.save_expense_edit(&mut editor, &ctx.tz).await?;
            println!("updated expense {id}");
        }
        ExpenseCommand::Remove { id, confirm } => {
            let mut editor: RecordEditor<ExpenseDraft> = RecordEditor::new(id.clone());
            editor.request_delete()?;
            if !confirm.yes {
                editor.cancel_delete()?;
                println!("pass --yes to delete expense {id}");
                return Ok(());
            }
            engine.delete_expense_confirmed(&mut editor).await?;
            println!("deleted expense {id}");
        }
        ExpenseCommand::List => {
            for expense in engine.list_expense_events().await? {
                println!(
                    "{}  {}  {:<10} {}",
                    expense.id, expense.date, expense.category, expense.amount
                );
            }
        }
    }
    Ok(())
}

async fn price_command<Tz>(ctx: &Context<Tz>, command: PriceCommand) -> CmdResult
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let engine = &ctx.engine;
    let current = engine.get_settings().await?.price_per_egg;
    match command {
        PriceCommand::Show => println!("price per egg: {current}"),
        PriceCommand::Set { value } => {
            let price: MoneyCents = value.parse()?;
            let autosave = PriceAutosave::new(Arc::new(engine.clone()), current, ctx.quiet);
            autosave.set_price(price);
            autosave.flush().await;

            let stored = engine.get_settings().await?.price_per_egg;
            if stored != price {
                return Err(format!("price {price} was not saved, still {stored}").into());
            }
            println!("price per egg: {stored}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    async fn context() -> Context<FixedOffset> {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        <migration::Migrator as migration::MigratorTrait>::up(&db, None)
            .await
            .unwrap();
        Context {
            engine: Engine::builder().database(db).build().await.unwrap(),
            tz: FixedOffset::east_opt(3600).unwrap(),
            quiet: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn dates_are_taken_at_local_noon() {
        let ctx = context().await;
        let noon = ctx.parse_instant("2024-03-05").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 11, 0, 0).unwrap();
        assert_eq!(noon, expected.timestamp_millis());

        let exact = ctx.parse_instant("2024-03-05T08:30:00Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();
        assert_eq!(exact, expected.timestamp_millis());
        assert!(ctx.parse_instant("yesterday").is_err());
    }

    #[tokio::test]
    async fn price_set_goes_through_autosave() {
        let ctx = context().await;
        let command = PriceCommand::Set {
            value: "1,50".to_string(),
        };
        price_command(&ctx, command).await.unwrap();
        assert_eq!(
            ctx.engine.get_settings().await.unwrap().price_per_egg,
            MoneyCents::new(150)
        );
    }

    #[tokio::test]
    async fn unconfirmed_removal_keeps_the_record() {
        let ctx = context().await;
        let hen = ctx
            .engine
            .upsert_hen(
                None,
                HenProfile {
                    name: "Rosie".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let egg = ctx.engine.record_egg(&hen, 55.0, None, 0).await.unwrap();

        let command = EggCommand::Remove {
            id: egg.clone(),
            confirm: ConfirmArgs { yes: false },
        };
        egg_command(&ctx, command).await.unwrap();
        assert_eq!(ctx.engine.list_egg_events().await.unwrap().len(), 1);

        let command = EggCommand::Remove {
            id: egg,
            confirm: ConfirmArgs { yes: true },
        };
        egg_command(&ctx, command).await.unwrap();
        assert!(ctx.engine.list_egg_events().await.unwrap().is_empty());
    }
}
