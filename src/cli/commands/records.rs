use crate::cli::commands::{CommandDefinition, ParsedArgs};
use crate::cli::core::{
    parse_amount, parse_date, report_refresh, BookKind, CommandError, CommandResult, ShellContext,
};
use crate::cli::output;
use crate::core::bucketing::bucket_period;
use crate::core::services::UpdateOutcome;
use crate::records::{
    DatedAmountRecord, MonthKey, MutationScope, NewRecord, Period, RecordId, RecordPatch,
};

const ADD_USAGE: &str =
    "add <expenses|savings> <YYYY-MM-DD> <amount> <category> [--monthly] [--until YYYY-MM-DD] [--note TEXT]";
const LIST_USAGE: &str = "list <expenses|savings> [YYYY|YYYY-MM|all]";
const REMOVE_USAGE: &str = "remove <expenses|savings> <id> [--series|--instance]";
const UPDATE_USAGE: &str = "update <expenses|savings> <id> [--amount N] [--category NAME] [--note TEXT] [--until YYYY-MM-DD] [--one-off] [--series|--instance]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("add", "Record an expense or savings entry", ADD_USAGE, cmd_add),
        CommandDefinition::new("list", "List records for a period", LIST_USAGE, cmd_list),
        CommandDefinition::new(
            "remove",
            "Remove a record or its whole series",
            REMOVE_USAGE,
            cmd_remove,
        ),
        CommandDefinition::new(
            "update",
            "Edit a record or its whole series",
            UPDATE_USAGE,
            cmd_update,
        ),
        CommandDefinition::new(
            "refresh",
            "Extend recurring series up to the horizon",
            "refresh",
            cmd_refresh,
        ),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = ParsedArgs::parse(args, &["until", "note"])?;
    let kind = BookKind::parse(args.require(0, ADD_USAGE)?)?;
    let date = parse_date(args.require(1, ADD_USAGE)?)?;
    let amount = parse_amount(args.require(2, ADD_USAGE)?)?;
    let category = args.require(3, ADD_USAGE)?;

    let mut input = NewRecord::new(date, amount, category);
    if let Some(note) = args.option("note") {
        input = input.with_description(note);
    }
    let until = args.option("until").map(parse_date).transpose()?;
    if args.switch("monthly") || until.is_some() {
        input = input.monthly();
    }
    if let Some(end_date) = until {
        input = input.until(end_date);
    }

    let outcome = context.book_mut(kind).service.add(input)?;
    match outcome.created.as_slice() {
        [single] => output::success(format!("Added {} record `{}`.", kind.label(), single)),
        created => output::success(format!(
            "Added {} monthly {} instances (series {}).",
            created.len(),
            kind.label(),
            outcome.series_id
        )),
    }
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = BookKind::parse(args.first().copied().unwrap_or("expenses"))?;
    let records = context.book(kind).service.records();
    let mut selected: Vec<&DatedAmountRecord> = match args.get(1).copied() {
        Some("all") => records.iter().collect(),
        Some(raw) => bucket_period(records, parse_period(raw)?).records,
        None => bucket_period(records, Period::Month(MonthKey::of(context.today()))).records,
    };
    selected.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    if selected.is_empty() {
        output::info(format!("No {} recorded for this period.", kind.label()));
        return Ok(());
    }

    let currency = &context.config.currency;
    let rows: Vec<Vec<String>> = selected
        .iter()
        .map(|record| {
            vec![
                record.id.to_string(),
                record.date.to_string(),
                output::format_amount(record.amount, currency),
                record.label().to_string(),
                record
                    .recurrence_interval
                    .map(|interval| interval.label().to_string())
                    .unwrap_or_else(|| "-".into()),
                record
                    .next_due_date
                    .map(|due| due.to_string())
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    println!(
        "{}",
        output::render_table(
            &["ID", "Date", "Amount", "Label", "Repeats", "Next due"],
            &rows
        )
    );
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = ParsedArgs::parse(args, &[])?;
    let kind = BookKind::parse(args.require(0, REMOVE_USAGE)?)?;
    let id = RecordId::from(args.require(1, REMOVE_USAGE)?);
    let scope = context.choose_scope(kind, &id, &args)?;

    let outcome = context.book_mut(kind).service.remove(&id, scope)?;
    match outcome.scope {
        MutationScope::Instance => output::success(format!("Removed record `{}`.", id)),
        MutationScope::Series => output::success(format!(
            "Removed {} records from the series of `{}`.",
            outcome.removed, id
        )),
    }
    Ok(())
}

fn cmd_update(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = ParsedArgs::parse(args, &["amount", "category", "note", "until"])?;
    let kind = BookKind::parse(args.require(0, UPDATE_USAGE)?)?;
    let id = RecordId::from(args.require(1, UPDATE_USAGE)?);

    let patch = RecordPatch {
        amount: args.option("amount").map(parse_amount).transpose()?,
        category: args.option("category").map(str::to_string),
        description: args.option("note").map(str::to_string),
        is_recurring: args.switch("one-off").then_some(false),
        end_date: args.option("until").map(parse_date).transpose()?,
    };
    if patch.is_empty() {
        return Err(CommandError::InvalidArguments(format!(
            "nothing to update; usage: {}",
            UPDATE_USAGE
        )));
    }

    let scope = context.choose_scope(kind, &id, &args)?;
    let outcome = context.book_mut(kind).service.update(&id, patch, scope)?;
    let message = match outcome {
        UpdateOutcome::Instance => format!("Updated record `{}`.", id),
        UpdateOutcome::Series { updated } => format!("Updated {} records in the series.", updated),
        UpdateOutcome::Collapsed { removed } => format!(
            "Replaced {} recurring instances with a single record.",
            removed
        ),
        UpdateOutcome::Regenerated { instances } => {
            format!("Regenerated the series with {} instance(s).", instances)
        }
    };
    output::success(message);
    Ok(())
}

fn cmd_refresh(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    for kind in BookKind::ALL {
        let report = context.book_mut(kind).service.refresh()?;
        report_refresh(kind, &report);
    }
    Ok(())
}

pub(crate) fn parse_period(input: &str) -> Result<Period, CommandError> {
    Period::parse(input).ok_or_else(|| {
        CommandError::InvalidArguments(format!("invalid period `{}` (use YYYY or YYYY-MM)", input))
    })
}
