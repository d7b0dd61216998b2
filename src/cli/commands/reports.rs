use crate::cli::commands::records::parse_period;
use crate::cli::commands::CommandDefinition;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output::{self, format_amount, format_percent};
use crate::core::clock::{Clock, SystemClock};
use crate::core::reminders::collect_due;
use crate::core::services::SummaryService;
use crate::records::{MonthKey, MonthWindow, Period};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "summary",
            "Income, spending and savings for a period",
            "summary [YYYY|YYYY-MM]",
            cmd_summary,
        ),
        CommandDefinition::new(
            "trend",
            "Month-by-month income and spending for a year",
            "trend [YYYY]",
            cmd_trend,
        ),
        CommandDefinition::new(
            "categories",
            "Spending per category for a period",
            "categories [YYYY|YYYY-MM]",
            cmd_categories,
        ),
        CommandDefinition::new(
            "due",
            "Recurring payments due soon",
            "due",
            cmd_due,
        ),
    ]
}

fn period_arg(context: &ShellContext, args: &[&str]) -> Result<Period, CommandError> {
    match args.first() {
        Some(raw) => parse_period(raw),
        None => Ok(Period::Month(MonthKey::of(context.today()))),
    }
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period = period_arg(context, args)?;
    let overview = SummaryService::period_overview(
        context.expenses.service.records(),
        context.savings.service.records(),
        context.income.summaries(),
        context.sources.sources(),
        period,
        context.config.recent_limit,
    );
    let currency = context.config.currency.as_str();

    output::section(format!("Summary {}", period));
    output::info(format!(
        "  Net income     : {}",
        format_amount(overview.net_income.net, currency)
    ));
    output::info(format!(
        "  Income tax     : {}",
        format_amount(overview.net_income.income_tax, currency)
    ));
    output::info(format!(
        "  Expenses       : {}",
        format_amount(overview.expenses, currency)
    ));
    output::info(format!(
        "  Remaining      : {}",
        format_amount(overview.remaining_budget, currency)
    ));
    output::info(format!(
        "  Saved          : {}",
        format_amount(overview.savings_contributions, currency)
    ));
    output::info(format!(
        "  Savings rate   : {}",
        format_percent(overview.savings_rate)
    ));
    if !overview.recent_expenses.is_empty() {
        output::info("  Recent expenses:");
        for record in &overview.recent_expenses {
            output::info(format!(
                "    {}  {:<20} {}",
                record.date,
                record.label(),
                format_amount(record.amount, currency)
            ));
        }
    }
    Ok(())
}

fn cmd_trend(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let year = match args.first() {
        Some(raw) => raw.parse::<i32>().map_err(|_| {
            CommandError::InvalidArguments(format!("invalid year `{}`", raw))
        })?,
        None => MonthKey::of(context.today()).year,
    };
    let report = SummaryService::monthly_trend(
        context.expenses.service.records(),
        context.income.summaries(),
        context.sources.sources(),
        MonthWindow::year(year),
    );
    let currency = context.config.currency.as_str();

    output::section(format!("Trend {}", year));
    let rows: Vec<Vec<String>> = report
        .months
        .iter()
        .map(|flow| {
            vec![
                flow.month.short_label().to_string(),
                format_amount(flow.income, currency),
                format_amount(flow.expenses, currency),
                format_amount(flow.net(), currency),
            ]
        })
        .collect();
    println!(
        "{}",
        output::render_table(&["Month", "Income", "Expenses", "Net"], &rows)
    );
    output::info(format!(
        "  Net savings    : {}",
        format_amount(report.net_savings, currency)
    ));
    if let Some(month) = report.highest_income_month {
        output::info(format!("  Best income    : {}", month.short_label()));
    }
    if let Some(month) = report.lowest_income_month {
        output::info(format!("  Lowest income  : {}", month.short_label()));
    }
    if let Some(month) = report.highest_spending_month {
        output::info(format!("  Most spent     : {}", month.short_label()));
    }
    Ok(())
}

fn cmd_categories(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period = period_arg(context, args)?;
    let breakdown =
        SummaryService::category_breakdown(context.expenses.service.records(), period);
    if breakdown.categories.is_empty() {
        output::info(format!("No expenses recorded for {}.", period));
        return Ok(());
    }

    let currency = context.config.currency.as_str();
    output::section(format!("Categories {}", period));
    let rows: Vec<Vec<String>> = breakdown
        .categories
        .iter()
        .map(|share| {
            vec![
                share.name.clone(),
                format_amount(share.value, currency),
                format_percent(share.percent),
            ]
        })
        .collect();
    println!(
        "{}",
        output::render_table(&["Category", "Spent", "Share"], &rows)
    );
    output::info(format!("  Total: {}", format_amount(breakdown.total, currency)));
    Ok(())
}

fn cmd_due(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let now = SystemClock.now();
    let policy = context.config.reminder_policy()?;
    let mut due = collect_due(
        context.expenses.service.records(),
        now,
        policy,
        &mut context.reminders,
    );
    due.extend(collect_due(
        context.savings.service.records(),
        now,
        policy,
        &mut context.reminders,
    ));
    due.sort_by(|a, b| a.due.cmp(&b.due));
    context.save_reminders()?;

    if due.is_empty() {
        output::info("Nothing due in the reminder window.");
        return Ok(());
    }
    let currency = context.config.currency.as_str();
    output::section("Due soon");
    for reminder in &due {
        output::info(format!(
            "  {}  {:<20} {}",
            reminder.due,
            reminder.label,
            format_amount(reminder.amount, currency)
        ));
    }
    Ok(())
}
