use std::collections::BTreeMap;

use uuid::Uuid;

use crate::cli::commands::records::parse_period;
use crate::cli::commands::{CommandDefinition, ParsedArgs};
use crate::cli::core::{parse_amount, CommandError, CommandResult, ShellContext};
use crate::cli::output::{self, format_amount};
use crate::core::clock::{Clock, SystemClock};
use crate::core::services::{NewIncomeSource, NewTaxDeduction, SummaryService};
use crate::records::{DeductionCategory, MonthKey, Period, SourceKind};

const INCOME_USAGE: &str = "income <set YYYY-MM LABEL=AMOUNT...|show [YYYY|YYYY-MM]|tax YYYY>";
const DEDUCTION_USAGE: &str =
    "deduction <add YEAR TYPE AMOUNT [--note TEXT]|list YEAR|remove ID>";
const SOURCE_USAGE: &str = "source <add income|deduction NAME [--employer]|list|remove ID>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "income",
            "Record monthly income line items and view net income",
            INCOME_USAGE,
            cmd_income,
        ),
        CommandDefinition::new(
            "deduction",
            "Track tax deductions per year",
            DEDUCTION_USAGE,
            cmd_deduction,
        ),
        CommandDefinition::new(
            "source",
            "Declare income sources and deductions that type income line items",
            SOURCE_USAGE,
            cmd_source,
        ),
    ]
}

fn cmd_income(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((subcommand, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {}", INCOME_USAGE)));
    };
    match subcommand.to_ascii_lowercase().as_str() {
        "set" => income_set(context, rest),
        "show" => income_show(context, rest),
        "tax" => income_tax(context, rest),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown income subcommand `{}`",
            other
        ))),
    }
}

fn income_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((raw_month, items)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {}", INCOME_USAGE)));
    };
    let month = parse_month(raw_month)?;
    let line_items = parse_line_items(items)?;
    let summary = context.income.save(month, line_items)?;
    output::success(format!(
        "Saved {} income line item(s) for {}.",
        summary.line_items.len(),
        month
    ));
    Ok(())
}

fn income_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period = match args.first() {
        Some(raw) => parse_period(raw)?,
        None => Period::Month(MonthKey::of(context.today())),
    };
    let currency = context.config.currency.as_str();
    let summaries = context.income.in_period(period);
    if summaries.is_empty() {
        output::info(format!("No income recorded for {}.", period));
        return Ok(());
    }

    output::section(format!("Income {}", period));
    for summary in summaries {
        output::info(format!("  {}", summary.key()));
        for (label, amount) in &summary.line_items {
            output::info(format!("    {:<20} {}", label, format_amount(*amount, currency)));
        }
    }
    let net = context.income.net_income(period, context.sources.sources());
    output::info(format!("  Gross      : {}", format_amount(net.gross, currency)));
    output::info(format!("  Deductions : {}", format_amount(net.deductions, currency)));
    output::info(format!("  Net        : {}", format_amount(net.net, currency)));
    Ok(())
}

fn income_tax(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let year = parse_year(args.first().copied())?;
    let summary = SummaryService::tax_summary(
        context.income.summaries(),
        context.sources.sources(),
        context.deductions.deductions(),
        year,
    );
    let currency = context.config.currency.as_str();
    output::section(format!("Tax year {}", year));
    output::info(format!(
        "  Gross income     : {}",
        format_amount(summary.gross_income, currency)
    ));
    output::info(format!(
        "  Taxes paid       : {}",
        format_amount(summary.taxes_paid, currency)
    ));
    output::info(format!(
        "  Deductions filed : {}",
        format_amount(summary.total_deductions, currency)
    ));
    Ok(())
}

fn cmd_deduction(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = ParsedArgs::parse(args, &["note"])?;
    let subcommand = args.require(0, DEDUCTION_USAGE)?.to_ascii_lowercase();
    match subcommand.as_str() {
        "add" => {
            let year = parse_year(args.positional(1))?;
            let deduction_type = args.require(2, DEDUCTION_USAGE)?;
            let amount = parse_amount(args.require(3, DEDUCTION_USAGE)?)?;
            let id = context.deductions.add(
                NewTaxDeduction {
                    year,
                    deduction_type: deduction_type.to_string(),
                    amount,
                    description: args.option("note").map(str::to_string),
                },
                SystemClock.now(),
            )?;
            output::success(format!("Added tax deduction `{}`.", id));
        }
        "list" => {
            let year = parse_year(args.positional(1))?;
            let currency = context.config.currency.as_str();
            let rows: Vec<Vec<String>> = context
                .deductions
                .for_year(year)
                .into_iter()
                .map(|d| {
                    vec![
                        d.id.to_string(),
                        d.deduction_type.clone(),
                        format_amount(d.amount, currency),
                    ]
                })
                .collect();
            if rows.is_empty() {
                output::info(format!("No deductions recorded for {}.", year));
                return Ok(());
            }
            println!("{}", output::render_table(&["ID", "Type", "Amount"], &rows));
            output::info(format!(
                "  Total: {}",
                format_amount(context.deductions.total_for_year(year), currency)
            ));
        }
        "remove" => {
            let raw = args.require(1, DEDUCTION_USAGE)?;
            let id = Uuid::parse_str(raw).map_err(|_| {
                CommandError::InvalidArguments(format!("invalid deduction id `{}`", raw))
            })?;
            let removed = context.deductions.remove(id)?;
            output::success(format!("Removed {} deduction.", removed.deduction_type));
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown deduction subcommand `{}`",
                other
            )))
        }
    }
    Ok(())
}

fn cmd_source(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = ParsedArgs::parse(args, &[])?;
    let subcommand = args.require(0, SOURCE_USAGE)?.to_ascii_lowercase();
    match subcommand.as_str() {
        "add" => {
            let kind = match args.require(1, SOURCE_USAGE)?.to_ascii_lowercase().as_str() {
                "income" => SourceKind::Income,
                "deduction" => SourceKind::Deduction,
                other => {
                    return Err(CommandError::InvalidArguments(format!(
                        "unknown source type `{}` (use `income` or `deduction`)",
                        other
                    )))
                }
            };
            let name = args.positionals()[2..].join(" ");
            if name.is_empty() {
                return Err(CommandError::InvalidArguments(format!("usage: {}", SOURCE_USAGE)));
            }
            let deduction_category = args
                .switch("employer")
                .then_some(DeductionCategory::EmployerContribution);
            let source = context.sources.add(NewIncomeSource {
                name,
                kind,
                deduction_category,
            })?;
            output::success(format!("Added source `{}` ({}).", source.name, source.id));
        }
        "list" => {
            let rows: Vec<Vec<String>> = context
                .sources
                .sources()
                .iter()
                .map(|source| {
                    let kind = match (source.kind, source.deduction_category) {
                        (SourceKind::Income, _) => "income",
                        (SourceKind::Deduction, Some(DeductionCategory::EmployerContribution)) => {
                            "employer contribution"
                        }
                        (SourceKind::Deduction, _) => "deduction",
                    };
                    vec![source.id.to_string(), source.name.clone(), kind.to_string()]
                })
                .collect();
            if rows.is_empty() {
                output::info("No income sources declared; line items are typed by sign.");
                return Ok(());
            }
            println!("{}", output::render_table(&["ID", "Name", "Type"], &rows));
        }
        "remove" => {
            let raw = args.require(1, SOURCE_USAGE)?;
            let id = Uuid::parse_str(raw).map_err(|_| {
                CommandError::InvalidArguments(format!("invalid source id `{}`", raw))
            })?;
            let removed = context.sources.remove(id)?;
            output::success(format!("Removed source `{}`.", removed.name));
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown source subcommand `{}`",
                other
            )))
        }
    }
    Ok(())
}

fn parse_month(input: &str) -> Result<MonthKey, CommandError> {
    match Period::parse(input) {
        Some(Period::Month(key)) => Ok(key),
        _ => Err(CommandError::InvalidArguments(format!(
            "invalid month `{}` (use YYYY-MM)",
            input
        ))),
    }
}

fn parse_year(input: Option<&str>) -> Result<i32, CommandError> {
    let raw = input.ok_or_else(|| CommandError::InvalidArguments("a year is required".into()))?;
    raw.parse::<i32>()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid year `{}`", raw)))
}

/// Parses `LABEL=AMOUNT` pairs; deductions are entered as negative amounts.
fn parse_line_items(items: &[&str]) -> Result<BTreeMap<String, f64>, CommandError> {
    if items.is_empty() {
        return Err(CommandError::InvalidArguments(
            "at least one LABEL=AMOUNT line item is required".into(),
        ));
    }
    items
        .iter()
        .map(|item| -> Result<(String, f64), CommandError> {
            let (label, amount) = item.rsplit_once('=').ok_or_else(|| {
                CommandError::InvalidArguments(format!("expected LABEL=AMOUNT, got `{}`", item))
            })?;
            Ok((label.trim().to_string(), parse_amount(amount.trim())?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_items_accept_negative_deductions() {
        let items = parse_line_items(&["Salary=5000", "Income Tax=-750.5"]).unwrap();
        assert_eq!(items["Salary"], 5000.0);
        assert_eq!(items["Income Tax"], -750.5);
        assert!(parse_line_items(&["Salary"]).is_err());
        assert!(parse_line_items(&[]).is_err());
    }

    #[test]
    fn month_argument_must_name_a_month() {
        assert_eq!(parse_month("2024-03").unwrap(), MonthKey::new(2024, 3).unwrap());
        assert!(parse_month("2024").is_err());
    }
}
