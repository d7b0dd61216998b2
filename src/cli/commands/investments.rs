use uuid::Uuid;

use crate::cli::commands::{CommandDefinition, ParsedArgs};
use crate::cli::core::{parse_amount, parse_date, CommandError, CommandResult, ShellContext};
use crate::cli::output::{self, format_amount, format_percent};
use crate::core::calculators;
use crate::core::services::NewHolding;

const HOLDING_USAGE: &str = "holding <add NAME TYPE INVESTED [--units N] [--price P] [--date YYYY-MM-DD]|price ID PRICE|list [TYPE]|remove ID>";
const CALC_USAGE: &str = "calc <sip MONTHLY RATE YEARS|stepup MONTHLY RATE YEARS STEP|swp CORPUS WITHDRAWAL RATE>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "holding",
            "Track investment holdings and their latest prices",
            HOLDING_USAGE,
            cmd_holding,
        ),
        CommandDefinition::new(
            "portfolio",
            "Show invested vs current value and allocation by asset type",
            "portfolio",
            cmd_portfolio,
        ),
        CommandDefinition::new(
            "calc",
            "Project SIP, step-up SIP, and SWP plans",
            CALC_USAGE,
            cmd_calc,
        ),
    ]
}

fn cmd_holding(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let args = ParsedArgs::parse(args, &["units", "price", "date"])?;
    let subcommand = args.require(0, HOLDING_USAGE)?.to_ascii_lowercase();
    let currency = context.config.currency.clone();
    match subcommand.as_str() {
        "add" => {
            let name = args.require(1, HOLDING_USAGE)?;
            let asset_type = args.require(2, HOLDING_USAGE)?;
            let invested_amount = parse_amount(args.require(3, HOLDING_USAGE)?)?;
            let units = args.option("units").map(parse_amount).transpose()?.unwrap_or(0.0);
            let current_price = args.option("price").map(parse_amount).transpose()?;
            let purchase_date = match args.option("date") {
                Some(raw) => parse_date(raw)?,
                None => context.today(),
            };
            let id = context.holdings.add(NewHolding {
                name: name.to_string(),
                asset_type: asset_type.to_string(),
                invested_amount,
                units,
                current_price,
                purchase_date,
            })?;
            output::success(format!("Added holding `{}`.", id));
        }
        "price" => {
            let id = parse_id(args.require(1, HOLDING_USAGE)?)?;
            let price = parse_amount(args.require(2, HOLDING_USAGE)?)?;
            let holding = context.holdings.update_price(id, price)?;
            output::success(format!(
                "{} is now worth {}.",
                holding.name,
                format_amount(holding.current_value(), &currency)
            ));
        }
        "list" => {
            let holdings = match args.positional(1) {
                Some(asset_type) => context.holdings.of_type(asset_type),
                None => context.holdings.holdings().iter().collect(),
            };
            if holdings.is_empty() {
                output::info("No holdings recorded.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = holdings
                .into_iter()
                .map(|h| {
                    vec![
                        h.id.to_string(),
                        h.name.clone(),
                        h.asset_type.clone(),
                        format_amount(h.invested_amount, &currency),
                        format_amount(h.current_value(), &currency),
                    ]
                })
                .collect();
            println!(
                "{}",
                output::render_table(&["ID", "Name", "Type", "Invested", "Current"], &rows)
            );
        }
        "remove" => {
            let id = parse_id(args.require(1, HOLDING_USAGE)?)?;
            let removed = context.holdings.remove(id)?;
            output::success(format!("Removed holding `{}`.", removed.name));
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown holding subcommand `{}`",
                other
            )))
        }
    }
    Ok(())
}

fn cmd_portfolio(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.holdings.holdings().is_empty() {
        output::info("No holdings recorded.");
        return Ok(());
    }
    let currency = context.config.currency.as_str();
    let value = context.holdings.valuation();
    output::section("Portfolio");
    output::info(format!(
        "  Invested      : {}",
        format_amount(value.total_invested, currency)
    ));
    output::info(format!(
        "  Current value : {}",
        format_amount(value.current_value, currency)
    ));
    output::info(format!(
        "  Returns       : {} ({})",
        format_amount(value.returns, currency),
        format_percent(value.return_percent)
    ));
    output::info("  Allocation:");
    for share in context.holdings.allocation() {
        output::info(format!(
            "    {:<20} {} ({})",
            share.name,
            format_amount(share.value, currency),
            format_percent(share.percent)
        ));
    }
    Ok(())
}

fn cmd_calc(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((plan, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {}", CALC_USAGE)));
    };
    let currency = context.config.currency.as_str();
    let number = |index: usize| -> Result<f64, CommandError> {
        let raw = rest
            .get(index)
            .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {}", CALC_USAGE)))?;
        parse_amount(raw)
    };
    let years = |index: usize| -> Result<u32, CommandError> {
        let raw = rest
            .get(index)
            .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {}", CALC_USAGE)))?;
        raw.parse::<u32>()
            .map_err(|_| CommandError::InvalidArguments(format!("invalid years `{}`", raw)))
    };

    match plan.to_ascii_lowercase().as_str() {
        "sip" => {
            let projection = calculators::sip(number(0)?, number(1)?, years(2)?)?;
            output::section("SIP projection");
            output::info(format!(
                "  Invested     : {}",
                format_amount(projection.invested, currency)
            ));
            output::info(format!(
                "  Returns      : {}",
                format_amount(projection.estimated_returns, currency)
            ));
            output::info(format!(
                "  Future value : {}",
                format_amount(projection.future_value, currency)
            ));
            output::info(format!("  CAGR         : {}", format_percent(projection.cagr)));
        }
        "stepup" => {
            let projection =
                calculators::step_up_sip(number(0)?, number(1)?, years(2)?, number(3)?)?;
            output::section("Step-up SIP projection");
            output::info(format!(
                "  Invested       : {}",
                format_amount(projection.invested, currency)
            ));
            output::info(format!(
                "  Maturity value : {}",
                format_amount(projection.maturity_value, currency)
            ));
            output::info(format!(
                "  Regular SIP    : {}",
                format_amount(projection.regular_value, currency)
            ));
            output::info(format!(
                "  Extra gain     : {}",
                format_amount(projection.additional_gain, currency)
            ));
            output::info(format!(
                "  Final monthly  : {}",
                format_amount(projection.final_monthly, currency)
            ));
        }
        "swp" => {
            let outcome = calculators::swp(number(0)?, number(1)?, number(2)?)?;
            output::section("SWP projection");
            output::info(format!(
                "  Withdrawn      : {}",
                format_amount(outcome.total_withdrawals, currency)
            ));
            output::info(format!(
                "  Remaining      : {}",
                format_amount(outcome.remaining_value, currency)
            ));
            if outcome.sustainable {
                output::success(format!(
                    "  Sustainable for at least {:.0} years.",
                    outcome.years_lasted()
                ));
            } else {
                output::warning(format!(
                    "  Corpus lasts {} month(s) ({:.1} years).",
                    outcome.months_lasted,
                    outcome.years_lasted()
                ));
            }
            output::info(format!(
                "  4% rule        : {} per month",
                format_amount(outcome.safe_monthly_withdrawal, currency)
            ));
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown plan `{}` (use sip, stepup, or swp)",
                other
            )))
        }
    }
    Ok(())
}

fn parse_id(raw: &str) -> Result<Uuid, CommandError> {
    Uuid::parse_str(raw)
        .map_err(|_| CommandError::InvalidArguments(format!("invalid holding id `{}`", raw)))
}
