//! Core CLI loop state, dispatch, and error reporting.

use std::io;

use chrono::NaiveDate;
use dialoguer::{theme::ColorfulTheme, Confirm};
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use tracing::debug;

use crate::{
    config::{Config, ConfigError, ConfigManager},
    core::{
        calculators::CalculatorError,
        clock::{Clock, SystemClock},
        reminders::ReminderLog,
        scheduler::RefreshSchedule,
        services::{
            DeductionService, HoldingService, IncomeService, IncomeSourceService, RecordService,
            RefreshReport, ServiceError,
        },
    },
    errors::PersistenceError,
    records::{
        DatedAmountRecord, Holding, IncomeSource, MonthlyIncomeSummary, MutationScope, RecordId,
        TaxDeduction,
    },
    storage::{JsonRepository, JsonStore},
};

use super::commands::{self, CommandDefinition, CommandRegistry, ParsedArgs};
use super::output;

pub type Records = RecordService<JsonRepository<DatedAmountRecord>, SystemClock>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

/// Which record collection a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookKind {
    Expenses,
    Savings,
}

impl BookKind {
    pub const ALL: [BookKind; 2] = [BookKind::Expenses, BookKind::Savings];

    pub fn parse(input: &str) -> Result<Self, CommandError> {
        match input.to_ascii_lowercase().as_str() {
            "expense" | "expenses" => Ok(BookKind::Expenses),
            "saving" | "savings" => Ok(BookKind::Savings),
            other => Err(CommandError::InvalidArguments(format!(
                "unknown collection `{}` (use `expenses` or `savings`)",
                other
            ))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookKind::Expenses => "expenses",
            BookKind::Savings => "savings",
        }
    }
}

/// A record collection with its own refresh schedule.
pub struct RecordBook {
    pub service: Records,
    pub schedule: RefreshSchedule,
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub config: Config,
    pub store: JsonStore,
    pub expenses: RecordBook,
    pub savings: RecordBook,
    pub income: IncomeService<JsonRepository<MonthlyIncomeSummary>>,
    pub deductions: DeductionService<JsonRepository<TaxDeduction>>,
    pub sources: IncomeSourceService<JsonRepository<IncomeSource>>,
    pub holdings: HoldingService<JsonRepository<Holding>>,
    pub reminders: ReminderLog,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let manager = ConfigManager::new()?;
        let config = manager.load()?;
        let store = JsonStore::open(manager.data_dir(&config))?;
        debug!(root = %store.root().display(), "opened data directory");

        let open_book = |repository| -> Result<RecordBook, CliError> {
            Ok(RecordBook {
                service: RecordService::open(repository, SystemClock, config.record_settings())?,
                schedule: RefreshSchedule::every(config.refresh_interval()?),
            })
        };
        let expenses = open_book(store.expenses())?;
        let savings = open_book(store.savings_entries())?;

        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            theme: ColorfulTheme::default(),
            income: IncomeService::open(store.income_summaries())?,
            deductions: DeductionService::open(store.tax_deductions())?,
            sources: IncomeSourceService::open(store.income_sources())?,
            holdings: HoldingService::open(store.holdings())?,
            reminders: store.load_reminder_log()?,
            config,
            store,
            expenses,
            savings,
            last_command: None,
            running: true,
        })
    }

    pub fn book(&self, kind: BookKind) -> &RecordBook {
        match kind {
            BookKind::Expenses => &self.expenses,
            BookKind::Savings => &self.savings,
        }
    }

    pub fn book_mut(&mut self, kind: BookKind) -> &mut RecordBook {
        match kind {
            BookKind::Expenses => &mut self.expenses,
            BookKind::Savings => &mut self.savings,
        }
    }

    pub fn today(&self) -> NaiveDate {
        SystemClock.today()
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        "finance> ".to_string()
    }

    /// Forgets reminders for records that no longer exist, then saves the log.
    pub(crate) fn save_reminders(&mut self) -> Result<(), CommandError> {
        self.reminders.retain_known(
            self.expenses
                .service
                .records()
                .iter()
                .chain(self.savings.service.records()),
        );
        self.store.save_reminder_log(&self.reminders)?;
        Ok(())
    }

    /// Runs the refresh of every collection whose schedule is due.
    pub(crate) fn run_scheduled_refresh(&mut self) -> Result<(), CommandError> {
        let now = SystemClock.now();
        for kind in BookKind::ALL {
            let book = self.book_mut(kind);
            let report = book.schedule.run_if_due(now, &mut book.service)?;
            if let Some(report) = report.filter(|r| r.instances_added > 0) {
                report_refresh(kind, &report);
            }
        }
        Ok(())
    }

    /// Picks the mutation scope for `id`: explicit flags win, standalone
    /// records are always single-instance, and only the interactive shell
    /// asks about multi-instance series.
    pub(crate) fn choose_scope(
        &self,
        kind: BookKind,
        id: &RecordId,
        args: &ParsedArgs<'_>,
    ) -> Result<MutationScope, CommandError> {
        if args.switch("series") {
            return Ok(MutationScope::Series);
        }
        if args.switch("instance") {
            return Ok(MutationScope::Instance);
        }
        if !self.book(kind).service.is_part_of_series(id)? || self.mode == CliMode::Script {
            return Ok(MutationScope::Instance);
        }
        let whole = Confirm::with_theme(&self.theme)
            .with_prompt("Apply to every instance in this series?")
            .default(false)
            .interact()?;
        Ok(if whole {
            MutationScope::Series
        } else {
            MutationScope::Instance
        })
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|entry| entry.handler) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, input), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()
            .map_err(|err| CliError::Command(err.to_string()))
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Service(ServiceError::NotFound(id)) => {
                output::error(format!("No record with id `{}`.", id));
                output::hint("Use `list <expenses|savings>` to see record ids.");
                Ok(())
            }
            CommandError::Io(err) => Err(err.into()),
            other => {
                output::error(other.to_string());
                Ok(())
            }
        }
    }
}

pub(crate) fn report_refresh(kind: BookKind, report: &RefreshReport) {
    if report.instances_added == 0 {
        output::info(format!(
            "Checked {} recurring series in {}; nothing to extend.",
            report.series_checked,
            kind.label()
        ));
    } else {
        output::success(format!(
            "Generated {} new instance(s) across {} series in {}.",
            report.instances_added,
            report.series_extended,
            kind.label()
        ));
    }
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

pub(crate) fn parse_amount(input: &str) -> Result<f64, CommandError> {
    input
        .parse::<f64>()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid amount `{}`", input)))
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Calculator(#[from] CalculatorError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("exit requested")]
    ExitRequested,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Command(String),
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}
