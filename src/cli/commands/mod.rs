use std::collections::{HashMap, HashSet};

pub mod income;
pub mod investments;
pub mod records;
pub mod reports;
pub mod system;

use crate::cli::core::{CommandError, CommandResult, ShellContext};

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(records::definitions());
    commands.extend(reports::definitions());
    commands.extend(income::definitions());
    commands.extend(investments::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

/// Positional arguments plus `--switch` and `--option value` flags.
#[derive(Debug, Default)]
pub struct ParsedArgs<'a> {
    positional: Vec<&'a str>,
    switches: HashSet<&'a str>,
    options: HashMap<&'a str, &'a str>,
}

impl<'a> ParsedArgs<'a> {
    /// Splits `args`; flags named in `value_flags` consume the next token.
    pub fn parse(args: &[&'a str], value_flags: &[&str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut tokens = args.iter().copied();
        while let Some(token) = tokens.next() {
            let Some(name) = token.strip_prefix("--") else {
                parsed.positional.push(token);
                continue;
            };
            if value_flags.contains(&name) {
                let value = tokens.next().ok_or_else(|| {
                    CommandError::InvalidArguments(format!("`--{}` expects a value", name))
                })?;
                parsed.options.insert(name, value);
            } else {
                parsed.switches.insert(name);
            }
        }
        Ok(parsed)
    }

    pub fn switch(&self, name: &str) -> bool {
        self.switches.contains(name)
    }

    pub fn option(&self, name: &str) -> Option<&'a str> {
        self.options.get(name).copied()
    }

    pub fn positional(&self, index: usize) -> Option<&'a str> {
        self.positional.get(index).copied()
    }

    pub fn positionals(&self) -> &[&'a str] {
        &self.positional
    }

    /// The positional at `index`, or a usage error naming `usage`.
    pub fn require(&self, index: usize, usage: &str) -> Result<&'a str, CommandError> {
        self.positional(index)
            .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {}", usage)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_switches_options_and_positionals() {
        let args = ["expenses", "2024-01-15", "--monthly", "--until", "2024-06-15", "9.99"];
        let parsed = ParsedArgs::parse(&args, &["until"]).unwrap();
        assert_eq!(parsed.positionals(), ["expenses", "2024-01-15", "9.99"]);
        assert!(parsed.switch("monthly"));
        assert_eq!(parsed.option("until"), Some("2024-06-15"));
        assert!(parsed.require(3, "add ...").is_err());
    }

    #[test]
    fn option_without_value_is_rejected() {
        let err = ParsedArgs::parse(&["--until"], &["until"]).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments(_)));
    }

    #[test]
    fn registry_keeps_definition_order() {
        let registry = CommandRegistry::new(all_definitions());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"help"));
        assert!(names.contains(&"refresh"));
        assert_eq!(registry.iter().count(), names.len());
    }
}
