use strsim::levenshtein;

use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// Largest edit distance still offered as a "did you mean" suggestion.
const SUGGESTION_DISTANCE: usize = 3;

pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    /// Words accepted as the first argument, offered by tab completion.
    pub subcommands: &'static [&'static str],
    pub handler: CommandHandler,
}

impl CommandEntry {
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
            subcommands: &[],
            handler,
        }
    }

    pub const fn with_subcommands(mut self, subcommands: &'static [&'static str]) -> Self {
        self.subcommands = subcommands;
        self
    }
}

/// Shell commands in registration order, which is also the help order.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, replacing an earlier command of the same name in place.
    pub fn register(&mut self, entry: CommandEntry) {
        match self.entries.iter_mut().find(|known| known.name == entry.name) {
            Some(known) => *known = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn list(&self) -> impl Iterator<Item = &CommandEntry> + '_ {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.get(name).map(|entry| entry.handler)
    }

    /// Closest command name to a mistyped `input`, if any is near enough.
    pub fn closest(&self, input: &str) -> Option<&'static str> {
        let needle = input.to_lowercase();
        self.names()
            .map(|name| (levenshtein(name, &needle), name))
            .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }

    /// Words completable after each command. `help` takes command names.
    pub fn completion_words(&self) -> Vec<(&'static str, Vec<&'static str>)> {
        self.entries
            .iter()
            .map(|entry| {
                let words = if entry.name == "help" {
                    self.names().filter(|name| *name != "help").collect()
                } else {
                    entry.subcommands.to_vec()
                };
                (entry.name, words)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut ShellContext, _: &[&str]) -> CommandResult {
        Ok(())
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(CommandEntry::new("help", "Help", "help [command]", noop));
        registry.register(
            CommandEntry::new("budget", "Budgets", "budget list | show <id>", noop)
                .with_subcommands(&["list", "show"]),
        );
        registry.register(CommandEntry::new("dashboard", "Overview", "dashboard", noop));
        registry
    }

    #[test]
    fn keeps_registration_order_and_replaces_in_place() {
        let mut registry = registry();
        registry.register(CommandEntry::new("budget", "Budgets v2", "budget", noop));
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["help", "budget", "dashboard"]);
        assert_eq!(registry.get("budget").map(|entry| entry.description), Some("Budgets v2"));
    }

    #[test]
    fn suggests_only_close_names() {
        let registry = registry();
        assert_eq!(registry.closest("BUDGTE"), Some("budget"));
        assert_eq!(registry.closest("transfer"), None);
    }

    #[test]
    fn help_completes_with_other_commands() {
        let words = registry().completion_words();
        assert_eq!(words[0], ("help", vec!["budget", "dashboard"]));
        assert_eq!(words[1], ("budget", vec!["list", "show"]));
        assert!(words[2].1.is_empty());
    }
}
