use std::{
    borrow::Cow,
    fmt,
    io::{self, BufRead},
};

use colored::Colorize;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandRegistry;
use crate::utils::build_info;

/// Set to run commands from stdin without prompts or colours.
pub const SCRIPT_ENV: &str = "EXPENSE_TRACKER_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    if mode == CliMode::Script {
        output::disable_colors();
    }

    let mut context = ShellContext::new(mode)?;
    if mode == CliMode::Interactive {
        greet(&context);
    }
    context.refresh_alerts_quietly();

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn greet(context: &ShellContext) {
    output::section(format!("Expense Tracker {}", build_info::APP_VERSION));
    output::hint("Type `help` for commands, `exit` to quit.");
    if !context.settings.onboarding_completed {
        output::hint("New here? Run `onboarding` to pick your currency and week start.");
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    let helper = CommandHelper::new(&context.registry);
    editor.set_helper(Some(helper));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    loop {
        if !context.running {
            break;
        }
        let prompt = context.prompt();
        let line = editor.readline(&prompt);

        match line {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                editor.add_history_entry(trimmed).ok();

                match handle_line(context, trimmed) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err)?,
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(&err.message);
            return Ok(LoopControl::Continue);
        }
    };

    if tokens.is_empty() {
        return Ok(LoopControl::Continue);
    }

    let raw = &tokens[0];
    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    context.last_command = Some(line.trim().to_string());

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        other => other,
    }
}

/// Tab completion for command names, then for the first argument of the
/// command typed so far. Hints list a command's subcommands.
struct CommandHelper {
    commands: Vec<(&'static str, Vec<&'static str>)>,
}

impl CommandHelper {
    fn new(registry: &CommandRegistry) -> Self {
        Self {
            commands: registry.completion_words(),
        }
    }

    fn words_after(&self, command: &str) -> Option<&[&'static str]> {
        let command = command.to_ascii_lowercase();
        self.commands
            .iter()
            .find(|(name, _)| *name == command)
            .map(|(_, words)| words.as_slice())
    }

    fn candidates(&self, preceding: &[&str]) -> Vec<&'static str> {
        match preceding {
            [] => self.commands.iter().map(|(name, _)| *name).collect(),
            [command] => self.words_after(command).unwrap_or_default().to_vec(),
            _ => Vec::new(),
        }
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let preceding: Vec<&str> = prefix[..start].split_whitespace().collect();
        let needle = prefix[start..].to_ascii_lowercase();

        let matches = self
            .candidates(&preceding)
            .into_iter()
            .filter(|word| word.starts_with(&needle))
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();
        Ok((start, matches))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos < line.len() || !line.ends_with(' ') {
            return None;
        }
        let mut tokens = line.split_whitespace();
        let command = tokens.next()?;
        if tokens.next().is_some() || command.eq_ignore_ascii_case("help") {
            return None;
        }
        let words = self.words_after(command)?;
        (!words.is_empty()).then(|| format!("<{}>", words.join("|")))
    }
}

impl Highlighter for CommandHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for CommandHelper {}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn helper() -> CommandHelper {
        let mut registry = CommandRegistry::new();
        for entry in commands::all_definitions() {
            registry.register(entry);
        }
        CommandHelper::new(&registry)
    }

    fn complete(helper: &CommandHelper, line: &str) -> (usize, Vec<String>) {
        let history = DefaultHistory::new();
        let ctx = ReadlineContext::new(&history);
        let (start, pairs) = helper.complete(line, line.len(), &ctx).unwrap();
        (start, pairs.into_iter().map(|pair| pair.replacement).collect())
    }

    #[test]
    fn completes_commands_then_subcommands() {
        let helper = helper();
        assert_eq!(complete(&helper, "bu"), (0, vec!["budget".to_string()]));
        assert_eq!(
            complete(&helper, "budget a"),
            (7, vec!["add".to_string(), "alerts".to_string()])
        );
        assert_eq!(complete(&helper, "BUDGET su").1, ["summary"]);
        assert_eq!(complete(&helper, "help tra").1, ["transaction"]);
        assert!(complete(&helper, "budget show 1").1.is_empty());
        assert!(complete(&helper, "dashboard ").1.is_empty());
    }

    #[test]
    fn hints_list_subcommands_after_the_command() {
        let helper = helper();
        let history = DefaultHistory::new();
        let ctx = ReadlineContext::new(&history);
        assert_eq!(
            helper.hint("settings ", 9, &ctx).as_deref(),
            Some("<show|set>")
        );
        assert_eq!(helper.hint("settings", 8, &ctx), None);
        assert_eq!(helper.hint("help ", 5, &ctx), None);
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line("category add name=\"Food & Dining\"").unwrap();
        assert_eq!(tokens, ["category", "add", "name=Food & Dining"]);
        assert!(parse_command_line("budget add name=\"open").is_err());
    }
}
