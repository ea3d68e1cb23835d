//! Interactive console driving an [IntentFuzzer].
//!
//! Every input line is parsed with clap in multicall mode, so the first word
//! is the command, e.g. `kind services` or `select 3`.

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};

use crate::{
    device::Device,
    intent_fuzzer::{Command, Feedback, IntentFuzzer},
    ipc_kind::IpcKind,
};

#[derive(Parser, Debug)]
#[command(multicall = true)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ConsoleCommand {
    /// Switch the IPC kind (activities, broadcasts, providers, services,
    /// instrumentations)
    Kind { kind: IpcKind },
    /// Toggle the system-packages-only filter
    System,
    /// Select a target by class name or by its number in `show`
    Select { target: String },
    /// Send a null intent to the selected target
    Fuzz,
    /// Send a null intent to every target of the current kind
    FuzzAll,
    /// Discover the targets again
    Refresh,
    /// Show the targets of the current kind
    Show,
    /// Print the output log
    Log,
    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

/// What a console line asks for.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Fuzzer(Command),
    Show,
    Log,
    Quit,
}

/// Parses one console line against the current display list.
fn parse_line(line: &str, display_list: &[String]) -> Result<Option<Action>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    let parsed = ConsoleLine::try_parse_from(words).map_err(|err| err.to_string())?;

    let action = match parsed.command {
        ConsoleCommand::Kind { kind } => Action::Fuzzer(Command::ChangeKind(kind)),
        ConsoleCommand::System => Action::Fuzzer(Command::ToggleFilter),
        ConsoleCommand::Select { target } => {
            // Numbers refer to the entries printed by `show`
            let class = match target.parse::<usize>() {
                Ok(number) => display_list
                    .get(number.wrapping_sub(1))
                    .cloned()
                    .ok_or_else(|| format!("No target number {}", number))?,
                Err(_) => target,
            };
            Action::Fuzzer(Command::SelectTarget(class))
        }
        ConsoleCommand::Fuzz => Action::Fuzzer(Command::FuzzSingle),
        ConsoleCommand::FuzzAll => Action::Fuzzer(Command::FuzzAll),
        ConsoleCommand::Refresh => Action::Fuzzer(Command::Refresh),
        ConsoleCommand::Show => Action::Show,
        ConsoleCommand::Log => Action::Log,
        ConsoleCommand::Quit => Action::Quit,
    };

    Ok(Some(action))
}

/// Writes the feedback of a command: notices marked with `!`, log lines as is.
pub fn print_feedback<W: Write>(out: &mut W, feedback: &[Feedback]) -> io::Result<()> {
    for item in feedback {
        match item {
            Feedback::Notice(text) => writeln!(out, "! {}", text)?,
            Feedback::Log(line) => writeln!(out, "{}", line)?,
        }
    }
    Ok(())
}

/// Writes the numbered display list with the selection marked.
pub fn print_targets<D: Device, W: Write>(out: &mut W, fuzzer: &IntentFuzzer<D>) -> io::Result<()> {
    let state = fuzzer.state();
    writeln!(
        out,
        "{} ({} packages{}):",
        state.kind,
        if state.system_only { "system" } else { "all" },
        if state.registry.is_empty() {
            ", none found"
        } else {
            ""
        }
    )?;

    for (index, class) in state.display_list.iter().enumerate() {
        let marker = if state.selected.as_deref() == Some(class.as_str()) {
            '*'
        } else {
            ' '
        };
        writeln!(out, "{} {:>4}  {}", marker, index + 1, class)?;
    }
    Ok(())
}

fn prompt<W: Write>(out: &mut W, kind: IpcKind) -> io::Result<()> {
    write!(out, "{}> ", kind.label().to_lowercase())?;
    out.flush()
}

/// Reads commands until `quit` or end of input.
pub fn run<D: Device, R: BufRead, W: Write>(
    fuzzer: &mut IntentFuzzer<D>,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    print_targets(out, fuzzer)?;
    prompt(out, fuzzer.state().kind)?;

    for line in input.lines() {
        let line = line?;

        match parse_line(&line, &fuzzer.state().display_list) {
            Ok(None) => {}
            Ok(Some(Action::Quit)) => return Ok(()),
            Ok(Some(Action::Show)) => print_targets(out, fuzzer)?,
            Ok(Some(Action::Log)) => {
                for entry in fuzzer.log() {
                    writeln!(out, "{}", entry)?;
                }
            }
            Ok(Some(Action::Fuzzer(command))) => {
                let relists = matches!(
                    command,
                    Command::ChangeKind(_) | Command::ToggleFilter | Command::Refresh
                );
                let feedback = fuzzer.handle(command);
                print_feedback(out, &feedback)?;
                if relists {
                    print_targets(out, fuzzer)?;
                }
            }
            Err(message) => writeln!(out, "{}", message.trim_end())?,
        }

        prompt(out, fuzzer.state().kind)?;
    }

    Ok(())
}
