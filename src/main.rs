mod adb_device;
mod component;
mod component_registry;
mod console;
mod device;
mod discovery;
mod dispatch;
mod error;
#[cfg(test)]
mod fake_device;
mod intent_fuzzer;
mod ipc_kind;
mod package_dump;
mod util;

use std::{
    env,
    io::{self, BufRead, Write},
    time::Duration,
};

use adb_device::AdbDevice;
use anyhow::Context;
use clap::{Parser, Subcommand};
use component::ComponentRef;
use device::Device;
use intent_fuzzer::{Command, Feedback, IntentFuzzer};
use ipc_kind::IpcKind;
use serde::Serialize;

/// Fires empty intents at the exported components of an Android device or
/// emulator through adb.
#[derive(Parser, Debug)]
#[command(version, about)]
struct CommandLineArgs {
    /// The adb command used to query and send intents to the device, can
    /// also be set with the `ADB_COMMAND` environment variable
    #[arg(short, long, default_value = "adb")]
    adb_command: String,

    /// Serial of the device to use when more than one is attached
    #[arg(short, long)]
    serial: Option<String>,

    /// The kind of components to target
    #[arg(short, long, default_value = "broadcasts")]
    kind: IpcKind,

    /// Only target components of system packages
    #[arg(long, default_value = "false")]
    system_only: bool,

    /// Seconds to wait for a single delivery before giving up on it
    #[arg(long, default_value = "20")]
    timeout: u64,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// List the targets of the selected kind
    List {
        /// Print every discovered component as JSON, duplicates included
        #[arg(long, default_value = "false")]
        json: bool,
    },
    /// Send a null intent to a single target, given by its class name
    Fuzz { class: String },
    /// Send a null intent to every target of the selected kind
    FuzzAll,
    /// Interactive console (the default)
    Console,
}

#[derive(Serialize)]
struct Listing<'a> {
    kind: IpcKind,
    system_only: bool,
    collisions: usize,
    components: &'a [ComponentRef],
}

fn main() {
    env_logger::init();

    let mut args = CommandLineArgs::parse();

    // Set ADB_COMMAND from environment if present.
    if let Ok(command) = env::var("ADB_COMMAND") {
        args.adb_command = command;
    }

    match run(args) {
        Ok(true) => {}
        // A single-target delivery failed
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(1);
        }
    }
}

fn run(args: CommandLineArgs) -> anyhow::Result<bool> {
    // Adb device to send intents to.
    let adb_device = AdbDevice::new(
        &args.adb_command,
        args.serial.as_deref(),
        Duration::from_secs(args.timeout),
    );

    let (mut fuzzer, startup) = IntentFuzzer::new(adb_device, args.kind, args.system_only);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();

    run_action(
        &mut fuzzer,
        &startup,
        args.action.unwrap_or(Action::Console),
        stdin.lock(),
        &mut stdout.lock(),
        &mut stderr.lock(),
    )
}

/// Runs one subcommand. Returns false when `fuzz` could not deliver.
fn run_action<D: Device, R: BufRead, W: Write, E: Write>(
    fuzzer: &mut IntentFuzzer<D>,
    startup: &[Feedback],
    action: Action,
    input: R,
    out: &mut W,
    err: &mut E,
) -> anyhow::Result<bool> {
    // Discovery notices go to stderr, stdout may be parsed
    console::print_feedback(err, startup)?;

    match action {
        Action::List { json: true } => {
            let state = fuzzer.state();
            let listing = Listing {
                kind: state.kind,
                system_only: state.system_only,
                collisions: state.registry.collisions(),
                components: state.registry.components(),
            };
            serde_json::to_writer_pretty(&mut *out, &listing)
                .context("Failed to write the listing")?;
            writeln!(out)?;
        }
        Action::List { json: false } => console::print_targets(out, fuzzer)?,
        Action::Fuzz { class } => {
            let (feedback, delivered) = fuzzer.fuzz_class(&class);
            console::print_feedback(out, &feedback)?;
            return Ok(delivered);
        }
        Action::FuzzAll => {
            let feedback = fuzzer.handle(Command::FuzzAll);
            console::print_feedback(out, &feedback)?;
        }
        Action::Console => console::run(fuzzer, input, out)?,
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_device::FakeDevice;

    fn run_with(device: FakeDevice, action: Action) -> (bool, String, String) {
        let (mut fuzzer, startup) = IntentFuzzer::new(device, IpcKind::Broadcast, false);
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let delivered =
            run_action(&mut fuzzer, &startup, action, io::empty(), &mut out, &mut err).unwrap();
        (
            delivered,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn json_listing_keeps_notices_off_stdout() {
        let device = FakeDevice::new()
            .package("com.a", false, &["shared.R"])
            .package("com.b", false, &["shared.R"]);

        let (_, out, err) = run_with(device, Action::List { json: true });

        let listing: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(listing["kind"], "Broadcast");
        assert_eq!(listing["collisions"], 1);
        assert_eq!(listing["components"].as_array().map(Vec::len), Some(2));
        assert_eq!(listing["components"][1]["package"], "com.b");
        assert_eq!(err, "! 1 duplicate component names hidden\n");
    }

    #[test]
    fn fuzz_reports_unknown_class_as_failure() {
        let device = FakeDevice::new().package("com.a", false, &["com.a.R"]);

        let (delivered, out, _) = run_with(
            device,
            Action::Fuzz {
                class: "com.a.Gone".to_owned(),
            },
        );
        assert!(!delivered);
        assert_eq!(out, "Failed: com.a.Gone: no such component\n");
    }

    #[test]
    fn fuzz_delivers_to_a_known_class() {
        let device = FakeDevice::new().package("com.a", false, &["com.a.R"]);

        let (delivered, out, err) = run_with(
            device,
            Action::Fuzz {
                class: "com.a.R".to_owned(),
            },
        );
        assert!(delivered);
        assert_eq!(out, "Sent: Intent { cmp=com.a/.R }\n");
        assert!(err.is_empty());
    }

    #[test]
    fn parses_defaults() {
        let args = CommandLineArgs::try_parse_from(["null-intent-fuzzer"]).unwrap();
        assert_eq!(args.adb_command, "adb");
        assert_eq!(args.kind, IpcKind::Broadcast);
        assert!(!args.system_only);
        assert_eq!(args.timeout, 20);
        assert!(args.action.is_none());
    }

    #[test]
    fn parses_kind_filter_and_subcommand() {
        let args = CommandLineArgs::try_parse_from([
            "null-intent-fuzzer",
            "-s",
            "emulator-5554",
            "--kind",
            "Services",
            "--system-only",
            "fuzz",
            "com.android.phone.TelephonyDebugService",
        ])
        .unwrap();

        assert_eq!(args.serial.as_deref(), Some("emulator-5554"));
        assert_eq!(args.kind, IpcKind::Service);
        assert!(args.system_only);
        assert!(matches!(
            args.action,
            Some(Action::Fuzz { class }) if class == "com.android.phone.TelephonyDebugService"
        ));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(CommandLineArgs::try_parse_from(["null-intent-fuzzer", "-k", "widgets"]).is_err());
    }
}
