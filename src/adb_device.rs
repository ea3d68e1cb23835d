//! ADB device representing an Android device or emulator.
//!
//! This contains the [Device] implementation that enumerates components with
//! `pm`/`dumpsys` and delivers null intents with `am`.

use std::{
    collections::{HashMap, HashSet},
    io::Read,
    process::Command,
    time::Duration,
};

use log::{debug, info, warn};
use subprocess::{Popen, PopenConfig, Redirection};

use crate::{
    component::{ComponentRef, PackageRecord},
    device::Device,
    error::{DeliveryError, DeviceError},
    ipc_kind::IpcKind,
    package_dump::{parse_declared_components, parse_instrumentation_list, parse_package_list},
    util::shell_quote,
};

/// Output of a shell command that ran to completion.
#[derive(Debug)]
struct ShellOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

#[derive(Clone, Debug)]
pub struct AdbDevice {
    adb_command: String,
    serial: Option<String>,
    timeout: Duration,
}

impl AdbDevice {
    pub fn new(adb_command: &str, serial: Option<&str>, timeout: Duration) -> Self {
        Self {
            adb_command: adb_command.to_owned(),
            serial: serial.map(str::to_owned),
            timeout,
        }
    }

    /// `adb [-s serial] shell <command>`
    fn shell_argv(&self, command: &str) -> Vec<String> {
        let mut argv = vec![self.adb_command.clone()];
        if let Some(serial) = &self.serial {
            argv.push("-s".to_owned());
            argv.push(serial.clone());
        }
        argv.push("shell".to_owned());
        argv.push(command.to_owned());
        argv
    }

    /// Runs a command on the device and returns the stdout.
    fn run_command(&self, command: &str) -> Result<String, DeviceError> {
        let argv = self.shell_argv(command);
        info!("Running command: {:?}", argv);
        let output = Command::new(&argv[0]).args(&argv[1..]).output()?;

        let stdout = String::from_utf8(output.stdout)?;

        // Check the exit code
        if !output.status.success() {
            return Err(DeviceError::CommandFailed {
                command: command.to_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(stdout)
    }

    /// Runs a command on the device, killing it after the configured timeout.
    fn run_command_timeout(&self, command: &str) -> Result<ShellOutput, DeviceError> {
        let argv = self.shell_argv(command);
        info!("Running command: {:?}", argv);

        let mut p = Popen::create(
            argv.as_slice(),
            PopenConfig {
                stdout: Redirection::Pipe,
                stderr: Redirection::Pipe,
                ..Default::default()
            },
        )?;

        // Wait for the command to finish
        let status = match p.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                warn!("Command timed out: {}", command);
                if let Err(err) = p.kill() {
                    warn!("Failed to kill command: {}", err);
                }
                p.wait()?;
                return Err(DeviceError::TimedOut {
                    command: command.to_owned(),
                    timeout: self.timeout,
                });
            }
        };

        // Capture stdout
        let mut stdout = String::new();
        if let Some(mut pipe) = p.stdout.take() {
            pipe.read_to_string(&mut stdout)?;
        }

        // Capture stderr
        let mut stderr = String::new();
        if let Some(mut pipe) = p.stderr.take() {
            pipe.read_to_string(&mut stderr)?;
        }

        debug!("Exit status: {:?}", status);
        debug!("Stdout: {}", stdout);
        debug!("Stderr: {}", stderr);

        Ok(ShellOutput {
            success: status.success(),
            stdout,
            stderr,
        })
    }

    /// The command listing the components of `kind` for all packages.
    fn component_listing_command(kind: IpcKind) -> &'static str {
        match kind {
            IpcKind::Activity => "dumpsys package resolvers activity",
            IpcKind::Broadcast => "dumpsys package resolvers receiver",
            IpcKind::Service => "dumpsys package resolvers service",
            IpcKind::Provider => "dumpsys package providers",
            IpcKind::Instrumentation => "pm list instrumentation",
        }
    }

    fn declared_components(&self, kind: IpcKind) -> Result<Vec<ComponentRef>, DeviceError> {
        let output = self.run_command(Self::component_listing_command(kind))?;
        Ok(match kind {
            IpcKind::Instrumentation => parse_instrumentation_list(&output),
            _ => parse_declared_components(&output, kind),
        })
    }
}

impl Device for AdbDevice {
    fn list_packages(&self, kind: IpcKind) -> Result<Vec<PackageRecord>, DeviceError> {
        let packages = parse_package_list(&self.run_command("pm list packages")?);
        let system: HashSet<String> =
            parse_package_list(&self.run_command("pm list packages -s")?)
                .into_iter()
                .collect();

        // Group the components by their declaring package
        let mut by_package: HashMap<String, Vec<String>> = HashMap::new();
        for component in self.declared_components(kind)? {
            by_package
                .entry(component.package)
                .or_default()
                .push(component.class);
        }

        let records = packages
            .into_iter()
            .map(|name| PackageRecord {
                system: system.contains(&name),
                components: by_package.remove(&name).unwrap_or_default(),
                name,
            })
            .collect();

        // Whatever is left belongs to packages pm did not report
        for package in by_package.keys() {
            debug!("Ignoring components of unlisted package {}", package);
        }

        Ok(records)
    }

    fn deliver(&self, kind: IpcKind, target: &ComponentRef) -> Result<(), DeliveryError> {
        let Some(am_command) = kind.am_command() else {
            return Err(DeliveryError::Unsupported(kind));
        };

        let command = match kind {
            // Instrumentation takes the component as a positional argument
            IpcKind::Instrumentation => {
                format!("am {} {}", am_command, shell_quote(&target.flatten()))
            }
            _ => format!("am {} -n {}", am_command, shell_quote(&target.flatten())),
        };

        let output = self.run_command_timeout(&command)?;

        check_am_output(kind, &output)
    }
}

/// Decides from the output of `am` whether the intent was accepted.
fn check_am_output(kind: IpcKind, output: &ShellOutput) -> Result<(), DeliveryError> {
    // adb itself failed, nothing was submitted
    if !output.success {
        let reason = first_line(&output.stderr)
            .or_else(|| first_line(&output.stdout))
            .unwrap_or("adb exited with a failure status");
        return Err(DeliveryError::Rejected {
            reason: reason.to_owned(),
        });
    }

    let combined = format!("{}\n{}", output.stderr, output.stdout);

    if combined.contains("intent has been delivered to currently running top-most instance") {
        return Ok(());
    }

    // Broadcasts are only enqueued, there is nothing to fail after that
    if kind == IpcKind::Broadcast {
        return Ok(());
    }

    match combined.lines().map(str::trim).find(|line| is_failure_line(line)) {
        Some(line) => Err(DeliveryError::Rejected {
            reason: line.to_owned(),
        }),
        None => Ok(()),
    }
}

fn is_failure_line(line: &str) -> bool {
    line.starts_with("Error")
        || line.contains("Exception")
        || line.contains("INSTRUMENTATION_FAILED")
        || line.contains("Permission Denial")
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}
