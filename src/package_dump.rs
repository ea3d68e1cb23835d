//! Parsers for the package manager output read over adb.
//!
//! The formats handled here are the human-readable outputs of
//! `pm list packages`, `pm list instrumentation` and
//! `dumpsys package resolvers|providers`. They are not stable interfaces, so
//! every parser skips lines it does not understand instead of failing.

use crate::{component::ComponentRef, ipc_kind::IpcKind};

/// Parses `pm list packages` output (`package:com.example.app` lines).
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parses `pm list instrumentation` output, e.g.
/// `instrumentation:com.example.test/androidx.test.runner.AndroidJUnitRunner (target=com.example)`
pub fn parse_instrumentation_list(output: &str) -> Vec<ComponentRef> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("instrumentation:"))
        .filter_map(|rest| rest.split_whitespace().next())
        .filter_map(ComponentRef::from_flattened)
        .collect()
}

/// The top level `dumpsys package` section listing components of `kind`.
fn section_header(kind: IpcKind) -> Option<&'static str> {
    match kind {
        IpcKind::Activity => Some("Activity Resolver Table:"),
        IpcKind::Broadcast => Some("Receiver Resolver Table:"),
        IpcKind::Service => Some("Service Resolver Table:"),
        IpcKind::Provider => Some("Registered ContentProviders:"),
        IpcKind::Instrumentation => None,
    }
}

/// Extracts the components of `kind` from `dumpsys package` output.
///
/// Resolver tables list a component once per matching action, scheme or
/// type; the result holds each component once, in order of first
/// appearance.
pub fn parse_declared_components(dump: &str, kind: IpcKind) -> Vec<ComponentRef> {
    let Some(header) = section_header(kind) else {
        return Vec::new();
    };

    let mut components: Vec<ComponentRef> = Vec::new();
    let mut in_section = false;

    for line in dump.lines() {
        // Sections start at column 0, their content is indented.
        if !line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
            in_section = line.trim_end() == header;
            continue;
        }
        if !in_section {
            continue;
        }

        let found = match kind {
            IpcKind::Provider => provider_entry(line),
            _ => resolver_entry(line),
        };

        if let Some(component) = found {
            if !components.contains(&component) {
                components.push(component);
            }
        }
    }

    components
}

/// `        5c5a6d1 com.example/.MainActivity filter 1f2e3a`
fn resolver_entry(line: &str) -> Option<ComponentRef> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens
        .windows(2)
        .find(|pair| pair[1] == "filter" && pair[0].contains('/'))
        .and_then(|pair| ComponentRef::from_flattened(pair[0]))
}

/// `  com.example/.DataProvider:`
fn provider_entry(line: &str) -> Option<ComponentRef> {
    let name = line.trim().strip_suffix(':')?;
    if name.contains(char::is_whitespace) {
        return None;
    }
    ComponentRef::from_flattened(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOLVERS: &str = "\
Activity Resolver Table:
  Non-Data Actions:
      android.intent.action.MAIN:
        5c5a6d1 com.example.app/.MainActivity filter 1f2e3a
          Action: \"android.intent.action.MAIN\"

Receiver Resolver Table:
  Non-Data Actions:
      android.intent.action.BOOT_COMPLETED:
        a1b2c3 com.example.app/.BootReceiver filter d4e5f6
        b2c3d4 com.android.phone/com.android.phone.Boot$Receiver filter e5f6a7
      com.example.app.PING:
        a1b2c3 com.example.app/.BootReceiver filter 0a0b0c
  MIME Typed Actions:
      text/plain:
        c3d4e5 com.example.app/.ShareReceiver filter f6a7b8

Service Resolver Table:
  Non-Data Actions:
      com.example.app.SYNC:
        e5f6a7 com.example.app/.SyncService filter a7b8c9
";

    const PROVIDERS: &str = "\
Registered ContentProviders:
  com.example.app/.DataProvider:
    Provider{9abc com.example.app/.DataProvider}
  com.android.providers.settings/.SettingsProvider:
    Provider{1234 com.android.providers.settings/.SettingsProvider}

ContentProvider Authorities:
  [com.example.app.data]:
    Provider{9abc com.example.app/.DataProvider}
      applicationInfo=ApplicationInfo{5678 com.example.app}
";

    #[test]
    fn parses_package_list() {
        let output = "package:android\npackage:com.example.app\n\nWARNING: linker\n";
        assert_eq!(parse_package_list(output), vec!["android", "com.example.app"]);
    }

    #[test]
    fn parses_instrumentation_list() {
        let output = "instrumentation:com.example.test/androidx.test.runner.AndroidJUnitRunner (target=com.example)\n";
        assert_eq!(
            parse_instrumentation_list(output),
            vec![ComponentRef::new(
                "com.example.test",
                "androidx.test.runner.AndroidJUnitRunner"
            )]
        );
    }

    #[test]
    fn reads_only_the_requested_resolver_table() {
        let receivers = parse_declared_components(RESOLVERS, IpcKind::Broadcast);
        assert_eq!(
            receivers,
            vec![
                ComponentRef::new("com.example.app", "com.example.app.BootReceiver"),
                ComponentRef::new("com.android.phone", "com.android.phone.Boot$Receiver"),
                ComponentRef::new("com.example.app", "com.example.app.ShareReceiver"),
            ]
        );

        let services = parse_declared_components(RESOLVERS, IpcKind::Service);
        assert_eq!(
            services,
            vec![ComponentRef::new("com.example.app", "com.example.app.SyncService")]
        );

        let activities = parse_declared_components(RESOLVERS, IpcKind::Activity);
        assert_eq!(activities.len(), 1);
    }

    #[test]
    fn reads_registered_providers_only() {
        let providers = parse_declared_components(PROVIDERS, IpcKind::Provider);
        assert_eq!(
            providers,
            vec![
                ComponentRef::new("com.example.app", "com.example.app.DataProvider"),
                ComponentRef::new(
                    "com.android.providers.settings",
                    "com.android.providers.settings.SettingsProvider"
                ),
            ]
        );
    }

    #[test]
    fn missing_section_yields_nothing() {
        assert!(parse_declared_components(PROVIDERS, IpcKind::Service).is_empty());
        assert!(parse_declared_components(RESOLVERS, IpcKind::Instrumentation).is_empty());
    }
}
