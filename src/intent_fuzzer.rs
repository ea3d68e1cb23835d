//! The controller tying discovery, selection and dispatch together.
//!
//! User actions arrive as [Command]s and are handled to completion on the
//! calling thread. The selection state is re-derived from a fresh discovery
//! whenever the kind or the filter changes, so the display list always
//! matches the last registry fetched.

use log::{info, warn};

use crate::{
    component_registry::ComponentRegistry,
    device::Device,
    discovery::discover,
    dispatch::{fuzz_all, fuzz_single, BatchOutcome},
    ipc_kind::IpcKind,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    ChangeKind(IpcKind),
    ToggleFilter,
    SelectTarget(String),
    FuzzSingle,
    FuzzAll,
    /// Discover again without changing kind or filter.
    Refresh,
}

/// What the user gets to see after a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// Transient message, not kept in the log.
    Notice(String),
    /// Line appended to the output log.
    Log(String),
}

#[derive(Clone, Debug)]
pub struct SelectionState {
    pub kind: IpcKind,
    pub system_only: bool,
    pub registry: ComponentRegistry,
    pub display_list: Vec<String>,
    pub selected: Option<String>,
}

impl SelectionState {
    fn new(kind: IpcKind, system_only: bool) -> Self {
        Self {
            kind,
            system_only,
            registry: ComponentRegistry::default(),
            display_list: Vec::new(),
            selected: None,
        }
    }

    /// Replaces the registry and returns the number of hidden duplicates.
    fn update(&mut self, registry: ComponentRegistry) -> usize {
        self.display_list = registry.display_list();
        self.selected = self.display_list.first().cloned();
        let collisions = registry.collisions();
        self.registry = registry;
        collisions
    }
}

pub struct IntentFuzzer<D: Device> {
    device: D,
    state: SelectionState,
    log: Vec<String>,
}

impl<D: Device> IntentFuzzer<D> {
    /// Creates the controller and discovers the components of `kind`.
    pub fn new(device: D, kind: IpcKind, system_only: bool) -> (Self, Vec<Feedback>) {
        let mut fuzzer = Self {
            device,
            state: SelectionState::new(kind, system_only),
            log: Vec::new(),
        };
        let feedback = fuzzer.refresh();
        (fuzzer, feedback)
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Every result line so far, oldest first.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn handle(&mut self, command: Command) -> Vec<Feedback> {
        info!("Handling {:?}", command);
        match command {
            Command::ChangeKind(kind) => {
                self.state.kind = kind;
                self.refresh()
            }
            Command::ToggleFilter => {
                self.state.system_only = !self.state.system_only;
                self.refresh()
            }
            Command::Refresh => self.refresh(),
            Command::SelectTarget(class) => self.select(class),
            Command::FuzzSingle => self.fuzz_single(),
            Command::FuzzAll => self.fuzz_all(),
        }
    }

    fn refresh(&mut self) -> Vec<Feedback> {
        let mut feedback = Vec::new();

        let registry = match discover(&self.device, self.state.kind, self.state.system_only) {
            Ok(registry) => registry,
            Err(err) => {
                warn!("Discovery failed: {}", err);
                feedback.push(Feedback::Notice(format!(
                    "Could not list {}: {}",
                    self.state.kind, err
                )));
                ComponentRegistry::default()
            }
        };

        let collisions = self.state.update(registry);
        if collisions > 0 {
            feedback.push(Feedback::Notice(format!(
                "{} duplicate component names hidden",
                collisions
            )));
        }

        feedback
    }

    fn select(&mut self, class: String) -> Vec<Feedback> {
        if self.state.display_list.contains(&class) {
            self.state.selected = Some(class);
            Vec::new()
        } else {
            vec![Feedback::Notice(format!("No {} named {}", self.state.kind, class))]
        }
    }

    /// Fuzzes the component with the given class without changing the
    /// selection. Returns whether the delivery succeeded.
    pub fn fuzz_class(&mut self, class: &str) -> (Vec<Feedback>, bool) {
        self.fuzz_target(Some(class))
    }

    fn fuzz_single(&mut self) -> Vec<Feedback> {
        let selected = self.state.selected.clone();
        self.fuzz_target(selected.as_deref()).0
    }

    fn fuzz_target(&mut self, selection: Option<&str>) -> (Vec<Feedback>, bool) {
        let mut feedback = Vec::new();
        match self.state.kind {
            IpcKind::Provider => feedback.push(Feedback::Notice(
                "Content providers cannot receive intents".to_owned(),
            )),
            IpcKind::Instrumentation => feedback.push(Feedback::Notice(
                "Instrumentations are not intent based, starting the instrumentation".to_owned(),
            )),
            _ => {}
        }

        let outcome = fuzz_single(
            &self.device,
            self.state.kind,
            &self.state.registry,
            selection,
        );
        let delivered = outcome.is_delivered();
        feedback.push(self.append(outcome.to_string()));
        (feedback, delivered)
    }

    fn fuzz_all(&mut self) -> Vec<Feedback> {
        let outcome = fuzz_all(&self.device, self.state.kind, &self.state.registry);
        let summary = outcome.summary();

        match outcome {
            BatchOutcome::NotImplemented(_) => vec![Feedback::Notice(summary)],
            BatchOutcome::Completed { failures, .. } => {
                let mut feedback: Vec<Feedback> =
                    failures.into_iter().map(|line| self.append(line)).collect();
                feedback.push(self.append(summary));
                feedback
            }
        }
    }

    fn append(&mut self, line: String) -> Feedback {
        self.log.push(line.clone());
        Feedback::Log(line)
    }
}
