use super::fault::{Fault, FaultClassifier};
use super::journal::{CommandJournal, JournalEntry, JournalKind, TracingJournal};
use super::svn;
use super::{CommandOutcome, Verbosity, is_silenced};
use crate::config::CommandSettings;
use crate::error::{ArtusError, Result};
use std::io;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Executes command batches with the pinned environment of the plugin
///
/// Commands run one at a time through the configured shell, in a fixed
/// working directory, with stderr merged into stdout. A failure caused by a
/// known working-copy fault is repaired and the command retried once.
#[derive(Clone)]
pub struct CommandRunner {
    settings: CommandSettings,
    classifier: FaultClassifier,
    journal: Arc<dyn CommandJournal>,
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner")
            .field("settings", &self.settings)
            .field("classifier", &self.classifier)
            .field("journal", &"Arc<dyn CommandJournal>")
            .finish()
    }
}

/// Steps of the recovery of one failed command
///
/// `Attempt → Failed → Classify → Repair → Retry → Done`; the attempt and
/// failure happen before [`CommandRunner::recover`] is entered.
enum Step {
    Classify(CommandOutcome),
    Repair(Fault),
    Retry,
    Done(CommandOutcome),
}

impl CommandRunner {
    /// Create a runner that journals through `tracing`
    pub fn new(settings: CommandSettings) -> Self {
        let classifier = FaultClassifier::new(settings.working_copy_root.clone());
        Self {
            settings,
            classifier,
            journal: Arc::new(TracingJournal),
        }
    }

    /// Replace the journal
    #[must_use]
    pub fn with_journal(mut self, journal: Arc<dyn CommandJournal>) -> Self {
        self.journal = journal;
        self
    }

    pub const fn settings(&self) -> &CommandSettings {
        &self.settings
    }

    /// Run `commands` in order and report the last attempted one
    ///
    /// Stops at the first failure that could not be recovered. `location`
    /// tags journal entries; pass [`crate::here!()`].
    pub fn run<S: AsRef<str>>(&self, commands: &[S], location: &str) -> CommandOutcome {
        self.run_at_depth(commands, location, 0)
    }

    /// Like [`run`](Self::run) but turns a failure into an error
    pub fn run_checked<S: AsRef<str>>(
        &self,
        commands: &[S],
        location: &str,
    ) -> Result<CommandOutcome> {
        let outcome = self.run(commands, location);
        if outcome.success() {
            Ok(outcome)
        } else {
            Err(ArtusError::CommandFailed {
                code: outcome.code,
                output: outcome.lines.join("\n"),
            })
        }
    }

    fn run_at_depth<S: AsRef<str>>(
        &self,
        commands: &[S],
        location: &str,
        depth: u32,
    ) -> CommandOutcome {
        let mut outcome = CommandOutcome::default();

        for command in commands {
            let command = command.as_ref();
            let attempted = match self.execute(command) {
                Ok(attempted) => attempted,
                Err(e) => {
                    self.journal.record(&JournalEntry::new(
                        JournalKind::SpawnFailed(e.to_string()),
                        command,
                        -1,
                        &[],
                        location,
                    ));
                    return CommandOutcome::spawn_failure();
                },
            };

            // probes: neither captured nor journaled, and never fatal
            if is_silenced(command) {
                outcome = CommandOutcome {
                    code: attempted.code,
                    lines: Vec::new(),
                };
                continue;
            }

            outcome = if attempted.success() || depth > 0 {
                attempted
            } else {
                self.recover(command, attempted, location, depth)
            };

            let failed = !outcome.success();
            if failed || self.settings.verbosity == Verbosity::Info {
                let kind = if failed {
                    JournalKind::Failed
                } else {
                    JournalKind::Succeeded
                };
                self.journal.record(&JournalEntry::new(
                    kind,
                    command,
                    outcome.code,
                    &outcome.lines,
                    location,
                ));
            }

            if failed {
                break;
            }
        }

        outcome
    }

    /// Repair a recognised fault and retry the command once
    ///
    /// Only entered at depth 0; the repair and the retry run at depth 1,
    /// where no further recovery happens.
    fn recover(
        &self,
        command: &str,
        failed: CommandOutcome,
        location: &str,
        depth: u32,
    ) -> CommandOutcome {
        let mut step = Step::Classify(failed);
        loop {
            step = match step {
                Step::Classify(outcome) => match self.classifier.classify(command, &outcome.lines) {
                    Some(fault) => Step::Repair(fault),
                    None => Step::Done(outcome),
                },
                Step::Repair(fault) => {
                    tracing::warn!(
                        "Repairing {:?} before retrying command at {}",
                        fault,
                        location
                    );
                    // the fault may come from a concurrent request still at work
                    thread::sleep(Duration::from_millis(self.settings.backoff_ms));
                    let repair = self.repair_command(&fault);
                    let repaired = self.run_at_depth(&[repair], location, depth + 1);
                    if repaired.success() && depth == 0 {
                        Step::Retry
                    } else {
                        Step::Done(repaired)
                    }
                },
                Step::Retry => Step::Done(self.run_at_depth(&[command], location, depth + 1)),
                Step::Done(outcome) => return outcome,
            };
        }
    }

    fn repair_command(&self, fault: &Fault) -> String {
        match fault {
            Fault::MissingPristine { working_copy, sha1 } => svn::fetch_pristine_command(
                &self.settings.fetch_pristine_script,
                working_copy,
                sha1,
            ),
            Fault::StaleLock { working_copy } => {
                svn::cleanup_command(&self.settings.svn_user, working_copy)
            },
        }
    }

    fn execute(&self, command: &str) -> io::Result<CommandOutcome> {
        let output = Command::new(&self.settings.shell)
            .arg("-c")
            .arg(format!("exec 2>&1\n{command}"))
            .current_dir(&self.settings.working_dir)
            .env_clear()
            .env("LC_ALL", &self.settings.locale)
            .env("HOME", &self.settings.home)
            .env("PATH", &self.settings.path)
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null())
            .output()?;

        let code = output.status.code().unwrap_or(-1);
        let lines = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect();
        Ok(CommandOutcome { code, lines })
    }
}
