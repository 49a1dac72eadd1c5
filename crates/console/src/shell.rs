//! Line execution for the administration shell.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use command_core::{CommandContext, CommandSource};
use permission_core::{
    Context, ContextSet, MemorySubjectData, PermissionService, Subject, SubjectData,
    SubjectReference, Tristate,
};

use crate::config::ConsoleConfig;
use crate::grammar::{
    ACTION, Action, CONTEXT, Commands, FILE, KEY, NODE, PARENT, SUBJECT, TEXT, TRANSIENT, VALUE,
};
use crate::snapshot;
use crate::source::ShellSource;

/// What running one line produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Output(Vec<String>),
    /// A parse or execution failure, ready to print.
    Error(String),
    Quit,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self::Output(vec![text.into()])
    }
}

/// Parses and runs shell lines against one [`PermissionService`].
pub struct Shell {
    service: Arc<PermissionService>,
    commands: Commands,
    source: ShellSource,
    snapshot_file: Option<PathBuf>,
}

impl Shell {
    /// Builds the service, loading the snapshot file when it exists.
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let service = Arc::new(PermissionService::new(config.service.clone()));

        if let Some(path) = config.snapshot_file.as_deref()
            && path.exists()
        {
            let loaded = snapshot::restore(&service, snapshot::read(path)?)?;
            tracing::info!(subjects = loaded, path = %path.display(), "snapshot loaded");
        }

        Ok(Self {
            commands: Commands::new(Arc::clone(&service)),
            source: ShellSource::new(config.source, Arc::clone(&service)),
            snapshot_file: config.snapshot_file,
            service,
        })
    }

    pub fn service(&self) -> &PermissionService {
        &self.service
    }

    pub fn source(&self) -> &ShellSource {
        &self.source
    }

    /// Runs one line. Blank lines produce no output.
    pub async fn execute(&self, line: &str) -> Reply {
        let Some(first) = line.split_whitespace().next() else {
            return Reply::Output(Vec::new());
        };
        let Some(spec) = self.commands.lookup(line) else {
            let usages = self.commands.usages_for(&self.source, first);
            return if usages.is_empty() {
                Reply::Error(format!(
                    "Unknown command '{first}'. Type 'help' for a list of commands."
                ))
            } else {
                Reply::Error(format!("Usage:\n  {}", usages.join("\n  ")))
            };
        };

        let context = match spec.parse(&self.source, line) {
            Ok(context) => context,
            Err(error) => return Reply::Error(error.to_string()),
        };
        let Some(action) = context.one_any::<Action>(ACTION).copied() else {
            return Reply::Error(format!("'{first}' did not select a command"));
        };

        tracing::debug!(?action, source = self.source.name(), "executing");
        match self.run(action, &context).await {
            Ok(reply) => reply,
            Err(error) => Reply::Error(format!("{error:#}")),
        }
    }

    async fn run(&self, action: Action, context: &CommandContext) -> Result<Reply> {
        match action {
            Action::Set => self.set(context).await,
            Action::Check => self.check(context),
            Action::ParentAdd => self.change_parent(context, true).await,
            Action::ParentRemove => self.change_parent(context, false).await,
            Action::OptionSet => self.set_option(context).await,
            Action::OptionGet => self.get_option(context),
            Action::Info => self.info(context),
            Action::Clear => self.clear(context).await,
            Action::Export => self.export(context),
            Action::Complete => {
                let text = context.one_as::<String>(TEXT).unwrap_or_default();
                Ok(Reply::Output(self.commands.complete(&self.source, &text)))
            }
            Action::Help => Ok(Reply::Output(self.commands.help(&self.source))),
            Action::Quit => Ok(Reply::Quit),
        }
    }

    // ========================================================================
    // Permissions
    // ========================================================================

    async fn set(&self, context: &CommandContext) -> Result<Reply> {
        let reference = subject(context, SUBJECT)?;
        let node = required::<String>(context, NODE)?;
        let value = *context
            .one_any::<Tristate>(VALUE)
            .context("missing permission value")?;
        let contexts = contexts(context);

        let subject = self.service.load_subject(&reference)?;
        let changed = self
            .target(&subject, context)
            .set_permission(&contexts, &node, value)
            .await;

        Ok(Reply::line(if changed {
            format!("Set {node} to {value} for {reference} in {contexts}")
        } else {
            format!("{node} is already {value} for {reference} in {contexts}")
        }))
    }

    fn check(&self, context: &CommandContext) -> Result<Reply> {
        let reference = subject(context, SUBJECT)?;
        let node = required::<String>(context, NODE)?;
        let contexts = contexts(context);
        let value = self.service.permission_value(&reference, &contexts, &node);
        Ok(Reply::line(format!("{reference} {node} = {value} in {contexts}")))
    }

    async fn change_parent(&self, context: &CommandContext, add: bool) -> Result<Reply> {
        let reference = subject(context, SUBJECT)?;
        let parent = subject(context, PARENT)?;
        let contexts = contexts(context);

        let subject = self.service.load_subject(&reference)?;
        let data = self.target(&subject, context);
        let reply = if add {
            self.service.load_subject(&parent)?;
            if data.add_parent(&contexts, parent.clone()).await {
                format!("Added parent {parent} to {reference} in {contexts}")
            } else {
                format!("{reference} already has parent {parent} in {contexts}")
            }
        } else if data.remove_parent(&contexts, &parent).await {
            format!("Removed parent {parent} from {reference} in {contexts}")
        } else {
            format!("{reference} has no parent {parent} in {contexts}")
        };
        Ok(Reply::line(reply))
    }

    // ========================================================================
    // Options
    // ========================================================================

    async fn set_option(&self, context: &CommandContext) -> Result<Reply> {
        let reference = subject(context, SUBJECT)?;
        let key = required::<String>(context, KEY)?;
        let value = context.one_as::<String>(VALUE);
        let contexts = contexts(context);

        let subject = self.service.load_subject(&reference)?;
        let changed = self
            .target(&subject, context)
            .set_option(&contexts, &key, value.clone())
            .await;

        Ok(Reply::line(match (changed, value) {
            (true, Some(value)) => format!("Set option {key} to '{value}' for {reference}"),
            (true, None) => format!("Unset option {key} for {reference}"),
            (false, _) => format!("Option {key} unchanged for {reference}"),
        }))
    }

    fn get_option(&self, context: &CommandContext) -> Result<Reply> {
        let reference = subject(context, SUBJECT)?;
        let key = required::<String>(context, KEY)?;
        let contexts = contexts(context);
        Ok(Reply::line(
            match self.service.option(&reference, &contexts, &key) {
                Some(value) => format!("{key} = {value}"),
                None => format!("{key} is not set for {reference} in {contexts}"),
            },
        ))
    }

    // ========================================================================
    // Subjects
    // ========================================================================

    fn info(&self, context: &CommandContext) -> Result<Reply> {
        let reference = subject(context, SUBJECT)?;
        let Some(subject) = self.service.get_subject(&reference) else {
            return Ok(Reply::line(format!("{reference} has no data")));
        };

        let mut lines = vec![format!("Subject {reference}")];
        for (label, data) in [
            ("persistent", subject.subject_data()),
            ("transient", subject.transient_data()),
        ] {
            if data.is_empty() {
                continue;
            }
            lines.push(format!("  {label}:"));
            describe(&mut lines, data);
        }
        if lines.len() == 1 {
            lines.push("  (empty)".to_string());
        }
        Ok(Reply::Output(lines))
    }

    async fn clear(&self, context: &CommandContext) -> Result<Reply> {
        let reference = subject(context, SUBJECT)?;
        let Some(subject) = self.service.get_subject(&reference) else {
            return Ok(Reply::line(format!("{reference} has no data")));
        };
        let data = self.target(&subject, context);
        let contexts = contexts(context);

        let changed = if contexts.is_global() {
            let permissions = data.clear_permissions().await;
            let parents = data.clear_parents().await;
            let options = data.clear_options().await;
            permissions | parents | options
        } else {
            let permissions = data.clear_permissions_in(&contexts).await;
            let parents = data.clear_parents_in(&contexts).await;
            let options = data.clear_options_in(&contexts).await;
            permissions | parents | options
        };

        Ok(Reply::line(if changed {
            format!("Cleared {reference}")
        } else {
            format!("{reference} had nothing to clear")
        }))
    }

    fn export(&self, context: &CommandContext) -> Result<Reply> {
        let snapshot = snapshot::capture(&self.service);
        let path = context
            .one_as::<String>(FILE)
            .map(PathBuf::from)
            .or_else(|| self.snapshot_file.clone());

        match path {
            Some(path) => {
                snapshot::write(&path, &snapshot)?;
                tracing::info!(path = %path.display(), "snapshot exported");
                Ok(Reply::line(format!(
                    "Exported {} subjects to {}",
                    snapshot.subject_count(),
                    path.display()
                )))
            }
            None => Ok(Reply::line(serde_json::to_string_pretty(&snapshot)?)),
        }
    }

    /// Transient data with `-t`, persistent data otherwise.
    fn target<'a>(
        &self,
        subject: &'a Subject,
        context: &CommandContext,
    ) -> &'a MemorySubjectData {
        if context.has_any(TRANSIENT) {
            subject.transient_data()
        } else {
            subject.subject_data()
        }
    }
}

fn subject(context: &CommandContext, key: &str) -> Result<SubjectReference> {
    context
        .one_any::<SubjectReference>(key)
        .cloned()
        .with_context(|| format!("missing {key}"))
}

fn required<T: command_core::FromValue>(context: &CommandContext, key: &str) -> Result<T> {
    context
        .one_as::<T>(key)
        .with_context(|| format!("missing {key}"))
}

/// Every `-c key=value` given, as one set.
fn contexts(context: &CommandContext) -> ContextSet {
    context
        .all(CONTEXT)
        .filter_map(|value| value.downcast_ref::<Context>().cloned())
        .collect()
}

fn describe(lines: &mut Vec<String>, data: &MemorySubjectData) {
    for (contexts, permissions) in data.all_permissions() {
        for (node, value) in permissions {
            lines.push(format!("    permission {node} = {value} in {contexts}"));
        }
    }
    for (contexts, parents) in data.all_parents() {
        for parent in parents {
            lines.push(format!("    parent {parent} in {contexts}"));
        }
    }
    for (contexts, options) in data.all_options() {
        for (key, value) in options {
            lines.push(format!("    option {key} = '{value}' in {contexts}"));
        }
    }
}
