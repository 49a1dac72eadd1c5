//! Shell command grammar.
//!
//! Every command is a [`CommandSpec`] whose leading words bind the
//! [`Action`] under [`ACTION`]. The shell picks the spec by those words and
//! parses the whole line with it, so error carets line up with what was
//! typed.

use std::str::FromStr;
use std::sync::Arc;

use command_core::builder::{
    enum_value, flags, literal, optional, remaining_joined_strings, remaining_raw_joined_strings,
    seq, string,
};
use command_core::{
    CommandArgs, CommandContext, CommandElement, CommandSource, CommandSpec, Element, ParseResult,
    Value,
};
use permission_core::{Context, PermissionService, SubjectReference, Tristate};

pub const ACTION: &str = "action";
pub const SUBJECT: &str = "subject";
pub const PARENT: &str = "parent";
pub const NODE: &str = "node";
pub const VALUE: &str = "value";
pub const KEY: &str = "key";
pub const CONTEXT: &str = "context";
pub const TRANSIENT: &str = "t";
pub const FILE: &str = "file";
pub const TEXT: &str = "text";

/// Permission prefix guarding each command, e.g. `permsh.command.set`.
pub const PERMISSION_PREFIX: &str = "permsh.command";

/// What a parsed line asks the shell to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Set,
    Check,
    ParentAdd,
    ParentRemove,
    OptionSet,
    OptionGet,
    Info,
    Clear,
    Export,
    Complete,
    Help,
    Quit,
}

// ============================================================================
// Custom elements
// ============================================================================

/// A `collection:identifier` token.
///
/// Completion offers collection prefixes and the subjects already loaded.
pub struct SubjectElement {
    key: String,
    service: Arc<PermissionService>,
}

impl SubjectElement {
    pub fn new(key: impl Into<String>, service: Arc<PermissionService>) -> Self {
        Self {
            key: key.into(),
            service,
        }
    }

    fn candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        for name in self.service.collection_names() {
            candidates.push(format!("{name}:"));
            if let Some(collection) = self.service.get_collection(&name) {
                candidates.extend(
                    collection
                        .subjects()
                        .iter()
                        .map(|subject| subject.reference().to_string()),
                );
            }
        }
        candidates
    }
}

impl CommandElement for SubjectElement {
    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        let input = args.next()?;
        match SubjectReference::from_str(&input) {
            Ok(reference) => Ok(Some(Value::any(reference))),
            Err(_) => Err(args.create_error(format!(
                "Expected a subject as collection:identifier, but input '{input}' was not"
            ))),
        }
    }

    fn complete(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
        _context: &mut CommandContext,
    ) -> Vec<String> {
        let prefix = args.next_if_present().unwrap_or_default().to_lowercase();
        self.candidates()
            .into_iter()
            .filter(|candidate| candidate.to_lowercase().starts_with(&prefix))
            .collect()
    }
}

/// A `key=value` context token.
pub struct ContextElement {
    key: String,
}

impl ContextElement {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl CommandElement for ContextElement {
    fn key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn parse_value(
        &self,
        _source: &dyn CommandSource,
        args: &mut CommandArgs,
    ) -> ParseResult<Option<Value>> {
        let input = args.next()?;
        match Context::from_str(&input) {
            Ok(context) => Ok(Some(Value::any(context))),
            Err(_) => Err(args.create_error(format!(
                "Expected a context as key=value, but input '{input}' was not"
            ))),
        }
    }

    fn usage(&self, _source: &dyn CommandSource) -> String {
        "<key=value>".to_string()
    }
}

// ============================================================================
// Command table
// ============================================================================

struct Entry {
    path: &'static [&'static str],
    spec: CommandSpec,
}

impl Entry {
    fn matches(&self, words: &[&str]) -> bool {
        self.path.len() <= words.len()
            && self
                .path
                .iter()
                .zip(words)
                .all(|(expected, word)| expected.eq_ignore_ascii_case(word))
    }
}

/// Every shell command, looked up by its leading words.
pub struct Commands {
    entries: Vec<Entry>,
}

impl Commands {
    pub fn new(service: Arc<PermissionService>) -> Self {
        let subject =
            |key: &str| -> Element { Box::new(SubjectElement::new(key, Arc::clone(&service))) };

        let entries = vec![
            entry(
                &["set"],
                Action::Set,
                "Set a permission node to true, false or undefined",
                vec![scoped(
                    true,
                    seq(vec![
                        subject(SUBJECT),
                        string(NODE),
                        enum_value::<Tristate>(VALUE),
                    ]),
                )],
            ),
            entry(
                &["check"],
                Action::Check,
                "Resolve a permission node through parents and defaults",
                vec![scoped(false, seq(vec![subject(SUBJECT), string(NODE)]))],
            ),
            entry(
                &["parent", "add"],
                Action::ParentAdd,
                "Add a parent subject",
                vec![scoped(true, seq(vec![subject(SUBJECT), subject(PARENT)]))],
            ),
            entry(
                &["parent", "remove"],
                Action::ParentRemove,
                "Remove a parent subject",
                vec![scoped(true, seq(vec![subject(SUBJECT), subject(PARENT)]))],
            ),
            entry(
                &["option", "set"],
                Action::OptionSet,
                "Set an option, or unset it when no value is given",
                vec![scoped(
                    true,
                    seq(vec![
                        subject(SUBJECT),
                        string(KEY),
                        optional(remaining_joined_strings(VALUE)),
                    ]),
                )],
            ),
            entry(
                &["option", "get"],
                Action::OptionGet,
                "Resolve an option through parents and defaults",
                vec![scoped(false, seq(vec![subject(SUBJECT), string(KEY)]))],
            ),
            entry(
                &["info"],
                Action::Info,
                "Show the stored data of a subject",
                vec![subject(SUBJECT)],
            ),
            entry(
                &["clear"],
                Action::Clear,
                "Clear a subject's data, everywhere or in the given contexts",
                vec![scoped(true, subject(SUBJECT))],
            ),
            entry(
                &["export"],
                Action::Export,
                "Write every subject's persistent data as JSON",
                vec![optional(string(FILE))],
            ),
            entry(
                &["complete"],
                Action::Complete,
                "List completions for a partial command line",
                vec![optional(remaining_raw_joined_strings(TEXT))],
            ),
            entry(&["help"], Action::Help, "List commands", Vec::new()),
            entry(&["quit"], Action::Quit, "Leave the shell", Vec::new()),
            entry(&["exit"], Action::Quit, "Leave the shell", Vec::new()),
        ];
        Self { entries }
    }

    /// The command whose words start `line`.
    pub fn lookup(&self, line: &str) -> Option<&CommandSpec> {
        let words: Vec<&str> = line.split_whitespace().collect();
        self.entries
            .iter()
            .filter(|entry| entry.matches(&words))
            .max_by_key(|entry| entry.path.len())
            .map(|entry| &entry.spec)
    }

    /// Usages of the commands starting with `word`, for lines that name a
    /// command group but no command in it.
    pub fn usages_for(&self, source: &dyn CommandSource, word: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.path[0].eq_ignore_ascii_case(word))
            .map(|entry| entry.spec.usage(source))
            .collect()
    }

    /// Candidates for the last word of `text`.
    pub fn complete(&self, source: &dyn CommandSource, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let (done, partial) = match words.split_last() {
            Some((last, done)) if !text.ends_with(char::is_whitespace) => (done, *last),
            _ => (words.as_slice(), ""),
        };

        if let Some(entry) = self.entries.iter().find(|entry| entry.matches(done)) {
            return entry.spec.complete(source, text);
        }

        let partial = partial.to_lowercase();
        let mut candidates: Vec<String> = Vec::new();
        for entry in self.allowed(source) {
            let Some(next) = entry.path.get(done.len()) else {
                continue;
            };
            let prefix_matches = entry
                .path
                .iter()
                .zip(done)
                .all(|(expected, word)| expected.eq_ignore_ascii_case(word));
            if prefix_matches && next.starts_with(&partial) && !candidates.iter().any(|c| c == next)
            {
                candidates.push((*next).to_string());
            }
        }
        candidates
    }

    /// One line per command the source may run: usage, then description.
    pub fn help(&self, source: &dyn CommandSource) -> Vec<String> {
        self.allowed(source)
            .map(|entry| {
                format!(
                    "{} - {}",
                    entry.spec.usage(source),
                    entry.spec.description().unwrap_or_default()
                )
            })
            .collect()
    }

    fn allowed<'a>(&'a self, source: &'a dyn CommandSource) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.spec.test_permission(source).is_ok())
    }
}

fn entry(
    path: &'static [&'static str],
    action: Action,
    description: &str,
    rest: Vec<Element>,
) -> Entry {
    let mut elements = vec![literal(ACTION, Value::any(action), path)];
    elements.extend(rest);
    Entry {
        path,
        spec: CommandSpec::new(seq(elements))
            .with_permission(format!("{PERMISSION_PREFIX}.{}", path.join(".")))
            .with_description(description),
    }
}

/// `child` behind `-c key=value` context flags and, when the command writes
/// data, the `-t` transient flag.
fn scoped(writes: bool, child: Element) -> Element {
    let builder = flags().value_flag(Box::new(ContextElement::new(CONTEXT)), &["c", "-context"]);
    let builder = if writes {
        builder.flag(&["t", "-transient"])
    } else {
        builder
    };
    builder.build_with(child)
}
