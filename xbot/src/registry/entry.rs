//! One registered handler: its command key, its name, how it appears in the status listing, and the
//! function.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use xbot_core::{IncomingCommand, MenuCommand, StatusRecipient};

use super::SYSTEM_PREFIX;
use crate::bot::Bot;

/// Type-erased handler function.
pub type HandlerFn =
    Arc<dyn Fn(IncomingCommand, Bot) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Type-erased visibility predicate, evaluated on every status request.
pub type VisibleFn = Arc<dyn Fn(StatusRecipient, Bot) -> BoxFuture<'static, bool> + Send + Sync>;

/// Wraps an async closure into a [`HandlerFn`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(IncomingCommand, Bot) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |command, bot| Box::pin(f(command, bot)))
}

/// Wraps an async predicate into a [`VisibleFn`].
pub fn visible_fn<F, Fut>(f: F) -> VisibleFn
where
    F: Fn(StatusRecipient, Bot) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(move |recipient, bot| Box::pin(f(recipient, bot)))
}

#[derive(Clone)]
pub enum Visibility {
    Always,
    When(VisibleFn),
}

#[derive(Clone)]
pub enum HandlerKind {
    /// Listed in the status menu (subject to `visibility`). An empty `description` is listed as
    /// `"<Name> handler"`.
    Visible {
        description: String,
        visibility: Visibility,
    },
    /// Callable but never listed.
    Hidden,
    /// Fallback for user commands without an exact match.
    Default,
    /// Platform event keyed `system:<event>`.
    SystemEvent,
}

impl HandlerKind {
    pub fn name(&self) -> &'static str {
        match self {
            HandlerKind::Visible { .. } => "visible",
            HandlerKind::Hidden => "hidden",
            HandlerKind::Default => "default",
            HandlerKind::SystemEvent => "system_event",
        }
    }
}

/// Immutable after registration; shared with execution units as `Arc<HandlerEntry>`.
#[derive(Clone)]
pub struct HandlerEntry {
    command: String,
    name: Option<String>,
    kind: HandlerKind,
    func: HandlerFn,
}

impl HandlerEntry {
    /// `command` is stored as given; the registry normalizes it on registration.
    pub fn new(command: impl Into<String>, kind: HandlerKind, func: HandlerFn) -> Self {
        Self {
            command: command.into(),
            name: None,
            kind,
            func,
        }
    }

    /// Sets the handler name. Without one the registry names the handler after its first command.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Explicit description of a visible handler, otherwise `"<Name> handler"`.
    pub fn description(&self) -> String {
        match &self.kind {
            HandlerKind::Visible { description, .. } if !description.is_empty() => {
                description.clone()
            }
            _ => default_description(self.name()),
        }
    }

    pub fn kind(&self) -> &HandlerKind {
        &self.kind
    }

    pub fn call(&self, command: IncomingCommand, bot: Bot) -> BoxFuture<'static, anyhow::Result<()>> {
        (self.func)(command, bot)
    }

    /// Menu item for `recipient`, or `None` when the entry is not listed for them.
    pub async fn menu_item(&self, recipient: &StatusRecipient, bot: &Bot) -> Option<MenuCommand> {
        let HandlerKind::Visible { visibility, .. } = &self.kind else {
            return None;
        };
        let visible = match visibility {
            Visibility::Always => true,
            Visibility::When(predicate) => predicate(recipient.clone(), bot.clone()).await,
        };
        visible.then(|| MenuCommand::new(&self.command, self.name(), &self.description()))
    }

    pub(crate) fn with_command(mut self, command: String) -> Self {
        self.command = command;
        self
    }

    /// Fills in the name from a normalized key: `/help` is named `help`, `system:chat_created`
    /// is named `chat_created`, the default handler `default`.
    pub(crate) fn with_default_name(mut self, key: &str) -> Self {
        if self.name.is_none() {
            let name = key
                .strip_prefix(SYSTEM_PREFIX)
                .unwrap_or_else(|| key.trim_start_matches('/'));
            let name = if name.is_empty() { "default" } else { name };
            self.name = Some(name.to_string());
        }
        self
    }
}

/// First letter upper case, the rest lower case: `sync-Handler` becomes `Sync-handler handler`.
fn default_description(name: &str) -> String {
    let mut chars = name.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    };
    format!("{} handler", capitalized)
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("command", &self.command)
            .field("name", &self.name())
            .field("kind", &self.kind.name())
            .finish()
    }
}
