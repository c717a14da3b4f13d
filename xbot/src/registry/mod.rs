//! # Handler registry
//!
//! Maps command keys to handlers. User commands are keyed `/name`, system events `system:<event>`.
//! Registration order is kept for the status listing.

mod entry;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;
use xbot_core::{HandlerError, IncomingCommand, MenuCommand, StatusRecipient};

use crate::bot::Bot;

pub use entry::{
    handler_fn, visible_fn, HandlerEntry, HandlerFn, HandlerKind, VisibleFn, Visibility,
};

const SYSTEM_PREFIX: &str = "system:";

/// Normalizes a user command key: trims whitespace, collapses runs of slashes and enforces one
/// leading slash (`"/////command"` and `"command"` both become `"/command"`, `"/a//b"` becomes
/// `"/a/b"`).
pub fn normalize_command(raw: &str) -> Result<String, HandlerError> {
    let name = raw
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(HandlerError::InvalidCommand(raw.to_string()));
    }
    Ok(format!("/{}", name))
}

/// Normalizes a system event key: `chat_created` and `system:chat_created` both become
/// `system:chat_created`.
pub fn normalize_system_event(raw: &str) -> Result<String, HandlerError> {
    let trimmed = raw.trim();
    let name = trimmed.strip_prefix(SYSTEM_PREFIX).unwrap_or(trimmed).trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(HandlerError::InvalidCommand(raw.to_string()));
    }
    Ok(format!("{}{}", SYSTEM_PREFIX, name))
}

/// Registered handlers. Built before the bot starts, then shared read-only.
#[derive(Debug, Default, Clone)]
pub struct HandlerRegistry {
    entries: Vec<Arc<HandlerEntry>>,
    index: HashMap<String, usize>,
    default: Option<Arc<HandlerEntry>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entry, normalizing its key according to its kind.
    pub fn register(&mut self, entry: HandlerEntry) -> Result<&mut Self, HandlerError> {
        self.register_with_aliases(entry, &[])
    }

    /// Registers one handler under its own command and every alias. Each key gets its own listing
    /// item; all share the handler name. Fails without changes when any key collides.
    pub fn register_with_aliases(
        &mut self,
        entry: HandlerEntry,
        aliases: &[&str],
    ) -> Result<&mut Self, HandlerError> {
        let kind = entry.kind().name();
        if matches!(entry.kind(), HandlerKind::Default) {
            if !aliases.is_empty() {
                return Err(HandlerError::InvalidCommand(aliases.join(" ")));
            }
            if self.default.is_some() {
                return Err(HandlerError::DuplicateDefault);
            }
            debug!("Registered default handler");
            self.default = Some(Arc::new(entry.with_default_name("")));
            return Ok(self);
        }

        let mut keys: Vec<String> = Vec::with_capacity(aliases.len() + 1);
        for raw in std::iter::once(entry.command()).chain(aliases.iter().copied()) {
            let key = match entry.kind() {
                HandlerKind::SystemEvent => normalize_system_event(raw)?,
                _ => normalize_command(raw)?,
            };
            if self.index.contains_key(&key) || keys.contains(&key) {
                return Err(HandlerError::DuplicateCommand(key));
            }
            keys.push(key);
        }

        let entry = entry.with_default_name(&keys[0]);
        for key in keys {
            debug!(command = %key, name = %entry.name(), kind = kind, "Registered handler");
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push(Arc::new(entry.clone().with_command(key)));
        }
        Ok(self)
    }

    /// Command listed in the status menu for everyone. An empty `description` is listed as
    /// `"<Name> handler"`.
    pub fn command<F, Fut>(
        &mut self,
        command: &str,
        description: &str,
        handler: F,
    ) -> Result<&mut Self, HandlerError>
    where
        F: Fn(IncomingCommand, Bot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(HandlerEntry::new(
            command,
            HandlerKind::Visible {
                description: description.to_string(),
                visibility: Visibility::Always,
            },
            handler_fn(handler),
        ))
    }

    /// Command listed only for recipients `visible` returns `true` for.
    pub fn command_when<V, VFut, F, Fut>(
        &mut self,
        command: &str,
        description: &str,
        visible: V,
        handler: F,
    ) -> Result<&mut Self, HandlerError>
    where
        V: Fn(StatusRecipient, Bot) -> VFut + Send + Sync + 'static,
        VFut: Future<Output = bool> + Send + 'static,
        F: Fn(IncomingCommand, Bot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(HandlerEntry::new(
            command,
            HandlerKind::Visible {
                description: description.to_string(),
                visibility: Visibility::When(visible_fn(visible)),
            },
            handler_fn(handler),
        ))
    }

    /// Visible command reachable under several keys, e.g. `/info` and `/information`.
    pub fn command_with_aliases<F, Fut>(
        &mut self,
        command: &str,
        aliases: &[&str],
        description: &str,
        handler: F,
    ) -> Result<&mut Self, HandlerError>
    where
        F: Fn(IncomingCommand, Bot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register_with_aliases(
            HandlerEntry::new(
                command,
                HandlerKind::Visible {
                    description: description.to_string(),
                    visibility: Visibility::Always,
                },
                handler_fn(handler),
            ),
            aliases,
        )
    }

    pub fn hidden_command<F, Fut>(
        &mut self,
        command: &str,
        handler: F,
    ) -> Result<&mut Self, HandlerError>
    where
        F: Fn(IncomingCommand, Bot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(HandlerEntry::new(
            command,
            HandlerKind::Hidden,
            handler_fn(handler),
        ))
    }

    pub fn default_handler<F, Fut>(&mut self, handler: F) -> Result<&mut Self, HandlerError>
    where
        F: Fn(IncomingCommand, Bot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(HandlerEntry::new(
            "",
            HandlerKind::Default,
            handler_fn(handler),
        ))
    }

    pub fn system_event<F, Fut>(&mut self, event: &str, handler: F) -> Result<&mut Self, HandlerError>
    where
        F: Fn(IncomingCommand, Bot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(HandlerEntry::new(
            event,
            HandlerKind::SystemEvent,
            handler_fn(handler),
        ))
    }

    /// Handler for `system:chat_created`.
    pub fn chat_created<F, Fut>(&mut self, handler: F) -> Result<&mut Self, HandlerError>
    where
        F: Fn(IncomingCommand, Bot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.system_event("chat_created", handler)
    }

    /// Merges `other` into this registry. Fails without changes when a key or the default handler
    /// collides.
    pub fn include(&mut self, other: HandlerRegistry) -> Result<&mut Self, HandlerError> {
        if let Some(key) = other
            .entries
            .iter()
            .map(|entry| entry.command())
            .find(|key| self.index.contains_key(*key))
        {
            return Err(HandlerError::DuplicateCommand(key.to_string()));
        }
        if self.default.is_some() && other.default.is_some() {
            return Err(HandlerError::DuplicateDefault);
        }

        for entry in other.entries {
            self.index
                .insert(entry.command().to_string(), self.entries.len());
            self.entries.push(entry);
        }
        if other.default.is_some() {
            self.default = other.default;
        }
        Ok(self)
    }

    /// Handler for a user command: exact match, else the default handler. System event entries
    /// are not reachable from here.
    pub fn lookup(&self, command: &str) -> Option<Arc<HandlerEntry>> {
        self.get(command)
            .filter(|entry| !matches!(entry.kind(), HandlerKind::SystemEvent))
            .or_else(|| self.default.clone())
    }

    /// Exact match only.
    pub fn get(&self, command: &str) -> Option<Arc<HandlerEntry>> {
        self.index
            .get(command)
            .map(|&position| Arc::clone(&self.entries[position]))
    }

    pub fn default_entry(&self) -> Option<Arc<HandlerEntry>> {
        self.default.clone()
    }

    /// Registered keys in registration order (the default handler has none).
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.command())
    }

    pub fn len(&self) -> usize {
        self.entries.len() + usize::from(self.default.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible commands for `recipient`, in registration order. Predicates run concurrently and
    /// are re-evaluated on every call.
    pub async fn build_status_listing(
        &self,
        recipient: &StatusRecipient,
        bot: &Bot,
    ) -> Vec<MenuCommand> {
        let items = self
            .entries
            .iter()
            .map(|entry| entry.menu_item(recipient, bot));
        join_all(items).await.into_iter().flatten().collect()
    }
}
