//! Bot facade: inbound ingestion (commands, callbacks, status requests), lifecycle, and the
//! outbound API surface handlers use.
//!
//! [`Bot`] is a cheap handle (`Arc` inside); every handler invocation receives a clone.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use xbot_core::{BotStatus, IncomingCommand, MethodCallback, Result, StatusRecipient, SyncId, XbotError};

use crate::callbacks::{CallbackManager, ResolveOutcome};
use crate::client::{
    AddUsers, BotXMethod, CreateChat, CreateStickerPack, MethodExecutor, MethodOutcome,
    ReqwestTransport, SendDirectNotification, StickerPack, Transport, UnpinMessage,
};
use crate::config::{BotAccount, BotConfig};
use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::observability::{EventSink, TracingSink};
use crate::registry::HandlerRegistry;

struct BotInner {
    accounts: HashMap<Uuid, BotAccount>,
    dispatcher: Dispatcher,
    callbacks: Arc<CallbackManager>,
    executor: MethodExecutor,
}

#[derive(Clone)]
pub struct Bot {
    inner: Arc<BotInner>,
}

impl Bot {
    /// Builds a bot that reports events through `tracing`.
    pub fn new(config: BotConfig, registry: HandlerRegistry, transport: Arc<dyn Transport>) -> Self {
        Self::with_event_sink(config, registry, transport, Arc::new(TracingSink))
    }

    pub fn with_event_sink(
        config: BotConfig,
        registry: HandlerRegistry,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let callbacks = Arc::new(CallbackManager::new(Arc::clone(&sink)));
        let executor = MethodExecutor::new(
            transport,
            Arc::clone(&callbacks),
            config.base.callback_timeout,
        );
        let dispatcher = Dispatcher::new(Arc::new(registry), sink);
        let accounts = config
            .accounts
            .into_iter()
            .map(|account| (account.id, account))
            .collect();

        Self {
            inner: Arc::new(BotInner {
                accounts,
                dispatcher,
                callbacks,
                executor,
            }),
        }
    }

    /// Builds a bot talking to BotX over HTTP with the configured timeout.
    pub fn from_config(config: BotConfig, registry: HandlerRegistry) -> Result<Self> {
        let transport = ReqwestTransport::new(config.base.http_timeout)?;
        Ok(Self::new(config, registry, Arc::new(transport)))
    }

    /// Opens the callback manager and the dispatcher. Call before ingesting traffic; also
    /// reopens a stopped bot.
    pub fn start(&self) {
        self.inner.callbacks.start();
        self.inner.dispatcher.start();
        info!(accounts = self.inner.accounts.len(), "Bot started");
    }

    /// Cancels pending callbacks, then waits for in-flight handlers. Must not be awaited from
    /// inside a handler.
    pub async fn stop(&self) {
        let cancelled = self.inner.callbacks.shutdown();
        self.inner.dispatcher.shutdown().await;
        info!(cancelled_callbacks = cancelled, "Bot stopped");
    }

    /// Parses and dispatches one command payload. Returns once the handler is scheduled.
    #[instrument(skip(self, raw))]
    pub fn on_command(&self, raw: Value) -> Result<DispatchOutcome> {
        let command = IncomingCommand::from_raw(raw)?;
        self.account(command.bot_id)?;
        info!(
            bot_id = %command.bot_id,
            sync_id = %command.sync_id,
            command = %command.command,
            command_type = ?command.command_type,
            "Received command"
        );
        self.inner.dispatcher.dispatch(command, self.clone())
    }

    /// Parses one callback payload and hands it to the callback manager. Orphans are `Ok`.
    #[instrument(skip(self, raw))]
    pub fn on_callback(&self, raw: Value) -> Result<ResolveOutcome> {
        let callback: MethodCallback = serde_json::from_value(raw)
            .map_err(|e| XbotError::MalformedCallback(e.to_string()))?;
        debug!(
            sync_id = %callback.sync_id(),
            status = callback.status(),
            "Received callback"
        );
        Ok(self.inner.callbacks.resolve(callback))
    }

    /// Status listing for the recipient described by the query parameters.
    #[instrument(skip(self, query))]
    pub async fn on_status(&self, query: &HashMap<String, String>) -> Result<BotStatus> {
        let recipient = StatusRecipient::from_query(query)?;
        self.account(recipient.bot_id)?;
        let commands = self
            .inner
            .dispatcher
            .registry()
            .build_status_listing(&recipient, self)
            .await;
        debug!(bot_id = %recipient.bot_id, visible = commands.len(), "Built status");
        Ok(BotStatus::new(commands))
    }

    pub fn account(&self, bot_id: Uuid) -> Result<&BotAccount> {
        self.inner
            .accounts
            .get(&bot_id)
            .ok_or(XbotError::UnknownBotAccount(bot_id))
    }

    pub fn callbacks(&self) -> &CallbackManager {
        &self.inner.callbacks
    }

    pub fn registry(&self) -> &HandlerRegistry {
        self.inner.dispatcher.registry()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Executes any [`BotXMethod`] on behalf of `bot_id`.
    pub async fn call<M: BotXMethod>(
        &self,
        bot_id: Uuid,
        method: &M,
        wait_callback: bool,
        callback_timeout: Option<Duration>,
    ) -> Result<MethodOutcome<M::Result>> {
        let account = self.account(bot_id)?;
        let outcome = self
            .inner
            .executor
            .execute(account, method, wait_callback, callback_timeout)
            .await?;
        Ok(outcome)
    }

    /// Sends a text message to a chat. With `wait_callback`, returns after delivery is confirmed.
    pub async fn send_message(
        &self,
        bot_id: Uuid,
        chat_id: Uuid,
        body: impl Into<String>,
        wait_callback: bool,
        callback_timeout: Option<Duration>,
    ) -> Result<SyncId> {
        let method = SendDirectNotification::new(chat_id, body);
        let outcome = self
            .call(bot_id, &method, wait_callback, callback_timeout)
            .await?;
        Ok(outcome.result.sync_id)
    }

    /// Replies into the chat `command` came from and waits for delivery.
    pub async fn answer_message(
        &self,
        command: &IncomingCommand,
        body: impl Into<String>,
    ) -> Result<SyncId> {
        let chat_id = command.chat.id.ok_or_else(|| {
            XbotError::MalformedCommand("command has no chat to answer to".to_string())
        })?;
        self.send_message(command.bot_id, chat_id, body, true, None)
            .await
    }

    /// Creates a chat and returns its id.
    pub async fn create_chat(&self, bot_id: Uuid, request: CreateChat) -> Result<Uuid> {
        let outcome = self.call(bot_id, &request, false, None).await?;
        Ok(outcome.result.chat_id)
    }

    pub async fn add_users_to_chat(
        &self,
        bot_id: Uuid,
        chat_id: Uuid,
        huids: Vec<Uuid>,
    ) -> Result<()> {
        let method = AddUsers {
            group_chat_id: chat_id,
            user_huids: huids,
        };
        self.call(bot_id, &method, false, None).await?;
        Ok(())
    }

    pub async fn unpin_message(&self, bot_id: Uuid, chat_id: Uuid) -> Result<()> {
        self.call(bot_id, &UnpinMessage { chat_id }, false, None)
            .await?;
        Ok(())
    }

    pub async fn create_sticker_pack(
        &self,
        bot_id: Uuid,
        name: impl Into<String>,
    ) -> Result<StickerPack> {
        let method = CreateStickerPack { name: name.into() };
        let outcome = self.call(bot_id, &method, false, None).await?;
        Ok(outcome.result)
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("accounts", &self.inner.accounts.keys().collect::<Vec<_>>())
            .field("handlers", &self.registry().len())
            .field("pending_callbacks", &self.inner.callbacks.pending_count())
            .finish()
    }
}
