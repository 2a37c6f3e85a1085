// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update dispatch: long polling into the engine's flows.
//!
//! Private-chat traffic goes to the conversation orchestrator, support
//! workspace traffic to the operator flow. Callback data is decoded into
//! typed actions; anything undecodable (stale keyboards from older
//! deployments) is answered and dropped.

use std::sync::Arc;

use opsdesk_core::action::CallbackAction;
use opsdesk_core::types::ChatId;
use opsdesk_engine::{ConversationFlow, OperatorFlow};
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info};

use crate::extract;

/// Everything the endpoints need, injected through dptree.
pub struct AppContext {
    pub conversation: Arc<ConversationFlow>,
    pub operator: Arc<OperatorFlow>,
    pub support_channel: ChatId,
}

/// Bot commands in private chats.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    /// Connect to a project (optionally with an invite code).
    Start(String),
    /// Show help.
    Help,
    /// Show your Telegram id.
    Myid,
    /// View or switch your project.
    Project,
    /// Operator: your active tickets.
    Mytickets,
    /// Operator: unassigned tickets.
    Unassigned,
}

/// Run the dispatcher until shutdown.
pub async fn run(bot: Bot, ctx: Arc<AppContext>) {
    info!("starting Telegram long polling");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .default_handler(|_| async {}) // Silently ignore other update kinds
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(
    _bot: Bot,
    msg: Message,
    ctx: Arc<AppContext>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return respond(()); // channel posts etc.
    };
    if user.is_bot {
        return respond(());
    }

    if extract::is_dm(&msg) {
        let profile = extract::profile(user, msg.chat.id.0);

        if let Some(text) = msg.text()
            && text.starts_with('/')
        {
            let result = match Command::parse(text, "") {
                Ok(Command::Start(code)) => {
                    let code = code.trim();
                    ctx.conversation
                        .on_start(&profile, (!code.is_empty()).then_some(code))
                        .await
                }
                Ok(Command::Help) => ctx.conversation.help(&profile).await,
                Ok(Command::Myid) => ctx.conversation.myid(&profile).await,
                Ok(Command::Project) => ctx.conversation.project_menu(&profile).await,
                Ok(Command::Mytickets) => ctx.operator.my_tickets(&profile).await,
                Ok(Command::Unassigned) => ctx.operator.unassigned(&profile).await,
                // Unknown slash text falls through to the normal flow.
                Err(_) => {
                    ctx.conversation
                        .on_text(&profile, i64::from(msg.id.0), text)
                        .await
                }
            };
            if let Err(e) = result {
                error!(user_id = profile.user_id, error = %e, "command handling failed");
            }
            return respond(());
        }

        let Some(content) = extract::content(&msg) else {
            debug!(msg_id = msg.id.0, "ignoring unsupported message type");
            return respond(());
        };
        let result = match extract::as_attachment(&content) {
            Some(attachment) => ctx.conversation.on_attachment(&profile, attachment).await,
            None => {
                let text = content.text.clone().unwrap_or_default();
                ctx.conversation
                    .on_text(&profile, content.message_id, &text)
                    .await
            }
        };
        if let Err(e) = result {
            error!(user_id = profile.user_id, error = %e, "client message handling failed");
        }
        return respond(());
    }

    // Support workspace: only messages inside a thread matter.
    if msg.chat.id.0 == ctx.support_channel.0 {
        let Some(thread) = msg.thread_id else {
            return respond(());
        };
        let Some(content) = extract::content(&msg) else {
            return respond(());
        };
        let profile = extract::profile(user, msg.chat.id.0);
        if let Err(e) = ctx
            .operator
            .on_thread_message(&profile, i64::from(thread.0.0), content)
            .await
        {
            error!(user_id = profile.user_id, error = %e, "thread message handling failed");
        }
    }

    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<AppContext>,
) -> ResponseResult<()> {
    let Some(action) = q.data.as_deref().and_then(CallbackAction::decode) else {
        debug!(data = ?q.data, "undecodable callback data");
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return respond(());
    };

    let message = q.message.as_ref().and_then(|m| m.regular_message());
    let chat_id = message
        .map(|m| m.chat.id.0)
        .unwrap_or(q.from.id.0 as i64);
    let thread_id = message.and_then(|m| m.thread_id).map(|t| i64::from(t.0.0));
    let profile = extract::profile(&q.from, chat_id);

    let result = if action.is_operator_action() {
        ctx.operator
            .on_callback(&profile, &q.id.0, thread_id, action)
            .await
    } else {
        // Client actions answer through their own sends; the press itself
        // lands in the user's DM chat.
        let profile = extract::profile(&q.from, q.from.id.0 as i64);
        ctx.conversation.on_callback(&profile, action).await
    };
    if let Err(e) = result {
        error!(user_id = q.from.id.0, error = %e, "callback handling failed");
    }

    // Stop the button spinner; a second answer after an alert is
    // harmless and ignored.
    let _ = bot.answer_callback_query(q.id).await;
    respond(())
}
