pub mod selection;

use poise::serenity_prelude as serenity;
use poise::CreateReply;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::LeaderboardSource;
use crate::formatter;
use crate::menu::{self, MenuSession};
use crate::{Context, Error};
use selection::InteractionResponder;

/// Shows the dropdown for picking a leaderboard
#[poise::command(prefix_command, aliases("gy"))]
pub async fn graveyard(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    if let Err(waiting) = data.cooldown.try_acquire().await {
        info!("Cooldown active, ignoring !graveyard from {}", ctx.author().name);
        ctx.say(waiting.message()).await?;
        return Ok(());
    }

    info!("!graveyard command triggered by {}", ctx.author().name);

    let custom_id = menu::menu_custom_id(ctx.id());
    let embed = formatter::render_menu(&data.registry).to_embed();
    let reply = ctx
        .send(
            CreateReply::default()
                .embed(embed.clone())
                .components(menu::menu_components(&data.registry, &custom_id, false)),
        )
        .await?;
    let message_id = reply.message().await?.id;

    // Registered once so selections arriving while one is being dispatched
    // are queued rather than missed.
    let mut selections = Box::pin(
        serenity::ComponentInteractionCollector::new(ctx.serenity_context())
            .message_id(message_id)
            .custom_ids(vec![custom_id.clone()])
            .stream(),
    );

    let mut session = MenuSession::new(data.clock.clone());
    while let Some(interaction) = session.next_selection(&mut selections).await {
        let Some(key) = menu::selected_key(&interaction.data.kind).map(str::to_string) else {
            continue;
        };
        info!("Dropdown selection {} by {}", key, interaction.user.name);

        let responder = InteractionResponder::new(ctx.serenity_context().http.clone(), interaction);
        let source: Arc<dyn LeaderboardSource> = data.database.clone();
        let registry = data.registry.clone();
        // Selections are independent; a slow query must not hold up the menu.
        tokio::spawn(async move {
            selection::on_select(&responder, source.as_ref(), &registry, &key).await;
        });
    }

    info!("Leaderboard menu {} expired", custom_id);

    let disabled = CreateReply::default()
        .embed(embed)
        .components(menu::menu_components(&data.registry, &custom_id, true));
    if let Err(e) = reply.edit(ctx, disabled).await {
        warn!("Could not disable expired menu {}: {}", custom_id, e);
    }

    Ok(())
}
