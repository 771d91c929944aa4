use chrono::{DateTime, Duration, Utc};
use futures_util::{Stream, StreamExt};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

use crate::cooldown::Clock;
use crate::registry::Registry;

pub const MENU_TIMEOUT_SECONDS: i64 = 300;
const PLACEHOLDER: &str = "Choose a leaderboard to view...";

/// Inactivity tracking for one posted menu. Each accepted selection resets
/// the timer; once it lapses the menu is dead for good.
pub struct MenuSession {
    clock: Arc<dyn Clock>,
    timeout: Duration,
    last_activity: DateTime<Utc>,
    expired: bool,
}

impl MenuSession {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MenuSession::with_timeout(clock, Duration::seconds(MENU_TIMEOUT_SECONDS))
    }

    pub fn with_timeout(clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        let last_activity = clock.now();
        MenuSession {
            clock,
            timeout,
            last_activity,
            expired: false,
        }
    }

    /// Whether a selection arriving now should be handled.
    pub fn accept(&mut self) -> bool {
        if self.expired {
            return false;
        }
        let now = self.clock.now();
        if now.signed_duration_since(self.last_activity) >= self.timeout {
            self.expired = true;
            return false;
        }
        self.last_activity = now;
        true
    }

    pub fn expire(&mut self) {
        self.expired = true;
    }

    #[cfg(test)]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Time left before the menu expires, for bounding the collector wait.
    pub fn remaining(&self) -> std::time::Duration {
        if self.expired {
            return std::time::Duration::ZERO;
        }
        let elapsed = self.clock.now().signed_duration_since(self.last_activity);
        (self.timeout - elapsed).to_std().unwrap_or(std::time::Duration::ZERO)
    }

    /// Waits for the next selection on an already-registered stream, bounded
    /// by the remaining inactivity time. `None` once the menu has expired or
    /// the stream is closed; the session stays expired afterwards.
    pub async fn next_selection<S>(&mut self, selections: &mut S) -> Option<S::Item>
    where
        S: Stream + Unpin,
    {
        if self.expired {
            return None;
        }
        match tokio::time::timeout(self.remaining(), selections.next()).await {
            Ok(Some(item)) => {
                if self.accept() {
                    Some(item)
                } else {
                    None
                }
            }
            Ok(None) | Err(_) => {
                self.expire();
                None
            }
        }
    }
}

pub fn menu_custom_id(invocation_id: u64) -> String {
    format!("graveyard_select_{}", invocation_id)
}

/// Single-select dropdown with one option per leaderboard, valued by key.
pub fn select_menu(registry: &Registry, custom_id: &str, disabled: bool) -> serenity::CreateSelectMenu {
    let options = registry
        .iter()
        .map(|def| serenity::CreateSelectMenuOption::new(def.display_name, def.key))
        .collect();

    serenity::CreateSelectMenu::new(custom_id, serenity::CreateSelectMenuKind::String { options })
        .placeholder(PLACEHOLDER)
        .min_values(1)
        .max_values(1)
        .disabled(disabled)
}

pub fn menu_components(registry: &Registry, custom_id: &str, disabled: bool) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::SelectMenu(select_menu(
        registry, custom_id, disabled,
    ))]
}

/// The key picked in a string-select interaction, if there is one.
pub fn selected_key(kind: &serenity::ComponentInteractionDataKind) -> Option<&str> {
    match kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => {
            values.first().map(String::as_str)
        }
        _ => None,
    }
}
