use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};

use crate::database::{LeaderboardSource, DEFAULT_LIMIT};
use crate::formatter::{self, LeaderboardDocument};
use crate::registry::Registry;
use crate::Error;

pub const FAILURE_NOTICE: &str = "❌ Something went wrong!";

/// The replies available to a menu selection. Once `acknowledge` succeeds
/// the immediate response slot is used up and only follow-ups remain.
#[async_trait]
pub trait SelectionResponder: Send + Sync {
    async fn acknowledge(&self) -> Result<(), Error>;
    async fn send_public(&self, document: &LeaderboardDocument) -> Result<(), Error>;
    async fn respond_ephemeral(&self, content: &str) -> Result<(), Error>;
    async fn follow_up_ephemeral(&self, content: &str) -> Result<(), Error>;
}

pub struct InteractionResponder {
    http: Arc<serenity::Http>,
    interaction: serenity::ComponentInteraction,
}

impl InteractionResponder {
    pub fn new(http: Arc<serenity::Http>, interaction: serenity::ComponentInteraction) -> Self {
        InteractionResponder { http, interaction }
    }
}

#[async_trait]
impl SelectionResponder for InteractionResponder {
    async fn acknowledge(&self) -> Result<(), Error> {
        self.interaction.defer(&self.http).await?;
        Ok(())
    }

    async fn send_public(&self, document: &LeaderboardDocument) -> Result<(), Error> {
        self.interaction
            .create_followup(
                &self.http,
                serenity::CreateInteractionResponseFollowup::new()
                    .embed(document.to_embed())
                    .ephemeral(false),
            )
            .await?;
        Ok(())
    }

    async fn respond_ephemeral(&self, content: &str) -> Result<(), Error> {
        self.interaction
            .create_response(
                &self.http,
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content(content)
                        .ephemeral(true),
                ),
            )
            .await?;
        Ok(())
    }

    async fn follow_up_ephemeral(&self, content: &str) -> Result<(), Error> {
        self.interaction
            .create_followup(
                &self.http,
                serenity::CreateInteractionResponseFollowup::new()
                    .content(content)
                    .ephemeral(true),
            )
            .await?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum SelectionOutcome {
    Delivered { rows: usize },
    /// Nothing was sent yet; the immediate response is still available.
    FailedBeforeAck(Error),
    /// Acknowledged, so the failure notice has to go out as a follow-up.
    FailedAfterAck(Error),
}

/// Acknowledge, fetch, render, send. Stops at the first failure and reports
/// which reply channel is still open.
pub async fn handle_selection(
    responder: &dyn SelectionResponder,
    source: &dyn LeaderboardSource,
    registry: &Registry,
    key: &str,
) -> SelectionOutcome {
    if let Err(e) = responder.acknowledge().await {
        return SelectionOutcome::FailedBeforeAck(e);
    }

    match deliver(responder, source, registry, key).await {
        Ok(rows) => SelectionOutcome::Delivered { rows },
        Err(e) => SelectionOutcome::FailedAfterAck(e),
    }
}

async fn deliver(
    responder: &dyn SelectionResponder,
    source: &dyn LeaderboardSource,
    registry: &Registry,
    key: &str,
) -> Result<usize, Error> {
    let rows = source.fetch_top(key, DEFAULT_LIMIT).await;
    info!("Got {} records for {}", rows.len(), key);

    let definition = registry
        .lookup(key)
        .ok_or_else(|| format!("Unknown leaderboard selected: {}", key))?;
    let document = formatter::render(definition, &rows);

    responder.send_public(&document).await?;
    Ok(rows.len())
}

/// Best-effort generic notice for a failed selection. Errors here are only
/// logged.
pub async fn report_failure(responder: &dyn SelectionResponder, outcome: &SelectionOutcome) {
    let sent = match outcome {
        SelectionOutcome::Delivered { .. } => return,
        SelectionOutcome::FailedBeforeAck(e) => {
            error!("Error in selection before acknowledging: {}", e);
            responder.respond_ephemeral(FAILURE_NOTICE).await
        }
        SelectionOutcome::FailedAfterAck(e) => {
            error!("Error in selection: {}", e);
            responder.follow_up_ephemeral(FAILURE_NOTICE).await
        }
    };

    if let Err(e) = sent {
        error!("Could not send error message: {}", e);
    }
}

pub async fn on_select(
    responder: &dyn SelectionResponder,
    source: &dyn LeaderboardSource,
    registry: &Registry,
    key: &str,
) -> SelectionOutcome {
    let outcome = handle_selection(responder, source, registry, key).await;
    match &outcome {
        SelectionOutcome::Delivered { rows } => info!("Sent leaderboard for {} ({} rows)", key, rows),
        _ => report_failure(responder, &outcome).await,
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::LeaderboardRow;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingResponder {
        calls: Mutex<Vec<String>>,
        documents: Mutex<Vec<LeaderboardDocument>>,
        fail_ack: bool,
        fail_send: bool,
        fail_notice: bool,
    }

    impl RecordingResponder {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SelectionResponder for RecordingResponder {
        async fn acknowledge(&self) -> Result<(), Error> {
            self.record("ack");
            if self.fail_ack {
                return Err("interaction expired".into());
            }
            Ok(())
        }

        async fn send_public(&self, document: &LeaderboardDocument) -> Result<(), Error> {
            self.record("send");
            if self.fail_send {
                return Err("missing access".into());
            }
            self.documents.lock().unwrap().push(document.clone());
            Ok(())
        }

        async fn respond_ephemeral(&self, content: &str) -> Result<(), Error> {
            self.record(&format!("respond:{}", content));
            if self.fail_notice {
                return Err("gateway closed".into());
            }
            Ok(())
        }

        async fn follow_up_ephemeral(&self, content: &str) -> Result<(), Error> {
            self.record(&format!("follow_up:{}", content));
            if self.fail_notice {
                return Err("gateway closed".into());
            }
            Ok(())
        }
    }

    struct StaticSource {
        rows: Vec<LeaderboardRow>,
        requested: Mutex<Vec<(String, u32)>>,
    }

    impl StaticSource {
        fn new(rows: Vec<LeaderboardRow>) -> Self {
            StaticSource {
                rows,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LeaderboardSource for StaticSource {
        async fn fetch_top(&self, key: &str, limit: u32) -> Vec<LeaderboardRow> {
            self.requested.lock().unwrap().push((key.to_string(), limit));
            self.rows.clone()
        }
    }

    fn row(name: &str, kills: i64, levels_reached: i64) -> LeaderboardRow {
        LeaderboardRow {
            display_name: name.to_string(),
            kills,
            levels_reached,
        }
    }

    fn general_only() -> Registry {
        let general = Registry::default().lookup("general").cloned().unwrap();
        Registry::new(vec![general])
    }

    #[tokio::test]
    async fn selection_sends_rendered_board() {
        let responder = RecordingResponder::default();
        let source = StaticSource::new(vec![row("Ann", 1500, 20), row("Bo", 900, 20)]);
        let registry = general_only();

        let outcome = on_select(&responder, &source, &registry, "general").await;

        assert!(matches!(outcome, SelectionOutcome::Delivered { rows: 2 }));
        assert_eq!(responder.calls(), vec!["ack", "send"]);
        assert_eq!(
            *source.requested.lock().unwrap(),
            vec![("general".to_string(), DEFAULT_LIMIT)]
        );

        let documents = responder.documents.lock().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, "General Leaderboard");
        assert_eq!(
            documents[0].description,
            "1. **Ann** - 20 waves survived, 1,500 enemies destroyed\n\
             2. **Bo** - 20 waves survived, 900 enemies destroyed"
        );
    }

    #[tokio::test]
    async fn empty_fetch_still_sends_notice_board() {
        let responder = RecordingResponder::default();
        let source = StaticSource::new(Vec::new());

        let outcome = on_select(&responder, &source, &Registry::default(), "squeak").await;

        assert!(matches!(outcome, SelectionOutcome::Delivered { rows: 0 }));
        let documents = responder.documents.lock().unwrap();
        assert_eq!(documents[0].description, formatter::EMPTY_NOTICE);
        assert_eq!(documents[0].title, "World of Squeak");
    }

    #[tokio::test]
    async fn send_failure_is_reported_as_follow_up() {
        let responder = RecordingResponder {
            fail_send: true,
            ..Default::default()
        };
        let source = StaticSource::new(vec![row("Ann", 1, 1)]);

        let outcome = on_select(&responder, &source, &Registry::default(), "general").await;

        assert!(matches!(outcome, SelectionOutcome::FailedAfterAck(_)));
        assert_eq!(
            responder.calls(),
            vec!["ack".to_string(), "send".to_string(), format!("follow_up:{}", FAILURE_NOTICE)]
        );
    }

    #[tokio::test]
    async fn ack_failure_uses_immediate_response() {
        let responder = RecordingResponder {
            fail_ack: true,
            ..Default::default()
        };
        let source = StaticSource::new(Vec::new());

        let outcome = on_select(&responder, &source, &Registry::default(), "general").await;

        assert!(matches!(outcome, SelectionOutcome::FailedBeforeAck(_)));
        assert_eq!(
            responder.calls(),
            vec!["ack".to_string(), format!("respond:{}", FAILURE_NOTICE)]
        );
        // nothing fetched when the interaction could not be acknowledged
        assert!(source.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_key_fails_with_generic_notice() {
        let responder = RecordingResponder::default();
        let source = StaticSource::new(Vec::new());

        let outcome = on_select(&responder, &source, &Registry::default(), "missing").await;

        assert!(matches!(outcome, SelectionOutcome::FailedAfterAck(_)));
        assert_eq!(
            responder.calls(),
            vec!["ack".to_string(), format!("follow_up:{}", FAILURE_NOTICE)]
        );
    }

    #[tokio::test]
    async fn failing_notice_is_swallowed() {
        let responder = RecordingResponder {
            fail_send: true,
            fail_notice: true,
            ..Default::default()
        };
        let source = StaticSource::new(Vec::new());

        let outcome = on_select(&responder, &source, &Registry::default(), "dragon").await;

        assert!(matches!(outcome, SelectionOutcome::FailedAfterAck(_)));
        assert_eq!(responder.calls().len(), 3);
    }
}
