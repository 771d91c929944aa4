use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Connection, Row};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::registry::{LeaderboardDefinition, NameColumn, Registry};

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub display_name: String,
    pub kills: i64,
    pub levels_reached: i64,
}

#[derive(Debug)]
pub enum FetchError {
    UnknownLeaderboard(String),
    DatabaseUnavailable(sqlx::Error),
    QueryFailed(sqlx::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::UnknownLeaderboard(key) => write!(f, "No leaderboard registered for key '{}'", key),
            FetchError::DatabaseUnavailable(e) => write!(f, "Database connection failed: {}", e),
            FetchError::QueryFailed(e) => write!(f, "Database query failed: {}", e),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::UnknownLeaderboard(_) => None,
            FetchError::DatabaseUnavailable(e) | FetchError::QueryFailed(e) => Some(e),
        }
    }
}

/// The three table layouts the leaderboards come in. Every statement binds
/// exactly one parameter, the row limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardQuery {
    /// Scores keyed by `user_id`, names resolved through `Users`.
    Joined { table: &'static str },
    /// The `user_id` column already holds the player name.
    DirectUserId { table: &'static str },
    UsernameColumn { table: &'static str },
}

impl LeaderboardQuery {
    pub fn for_definition(definition: &LeaderboardDefinition) -> Self {
        let table = definition.table_name;
        if definition.requires_user_join {
            return LeaderboardQuery::Joined { table };
        }
        match definition.name_column {
            NameColumn::UserId => LeaderboardQuery::DirectUserId { table },
            NameColumn::Username => LeaderboardQuery::UsernameColumn { table },
        }
    }

    // Table names only ever come from the static registry. Projections are
    // cast to CHAR/SIGNED so TEXT, TINYINT or DECIMAL columns still decode
    // through the Any driver.
    pub fn sql(&self) -> String {
        match self {
            LeaderboardQuery::Joined { table } => format!(
                r#"
                SELECT CAST(u.nickname AS CHAR) AS nickname,
                       CAST(l.kills AS SIGNED) AS kills,
                       CAST(l.levels_reached AS SIGNED) AS levels_reached
                FROM `{}` l
                JOIN Users u ON l.user_id = u.user_id
                ORDER BY CAST(l.levels_reached AS SIGNED) DESC, CAST(l.kills AS SIGNED) DESC
                LIMIT ?
                "#,
                table
            ),
            LeaderboardQuery::DirectUserId { table } => format!(
                r#"
                SELECT CAST(user_id AS CHAR) AS nickname,
                       CAST(kills AS SIGNED) AS kills,
                       CAST(levels_reached AS SIGNED) AS levels_reached
                FROM `{}`
                ORDER BY CAST(levels_reached AS SIGNED) DESC, CAST(kills AS SIGNED) DESC
                LIMIT ?
                "#,
                table
            ),
            LeaderboardQuery::UsernameColumn { table } => format!(
                r#"
                SELECT CAST(username AS CHAR) AS nickname,
                       CAST(kills AS SIGNED) AS kills,
                       CAST(levels_reached AS SIGNED) AS levels_reached
                FROM `{}`
                ORDER BY CAST(levels_reached AS SIGNED) DESC, CAST(kills AS SIGNED) DESC
                LIMIT ?
                "#,
                table
            ),
        }
    }
}

/// Anything that can hand back the top rows of a leaderboard. Implementations
/// never fail: problems are logged and reported as an empty list.
#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    async fn fetch_top(&self, key: &str, limit: u32) -> Vec<LeaderboardRow>;
}

/// Leaderboard reader. Holds no connection between calls; every fetch opens
/// its own and closes it before returning.
#[derive(Debug, Clone)]
pub struct Database {
    url: String,
    registry: Arc<Registry>,
}

impl Database {
    pub fn new(url: impl Into<String>, registry: Arc<Registry>) -> Self {
        sqlx::any::install_default_drivers();
        Database {
            url: url.into(),
            registry,
        }
    }

    async fn connect(&self) -> Result<AnyConnection, FetchError> {
        AnyConnection::connect(&self.url)
            .await
            .map_err(FetchError::DatabaseUnavailable)
    }

    /// Opens a connection, pings and closes it. Used once at startup.
    pub async fn check_connection(&self) -> Result<(), FetchError> {
        let mut conn = self.connect().await?;
        let ping = conn.ping().await.map_err(FetchError::QueryFailed);
        if let Err(e) = conn.close().await {
            warn!("Error closing database connection: {}", e);
        }
        ping
    }

    pub async fn try_fetch_top(&self, key: &str, limit: u32) -> Result<Vec<LeaderboardRow>, FetchError> {
        let definition = self
            .registry
            .lookup(key)
            .ok_or_else(|| FetchError::UnknownLeaderboard(key.to_string()))?;

        if limit == 0 {
            return Ok(Vec::new());
        }

        let query = LeaderboardQuery::for_definition(definition);
        let mut conn = self.connect().await?;
        let result = run_query(&mut conn, query, limit).await;

        // Dropping the connection also closes the socket, but a clean close
        // lets the server release the session immediately.
        if let Err(e) = conn.close().await {
            warn!("Error closing database connection for {}: {}", key, e);
        }

        result
    }
}

async fn run_query(
    conn: &mut AnyConnection,
    query: LeaderboardQuery,
    limit: u32,
) -> Result<Vec<LeaderboardRow>, FetchError> {
    let rows = sqlx::query(&query.sql())
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(FetchError::QueryFailed)?;

    rows.iter()
        .map(|row| row_to_entry(row).map_err(FetchError::QueryFailed))
        .collect()
}

fn row_to_entry(row: &AnyRow) -> Result<LeaderboardRow, sqlx::Error> {
    Ok(LeaderboardRow {
        display_name: row.try_get::<Option<String>, _>("nickname")?.unwrap_or_default(),
        kills: row.try_get("kills")?,
        levels_reached: row.try_get("levels_reached")?,
    })
}

#[async_trait]
impl LeaderboardSource for Database {
    async fn fetch_top(&self, key: &str, limit: u32) -> Vec<LeaderboardRow> {
        match self.try_fetch_top(key, limit).await {
            Ok(rows) => {
                info!("Found {} results for {}", rows.len(), key);
                rows
            }
            Err(e) => {
                error!("Fetching leaderboard {} failed: {}", key, e);
                Vec::new()
            }
        }
    }
}
