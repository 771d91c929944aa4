/// How a leaderboard table that is not joined against `Users` stores the
/// player's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameColumn {
    /// The `user_id` column holds the display name itself.
    UserId,
    /// A dedicated `username` column.
    Username,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardDefinition {
    pub key: &'static str,
    pub display_name: &'static str,
    pub table_name: &'static str,
    pub requires_user_join: bool,
    /// Only consulted when `requires_user_join` is false.
    pub name_column: NameColumn,
}

// Order here is the order of the options in the selection menu.
const LEADERBOARDS: &[LeaderboardDefinition] = &[
    LeaderboardDefinition {
        key: "general",
        display_name: "General Leaderboard",
        table_name: "Leaderboard",
        requires_user_join: true,
        name_column: NameColumn::UserId,
    },
    LeaderboardDefinition {
        key: "3ull",
        display_name: "Playa3ull",
        table_name: "3ull_tournament_leaderboard",
        requires_user_join: false,
        name_column: NameColumn::UserId,
    },
    LeaderboardDefinition {
        key: "dragon",
        display_name: "Ancient Dragon Alliance",
        table_name: "leaderboard_dragon",
        requires_user_join: false,
        name_column: NameColumn::Username,
    },
    LeaderboardDefinition {
        key: "gingerbread",
        display_name: "Gingerbread Squad",
        table_name: "leaderboard_gingerbread",
        requires_user_join: false,
        name_column: NameColumn::Username,
    },
    LeaderboardDefinition {
        key: "promo",
        display_name: "Promo Facie",
        table_name: "leaderboard_promo",
        requires_user_join: false,
        name_column: NameColumn::Username,
    },
    LeaderboardDefinition {
        key: "squeak",
        display_name: "World of Squeak",
        table_name: "leaderboard_squeak",
        requires_user_join: false,
        name_column: NameColumn::Username,
    },
    LeaderboardDefinition {
        key: "algo apes",
        display_name: "Algo Apes",
        table_name: "algoapes_tournament_leaderboard",
        requires_user_join: false,
        name_column: NameColumn::Username,
    },
];

/// Fixed set of leaderboards the bot can show. Built once at startup and
/// shared read-only between the command and the fetcher.
#[derive(Debug, Clone)]
pub struct Registry {
    definitions: Vec<LeaderboardDefinition>,
}

impl Registry {
    pub fn new(definitions: Vec<LeaderboardDefinition>) -> Self {
        Registry { definitions }
    }

    pub fn lookup(&self, key: &str) -> Option<&LeaderboardDefinition> {
        self.definitions.iter().find(|def| def.key == key)
    }

    /// Definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LeaderboardDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new(LEADERBOARDS.to_vec())
    }
}
