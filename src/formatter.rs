use poise::serenity_prelude as serenity;

use crate::database::LeaderboardRow;
use crate::registry::{LeaderboardDefinition, Registry};

pub const FOOTER: &str = "Graveyard Antics TD";
pub const EMPTY_NOTICE: &str = "No players found in this leaderboard.";
const COLOUR: u32 = 0x000000;

const MENU_TITLE: &str = "🏆 Graveyard Antics TD Leaderboards 🏆";
const MENU_DESCRIPTION: &str = "Select a leaderboard from the dropdown menu below to view the top 10 players & scores for that leaderboard";
const MENU_FIELD: &str = "Available Leaderboards";
const MENU_FOOTER: &str = "Graveyard Antics TD | Menu expires in 5 minutes";

/// Platform-independent description of an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardDocument {
    pub title: String,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub footer: String,
    pub colour: u32,
}

impl LeaderboardDocument {
    pub fn to_embed(&self) -> serenity::CreateEmbed {
        let mut embed = serenity::CreateEmbed::new()
            .title(&self.title)
            .description(&self.description)
            .colour(self.colour)
            .footer(serenity::CreateEmbedFooter::new(&self.footer));
        for (name, value) in &self.fields {
            embed = embed.field(name, value, false);
        }
        embed
    }
}

pub fn render(definition: &LeaderboardDefinition, rows: &[LeaderboardRow]) -> LeaderboardDocument {
    let description = if rows.is_empty() {
        EMPTY_NOTICE.to_string()
    } else {
        rows.iter()
            .enumerate()
            .map(|(i, row)| ranked_line(i + 1, row))
            .collect::<Vec<_>>()
            .join("\n")
    };

    LeaderboardDocument {
        title: definition.display_name.to_string(),
        description,
        fields: Vec::new(),
        footer: FOOTER.to_string(),
        colour: COLOUR,
    }
}

/// The message the selection menu is attached to.
pub fn render_menu(registry: &Registry) -> LeaderboardDocument {
    let names = registry
        .iter()
        .map(|def| def.display_name)
        .collect::<Vec<_>>()
        .join("\n");

    LeaderboardDocument {
        title: MENU_TITLE.to_string(),
        description: MENU_DESCRIPTION.to_string(),
        fields: vec![(MENU_FIELD.to_string(), names)],
        footer: MENU_FOOTER.to_string(),
        colour: COLOUR,
    }
}

fn ranked_line(rank: usize, row: &LeaderboardRow) -> String {
    format!(
        "{}. **{}** - {} waves survived, {} enemies destroyed",
        rank,
        row.display_name,
        row.levels_reached,
        group_thousands(row.kills)
    )
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
