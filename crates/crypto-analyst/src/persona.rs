//! Personas
//!
//! Display identity of the analyst and the prompt preamble built from it.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Id of the persona shipped by default
pub const DEFAULT_CHARACTER_ID: &str = "nova";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Accent color (CSS)
    pub color: String,
    /// Header gradient (CSS)
    pub gradient: String,
    /// Avatar image path
    pub image: String,
}

impl Character {
    /// Greeting appended when a conversation opens
    pub fn welcome_message(&self) -> String {
        format!(
            "Hello! I'm {}, your Enhanced Crypto Analyst. I can provide comprehensive analysis of any cryptocurrency or token. What would you like to analyze today?",
            self.name
        )
    }
}

/// Read-only lookup of personas and their unlock state
pub trait CharacterDirectory: Send + Sync {
    fn character(&self, id: &str) -> Option<Character>;

    fn is_unlocked(&self, id: &str) -> bool;
}

/// In-memory directory, everything unlocked
#[derive(Clone, Debug)]
pub struct StaticCharacterDirectory {
    characters: HashMap<String, Character>,
}

impl Default for StaticCharacterDirectory {
    fn default() -> Self {
        Self::new(vec![Character {
            id: DEFAULT_CHARACTER_ID.into(),
            name: "Nova".into(),
            color: "#7c3aed".into(),
            gradient: "linear-gradient(135deg, #7c3aed 0%, #2563eb 100%)".into(),
            image: "/characters/nova.png".into(),
        }])
    }
}

impl StaticCharacterDirectory {
    pub fn new(characters: Vec<Character>) -> Self {
        Self {
            characters: characters.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

impl CharacterDirectory for StaticCharacterDirectory {
    fn character(&self, id: &str) -> Option<Character> {
        self.characters.get(id).cloned()
    }

    fn is_unlocked(&self, id: &str) -> bool {
        self.characters.contains_key(id)
    }
}

/// System prompt for language-model answers
pub fn system_preamble(character: &Character, today: NaiveDate) -> String {
    format!(
        r"You are {name}, an expert cryptocurrency analyst. Today's date is {date}.

Answer in a measured, analytic tone. When discussing a token:
- Open with a short **Executive Summary**
- Use `###` sections such as Market Structure, Technical Outlook and Fundamental Assessment
- Use bullet lists with **bold** labels for figures
- Be explicit about uncertainty and never promise returns

End every analysis with: This analysis represents educational information based on available data, not financial advice.",
        name = character.name,
        date = today.format("%B %-d, %Y"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directory_has_nova() {
        let directory = StaticCharacterDirectory::default();
        let nova = directory.character("nova").unwrap();
        assert_eq!(nova.name, "Nova");
        assert!(directory.is_unlocked("nova"));
        assert!(directory.character("unknown").is_none());
        assert!(!directory.is_unlocked("unknown"));
    }

    #[test]
    fn test_welcome_message_uses_name() {
        let nova = StaticCharacterDirectory::default().character("nova").unwrap();
        assert!(nova.welcome_message().starts_with("Hello! I'm Nova, your Enhanced Crypto Analyst."));
    }

    #[test]
    fn test_preamble_includes_name_and_date() {
        let nova = StaticCharacterDirectory::default().character("nova").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let preamble = system_preamble(&nova, date);

        assert!(preamble.starts_with("You are Nova"));
        assert!(preamble.contains("March 5, 2024"));
    }
}
