//! Seed data loading from seeds.toml
//!
//! The seed set defines the default profile, the fixed challenge list and the
//! starter memories a fresh owner sees. Built-in defaults are used when no
//! seeds file is configured; a file may override any section.

use crate::errors::{Error, Result};
use crate::models::{Challenge, Profile, RawMemory};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire seeds.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Profile a new owner starts with
    pub profile: Profile,
    /// Fixed challenge definitions
    pub challenges: Vec<ChallengeSeed>,
    /// Memories shown before the owner adds their own
    pub memories: Vec<MemorySeed>,
}

/// Definition of a single challenge
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeSeed {
    /// Stable challenge id (e.g., `"c1"`)
    pub id: String,
    /// Short title
    pub title: String,
    /// What the couple has to do
    pub description: String,
    /// Points awarded on completion
    pub points: u32,
}

/// A starter memory
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySeed {
    /// Stable memory id (e.g., `"m1"`)
    pub id: String,
    /// Title
    pub title: String,
    /// Free text
    #[serde(default)]
    pub details: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        let challenge = |id: &str, title: &str, points: u32, description: &str| ChallengeSeed {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            points,
        };
        let memory = |id: &str, title: &str, details: &str| MemorySeed {
            id: id.to_string(),
            title: title.to_string(),
            details: details.to_string(),
        };

        Self {
            profile: Profile::default(),
            challenges: vec![
                challenge("c1", "Compliment Blitz", 20, "Give 8 real compliments in 1 minute."),
                challenge("c2", "Meme Duel", 15, "Funniest meme wins dessert rights."),
                challenge("c3", "Dance Break", 30, "2-minute dance, zero excuses."),
                challenge("c4", "Gratitude Ping", 10, "Share one thing you appreciated today."),
            ],
            memories: vec![
                memory(
                    "m1",
                    "First Conversation",
                    "We talked so long that time got jealous.",
                ),
                memory("m2", "First Date", "Nervous energy, effortless vibes."),
                memory(
                    "m3",
                    "Inside Joke Era",
                    "Now we laugh before anyone else understands.",
                ),
            ],
        }
    }
}

impl SeedConfig {
    /// Seed challenges, all not done
    #[must_use]
    pub fn seed_challenges(&self) -> Vec<Challenge> {
        self.challenges
            .iter()
            .map(|seed| Challenge {
                id: seed.id.clone(),
                title: seed.title.clone(),
                description: seed.description.clone(),
                points: seed.points,
                done: false,
                completed_at: None,
            })
            .collect()
    }

    /// Starter memories before normalization
    #[must_use]
    pub fn seed_memories(&self) -> Vec<RawMemory> {
        self.memories
            .iter()
            .map(|seed| RawMemory {
                id: Some(seed.id.clone()),
                title: Some(seed.title.clone()),
                details: Some(seed.details.clone()),
                ..RawMemory::default()
            })
            .collect()
    }

    fn validate(self) -> Result<Self> {
        if let Some(seed) = self.challenges.iter().find(|c| c.points == 0) {
            return Err(Error::Config {
                message: format!("Challenge '{}' must award at least one point", seed.id),
            });
        }
        Ok(self)
    }
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A challenge awards zero points
pub fn load_seed_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read seeds file: {e}"),
    })?;
    parse_seed_config(&contents)
}

/// Parses seed configuration from TOML text
pub fn parse_seed_config(contents: &str) -> Result<SeedConfig> {
    toml::from_str::<SeedConfig>(contents)
        .map_err(|e| Error::Config {
            message: format!("Failed to parse seeds.toml: {e}"),
        })?
        .validate()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_builtin_seeds() {
        let seeds = SeedConfig::default();
        assert_eq!(seeds.challenges.len(), 4);
        assert_eq!(seeds.memories.len(), 3);
        assert!(seeds.seed_challenges().iter().all(|c| !c.done));
        assert!(!seeds.profile.onboarding_seen);
    }

    #[test]
    fn test_parse_partial_seed_config_keeps_defaults() {
        let toml_str = r#"
            [profile]
            yourName = "Sam"

            [[challenges]]
            id = "k1"
            title = "Picnic Sprint"
            description = "Pack a picnic in 10 minutes."
            points = 25
        "#;

        let seeds = parse_seed_config(toml_str).unwrap();
        assert_eq!(seeds.profile.your_name, "Sam");
        assert_eq!(seeds.profile.partner_name, "My Love");
        assert_eq!(seeds.challenges.len(), 1);
        assert_eq!(seeds.challenges[0].points, 25);
        assert_eq!(seeds.memories.len(), 3);
    }

    #[test]
    fn test_zero_point_challenge_is_rejected() {
        let toml_str = r#"
            [[challenges]]
            id = "k1"
            title = "Nothing"
            description = "Worth nothing."
            points = 0
        "#;

        let result = parse_seed_config(toml_str);
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }
}
