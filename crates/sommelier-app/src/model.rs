// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingKind {
    Wine,
    Food,
}

impl PairingKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wine => "wine",
            Self::Food => "food",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wine" => Some(Self::Wine),
            "food" => Some(Self::Food),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Wine => "Wine",
            Self::Food => "Food",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Course {
    Starter,
    Main,
    Dessert,
}

impl Course {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Main => "main",
            Self::Dessert => "dessert",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "starter" => Some(Self::Starter),
            "main" => Some(Self::Main),
            "dessert" => Some(Self::Dessert),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Starter => "Starter",
            Self::Main => "Main",
            Self::Dessert => "Dessert",
        }
    }
}

/// Constrains results by pairing type or by course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Wine,
    Food,
    Starter,
    Main,
    Dessert,
}

impl Category {
    pub const ALL: [Self; 6] = [
        Self::All,
        Self::Wine,
        Self::Food,
        Self::Starter,
        Self::Main,
        Self::Dessert,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Wine => "wine",
            Self::Food => "food",
            Self::Starter => "starter",
            Self::Main => "main",
            Self::Dessert => "dessert",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "wine" => Some(Self::Wine),
            "food" => Some(Self::Food),
            "starter" => Some(Self::Starter),
            "main" => Some(Self::Main),
            "dessert" => Some(Self::Dessert),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Wine => "Wines",
            Self::Food => "Dishes",
            Self::Starter => "Starters",
            Self::Main => "Mains",
            Self::Dessert => "Desserts",
        }
    }

    pub fn rotate(self, delta: isize) -> Self {
        let current = Self::ALL
            .iter()
            .position(|category| *category == self)
            .unwrap_or(0) as isize;
        let len = Self::ALL.len() as isize;
        Self::ALL[(current + delta).rem_euclid(len) as usize]
    }

    pub fn admits(self, item: &PairingItem) -> bool {
        match self {
            Self::All => true,
            Self::Wine => item.kind() == PairingKind::Wine,
            Self::Food => item.kind() == PairingKind::Food,
            Self::Starter => item.course() == Some(Course::Starter),
            Self::Main => item.course() == Some(Course::Main),
            Self::Dessert => item.course() == Some(Course::Dessert),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPairing {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PairingKind,
    pub matches: Vec<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PairingKind,
    pub matches: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PairingItem {
    Catalog(CatalogPairing),
    AiGenerated(AiSuggestion),
}

impl PairingItem {
    pub fn name(&self) -> &str {
        match self {
            Self::Catalog(item) => &item.name,
            Self::AiGenerated(item) => &item.name,
        }
    }

    pub const fn kind(&self) -> PairingKind {
        match self {
            Self::Catalog(item) => item.kind,
            Self::AiGenerated(item) => item.kind,
        }
    }

    pub fn matches(&self) -> &[String] {
        match self {
            Self::Catalog(item) => &item.matches,
            Self::AiGenerated(item) => &item.matches,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Catalog(item) => &item.description,
            Self::AiGenerated(item) => &item.description,
        }
    }

    pub const fn course(&self) -> Option<Course> {
        match self {
            Self::Catalog(item) => item.course,
            Self::AiGenerated(_) => None,
        }
    }

    pub fn restaurant(&self) -> Option<&str> {
        match self {
            Self::Catalog(item) => item.restaurant.as_deref(),
            Self::AiGenerated(_) => None,
        }
    }

    pub const fn is_ai_generated(&self) -> bool {
        matches!(self, Self::AiGenerated(_))
    }

    /// Tag shown on result cards: the restaurant for restaurant dishes,
    /// otherwise the pairing type.
    pub fn tag_label(&self) -> &str {
        match self.restaurant() {
            Some(restaurant) if self.kind() == PairingKind::Food => restaurant,
            _ => self.kind().label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsultFailure {
    CredentialMissing,
    Degraded,
}

impl ConsultFailure {
    pub const fn guidance(self) -> &'static str {
        match self {
            Self::CredentialMissing => "no API key set -- press ctrl-k to add one",
            Self::Degraded => "AI sommelier unavailable -- try again or check your API key",
        }
    }
}

/// Outcome of one call into the AI extension client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiConsultResult {
    Suggestions(Vec<PairingItem>),
    CredentialMissing,
    Degraded,
}

impl AiConsultResult {
    pub const fn failure(&self) -> Option<ConsultFailure> {
        match self {
            Self::Suggestions(_) => None,
            Self::CredentialMissing => Some(ConsultFailure::CredentialMissing),
            Self::Degraded => Some(ConsultFailure::Degraded),
        }
    }
}
