// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use sommelier_app::{
    Catalog, CatalogPairing, Course, CredentialError, CredentialStore, PairingKind,
    validate_credential,
};
use std::path::PathBuf;

const WINES: [&str; 16] = [
    "Cabernet Sauvignon",
    "Merlot",
    "Pinot Noir",
    "Syrah",
    "Malbec",
    "Chardonnay",
    "Sauvignon Blanc",
    "Riesling",
    "Chenin Blanc",
    "Grüner Veltliner",
    "Champagne",
    "Prosecco",
    "Rioja",
    "Barolo",
    "Sauternes",
    "Port",
];

const DISHES: [&str; 16] = [
    "Steak",
    "Lamb Chops",
    "Roast Chicken",
    "Duck",
    "Salmon",
    "Oysters",
    "Scallops",
    "Mushroom Risotto",
    "Pork Belly",
    "Goat Cheese",
    "Sushi",
    "Thai Curry",
    "Lasagna",
    "Paella",
    "Crème Brûlée",
    "Dark Chocolate",
];

const RESTAURANTS: [&str; 5] = [
    "Osteria Lucia",
    "The Harbor Room",
    "Maison Brasserie",
    "Casa Verde",
    "Kaiseki Ren",
];

const TASTING_NOTES: [&str; 10] = [
    "bright acidity",
    "silky tannins",
    "a long mineral finish",
    "ripe dark fruit",
    "toasted oak",
    "citrus zest",
    "a whisper of smoke",
    "honeyed richness",
    "fresh herbs",
    "baking spice",
];

const COURSES: [Course; 3] = [Course::Starter, Course::Main, Course::Dessert];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible catalog entries.
#[derive(Debug, Clone)]
pub struct PairingFaker {
    rng: DeterministicRng,
}

impl PairingFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn wine(&mut self) -> CatalogPairing {
        let name = self.pick(&WINES).to_owned();
        CatalogPairing {
            description: self.description(&name),
            name,
            kind: PairingKind::Wine,
            matches: self.partners(&DISHES),
            course: None,
            restaurant: None,
        }
    }

    pub fn dish(&mut self) -> CatalogPairing {
        let name = self.pick(&DISHES).to_owned();
        CatalogPairing {
            description: self.description(&name),
            name,
            kind: PairingKind::Food,
            matches: self.partners(&WINES),
            course: None,
            restaurant: None,
        }
    }

    pub fn restaurant_dish(&mut self) -> CatalogPairing {
        let mut dish = self.dish();
        dish.course = Some(COURSES[self.rng.int_n(COURSES.len())]);
        dish.restaurant = Some(self.pick(&RESTAURANTS).to_owned());
        dish
    }

    /// Basic entries first, restaurant entries after, like the real catalog.
    pub fn catalog(&mut self, basic: usize, restaurant: usize) -> Catalog {
        let mut entries = Vec::with_capacity(basic + restaurant);
        for _ in 0..basic {
            let entry = if self.rng.bool() {
                self.wine()
            } else {
                self.dish()
            };
            entries.push(entry);
        }
        for _ in 0..restaurant {
            entries.push(self.restaurant_dish());
        }
        Catalog::from_items(entries)
    }

    /// A query fragment likely to hit something in a generated catalog.
    pub fn query_fragment(&mut self) -> String {
        let source = match self.rng.int_n(3) {
            0 => self.pick(&WINES),
            1 => self.pick(&DISHES),
            _ => self.pick(&RESTAURANTS),
        };
        let chars: Vec<char> = source.chars().collect();
        let start = self.rng.int_n(chars.len().saturating_sub(2));
        let len = 2 + self.rng.int_n(4);
        chars
            .iter()
            .skip(start)
            .take(len)
            .collect::<String>()
            .to_uppercase()
    }

    fn partners(&mut self, pool: &[&str]) -> Vec<String> {
        let count = 1 + self.rng.int_n(3);
        let mut picked: Vec<String> = Vec::with_capacity(count);
        while picked.len() < count {
            let candidate = self.pick(pool);
            if !picked.iter().any(|existing| existing == candidate) {
                picked.push(candidate.to_owned());
            }
        }
        picked
    }

    fn description(&mut self, name: &str) -> String {
        let first = self.pick(&TASTING_NOTES);
        let second = self.pick(&TASTING_NOTES);
        format!("{name} with {first} and {second}.")
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }
}

/// In-memory credential store; `failing()` simulates a storage outage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    key: Option<String>,
    fail_saves: bool,
    pub save_attempts: usize,
}

impl MemoryCredentialStore {
    pub fn with_key(key: &str) -> Self {
        Self {
            key: Some(key.to_owned()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn credential(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn save(&mut self, key: &str) -> std::result::Result<(), CredentialError> {
        self.save_attempts += 1;
        let key = validate_credential(key)?;
        if self.fail_saves {
            return Err(CredentialError::Storage(anyhow!("disk is read-only")));
        }
        self.key = Some(key.to_owned());
        Ok(())
    }
}

pub fn pairing(name: &str, kind: PairingKind, matches: &[&str]) -> CatalogPairing {
    CatalogPairing {
        name: name.to_owned(),
        kind,
        matches: matches.iter().map(|value| (*value).to_owned()).collect(),
        description: String::new(),
        course: None,
        restaurant: None,
    }
}

/// The two-entry catalog used by the steak/merlot scenarios.
pub fn steak_and_merlot() -> Catalog {
    Catalog::from_items(vec![
        pairing("Steak", PairingKind::Food, &["Merlot", "Cabernet"]),
        pairing("Merlot", PairingKind::Wine, &["Steak"]),
    ])
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("sommelier.db");
    Ok((dir, db_path))
}

/// A fenced generative-service answer holding one suggestion for `query`.
pub fn fenced_suggestion_response(name: &str, query: &str) -> String {
    format!(
        "```json\n[{{\"name\":\"{name}\",\"type\":\"wine\",\"matches\":[\"{query}\"],\"description\":\"x\"}}]\n```"
    )
}
