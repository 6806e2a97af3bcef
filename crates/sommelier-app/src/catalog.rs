// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{CatalogLoadError, CatalogPairing, PairingItem};

const BASIC_PAIRINGS: &str = include_str!("data/pairings.json");
const RESTAURANT_PAIRINGS: &str = include_str!("data/restaurant_pairings.json");

/// Immutable merged set of catalog pairings, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    items: Vec<PairingItem>,
}

impl Catalog {
    /// Merges the embedded basic and restaurant sources, in that order.
    pub fn load() -> Result<Self, CatalogLoadError> {
        Self::from_sources(BASIC_PAIRINGS, RESTAURANT_PAIRINGS)
    }

    pub fn from_sources(basic: &str, restaurant: &str) -> Result<Self, CatalogLoadError> {
        let mut entries = parse_source("basic", basic)?;
        entries.extend(parse_source("restaurant", restaurant)?);
        let catalog = Self::from_items(entries);
        tracing::info!(items = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn from_items(entries: Vec<CatalogPairing>) -> Self {
        Self {
            items: entries.into_iter().map(PairingItem::Catalog).collect(),
        }
    }

    pub fn items(&self) -> &[PairingItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn parse_source(
    source_name: &'static str,
    raw: &str,
) -> Result<Vec<CatalogPairing>, CatalogLoadError> {
    let entries: Vec<CatalogPairing> = serde_json::from_str(raw)
        .map_err(|error| CatalogLoadError::Malformed { source_name, error })?;

    for (index, entry) in entries.iter().enumerate() {
        if entry.name.trim().is_empty() {
            return Err(CatalogLoadError::EmptyName { source_name, index });
        }
        if entry.matches.is_empty() {
            return Err(CatalogLoadError::NoMatches {
                source_name,
                name: entry.name.clone(),
            });
        }
    }
    Ok(entries)
}
