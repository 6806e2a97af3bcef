// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("{source_name} pairings are not a JSON array of pairing objects: {error}")]
    Malformed {
        source_name: &'static str,
        #[source]
        error: serde_json::Error,
    },
    #[error("{source_name} pairing #{index} has an empty name")]
    EmptyName {
        source_name: &'static str,
        index: usize,
    },
    #[error("{source_name} pairing {name:?} lists no matches")]
    NoMatches {
        source_name: &'static str,
        name: String,
    },
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key must not be empty; paste the key from your provider console")]
    Validation,
    #[error("save API key")]
    Storage(#[source] anyhow::Error),
}
