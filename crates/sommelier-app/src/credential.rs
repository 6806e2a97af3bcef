// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::CredentialError;

/// Fixed key under which the generative service credential is persisted.
pub const API_KEY_SETTING: &str = "ai.api_key";

/// Holds the optional API key, cached after the startup read and refreshed
/// after every successful save.
pub trait CredentialStore {
    fn credential(&self) -> Option<&str>;

    fn save(&mut self, key: &str) -> Result<(), CredentialError>;

    fn has_credential(&self) -> bool {
        self.credential().is_some()
    }
}

/// Trims `key` and rejects it when nothing is left.
pub fn validate_credential(key: &str) -> Result<&str, CredentialError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(CredentialError::Validation);
    }
    Ok(trimmed)
}
