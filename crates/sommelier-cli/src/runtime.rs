// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use sommelier_app::{AiConsultResult, ConsultTicket, CredentialStore};
use sommelier_llm::{Client, Generator};
use sommelier_tui::{AppRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;

/// Pairs the credential store with the optional generative client. A
/// missing client means AI suggestions are switched off in config.
pub struct ConsultRuntime<S, G = Client> {
    credentials: S,
    generator: Option<G>,
}

impl<S, G> ConsultRuntime<S, G>
where
    S: CredentialStore,
    G: Generator + Clone + Send + 'static,
{
    pub fn new(credentials: S, generator: Option<G>) -> Self {
        Self {
            credentials,
            generator,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub fn credential_store(&mut self) -> &mut S {
        &mut self.credentials
    }
}

impl<S, G> AppRuntime for ConsultRuntime<S, G>
where
    S: CredentialStore,
    G: Generator + Clone + Send + 'static,
{
    fn credentials(&mut self) -> &mut dyn CredentialStore {
        &mut self.credentials
    }

    fn consult(&mut self, query: &str) -> AiConsultResult {
        match &self.generator {
            Some(generator) => {
                sommelier_llm::consult(generator, self.credentials.credential(), query)
            }
            None => {
                tracing::warn!("consult requested but [ai].enabled is false");
                AiConsultResult::Degraded
            }
        }
    }

    fn spawn_consult(&mut self, ticket: ConsultTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let Some(generator) = self.generator.clone() else {
            let result = self.consult(&ticket.query);
            tx.send(InternalEvent::ConsultFinished {
                request_id: ticket.request_id,
                result,
            })
            .map_err(|_| anyhow::anyhow!("consult event channel closed"))?;
            return Ok(());
        };

        // The worker gets its own copy of the key; the store stays on this thread.
        let credential = self.credentials.credential().map(str::to_owned);
        thread::Builder::new()
            .name(format!("consult-{}", ticket.request_id))
            .spawn(move || {
                let result =
                    sommelier_llm::consult(&generator, credential.as_deref(), &ticket.query);
                let _ = tx.send(InternalEvent::ConsultFinished {
                    request_id: ticket.request_id,
                    result,
                });
            })
            .context("spawn consult worker thread")?;
        Ok(())
    }
}
