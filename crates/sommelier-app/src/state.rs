// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AiConsultResult, BrowseView, Catalog, Category, ConsultFailure, CredentialError,
    CredentialStore, PairingItem, filter, normalize_query, render_browse_view,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Browse,
    Filtered,
    AiAugmented,
}

impl ViewMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Browse => "explore",
            Self::Filtered => "results",
            Self::AiAugmented => "ai suggestions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsultTask {
    #[default]
    Idle,
    Pending {
        request_id: u64,
    },
    Succeeded {
        count: usize,
    },
    Failed(ConsultFailure),
}

/// Handed to the runtime when a consult request is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsultTicket {
    pub request_id: u64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub query: String,
    pub category: Category,
    pub results: Vec<PairingItem>,
    pub status_line: Option<String>,
    pub consult: ConsultTask,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: ViewMode::Browse,
            query: String::new(),
            category: Category::All,
            results: Vec::new(),
            status_line: None,
            consult: ConsultTask::Idle,
        }
    }
}

impl ViewState {
    pub const fn consult_in_flight(&self) -> bool {
        matches!(self.consult, ConsultTask::Pending { .. })
    }

    /// True when the consult trigger should be offered to the user.
    pub fn can_consult(&self) -> bool {
        self.mode == ViewMode::Filtered
            && self.results.is_empty()
            && !normalize_query(&self.query).is_empty()
            && !self.consult_in_flight()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    QueryChanged(String),
    CategorySelected(Category),
    RequestConsult,
    ConsultFinished {
        request_id: u64,
        result: AiConsultResult,
    },
    Back,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ModeChanged(ViewMode),
    ResultsUpdated(usize),
    ConsultStarted(ConsultTicket),
    ConsultSettled(ConsultTask),
    StatusUpdated(String),
    StatusCleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IssuedConsult {
    request_id: u64,
    needle: String,
    category: Category,
}

/// Owns the single view state and applies every transition to it.
#[derive(Debug)]
pub struct Coordinator<'c> {
    catalog: &'c Catalog,
    view: ViewState,
    next_request_id: u64,
    issued: Option<IssuedConsult>,
}

impl<'c> Coordinator<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            view: ViewState::default(),
            next_request_id: 0,
            issued: None,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// The explore presentation, present only in browse mode.
    pub fn browse_view(&self) -> Option<BrowseView> {
        (self.view.mode == ViewMode::Browse).then(render_browse_view)
    }

    pub fn dispatch(&mut self, command: ViewCommand) -> Vec<ViewEvent> {
        match command {
            ViewCommand::QueryChanged(query) => {
                self.view.query = query;
                self.recompute()
            }
            ViewCommand::CategorySelected(category) => {
                self.view.category = category;
                self.recompute()
            }
            ViewCommand::RequestConsult => self.request_consult(),
            ViewCommand::ConsultFinished { request_id, result } => {
                self.finish_consult(request_id, result)
            }
            ViewCommand::Back => {
                self.view.query.clear();
                self.view.category = Category::All;
                self.recompute()
            }
            ViewCommand::ClearStatus => {
                self.view.status_line = None;
                vec![ViewEvent::StatusCleared]
            }
        }
    }

    /// Validates and persists a new API key through `store`.
    pub fn save_credential<S>(&mut self, store: &mut S, key: &str) -> Vec<ViewEvent>
    where
        S: CredentialStore + ?Sized,
    {
        match store.save(key) {
            Ok(()) => {
                tracing::info!("api key saved");
                vec![self.set_status("API key saved")]
            }
            Err(CredentialError::Validation) => {
                vec![self.set_status("API key must not be empty; enter a key and press enter")]
            }
            Err(error) => {
                tracing::warn!(error = %error, "api key save failed");
                let message = match std::error::Error::source(&error) {
                    Some(cause) => format!("{error}: {cause}"),
                    None => error.to_string(),
                };
                vec![self.set_status(&message)]
            }
        }
    }

    fn recompute(&mut self) -> Vec<ViewEvent> {
        let previous = self.view.mode;
        let needle = normalize_query(&self.view.query);

        if needle.is_empty() && self.view.category == Category::All {
            self.view.mode = ViewMode::Browse;
            self.view.results.clear();
        } else {
            self.view.mode = ViewMode::Filtered;
            self.view.results = filter(self.catalog, &needle, self.view.category)
                .into_iter()
                .cloned()
                .collect();
        }

        if !self.view.consult_in_flight() {
            self.view.consult = ConsultTask::Idle;
        }

        let mut events = Vec::new();
        if previous != self.view.mode {
            tracing::debug!(
                from = previous.label(),
                to = self.view.mode.label(),
                "view mode changed"
            );
            events.push(ViewEvent::ModeChanged(self.view.mode));
        }
        events.push(ViewEvent::ResultsUpdated(self.view.results.len()));
        events
    }

    fn request_consult(&mut self) -> Vec<ViewEvent> {
        if self.view.consult_in_flight() {
            return vec![self.set_status("the AI sommelier is still thinking")];
        }
        if self.view.mode != ViewMode::Filtered || !self.view.results.is_empty() {
            return vec![self.set_status("AI suggestions are offered only when nothing matches")];
        }
        let needle = normalize_query(&self.view.query);
        if needle.is_empty() {
            return vec![self.set_status("type a dish or wine to ask the AI sommelier about")];
        }

        self.next_request_id = self.next_request_id.saturating_add(1);
        let request_id = self.next_request_id;
        self.view.consult = ConsultTask::Pending { request_id };
        self.issued = Some(IssuedConsult {
            request_id,
            needle,
            category: self.view.category,
        });

        let query = self.view.query.trim().to_owned();
        tracing::debug!(request_id, query = %query, "consult started");
        let status = format!("asking the AI sommelier about {query:?}...");
        vec![
            ViewEvent::ConsultStarted(ConsultTicket { request_id, query }),
            self.set_status(&status),
        ]
    }

    fn finish_consult(&mut self, request_id: u64, result: AiConsultResult) -> Vec<ViewEvent> {
        if self.view.consult != (ConsultTask::Pending { request_id }) {
            tracing::debug!(request_id, "ignoring consult result with no matching request");
            return Vec::new();
        }
        let issued = self.issued.take();

        let still_current = issued.is_some_and(|issued| {
            issued.request_id == request_id
                && issued.needle == normalize_query(&self.view.query)
                && issued.category == self.view.category
        }) && self.view.mode == ViewMode::Filtered
            && self.view.results.is_empty();
        if !still_current {
            tracing::debug!(request_id, "discarding consult result for a previous search");
            self.view.consult = ConsultTask::Idle;
            return vec![
                ViewEvent::ConsultSettled(self.view.consult),
                self.set_status("AI suggestions arrived after the search changed; ask again"),
            ];
        }

        match result {
            AiConsultResult::Suggestions(items) if !items.is_empty() => {
                let count = items.len();
                self.view.mode = ViewMode::AiAugmented;
                self.view.results = items;
                self.view.consult = ConsultTask::Succeeded { count };
                let status = format!(
                    "{count} AI suggestion{} for {:?}",
                    if count == 1 { "" } else { "s" },
                    self.view.query.trim()
                );
                vec![
                    ViewEvent::ModeChanged(ViewMode::AiAugmented),
                    ViewEvent::ResultsUpdated(count),
                    ViewEvent::ConsultSettled(self.view.consult),
                    self.set_status(&status),
                ]
            }
            other => {
                let failure = other.failure().unwrap_or(ConsultFailure::Degraded);
                self.view.consult = ConsultTask::Failed(failure);
                vec![
                    ViewEvent::ConsultSettled(self.view.consult),
                    self.set_status(failure.guidance()),
                ]
            }
        }
    }

    fn set_status(&mut self, message: &str) -> ViewEvent {
        self.view.status_line = Some(message.to_owned());
        ViewEvent::StatusUpdated(message.to_owned())
    }
}
