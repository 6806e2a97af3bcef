// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sommelier_app::{AiConsultResult, AiSuggestion, PairingItem, PairingKind};
use std::time::{Duration, Instant};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const MAX_QUERY_CHARS: usize = 200;
pub const SUGGESTION_COUNT: usize = 3;

/// Text-in, text-out access to a generative model.
pub trait Generator {
    fn generate(&self, api_key: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    model: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("ai.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("ai.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "ai.base_url {base_url:?} uses scheme {:?}; use http or https",
                parsed.scheme()
            );
        }
        if model.trim().is_empty() {
            bail!("ai.model must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            model: model.trim().to_owned(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl Generator for Client {
    fn generate(&self, api_key: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest::new(prompt);
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: GenerateResponse = response.json().context("decode generate response")?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            bail!("no candidate text in generate response");
        }
        Ok(text)
    }
}

/// Asks the generative service for pairings when the catalog has nothing.
///
/// Never errors: a missing key short-circuits before any network traffic and
/// every transport or shape problem is reported as `Degraded`.
pub fn consult<G: Generator + ?Sized>(
    generator: &G,
    credential: Option<&str>,
    query: &str,
) -> AiConsultResult {
    let Some(api_key) = credential.map(str::trim).filter(|key| !key.is_empty()) else {
        tracing::info!("consult skipped: no api key");
        return AiConsultResult::CredentialMissing;
    };

    let prompt = build_pairing_prompt(query);
    let started = Instant::now();
    let raw = match generator.generate(api_key, &prompt) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %format!("{error:#}"),
                "ai consult degraded: transport failure"
            );
            return AiConsultResult::Degraded;
        }
    };

    match normalize_suggestions(&raw, query) {
        Ok(items) => {
            tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                prompt_bytes = prompt.len(),
                response_bytes = raw.len(),
                suggestions = items.len(),
                "ai consult completed"
            );
            AiConsultResult::Suggestions(items)
        }
        Err(error) => {
            tracing::warn!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                response_bytes = raw.len(),
                reason = %error,
                "ai consult degraded: unusable response"
            );
            AiConsultResult::Degraded
        }
    }
}

pub fn clamp_query(query: &str) -> String {
    query.trim().chars().take(MAX_QUERY_CHARS).collect()
}

pub fn build_pairing_prompt(query: &str) -> String {
    let query = clamp_query(query);
    format!(
        "You are a sommelier. Suggest exactly {SUGGESTION_COUNT} wines that pair well with \"{query}\".\n\
         Respond with a JSON array only, no prose and no markdown. Each element must be an object \
         with these fields:\n\
         - \"name\": the wine name\n\
         - \"type\": always \"wine\"\n\
         - \"matches\": an array of strings that includes \"{query}\"\n\
         - \"description\": one sentence on why the pairing works\n"
    )
}

/// Removes a surrounding markdown fence, with or without a language tag.
/// Fences may share a line with the payload.
pub fn strip_code_fence(raw: &str) -> String {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text.to_owned();
    };
    let rest = rest.trim_start_matches(|ch: char| ch.is_ascii_alphanumeric() || ch == '-');
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim().to_owned()
}

pub fn normalize_suggestions(raw: &str, query: &str) -> Result<Vec<PairingItem>> {
    let body = strip_code_fence(raw);
    let parsed: Value = serde_json::from_str(&body).context("response is not JSON")?;
    let Value::Array(elements) = parsed else {
        bail!("response is not a JSON array");
    };

    let query = query.trim();
    let items: Vec<PairingItem> = elements
        .iter()
        .filter_map(|element| normalize_element(element, query))
        .take(SUGGESTION_COUNT)
        .map(PairingItem::AiGenerated)
        .collect();
    if items.is_empty() {
        bail!("no usable suggestions among {} elements", elements.len());
    }
    Ok(items)
}

fn normalize_element(element: &Value, query: &str) -> Option<AiSuggestion> {
    let object = element.as_object()?;
    let name = object.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    let mut matches: Vec<String> = object
        .get("matches")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect();
    if matches.is_empty() {
        return None;
    }

    let needle = query.to_lowercase();
    if !needle.is_empty()
        && !matches
            .iter()
            .any(|value| value.to_lowercase().contains(&needle))
    {
        matches.push(query.to_owned());
    }

    let kind = match object.get("type").and_then(Value::as_str) {
        Some(value) if value.trim().eq_ignore_ascii_case("food") => PairingKind::Food,
        _ => PairingKind::Wine,
    };
    let description = object
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_owned();

    Some(AiSuggestion {
        name: name.to_owned(),
        kind,
        matches,
        description,
    })
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("{base_url} did not answer in time -- raise [ai].timeout or retry");
    }
    anyhow!("cannot reach {base_url} -- check your network connection ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error.message);
    }

    if body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
