// src/analysis.rs
use crate::config::AnalysisConfig;
use crate::vault::{self, DocumentStore};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const NOTE_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Error, Debug)]
pub enum Error {
    #[error("No API key configured. Set one with 'config set-api-key <key>'.")]
    MissingApiKey,
    #[error("No workouts found to analyze in '{0}'.")]
    NoWorkouts(String),
    #[error("Failed to read workout notes: {0}")]
    Vault(#[from] vault::Error),
    #[error("Analysis request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Analysis service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Analysis service returned no text.")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// A remote text-generation call. One attempt per request, no retries.
pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, Error>;
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Anthropic messages endpoint.
pub struct AnthropicClient {
    http_client: Client,
    endpoint: String,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, Error> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl TextGenerator for AnthropicClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String, Error> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
        };
        debug!(
            "Sending analysis request to {} (model {}, {} prompt bytes)",
            self.endpoint,
            request.model,
            request.prompt.len()
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .unwrap_or_else(|_| "Could not read error body".to_string());
            return Err(Error::Api { status, body });
        }

        let parsed: MessagesResponse = response.json()?;
        match parsed.content.into_iter().next() {
            Some(ContentBlock {
                kind,
                text: Some(text),
            }) if kind == "text" => Ok(text),
            _ => Err(Error::EmptyResponse),
        }
    }
}

/// Prompt sent with the joined workout notes.
pub fn build_prompt(workout_data: &str) -> String {
    format!(
        "You are a fitness and workout expert. Analyze the following workout data and provide:

1. **Progress in weights and repetitions** - which exercises are improving, which have plateaued
2. **Program recommendations** - what needs to be changed, added, or removed
3. **Recovery analysis** - is there enough rest, are there signs of overtraining
4. **Imbalance identification** - which muscle groups are lagging
5. **Specific advice** - what to focus on in the next workout

Workout data:

{workout_data}

Please provide a detailed but structured analysis in English."
    )
}

/// Reads every note in `folder` in listing order. Unreadable notes are
/// skipped with a warning.
pub fn gather_workouts(store: &dyn DocumentStore, folder: &str) -> Result<Vec<String>, Error> {
    let prefix = format!("{}/", folder.trim_end_matches('/'));
    let mut documents = Vec::new();
    for path in store.list(&prefix)? {
        match store.read(&path) {
            Ok(text) => documents.push(text),
            Err(e) => warn!("Skipping unreadable note {path}: {e}"),
        }
    }
    Ok(documents)
}

/// Runs an analysis over the notes in `folder`.
///
/// The API key is checked before anything else, then the folder must hold
/// at least one note. Only the last `history_limit` notes are sent.
pub fn analyze(
    store: &dyn DocumentStore,
    folder: &str,
    api_key: Option<&str>,
    settings: &AnalysisConfig,
    generator: &dyn TextGenerator,
) -> Result<String, Error> {
    if api_key.is_none() {
        return Err(Error::MissingApiKey);
    }

    let workouts = gather_workouts(store, folder)?;
    if workouts.is_empty() {
        return Err(Error::NoWorkouts(folder.to_string()));
    }

    let skip = workouts.len().saturating_sub(settings.history_limit.max(1));
    let workout_data = workouts[skip..].join(NOTE_SEPARATOR);
    info!("Analyzing {} workout note(s)", workouts.len() - skip);

    let request = GenerationRequest {
        model: settings.model.clone(),
        prompt: build_prompt(&workout_data),
        max_tokens: settings.max_tokens,
    };
    generator.generate(&request).inspect_err(|e| {
        warn!("AI analysis failed: {e}");
    })
}
