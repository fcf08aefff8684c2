//! Session context, credential resolution, HTTP helpers, and error types.

use std::env;
use std::fmt::{self, Debug, Display, Formatter};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use base64::{Engine as _, engine::general_purpose};
use ditto_api_models::{ExtensionData, ProblemDetails};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::output::{MessageLevel, OutputFormat, emit};

pub(crate) const HEADER_CORRELATION_ID: &str = "correlation-id";
pub(crate) const DEFAULT_BASE_URL: &str = "http://host.docker.internal:8080";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Configuration(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::Configuration(_) => 4,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Configuration(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

/// Which credential pair a command authenticates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CredentialScope {
    /// Regular API user.
    Ditto,
    /// Administrative user for devops and connection management.
    DevOps,
}

impl CredentialScope {
    /// Environment variables holding the username and password.
    pub(crate) const fn variables(self) -> (&'static str, &'static str) {
        match self {
            Self::Ditto => ("DITTO_USERNAME", "DITTO_PASSWORD"),
            Self::DevOps => ("DITTO_DEVOPS_USERNAME", "DITTO_DEVOPS_PASSWORD"),
        }
    }
}

/// HTTP basic credentials resolved from the environment.
#[derive(Clone)]
pub(crate) struct Credentials {
    username: String,
    password: String,
}

impl Debug for Credentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub(crate) fn from_env(scope: CredentialScope) -> CliResult<Self> {
        Self::resolve(scope, |name| env::var(name).ok())
    }

    /// Resolve credentials through `lookup`; unset and empty values are both missing.
    pub(crate) fn resolve<F>(scope: CredentialScope, lookup: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (username_var, password_var) = scope.variables();
        let username = lookup(username_var).filter(|value| !value.is_empty());
        let password = lookup(password_var).filter(|value| !value.is_empty());

        match (username, password) {
            (Some(username), Some(password)) => Ok(Self { username, password }),
            _ => Err(CliError::configuration(format!(
                "environment variables {username_var} and {password_var} must be set"
            ))),
        }
    }

    #[must_use]
    pub(crate) fn authorization(&self) -> String {
        let token = general_purpose::STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

/// Invocation-wide settings taken from global flags.
#[derive(Debug, Clone)]
pub(crate) struct ClientSettings {
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) output: OutputFormat,
}

/// Asks the operator to confirm destructive operations.
pub(crate) trait Prompter: Send + Sync {
    fn confirm(&self, question: &str) -> CliResult<bool>;
}

/// Reads a yes/no answer from stdin; anything but `y`/`yes` declines.
pub(crate) struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str) -> CliResult<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{question} [y/N]: ")
            .and_then(|()| stderr.flush())
            .map_err(|err| CliError::failure(anyhow!("failed to write prompt: {err}")))?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(|err| CliError::failure(anyhow!("failed to read confirmation: {err}")))?;
        Ok(is_affirmative(&answer))
    }
}

#[must_use]
pub(crate) fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) output: OutputFormat,
    pub(crate) prompter: Arc<dyn Prompter>,
}

impl AppContext {
    /// Build the authenticated client used for the rest of the invocation.
    pub(crate) fn connect(
        settings: ClientSettings,
        credentials: &Credentials,
        correlation_id: &str,
    ) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&credentials.authorization())
            .map_err(|_| CliError::configuration("credentials cannot be sent as an HTTP header"))?;
        authorization.set_sensitive(true);
        default_headers.insert(AUTHORIZATION, authorization);
        let correlation = HeaderValue::from_str(correlation_id).map_err(|_| {
            CliError::failure(anyhow!("correlation identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_CORRELATION_ID, correlation);

        let client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url,
            output: settings.output,
            prompter: Arc::new(TerminalPrompter),
        })
    }

    /// Append percent-encoded path segments to the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> CliResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CliError::configuration(format!("base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> CliResult<Response> {
        let request = request
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build request: {err}")))?;
        let path = request.url().path().to_string();
        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| CliError::failure(anyhow!("request to {path} failed: {err}")))?;
        tracing::debug!(status = %response.status(), path = %path, "received response");
        Ok(response)
    }

    /// Fetch a resource; 404, an empty body, and JSON `null` all mean absent.
    pub(crate) async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> CliResult<Option<T>> {
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(classify_problem(response).await);
        }
        let body = read_body(response).await?;
        decode_optional(&body)
    }

    /// Issue a mutating request, returning the response document if any.
    pub(crate) async fn submit(&self, request: RequestBuilder) -> CliResult<Option<Value>> {
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(classify_problem(response).await);
        }
        let body = read_body(response).await?;
        decode_optional(&body)
    }
}

/// Optional query options; only supplied, non-empty values reach the URL.
#[derive(Debug, Default)]
pub(crate) struct QueryParameters {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParameters {
    #[must_use]
    pub(crate) fn with(mut self, name: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            self.pairs.push((name, value.to_string()));
        }
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub(crate) fn apply_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        let mut query = url.query_pairs_mut();
        for (name, value) in &self.pairs {
            query.append_pair(name, value);
        }
    }
}

/// Ask before deleting unless `skip_prompt` is set; a refusal is reported, not an error.
pub(crate) fn confirm_deletion(
    ctx: &AppContext,
    kind: &str,
    id: &str,
    skip_prompt: bool,
) -> CliResult<bool> {
    if skip_prompt {
        return Ok(true);
    }
    let confirmed = ctx
        .prompter
        .confirm(&format!("Are you sure you want to delete {kind} '{id}'?"))?;
    if !confirmed {
        emit(MessageLevel::Warning, "Operation cancelled");
    }
    Ok(confirmed)
}

/// Read a payload file that must hold a JSON object.
pub(crate) fn read_json_object(path: &Path) -> CliResult<ExtensionData> {
    let payload = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(CliError::failure)?;

    match serde_json::from_str::<Value>(&payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::validation(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
        Err(err) => Err(CliError::validation(format!(
            "{} is not valid JSON: {err}",
            path.display()
        ))),
    }
}

pub(crate) fn decode_optional<T: DeserializeOwned>(body: &[u8]) -> CliResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| CliError::failure(anyhow!("failed to parse response body: {err}")))?;
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|err| CliError::failure(anyhow!("unexpected response shape: {err}")))
}

async fn read_body(response: Response) -> CliResult<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|err| CliError::failure(anyhow!("failed to read response body: {err}")))
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Classify an HTTP response into a CLI error.
pub(crate) async fn classify_problem(response: Response) -> CliError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();

    let body_text = String::from_utf8_lossy(&bytes).trim().to_string();
    let message = serde_json::from_slice::<ProblemDetails>(&bytes)
        .ok()
        .and_then(|problem| problem.summary())
        .unwrap_or(body_text);

    if matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
    ) && !message.is_empty()
    {
        CliError::validation(message)
    } else if message.is_empty() {
        CliError::failure(anyhow!("request failed with status {status}"))
    } else {
        CliError::failure(anyhow!("{message} (status {status})"))
    }
}
