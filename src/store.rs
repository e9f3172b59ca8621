//! # store — Watchlist Store
//!
//! The watchlist is one JSON document in a GitHub repository, guarded by
//! optimistic versioning: a read hands out the blob `sha` as a
//! [`VersionToken`], a write must present it and fails with
//! [`StoreError::Conflict`] when someone else wrote in between.
//!
//! [`Transaction`] wraps that read → mutate → conditional write cycle.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::WatchlistDocument;

// ─── Version Token ────────────────────────────────────────────────────────────

/// Opaque proof of which stored version a reader saw.
/// `None` inside = the document did not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(Option<String>);

impl VersionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    pub fn absent() -> Self {
        Self(None)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value:   T,
    pub version: VersionToken,
}

// ─── Store Trait ──────────────────────────────────────────────────────────────

#[async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn read(&self) -> Result<Versioned<WatchlistDocument>, StoreError>;

    /// Conditional write; returns the new version on success.
    async fn write(
        &self,
        doc: &WatchlistDocument,
        version: &VersionToken,
        message: &str,
    ) -> Result<VersionToken, StoreError>;
}

// ─── Transaction ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing changed; no write was attempted.
    Unchanged,
    Written(VersionToken),
}

/// One read-modify-write against the store.
pub struct Transaction {
    original: WatchlistDocument,
    working:  WatchlistDocument,
    version:  VersionToken,
}

impl Transaction {
    pub async fn begin(store: &dyn WatchlistStore) -> Result<Self, StoreError> {
        let Versioned { value, version } = store.read().await?;
        debug!(entries = value.entries.len(), version = ?version.as_str(), "Watchlist transaction opened");
        Ok(Self {
            original: value.clone(),
            working:  value,
            version,
        })
    }

    pub fn document(&self) -> &WatchlistDocument {
        &self.working
    }

    pub fn document_mut(&mut self) -> &mut WatchlistDocument {
        &mut self.working
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.original
    }

    /// Writes back only when the document differs from what was read.
    pub async fn commit(
        self,
        store: &dyn WatchlistStore,
        message: &str,
    ) -> Result<CommitOutcome, StoreError> {
        if !self.is_dirty() {
            debug!("Watchlist unchanged — skipping write-back");
            return Ok(CommitOutcome::Unchanged);
        }

        let version = store.write(&self.working, &self.version, message).await?;
        info!(version = ?version.as_str(), message, "💾 Watchlist written back");
        Ok(CommitOutcome::Written(version))
    }
}

// ─── GitHub Contents API ──────────────────────────────────────────────────────

pub struct GithubStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl GithubStore {
    pub fn new(client: reqwest::Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.repo,
            self.config.path.trim_start_matches('/'),
        )
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.contents_url())
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }
}

#[derive(Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content:  String,
    /// `"none"` for files over 1 MB: the body is not inlined.
    #[serde(default)]
    encoding: String,
    sha:      String,
}

#[derive(Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha:     Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch:  Option<&'a str>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

/// 4-space indent, non-ASCII kept as-is.
fn encode_document(doc: &WatchlistDocument) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

fn decode_document(content_b64: &str, encoding: &str) -> Result<WatchlistDocument, StoreError> {
    if encoding != "base64" {
        return Err(StoreError::Decode(format!(
            "content not inlined by the contents API (encoding '{encoding}')"
        )));
    }
    // GitHub wraps the base64 payload at 60 columns.
    let compact: String = content_b64.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| StoreError::Decode(format!("base64: {e}")))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(WatchlistDocument::default());
    }
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl WatchlistStore for GithubStore {
    async fn read(&self) -> Result<Versioned<WatchlistDocument>, StoreError> {
        let mut req = self.request(reqwest::Method::GET);
        if let Some(branch) = &self.config.branch {
            req = req.query(&[("ref", branch)]);
        }

        let resp = req.send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            info!(path = %self.config.path, "Watchlist does not exist yet — starting empty");
            return Ok(Versioned {
                value:   WatchlistDocument::default(),
                version: VersionToken::absent(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Http { status: status.as_u16(), body });
        }

        let contents: ContentsResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(Versioned {
            value:   decode_document(&contents.content, &contents.encoding)?,
            version: VersionToken::new(contents.sha),
        })
    }

    async fn write(
        &self,
        doc: &WatchlistDocument,
        version: &VersionToken,
        message: &str,
    ) -> Result<VersionToken, StoreError> {
        let body = PutContents {
            message,
            content: BASE64.encode(encode_document(doc)?),
            sha:     version.as_str(),
            branch:  self.config.branch.as_deref(),
        };

        let resp = self.request(reqwest::Method::PUT).json(&body).send().await?;
        let status = resp.status();

        // 409: stale sha. 422: sha missing for a file that now exists.
        if status == reqwest::StatusCode::CONFLICT
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            return Err(StoreError::Conflict);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Http { status: status.as_u16(), body });
        }

        let put: PutResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(VersionToken::new(put.content.sha))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
