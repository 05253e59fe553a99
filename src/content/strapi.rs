use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use super::model::{
    AuthResponse, Collection, ErrorEnvelope, GqlResponse, RestEntity, ServiceRecord, ServicesData,
    StrapiAuth, Tag, TagAttrs,
};
use crate::locale::Locale;

pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:1337";

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to fetch: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("graphql error: {0}")]
    GraphQl(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Where a backend URL is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Requests made by this process.
    Server,
    /// URLs handed to the browser (media, links).
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    /// Cluster-internal base URL, used for server-side requests when set.
    pub internal_url: Option<String>,
    /// Publicly reachable base URL.
    pub public_url: String,
    pub timeout: Duration,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self { internal_url: None, public_url: DEFAULT_PUBLIC_URL.to_string(), timeout: Duration::from_secs(10) }
    }
}

impl ContentConfig {
    /// Base URL without a trailing slash.
    pub fn base_url(&self, ctx: ExecutionContext) -> &str {
        let url = match ctx {
            ExecutionContext::Server => self.internal_url.as_deref().filter(|u| !u.trim().is_empty()).unwrap_or(&self.public_url),
            ExecutionContext::Client => &self.public_url,
        };
        url.trim_end_matches('/')
    }

    /// Absolute browser-facing URL for a backend-relative media path.
    pub fn media_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url(ExecutionContext::Client), path.trim_start_matches('/'))
    }
}

const SERVICE_FIELDS: &str = "id attributes { title slug summary body videoUrl tags { data { id attributes { name slug } } } }";

pub struct StrapiClient {
    http: reqwest::Client,
    config: ContentConfig,
}

impl StrapiClient {
    pub fn new(config: ContentConfig) -> Result<Self, ContentError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ContentConfig { &self.config }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(ExecutionContext::Server), path)
    }

    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value, jwt: Option<&str>) -> Result<T, ContentError> {
        let mut req = self.http.post(self.url("/graphql")).json(&json!({ "query": query, "variables": variables }));
        if let Some(token) = jwt { req = req.bearer_auth(token); }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ContentError::Rejected { status: status.as_u16(), message });
        }
        let body: GqlResponse<T> = resp.json().await?;
        if let Some(first) = body.errors.first() {
            return Err(ContentError::GraphQl(first.message.clone()));
        }
        body.data.ok_or_else(|| ContentError::Malformed("graphql response without data".into()))
    }

    pub async fn try_service_by_slug(&self, slug: &str, locale: Locale) -> Result<Option<ServiceRecord>, ContentError> {
        let query = format!(
            "query ServiceBySlug($slug: String!, $locale: I18NLocaleCode) {{ services(filters: {{ slug: {{ eq: $slug }} }}, locale: $locale) {{ data {{ {} }} }} }}",
            SERVICE_FIELDS
        );
        let data: ServicesData = self.graphql(&query, json!({ "slug": slug, "locale": locale.as_str() }), None).await?;
        Ok(data.services.data.into_iter().next().map(|e| ServiceRecord::from_entity(e, locale)))
    }

    /// Service by slug, `None` when missing or when the backend cannot be reached.
    pub async fn service_by_slug(&self, slug: &str, locale: Locale) -> Option<ServiceRecord> {
        match self.try_service_by_slug(slug, locale).await {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "atlas::content", "service_by_slug slug={} locale={} failed: {}", slug, locale, e);
                None
            }
        }
    }

    pub async fn try_services(&self, locale: Locale) -> Result<Vec<ServiceRecord>, ContentError> {
        let query = format!(
            "query Services($locale: I18NLocaleCode) {{ services(locale: $locale, sort: \"title:asc\", pagination: {{ limit: 100 }}) {{ data {{ {} }} }} }}",
            SERVICE_FIELDS
        );
        let data: ServicesData = self.graphql(&query, json!({ "locale": locale.as_str() }), None).await?;
        Ok(data.services.data.into_iter().map(|e| ServiceRecord::from_entity(e, locale)).collect())
    }

    pub async fn services(&self, locale: Locale) -> Vec<ServiceRecord> {
        self.try_services(locale).await.unwrap_or_else(|e| {
            warn!(target: "atlas::content", "services locale={} failed: {}", locale, e);
            Vec::new()
        })
    }

    pub async fn try_tags(&self, locale: Locale, jwt: Option<&str>) -> Result<Vec<Tag>, ContentError> {
        let mut req = self
            .http
            .get(self.url("/api/tags"))
            .query(&[("locale", locale.as_str()), ("sort", "name:asc")]);
        if let Some(token) = jwt { req = req.bearer_auth(token); }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ContentError::Rejected { status: status.as_u16(), message });
        }
        let body: Collection<RestEntity<TagAttrs>> = resp.json().await?;
        Ok(body.data.into_iter().map(Tag::from_entity).collect())
    }

    /// Tags visible with the given credential; empty on any failure.
    pub async fn tags(&self, locale: Locale, jwt: Option<&str>) -> Vec<Tag> {
        self.try_tags(locale, jwt).await.unwrap_or_else(|e| {
            warn!(target: "atlas::content", "tags locale={} failed: {}", locale, e);
            Vec::new()
        })
    }

    /// Check credentials with the backend's local auth endpoint.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<StrapiAuth, ContentError> {
        let resp = self
            .http
            .post(self.url("/api/auth/local"))
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text).map(|e| e.error.message).unwrap_or(text);
            return Err(ContentError::Rejected { status: status.as_u16(), message });
        }
        let body: AuthResponse = resp.json().await?;
        if body.user.email.trim().is_empty() {
            return Err(ContentError::Malformed("auth response without email".into()));
        }
        debug!(target: "atlas::content", "authenticate identifier={} ok", identifier);
        Ok(StrapiAuth { jwt: body.jwt, email: body.user.email })
    }
}
