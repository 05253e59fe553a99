use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// A published service page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "videoUrl", default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub locale: Locale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Result of a successful credential check against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrapiAuth {
    pub jwt: String,
    pub email: String,
}

// --- Wire shapes (Strapi v4) ---

#[derive(Debug, Deserialize)]
pub(crate) struct GqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GqlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServicesData {
    pub services: Collection<GqlEntity<ServiceAttrs>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Collection<T> {
    #[serde(default)]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GqlEntity<T> {
    pub id: Option<String>,
    pub attributes: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestEntity<T> {
    pub id: u64,
    pub attributes: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceAttrs {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "videoUrl", default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub tags: Option<Collection<GqlEntity<TagAttrs>>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagAttrs {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthUser {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub jwt: String,
    pub user: AuthUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

impl ServiceRecord {
    pub(crate) fn from_entity(e: GqlEntity<ServiceAttrs>, locale: Locale) -> Self {
        let a = e.attributes;
        let tags = a
            .tags
            .map(|c| c.data.into_iter().map(|t| t.attributes.name).collect())
            .unwrap_or_default();
        ServiceRecord {
            id: e.id.unwrap_or_default(),
            slug: a.slug,
            title: a.title,
            summary: a.summary,
            body: a.body,
            video_url: a.video_url.filter(|u| !u.trim().is_empty()),
            tags,
            locale,
        }
    }
}

impl Tag {
    pub(crate) fn from_entity(e: RestEntity<TagAttrs>) -> Self {
        Tag { id: e.id, name: e.attributes.name, slug: e.attributes.slug }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_from_graphql_payload() {
        let raw = serde_json::json!({
            "data": { "services": { "data": [ {
                "id": "7",
                "attributes": {
                    "title": "Plumbing", "slug": "plumbing", "summary": "Pipes",
                    "videoUrl": "",
                    "tags": { "data": [ { "id": "1", "attributes": { "name": "Home" } } ] }
                }
            } ] } }
        });
        let resp: GqlResponse<ServicesData> = serde_json::from_value(raw).unwrap();
        let ent = resp.data.unwrap().services.data.into_iter().next().unwrap();
        let rec = ServiceRecord::from_entity(ent, Locale::De);
        assert_eq!(rec.id, "7");
        assert_eq!(rec.title, "Plumbing");
        assert_eq!(rec.video_url, None);
        assert_eq!(rec.tags, vec!["Home".to_string()]);
        assert_eq!(rec.locale, Locale::De);
    }

    #[test]
    fn graphql_errors_deserialize() {
        let raw = serde_json::json!({ "data": null, "errors": [ { "message": "Forbidden access" } ] });
        let resp: GqlResponse<ServicesData> = serde_json::from_value(raw).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors[0].message, "Forbidden access");
    }

    #[test]
    fn collection_without_data_is_empty() {
        let c: Collection<RestEntity<TagAttrs>> = serde_json::from_value(serde_json::json!({"meta": {}})).unwrap();
        assert!(c.data.is_empty());
        let c: Collection<GqlEntity<TagAttrs>> = serde_json::from_value(serde_json::json!({"data": [ { "id": null, "attributes": { "name": "Roof" } } ]})).unwrap();
        assert_eq!(c.data[0].attributes.name, "Roof");
    }

    #[test]
    fn tag_from_rest_entity() {
        let e: RestEntity<TagAttrs> = serde_json::from_value(serde_json::json!({"id": 3, "attributes": {"name": "Garden", "slug": "garden"}})).unwrap();
        let t = Tag::from_entity(e);
        assert_eq!(t, Tag { id: 3, name: "Garden".into(), slug: Some("garden".into()) });
    }
}
