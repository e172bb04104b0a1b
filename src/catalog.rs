use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::fmt;
use tracing::info;

use crate::contract::{CatalogSource, HttpClient};
use crate::error::CatalogFetchError;

pub const DEFAULT_CATALOG_URL: &str =
    "https://www.dokuwiki.org/lib/plugins/pluginrepo/api.php?fmt=json&order=lastupdate";

/// The two kinds of extension the mirror knows how to lay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    Plugin,
    Template,
}

impl ExtensionKind {
    pub const ALL: [ExtensionKind; 2] = [ExtensionKind::Plugin, ExtensionKind::Template];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKind::Plugin => "plugin",
            ExtensionKind::Template => "template",
        }
    }

    /// Parse a raw kind label. The catalog occasionally says `plugins`.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "plugin" | "plugins" => Some(ExtensionKind::Plugin),
            "template" => Some(ExtensionKind::Template),
            _ => None,
        }
    }

    pub fn full_name(&self, name: &str) -> String {
        format!("{}/{}", self.as_str(), name)
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record as the catalog API serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCatalogRecord {
    pub plugin: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub downloadurl: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lastupdate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sourcerepo: Option<String>,
}

// Accepts strings, numbers and null; empty strings become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    };
    Ok(text.filter(|s| !s.trim().is_empty()))
}

/// A catalog record with its key split into kind and name.
///
/// `kind` is kept as the raw label; [`CatalogEntry::extension_kind`] tells
/// whether it is one the mirror supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub raw_key: String,
    pub kind: String,
    pub name: String,
    pub download_url: Option<String>,
    pub source_repo: Option<String>,
    pub version: String,
}

impl CatalogEntry {
    pub fn extension_kind(&self) -> Option<ExtensionKind> {
        ExtensionKind::parse(&self.kind)
    }
}

impl From<RawCatalogRecord> for CatalogEntry {
    fn from(record: RawCatalogRecord) -> Self {
        let (kind, name) = split_key(&record.plugin);
        CatalogEntry {
            raw_key: record.plugin,
            kind,
            name,
            download_url: record.downloadurl,
            source_repo: record.sourcerepo,
            version: record.lastupdate.unwrap_or_default(),
        }
    }
}

/// Split `kind:name` on the first colon. A key without a name is a plugin.
pub fn split_key(raw_key: &str) -> (String, String) {
    match raw_key.split_once(':') {
        Some((kind, name)) if !name.is_empty() => (kind.to_string(), name.to_string()),
        Some((kind, _)) => ("plugin".to_string(), kind.to_string()),
        None => ("plugin".to_string(), raw_key.to_string()),
    }
}

pub fn decode_catalog(body: &[u8]) -> Result<Vec<CatalogEntry>, CatalogFetchError> {
    let records: Vec<RawCatalogRecord> = serde_json::from_slice(body)?;
    Ok(records.into_iter().map(CatalogEntry::from).collect())
}

/// Catalog backed by the extension repository API.
pub struct HttpCatalog<H> {
    http: H,
    url: String,
}

impl<H: HttpClient> HttpCatalog<H> {
    pub fn new(http: H, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<H: HttpClient> CatalogSource for HttpCatalog<H> {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogFetchError> {
        info!(url = %self.url, "Querying extension catalog");
        let response =
            self.http
                .get(&self.url)
                .await
                .map_err(|e| CatalogFetchError::Transport {
                    url: self.url.clone(),
                    message: e.to_string(),
                })?;
        if response.status >= 400 {
            return Err(CatalogFetchError::Status {
                url: self.url.clone(),
                status: response.status,
            });
        }
        let entries = decode_catalog(&response.body)?;
        info!(count = entries.len(), "{} extensions found", entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{HttpResponse, MockHttpClient, TransportError};

    #[test]
    fn splits_kind_and_name() {
        assert_eq!(split_key("template:dokuwiki"), ("template".into(), "dokuwiki".into()));
        assert_eq!(split_key("foo"), ("plugin".into(), "foo".into()));
        assert_eq!(split_key("a:b:c"), ("a".into(), "b:c".into()));
        assert_eq!(split_key("template:"), ("plugin".into(), "template".into()));
    }

    #[test]
    fn kind_labels() {
        assert_eq!(ExtensionKind::parse("plugin"), Some(ExtensionKind::Plugin));
        assert_eq!(ExtensionKind::parse("plugins"), Some(ExtensionKind::Plugin));
        assert_eq!(ExtensionKind::parse("template"), Some(ExtensionKind::Template));
        assert_eq!(ExtensionKind::parse("widget"), None);
        assert_eq!(ExtensionKind::Template.full_name("x"), "template/x");
    }

    #[test]
    fn decodes_records_leniently() {
        let body = br#"[
            {"plugin": "foo", "downloadurl": "http://host/foo.zip", "lastupdate": "2024-01-01", "popularity": 3},
            {"plugin": "template:bar", "downloadurl": "", "lastupdate": 20230101, "sourcerepo": null}
        ]"#;
        let entries = decode_catalog(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "plugin");
        assert_eq!(entries[0].name, "foo");
        assert_eq!(entries[0].download_url.as_deref(), Some("http://host/foo.zip"));
        assert_eq!(entries[0].version, "2024-01-01");
        assert_eq!(entries[1].extension_kind(), Some(ExtensionKind::Template));
        assert_eq!(entries[1].download_url, None);
        assert_eq!(entries[1].source_repo, None);
        assert_eq!(entries[1].version, "20230101");
    }

    #[test]
    fn rejects_payload_that_is_not_a_list() {
        let err = decode_catalog(br#"{"plugin": "foo"}"#).unwrap_err();
        assert!(matches!(err, CatalogFetchError::Decode(_)));
    }

    #[tokio::test]
    async fn http_catalog_maps_failures() {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .returning(|_| Err(TransportError("connection refused".into())));
        let err = HttpCatalog::new(http, "http://catalog")
            .fetch_catalog()
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogFetchError::Transport { .. }));

        let mut http = MockHttpClient::new();
        http.expect_get().returning(|_| {
            Ok(HttpResponse {
                status: 503,
                body: Vec::new(),
            })
        });
        let err = HttpCatalog::new(http, "http://catalog")
            .fetch_catalog()
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogFetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn http_catalog_returns_entries_in_remote_order() {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url| url == "http://catalog")
            .times(1)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 200,
                    body: br#"[{"plugin":"b","lastupdate":"2"},{"plugin":"a","lastupdate":"1"}]"#
                        .to_vec(),
                })
            });
        let entries = HttpCatalog::new(http, "http://catalog")
            .fetch_catalog()
            .await
            .unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
