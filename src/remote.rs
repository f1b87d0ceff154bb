//! HTTP backends: a REST store for sequences and a pull request diff fetcher
//!
//! The REST contract is `POST /diffs {diff}` returning `{id}`,
//! `PATCH /diffs/<id> {id, diff}` and `GET /diffs/<id>` returning `{diff}`.

use crate::chunk::ChunkUnit;
use crate::error::{Error, Result};
use crate::source::DiffFetcher;
use crate::store::{PersistedDiff, Store};
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct Body<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    diff: &'a [ChunkUnit],
}

/// Some backends issue numeric ids, others strings
#[derive(Deserialize)]
#[serde(untagged)]
enum IssuedId {
    Text(String),
    Number(u64),
}

#[derive(Deserialize)]
struct Created {
    id: IssuedId,
}

/// Checks the status, then decodes the body. A body that does not decode
/// is `Error::Json`, like a corrupt record in any other store.
fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let body = check(response, url)?.text()?;
    Ok(serde_json::from_str(&body)?)
}

fn check(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

pub struct HttpStore {
    client: Client,
    api_url: String,
}

impl HttpStore {
    pub fn new(api_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn diff_url(&self, id: &str) -> String {
        format!("{}/diffs/{}", self.api_url, id)
    }
}

impl Store for HttpStore {
    fn create(&mut self, diff: &[ChunkUnit]) -> Result<String> {
        let url = format!("{}/diffs", self.api_url);
        let response = self
            .client
            .post(&url)
            .json(&Body { id: None, diff })
            .send()?;

        let created: Created = decode(response, &url)?;
        let id = match created.id {
            IssuedId::Text(id) => id,
            IssuedId::Number(id) => id.to_string(),
        };

        debug!("created remote diff {}", id);
        Ok(id)
    }

    fn update(&mut self, id: &str, diff: &[ChunkUnit]) -> Result<()> {
        let url = self.diff_url(id);
        let response = self
            .client
            .patch(&url)
            .json(&Body { id: Some(id), diff })
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::UnknownId(id.to_string()));
        }
        check(response, &url)?;

        debug!("updated remote diff {}", id);
        Ok(())
    }

    fn load(&mut self, id: &str) -> Result<Vec<ChunkUnit>> {
        let url = self.diff_url(id);
        let response = self.client.get(&url).send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::UnknownId(id.to_string()));
        }
        let record: PersistedDiff = decode(response, &url)?;
        Ok(record.diff)
    }
}

/// Fetches diffs over HTTP, optionally through a proxy exposing
/// `GET <proxy>/github-diff?url=<diff url>`
pub struct HttpFetcher {
    client: Client,
    proxy: Option<String>,
}

impl HttpFetcher {
    pub fn new(proxy: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            proxy: proxy.map(|p| p.trim_end_matches('/').to_string()),
        }
    }
}

impl DiffFetcher for HttpFetcher {
    fn fetch_diff(&self, diff_url: &str) -> Result<String> {
        let (url, request) = match self.proxy {
            Some(ref proxy) => {
                let url = format!("{}/github-diff", proxy);
                let request = self.client.get(&url).query(&[("url", diff_url)]);
                (url, request)
            }
            None => (diff_url.to_string(), self.client.get(diff_url)),
        };

        let response = request.send()?;
        Ok(check(response, &url)?.text()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::expand;
    use crate::diff::parse;
    use mockito::Matcher;
    use serde_json::json;

    const DIFF: &str = "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n";

    #[test]
    fn test_create_posts_diff() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/diffs")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""chunkIndex":0"#.into()),
                Matcher::Regex(r#""from":"x""#.into()),
            ]))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 17, "diff": []}"#)
            .create();

        let mut store = HttpStore::new(&format!("{}/", server.url()));
        let id = store.create(&expand(parse(DIFF))).unwrap();

        assert_eq!(id, "17");
        mock.assert();
    }

    #[test]
    fn test_update_patches_by_id() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PATCH", "/diffs/abc")
            .match_body(Matcher::PartialJson(json!({ "id": "abc" })))
            .with_status(200)
            .create();
        server.mock("PATCH", "/diffs/gone").with_status(404).create();

        let mut store = HttpStore::new(&server.url());
        store.update("abc", &expand(parse(DIFF))).unwrap();
        mock.assert();

        assert!(matches!(
            store.update("gone", &[]),
            Err(Error::UnknownId(_))
        ));
    }

    #[test]
    fn test_load() {
        let mut server = mockito::Server::new();
        let units = expand(parse(DIFF));
        let body = serde_json::to_string(&PersistedDiff {
            id: Some("abc".into()),
            diff: units.clone(),
        })
        .unwrap();
        server
            .mock("GET", "/diffs/abc")
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();
        server.mock("GET", "/diffs/broken").with_status(500).create();

        let mut store = HttpStore::new(&server.url());
        assert_eq!(store.load("abc").unwrap(), units);

        let err = store.load("broken").unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
        assert!(err.is_transport());
    }

    #[test]
    fn test_malformed_success_body_is_transport() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/diffs")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create();
        server
            .mock("GET", "/diffs/abc")
            .with_status(200)
            .with_body(r#"{"diff": "not a list"}"#)
            .create();

        let mut store = HttpStore::new(&server.url());

        let err = store.create(&expand(parse(DIFF))).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_transport());

        let err = store.load("abc").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_fetch_direct_and_via_proxy() {
        let mut server = mockito::Server::new();
        let direct = server
            .mock("GET", "/o/r/pull/7.diff")
            .with_body(DIFF)
            .create();
        let proxied = server
            .mock("GET", "/github-diff")
            .match_query(Matcher::UrlEncoded(
                "url".into(),
                "https://github.com/o/r/pull/7.diff".into(),
            ))
            .with_body(DIFF)
            .create();

        let fetcher = HttpFetcher::new(None);
        let text = fetcher
            .fetch_diff(&format!("{}/o/r/pull/7.diff", server.url()))
            .unwrap();
        assert_eq!(text, DIFF);
        direct.assert();

        let fetcher = HttpFetcher::new(Some(&server.url()));
        let text = fetcher
            .fetch_diff("https://github.com/o/r/pull/7.diff")
            .unwrap();
        assert_eq!(text, DIFF);
        proxied.assert();
    }

    #[test]
    fn test_fetch_failure_status() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/o/r/pull/8.diff").with_status(404).create();

        let fetcher = HttpFetcher::new(None);
        let err = fetcher
            .fetch_diff(&format!("{}/o/r/pull/8.diff", server.url()))
            .unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    }
}
