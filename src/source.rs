//! Where raw diff text comes from: pasted text or a pull request URL

use crate::error::{Error, Result};
use log::{debug, warn};
use regex::Regex;
use std::sync::OnceLock;

/// Fetches raw diff text from a diff URL
pub trait DiffFetcher {
    fn fetch_diff(&self, diff_url: &str) -> Result<String>;
}

impl<F: DiffFetcher + ?Sized> DiffFetcher for &F {
    fn fetch_diff(&self, diff_url: &str) -> Result<String> {
        (**self).fetch_diff(diff_url)
    }
}

fn pull_segment() -> &'static Regex {
    static PULL: OnceLock<Regex> = OnceLock::new();
    PULL.get_or_init(|| Regex::new(r"(/pull/\d+).*$").expect("pull request pattern is valid"))
}

/// Turn a pull request page URL into the URL of its raw diff.
///
/// Everything after `/pull/<number>` (tabs like `/files`, anchors, query
/// strings) is dropped and `.diff` appended.
pub fn pull_request_diff_url(url: &str) -> Result<String> {
    let url = url.trim();
    let pull = pull_segment();
    if !pull.is_match(url) {
        return Err(Error::InvalidPullRequestUrl(url.to_string()));
    }
    Ok(pull.replace(url, "${1}.diff").into_owned())
}

/// Obtains raw diff text for a session
pub struct SourceAcquirer<F> {
    fetcher: F,
}

impl<F: DiffFetcher> SourceAcquirer<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Pasted text is already a diff
    pub fn from_pasted_text(&self, text: &str) -> String {
        text.to_string()
    }

    pub fn from_pull_request_url(&self, url: &str) -> Result<String> {
        let diff_url = pull_request_diff_url(url)?;
        debug!("fetching pull request diff from {}", diff_url);

        self.fetcher.fetch_diff(&diff_url).map_err(|e| {
            warn!("could not fetch {}: {}", diff_url, e);
            e
        })
    }
}
