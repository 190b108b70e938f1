//! Google Cloud Storage JSON API client over libcurl.
//!
//! Listing follows `nextPageToken` internally so callers see one flat
//! listing. Object content is fetched with `alt=media` and streamed
//! sequentially to the destination file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use url::Url;

use super::{ObjectStore, RemoteObject};

const PUBLIC_ENDPOINT: &str = "https://storage.googleapis.com";

/// Bearer-token credentials for the storage API.
///
/// The token file holds a single OAuth2 access token (e.g. the output of
/// `gcloud auth print-access-token`). Read once at construction; no
/// process-wide environment is touched.
#[derive(Debug, Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read credentials file: {}", path.display()))?;
        let token = raw.trim().to_string();
        if token.is_empty() {
            bail!("credentials file is empty: {}", path.display());
        }
        Ok(Self { token })
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// GCS client bound to one bucket.
pub struct GcsStore {
    endpoint: Url,
    bucket: String,
    credentials: Option<Credentials>,
    user_project: Option<String>,
}

impl GcsStore {
    /// Client for the public GCS endpoint.
    pub fn new(bucket: impl Into<String>, credentials: Option<Credentials>) -> Result<Self> {
        Self::with_endpoint(PUBLIC_ENDPOINT, bucket, credentials)
    }

    /// Client against a custom endpoint (tests point this at a local server).
    pub fn with_endpoint(
        endpoint: &str,
        bucket: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid endpoint: {endpoint}"))?;
        Ok(Self {
            endpoint,
            bucket: bucket.into(),
            credentials,
            user_project: None,
        })
    }

    /// Bill storage requests to this project (`x-goog-user-project`).
    pub fn with_user_project(mut self, project: impl Into<String>) -> Self {
        self.user_project = Some(project.into());
        self
    }

    /// `{endpoint}/storage/v1/b/{bucket}/o`
    fn objects_url(&self) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", self.bucket.as_str(), "o"]);
        Ok(url)
    }

    /// Media URL for one object. The name is pushed as a single path segment,
    /// so `/` inside it is percent-encoded the way the API expects.
    fn object_media_url(&self, name: &str) -> Result<Url> {
        let mut url = self.objects_url()?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("endpoint cannot be a base URL"))?
            .push(name);
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(creds) = &self.credentials {
            lines.push(format!("Authorization: Bearer {}", creds.token));
        }
        if let Some(project) = &self.user_project {
            lines.push(format!("x-goog-user-project: {}", project));
        }
        lines
    }

    fn apply_headers(&self, easy: &mut curl::easy::Easy) -> Result<()> {
        let lines = self.header_lines();
        if lines.is_empty() {
            return Ok(());
        }
        let mut list = curl::easy::List::new();
        for line in &lines {
            list.append(line)?;
        }
        easy.http_headers(list)?;
        Ok(())
    }

    /// GET returning the whole response body.
    fn get_body(&self, url: &Url) -> Result<Vec<u8>> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str()).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(Duration::from_secs(60))?;
        self.apply_headers(&mut easy)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer
                .perform()
                .with_context(|| format!("GET {} failed", url))?;
        }

        let code = easy.response_code().context("no response code")?;
        if code < 200 || code >= 300 {
            bail!("GET {} returned HTTP {}", url, code);
        }
        Ok(body)
    }

    fn list_page(&self, page_token: Option<&str>) -> Result<ListResponse> {
        let mut url = self.objects_url()?;
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", token);
        }
        let body = self.get_body(&url)?;
        serde_json::from_slice(&body).context("parse bucket listing")
    }
}

impl ObjectStore for GcsStore {
    fn list(&self) -> Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(page_token.as_deref())?;
            for item in page.items {
                let size = item.size.as_deref().and_then(|s| s.parse::<u64>().ok());
                objects.push(RemoteObject {
                    name: item.name,
                    size,
                });
            }
            match page.next_page_token {
                Some(token) => {
                    tracing::debug!("bucket {} listing continues, following page token", self.bucket);
                    page_token = Some(token);
                }
                None => break,
            }
        }

        Ok(objects)
    }

    fn fetch_to_path(&self, name: &str, dest: &Path) -> Result<u64> {
        let url = self.object_media_url(name)?;

        let mut file =
            File::create(dest).with_context(|| format!("create {}", dest.display()))?;
        let mut written: u64 = 0;
        let mut write_error: Option<std::io::Error> = None;

        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str()).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(Duration::from_secs(3600))?;
        self.apply_headers(&mut easy)?;

        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_error = Some(e);
                    Ok(0) // abort the transfer
                }
            })?;
            transfer.perform()
        };

        if let Some(e) = write_error {
            let _ = std::fs::remove_file(dest);
            return Err(e).with_context(|| format!("write {}", dest.display()));
        }
        perform_result.with_context(|| format!("GET {} failed", name))?;

        let code = easy.response_code().context("no response code")?;
        if code < 200 || code >= 300 {
            // whatever was written is an API error payload, not object content
            let _ = std::fs::remove_file(dest);
            bail!("GET {} returned HTTP {}", name, code);
        }

        Ok(written)
    }
}

/// One page of a `storage#objects` listing.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<ListedObject>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// One `storage#object` resource. `size` is a decimal string in the JSON API.
#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    size: Option<String>,
}
