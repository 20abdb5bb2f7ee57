//! Blocking client for the Copernicus Climate Data Store retrieve API.
//!
//! A retrieve submits the request as a job, waits for the job to finish and
//! then streams the result file to the target path. Credentials come from
//! [`ClientOptions`], from `CDSAPI_URL`/`CDSAPI_KEY`, or from the `.cdsapirc`
//! file (`CDSAPI_RC`, otherwise in the home directory):
//!
//! ```text
//! url: https://cds.climate.copernicus.eu/api
//! key: <personal access token>
//! ```

use std::env;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::request::{RequestPayload, Retrieve};

pub const DEFAULT_API_URL: &str = "https://cds.climate.copernicus.eu/api";

const TOKEN_HEADER: &str = "private-token";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Parse `.cdsapirc` content: `name: value` lines, `#` comments ignored.
    pub fn from_rc_str(s: &str) -> Result<Self> {
        let mut url = None;
        let mut key = None;
        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            match name.trim() {
                "url" => url = Some(value.trim().to_string()),
                "key" => key = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let key = key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Configuration("missing key in cdsapirc".into()))?;
        Ok(Self {
            url: url.filter(|u| !u.is_empty()).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            key,
        })
    }

    pub fn from_rc_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read credentials file {}: {e}", path.display()))
        })?;
        Self::from_rc_str(&s)
    }

    /// `CDSAPI_URL` + `CDSAPI_KEY` if the key is set, otherwise the rc file.
    pub fn from_env() -> Result<Self> {
        if let Ok(key) = env::var("CDSAPI_KEY") {
            return Ok(Self {
                url: env::var("CDSAPI_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
                key,
            });
        }
        Self::from_rc_file(&default_rc_path()?)
    }
}

fn default_rc_path() -> Result<PathBuf> {
    if let Ok(p) = env::var("CDSAPI_RC") {
        return Ok(PathBuf::from(p));
    }
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".cdsapirc"))
        .ok_or_else(|| Error::Configuration("cannot locate home directory for .cdsapirc".into()))
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Explicit credentials; when `None` they are loaded with [`Credentials::from_env`].
    pub credentials: Option<Credentials>,
    pub verify_tls: bool,
    /// Delay between job status checks.
    pub poll_interval: Duration,
    /// Give up waiting for a job after this long.
    pub max_wait: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            credentials: None,
            verify_tls: true,
            poll_interval: Duration::from_secs(5),
            max_wait: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct JobInfo {
    #[serde(rename = "jobID")]
    job_id: String,
    status: JobStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JobStatus {
    Accepted,
    Running,
    Successful,
    Failed,
    Rejected,
    Dismissed,
}

impl JobStatus {
    fn is_finished(self) -> bool {
        !matches!(self, JobStatus::Accepted | JobStatus::Running)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct JobResults {
    asset: Asset,
}

#[derive(Debug, Clone, Deserialize)]
struct Asset {
    value: AssetValue,
}

#[derive(Debug, Clone, Deserialize)]
struct AssetValue {
    href: String,
    #[serde(rename = "file:size")]
    size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CdsClient {
    opts: ClientOptions,
    base_url: String,
    http: HttpClient,
}

impl CdsClient {
    pub fn new(opts: ClientOptions) -> Result<Self> {
        let creds = match &opts.credentials {
            Some(c) => c.clone(),
            None => Credentials::from_env()?,
        };
        let base_url = creds.url.trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        let mut token = HeaderValue::from_str(&creds.key)
            .map_err(|_| Error::Configuration("api key contains invalid characters".into()))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("era5-download-rs/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(HeaderName::from_static(TOKEN_HEADER), token);

        let mut builder = HttpClient::builder().default_headers(headers);
        if !opts.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        Ok(Self {
            opts,
            base_url,
            http,
        })
    }

    pub fn execution_url(&self, dataset: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/retrieve/v1/processes/{dataset}/execution",
            self.base_url
        ))?)
    }

    pub fn job_url(&self, job_id: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/retrieve/v1/jobs/{job_id}", self.base_url))?)
    }

    fn submit_job(&self, dataset: &str, request: &RequestPayload) -> Result<JobInfo> {
        let url = self.execution_url(dataset)?;
        let body = json!({ "inputs": request });
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .map_err(|e| external("submitting request", e))?;
        decode(resp, "submitting request")
    }

    fn job_info(&self, job_id: &str) -> Result<JobInfo> {
        let resp = self
            .http
            .get(self.job_url(job_id)?)
            .send()
            .map_err(|e| external("checking job status", e))?;
        decode(resp, "checking job status")
    }

    fn wait_for(&self, mut job: JobInfo) -> Result<()> {
        let started = Instant::now();
        let mut last = job.status;
        while !job.status.is_finished() {
            if let Some(max) = self.opts.max_wait {
                if started.elapsed() > max {
                    return Err(Error::ExternalService(format!(
                        "job {} still {:?} after {}s",
                        job.job_id,
                        job.status,
                        max.as_secs()
                    )));
                }
            }
            thread::sleep(self.opts.poll_interval);
            job = self.job_info(&job.job_id)?;
            if job.status != last {
                debug!(job = %job.job_id, status = ?job.status, "job status changed");
                last = job.status;
            }
        }

        match job.status {
            JobStatus::Successful => Ok(()),
            status => Err(Error::ExternalService(format!(
                "job {} ended as {status:?}",
                job.job_id
            ))),
        }
    }

    fn result_asset(&self, job_id: &str) -> Result<AssetValue> {
        let url = Url::parse(&format!("{}/results", self.job_url(job_id)?))?;
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|e| external("fetching job results", e))?;
        let results: JobResults = decode(resp, "fetching job results")?;
        Ok(results.asset.value)
    }

    fn download(&self, href: &str, target: &Path) -> Result<u64> {
        let resp = self
            .http
            .get(href)
            .send()
            .map_err(|e| external("downloading result", e))?;
        let mut resp = checked(resp, "downloading result")?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(target)?;
        let mut out = BufWriter::new(file);
        let written = resp
            .copy_to(&mut out)
            .map_err(|e| external("downloading result", e))?;
        out.flush()?;
        Ok(written)
    }
}

impl Retrieve for CdsClient {
    fn retrieve(&self, dataset: &str, request: &RequestPayload, target: &Path) -> Result<()> {
        let job = self.submit_job(dataset, request)?;
        info!(job = %job.job_id, "request submitted for {dataset}");
        let job_id = job.job_id.clone();
        self.wait_for(job)?;

        let asset = self.result_asset(&job_id)?;
        let written = self.download(&asset.href, target)?;
        debug!(
            job = %job_id,
            bytes = written,
            expected = ?asset.size,
            path = %target.display(),
            "result downloaded"
        );
        Ok(())
    }
}

fn external(what: &str, e: reqwest::Error) -> Error {
    Error::ExternalService(format!("{what}: {e}"))
}

fn checked(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(Error::ExternalService(format!(
        "{what} failed with {status}: {}",
        body.trim()
    )))
}

fn decode<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let body = checked(resp, what)?
        .text()
        .map_err(|e| external(what, e))?;
    parse_body(&body, what)
}

fn parse_body<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::ExternalService(format!("{what}: unexpected response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CdsClient {
        CdsClient::new(ClientOptions {
            credentials: Some(Credentials {
                url: "https://cds.example.org/api/".into(),
                key: "abc-123".into(),
            }),
            ..ClientOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn parses_rc_file_content() {
        let c = Credentials::from_rc_str(
            "# cds\nurl: https://cds.climate.copernicus.eu/api\nkey: 0000-aaaa\n",
        )
        .unwrap();
        assert_eq!(c.url, "https://cds.climate.copernicus.eu/api");
        assert_eq!(c.key, "0000-aaaa");
    }

    #[test]
    fn rc_url_defaults_and_key_is_required() {
        let c = Credentials::from_rc_str("key: 12345:abcd").unwrap();
        assert_eq!(c.url, DEFAULT_API_URL);
        assert_eq!(c.key, "12345:abcd");
        assert!(matches!(
            Credentials::from_rc_str("url: https://x"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn reads_rc_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".cdsapirc");
        std::fs::write(&path, "url: https://cds.example.org/api\nkey: k\n").unwrap();
        let c = Credentials::from_rc_file(&path).unwrap();
        assert_eq!(c.key, "k");
        assert!(Credentials::from_rc_file(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn builds_endpoint_urls() {
        let c = client();
        assert_eq!(
            c.execution_url("reanalysis-era5-land").unwrap().as_str(),
            "https://cds.example.org/api/retrieve/v1/processes/reanalysis-era5-land/execution"
        );
        assert_eq!(
            c.job_url("42").unwrap().as_str(),
            "https://cds.example.org/api/retrieve/v1/jobs/42"
        );
    }

    #[test]
    fn decodes_job_documents() {
        let job: JobInfo =
            serde_json::from_str(r#"{"jobID": "a1", "status": "accepted", "type": "process"}"#).unwrap();
        assert_eq!(job.job_id, "a1");
        assert!(!job.status.is_finished());

        let results: JobResults = serde_json::from_str(
            r#"{"asset": {"value": {"href": "https://download/x.nc", "file:size": 10, "type": "application/netcdf"}}}"#,
        )
        .unwrap();
        assert_eq!(results.asset.value.href, "https://download/x.nc");
        assert_eq!(results.asset.value.size, Some(10));
        assert!(JobStatus::Failed.is_finished());
    }

    #[test]
    fn undecodable_responses_are_service_errors() {
        let err = parse_body::<JobInfo>(r#"{"jobID": "a1", "status": "paused"}"#, "checking job status")
            .unwrap_err();
        assert!(matches!(err, Error::ExternalService(ref m) if m.starts_with("checking job status")));
        assert!(matches!(
            parse_body::<JobResults>("<html>busy</html>", "fetching job results"),
            Err(Error::ExternalService(_))
        ));
    }
}
