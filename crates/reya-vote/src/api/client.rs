// reqwest-backed voting API client.
//
// Each account gets its own `reqwest::Client` (and so its own connection
// pool), carrying the browser header set and the account's proxy.

use alloy_primitives::{hex, Address};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use tracing::debug;

use super::{parse_submit_response, SubmitReceipt, VoteApi, VoteApiConnector, VoteSubmission, VotingStatus};
use crate::config::Config;
use crate::error::VoteError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Headers the app.reya.network frontend sends from Chrome 126 on Windows.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "en-US,en;q=0.9,ru;q=0.8"),
    ("connection", "keep-alive"),
    ("origin", "https://app.reya.network"),
    ("referer", "https://app.reya.network/"),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "cross-site"),
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/126.0.0.0 Safari/537.36",
    ),
    (
        "sec-ch-ua",
        "\"Not/A)Brand\";v=\"8\", \"Chromium\";v=\"126\", \"Google Chrome\";v=\"126\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
];

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(BROWSER_HEADERS.len());
    for &(name, value) in BROWSER_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

// ---------------------------------------------------------------------------
// HttpConnector
// ---------------------------------------------------------------------------

/// Opens one `HttpVoteApi` per account.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    base_url: String,
    proposal: String,
    contract: Address,
    request_timeout: Duration,
    connect_timeout: Duration,
}

impl HttpConnector {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            proposal: config.api.proposal.clone(),
            contract: config.vote.verifying_contract,
            request_timeout: config.api.request_timeout(),
            connect_timeout: config.api.connect_timeout(),
        }
    }

    pub fn status_url(&self, voter: Address) -> String {
        format!(
            "{}/{}/user/{}",
            self.base_url,
            self.proposal,
            voter.to_checksum(None)
        )
    }

    pub fn vote_url(&self) -> String {
        format!("{}/{}/vote", self.base_url, hex::encode_prefixed(self.contract.as_slice()))
    }
}

impl VoteApiConnector for HttpConnector {
    type Api = HttpVoteApi;

    fn connect(&self, proxy_url: Option<&str>) -> Result<HttpVoteApi, VoteError> {
        let mut builder = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout);

        // Without an explicit proxy, ignore HTTP(S)_PROXY from the environment.
        builder = match proxy_url {
            Some(url) => {
                let proxy = reqwest::Proxy::all(url)
                    .map_err(|e| VoteError::Network(format!("invalid proxy: {e}")))?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        let http = builder
            .build()
            .map_err(|e| VoteError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(HttpVoteApi {
            http,
            connector: self.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// HttpVoteApi
// ---------------------------------------------------------------------------

/// A single account's session. Owns its client; dropping it closes the pool.
pub struct HttpVoteApi {
    http: reqwest::Client,
    connector: HttpConnector,
}

fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, VoteError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(VoteError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl VoteApi for HttpVoteApi {
    async fn voting_status(&self, voter: Address) -> Result<VotingStatus, VoteError> {
        let url = self.connector.status_url(voter);
        debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(VoteError::from_reqwest)?;
        let response = check_status(response, &url)?;

        response
            .json::<VotingStatus>()
            .await
            .map_err(VoteError::from_reqwest)
    }

    async fn submit_vote(&self, submission: &VoteSubmission) -> Result<SubmitReceipt, VoteError> {
        let url = self.connector.vote_url();
        debug!("PUT {url} voter={}", submission.voter);

        let response = self
            .http
            .put(&url)
            .json(submission)
            .send()
            .await
            .map_err(VoteError::from_reqwest)?;
        let response = check_status(response, &url)?;

        let body: serde_json::Value = response.json().await.map_err(VoteError::from_reqwest)?;
        Ok(parse_submit_response(body))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
