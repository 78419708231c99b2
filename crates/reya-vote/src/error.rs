// Per-account failure kinds. None of these escape the account that raised them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoteError {
    /// Malformed private key or a failure while signing the typed data.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Connection, timeout or proxy failure.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered, but not with a 2xx.
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// The body was not JSON or lacked the expected fields.
    #[error("invalid response: {0}")]
    ResponseParse(String),

    /// The worker task panicked or never got a permit.
    #[error("worker aborted: {0}")]
    Aborted(String),
}

impl VoteError {
    /// Classify a reqwest error raised while sending or reading a body.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VoteError::ResponseParse(err.to_string())
        } else if err.is_timeout() {
            VoteError::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            VoteError::Network(format!("connection failed: {err}"))
        } else {
            VoteError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_code_and_url() {
        let err = VoteError::Status {
            status: 503,
            url: "https://api.example/vote".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("https://api.example/vote"));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = reqwest::Client::new()
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap_err();
        assert!(matches!(VoteError::from_reqwest(err), VoteError::Network(_)));
    }
}
