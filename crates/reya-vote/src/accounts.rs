// Account list loading.
//
// Reads a CSV export of the accounts spreadsheet: one row per wallet with a
// `Private key` column and an optional `Proxy` column.

use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One wallet to vote with. Consumed by exactly one worker.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    /// 1-based row position in the source file; only used to tag log lines.
    pub sequence_id: usize,
    /// Hex-encoded secp256k1 secret key, with or without `0x`.
    pub private_key: String,
    /// `host:port` or `user:pass@host:port`, without a scheme.
    pub proxy: Option<String>,
}

impl Account {
    pub fn new(sequence_id: usize, private_key: impl Into<String>, proxy: Option<String>) -> Self {
        Self {
            sequence_id,
            private_key: private_key.into(),
            proxy,
        }
    }

    /// Proxy URL as handed to the HTTP client (`http://{proxy}`).
    pub fn proxy_url(&self) -> Option<String> {
        self.proxy.as_ref().map(|p| format!("http://{p}"))
    }
}

// Never print the key.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("sequence_id", &self.sequence_id)
            .field("private_key", &"<redacted>")
            .field("proxy", &self.proxy)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AccountsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} has no `{column}` column")]
    MissingColumn { path: String, column: &'static str },
}

// ---------------------------------------------------------------------------
// Raw CSV row
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawAccountRow {
    #[serde(rename = "Private key")]
    private_key: String,
    #[serde(rename = "Proxy", default)]
    proxy: Option<String>,
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

const KEY_COLUMN: &str = "Private key";

/// Parse accounts from any CSV reader. `origin` names the source in errors.
///
/// The `Private key` header is required even when there are no rows. Rows
/// without a key are skipped but still count toward the sequence ids of the
/// rows after them, so ids always match the file.
pub fn load_accounts_from_reader<R: Read>(
    rdr: R,
    origin: &str,
) -> Result<Vec<Account>, AccountsError> {
    let csv_err = |source: csv::Error| AccountsError::Csv {
        path: origin.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr);

    let headers = reader.headers().map_err(csv_err)?;
    if !headers.iter().any(|h| h == KEY_COLUMN) {
        return Err(AccountsError::MissingColumn {
            path: origin.to_string(),
            column: KEY_COLUMN,
        });
    }

    let mut accounts = Vec::new();
    for (idx, result) in reader.deserialize::<RawAccountRow>().enumerate() {
        let sequence_id = idx + 1;
        let raw = result.map_err(csv_err)?;

        if raw.private_key.is_empty() {
            warn!("skipping account row {sequence_id}: empty private key");
            continue;
        }

        let proxy = raw.proxy.filter(|p| !p.is_empty());
        accounts.push(Account::new(sequence_id, raw.private_key, proxy));
    }
    Ok(accounts)
}

/// Load accounts from the CSV file at `path`.
pub fn load_accounts(path: &Path) -> Result<Vec<Account>, AccountsError> {
    let display = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| AccountsError::Io {
        path: display.clone(),
        source: e,
    })?;
    load_accounts_from_reader(file, &display)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_optional_proxies() {
        let csv = "Private key,Proxy\n0xaa,1.2.3.4:8080\n0xbb,\n";
        let accounts = load_accounts_from_reader(csv.as_bytes(), "accounts.csv").unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].sequence_id, 1);
        assert_eq!(accounts[0].private_key, "0xaa");
        assert_eq!(accounts[0].proxy.as_deref(), Some("1.2.3.4:8080"));
        assert_eq!(accounts[1].sequence_id, 2);
        assert_eq!(accounts[1].proxy, None);
    }

    #[test]
    fn whitespace_only_proxy_means_no_proxy() {
        let csv = "Private key,Proxy\n  0xaa  ,   \n";
        let accounts = load_accounts_from_reader(csv.as_bytes(), "accounts.csv").unwrap();
        assert_eq!(accounts[0].private_key, "0xaa");
        assert_eq!(accounts[0].proxy, None);
    }

    #[test]
    fn missing_proxy_column_is_allowed() {
        let csv = "Private key\n0xaa\n0xbb\n";
        let accounts = load_accounts_from_reader(csv.as_bytes(), "accounts.csv").unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|a| a.proxy.is_none()));
    }

    #[test]
    fn blank_key_rows_are_skipped_but_keep_row_numbering() {
        let csv = "Private key,Proxy\n0xaa,\n,1.2.3.4:80\n0xcc,\n";
        let accounts = load_accounts_from_reader(csv.as_bytes(), "accounts.csv").unwrap();
        let ids: Vec<usize> = accounts.iter().map(|a| a.sequence_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn proxy_url_gets_http_scheme() {
        let account = Account::new(1, "0xaa", Some("u:p@host:3128".into()));
        assert_eq!(account.proxy_url().as_deref(), Some("http://u:p@host:3128"));
        assert_eq!(Account::new(2, "0xbb", None).proxy_url(), None);
    }

    #[test]
    fn debug_output_redacts_private_key() {
        let account = Account::new(1, "0xdeadbeef", None);
        let rendered = format!("{account:?}");
        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn empty_file_yields_no_accounts() {
        let accounts =
            load_accounts_from_reader("Private key,Proxy\n".as_bytes(), "accounts.csv").unwrap();
        assert!(accounts.is_empty());
    }

    #[test]
    fn misnamed_key_header_is_an_error() {
        let inputs = [
            "Private Key,Proxy\n0xaa,\n0xbb,\n",
            "Private Key,Proxy\n",
            "Proxy\n1.2.3.4:80\n",
        ];
        for csv in inputs {
            let err = load_accounts_from_reader(csv.as_bytes(), "accounts.csv").unwrap_err();
            assert!(
                matches!(err, AccountsError::MissingColumn { column: "Private key", .. }),
                "{csv:?}: {err}"
            );
            assert!(err.to_string().contains("accounts.csv"));
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_accounts(Path::new("/nonexistent/accounts.csv")).unwrap_err();
        assert!(matches!(err, AccountsError::Io { .. }));
    }
}
