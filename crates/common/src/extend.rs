//! Script extension service client
//!
//! One extension runs `AcquireCredentials -> Request -> Success | Failure`.
//! On success the script file is overwritten with the service's result; on
//! any failure the file is left exactly as it was.

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credentials::{CredentialStore, Credentials};
use crate::error::{Error, Result};
use crate::prompt::Prompter;

/// Path of the extension endpoint on the service
pub const EXTEND_PATH: &str = "/ui-testing-v2/extend-script";

/// Header carrying the user's email
pub const EMAIL_HEADER: &str = "x-user-email";

/// Header carrying the auth token
pub const TOKEN_HEADER: &str = "x-auth-token";

#[derive(Debug, Serialize)]
struct ExtendRequest<'a> {
    script: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExtendResponse {
    #[serde(rename = "extendedScript")]
    extended_script: Option<String>,
    script: Option<String>,
}

/// Client for the script extension service
#[derive(Debug, Clone)]
pub struct ExtensionClient {
    base_url: String,
    client: reqwest::Client,
}

impl ExtensionClient {
    /// Create a client for the given service base URL.
    ///
    /// Certificate validation is relaxed so self-signed development
    /// endpoints work.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Full endpoint URL
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, EXTEND_PATH)
    }

    /// Send a script to the service and return the extended script
    pub async fn extend(&self, script: &str, credentials: &Credentials) -> Result<String> {
        let body = serde_json::to_vec(&ExtendRequest { script })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        headers.insert(EMAIL_HEADER, header_value(&credentials.email)?);
        headers.insert(TOKEN_HEADER, header_value(&credentials.token)?);

        debug!("POST {} ({} bytes)", self.endpoint(), body.len());
        let response = self
            .client
            .post(self.endpoint())
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::RemoteRejection {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(decode_extended_script(&text))
    }

    /// Extend the script at `path` in place.
    ///
    /// Credentials come from the store (prompting if needed). A spinner runs
    /// while the request is in flight and is cleared before returning. The
    /// file is only written after a successful response.
    pub async fn extend_file(
        &self,
        path: &Path,
        store: &CredentialStore,
        prompter: &mut dyn Prompter,
    ) -> Result<()> {
        if !path.is_file() {
            return Err(Error::ScriptNotFound(path.to_path_buf()));
        }
        let script = std::fs::read_to_string(path)?;
        let credentials = store.get(prompter).await?;

        let extended = {
            let _spinner = Spinner::start("Extending script...");
            self.extend(&script, &credentials).await
        }?;

        std::fs::write(path, &extended)?;
        info!("Extended script written to {}", path.display());
        Ok(())
    }
}

/// Pull the script out of a response body.
///
/// Prefers `extendedScript`, then `script`; a body that is not JSON, or JSON
/// without either field, is taken as the script itself.
pub fn decode_extended_script(body: &str) -> String {
    match serde_json::from_str::<ExtendResponse>(body) {
        Ok(ExtendResponse {
            extended_script: Some(script),
            ..
        })
        | Ok(ExtendResponse {
            extended_script: None,
            script: Some(script),
        }) => script,
        Ok(_) => body.to_string(),
        Err(e) => {
            debug!("Response is not structured ({}), using raw body", e);
            body.to_string()
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::MalformedRequest(format!("invalid header value: {}", e)))
}

/// Progress spinner cleared on drop
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn start(message: &'static str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use tempfile::TempDir;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            email: "a@b.com".to_string(),
            token: "t".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> ExtensionClient {
        ExtensionClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    /// Script file plus a credential store that never needs to prompt
    fn fixture(script: &str) -> (TempDir, std::path::PathBuf, CredentialStore) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("flow.spec.js");
        std::fs::write(&path, script).unwrap();

        let creds_path = tmp.path().join("credentials.json");
        std::fs::write(&creds_path, serde_json::to_string(&credentials()).unwrap()).unwrap();

        (tmp, path, CredentialStore::new(creds_path))
    }

    #[test]
    fn test_decode_prefers_extended_script() {
        assert_eq!(
            decode_extended_script(r#"{"extendedScript":"X","script":"Y"}"#),
            "X"
        );
        assert_eq!(decode_extended_script(r#"{"script":"Y"}"#), "Y");
    }

    #[test]
    fn test_decode_falls_back_to_body() {
        assert_eq!(decode_extended_script("plain text"), "plain text");
        assert_eq!(decode_extended_script(r#"{"other":1}"#), r#"{"other":1}"#);
    }

    #[tokio::test]
    async fn test_extend_sends_script_and_identity() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path(EXTEND_PATH))
            .and(matchers::header(EMAIL_HEADER, "a@b.com"))
            .and(matchers::header(TOKEN_HEADER, "t"))
            .and(matchers::header("content-type", "application/json"))
            .and(matchers::body_json(serde_json::json!({ "script": "S" })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"extendedScript":"X"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let extended = client_for(&server).extend("S", &credentials()).await.unwrap();
        assert_eq!(extended, "X");
    }

    #[tokio::test]
    async fn test_extend_file_overwrites_on_success() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path(EXTEND_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"extendedScript": "X"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let (_tmp, path, store) = fixture("original");
        let mut prompter = ScriptedPrompter::default();
        client_for(&server)
            .extend_file(&path, &store, &mut prompter)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "X");
        assert!(prompter.asked().is_empty());
    }

    #[tokio::test]
    async fn test_plain_text_response_is_the_script() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_string("test('more', () => {});"))
            .mount(&server)
            .await;

        let (_tmp, path, store) = fixture("original");
        client_for(&server)
            .extend_file(&path, &store, &mut ScriptedPrompter::default())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "test('more', () => {});"
        );
    }

    #[tokio::test]
    async fn test_rejection_preserves_file() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .expect(1)
            .mount(&server)
            .await;

        let (_tmp, path, store) = fixture("original\n");
        let err = client_for(&server)
            .extend_file(&path, &store, &mut ScriptedPrompter::default())
            .await
            .unwrap_err();

        match err {
            Error::RemoteRejection { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad token");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original\n");
    }

    #[tokio::test]
    async fn test_server_error_preserves_file() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let (_tmp, path, store) = fixture("original");
        let result = client_for(&server)
            .extend_file(&path, &store, &mut ScriptedPrompter::default())
            .await;

        assert!(matches!(result, Err(Error::RemoteRejection { status: 500, .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[tokio::test]
    async fn test_transport_error_preserves_file() {
        // Bind then release a port so nothing is listening on it
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client =
            ExtensionClient::new(&format!("http://127.0.0.1:{}", port), Duration::from_secs(2))
                .unwrap();

        let (_tmp, path, store) = fixture("original");
        let result = client
            .extend_file(&path, &store, &mut ScriptedPrompter::default())
            .await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[tokio::test]
    async fn test_missing_script_is_reported() {
        let tmp = TempDir::new().unwrap();
        let client = ExtensionClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let store = CredentialStore::new(tmp.path().join("credentials.json"));

        let result = client
            .extend_file(&tmp.path().join("absent.js"), &store, &mut ScriptedPrompter::default())
            .await;

        assert!(matches!(result, Err(Error::ScriptNotFound(_))));
    }
}
