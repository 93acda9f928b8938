//! HTTP client core: the shared session state and the two wire primitives.

use rand::Rng;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::{
    AccountsService, CategoriesService, PreferencesService, RefreshService, TagsService,
    TransactionsService,
};
use crate::auth::{CachedSession, Credentials, LoginDriver, Session, SessionCache,
    TwoFactorProvider};
use crate::client::listings::Listings;
use crate::client::pages::PageStream;
use crate::client::ClientConfig;
use crate::{Error, Result};

/// Body marker the site uses on pages served to a dead session.
const SESSION_EXPIRED_MARKER: &str = "session has expired";

/// The main client for the Mint web API.
///
/// All resource operations hang off service accessors (`accounts()`,
/// `transactions()`, and so on), which share one session and one set of
/// memoized listings. Requests are issued strictly sequentially by design;
/// nothing is retried automatically.
///
/// # Example
///
/// ```no_run
/// use mint_rs::{ClientConfig, Credentials, MintClient};
///
/// # async fn example(driver: impl mint_rs::LoginDriver) -> mint_rs::Result<()> {
/// let client = MintClient::new(ClientConfig::default())?;
/// client
///     .login_with(&driver, &Credentials::new("user@example.com", "pw"), None)
///     .await?;
///
/// for account in client.accounts().list().await?.iter() {
///     println!("{}: {:?}", account.name, account.current_balance);
/// }
/// # Ok(())
/// # }
/// ```
pub struct MintClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ClientConfig,
    pub(crate) session: RwLock<Session>,
    pub(crate) listings: Listings,
}

impl MintClient {
    /// Create an unauthenticated client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_session(Session::new(), config)
    }

    /// Create a client around an existing session.
    pub fn with_session(session: Session, config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                session: RwLock::new(session),
                listings: Listings::new(),
            }),
        })
    }

    /// Get the accounts service.
    pub fn accounts(&self) -> AccountsService {
        AccountsService::new(self.inner.clone())
    }

    /// Get the transactions service.
    pub fn transactions(&self) -> TransactionsService {
        TransactionsService::new(self.inner.clone())
    }

    /// Get the categories service.
    pub fn categories(&self) -> CategoriesService {
        CategoriesService::new(self.inner.clone())
    }

    /// Get the tags service.
    pub fn tags(&self) -> TagsService {
        TagsService::new(self.inner.clone())
    }

    /// Get the account-refresh service.
    pub fn refresh(&self) -> RefreshService {
        RefreshService::new(self.inner.clone())
    }

    /// Get the user-preferences service.
    pub fn preferences(&self) -> PreferencesService {
        PreferencesService::new(self.inner.clone())
    }

    /// Log in through an external interactive driver.
    ///
    /// The driver owns the browser flow; this method consumes its end state
    /// (cookies plus token), installs it as the session, and invalidates all
    /// memoized listings.
    pub async fn login_with<D: LoginDriver>(
        &self,
        driver: &D,
        credentials: &Credentials,
        two_factor: Option<&dyn TwoFactorProvider>,
    ) -> Result<()> {
        let outcome = driver.login(credentials, two_factor).await?;
        if outcome.token.is_empty() {
            return Err(Error::Authentication(
                "login driver returned an empty token".into(),
            ));
        }

        self.inner
            .session
            .write()
            .await
            .replace(outcome.cookies, outcome.token);
        self.inner.listings.invalidate_all().await;
        tracing::info!("logged in as {}", credentials.email);
        Ok(())
    }

    /// Log in, reusing the cached session when it is still honored.
    ///
    /// A cache hit (matching schema version and email, and a successful live
    /// probe) skips the interactive driver entirely. On a miss or a dead
    /// session the driver runs and the fresh session is written back to the
    /// cache.
    pub async fn login_cached<D: LoginDriver>(
        &self,
        driver: &D,
        credentials: &Credentials,
        two_factor: Option<&dyn TwoFactorProvider>,
        cache: &SessionCache,
    ) -> Result<()> {
        if let Some(cached) = cache.load(&credentials.email) {
            self.install_cached(cached).await;
            if self.is_authenticated(true).await? {
                tracing::info!("using cached login");
                self.inner.listings.invalidate_all().await;
                return Ok(());
            }
            tracing::debug!("cached session no longer honored; falling back to driver");
        }

        self.login_with(driver, credentials, two_factor).await?;
        cache.store(&self.export_session(&credentials.email).await)?;
        Ok(())
    }

    /// Package the current session for persistence.
    pub async fn export_session(&self, email: &str) -> CachedSession {
        let session = self.inner.session.read().await;
        CachedSession::new(email, session.token_value(), session.cookies().clone())
    }

    /// Check authentication state.
    ///
    /// With `probe: false` this only checks that a token is held locally.
    /// With `probe: true` a lightweight status request is issued: `Ok(false)`
    /// means the server no longer honors the session, while non-auth
    /// failures are surfaced as errors.
    pub async fn is_authenticated(&self, probe: bool) -> Result<bool> {
        if !probe {
            return Ok(self.inner.session.read().await.has_token());
        }

        match self.inner.user_status().await {
            Ok(status) => Ok(status.get("isRefreshing").is_some()),
            Err(Error::SessionExpired) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Drop all session state and memoized listings.
    pub async fn logout(&self) {
        self.inner.session.write().await.clear();
        self.inner.listings.invalidate_all().await;
    }

    async fn install_cached(&self, cached: CachedSession) {
        let mut session = Session::new();
        *session.cookies_mut() = cached.cookies;
        if let Some(token) = cached.token {
            let cookies = session.cookies().clone();
            session.replace(cookies, token);
        }
        *self.inner.session.write().await = session;
    }
}

impl Clone for MintClient {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for MintClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Random nonce in the range the site's own frontend uses. Cache busting
/// only; the value has no semantic effect.
pub(crate) fn nonce() -> String {
    rand::thread_rng().gen_range(0..100_000_000_000_000u64).to_string()
}

impl ClientInner {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn pfm_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.pfm_base_url.trim_end_matches('/'), path)
    }

    pub(crate) async fn token(&self) -> Result<String> {
        self.session
            .read()
            .await
            .token_value()
            .ok_or_else(|| Error::Authentication("not logged in".into()))
    }

    /// Issue a legacy request and parse the JSON response.
    ///
    /// This is the single funnel for legacy traffic: it attaches the session
    /// cookies and user agent, records any cookies the server sets back, and
    /// classifies failures — a "session has expired" marker in an otherwise
    /// bad response becomes [`Error::SessionExpired`], everything else a
    /// [`Error::Request`] carrying the url for diagnosis.
    ///
    /// With `expect_json: false` the body is returned as a JSON string value
    /// without content-type enforcement, for the handful of endpoints that
    /// answer with HTML or XML-ish fragments.
    pub(crate) async fn json_request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        form: Option<&[(String, String)]>,
        expect_json: bool,
    ) -> Result<Value> {
        let url = self.url(path);
        let (cookie_header, user_agent) = {
            let session = self.session.read().await;
            (
                session.cookies().header_value(),
                session.user_agent().to_string(),
            )
        };

        let mut request = self
            .http
            .request(method, &url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, user_agent);
        if !cookie_header.is_empty() {
            request = request.header(COOKIE, cookie_header);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(form) = form {
            request = request.form(form);
        }

        tracing::debug!(%url, "issuing legacy request");
        let response = request.send().await?;

        {
            let mut session = self.session.write().await;
            for value in response.headers().get_all(SET_COOKIE) {
                if let Ok(header) = value.to_str() {
                    session.cookies_mut().apply_set_cookie(header);
                }
            }
        }

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;

        let is_json = content_type.starts_with("application/json")
            || content_type.starts_with("text/json");

        if !status.is_success() || (expect_json && !is_json) {
            if body.to_lowercase().contains(SESSION_EXPIRED_MARKER) {
                return Err(Error::SessionExpired);
            }
            return Err(Error::Request {
                url,
                status: Some(status.as_u16()),
                detail: format!(
                    "unexpected response (content-type {:?}): {}",
                    content_type,
                    snippet(&body)
                ),
            });
        }

        if expect_json {
            Ok(serde_json::from_str(&body)?)
        } else {
            Ok(Value::String(body))
        }
    }

    /// Issue a bundled-service call and unwrap the matching envelope.
    ///
    /// The logical request is wrapped as `{service, task, args, id}` and
    /// posted as a JSON-encoded list in the `input` form field, with the
    /// session token as a query parameter. The response is a map keyed by
    /// envelope id; an absent id is a protocol violation, not a retry
    /// candidate.
    pub(crate) async fn service_call(
        &self,
        service: &str,
        task: &str,
        args: Value,
    ) -> Result<Value> {
        let id = nonce();
        let envelope = serde_json::json!([{
            "args": args,
            "service": service,
            "task": task,
            "id": id,
        }]);
        let token = self.token().await?;

        let query = vec![
            ("legacy".to_string(), "false".to_string()),
            ("token".to_string(), token),
        ];
        let form = vec![("input".to_string(), envelope.to_string())];

        let result = self
            .json_request(
                Method::POST,
                "bundledServiceController.xevent",
                &query,
                Some(&form),
                true,
            )
            .await?;

        result
            .get("response")
            .and_then(|r| r.get(&id))
            .and_then(|r| r.get("response"))
            .cloned()
            .ok_or_else(|| {
                Error::Protocol(format!(
                    "response for envelope id {id} missing (service {service}, task {task})"
                ))
            })
    }

    /// Issue a PFM-style request.
    ///
    /// Authorization is the fixed web API key, not the session token. The
    /// session cookies are snapshotted before the call and restored verbatim
    /// afterwards: this endpoint class is known to set cookies that break
    /// the legacy session, so whatever it sends back is discarded.
    pub(crate) async fn pfm_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.pfm_url(path);
        let (snapshot, user_agent) = {
            let session = self.session.read().await;
            (session.cookies().clone(), session.user_agent().to_string())
        };

        let mut request = self
            .http
            .request(method, &url)
            .header(
                AUTHORIZATION,
                format!(
                    "Intuit_APIKey intuit_apikey={}, intuit_apikey_version=1.0",
                    self.config.api_key
                ),
            )
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, user_agent);
        if !snapshot.is_empty() {
            request = request.header(COOKIE, snapshot.header_value());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%url, "issuing PFM request");
        let outcome = request.send().await;

        // Restore the pre-call jar whether or not the request succeeded.
        *self.session.write().await.cookies_mut() = snapshot;

        let response = outcome?;
        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() == 401 {
            return Err(Error::SessionExpired);
        }
        if !status.is_success() {
            if body.to_lowercase().contains(SESSION_EXPIRED_MARKER) {
                return Err(Error::SessionExpired);
            }
            return Err(Error::Request {
                url,
                status: Some(status.as_u16()),
                detail: snippet(&body),
            });
        }

        if body.trim().is_empty() {
            Ok(Value::Null)
        } else {
            Ok(serde_json::from_str(&body)?)
        }
    }

    /// Fetch raw bytes from a legacy endpoint (the CSV download).
    pub(crate) async fn get_bytes(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Vec<u8>> {
        let url = self.url(path);
        let (cookie_header, user_agent) = {
            let session = self.session.read().await;
            (
                session.cookies().header_value(),
                session.user_agent().to_string(),
            )
        };

        let mut request = self.http.get(&url).header(USER_AGENT, user_agent);
        if !cookie_header.is_empty() {
            request = request.header(COOKIE, cookie_header);
        }
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Request {
                url,
                status: Some(status.as_u16()),
                detail: "download failed".into(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// The lightweight status probe shared by `is_authenticated` and the
    /// refresh poll.
    pub(crate) async fn user_status(&self) -> Result<Value> {
        let query = vec![("rnd".to_string(), nonce())];
        self.json_request(Method::GET, "userStatus.xevent", &query, None, true)
            .await
    }

    /// Build a lazy row stream over the legacy offset-paged feed.
    ///
    /// Each page request carries the caller's parameters plus the running
    /// offset and a fresh cache-busting nonce.
    pub(crate) fn page_stream(
        self: Arc<Self>,
        params: Vec<(String, String)>,
        initial_offset: u64,
    ) -> PageStream {
        let inner = self;
        PageStream::new(initial_offset, move |offset| {
            let inner = inner.clone();
            let mut params = params.clone();
            Box::pin(async move {
                params.push(("offset".to_string(), offset.to_string()));
                params.push(("rnd".to_string(), nonce()));
                let value = inner
                    .json_request(Method::GET, "app/getJsonData.xevent", &params, None, true)
                    .await?;
                let set = value
                    .get("set")
                    .and_then(|s| s.get(0))
                    .ok_or_else(|| Error::Request {
                        url: inner.url("app/getJsonData.xevent"),
                        status: None,
                        detail: "paged response missing 'set'".into(),
                    })?;
                Ok(set
                    .get("data")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default())
            })
        })
    }
}

/// Trim a body for inclusion in an error message.
fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_shape() {
        for _ in 0..100 {
            let n: u64 = nonce().parse().unwrap();
            assert!(n < 100_000_000_000_000);
        }
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let short = snippet("hello");
        assert_eq!(short, "hello");

        let long = "é".repeat(150);
        let cut = snippet(&long);
        assert!(cut.ends_with('…'));
        assert!(cut.len() < long.len());
    }

    #[tokio::test]
    async fn test_unauthenticated_client_state() {
        let client = MintClient::new(ClientConfig::default()).unwrap();
        assert!(!client.is_authenticated(false).await.unwrap());

        let exported = client.export_session("user@example.com").await;
        assert!(exported.token.is_none());
        assert!(exported.cookies.is_empty());
    }
}
