//! Integration tests for mint-rs.
//!
//! Everything here runs offline: the login driver is faked and the tests
//! exercise the session lifecycle, local validation guards, and the data
//! pipeline up to the point where a network request would be issued.
//!
//! Run with: cargo test --test client_tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

use mint_rs::prelude::*;

static INIT: Once = Once::new();

/// Initialize logging for tests
fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A login driver that hands back canned session state.
struct FakeDriver {
    token: String,
    calls: AtomicUsize,
}

impl FakeDriver {
    fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl LoginDriver for FakeDriver {
    fn login(
        &self,
        _credentials: &Credentials,
        two_factor: Option<&dyn TwoFactorProvider>,
    ) -> impl std::future::Future<Output = Result<LoginOutcome>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut cookies = CookieJar::new();
        cookies.set("ius_session", "fake-session");
        let token = self.token.clone();
        let code = two_factor.map(|p| p.code());
        async move {
            if let Some(code) = code {
                code?;
            }
            Ok(LoginOutcome { cookies, token })
        }
    }
}

fn client() -> MintClient {
    init_logging();
    MintClient::new(ClientConfig::default()).unwrap()
}

#[tokio::test]
async fn test_login_installs_session() {
    let client = client();
    assert!(!client.is_authenticated(false).await.unwrap());

    let driver = FakeDriver::new("js-token");
    let creds = Credentials::new("user@example.com", "pw");
    client.login_with(&driver, &creds, None).await.unwrap();

    assert!(client.is_authenticated(false).await.unwrap());
    let exported = client.export_session("user@example.com").await;
    assert_eq!(exported.token.as_deref(), Some("js-token"));
    assert_eq!(exported.cookies.get("ius_session"), Some("fake-session"));
}

#[tokio::test]
async fn test_login_with_empty_token_fails() {
    let client = client();
    let driver = FakeDriver::new("");
    let creds = Credentials::new("user@example.com", "pw");

    let err = client.login_with(&driver, &creds, None).await.unwrap_err();
    assert!(err.is_auth_error());
    assert!(!client.is_authenticated(false).await.unwrap());
}

#[tokio::test]
async fn test_two_factor_provider_reaches_the_driver() {
    let client = client();
    let driver = FakeDriver::new("tok");
    let creds = Credentials::new("user@example.com", "pw");

    let provider = || -> Result<String> { Ok("000111".to_string()) };
    client
        .login_with(&driver, &creds, Some(&provider))
        .await
        .unwrap();
    assert!(client.is_authenticated(false).await.unwrap());

    let failing = || -> Result<String> { Err(Error::InvalidInput("no code available".into())) };
    let client2 = self::client();
    assert!(client2
        .login_with(&driver, &creds, Some(&failing))
        .await
        .is_err());
}

#[tokio::test]
async fn test_login_cached_miss_runs_driver_and_persists() {
    let client = client();
    let dir = tempfile::tempdir().unwrap();
    let cache = SessionCache::at(dir.path().join("session.json"));
    let driver = FakeDriver::new("cached-token");
    let creds = Credentials::new("user@example.com", "pw");

    client
        .login_cached(&driver, &creds, None, &cache)
        .await
        .unwrap();
    assert_eq!(driver.calls.load(Ordering::SeqCst), 1);

    // The fresh session landed on disk, keyed to this email.
    let stored = cache.load("user@example.com").unwrap();
    assert_eq!(stored.token.as_deref(), Some("cached-token"));
    assert_eq!(stored.cookies.get("ius_session"), Some("fake-session"));
    assert!(cache.load("other@example.com").is_none());
}

#[tokio::test]
async fn test_logout_drops_session() {
    let client = client();
    let driver = FakeDriver::new("tok");
    let creds = Credentials::new("user@example.com", "pw");
    client.login_with(&driver, &creds, None).await.unwrap();

    client.logout().await;
    assert!(!client.is_authenticated(false).await.unwrap());
    let exported = client.export_session("user@example.com").await;
    assert!(exported.token.is_none());
    assert!(exported.cookies.is_empty());
}

#[tokio::test]
async fn test_unsupported_sort_fails_before_any_request() {
    let client = client();
    let filter = TransactionFilter {
        sort_field: SortField::Category,
        sort_ascending: false,
        ..Default::default()
    };

    // Building the stream already fails; nothing was sent.
    let err = client.transactions().stream(&filter).unwrap_err();
    assert!(matches!(err, Error::UnsupportedSort { .. }));
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn test_delete_guard_fires_before_any_request() {
    let client = client();
    // An ordinary imported bank transaction: not pending, not manual.
    let transaction: Transaction = serde_json::from_value(serde_json::json!({
        "id": 555,
        "date": "2024-01-15",
        "merchant": "Imported Row",
        "isDebit": true,
        "amount": "$10.00",
        "txnType": 0,
        "manualType": 0
    }))
    .unwrap();

    // The client is not even logged in; the guard fails first.
    let err = client.transactions().delete(&transaction).await.unwrap_err();
    assert!(matches!(err, Error::NotEditable(_)));
}

#[test]
fn test_transaction_cleaning_is_idempotent() {
    let mut transaction: Transaction = serde_json::from_value(serde_json::json!({
        "id": 777,
        "date": "01/05/23",
        "odate": "01/04/23",
        "merchant": "Coffee",
        "isDebit": true,
        "amount": "$4.50",
        "txnType": 0
    }))
    .unwrap();

    let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    transaction.clean_with_today(today).unwrap();
    assert_eq!(transaction.date, "2023-01-05");
    assert_eq!(transaction.amount, Amount::Clean(dec!(-4.50)));

    let cleaned_once = serde_json::to_value(&transaction).unwrap();
    transaction.clean_with_today(today).unwrap();
    assert_eq!(serde_json::to_value(&transaction).unwrap(), cleaned_once);
}

#[test]
fn test_session_cache_survives_restart() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let mut cookies = CookieJar::new();
        cookies.apply_set_cookie("mint=abc; Path=/; HttpOnly");
        let cache = SessionCache::at(&path);
        cache
            .store(&mint_rs::auth::CachedSession::new(
                "user@example.com",
                Some("tok".into()),
                cookies,
            ))
            .unwrap();
    }

    // A separate cache handle, as a new process would create.
    let reloaded = SessionCache::at(&path).load("user@example.com").unwrap();
    assert_eq!(reloaded.token.as_deref(), Some("tok"));
    assert_eq!(reloaded.cookies.get("mint"), Some("abc"));
}

#[tokio::test]
async fn test_wait_for_code_round_trip() {
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    init_logging();
    let waiter = tokio::spawn(mint_rs::callback::wait_for_code(
        18311,
        "mintcode",
        Duration::from_secs(5),
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", 18311))
        .await
        .unwrap();
    stream
        .write_all(b"GET /mintcode?424242 HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));

    let code = waiter.await.unwrap().unwrap();
    assert_eq!(code.as_deref(), Some("424242"));
}
