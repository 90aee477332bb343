use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use playlist_oauth_checks::config::RefreshCredentials;
use playlist_oauth_checks::error::{Result, SuiteError};
use playlist_oauth_checks::token::{Clock, IssuedToken, TokenCache, TokenEndpoint, EXPIRY_MARGIN_SECS};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn at(t: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(t)))
    }
    fn advance(&self, secs: i64) {
        let mut g = self.0.lock().unwrap();
        *g = *g + Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Counts refresh calls and hands out `tok-<n>` tokens.
struct CountingEndpoint {
    calls: AtomicUsize,
    expires_in: AtomicI64,
    fail: AtomicBool,
    delay_ms: u64,
}

impl CountingEndpoint {
    fn new(expires_in: i64) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            expires_in: AtomicI64::new(expires_in),
            fail: AtomicBool::new(false),
            delay_ms: 0,
        })
    }
    fn slow(expires_in: i64, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            expires_in: AtomicI64::new(expires_in),
            fail: AtomicBool::new(false),
            delay_ms,
        })
    }
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenEndpoint for CountingEndpoint {
    async fn refresh(&self, _credentials: &RefreshCredentials) -> Result<IssuedToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SuiteError::TokenRefreshFailed("500 => server error".into()));
        }
        Ok(IssuedToken {
            access_token: format!("tok-{}", n),
            expires_in: self.expires_in.load(Ordering::SeqCst),
        })
    }
}

fn creds() -> RefreshCredentials {
    RefreshCredentials {
        client_id: "cid".into(),
        client_secret: "csecret".into(),
        grant_type: "refresh_token".into(),
        refresh_token: "refresh".into(),
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn second_call_before_expiry_uses_cached_token() {
    let endpoint = CountingEndpoint::new(3600);
    let clock = ManualClock::at(t0());
    let cache = TokenCache::with_clock(endpoint.clone(), creds(), clock.clone());

    assert_eq!(cache.get_token().await.unwrap(), "tok-1");
    clock.advance(60);
    assert_eq!(cache.get_token().await.unwrap(), "tok-1");
    assert_eq!(endpoint.calls(), 1);
}

#[tokio::test]
async fn refresh_happens_at_expiry_minus_margin() {
    let endpoint = CountingEndpoint::new(3600);
    let clock = ManualClock::at(t0());
    let cache = TokenCache::with_clock(endpoint.clone(), creds(), clock.clone());

    cache.get_token().await.unwrap();
    let snap = cache.snapshot().await.expect("token cached");
    assert_eq!(snap.expires_at, t0() + Duration::seconds(3300));

    clock.advance(3299);
    assert_eq!(cache.get_token().await.unwrap(), "tok-1");
    assert_eq!(endpoint.calls(), 1);

    clock.advance(1);
    assert_eq!(cache.get_token().await.unwrap(), "tok-2");
    assert_eq!(endpoint.calls(), 2);
}

#[tokio::test]
async fn short_lived_tokens_refresh_on_every_call() {
    let endpoint = CountingEndpoint::new(EXPIRY_MARGIN_SECS);
    let clock = ManualClock::at(t0());
    let cache = TokenCache::with_clock(endpoint.clone(), creds(), clock);

    assert_eq!(cache.get_token().await.unwrap(), "tok-1");
    assert_eq!(cache.get_token().await.unwrap(), "tok-2");
    assert_eq!(cache.get_token().await.unwrap(), "tok-3");
    assert_eq!(endpoint.calls(), 3);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_token() {
    let endpoint = CountingEndpoint::new(3600);
    let clock = ManualClock::at(t0());
    let cache = TokenCache::with_clock(endpoint.clone(), creds(), clock.clone());

    cache.get_token().await.unwrap();
    let before = cache.snapshot().await;

    clock.advance(4000);
    endpoint.fail.store(true, Ordering::SeqCst);
    let err = cache.get_token().await.unwrap_err();
    assert!(matches!(err, SuiteError::TokenRefreshFailed(_)));
    assert!(err.is_auth_failure());
    assert_eq!(cache.snapshot().await, before);

    // Next caller retries and succeeds.
    endpoint.fail.store(false, Ordering::SeqCst);
    assert_eq!(cache.get_token().await.unwrap(), "tok-3");
}

#[tokio::test]
async fn failed_first_refresh_leaves_cache_empty() {
    let endpoint = CountingEndpoint::new(3600);
    endpoint.fail.store(true, Ordering::SeqCst);
    let cache = TokenCache::with_clock(endpoint.clone(), creds(), ManualClock::at(t0()));

    assert!(cache.get_token().await.is_err());
    assert!(cache.snapshot().await.is_none());
}

#[tokio::test]
async fn out_of_range_expires_in_is_a_refresh_failure() {
    let endpoint = CountingEndpoint::new(i64::MAX);
    let clock = ManualClock::at(t0());
    let cache = TokenCache::with_clock(endpoint.clone(), creds(), clock.clone());

    let err = cache.get_token().await.unwrap_err();
    assert!(matches!(err, SuiteError::TokenRefreshFailed(_)), "got {:?}", err);
    assert!(cache.snapshot().await.is_none());

    // A good token survives a later out-of-range response.
    endpoint.expires_in.store(3600, Ordering::SeqCst);
    assert_eq!(cache.get_token().await.unwrap(), "tok-2");
    let before = cache.snapshot().await;

    clock.advance(4000);
    for bad in [i64::MAX, i64::MIN] {
        endpoint.expires_in.store(bad, Ordering::SeqCst);
        let err = cache.get_token().await.unwrap_err();
        assert!(err.is_auth_failure(), "got {:?}", err);
        assert_eq!(cache.snapshot().await, before);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_a_single_refresh() {
    let endpoint = CountingEndpoint::slow(3600, 50);
    let cache = Arc::new(TokenCache::new(endpoint.clone(), creds()));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_token().await })
        })
        .collect();

    for h in handles {
        assert_eq!(h.await.unwrap().unwrap(), "tok-1");
    }
    assert_eq!(endpoint.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn value_and_expiry_are_replaced_together() {
    // Every token is already due (expires_in == 0), so each call refreshes.
    // The token number is encoded both in the value and, via the clock, in
    // the expiry, so any mix-up shows up as a mismatch.
    struct Numbered {
        calls: AtomicUsize,
        clock: Arc<ManualClock>,
    }

    #[async_trait]
    impl TokenEndpoint for Numbered {
        async fn refresh(&self, _c: &RefreshCredentials) -> Result<IssuedToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.clock.advance(1);
            tokio::task::yield_now().await;
            Ok(IssuedToken {
                access_token: format!("tok-{}", n),
                expires_in: 0,
            })
        }
    }

    let clock = ManualClock::at(t0());
    let endpoint = Arc::new(Numbered {
        calls: AtomicUsize::new(0),
        clock: clock.clone(),
    });
    let cache = Arc::new(TokenCache::with_clock(endpoint, creds(), clock));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..20 {
                cache.get_token().await.unwrap();
                if let Some(t) = cache.snapshot().await {
                    let n: i64 = t.value.trim_start_matches("tok-").parse().unwrap();
                    let expected = t0() + Duration::seconds(n - EXPIRY_MARGIN_SECS);
                    assert_eq!(t.expires_at, expected, "value {} paired with wrong expiry", t.value);
                }
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
}
