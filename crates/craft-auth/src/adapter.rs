//! Local session state kept in step with the auth provider.

use std::sync::Arc;

use craft_cache::Cache;
use craft_commerce::notify::{Notification, Notifier};
use craft_commerce::{CommerceError, Profile, RemoteStore};
use craft_data::{RemoteStep, TimeoutConfig};
use tokio::sync::watch;

use crate::provider::AuthProvider;
use crate::session::{AuthSession, AuthUser};
use crate::AuthError;

/// What a sign-up produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    /// The provider opened a session right away.
    pub signed_in: bool,
    /// The profile row was written. The account stands either way.
    pub profile_saved: bool,
}

/// Sign-in, sign-up and sign-out with a persisted, observable session.
///
/// The local session is the source of truth for the client: sign-out
/// clears it before the provider is told, and the provider call can only
/// be logged, never undo it.
pub struct SessionAdapter {
    provider: Arc<dyn AuthProvider>,
    remote: RemoteStore,
    cache: Cache,
    notifier: Arc<dyn Notifier>,
    timeouts: TimeoutConfig,
    session: watch::Sender<Option<AuthSession>>,
}

impl SessionAdapter {
    /// Create an adapter, restoring a session persisted by an earlier run.
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        remote: RemoteStore,
        cache: Cache,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let timeouts = *remote.timeouts();
        let restored = restore(&cache);
        let (session, _) = watch::channel(restored);
        Self {
            provider,
            remote,
            cache,
            notifier,
            timeouts,
            session,
        }
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session.subscribe()
    }

    /// The current session, if signed in.
    pub fn current(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Bearer token of the current session.
    pub fn access_token(&self) -> Option<String> {
        self.session.borrow().as_ref().map(|s| s.access_token.clone())
    }

    fn open(&self, session: AuthSession) {
        if let Err(e) = self.cache.set(&AuthSession::cache_key(), &session) {
            tracing::warn!(error = %e, "failed to persist session");
        }
        tracing::info!(user_id = %session.user.id, "session opened");
        self.session.send_replace(Some(session));
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.trim();
        let result = self
            .timeouts
            .run(RemoteStep::SignIn, self.provider.sign_in(email, password))
            .await;

        match result {
            Ok(session) => {
                self.open(session.clone());
                self.notifier
                    .notify(Notification::success("Successfully signed in!"));
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(email, error = %e, "sign-in failed");
                self.notifier
                    .notify(Notification::error("Sign in failed. Please try again."));
                Err(e)
            }
        }
    }

    /// Create an account and save its profile.
    ///
    /// The profile in `profile` is stored under the new user's id. A failed
    /// profile write is reported in the outcome and does not fail the
    /// sign-up.
    pub async fn sign_up(&self, email: &str, password: &str, profile: Profile) -> Result<SignUpOutcome, AuthError> {
        let email = email.trim();
        if !craft_commerce::checkout::is_valid_email(email) {
            self.notifier
                .notify(Notification::error("Sign up failed. Please try again."));
            return Err(AuthError::InvalidEmail(email.to_string()));
        }

        let result = match self
            .timeouts
            .run(RemoteStep::SignUp, self.provider.sign_up(email, password))
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(email, error = %e, "sign-up failed");
                self.notifier
                    .notify(Notification::error("Sign up failed. Please try again."));
                return Err(e);
            }
        };

        let signed_in = result.session.is_some();
        if let Some(session) = result.session {
            self.open(session);
        }

        let profile = Profile {
            id: result.user.id.clone(),
            ..profile
        };
        let profile_saved = match self.save_profile(&profile).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id = %profile.id, error = %e, "account created but profile not saved");
                false
            }
        };

        self.notifier
            .notify(Notification::success("Account created successfully!"));
        Ok(SignUpOutcome {
            user: result.user,
            signed_in,
            profile_saved,
        })
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), CommerceError> {
        self.remote.upsert_profile(profile).await?;
        tracing::debug!(user_id = %profile.id, "profile saved");
        Ok(())
    }

    /// Sign out.
    ///
    /// Local state is cleared first and always; the provider is then told
    /// within the auth time bound, and any failure there is only logged.
    pub async fn sign_out(&self) {
        let previous = self.session.send_replace(None);
        if let Err(e) = self.cache.delete(&AuthSession::cache_key()) {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
        self.notifier
            .notify(Notification::success("Successfully signed out"));

        let Some(session) = previous else {
            return;
        };
        tracing::info!(user_id = %session.user.id, "session closed");

        if let Err(e) = self
            .timeouts
            .run(RemoteStep::SignOut, self.provider.sign_out(&session))
            .await
        {
            tracing::warn!(user_id = %session.user.id, error = %e, "remote sign-out failed");
        }
    }

    /// Profile of the signed-in user.
    pub async fn profile(&self) -> Result<Option<Profile>, CommerceError> {
        let Some(user) = self.user() else {
            return Ok(None);
        };
        self.remote.profile(&user.id).await
    }
}

impl std::fmt::Debug for SessionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAdapter")
            .field("user", &self.user().map(|u| u.id))
            .finish_non_exhaustive()
    }
}

fn restore(cache: &Cache) -> Option<AuthSession> {
    let key = AuthSession::cache_key();
    match cache.get::<AuthSession>(&key) {
        Ok(Some(session)) if session.is_expired() => {
            tracing::debug!(user_id = %session.user.id, "dropping expired session");
            if let Err(e) = cache.delete(&key) {
                tracing::warn!(error = %e, "failed to drop expired session");
            }
            None
        }
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable persisted session");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAuthProvider;
    use crate::session::SignUpResult;
    use async_trait::async_trait;
    use craft_commerce::notify::NotificationLog;
    use craft_commerce::remote::tables;
    use craft_db::{Db, Fault, FaultyStore, MemoryStore, Operation};
    use std::time::Duration;

    fn session() -> AuthSession {
        AuthSession::new("jwt", AuthUser::new("user-1", "mona@example.com"))
    }

    fn adapter(
        provider: impl AuthProvider + 'static,
        cache: Cache,
    ) -> (SessionAdapter, Arc<FaultyStore<MemoryStore>>, Arc<NotificationLog>) {
        let store = Arc::new(FaultyStore::new(MemoryStore::new()));
        let remote = RemoteStore::new(Db::new(store.clone()), TimeoutConfig::default());
        let log = Arc::new(NotificationLog::new());
        let adapter = SessionAdapter::new(Arc::new(provider), remote, cache, log.clone());
        (adapter, store, log)
    }

    struct HangingProvider;

    #[async_trait]
    impl AuthProvider for HangingProvider {
        async fn sign_in(&self, _: &str, _: &str) -> Result<AuthSession, AuthError> {
            std::future::pending().await
        }

        async fn sign_up(&self, _: &str, _: &str) -> Result<SignUpResult, AuthError> {
            std::future::pending().await
        }

        async fn sign_out(&self, _: &AuthSession) -> Result<(), AuthError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_sign_in_opens_session() {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_sign_in()
            .times(1)
            .returning(|_, _| Ok(session()));

        let cache = Cache::memory();
        let (adapter, _, log) = adapter(provider, cache.clone());
        let mut changes = adapter.subscribe();

        adapter.sign_in(" mona@example.com ", "secret").await.unwrap();

        assert!(changes.has_changed().unwrap());
        assert_eq!(
            changes.borrow_and_update().as_ref().map(|s| s.user.id.as_str().to_string()),
            Some("user-1".to_string())
        );
        assert!(cache.exists(&AuthSession::cache_key()).unwrap());
        assert_eq!(
            log.last().map(|n| n.message),
            Some("Successfully signed in!".to_string())
        );
    }

    #[tokio::test]
    async fn test_sign_in_failure_stays_signed_out() {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_sign_in()
            .returning(|_, _| Err(AuthError::InvalidCredentials));

        let (adapter, _, log) = adapter(provider, Cache::memory());
        let error = adapter.sign_in("mona@example.com", "wrong").await.unwrap_err();

        assert!(error.is_auth_failure());
        assert!(!adapter.is_signed_in());
        assert_eq!(
            log.last().map(|n| n.message),
            Some("Sign in failed. Please try again.".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_timeout() {
        let (adapter, _, _) = adapter(HangingProvider, Cache::memory());
        let error = adapter.sign_in("mona@example.com", "secret").await.unwrap_err();
        assert!(error.is_timeout());
        assert!(!adapter.is_signed_in());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_with_hanging_provider() {
        let cache = Cache::memory();
        cache.set(&AuthSession::cache_key(), &session()).unwrap();
        let (adapter, _, log) = adapter(HangingProvider, cache.clone());
        assert!(adapter.is_signed_in());

        let started = tokio::time::Instant::now();
        adapter.sign_out().await;

        assert!(started.elapsed() <= Duration::from_secs(3));
        assert!(!adapter.is_signed_in());
        assert!(!cache.exists(&AuthSession::cache_key()).unwrap());
        assert_eq!(
            log.last().map(|n| n.message),
            Some("Successfully signed out".to_string())
        );
    }

    #[tokio::test]
    async fn test_sign_out_with_failing_provider() {
        let mut provider = MockAuthProvider::new();
        provider.expect_sign_in().returning(|_, _| Ok(session()));
        provider
            .expect_sign_out()
            .times(1)
            .returning(|_| Err(AuthError::Unreachable("connection refused".into())));

        let (adapter, _, _) = adapter(provider, Cache::memory());
        adapter.sign_in("mona@example.com", "secret").await.unwrap();
        let mut changes = adapter.subscribe();

        adapter.sign_out().await;

        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_sign_up_saves_profile() {
        let mut provider = MockAuthProvider::new();
        provider.expect_sign_up().returning(|_, _| {
            Ok(SignUpResult {
                user: AuthUser::new("new-user", "sara@example.com"),
                session: None,
            })
        });

        let (adapter, store, log) = adapter(provider, Cache::memory());
        let outcome = adapter
            .sign_up(
                "sara@example.com",
                "secret123",
                Profile::default().with_full_name("Sara").with_phone("0101"),
            )
            .await
            .unwrap();

        assert!(outcome.profile_saved);
        assert!(!outcome.signed_in);
        assert!(!adapter.is_signed_in());

        let rows = store.inner().rows(tables::PROFILES);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("id"), Some("new-user"));
        assert_eq!(rows[0].get_str("full_name"), Some("Sara"));
        assert_eq!(
            log.last().map(|n| n.message),
            Some("Account created successfully!".to_string())
        );
    }

    #[tokio::test]
    async fn test_sign_up_survives_profile_failure() {
        let mut provider = MockAuthProvider::new();
        provider.expect_sign_up().returning(|_, _| {
            Ok(SignUpResult {
                user: AuthUser::new("new-user", "sara@example.com"),
                session: Some(AuthSession::new("jwt", AuthUser::new("new-user", "sara@example.com"))),
            })
        });

        let (adapter, store, _) = adapter(provider, Cache::memory());
        store.inject(tables::PROFILES, Operation::Upsert, Fault::Fail);

        let outcome = adapter
            .sign_up("sara@example.com", "secret123", Profile::default())
            .await
            .unwrap();

        assert!(!outcome.profile_saved);
        assert!(outcome.signed_in);
        assert!(adapter.is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_up_rejects_bad_email() {
        let provider = MockAuthProvider::new();
        let (adapter, _, _) = adapter(provider, Cache::memory());
        let error = adapter
            .sign_up("not-an-email", "secret123", Profile::default())
            .await
            .unwrap_err();
        assert!(matches!(error, AuthError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_expired_session_not_restored() {
        let cache = Cache::memory();
        cache
            .set(&AuthSession::cache_key(), &session().with_expires_at(1))
            .unwrap();

        let (adapter, _, _) = adapter(MockAuthProvider::new(), cache.clone());
        assert!(!adapter.is_signed_in());
        assert!(!cache.exists(&AuthSession::cache_key()).unwrap());
    }

    /// Backend that refuses deletes.
    #[derive(Default)]
    struct StickyBackend {
        inner: craft_cache::MemoryBackend,
    }

    impl craft_cache::KvBackend for StickyBackend {
        fn get(&self, key: &str) -> Result<Option<serde_json::Value>, craft_cache::CacheError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: serde_json::Value) -> Result<(), craft_cache::CacheError> {
            self.inner.set(key, value)
        }

        fn delete(&self, _: &str) -> Result<(), craft_cache::CacheError> {
            Err(craft_cache::CacheError::StoreError("read-only".into()))
        }

        fn keys(&self) -> Result<Vec<String>, craft_cache::CacheError> {
            self.inner.keys()
        }
    }

    #[tokio::test]
    async fn test_expired_session_dropped_when_delete_fails() {
        let cache = Cache::new(Arc::new(StickyBackend::default()));
        cache
            .set(&AuthSession::cache_key(), &session().with_expires_at(1))
            .unwrap();

        let (adapter, _, _) = adapter(MockAuthProvider::new(), cache.clone());
        assert!(!adapter.is_signed_in());
        assert!(cache.exists(&AuthSession::cache_key()).unwrap());
    }
}
