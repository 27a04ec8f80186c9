//! Reference data: the list of authorised users.
//!
//! The set is fetched once when a session opens and then shared read-only by the validator
//! and the submission controller. A successful fetch swaps in a whole new set; a failed one
//! leaves the previous set (empty on first load) in place and raises an error notification.

use crate::error::{RelayError, RelayResult};
use crate::notification::{NotificationKind, NotificationPresenter};
use crate::transport::HttpTransport;
use relay_types::ReferenceEntity;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// An immutable snapshot of authorised users.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSet {
    entities: Vec<ReferenceEntity>,
}

impl ReferenceSet {
    pub fn new(entities: Vec<ReferenceEntity>) -> Self {
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceEntity> {
        self.entities.iter()
    }

    /// First entity whose name equals `name` ignoring case and surrounding whitespace.
    pub fn find(&self, name: &str) -> Option<&ReferenceEntity> {
        self.entities.iter().find(|e| e.matches_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The matching entity, provided exactly one matches.
    pub fn find_unique(&self, name: &str) -> Option<&ReferenceEntity> {
        let mut matches = self.entities.iter().filter(|e| e.matches_name(name));
        let first = matches.next()?;
        if matches.next().is_some() {
            tracing::warn!(name = %name.trim(), "name matches more than one reference entity");
            return None;
        }
        Some(first)
    }
}

/// Progress of the session's reference-data load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Loaded(usize),
    Failed,
}

/// Holder of the current [`ReferenceSet`].
#[derive(Debug)]
pub struct ReferenceStore {
    current: RwLock<Arc<ReferenceSet>>,
    status: watch::Sender<LoadStatus>,
}

impl Default for ReferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceStore {
    pub fn new() -> Self {
        let (status, _) = watch::channel(LoadStatus::Pending);
        Self {
            current: RwLock::new(Arc::new(ReferenceSet::default())),
            status,
        }
    }

    /// The set as of now. Later replacements do not affect a snapshot already taken.
    pub fn current(&self) -> Arc<ReferenceSet> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, set: ReferenceSet) {
        let count = set.len();
        let set = Arc::new(set);
        match self.current.write() {
            Ok(mut guard) => *guard = set,
            Err(poisoned) => *poisoned.into_inner() = set,
        }
        self.status.send_replace(LoadStatus::Loaded(count));
    }

    pub fn mark_failed(&self) {
        self.status.send_replace(LoadStatus::Failed);
    }

    pub fn status(&self) -> LoadStatus {
        *self.status.borrow()
    }

    /// Resolve once the status leaves `Pending`.
    pub async fn wait_until_settled(&self) -> LoadStatus {
        let mut rx = self.status.subscribe();
        let settled = match rx.wait_for(|status| *status != LoadStatus::Pending).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        };
        settled
    }
}

/// Fetches the authorised-user list into a [`ReferenceStore`].
pub struct ReferenceDataLoader {
    transport: Arc<dyn HttpTransport>,
    url: String,
    store: Arc<ReferenceStore>,
    presenter: NotificationPresenter,
    started: AtomicBool,
}

impl ReferenceDataLoader {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        url: impl Into<String>,
        store: Arc<ReferenceStore>,
        presenter: NotificationPresenter,
    ) -> Self {
        Self {
            transport,
            url: url.into(),
            store,
            presenter,
            started: AtomicBool::new(false),
        }
    }

    /// Fetch and install the reference set.
    ///
    /// On failure the previous set stays in place, the status becomes `Failed` and an error
    /// notification is shown. There is no retry.
    pub async fn load(&self) -> RelayResult<usize> {
        match self.fetch().await {
            Ok(set) => {
                let count = set.len();
                self.store.replace(set);
                tracing::info!(count, url = %self.url, "reference data loaded");
                Ok(count)
            }
            Err(err) => {
                tracing::error!(url = %self.url, error = ?err, "reference data load failed");
                self.store.mark_failed();
                self.presenter.show(err.user_message(), NotificationKind::Error);
                Err(err)
            }
        }
    }

    async fn fetch(&self) -> RelayResult<ReferenceSet> {
        let response = self
            .transport
            .get(&self.url)
            .await
            .map_err(|e| RelayError::ReferenceLoad(e.to_string()))?;

        if !response.is_success() {
            return Err(RelayError::ReferenceLoad(format!(
                "unexpected status {}",
                response.status
            )));
        }

        let entities: Vec<ReferenceEntity> = serde_json::from_str(&response.body)
            .map_err(|e| RelayError::ReferenceLoad(format!("invalid reference data: {e}")))?;

        Ok(ReferenceSet::new(entities))
    }

    /// Fire the page-open load in the background. Only the first call does anything.
    pub fn spawn_initial_load(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("reference data load already started; ignoring");
            return None;
        }

        let loader = Arc::clone(self);
        Some(tokio::spawn(async move {
            // Errors are already logged and surfaced by `load`.
            let _ = loader.load().await;
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NOTIFICATION_AUTO_HIDE;
    use crate::notification::recording::RecordingSurface;
    use crate::transport::fake::{Call, FakeTransport};
    use crate::transport::{HttpResponse, TransportError};

    const USERS_URL: &str = "http://users.test/users";

    fn loader(
        transport: FakeTransport,
    ) -> (
        Arc<ReferenceDataLoader>,
        Arc<ReferenceStore>,
        Arc<FakeTransport>,
        Arc<RecordingSurface>,
    ) {
        let transport = Arc::new(transport);
        let store = Arc::new(ReferenceStore::new());
        let surface = Arc::new(RecordingSurface::default());
        let presenter = NotificationPresenter::new(surface.clone(), NOTIFICATION_AUTO_HIDE);
        let loader = Arc::new(ReferenceDataLoader::new(
            transport.clone(),
            USERS_URL,
            store.clone(),
            presenter,
        ));
        (loader, store, transport, surface)
    }

    #[test]
    fn find_is_case_insensitive_and_trimmed() {
        let set = ReferenceSet::new(vec![
            ReferenceEntity::new("Alice", "Eng"),
            ReferenceEntity::new("Bob", "Ops"),
        ]);

        assert_eq!(set.find("  aLiCe ").map(|e| e.dep.as_str()), Some("Eng"));
        assert!(set.contains("BOB"));
        assert!(!set.contains("Carol"));
        assert!(!ReferenceSet::default().contains("Alice"));
    }

    #[test]
    fn find_unique_rejects_ambiguous_names() {
        let set = ReferenceSet::new(vec![
            ReferenceEntity::new("Sam", "Eng"),
            ReferenceEntity::new("sam", "Ops"),
            ReferenceEntity::new("Alice", "Eng"),
        ]);

        assert!(set.contains("sam"));
        assert!(set.find_unique("sam").is_none());
        assert_eq!(set.find_unique("alice").map(|e| e.dep.as_str()), Some("Eng"));
    }

    #[tokio::test]
    async fn successful_load_replaces_set() {
        let (loader, store, transport, surface) = loader(
            FakeTransport::new().with_users(r#"[{"name":"Alice","dep":"Eng"},{"name":"Bob","dep":"Ops"}]"#),
        );

        assert_eq!(loader.load().await, Ok(2));
        assert_eq!(store.status(), LoadStatus::Loaded(2));
        assert!(store.current().contains("bob"));
        assert_eq!(
            transport.calls(),
            vec![Call::Get {
                url: USERS_URL.into()
            }]
        );
        assert!(surface.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_set_and_notifies() {
        let (loader, store, _transport, surface) = loader(
            FakeTransport::new()
                .with_users(r#"[{"name":"Alice","dep":"Eng"}]"#)
                .with_get(Ok(HttpResponse::new(503, "down"))),
        );

        loader.load().await.unwrap();
        let err = loader.load().await.unwrap_err();

        assert!(matches!(err, RelayError::ReferenceLoad(ref msg) if msg.contains("503")));
        assert_eq!(store.status(), LoadStatus::Failed);
        assert!(store.current().contains("alice"));
        assert_eq!(
            surface.rendered_messages(),
            vec![(
                NotificationKind::Error,
                "Failed to load user data. Please refresh the page.".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn malformed_body_and_network_errors_are_reference_load_errors() {
        let (loader, store, _transport, _surface) = loader(
            FakeTransport::new()
                .with_users("<html>not json</html>")
                .with_get(Err(TransportError::Unreachable("connection refused".into()))),
        );

        assert!(matches!(
            loader.load().await,
            Err(RelayError::ReferenceLoad(_))
        ));
        assert!(matches!(
            loader.load().await,
            Err(RelayError::ReferenceLoad(_))
        ));
        assert!(store.current().is_empty());
    }

    #[tokio::test]
    async fn initial_load_fires_only_once() {
        let (loader, store, transport, _surface) =
            loader(FakeTransport::new().with_users(r#"[{"name":"Alice","dep":"Eng"}]"#));

        let first = loader.spawn_initial_load();
        let second = loader.spawn_initial_load();
        assert!(first.is_some());
        assert!(second.is_none());

        assert_eq!(store.wait_until_settled().await, LoadStatus::Loaded(1));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn waiting_resolves_when_another_task_settles_the_store() {
        let store = Arc::new(ReferenceStore::new());
        assert_eq!(store.status(), LoadStatus::Pending);

        let writer = store.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            writer.mark_failed();
        });

        assert_eq!(store.wait_until_settled().await, LoadStatus::Failed);
        // Already settled: returns straight away.
        assert_eq!(store.wait_until_settled().await, LoadStatus::Failed);
    }
}
