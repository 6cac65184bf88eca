//! Integration tests for the sync engine.
//!
//! These drive full runs against in-memory fakes of the remote API and the
//! document store, and bound every run with a timeout so a hang in the
//! fetch/index handoff fails the test instead of blocking it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use geronimo::platform::{self, PlatformClient, PlatformError, PlatformRepo, RepoPage, UserProfile};
use geronimo::store::{self, DocumentStore, IndexAck, StoreError, StoreInfo};
use geronimo::sync::{
    FailureKind, ProgressCallback, SyncEngine, SyncError, SyncOptions, SyncProgress, SyncReport,
    SyncStage,
};

/// Maximum time any run should take in tests.
const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

fn repo(id: i64, name: &str) -> PlatformRepo {
    PlatformRepo {
        id,
        owner: "alice".to_string(),
        name: name.to_string(),
        description: Some(format!("{name} description")),
        created_at: None,
        language: Some("Rust".to_string()),
        forks: Some(1),
        stars: Some(10),
        subscribers: None,
        watchers: Some(10),
        open_issues: Some(0),
    }
}

// ─── Fakes ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeRemote {
    users: HashMap<String, UserProfile>,
    repos: Vec<PlatformRepo>,
    failing_pages: HashSet<u32>,
    auth_fails: bool,
    page_latency: Option<Duration>,
    user_calls: AtomicUsize,
    page_calls: Mutex<Vec<u32>>,
}

impl FakeRemote {
    fn with_alice(repos: Vec<PlatformRepo>) -> Self {
        let alice = UserProfile {
            id: 1001,
            login: "alice".to_string(),
            name: Some("Alice".to_string()),
            company: None,
            email: Some("alice@example.com".to_string()),
            location: None,
        };
        Self {
            users: HashMap::from([("alice".to_string(), alice)]),
            repos,
            ..Default::default()
        }
    }

    fn total_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst) + self.page_calls.lock().unwrap().len()
    }

    fn page_calls(&self) -> Vec<u32> {
        self.page_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformClient for FakeRemote {
    async fn get_user(&self, login: &str) -> platform::Result<UserProfile> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        if self.auth_fails {
            return Err(PlatformError::AuthRequired);
        }
        self.users
            .get(login)
            .cloned()
            .ok_or_else(|| PlatformError::not_found(format!("users/{login}")))
    }

    async fn list_user_repos_page(
        &self,
        _login: &str,
        page: u32,
        per_page: u32,
    ) -> platform::Result<RepoPage> {
        self.page_calls.lock().unwrap().push(page);
        if let Some(latency) = self.page_latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing_pages.contains(&page) {
            return Err(PlatformError::api(format!("page {page} failed")));
        }

        let per_page = per_page as usize;
        let pages = self.repos.len().div_ceil(per_page).max(1) as u32;
        let repos = self
            .repos
            .iter()
            .skip((page as usize - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        Ok(RepoPage {
            repos,
            next_page: if page < pages { page + 1 } else { 0 },
            last_page: Some(pages),
        })
    }
}

type DocKey = (String, String, String);

#[derive(Default)]
struct FakeStore {
    unreachable: bool,
    ping_latency: Option<Duration>,
    race_on_create: bool,
    fail_upsert_ids: HashSet<String>,
    indices: Mutex<HashSet<String>>,
    create_calls: AtomicUsize,
    docs: Mutex<BTreeMap<DocKey, serde_json::Value>>,
    calls: Mutex<Vec<String>>,
}

impl FakeStore {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// Every store call, in the order it was made.
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn docs(&self) -> BTreeMap<DocKey, serde_json::Value> {
        self.docs.lock().unwrap().clone()
    }

    fn doc(&self, index: &str, doc_type: &str, id: &str) -> Option<serde_json::Value> {
        self.docs
            .lock()
            .unwrap()
            .get(&(index.to_string(), doc_type.to_string(), id.to_string()))
            .cloned()
    }

    fn has_index(&self, name: &str) -> bool {
        self.indices.lock().unwrap().contains(name)
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn ping(&self) -> store::Result<StoreInfo> {
        self.record("ping".to_string());
        if let Some(latency) = self.ping_latency {
            tokio::time::sleep(latency).await;
        }
        if self.unreachable {
            return Err(StoreError::Http("connection refused".to_string()));
        }
        Ok(StoreInfo {
            version: "7.17.9".to_string(),
            cluster_name: "test".to_string(),
        })
    }

    async fn index_exists(&self, name: &str) -> store::Result<bool> {
        self.record(format!("exists {name}"));
        Ok(self.has_index(name))
    }

    async fn create_index(&self, name: &str) -> store::Result<()> {
        self.record(format!("create {name}"));
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.indices.lock().unwrap().insert(name.to_string());
        if self.race_on_create {
            return Err(StoreError::IndexAlreadyExists(name.to_string()));
        }
        Ok(())
    }

    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        document: &serde_json::Value,
    ) -> store::Result<IndexAck> {
        self.record(format!("upsert {index}/{doc_type}/{id}"));
        if self.fail_upsert_ids.contains(id) {
            return Err(StoreError::Api {
                status: 500,
                message: "shard failure".to_string(),
            });
        }
        let previous = self.docs.lock().unwrap().insert(
            (index.to_string(), doc_type.to_string(), id.to_string()),
            document.clone(),
        );
        Ok(IndexAck {
            index: index.to_string(),
            id: id.to_string(),
            result: if previous.is_some() { "updated" } else { "created" }.to_string(),
            version: None,
        })
    }
}

fn small_pages() -> SyncOptions {
    SyncOptions {
        page_size: 2,
        ..Default::default()
    }
}

async fn run(
    remote: &Arc<FakeRemote>,
    store: &Arc<FakeStore>,
    options: SyncOptions,
    login: &str,
) -> Result<SyncReport, SyncError> {
    let engine = SyncEngine::new(remote.clone(), store.clone(), options);
    tokio::time::timeout(SYNC_TIMEOUT, engine.run(login))
        .await
        .expect("sync run should not hang")
}

// ─── End-to-end ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_sync_indexes_profile_and_repositories() {
    let remote = Arc::new(FakeRemote::with_alice(vec![
        repo(1, "a"),
        repo(2, "b"),
        repo(3, "c"),
    ]));
    let store = Arc::new(FakeStore::default());

    let report = run(&remote, &store, small_pages(), "alice").await.unwrap();

    assert_eq!(report.login, "alice");
    assert!(report.profile_indexed);
    assert_eq!(report.pages_requested, 2);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.indexed, 3);
    assert!(report.failures.is_empty());
    assert!(!report.interrupted);
    assert_eq!(remote.page_calls(), vec![1, 2]);

    let docs = store.docs();
    assert_eq!(docs.len(), 4);
    assert_eq!(
        store.doc("alice", "user", "1001").unwrap(),
        serde_json::json!({
            "user": "alice",
            "name": "Alice",
            "company": "",
            "email": "alice@example.com",
            "location": ""
        })
    );
    for id in ["1", "2", "3"] {
        assert!(store.doc("alice", "repository", id).is_some());
    }
    assert_eq!(
        store.doc("alice", "repository", "2").unwrap()["created"],
        ""
    );
    for index in ["alice_a", "alice_b", "alice_c"] {
        assert!(store.has_index(index), "missing index {index}");
    }

    assert_eq!(store.create_calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        store.calls(),
        vec![
            "ping",
            "upsert alice/user/1001",
            "exists alice_a",
            "create alice_a",
            "upsert alice/repository/1",
            "exists alice_b",
            "create alice_b",
            "upsert alice/repository/2",
            "exists alice_c",
            "create alice_c",
            "upsert alice/repository/3",
        ]
    );
}

#[tokio::test]
async fn test_rerun_replaces_documents() {
    let remote = Arc::new(FakeRemote::with_alice(vec![repo(1, "a"), repo(2, "b")]));
    let store = Arc::new(FakeStore::default());

    run(&remote, &store, small_pages(), "alice").await.unwrap();
    let first = store.docs();
    let report = run(&remote, &store, small_pages(), "alice").await.unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(store.docs(), first);
}

#[tokio::test]
async fn test_empty_account() {
    let remote = Arc::new(FakeRemote::with_alice(Vec::new()));
    let store = Arc::new(FakeStore::default());

    let report = run(&remote, &store, SyncOptions::default(), "alice")
        .await
        .unwrap();

    assert!(report.profile_indexed);
    assert_eq!(report.pages_requested, 1);
    assert_eq!(report.indexed, 0);
    assert_eq!(store.docs().len(), 1);
}

// ─── Fatal errors ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unreachable_store_makes_no_remote_calls() {
    let remote = Arc::new(FakeRemote::with_alice(vec![repo(1, "a")]));
    let store = Arc::new(FakeStore {
        unreachable: true,
        ..Default::default()
    });

    let err = run(&remote, &store, small_pages(), "alice")
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::StoreUnreachable(_)));
    assert_eq!(remote.total_calls(), 0);
    assert!(store.docs().is_empty());
}

#[tokio::test]
async fn test_unknown_account_aborts_before_writes() {
    let remote = Arc::new(FakeRemote::with_alice(vec![repo(1, "a")]));
    let store = Arc::new(FakeStore::default());

    let err = run(&remote, &store, small_pages(), "ghost")
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::AccountNotFound(ref login) if login == "ghost"));
    assert!(remote.page_calls().is_empty());
    assert!(store.docs().is_empty());
}

#[tokio::test]
async fn test_rejected_credentials_abort() {
    let remote = Arc::new(FakeRemote {
        auth_fails: true,
        ..FakeRemote::with_alice(vec![repo(1, "a")])
    });
    let store = Arc::new(FakeStore::default());

    let err = run(&remote, &store, small_pages(), "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Auth { .. }));
}

#[tokio::test]
async fn test_blank_login_is_a_configuration_error() {
    let remote = Arc::new(FakeRemote::default());
    let store = Arc::new(FakeStore::default());

    let err = run(&remote, &store, small_pages(), "  ").await.unwrap_err();
    assert!(matches!(err, SyncError::Configuration(_)));
    assert_eq!(remote.total_calls(), 0);
}

// ─── Non-fatal failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_single_upsert_failure_does_not_fail_run() {
    let remote = Arc::new(FakeRemote::with_alice(vec![
        repo(1, "a"),
        repo(2, "b"),
        repo(3, "c"),
    ]));
    let store = Arc::new(FakeStore {
        fail_upsert_ids: HashSet::from(["2".to_string()]),
        ..Default::default()
    });

    let report = run(&remote, &store, small_pages(), "alice").await.unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.indexed, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Upsert);
    assert_eq!(report.failures[0].subject, "alice/b");
    assert!(store.doc("alice", "repository", "3").is_some());
}

#[tokio::test]
async fn test_page_failure_does_not_halt_pagination() {
    let remote = Arc::new(FakeRemote {
        failing_pages: HashSet::from([2]),
        ..FakeRemote::with_alice((1..=6).map(|i| repo(i, &format!("r{i}"))).collect())
    });
    let store = Arc::new(FakeStore::default());

    let report = run(&remote, &store, small_pages(), "alice").await.unwrap();

    assert_eq!(remote.page_calls(), vec![1, 2, 3]);
    assert_eq!(report.fetched, 4);
    assert_eq!(report.indexed, 4);
    assert_eq!(report.failures_of(FailureKind::PageFetch).count(), 1);
    assert!(store.doc("alice", "repository", "5").is_some());
    assert!(store.doc("alice", "repository", "3").is_none());
}

#[tokio::test]
async fn test_profile_index_failure_continues() {
    let remote = Arc::new(FakeRemote::with_alice(vec![repo(1, "a")]));
    let store = Arc::new(FakeStore {
        fail_upsert_ids: HashSet::from(["1001".to_string()]),
        ..Default::default()
    });

    let report = run(&remote, &store, small_pages(), "alice").await.unwrap();

    assert!(!report.profile_indexed);
    assert_eq!(report.failures_of(FailureKind::ProfileIndex).count(), 1);
    assert_eq!(report.indexed, 1);
}

#[tokio::test]
async fn test_index_creation_race_is_tolerated() {
    let remote = Arc::new(FakeRemote::with_alice(vec![repo(1, "a"), repo(2, "b")]));
    let store = Arc::new(FakeStore {
        race_on_create: true,
        ..Default::default()
    });

    let report = run(&remote, &store, small_pages(), "alice").await.unwrap();

    assert_eq!(report.indexed, 2);
    assert!(report.failures.is_empty());
    assert_eq!(store.create_calls.load(Ordering::SeqCst), 2);
}

// ─── Cancellation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_shutdown_flag_interrupts_run() {
    let remote = Arc::new(FakeRemote::with_alice(vec![repo(1, "a"), repo(2, "b")]));
    let store = Arc::new(FakeStore::default());
    let flag = Arc::new(AtomicBool::new(true));

    let engine =
        SyncEngine::new(remote.clone(), store.clone(), small_pages()).with_shutdown_flag(flag);
    let report = tokio::time::timeout(SYNC_TIMEOUT, engine.run("alice"))
        .await
        .unwrap()
        .unwrap();

    assert!(report.interrupted);
    assert!(report.profile_indexed);
    assert_eq!(report.indexed, 0);
    assert!(remote.page_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_during_pipeline() {
    let remote = Arc::new(FakeRemote {
        page_latency: Some(Duration::from_secs(60)),
        ..FakeRemote::with_alice((1..=10).map(|i| repo(i, &format!("r{i}"))).collect())
    });
    let store = Arc::new(FakeStore::default());
    let options = SyncOptions {
        timeout: Some(Duration::from_secs(5)),
        ..small_pages()
    };

    let err = SyncEngine::new(remote.clone(), store, options)
        .run("alice")
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::TimedOut(d) if d == Duration::from_secs(5)));
    assert_eq!(remote.page_calls(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_during_startup() {
    let remote = Arc::new(FakeRemote::with_alice(vec![repo(1, "a")]));
    let store = Arc::new(FakeStore {
        ping_latency: Some(Duration::from_secs(60)),
        ..Default::default()
    });
    let options = SyncOptions {
        timeout: Some(Duration::from_secs(1)),
        ..small_pages()
    };

    let err = SyncEngine::new(remote.clone(), store, options)
        .run("alice")
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::TimedOut(_)));
    assert_eq!(remote.total_calls(), 0);
}

// ─── Progress ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_progress_reports_stages_in_order() {
    let remote = Arc::new(FakeRemote::with_alice(vec![repo(1, "a"), repo(2, "b"), repo(3, "c")]));
    let store = Arc::new(FakeStore::default());

    let stages = Arc::new(Mutex::new(Vec::new()));
    let indexed = Arc::new(AtomicUsize::new(0));
    let (stages_sink, indexed_sink) = (Arc::clone(&stages), Arc::clone(&indexed));
    let callback: ProgressCallback = Box::new(move |event| match event {
        SyncProgress::StageChanged { to, .. } => stages_sink.lock().unwrap().push(to),
        SyncProgress::Indexed { .. } => {
            indexed_sink.fetch_add(1, Ordering::SeqCst);
        }
        _ => {}
    });

    let engine = SyncEngine::new(remote, store, small_pages()).with_progress(Arc::new(callback));
    let report = tokio::time::timeout(SYNC_TIMEOUT, engine.run("alice"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.indexed, 3);
    assert_eq!(indexed.load(Ordering::SeqCst), 3);
    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            SyncStage::ProfileSync,
            SyncStage::CollectionFetch,
            SyncStage::CollectionIndexing,
            SyncStage::Done,
        ]
    );
}

#[tokio::test]
async fn test_progress_reports_abort() {
    let remote = Arc::new(FakeRemote::with_alice(Vec::new()));
    let store = Arc::new(FakeStore {
        unreachable: true,
        ..Default::default()
    });

    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&stages);
    let callback: ProgressCallback = Box::new(move |event| {
        if let SyncProgress::StageChanged { from, to } = event {
            sink.lock().unwrap().push((from, to));
        }
    });

    let engine = SyncEngine::new(remote, store, small_pages()).with_progress(Arc::new(callback));
    assert!(engine.run("alice").await.is_err());
    assert_eq!(
        *stages.lock().unwrap(),
        vec![(SyncStage::Init, SyncStage::Aborted)]
    );
}
