//! Service-level behavior over in-memory storage.

use super::*;
use crate::error::AppError;
use crate::models::{EntityKind, Paste, Stats};
use chrono::{Duration, Utc};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

#[derive(Default)]
struct RecordingLogger {
    events: Mutex<Vec<(EntityKind, String, String)>>,
}

impl RecordingLogger {
    fn events(&self) -> Vec<(EntityKind, String, String)> {
        self.events.lock().unwrap().clone()
    }
}

impl ChangeLogger for RecordingLogger {
    fn log_change(&self, entity: EntityKind, id: &str, action: &str) -> Result<(), AppError> {
        self.events
            .lock()
            .unwrap()
            .push((entity, id.to_string(), action.to_string()));
        Ok(())
    }
}

struct FailingLogger;

impl ChangeLogger for FailingLogger {
    fn log_change(&self, _: EntityKind, _: &str, _: &str) -> Result<(), AppError> {
        Err(AppError::StorageMessage("audit sink offline".to_string()))
    }
}

fn setup() -> (Services, Storage, Arc<RecordingLogger>) {
    let storage = Storage::in_memory();
    let logger = Arc::new(RecordingLogger::default());
    let services = Services::new(storage.clone(), logger.clone());
    (services, storage, logger)
}

fn in_an_hour() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::hours(1)
}

#[test]
fn create_paste_assigns_identity_and_side_records() {
    let (services, storage, logger) = setup();
    let paste = services
        .pastes
        .create_paste("Hello", in_an_hour())
        .unwrap();

    assert!(!paste.id.is_empty());
    assert_eq!(paste.hash.len(), 10);
    assert!(paste.created_at <= Utc::now());
    assert!(paste.expires_at > paste.created_at);
    assert_eq!(paste.views, 0);

    let short = storage.short_urls.get(&paste.hash[..6]).unwrap();
    assert_eq!(short.original, paste.hash);
    assert_eq!(storage.stats.get(&paste.id).unwrap().views, 0);
    assert!(logger
        .events()
        .contains(&(EntityKind::Paste, paste.id.clone(), "created".to_string())));
}

#[test]
fn create_paste_rejects_past_expiry_without_persisting() {
    let (services, storage, _logger) = setup();
    let err = services
        .pastes
        .create_paste("late", Utc::now() - Duration::seconds(1))
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(storage.pastes.count().unwrap(), 0);
    assert_eq!(storage.short_urls.count().unwrap(), 0);
    assert_eq!(storage.stats.count().unwrap(), 0);
}

#[test]
fn create_paste_rejects_empty_content() {
    let (services, _storage, _logger) = setup();
    let err = services.pastes.create_paste("", in_an_hour()).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn create_paste_with_link_reports_its_short_link() {
    let (services, _storage, _logger) = setup();
    let (paste, link) = services
        .pastes
        .create_paste_with_link("linked", in_an_hour())
        .unwrap();
    let link = link.expect("fresh code is linked");
    assert_eq!(link.id, &paste.hash[..6]);
    assert_eq!(link.original, paste.hash);
}

#[test]
fn taken_short_code_is_not_handed_to_a_new_paste() {
    use chrono::TimeZone;

    const SEED: i64 = 4_000_000_000_000_000_000;
    let storage = Storage::in_memory();
    let logger: Arc<dyn ChangeLogger> = Arc::new(crate::audit::NoopChangeLogger);
    let ids = Arc::new(IdGenerator::starting_after(SEED));
    let stats = StatsService::new(storage.clone(), logger.clone(), ids.clone());
    let short_urls = ShortUrlService::new(storage.clone(), logger.clone());
    let pastes = PasteService::new(storage.clone(), logger, ids, stats, short_urls.clone());

    let expected_hash = super::ids::paste_hash("collide", SEED + 1);
    let code = &expected_hash[..6];
    short_urls.create_short_url(code, "earlier-hash").unwrap();

    let expires_at = Utc.timestamp_nanos(SEED + 1) + Duration::days(1);
    let (paste, link) = pastes
        .create_paste_with_link("collide", expires_at)
        .unwrap();
    assert_eq!(paste.hash, expected_hash);
    assert!(link.is_none());
    assert_eq!(storage.short_urls.get(code).unwrap().original, "earlier-hash");
    assert_eq!(storage.pastes.get(&paste.id).unwrap().content, "collide");
}

#[test]
fn audit_failures_are_swallowed() {
    let storage = Storage::in_memory();
    let services = Services::new(storage.clone(), Arc::new(FailingLogger));
    let paste = services.pastes.create_paste("x", in_an_hour()).unwrap();
    services.pastes.delete_paste(&paste.id).unwrap();
    assert_eq!(storage.pastes.count().unwrap(), 0);
}

#[test]
fn lookups_round_trip_content() {
    let (services, _storage, _logger) = setup();
    let created = services
        .pastes
        .create_paste("round trip", in_an_hour())
        .unwrap();

    let by_id = services.pastes.get_paste_by_id(&created.id).unwrap();
    assert_eq!(by_id.content, "round trip");
    assert_eq!(by_id.views, 0);

    let by_hash = services.pastes.get_paste_by_hash(&created.hash).unwrap();
    assert_eq!(by_hash.content, "round trip");
    assert_eq!(by_hash.views, 1);
    assert_eq!(
        services.stats.get_stats_by_id(&created.id).unwrap().views,
        1
    );
}

#[test]
fn missing_pastes_report_not_found() {
    let (services, _storage, _logger) = setup();
    assert!(matches!(
        services.pastes.get_paste_by_id("nope"),
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        services.pastes.get_paste_by_hash("nope"),
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        services.pastes.delete_paste("nope"),
        Err(AppError::NotFound)
    ));
}

#[test]
fn delete_paste_removes_it_and_its_dependents() {
    let (services, storage, logger) = setup();
    let paste = services.pastes.create_paste("bye", in_an_hour()).unwrap();
    services.pastes.delete_paste(&paste.id).unwrap();

    assert!(matches!(
        services.pastes.get_paste_by_id(&paste.id),
        Err(AppError::NotFound)
    ));
    assert!(matches!(storage.stats.get(&paste.id), Err(AppError::NotFound)));
    assert!(matches!(
        storage.short_urls.get(&paste.hash[..6]),
        Err(AppError::NotFound)
    ));
    assert!(logger
        .events()
        .contains(&(EntityKind::Paste, paste.id.clone(), "deleted".to_string())));
}

#[test]
fn top_pastes_follow_stats_views() {
    let (services, storage, _logger) = setup();
    let mut ids = Vec::new();
    for (content, views) in [("five", 5u64), ("one", 1), ("ten", 10)] {
        let paste = services.pastes.create_paste(content, in_an_hour()).unwrap();
        storage
            .stats
            .save(&Stats {
                id: paste.id.clone(),
                views,
            })
            .unwrap();
        ids.push(paste.id);
    }

    let top = services.pastes.list_top_pastes(2).unwrap();
    let views: Vec<u64> = top.iter().map(|p| p.views).collect();
    assert_eq!(views, vec![10, 5]);
    assert_eq!(top[0].content, "ten");

    let all = services.pastes.list_top_pastes(10).unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn top_pastes_skip_orphan_stats() {
    let (services, storage, _logger) = setup();
    let paste = services.pastes.create_paste("real", in_an_hour()).unwrap();
    storage
        .stats
        .save(&Stats {
            id: "ghost".to_string(),
            views: 99,
        })
        .unwrap();

    let top = services.pastes.list_top_pastes(1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, paste.id);
}

#[test]
fn delete_expired_sweeps_only_past_pastes() {
    let (services, storage, logger) = setup();
    let keep = services.pastes.create_paste("keep", in_an_hour()).unwrap();
    let stale = Paste {
        id: "1".to_string(),
        hash: "deadbeef00".to_string(),
        content: "stale".to_string(),
        created_at: Utc::now() - Duration::hours(2),
        expires_at: Utc::now() - Duration::hours(1),
        views: 0,
    };
    storage.pastes.save(&stale).unwrap();
    storage.stats.save(&Stats::new("1")).unwrap();

    assert_eq!(services.pastes.delete_expired(Utc::now()).unwrap(), 1);
    assert!(services.pastes.get_paste_by_id(&keep.id).is_ok());
    assert!(matches!(storage.stats.get("1"), Err(AppError::NotFound)));
    assert!(logger
        .events()
        .contains(&(EntityKind::Paste, "1".to_string(), "expired".to_string())));
}

#[test]
fn stats_increment_and_conflict() {
    let (services, _storage, _logger) = setup();
    let created = services.stats.create_stats(Some("p1")).unwrap();
    assert_eq!(created.views, 0);
    assert!(matches!(
        services.stats.create_stats(Some("p1")),
        Err(AppError::Conflict(_))
    ));

    for _ in 0..3 {
        services.stats.increment_views("p1").unwrap();
    }
    assert_eq!(services.stats.get_stats_by_id("p1").unwrap().views, 3);
    assert!(matches!(
        services.stats.increment_views("missing"),
        Err(AppError::NotFound)
    ));

    let generated = services.stats.create_stats(None).unwrap();
    assert!(!generated.id.is_empty());
    assert_eq!(services.stats.list_stats().unwrap().len(), 2);

    services.stats.delete_stats("p1").unwrap();
    assert!(matches!(
        services.stats.delete_stats("p1"),
        Err(AppError::NotFound)
    ));
}

#[test]
fn concurrent_increments_are_not_lost() {
    let (services, _storage, _logger) = setup();
    services.stats.create_stats(Some("hot")).unwrap();
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let stats = services.stats.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    stats.increment_views("hot").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }
    assert_eq!(services.stats.get_stats_by_id("hot").unwrap().views, 200);
}

#[test]
fn top_stats_are_sorted_and_truncated() {
    let (services, storage, _logger) = setup();
    for (id, views) in [("a", 5u64), ("b", 1), ("c", 10)] {
        storage
            .stats
            .save(&Stats {
                id: id.to_string(),
                views,
            })
            .unwrap();
    }
    let top: Vec<String> = services
        .stats
        .list_top_stats(2)
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(top, vec!["c", "a"]);
}

#[test]
fn duplicate_short_code_keeps_first_target() {
    let (services, _storage, _logger) = setup();
    services
        .short_urls
        .create_short_url("exmpl", "https://example.com")
        .unwrap();
    let err = services
        .short_urls
        .create_short_url("exmpl", "https://other.example")
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(
        services
            .short_urls
            .get_short_url_by_id("exmpl")
            .unwrap()
            .original,
        "https://example.com"
    );
}

#[test]
fn resolve_short_url_returns_content_and_counts_view() {
    let (services, storage, _logger) = setup();
    let paste = services.pastes.create_paste("resolved", in_an_hour()).unwrap();

    let content = services
        .short_urls
        .resolve_short_url(&paste.hash[..6])
        .unwrap();
    assert_eq!(content, "resolved");
    assert_eq!(storage.pastes.get(&paste.id).unwrap().views, 1);
    assert_eq!(storage.stats.get(&paste.id).unwrap().views, 1);

    assert!(matches!(
        services.short_urls.resolve_short_url("zzzzzz"),
        Err(AppError::NotFound)
    ));

    services
        .short_urls
        .create_short_url("ext", "https://example.com")
        .unwrap();
    assert!(matches!(
        services.short_urls.resolve_short_url("ext"),
        Err(AppError::NotFound)
    ));
}

#[test]
fn create_for_paste_requires_existing_hash() {
    let (services, storage, _logger) = setup();
    let paste = services.pastes.create_paste("linked", in_an_hour()).unwrap();
    storage.short_urls.delete(&paste.hash[..6]).unwrap();

    let short = services.short_urls.create_for_paste(&paste.hash).unwrap();
    assert_eq!(short.id, &paste.hash[..6]);
    assert!(matches!(
        services.short_urls.create_for_paste(&paste.hash),
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        services.short_urls.create_for_paste("0000000000"),
        Err(AppError::NotFound)
    ));
}

#[test]
fn short_url_crud() {
    let (services, _storage, _logger) = setup();
    services.short_urls.create_short_url("a1", "t1").unwrap();
    services.short_urls.create_short_url("b2", "t2").unwrap();
    assert_eq!(services.short_urls.list_short_urls().unwrap().len(), 2);
    services.short_urls.delete_short_url("a1").unwrap();
    assert!(matches!(
        services.short_urls.get_short_url_by_id("a1"),
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        services.short_urls.create_short_url(" ", "t"),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn users_get_sequential_ids_and_require_a_name() {
    let (services, _storage, logger) = setup();
    let first = services.users.create_user("alice").unwrap();
    let second = services.users.create_user("bob").unwrap();
    assert_eq!((first.id, second.id), (1, 2));
    assert!(matches!(
        services.users.create_user("   "),
        Err(AppError::Validation(_))
    ));

    services.users.delete_user("1").unwrap();
    let third = services.users.create_user("carol").unwrap();
    assert_eq!(third.id, 3);
    assert!(logger
        .events()
        .contains(&(EntityKind::User, "1".to_string(), "deleted".to_string())));
}

#[test]
fn user_lookup_validates_ids() {
    let (services, _storage, _logger) = setup();
    let user = services.users.create_user("alice").unwrap();
    assert_eq!(services.users.get_user_by_id("1").unwrap(), user);
    assert!(matches!(
        services.users.get_user_by_id("abc"),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        services.users.get_user_by_id("99"),
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        services.users.delete_user("99"),
        Err(AppError::NotFound)
    ));
    assert_eq!(services.users.list_users().unwrap().len(), 1);
}

#[test]
fn concurrent_user_creation_yields_unique_ids() {
    let (services, _storage, _logger) = setup();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let users = services.users.clone();
            thread::spawn(move || users.create_user(&format!("user{}", i)).unwrap().id)
        })
        .collect();
    let mut ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
}

#[test]
fn add_post_appends_once() {
    let (services, _storage, _logger) = setup();
    let user = services.users.create_user("alice").unwrap();
    let paste = services.pastes.create_paste("mine", in_an_hour()).unwrap();
    let id = user.id.to_string();

    services.users.add_post(&id, &paste.hash).unwrap();
    let updated = services.users.add_post(&id, &paste.hash).unwrap();
    assert_eq!(updated.posts, vec![paste.hash.clone()]);
    assert!(matches!(
        services.users.add_post(&id, "unknown"),
        Err(AppError::NotFound)
    ));
}

#[tokio::test(start_paused = true)]
async fn expiry_sweep_runs_until_shutdown() {
    let (services, storage, _logger) = setup();
    storage
        .pastes
        .save(&Paste {
            id: "old".to_string(),
            hash: "0123456789".to_string(),
            content: "old".to_string(),
            created_at: Utc::now() - Duration::hours(2),
            expires_at: Utc::now() - Duration::hours(1),
            views: 0,
        })
        .unwrap();

    let (trigger, signal) = crate::shutdown::shutdown_channel();
    let task = tokio::spawn(
        services
            .pastes
            .clone()
            .run_expiry_sweep(std::time::Duration::from_secs(60), signal),
    );
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(storage.pastes.count().unwrap(), 0);

    trigger.trigger();
    task.await.expect("sweep task exits");
}
