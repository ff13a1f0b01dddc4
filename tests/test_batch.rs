mod common;

use chrono::{Duration, Utc};
use common::{boring_pool, exposed_pool, protected_pool, seed_pools, setup};
use mbs_tagger::application::market_rate::{MarketRateUseCase, RateOrigin};
use mbs_tagger::application::tag_pools::{TagPoolsUseCase, TagRunOptions, MAX_LEASE_SECS};
use mbs_tagger::config::TaggerConfig;
use mbs_tagger::domain::entities::pool::PoolAttributes;
use mbs_tagger::domain::entities::tag_set::PoolTagRecord;
use mbs_tagger::domain::error::DomainError;
use mbs_tagger::domain::ports::pool_repository::{
    ClaimRequest, PoolRepository, PoolStats, TagSelection, TaggedPool,
};
use mbs_tagger::domain::tagging::{generate_tag_set, TaggingContext};
use mbs_tagger::infrastructure::sqlite::migrations::run_migrations;
use mbs_tagger::infrastructure::sqlite::pool_repo::SqlitePoolRepo;
use mbs_tagger::MbsTagger;
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn options(batch_size: usize) -> TagRunOptions {
    TagRunOptions {
        batch_size,
        rate_override: Some(6.5),
        ..TagRunOptions::default()
    }
}

fn claim(token: &str, limit: usize) -> ClaimRequest {
    ClaimRequest {
        token: token.into(),
        selection: TagSelection::Untagged,
        after: None,
        limit,
        lease_cutoff: Utc::now() - Duration::minutes(15),
    }
}

fn memory_repo() -> SqlitePoolRepo {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    SqlitePoolRepo::new(conn)
}

fn tag_all(pools: &[PoolAttributes]) -> Vec<TaggedPool> {
    pools
        .iter()
        .map(|p| TaggedPool {
            pool_id: p.pool_id.clone(),
            tags: generate_tag_set(p, &TaggingContext::default()),
        })
        .collect()
}

/// Store wrapper whose `persist_tags` fails on the given call (1-based).
/// Zero never fails.
struct FailingPersistRepo {
    inner: SqlitePoolRepo,
    persists: AtomicUsize,
    fail_on: AtomicUsize,
}

impl PoolRepository for FailingPersistRepo {
    fn upsert_pool(&self, pool: &PoolAttributes) -> Result<(), DomainError> {
        self.inner.upsert_pool(pool)
    }

    fn get_pool(&self, pool_id: &str) -> Result<Option<PoolAttributes>, DomainError> {
        self.inner.get_pool(pool_id)
    }

    fn count_eligible(&self, selection: TagSelection) -> Result<usize, DomainError> {
        self.inner.count_eligible(selection)
    }

    fn claim_batch(&self, request: &ClaimRequest) -> Result<Vec<PoolAttributes>, DomainError> {
        self.inner.claim_batch(request)
    }

    fn persist_tags(&self, token: &str, batch: &[TaggedPool]) -> Result<usize, DomainError> {
        let call = self.persists.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on.load(Ordering::SeqCst) {
            return Err(DomainError::Database("disk I/O error".into()));
        }
        self.inner.persist_tags(token, batch)
    }

    fn release_claims(&self, token: &str) -> Result<usize, DomainError> {
        self.inner.release_claims(token)
    }

    fn get_tags(&self, pool_id: &str) -> Result<Option<PoolTagRecord>, DomainError> {
        self.inner.get_tags(pool_id)
    }

    fn stats(&self) -> Result<PoolStats, DomainError> {
        self.inner.stats()
    }
}

#[tokio::test]
async fn test_single_run_tags_every_pool_once() {
    let tagger = setup();
    seed_pools(&tagger, 25);

    let report = tagger.tag(&options(10)).await.unwrap();
    assert_eq!(report.tagged, 25);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.batches, 3);
    assert_eq!(report.market_rate, 6.5);
    assert_eq!(report.rate_origin, RateOrigin::Override);

    let again = tagger.tag(&options(10)).await.unwrap();
    assert_eq!(again.tagged, 0);
    assert_eq!(again.batches, 0);

    let stats = tagger.stats().unwrap();
    assert_eq!(stats.total_pools, 25);
    assert_eq!(stats.tagged, 25);
    assert_eq!(stats.untagged, 0);
    assert_eq!(stats.claimed, 0);
}

#[tokio::test]
async fn test_exact_multiple_of_batch_size() {
    let tagger = setup();
    seed_pools(&tagger, 20);
    let report = tagger.tag(&options(10)).await.unwrap();
    assert_eq!(report.tagged, 20);
    assert_eq!(tagger.count_eligible(TagSelection::Untagged).unwrap(), 0);
}

#[tokio::test]
async fn test_limit_caps_the_run() {
    let tagger = setup();
    seed_pools(&tagger, 25);

    let report = tagger
        .tag(&TagRunOptions {
            limit: Some(7),
            ..options(5)
        })
        .await
        .unwrap();
    assert_eq!(report.tagged, 7);
    assert_eq!(tagger.count_eligible(TagSelection::Untagged).unwrap(), 18);

    let rest = tagger.tag(&options(5)).await.unwrap();
    assert_eq!(rest.tagged, 18);
}

#[tokio::test]
async fn test_zero_batch_size_rejected() {
    let tagger = setup();
    let err = tagger.tag(&options(0)).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[tokio::test]
async fn test_fallback_rate_when_store_is_empty() {
    let tagger = setup();
    seed_pools(&tagger, 3);
    let report = tagger
        .tag(&TagRunOptions {
            rate_override: None,
            ..options(10)
        })
        .await
        .unwrap();
    assert_eq!(report.market_rate, 6.5);
    assert_eq!(report.rate_origin, RateOrigin::Fallback);
    assert_eq!(report.tagged, 3);
}

#[tokio::test]
async fn test_stale_mode_retags_updated_pools() {
    let tagger = setup();
    seed_pools(&tagger, 6);
    tagger.tag(&options(10)).await.unwrap();

    std::thread::sleep(std::time::Duration::from_millis(5));
    let mut changed = boring_pool("POOL00000");
    changed.factor = Some(0.5);
    tagger.add_pool(&changed).unwrap();

    assert_eq!(tagger.stats().unwrap().stale, 1);
    assert_eq!(tagger.tag(&options(10)).await.unwrap().tagged, 0);

    let stale = tagger
        .tag(&TagRunOptions {
            selection: TagSelection::Stale,
            ..options(10)
        })
        .await
        .unwrap();
    assert_eq!(stale.tagged, 1);
    assert_eq!(tagger.stats().unwrap().stale, 0);
}

#[tokio::test]
async fn test_show_returns_persisted_tags() {
    let tagger = setup();
    tagger.add_pool(&protected_pool("SAFE1")).unwrap();
    tagger.add_pool(&exposed_pool("FAST1")).unwrap();
    tagger.tag(&options(10)).await.unwrap();

    for pool in [protected_pool("SAFE1"), exposed_pool("FAST1")] {
        let record = tagger.show(&pool.pool_id).unwrap();
        let expected = generate_tag_set(&pool, &TaggingContext::new(6.5));
        assert_eq!(record.pool_id, pool.pool_id);
        assert_eq!(record.tags.classes, expected.classes);
        assert_eq!(record.tags.metrics, expected.metrics);
        assert_eq!(record.tags.scores, expected.scores);
        assert_eq!(record.tags.behavior_tags.names(), expected.behavior_tags.names());
    }

    let stats = tagger.stats().unwrap();
    let protected = stats
        .behaviors
        .iter()
        .find(|b| b.behavior == "prepay_protected")
        .unwrap();
    assert_eq!(protected.count, 1);
}

#[tokio::test]
async fn test_show_missing_and_untagged_pools() {
    let tagger = setup();
    assert!(matches!(tagger.show("NOPE"), Err(DomainError::NotFound(_))));

    tagger.add_pool(&boring_pool("LATER")).unwrap();
    assert!(matches!(tagger.show("LATER"), Err(DomainError::NotFound(_))));
}

#[test]
fn test_add_pool_requires_id() {
    let tagger = setup();
    let err = tagger.add_pool(&PoolAttributes::new("  ")).unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
}

#[test]
fn test_add_pool_round_trips_attributes() {
    let tagger = setup();
    let pool = protected_pool("RT1");
    tagger.add_pool(&pool).unwrap();
    assert_eq!(tagger.get_pool("RT1").unwrap(), Some(pool));
    assert_eq!(tagger.get_pool("RT2").unwrap(), None);
}

#[test]
fn test_claims_are_exclusive_until_lease_expires() {
    let repo = memory_repo();
    for i in 0..10 {
        repo.upsert_pool(&boring_pool(&format!("P{i:02}"))).unwrap();
    }

    let first = repo.claim_batch(&claim("run-a", 6)).unwrap();
    let second = repo.claim_batch(&claim("run-b", 6)).unwrap();
    assert_eq!(first.len(), 6);
    assert_eq!(second.len(), 4);

    let a: HashSet<_> = first.iter().map(|p| p.pool_id.clone()).collect();
    let b: HashSet<_> = second.iter().map(|p| p.pool_id.clone()).collect();
    assert!(a.is_disjoint(&b));
    assert!(repo.claim_batch(&claim("run-c", 6)).unwrap().is_empty());

    // a cutoff in the future treats every live claim as abandoned
    let takeover = repo
        .claim_batch(&ClaimRequest {
            lease_cutoff: Utc::now() + Duration::hours(1),
            ..claim("run-d", 20)
        })
        .unwrap();
    assert_eq!(takeover.len(), 10);
}

#[test]
fn test_persist_only_writes_rows_claimed_by_token() {
    let repo = memory_repo();
    for i in 0..4 {
        repo.upsert_pool(&boring_pool(&format!("P{i:02}"))).unwrap();
    }
    let batch = tag_all(&repo.claim_batch(&claim("run-a", 4)).unwrap());

    assert_eq!(repo.persist_tags("run-b", &batch).unwrap(), 0);
    assert_eq!(repo.count_eligible(TagSelection::Untagged).unwrap(), 4);

    assert_eq!(repo.persist_tags("run-a", &batch).unwrap(), 4);
    assert_eq!(repo.count_eligible(TagSelection::Untagged).unwrap(), 0);
    assert_eq!(repo.stats().unwrap().claimed, 0);
}

#[test]
fn test_release_claims_frees_pools() {
    let repo = memory_repo();
    for i in 0..3 {
        repo.upsert_pool(&boring_pool(&format!("P{i:02}"))).unwrap();
    }
    repo.claim_batch(&claim("run-a", 3)).unwrap();
    assert_eq!(repo.stats().unwrap().claimed, 3);

    assert_eq!(repo.release_claims("run-a").unwrap(), 3);
    assert_eq!(repo.claim_batch(&claim("run-b", 3)).unwrap().len(), 3);
}

#[test]
fn test_claim_cursor_skips_earlier_ids() {
    let repo = memory_repo();
    for id in ["A", "B", "C", "D"] {
        repo.upsert_pool(&boring_pool(id)).unwrap();
    }
    let claimed = repo
        .claim_batch(&ClaimRequest {
            after: Some("B".into()),
            ..claim("run-a", 10)
        })
        .unwrap();
    let ids: Vec<_> = claimed.iter().map(|p| p.pool_id.as_str()).collect();
    assert_eq!(ids, vec!["C", "D"]);
}

#[test]
fn test_concurrent_runs_tag_each_pool_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pools.db").to_string_lossy().to_string();

    let seeder = MbsTagger::open(&db_path).unwrap();
    seed_pools(&seeder, 200);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = db_path.clone();
            std::thread::spawn(move || {
                let runtime = tokio::runtime::Runtime::new().unwrap();
                let tagger = MbsTagger::with_sources(
                    TaggerConfig {
                        db_path: path,
                        ..TaggerConfig::default()
                    },
                    Vec::new(),
                )
                .unwrap();
                runtime.block_on(tagger.tag(&options(10))).unwrap()
            })
        })
        .collect();

    let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let total: usize = reports.iter().map(|r| r.tagged).sum();
    assert_eq!(total, 200);

    let stats = seeder.stats().unwrap();
    assert_eq!(stats.tagged, 200);
    assert_eq!(stats.claimed, 0);
}

#[test]
fn test_persist_skips_pool_changed_after_claim() {
    let repo = memory_repo();
    for i in 0..3 {
        repo.upsert_pool(&boring_pool(&format!("P{i:02}"))).unwrap();
    }
    let batch = tag_all(&repo.claim_batch(&claim("run-a", 3)).unwrap());

    std::thread::sleep(std::time::Duration::from_millis(5));
    let mut changed = boring_pool("P01");
    changed.factor = Some(0.4);
    repo.upsert_pool(&changed).unwrap();

    assert_eq!(repo.persist_tags("run-a", &batch).unwrap(), 2);
    assert!(repo.get_tags("P01").unwrap().is_none());
    let stats = repo.stats().unwrap();
    assert_eq!(stats.tagged, 2);
    assert_eq!(stats.claimed, 0);

    // the next run sees the new attributes
    let next = repo.claim_batch(&claim("run-b", 3)).unwrap();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].pool_id, "P01");
    assert_eq!(next[0].factor, Some(0.4));
}

#[test]
fn test_stale_persist_skips_pool_changed_after_claim() {
    let repo = memory_repo();
    repo.upsert_pool(&boring_pool("P00")).unwrap();
    let first = tag_all(&repo.claim_batch(&claim("run-a", 1)).unwrap());
    assert_eq!(repo.persist_tags("run-a", &first).unwrap(), 1);

    std::thread::sleep(std::time::Duration::from_millis(5));
    repo.upsert_pool(&boring_pool("P00")).unwrap();
    let stale = ClaimRequest {
        selection: TagSelection::Stale,
        ..claim("run-b", 1)
    };
    let batch = tag_all(&repo.claim_batch(&stale).unwrap());
    assert_eq!(batch.len(), 1);

    std::thread::sleep(std::time::Duration::from_millis(5));
    repo.upsert_pool(&protected_pool("P00")).unwrap();
    assert_eq!(repo.persist_tags("run-b", &batch).unwrap(), 0);

    let stats = repo.stats().unwrap();
    assert_eq!(stats.stale, 1);
    assert_eq!(stats.claimed, 0);
}

#[tokio::test]
async fn test_failed_persist_releases_claims_and_rerun_finishes() {
    let repo = Arc::new(FailingPersistRepo {
        inner: memory_repo(),
        persists: AtomicUsize::new(0),
        fail_on: AtomicUsize::new(2),
    });
    for i in 0..25 {
        repo.upsert_pool(&boring_pool(&format!("P{i:02}"))).unwrap();
    }
    let rates = Arc::new(MarketRateUseCase::new(Vec::new(), "MORTGAGE30US"));
    let use_case = TagPoolsUseCase::new(repo.clone(), rates);

    let err = use_case.execute(&options(10)).await.unwrap_err();
    assert!(matches!(err, DomainError::Database(_)));
    let stats = repo.stats().unwrap();
    assert_eq!(stats.tagged, 10);
    assert_eq!(stats.claimed, 0);

    repo.fail_on.store(0, Ordering::SeqCst);
    let report = use_case.execute(&options(10)).await.unwrap();
    assert_eq!(report.tagged, 15);
    assert_eq!(repo.stats().unwrap().untagged, 0);
}

#[tokio::test]
async fn test_lease_out_of_range_rejected() {
    let tagger = setup();
    seed_pools(&tagger, 3);
    for lease in [
        Duration::zero(),
        Duration::seconds(-60),
        Duration::seconds(MAX_LEASE_SECS + 1),
        Duration::days(1_000_000),
    ] {
        let err = tagger
            .tag(&TagRunOptions {
                lease,
                ..options(10)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)), "{lease:?}");
    }
    assert_eq!(tagger.stats().unwrap().untagged, 3);
}

#[tokio::test]
async fn test_configured_lease_out_of_range_rejected() {
    for lease_secs in [i64::MAX, i64::MIN, -1] {
        let tagger = MbsTagger::with_sources(
            TaggerConfig {
                db_path: ":memory:".into(),
                lease_secs,
                ..TaggerConfig::default()
            },
            Vec::new(),
        )
        .unwrap();
        seed_pools(&tagger, 2);
        let err = tagger
            .tag(&TagRunOptions {
                rate_override: Some(6.5),
                ..tagger.run_options()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)), "{lease_secs}");
    }
}

#[tokio::test]
async fn test_mistyped_attributes_do_not_block_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pools.db").to_string_lossy().to_string();
    let tagger = MbsTagger::open(&db_path).unwrap();
    seed_pools(&tagger, 6);

    let conn = Connection::open(&db_path).unwrap();
    conn.execute("UPDATE dim_pool SET wala = 24.5 WHERE pool_id = 'POOL00000'", [])
        .unwrap();
    conn.execute("UPDATE dim_pool SET avg_fico = 'N/A' WHERE pool_id = 'POOL00001'", [])
        .unwrap();
    conn.execute("UPDATE dim_pool SET wala = 'unknown' WHERE pool_id = 'POOL00002'", [])
        .unwrap();
    drop(conn);

    let report = tagger.tag(&options(4)).await.unwrap();
    assert_eq!(report.tagged, 6);
    assert_eq!(tagger.stats().unwrap().untagged, 0);

    let ctx = TaggingContext::new(6.5);
    let fractional = PoolAttributes {
        wala: Some(24.5),
        ..boring_pool("POOL00000")
    };
    let no_fico = PoolAttributes {
        avg_fico: None,
        ..protected_pool("POOL00001")
    };
    let no_age = PoolAttributes {
        wala: None,
        ..exposed_pool("POOL00002")
    };
    for pool in [fractional, no_fico, no_age] {
        let record = tagger.show(&pool.pool_id).unwrap();
        let expected = generate_tag_set(&pool, &ctx);
        assert_eq!(record.tags.classes, expected.classes, "{}", pool.pool_id);
        assert_eq!(record.tags.metrics, expected.metrics, "{}", pool.pool_id);
    }
}
