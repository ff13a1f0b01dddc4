use super::{from_db_time, to_db_time};
use crate::domain::entities::pool::PoolAttributes;
use crate::domain::entities::tag_set::{PoolTagRecord, TagSet};
use crate::domain::error::DomainError;
use crate::domain::ports::pool_repository::*;
use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{named_params, params, Connection, OptionalExtension};
use serde_json::{Map, Number, Value};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Raw attribute columns, in `row_to_pool` order.
const POOL_COLS: &str = "pool_id, avg_loan_size, avg_fico, avg_ltv, wala, wac, \
    top_state, top_state_pct, servicer_name, product_type, factor";

const TAG_TEXT_COLS: [&str; 8] = [
    "loan_balance_tier",
    "fico_bucket",
    "ltv_bucket",
    "seasoning_stage",
    "state_prepay_friction",
    "servicer_prepay_risk",
    "geo_concentration_tag",
    "s_curve_position",
];

const TAG_REAL_COLS: [&str; 11] = [
    "refi_incentive_bps",
    "burnout_score",
    "premium_cpr_mult",
    "discount_cpr_mult",
    "convexity_score",
    "contraction_risk_score",
    "extension_risk_score",
    "composite_prepay_score",
    "bull_scenario_score",
    "bear_scenario_score",
    "neutral_scenario_score",
];

const UPDATE_TAGS_SQL: &str = "UPDATE dim_pool SET
        loan_balance_tier = :loan_balance_tier,
        fico_bucket = :fico_bucket,
        ltv_bucket = :ltv_bucket,
        seasoning_stage = :seasoning_stage,
        state_prepay_friction = :state_prepay_friction,
        servicer_prepay_risk = :servicer_prepay_risk,
        geo_concentration_tag = :geo_concentration_tag,
        refi_incentive_bps = :refi_incentive_bps,
        burnout_score = :burnout_score,
        premium_cpr_mult = :premium_cpr_mult,
        discount_cpr_mult = :discount_cpr_mult,
        convexity_score = :convexity_score,
        s_curve_position = :s_curve_position,
        contraction_risk_score = :contraction_risk_score,
        extension_risk_score = :extension_risk_score,
        composite_prepay_score = :composite_prepay_score,
        bull_scenario_score = :bull_scenario_score,
        bear_scenario_score = :bear_scenario_score,
        neutral_scenario_score = :neutral_scenario_score,
        behavior_tags = :behavior_tags,
        tags_updated_at = :tags_updated_at,
        claim_token = NULL,
        claimed_at = NULL
     WHERE pool_id = :pool_id
       AND claim_token = :claim_token
       AND attributes_updated_at <= claimed_at";

/// Drop a claim whose pool changed after it was fetched.
const RELEASE_ONE_SQL: &str = "UPDATE dim_pool SET claim_token = NULL, claimed_at = NULL
     WHERE pool_id = ?1 AND claim_token = ?2";

fn eligible_clause(selection: TagSelection) -> &'static str {
    match selection {
        TagSelection::Untagged => "tags_updated_at IS NULL",
        TagSelection::Stale => {
            "(tags_updated_at IS NULL OR attributes_updated_at > tags_updated_at)"
        }
    }
}

pub struct SqlitePoolRepo {
    conn: Mutex<Connection>,
}

impl SqlitePoolRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Attribute columns are loaded by other pipelines, so a value of the
    /// wrong type reads as missing instead of failing the whole batch.
    fn row_to_pool(row: &rusqlite::Row) -> Result<PoolAttributes, rusqlite::Error> {
        Ok(PoolAttributes {
            pool_id: row.get(0)?,
            avg_loan_size: lenient_real(row, 1)?,
            avg_fico: lenient_real(row, 2)?,
            avg_ltv: lenient_real(row, 3)?,
            wala: lenient_real(row, 4)?,
            wac: lenient_real(row, 5)?,
            top_state: lenient_text(row, 6)?,
            top_state_pct: lenient_real(row, 7)?,
            servicer_name: lenient_text(row, 8)?,
            product_type: lenient_text(row, 9)?,
            factor: lenient_real(row, 10)?,
        })
    }

    /// Rebuild the flat tag document from stored columns so the enum
    /// deserializers validate every categorical value on the way out.
    /// `behavior_tags` is returned raw so the caller can report bad JSON.
    fn row_to_tag_document(row: &rusqlite::Row) -> Result<TagDocument, rusqlite::Error> {
        let updated_at: String = row.get(0)?;
        let behavior: Option<String> = row.get(1)?;
        let mut doc = Map::new();
        for (i, col) in TAG_TEXT_COLS.iter().enumerate() {
            let text: Option<String> = row.get(2 + i)?;
            doc.insert((*col).into(), text.map(Value::String).unwrap_or(Value::Null));
        }
        let offset = 2 + TAG_TEXT_COLS.len();
        for (i, col) in TAG_REAL_COLS.iter().enumerate() {
            let real: Option<f64> = row.get(offset + i)?;
            let value = real
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null);
            doc.insert((*col).into(), value);
        }
        Ok((updated_at, behavior, doc))
    }
}

type TagDocument = (String, Option<String>, Map<String, Value>);

fn lenient_real(row: &rusqlite::Row, idx: usize) -> Result<Option<f64>, rusqlite::Error> {
    let value = match row.get::<_, SqlValue>(idx)? {
        SqlValue::Real(v) => Some(v),
        SqlValue::Integer(v) => Some(v as f64),
        SqlValue::Text(s) => s.trim().parse::<f64>().ok(),
        SqlValue::Null | SqlValue::Blob(_) => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

fn lenient_text(row: &rusqlite::Row, idx: usize) -> Result<Option<String>, rusqlite::Error> {
    Ok(match row.get::<_, SqlValue>(idx)? {
        SqlValue::Text(s) => Some(s),
        SqlValue::Integer(v) => Some(v.to_string()),
        SqlValue::Real(v) => Some(v.to_string()),
        SqlValue::Null | SqlValue::Blob(_) => None,
    })
}

impl PoolRepository for SqlitePoolRepo {
    fn upsert_pool(&self, pool: &PoolAttributes) -> Result<(), DomainError> {
        if pool.pool_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("pool_id must not be empty".into()));
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO dim_pool (pool_id, avg_loan_size, avg_fico, avg_ltv, wala, wac,
                top_state, top_state_pct, servicer_name, product_type, factor,
                attributes_updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(pool_id) DO UPDATE SET
                avg_loan_size = excluded.avg_loan_size,
                avg_fico = excluded.avg_fico,
                avg_ltv = excluded.avg_ltv,
                wala = excluded.wala,
                wac = excluded.wac,
                top_state = excluded.top_state,
                top_state_pct = excluded.top_state_pct,
                servicer_name = excluded.servicer_name,
                product_type = excluded.product_type,
                factor = excluded.factor,
                attributes_updated_at = excluded.attributes_updated_at",
            params![
                pool.pool_id,
                pool.avg_loan_size,
                pool.avg_fico,
                pool.avg_ltv,
                pool.wala,
                pool.wac,
                pool.top_state,
                pool.top_state_pct,
                pool.servicer_name,
                pool.product_type,
                pool.factor,
                to_db_time(&Utc::now()),
            ],
        )
        .map_err(|e| {
            DomainError::Database(format!("Failed to upsert pool {}: {e}", pool.pool_id))
        })?;
        Ok(())
    }

    fn get_pool(&self, pool_id: &str) -> Result<Option<PoolAttributes>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.query_row(
            &format!("SELECT {POOL_COLS} FROM dim_pool WHERE pool_id = ?1"),
            params![pool_id],
            Self::row_to_pool,
        )
        .optional()
        .map_err(|e| DomainError::Database(e.to_string()))
    }

    fn count_eligible(&self, selection: TagSelection) -> Result<usize, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.query_row(
            &format!("SELECT COUNT(*) FROM dim_pool WHERE {}", eligible_clause(selection)),
            [],
            |r| r.get(0),
        )
        .map_err(|e| DomainError::Database(e.to_string()))
    }

    fn claim_batch(&self, request: &ClaimRequest) -> Result<Vec<PoolAttributes>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        // One statement: selection and claim cannot interleave with another run.
        let sql = format!(
            "UPDATE dim_pool SET claim_token = ?1, claimed_at = ?2
             WHERE pool_id IN (
                SELECT pool_id FROM dim_pool
                WHERE {}
                  AND pool_id > ?3
                  AND (claim_token IS NULL OR claimed_at < ?4)
                ORDER BY pool_id
                LIMIT ?5
             )
             RETURNING {POOL_COLS}",
            eligible_clause(request.selection)
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut pools = stmt
            .query_map(
                params![
                    request.token,
                    to_db_time(&Utc::now()),
                    request.after.as_deref().unwrap_or(""),
                    to_db_time(&request.lease_cutoff),
                    request.limit as i64,
                ],
                Self::row_to_pool,
            )
            .map_err(|e| DomainError::Database(format!("Failed to claim batch: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Database(format!("Failed to read claimed pool: {e}")))?;
        // RETURNING order is unspecified
        pools.sort_by(|a, b| a.pool_id.cmp(&b.pool_id));
        debug!(claimed = pools.len(), token = %request.token, "claimed batch");
        Ok(pools)
    }

    fn persist_tags(&self, token: &str, batch: &[TaggedPool]) -> Result<usize, DomainError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Database(format!("Failed to begin transaction: {e}")))?;
        let now = to_db_time(&Utc::now());
        let mut written = 0;
        {
            let mut stmt = tx
                .prepare(UPDATE_TAGS_SQL)
                .map_err(|e| DomainError::Database(e.to_string()))?;
            let mut release = tx
                .prepare(RELEASE_ONE_SQL)
                .map_err(|e| DomainError::Database(e.to_string()))?;
            for tagged in batch {
                let TagSet {
                    classes,
                    metrics,
                    behavior_tags,
                    scores,
                } = &tagged.tags;
                let behavior_json = serde_json::to_string(behavior_tags)?;
                let rows = stmt
                    .execute(named_params! {
                        ":loan_balance_tier": classes.loan_balance_tier.as_str(),
                        ":fico_bucket": classes.fico_bucket.as_str(),
                        ":ltv_bucket": classes.ltv_bucket.as_str(),
                        ":seasoning_stage": classes.seasoning_stage.as_str(),
                        ":state_prepay_friction": classes.state_prepay_friction.as_str(),
                        ":servicer_prepay_risk": classes.servicer_prepay_risk.as_str(),
                        ":geo_concentration_tag": classes.geo_concentration_tag.to_string(),
                        ":refi_incentive_bps": metrics.refi_incentive_bps,
                        ":burnout_score": metrics.burnout_score,
                        ":premium_cpr_mult": metrics.premium_cpr_mult,
                        ":discount_cpr_mult": metrics.discount_cpr_mult,
                        ":convexity_score": metrics.convexity_score,
                        ":s_curve_position": metrics.s_curve_position.as_str(),
                        ":contraction_risk_score": metrics.contraction_risk_score,
                        ":extension_risk_score": metrics.extension_risk_score,
                        ":composite_prepay_score": scores.composite_prepay_score,
                        ":bull_scenario_score": scores.bull_scenario_score,
                        ":bear_scenario_score": scores.bear_scenario_score,
                        ":neutral_scenario_score": scores.neutral_scenario_score,
                        ":behavior_tags": behavior_json,
                        ":tags_updated_at": now,
                        ":pool_id": tagged.pool_id,
                        ":claim_token": token,
                    })
                    .map_err(|e| {
                        DomainError::Database(format!(
                            "Failed to persist tags for pool {}: {e}",
                            tagged.pool_id
                        ))
                    })?;
                if rows == 0 {
                    // Lost claims match nothing here; changed pools go back to the queue.
                    release
                        .execute(params![tagged.pool_id, token])
                        .map_err(|e| DomainError::Database(e.to_string()))?;
                    warn!(
                        pool_id = %tagged.pool_id,
                        "claim lost or pool changed before persist, skipping"
                    );
                }
                written += rows;
            }
        }
        tx.commit()
            .map_err(|e| DomainError::Database(format!("Failed to commit tag batch: {e}")))?;
        Ok(written)
    }

    fn release_claims(&self, token: &str) -> Result<usize, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "UPDATE dim_pool SET claim_token = NULL, claimed_at = NULL WHERE claim_token = ?1",
            params![token],
        )
        .map_err(|e| DomainError::Database(format!("Failed to release claims: {e}")))
    }

    fn get_tags(&self, pool_id: &str) -> Result<Option<PoolTagRecord>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let sql = format!(
            "SELECT tags_updated_at, behavior_tags, {}, {} FROM dim_pool
             WHERE pool_id = ?1 AND tags_updated_at IS NOT NULL",
            TAG_TEXT_COLS.join(", "),
            TAG_REAL_COLS.join(", ")
        );
        let found = conn
            .query_row(&sql, params![pool_id], Self::row_to_tag_document)
            .optional()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let Some((updated_str, behavior, mut doc)) = found else {
            return Ok(None);
        };
        let behavior = match behavior {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                DomainError::Parse(format!(
                    "Stored behavior tags for pool {pool_id} are invalid: {e}"
                ))
            })?,
            None => Value::Object(Map::new()),
        };
        doc.insert("behavior_tags".into(), behavior);

        let tags: TagSet = serde_json::from_value(Value::Object(doc)).map_err(|e| {
            DomainError::Parse(format!("Stored tags for pool {pool_id} are invalid: {e}"))
        })?;
        let tags_updated_at = from_db_time(&updated_str).ok_or_else(|| {
            DomainError::Parse(format!(
                "Invalid tags_updated_at for pool {pool_id}: {updated_str}"
            ))
        })?;
        Ok(Some(PoolTagRecord {
            pool_id: pool_id.to_string(),
            tags_updated_at,
            tags,
        }))
    }

    fn stats(&self) -> Result<PoolStats, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let count = |sql: &str| -> Result<usize, DomainError> {
            conn.query_row(sql, [], |r| r.get(0))
                .map_err(|e| DomainError::Database(e.to_string()))
        };
        let total_pools = count("SELECT COUNT(*) FROM dim_pool")?;
        let untagged = count("SELECT COUNT(*) FROM dim_pool WHERE tags_updated_at IS NULL")?;
        let stale = count(
            "SELECT COUNT(*) FROM dim_pool
             WHERE tags_updated_at IS NOT NULL AND attributes_updated_at > tags_updated_at",
        )?;
        let claimed = count("SELECT COUNT(*) FROM dim_pool WHERE claim_token IS NOT NULL")?;

        // json_each aborts on the first malformed document; name the pool instead.
        let corrupt: Option<String> = conn
            .query_row(
                "SELECT pool_id FROM dim_pool
                 WHERE behavior_tags IS NOT NULL AND NOT json_valid(behavior_tags)
                 ORDER BY pool_id LIMIT 1",
                [],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        if let Some(pool_id) = corrupt {
            return Err(DomainError::Parse(format!(
                "Stored behavior tags for pool {pool_id} are invalid JSON"
            )));
        }

        let mut stmt = conn
            .prepare(
                "SELECT key, COUNT(*) AS cnt FROM dim_pool, json_each(dim_pool.behavior_tags)
                 WHERE behavior_tags IS NOT NULL
                 GROUP BY key ORDER BY cnt DESC, key",
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let behaviors = stmt
            .query_map([], |row| {
                Ok(BehaviorCount {
                    behavior: row.get(0)?,
                    count: row.get(1)?,
                })
            })
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Database(format!("Failed to count behaviors: {e}")))?;

        Ok(PoolStats {
            total_pools,
            tagged: total_pools.saturating_sub(untagged),
            untagged,
            stale,
            claimed,
            behaviors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tagging::{generate_tag_set, TaggingContext};
    use crate::infrastructure::sqlite::migrations::run_migrations;
    use chrono::Duration;

    fn memory_repo() -> SqlitePoolRepo {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        SqlitePoolRepo::new(conn)
    }

    fn raw(repo: &SqlitePoolRepo, sql: &str) {
        repo.conn.lock().unwrap().execute(sql, []).unwrap();
    }

    fn tag_one(repo: &SqlitePoolRepo, pool_id: &str) {
        repo.upsert_pool(&PoolAttributes {
            avg_loan_size: Some(120_000.0),
            servicer_name: Some("Wells Fargo".into()),
            ..PoolAttributes::new(pool_id)
        })
        .unwrap();
        let claimed = repo
            .claim_batch(&ClaimRequest {
                token: "run-a".into(),
                selection: TagSelection::Untagged,
                after: None,
                limit: 1,
                lease_cutoff: Utc::now() - Duration::minutes(15),
            })
            .unwrap();
        let batch: Vec<TaggedPool> = claimed
            .iter()
            .map(|p| TaggedPool {
                pool_id: p.pool_id.clone(),
                tags: generate_tag_set(p, &TaggingContext::default()),
            })
            .collect();
        assert_eq!(repo.persist_tags("run-a", &batch).unwrap(), 1);
    }

    #[test]
    fn test_mistyped_attributes_read_as_missing() {
        let repo = memory_repo();
        repo.upsert_pool(&PoolAttributes::new("MIXED")).unwrap();
        raw(
            &repo,
            "UPDATE dim_pool SET wala = 24.5, avg_fico = 'N/A', avg_ltv = x'00',
                factor = '0.75', top_state = 'TX'
             WHERE pool_id = 'MIXED'",
        );

        let pool = repo.get_pool("MIXED").unwrap().unwrap();
        assert_eq!(pool.wala, Some(24.5));
        assert_eq!(pool.avg_fico, None);
        assert_eq!(pool.avg_ltv, None);
        assert_eq!(pool.factor, Some(0.75));
        assert_eq!(pool.top_state.as_deref(), Some("TX"));
    }

    #[test]
    fn test_tags_read_back_after_persist() {
        let repo = memory_repo();
        tag_one(&repo, "GOOD1");
        let record = repo.get_tags("GOOD1").unwrap().unwrap();
        assert_eq!(record.pool_id, "GOOD1");
        assert!(repo.get_tags("NOPE").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_behavior_tags_are_reported() {
        let repo = memory_repo();
        tag_one(&repo, "BAD1");
        raw(
            &repo,
            "UPDATE dim_pool SET behavior_tags = '{not json' WHERE pool_id = 'BAD1'",
        );

        assert!(matches!(repo.get_tags("BAD1"), Err(DomainError::Parse(_))));
        assert!(matches!(repo.stats(), Err(DomainError::Parse(_))));
    }
}
