use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS dim_pool (
            pool_id TEXT PRIMARY KEY,
            avg_loan_size REAL,
            avg_fico REAL,
            avg_ltv REAL,
            wala REAL,
            wac REAL,
            top_state TEXT,
            top_state_pct REAL,
            servicer_name TEXT,
            product_type TEXT,
            factor REAL,
            attributes_updated_at TEXT NOT NULL,

            loan_balance_tier TEXT,
            fico_bucket TEXT,
            ltv_bucket TEXT,
            seasoning_stage TEXT,
            state_prepay_friction TEXT,
            servicer_prepay_risk TEXT,
            geo_concentration_tag TEXT,
            refi_incentive_bps REAL,
            burnout_score REAL,
            premium_cpr_mult REAL,
            discount_cpr_mult REAL,
            convexity_score REAL,
            s_curve_position TEXT,
            contraction_risk_score REAL,
            extension_risk_score REAL,
            composite_prepay_score REAL,
            bull_scenario_score REAL,
            bear_scenario_score REAL,
            neutral_scenario_score REAL,
            behavior_tags TEXT,
            tags_updated_at TEXT,

            claim_token TEXT,
            claimed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS fred_observation (
            series_id TEXT NOT NULL,
            obs_date TEXT NOT NULL,
            value REAL,
            PRIMARY KEY (series_id, obs_date)
        );

        CREATE INDEX IF NOT EXISTS idx_pool_tags_updated ON dim_pool(tags_updated_at);
        CREATE INDEX IF NOT EXISTS idx_pool_claim ON dim_pool(claim_token);
        ",
    )
    .map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}
