//! Shared test helpers.
#![allow(dead_code)]

use mbs_tagger::domain::entities::pool::PoolAttributes;
use mbs_tagger::MbsTagger;

pub fn setup() -> MbsTagger {
    MbsTagger::open(":memory:").unwrap()
}

/// Mid-balance, neutral-servicer pool with nothing remarkable about it.
pub fn boring_pool(pool_id: &str) -> PoolAttributes {
    PoolAttributes {
        avg_loan_size: Some(250_000.0),
        avg_fico: Some(740.0),
        avg_ltv: Some(75.0),
        wala: Some(30.0),
        wac: Some(6.5),
        top_state: Some("TX".into()),
        top_state_pct: Some(15.0),
        servicer_name: Some("Acme Servicing".into()),
        product_type: Some("30yr".into()),
        factor: Some(0.9),
        ..PoolAttributes::new(pool_id)
    }
}

/// Small-balance, slow-servicer, low-FICO, high-friction pool.
pub fn protected_pool(pool_id: &str) -> PoolAttributes {
    PoolAttributes {
        avg_loan_size: Some(80_000.0),
        avg_fico: Some(650.0),
        avg_ltv: Some(85.0),
        wala: Some(48.0),
        wac: Some(7.0),
        top_state: Some("NY".into()),
        top_state_pct: Some(40.0),
        servicer_name: Some("Wells Fargo Home Mortgage".into()),
        product_type: Some("30yr".into()),
        factor: Some(0.6),
        ..PoolAttributes::new(pool_id)
    }
}

/// Large-balance, fast-servicer, super-prime pool fresh off the press.
pub fn exposed_pool(pool_id: &str) -> PoolAttributes {
    PoolAttributes {
        avg_loan_size: Some(400_000.0),
        avg_fico: Some(790.0),
        avg_ltv: Some(70.0),
        wala: Some(6.0),
        wac: Some(6.5),
        top_state: Some("CA".into()),
        top_state_pct: Some(10.0),
        servicer_name: Some("Rocket Mortgage".into()),
        product_type: Some("30yr".into()),
        factor: Some(0.98),
        ..PoolAttributes::new(pool_id)
    }
}

pub fn seed_pools(tagger: &MbsTagger, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let id = format!("POOL{i:05}");
            let pool = match i % 3 {
                0 => boring_pool(&id),
                1 => protected_pool(&id),
                _ => exposed_pool(&id),
            };
            tagger.add_pool(&pool).unwrap();
            id
        })
        .collect()
}
