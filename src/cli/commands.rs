use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mbs-tagger", about = "Prepayment behavior tagging for MBS pools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tag pools that are missing tags (or stale, with --stale)
    Tag {
        #[arg(long, default_value = "1000")]
        batch_size: usize,
        /// Maximum number of pools to tag in this run
        #[arg(long)]
        limit: Option<usize>,
        /// Market mortgage rate in percent (skips rate lookup)
        #[arg(long)]
        rate: Option<f64>,
        /// Also re-tag pools whose attributes changed since last tagging
        #[arg(long)]
        stale: bool,
        /// Conforming loan limit separating STD from JUMBO
        #[arg(long)]
        conforming_limit: Option<f64>,
    },
    /// Score ad-hoc pool attributes without touching the store
    Score {
        /// JSON with pool_id, avg_loan_size, avg_fico, avg_ltv, wala, wac,
        /// top_state, top_state_pct, servicer_name, product_type, factor
        json: String,
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Insert or replace one pool's raw attributes
    AddPool {
        /// JSON with pool_id and any raw attributes
        json: String,
    },
    /// Show a pool's persisted tags
    Show { pool_id: String },
    /// Show tagging coverage and behavior counts
    Stats,
}
