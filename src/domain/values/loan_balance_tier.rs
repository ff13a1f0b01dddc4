use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Average-loan-size bracket. `Llb1`..`Llb7` are the low-loan-balance
/// stories that refinance slowly; `Jumbo` sits above the conforming limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanBalanceTier {
    Llb1,
    Llb2,
    Llb3,
    Llb4,
    Llb5,
    Llb6,
    Llb7,
    Mlb,
    Std,
    Jumbo,
}

impl LoanBalanceTier {
    /// Ordered from smallest to largest balance.
    pub const ALL: [LoanBalanceTier; 10] = [
        LoanBalanceTier::Llb1,
        LoanBalanceTier::Llb2,
        LoanBalanceTier::Llb3,
        LoanBalanceTier::Llb4,
        LoanBalanceTier::Llb5,
        LoanBalanceTier::Llb6,
        LoanBalanceTier::Llb7,
        LoanBalanceTier::Mlb,
        LoanBalanceTier::Std,
        LoanBalanceTier::Jumbo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanBalanceTier::Llb1 => "LLB1",
            LoanBalanceTier::Llb2 => "LLB2",
            LoanBalanceTier::Llb3 => "LLB3",
            LoanBalanceTier::Llb4 => "LLB4",
            LoanBalanceTier::Llb5 => "LLB5",
            LoanBalanceTier::Llb6 => "LLB6",
            LoanBalanceTier::Llb7 => "LLB7",
            LoanBalanceTier::Mlb => "MLB",
            LoanBalanceTier::Std => "STD",
            LoanBalanceTier::Jumbo => "JUMBO",
        }
    }

    pub fn is_standard_or_jumbo(&self) -> bool {
        matches!(self, LoanBalanceTier::Std | LoanBalanceTier::Jumbo)
    }
}

impl fmt::Display for LoanBalanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanBalanceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LLB1" => Ok(LoanBalanceTier::Llb1),
            "LLB2" => Ok(LoanBalanceTier::Llb2),
            "LLB3" => Ok(LoanBalanceTier::Llb3),
            "LLB4" => Ok(LoanBalanceTier::Llb4),
            "LLB5" => Ok(LoanBalanceTier::Llb5),
            "LLB6" => Ok(LoanBalanceTier::Llb6),
            "LLB7" => Ok(LoanBalanceTier::Llb7),
            "MLB" => Ok(LoanBalanceTier::Mlb),
            "STD" => Ok(LoanBalanceTier::Std),
            "JUMBO" => Ok(LoanBalanceTier::Jumbo),
            _ => Err(format!("Unknown loan balance tier: {s}")),
        }
    }
}
