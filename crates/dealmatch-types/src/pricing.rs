//! Pricing, timeout and trust terms carried by offers and deals.
//!
//! All amounts are unsigned integers in the settlement token's base unit.
//! A price of zero is valid (free offers).

use serde::{Deserialize, Serialize};

use crate::Address;

/// How the solver should treat an offer's price.
///
/// - `MarketPrice`: "get me the best deal", the job creator default.
/// - `FixedPrice`: take it or leave it, the resource provider default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PricingMode {
    #[default]
    MarketPrice,
    FixedPrice,
}

impl std::fmt::Display for PricingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarketPrice => write!(f, "MARKET_PRICE"),
            Self::FixedPrice => write!(f, "FIXED_PRICE"),
        }
    }
}

/// Price and collateral terms of a deal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealPricing {
    /// Price per executed instruction.
    pub instruction_price: u64,
    /// Collateral the job creator locks to guarantee payment.
    pub payment_collateral: u64,
    /// Resource provider's results collateral as a multiple of the job cost.
    pub results_collateral_multiple: u64,
    /// Fee paid to the mediator if mediation is invoked.
    pub mediation_fee: u64,
}

/// Deadline for one lifecycle stage and the collateral forfeited on miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealTimeout {
    /// Seconds allowed from entry into the stage. Zero disables the deadline.
    pub timeout: u64,
    pub collateral: u64,
}

impl DealTimeout {
    #[must_use]
    pub fn new(timeout: u64, collateral: u64) -> Self {
        Self {
            timeout,
            collateral,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.timeout > 0
    }
}

/// One deadline per lifecycle stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealTimeouts {
    pub agree: DealTimeout,
    pub submit_results: DealTimeout,
    pub judge_results: DealTimeout,
    pub mediate_results: DealTimeout,
}

/// A concrete pricing + timeouts pair, as resolved for a deal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealTerms {
    pub pricing: DealPricing,
    pub timeouts: DealTimeouts,
}

/// Mediators and directories a party is willing to work with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrustedParties {
    pub mediator: Vec<Address>,
    pub directory: Vec<Address>,
}

impl TrustedParties {
    #[must_use]
    pub fn new(mediator: Vec<Address>, directory: Vec<Address>) -> Self {
        Self {
            mediator,
            directory,
        }
    }
}
