//! Cost and token accounting for external capability calls
//!
//! Every stage reports a [`CallUsage`]; one answer cycle folds the gate
//! check, the conversation checks and the five per-entity usages into a
//! [`CostLedger`] whose totals are sums by construction, with one named
//! field per stage.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Cost and token usage of zero or more capability calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CallUsage {
    /// USD cost of the call(s)
    pub cost: f64,

    /// Total tokens consumed (prompt + completion)
    pub tokens: u64,
}

impl CallUsage {
    pub const ZERO: CallUsage = CallUsage { cost: 0.0, tokens: 0 };

    pub fn new(cost: f64, tokens: u64) -> Self {
        Self { cost, tokens }
    }

    pub fn is_zero(&self) -> bool {
        self.cost == 0.0 && self.tokens == 0
    }
}

impl Add for CallUsage {
    type Output = CallUsage;

    fn add(self, rhs: CallUsage) -> CallUsage {
        CallUsage {
            cost: self.cost + rhs.cost,
            tokens: self.tokens + rhs.tokens,
        }
    }
}

impl AddAssign for CallUsage {
    fn add_assign(&mut self, rhs: CallUsage) {
        self.cost += rhs.cost;
        self.tokens += rhs.tokens;
    }
}

/// Per-stage usage ledger for one answer cycle
///
/// One named field per stage; the totals always equal the exact sum of the
/// fields, regardless of which validations recovered or aborted. The gate
/// and conversation fields stay zero inside the query analyst and are filled
/// in by the answer cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostLedger {
    pub gate: CallUsage,
    pub conversation: CallUsage,
    pub specialty: CallUsage,
    pub location: CallUsage,
    pub institution_names: CallUsage,
    pub institution_type: CallUsage,
    pub result_count: CallUsage,
}

impl CostLedger {
    /// Total USD cost across all stages
    pub fn total_cost(&self) -> f64 {
        self.gate.cost
            + self.conversation.cost
            + self.specialty.cost
            + self.location.cost
            + self.institution_names.cost
            + self.institution_type.cost
            + self.result_count.cost
    }

    /// Total tokens across all stages
    pub fn total_tokens(&self) -> u64 {
        self.gate.tokens
            + self.conversation.tokens
            + self.specialty.tokens
            + self.location.tokens
            + self.institution_names.tokens
            + self.institution_type.tokens
            + self.result_count.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_addition() {
        let a = CallUsage::new(0.001, 120);
        let b = CallUsage::new(0.002, 80);
        let sum = a + b;
        assert_eq!(sum.tokens, 200);
        assert!((sum.cost - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_ledger_totals_are_exact_sums() {
        let ledger = CostLedger {
            gate: CallUsage::new(0.001, 40),
            conversation: CallUsage::new(0.003, 160),
            specialty: CallUsage::new(0.001, 100),
            location: CallUsage::new(0.002, 250),
            institution_names: CallUsage::new(0.0005, 50),
            institution_type: CallUsage::ZERO,
            result_count: CallUsage::new(0.0001, 10),
        };
        assert_eq!(ledger.total_tokens(), 610);
        assert!((ledger.total_cost() - 0.0076).abs() < 1e-12);
    }

    #[test]
    fn test_zero_usage_for_rule_stages() {
        let ledger = CostLedger::default();
        assert_eq!(ledger.total_tokens(), 0);
        assert_eq!(ledger.total_cost(), 0.0);
    }
}
