//! Cost estimation from reported token usage.
//!
//! The running cost is derived from the running token count rather than
//! summed page by page, so `record(t1); record(t2)` and `record(t1 + t2)`
//! always land on the same total.

/// Estimated dollars for `tokens` at `price_per_1k` dollars per 1000 tokens.
pub fn estimate_cost(tokens: u64, price_per_1k: f64) -> f64 {
    tokens as f64 / 1000.0 * price_per_1k
}

/// Running totals for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct CostLedger {
    price_per_1k: f64,
    total_tokens: u64,
    pages: usize,
}

impl CostLedger {
    pub fn new(price_per_1k: f64) -> Self {
        Self {
            price_per_1k,
            total_tokens: 0,
            pages: 0,
        }
    }

    /// Account for one page and return that page's estimated cost.
    pub fn record(&mut self, tokens: u64) -> f64 {
        self.total_tokens = self.total_tokens.saturating_add(tokens);
        self.pages += 1;
        estimate_cost(tokens, self.price_per_1k)
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn total_cost(&self) -> f64 {
        estimate_cost(self.total_tokens, self.price_per_1k)
    }

    /// Pages recorded so far, including zero-token ones.
    pub fn pages(&self) -> usize {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_examples() {
        assert_eq!(estimate_cost(1000, 0.01), 0.01);
        assert!((estimate_cost(2500, 0.01) - 0.025).abs() < 1e-12);
        assert_eq!(estimate_cost(0, 0.01), 0.0);
    }

    #[test]
    fn sequential_equals_combined() {
        let mut split = CostLedger::new(0.01);
        split.record(1000);
        split.record(1500);

        let mut once = CostLedger::new(0.01);
        once.record(2500);

        assert_eq!(split.total_tokens(), once.total_tokens());
        assert_eq!(split.total_cost(), once.total_cost());
        assert_eq!(split.pages(), 2);
        assert_eq!(once.pages(), 1);
    }

    #[test]
    fn zero_token_page_adds_nothing() {
        let mut ledger = CostLedger::new(0.01);
        ledger.record(1000);
        let before = ledger.total_cost();
        assert_eq!(ledger.record(0), 0.0);
        assert_eq!(ledger.total_cost(), before);
    }

    #[test]
    fn total_never_decreases() {
        let mut ledger = CostLedger::new(0.03);
        let mut last = 0.0;
        for tokens in [10, 0, 999, 1, 4000] {
            ledger.record(tokens);
            assert!(ledger.total_cost() >= last);
            last = ledger.total_cost();
        }
    }

    #[test]
    fn five_decimal_display() {
        assert_eq!(format!("{:.5}", estimate_cost(1234, 0.01)), "0.01234");
    }
}
