//! Prometheus metrics for the faucet service.

use prometheus::{Counter, Encoder, Gauge, IntCounterVec, Opts, Registry, TextEncoder};

/// Faucet metrics, registered in their own registry so several services can
/// live in one process (and in one test binary).
#[derive(Clone)]
pub struct FaucetMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    rejections_total: IntCounterVec,
    tokens_dispensed_total: Counter,
    pool_balance: Gauge,
}

impl FaucetMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("drip_requests_total", "Total number of faucet requests"),
            &["operation", "outcome"], // outcome: success | rejected
        )?;
        let rejections_total = IntCounterVec::new(
            Opts::new("drip_rejections_total", "Total number of rejected faucet requests"),
            &["code"],
        )?;
        let tokens_dispensed_total = Counter::new(
            "drip_tokens_dispensed_total",
            "Total tokens paid out of the pool by claims, bonuses included",
        )?;
        let pool_balance = Gauge::new("drip_pool_balance", "Token balance of the faucet pool")?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(rejections_total.clone()))?;
        registry.register(Box::new(tokens_dispensed_total.clone()))?;
        registry.register(Box::new(pool_balance.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            rejections_total,
            tokens_dispensed_total,
            pool_balance,
        })
    }

    pub fn record_success(&self, operation: &str) {
        self.requests_total.with_label_values(&[operation, "success"]).inc();
    }

    pub fn record_rejection(&self, operation: &str, code: &str) {
        self.requests_total.with_label_values(&[operation, "rejected"]).inc();
        self.rejections_total.with_label_values(&[code]).inc();
    }

    pub fn record_dispensed(&self, amount: u128) {
        self.tokens_dispensed_total.inc_by(amount as f64);
    }

    pub fn update_pool_balance(&self, balance: u128) {
        self.pool_balance.set(balance as f64);
    }

    pub fn requests(&self, operation: &str, outcome: &str) -> u64 {
        self.requests_total.with_label_values(&[operation, outcome]).get()
    }

    pub fn rejections(&self, code: &str) -> u64 {
        self.rejections_total.with_label_values(&[code]).get()
    }

    /// Gather metrics as Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_are_independent_per_instance() {
        let a = FaucetMetrics::new().unwrap();
        let b = FaucetMetrics::new().unwrap();
        a.record_success("claim");
        a.record_rejection("claim", "COOLDOWN_ACTIVE");

        assert_eq!(a.requests("claim", "success"), 1);
        assert_eq!(a.rejections("COOLDOWN_ACTIVE"), 1);
        assert_eq!(b.requests("claim", "success"), 0);
    }

    #[test]
    fn test_gather_renders_text() {
        let metrics = FaucetMetrics::new().unwrap();
        metrics.record_dispensed(110);
        metrics.update_pool_balance(890);
        metrics.record_success("claim");

        let text = metrics.gather().unwrap();
        assert!(text.contains("drip_tokens_dispensed_total 110"));
        assert!(text.contains("drip_pool_balance 890"));
        assert!(text.contains("drip_requests_total"));
    }
}
