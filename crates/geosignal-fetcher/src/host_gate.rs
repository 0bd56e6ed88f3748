use crate::circuit::CircuitBreaker;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Per-host concurrency limit, politeness delay and circuit breaker,
/// fused into a single handle so callers acquire one permit and get
/// all three protections at once.
pub struct HostGate {
    pub semaphore: Arc<Semaphore>,
    pub breaker: Arc<CircuitBreaker>,
    pub request_delay: Duration,
}

/// Registry of [`HostGate`]s keyed by hostname, created lazily on
/// first use and shared for the lifetime of a run.
pub struct HostGateRegistry {
    gates: DashMap<String, Arc<HostGate>>,
    per_domain_concurrency: usize,
    request_delay: Duration,
    circuit_threshold: u32,
    circuit_cooldown: Duration,
}

impl HostGateRegistry {
    pub fn new(
        per_domain_concurrency: usize,
        request_delay: Duration,
        circuit_threshold: u32,
        circuit_cooldown: Duration,
    ) -> Self {
        Self {
            gates: DashMap::new(),
            per_domain_concurrency,
            request_delay,
            circuit_threshold,
            circuit_cooldown,
        }
    }

    pub fn gate_for(&self, host: &str) -> Arc<HostGate> {
        if let Some(gate) = self.gates.get(host) {
            return gate.clone();
        }
        let gate = Arc::new(HostGate {
            semaphore: Arc::new(Semaphore::new(self.per_domain_concurrency)),
            breaker: Arc::new(CircuitBreaker::new(self.circuit_threshold, self.circuit_cooldown)),
            request_delay: self.request_delay,
        });
        self.gates.entry(host.to_string()).or_insert(gate).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_host_returns_same_gate() {
        let registry = HostGateRegistry::new(3, Duration::from_secs(0), 5, Duration::from_secs(300));
        let a = registry.gate_for("example.com");
        let b = registry.gate_for("example.com");
        assert!(Arc::ptr_eq(&a.semaphore, &b.semaphore));
    }

    #[test]
    fn different_hosts_get_independent_gates() {
        let registry = HostGateRegistry::new(3, Duration::from_secs(0), 5, Duration::from_secs(300));
        let a = registry.gate_for("example.com");
        let b = registry.gate_for("other.com");
        assert!(!Arc::ptr_eq(&a.semaphore, &b.semaphore));
    }
}
