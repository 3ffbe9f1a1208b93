//! Stress tests for TillStore.
//!
//! These tests verify behavior under heavy load and concurrent access.

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tillstore_core::DataManager;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Starting stock of each product in sale tests.
    pub initial_stock: i64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 50,
            threads: 4,
            initial_stock: 1_000,
        }
    }
}

fn run_threads<F>(store: &Arc<DataManager>, config: &StressConfig, op: F) -> StressTestResult
where
    F: Fn(&DataManager, usize, usize) -> bool + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(store);
            let op = Arc::clone(&op);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let operations = config.operations;

            thread::spawn(move || {
                for i in 0..operations {
                    if op(&store, t, i) {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Stress thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Adds products without ids from several threads at once.
pub fn stress_concurrent_adds(store: Arc<DataManager>, config: &StressConfig) -> StressTestResult {
    run_threads(&store, config, |store, t, i| {
        store
            .add_product(json!({"name": format!("t{t}-{i}"), "stock": 1}))
            .is_ok()
    })
}

/// Sells one unit of a single shared product from several threads at once.
///
/// Product id 1 is created with `initial_stock` before the threads start.
pub fn stress_concurrent_sales(store: Arc<DataManager>, config: &StressConfig) -> StressTestResult {
    store
        .add_product(json!({"id": 1, "name": "contended", "stock": config.initial_stock}))
        .expect("Failed to add product");

    run_threads(&store, config, |store, _, _| {
        store
            .add_sale(json!({"total": 1, "items": [{"productId": 1, "quantity": 1}]}))
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tillstore_core::{count_duplicates, CollectionKind};

    #[test]
    fn concurrent_adds_get_unique_ids() {
        let store = Arc::new(DataManager::open_in_memory().unwrap());
        let config = StressConfig::default();

        let result = stress_concurrent_adds(Arc::clone(&store), &config);
        result.print_summary("concurrent adds");
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.total_ops, config.threads * config.operations);

        let products = store.get_products();
        assert_eq!(products.len(), config.threads * config.operations);
        assert_eq!(count_duplicates(&products), 0);

        let ids: HashSet<i64> = products.iter().filter_map(|p| p.id()).map(|id| id.as_i64()).collect();
        assert_eq!(ids.len(), products.len());
    }

    #[test]
    fn concurrent_sales_lose_no_updates() {
        let store = Arc::new(DataManager::open_in_memory().unwrap());
        let config = StressConfig::default();

        let result = stress_concurrent_sales(Arc::clone(&store), &config);
        result.print_summary("concurrent sales");
        assert_eq!(result.failed_ops, 0);

        let sold = (config.threads * config.operations) as i64;
        let product = store.collection(CollectionKind::Products).find(1).unwrap();
        assert_eq!(product.get_i64("stock"), Some(config.initial_stock - sold));
        assert_eq!(store.get_sales().len() as i64, sold);
    }
}
