use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptMetric {
    pub attempt_id: Uuid,
    pub started_at: String, // RFC 3339, local time
    pub file_size: u64,
    pub latency_ms: u64,
    pub success: bool,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub total_attempts: usize,
    pub successful_attempts: usize,
    pub failed_attempts: usize,
    pub failure_rate: f64,
    pub bytes_uploaded: u64,

    // Latency statistics (milliseconds)
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    pub latency_avg_ms: f64,
    pub latency_p50_ms: u64,
    pub latency_p95_ms: u64,
    pub latency_p99_ms: u64,

    // Failure reasons breakdown
    pub failure_reasons: HashMap<String, usize>,
}

/// Per-attempt record of uploads that reached the storage client.
#[derive(Debug)]
pub struct UploadMetrics {
    session_name: String,
    start_time: Instant,
    attempts: Vec<AttemptMetric>,
}

impl UploadMetrics {
    pub fn new(session_name: String) -> Self {
        Self {
            session_name,
            start_time: Instant::now(),
            attempts: Vec::new(),
        }
    }

    pub fn record_attempt(
        &mut self,
        attempt_id: Uuid,
        file_size: u64,
        latency: Duration,
        success: bool,
        failure_reason: Option<String>,
    ) {
        self.attempts.push(AttemptMetric {
            attempt_id,
            started_at: chrono::Local::now().to_rfc3339(),
            file_size,
            latency_ms: latency.as_millis() as u64,
            success,
            failure_reason,
        });
    }

    pub fn attempts(&self) -> &[AttemptMetric] {
        &self.attempts
    }

    pub fn aggregate(&self) -> AggregatedStats {
        let mut stats = AggregatedStats::default();

        if self.attempts.is_empty() {
            return stats;
        }

        stats.total_attempts = self.attempts.len();
        stats.successful_attempts = self.attempts.iter().filter(|a| a.success).count();
        stats.failed_attempts = stats.total_attempts - stats.successful_attempts;
        stats.failure_rate = (stats.failed_attempts as f64 / stats.total_attempts as f64) * 100.0;
        stats.bytes_uploaded = self
            .attempts
            .iter()
            .filter(|a| a.success)
            .map(|a| a.file_size)
            .sum();

        // Latency statistics from successful attempts only
        let mut latencies: Vec<u64> = self
            .attempts
            .iter()
            .filter(|a| a.success)
            .map(|a| a.latency_ms)
            .collect();

        if !latencies.is_empty() {
            latencies.sort_unstable();

            stats.latency_min_ms = latencies[0];
            stats.latency_max_ms = latencies[latencies.len() - 1];
            stats.latency_avg_ms =
                latencies.iter().sum::<u64>() as f64 / latencies.len() as f64;

            stats.latency_p50_ms = percentile(&latencies, 50.0);
            stats.latency_p95_ms = percentile(&latencies, 95.0);
            stats.latency_p99_ms = percentile(&latencies, 99.0);
        }

        for attempt in self.attempts.iter().filter(|a| !a.success) {
            if let Some(reason) = &attempt.failure_reason {
                *stats.failure_reasons.entry(reason.clone()).or_insert(0) += 1;
            }
        }

        stats
    }

    pub fn export_to_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let output = serde_json::json!({
            "session_name": self.session_name,
            "duration_secs": self.start_time.elapsed().as_secs(),
            "aggregated_stats": self.aggregate(),
            "attempts": self.attempts,
        });

        let json_string = serde_json::to_string_pretty(&output)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;

        Ok(())
    }
}

/// Nearest-rank percentile of already sorted samples.
fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }

    let rank = (p / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}
