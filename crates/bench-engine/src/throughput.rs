//! Throughput arithmetic

use bench_core::{GenerateResponse, Winner};

/// Tokens per second from an evaluated token count and duration in
/// nanoseconds. Non-positive durations yield zero.
pub fn tokens_per_second(eval_count: u64, eval_duration_ns: i64) -> f64 {
    if eval_duration_ns <= 0 {
        return 0.0;
    }
    eval_count as f64 / (eval_duration_ns as f64 / 1e9)
}

/// Throughput of one generate response; missing counters read as zero
pub fn response_tps(response: &GenerateResponse) -> f64 {
    tokens_per_second(response.eval_count_or_zero(), response.eval_duration_or_zero())
}

/// Relative difference of `a` over `b` in percent, and the faster side.
///
/// The difference is zero when `b` is zero. Ties go to `B`.
pub fn compare_throughput(tps_a: f64, tps_b: f64) -> (f64, Winner) {
    let diff = if tps_b > 0.0 {
        (tps_a - tps_b) / tps_b * 100.0
    } else {
        0.0
    };
    let winner = if tps_a > tps_b { Winner::A } else { Winner::B };
    (diff, winner)
}
