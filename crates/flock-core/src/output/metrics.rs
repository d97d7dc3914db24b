//! Metrics Collection
//!
//! Polarization and cost counters derived from the settled post-tick state,
//! plus a sampled throughput figure reported once per window of host time.

use bevy_ecs::prelude::*;
use flock_types::{ThroughputSample, TickMetrics};
use std::time::Instant;

use crate::components::{Agent, Agents, HostClock, TickState};

/// Population standard deviation of opinion values mapped to +1 / -1.
///
/// 0 for a unanimous population, 1 for an even split.
pub fn polarization(agents: &[Agent]) -> f32 {
    if agents.is_empty() {
        return 0.0;
    }
    let n = agents.len() as f64;
    let mean = agents.iter().map(|a| a.opinion.value() as f64).sum::<f64>() / n;
    let variance = agents
        .iter()
        .map(|a| {
            let d = a.opinion.value() as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt() as f32
}

/// Resource: wall-clock timer around influence, flocking and integration
#[derive(Resource, Debug, Default)]
pub struct ComputeTimer {
    started: Option<Instant>,
    /// Duration of the last completed measurement
    pub last_ms: f64,
}

/// System: start timing the compute phase
pub fn start_compute_timer(mut timer: ResMut<ComputeTimer>) {
    timer.started = Some(Instant::now());
}

/// System: stop timing the compute phase
pub fn stop_compute_timer(mut timer: ResMut<ComputeTimer>) {
    if let Some(started) = timer.started.take() {
        timer.last_ms = started.elapsed().as_secs_f64() * 1000.0;
    }
}

/// Resource to accumulate metrics during simulation
#[derive(Resource, Debug, Clone)]
pub struct MetricsCollector {
    window_ms: f64,
    frame_count: u32,
    window_start_ms: Option<f64>,
    latest: TickMetrics,
    /// Set only on the tick that closed a window
    latest_throughput: Option<ThroughputSample>,
    total_ticks: u64,
}

impl MetricsCollector {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            frame_count: 0,
            window_start_ms: None,
            latest: TickMetrics::default(),
            latest_throughput: None,
            total_ticks: 0,
        }
    }

    /// Record the metrics of a completed tick observed at host time `now_ms`.
    pub fn record_tick(&mut self, metrics: TickMetrics, now_ms: f64) -> Option<ThroughputSample> {
        self.latest = metrics;
        self.total_ticks += 1;
        self.latest_throughput = self.record_frame(now_ms);
        self.latest_throughput
    }

    /// Count a frame; returns a sample when the reporting window has elapsed.
    pub fn record_frame(&mut self, now_ms: f64) -> Option<ThroughputSample> {
        self.frame_count += 1;
        let start = *self.window_start_ms.get_or_insert(now_ms);
        let elapsed = now_ms - start;
        if elapsed <= self.window_ms {
            return None;
        }

        let sample = ThroughputSample {
            ticks: self.frame_count,
            window_ms: elapsed,
        };
        self.frame_count = 0;
        self.window_start_ms = Some(now_ms);
        Some(sample)
    }

    /// Drop the partial window, e.g. after a pause
    pub fn restart_window(&mut self) {
        self.frame_count = 0;
        self.window_start_ms = None;
        self.latest_throughput = None;
    }

    pub fn latest(&self) -> TickMetrics {
        self.latest
    }

    pub fn latest_throughput(&self) -> Option<ThroughputSample> {
        self.latest_throughput
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }
}

/// System: summarize the settled state
pub fn collect_metrics(
    agents: Res<Agents>,
    tick_state: Res<TickState>,
    timer: Res<ComputeTimer>,
    clock: Res<HostClock>,
    mut collector: ResMut<MetricsCollector>,
) {
    let metrics = TickMetrics {
        compute_time_ms: timer.last_ms,
        distance_checks: tick_state.distance_checks,
        polarization: polarization(&agents.0),
    };

    if let Some(sample) = collector.record_tick(metrics, clock.now_ms()) {
        tracing::debug!(
            ticks = sample.ticks,
            window_ms = sample.window_ms,
            ticks_per_second = sample.ticks_per_second(),
            polarization = metrics.polarization,
            "Throughput window closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_types::Opinion;

    fn population(radical: usize, neutral: usize) -> Vec<Agent> {
        let mut agents = vec![Agent::new(0.0, 0.0).with_opinion(Opinion::Radical); radical];
        agents.extend(vec![Agent::new(0.0, 0.0); neutral]);
        agents
    }

    #[test]
    fn test_polarization_extremes() {
        assert_eq!(polarization(&population(0, 10)), 0.0);
        assert_eq!(polarization(&population(10, 0)), 0.0);
        assert!((polarization(&population(5, 5)) - 1.0).abs() < 1e-6);
        assert_eq!(polarization(&[]), 0.0);
    }

    #[test]
    fn test_polarization_in_unit_range() {
        for radical in 0..=20 {
            let p = polarization(&population(radical, 20 - radical));
            assert!((0.0..=1.0).contains(&p), "{radical} radicals -> {p}");
        }
        // One in four radical: mean -0.5, deviation sqrt(0.75)
        let p = polarization(&population(1, 3));
        assert!((p - 0.75f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_throughput_sampled_per_window() {
        let mut collector = MetricsCollector::new(1000.0);
        let frame = 16.0;

        let mut samples = Vec::new();
        for i in 0..130 {
            let now = 2000.0 + i as f64 * frame;
            if let Some(sample) = collector.record_tick(TickMetrics::default(), now) {
                samples.push(sample);
            }
        }

        assert_eq!(collector.total_ticks(), 130);
        assert_eq!(samples.len(), 2);
        // The first tick opens the window; 63 more frames push it past 1000ms
        assert_eq!(samples[0].ticks, 64);
        assert_eq!(samples[0].window_ms, 1008.0);
        assert_eq!(samples[1].ticks, 63);
        assert!((samples[0].ticks_per_second() - 63.49).abs() < 0.01);
    }

    #[test]
    fn test_throughput_absent_between_windows() {
        let mut collector = MetricsCollector::new(1000.0);
        assert!(collector.record_tick(TickMetrics::default(), 0.0).is_none());
        assert!(collector.record_tick(TickMetrics::default(), 500.0).is_none());
        assert!(collector.latest_throughput().is_none());

        let sample = collector.record_tick(TickMetrics::default(), 1001.0).unwrap();
        assert_eq!(sample.ticks, 3);
        assert_eq!(collector.latest_throughput(), Some(sample));

        assert!(collector.record_tick(TickMetrics::default(), 1002.0).is_none());
        assert!(collector.latest_throughput().is_none());
    }

    #[test]
    fn test_restart_window() {
        let mut collector = MetricsCollector::new(1000.0);
        collector.record_tick(TickMetrics::default(), 0.0);
        collector.record_tick(TickMetrics::default(), 900.0);
        collector.restart_window();

        // The window reopens at the next reading
        assert!(collector.record_tick(TickMetrics::default(), 5000.0).is_none());
        let sample = collector.record_tick(TickMetrics::default(), 6000.5).unwrap();
        assert_eq!(sample.ticks, 2);
    }

    #[test]
    fn test_compute_timer_measures() {
        let mut world = World::new();
        world.insert_resource(ComputeTimer::default());

        let mut schedule = Schedule::default();
        schedule.add_systems((start_compute_timer, stop_compute_timer).chain());
        schedule.run(&mut world);

        let timer = world.resource::<ComputeTimer>();
        assert!(timer.last_ms >= 0.0);
        assert!(timer.started.is_none());
    }
}
