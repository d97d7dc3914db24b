//! Simulation Context
//!
//! Owns the ECS world and the per-tick schedule. One call to [`Simulation::step`]
//! runs exactly one tick and hands back the settled state; nothing outside the
//! context is mutated.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use crate::components::{
    begin_tick, Agent, Agents, FrameDelta, HostClock, Region, Source, Sources, TickState,
};
use crate::config::{Algorithm, SimConfig};
use crate::error::{ConfigError, EntityKind, SimError};
use crate::output::{
    collect_metrics, start_compute_timer, stop_compute_timer, ComputeTimer, MetricsCollector,
};
use crate::setup::{spawn_population, SpawnSummary};
use crate::spatial::GridSpec;
use crate::systems::{
    advance_sources, apply_flocking, compare_resolvers, integrate_agents, resolve_influence,
    resolver_for, ActiveResolver, AgentGrid, ResolverComparison,
};
use crate::SimRng;
use flock_types::{RunState, StepSnapshot, ThroughputSample};

/// Build the per-tick schedule: sources, influence, flocking, integration, metrics.
fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            begin_tick,
            advance_sources,
            start_compute_timer,
            resolve_influence,
            apply_flocking,
            integrate_agents,
            stop_compute_timer,
            collect_metrics,
        )
            .chain(),
    );
    schedule
}

/// Fill a fresh world with every resource the schedule reads.
fn populate_world(
    config: &SimConfig,
    spec: GridSpec,
    agents: Vec<Agent>,
    sources: Vec<Source>,
    rng: SmallRng,
) -> World {
    let mut world = World::new();

    world.insert_resource(Agents(agents));
    world.insert_resource(Sources(sources));
    world.insert_resource(Region::new(config.region_width, config.region_height));
    world.insert_resource(FrameDelta::default());
    world.insert_resource(HostClock::new());
    world.insert_resource(TickState::new());
    world.insert_resource(AgentGrid::new(spec));
    world.insert_resource(ActiveResolver(resolver_for(config.algorithm, spec)));
    world.insert_resource(config.flocking.clone());
    world.insert_resource(SimRng(rng));
    world.insert_resource(ComputeTimer::default());
    world.insert_resource(MetricsCollector::new(config.metrics_window_ms));

    world
}

/// An owned, re-entrant simulation engine.
pub struct Simulation {
    config: SimConfig,
    spec: GridSpec,
    world: World,
    schedule: Schedule,
    run_state: RunState,
    epoch: u64,
    /// Tick at which an invariant violation was detected
    fault: Option<u64>,
}

impl Simulation {
    /// Validate `config` and spawn a seeded random population.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let (agents, sources) = spawn_population(&config, &mut rng);
        Self::assemble(config, agents, sources, rng)
    }

    /// Build an engine around explicitly placed populations.
    ///
    /// The counts in `config` are replaced by the lengths of `agents` and
    /// `sources`; everything else is validated as usual.
    pub fn from_parts(
        mut config: SimConfig,
        agents: Vec<Agent>,
        sources: Vec<Source>,
    ) -> Result<Self, SimError> {
        config.agent_count = agents.len();
        config.source_count = sources.len();
        config.validate()?;
        let rng = SmallRng::seed_from_u64(config.seed);
        Self::assemble(config, agents, sources, rng)
    }

    fn assemble(
        config: SimConfig,
        agents: Vec<Agent>,
        sources: Vec<Source>,
        rng: SmallRng,
    ) -> Result<Self, SimError> {
        let spec = config.grid_spec()?;

        let summary = SpawnSummary::of(&agents, &sources);
        let world = populate_world(&config, spec, agents, sources, rng);

        info!(
            algorithm = %config.algorithm,
            cols = spec.cols(),
            rows = spec.rows(),
            seed = config.seed,
            "Simulation initialized: {}",
            summary
        );

        let sim = Self {
            config,
            spec,
            world,
            schedule: build_schedule(),
            run_state: RunState::Running,
            epoch: 0,
            fault: None,
        };
        sim.warn_if_grid_misses_sources();
        Ok(sim)
    }

    /// True when a 3x3 grid query is guaranteed to see every in-range source,
    /// i.e. no source reaches further than one cell.
    pub fn grid_covers_sources(&self) -> bool {
        self.spec.cell_size() >= self.world.resource::<Sources>().max_range()
    }

    fn warn_if_grid_misses_sources(&self) {
        if !self.grid_covers_sources() {
            warn!(
                grid_cell_size = self.spec.cell_size(),
                source_range = self.world.resource::<Sources>().max_range(),
                "Grid cells are smaller than the source range; the optimized resolver may miss in-range sources"
            );
        }
    }

    /// Run one tick at host time `now_ms` and return the settled state.
    ///
    /// While paused no tick runs and the current state is returned unchanged.
    pub fn step(&mut self, now_ms: f64) -> Result<StepSnapshot, SimError> {
        if let Some(tick) = self.fault {
            return Err(SimError::Faulted { tick });
        }
        if !now_ms.is_finite() {
            return Err(SimError::InvalidTimestamp(now_ms));
        }
        if self.run_state == RunState::Paused {
            return Ok(self.snapshot());
        }

        let frames = self.world.resource_mut::<HostClock>().advance(now_ms);
        self.world
            .insert_resource(FrameDelta(frames * self.config.speed_multiplier));

        self.schedule.run(&mut self.world);
        self.world.resource_mut::<TickState>().finish_tick();

        let tick = self.tick();
        if let Err(err) = self.check_finite(tick) {
            self.fault = Some(tick);
            error!(epoch = self.epoch, "Simulation faulted: {}", err);
            return Err(err);
        }

        let throughput = self.world.resource::<MetricsCollector>().latest_throughput();
        Ok(self.snapshot_with(throughput))
    }

    fn check_finite(&self, tick: u64) -> Result<(), SimError> {
        if let Some(index) = self.agents().iter().position(|a| !a.is_finite()) {
            return Err(SimError::NonFinite {
                kind: EntityKind::Agent,
                index,
                tick,
            });
        }
        if let Some(index) = self.sources().iter().position(|s| !s.is_finite()) {
            return Err(SimError::NonFinite {
                kind: EntityKind::Source,
                index,
                tick,
            });
        }
        Ok(())
    }

    /// Halt ticking without discarding state
    pub fn pause(&mut self) -> StepSnapshot {
        if self.run_state == RunState::Running {
            self.run_state = RunState::Paused;
            info!(tick = self.tick(), epoch = self.epoch, "Simulation paused");
        }
        self.snapshot()
    }

    /// Continue ticking; the first tick after resuming uses a frame delta of 1.
    pub fn resume(&mut self) {
        if self.run_state == RunState::Paused {
            self.run_state = RunState::Running;
            self.restart_clock();
            info!(tick = self.tick(), epoch = self.epoch, "Simulation resumed");
        }
    }

    /// Discard the population and start a new epoch from the current configuration.
    ///
    /// The new population is drawn from the continuing random stream, so each
    /// epoch differs while a whole run stays reproducible from the seed.
    pub fn reset(&mut self) {
        let mut rng = self
            .world
            .remove_resource::<SimRng>()
            .map(|rng| rng.0)
            .unwrap_or_else(|| SmallRng::seed_from_u64(self.config.seed));
        let (agents, sources) = spawn_population(&self.config, &mut rng);
        let summary = SpawnSummary::of(&agents, &sources);

        self.world = populate_world(&self.config, self.spec, agents, sources, rng);
        self.run_state = RunState::Running;
        self.fault = None;
        self.epoch += 1;

        info!(epoch = self.epoch, "Simulation reset: {}", summary);
        self.warn_if_grid_misses_sources();
    }

    /// Swap the influence strategy, keeping the population.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        if self.config.algorithm == algorithm {
            return;
        }
        self.config.algorithm = algorithm;
        self.world
            .insert_resource(ActiveResolver(resolver_for(algorithm, self.spec)));
        self.restart_clock();
        info!(algorithm = %algorithm, "Influence strategy changed");
    }

    /// Change the speed multiplier, keeping the population.
    pub fn set_speed_multiplier(&mut self, speed_multiplier: f32) -> Result<(), ConfigError> {
        if !(speed_multiplier.is_finite() && speed_multiplier > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "speed_multiplier",
                value: speed_multiplier as f64,
            });
        }
        self.config.speed_multiplier = speed_multiplier;
        self.restart_clock();
        Ok(())
    }

    fn restart_clock(&mut self) {
        self.world.resource_mut::<HostClock>().restart();
        self.world.resource_mut::<MetricsCollector>().restart_window();
    }

    /// The settled state after the last completed tick
    pub fn snapshot(&self) -> StepSnapshot {
        self.snapshot_with(None)
    }

    fn snapshot_with(&self, throughput: Option<ThroughputSample>) -> StepSnapshot {
        StepSnapshot {
            epoch: self.epoch,
            tick: self.tick(),
            run_state: self.run_state,
            agents: self.agents().iter().map(Agent::snapshot).collect(),
            sources: self.sources().iter().map(Source::snapshot).collect(),
            metrics: self.world.resource::<MetricsCollector>().latest(),
            throughput,
        }
    }

    /// Run both strategies over the current population without changing it.
    pub fn compare_resolvers(&self) -> ResolverComparison {
        compare_resolvers(self.agents(), self.sources(), self.spec)
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Ticks completed in the current epoch
    pub fn tick(&self) -> u64 {
        self.world.resource::<TickState>().current_tick
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid_spec(&self) -> GridSpec {
        self.spec
    }

    pub fn agents(&self) -> &[Agent] {
        &self.world.resource::<Agents>().0
    }

    pub fn sources(&self) -> &[Source] {
        &self.world.resource::<Sources>().0
    }
}
