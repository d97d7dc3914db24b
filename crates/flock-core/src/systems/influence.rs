//! Influence System
//!
//! Each agent looks at a candidate set of sources, picks the strongest one in
//! range and adopts its opinion when the pull is strong enough. Two strategies
//! produce the candidate sets: every source (naive) or the sources bucketed in
//! the 3x3 grid neighbourhood around the agent (optimized).

use bevy_ecs::prelude::*;
use flock_types::Opinion;

use crate::components::{Agent, Agents, Source, Sources, TickState};
use crate::config::Algorithm;
use crate::spatial::{GridSpec, SpatialGrid};

/// Constants for opinion adoption
pub mod influence_constants {
    /// Strength an influence must exceed before an agent adopts it
    pub const ADOPTION_THRESHOLD: f32 = 0.3;
}

use influence_constants::ADOPTION_THRESHOLD;

/// A neighbour-source search strategy.
///
/// `resolve` may change agent opinions and returns the number of agent/source
/// distance evaluations it performed.
pub trait InfluenceResolver: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn resolve(&mut self, agents: &mut [Agent], sources: &[Source]) -> u64;
}

/// Scans every source for every agent
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveResolver;

impl InfluenceResolver for NaiveResolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Naive
    }

    fn resolve(&mut self, agents: &mut [Agent], sources: &[Source]) -> u64 {
        agents
            .iter_mut()
            .map(|agent| adopt_strongest(agent, sources, 0..sources.len()))
            .sum()
    }
}

/// Looks up candidate sources in a grid rebuilt over source positions each call
#[derive(Debug, Clone)]
pub struct GridResolver {
    grid: SpatialGrid,
}

impl GridResolver {
    pub fn new(spec: GridSpec) -> Self {
        Self {
            grid: SpatialGrid::new(spec),
        }
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }
}

impl InfluenceResolver for GridResolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Optimized
    }

    fn resolve(&mut self, agents: &mut [Agent], sources: &[Source]) -> u64 {
        // Sources moved since the last call
        self.grid.rebuild(sources);

        let grid = &self.grid;
        agents
            .iter_mut()
            .map(|agent| {
                let candidates = grid.neighborhood(agent.x, agent.y);
                adopt_strongest(agent, sources, candidates)
            })
            .sum()
    }
}

/// The one place an algorithm tag turns into a strategy
pub fn resolver_for(algorithm: Algorithm, spec: GridSpec) -> Box<dyn InfluenceResolver> {
    match algorithm {
        Algorithm::Naive => Box::new(NaiveResolver),
        Algorithm::Optimized => Box::new(GridResolver::new(spec)),
    }
}

/// Resource: the strategy selected at initialization
#[derive(Resource)]
pub struct ActiveResolver(pub Box<dyn InfluenceResolver>);

#[derive(Debug, Clone, Copy)]
struct Strongest {
    index: usize,
    strength: f32,
    opinion: Opinion,
}

/// Decision rule shared by both strategies.
///
/// Every candidate index counts as one distance check. Among in-range
/// candidates the strongest wins; equal strengths go to the lowest source
/// index, which is also the first one the naive scan meets, so both strategies
/// break ties identically. Opinions only change on adoption, never decay.
pub fn adopt_strongest(
    agent: &mut Agent,
    sources: &[Source],
    candidates: impl IntoIterator<Item = usize>,
) -> u64 {
    let mut checks = 0u64;
    let mut best: Option<Strongest> = None;

    for index in candidates {
        checks += 1;
        let source = &sources[index];
        let dx = source.x - agent.x;
        let dy = source.y - agent.y;
        let distance = (dx * dx + dy * dy).sqrt();

        let Some(strength) = source.strength_at(distance) else {
            continue;
        };

        let stronger = match best {
            None => true,
            Some(current) => {
                strength > current.strength
                    || (strength == current.strength && index < current.index)
            }
        };
        if stronger {
            best = Some(Strongest {
                index,
                strength,
                opinion: source.opinion(),
            });
        }
    }

    if let Some(best) = best {
        if best.strength > ADOPTION_THRESHOLD {
            agent.opinion = best.opinion;
        }
    }

    checks
}

/// System: run the active strategy and record its distance checks
pub fn resolve_influence(
    mut resolver: ResMut<ActiveResolver>,
    mut agents: ResMut<Agents>,
    sources: Res<Sources>,
    mut tick_state: ResMut<TickState>,
) {
    tick_state.distance_checks = resolver.0.resolve(&mut agents.0, &sources.0);
}

/// Outcome of running both strategies over the same snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverComparison {
    pub naive_checks: u64,
    pub grid_checks: u64,
    /// Agents whose resulting opinion differs between the strategies
    pub differing_opinions: usize,
}

impl ResolverComparison {
    pub fn outcomes_match(&self) -> bool {
        self.differing_opinions == 0
    }

    /// Grid checks as a fraction of naive checks
    pub fn check_ratio(&self) -> f64 {
        if self.naive_checks == 0 {
            0.0
        } else {
            self.grid_checks as f64 / self.naive_checks as f64
        }
    }
}

/// Run both strategies on copies of `agents` and compare cost and outcome.
pub fn compare_resolvers(agents: &[Agent], sources: &[Source], spec: GridSpec) -> ResolverComparison {
    let mut naive_agents = agents.to_vec();
    let naive_checks = NaiveResolver.resolve(&mut naive_agents, sources);

    let mut grid_agents = agents.to_vec();
    let grid_checks = GridResolver::new(spec).resolve(&mut grid_agents, sources);

    let differing_opinions = naive_agents
        .iter()
        .zip(&grid_agents)
        .filter(|(a, b)| a.opinion != b.opinion)
        .count();

    ResolverComparison {
        naive_checks,
        grid_checks,
        differing_opinions,
    }
}
