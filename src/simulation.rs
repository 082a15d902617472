use crate::gaussian;
use crate::matchmaker::{pair_mut, Matchmaker};
use crate::rating::{self, Outcome};
use crate::types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// 64-bit fractional golden ratio, spreads consecutive stream ids
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seed for an independent RNG stream under `base`. The splitmix64 finalizer
/// keeps nested derivations (run -> day) from colliding.
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    let mut z = (base ^ stream.wrapping_mul(MIXING_CONSTANT)).wrapping_add(MIXING_CONSTANT);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Main simulation state and controller
#[derive(Serialize, Deserialize)]
pub struct Simulation {
    /// Days simulated so far
    pub current_day: u64,
    /// Population, re-sorted by rating after every day
    pub players: Vec<Player>,
    pub config: SimulationConfig,
    pub stats: SimulationStats,
    /// Random number generator seed
    rng_seed: u64,
}

impl Simulation {
    /// Starts with an empty population; `advance_day` does nothing until
    /// `generate_population` runs. See `with_population`.
    pub fn new(config: SimulationConfig, seed: u64) -> Self {
        Self {
            current_day: 0,
            players: Vec::new(),
            config,
            stats: SimulationStats::default(),
            rng_seed: seed,
        }
    }

    /// Ready to run: `config.population_size` players already generated
    pub fn with_population(config: SimulationConfig, seed: u64) -> Self {
        let mut sim = Self::new(config, seed);
        sim.generate_population(sim.config.population_size);
        sim
    }

    /// Seeded from the platform entropy source; runs won't repeat
    pub fn from_entropy(config: SimulationConfig) -> Self {
        let seed = rand::thread_rng().gen();
        Self::new(config, seed)
    }

    pub fn seed(&self) -> u64 {
        self.rng_seed
    }

    /// Replace the population with `count` freshly sampled players
    pub fn generate_population(&mut self, count: usize) {
        let mut rng = StdRng::seed_from_u64(derive_seed(self.rng_seed, 0));
        self.players = (0..count)
            .map(|_| new_player(&self.config, &mut rng))
            .collect();
        info!(
            players = count,
            seed = self.rng_seed,
            "Generated population"
        );
    }

    /// Run one simulated day and report the histogram
    pub fn advance_day(&mut self) -> DaySnapshot {
        // Stream 0 belongs to the population
        let mut rng = StdRng::seed_from_u64(derive_seed(
            self.rng_seed,
            self.current_day.wrapping_add(1),
        ));

        let day_stats = run_day(
            &mut self.players,
            self.config.daily_matches,
            &self.config,
            &mut rng,
        );

        // Cosmetic: bucket sums don't depend on order
        self.players.sort_by_key(|p| p.rating);
        let histogram = build_histogram(&self.players, &self.config.histogram);

        self.current_day += 1;
        self.update_stats(day_stats);

        debug!(
            day = self.current_day,
            realized = self.stats.last_day.realized,
            skipped = self.stats.last_day.skipped,
            "Day complete"
        );

        DaySnapshot {
            day: self.current_day,
            histogram,
        }
    }

    /// Run simulation for N days, returning the last snapshot
    pub fn run(&mut self, days: u64) -> Option<DaySnapshot> {
        let mut last = None;
        for _ in 0..days {
            last = Some(self.advance_day());
        }
        last
    }

    /// Histogram of the population as it stands, without simulating
    pub fn histogram(&self) -> Vec<i64> {
        build_histogram(&self.players, &self.config.histogram)
    }

    fn update_stats(&mut self, day_stats: DayStats) {
        self.stats.days = self.current_day;
        self.stats.totals.accumulate(&day_stats);
        self.stats.last_day = day_stats;
    }

    /// Swap in a new config; the population is kept as is
    pub fn update_config(&mut self, config: SimulationConfig) {
        self.config = config;
    }

    pub fn population_summary(&self) -> PopulationSummary {
        summarize(&self.players, &self.config.histogram)
    }

    /// Get current state as JSON for frontend
    pub fn get_state_json(&self) -> String {
        serde_json::to_string(&SimulationState {
            current_day: self.current_day,
            total_players: self.players.len(),
            stats: self.stats.clone(),
            config: self.config.clone(),
            summary: self.population_summary(),
        })
        .unwrap_or_default()
    }
}

/// Sample a new player. Draw order: ability, inconsistency, evolution rate,
/// evolution variation, ceiling.
pub fn new_player(config: &SimulationConfig, rng: &mut impl Rng) -> Player {
    let ability = config.ability.sample(rng);
    let inconsistency = config.inconsistency.sample(rng);
    let evolution_rate = config.evolution_rate.sample(rng);
    let evolution_variation = config.evolution_variation.sample(rng);
    let max_ability = config.max_ability.sample(rng);

    Player {
        rating: config.start_rating,
        ability,
        max_ability,
        inconsistency,
        evolution_rate,
        evolution_variation,
    }
}

/// Move ability toward its ceiling by a fraction `step` of the remaining gap
pub fn evolve_with_step(player: &mut Player, step: f64) {
    player.ability += (player.max_ability - player.ability) * step;
}

/// One evolution event with a freshly sampled step. A negative step pushes
/// ability away from the ceiling.
pub fn evolve(player: &mut Player, rng: &mut impl Rng) {
    let step = player.evolution_variation * gaussian::normal(rng) + player.evolution_rate;
    evolve_with_step(player, step);
}

/// Run `match_count` pairing attempts over `players`
pub fn run_day(
    players: &mut [Player],
    match_count: usize,
    config: &SimulationConfig,
    rng: &mut impl Rng,
) -> DayStats {
    let matchmaker = Matchmaker::new();
    let draw_margin = config.draw_margin();
    let mut stats = DayStats::default();

    // Nobody to pair with, strict mode would spin forever
    if config.strict_match_count && players.len() < 2 {
        return stats;
    }

    while stats.realized < match_count {
        if !config.strict_match_count && stats.attempted >= match_count {
            break;
        }
        stats.attempted += 1;

        let Some((i, j)) = matchmaker.pick_pair(players.len(), rng) else {
            stats.skipped += 1;
            continue;
        };

        let (p1, p2) = pair_mut(players, i, j);
        let report = rating::resolve_match(p1, p2, &config.rating_policy, draw_margin, rng);
        evolve(p1, rng);
        evolve(p2, rng);

        stats.realized += 1;
        match report.outcome {
            Outcome::Draw => stats.draws += 1,
            _ => stats.decisive += 1,
        }
        if report.upset {
            stats.upsets += 1;
        }
        trace!(i, j, outcome = ?report.outcome, "Match resolved");
    }

    stats
}

/// Sum ratings per bucket. Ratings outside the reported range are dropped.
pub fn build_histogram(players: &[Player], layout: &HistogramConfig) -> Vec<i64> {
    let mut buckets = vec![0i64; layout.bucket_count];
    for player in players {
        if let Some(bucket) = layout.bucket_of(player.rating) {
            buckets[bucket] += player.rating as i64;
        }
    }
    buckets
}

pub fn summarize(players: &[Player], layout: &HistogramConfig) -> PopulationSummary {
    if players.is_empty() {
        return PopulationSummary::default();
    }

    let n = players.len() as f64;
    PopulationSummary {
        player_count: players.len(),
        min_rating: players.iter().map(|p| p.rating).min().unwrap_or_default(),
        max_rating: players.iter().map(|p| p.rating).max().unwrap_or_default(),
        mean_rating: players.iter().map(|p| p.rating as f64).sum::<f64>() / n,
        mean_ability: players.iter().map(|p| p.ability).sum::<f64>() / n,
        mean_max_ability: players.iter().map(|p| p.max_ability).sum::<f64>() / n,
        out_of_range: players
            .iter()
            .filter(|p| layout.bucket_of(p.rating).is_none())
            .count(),
        negative_evolution_rate: players.iter().filter(|p| p.evolution_rate < 0.0).count(),
        negative_inconsistency: players.iter().filter(|p| p.inconsistency < 0.0).count(),
    }
}

/// Serializable view for frontend
#[derive(Serialize, Deserialize)]
pub struct SimulationState {
    pub current_day: u64,
    pub total_players: usize,
    pub stats: SimulationStats,
    pub config: SimulationConfig,
    pub summary: PopulationSummary,
}
