use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;

use crate::rating::{self, RatingBreakdown, SideAdjustments};
use crate::team_dataset::TeamDataset;

pub const DEFAULT_SIMULATIONS: usize = 10_000;

/// Per-call overrides for one simulation. `simulations` of zero is treated as
/// the default count rather than an error; only the number of missing players
/// matters to the model, never their identity.
#[derive(Debug, Clone)]
pub struct SimOptions {
    pub simulations: usize,
    pub override_home_b2b: Option<bool>,
    pub override_away_b2b: Option<bool>,
    pub home_missing_players: Vec<String>,
    pub away_missing_players: Vec<String>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            simulations: DEFAULT_SIMULATIONS,
            override_home_b2b: None,
            override_away_b2b: None,
            home_missing_players: Vec::new(),
            away_missing_players: Vec::new(),
        }
    }
}

/// Outcome of one simulated matchup. Win percentages come from the sampling
/// pass and sum to exactly 100; the scores are the analytic expectations, not
/// sample means. `breakdown` carries every adjustment term so the prediction
/// can be explained line by line.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub home_team: String,
    pub away_team: String,
    pub home_win_pct: f64,
    pub away_win_pct: f64,
    pub home_score: f64,
    pub away_score: f64,
    pub total_score: f64,
    pub breakdown: RatingBreakdown,
}

/// Convenience entry point over the process RNG.
pub fn simulate(
    dataset: &TeamDataset,
    home_team: &str,
    away_team: &str,
    options: &SimOptions,
) -> Option<MatchResult> {
    simulate_with_rng(dataset, home_team, away_team, options, &mut rand::thread_rng())
}

/// Runs the full pipeline: resolve both teams, compose ratings, then draw
/// paired normal score samples and count strict home wins (ties go to the
/// away side). Returns `None` when a name does not resolve or the two names
/// are the same team.
pub fn simulate_with_rng<R: Rng>(
    dataset: &TeamDataset,
    home_team: &str,
    away_team: &str,
    options: &SimOptions,
    rng: &mut R,
) -> Option<MatchResult> {
    if home_team == away_team {
        return None;
    }
    let home = dataset.get_team(home_team)?;
    let away = dataset.get_team(away_team)?;

    let rating = rating::match_rating(
        home,
        away,
        dataset.league_averages(),
        SideAdjustments {
            b2b_override: options.override_home_b2b,
            missing_players: options.home_missing_players.len(),
        },
        SideAdjustments {
            b2b_override: options.override_away_b2b,
            missing_players: options.away_missing_players.len(),
        },
    );

    let simulations = if options.simulations == 0 {
        DEFAULT_SIMULATIONS
    } else {
        options.simulations
    };

    let sigma = rating.volatility;
    let mut home_wins = 0usize;
    for _ in 0..simulations {
        let z_home: f64 = StandardNormal.sample(rng);
        let z_away: f64 = StandardNormal.sample(rng);
        let home_sample = rating.home_expected + sigma * z_home;
        let away_sample = rating.away_expected + sigma * z_away;
        if home_sample > away_sample {
            home_wins += 1;
        }
    }

    let home_win_pct = home_wins as f64 / simulations as f64 * 100.0;

    Some(MatchResult {
        home_team: home.team.clone(),
        away_team: away.team.clone(),
        home_win_pct,
        away_win_pct: 100.0 - home_win_pct,
        home_score: rating.home_expected,
        away_score: rating.away_expected,
        total_score: rating.home_expected + rating.away_expected,
        breakdown: rating.breakdown,
    })
}
