//! Matchup prediction core: a team-stats snapshot, a rule-based rating
//! composition, and a Monte Carlo pass that turns two expected scores into a
//! win-probability split. Data acquisition and presentation live outside this
//! crate; consumers hand in a CSV snapshot and render the returned result.

pub mod monte_carlo;
pub mod rating;
pub mod team_dataset;
