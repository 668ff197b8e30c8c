use serde::Serialize;

use crate::team_dataset::{LeagueAverages, TeamRecord, streak_value, win_rate};

const HOME_COURT_BASE: f64 = 2.0;
const HOME_COURT_WIN_RATE_SCALE: f64 = 3.0;

const LAST10_SCALE: f64 = 5.0;
const STREAK_SCALE: f64 = 0.8;
const STREAK_CLAMP: f64 = 2.0;
const LAST10_WEIGHT: f64 = 0.7;
const STREAK_WEIGHT: f64 = 0.3;

const HOT_SHOOTING_BONUS: f64 = 2.5;
const COLD_SHOOTING_PENALTY: f64 = -1.5;
const WEAK_PERIMETER_DEFENSE_3P: f64 = 0.36;
const STRONG_PERIMETER_DEFENSE_3P: f64 = 0.35;
const LOW_TOV_RATE: f64 = 12.0;
const LOW_TOV_BONUS: f64 = 1.0;
const HIGH_TOV_RATE: f64 = 15.0;
const HIGH_TOV_PENALTY: f64 = -1.5;
const HIGH_ORB_RATE: f64 = 27.0;
const HIGH_ORB_BONUS: f64 = 1.5;

const NET_RTG_SCALE: f64 = 0.3;
const B2B_PENALTY: f64 = -3.0;
const MISSING_PLAYER_PENALTY: f64 = -5.0;

// Road teams give up a flat 1.5% of their adjusted rating, on top of the
// home side's court bonus.
const ROAD_RATING_SCALE: f64 = 0.985;

const VOLATILITY_BASE: f64 = 9.0;
const VOLATILITY_3PAR_SCALE: f64 = 10.0;

/// Every additive adjustment applied to one side, reported individually so a
/// consumer can explain the prediction term by term.
///
/// `home_court_bonus` is zero for the away side and is applied once, at the
/// expected-score stage; it is deliberately excluded from `rating_adjustment`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SideTerms {
    pub home_court_bonus: f64,
    pub weighted_form: f64,
    pub style_matchup: f64,
    pub net_rating_bonus: f64,
    pub fatigue_penalty: f64,
    pub missing_player_penalty: f64,
}

impl SideTerms {
    /// Sum of every term that feeds the adjusted offensive rating.
    pub fn rating_adjustment(&self) -> f64 {
        self.weighted_form
            + self.style_matchup
            + self.net_rating_bonus
            + self.fatigue_penalty
            + self.missing_player_penalty
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RatingBreakdown {
    pub home: SideTerms,
    pub away: SideTerms,
}

/// Per-call knobs for one side: the B2B override (wins over the dataset flag
/// when present) and how many key players sit out.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideAdjustments {
    pub b2b_override: Option<bool>,
    pub missing_players: usize,
}

#[derive(Debug, Clone)]
pub struct MatchRating {
    pub home_rating: f64,
    pub away_rating: f64,
    pub home_expected: f64,
    pub away_expected: f64,
    pub volatility: f64,
    pub breakdown: RatingBreakdown,
}

/// Deterministic half of the model: composes both sides' adjusted offensive
/// ratings, turns them into expected scores for the matchup tempo, and blends
/// the two volatility figures.
pub fn match_rating(
    home: &TeamRecord,
    away: &TeamRecord,
    league: LeagueAverages,
    home_adjust: SideAdjustments,
    away_adjust: SideAdjustments,
) -> MatchRating {
    let home_terms = side_terms(home, away, league, true, home_adjust);
    let away_terms = side_terms(away, home, league, false, away_adjust);

    let home_rating = home.ortg + home_terms.rating_adjustment();
    let away_rating = (away.ortg + away_terms.rating_adjustment()) * ROAD_RATING_SCALE;

    let pace = (home.pace + away.pace) / 2.0;
    let home_expected =
        (pace / 100.0) * ((home_rating + away.drtg) / 2.0) + home_terms.home_court_bonus;
    let away_expected = (pace / 100.0) * ((away_rating + home.drtg) / 2.0);

    let volatility = (side_volatility(home) + side_volatility(away)) / 2.0;

    MatchRating {
        home_rating,
        away_rating,
        home_expected,
        away_expected,
        volatility,
        breakdown: RatingBreakdown {
            home: home_terms,
            away: away_terms,
        },
    }
}

fn side_terms(
    record: &TeamRecord,
    opponent: &TeamRecord,
    league: LeagueAverages,
    is_home: bool,
    adjust: SideAdjustments,
) -> SideTerms {
    let home_court_bonus = if is_home {
        HOME_COURT_BASE + HOME_COURT_WIN_RATE_SCALE * win_rate(&record.home)
    } else {
        0.0
    };

    let b2b = adjust.b2b_override.unwrap_or(record.is_b2b);
    let fatigue_penalty = if b2b { B2B_PENALTY } else { 0.0 };

    SideTerms {
        home_court_bonus,
        weighted_form: weighted_form(&record.last_10, &record.streak),
        style_matchup: style_matchup(record, opponent, league),
        net_rating_bonus: record.net_rtg * NET_RTG_SCALE,
        fatigue_penalty,
        missing_player_penalty: adjust.missing_players as f64 * MISSING_PLAYER_PENALTY,
    }
}

/// Recent form as a 70/30 blend of the last-10 record and the current streak.
/// The streak signal is compressed through `ln(1 + n)` so long runs stop
/// compounding, and clamped to +/-2.0.
pub fn weighted_form(last_10: &str, streak: &str) -> f64 {
    let last10_signal = (win_rate(last_10) - 0.5) * LAST10_SCALE;

    let n = streak_value(streak);
    let streak_signal = ((n.abs() as f64).ln_1p() * STREAK_SCALE * f64::from(n.signum()))
        .clamp(-STREAK_CLAMP, STREAK_CLAMP);

    LAST10_WEIGHT * last10_signal + STREAK_WEIGHT * streak_signal
}

/// Offensive profile against the opponent's defensive tendencies. The
/// shooting branch is exclusive; the turnover and rebound checks stack.
fn style_matchup(offense: &TeamRecord, defense: &TeamRecord, league: LeagueAverages) -> f64 {
    let mut bonus = 0.0;

    if offense.off_efg > league.efg && defense.opp_3p_pct > WEAK_PERIMETER_DEFENSE_3P {
        bonus += HOT_SHOOTING_BONUS;
    } else if offense.off_efg < league.efg && defense.opp_3p_pct < STRONG_PERIMETER_DEFENSE_3P {
        bonus += COLD_SHOOTING_PENALTY;
    }

    if offense.off_tov < LOW_TOV_RATE {
        bonus += LOW_TOV_BONUS;
    } else if offense.off_tov > HIGH_TOV_RATE {
        bonus += HIGH_TOV_PENALTY;
    }

    if offense.off_orb > HIGH_ORB_RATE {
        bonus += HIGH_ORB_BONUS;
    }

    bonus
}

// Three-point-heavy offenses swing harder game to game.
fn side_volatility(record: &TeamRecord) -> f64 {
    VOLATILITY_BASE + record.off_3par * VOLATILITY_3PAR_SCALE
}
