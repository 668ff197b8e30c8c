use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LEAGUE_AVG_EFG: f64 = 0.54;
pub const DEFAULT_LEAGUE_AVG_TOV: f64 = 13.0;

const DEFAULT_PACE: f64 = 99.0;
const DEFAULT_ORTG: f64 = 110.0;
const DEFAULT_DRTG: f64 = 110.0;
const DEFAULT_OFF_EFG: f64 = 0.54;
const DEFAULT_OFF_TOV: f64 = 13.0;
const DEFAULT_OFF_ORB: f64 = 24.0;
const DEFAULT_OFF_3PAR: f64 = 0.39;
const DEFAULT_OPP_3P_PCT: f64 = 0.36;

/// One season-stats row per team, validated and defaulted once at load time.
/// Record strings (`home`, `road`, `last_10`, `streak`) keep their raw "W-L"
/// form; `win_rate` and `streak_value` turn them into model inputs.
#[derive(Debug, Clone, Serialize)]
pub struct TeamRecord {
    pub team: String,
    pub pace: f64,
    pub ortg: f64,
    pub drtg: f64,
    pub off_efg: f64,
    pub off_tov: f64,
    pub off_orb: f64,
    pub off_3par: f64,
    pub net_rtg: f64,
    pub opp_3p_pct: f64,
    pub home: String,
    pub road: String,
    pub last_10: String,
    pub streak: String,
    pub top_stars: String,
    pub is_b2b: bool,
}

impl TeamRecord {
    /// Key players as a cleaned list; the raw field is a comma-separated blob.
    pub fn star_players(&self) -> Vec<String> {
        self.top_stars
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn from_raw(raw: RawTeamRow) -> Option<Self> {
        let team = raw.team.trim().to_string();
        if team.is_empty() {
            return None;
        }
        Some(Self {
            team,
            pace: parse_f64(&raw.pace, DEFAULT_PACE),
            ortg: parse_f64(&raw.ortg, DEFAULT_ORTG),
            drtg: parse_f64(&raw.drtg, DEFAULT_DRTG),
            off_efg: parse_f64(&raw.off_efg, DEFAULT_OFF_EFG),
            off_tov: parse_f64(&raw.off_tov, DEFAULT_OFF_TOV),
            off_orb: parse_f64(&raw.off_orb, DEFAULT_OFF_ORB),
            off_3par: parse_f64(&raw.off_3par, DEFAULT_OFF_3PAR),
            net_rtg: parse_f64(&raw.net_rtg, 0.0),
            opp_3p_pct: parse_f64(&raw.opp_3p_pct, DEFAULT_OPP_3P_PCT),
            home: raw.home.unwrap_or_else(|| "0-0".to_string()),
            road: raw.road.unwrap_or_else(|| "0-0".to_string()),
            last_10: raw.last_10.unwrap_or_else(|| "0-0".to_string()),
            streak: raw.streak.unwrap_or_default(),
            top_stars: raw.top_stars.unwrap_or_default(),
            is_b2b: parse_bool(&raw.is_b2b),
        })
    }
}

/// Snapshot rows exactly as the CSV carries them. Every column is optional so
/// a missing header or a blank cell never fails the load; the conversion into
/// `TeamRecord` applies the documented per-field defaults.
#[derive(Debug, Clone, Deserialize)]
struct RawTeamRow {
    #[serde(default, rename = "Team")]
    team: String,
    #[serde(default, rename = "Pace")]
    pace: Option<String>,
    #[serde(default, rename = "ORtg")]
    ortg: Option<String>,
    #[serde(default, rename = "DRtg")]
    drtg: Option<String>,
    #[serde(default, rename = "Off_eFG")]
    off_efg: Option<String>,
    #[serde(default, rename = "Off_TOV")]
    off_tov: Option<String>,
    #[serde(default, rename = "Off_ORB")]
    off_orb: Option<String>,
    #[serde(default, rename = "Off_3PAr")]
    off_3par: Option<String>,
    #[serde(default, rename = "Net_Rtg")]
    net_rtg: Option<String>,
    #[serde(default, rename = "Opp_3P_Pct")]
    opp_3p_pct: Option<String>,
    #[serde(default, rename = "Home")]
    home: Option<String>,
    #[serde(default, rename = "Road")]
    road: Option<String>,
    #[serde(default, rename = "Last_10")]
    last_10: Option<String>,
    #[serde(default, rename = "Streak")]
    streak: Option<String>,
    #[serde(default, rename = "Top_Stars")]
    top_stars: Option<String>,
    #[serde(default, rename = "Is_B2B")]
    is_b2b: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct LeagueAverages {
    pub efg: f64,
    pub tov: f64,
}

/// Immutable, indexed view of the team snapshot. Reloading means building a
/// new dataset and swapping the binding, so callers never see a partial load.
#[derive(Debug, Clone)]
pub struct TeamDataset {
    rows: Vec<TeamRecord>,
    index: HashMap<String, usize>,
    league_avg_efg: f64,
    league_avg_tov: f64,
}

impl TeamDataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("open team snapshot {}", path.display()))?;
        Self::from_csv(reader)
    }

    pub fn load_from_reader(source: impl Read) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let mut rows: Vec<TeamRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in reader.deserialize::<RawTeamRow>() {
            let raw = row.context("parse team snapshot row")?;
            let Some(record) = TeamRecord::from_raw(raw) else {
                continue;
            };
            // First occurrence wins on duplicate identifiers.
            if index.contains_key(&record.team) {
                continue;
            }
            index.insert(record.team.clone(), rows.len());
            rows.push(record);
        }

        rows.sort_by(|a, b| a.team.cmp(&b.team));
        index.clear();
        for (pos, record) in rows.iter().enumerate() {
            index.insert(record.team.clone(), pos);
        }

        let (league_avg_efg, league_avg_tov) = if rows.is_empty() {
            (DEFAULT_LEAGUE_AVG_EFG, DEFAULT_LEAGUE_AVG_TOV)
        } else {
            let n = rows.len() as f64;
            (
                rows.iter().map(|r| r.off_efg).sum::<f64>() / n,
                rows.iter().map(|r| r.off_tov).sum::<f64>() / n,
            )
        };

        Ok(Self {
            rows,
            index,
            league_avg_efg,
            league_avg_tov,
        })
    }

    /// Exact, case-sensitive lookup.
    pub fn get_team(&self, name: &str) -> Option<&TeamRecord> {
        self.index.get(name).map(|&pos| &self.rows[pos])
    }

    /// Distinct identifiers in lexicographic order.
    pub fn list_teams(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.team.as_str()).collect()
    }

    pub fn league_averages(&self) -> LeagueAverages {
        LeagueAverages {
            efg: self.league_avg_efg,
            tov: self.league_avg_tov,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_f64(raw: &Option<String>, default: f64) -> f64 {
    raw.as_deref()
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(default)
}

fn parse_bool(raw: &Option<String>) -> bool {
    raw.as_deref().is_some_and(|s| {
        matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        )
    })
}

/// Win rate from a "W-L" record string. A record with zero games, or one that
/// does not parse at all, counts as an even 0.5.
pub fn win_rate(record: &str) -> f64 {
    let mut parts = record.trim().splitn(2, '-');
    let (Some(w), Some(l)) = (parts.next(), parts.next()) else {
        return 0.5;
    };
    let (Ok(w), Ok(l)) = (w.trim().parse::<u32>(), l.trim().parse::<u32>()) else {
        return 0.5;
    };
    let games = w + l;
    if games == 0 {
        return 0.5;
    }
    f64::from(w) / f64::from(games)
}

/// Signed streak length: "W5" -> 5, "L3" -> -3, anything else -> 0.
pub fn streak_value(streak: &str) -> i32 {
    let s = streak.trim().to_ascii_uppercase();
    let Some(magnitude) = s.get(1..).and_then(|m| m.trim().parse::<i32>().ok()) else {
        return 0;
    };
    match s.as_bytes().first() {
        Some(b'W') => magnitude,
        Some(b'L') => -magnitude,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = "\
Team,Pace,ORtg,DRtg,Off_eFG,Off_TOV,Off_ORB,Off_3PAr,Net_Rtg,Opp_3P_Pct,Home,Road,Last_10,Streak,Top_Stars,Is_B2B
Boston Celtics,98.5,118.0,110.5,0.58,12.1,25.0,0.44,7.5,0.352,18-3,15-6,8-2,W4,\"Jayson Tatum, \",true
 Atlanta Hawks ,101.2,114.0,116.0,0.55,13.5,26.0,0.41,-2.0,0.368,12-9,9-12,4-6,L2,\"Trae Young, Jalen Johnson\",false
Boston Celtics,1.0,1.0,1.0,0.1,1.0,1.0,0.1,0.0,0.1,0-0,0-0,0-0,,,false
,100.0,110.0,110.0,0.54,13.0,24.0,0.39,0.0,0.36,0-0,0-0,0-0,,,false
Chicago Bulls,abc,xyz,,not-a-number,,,,,,5-5,bad,garbage,??,,maybe
";

    fn dataset() -> TeamDataset {
        TeamDataset::load_from_reader(SNAPSHOT.as_bytes()).expect("snapshot parses")
    }

    #[test]
    fn win_rate_parses_records() {
        assert_eq!(win_rate("7-3"), 0.7);
        assert_eq!(win_rate("0-0"), 0.5);
        assert_eq!(win_rate("10-0"), 1.0);
        assert_eq!(win_rate("abc"), 0.5);
        assert_eq!(win_rate(""), 0.5);
        assert_eq!(win_rate("3-abc"), 0.5);
    }

    #[test]
    fn streak_value_parses_sign_and_magnitude() {
        assert_eq!(streak_value("W5"), 5);
        assert_eq!(streak_value("L3"), -3);
        assert_eq!(streak_value("w2"), 2);
        assert_eq!(streak_value(""), 0);
        assert_eq!(streak_value("X4"), 0);
        assert_eq!(streak_value("W"), 0);
    }

    #[test]
    fn load_trims_dedups_and_sorts() {
        let ds = dataset();
        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.list_teams(),
            vec!["Atlanta Hawks", "Boston Celtics", "Chicago Bulls"]
        );
        // First occurrence wins for the duplicated Celtics row.
        let celtics = ds.get_team("Boston Celtics").unwrap();
        assert_eq!(celtics.ortg, 118.0);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let ds = dataset();
        assert!(ds.get_team("Atlanta Hawks").is_some());
        assert!(ds.get_team("atlanta hawks").is_none());
        assert!(ds.get_team("Denver Nuggets").is_none());
    }

    #[test]
    fn malformed_cells_fall_back_to_defaults() {
        let ds = dataset();
        let bulls = ds.get_team("Chicago Bulls").unwrap();
        assert_eq!(bulls.pace, DEFAULT_PACE);
        assert_eq!(bulls.ortg, DEFAULT_ORTG);
        assert_eq!(bulls.drtg, DEFAULT_DRTG);
        assert_eq!(bulls.off_efg, DEFAULT_OFF_EFG);
        assert_eq!(bulls.off_3par, DEFAULT_OFF_3PAR);
        assert!(!bulls.is_b2b);
        assert_eq!(win_rate(&bulls.road), 0.5);
        assert_eq!(streak_value(&bulls.streak), 0);
    }

    #[test]
    fn missing_optional_columns_are_backfilled() {
        let ds = TeamDataset::load_from_reader("Team,ORtg\nDenver Nuggets,119.2\n".as_bytes())
            .expect("partial schema parses");
        let nuggets = ds.get_team("Denver Nuggets").unwrap();
        assert_eq!(nuggets.ortg, 119.2);
        assert_eq!(nuggets.pace, DEFAULT_PACE);
        assert_eq!(nuggets.home, "0-0");
        assert_eq!(nuggets.last_10, "0-0");
        assert_eq!(nuggets.streak, "");
        assert!(!nuggets.is_b2b);
    }

    #[test]
    fn league_averages_are_means_with_empty_fallback() {
        let ds = dataset();
        let avg = ds.league_averages();
        let want_efg = (0.58 + 0.55 + DEFAULT_OFF_EFG) / 3.0;
        let want_tov = (12.1 + 13.5 + DEFAULT_OFF_TOV) / 3.0;
        assert!((avg.efg - want_efg).abs() < 1e-12);
        assert!((avg.tov - want_tov).abs() < 1e-12);

        let empty = TeamDataset::load_from_reader("Team,ORtg\n".as_bytes()).unwrap();
        assert!(empty.is_empty());
        let avg = empty.league_averages();
        assert_eq!(avg.efg, DEFAULT_LEAGUE_AVG_EFG);
        assert_eq!(avg.tov, DEFAULT_LEAGUE_AVG_TOV);
    }

    #[test]
    fn star_players_splits_and_cleans() {
        let ds = dataset();
        let hawks = ds.get_team("Atlanta Hawks").unwrap();
        assert_eq!(hawks.star_players(), vec!["Trae Young", "Jalen Johnson"]);
        let celtics = ds.get_team("Boston Celtics").unwrap();
        assert_eq!(celtics.star_players(), vec!["Jayson Tatum"]);
    }

    #[test]
    fn missing_file_fails_load() {
        assert!(TeamDataset::load("does/not/exist.csv").is_err());
    }
}
