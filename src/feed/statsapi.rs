// MLB StatsAPI client.
//
// Payload structs mirror only the fields the scoreboard needs, and every
// one of them is defaulted: a missing or malformed field deserializes to
// its neutral value and diffs as "no change" downstream, instead of
// failing the whole fetch.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Feed, FeedError};
use crate::model::{
    Base, BaseOccupancy, GameRef, Half, LineTotals, Phase, Snapshot, TeamLine,
};

const DEFAULT_BASE_URL: &str = "https://statsapi.mlb.com";
const USER_AGENT: &str = "scorecast/0.1";
const REQUEST_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// Schedule payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SchedulePayload {
    #[serde(default)]
    dates: Vec<ScheduleDate>,
}

#[derive(Debug, Deserialize)]
struct ScheduleDate {
    #[serde(default)]
    games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
struct ScheduleGame {
    #[serde(rename = "gamePk", default)]
    game_pk: Option<u64>,
    #[serde(rename = "gameDate", default)]
    game_date: Option<String>,
    #[serde(default)]
    status: StatusPayload,
    #[serde(default)]
    teams: ScheduleTeams,
}

#[derive(Debug, Default, Deserialize)]
struct StatusPayload {
    #[serde(rename = "abstractGameState", default)]
    abstract_state: Option<String>,
    #[serde(rename = "detailedState", default)]
    detailed_state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleTeams {
    #[serde(default)]
    away: ScheduleSide,
    #[serde(default)]
    home: ScheduleSide,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleSide {
    #[serde(default)]
    team: TeamPayload,
}

#[derive(Debug, Default, Deserialize)]
struct TeamPayload {
    #[serde(default)]
    name: Option<String>,
}

// ---------------------------------------------------------------------------
// Live feed payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct LiveFeedPayload {
    #[serde(rename = "gameData", default)]
    game_data: GameData,
    #[serde(rename = "liveData", default)]
    live_data: LiveData,
}

#[derive(Debug, Default, Deserialize)]
struct GameData {
    #[serde(default)]
    status: StatusPayload,
    #[serde(default)]
    teams: GameDataTeams,
}

#[derive(Debug, Default, Deserialize)]
struct GameDataTeams {
    #[serde(default)]
    away: TeamPayload,
    #[serde(default)]
    home: TeamPayload,
}

#[derive(Debug, Default, Deserialize)]
struct LiveData {
    #[serde(default)]
    linescore: Linescore,
    #[serde(default)]
    plays: Plays,
}

#[derive(Debug, Default, Deserialize)]
struct Linescore {
    #[serde(rename = "currentInning", default)]
    current_inning: Option<u8>,
    #[serde(rename = "isTopInning", default)]
    is_top_inning: Option<bool>,
    #[serde(default)]
    outs: Option<u8>,
    #[serde(default)]
    innings: Vec<InningLine>,
    #[serde(default)]
    teams: LinescoreTeams,
    #[serde(default)]
    offense: Offense,
}

#[derive(Debug, Default, Deserialize)]
struct InningLine {
    #[serde(default)]
    away: InningSide,
    #[serde(default)]
    home: InningSide,
}

#[derive(Debug, Default, Deserialize)]
struct InningSide {
    #[serde(default)]
    runs: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LinescoreTeams {
    #[serde(default)]
    away: SideTotals,
    #[serde(default)]
    home: SideTotals,
}

#[derive(Debug, Default, Deserialize)]
struct SideTotals {
    #[serde(default)]
    runs: Option<u32>,
    #[serde(default)]
    hits: Option<u32>,
    #[serde(default)]
    errors: Option<u32>,
}

/// Base occupancy: StatsAPI reports a runner object per occupied base.
#[derive(Debug, Default, Deserialize)]
struct Offense {
    #[serde(default)]
    first: Option<RunnerPayload>,
    #[serde(default)]
    second: Option<RunnerPayload>,
    #[serde(default)]
    third: Option<RunnerPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct RunnerPayload {
    #[serde(rename = "fullName", default)]
    #[allow(dead_code)]
    full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Plays {
    #[serde(rename = "currentPlay", default)]
    current_play: CurrentPlay,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentPlay {
    #[serde(default)]
    count: CountPayload,
    #[serde(default)]
    matchup: MatchupPayload,
}

#[derive(Debug, Default, Deserialize)]
struct CountPayload {
    #[serde(default)]
    balls: Option<u8>,
    #[serde(default)]
    strikes: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchupPayload {
    #[serde(default)]
    batter: Option<PersonPayload>,
    #[serde(default)]
    pitcher: Option<PersonPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct PersonPayload {
    #[serde(rename = "fullName", default)]
    full_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Payload -> model conversion (pure, unit-tested)
// ---------------------------------------------------------------------------

fn phase_from_status(status: &StatusPayload) -> Phase {
    if let Some(state) = status.abstract_state.as_deref() {
        return match state {
            "Live" => Phase::Live,
            "Final" => Phase::Finished,
            _ => Phase::Scheduled,
        };
    }
    match status.detailed_state.as_deref() {
        Some("In Progress") => Phase::Live,
        Some("Final") | Some("Game Over") => Phase::Finished,
        _ => Phase::Scheduled,
    }
}

fn game_ref_from_payload(game: &ScheduleGame) -> Option<GameRef> {
    let game_id = game.game_pk?;
    let raw_date = game.game_date.as_deref()?;
    let start_time = DateTime::parse_from_rfc3339(raw_date)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()?;
    Some(GameRef {
        game_id,
        start_time,
        phase: phase_from_status(&game.status),
        away: game.teams.away.team.name.clone().unwrap_or_default(),
        home: game.teams.home.team.name.clone().unwrap_or_default(),
    })
}

fn schedule_from_payload(payload: SchedulePayload) -> Vec<GameRef> {
    let mut games: Vec<GameRef> = payload
        .dates
        .iter()
        .flat_map(|d| d.games.iter())
        .filter_map(game_ref_from_payload)
        .collect();
    games.sort_by_key(|g| g.start_time);
    games
}

fn team_line(name: Option<String>, totals: &SideTotals, innings: Vec<Option<u32>>) -> TeamLine {
    TeamLine {
        name: name.unwrap_or_default(),
        innings,
        totals: LineTotals {
            runs: totals.runs.unwrap_or(0),
            hits: totals.hits.unwrap_or(0),
            errors: totals.errors.unwrap_or(0),
        },
    }
}

fn snapshot_from_payload(game_id: u64, payload: LiveFeedPayload) -> Snapshot {
    let linescore = &payload.live_data.linescore;
    let play = &payload.live_data.plays.current_play;

    let half = match linescore.is_top_inning {
        Some(false) => Half::Bottom,
        _ => Half::Top,
    };

    let away_name = payload.game_data.teams.away.name.clone();
    let home_name = payload.game_data.teams.home.name.clone();
    let batting = match half {
        Half::Top => away_name.clone(),
        Half::Bottom => home_name.clone(),
    };

    let occupancy = |runner: &Option<RunnerPayload>| match runner {
        Some(_) => BaseOccupancy {
            occupied: true,
            team: batting.clone(),
        },
        None => BaseOccupancy::empty(),
    };
    let mut bases: [BaseOccupancy; 3] = Default::default();
    bases[Base::First.index()] = occupancy(&linescore.offense.first);
    bases[Base::Second.index()] = occupancy(&linescore.offense.second);
    bases[Base::Third.index()] = occupancy(&linescore.offense.third);

    let away_innings = linescore.innings.iter().map(|i| i.away.runs).collect();
    let home_innings = linescore.innings.iter().map(|i| i.home.runs).collect();

    Snapshot {
        game_id,
        status: payload
            .game_data
            .status
            .detailed_state
            .clone()
            .unwrap_or_default(),
        inning: linescore.current_inning.unwrap_or(1),
        half,
        balls: play.count.balls.unwrap_or(0),
        strikes: play.count.strikes.unwrap_or(0),
        outs: linescore.outs.unwrap_or(0),
        bases,
        batter: play
            .matchup
            .batter
            .as_ref()
            .and_then(|p| p.full_name.clone()),
        pitcher: play
            .matchup
            .pitcher
            .as_ref()
            .and_then(|p| p.full_name.clone()),
        away: team_line(away_name, &linescore.teams.away, away_innings),
        home: team_line(home_name, &linescore.teams.home, home_innings),
    }
}

// ---------------------------------------------------------------------------
// StatsApiFeed
// ---------------------------------------------------------------------------

/// HTTP client against the MLB StatsAPI.
pub struct StatsApiFeed {
    http: reqwest::Client,
    base_url: String,
}

impl StatsApiFeed {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point at an alternate host (exercised by offline test doubles).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        StatsApiFeed {
            http,
            base_url: base_url.into(),
        }
    }
}

impl Default for StatsApiFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Feed for StatsApiFeed {
    async fn fetch_schedule(
        &self,
        team_id: u32,
        lookahead_days: u32,
    ) -> Result<Vec<GameRef>, FeedError> {
        let today = Utc::now().date_naive();
        let start = today - Duration::days(1);
        let end = today + Duration::days(i64::from(lookahead_days));

        let url = format!("{}/api/v1/schedule", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("sportId", "1".to_string()),
                ("teamId", team_id.to_string()),
                ("startDate", start.format("%Y-%m-%d").to_string()),
                ("endDate", end.format("%Y-%m-%d").to_string()),
                ("hydrate", "team,linescore".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let payload: SchedulePayload = response.json().await?;
        let games = schedule_from_payload(payload);
        debug!(count = games.len(), team_id, "fetched schedule");
        if games.is_empty() {
            warn!(team_id, "schedule fetch returned no games");
        }
        Ok(games)
    }

    async fn fetch_snapshot(&self, game_id: u64) -> Result<Snapshot, FeedError> {
        let url = format!("{}/api/v1.1/game/{game_id}/feed/live", self.base_url);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let payload: LiveFeedPayload = response.json().await?;
        Ok(snapshot_from_payload(game_id, payload))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
