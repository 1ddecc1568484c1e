//! ESPN scoreboard sources.
//!
//! * [`EspnScoresSource`] lists in-progress games across several leagues,
//!   optionally restricted to (or tagging) favorite teams.
//! * [`EspnSummarySource`] only counts in-progress games per league.
//!
//! Both fetch one scoreboard per league concurrently.  A league whose fetch
//! fails is dropped; only when every league fails does the tile fall back to
//! a "No data" warning.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;
use tracing::debug;

use super::{DataPoint, DataSource, Options};
use crate::config::SourceDescriptor;
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://site.web.api.espn.com";

/// One scoreboard to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct League {
    /// Uppercased display label, e.g. "NFL".
    pub label: String,
    pub sport: String,
    pub code: String,
}

impl League {
    pub fn new(label: &str, sport: &str, code: &str) -> Self {
        Self {
            label: label.to_uppercase(),
            sport: sport.to_string(),
            code: code.to_string(),
        }
    }

    fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or_default();
        let (sport, code) = (field("sport"), field("league"));
        let label = match field("label") {
            "" if !code.is_empty() => code,
            "" if !sport.is_empty() => sport,
            "" => "league",
            label => label,
        };
        Self::new(label, sport, code)
    }

    fn is_complete(&self) -> bool {
        !self.sport.is_empty() && !self.code.is_empty()
    }

    fn scoreboard_url(&self, base: &str) -> String {
        format!(
            "{}/apis/v2/sports/{}/{}/scoreboard",
            base.trim_end_matches('/'),
            self.sport,
            self.code
        )
    }
}

/// The `all_major` preset.
pub fn all_major() -> Vec<League> {
    vec![
        League::new("NFL", "football", "nfl"),
        League::new("NCAA Football", "football", "college-football"),
        League::new("NBA", "basketball", "nba"),
        League::new("NCAA MBB", "basketball", "mens-college-basketball"),
        League::new("MLB", "baseball", "mlb"),
        League::new("NHL", "hockey", "nhl"),
    ]
}

/// Explicit `leagues` win; otherwise the named `preset` (default `all_major`).
pub fn resolve_leagues(options: &Options) -> Vec<League> {
    if let Some(Value::Array(leagues)) = options.get("leagues") {
        if !leagues.is_empty() {
            return leagues.iter().map(League::from_value).collect();
        }
    }
    match options.str_or("preset", "all_major").as_str() {
        "all_major" => all_major(),
        _ => Vec::new(),
    }
}

/// Favorite teams keyed by lowercased bucket (`all`, league code, or label).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Favorites(HashMap<String, HashSet<String>>);

impl Favorites {
    pub fn from_options(options: &Options) -> Self {
        let mut buckets = HashMap::new();
        if let Some(map) = options.object("favorites") {
            for (key, value) in map {
                let Some(teams) = value.as_array() else { continue };
                let teams = teams
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|t| t.trim().to_lowercase())
                    .collect();
                buckets.insert(key.to_lowercase(), teams);
            }
        }
        Self(buckets)
    }

    /// Union of the catch-all bucket and the league's own buckets.
    pub fn for_league(&self, league: &League) -> HashSet<String> {
        ["all".to_string(), league.code.to_lowercase(), league.label.to_lowercase()]
            .iter()
            .filter_map(|key| self.0.get(key))
            .flatten()
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub abbr: String,
    pub name: String,
    pub score: String,
}

impl Team {
    fn from_competitor(item: &Value) -> Self {
        let team = &item["team"];
        let text = |key: &str| team.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
        let abbr = text("abbreviation")
            .or_else(|| text("shortDisplayName"))
            .or_else(|| text("displayName"));
        let name = text("displayName")
            .or_else(|| text("name"))
            .or(abbr)
            .unwrap_or("TBD");
        let score = match item.get("score") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "0".to_string(),
        };
        Self {
            abbr: abbr.unwrap_or("TBD").to_string(),
            name: name.to_string(),
            score,
        }
    }

    fn is_favorite(&self, favorites: &HashSet<String>) -> bool {
        favorites.contains(&self.abbr.to_lowercase()) || favorites.contains(&self.name.to_lowercase())
    }
}

/// An in-progress game pulled from a scoreboard.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveGame {
    pub away: Team,
    pub home: Team,
    pub detail: String,
    pub last_play: String,
}

impl LiveGame {
    pub fn involves(&self, favorites: &HashSet<String>) -> bool {
        !favorites.is_empty() && (self.home.is_favorite(favorites) || self.away.is_favorite(favorites))
    }

    /// `LABEL: AWAY n @ HOME n (detail) | Last: text [fav]`
    pub fn line(&self, label: &str, favorite: bool) -> String {
        let mut line = format!(
            "{label}: {} {} @ {} {}",
            self.away.abbr, self.away.score, self.home.abbr, self.home.score
        );
        if !self.detail.is_empty() {
            line.push_str(&format!(" ({})", self.detail));
        }
        if !self.last_play.is_empty() {
            line.push_str(&format!(" | Last: {}", self.last_play));
        }
        if favorite {
            line.push_str(" [fav]");
        }
        line
    }
}

/// First competition of each event, keeping only those in progress.
fn in_progress(payload: &Value) -> impl Iterator<Item = &Value> {
    payload["events"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|event| event["competitions"].as_array()?.first())
        .filter(|competition| competition["status"]["type"]["state"].as_str() == Some("in"))
}

/// Live games on a scoreboard.  Competitions missing a side are skipped.
pub fn live_games(payload: &Value) -> Vec<LiveGame> {
    in_progress(payload)
        .filter_map(|competition| {
            let status = &competition["status"]["type"];
            let detail = [&status["shortDetail"], &status["detail"]]
                .into_iter()
                .filter_map(Value::as_str)
                .find(|s| !s.is_empty())
                .unwrap_or_default()
                .to_string();

            let mut home = None;
            let mut away = None;
            for item in competition["competitors"].as_array().into_iter().flatten() {
                match item["homeAway"].as_str() {
                    Some("home") => home = Some(Team::from_competitor(item)),
                    Some("away") => away = Some(Team::from_competitor(item)),
                    _ => {}
                }
            }

            Some(LiveGame {
                away: away?,
                home: home?,
                detail,
                last_play: last_play(competition),
            })
        })
        .collect()
}

fn last_play(competition: &Value) -> String {
    match competition["situation"]["lastPlay"]["text"].as_str() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => competition["lastPlay"]["text"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

/// Display switches for the scores tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteMode {
    pub show_only_favorites: bool,
    pub highlight_favorites: bool,
}

impl FavoriteMode {
    pub fn from_options(options: &Options) -> Self {
        Self {
            show_only_favorites: options.bool_or("show_only_favorites", false),
            highlight_favorites: options.bool_or("highlight_favorites", true),
        }
    }
}

/// Lines for one league's scoreboard.
pub fn render_league(payload: &Value, league: &League, favorites: &HashSet<String>, mode: FavoriteMode) -> Vec<String> {
    live_games(payload)
        .into_iter()
        .filter_map(|game| {
            let favorite = game.involves(favorites);
            if mode.show_only_favorites && !favorite {
                return None;
            }
            Some(game.line(&league.label, mode.highlight_favorites && favorite))
        })
        .collect()
}

async fn fetch_scoreboard(http: &reqwest::Client, base: &str, league: &League) -> Result<Value, SourceError> {
    let payload = http
        .get(league.scoreboard_url(base))
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await?;
    Ok(payload)
}

pub struct EspnScoresSource {
    desc: SourceDescriptor,
    http: reqwest::Client,
}

impl EspnScoresSource {
    pub fn new(desc: SourceDescriptor, http: reqwest::Client) -> Self {
        Self { desc, http }
    }

    async fn league_lines(
        &self,
        base: &str,
        league: &League,
        favorites: &Favorites,
        mode: FavoriteMode,
    ) -> Result<Vec<String>, SourceError> {
        if !league.is_complete() {
            return Ok(vec![format!("{}: missing sport/league config", league.label)]);
        }
        let payload = fetch_scoreboard(&self.http, base, league).await?;
        Ok(render_league(&payload, league, &favorites.for_league(league), mode))
    }
}

#[async_trait]
impl DataSource for EspnScoresSource {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn refresh_interval(&self) -> Duration {
        self.desc.refresh_interval()
    }

    async fn fetch(&mut self) -> Result<DataPoint, SourceError> {
        let options = &self.desc.options;
        let leagues = resolve_leagues(options);
        if leagues.is_empty() {
            return Err(SourceError::config("No leagues configured"));
        }
        let favorites = Favorites::from_options(options);
        let mode = FavoriteMode::from_options(options);
        let base = options.str_or("base_url", DEFAULT_BASE_URL);

        let results = join_all(
            leagues
                .iter()
                .map(|league| self.league_lines(&base, league, &favorites, mode)),
        )
        .await;

        let mut lines = Vec::new();
        let mut any_ok = false;
        for (league, result) in leagues.iter().zip(results) {
            match result {
                Ok(league_lines) => {
                    any_ok = true;
                    lines.extend(league_lines);
                }
                Err(e) => debug!(source = %self.desc.name, league = %league.label, error = %e, "scoreboard fetch failed"),
            }
        }

        if !any_ok {
            return Ok(DataPoint::warn(self.name(), "No data"));
        }
        if lines.is_empty() {
            return Ok(DataPoint::ok(self.name(), "No live games"));
        }
        Ok(DataPoint::ok(self.name(), lines.join("\n")))
    }
}

pub struct EspnSummarySource {
    desc: SourceDescriptor,
    http: reqwest::Client,
}

impl EspnSummarySource {
    pub fn new(desc: SourceDescriptor, http: reqwest::Client) -> Self {
        Self { desc, http }
    }

    async fn count_league(&self, base: &str, league: &League) -> Result<usize, SourceError> {
        if !league.is_complete() {
            return Ok(0);
        }
        let payload = fetch_scoreboard(&self.http, base, league).await?;
        Ok(in_progress(&payload).count())
    }
}

#[async_trait]
impl DataSource for EspnSummarySource {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn refresh_interval(&self) -> Duration {
        self.desc.refresh_interval()
    }

    async fn fetch(&mut self) -> Result<DataPoint, SourceError> {
        let leagues = resolve_leagues(&self.desc.options);
        if leagues.is_empty() {
            return Err(SourceError::config("No leagues configured"));
        }
        let base = self.desc.options.str_or("base_url", DEFAULT_BASE_URL);

        let results = join_all(leagues.iter().map(|league| self.count_league(&base, league))).await;

        let counts: Vec<(&str, usize)> = leagues
            .iter()
            .zip(results)
            .filter_map(|(league, result)| match result {
                Ok(count) => Some((league.label.as_str(), count)),
                Err(e) => {
                    debug!(source = %self.desc.name, league = %league.label, error = %e, "scoreboard fetch failed");
                    None
                }
            })
            .collect();

        if counts.is_empty() {
            return Ok(DataPoint::warn(self.name(), "No data"));
        }

        let total: usize = counts.iter().map(|(_, n)| n).sum();
        let mut lines = vec![format!("Live games: {total}")];
        lines.extend(counts.iter().map(|(label, n)| format!("{label}: {n}")));
        Ok(DataPoint::ok(self.name(), lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Status;
    use serde_json::json;

    fn game(away: (&str, &str), home: (&str, &str), detail: &str) -> Value {
        json!({
            "events": [{
                "competitions": [{
                    "status": { "type": { "state": "in", "shortDetail": detail } },
                    "competitors": [
                        { "homeAway": "away", "score": away.1, "team": { "abbreviation": away.0 } },
                        { "homeAway": "home", "score": home.1, "team": { "abbreviation": home.0 } },
                    ],
                }]
            }]
        })
    }

    fn nfl() -> League {
        League::new("NFL", "football", "nfl")
    }

    fn source(kind: &str, options: Value) -> SourceDescriptor {
        SourceDescriptor::for_test("Live Sports", kind, options)
    }

    #[test]
    fn formats_live_game_line() {
        let payload = game(("DAL", "14"), ("PHI", "21"), "Q3 05:32");
        let mode = FavoriteMode { show_only_favorites: false, highlight_favorites: true };
        let lines = render_league(&payload, &nfl(), &HashSet::new(), mode);
        assert_eq!(lines, vec!["NFL: DAL 14 @ PHI 21 (Q3 05:32)"]);
    }

    #[test]
    fn only_in_progress_competitions_are_listed() {
        let payload = json!({
            "events": [
                { "competitions": [{ "status": { "type": { "state": "post" } } }] },
                { "competitions": [] },
                { "competitions": [{
                    "status": { "type": { "state": "in", "detail": "2nd 4:00" } },
                    "competitors": [
                        { "homeAway": "away", "score": 3, "team": { "displayName": "Boston Celtics" } },
                        { "homeAway": "home", "team": { "abbreviation": "NYK" } },
                    ],
                    "lastPlay": { "text": " Tatum three " },
                }] },
            ]
        });
        let games = live_games(&payload);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].away.abbr, "Boston Celtics");
        assert_eq!(games[0].home.score, "0");
        assert_eq!(
            games[0].line("NBA", false),
            "NBA: Boston Celtics 3 @ NYK 0 (2nd 4:00) | Last: Tatum three"
        );
    }

    #[test]
    fn favorites_only_hides_other_games() {
        let payload = game(("NYJ", "0"), ("NE", "3"), "Q1 10:00");
        let options = Options::from_json(json!({ "favorites": { "nfl": ["DAL"] }, "show_only_favorites": true }));
        let favs = Favorites::from_options(&options).for_league(&nfl());
        let lines = render_league(&payload, &nfl(), &favs, FavoriteMode::from_options(&options));
        assert!(lines.is_empty());
    }

    #[test]
    fn favorite_tag_matches_case_insensitively_via_all_bucket() {
        let mut payload = game(("DAL", "14"), ("PHI", "21"), "Q3 05:32");
        payload["events"][0]["competitions"][0]["competitors"][1]["team"]["displayName"] =
            json!("Philadelphia Eagles");
        let options = Options::from_json(json!({ "favorites": { "ALL": ["philadelphia eagles"] } }));
        let favs = Favorites::from_options(&options).for_league(&nfl());
        let lines = render_league(&payload, &nfl(), &favs, FavoriteMode::from_options(&options));
        assert_eq!(lines, vec!["NFL: DAL 14 @ PHI 21 (Q3 05:32) [fav]"]);
    }

    #[test]
    fn favorites_are_scoped_to_their_league() {
        let options = Options::from_json(json!({ "favorites": { "nba": ["dal"], "nfl": ["phi"] } }));
        let favs = Favorites::from_options(&options).for_league(&nfl());
        assert!(favs.contains("phi"));
        assert!(!favs.contains("dal"));
    }

    #[test]
    fn leagues_default_to_all_major_preset() {
        assert_eq!(resolve_leagues(&Options::default()).len(), 6);
        assert!(resolve_leagues(&Options::from_json(json!({ "preset": "nope" }))).is_empty());

        let explicit = resolve_leagues(&Options::from_json(json!({ "leagues": [{ "league": "nhl" }] })));
        assert_eq!(explicit, vec![League::new("NHL", "", "nhl")]);
    }

    #[tokio::test]
    async fn scores_from_live_scoreboard() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/apis/v2/sports/football/nfl/scoreboard")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(game(("DAL", "14"), ("PHI", "21"), "Q3 05:32").to_string())
            .create_async()
            .await;

        let mut src = EspnScoresSource::new(
            source(
                "espn_scores",
                json!({
                    "base_url": server.url(),
                    "leagues": [{ "label": "NFL", "sport": "football", "league": "nfl" }],
                }),
            ),
            reqwest::Client::new(),
        );
        let point = src.produce().await;
        assert_eq!(point.status, Status::Ok);
        assert_eq!(point.value, "NFL: DAL 14 @ PHI 21 (Q3 05:32)");
    }

    #[tokio::test]
    async fn favorites_filter_reports_no_live_games() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/apis/v2/sports/football/nfl/scoreboard")
            .with_status(200)
            .with_body(game(("NYJ", "0"), ("NE", "3"), "Q1 10:00").to_string())
            .create_async()
            .await;

        let mut src = EspnScoresSource::new(
            source(
                "espn_scores",
                json!({
                    "base_url": server.url(),
                    "leagues": [{ "label": "NFL", "sport": "football", "league": "nfl" }],
                    "favorites": { "nfl": ["DAL"] },
                    "show_only_favorites": true,
                }),
            ),
            reqwest::Client::new(),
        );
        let point = src.produce().await;
        assert_eq!(point.status, Status::Ok);
        assert_eq!(point.value, "No live games");
    }

    #[tokio::test]
    async fn failing_league_is_dropped_and_incomplete_league_reported() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/apis/v2/sports/football/nfl/scoreboard")
            .with_status(200)
            .with_body(game(("DAL", "14"), ("PHI", "21"), "").to_string())
            .create_async()
            .await;
        let _bad = server
            .mock("GET", "/apis/v2/sports/hockey/nhl/scoreboard")
            .with_status(500)
            .create_async()
            .await;

        let mut src = EspnScoresSource::new(
            source(
                "espn_scores",
                json!({
                    "base_url": server.url(),
                    "leagues": [
                        { "label": "NFL", "sport": "football", "league": "nfl" },
                        { "label": "NHL", "sport": "hockey", "league": "nhl" },
                        { "label": "xfl" },
                    ],
                }),
            ),
            reqwest::Client::new(),
        );
        let point = src.produce().await;
        assert_eq!(point.value, "NFL: DAL 14 @ PHI 21\nXFL: missing sport/league config");
    }

    #[tokio::test]
    async fn every_league_failing_is_no_data_warning() {
        let mut server = mockito::Server::new_async().await;
        let _bad = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let mut src = EspnScoresSource::new(
            source("espn_scores", json!({ "base_url": server.url() })),
            reqwest::Client::new(),
        );
        let point = src.produce().await;
        assert_eq!(point.status, Status::Warn);
        assert_eq!(point.value, "No data");
    }

    #[tokio::test]
    async fn no_leagues_is_config_error() {
        let mut src = EspnScoresSource::new(
            source("espn_scores", json!({ "preset": "none" })),
            reqwest::Client::new(),
        );
        let point = src.produce().await;
        assert_eq!(point.status, Status::Error);
        assert_eq!(point.value, "No leagues configured");
    }

    #[tokio::test]
    async fn summary_counts_live_games() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/apis/v2/sports/football/nfl/scoreboard")
            .with_status(200)
            .with_body(
                json!({
                    "events": [
                        { "competitions": [{ "status": { "type": { "state": "in" } } }] },
                        { "competitions": [{ "status": { "type": { "state": "post" } } }] },
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut src = EspnSummarySource::new(
            SourceDescriptor::for_test(
                "Summary",
                "espn_summary",
                json!({
                    "base_url": server.url(),
                    "leagues": [{ "label": "NFL", "sport": "football", "league": "nfl" }],
                }),
            ),
            reqwest::Client::new(),
        );
        let point = src.produce().await;
        assert_eq!(point.status, Status::Ok);
        assert_eq!(point.value, "Live games: 1\nNFL: 1");
    }

    #[tokio::test]
    async fn summary_every_league_failing_is_no_data() {
        let mut server = mockito::Server::new_async().await;
        let _bad = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let mut src = EspnSummarySource::new(
            SourceDescriptor::for_test("Summary", "espn_summary", json!({ "base_url": server.url() })),
            reqwest::Client::new(),
        );
        let point = src.produce().await;
        assert_eq!(point.status, Status::Warn);
        assert_eq!(point.value, "No data");
    }

    #[test]
    fn situation_last_play_wins_and_only_first_competition_counts() {
        let live = |away: &str, home: &str| {
            json!({
                "status": { "type": { "state": "in" } },
                "competitors": [
                    { "homeAway": "away", "team": { "abbreviation": away } },
                    { "homeAway": "home", "team": { "abbreviation": home } },
                ],
                "situation": { "lastPlay": { "text": "TD" } },
                "lastPlay": { "text": "old" },
            })
        };
        let payload = json!({ "events": [{ "competitions": [live("A", "H"), live("X", "Y")] }] });

        let mode = FavoriteMode { show_only_favorites: false, highlight_favorites: true };
        let lines = render_league(&payload, &League::new("L", "s", "l"), &HashSet::new(), mode);
        assert_eq!(lines, vec!["L: A 0 @ H 0 | Last: TD"]);
        assert_eq!(in_progress(&payload).count(), 1);
    }
}
