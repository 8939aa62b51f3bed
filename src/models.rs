use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// The backend mixes numeric and string ids depending on the store behind a route.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn lenient_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn lenient_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conference {
    East,
    West,
}

impl Conference {
    pub fn as_param(self) -> &'static str {
        match self {
            Conference::East => "EAST",
            Conference::West => "WEST",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Conference::East => "Eastern Conference",
            Conference::West => "Western Conference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Guard,
    Forward,
    Center,
}

impl Position {
    pub fn as_param(self) -> &'static str {
        match self {
            Position::Guard => "G",
            Position::Forward => "F",
            Position::Center => "C",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::Guard => "Guard",
            Position::Forward => "Forward",
            Position::Center => "Center",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteKind {
    Teams,
    Players,
}

impl FavoriteKind {
    pub fn as_segment(self) -> &'static str {
        match self {
            FavoriteKind::Teams => "teams",
            FavoriteKind::Players => "players",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            FavoriteKind::Teams => "Team",
            FavoriteKind::Players => "Player",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "team" | "teams" => Some(FavoriteKind::Teams),
            "player" | "players" => Some(FavoriteKind::Players),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub team_name: String,
    #[serde(default)]
    pub conference: String,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub games_behind: f32,
    #[serde(default)]
    pub conf_record: String,
    #[serde(default)]
    pub home_record: String,
    #[serde(default)]
    pub away_record: String,
    #[serde(default)]
    pub last_10: String,
    #[serde(default)]
    pub streak: String,
}

impl Team {
    pub fn record(&self) -> String {
        format!("{}-{}", self.wins, self.losses)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTeam {
    #[serde(deserialize_with = "lenient_id")]
    pub team_id: String,
    pub team_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(deserialize_with = "lenient_id")]
    pub player_id: String,
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub season_stats: String,
    #[serde(default)]
    pub current_team: Option<PlayerTeam>,
}

impl Player {
    pub fn team_label(&self) -> &str {
        self.current_team
            .as_ref()
            .map(|t| t.team_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Free Agent")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(deserialize_with = "lenient_id")]
    pub game_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub team1_id: Option<String>,
    #[serde(default)]
    pub team1_name: String,
    #[serde(default)]
    pub team1_score: i32,
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub team2_id: Option<String>,
    #[serde(default)]
    pub team2_name: String,
    #[serde(default)]
    pub team2_score: i32,
    #[serde(default)]
    pub highlight_video_link: Option<String>,
}

impl Game {
    pub fn is_final(&self) -> bool {
        self.stage.eq_ignore_ascii_case("FINAL")
    }

    pub fn matchup(&self) -> String {
        format!("{} vs {}", self.team1_name, self.team2_name)
    }

    pub fn score(&self) -> String {
        format!("{}-{}", self.team1_score, self.team2_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    pub highlight_video_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HeadToHead {
    #[serde(default)]
    pub total_games: u32,
    #[serde(default)]
    pub team1_wins: u32,
    #[serde(default)]
    pub team2_wins: u32,
    #[serde(default)]
    pub avg_score_team1: f32,
    #[serde(default)]
    pub avg_score_team2: f32,
    /// Up to five of the most recent meetings, from team 1's side.
    #[serde(default)]
    pub last_games: Vec<PerformanceGame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceGame {
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub game_id: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub opponent_team_name: String,
    #[serde(default)]
    pub team_score: i32,
    #[serde(default)]
    pub opponent_score: i32,
}

impl PerformanceGame {
    pub fn result_label(&self) -> &'static str {
        match self.team_score.cmp(&self.opponent_score) {
            std::cmp::Ordering::Greater => "W",
            std::cmp::Ordering::Less => "L",
            std::cmp::Ordering::Equal => "T",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default, deserialize_with = "lenient_id_list")]
    pub favorite_teams: Vec<String>,
    #[serde(default, deserialize_with = "lenient_id_list")]
    pub favorite_players: Vec<String>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "bearer_type")]
    pub token_type: String,
}

fn bearer_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Partial profile edit; unset fields are left out of the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Accepts the timestamp shapes the backend emits (RFC 3339, naive ISO, plain date).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
