use std::fs;
use std::path::PathBuf;

use hoops_terminal::fetch::sort_notifications;
use hoops_terminal::models::{
    Game, HeadToHead, Notification, PerformanceGame, Player, Team, UserProfile,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_standings_fixture() {
    let raw = read_fixture("standings.json");
    let teams: Vec<Team> = serde_json::from_str(&raw).expect("fixture should parse");
    assert_eq!(teams.len(), 6);
    assert_eq!(teams[0].id, "1");
    assert_eq!(teams[2].id, "3");
    assert_eq!(teams[2].team_name, "Los Angeles Lakers");
    assert_eq!(teams[2].record(), "47-35");
    assert_eq!(teams[2].games_behind, 10.0);
    assert_eq!(teams[3].streak, "L2");
}

#[test]
fn parses_players_fixture() {
    let raw = read_fixture("players.json");
    let players: Vec<Player> = serde_json::from_str(&raw).expect("fixture should parse");
    assert_eq!(players.len(), 4);
    assert_eq!(players[0].player_id, "23");
    assert_eq!(players[0].team_label(), "Los Angeles Lakers");
    assert_eq!(
        players[1].current_team.as_ref().map(|t| t.team_id.as_str()),
        Some("3")
    );
    assert_eq!(players[2].player_id, "0");
    assert_eq!(players[3].team_label(), "Free Agent");
    assert_eq!(players[3].season_stats, "");
}

#[test]
fn parses_games_fixture() {
    let raw = read_fixture("games.json");
    let games: Vec<Game> = serde_json::from_str(&raw).expect("fixture should parse");
    assert_eq!(games.len(), 3);
    assert!(games[0].is_final());
    assert_eq!(games[0].score(), "112-104");
    assert_eq!(games[0].team1_id.as_deref(), Some("3"));
    assert!(!games[1].is_final());
    assert_eq!(games[1].game_id, "102");
    assert_eq!(games[2].team1_id, None);
    assert_eq!(games[2].score(), "0-0");
    assert_eq!(games[2].matchup(), "Milwaukee Bucks vs Denver Nuggets");
}

#[test]
fn parses_profile_with_mixed_favorite_ids() {
    let raw = read_fixture("me.json");
    let user: UserProfile = serde_json::from_str(&raw).expect("fixture should parse");
    assert_eq!(user.username, "courtside");
    assert_eq!(user.favorite_teams, vec!["3", "1", "42"]);
    assert_eq!(user.favorite_players, vec!["23"]);
    assert!(user.notifications.is_empty());
}

#[test]
fn notifications_sort_newest_first() {
    let raw = read_fixture("notifications.json");
    let mut notes: Vec<Notification> = serde_json::from_str(&raw).expect("fixture should parse");
    sort_notifications(&mut notes);
    let order = notes.iter().map(|n| n.message.as_str()).collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            "Celtics clinch the East",
            "Lakers beat Clippers 112-104",
            "Welcome to Hoops",
        ]
    );
}

#[test]
fn parses_head_to_head_fixture() {
    let raw = read_fixture("head_to_head.json");
    let h2h: HeadToHead = serde_json::from_str(&raw).expect("fixture should parse");
    assert_eq!(h2h.total_games, 3);
    assert_eq!(h2h.team1_wins, 2);
    assert_eq!(h2h.team2_wins, 1);
    assert!((h2h.avg_score_team1 - 108.33).abs() < 0.01);
    assert_eq!(h2h.last_games.len(), 2);
    assert_eq!(h2h.last_games[1].result_label(), "L");
}

#[test]
fn head_to_head_without_meetings_defaults_to_zero() {
    let h2h: HeadToHead = serde_json::from_str("{}").expect("empty object should parse");
    assert_eq!(h2h, HeadToHead::default());
}

#[test]
fn parses_performance_fixture() {
    let raw = read_fixture("performance.json");
    let rows: Vec<PerformanceGame> = serde_json::from_str(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].game_id.as_deref(), Some("101"));
    assert_eq!(rows[0].result_label(), "W");
    assert_eq!(rows[1].result_label(), "L");
}

#[test]
fn team_without_name_is_rejected() {
    let res = serde_json::from_str::<Vec<Team>>(r#"[{"id": 9}]"#);
    assert!(res.is_err());
}
