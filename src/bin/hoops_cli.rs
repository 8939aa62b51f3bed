use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;

use hoops_terminal::api::Api;
use hoops_terminal::config::Config;
use hoops_terminal::error::ApiError;
use hoops_terminal::fetch::sort_notifications;
use hoops_terminal::logging;
use hoops_terminal::models::{FavoriteKind, Game, ProfileUpdate};
use hoops_terminal::session::{Credentials, SessionStore};
use hoops_terminal::token_store::{FileTokenStore, MemoryTokenStore};
use hoops_terminal::views::search_filter;

const USAGE: &str = "usage: hoops_cli [--json] <command> [args]

commands:
  login <email> <password>
  register <username> <email> <password>
  logout
  whoami
  standings [EAST|WEST] [--search=<name>]
  team <id>
  players [G|F|C] [--search=<name>]
  games [YYYY-MM-DD]
  recent
  highlights <game_id>
  h2h <team1_id> <team2_id>
  performance <team_id>
  favorite add|remove teams|players <id>
  notifications
  update-profile [--username=<name>] [--email=<email>] [--password=<password>]";

fn main() -> Result<()> {
    run().map_err(|err| match err.downcast_ref::<ApiError>() {
        Some(api_err) if api_err.is_unauthorized() => {
            anyhow!("{} (run `hoops_cli login` first)", api_err.user_message())
        }
        Some(api_err) => anyhow!(api_err.user_message()),
        None => err,
    })
}

fn run() -> Result<()> {
    Config::load_dotenv();
    logging::init_stderr_logging();
    let config = Config::from_env();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let json = args.iter().any(|a| a == "--json");
    let search = flag_value(&args, "--search");
    let positional = args
        .iter()
        .filter(|a| !a.starts_with("--"))
        .map(String::as_str)
        .collect::<Vec<_>>();
    let Some((&command, rest)) = positional.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let api = Api::from_config(&config).context("set up API client")?;
    let mut store = open_session(&config);
    let session = store.session().clone();

    match (command, rest) {
        ("login", [email, password]) => {
            if !store.login(&api, &Credentials::new(*email, *password)) {
                bail!("login failed: invalid email or password");
            }
            println!("Logged in successfully");
        }
        ("register", [username, email, password]) => {
            if !store.register(&api, username, email, password) {
                bail!("registration failed");
            }
            println!("Registration successful. Please login with your credentials.");
        }
        ("logout", []) => {
            store.logout().context("remove saved session")?;
            println!("Logged out");
        }
        ("whoami", []) => {
            store.refresh_user(&api)?;
            let user = store.session().user().context("no profile returned")?;
            emit(json, user, || format!("{} <{}>", user.username, user.email))?;
        }
        ("standings", args) => {
            let teams = api.standings(&session, args.first().copied())?;
            let rows = search_filter(&teams, search.unwrap_or(""), |t| t.team_name.as_str());
            emit(json, &rows, || {
                rows.iter()
                    .map(|t| {
                        format!(
                            "{:>2}. {:<26} {:>7}  GB {:.1}",
                            t.position,
                            t.team_name,
                            t.record(),
                            t.games_behind
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        ("team", [id]) => {
            let team = api.team(&session, id)?;
            emit(json, &team, || {
                format!("{} ({}) {}", team.team_name, team.conference, team.record())
            })?;
        }
        ("players", args) => {
            let players = api.players(&session, args.first().copied())?;
            let rows = search_filter(&players, search.unwrap_or(""), |p| p.name.as_str());
            emit(json, &rows, || {
                rows.iter()
                    .map(|p| format!("{:<26} {:<3} {}", p.name, p.position, p.team_label()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        ("games", args) => {
            let games = api.games(&session, args.first().copied())?;
            emit(json, &games, || games_table(&games))?;
        }
        ("recent", []) => {
            let games = api.recent_games(&session)?;
            emit(json, &games, || games_table(&games))?;
        }
        ("highlights", [game_id]) => {
            let h = api.highlights(&session, game_id)?;
            emit(json, &h, || h.highlight_video_link.clone())?;
        }
        ("h2h", [team1, team2]) => {
            let h = api.head_to_head(&session, team1, team2)?;
            emit(json, &h, || {
                format!(
                    "games {} | {} wins {} | {} wins {} | avg {:.1}-{:.1}",
                    h.total_games,
                    team1,
                    h.team1_wins,
                    team2,
                    h.team2_wins,
                    h.avg_score_team1,
                    h.avg_score_team2
                )
            })?;
        }
        ("performance", [team_id]) => {
            let rows = api.team_performance(&session, team_id)?;
            emit(json, &rows, || {
                rows.iter()
                    .map(|g| {
                        format!(
                            "{:<12} {} vs {:<26} {}-{}",
                            g.date,
                            g.result_label(),
                            g.opponent_team_name,
                            g.team_score,
                            g.opponent_score
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        ("favorite", [action, kind, id]) => {
            let kind = FavoriteKind::parse(kind)
                .ok_or_else(|| anyhow!("unknown favorite kind {kind:?}"))?;
            match *action {
                "add" => {
                    api.add_favorite(&session, kind, id)?;
                    println!("{} added to favorites", kind.noun());
                }
                "remove" => {
                    api.remove_favorite(&session, kind, id)?;
                    println!("{} removed from favorites", kind.noun());
                }
                other => bail!("unknown favorite action {other:?}\n\n{USAGE}"),
            }
        }
        ("notifications", []) => {
            let mut notes = api.notifications(&session)?;
            sort_notifications(&mut notes);
            emit(json, &notes, || {
                notes
                    .iter()
                    .map(|n| {
                        let marker = if n.read { " " } else { "*" };
                        format!("{marker} {}  {}", n.date, n.message)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        ("update-profile", []) => {
            let update = ProfileUpdate {
                username: flag_value(&args, "--username").map(str::to_string),
                email: flag_value(&args, "--email").map(str::to_string),
                password: flag_value(&args, "--password").map(str::to_string),
            };
            if update.is_empty() {
                bail!("nothing to update\n\n{USAGE}");
            }
            let user = api.update_me(&session, &update)?;
            emit(json, &user, || "Profile updated successfully".to_string())?;
        }
        _ => bail!("unrecognized command {command:?}\n\n{USAGE}"),
    }
    Ok(())
}

fn open_session(config: &Config) -> SessionStore {
    match config
        .session_file
        .clone()
        .map(FileTokenStore::at)
        .or_else(FileTokenStore::default_location)
    {
        Some(store) => SessionStore::rehydrate(store),
        None => SessionStore::rehydrate(MemoryTokenStore::default()),
    }
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .filter_map(|a| a.strip_prefix(name)?.strip_prefix('='))
        .map(str::trim)
        .find(|v| !v.is_empty())
}

fn emit<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    table: impl FnOnce() -> String,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", table());
    }
    Ok(())
}

fn games_table(games: &[Game]) -> String {
    if games.is_empty() {
        return "No games".to_string();
    }
    games
        .iter()
        .map(|g| format!("{:<10} {:<8} {:<44} {}", g.date, g.stage, g.matchup(), g.score()))
        .collect::<Vec<_>>()
        .join("\n")
}
