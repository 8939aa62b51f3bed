use crate::api::Api;
use crate::error::ApiResult;
use crate::models::{
    FavoriteKind, Game, HeadToHead, Highlights, Notification, PerformanceGame, Player,
    ProfileUpdate, Team, UserProfile,
};
use crate::session::Session;

pub const HOME_TOP_TEAMS: usize = 5;

/// Issue number of a view request; only the newest one for a view may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticket(pub u64);

impl Ticket {
    /// For one-shot actions that no view tracks.
    pub const UNTRACKED: Ticket = Ticket(0);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Home { date: String },
    Standings { conference: Option<String> },
    Players { position: Option<String> },
    Games { date: Option<String> },
    Highlights { game_id: String },
    HeadToHead { team1_id: String, team2_id: String },
    TeamPerformance { team_id: String },
    Profile,
    AddFavorite { kind: FavoriteKind, id: String },
    RemoveFavorite { kind: FavoriteKind, id: String },
    UpdateProfile(ProfileUpdate),
}

/// A query paired with the ticket it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetch {
    pub ticket: Ticket,
    pub query: Query,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HomeData {
    pub today_games: Vec<Game>,
    pub recent_results: Vec<Game>,
    pub top_teams: Vec<Team>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileData {
    pub user: UserProfile,
    pub favorite_teams: Vec<Team>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Home(ApiResult<HomeData>),
    Standings(ApiResult<Vec<Team>>),
    Players(ApiResult<Vec<Player>>),
    Games(ApiResult<Vec<Game>>),
    Highlights {
        game_id: String,
        result: ApiResult<Highlights>,
    },
    HeadToHead(ApiResult<HeadToHead>),
    TeamPerformance(ApiResult<Vec<PerformanceGame>>),
    Profile(ApiResult<ProfileData>),
    FavoriteAdded {
        kind: FavoriteKind,
        id: String,
        result: ApiResult<()>,
    },
    FavoriteRemoved {
        kind: FavoriteKind,
        id: String,
        result: ApiResult<()>,
    },
    ProfileUpdated(ApiResult<UserProfile>),
}

/// Runs one query to completion on the calling thread.
pub fn execute(api: &Api, session: &Session, query: &Query) -> Outcome {
    match query {
        Query::Home { date } => Outcome::Home(fetch_home(api, session, date)),
        Query::Standings { conference } => {
            Outcome::Standings(api.standings(session, conference.as_deref()))
        }
        Query::Players { position } => Outcome::Players(api.players(session, position.as_deref())),
        Query::Games { date } => Outcome::Games(api.games(session, date.as_deref())),
        Query::Highlights { game_id } => Outcome::Highlights {
            game_id: game_id.clone(),
            result: api.highlights(session, game_id),
        },
        Query::HeadToHead {
            team1_id,
            team2_id,
        } => Outcome::HeadToHead(api.head_to_head(session, team1_id, team2_id)),
        Query::TeamPerformance { team_id } => {
            Outcome::TeamPerformance(api.team_performance(session, team_id))
        }
        Query::Profile => Outcome::Profile(fetch_profile(api, session)),
        Query::AddFavorite { kind, id } => Outcome::FavoriteAdded {
            kind: *kind,
            id: id.clone(),
            result: api.add_favorite(session, *kind, id),
        },
        Query::RemoveFavorite { kind, id } => Outcome::FavoriteRemoved {
            kind: *kind,
            id: id.clone(),
            result: api.remove_favorite(session, *kind, id),
        },
        Query::UpdateProfile(update) => Outcome::ProfileUpdated(api.update_me(session, update)),
    }
}

/// All three lists or nothing.
fn fetch_home(api: &Api, session: &Session, date: &str) -> ApiResult<HomeData> {
    let today_games = api.games(session, Some(date))?;
    let recent_results = api.recent_games(session)?;
    let mut top_teams = api.standings(session, None)?;
    top_teams.truncate(HOME_TOP_TEAMS);
    Ok(HomeData {
        today_games,
        recent_results,
        top_teams,
    })
}

/// Favorite ids that no longer resolve to a team are skipped.
fn fetch_profile(api: &Api, session: &Session) -> ApiResult<ProfileData> {
    let user = api.me(session)?;
    let favorite_teams = user
        .favorite_teams
        .iter()
        .filter_map(|id| match api.team(session, id) {
            Ok(team) => Some(team),
            Err(err) => {
                tracing::debug!(team_id = %id, error = %err, "favorite team unavailable");
                None
            }
        })
        .collect();
    let mut notifications = api.notifications(session)?;
    sort_notifications(&mut notifications);
    Ok(ProfileData {
        user,
        favorite_teams,
        notifications,
    })
}

pub fn sort_notifications(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
}
