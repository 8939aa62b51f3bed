use std::time::Duration;

use chrono::NaiveDate;

use crate::error::{ApiError, ApiResult};
use crate::fetch::{Fetch, HomeData, ProfileData, Query, Ticket};
use crate::forms::Form;
use crate::models::{
    Conference, FavoriteKind, Game, HeadToHead, Highlights, PerformanceGame, Player, Position,
    ProfileUpdate, Team, UserProfile,
};
use crate::session::Session;
use crate::toast::{ToastStatus, Toasts};

const HOME_ERROR_TOAST: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What happened to a reply when it reached its view.
#[derive(Debug, Clone, PartialEq)]
pub enum Landing {
    Applied,
    Failed(ApiError),
    /// A newer request was issued after this one; the reply was dropped.
    Stale,
}

/// Last good data for one request slot plus its load state.
#[derive(Debug, Clone, Default)]
pub struct Resource<T> {
    data: T,
    status: Option<LoadStatus>,
    issued: u64,
}

impl<T> Resource<T> {
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        self.status = Some(LoadStatus::Loading);
        Ticket(self.issued)
    }

    pub fn status(&self) -> LoadStatus {
        self.status.unwrap_or(LoadStatus::Idle)
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Last request wins. A failure keeps the previous data.
    pub fn land(&mut self, ticket: Ticket, result: ApiResult<T>) -> Landing {
        if ticket.0 != self.issued || self.status() != LoadStatus::Loading {
            tracing::debug!(ticket = ticket.0, latest = self.issued, "dropping stale reply");
            return Landing::Stale;
        }
        match result {
            Ok(data) => {
                self.data = data;
                self.status = Some(LoadStatus::Ready);
                Landing::Applied
            }
            Err(err) => {
                self.status = Some(LoadStatus::Failed);
                Landing::Failed(err)
            }
        }
    }
}

fn notify_failure(landing: &Landing, toasts: &mut Toasts, description: &str) {
    if let Landing::Failed(_) = landing {
        toasts.error(description);
    }
}

/// Case-insensitive substring match over names already loaded.
pub fn search_filter<'a, T>(items: &'a [T], query: &str, name: impl Fn(&T) -> &str) -> Vec<&'a T> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| name(*item).to_lowercase().contains(&needle))
        .collect()
}

/// Favorites need a session; without one nothing is sent.
pub fn favorite_request(
    session: &Session,
    kind: FavoriteKind,
    id: &str,
    toasts: &mut Toasts,
) -> Option<Fetch> {
    if !session.is_authenticated() {
        toasts.warning("Please login to add favorites");
        return None;
    }
    Some(Fetch {
        ticket: Ticket::UNTRACKED,
        query: Query::AddFavorite {
            kind,
            id: id.to_string(),
        },
    })
}

pub fn favorite_added(kind: FavoriteKind, result: &ApiResult<()>, toasts: &mut Toasts) {
    match result {
        Ok(()) => {
            toasts.success(format!("{} added to favorites", kind.noun()));
        }
        Err(_) => {
            toasts.error(format!(
                "Failed to add {} to favorites",
                kind.noun().to_lowercase()
            ));
        }
    }
}

fn step(selected: &mut usize, total: usize, forward: bool) {
    if total == 0 {
        *selected = 0;
        return;
    }
    *selected = if forward {
        (*selected + 1) % total
    } else if *selected == 0 {
        total - 1
    } else {
        *selected - 1
    };
}

fn clamp(selected: &mut usize, total: usize) {
    if total == 0 {
        *selected = 0;
    } else if *selected >= total {
        *selected = total - 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct HomeView {
    home: Resource<HomeData>,
}

impl HomeView {
    pub fn refresh(&mut self, today: NaiveDate) -> Fetch {
        Fetch {
            ticket: self.home.begin(),
            query: Query::Home {
                date: today.format("%Y-%m-%d").to_string(),
            },
        }
    }

    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: ApiResult<HomeData>,
        toasts: &mut Toasts,
    ) -> Landing {
        let landing = self.home.land(ticket, result);
        if let Landing::Failed(err) = &landing {
            let description = match err {
                ApiError::Status { detail, .. } if !detail.is_empty() => detail.clone(),
                _ => "Failed to fetch home page data".to_string(),
            };
            toasts.push_for(ToastStatus::Error, "Error", description, HOME_ERROR_TOAST);
        }
        landing
    }

    pub fn status(&self) -> LoadStatus {
        self.home.status()
    }

    pub fn data(&self) -> &HomeData {
        self.home.data()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TeamsView {
    pub conference: Option<Conference>,
    pub search: String,
    pub search_active: bool,
    pub selected: usize,
    teams: Resource<Vec<Team>>,
}

impl TeamsView {
    pub fn refresh(&mut self) -> Fetch {
        Fetch {
            ticket: self.teams.begin(),
            query: Query::Standings {
                conference: self.conference.map(|c| c.as_param().to_string()),
            },
        }
    }

    pub fn set_conference(&mut self, conference: Option<Conference>) -> Fetch {
        self.conference = conference;
        self.selected = 0;
        self.refresh()
    }

    pub fn cycle_conference(&mut self) -> Fetch {
        let next = match self.conference {
            None => Some(Conference::East),
            Some(Conference::East) => Some(Conference::West),
            Some(Conference::West) => None,
        };
        self.set_conference(next)
    }

    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: ApiResult<Vec<Team>>,
        toasts: &mut Toasts,
    ) -> Landing {
        let landing = self.teams.land(ticket, result);
        notify_failure(&landing, toasts, "Failed to fetch teams");
        let total = self.rows().len();
        clamp(&mut self.selected, total);
        landing
    }

    pub fn status(&self) -> LoadStatus {
        self.teams.status()
    }

    pub fn all(&self) -> &[Team] {
        self.teams.data()
    }

    pub fn rows(&self) -> Vec<&Team> {
        search_filter(self.teams.data(), &self.search, |t| t.team_name.as_str())
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.selected = 0;
    }

    pub fn selected_team(&self) -> Option<&Team> {
        self.rows().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let total = self.rows().len();
        step(&mut self.selected, total, true);
    }

    pub fn select_prev(&mut self) {
        let total = self.rows().len();
        step(&mut self.selected, total, false);
    }

    pub fn favorite_selected(&self, session: &Session, toasts: &mut Toasts) -> Option<Fetch> {
        let team = self.selected_team()?;
        favorite_request(session, FavoriteKind::Teams, &team.id, toasts)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlayersView {
    pub position: Option<Position>,
    pub search: String,
    pub search_active: bool,
    pub selected: usize,
    players: Resource<Vec<Player>>,
}

impl PlayersView {
    pub fn refresh(&mut self) -> Fetch {
        Fetch {
            ticket: self.players.begin(),
            query: Query::Players {
                position: self.position.map(|p| p.as_param().to_string()),
            },
        }
    }

    pub fn set_position(&mut self, position: Option<Position>) -> Fetch {
        self.position = position;
        self.selected = 0;
        self.refresh()
    }

    pub fn cycle_position(&mut self) -> Fetch {
        let next = match self.position {
            None => Some(Position::Guard),
            Some(Position::Guard) => Some(Position::Forward),
            Some(Position::Forward) => Some(Position::Center),
            Some(Position::Center) => None,
        };
        self.set_position(next)
    }

    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: ApiResult<Vec<Player>>,
        toasts: &mut Toasts,
    ) -> Landing {
        let landing = self.players.land(ticket, result);
        notify_failure(&landing, toasts, "Failed to fetch players");
        let total = self.rows().len();
        clamp(&mut self.selected, total);
        landing
    }

    pub fn status(&self) -> LoadStatus {
        self.players.status()
    }

    pub fn all(&self) -> &[Player] {
        self.players.data()
    }

    pub fn rows(&self) -> Vec<&Player> {
        search_filter(self.players.data(), &self.search, |p| p.name.as_str())
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.selected = 0;
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.rows().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let total = self.rows().len();
        step(&mut self.selected, total, true);
    }

    pub fn select_prev(&mut self) {
        let total = self.rows().len();
        step(&mut self.selected, total, false);
    }

    pub fn favorite_selected(&self, session: &Session, toasts: &mut Toasts) -> Option<Fetch> {
        let player = self.selected_player()?;
        favorite_request(session, FavoriteKind::Players, &player.player_id, toasts)
    }
}

#[derive(Debug, Clone)]
pub struct GamesView {
    pub date: NaiveDate,
    pub selected: usize,
    /// `(game_id, link)` of the last highlight fetched.
    pub highlight: Option<(String, String)>,
    games: Resource<Vec<Game>>,
}

impl GamesView {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            selected: 0,
            highlight: None,
            games: Resource::default(),
        }
    }

    pub fn date_param(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn refresh(&mut self) -> Fetch {
        Fetch {
            ticket: self.games.begin(),
            query: Query::Games {
                date: Some(self.date_param()),
            },
        }
    }

    pub fn set_date(&mut self, date: NaiveDate) -> Fetch {
        self.date = date;
        self.selected = 0;
        self.refresh()
    }

    pub fn prev_day(&mut self) -> Option<Fetch> {
        let date = self.date.pred_opt()?;
        Some(self.set_date(date))
    }

    pub fn next_day(&mut self) -> Option<Fetch> {
        let date = self.date.succ_opt()?;
        Some(self.set_date(date))
    }

    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: ApiResult<Vec<Game>>,
        toasts: &mut Toasts,
    ) -> Landing {
        let landing = self.games.land(ticket, result);
        notify_failure(&landing, toasts, "Failed to fetch games");
        let total = self.games.data().len();
        clamp(&mut self.selected, total);
        landing
    }

    pub fn status(&self) -> LoadStatus {
        self.games.status()
    }

    pub fn rows(&self) -> &[Game] {
        self.games.data()
    }

    pub fn selected_game(&self) -> Option<&Game> {
        self.games.data().get(self.selected)
    }

    pub fn select_next(&mut self) {
        let total = self.games.data().len();
        step(&mut self.selected, total, true);
    }

    pub fn select_prev(&mut self) {
        let total = self.games.data().len();
        step(&mut self.selected, total, false);
    }

    /// Highlights exist only for finished games.
    pub fn highlights_for_selected(&self, toasts: &mut Toasts) -> Option<Fetch> {
        let game = self.selected_game()?;
        if !game.is_final() {
            toasts.warning("Highlights are only available for final games");
            return None;
        }
        Some(Fetch {
            ticket: Ticket::UNTRACKED,
            query: Query::Highlights {
                game_id: game.game_id.clone(),
            },
        })
    }

    pub fn apply_highlights(
        &mut self,
        game_id: String,
        result: ApiResult<Highlights>,
        toasts: &mut Toasts,
    ) {
        match result {
            Ok(h) => {
                toasts.info("Highlights", h.highlight_video_link.clone());
                self.highlight = Some((game_id, h.highlight_video_link));
            }
            Err(_) => {
                toasts.error("Failed to fetch highlights");
            }
        }
    }
}

pub const ANALYTICS_TEAM1: usize = 0;
pub const ANALYTICS_TEAM2: usize = 1;
pub const ANALYTICS_PERFORMANCE: usize = 2;

#[derive(Debug, Clone)]
pub struct AnalyticsView {
    pub form: Form,
    pub editing: bool,
    head_to_head: Resource<Option<HeadToHead>>,
    performance: Resource<Vec<PerformanceGame>>,
}

impl Default for AnalyticsView {
    fn default() -> Self {
        Self {
            form: Form::new(&[("Team 1", false), ("Team 2", false), ("Performance team", false)]),
            editing: false,
            head_to_head: Resource::default(),
            performance: Resource::default(),
        }
    }
}

impl AnalyticsView {
    pub fn compare(&mut self, toasts: &mut Toasts) -> Option<Fetch> {
        let team1 = self.form.value(ANALYTICS_TEAM1).trim().to_string();
        let team2 = self.form.value(ANALYTICS_TEAM2).trim().to_string();
        if team1.is_empty() || team2.is_empty() {
            toasts.warning("Please select both teams");
            return None;
        }
        Some(Fetch {
            ticket: self.head_to_head.begin(),
            query: Query::HeadToHead {
                team1_id: team1,
                team2_id: team2,
            },
        })
    }

    pub fn load_performance(&mut self, toasts: &mut Toasts) -> Option<Fetch> {
        let team = self.form.value(ANALYTICS_PERFORMANCE).trim().to_string();
        if team.is_empty() {
            toasts.warning("Please select a team");
            return None;
        }
        Some(Fetch {
            ticket: self.performance.begin(),
            query: Query::TeamPerformance { team_id: team },
        })
    }

    pub fn apply_head_to_head(
        &mut self,
        ticket: Ticket,
        result: ApiResult<HeadToHead>,
        toasts: &mut Toasts,
    ) -> Landing {
        let landing = self.head_to_head.land(ticket, result.map(Some));
        notify_failure(&landing, toasts, "Failed to fetch head-to-head statistics");
        landing
    }

    pub fn apply_performance(
        &mut self,
        ticket: Ticket,
        result: ApiResult<Vec<PerformanceGame>>,
        toasts: &mut Toasts,
    ) -> Landing {
        let landing = self.performance.land(ticket, result);
        notify_failure(&landing, toasts, "Failed to fetch team performance");
        landing
    }

    pub fn head_to_head(&self) -> Option<&HeadToHead> {
        self.head_to_head.data().as_ref()
    }

    pub fn head_to_head_status(&self) -> LoadStatus {
        self.head_to_head.status()
    }

    pub fn performance(&self) -> &[PerformanceGame] {
        self.performance.data()
    }

    pub fn performance_status(&self) -> LoadStatus {
        self.performance.status()
    }

    pub fn is_loading(&self) -> bool {
        self.head_to_head_status() == LoadStatus::Loading
            || self.performance_status() == LoadStatus::Loading
    }
}

pub const PROFILE_USERNAME: usize = 0;
pub const PROFILE_EMAIL: usize = 1;

#[derive(Debug, Clone)]
pub struct ProfileView {
    pub edit_mode: bool,
    pub form: Form,
    pub selected: usize,
    profile: Resource<Option<ProfileData>>,
}

impl Default for ProfileView {
    fn default() -> Self {
        Self {
            edit_mode: false,
            form: Form::new(&[("Username", false), ("Email", false)]),
            selected: 0,
            profile: Resource::default(),
        }
    }
}

impl ProfileView {
    pub fn refresh(&mut self, session: &Session, toasts: &mut Toasts) -> Option<Fetch> {
        if !session.is_authenticated() {
            toasts.warning("Please login to view your profile");
            return None;
        }
        Some(Fetch {
            ticket: self.profile.begin(),
            query: Query::Profile,
        })
    }

    pub fn apply(
        &mut self,
        ticket: Ticket,
        result: ApiResult<ProfileData>,
        toasts: &mut Toasts,
    ) -> Landing {
        let landing = self.profile.land(ticket, result.map(Some));
        notify_failure(&landing, toasts, "Failed to fetch profile");
        let total = self.favorite_teams().len();
        clamp(&mut self.selected, total);
        landing
    }

    pub fn status(&self) -> LoadStatus {
        self.profile.status()
    }

    pub fn data(&self) -> Option<&ProfileData> {
        self.profile.data().as_ref()
    }

    pub fn favorite_teams(&self) -> &[Team] {
        self.data().map(|d| d.favorite_teams.as_slice()).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn select_next(&mut self) {
        let total = self.favorite_teams().len();
        step(&mut self.selected, total, true);
    }

    pub fn select_prev(&mut self) {
        let total = self.favorite_teams().len();
        step(&mut self.selected, total, false);
    }

    pub fn begin_edit(&mut self, user: Option<&UserProfile>) {
        self.form.clear();
        if let Some(user) = user {
            self.form.set_value(PROFILE_USERNAME, user.username.clone());
            self.form.set_value(PROFILE_EMAIL, user.email.clone());
        }
        self.edit_mode = true;
    }

    pub fn cancel_edit(&mut self) {
        self.edit_mode = false;
    }

    /// Sends only the fields that have content.
    pub fn save(&mut self, toasts: &mut Toasts) -> Option<Fetch> {
        let pick = |idx: usize| {
            let v = self.form.value(idx).trim();
            (!v.is_empty()).then(|| v.to_string())
        };
        let update = ProfileUpdate {
            username: pick(PROFILE_USERNAME),
            email: pick(PROFILE_EMAIL),
            password: None,
        };
        if update.is_empty() {
            toasts.warning("Nothing to update");
            return None;
        }
        Some(Fetch {
            ticket: Ticket::UNTRACKED,
            query: Query::UpdateProfile(update),
        })
    }

    pub fn apply_update(&mut self, result: &ApiResult<UserProfile>, toasts: &mut Toasts) {
        match result {
            Ok(user) => {
                if let Some(data) = self.profile.data_mut() {
                    data.user = user.clone();
                }
                self.edit_mode = false;
                toasts.success("Profile updated successfully");
            }
            Err(_) => {
                toasts.error("Failed to update profile");
            }
        }
    }

    pub fn remove_selected_favorite(&self) -> Option<Fetch> {
        let team = self.favorite_teams().get(self.selected)?;
        Some(Fetch {
            ticket: Ticket::UNTRACKED,
            query: Query::RemoveFavorite {
                kind: FavoriteKind::Teams,
                id: team.id.clone(),
            },
        })
    }

    pub fn apply_removed(
        &mut self,
        kind: FavoriteKind,
        id: &str,
        result: &ApiResult<()>,
        toasts: &mut Toasts,
    ) {
        let noun = kind.noun();
        match result {
            Ok(()) => {
                if let Some(data) = self.profile.data_mut() {
                    match kind {
                        FavoriteKind::Teams => {
                            data.favorite_teams.retain(|t| t.id != id);
                            data.user.favorite_teams.retain(|t| t != id);
                        }
                        FavoriteKind::Players => data.user.favorite_players.retain(|p| p != id),
                    }
                }
                let total = self.favorite_teams().len();
                clamp(&mut self.selected, total);
                toasts.success(format!("{noun} removed from favorites"));
            }
            Err(_) => {
                toasts.error(format!(
                    "Failed to remove {} from favorites",
                    noun.to_lowercase()
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_drops_older_tickets() {
        let mut res: Resource<Vec<u32>> = Resource::default();
        assert_eq!(res.status(), LoadStatus::Idle);
        let first = res.begin();
        let second = res.begin();
        assert_eq!(res.land(first, Ok(vec![1])), Landing::Stale);
        assert_eq!(res.status(), LoadStatus::Loading);
        assert_eq!(res.land(second, Ok(vec![2])), Landing::Applied);
        assert_eq!(res.data(), &vec![2]);
        assert_eq!(res.land(second, Ok(vec![3])), Landing::Stale);
    }

    #[test]
    fn failure_keeps_previous_data() {
        let mut res: Resource<Vec<u32>> = Resource::default();
        let t = res.begin();
        res.land(t, Ok(vec![7]));
        let t = res.begin();
        let landing = res.land(t, Err(ApiError::Network("down".to_string())));
        assert!(matches!(landing, Landing::Failed(_)));
        assert_eq!(res.status(), LoadStatus::Failed);
        assert_eq!(res.data(), &vec![7]);
    }

    #[test]
    fn search_ignores_case() {
        let names = ["Lakers", "Clippers", "Celtics"];
        let hits = search_filter(&names, "L", |n| *n);
        assert_eq!(hits.len(), 3);
        let hits = search_filter(&names, "CEL", |n| *n);
        assert_eq!(hits, vec![&"Celtics"]);
        assert_eq!(search_filter(&names, "", |n| *n).len(), 3);
    }

    #[test]
    fn day_stepping_moves_both_ways() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut view = GamesView::new(today);
        let fetch = view.prev_day().unwrap();
        assert_eq!(
            fetch.query,
            Query::Games {
                date: Some("2024-03-09".to_string())
            }
        );
        view.next_day().unwrap();
        let fetch = view.next_day().unwrap();
        assert_eq!(
            fetch.query,
            Query::Games {
                date: Some("2024-03-11".to_string())
            }
        );
        assert_eq!(view.date_param(), "2024-03-11");
    }
}
