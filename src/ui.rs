use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::forms::Form;
use crate::models::{Game, Team};
use crate::state::{AppState, Screen};
use crate::toast::{Toast, ToastStatus};
use crate::views::LoadStatus;

const MAX_VISIBLE_TOASTS: usize = 3;
const TOAST_WIDTH: u16 = 44;
const TOAST_HEIGHT: u16 = 4;

pub fn draw(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
            Constraint::Length(2),
        ])
        .split(frame.size());

    render_header(frame, chunks[0], state);

    match state.screen {
        Screen::Home => render_home(frame, chunks[1], state),
        Screen::Teams => render_teams(frame, chunks[1], state),
        Screen::Players => render_players(frame, chunks[1], state),
        Screen::Games => render_games(frame, chunks[1], state),
        Screen::Analytics => render_analytics(frame, chunks[1], state),
        Screen::Profile => render_profile(frame, chunks[1], state),
        Screen::Login => render_auth_form(frame, chunks[1], &state.login_form, "Login", state),
        Screen::Register => {
            render_auth_form(frame, chunks[1], &state.register_form, "Register", state)
        }
    }

    let console = Paragraph::new(console_text(state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    render_toasts(frame, frame.size(), state);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut tabs = vec![Span::styled(
        " HOOPS ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (i, screen) in Screen::TABS.iter().enumerate() {
        let label = format!(" {} {} ", i + 1, screen.title());
        let style = if *screen == state.screen {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default()
        };
        tabs.push(Span::styled(label, style));
    }

    let who = match state.session.session().display_name() {
        Some(name) => format!("  signed in: {name}"),
        None if state.auth_pending => "  signing in...".to_string(),
        None => "  not signed in (l login, g register)".to_string(),
    };

    let header = Paragraph::new(vec![Line::from(tabs), Line::from(who)])
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn footer_text(state: &AppState) -> String {
    let hints = match state.screen {
        Screen::Home => "r Refresh",
        Screen::Teams => "j/k Move | c Conference | / Search | f Favorite | r Refresh",
        Screen::Players => "j/k Move | p Position | / Search | f Favorite | r Refresh",
        Screen::Games => "j/k Move | [ ] Day | t Today | h Highlights | r Refresh",
        Screen::Analytics if state.analytics.editing => "Tab Field | Enter Run | Esc Done",
        Screen::Analytics => "i Edit team ids | Enter Compare | P Performance",
        Screen::Profile if state.profile.edit_mode => "Tab Field | Enter Save | Esc Cancel",
        Screen::Profile => "j/k Move | d Remove favorite | e Edit | o Logout | r Refresh",
        Screen::Login | Screen::Register => "Tab Field | Enter Submit | Esc Back",
    };
    format!("{hints} | 1-6 Screens | x Dismiss | ? Help | q Quit")
}

fn console_text(state: &AppState) -> String {
    state
        .logs
        .back()
        .cloned()
        .unwrap_or_else(|| "No activity yet".to_string())
}

fn status_text(status: LoadStatus, what: &str) -> Option<String> {
    match status {
        LoadStatus::Idle => Some(format!("{what} not loaded yet (r to refresh)")),
        LoadStatus::Loading => Some(format!("Loading {what}...")),
        LoadStatus::Failed => Some(format!("Could not load {what}; showing last results")),
        LoadStatus::Ready => None,
    }
}

fn render_status_line(frame: &mut Frame, area: Rect, status: LoadStatus, what: &str, extra: &str) {
    let mut text = extra.to_string();
    if let Some(status) = status_text(status, what) {
        if !text.is_empty() {
            text.push_str("  ");
        }
        text.push_str(&status);
    }
    let style = match status {
        LoadStatus::Failed => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::DarkGray),
    };
    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_home(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(35),
            Constraint::Percentage(35),
            Constraint::Min(3),
        ])
        .split(area);

    let date = state.today.format("%Y-%m-%d").to_string();
    render_status_line(
        frame,
        sections[0],
        state.home.status(),
        "dashboard",
        &format!("Today: {date}"),
    );

    let data = state.home.data();
    let today = games_text(&data.today_games, "No games scheduled for today");
    frame.render_widget(
        Paragraph::new(today).block(Block::default().title("Today's Games").borders(Borders::ALL)),
        sections[1],
    );
    let recent = games_text(&data.recent_results, "No recent results");
    frame.render_widget(
        Paragraph::new(recent)
            .block(Block::default().title("Recent Results").borders(Borders::ALL)),
        sections[2],
    );
    let top = if data.top_teams.is_empty() {
        "No standings available".to_string()
    } else {
        data.top_teams
            .iter()
            .map(|t| format!("{:>2}. {:<24} {}", t.position, t.team_name, t.record()))
            .collect::<Vec<_>>()
            .join("\n")
    };
    frame.render_widget(
        Paragraph::new(top).block(Block::default().title("Top Teams").borders(Borders::ALL)),
        sections[3],
    );
}

fn games_text(games: &[Game], empty: &str) -> String {
    if games.is_empty() {
        return empty.to_string();
    }
    games
        .iter()
        .map(|g| format!("{:<10} {:<40} {:>9}  {}", g.date, g.matchup(), g.score(), g.stage))
        .collect::<Vec<_>>()
        .join("\n")
}

fn team_columns() -> [Constraint; 8] {
    [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(7),
    ]
}

fn team_cells(team: &Team) -> [String; 8] {
    [
        team.position.to_string(),
        team.team_name.clone(),
        team.record(),
        format!("{:.1}", team.games_behind),
        team.conf_record.clone(),
        team.home_record.clone(),
        team.away_record.clone(),
        team.streak.clone(),
    ]
}

fn render_teams(frame: &mut Frame, area: Rect, state: &AppState) {
    let view = &state.teams;
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

    let conference = view.conference.map(|c| c.label()).unwrap_or("All conferences");
    let filter = format!(
        "{conference} | Search: {}{}",
        view.search,
        if view.search_active { "_" } else { "" }
    );
    render_status_line(frame, sections[0], view.status(), "standings", &filter);

    let widths = team_columns();
    render_table_header(
        frame,
        sections[1],
        &widths,
        &["#", "Team", "W-L", "GB", "Conf", "Home", "Away", "Strk"],
    );

    let rows: Vec<Vec<String>> = view.rows().into_iter().map(|t| team_cells(t).to_vec()).collect();
    render_rows(frame, sections[2], &widths, &rows, Some(view.selected), "No teams found");
}

fn render_players(frame: &mut Frame, area: Rect, state: &AppState) {
    let view = &state.players;
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

    let position = view.position.map(|p| p.label()).unwrap_or("All positions");
    let filter = format!(
        "{position} | Search: {}{}",
        view.search,
        if view.search_active { "_" } else { "" }
    );
    render_status_line(frame, sections[0], view.status(), "players", &filter);

    let widths = [
        Constraint::Min(22),
        Constraint::Length(5),
        Constraint::Length(24),
        Constraint::Min(20),
    ];
    render_table_header(frame, sections[1], &widths, &["Name", "Pos", "Team", "Season"]);

    let rows: Vec<Vec<String>> = view
        .rows()
        .into_iter()
        .map(|p| {
            vec![
                p.name.clone(),
                p.position.clone(),
                p.team_label().to_string(),
                p.season_stats.clone(),
            ]
        })
        .collect();
    render_rows(frame, sections[2], &widths, &rows, Some(view.selected), "No players found");
}

fn render_games(frame: &mut Frame, area: Rect, state: &AppState) {
    let view = &state.games;
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_status_line(
        frame,
        sections[0],
        view.status(),
        "games",
        &format!("Date: {}", view.date_param()),
    );

    let widths = [
        Constraint::Length(9),
        Constraint::Min(30),
        Constraint::Length(10),
        Constraint::Length(4),
    ];
    render_table_header(frame, sections[1], &widths, &["Stage", "Matchup", "Score", "HL"]);

    let rows: Vec<Vec<String>> = view
        .rows()
        .iter()
        .map(|g| {
            vec![
                g.stage.clone(),
                g.matchup(),
                g.score(),
                if g.is_final() { "yes" } else { "-" }.to_string(),
            ]
        })
        .collect();
    render_rows(
        frame,
        sections[2],
        &widths,
        &rows,
        Some(view.selected),
        "No games on this date",
    );

    if let Some((game_id, link)) = &view.highlight {
        let line = Paragraph::new(format!("Highlights for {game_id}: {link}"))
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(line, sections[3]);
    }
}

fn render_analytics(frame: &mut Frame, area: Rect, state: &AppState) {
    let view = &state.analytics;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(columns[0]);

    render_form_fields(frame, left[0], &view.form, "Team ids", view.editing);

    let h2h = match view.head_to_head() {
        Some(h) => {
            let mut text = format!(
                "Games played: {}\nTeam 1 wins:  {}\nTeam 2 wins:  {}\nAvg score:    {:.1} - {:.1}",
                h.total_games, h.team1_wins, h.team2_wins, h.avg_score_team1, h.avg_score_team2,
            );
            for g in &h.last_games {
                text.push_str(&format!(
                    "\n  {} {} {}-{}",
                    g.date,
                    g.result_label(),
                    g.team_score,
                    g.opponent_score
                ));
            }
            text
        }
        None => status_text(view.head_to_head_status(), "head-to-head")
            .unwrap_or_else(|| "No comparison yet".to_string()),
    };
    frame.render_widget(
        Paragraph::new(h2h).block(Block::default().title("Head to Head").borders(Borders::ALL)),
        left[1],
    );

    let perf = if view.performance().is_empty() {
        status_text(view.performance_status(), "performance")
            .unwrap_or_else(|| "No games for this team".to_string())
    } else {
        view.performance()
            .iter()
            .map(|g| {
                format!(
                    "{:<12} {} vs {:<24} {:>3}-{:<3}",
                    g.date,
                    g.result_label(),
                    g.opponent_team_name,
                    g.team_score,
                    g.opponent_score
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    frame.render_widget(
        Paragraph::new(perf)
            .block(Block::default().title("Team Performance").borders(Borders::ALL)),
        columns[1],
    );
}

fn render_profile(frame: &mut Frame, area: Rect, state: &AppState) {
    let view = &state.profile;
    if !state.session.session().is_authenticated() {
        let msg = Paragraph::new("Please login to view your profile (l to login)")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(msg, area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(columns[0]);

    if view.edit_mode {
        render_form_fields(frame, left[0], &view.form, "Edit profile", true);
    } else {
        let identity = match view.data().map(|d| &d.user).or(state.session.session().user()) {
            Some(user) => format!("Username: {}\nEmail:    {}", user.username, user.email),
            None => status_text(view.status(), "profile").unwrap_or_default(),
        };
        frame.render_widget(
            Paragraph::new(identity).block(Block::default().title("Profile").borders(Borders::ALL)),
            left[0],
        );
    }

    let favorites = Block::default().title("Favorite Teams").borders(Borders::ALL);
    let inner = favorites.inner(left[1]);
    frame.render_widget(favorites, left[1]);
    let rows: Vec<Vec<String>> = view
        .favorite_teams()
        .iter()
        .map(|t| vec![t.team_name.clone(), t.record()])
        .collect();
    render_rows(
        frame,
        inner,
        &[Constraint::Min(20), Constraint::Length(8)],
        &rows,
        Some(view.selected),
        "No favorite teams yet",
    );

    let notifications = match view.data() {
        Some(data) if !data.notifications.is_empty() => data
            .notifications
            .iter()
            .map(|n| {
                let marker = if n.read { " " } else { "*" };
                format!("{marker} {}  {}", n.date, n.message)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "No notifications".to_string(),
    };
    frame.render_widget(
        Paragraph::new(notifications)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Notifications").borders(Borders::ALL)),
        columns[1],
    );
}

fn render_auth_form(frame: &mut Frame, area: Rect, form: &Form, title: &str, state: &AppState) {
    let popup = centered_rect(50, 60, area);
    let height = form.fields.len() as u16 + 4;
    let popup = Rect {
        height: height.min(popup.height),
        ..popup
    };
    render_form_fields(frame, popup, form, title, !state.auth_pending);
}

fn render_form_fields(frame: &mut Frame, area: Rect, form: &Form, title: &str, active: bool) {
    let lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let focused = active && i == form.focus;
            let style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let cursor = if focused { "_" } else { "" };
            Line::from(Span::styled(
                format!("{:<18} {}{cursor}", format!("{}:", field.label), field.display()),
                style,
            ))
        })
        .collect();
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_table_header(frame: &mut Frame, area: Rect, widths: &[Constraint], titles: &[&str]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);
    for (col, title) in cols.iter().zip(titles) {
        frame.render_widget(Paragraph::new(*title).style(style), *col);
    }
}

fn render_rows(
    frame: &mut Frame,
    area: Rect,
    widths: &[Constraint],
    rows: &[Vec<String>],
    selected: Option<usize>,
    empty: &str,
) {
    if rows.is_empty() {
        let empty = Paragraph::new(empty).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }
    if area.height == 0 {
        return;
    }

    let (start, end) = visible_range(selected.unwrap_or(0), rows.len(), area.height as usize);
    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: area.x,
            y: area.y + i as u16,
            width: area.width,
            height: 1,
        };
        let style = if selected == Some(idx) {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected == Some(idx) {
            frame.render_widget(Block::default().style(style), row_area);
        }
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);
        for (col, text) in cols.iter().zip(&rows[idx]) {
            frame.render_widget(Paragraph::new(text.as_str()).style(style), *col);
        }
    }
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn toast_style(status: ToastStatus) -> Style {
    let color = match status {
        ToastStatus::Info => Color::Cyan,
        ToastStatus::Success => Color::Green,
        ToastStatus::Warning => Color::Yellow,
        ToastStatus::Error => Color::Red,
    };
    Style::default().fg(color)
}

fn render_toasts(frame: &mut Frame, area: Rect, state: &AppState) {
    let width = TOAST_WIDTH.min(area.width);
    let toasts: Vec<&Toast> = state.toasts.visible().take(MAX_VISIBLE_TOASTS).collect();
    for (i, toast) in toasts.into_iter().enumerate() {
        let y = area.y + 1 + i as u16 * TOAST_HEIGHT;
        if y + TOAST_HEIGHT > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x + area.width - width,
            y,
            width,
            height: TOAST_HEIGHT,
        };
        frame.render_widget(Clear, rect);
        let block = Block::default()
            .title(format!("{} {}", toast.status.label(), toast.title))
            .borders(Borders::ALL)
            .border_style(toast_style(toast.status));
        let body = Paragraph::new(toast.description.as_str())
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(body, rect);
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Hoops Terminal - Help",
        "",
        "Global:",
        "  1-6          Home, Teams, Players, Games, Analytics, Profile",
        "  l / g        Login / Register",
        "  o            Logout",
        "  r            Refresh current screen",
        "  x            Dismiss latest toast",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Lists:",
        "  j/k or ↑/↓   Move",
        "  c / p        Cycle conference / position",
        "  /            Search by name (Esc to stop)",
        "  f            Add to favorites",
        "",
        "Games:",
        "  [ / ] / t    Previous day / next day / today",
        "  h            Highlights for a final game",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
