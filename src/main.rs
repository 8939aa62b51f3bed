use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;

use hoops_terminal::api::Api;
use hoops_terminal::config::Config;
use hoops_terminal::forms::Form;
use hoops_terminal::logging;
use hoops_terminal::session::SessionStore;
use hoops_terminal::state::{AppState, Command, Delta, Screen, apply_delta};
use hoops_terminal::token_store::{FileTokenStore, MemoryTokenStore};
use hoops_terminal::ui;
use hoops_terminal::views::ANALYTICS_PERFORMANCE;
use hoops_terminal::worker::spawn_worker;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<Command>,
}

enum Edit {
    Char(char),
    Backspace,
    Next,
    Prev,
}

fn edit_form(form: &mut Form, edit: Edit) {
    match edit {
        Edit::Char(c) => form.push_char(c),
        Edit::Backspace => form.backspace(),
        Edit::Next => form.focus_next(),
        Edit::Prev => form.focus_prev(),
    }
}

fn form_edit(code: KeyCode) -> Option<Edit> {
    match code {
        KeyCode::Char(c) => Some(Edit::Char(c)),
        KeyCode::Backspace => Some(Edit::Backspace),
        KeyCode::Tab | KeyCode::Down => Some(Edit::Next),
        KeyCode::BackTab | KeyCode::Up => Some(Edit::Prev),
        _ => None,
    }
}

impl App {
    fn new(state: AppState, cmd_tx: mpsc::Sender<Command>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn send(&mut self, cmd: Option<Command>) {
        let Some(cmd) = cmd else {
            return;
        };
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Worker stopped; request dropped");
            self.state.auth_pending = false;
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.state.help_overlay {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') | KeyCode::Esc => self.state.help_overlay = false,
                _ => {}
            }
            return;
        }
        if self.on_text_input(key.code) {
            return;
        }

        let cmd = match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char(c @ '1'..='6') => {
                let idx = c as usize - '1' as usize;
                self.state.open(Screen::TABS[idx])
            }
            KeyCode::Char('l') => self.state.open(Screen::Login),
            KeyCode::Char('g') => self.state.open(Screen::Register),
            KeyCode::Char('o') => self.state.logout(),
            KeyCode::Char('r') => self.state.refresh_current(),
            KeyCode::Char('?') => {
                self.state.help_overlay = true;
                None
            }
            KeyCode::Char('x') => {
                self.state.toasts.dismiss_latest();
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.select(true);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.select(false);
                None
            }
            _ => self.on_screen_key(key.code),
        };
        self.send(cmd);
    }

    fn select(&mut self, forward: bool) {
        let state = &mut self.state;
        match (state.screen, forward) {
            (Screen::Teams, true) => state.teams.select_next(),
            (Screen::Teams, false) => state.teams.select_prev(),
            (Screen::Players, true) => state.players.select_next(),
            (Screen::Players, false) => state.players.select_prev(),
            (Screen::Games, true) => state.games.select_next(),
            (Screen::Games, false) => state.games.select_prev(),
            (Screen::Profile, true) => state.profile.select_next(),
            (Screen::Profile, false) => state.profile.select_prev(),
            _ => {}
        }
    }

    fn on_screen_key(&mut self, code: KeyCode) -> Option<Command> {
        let state = &mut self.state;
        let session = state.session.session();
        let fetch = match (state.screen, code) {
            (Screen::Teams, KeyCode::Char('c')) => Some(state.teams.cycle_conference()),
            (Screen::Teams, KeyCode::Char('/')) => {
                state.teams.search_active = true;
                None
            }
            (Screen::Teams, KeyCode::Esc) => {
                state.teams.set_search("");
                None
            }
            (Screen::Teams, KeyCode::Char('f')) => {
                state.teams.favorite_selected(session, &mut state.toasts)
            }
            (Screen::Players, KeyCode::Char('p')) => Some(state.players.cycle_position()),
            (Screen::Players, KeyCode::Char('/')) => {
                state.players.search_active = true;
                None
            }
            (Screen::Players, KeyCode::Esc) => {
                state.players.set_search("");
                None
            }
            (Screen::Players, KeyCode::Char('f')) => {
                state.players.favorite_selected(session, &mut state.toasts)
            }
            (Screen::Games, KeyCode::Char('[')) => state.games.prev_day(),
            (Screen::Games, KeyCode::Char(']')) => state.games.next_day(),
            (Screen::Games, KeyCode::Char('t')) => Some(state.games.set_date(state.today)),
            (Screen::Games, KeyCode::Char('h')) => {
                state.games.highlights_for_selected(&mut state.toasts)
            }
            (Screen::Analytics, KeyCode::Char('i')) => {
                state.analytics.editing = true;
                None
            }
            (Screen::Analytics, KeyCode::Enter) => state.analytics.compare(&mut state.toasts),
            (Screen::Analytics, KeyCode::Char('P')) => {
                state.analytics.load_performance(&mut state.toasts)
            }
            (Screen::Profile, KeyCode::Char('e')) if session.is_authenticated() => {
                let user = state
                    .profile
                    .data()
                    .map(|d| d.user.clone())
                    .or_else(|| session.user().cloned());
                state.profile.begin_edit(user.as_ref());
                None
            }
            (Screen::Profile, KeyCode::Char('d')) => state.profile.remove_selected_favorite(),
            (Screen::Login | Screen::Register, KeyCode::Esc) => {
                return state.open(Screen::Home);
            }
            _ => None,
        };
        fetch.map(|f| self.state.command(f))
    }

    /// Keys typed into a focused input. Returns `true` when the key was consumed.
    fn on_text_input(&mut self, code: KeyCode) -> bool {
        let state = &mut self.state;
        let cmd = match state.screen {
            Screen::Login | Screen::Register => match code {
                KeyCode::Esc => state.open(Screen::Home),
                KeyCode::Enter if state.screen == Screen::Login => state.submit_login(),
                KeyCode::Enter => state.submit_register(),
                other => {
                    let form = if state.screen == Screen::Login {
                        &mut state.login_form
                    } else {
                        &mut state.register_form
                    };
                    if let Some(edit) = form_edit(other) {
                        edit_form(form, edit);
                    }
                    None
                }
            },
            Screen::Teams if state.teams.search_active => {
                let mut query = state.teams.search.clone();
                match code {
                    KeyCode::Esc | KeyCode::Enter => state.teams.search_active = false,
                    KeyCode::Backspace => {
                        query.pop();
                        state.teams.set_search(query);
                    }
                    KeyCode::Char(c) => {
                        query.push(c);
                        state.teams.set_search(query);
                    }
                    _ => {}
                }
                None
            }
            Screen::Players if state.players.search_active => {
                let mut query = state.players.search.clone();
                match code {
                    KeyCode::Esc | KeyCode::Enter => state.players.search_active = false,
                    KeyCode::Backspace => {
                        query.pop();
                        state.players.set_search(query);
                    }
                    KeyCode::Char(c) => {
                        query.push(c);
                        state.players.set_search(query);
                    }
                    _ => {}
                }
                None
            }
            Screen::Analytics if state.analytics.editing => {
                let fetch = match code {
                    KeyCode::Esc => {
                        state.analytics.editing = false;
                        None
                    }
                    KeyCode::Enter if state.analytics.form.focus == ANALYTICS_PERFORMANCE => {
                        state.analytics.load_performance(&mut state.toasts)
                    }
                    KeyCode::Enter => state.analytics.compare(&mut state.toasts),
                    other => {
                        if let Some(edit) = form_edit(other) {
                            edit_form(&mut state.analytics.form, edit);
                        }
                        None
                    }
                };
                fetch.map(|f| state.command(f))
            }
            Screen::Profile if state.profile.edit_mode => {
                let fetch = match code {
                    KeyCode::Esc => {
                        state.profile.cancel_edit();
                        None
                    }
                    KeyCode::Enter => state.profile.save(&mut state.toasts),
                    other => {
                        if let Some(edit) = form_edit(other) {
                            edit_form(&mut state.profile.form, edit);
                        }
                        None
                    }
                };
                fetch.map(|f| state.command(f))
            }
            _ => return false,
        };
        self.send(cmd);
        true
    }
}

fn main() -> anyhow::Result<()> {
    Config::load_dotenv();
    let config = Config::from_env();
    let _log_guard = match logging::init_file_logging(&config) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: file logging disabled: {err:#}");
            None
        }
    };

    let api = Api::from_config(&config).context("set up API client")?;
    let store = config
        .session_file
        .clone()
        .map(FileTokenStore::at)
        .or_else(FileTokenStore::default_location);
    let mut session = match store {
        Some(store) => SessionStore::rehydrate(store),
        None => {
            tracing::warn!("no config directory; session will not survive restarts");
            SessionStore::rehydrate(MemoryTokenStore::default())
        }
    };

    let restore_error = if session.session().is_authenticated() {
        session.refresh_user(&api).err()
    } else {
        None
    };

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let worker = spawn_worker(api, tx, cmd_rx);

    let mut app = App::new(AppState::new(session, config.toast_duration), cmd_tx);
    if let Some(err) = &restore_error {
        app.state.note_restore_failure(err);
    }
    let first = app.state.open(Screen::Home);
    app.send(first);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Closing the command channel lets the worker finish its current request and exit.
    drop(app);
    if worker.join().is_err() {
        tracing::warn!("worker thread panicked");
    }

    res.context("terminal loop")
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            let cmd = apply_delta(&mut app.state, delta);
            app.send(cmd);
        }
        app.state.toasts.expire(Instant::now());

        terminal.draw(|f| ui::draw(f, &app.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
