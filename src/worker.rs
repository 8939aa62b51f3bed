use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::api::Api;
use crate::fetch::{self, Fetch};
use crate::session::{authenticate, register_account};
use crate::state::{Command, Delta};

/// Runs commands one at a time, in the order they were sent, until either channel closes.
pub fn spawn_worker(api: Api, tx: Sender<Delta>, cmd_rx: Receiver<Command>) -> JoinHandle<()> {
    thread::spawn(move || {
        tracing::debug!("worker started");
        while let Ok(cmd) = cmd_rx.recv() {
            let delta = handle_command(&api, cmd);
            if tx.send(delta).is_err() {
                break;
            }
        }
        tracing::debug!("worker stopped");
    })
}

pub fn handle_command(api: &Api, cmd: Command) -> Delta {
    match cmd {
        Command::Fetch {
            fetch: Fetch { ticket, query },
            session,
        } => {
            let outcome = fetch::execute(api, &session, &query);
            Delta::Fetched { ticket, outcome }
        }
        Command::Login(credentials) => match authenticate(api, &credentials) {
            Some((token, user)) => Delta::LoggedIn { token, user },
            None => Delta::LoginFailed,
        },
        Command::Register(request) => Delta::Registered {
            ok: register_account(api, &request.username, &request.email, &request.password),
        },
    }
}
