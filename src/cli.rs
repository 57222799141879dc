// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Line-oriented terminal client.
//!
//! Reads one command per line from stdin and prints results to stdout. The
//! rides list is re-rendered by a background task whenever the synchronizer
//! publishes a new state.

use crate::models::Session;
use crate::services::{AccountService, Destination, HomeSession, RideListState};
use crate::AppState;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

const HELP: &str = "\
Commands:
  signup <email> <password> <confirm>   create an account
  login <email> <password>              sign in
  book <pickup> -> <drop>               book a ride
  rides                                 show your rides
  delete <n>                            delete ride number n
  profile                               show your profile
  name <new name>                       change your display name
  logout                                sign out
  help                                  show this help
  quit                                  exit";

const LOGIN_HINT: &str = "Please log in (`login <email> <password>`) or sign up (`signup <email> <password> <confirm>`).";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignUp {
        email: String,
        password: String,
        confirm: String,
    },
    Login {
        email: String,
        password: String,
    },
    Book {
        pickup: String,
        drop: String,
    },
    Rides,
    Delete(usize),
    Profile,
    Rename(String),
    Logout,
    Help,
    Quit,
}

/// Input that could not be parsed into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Empty input")]
    Empty,

    #[error("Unknown command: {0} (type `help`)")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        match verb.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "signup" => match args.as_slice() {
                [email, password, confirm] => Ok(Self::SignUp {
                    email: email.to_string(),
                    password: password.to_string(),
                    confirm: confirm.to_string(),
                }),
                _ => Err(CommandError::Usage("signup <email> <password> <confirm>")),
            },
            "login" => match args.as_slice() {
                [email, password] => Ok(Self::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                }),
                _ => Err(CommandError::Usage("login <email> <password>")),
            },
            "book" => rest
                .split_once("->")
                .map(|(pickup, drop)| Self::Book {
                    pickup: pickup.to_string(),
                    drop: drop.to_string(),
                })
                .ok_or(CommandError::Usage("book <pickup> -> <drop>")),
            "rides" => Ok(Self::Rides),
            "delete" => match args.as_slice() {
                [n] => n
                    .parse()
                    .ok()
                    .filter(|n| *n > 0)
                    .map(Self::Delete)
                    .ok_or(CommandError::Usage("delete <n>")),
                _ => Err(CommandError::Usage("delete <n>")),
            },
            "profile" => Ok(Self::Profile),
            "name" => Ok(Self::Rename(rest.to_string())),
            "logout" => Ok(Self::Logout),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Text shown for the rides section of the home screen.
pub fn render_rides(state: &RideListState) -> String {
    let mut lines = vec!["Recent Rides".to_string()];

    if state.is_loading {
        lines.push("Loading rides...".to_string());
    }
    if let Some(error) = state.subscription_error() {
        lines.push(format!("! {}", error.user_message()));
    }
    if !state.is_loading && state.rides.is_empty() {
        lines.push("No rides yet.".to_string());
        lines.push("Use `book <pickup> -> <drop>` to create your first ride.".to_string());
    }
    for (index, ride) in state.rides.iter().enumerate() {
        let when = ride
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        lines.push(format!("{:>3}. {}  {}", index + 1, ride.route(), when));
    }
    if state.pending_writes > 0 {
        lines.push("Booking...".to_string());
    }

    lines.join("\n")
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Home {
    session: HomeSession,
    renderer: JoinHandle<()>,
}

impl Drop for Home {
    fn drop(&mut self) {
        self.renderer.abort();
        self.session.close();
    }
}

struct Client<'a> {
    app: &'a AppState,
    accounts: AccountService,
    home: Option<Home>,
}

impl<'a> Client<'a> {
    fn new(app: &'a AppState) -> Self {
        Self {
            app,
            accounts: AccountService::new(app.auth.clone()),
            home: None,
        }
    }

    async fn enter_home(&mut self, session: Session) {
        let home = HomeSession::open(self.app.store.clone(), session).await;
        println!("GoRide\nHi, {}", home.profile().display_name);
        let renderer = tokio::spawn(render_changes(home.rides()));
        self.home = Some(Home {
            session: home,
            renderer,
        });
    }

    fn leave_home(&mut self) {
        self.home = None;
    }

    async fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Help => println!("{}", HELP),
            Command::Quit => return Flow::Quit,
            Command::SignUp { .. } | Command::Login { .. } if self.home.is_some() => {
                println!("Already signed in. Use `logout` first.");
            }
            Command::SignUp {
                email,
                password,
                confirm,
            } => match self.accounts.sign_up(&email, &password, &confirm).await {
                Ok(session) => {
                    println!("Account created.");
                    self.enter_home(session).await;
                }
                Err(e) => println!("{}", e.user_message()),
            },
            Command::Login { email, password } => {
                match self.accounts.sign_in(&email, &password).await {
                    Ok(session) => self.enter_home(session).await,
                    Err(e) => println!("{}", e.user_message()),
                }
            }
            Command::Logout => {
                self.leave_home();
                self.accounts.sign_out();
                println!("Signed out.\n{}", LOGIN_HINT);
            }
            command => match &mut self.home {
                Some(home) => handle_home(&mut home.session, command).await,
                None => println!("{}", LOGIN_HINT),
            },
        }
        Flow::Continue
    }
}

async fn handle_home(home: &mut HomeSession, command: Command) {
    let message = match command {
        Command::Book { pickup, drop } => home
            .book(&pickup, &drop)
            .await
            .map(|_| "Ride booked!".to_string()),
        Command::Rides => Ok(render_rides(&home.rides_state())),
        Command::Delete(row) => home
            .delete_row(row)
            .await
            .map(|_| "Ride deleted".to_string()),
        Command::Profile => {
            let profile = home.profile();
            Ok(format!(
                "Name: {}\nEmail: {}",
                profile.display_name,
                profile.email.as_deref().unwrap_or("User")
            ))
        }
        Command::Rename(name) => home
            .rename(&name)
            .await
            .map(|_| "Profile updated".to_string()),
        _ => return,
    };

    match message {
        Ok(text) => println!("{}", text),
        Err(e) => println!("{}", e.user_message()),
    }
}

/// Print the rides section whenever its visible parts change.
async fn render_changes(mut rides: tokio::sync::watch::Receiver<RideListState>) {
    let mut last_rendered: Option<String> = None;
    loop {
        let visible = {
            let state = rides.borrow_and_update();
            RideListState {
                pending_writes: 0,
                ..state.clone()
            }
        };
        let text = render_rides(&visible);
        if last_rendered.as_deref() != Some(text.as_str()) {
            println!("{}", text);
            last_rendered = Some(text);
        }
        if rides.changed().await.is_err() {
            break;
        }
    }
}

async fn splash(delay: Duration) {
    println!("GoRide\nYour ride, your way");
    tokio::time::sleep(delay).await;
}

/// Run the client until `quit` or end of input.
pub async fn run(app: &AppState) -> anyhow::Result<()> {
    splash(app.config.splash_delay).await;

    let mut client = Client::new(app);
    match client.accounts.launch_destination() {
        Destination::Home(session) => client.enter_home(session).await,
        Destination::Login => println!("{}", LOGIN_HINT),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        if client.handle(command).await == Flow::Quit {
            break;
        }
    }

    client.leave_home();
    tracing::info!("Client exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RideRecord;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "login a@b.co secret1".parse::<Command>(),
            Ok(Command::Login {
                email: "a@b.co".into(),
                password: "secret1".into(),
            })
        );
        assert_eq!(
            "book Central Station -> Airport T2".parse::<Command>(),
            Ok(Command::Book {
                pickup: "Central Station ".into(),
                drop: " Airport T2".into(),
            })
        );
        assert_eq!("DELETE 2".parse::<Command>(), Ok(Command::Delete(2)));
        assert_eq!(
            "name  Alice Smith ".parse::<Command>(),
            Ok(Command::Rename("Alice Smith".into()))
        );
        assert_eq!("quit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("   ".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "book Home Office".parse::<Command>(),
            Err(CommandError::Usage("book <pickup> -> <drop>"))
        );
        assert_eq!(
            "delete 0".parse::<Command>(),
            Err(CommandError::Usage("delete <n>"))
        );
        assert_eq!(
            "login onlyemail".parse::<Command>(),
            Err(CommandError::Usage("login <email> <password>"))
        );
        assert!(matches!(
            "fly me".parse::<Command>(),
            Err(CommandError::Unknown(_))
        ));
    }

    #[test]
    fn test_book_with_blank_side_parses() {
        // Blank locations are rejected by validation, not by the parser.
        assert_eq!(
            "book   -> Office".parse::<Command>(),
            Ok(Command::Book {
                pickup: "".into(),
                drop: " Office".into(),
            })
        );
    }

    #[test]
    fn test_render_states() {
        let loading = RideListState {
            is_loading: true,
            ..RideListState::default()
        };
        assert!(render_rides(&loading).contains("Loading rides..."));
        assert!(!render_rides(&loading).contains("No rides yet."));

        let empty = RideListState::default();
        assert!(render_rides(&empty).contains("No rides yet."));

        let listed = RideListState {
            rides: vec![RideRecord {
                id: "r1".into(),
                pickup: "Home".into(),
                drop: "Office".into(),
                created_at: None,
            }],
            error: Some("offline".into()),
            pending_writes: 1,
            ..RideListState::default()
        };
        let text = render_rides(&listed);
        assert!(text.contains("  1. Home → Office"));
        assert!(text.contains("! offline"));
        assert!(text.contains("Booking..."));
    }
}
