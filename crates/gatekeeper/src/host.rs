//! Terminal host for a login session.
//!
//! Stands in for the login window: reads one command per line, forwards it to
//! the session, and prints the outcome. Everything runs in a single task; the
//! lockout interval is only polled while the gate is locked.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use gatekeeper_common::{GatekeeperError, Point, Quadrant};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::auth::Account;
use crate::captcha::{DragIntent, data_uri, encode_png, render_board};
use crate::gate::Clock;
use crate::session::{LoginSession, Refusal, SessionEvent, SessionOutcome};

const HELP: &str = "\
commands:
  email <address>          set the email field
  password <secret>        set the password field
  drag <tile> <dx> <dy>    move a tile (tl, tr, bl, br)
  press <x> <y>            grab the tile under the pointer
  move <x> <y>             move the pointer
  release                  drop the held tile
  check                    verify the puzzle
  reset                    reshuffle the puzzle
  show <file.png>          render the board
  show --uri               print the board as a data: URI
  status                   print form state as JSON
  login                    submit the form
  quit";

/// One line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Email(String),
    Password(String),
    Drag(DragIntent),
    Press(Point),
    Move(Point),
    Release,
    Check,
    Reset,
    Show(PathBuf),
    ShowUri,
    Status,
    Login,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = GatekeeperError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        let command = match (verb.as_str(), args.as_slice()) {
            ("email", rest) => Command::Email(rest.join(" ")),
            ("password", rest) => Command::Password(rest.join(" ")),
            ("drag", [tile, dx, dy]) => {
                let tile = tile
                    .parse::<Quadrant>()
                    .map_err(GatekeeperError::InvalidInput)?;
                Command::Drag(DragIntent::new(tile, number(dx)?, number(dy)?))
            }
            ("press", [x, y]) => Command::Press(Point::new(number(x)?, number(y)?)),
            ("move", [x, y]) => Command::Move(Point::new(number(x)?, number(y)?)),
            ("release", []) => Command::Release,
            ("check", []) => Command::Check,
            ("reset", []) => Command::Reset,
            ("show", ["--uri"]) => Command::ShowUri,
            ("show", [path]) => Command::Show(PathBuf::from(*path)),
            ("status", []) => Command::Status,
            ("login", []) => Command::Login,
            ("help", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            _ => {
                return Err(GatekeeperError::InvalidInput(format!(
                    "unrecognised command '{}' (try 'help')",
                    line.trim()
                )));
            }
        };

        Ok(command)
    }
}

fn number(value: &str) -> Result<i32, GatekeeperError> {
    value
        .parse()
        .map_err(|_| GatekeeperError::InvalidInput(format!("'{}' is not a whole number", value)))
}

/// Drive `session` from `input` until login succeeds, input ends, or shutdown.
///
/// Returns the authenticated account, if any.
pub async fn run<R, W>(
    session: &mut LoginSession,
    clock: &dyn Clock,
    input: R,
    output: &mut W,
    poll_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<Option<Account>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut lock_poll = tokio::time::interval(poll_interval);
    lock_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    write_line(output, &session.gate().attempts_label()).await?;

    loop {
        let locked = session.is_locked();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read command")? else {
                    return Ok(None);
                };
                if line.trim().is_empty() {
                    continue;
                }

                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        write_line(output, &e.to_string()).await?;
                        continue;
                    }
                };

                if command == Command::Quit {
                    return Ok(None);
                }
                if let Some(account) = execute(session, clock, command, output).await? {
                    return Ok(Some(account));
                }
            }
            _ = lock_poll.tick(), if locked => {
                if session.handle(SessionEvent::Tick, clock.now())? == SessionOutcome::Unlocked {
                    write_line(output, "Login unlocked").await?;
                    write_line(output, &session.gate().attempts_label()).await?;
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Shutdown requested, closing login form");
                return Ok(None);
            }
        }
    }
}

async fn execute<W>(
    session: &mut LoginSession,
    clock: &dyn Clock,
    command: Command,
    output: &mut W,
) -> Result<Option<Account>>
where
    W: AsyncWrite + Unpin,
{
    let event = match command {
        Command::Email(email) => SessionEvent::EmailEntered(email),
        Command::Password(password) => SessionEvent::PasswordEntered(password),
        Command::Drag(intent) => SessionEvent::Drag(intent),
        Command::Press(at) => SessionEvent::PointerPressed(at),
        Command::Move(at) => SessionEvent::PointerMoved(at),
        Command::Release => SessionEvent::PointerReleased,
        Command::Check => SessionEvent::CheckCaptcha,
        Command::Reset => SessionEvent::ResetCaptcha,
        Command::Login => SessionEvent::Submit,
        Command::Show(path) => {
            let message = match write_board(session, &path).await {
                Ok(()) => format!("Board written to {}", path.display()),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to render board");
                    format!("Could not write board: {:#}", e)
                }
            };
            write_line(output, &message).await?;
            return Ok(None);
        }
        Command::ShowUri => {
            let message = match encode_png(&render_board(session.puzzle())) {
                Ok(png) => data_uri(&png),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode board");
                    format!("Could not encode board: {}", e)
                }
            };
            write_line(output, &message).await?;
            return Ok(None);
        }
        Command::Status => {
            let snapshot = serde_json::to_string_pretty(&session.snapshot())?;
            write_line(output, &snapshot).await?;
            return Ok(None);
        }
        Command::Help => {
            write_line(output, HELP).await?;
            return Ok(None);
        }
        Command::Quit => return Ok(None),
    };

    let now = clock.now();
    let outcome = session.handle(event, now)?;
    if let Some(message) = describe(session, &outcome, now) {
        write_line(output, &message).await?;
    }

    match outcome {
        SessionOutcome::Authenticated { account, .. } => Ok(Some(account)),
        _ => Ok(None),
    }
}

async fn write_board(session: &LoginSession, path: &Path) -> Result<()> {
    let png = encode_png(&render_board(session.puzzle()))?;
    tokio::fs::write(path, png)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// User-facing text for an outcome
fn describe(
    session: &LoginSession,
    outcome: &SessionOutcome,
    now: DateTime<Utc>,
) -> Option<String> {
    let text = match outcome {
        SessionOutcome::Updated | SessionOutcome::Ignored => return None,
        SessionOutcome::CaptchaPassed => "Captcha passed!".to_string(),
        SessionOutcome::CaptchaFailed { remaining } => format!(
            "Captcha failed! Attempts left: {}\n{}",
            remaining,
            session.gate().attempts_label()
        ),
        SessionOutcome::LockedOut { until } => format!(
            "Login locked until {}\n{}",
            until.format("%H:%M:%S UTC"),
            session.gate().attempts_label()
        ),
        SessionOutcome::CaptchaReset => "Puzzle reshuffled".to_string(),
        SessionOutcome::Refused(Refusal::Locked { until }) => {
            let remaining = session.gate().lock_remaining(now).unwrap_or_else(TimeDelta::zero);
            format!(
                "Login is locked until {} ({} left)",
                until.format("%H:%M:%S UTC"),
                countdown(remaining)
            )
        }
        SessionOutcome::Refused(Refusal::NotReady) => {
            "Fill in email and password and solve the puzzle first".to_string()
        }
        SessionOutcome::Authenticated { account, landing } => {
            let mut text = String::new();
            if let Some(notice) = account.role.welcome_notice() {
                text.push_str(notice);
                text.push('\n');
            }
            text.push_str(&format!(
                "Signed in as {} ({}), opening {:?}",
                account.display_name, account.role, landing
            ));
            text
        }
        SessionOutcome::InvalidCredentials => {
            "Wrong email or password! Puzzle reshuffled".to_string()
        }
        SessionOutcome::Unlocked => "Login unlocked".to_string(),
    };
    Some(text)
}

/// `m:ss`, rounded up so the last second still reads 0:01
fn countdown(remaining: TimeDelta) -> String {
    let secs = (remaining.num_milliseconds().max(0) + 999) / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
