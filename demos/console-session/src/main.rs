//! Terminal demo: every line typed on stdin counts as a key press.
//!
//! Commands: `info` prints the session snapshot, `stay` dismisses the
//! warning, `logout` ends the session. Anything else is plain activity.
//!
//! Environment:
//! - `EXAMDESK_SESSION_FILE`: where the session record lives
//!   (default: `examdesk-session.json` in the temp dir)
//! - `EXAMDESK_TIMEOUT_SECS`: shorten the inactivity timeout to try it out
//! - `RUST_LOG`: log filter (default `info`)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use examdesk::prelude::*;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Development authenticator
// ---------------------------------------------------------------------------

/// Accepts the password "demo" for any phone number and issues a random
/// token. Stands in for the REST backend.
struct DevAuth;

impl DevAuth {
    fn issue(phone: &str, name: &str) -> AuthGrant {
        let token: String = (0..16)
            .map(|_| format!("{:02x}", rand::rng().random::<u8>()))
            .collect();
        AuthGrant {
            token,
            user: UserProfile {
                id: phone.trim_start_matches('+').to_string(),
                name: name.to_string(),
                phone: phone.to_string(),
                role: Role::Editor,
            },
        }
    }
}

impl Authenticator for DevAuth {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, SessionError> {
        if credentials.password != "demo" {
            return Err(SessionError::AuthFailed("invalid phone or password".into()));
        }
        Ok(Self::issue(&credentials.phone, "Demo Editor"))
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant, SessionError> {
        Ok(Self::issue(&registration.phone, &registration.name))
    }
}

fn session_config() -> SessionConfig {
    let Some(secs) = std::env::var("EXAMDESK_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    else {
        return SessionConfig::default();
    };
    let timeout = Duration::from_secs(secs);
    SessionConfig {
        session_timeout: timeout,
        activity_check_interval: (timeout / 30).max(Duration::from_secs(1)),
        warning_threshold: timeout / 6,
        warning_poll_interval: (timeout / 60).max(Duration::from_secs(1)),
    }
}

fn session_file() -> PathBuf {
    std::env::var_os("EXAMDESK_SESSION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("examdesk-session.json"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = session_file();
    let client = SessionClient::builder(DevAuth)
        .file_store(&path)
        .config(session_config())
        .build();

    if client.manager().is_session_valid() {
        let name = client.manager().current_user().map(|u| u.name);
        println!("resuming session for {}", name.as_deref().unwrap_or("unknown user"));
    } else {
        let user = client.login("+254700000000", "demo").await?;
        println!("logged in as {} ({})", user.name, user.phone);
    }
    tracing::info!(path = %path.display(), "using session file");

    let page = Arc::new(EventDispatcher::new());
    let (expired_tx, mut expired_rx) = oneshot::channel();
    let tracking = client.start_tracking(page.clone(), move |reason| {
        let _ = expired_tx.send(reason);
    })?;
    let mut warnings = tracking.warning().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            reason = &mut expired_rx => {
                match reason {
                    Ok(reason) => println!("session expired ({reason}); please log in again"),
                    Err(_) => println!("session ended"),
                }
                break;
            }
            changed = warnings.changed() => {
                if changed.is_err() {
                    break;
                }
                match *warnings.borrow_and_update() {
                    WarningState::Visible { minutes_remaining } => println!(
                        "warning: your session expires in {minutes_remaining} minute(s); type `stay` to continue"
                    ),
                    WarningState::Hidden => {}
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match line.trim() {
                    "logout" => {
                        client.logout();
                        println!("logged out");
                        break;
                    }
                    "info" => {
                        println!("{}", serde_json::to_string_pretty(&client.manager().session_info())?);
                    }
                    "stay" => {
                        page.dispatch(&UiEvent::new(EventKind::Click));
                        tracking.warning().stay_logged_in();
                    }
                    _ => {
                        page.dispatch(&UiEvent::new(EventKind::KeyDown));
                    }
                }
            }
        }
    }

    Ok(())
}
