use std::sync::Arc;

use tracing::{info, warn};

use super::{client, runtime};
use crate::app::App;
use crate::error::Result;
use crate::location::Location;
use crate::query::Fetcher;
use crate::settings::{load_settings, save_settings, Settings};
use crate::tui;

pub fn run(settings: &Settings, location: Option<String>, resume: bool) -> Result<()> {
    let start = start_location(settings, location.as_deref(), resume)?;
    let runtime = runtime()?;
    let client = client(settings)?;
    let fetcher = Fetcher::new(Arc::new(client), runtime.handle().clone());
    let mut app = App::new(start, fetcher, settings.stale_after())?;

    info!(location = %app.location(), "browse session started");
    let mut terminal = tui::init_terminal();
    let result = app.run(&mut terminal);
    tui::restore_terminal(terminal);

    // Re-read so a `--api-url` override isn't persisted with the location.
    let mut saved = load_settings();
    saved.last_location = Some(app.location().to_string());
    info!(location = %app.location(), "browse session ended");
    session_outcome(result, save_settings(&saved))
}

/// The session's own error is what the user sees. Failing to remember the
/// location only gets logged.
fn session_outcome(session: Result<()>, saved: Result<()>) -> Result<()> {
    if let Err(e) = saved {
        warn!(error = %e, "could not save last location");
    }
    session
}

/// An explicit location must parse; a saved one that no longer does is
/// dropped in favour of the first page.
fn start_location(settings: &Settings, location: Option<&str>, resume: bool) -> Result<Location> {
    if let Some(raw) = location {
        return Location::parse(raw);
    }
    if !resume {
        return Ok(Location::root());
    }
    match settings.last_location.as_deref() {
        Some(saved) => Ok(Location::parse(saved).unwrap_or_else(|e| {
            warn!(saved, error = %e, "ignoring saved location");
            Location::root()
        })),
        None => Ok(Location::root()),
    }
}
