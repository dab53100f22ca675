//! Location-driven shell around the two screens.
//!
//! The current history entry decides which screen is up and which query key
//! it shows. Every navigation goes through the history first; screens are
//! then brought in line with the new location, the cache, and any fetch
//! still in flight.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{DefaultTerminal, Frame};
use tracing::{debug, info, warn};

use crate::browser::CompaniesBrowser;
use crate::company::CompanyView;
use crate::error::Result;
use crate::location::{History, Location, Route};
use crate::query::{Fetcher, Payload, QueryCache, QueryKey, Response};
use crate::tui::{Screen, ViewAction};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum View {
    Companies(CompaniesBrowser),
    Company(CompanyView),
}

impl View {
    fn for_location(location: &Location) -> Result<Self> {
        Ok(match location.route()? {
            Route::Companies(state) => Self::Companies(CompaniesBrowser::new(state)),
            Route::Company(id) => Self::Company(CompanyView::new(id)),
        })
    }

    fn key(&self) -> QueryKey {
        match self {
            Self::Companies(browser) => QueryKey::Companies(browser.state().clone()),
            Self::Company(view) => QueryKey::Company(view.id().to_string()),
        }
    }

    fn screen(&mut self) -> &mut dyn Screen {
        match self {
            Self::Companies(browser) => browser,
            Self::Company(view) => view,
        }
    }
}

pub struct App {
    history: History,
    view: View,
    cache: QueryCache,
    fetcher: Fetcher,
}

impl App {
    pub fn new(start: Location, fetcher: Fetcher, stale_after: Duration) -> Result<Self> {
        let view = View::for_location(&start)?;
        let mut app = Self {
            history: History::new(start),
            view,
            cache: QueryCache::new(stale_after),
            fetcher,
        };
        app.load();
        Ok(app)
    }

    pub fn location(&self) -> &Location {
        self.history.current()
    }

    /// Rebuild the screen for the current history entry. Used after push and
    /// back, where the route itself may change.
    fn enter_location(&mut self) -> Result<()> {
        info!(location = %self.history.current(), "navigate");
        self.view = View::for_location(self.history.current())?;
        self.load();
        Ok(())
    }

    /// Show whatever the cache has for the current key and fetch unless it
    /// is still fresh.
    fn load(&mut self) {
        let key = self.view.key();
        let fresh = self.cache.is_fresh(&key);
        match (&mut self.view, self.cache.get(&key)) {
            (View::Companies(browser), cached) => {
                let state = browser.state().clone();
                let page = match cached {
                    Some(Payload::Companies(page)) => Some(page),
                    _ => None,
                };
                browser.sync(state, page, fresh);
            }
            (View::Company(view), cached) => {
                let company = match cached {
                    Some(Payload::Company(company)) => Some(company),
                    _ => None,
                };
                view.sync(company, fresh);
            }
        }
        if !fresh {
            self.fetcher.request(key);
        }
    }

    /// Returns false when the app should exit.
    pub fn handle_action(&mut self, action: ViewAction) -> Result<bool> {
        match action {
            ViewAction::Continue => {}
            ViewAction::Close => return Ok(false),
            ViewAction::Replace(state) => {
                let next = self.history.current().with_query_state(&state);
                debug!(location = %next, "replace");
                self.history.replace(next);
                if let View::Companies(browser) = &mut self.view {
                    browser.sync(state, None, false);
                }
                self.load();
            }
            ViewAction::OpenCompany(id) => {
                // Route first so a bad id never lands in the history.
                let next = Location::company(&id);
                match View::for_location(&next) {
                    Ok(view) => {
                        info!(location = %next, "navigate");
                        self.history.push(next);
                        self.view = view;
                        self.load();
                    }
                    Err(e) => {
                        warn!(location = %next, error = %e, "cannot open company");
                        if let View::Companies(browser) = &mut self.view {
                            browser.set_status(e.to_string());
                        }
                    }
                }
            }
            ViewAction::Back => {
                if self.history.back() {
                    self.enter_location()?;
                } else if matches!(self.view, View::Company(_)) {
                    // Opened straight onto a company: fall back to the list.
                    self.history.replace(Location::root());
                    self.enter_location()?;
                }
            }
            ViewAction::Refetch => {
                let key = self.view.key();
                self.cache.invalidate(&key);
                match &mut self.view {
                    View::Companies(browser) => browser.mark_loading(),
                    View::Company(view) => view.mark_loading(),
                }
                self.fetcher.request(key);
            }
        }
        Ok(true)
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let action = self.view.screen().handle_key(code);
        self.handle_action(action)
    }

    /// Store a finished fetch and show it if its key is still the one on
    /// screen. Anything else is kept in the cache only.
    pub fn on_response(&mut self, response: Response) {
        let Response { key, result } = response;
        if let Ok(payload) = &result {
            self.cache.insert(key.clone(), payload.clone());
        }
        let applied = match (&mut self.view, &key, result) {
            (View::Companies(browser), QueryKey::Companies(state), Ok(Payload::Companies(page))) => {
                browser.apply(state, &Ok(page))
            }
            (View::Companies(browser), QueryKey::Companies(state), Err(failure)) => {
                browser.apply(state, &Err(failure))
            }
            (View::Company(view), QueryKey::Company(id), Ok(Payload::Company(company))) => {
                view.apply(id, &Ok(company))
            }
            (View::Company(view), QueryKey::Company(id), Err(failure)) => {
                view.apply(id, &Err(failure))
            }
            _ => false,
        };
        if !applied {
            debug!(?key, "discarded response for a key no longer on screen");
        }
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        self.view.screen().draw(frame);
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            while let Some(response) = self.fetcher.try_next() {
                self.on_response(response);
            }

            if let Err(e) = terminal.draw(|frame| self.draw(frame)) {
                break Err(e.into());
            }

            match event::poll(POLL_INTERVAL) {
                Err(e) => break Err(e.into()),
                Ok(false) => continue,
                Ok(true) => {}
            }

            match event::read() {
                Err(e) => break Err(e.into()),
                Ok(Event::Key(key)) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        break Ok(());
                    }
                    match self.handle_key(key.code) {
                        Ok(true) => {}
                        Ok(false) => break Ok(()),
                        Err(e) => break Err(e),
                    }
                }
                _ => {}
            }
        }
    }
}
