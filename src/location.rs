//! The dashboard's address bar.
//!
//! A [`Location`] plays the part of a browser URL: the list view's page and
//! search text are derived from its `page` and `q` parameters and every user
//! edit is written back into it. [`History`] keeps the stack of visited
//! locations; query edits replace the current entry, opening a company pushes.

use std::fmt;

use url::Url;

use crate::error::{FilingsError, Result};

pub const PAGE_PARAM: &str = "page";
pub const SEARCH_PARAM: &str = "q";

const LOCAL_ORIGIN: &str = "filings://local/";

/// Page and search text currently shown by the companies list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryState {
    pub page: u32,
    pub search: String,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            search: String::new(),
        }
    }
}

impl QueryState {
    pub fn new(page: u32, search: impl Into<String>) -> Self {
        Self {
            page: page.max(1),
            search: search.into(),
        }
    }

    /// Decode from `(key, value)` pairs. Missing or malformed `page` is 1,
    /// missing `q` is empty; the first occurrence of each wins.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut page = None;
        let mut search = None;
        for (key, value) in pairs {
            match key {
                PAGE_PARAM if page.is_none() => page = Some(parse_page(value)),
                SEARCH_PARAM if search.is_none() => search = Some(value.to_string()),
                _ => {}
            }
        }
        Self {
            page: page.unwrap_or(1),
            search: search.unwrap_or_default(),
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            search: self.search.clone(),
        }
    }

    /// A new search always starts again from the first page.
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            page: 1,
            search: search.into(),
        }
    }
}

fn parse_page(value: &str) -> u32 {
    match value.trim().parse::<u32>() {
        Ok(page) if page >= 1 => page,
        _ => 1,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Companies(QueryState),
    Company(String),
}

/// Path plus query parameters, e.g. `/?page=2&q=acme` or `/companies/12-3456789`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let relative = if trimmed.is_empty() {
            "/".to_string()
        } else if trimmed.starts_with('/') || trimmed.starts_with('?') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        let base = Url::parse(LOCAL_ORIGIN)?;
        let url = base
            .join(&relative)
            .map_err(|e| FilingsError::InvalidLocation(format!("{input}: {e}")))?;
        let location = Self { url };
        location.route()?;
        Ok(location)
    }

    pub fn company(id: &str) -> Self {
        let mut url = Self::root().url;
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear().push("companies").push(id);
        }
        Self { url }
    }

    pub fn root() -> Self {
        // LOCAL_ORIGIN is a valid constant URL.
        let url = Url::parse(LOCAL_ORIGIN).unwrap_or_else(|_| unreachable!());
        Self { url }
    }

    pub fn route(&self) -> Result<Route> {
        let segments: Vec<&str> = self
            .url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        match segments.as_slice() {
            [] => Ok(Route::Companies(self.query_state())),
            ["companies", id] => {
                // Path segments keep a literal '+', so shield it from form decoding.
                let raw = format!("id={}", id.replace('+', "%2B"));
                let id = url::form_urlencoded::parse(raw.as_bytes())
                    .next()
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default();
                Ok(Route::Company(id))
            }
            _ => Err(FilingsError::InvalidLocation(self.to_string())),
        }
    }

    pub fn query_state(&self) -> QueryState {
        let pairs: Vec<(String, String)> = self.url.query_pairs().into_owned().collect();
        QueryState::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Copy of this location with `page` and `q` set from `state`. Other
    /// parameters keep their value and position; missing ones are appended.
    pub fn with_query_state(&self, state: &QueryState) -> Self {
        let mut pairs: Vec<(String, String)> = self.url.query_pairs().into_owned().collect();
        set_param(&mut pairs, PAGE_PARAM, state.page.to_string());
        set_param(&mut pairs, SEARCH_PARAM, state.search.clone());

        let mut url = self.url.clone();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        Self { url }
    }
}

fn set_param(pairs: &mut Vec<(String, String)>, key: &str, value: String) {
    let mut seen = false;
    pairs.retain_mut(|(k, v)| {
        if k != key {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        *v = value.clone();
        true
    });
    if !seen {
        pairs.push((key.to_string(), value));
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.path())?;
        match self.url.query() {
            Some(q) if !q.is_empty() => write!(f, "?{q}"),
            _ => Ok(()),
        }
    }
}

/// Stack of visited locations.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Location>,
    index: usize,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &Location {
        &self.entries[self.index]
    }

    /// Add a new entry after the current one, dropping anything after it.
    pub fn push(&mut self, location: Location) {
        self.entries.truncate(self.index + 1);
        self.entries.push(location);
        self.index = self.entries.len() - 1;
    }

    /// Overwrite the current entry without growing the stack.
    pub fn replace(&mut self, location: Location) {
        self.entries[self.index] = location;
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_round_trip() {
        let state = QueryState::new(3, "acme");
        let location = Location::root().with_query_state(&state);
        assert_eq!(location.to_string(), "/?page=3&q=acme");
        let decoded = Location::parse(&location.to_string()).unwrap();
        assert_eq!(decoded.query_state(), state);
    }

    #[test]
    fn test_absent_params_default() {
        assert_eq!(QueryState::from_pairs(Vec::<(&str, &str)>::new()), QueryState::new(1, ""));
        let location = Location::parse("/").unwrap();
        assert_eq!(location.route().unwrap(), Route::Companies(QueryState::default()));
    }

    #[test]
    fn test_malformed_page_defaults_to_one() {
        let page = |query: &str| Location::parse(query).unwrap().query_state().page;
        assert_eq!(page("/?page=abc&q=x"), 1);
        assert_eq!(page("/?page=0"), 1);
        assert_eq!(page("/?page=-4"), 1);
        assert_eq!(page("/?page=7&page=9"), 7);
    }

    #[test]
    fn test_search_text_is_encoded() {
        let state = QueryState::new(1, "Food & Shelter");
        let location = Location::root().with_query_state(&state);
        assert_eq!(location.to_string(), "/?page=1&q=Food+%26+Shelter");
        assert_eq!(location.query_state().search, "Food & Shelter");
    }

    #[test]
    fn test_unknown_params_survive_edits() {
        let location = Location::parse("/?sort=name&page=2").unwrap();
        let next = location.with_query_state(&location.query_state().with_search("acme"));
        assert_eq!(next.to_string(), "/?sort=name&page=1&q=acme");
    }

    #[test]
    fn test_company_route() {
        let location = Location::company("12-3456789");
        assert_eq!(location.to_string(), "/companies/12-3456789");
        assert_eq!(location.route().unwrap(), Route::Company("12-3456789".into()));
        let parsed = Location::parse("companies/99-0000001").unwrap();
        assert_eq!(parsed.route().unwrap(), Route::Company("99-0000001".into()));
    }

    #[test]
    fn test_unknown_path_rejected() {
        assert!(matches!(
            Location::parse("/settings"),
            Err(FilingsError::InvalidLocation(_))
        ));
    }

    #[test]
    fn test_search_edit_on_page_five_replaces_entry() {
        let mut history = History::new(Location::parse("/?page=1&q=").unwrap());
        history.push(Location::parse("/?page=5&q=acme").unwrap());
        assert_eq!(history.len(), 2);

        let current = history.current().clone();
        let next = current.query_state().with_search("acme foods");
        history.replace(current.with_query_state(&next));

        assert_eq!(history.len(), 2);
        assert_eq!(history.current().query_state(), QueryState::new(1, "acme foods"));

        // Back skips straight past the edit to the earlier entry.
        assert!(history.back());
        assert_eq!(history.current().query_state(), QueryState::new(1, ""));
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut history = History::new(Location::parse("/").unwrap());
        history.push(Location::company("a"));
        assert!(history.back());
        history.push(Location::company("b"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().route().unwrap(), Route::Company("b".into()));
        assert!(history.back());
        assert_eq!(history.current().to_string(), "/");
    }
}
