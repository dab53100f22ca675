use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::error::{FailureKind, FetchFailure};
use crate::fmt::{self, currency};
use crate::location::QueryState;
use crate::models::{CompaniesPage, Metric, TaxFiling};
use crate::pagination::{showing_range, PageToken, Pager};
use crate::tui::{
    self, Screen, ViewAction, CURRENT_PAGE_STYLE, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE,
    LINK_STYLE, MUTED_STYLE, SELECTED_STYLE,
};

/// Below this width the table drops prior-year and website columns.
const WIDE_LAYOUT_MIN: u16 = 230;

const MONEY_WIDTH: u16 = 13;
const DELTA_WIDTH: u16 = 11;

fn column_widths(wide: bool) -> Vec<Constraint> {
    let mut widths = vec![Constraint::Fill(1), Constraint::Length(10)];
    if wide {
        widths.push(Constraint::Length(6));
        widths.push(Constraint::Length(4));
        widths.extend([Constraint::Length(MONEY_WIDTH); 6]);
        widths.extend([Constraint::Length(9); 2]);
    } else {
        widths.push(Constraint::Length(4));
        widths.extend([Constraint::Length(MONEY_WIDTH); 3]);
        widths.push(Constraint::Length(9));
    }
    widths.extend([Constraint::Length(DELTA_WIDTH); 4]);
    if wide {
        widths.push(Constraint::Length(20));
    }
    widths
}

enum BrowseMode {
    Normal,
    Search,
    GotoPage(String),
}

/// The companies list: search box, one page of filings, and the page strip.
///
/// The browser never changes its own query state. Key presses produce
/// [`ViewAction::Replace`]; the app writes the new location and calls
/// [`CompaniesBrowser::sync`] with the result.
pub struct CompaniesBrowser {
    state: QueryState,
    /// Last page received and the state it was requested for. Kept while a
    /// newer state is loading so the table never flashes empty.
    page: Option<(QueryState, CompaniesPage)>,
    loading: bool,
    error: Option<FetchFailure>,
    mode: BrowseMode,
    selected: usize,
    status_message: Option<String>,
    updated_at: Option<DateTime<Local>>,
    table_state: TableState,
}

impl CompaniesBrowser {
    pub fn new(state: QueryState) -> Self {
        Self {
            state,
            page: None,
            loading: true,
            error: None,
            mode: BrowseMode::Normal,
            selected: 0,
            status_message: None,
            updated_at: None,
            table_state: TableState::default(),
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The page currently on screen and the state it belongs to.
    #[cfg(test)]
    pub fn displayed(&self) -> Option<&(QueryState, CompaniesPage)> {
        self.page.as_ref()
    }

    /// Adopt a (possibly new) query state. `cached` is shown immediately;
    /// without it the previous rows stay up with a loading marker.
    pub fn sync(&mut self, state: QueryState, cached: Option<&CompaniesPage>, fresh: bool) {
        if state != self.state {
            self.selected = 0;
        }
        self.state = state;
        self.error = None;
        match cached {
            Some(page) => {
                self.page = Some((self.state.clone(), page.clone()));
                self.loading = !fresh;
            }
            None => self.loading = true,
        }
        self.clamp_selection();
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Apply a response. Returns false, leaving the view untouched, when the
    /// response was requested for a state that is no longer current.
    pub fn apply(
        &mut self,
        requested: &QueryState,
        result: &Result<CompaniesPage, FetchFailure>,
    ) -> bool {
        if *requested != self.state {
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.page = Some((requested.clone(), page.clone()));
                self.error = None;
                self.updated_at = Some(Local::now());
            }
            Err(failure) => self.error = Some(failure.clone()),
        }
        self.clamp_selection();
        true
    }

    fn filings(&self) -> &[TaxFiling] {
        self.page.as_ref().map(|(_, p)| p.filings()).unwrap_or(&[])
    }

    pub fn selected_filing(&self) -> Option<&TaxFiling> {
        self.filings().get(self.selected)
    }

    fn pager(&self) -> Option<Pager> {
        self.page
            .as_ref()
            .map(|(_, p)| Pager::new(self.state.page, p.meta.total_pages))
    }

    fn clamp_selection(&mut self) {
        let len = self.filings().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn go_to(&mut self, target: Option<u32>) -> ViewAction {
        match target {
            Some(page) if page != self.state.page => ViewAction::Replace(self.state.with_page(page)),
            _ => ViewAction::Continue,
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> ViewAction {
        let pager = self.pager();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => ViewAction::Close,
            KeyCode::Down => {
                if self.selected + 1 < self.filings().len() {
                    self.selected += 1;
                }
                ViewAction::Continue
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                ViewAction::Continue
            }
            KeyCode::Enter => match self.selected_filing() {
                Some(filing) if filing.ein.trim().is_empty() => {
                    self.status_message = Some("This filing has no EIN to open".into());
                    ViewAction::Continue
                }
                Some(filing) => ViewAction::OpenCompany(filing.ein.clone()),
                None => ViewAction::Continue,
            },
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                self.go_to(pager.and_then(|p| p.next()))
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                self.go_to(pager.and_then(|p| p.previous()))
            }
            KeyCode::Home => self.go_to(pager.and_then(|p| p.first())),
            KeyCode::End => self.go_to(pager.and_then(|p| p.last())),
            KeyCode::Char('g') => {
                self.mode = BrowseMode::GotoPage(String::new());
                ViewAction::Continue
            }
            KeyCode::Char('/') | KeyCode::Char('s') => {
                self.mode = BrowseMode::Search;
                ViewAction::Continue
            }
            KeyCode::Char('r') => ViewAction::Refetch,
            KeyCode::Char('b') | KeyCode::Backspace => ViewAction::Back,
            _ => ViewAction::Continue,
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Down => {
                self.mode = BrowseMode::Normal;
                ViewAction::Continue
            }
            KeyCode::Char(c) => {
                let mut search = self.state.search.clone();
                search.push(c);
                ViewAction::Replace(self.state.with_search(search))
            }
            KeyCode::Backspace => {
                let mut search = self.state.search.clone();
                if search.pop().is_none() {
                    return ViewAction::Continue;
                }
                ViewAction::Replace(self.state.with_search(search))
            }
            KeyCode::Delete if !self.state.search.is_empty() => {
                ViewAction::Replace(self.state.with_search(String::new()))
            }
            _ => ViewAction::Continue,
        }
    }

    fn handle_goto_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Esc => self.mode = BrowseMode::Normal,
            KeyCode::Backspace => {
                if let BrowseMode::GotoPage(input) = &mut self.mode {
                    input.pop();
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let BrowseMode::GotoPage(input) = &mut self.mode {
                    input.push(c);
                }
            }
            KeyCode::Enter => return self.submit_goto(),
            _ => {}
        }
        ViewAction::Continue
    }

    fn submit_goto(&mut self) -> ViewAction {
        let mode = std::mem::replace(&mut self.mode, BrowseMode::Normal);
        let BrowseMode::GotoPage(input) = mode else {
            return ViewAction::Continue;
        };
        let Some(pager) = self.pager() else {
            return ViewAction::Continue;
        };
        let requested = input.trim().parse::<u32>().ok();
        match requested.and_then(|p| pager.goto(p)) {
            Some(page) => self.go_to(Some(page)),
            None => {
                self.status_message = Some(format!(
                    "Page {} is out of range (1-{})",
                    input.trim(),
                    pager.total_pages
                ));
                ViewAction::Continue
            }
        }
    }

    fn table_rows(&self, wide: bool, name_width: usize) -> Vec<Row<'static>> {
        self.filings()
            .iter()
            .map(|f| {
                let mut name_lines = vec![Line::from(f.display_name().to_string())];
                let mut height = 2u16;
                if wide {
                    if let Some(mission) = f.mission() {
                        let (wrapped, lines) = tui::wrap_text(mission, name_width);
                        // Cap the mission so one long statement can't eat the page.
                        for line in wrapped.lines().take(2) {
                            name_lines.push(Line::from(Span::styled(line.to_string(), MUTED_STYLE)));
                        }
                        height = height.max(1 + lines.min(2));
                    }
                }
                let deltas = Metric::ALL
                    .iter()
                    .map(|m| Cell::from(tui::delta_text(f, *m)));
                let cells: Vec<Cell> = if wide {
                    let website = match f.website() {
                        Some(url) => Cell::from(Span::styled(url.to_string(), LINK_STYLE)),
                        None => Cell::from(Span::styled("N/A", MUTED_STYLE)),
                    };
                    [
                        Cell::from(Text::from(name_lines)),
                        Cell::from(f.ein.clone()),
                        Cell::from(f.return_type.clone()),
                        Cell::from(f.tax_year.to_string()),
                        Cell::from(currency(f.total_revenue)),
                        Cell::from(currency(f.py_total_revenue)),
                        Cell::from(currency(f.total_expenses)),
                        Cell::from(currency(f.py_total_expenses)),
                        Cell::from(currency(f.total_assets)),
                        Cell::from(currency(f.py_total_assets)),
                        Cell::from(fmt::count(f.employee_count)),
                        Cell::from(fmt::count(f.py_employee_count)),
                    ]
                    .into_iter()
                    .chain(deltas)
                    .chain(std::iter::once(website))
                    .collect()
                } else {
                    [
                        Cell::from(Text::from(name_lines)),
                        Cell::from(f.ein.clone()),
                        Cell::from(f.tax_year.to_string()),
                        Cell::from(currency(f.total_revenue)),
                        Cell::from(currency(f.total_expenses)),
                        Cell::from(currency(f.total_assets)),
                        Cell::from(fmt::count(f.employee_count)),
                    ]
                    .into_iter()
                    .chain(deltas)
                    .collect()
                };
                Row::new(cells).height(height)
            })
            .collect()
    }

    fn page_strip(&self) -> Option<Line<'static>> {
        let (_, page) = self.page.as_ref()?;
        if page.filings().is_empty() || page.meta.total_pages == 0 {
            return None;
        }
        let pager = Pager::new(self.state.page, page.meta.total_pages);
        let mut spans = Vec::new();
        if let Some((start, end)) = showing_range(self.state.page, page.meta.total_count) {
            spans.push(Span::styled(
                format!(
                    "Showing {} to {} of {} results   ",
                    fmt::number(start),
                    fmt::number(end),
                    fmt::number(page.meta.total_count)
                ),
                FOOTER_STYLE,
            ));
        }
        let nav_style = |enabled: bool| if enabled { Style::default() } else { MUTED_STYLE };
        spans.push(Span::styled("\u{2039} Prev ", nav_style(pager.previous().is_some())));
        for token in pager.tokens() {
            spans.push(match token {
                PageToken::Page(p) if p == self.state.page => {
                    Span::styled(format!(" {p} "), CURRENT_PAGE_STYLE)
                }
                PageToken::Page(p) => Span::raw(format!(" {p} ")),
                PageToken::Ellipsis => Span::styled(" \u{2026} ", MUTED_STYLE),
            });
        }
        spans.push(Span::styled(" Next \u{203a}", nav_style(pager.next().is_some())));
        Some(Line::from(spans))
    }
}

impl Screen for CompaniesBrowser {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let wide = area.width >= WIDE_LAYOUT_MIN;

        let [title_area, search_area, table_area, strip_area, status_area, keys_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

        // Title + meta
        let mut title = vec![Span::styled("Tax Filings", HEADER_STYLE)];
        if let Some((_, page)) = &self.page {
            title.push(Span::styled(
                format!(
                    "   Page {} of {} \u{2022} {} total records",
                    self.state.page,
                    page.meta.total_pages,
                    fmt::number(page.meta.total_count)
                ),
                FOOTER_STYLE,
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(title)), title_area);

        // Search box
        let search_line = match self.mode {
            BrowseMode::Search => Line::from(format!("Search: {}\u{2588}", self.state.search)),
            _ if self.state.search.is_empty() => Line::from(Span::styled(
                "Search: enter business name (press /)",
                MUTED_STYLE,
            )),
            _ => Line::from(format!("Search: {}", self.state.search)),
        };
        frame.render_widget(Paragraph::new(search_line), search_area);

        // Table, or whatever stands in for it
        let rows_shown = !self.filings().is_empty();
        if let Some(failure) = &self.error {
            let text = match failure.kind {
                FailureKind::Network => format!("Could not load companies: {failure}"),
                FailureKind::Application => format!("Error! {failure}"),
            };
            frame.render_widget(Paragraph::new(Span::styled(text, ERROR_STYLE)), table_area);
        } else if !rows_shown && self.loading {
            frame.render_widget(
                Paragraph::new(Span::styled("Loading companies data...", FOOTER_STYLE)),
                table_area,
            );
        } else if !rows_shown {
            frame.render_widget(Paragraph::new("No tax filings found."), table_area);
        } else {
            let widths = column_widths(wide);
            let header: Vec<&str> = if wide {
                vec![
                    "Business Name", "EIN", "Type", "Year", "Revenue", "PY Revenue",
                    "Expenses", "PY Expenses", "Assets", "PY Assets", "Employees",
                    "PY Empl.",
                ]
            } else {
                vec![
                    "Business Name", "EIN", "Year", "Revenue", "Expenses", "Assets",
                    "Employees",
                ]
            };
            let header: Vec<&str> = header
                .into_iter()
                .chain(Metric::ALL.iter().map(|m| m.delta_label()))
                .chain(wide.then_some("Website"))
                .collect();
            // Whatever the fixed columns and gaps leave over goes to the name.
            let fixed: u16 = widths
                .iter()
                .map(|c| match c {
                    Constraint::Length(n) => *n + 1,
                    _ => 0,
                })
                .sum();
            let name_width = table_area.width.saturating_sub(fixed).max(10) as usize;

            self.table_state.select(Some(self.selected));
            let table = Table::new(self.table_rows(wide, name_width), widths)
                .header(Row::new(header).style(HEADER_STYLE).bottom_margin(1))
                .column_spacing(1)
                .row_highlight_style(SELECTED_STYLE);
            frame.render_stateful_widget(table, table_area, &mut self.table_state);
        }

        // Page strip (never for an empty result)
        if self.error.is_none() {
            if let Some(strip) = self.page_strip() {
                frame.render_widget(Paragraph::new(strip), strip_area);
            }
        }

        // Status line
        let status = if let Some(msg) = &self.status_message {
            msg.clone()
        } else if self.loading {
            "Loading\u{2026}".to_string()
        } else if let Some(at) = self.updated_at {
            format!("Updated {}", at.format("%H:%M:%S"))
        } else {
            String::new()
        };
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), status_area);

        // Keys / input prompt
        let keys = match &self.mode {
            BrowseMode::Normal => Paragraph::new(
                "\u{2191}/\u{2193}:select  enter:open  n/\u{2192}:next  p/\u{2190}:prev  g:page  /:search  r:reload  b:back  q:quit",
            )
            .style(FOOTER_STYLE),
            BrowseMode::Search => {
                Paragraph::new("Type to search, Enter/Esc=done, Del=clear").style(FOOTER_STYLE)
            }
            BrowseMode::GotoPage(input) => Paragraph::new(format!("Go to page: {input}\u{2588}")),
        };
        frame.render_widget(keys, keys_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        self.status_message = None;
        match self.mode {
            BrowseMode::Normal => self.handle_normal_key(code),
            BrowseMode::Search => self.handle_search_key(code),
            BrowseMode::GotoPage(_) => self.handle_goto_key(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::models::fixtures;

    fn loaded(state: QueryState, rows: usize, total_count: u64) -> CompaniesBrowser {
        let filings = (0..rows)
            .map(|i| fixtures::filing(i as i64 + 1, &format!("Company {}", i + 1)))
            .collect();
        let page = fixtures::page(filings, state.page, total_count);
        let mut browser = CompaniesBrowser::new(state.clone());
        assert!(browser.apply(&state, &Ok(page)));
        browser
    }

    fn render(browser: &mut CompaniesBrowser, width: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, 40)).unwrap();
        terminal.draw(|f| browser.draw(f)).unwrap();
        tui::buffer_text(terminal.backend().buffer())
    }

    fn replaced(action: ViewAction) -> QueryState {
        match action {
            ViewAction::Replace(state) => state,
            _ => panic!("expected a location replace"),
        }
    }

    #[test]
    fn test_next_and_previous_page() {
        let mut browser = loaded(QueryState::new(2, "acme"), 10, 45);
        assert_eq!(replaced(browser.handle_key(KeyCode::Char('n'))), QueryState::new(3, "acme"));
        assert_eq!(replaced(browser.handle_key(KeyCode::Left)), QueryState::new(1, "acme"));
    }

    #[test]
    fn test_navigation_rejected_at_bounds() {
        let mut browser = loaded(QueryState::new(1, ""), 10, 20);
        assert!(matches!(browser.handle_key(KeyCode::Char('p')), ViewAction::Continue));
        assert!(matches!(browser.handle_key(KeyCode::Home), ViewAction::Continue));
        assert_eq!(replaced(browser.handle_key(KeyCode::End)), QueryState::new(2, ""));

        let mut last = loaded(QueryState::new(2, ""), 10, 20);
        assert!(matches!(last.handle_key(KeyCode::Right), ViewAction::Continue));
    }

    #[test]
    fn test_search_typing_resets_page() {
        let mut browser = loaded(QueryState::new(5, "ac"), 10, 100);
        browser.handle_key(KeyCode::Char('/'));
        assert_eq!(replaced(browser.handle_key(KeyCode::Char('m'))), QueryState::new(1, "acm"));
        assert_eq!(replaced(browser.handle_key(KeyCode::Backspace)), QueryState::new(1, "a"));
        assert_eq!(replaced(browser.handle_key(KeyCode::Delete)), QueryState::new(1, ""));
        browser.handle_key(KeyCode::Esc);
        assert!(matches!(browser.mode, BrowseMode::Normal));
    }

    #[test]
    fn test_goto_page_in_and_out_of_range() {
        let mut browser = loaded(QueryState::new(1, ""), 10, 95);
        browser.handle_key(KeyCode::Char('g'));
        browser.handle_key(KeyCode::Char('7'));
        assert_eq!(replaced(browser.handle_key(KeyCode::Enter)), QueryState::new(7, ""));

        browser.handle_key(KeyCode::Char('g'));
        browser.handle_key(KeyCode::Char('4'));
        browser.handle_key(KeyCode::Char('2'));
        assert!(matches!(browser.handle_key(KeyCode::Enter), ViewAction::Continue));
        assert!(browser.status_message.as_ref().unwrap().contains("out of range"));
    }

    #[test]
    fn test_enter_opens_selected_company() {
        let mut browser = loaded(QueryState::new(1, ""), 3, 3);
        browser.handle_key(KeyCode::Down);
        match browser.handle_key(KeyCode::Enter) {
            ViewAction::OpenCompany(ein) => assert_eq!(ein, fixtures::filing(2, "").ein),
            _ => panic!("expected open"),
        }
    }

    #[test]
    fn test_enter_on_blank_ein_stays_put() {
        let state = QueryState::new(1, "");
        let mut filing = fixtures::filing(1, "No Ein");
        filing.ein = "  ".into();
        let mut browser = CompaniesBrowser::new(state.clone());
        browser.apply(&state, &Ok(fixtures::page(vec![filing], 1, 1)));

        assert!(matches!(browser.handle_key(KeyCode::Enter), ViewAction::Continue));
        assert!(browser.status_message.as_ref().unwrap().contains("no EIN"));
        assert!(render(&mut browser, 160).contains("This filing has no EIN to open"));
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let mut browser = CompaniesBrowser::new(QueryState::new(2, ""));
        browser.sync(QueryState::new(1, "food"), None, false);

        let old = fixtures::page(vec![fixtures::filing(1, "Old")], 2, 20);
        assert!(!browser.apply(&QueryState::new(2, ""), &Ok(old)));
        assert!(browser.displayed().is_none());
        assert!(browser.is_loading());
    }

    #[test]
    fn test_previous_rows_stay_while_loading() {
        let mut browser = loaded(QueryState::new(1, ""), 10, 30);
        browser.sync(QueryState::new(2, ""), None, false);
        assert!(browser.is_loading());
        let (shown_for, _) = browser.displayed().unwrap();
        assert_eq!(*shown_for, QueryState::new(1, ""));
        let screen = render(&mut browser, 160);
        assert!(screen.contains("Company 1"));
        assert!(screen.contains("Page 2 of 3"));
    }

    #[test]
    fn test_empty_result_has_no_strip() {
        let state = QueryState::new(1, "zzz");
        let mut browser = CompaniesBrowser::new(state.clone());
        browser.apply(&state, &Ok(fixtures::page(vec![], 1, 0)));
        let screen = render(&mut browser, 120);
        assert!(screen.contains("No tax filings found"));
        assert!(!screen.contains("Prev"));
        assert!(!screen.contains("Showing"));
    }

    #[test]
    fn test_error_replaces_rows() {
        let state = QueryState::new(1, "");
        let mut browser = loaded(state.clone(), 5, 5);
        let failure = FetchFailure {
            kind: FailureKind::Network,
            message: "Request failed: HTTP 500".into(),
        };
        assert!(browser.apply(&state, &Err(failure)));
        let screen = render(&mut browser, 120);
        assert!(screen.contains("Request failed: HTTP 500"));
        assert!(!screen.contains("Company 1"));
    }

    #[test]
    fn test_strip_and_meta_render() {
        let mut browser = loaded(QueryState::new(3, ""), 10, 95);
        let screen = render(&mut browser, 240);
        assert!(screen.contains("Showing 21 to 30 of 95 results"));
        assert!(screen.contains("Page 3 of 10"));
        assert!(screen.contains("Website"));
    }
}
