use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::error::FetchFailure;
use crate::fmt::{self, currency};
use crate::models::{CompanyFilings, Metric};
use crate::tui::{
    self, Screen, ViewAction, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, LINK_STYLE, MUTED_STYLE,
    SELECTED_STYLE,
};

/// Profile card and filing history for one company.
pub struct CompanyView {
    id: String,
    data: Option<CompanyFilings>,
    loading: bool,
    error: Option<FetchFailure>,
    selected: usize,
    table_state: TableState,
}

impl CompanyView {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: None,
            loading: true,
            error: None,
            selected: 0,
            table_state: TableState::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[cfg(test)]
    pub fn data(&self) -> Option<&CompanyFilings> {
        self.data.as_ref()
    }

    pub fn sync(&mut self, cached: Option<&CompanyFilings>, fresh: bool) {
        self.error = None;
        match cached {
            Some(company) => {
                self.data = Some(company.clone());
                self.loading = !fresh;
            }
            None => self.loading = true,
        }
    }

    pub fn mark_loading(&mut self) {
        self.loading = true;
    }

    /// Returns false when the response belongs to a different company.
    pub fn apply(&mut self, id: &str, result: &Result<CompanyFilings, FetchFailure>) -> bool {
        if id != self.id {
            return false;
        }
        self.loading = false;
        match result {
            Ok(company) => {
                self.data = Some(company.clone());
                self.error = None;
            }
            Err(failure) => self.error = Some(failure.clone()),
        }
        let len = self.data.as_ref().map_or(0, |d| d.filings().len());
        self.selected = self.selected.min(len.saturating_sub(1));
        true
    }

    fn draw_card(&self, frame: &mut Frame, area: ratatui::layout::Rect, company: &CompanyFilings) {
        let Some(latest) = company.latest() else {
            return;
        };
        let mut lines = vec![
            Line::from(Span::styled(latest.display_name().to_string(), HEADER_STYLE)),
            Line::from(vec![
                Span::styled("EIN: ", MUTED_STYLE),
                Span::raw(latest.ein.clone()),
            ]),
            Line::from(vec![
                Span::styled("Website: ", MUTED_STYLE),
                match latest.website() {
                    Some(url) => Span::styled(url.to_string(), LINK_STYLE),
                    None => Span::raw(fmt::NOT_AVAILABLE),
                },
            ]),
            Line::from(vec![
                Span::styled("Total Filings: ", MUTED_STYLE),
                Span::raw(company.filings().len().to_string()),
            ]),
        ];
        if let Some(mission) = latest.mission() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Mission", MUTED_STYLE)));
            lines.push(Line::from(mission.to_string()));
        }
        let card = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Company Profile "));
        frame.render_widget(card, area);
    }

    fn history_table(&self, company: &CompanyFilings) -> Table<'static> {
        let rows: Vec<Row> = company
            .filings()
            .iter()
            .map(|f| {
                let cells = [
                    Cell::from(f.tax_year.to_string()),
                    Cell::from(f.return_type.clone()),
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
                .chain(Metric::ALL.iter().map(|m| Cell::from(tui::delta_text(f, *m))));
                Row::new(cells).height(2)
            })
            .collect();

        let header = [
            "Tax Year", "Type", "Revenue", "PY Revenue", "Expenses", "PY Expenses", "Assets",
            "PY Assets", "Employees", "PY Empl.",
        ]
        .into_iter()
        .chain(Metric::ALL.iter().map(|m| m.delta_label()));

        let mut widths = vec![Constraint::Length(8), Constraint::Length(6)];
        widths.extend([Constraint::Length(13); 6]);
        widths.extend([Constraint::Length(9); 2]);
        widths.extend([Constraint::Length(11); 4]);

        Table::new(rows, widths)
            .header(Row::new(header).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE)
    }
}

impl Screen for CompanyView {
    fn draw(&mut self, frame: &mut Frame) {
        let [title_area, body_area, status_area, keys_area] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Company Details", HEADER_STYLE),
                Span::styled(format!("   /companies/{}", self.id), FOOTER_STYLE),
            ])),
            title_area,
        );

        match (&self.error, &self.data) {
            (Some(failure), _) => {
                frame.render_widget(
                    Paragraph::new(Span::styled(format!("Error: {failure}"), ERROR_STYLE)),
                    body_area,
                );
            }
            (None, None) => {
                frame.render_widget(
                    Paragraph::new(Span::styled("Loading company data...", FOOTER_STYLE)),
                    body_area,
                );
            }
            (None, Some(company)) if company.filings().is_empty() => {
                frame.render_widget(
                    Paragraph::new("No tax filings found for this company."),
                    body_area,
                );
            }
            (None, Some(company)) => {
                let card_height = if company.latest().is_some_and(|f| f.mission().is_some()) {
                    10
                } else {
                    6
                };
                let [card_area, label_area, table_area] = Layout::vertical([
                    Constraint::Length(card_height),
                    Constraint::Length(1),
                    Constraint::Fill(1),
                ])
                .areas(body_area);
                self.draw_card(frame, card_area, company);
                frame.render_widget(
                    Paragraph::new(Span::styled("Filing History", HEADER_STYLE)),
                    label_area,
                );
                let table = self.history_table(company);
                self.table_state.select(Some(self.selected));
                frame.render_stateful_widget(table, table_area, &mut self.table_state);
            }
        }

        let status = if self.loading { "Loading\u{2026}" } else { "" };
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), status_area);
        frame.render_widget(
            Paragraph::new("\u{2191}/\u{2193}:scroll  r:reload  b/esc:back  q:quit")
                .style(FOOTER_STYLE),
            keys_area,
        );
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        let len = self.data.as_ref().map_or(0, |d| d.filings().len());
        match code {
            KeyCode::Char('q') => ViewAction::Close,
            KeyCode::Char('b') | KeyCode::Backspace | KeyCode::Esc | KeyCode::Left => {
                ViewAction::Back
            }
            KeyCode::Char('r') => ViewAction::Refetch,
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < len {
                    self.selected += 1;
                }
                ViewAction::Continue
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                ViewAction::Continue
            }
            _ => ViewAction::Continue,
        }
    }
}
