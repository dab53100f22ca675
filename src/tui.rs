use crossterm::event::KeyCode;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::{DefaultTerminal, Frame};

use crate::fmt::{self, DeltaClass, Sign};
use crate::location::QueryState;
use crate::models::Metric;
use crate::models::TaxFiling;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const POSITIVE_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const NEGATIVE_STYLE: Style = Style::new().fg(Color::Red);
pub const NEUTRAL_STYLE: Style = Style::new().fg(Color::Gray);
pub const MUTED_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const ERROR_STYLE: Style = Style::new()
    .fg(Color::Red)
    .add_modifier(Modifier::BOLD);

pub const LINK_STYLE: Style = Style::new()
    .fg(Color::Blue)
    .add_modifier(Modifier::UNDERLINED);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const CURRENT_PAGE_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Blue)
    .add_modifier(Modifier::BOLD);

pub fn class_style(class: DeltaClass) -> Style {
    match class {
        DeltaClass::Positive => POSITIVE_STYLE,
        DeltaClass::Negative => NEGATIVE_STYLE,
        DeltaClass::Neutral | DeltaClass::Unknown => NEUTRAL_STYLE,
    }
}

pub fn sign_style(sign: Option<Sign>) -> Style {
    match sign {
        Some(Sign::Positive) => POSITIVE_STYLE,
        Some(Sign::Negative) => NEGATIVE_STYLE,
        _ => NEUTRAL_STYLE,
    }
}

/// Two-line delta cell: coloured amount over the bracketed percent.
/// The percent is coloured by its own sign.
pub fn delta_text(filing: &TaxFiling, metric: Metric) -> Text<'static> {
    let shown = fmt::delta(filing.delta(metric), metric.unit());
    if shown.percent_sign.is_none() {
        return Text::from(Span::styled(shown.amount, NEUTRAL_STYLE));
    }
    Text::from(vec![
        Line::from(Span::styled(shown.amount, class_style(shown.class))),
        Line::from(Span::styled(
            format!("({})", shown.percent),
            sign_style(shown.percent_sign),
        )),
    ])
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

// ---------------------------------------------------------------------------
// Screen infrastructure
// ---------------------------------------------------------------------------

pub enum ViewAction {
    Continue,
    Close,
    /// Return to the previous history entry.
    Back,
    /// Write a new page/search into the current location (history replace).
    Replace(QueryState),
    /// Show a company's filings (history push).
    OpenCompany(String),
    /// Drop the cached response for the current key and fetch again.
    Refetch,
}

pub trait Screen {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ViewAction;
}

/// Take over the terminal, restoring it if anything panics while it is held.
pub fn init_terminal() -> DefaultTerminal {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));
    ratatui::init()
}

pub fn restore_terminal(terminal: DefaultTerminal) {
    drop(terminal);
    ratatui::restore();
}

#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let width = buffer.area.width as usize;
    buffer
        .content
        .chunks(width.max(1))
        .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
