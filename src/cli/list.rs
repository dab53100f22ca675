use colored::Colorize;
use comfy_table::{Cell, Table};
use tracing::info;

use super::{client, delta_cell, runtime};
use crate::client::FilingsSource;
use crate::error::Result;
use crate::fmt::{self, currency};
use crate::location::QueryState;
use crate::models::{CompaniesPage, Metric};
use crate::pagination::{showing_range, PageToken, Pager};
use crate::settings::Settings;

pub fn run(settings: &Settings, page: u32, q: String) -> Result<()> {
    let state = QueryState::new(page, q);
    let client = client(settings)?;
    info!(page = state.page, search = %state.search, "list");
    let result = runtime()?.block_on(client.list_companies(&state))?;
    println!("{}", format_page(&result, &state));
    Ok(())
}

/// Page strip as plain text, current page in brackets.
pub fn format_strip(pager: &Pager) -> String {
    pager
        .tokens()
        .into_iter()
        .map(|token| match token {
            PageToken::Page(p) if p == pager.current => format!("[{p}]"),
            PageToken::Page(p) => p.to_string(),
            PageToken::Ellipsis => "\u{2026}".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_page(page: &CompaniesPage, state: &QueryState) -> String {
    if page.filings().is_empty() {
        return "No tax filings found.".to_string();
    }

    let mut table = Table::new();
    let mut header = vec![
        "Business Name", "EIN", "Type", "Year", "Revenue", "Expenses", "Assets", "Employees",
    ];
    header.extend(Metric::ALL.iter().map(|m| m.delta_label()));
    header.push("Website");
    table.set_header(header);

    for f in page.filings() {
        let mut row = vec![
            Cell::new(f.display_name()),
            Cell::new(&f.ein),
            Cell::new(&f.return_type),
            Cell::new(f.tax_year),
            Cell::new(currency(f.total_revenue)),
            Cell::new(currency(f.total_expenses)),
            Cell::new(currency(f.total_assets)),
            Cell::new(fmt::count(f.employee_count)),
        ];
        row.extend(Metric::ALL.iter().map(|m| delta_cell(f, *m)));
        row.push(Cell::new(f.website().unwrap_or(fmt::NOT_AVAILABLE)));
        table.add_row(row);
    }

    let meta = &page.meta;
    let mut out = format!(
        "{}  Page {} of {} \u{2022} {} total records\n{table}",
        "Tax Filings".bold(),
        meta.page,
        meta.total_pages,
        fmt::number(meta.total_count)
    );
    if let Some((start, end)) = showing_range(state.page, meta.total_count) {
        out.push_str(&format!(
            "\nShowing {} to {} of {} results",
            fmt::number(start),
            fmt::number(end),
            fmt::number(meta.total_count)
        ));
    }
    let pager = Pager::new(state.page, meta.total_pages);
    out.push_str(&format!("\nPages: {}", format_strip(&pager)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    #[test]
    fn test_empty_page_has_message_only() {
        let out = format_page(&fixtures::page(vec![], 1, 0), &QueryState::default());
        assert_eq!(out, "No tax filings found.");
    }

    #[test]
    fn test_page_lists_rows_and_range() {
        let page = fixtures::page(
            vec![fixtures::filing(1, "Acme Foods"), fixtures::filing(2, "Beta Trust")],
            3,
            22,
        );
        let out = format_page(&page, &QueryState::new(3, "a"));
        assert!(out.contains("Acme Foods"));
        assert!(out.contains("Beta Trust"));
        assert!(out.contains("Page 3 of 3"));
        assert!(out.contains("22 total records"));
        assert!(out.contains("Showing 21 to 22 of 22 results"));
        assert!(out.contains("$1,234,567"));
        assert!(out.contains("(23.46%)"));
    }

    #[test]
    fn test_strip_marks_current_page() {
        assert_eq!(format_strip(&Pager::new(5, 10)), "1 \u{2026} 3 4 [5] 6 7 \u{2026} 10");
        assert_eq!(format_strip(&Pager::new(1, 1)), "[1]");
    }
}
