use colored::Colorize;
use comfy_table::{Cell, Table};
use tracing::info;

use super::{client, delta_cell, runtime};
use crate::client::FilingsSource;
use crate::error::Result;
use crate::fmt::{self, currency};
use crate::models::{CompanyFilings, Metric};
use crate::settings::Settings;

pub fn run(settings: &Settings, id: &str) -> Result<()> {
    let client = client(settings)?;
    info!(id, "show");
    let company = runtime()?.block_on(client.company_filings(id))?;
    println!("{}", format_company(&company));
    Ok(())
}

pub fn format_company(company: &CompanyFilings) -> String {
    let Some(latest) = company.latest() else {
        return "No tax filings found for this company.".to_string();
    };

    let mut out = format!(
        "{}\nEIN: {}\nWebsite: {}\nTotal Filings: {}\n",
        latest.display_name().bold(),
        latest.ein,
        latest.website().unwrap_or(fmt::NOT_AVAILABLE),
        company.filings().len()
    );
    if let Some(mission) = latest.mission() {
        out.push_str(&format!("Mission: {}\n", textwrap::fill(mission, 80)));
    }

    let mut table = Table::new();
    let mut header = vec![
        "Tax Year", "Type", "Revenue", "PY Revenue", "Expenses", "PY Expenses", "Assets",
        "PY Assets", "Employees", "PY Empl.",
    ];
    header.extend(Metric::ALL.iter().map(|m| m.delta_label()));
    table.set_header(header);

    for f in company.filings() {
        let mut row = vec![
            Cell::new(f.tax_year),
            Cell::new(&f.return_type),
            Cell::new(currency(f.total_revenue)),
            Cell::new(currency(f.py_total_revenue)),
            Cell::new(currency(f.total_expenses)),
            Cell::new(currency(f.py_total_expenses)),
            Cell::new(currency(f.total_assets)),
            Cell::new(currency(f.py_total_assets)),
            Cell::new(fmt::count(f.employee_count)),
            Cell::new(fmt::count(f.py_employee_count)),
        ];
        row.extend(Metric::ALL.iter().map(|m| delta_cell(f, *m)));
        table.add_row(row);
    }

    out.push_str(&format!("\nFiling History\n{table}"));
    out
}
