use serde::{Deserialize, Serialize};

use crate::fmt::DeltaUnit;

/// One company's tax-year record as served by the filings API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxFiling {
    pub id: i64,
    pub ein: String,
    #[serde(default)]
    pub return_type: String,
    pub tax_year: i32,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub mission_description: Option<String>,
    #[serde(default)]
    pub total_revenue: Option<f64>,
    #[serde(default)]
    pub total_expenses: Option<f64>,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub employee_count: Option<i64>,
    #[serde(default)]
    pub py_total_revenue: Option<f64>,
    #[serde(default)]
    pub py_total_expenses: Option<f64>,
    #[serde(default)]
    pub py_total_assets: Option<f64>,
    #[serde(default)]
    pub py_employee_count: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub revenue_delta_amount: Option<f64>,
    #[serde(default)]
    pub revenue_delta_percent: Option<f64>,
    #[serde(default)]
    pub expenses_delta_amount: Option<f64>,
    #[serde(default)]
    pub expenses_delta_percent: Option<f64>,
    #[serde(default)]
    pub assets_delta_amount: Option<f64>,
    #[serde(default)]
    pub assets_delta_percent: Option<f64>,
    #[serde(default)]
    pub employees_delta_amount: Option<f64>,
    #[serde(default)]
    pub employees_delta_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaPair {
    pub amount: Option<f64>,
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Revenue,
    Expenses,
    Assets,
    Employees,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Self::Revenue, Self::Expenses, Self::Assets, Self::Employees];

    pub fn delta_label(self) -> &'static str {
        match self {
            Self::Revenue => "Revenue \u{394}",
            Self::Expenses => "Expenses \u{394}",
            Self::Assets => "Assets \u{394}",
            Self::Employees => "Employees \u{394}",
        }
    }

    pub fn unit(self) -> DeltaUnit {
        match self {
            Self::Employees => DeltaUnit::Count,
            _ => DeltaUnit::Currency,
        }
    }
}

/// Treat blank and the literal "N/A" as missing.
fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "N/A")
}

impl TaxFiling {
    pub fn display_name(&self) -> &str {
        present(self.business_name.as_deref()).unwrap_or("N/A")
    }

    pub fn website(&self) -> Option<&str> {
        present(self.website_url.as_deref())
    }

    pub fn mission(&self) -> Option<&str> {
        present(self.mission_description.as_deref())
    }

    pub fn delta(&self, metric: Metric) -> DeltaPair {
        let (amount, percent) = match metric {
            Metric::Revenue => (self.revenue_delta_amount, self.revenue_delta_percent),
            Metric::Expenses => (self.expenses_delta_amount, self.expenses_delta_percent),
            Metric::Assets => (self.assets_delta_amount, self.assets_delta_percent),
            Metric::Employees => (self.employees_delta_amount, self.employees_delta_percent),
        };
        DeltaPair { amount, percent }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingsData {
    #[serde(rename = "taxFilings", default)]
    pub tax_filings: Vec<TaxFiling>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_count: u64,
    pub page: u32,
    pub total_pages: u32,
}

/// Body of `GET /companies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompaniesPage {
    pub data: FilingsData,
    pub meta: PageMeta,
}

impl CompaniesPage {
    pub fn filings(&self) -> &[TaxFiling] {
        &self.data.tax_filings
    }
}

/// Body of `GET /companies/{id}`, most recent filing first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyFilings {
    pub data: FilingsData,
}

impl CompanyFilings {
    pub fn filings(&self) -> &[TaxFiling] {
        &self.data.tax_filings
    }

    pub fn latest(&self) -> Option<&TaxFiling> {
        self.data.tax_filings.first()
    }
}
