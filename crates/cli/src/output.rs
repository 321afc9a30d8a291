//! Terminal output for the cost summary

use advisor_lib::models::InstanceCostSummary;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct CostRow {
    #[tabled(rename = "Instance")]
    instance: String,
    #[tabled(rename = "Avg ACU")]
    avg_acu: String,
    #[tabled(rename = "Provisioned $/mo")]
    provisioned: String,
    #[tabled(rename = "Serverless $/mo")]
    serverless: String,
    #[tabled(rename = "Savings")]
    savings: String,
}

/// Print the per-instance cost comparison as a table.
pub fn print_cost_summary(summaries: &[InstanceCostSummary]) {
    if summaries.is_empty() {
        println!("{}", "No cost rows produced".yellow());
        return;
    }

    println!("{}", "Estimated monthly costs".bold());
    let rows: Vec<CostRow> = summaries
        .iter()
        .map(|summary| CostRow {
            instance: summary.identifier.clone(),
            avg_acu: format!("{:.3}", summary.avg_acu),
            provisioned: format!("${:.2}", summary.provisioned_monthly_cost),
            serverless: format!("${:.1}", summary.serverless_monthly_cost),
            savings: format!("{:.0}%", summary.savings_percent).green().to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
