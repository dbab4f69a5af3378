//! Console results table

use crate::crawler::RunReport;

/// Renders the report as a fixed-width table
pub fn format_report_table(report: &RunReport) -> String {
    let site_width = report
        .results
        .iter()
        .map(|o| o.site.len())
        .max()
        .unwrap_or(0)
        .max("Site".len());

    let mut table = format!(
        "{:<site_width$}  {:<10}  {:<7}  {:>8}  {}\n",
        "Site",
        "Engine",
        "Status",
        "Listings",
        "Error",
        site_width = site_width
    );
    table.push_str(&format!("{}\n", "-".repeat(site_width + 40)));

    for outcome in &report.results {
        let count = outcome
            .count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.push_str(&format!(
            "{:<site_width$}  {:<10}  {:<7}  {:>8}  {}\n",
            outcome.site,
            outcome.engine.as_str(),
            outcome.status.as_str(),
            count,
            outcome.error.as_deref().unwrap_or(""),
            site_width = site_width
        ));
    }

    table
}

/// Prints the results table and totals to stdout
pub fn print_report(report: &RunReport) {
    println!("=== Crawl Results ===\n");
    print!("{}", format_report_table(report));
    println!();
    println!(
        "{} sites: {} succeeded, {} failed, {} listings collected",
        report.results.len(),
        report.success_count(),
        report.error_count(),
        report.total_listings()
    );
}
