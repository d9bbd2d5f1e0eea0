use std::fmt::Write;

use crate::dashboard::DashboardView;

pub fn build_report(view: &DashboardView<'_>, excluded_rows: usize, raw_rows: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Signup Analysis Dashboard");
    let _ = writeln!(
        output,
        "Generated for {} ({} view)",
        view.organization, view.view
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "- Total Signups: {}", view.metrics.total_signups);
    let _ = writeln!(
        output,
        "- Unique Organizations: {}",
        view.metrics.unique_organizations
    );
    let _ = writeln!(output, "- Languages: {}", view.metrics.languages);
    if excluded_rows > 0 {
        let _ = writeln!(output, "- Rows excluded: {excluded_rows}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## {}", view.timeline_title);

    if view.monthly.is_empty() {
        let _ = writeln!(output, "No signups recorded for this selection.");
    } else {
        let _ = writeln!(output, "| Month | Number of Signups |");
        let _ = writeln!(output, "| --- | ---: |");
        for row in &view.monthly {
            let _ = writeln!(output, "| {} | {} |", row.month, row.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## {}", view.status_title);

    if view.statuses.is_empty() {
        let _ = writeln!(output, "No signups recorded for this selection.");
    } else {
        let _ = writeln!(output, "| Assessment Status | Number of Signups |");
        let _ = writeln!(output, "| --- | ---: |");
        for row in &view.statuses {
            let _ = writeln!(output, "| {} | {} |", row.status, row.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Raw Data");

    if view.rows.is_empty() {
        let _ = writeln!(output, "No signups recorded for this selection.");
    } else {
        let _ = writeln!(
            output,
            "| id | status | organization | language | zipcode | signup_date |"
        );
        let _ = writeln!(output, "| --- | --- | --- | --- | --- | --- |");
        for record in view.rows.iter().take(raw_rows) {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                record.id,
                record.status,
                record.organization,
                record.language,
                record.zipcode,
                record.signed_up_at.format("%Y-%m-%d %H:%M")
            );
        }
        if view.rows.len() > raw_rows {
            let _ = writeln!(
                output,
                "\n{} more rows not shown.",
                view.rows.len() - raw_rows
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{OrganizationFilter, ViewMode};
    use crate::dashboard::build_view;
    use crate::loader;

    #[test]
    fn report_lists_metrics_and_series() {
        let source = "1,pending,OrgA,en,90001,01/15/2023 10:00\n\
                      2,done,OrgA,en,90001,bad-date\n\
                      3,done,OrgB,fr,10001,02/01/2023 09:30\n";
        let outcome = loader::parse_reader(source.as_bytes()).unwrap();
        let view = build_view(&outcome.records, &OrganizationFilter::All, ViewMode::Cumulative);
        let report = build_report(&view, outcome.excluded.len(), 1);

        assert!(report.contains("Generated for All Organizations (Cumulative view)"));
        assert!(report.contains("- Total Signups: 2"));
        assert!(report.contains("- Rows excluded: 1"));
        assert!(report.contains("## Cumulative Signups Over Time - All Organizations"));
        assert!(report.contains("| 2023-02 | 2 |"));
        assert!(report.contains("| 1 | pending | OrgA | en | 90001 | 2023-01-15 10:00 |"));
        assert!(report.contains("1 more rows not shown."));
    }

    #[test]
    fn empty_selection_renders_placeholders() {
        let records: Vec<crate::models::SignupRecord> = Vec::new();
        let filter = OrganizationFilter::from_selection("OrgZ");
        let view = build_view(&records, &filter, ViewMode::Regular);
        let report = build_report(&view, 0, 20);

        assert!(report.contains("- Total Signups: 0"));
        assert!(!report.contains("Rows excluded"));
        assert_eq!(
            report.matches("No signups recorded for this selection.").count(),
            3
        );
    }
}
