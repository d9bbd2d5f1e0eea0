use serde::Serialize;

use crate::aggregate::{self, OrganizationFilter, ViewMode};
use crate::models::{Metrics, MonthlyCount, SignupRecord, StatusCount};

/// Everything a renderer needs for one selector/toggle choice.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    pub organization: String,
    pub view: ViewMode,
    pub timeline_title: String,
    pub status_title: String,
    pub metrics: Metrics,
    pub monthly: Vec<MonthlyCount>,
    pub statuses: Vec<StatusCount>,
    pub rows: Vec<&'a SignupRecord>,
}

pub fn build_view<'a>(
    records: &'a [SignupRecord],
    filter: &OrganizationFilter,
    view: ViewMode,
) -> DashboardView<'a> {
    let rows = filter.apply(records);
    let organization = filter.label().to_string();

    let (timeline_prefix, status_prefix) = match view {
        ViewMode::Regular => ("Monthly", "Distribution of"),
        ViewMode::Cumulative => ("Cumulative", "Cumulative"),
    };

    DashboardView {
        timeline_title: format!("{timeline_prefix} Signups Over Time - {organization}"),
        status_title: format!("{status_prefix} Assessment Statuses - {organization}"),
        metrics: aggregate::metrics(rows.iter().copied()),
        monthly: view.apply(aggregate::aggregate_by_month(rows.iter().copied())),
        statuses: view.apply(aggregate::aggregate_by_status(rows.iter().copied())),
        organization,
        view,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;

    fn records() -> Vec<SignupRecord> {
        let source = "1,pending,OrgA,en,90001,01/15/2023 10:00\n\
                      2,done,OrgA,en,90001,bad-date\n\
                      3,done,OrgB,fr,10001,02/01/2023 09:30\n\
                      4,done,OrgB,fr,10001,02/11/2023 09:30\n";
        loader::parse_reader(source.as_bytes()).unwrap().records
    }

    #[test]
    fn regular_view_for_all_organizations() {
        let records = records();
        let view = build_view(&records, &OrganizationFilter::All, ViewMode::Regular);
        assert_eq!(view.timeline_title, "Monthly Signups Over Time - All Organizations");
        assert_eq!(view.status_title, "Distribution of Assessment Statuses - All Organizations");
        assert_eq!(view.metrics.total_signups, 3);
        assert_eq!(view.metrics.unique_organizations, 2);
        assert_eq!(view.monthly.iter().map(|r| r.count).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(view.statuses[0].status, "done");
        assert_eq!(view.rows.len(), 3);
    }

    #[test]
    fn cumulative_view_for_one_organization() {
        let records = records();
        let filter = OrganizationFilter::from_selection("OrgB");
        let view = build_view(&records, &filter, ViewMode::Cumulative);
        assert_eq!(view.timeline_title, "Cumulative Signups Over Time - OrgB");
        assert_eq!(view.status_title, "Cumulative Assessment Statuses - OrgB");
        assert_eq!(view.monthly.len(), 1);
        assert_eq!(view.monthly[0].count, 2);
        assert_eq!(view.metrics.languages, 1);
    }

    #[test]
    fn view_serializes_for_renderers() {
        let records = records();
        let view = build_view(&records, &OrganizationFilter::All, ViewMode::Cumulative);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["view"], "cumulative");
        assert_eq!(json["monthly"][0]["month"], "2023-01");
        assert_eq!(json["monthly"][1]["count"], 3);
        assert_eq!(json["rows"][0]["signed_up_at"], "2023-01-15T10:00:00");
    }
}
