//! Counts and ratios per month and agent
//!
//! Every operation degrades to zero: an empty dataset, an unknown agent or a
//! zero denominator never produce an error.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::calendar::{Month, MonthExceptions};
use crate::dataset::Dataset;
use crate::model::{DriveRecord, FunnelLabel, InstallStatus, LeadRecord};

/// `num / den * 100` rounded to the nearest integer, ties to even; 0 when `den` is 0
pub fn percent(num: usize, den: usize) -> u32 {
    if den == 0 {
        return 0;
    }
    // Exact rational rounding; float division misplaces ties like 7/200
    let (scaled, den) = (num as u128 * 100, den as u128);
    let (quotient, remainder) = (scaled / den, scaled % den);
    let rounded = match (remainder * 2).cmp(&den) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal => quotient + quotient % 2,
    };
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// A count together with its share of the month's leads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Share {
    pub count: usize,
    pub percent: u32,
}

impl Share {
    fn of(count: usize, total: usize) -> Self {
        Self {
            count,
            percent: percent(count, total),
        }
    }
}

/// Leads lost at each funnel stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FunnelDropoff {
    pub total_leads: usize,
    pub no_response: Share,
    pub unspecified: Share,
    pub without_coverage: Share,
}

/// Raw counts over one or more months
///
/// A row that belongs to several of the months (a dated October install
/// folded into November) is counted once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub leads: usize,
    pub coverage: usize,
    pub contracts: usize,
    pub installs: usize,
    pub cancellations: usize,
    pub no_pay_cancellations: usize,
    pub no_response: usize,
    pub unspecified: usize,
    pub without_coverage: usize,
}

impl Tally {
    pub fn coverage_rate(&self) -> u32 {
        percent(self.coverage, self.leads)
    }

    pub fn contract_rate(&self) -> u32 {
        percent(self.contracts, self.coverage)
    }

    pub fn sales_conversion_rate(&self) -> u32 {
        percent(self.installs, self.coverage)
    }

    pub fn install_effectiveness(&self) -> u32 {
        let outcomes = self.installs + self.cancellations + self.no_pay_cancellations;
        percent(self.installs, outcomes)
    }

    pub fn dropoff(&self) -> FunnelDropoff {
        FunnelDropoff {
            total_leads: self.leads,
            no_response: Share::of(self.no_response, self.leads),
            unspecified: Share::of(self.unspecified, self.leads),
            without_coverage: Share::of(self.without_coverage, self.leads),
        }
    }
}

/// Aggregations over a [`Dataset`]
pub struct Metrics<'a> {
    data: &'a Dataset,
}

impl<'a> Metrics<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self { data }
    }

    pub fn total_leads(&self, month: Month, agent: Option<&str>) -> usize {
        self.leads(month, agent).count()
    }

    /// Leads whose second funnel stage is "Con Cobertura"
    pub fn coverage_count(&self, month: Month, agent: Option<&str>) -> usize {
        self.leads(month, agent).filter(|l| l.has_coverage()).count()
    }

    /// Leads with coverage that also reached "Contrato OK"
    pub fn contract_count(&self, month: Month, agent: Option<&str>) -> usize {
        self.leads(month, agent).filter(|l| l.has_contract()).count()
    }

    /// Contracts over coverage leads
    pub fn contract_rate(&self, month: Month, agent: Option<&str>) -> u32 {
        percent(
            self.contract_count(month, agent),
            self.coverage_count(month, agent),
        )
    }

    /// Coverage leads over all leads
    pub fn coverage_rate(&self, month: Month, agent: Option<&str>) -> u32 {
        percent(
            self.coverage_count(month, agent),
            self.total_leads(month, agent),
        )
    }

    /// DRIVE installs over MANTRA coverage leads
    pub fn sales_conversion_rate(&self, month: Month, agent: Option<&str>) -> u32 {
        percent(self.installs(month, agent), self.coverage_count(month, agent))
    }

    pub fn installs(&self, month: Month, agent: Option<&str>) -> usize {
        self.with_status(month, agent, &InstallStatus::Installed)
    }

    pub fn cancellations(&self, month: Month, agent: Option<&str>) -> usize {
        self.with_status(month, agent, &InstallStatus::Cancelled)
    }

    pub fn pending(&self, month: Month, agent: Option<&str>) -> usize {
        self.with_status(month, agent, &InstallStatus::Pending)
    }

    /// Transactions cancelled for non-payment, whatever their status
    pub fn no_pay_cancellations(&self, month: Month, agent: Option<&str>) -> usize {
        self.drive(month, agent).filter(|d| d.is_no_pay()).count()
    }

    /// DRIVE rows whose status is none of the known labels
    pub fn unrecognized_statuses(&self, month: Month, agent: Option<&str>) -> usize {
        self.drive(month, agent)
            .filter(|d| matches!(d.status, InstallStatus::Unrecognized(_)))
            .count()
    }

    /// Install target; summed over every matching LISTA row
    pub fn quota(&self, month: Month, agent: Option<&str>) -> i64 {
        let agents = self.agent_set(agent);
        self.data
            .quotas
            .iter()
            .filter(|q| q.month == Some(month))
            .filter(|q| matches_agent(agents.as_ref(), &q.agent))
            .map(|q| q.quota)
            .sum()
    }

    /// Installs over quota; not capped at 100
    pub fn quota_attainment(&self, month: Month, agent: Option<&str>) -> u32 {
        let quota = self.quota(month, agent);
        if quota <= 0 {
            return 0;
        }
        percent(self.installs(month, agent), quota as usize)
    }

    /// Summed installs over summed quota for every agent holding a quota in `month`
    ///
    /// This weights each agent by its quota; it is not the mean of the
    /// individual attainments.
    pub fn aggregate_quota_attainment(&self, month: Month) -> u32 {
        let (installs, quota) = self
            .quota_agents(month)
            .iter()
            .map(|agent| {
                (
                    self.installs(month, Some(agent)),
                    self.quota(month, Some(agent)).max(0) as usize,
                )
            })
            .fold((0, 0), |(i, q), (ai, aq)| (i + ai, q + aq));
        percent(installs, quota)
    }

    /// Installs over installs + cancellations + no-pay cancellations
    pub fn install_effectiveness(&self, month: Month, agent: Option<&str>) -> u32 {
        let installs = self.installs(month, agent);
        let outcomes =
            installs + self.cancellations(month, agent) + self.no_pay_cancellations(month, agent);
        percent(installs, outcomes)
    }

    pub fn funnel_dropoff(&self, month: Month, agent: Option<&str>) -> FunnelDropoff {
        self.tally(&[month], agent).dropoff()
    }

    /// Counts over the union of `months`
    pub fn tally(&self, months: &[Month], agent: Option<&str>) -> Tally {
        let agents = self.agent_set(agent);
        let exceptions = &self.data.exceptions;
        let mut tally = Tally::default();

        let leads = self.data.leads.iter().filter(|l| {
            l.month.is_some_and(|m| months.contains(&m))
                && matches_agent(agents.as_ref(), &l.agent)
        });
        for lead in leads {
            tally.leads += 1;
            if lead.has_coverage() {
                tally.coverage += 1;
            }
            if lead.has_contract() {
                tally.contracts += 1;
            }
            if lead.tier1 == FunnelLabel::NoResponse {
                tally.no_response += 1;
            }
            match lead.tier2 {
                FunnelLabel::Unspecified => tally.unspecified += 1,
                FunnelLabel::WithoutCoverage => tally.without_coverage += 1,
                _ => {}
            }
        }

        let drive = self.data.drive.iter().filter(|d| {
            months.iter().any(|&m| in_month(exceptions, d, m))
                && matches_agent(agents.as_ref(), &d.agent)
        });
        for record in drive {
            match record.status {
                InstallStatus::Installed => tally.installs += 1,
                InstallStatus::Cancelled => tally.cancellations += 1,
                _ => {}
            }
            if record.is_no_pay() {
                tally.no_pay_cancellations += 1;
            }
        }

        tally
    }

    /// Canonical names of the agents with a LISTA row for `month`, sorted
    pub fn quota_agents(&self, month: Month) -> Vec<String> {
        self.data
            .quotas
            .iter()
            .filter(|q| q.month == Some(month))
            .map(|q| self.data.aliases.canonical(&q.agent))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether a DRIVE row belongs to `month`
    ///
    /// An explicit month label wins; otherwise the date is resolved through
    /// the dataset's month exceptions.
    pub fn drive_in_month(&self, record: &DriveRecord, month: Month) -> bool {
        in_month(&self.data.exceptions, record, month)
    }

    fn leads(&self, month: Month, agent: Option<&str>) -> impl Iterator<Item = &'a LeadRecord> {
        let agents = self.agent_set(agent);
        self.data
            .leads
            .iter()
            .filter(move |l| l.month == Some(month) && matches_agent(agents.as_ref(), &l.agent))
    }

    fn drive(&self, month: Month, agent: Option<&str>) -> impl Iterator<Item = &'a DriveRecord> {
        let agents = self.agent_set(agent);
        let exceptions = &self.data.exceptions;
        self.data.drive.iter().filter(move |d| {
            in_month(exceptions, d, month) && matches_agent(agents.as_ref(), &d.agent)
        })
    }

    fn with_status(&self, month: Month, agent: Option<&str>, status: &InstallStatus) -> usize {
        self.drive(month, agent)
            .filter(|d| &d.status == status)
            .count()
    }

    fn agent_set(&self, agent: Option<&str>) -> Option<BTreeSet<String>> {
        agent.map(|a| self.data.aliases.variants(a))
    }
}

fn in_month(exceptions: &MonthExceptions, record: &DriveRecord, month: Month) -> bool {
    match (record.month, record.calendar_month()) {
        (Some(label), _) => label == month,
        (None, Some(calendar)) => exceptions.includes(month, calendar),
        (None, None) => false,
    }
}

fn matches_agent(agents: Option<&BTreeSet<String>>, name: &str) -> bool {
    agents.is_none_or(|set| set.contains(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuotaRecord;
    use chrono::NaiveDate;

    fn lead(month: Month, agent: &str, tier1: &str, tier2: &str, tier3: &str) -> LeadRecord {
        LeadRecord {
            month: Some(month),
            agent: agent.to_string(),
            tier1: FunnelLabel::parse(tier1),
            tier2: FunnelLabel::parse(tier2),
            tier3: FunnelLabel::parse(tier3),
        }
    }

    fn drive(month: Option<Month>, date: Option<(i32, u32, u32)>, agent: &str, status: &str) -> DriveRecord {
        DriveRecord {
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            month,
            agent: agent.to_string(),
            status: InstallStatus::parse(status),
            cancel_reason: String::new(),
        }
    }

    fn quota(agent: &str, month: Month, value: i64) -> QuotaRecord {
        QuotaRecord {
            agent: agent.to_string(),
            month: Some(month),
            quota: value,
            cell: (0, 0),
        }
    }

    #[test]
    fn test_percent_rounds_half_to_even() {
        assert_eq!(percent(1, 8), 12); // 12.5
        assert_eq!(percent(5, 200), 2); // 2.5
        assert_eq!(percent(7, 200), 4); // 3.5
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(6, 5), 120);
        assert_eq!(percent(3, 0), 0);
    }

    #[test]
    fn test_enero_lead_counts() {
        let data = Dataset::from_records(
            vec![
                lead(Month::Enero, "ZIM_ANA_VTP", "", "Con Cobertura", "Contrato OK"),
                lead(Month::Enero, "ZIM_ANA_VTP", "", "Con Cobertura", ""),
                lead(Month::Enero, "ZIM_LUIS_VTP", "No Responde", "Sin Cobertura", ""),
                lead(Month::Febrero, "ZIM_LUIS_VTP", "", "Con Cobertura", "Contrato OK"),
            ],
            vec![],
            vec![],
        );
        let metrics = Metrics::new(&data);

        assert_eq!(metrics.total_leads(Month::Enero, None), 3);
        assert_eq!(metrics.coverage_count(Month::Enero, None), 2);
        assert_eq!(metrics.contract_count(Month::Enero, None), 1);
        assert_eq!(metrics.contract_rate(Month::Enero, None), 50);
        assert_eq!(metrics.coverage_rate(Month::Enero, None), 67);
        assert_eq!(metrics.total_leads(Month::Enero, Some("ZIM_ANA_VTP")), 2);
    }

    #[test]
    fn test_contract_requires_coverage() {
        let data = Dataset::from_records(
            vec![lead(Month::Enero, "A", "", "Sin Cobertura", "Contrato OK")],
            vec![],
            vec![],
        );
        assert_eq!(Metrics::new(&data).contract_count(Month::Enero, None), 0);
    }

    #[test]
    fn test_empty_month_gives_zero_ratios() {
        let data = Dataset::from_records(vec![], vec![], vec![]);
        let metrics = Metrics::new(&data);
        for month in Month::ALL {
            assert_eq!(metrics.total_leads(month, None), 0);
            assert_eq!(metrics.coverage_rate(month, None), 0);
            assert_eq!(metrics.contract_rate(month, None), 0);
            assert_eq!(metrics.sales_conversion_rate(month, None), 0);
            assert_eq!(metrics.install_effectiveness(month, None), 0);
            assert_eq!(metrics.aggregate_quota_attainment(month), 0);
        }
    }

    #[test]
    fn test_drive_status_counts_and_attainment() {
        let enero = Some(Month::Enero);
        let data = Dataset::from_records(
            vec![],
            vec![
                drive(enero, None, "A", "INSTALADO"),
                drive(enero, None, "A", "INSTALADO"),
                drive(enero, None, "A", "CANCELADO"),
                drive(enero, None, "A", "PENDIENTE"),
            ],
            vec![quota("A", Month::Enero, 2)],
        );
        let metrics = Metrics::new(&data);

        assert_eq!(metrics.installs(Month::Enero, Some("A")), 2);
        assert_eq!(metrics.cancellations(Month::Enero, Some("A")), 1);
        assert_eq!(metrics.pending(Month::Enero, Some("A")), 1);
        assert_eq!(metrics.quota_attainment(Month::Enero, Some("A")), 100);
        assert_eq!(metrics.unrecognized_statuses(Month::Enero, None), 0);
    }

    #[test]
    fn test_installs_count_only_installed() {
        let enero = Some(Month::Enero);
        let data = Dataset::from_records(
            vec![],
            vec![
                drive(enero, None, "A", "INSTALADO"),
                drive(enero, None, "A", "PENDIENTE"),
                drive(enero, None, "A", "CANCELADO"),
                drive(enero, None, "A", "instalado"),
                drive(enero, None, "A", ""),
            ],
            vec![],
        );
        let metrics = Metrics::new(&data);
        let installed = data
            .drive
            .iter()
            .filter(|d| d.status == InstallStatus::Installed)
            .count();
        assert_eq!(metrics.installs(Month::Enero, None), installed);
        assert_eq!(metrics.installs(Month::Enero, None), 1);
        assert_eq!(metrics.unrecognized_statuses(Month::Enero, None), 2);
    }

    #[test]
    fn test_zero_quota_gives_zero_attainment() {
        let enero = Some(Month::Enero);
        let data = Dataset::from_records(
            vec![],
            vec![drive(enero, None, "A", "INSTALADO")],
            vec![quota("A", Month::Enero, 0)],
        );
        let metrics = Metrics::new(&data);
        assert_eq!(metrics.quota_attainment(Month::Enero, Some("A")), 0);
        assert_eq!(metrics.quota_attainment(Month::Enero, Some("B")), 0);
    }

    #[test]
    fn test_attainment_is_not_capped() {
        let enero = Some(Month::Enero);
        let installs = (0..6).map(|_| drive(enero, None, "A", "INSTALADO")).collect();
        let data = Dataset::from_records(vec![], installs, vec![quota("A", Month::Enero, 5)]);
        assert_eq!(Metrics::new(&data).quota_attainment(Month::Enero, Some("A")), 120);
    }

    #[test]
    fn test_aggregate_attainment_is_weighted() {
        let enero = Some(Month::Enero);
        let mut rows: Vec<DriveRecord> = (0..10).map(|_| drive(enero, None, "A", "INSTALADO")).collect();
        rows.push(drive(enero, None, "B", "INSTALADO"));
        let data = Dataset::from_records(
            vec![],
            rows,
            vec![quota("A", Month::Enero, 10), quota("B", Month::Enero, 90)],
        );
        let metrics = Metrics::new(&data);

        let a = metrics.quota_attainment(Month::Enero, Some("A"));
        let b = metrics.quota_attainment(Month::Enero, Some("B"));
        assert_eq!((a, b), (100, 1));
        // (10 + 1) / (10 + 90) rather than (100 + 1) / 2
        assert_eq!(metrics.aggregate_quota_attainment(Month::Enero), 11);
        assert_ne!(metrics.aggregate_quota_attainment(Month::Enero), (a + b) / 2);
    }

    #[test]
    fn test_november_folds_october_dates() {
        let data = Dataset::from_records(
            vec![],
            vec![
                drive(None, Some((2025, 10, 3)), "A", "INSTALADO"),
                drive(None, Some((2025, 11, 20)), "A", "INSTALADO"),
                drive(None, Some((2025, 12, 1)), "A", "INSTALADO"),
                drive(None, None, "A", "INSTALADO"),
            ],
            vec![],
        );
        let metrics = Metrics::new(&data);

        assert_eq!(metrics.installs(Month::Noviembre, None), 2);
        assert_eq!(metrics.installs(Month::Octubre, None), 1);
        assert_eq!(metrics.installs(Month::Diciembre, None), 1);
        assert_eq!(metrics.installs(Month::Septiembre, None), 0);

        let plain = data.clone().with_exceptions(MonthExceptions::empty());
        assert_eq!(Metrics::new(&plain).installs(Month::Noviembre, None), 1);
    }

    #[test]
    fn test_explicit_month_label_wins_over_date() {
        let data = Dataset::from_records(
            vec![],
            vec![drive(Some(Month::Diciembre), Some((2025, 10, 3)), "A", "INSTALADO")],
            vec![],
        );
        let metrics = Metrics::new(&data);
        assert_eq!(metrics.installs(Month::Diciembre, None), 1);
        assert_eq!(metrics.installs(Month::Noviembre, None), 0);
        assert_eq!(metrics.installs(Month::Octubre, None), 0);
    }

    #[test]
    fn test_agent_filter_matches_spelling_drift() {
        let enero = Some(Month::Enero);
        let data = Dataset::from_records(
            vec![lead(Month::Enero, "ZIM_ALEXANDERST_VTP", "", "Con Cobertura", "")],
            vec![
                drive(enero, None, "ZIM_ALEXANDERST2_VTP", "INSTALADO"),
                drive(enero, None, "ZIM_ANA_VTP", "INSTALADO"),
            ],
            vec![quota("ZIM_ALEXANDERST_VTP", Month::Enero, 1)],
        );
        let metrics = Metrics::new(&data);

        assert_eq!(metrics.installs(Month::Enero, Some("ZIM_ALEXANDERST_VTP")), 1);
        assert_eq!(metrics.installs(Month::Enero, Some("ZIM_ALEXANDERST2_VTP")), 1);
        assert_eq!(metrics.sales_conversion_rate(Month::Enero, Some("ZIM_ALEXANDERST_VTP")), 100);
        assert_eq!(metrics.quota_attainment(Month::Enero, Some("ZIM_ALEXANDERST2_VTP")), 100);
        assert_eq!(metrics.installs(Month::Enero, Some("ZIM_NOBODY_VTP")), 0);
    }

    #[test]
    fn test_effectiveness_metrics_are_distinct() {
        let enero = Some(Month::Enero);
        let mut no_pay = drive(enero, None, "A", "CANCELADO");
        no_pay.cancel_reason = "NO PAGO".to_string();
        let data = Dataset::from_records(
            vec![
                lead(Month::Enero, "A", "", "Con Cobertura", ""),
                lead(Month::Enero, "A", "", "Con Cobertura", ""),
                lead(Month::Enero, "A", "", "Con Cobertura", ""),
                lead(Month::Enero, "A", "", "Con Cobertura", ""),
            ],
            vec![
                drive(enero, None, "A", "INSTALADO"),
                drive(enero, None, "A", "INSTALADO"),
                no_pay,
            ],
            vec![],
        );
        let metrics = Metrics::new(&data);

        assert_eq!(metrics.no_pay_cancellations(Month::Enero, None), 1);
        // 2 / (2 + 1 + 1)
        assert_eq!(metrics.install_effectiveness(Month::Enero, None), 50);
        // 2 / 4 coverage leads
        assert_eq!(metrics.sales_conversion_rate(Month::Enero, None), 50);

        let mut more = data.clone();
        more.leads.truncate(2);
        let metrics = Metrics::new(&more);
        assert_eq!(metrics.sales_conversion_rate(Month::Enero, None), 100);
        assert_eq!(metrics.install_effectiveness(Month::Enero, None), 50);
    }

    #[test]
    fn test_funnel_dropoff() {
        let data = Dataset::from_records(
            vec![
                lead(Month::Enero, "A", "No Responde", "", ""),
                lead(Month::Enero, "A", "", "No Especifica", ""),
                lead(Month::Enero, "A", "", "Sin Cobertura", ""),
                lead(Month::Enero, "A", "", "Sin Cobertura", ""),
            ],
            vec![],
            vec![],
        );
        let dropoff = Metrics::new(&data).funnel_dropoff(Month::Enero, None);
        assert_eq!(dropoff.total_leads, 4);
        assert_eq!(dropoff.no_response, Share { count: 1, percent: 25 });
        assert_eq!(dropoff.unspecified, Share { count: 1, percent: 25 });
        assert_eq!(dropoff.without_coverage, Share { count: 2, percent: 50 });
    }

    #[test]
    fn test_tally_counts_overlapping_months_once() {
        let data = Dataset::from_records(
            vec![],
            vec![
                drive(None, Some((2025, 10, 3)), "A", "INSTALADO"),
                drive(None, Some((2025, 11, 3)), "A", "INSTALADO"),
            ],
            vec![],
        );
        let metrics = Metrics::new(&data);

        assert_eq!(metrics.installs(Month::Octubre, None), 1);
        assert_eq!(metrics.installs(Month::Noviembre, None), 2);
        let both = metrics.tally(&[Month::Octubre, Month::Noviembre], None);
        assert_eq!(both.installs, 2);
        assert_eq!(metrics.tally(&[Month::Noviembre], None).installs, 2);
        assert_eq!(metrics.tally(&[], None), Tally::default());
    }

    #[test]
    fn test_tally_matches_single_month_metrics() {
        let enero = Some(Month::Enero);
        let mut no_pay = drive(enero, None, "A", "CANCELADO");
        no_pay.cancel_reason = "NO PAGO".to_string();
        let data = Dataset::from_records(
            vec![
                lead(Month::Enero, "A", "", "Con Cobertura", "Contrato OK"),
                lead(Month::Enero, "A", "", "Con Cobertura", ""),
                lead(Month::Enero, "A", "No Responde", "Sin Cobertura", ""),
                lead(Month::Enero, "A", "", "No Especifica", ""),
            ],
            vec![drive(enero, None, "A", "INSTALADO"), no_pay],
            vec![],
        );
        let metrics = Metrics::new(&data);
        let tally = metrics.tally(&[Month::Enero], None);

        assert_eq!(tally.coverage_rate(), metrics.coverage_rate(Month::Enero, None));
        assert_eq!(tally.contract_rate(), metrics.contract_rate(Month::Enero, None));
        assert_eq!(
            tally.sales_conversion_rate(),
            metrics.sales_conversion_rate(Month::Enero, None)
        );
        assert_eq!(
            tally.install_effectiveness(),
            metrics.install_effectiveness(Month::Enero, None)
        );
        assert_eq!(tally.coverage_rate(), 50);
        assert_eq!(tally.sales_conversion_rate(), 50);
        // 1 / (1 + 1 + 1)
        assert_eq!(tally.install_effectiveness(), 33);
        assert_eq!(tally.dropoff().without_coverage, Share { count: 1, percent: 25 });
        assert_eq!(tally.dropoff().unspecified, Share { count: 1, percent: 25 });
    }

    #[test]
    fn test_agents_differing_in_digit_are_not_merged() {
        let enero = Some(Month::Enero);
        let data = Dataset::from_records(
            vec![],
            vec![
                drive(enero, None, "ZIM_X3_VTP", "INSTALADO"),
                drive(enero, None, "ZIM_X7_VTP", "INSTALADO"),
            ],
            vec![quota("ZIM_X3_VTP", Month::Enero, 1), quota("ZIM_X7_VTP", Month::Enero, 1)],
        );
        let metrics = Metrics::new(&data);

        assert_eq!(metrics.installs(Month::Enero, Some("ZIM_X3_VTP")), 1);
        assert_eq!(metrics.installs(Month::Enero, Some("ZIM_X7_VTP")), 1);
        assert_eq!(metrics.quota(Month::Enero, Some("ZIM_X3_VTP")), 1);
        assert_eq!(metrics.quota_agents(Month::Enero), vec!["ZIM_X3_VTP", "ZIM_X7_VTP"]);
        assert_eq!(metrics.aggregate_quota_attainment(Month::Enero), 100);
    }
}
