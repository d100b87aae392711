//! View models rendered by the presenters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calendar::Month;
use crate::config::ReportConfig;
use crate::dataset::{Dataset, DatasetStatus};
use crate::metrics::{FunnelDropoff, Metrics, Tally};

/// Which slice of the agent ranking to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Full,
    Top5,
    Bottom5,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "all" => Ok(ViewMode::Full),
            "top5" | "top" => Ok(ViewMode::Top5),
            "bottom5" | "bottom" => Ok(ViewMode::Bottom5),
            other => Err(format!("unknown view '{other}' (expected full, top5 or bottom5)")),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewMode::Full => "full",
            ViewMode::Top5 => "top5",
            ViewMode::Bottom5 => "bottom5",
        })
    }
}

/// Attainment verdict shown next to each agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Excellent,
    Good,
    Low,
}

impl Standing {
    pub fn from_attainment(attainment: u32, config: &ReportConfig) -> Self {
        if attainment >= config.excellent_threshold {
            Standing::Excellent
        } else if attainment >= config.good_threshold {
            Standing::Good
        } else {
            Standing::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Standing::Excellent => "Excelente",
            Standing::Good => "Bueno",
            Standing::Low => "Bajo",
        }
    }
}

/// Color band of a percentage bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// 100 and above
    Met,
    /// 75..100
    Near,
    /// 50..75
    Partial,
    Behind,
}

impl Band {
    pub fn for_percent(value: u32) -> Self {
        match value {
            100.. => Band::Met,
            75..=99 => Band::Near,
            50..=74 => Band::Partial,
            _ => Band::Behind,
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            Band::Met => "#10b981",
            Band::Near => "#f59e0b",
            Band::Partial => "#f97316",
            Band::Behind => "#ef4444",
        }
    }
}

/// Headline values for the selected month
#[derive(Debug, Clone, Serialize)]
pub struct KpiSummary {
    /// `None` when the summary covers every agent
    pub agent: Option<String>,
    pub agents_with_quota: usize,
    pub leads: usize,
    pub coverage: usize,
    pub contracts: usize,
    pub installs: usize,
    pub cancellations: usize,
    pub pending: usize,
    pub no_pay_cancellations: usize,
    pub unrecognized_statuses: usize,
    pub quota: i64,
    pub quota_attainment: u32,
    pub coverage_rate: u32,
    pub contract_rate: u32,
    pub sales_conversion_rate: u32,
    pub install_effectiveness: u32,
    pub standing: Standing,
    pub dropoff: FunnelDropoff,
}

/// One agent in the detail table
#[derive(Debug, Clone, Serialize)]
pub struct AgentRow {
    pub rank: usize,
    pub agent: String,
    pub quota: i64,
    pub installs: usize,
    pub cancellations: usize,
    pub pending: usize,
    pub quota_attainment: u32,
    pub sales_conversion_rate: u32,
    pub install_effectiveness: u32,
    pub standing: Standing,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: u32,
    pub band: Band,
}

/// Horizontal bar chart, bars ordered from lowest to highest
#[derive(Debug, Clone, Serialize)]
pub struct BarSeries {
    pub title: String,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    fn new(title: &str, mut bars: Vec<(String, u32)>) -> Self {
        bars.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Self {
            title: title.to_string(),
            bars: bars
                .into_iter()
                .map(|(label, value)| Bar {
                    label,
                    value,
                    band: Band::for_percent(value),
                })
                .collect(),
        }
    }

    pub fn max_value(&self) -> u32 {
        self.bars.iter().map(|b| b.value).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummaryRow {
    pub month: String,
    pub leads: usize,
    pub coverage: usize,
    pub contracts: usize,
    pub installs: usize,
    pub cancellations: usize,
    pub no_pay_cancellations: usize,
    pub coverage_rate: u32,
    pub contract_rate: u32,
    /// Installs over coverage leads
    pub sales_conversion_rate: u32,
    pub install_effectiveness: u32,
    pub dropoff: FunnelDropoff,
}

impl MonthlySummaryRow {
    fn from_tally(month: String, tally: &Tally) -> Self {
        Self {
            month,
            leads: tally.leads,
            coverage: tally.coverage,
            contracts: tally.contracts,
            installs: tally.installs,
            cancellations: tally.cancellations,
            no_pay_cancellations: tally.no_pay_cancellations,
            coverage_rate: tally.coverage_rate(),
            contract_rate: tally.contract_rate(),
            sales_conversion_rate: tally.sales_conversion_rate(),
            install_effectiveness: tally.install_effectiveness(),
            dropoff: tally.dropoff(),
        }
    }
}

/// Month-over-month table; the total row counts each row once across all months
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    pub rows: Vec<MonthlySummaryRow>,
    pub total: MonthlySummaryRow,
}

/// Agents grouped by the size of their quota
#[derive(Debug, Clone, Serialize)]
pub struct Cohort {
    pub title: String,
    pub rows: Vec<AgentRow>,
}

/// Quota table row, largest quota first
#[derive(Debug, Clone, Serialize)]
pub struct QuotaRow {
    pub agent: String,
    pub quota: i64,
}

/// Everything a presenter needs for one month/agent selection
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub month: Month,
    pub agent: Option<String>,
    pub view: ViewMode,
    pub status: DatasetStatus,
    pub summary: KpiSummary,
    pub aggregate_quota_attainment: u32,
    pub quotas: Vec<QuotaRow>,
    pub attainment_chart: BarSeries,
    pub conversion_chart: BarSeries,
    pub monthly: MonthlySummary,
    pub cohorts: Vec<Cohort>,
}

impl DashboardReport {
    /// True when no sheet contributed a single row
    pub fn is_empty(&self) -> bool {
        !self.status.leads.is_loaded()
            && !self.status.drive.is_loaded()
            && !self.status.quotas.is_loaded()
    }
}

/// Assemble the report for `month`, optionally narrowed to one agent
pub fn build_report(
    data: &Dataset,
    month: Month,
    agent: Option<&str>,
    view: ViewMode,
    months: &[Month],
    config: &ReportConfig,
) -> DashboardReport {
    let metrics = Metrics::new(data);
    let rows = agent_rows(&metrics, month, config);

    let mut quotas: Vec<QuotaRow> = rows
        .iter()
        .map(|r| QuotaRow {
            agent: r.agent.clone(),
            quota: r.quota,
        })
        .collect();
    quotas.sort_by(|a, b| b.quota.cmp(&a.quota).then_with(|| a.agent.cmp(&b.agent)));

    let attainment_chart = BarSeries::new(
        "Cumplimiento por agente (%)",
        rows.iter()
            .map(|r| (r.agent.clone(), r.quota_attainment))
            .collect(),
    );
    let conversion_chart = BarSeries::new(
        "Conversion de ventas por agente (%)",
        rows.iter()
            .map(|r| (r.agent.clone(), r.sales_conversion_rate))
            .collect(),
    );

    DashboardReport {
        month,
        agent: agent.map(str::to_string),
        view,
        status: data.status.clone(),
        summary: summary(&metrics, month, agent, config),
        aggregate_quota_attainment: metrics.aggregate_quota_attainment(month),
        quotas,
        attainment_chart,
        conversion_chart,
        monthly: monthly_summary(&metrics, months),
        cohorts: cohorts(select(rows, view), config),
    }
}

fn summary(metrics: &Metrics<'_>, month: Month, agent: Option<&str>, config: &ReportConfig) -> KpiSummary {
    let quota_attainment = match agent {
        Some(_) => metrics.quota_attainment(month, agent),
        None => metrics.aggregate_quota_attainment(month),
    };
    KpiSummary {
        agent: agent.map(str::to_string),
        agents_with_quota: metrics.quota_agents(month).len(),
        leads: metrics.total_leads(month, agent),
        coverage: metrics.coverage_count(month, agent),
        contracts: metrics.contract_count(month, agent),
        installs: metrics.installs(month, agent),
        cancellations: metrics.cancellations(month, agent),
        pending: metrics.pending(month, agent),
        no_pay_cancellations: metrics.no_pay_cancellations(month, agent),
        unrecognized_statuses: metrics.unrecognized_statuses(month, agent),
        quota: metrics.quota(month, agent),
        quota_attainment,
        coverage_rate: metrics.coverage_rate(month, agent),
        contract_rate: metrics.contract_rate(month, agent),
        sales_conversion_rate: metrics.sales_conversion_rate(month, agent),
        install_effectiveness: metrics.install_effectiveness(month, agent),
        standing: Standing::from_attainment(quota_attainment, config),
        dropoff: metrics.funnel_dropoff(month, agent),
    }
}

/// One row per agent holding a quota, best attainment first
fn agent_rows(metrics: &Metrics<'_>, month: Month, config: &ReportConfig) -> Vec<AgentRow> {
    let mut rows: Vec<AgentRow> = metrics
        .quota_agents(month)
        .into_iter()
        .map(|agent| {
            let a = Some(agent.as_str());
            let quota_attainment = metrics.quota_attainment(month, a);
            AgentRow {
                rank: 0,
                quota: metrics.quota(month, a),
                installs: metrics.installs(month, a),
                cancellations: metrics.cancellations(month, a),
                pending: metrics.pending(month, a),
                quota_attainment,
                sales_conversion_rate: metrics.sales_conversion_rate(month, a),
                install_effectiveness: metrics.install_effectiveness(month, a),
                standing: Standing::from_attainment(quota_attainment, config),
                agent,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.quota_attainment
            .cmp(&a.quota_attainment)
            .then_with(|| a.agent.cmp(&b.agent))
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}

/// Apply the view: the five best, the five worst (worst first) or everyone
fn select(mut rows: Vec<AgentRow>, view: ViewMode) -> Vec<AgentRow> {
    match view {
        ViewMode::Full => rows,
        ViewMode::Top5 => {
            rows.truncate(5);
            rows
        }
        ViewMode::Bottom5 => {
            rows.reverse();
            rows.truncate(5);
            rows
        }
    }
}

fn cohorts(rows: Vec<AgentRow>, config: &ReportConfig) -> Vec<Cohort> {
    let threshold = config.cohort_quota_threshold;
    let (high, low): (Vec<AgentRow>, Vec<AgentRow>) =
        rows.into_iter().partition(|r| r.quota >= threshold);
    vec![
        Cohort {
            title: format!("Meta >= {threshold}"),
            rows: high,
        },
        Cohort {
            title: format!("Meta < {threshold}"),
            rows: low,
        },
    ]
}

fn monthly_summary(metrics: &Metrics<'_>, months: &[Month]) -> MonthlySummary {
    let rows = months
        .iter()
        .map(|&month| MonthlySummaryRow::from_tally(month.to_string(), &metrics.tally(&[month], None)))
        .collect();

    MonthlySummary {
        total: MonthlySummaryRow::from_tally("Total".to_string(), &metrics.tally(months, None)),
        rows,
    }
}
