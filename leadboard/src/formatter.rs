//! Output formatters for dashboard reports

use anyhow::Result;
use colored::*;
use leadcraft_core::SourceStatus;
use leadcraft_core::config::SheetNames;
use leadcraft_core::report::{
    AgentRow, Band, BarSeries, Cohort, DashboardReport, MonthlySummaryRow, Standing,
};
use std::path::Path;

const BAR_WIDTH: usize = 30;

/// Print the report as colored terminal output
pub fn print_human(file_path: &Path, report: &DashboardReport, sheets: &SheetNames) {
    println!("{}", format!("Dashboard: {}", file_path.display()).bold());
    println!(
        "{} {}   {} {}   {} {}",
        "Mes:".bold(),
        report.month.to_string().cyan().bold(),
        "Agente:".bold(),
        report.agent.as_deref().unwrap_or("todos").cyan(),
        "Vista:".bold(),
        report.view
    );
    println!();

    print_status(report, sheets);
    print_summary(report);
    print_bars(&report.attainment_chart);
    print_bars(&report.conversion_chart);
    print_quotas(report);
    print_monthly(report);
    for cohort in &report.cohorts {
        print_cohort(cohort);
    }
}

fn print_status(report: &DashboardReport, sheets: &SheetNames) {
    let entries = [
        (&sheets.leads, &report.status.leads),
        (&sheets.drive, &report.status.drive),
        (&sheets.quotas, &report.status.quotas),
    ];
    let mut any = false;
    for (sheet, status) in entries {
        let message = match status {
            SourceStatus::Loaded => continue,
            SourceStatus::Unavailable => "sheet could not be read".to_string(),
            SourceStatus::MissingColumn(column) => format!("column '{column}' not found"),
        };
        println!(
            "{} {} {}",
            "NO DATA".yellow().bold(),
            sheet.cyan(),
            message.bright_black()
        );
        any = true;
    }
    if any {
        println!();
    }
}

fn print_summary(report: &DashboardReport) {
    let s = &report.summary;
    println!("{}", "Resumen:".bold().underline());
    println!("  {:<28} {}", "Total leads", s.leads);
    println!("  {:<28} {} ({}%)", "Con cobertura", s.coverage, s.coverage_rate);
    println!("  {:<28} {} ({}%)", "Contratos OK", s.contracts, s.contract_rate);
    println!("  {:<28} {}", "Instalados", s.installs.to_string().green());
    println!("  {:<28} {}", "Cancelados", s.cancellations.to_string().red());
    println!("  {:<28} {}", "Pendientes", s.pending.to_string().yellow());
    println!("  {:<28} {}", "Cancelados por no pago", s.no_pay_cancellations);
    if s.unrecognized_statuses > 0 {
        println!(
            "  {:<28} {}",
            "Estados no reconocidos",
            s.unrecognized_statuses.to_string().yellow()
        );
    }
    println!("  {:<28} {}", "Meta", s.quota);
    println!(
        "  {:<28} {} {}",
        "Cumplimiento",
        colored_percent(s.quota_attainment),
        standing_label(s.standing)
    );
    println!("  {:<28} {}%", "Conversion de ventas", s.sales_conversion_rate);
    println!("  {:<28} {}%", "Efectividad de instalacion", s.install_effectiveness);
    if s.agent.is_none() {
        println!("  {:<28} {}", "Asesores con meta", s.agents_with_quota);
    }

    let d = &s.dropoff;
    println!(
        "  {:<28} no responde {} ({}%), no especifica {} ({}%), sin cobertura {} ({}%)",
        "Perdidas del embudo",
        d.no_response.count,
        d.no_response.percent,
        d.unspecified.count,
        d.unspecified.percent,
        d.without_coverage.count,
        d.without_coverage.percent
    );
    println!();
}

fn print_bars(series: &BarSeries) {
    println!("{}", series.title.bold().underline());
    if series.bars.is_empty() {
        println!("  {}", "sin datos".bright_black());
        println!();
        return;
    }
    let scale = series.max_value().max(100) as usize;
    let label_width = series.bars.iter().map(|b| b.label.len()).max().unwrap_or(0);
    for bar in series.bars.iter().rev() {
        let filled = (bar.value as usize * BAR_WIDTH).div_ceil(scale.max(1));
        let block = "█".repeat(filled);
        println!(
            "  {:<width$} {} {}%",
            bar.label,
            paint(&block, bar.band),
            bar.value,
            width = label_width
        );
    }
    println!();
}

fn print_quotas(report: &DashboardReport) {
    println!("{}", "Meta mensual:".bold().underline());
    for (pos, row) in report.quotas.iter().enumerate() {
        println!("  #{:<3} {:<28} {}", pos + 1, row.agent, row.quota);
    }
    println!();
}

fn print_monthly(report: &DashboardReport) {
    println!("{}", "Resumen mensual:".bold().underline());
    println!(
        "  {:<12} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>5} {:>6} {:>5} {:>5}",
        "Mes", "Leads", "Cober", "%Cob", "Contr", "%Conv", "Real", "Instal", "Cancel", "NoPag",
        "Efect", "NoResp", "%NR", "NoEsp", "%NE", "%SC"
    );
    for row in &report.monthly.rows {
        print_monthly_row(row, false);
    }
    print_monthly_row(&report.monthly.total, true);
    println!();
}

fn print_monthly_row(row: &MonthlySummaryRow, total: bool) {
    let d = &row.dropoff;
    let line = format!(
        "  {:<12} {:>6} {:>6} {:>5}% {:>6} {:>5}% {:>5}% {:>6} {:>6} {:>6} {:>5}% {:>6} {:>4}% {:>6} {:>4}% {:>4}%",
        row.month,
        row.leads,
        row.coverage,
        row.coverage_rate,
        row.contracts,
        row.contract_rate,
        row.sales_conversion_rate,
        row.installs,
        row.cancellations,
        row.no_pay_cancellations,
        row.install_effectiveness,
        d.no_response.count,
        d.no_response.percent,
        d.unspecified.count,
        d.unspecified.percent,
        d.without_coverage.percent
    );
    if total {
        println!("{}", line.bold());
    } else {
        println!("{line}");
    }
}

fn print_cohort(cohort: &Cohort) {
    println!("{} {}", "Detalle:".bold().underline(), cohort.title.cyan());
    if cohort.rows.is_empty() {
        println!("  {}", "sin asesores".bright_black());
        println!();
        return;
    }
    for row in &cohort.rows {
        print_agent_row(row);
    }
    println!();
}

fn print_agent_row(row: &AgentRow) {
    println!(
        "  #{:<3} {:<28} meta {:>4}  inst {:>4}  cumpl {:>5}  conv {:>4}%  efect {:>4}%  {}",
        row.rank,
        row.agent,
        row.quota,
        row.installs,
        colored_percent(row.quota_attainment),
        row.sales_conversion_rate,
        row.install_effectiveness,
        standing_label(row.standing)
    );
}

fn paint(text: &str, band: Band) -> ColoredString {
    match band {
        Band::Met => text.green(),
        Band::Near => text.yellow(),
        Band::Partial => text.bright_red(),
        Band::Behind => text.red(),
    }
}

fn colored_percent(value: u32) -> ColoredString {
    paint(&format!("{value}%"), Band::for_percent(value))
}

fn standing_label(standing: Standing) -> ColoredString {
    match standing {
        Standing::Excellent => format!("✓ {}", standing.label()).green().bold(),
        Standing::Good => format!("~ {}", standing.label()).yellow().bold(),
        Standing::Low => format!("✗ {}", standing.label()).red().bold(),
    }
}

/// Print the report in JSON format
pub fn print_json(file_path: &Path, report: &DashboardReport) -> Result<()> {
    let output = serde_json::json!({
        "file": file_path.display().to_string(),
        "generated_at": chrono::Local::now().to_rfc3339(),
        "report": report,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print the report as a standalone HTML page
pub fn print_html(file_path: &Path, report: &DashboardReport, sheets: &SheetNames) {
    println!("{}", render_html(file_path, report, sheets));
}

pub fn render_html(file_path: &Path, report: &DashboardReport, sheets: &SheetNames) -> String {
    let mut html = String::new();
    let title = format!("Cumplimiento mensual - {}", report.month);
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="es"><head><meta charset="utf-8"><title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; color: #1f2937; }}
.cards {{ display: flex; flex-wrap: wrap; gap: 1rem; }}
.card {{ border: 1px solid #e5e7eb; border-radius: 8px; padding: 0.8rem 1.2rem; min-width: 9rem; }}
.card .value {{ font-size: 1.6rem; font-weight: 700; color: #0066cc; }}
.nodata {{ background: #fef3c7; padding: 0.5rem 1rem; border-radius: 6px; }}
table {{ border-collapse: collapse; margin: 1rem 0; }}
th, td {{ padding: 0.3rem 0.8rem; border-bottom: 1px solid #e5e7eb; }}
.bar {{ height: 1rem; display: inline-block; vertical-align: middle; }}
.excellent {{ background: #f0fdf4; }} .good {{ background: #fffbeb; }} .low {{ background: #fef2f2; }}
tr.total {{ font-weight: 700; }}
</style></head><body>
<h1>{title}</h1>
<p>{file} &middot; agente: {agent} &middot; vista: {view} &middot; generado {generated}</p>
"#,
        title = escape(&title),
        file = escape(&file_path.display().to_string()),
        agent = escape(report.agent.as_deref().unwrap_or("todos")),
        view = report.view,
        generated = chrono::Local::now().format("%Y-%m-%d %H:%M"),
    ));

    let entries = [
        (&sheets.leads, &report.status.leads),
        (&sheets.drive, &report.status.drive),
        (&sheets.quotas, &report.status.quotas),
    ];
    for (sheet, status) in entries {
        let message = match status {
            SourceStatus::Loaded => continue,
            SourceStatus::Unavailable => "no se pudo leer la hoja".to_string(),
            SourceStatus::MissingColumn(column) => format!("falta la columna '{column}'"),
        };
        html.push_str(&format!(
            "<p class=\"nodata\">Sin datos de {}: {}</p>\n",
            escape(sheet),
            escape(&message)
        ));
    }

    let s = &report.summary;
    html.push_str(r#"<div class="cards">"#);
    for (label, value) in [
        ("Leads", s.leads.to_string()),
        ("Con cobertura", s.coverage.to_string()),
        ("Contratos OK", s.contracts.to_string()),
        ("Instalados", s.installs.to_string()),
        ("Cancelados", s.cancellations.to_string()),
        ("Pendientes", s.pending.to_string()),
        ("Meta", s.quota.to_string()),
        ("Cumplimiento", format!("{}%", s.quota_attainment)),
        ("Conversion de ventas", format!("{}%", s.sales_conversion_rate)),
        ("Efectividad", format!("{}%", s.install_effectiveness)),
        ("Estado", s.standing.label().to_string()),
    ] {
        html.push_str(&format!(
            r#"<div class="card"><div>{label}</div><div class="value">{}</div></div>"#,
            escape(&value)
        ));
    }
    html.push_str("</div>\n");

    for series in [&report.attainment_chart, &report.conversion_chart] {
        let scale = series.max_value().max(100) as f64;
        html.push_str(&format!("<h2>{}</h2><table>", escape(&series.title)));
        for bar in series.bars.iter().rev() {
            html.push_str(&format!(
                r#"<tr><td>{}</td><td><span class="bar" style="width: {:.0}px; background: {}"></span> {}%</td></tr>"#,
                escape(&bar.label),
                bar.value as f64 / scale * 300.0,
                bar.band.hex(),
                bar.value
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("<h2>Resumen mensual</h2><table><tr>");
    for heading in [
        "Mes", "Leads", "Cober", "%Cob", "Contr", "%Conv", "Real", "Instal", "Cancel", "NoPag",
        "Efect", "NoResp", "%NR", "NoEsp", "%NE", "%SC",
    ] {
        html.push_str(&format!("<th>{heading}</th>"));
    }
    html.push_str("</tr>");
    for (row, class) in report
        .monthly
        .rows
        .iter()
        .map(|r| (r, ""))
        .chain(std::iter::once((&report.monthly.total, "total")))
    {
        let d = &row.dropoff;
        html.push_str(&format!(
            r#"<tr class="{class}"><td>{}</td><td>{}</td><td>{}</td><td>{}%</td><td>{}</td><td>{}%</td><td>{}%</td><td>{}</td><td>{}</td><td>{}</td><td>{}%</td><td>{}</td><td>{}%</td><td>{}</td><td>{}%</td><td>{}%</td></tr>"#,
            escape(&row.month),
            row.leads,
            row.coverage,
            row.coverage_rate,
            row.contracts,
            row.contract_rate,
            row.sales_conversion_rate,
            row.installs,
            row.cancellations,
            row.no_pay_cancellations,
            row.install_effectiveness,
            d.no_response.count,
            d.no_response.percent,
            d.unspecified.count,
            d.unspecified.percent,
            d.without_coverage.percent
        ));
    }
    html.push_str("</table>\n");

    for cohort in &report.cohorts {
        html.push_str(&format!(
            "<h2>{}</h2><table><tr><th>Pos</th><th>Asesor</th><th>Meta</th><th>Instalados</th><th>Cumpl%</th><th>Conv%</th><th>Efectiv%</th><th>Estado</th></tr>",
            escape(&cohort.title)
        ));
        for row in &cohort.rows {
            let class = match row.standing {
                Standing::Excellent => "excellent",
                Standing::Good => "good",
                Standing::Low => "low",
            };
            html.push_str(&format!(
                r#"<tr class="{class}"><td>#{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}%</td><td>{}%</td><td>{}%</td><td>{}</td></tr>"#,
                row.rank,
                escape(&row.agent),
                row.quota,
                row.installs,
                row.quota_attainment,
                row.sales_conversion_rate,
                row.install_effectiveness,
                row.standing.label()
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body></html>");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadcraft_core::calendar::Month;
    use leadcraft_core::model::{FunnelLabel, LeadRecord};
    use leadcraft_core::report::{ViewMode, build_report};
    use leadcraft_core::{Dataset, DashboardConfig};

    #[test]
    fn test_html_escapes_and_flags_missing_sheets() {
        let config = DashboardConfig::default();
        let data = Dataset::from_tables(None, None, None, &config);
        let report = build_report(
            &data,
            Month::Enero,
            Some("<script>"),
            ViewMode::Full,
            &config.report_months(),
            &config.report,
        );
        let html = render_html(Path::new("a&b.xlsx"), &report, &config.sheets);

        assert!(html.contains("a&amp;b.xlsx"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Sin datos de MANTRA"));
        assert!(html.contains(r#"<tr class="total"><td>Total</td>"#));
    }

    #[test]
    fn test_html_monthly_table_shows_funnel_columns() {
        let lead = |tier2: &str| LeadRecord {
            month: Some(Month::Enero),
            agent: "ZIM_A_VTP".into(),
            tier1: FunnelLabel::parse(""),
            tier2: FunnelLabel::parse(tier2),
            tier3: FunnelLabel::parse(""),
        };
        let data = Dataset::from_records(
            vec![lead("Con Cobertura"), lead("Sin Cobertura")],
            vec![],
            vec![],
        );
        let config = DashboardConfig::default();
        let report = build_report(
            &data,
            Month::Enero,
            None,
            ViewMode::Full,
            &[Month::Enero],
            &config.report,
        );
        let html = render_html(Path::new("leads.xlsx"), &report, &config.sheets);

        assert!(html.contains("<th>%Cob</th>"));
        assert!(html.contains("<th>Real</th>"));
        assert!(html.contains("<th>%SC</th>"));
        assert!(html.contains(
            r#"<tr class=""><td>Enero</td><td>2</td><td>1</td><td>50%</td><td>0</td><td>0%</td><td>0%</td>"#
        ));
        // no response, unspecified, then the without-coverage share
        assert!(html.contains("<td>0</td><td>0%</td><td>0</td><td>0%</td><td>50%</td></tr>"));
    }
}
