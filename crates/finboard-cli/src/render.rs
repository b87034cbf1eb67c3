//! Panel bodies as styled lines.
//!
//! Nothing here touches the terminal: the TUI wraps the lines in widgets and
//! the headless commands flatten them to plain text.

use std::sync::OnceLock;

use finboard_core::payloads::ChannelBreakdown;
use finboard_core::payloads::ComplianceLevel;
use finboard_core::payloads::SlaCompliance;
use finboard_core::payloads::ToolPayload;
use finboard_core::payloads::TransactionSummary;
use finboard_core::selector::Panel;
use finboard_core::tool_registry::ToolRegistry;
use finboard_core::ToolInvocationRecord;
use finboard_core::UiTheme;
use finboard_core::PROMPT_SUGGESTIONS;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use serde_json::Value;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::palette::syntect_theme_name;
use crate::palette::UiPalette;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    pub palette: UiPalette,
    pub theme: UiTheme,
    pub tenant_id: &'a str,
    pub raw_payload: bool,
    pub spinner: &'a str,
}

/// Title and body for the main panel.
pub fn render_panel(panel: Panel<'_>, options: RenderOptions<'_>) -> (String, Vec<Line<'static>>) {
    match panel {
        Panel::Idle => ("FinOps Agent".to_string(), welcome_lines(options)),
        Panel::Tool { tool, record } => {
            let title = ToolRegistry::get(tool).title.to_string();
            if record.is_in_progress() {
                return (title, skeleton_lines(record, options));
            }
            let Some(payload) = record.payload.as_ref() else {
                return (
                    title,
                    vec![muted_line("The tool finished without returning data.", options.palette)],
                );
            };
            if options.raw_payload {
                return (format!("{title} (raw)"), raw_json_lines(payload, options));
            }
            let lines = match ToolPayload::decode(tool, payload) {
                Ok(ToolPayload::TransactionSummary(summary)) => {
                    transaction_lines(&summary, options.palette)
                }
                Ok(ToolPayload::SlaCompliance(sla)) => sla_lines(&sla, options.palette),
                Ok(ToolPayload::ChannelBreakdown(breakdown)) => {
                    channel_lines(&breakdown, options.palette)
                }
                Err(err) => {
                    let mut lines = vec![Line::from(Span::styled(
                        format!("Unexpected payload shape: {err}"),
                        Style::default().fg(options.palette.danger),
                    ))];
                    lines.push(Line::from(""));
                    lines.extend(raw_json_lines(payload, options));
                    lines
                }
            };
            (title, lines)
        }
    }
}

pub fn welcome_lines(options: RenderOptions<'_>) -> Vec<Line<'static>> {
    let palette = options.palette;
    let mut lines = vec![
        Line::from(Span::styled(
            "FinOps Agent",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(
            "Ask the assistant about transaction volumes, SLA compliance, or payment channel breakdowns. Results will appear here.",
        ),
        Line::from(vec![
            Span::styled("Tenant: ", Style::default().fg(palette.muted)),
            Span::styled(options.tenant_id.to_string(), Style::default().fg(palette.accent_alt)),
        ]),
        Line::from(""),
    ];
    for (idx, suggestion) in PROMPT_SUGGESTIONS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!(" F{} ", idx + 1), Style::default().fg(palette.accent)),
            Span::raw(format!("\u{201c}{suggestion}\u{201d}")),
        ]));
    }
    lines
}

fn skeleton_lines(record: &ToolInvocationRecord, options: RenderOptions<'_>) -> Vec<Line<'static>> {
    let palette = options.palette;
    let placeholder = Style::default().fg(palette.muted).bg(palette.selected_bg);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} ", options.spinner),
                Style::default().fg(palette.phase(record.phase)),
            ),
            Span::styled(
                format!("{} ({})", record.tool_name, record.phase.label()),
                Style::default().fg(palette.phase(record.phase)),
            ),
        ]),
        Line::from(""),
    ];
    for width in [24usize, 36, 18, 30] {
        lines.push(Line::from(Span::styled(" ".repeat(width), placeholder)));
        lines.push(Line::from(""));
    }
    lines
}

fn transaction_lines(summary: &TransactionSummary, palette: UiPalette) -> Vec<Line<'static>> {
    let mut lines = vec![
        header_line(
            &format!("Tenant {} | last {}", summary.tenant_id, summary.date_range),
            palette,
        ),
        Line::from(""),
        metric_line("Transactions", format_count(summary.total_transactions), None, palette),
        metric_line("Amount", format_usd(summary.total_amount_usd), None, palette),
        metric_line(
            "Success rate",
            format!("{:.2}%", summary.success_rate_pct),
            None,
            palette,
        ),
        metric_line(
            "Avg latency",
            format!("{:.1} ms", summary.avg_latency_ms),
            None,
            palette,
        ),
    ];

    if !summary.daily_breakdown.is_empty() {
        let volumes: Vec<u64> = summary.daily_breakdown.iter().map(|day| day.volume).collect();
        lines.push(Line::from(""));
        lines.push(section_line("Daily volume", palette));
        lines.push(Line::from(Span::styled(
            sparkline(&volumes),
            Style::default().fg(palette.accent),
        )));
        if let (Some(first), Some(last)) = (
            summary.daily_breakdown.first(),
            summary.daily_breakdown.last(),
        ) {
            lines.push(muted_line(&format!("{} .. {}", first.date, last.date), palette));
        }
    }

    if !summary.top_merchants.is_empty() {
        lines.push(Line::from(""));
        lines.push(section_line("Top merchants", palette));
        for merchant in &summary.top_merchants {
            lines.push(Line::from(vec![
                Span::raw(format!("  {:<18}", merchant.name)),
                Span::styled(
                    format!("{:>12}", format_count(merchant.volume)),
                    Style::default().fg(palette.accent_alt),
                ),
                Span::raw(format!("  {}", format_usd(merchant.amount_usd))),
            ]));
        }
    }
    lines
}

fn sla_lines(sla: &SlaCompliance, palette: UiPalette) -> Vec<Line<'static>> {
    let status = &sla.compliance_status;
    let targets = &sla.sla_targets;
    let mut lines = vec![
        header_line(&format!("Tenant {} | {}", sla.tenant_id, sla.period), palette),
        Line::from(""),
        Line::from(vec![
            badge("Uptime", status.uptime, palette),
            Span::raw("  "),
            badge("Latency", status.latency, palette),
            Span::raw("  "),
            badge("Error rate", status.error_rate, palette),
        ]),
        Line::from(""),
        metric_line(
            "Uptime",
            format!("{:.3}%", sla.uptime_pct),
            Some(format!("target {}%", targets.uptime_target_pct)),
            palette,
        ),
        metric_line(
            "P95 latency",
            format!("{:.1} ms", sla.p95_latency_ms),
            Some(format!("target {} ms", targets.p95_latency_target_ms)),
            palette,
        ),
        metric_line(
            "Error rate",
            format!("{:.3}%", sla.error_rate_pct),
            Some(format!("target {:.2}%", targets.error_rate_target_pct)),
            palette,
        ),
        metric_line(
            "Incidents",
            sla.incidents_this_month.to_string(),
            Some("this month".to_string()),
            palette,
        ),
        Line::from(""),
        section_line("Latency percentiles", palette),
    ];

    let colors = [palette.success, palette.warning, palette.danger];
    let segments: Vec<Span<'static>> = sla
        .latency_segments()
        .iter()
        .zip(colors)
        .map(|(pct, color)| {
            let width = usize::from(*pct) * BAR_WIDTH / 100;
            Span::styled("█".repeat(width), Style::default().fg(color))
        })
        .collect();
    lines.push(Line::from(segments));
    lines.push(muted_line(
        &format!(
            "P50 {} ms   P95 {} ms   P99 {} ms",
            sla.p50_latency_ms, sla.p95_latency_ms, sla.p99_latency_ms
        ),
        palette,
    ));
    lines
}

fn channel_lines(breakdown: &ChannelBreakdown, palette: UiPalette) -> Vec<Line<'static>> {
    let mut lines = vec![
        header_line(
            &format!(
                "Tenant {} | {} active channels",
                breakdown.tenant_id, breakdown.total_channels_active
            ),
            palette,
        ),
        Line::from(""),
    ];
    for channel in &breakdown.channels {
        let filled = ((channel.volume_pct / 100.0) * BAR_WIDTH as f64).round() as usize;
        lines.push(Line::from(vec![
            Span::raw(format!("{:<18}", channel.channel)),
            Span::styled(
                format!("{:<BAR_WIDTH$}", "█".repeat(filled.min(BAR_WIDTH))),
                Style::default().fg(palette.accent),
            ),
            Span::raw(format!(" {:>5.1}%", channel.volume_pct)),
        ]));
        lines.push(muted_line(
            &format!(
                "{:<18}avg ticket {}  success {:.2}%",
                "",
                format_usd(channel.avg_ticket_usd),
                channel.success_rate_pct
            ),
            palette,
        ));
    }
    lines.push(Line::from(""));
    lines.push(metric_line(
        "Fastest",
        breakdown.fastest_channel.clone(),
        None,
        palette,
    ));
    lines.push(metric_line(
        "Highest value",
        breakdown.highest_value_channel.clone(),
        None,
        palette,
    ));
    lines
}

pub fn raw_json_lines(value: &Value, options: RenderOptions<'_>) -> Vec<Line<'static>> {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let ps = get_syntax_set();
    let ts = get_theme_set();
    let syntax = ps
        .find_syntax_by_extension("json")
        .unwrap_or_else(|| ps.find_syntax_plain_text());
    let Some(theme) = ts.themes.get(syntect_theme_name(options.theme)) else {
        return text.lines().map(|line| Line::from(line.to_string())).collect();
    };
    let mut highlighter = HighlightLines::new(syntax, theme);

    LinesWithEndings::from(&text)
        .map(|line| {
            let ranges = highlighter.highlight_line(line, ps).unwrap_or_default();
            if ranges.is_empty() {
                return Line::from(line.trim_end_matches('\n').to_string());
            }
            let spans: Vec<Span<'static>> = ranges
                .into_iter()
                .map(|(style, piece)| {
                    let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                    Span::styled(
                        piece.trim_end_matches('\n').to_string(),
                        Style::default().fg(fg),
                    )
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Drops styling; used by the headless commands.
pub fn to_plain_text(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn sparkline(values: &[u64]) -> String {
    let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
        return String::new();
    };
    let span = u128::from(max - min);
    let top = SPARK_LEVELS.len() - 1;
    values
        .iter()
        .map(|value| {
            if span == 0 {
                SPARK_LEVELS[SPARK_LEVELS.len() / 2]
            } else {
                let scaled = u128::from(value - min) * top as u128 / span;
                SPARK_LEVELS[usize::try_from(scaled).map_or(top, |idx| idx.min(top))]
            }
        })
        .collect()
}

pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_usd(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1_000_000_000.0 {
        format!("{sign}${:.2}B", abs / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{sign}${:.2}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}${:.1}K", abs / 1_000.0)
    } else {
        format!("{sign}${abs:.2}")
    }
}

fn badge(label: &str, level: ComplianceLevel, palette: UiPalette) -> Span<'static> {
    Span::styled(
        format!("[{label}: {}]", level.label()),
        Style::default()
            .fg(palette.compliance(level))
            .add_modifier(Modifier::BOLD),
    )
}

fn header_line(text: &str, palette: UiPalette) -> Line<'static> {
    muted_line(text, palette)
}

fn section_line(text: &str, palette: UiPalette) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn muted_line(text: &str, palette: UiPalette) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(palette.muted)))
}

fn metric_line(
    label: &str,
    value: String,
    note: Option<String>,
    palette: UiPalette,
) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("{label:<14}"), Style::default().fg(palette.muted)),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(note) = note {
        spans.push(Span::styled(format!("  ({note})"), Style::default().fg(palette.muted)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use finboard_core::selector::resolve_panel;
    use finboard_core::ResultStore;
    use finboard_core::ToolPhase;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::palette::palette_for;

    fn options(raw_payload: bool) -> RenderOptions<'static> {
        RenderOptions {
            palette: palette_for(UiTheme::Classic),
            theme: UiTheme::Classic,
            tenant_id: "tenant-demo-001",
            raw_payload,
            spinner: "*",
        }
    }

    fn rendered(store: &ResultStore, raw_payload: bool) -> (String, String) {
        let snapshot = store.snapshot();
        let (title, lines) = render_panel(resolve_panel(&snapshot), options(raw_payload));
        (title, to_plain_text(&lines))
    }

    fn sla_payload() -> Value {
        json!({
            "tenant_id": "tenant-demo-001",
            "period": "current_month",
            "uptime_pct": 99.95,
            "p50_latency_ms": 50.0,
            "p95_latency_ms": 200.0,
            "p99_latency_ms": 400.0,
            "error_rate_pct": 0.05,
            "sla_targets": {
                "uptime_target_pct": 99.95,
                "p95_latency_target_ms": 300,
                "error_rate_target_pct": 0.10
            },
            "compliance_status": {
                "uptime": "COMPLIANT",
                "latency": "AT_RISK",
                "error_rate": "COMPLIANT"
            },
            "incidents_this_month": 1
        })
    }

    #[test]
    fn empty_store_shows_the_welcome_panel() {
        let store = ResultStore::new();
        let (title, text) = rendered(&store, false);
        assert_eq!(title, "FinOps Agent");
        assert!(text.contains("Tenant: tenant-demo-001"));
        for suggestion in PROMPT_SUGGESTIONS {
            assert!(text.contains(suggestion), "missing {suggestion}");
        }
        let rows: Vec<&str> = text.lines().collect();
        assert!(rows[5].starts_with(" F1 "));
    }

    #[test]
    fn running_tool_renders_a_skeleton() {
        let mut store = ResultStore::new();
        store
            .record("get_sla_compliance", ToolPhase::Running, None)
            .expect("record");
        store.flush();
        let (title, text) = rendered(&store, false);
        assert_eq!(title, "SLA Compliance");
        assert!(text.starts_with("* get_sla_compliance (running)"));
    }

    #[test]
    fn completed_sla_renders_badges_and_targets() {
        let mut store = ResultStore::new();
        store
            .record("get_sla_compliance", ToolPhase::Complete, Some(sla_payload()))
            .expect("record");
        store.flush();
        let (_, text) = rendered(&store, false);
        assert!(text.contains("[Uptime: COMPLIANT]  [Latency: AT RISK]"));
        assert!(text.contains("target 300 ms"));
        assert!(text.contains("P50 50 ms   P95 200 ms   P99 400 ms"));
    }

    #[test]
    fn transaction_summary_with_huge_daily_volumes_still_renders() {
        let payload = json!({
            "tenant_id": "tenant-demo-001",
            "date_range": "2d",
            "total_transactions": u64::MAX,
            "total_amount_usd": 10.0,
            "success_rate_pct": 99.0,
            "avg_latency_ms": 120.0,
            "daily_breakdown": [
                { "date": "2026-10-16", "volume": 0, "amount_usd": 0.0 },
                { "date": "2026-10-17", "volume": u64::MAX, "amount_usd": 10.0 }
            ]
        });
        let mut store = ResultStore::new();
        store
            .record("get_transaction_summary", ToolPhase::Complete, Some(payload))
            .expect("record");
        store.flush();
        let (title, text) = rendered(&store, false);
        assert_eq!(title, "Transaction Summary");
        assert!(text.contains("▁█"));
        assert!(text.contains("2026-10-16 .. 2026-10-17"));
    }

    #[test]
    fn raw_mode_shows_pretty_json() {
        let mut store = ResultStore::new();
        store
            .record("get_sla_compliance", ToolPhase::Complete, Some(json!({ "uptime_pct": 99.9 })))
            .expect("record");
        store.flush();
        let (title, text) = rendered(&store, true);
        assert_eq!(title, "SLA Compliance (raw)");
        assert_eq!(text, "{\n  \"uptime_pct\": 99.9\n}");
    }

    #[test]
    fn mismatched_payload_reports_and_falls_back_to_json() {
        let mut store = ResultStore::new();
        store
            .record("get_payment_channel_breakdown", ToolPhase::Complete, Some(json!({ "x": 1 })))
            .expect("record");
        store.flush();
        let (_, text) = rendered(&store, false);
        assert!(text.starts_with("Unexpected payload shape"));
        assert!(text.contains("\"x\": 1"));
    }

    #[test]
    fn complete_without_payload_says_so() {
        let mut store = ResultStore::new();
        store
            .record("get_transaction_summary", ToolPhase::Complete, None)
            .expect("record");
        store.flush();
        let (_, text) = rendered(&store, false);
        assert_eq!(text, "The tool finished without returning data.");
    }

    #[test]
    fn sparkline_scales_between_min_and_max() {
        assert_eq!(sparkline(&[1, 5, 9]), "▁▄█");
        assert_eq!(sparkline(&[3, 3]), "▅▅");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn sparkline_handles_volumes_near_the_integer_limit() {
        assert_eq!(sparkline(&[0, u64::MAX]), "▁█");
        assert_eq!(sparkline(&[u64::MAX - 1, u64::MAX]), "▁█");
    }

    #[test]
    fn numbers_are_formatted_for_reading() {
        assert_eq!(format_count(6_912_345), "6,912,345");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_usd(412_345_678.9), "$412.35M");
        assert_eq!(format_usd(1_500.0), "$1.5K");
        assert_eq!(format_usd(65.5), "$65.50");
    }
}
