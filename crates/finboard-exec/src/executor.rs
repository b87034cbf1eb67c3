use chrono::Duration;
use chrono::NaiveDate;
use finboard_core::payloads::ChannelBreakdown;
use finboard_core::payloads::ChannelStats;
use finboard_core::payloads::ComplianceLevel;
use finboard_core::payloads::ComplianceStatus;
use finboard_core::payloads::DailyVolume;
use finboard_core::payloads::MerchantVolume;
use finboard_core::payloads::SlaCompliance;
use finboard_core::payloads::SlaTargets;
use finboard_core::payloads::ToolPayload;
use finboard_core::payloads::TransactionSummary;
use finboard_core::tool_registry::ToolId;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use tracing::debug;

use crate::contracts::ToolInvocation;
use crate::contracts::ToolInvocationStatus;
use crate::contracts::ToolResult;

pub const DEFAULT_DATE_RANGE: &str = "7d";
pub const MAX_RANGE_DAYS: u32 = 90;

pub struct ToolExecutionContext {
    /// Last day covered by date-ranged tools.
    pub today: NaiveDate,
}

pub trait ToolExecutor {
    fn execute(&self, invocation: ToolInvocation, context: &ToolExecutionContext) -> ToolResult;
}

/// Mock FinOps backend. Every invocation draws from its own RNG derived from
/// the executor seed and the invocation id, so a fixed seed replays exactly.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedToolExecutor {
    seed: u64,
}

impl SimulatedToolExecutor {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed: seed.unwrap_or_else(rand::random),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SimulatedToolExecutor {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ToolExecutor for SimulatedToolExecutor {
    fn execute(&self, invocation: ToolInvocation, context: &ToolExecutionContext) -> ToolResult {
        let Some(tool) = ToolId::from_name(&invocation.tool_id) else {
            return build_result(
                invocation,
                ToolInvocationStatus::Failed,
                None,
                vec!["unknown tool id".to_string()],
            );
        };
        let tenant_id = invocation.tenant_id.trim().to_string();
        if tenant_id.is_empty() {
            return build_result(
                invocation,
                ToolInvocationStatus::Failed,
                None,
                vec!["tenant id is required".to_string()],
            );
        }

        let mut rng = StdRng::seed_from_u64(self.seed ^ invocation.invocation_id.rotate_left(17));
        let payload = match tool {
            ToolId::TransactionSummary => {
                let range = invocation
                    .date_range
                    .as_deref()
                    .unwrap_or(DEFAULT_DATE_RANGE);
                let days = parse_range_days(range);
                ToolPayload::TransactionSummary(transaction_summary(
                    &mut rng,
                    &tenant_id,
                    days,
                    context.today,
                ))
            }
            ToolId::SlaCompliance => {
                ToolPayload::SlaCompliance(sla_compliance(&mut rng, &tenant_id))
            }
            ToolId::PaymentChannelBreakdown => {
                ToolPayload::ChannelBreakdown(channel_breakdown(&mut rng, &tenant_id))
            }
        };

        match payload.to_value() {
            Ok(value) => {
                debug!(tool = tool.as_str(), tenant = %tenant_id, "simulated tool call");
                build_result(
                    invocation,
                    ToolInvocationStatus::Succeeded,
                    Some(value),
                    vec![format!("simulated {} for {tenant_id}", tool.as_str())],
                )
            }
            Err(err) => build_result(
                invocation,
                ToolInvocationStatus::Failed,
                None,
                vec![format!("failed to encode payload: {err}")],
            ),
        }
    }
}

/// `"14d"` style ranges; anything else falls back to a week.
pub fn parse_range_days(range: &str) -> u32 {
    range
        .trim()
        .strip_suffix('d')
        .and_then(|days| days.parse::<u32>().ok())
        .filter(|days| *days > 0)
        .map_or(7, |days| days.min(MAX_RANGE_DAYS))
}

fn transaction_summary(
    rng: &mut StdRng,
    tenant_id: &str,
    days: u32,
    today: NaiveDate,
) -> TransactionSummary {
    let base_volume: i64 = rng.gen_range(850_000..=1_200_000);
    let success_rate_pct = round_to(rng.gen_range(97.2..99.8), 2);
    let avg_latency_ms = round_to(rng.gen_range(120.0..280.0), 1);

    let daily_breakdown: Vec<DailyVolume> = (0..days)
        .map(|i| {
            let date = today - Duration::days(i64::from(days - 1 - i));
            let volume = (base_volume + rng.gen_range(-100_000..=150_000)) as u64;
            DailyVolume {
                date: date.format("%Y-%m-%d").to_string(),
                volume,
                amount_usd: round_to(volume as f64 * rng.gen_range(42.0..78.0), 2),
            }
        })
        .collect();

    let merchants = [
        ("Stripe Connect", 200_000..=400_000, 8_000_000.0..15_000_000.0),
        ("PayPal Commerce", 150_000..=300_000, 5_000_000.0..12_000_000.0),
        ("Square POS", 100_000..=250_000, 3_000_000.0..8_000_000.0),
        ("Adyen Gateway", 80_000..=200_000, 4_000_000.0..10_000_000.0),
        ("Worldpay Direct", 50_000..=150_000, 2_000_000.0..6_000_000.0),
    ];
    let top_merchants = merchants
        .into_iter()
        .map(|(name, volume, amount)| MerchantVolume {
            name: name.to_string(),
            volume: rng.gen_range(volume),
            amount_usd: round_to(rng.gen_range(amount), 2),
        })
        .collect();

    TransactionSummary {
        tenant_id: tenant_id.to_string(),
        date_range: format!("{days}d"),
        total_transactions: daily_breakdown.iter().map(|day| day.volume).sum(),
        total_amount_usd: round_to(daily_breakdown.iter().map(|day| day.amount_usd).sum(), 2),
        success_rate_pct,
        avg_latency_ms,
        daily_breakdown,
        top_merchants,
    }
}

fn sla_compliance(rng: &mut StdRng, tenant_id: &str) -> SlaCompliance {
    // Two in three draws stay compliant.
    let latency = if rng.gen_ratio(1, 3) {
        ComplianceLevel::AtRisk
    } else {
        ComplianceLevel::Compliant
    };
    let error_rate = if rng.gen_ratio(1, 3) {
        ComplianceLevel::NonCompliant
    } else {
        ComplianceLevel::Compliant
    };

    SlaCompliance {
        tenant_id: tenant_id.to_string(),
        period: "current_month".to_string(),
        uptime_pct: round_to(rng.gen_range(99.90..99.99), 3),
        p50_latency_ms: round_to(rng.gen_range(45.0..85.0), 1),
        p95_latency_ms: round_to(rng.gen_range(180.0..350.0), 1),
        p99_latency_ms: round_to(rng.gen_range(400.0..800.0), 1),
        error_rate_pct: round_to(rng.gen_range(0.01..0.15), 3),
        sla_targets: SlaTargets {
            uptime_target_pct: 99.95,
            p95_latency_target_ms: 300.0,
            error_rate_target_pct: 0.10,
        },
        compliance_status: ComplianceStatus {
            uptime: ComplianceLevel::Compliant,
            latency,
            error_rate,
        },
        incidents_this_month: rng.gen_range(0..=3),
    }
}

fn channel_breakdown(rng: &mut StdRng, tenant_id: &str) -> ChannelBreakdown {
    let specs = [
        ("Credit Card", 38.0..48.0, 65.0..120.0, 97.0..99.5),
        ("Debit Card", 20.0..30.0, 35.0..75.0, 98.0..99.8),
        ("ACH/Bank Transfer", 10.0..18.0, 250.0..1200.0, 99.0..99.9),
        ("Digital Wallet", 8.0..15.0, 40.0..90.0, 98.5..99.9),
        ("Wire Transfer", 2.0..6.0, 5000.0..50000.0, 99.5..100.0),
    ];
    let mut channels: Vec<ChannelStats> = specs
        .into_iter()
        .map(|(channel, share, ticket, success)| ChannelStats {
            channel: channel.to_string(),
            volume_pct: round_to(rng.gen_range(share), 1),
            avg_ticket_usd: round_to(rng.gen_range(ticket), 2),
            success_rate_pct: round_to(rng.gen_range(success), 2),
        })
        .collect();

    let total: f64 = channels.iter().map(|c| c.volume_pct).sum();
    if total > 0.0 {
        for channel in &mut channels {
            channel.volume_pct = round_to(channel.volume_pct / total * 100.0, 1);
        }
    }

    ChannelBreakdown {
        tenant_id: tenant_id.to_string(),
        total_channels_active: channels.len() as u32,
        channels,
        fastest_channel: "Digital Wallet".to_string(),
        highest_value_channel: "Wire Transfer".to_string(),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn build_result(
    invocation: ToolInvocation,
    status: ToolInvocationStatus,
    payload: Option<serde_json::Value>,
    logs: Vec<String>,
) -> ToolResult {
    ToolResult {
        invocation_id: invocation.invocation_id,
        tool_id: invocation.tool_id,
        status,
        payload,
        logs,
    }
}
