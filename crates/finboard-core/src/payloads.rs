//! Typed result payloads for the FinOps tools.
//!
//! The store keeps payloads as opaque JSON; renderers decode them here so a
//! malformed payload shows up as a decode error on one panel instead of
//! poisoning the read model.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::tool_registry::ToolId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVolume {
    pub date: String,
    pub volume: u64,
    pub amount_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantVolume {
    pub name: String,
    pub volume: u64,
    pub amount_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub tenant_id: String,
    pub date_range: String,
    pub total_transactions: u64,
    pub total_amount_usd: f64,
    pub success_rate_pct: f64,
    pub avg_latency_ms: f64,
    #[serde(default)]
    pub daily_breakdown: Vec<DailyVolume>,
    #[serde(default)]
    pub top_merchants: Vec<MerchantVolume>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceLevel {
    Compliant,
    AtRisk,
    NonCompliant,
}

impl ComplianceLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Compliant => "COMPLIANT",
            Self::AtRisk => "AT RISK",
            Self::NonCompliant => "NON-COMPLIANT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaTargets {
    pub uptime_target_pct: f64,
    pub p95_latency_target_ms: f64,
    pub error_rate_target_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceStatus {
    pub uptime: ComplianceLevel,
    pub latency: ComplianceLevel,
    pub error_rate: ComplianceLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaCompliance {
    pub tenant_id: String,
    pub period: String,
    pub uptime_pct: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub error_rate_pct: f64,
    pub sla_targets: SlaTargets,
    pub compliance_status: ComplianceStatus,
    pub incidents_this_month: u32,
}

impl SlaCompliance {
    /// Share of the p99 budget taken by p50, p50..p95 and p95..p99, in
    /// percent. All zero when p99 is not positive.
    pub fn latency_segments(&self) -> [u16; 3] {
        if self.p99_latency_ms <= 0.0 {
            return [0, 0, 0];
        }
        let total = self.p99_latency_ms;
        let pct = |value: f64| ((value / total) * 100.0).round().clamp(0.0, 100.0) as u16;
        [
            pct(self.p50_latency_ms),
            pct(self.p95_latency_ms - self.p50_latency_ms),
            pct(self.p99_latency_ms - self.p95_latency_ms),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel: String,
    pub volume_pct: f64,
    pub avg_ticket_usd: f64,
    pub success_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelBreakdown {
    pub tenant_id: String,
    pub channels: Vec<ChannelStats>,
    pub total_channels_active: u32,
    pub fastest_channel: String,
    pub highest_value_channel: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    TransactionSummary(TransactionSummary),
    SlaCompliance(SlaCompliance),
    ChannelBreakdown(ChannelBreakdown),
}

impl ToolPayload {
    pub fn decode(tool: ToolId, value: &Value) -> Result<Self, serde_json::Error> {
        Ok(match tool {
            ToolId::TransactionSummary => {
                Self::TransactionSummary(TransactionSummary::deserialize(value)?)
            }
            ToolId::SlaCompliance => Self::SlaCompliance(SlaCompliance::deserialize(value)?),
            ToolId::PaymentChannelBreakdown => {
                Self::ChannelBreakdown(ChannelBreakdown::deserialize(value)?)
            }
        })
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::TransactionSummary(summary) => serde_json::to_value(summary),
            Self::SlaCompliance(sla) => serde_json::to_value(sla),
            Self::ChannelBreakdown(channels) => serde_json::to_value(channels),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sla_value() -> Value {
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
                "error_rate": "NON_COMPLIANT"
            },
            "incidents_this_month": 2
        })
    }

    #[test]
    fn decodes_sla_payload_with_compliance_levels() {
        let payload = ToolPayload::decode(ToolId::SlaCompliance, &sla_value()).expect("decode");
        let ToolPayload::SlaCompliance(sla) = payload else {
            panic!("expected sla payload");
        };
        assert_eq!(sla.compliance_status.latency, ComplianceLevel::AtRisk);
        assert_eq!(sla.compliance_status.error_rate, ComplianceLevel::NonCompliant);
        assert_eq!(sla.sla_targets.p95_latency_target_ms, 300.0);
    }

    #[test]
    fn latency_segments_split_the_p99_budget() {
        let ToolPayload::SlaCompliance(sla) =
            ToolPayload::decode(ToolId::SlaCompliance, &sla_value()).expect("decode")
        else {
            panic!("expected sla payload");
        };
        assert_eq!(sla.latency_segments(), [13, 38, 50]);
    }

    #[test]
    fn decode_reports_shape_mismatch() {
        let err = ToolPayload::decode(ToolId::TransactionSummary, &json!({ "uptime": 99.9 }));
        assert!(err.is_err());
    }

    #[test]
    fn transaction_summary_lists_default_to_empty() {
        let value = json!({
            "tenant_id": "t",
            "date_range": "7d",
            "total_transactions": 10,
            "total_amount_usd": 120.5,
            "success_rate_pct": 99.1,
            "avg_latency_ms": 180.0
        });
        let ToolPayload::TransactionSummary(summary) =
            ToolPayload::decode(ToolId::TransactionSummary, &value).expect("decode")
        else {
            panic!("expected transaction summary");
        };
        assert!(summary.daily_breakdown.is_empty());
        assert!(summary.top_merchants.is_empty());
    }
}
