#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    TransactionSummary,
    SlaCompliance,
    PaymentChannelBreakdown,
}

impl ToolId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransactionSummary => "get_transaction_summary",
            Self::SlaCompliance => "get_sla_compliance",
            Self::PaymentChannelBreakdown => "get_payment_channel_breakdown",
        }
    }

    /// Unknown names have no renderer.
    pub fn from_name(name: &str) -> Option<Self> {
        TOOL_SPECS
            .iter()
            .find(|spec| spec.id.as_str() == name)
            .map(|spec| spec.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolInputSpec {
    Tenant,
    TenantAndRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub id: ToolId,
    pub title: &'static str,
    pub card_label: &'static str,
    pub description: &'static str,
    pub inputs: ToolInputSpec,
}

pub struct ToolRegistry;

const TOOL_SPECS: [ToolSpec; 3] = [
    ToolSpec {
        id: ToolId::TransactionSummary,
        title: "Transaction Summary",
        card_label: "Transactions",
        description: "Transaction volume, amount, success rate and latency for a tenant over a date range.",
        inputs: ToolInputSpec::TenantAndRange,
    },
    ToolSpec {
        id: ToolId::SlaCompliance,
        title: "SLA Compliance",
        card_label: "SLA",
        description: "Uptime, latency percentiles and error rate against the tenant's SLA targets.",
        inputs: ToolInputSpec::Tenant,
    },
    ToolSpec {
        id: ToolId::PaymentChannelBreakdown,
        title: "Payment Channel Breakdown",
        card_label: "Channels",
        description: "Volume share, average ticket and success rate per payment channel.",
        inputs: ToolInputSpec::Tenant,
    },
];

impl ToolRegistry {
    pub fn list() -> &'static [ToolSpec] {
        &TOOL_SPECS
    }

    pub fn get(id: ToolId) -> &'static ToolSpec {
        match id {
            ToolId::TransactionSummary => &TOOL_SPECS[0],
            ToolId::SlaCompliance => &TOOL_SPECS[1],
            ToolId::PaymentChannelBreakdown => &TOOL_SPECS[2],
        }
    }

    pub fn lookup(name: &str) -> Option<&'static ToolSpec> {
        ToolId::from_name(name).map(Self::get)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn registry_lookup_is_deterministic() {
        let first = ToolRegistry::get(ToolId::SlaCompliance);
        let second = ToolRegistry::get(ToolId::SlaCompliance);
        assert_eq!(first, second);
    }

    #[test]
    fn registry_order_is_stable() {
        let ids: Vec<&'static str> = ToolRegistry::list()
            .iter()
            .map(|spec| spec.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "get_transaction_summary",
                "get_sla_compliance",
                "get_payment_channel_breakdown"
            ]
        );
    }

    #[test]
    fn names_round_trip_through_lookup() {
        for spec in ToolRegistry::list() {
            assert_eq!(ToolId::from_name(spec.id.as_str()), Some(spec.id));
        }
        assert_eq!(ToolRegistry::lookup("get_weather"), None);
    }
}
