//! Simulated FinOps agent.
//!
//! Turns a prompt into tool calls, streams the lifecycle of each call as
//! [`ToolEvent`]s and finishes with a short text answer. Events are reported
//! through a callback so the caller decides how they reach the store (a
//! channel in the TUI, a direct reducer call in headless mode).

use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use chrono::Local;
use finboard_core::payloads::ToolPayload;
use finboard_core::tool_registry::ToolId;
use finboard_core::tool_registry::ToolInputSpec;
use finboard_core::tool_registry::ToolRegistry;
use finboard_core::RuntimeAction;
use regex::Regex;
use tracing::debug;
use tracing::info;

use crate::contracts::ToolEvent;
use crate::contracts::ToolInvocation;
use crate::contracts::ToolInvocationStatus;
use crate::executor::SimulatedToolExecutor;
use crate::executor::ToolExecutionContext;
use crate::executor::ToolExecutor;
use crate::executor::DEFAULT_DATE_RANGE;
use crate::executor::MAX_RANGE_DAYS;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    Token(String),
    Tool(ToolEvent),
    Meta(String),
    Done,
}

impl AgentEvent {
    pub fn into_action(self) -> RuntimeAction {
        match self {
            Self::Token(token) => RuntimeAction::AssistantToken(token),
            Self::Tool(event) => event.into_action(),
            Self::Meta(message) => RuntimeAction::AssistantMeta(message),
            Self::Done => RuntimeAction::AssistantFinished,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCall {
    pub tool: ToolId,
    pub date_range: Option<String>,
}

struct Intents {
    everything: Regex,
    transactions: Regex,
    sla: Regex,
    channels: Regex,
    range_days: Regex,
    month: Regex,
}

fn intents() -> &'static Intents {
    static INTENTS: OnceLock<Intents> = OnceLock::new();
    INTENTS.get_or_init(|| Intents {
        everything: Regex::new(r"(?i)\b(full|everything|overview|all metrics|finops summary)\b")
            .expect("valid regex"),
        transactions: Regex::new(r"(?i)\b(transactions?|volumes?|summary|merchants?)\b")
            .expect("valid regex"),
        sla: Regex::new(r"(?i)\b(sla|compliance|compliant|uptime|latency|incidents?)\b")
            .expect("valid regex"),
        channels: Regex::new(r"(?i)\b(channels?|payment methods?|breakdown|wallets?|cards?)\b")
            .expect("valid regex"),
        range_days: Regex::new(r"(?i)\b(?:last|past)\s+(\d{1,3})\s+days?\b")
            .expect("valid regex"),
        month: Regex::new(r"(?i)\b(this|last|past)\s+month\b").expect("valid regex"),
    })
}

/// Tools a prompt asks for, in registry order. An empty plan means the agent
/// answers with text only.
pub fn plan_tools(prompt: &str) -> Vec<PlannedCall> {
    let intents = intents();
    let everything = intents.everything.is_match(prompt);
    let date_range = requested_range(prompt);

    ToolRegistry::list()
        .iter()
        .filter(|spec| {
            everything
                || match spec.id {
                    ToolId::TransactionSummary => intents.transactions.is_match(prompt),
                    ToolId::SlaCompliance => intents.sla.is_match(prompt),
                    ToolId::PaymentChannelBreakdown => intents.channels.is_match(prompt),
                }
        })
        .map(|spec| PlannedCall {
            tool: spec.id,
            date_range: match spec.inputs {
                ToolInputSpec::TenantAndRange => Some(date_range.clone()),
                ToolInputSpec::Tenant => None,
            },
        })
        .collect()
}

fn requested_range(prompt: &str) -> String {
    let intents = intents();
    if let Some(days) = intents
        .range_days
        .captures(prompt)
        .and_then(|caps| caps.get(1))
        .and_then(|days| days.as_str().parse::<u32>().ok())
        .filter(|days| *days > 0)
    {
        return format!("{}d", days.min(MAX_RANGE_DAYS));
    }
    if intents.month.is_match(prompt) {
        return "30d".to_string();
    }
    DEFAULT_DATE_RANGE.to_string()
}

#[derive(Debug, Clone)]
pub struct AgentSession {
    executor: SimulatedToolExecutor,
    phase_delay: Duration,
    next_invocation: u64,
}

impl AgentSession {
    pub fn new(executor: SimulatedToolExecutor, phase_delay: Duration) -> Self {
        Self {
            executor,
            phase_delay,
            next_invocation: 1,
        }
    }

    /// Runs one prompt to completion on the calling thread.
    pub fn run_turn<F>(&mut self, prompt: &str, tenant_id: &str, callback: &F)
    where
        F: Fn(AgentEvent),
    {
        let plan = plan_tools(prompt);
        info!(tools = plan.len(), tenant = tenant_id, "agent turn started");

        if plan.is_empty() {
            emit_chunked_text(GREETING, callback);
            callback(AgentEvent::Done);
            return;
        }

        let names: Vec<&str> = plan
            .iter()
            .map(|call| ToolRegistry::get(call.tool).title)
            .collect();
        callback(AgentEvent::Token(format!(
            "Pulling {} for {tenant_id}.\n",
            names.join(", ")
        )));

        let context = ToolExecutionContext {
            today: Local::now().date_naive(),
        };
        let mut findings = Vec::with_capacity(plan.len());
        for call in plan {
            let name = call.tool.as_str();
            callback(AgentEvent::Tool(ToolEvent::new(name, "pending", None)));
            self.pause();
            callback(AgentEvent::Tool(ToolEvent::new(name, "running", None)));
            self.pause();

            let invocation = ToolInvocation {
                invocation_id: self.next_invocation,
                tool_id: name.to_string(),
                tenant_id: tenant_id.to_string(),
                date_range: call.date_range,
            };
            self.next_invocation += 1;
            let result = self.executor.execute(invocation, &context);
            debug!(tool = name, status = ?result.status, "tool call finished");

            if result.status == ToolInvocationStatus::Failed {
                for line in &result.logs {
                    callback(AgentEvent::Meta(format!("{name}: {line}")));
                }
            }
            if let Some(finding) = result
                .payload
                .as_ref()
                .and_then(|value| ToolPayload::decode(call.tool, value).ok())
                .map(|payload| describe_finding(&payload))
            {
                findings.push(finding);
            }
            callback(AgentEvent::Tool(ToolEvent::new(name, "complete", result.payload)));
        }

        if findings.is_empty() {
            callback(AgentEvent::Token("No data came back for this request.".to_string()));
        } else {
            emit_chunked_text(&findings.join("\n"), callback);
        }
        callback(AgentEvent::Done);
    }

    /// Same as [`run_turn`](Self::run_turn) on a worker thread. Invocation ids
    /// for the turn are reserved up front so later turns never reuse them.
    pub fn spawn_turn<F>(
        &mut self,
        prompt: String,
        tenant_id: String,
        callback: F,
    ) -> thread::JoinHandle<()>
    where
        F: Fn(AgentEvent) + Send + 'static,
    {
        let mut worker = self.clone();
        self.next_invocation += plan_tools(&prompt).len() as u64;
        thread::spawn(move || worker.run_turn(&prompt, &tenant_id, &callback))
    }

    fn pause(&self) {
        if !self.phase_delay.is_zero() {
            thread::sleep(self.phase_delay);
        }
    }
}

const GREETING: &str = "I'm your FinOps assistant. I can pull transaction summaries \
(volume, success rate, trends), SLA compliance (uptime, latency percentiles, incidents) \
and payment channel breakdowns for your tenant. What would you like to look at?";

fn describe_finding(payload: &ToolPayload) -> String {
    match payload {
        ToolPayload::TransactionSummary(summary) => format!(
            "Transactions ({}): {} processed for ${:.1}M, {:.2}% success, {:.0} ms average latency.",
            summary.date_range,
            summary.total_transactions,
            summary.total_amount_usd / 1_000_000.0,
            summary.success_rate_pct,
            summary.avg_latency_ms
        ),
        ToolPayload::SlaCompliance(sla) => format!(
            "SLA: uptime {:.3}% ({}), p95 {:.0} ms ({}), error rate {:.3}% ({}), {} incident(s) this month.",
            sla.uptime_pct,
            sla.compliance_status.uptime.label(),
            sla.p95_latency_ms,
            sla.compliance_status.latency.label(),
            sla.error_rate_pct,
            sla.compliance_status.error_rate.label(),
            sla.incidents_this_month
        ),
        ToolPayload::ChannelBreakdown(breakdown) => {
            let leader = breakdown.channels.iter().max_by(|a, b| {
                a.volume_pct
                    .partial_cmp(&b.volume_pct)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            match leader {
                Some(leader) => format!(
                    "Channels: {} leads with {:.1}% of volume across {} active channels; fastest is {}, highest value is {}.",
                    leader.channel,
                    leader.volume_pct,
                    breakdown.total_channels_active,
                    breakdown.fastest_channel,
                    breakdown.highest_value_channel
                ),
                None => "Channels: no active channels.".to_string(),
            }
        }
    }
}

fn emit_chunked_text<F>(text: &str, callback: &F)
where
    F: Fn(AgentEvent),
{
    const CHUNK: usize = 24;
    let chars: Vec<char> = text.chars().collect();
    for piece in chars.chunks(CHUNK) {
        callback(AgentEvent::Token(piece.iter().collect()));
    }
}
