use std::collections::VecDeque;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::config::Config;
use crate::store::ResultStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UiTheme {
    Classic,
    Cyberpunk,
    NeonNoir,
    SolarFlare,
    ForestZen,
}

impl UiTheme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Cyberpunk => "cyberpunk",
            Self::NeonNoir => "neon-noir",
            Self::SolarFlare => "solar-flare",
            Self::ForestZen => "forest-zen",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Classic => Self::Cyberpunk,
            Self::Cyberpunk => Self::NeonNoir,
            Self::NeonNoir => Self::SolarFlare,
            Self::SolarFlare => Self::ForestZen,
            Self::ForestZen => Self::Classic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashFocus {
    Chat,
    Cards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashOverlay {
    None,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct DashHeader {
    pub tenant_id: Arc<str>,
    pub session_id: u64,
}

#[derive(Debug, Clone)]
pub struct DashInteraction {
    pub overlay: DashOverlay,
    pub focus: DashFocus,
    pub chat_input: String,
    pub live_assistant_preview: String,
    pub agent_busy: bool,
    pub raw_payload: bool,
}

#[derive(Debug, Clone)]
pub struct DashCustomization {
    pub theme: UiTheme,
    pub show_activity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    App,
    Agent,
    Store,
}

impl LogSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Agent => "agent",
            Self::Store => "store",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub ts_ms: Option<i64>,
    pub source: LogSource,
    pub context: Option<String>,
    pub message: String,
    pub session_id: u64,
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn append(&mut self, mut entry: LogEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.buf.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub accepted_events: u64,
    pub rejected_events: u64,
    pub flushes: u64,
}

/// Everything the dashboard renders. The result store is owned here and only
/// mutated through the reducer.
#[derive(Debug)]
pub struct DashState {
    pub header: DashHeader,
    pub interaction: DashInteraction,
    pub customization: DashCustomization,
    pub chat: Vec<ChatMessage>,
    pub results: ResultStore,
    pub logs: LogBuffer,
    pub stats: StreamStats,
}

impl DashState {
    pub fn new(tenant_id: String) -> Self {
        Self {
            header: DashHeader {
                tenant_id: tenant_id.into(),
                session_id: 1,
            },
            interaction: DashInteraction {
                overlay: DashOverlay::None,
                focus: DashFocus::Chat,
                chat_input: String::new(),
                live_assistant_preview: String::new(),
                agent_busy: false,
                raw_payload: false,
            },
            customization: DashCustomization {
                theme: UiTheme::Classic,
                show_activity: true,
            },
            chat: Vec::new(),
            results: ResultStore::new(),
            logs: LogBuffer::new(500),
            stats: StreamStats::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::new(config.agent.tenant_id.clone());
        state.customization.theme = config.ui.theme;
        state.customization.show_activity = config.ui.show_activity;
        state
    }
}
