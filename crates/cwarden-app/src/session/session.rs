//! Console session state for one open instance view

use std::time::Instant;

use cwarden_core::buffer::AppendBuffer;
use cwarden_core::metrics::{EvictionPolicy, Sample, SampleWindow};
use cwarden_core::types::{InstanceSummary, MetricsPoint, Notice, TunnelEndpoint};

use super::ViewId;
use crate::history::CommandHistory;

/// Most inline notices one view keeps; older ones scroll off
const MAX_NOTICES: usize = 20;

/// Everything one console view shows.
///
/// Owned by the session registry and dropped wholesale when the view closes.
#[derive(Debug)]
pub struct ConsoleSession {
    pub view_id: ViewId,
    pub instance_id: String,
    pub instance_name: String,

    /// Last known running flag; gates the poll timers
    pub running: bool,
    pub tunnel_enabled: bool,

    /// Full console text, backlog first then live lines
    pub logs: AppendBuffer,
    /// True once the initial backlog call came back (even empty)
    pub backlog_loaded: bool,
    /// True while a log subscription is registered with the backend
    pub subscribed: bool,

    /// Recent resource samples, display-ready
    pub metrics: SampleWindow,

    /// Public tunnel endpoints, empty when the tunnel is off or down
    pub endpoints: Vec<TunnelEndpoint>,

    /// Console input line
    pub input: String,
    pub history: CommandHistory,

    /// Transient failures shown inline in the panel
    pub notices: Vec<Notice>,
}

impl ConsoleSession {
    pub fn new(view_id: ViewId, instance: &InstanceSummary, policy: EvictionPolicy) -> Self {
        Self {
            view_id,
            instance_id: instance.id.clone(),
            instance_name: instance.name.clone(),
            running: instance.running,
            tunnel_enabled: instance.tunnel_enabled,
            logs: AppendBuffer::new(),
            backlog_loaded: false,
            subscribed: false,
            metrics: SampleWindow::new(policy),
            endpoints: Vec::new(),
            input: String::new(),
            history: CommandHistory::new(),
            notices: Vec::new(),
        }
    }

    /// Store the backlog response. Lines already delivered live stay put;
    /// the backlog lands before anything that arrives after this call.
    pub fn apply_backlog(&mut self, lines: Vec<String>) {
        self.logs.extend(lines);
        self.backlog_loaded = true;
    }

    /// Append one live console line.
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.append(line);
    }

    /// Ingest one wire reading into the sample window.
    pub fn push_sample(&mut self, point: &MetricsPoint) {
        self.metrics.push(Sample::from_point(point, Instant::now()));
    }

    /// Record an inline notice, dropping the oldest past the cap.
    pub fn push_notice(&mut self, text: impl Into<String>) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.remove(0);
        }
        self.notices.push(Notice::now(text));
    }
}
