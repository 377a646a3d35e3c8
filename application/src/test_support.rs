//! Scripted backend shared by the application tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use steward_domain::{
    BackendError, RiskLevel, ToolBackend, ToolDescriptor, ToolMode, ToolName, ToolRequest,
    ToolResponse,
};

pub fn name(s: &str) -> ToolName {
    ToolName::new(s).unwrap()
}

/// Dry-run capable descriptor with a generic description
pub fn descriptor(tool: &str, risk: RiskLevel) -> ToolDescriptor {
    ToolDescriptor::new(name(tool), format!("Run {}", tool.replace('_', " ")), risk).with_dry_run()
}

pub struct ScriptedBackend {
    id: String,
    tools: Vec<ToolDescriptor>,
    responses: HashMap<(String, ToolMode), ToolResponse>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    transport_failure: bool,
    requests: Mutex<Vec<ToolRequest>>,
}

impl ScriptedBackend {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            tools: Vec::new(),
            responses: HashMap::new(),
            delays: HashMap::new(),
            default_delay: None,
            transport_failure: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tool(mut self, descriptor: ToolDescriptor) -> Self {
        self.tools.push(descriptor);
        self
    }

    pub fn with_response(mut self, tool: &str, mode: ToolMode, response: ToolResponse) -> Self {
        self.responses.insert((tool.to_string(), mode), response);
        self
    }

    /// Delay every invocation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Delay invocations of one tool
    pub fn with_tool_delay(mut self, tool: &str, delay: Duration) -> Self {
        self.delays.insert(tool.to_string(), delay);
        self
    }

    pub fn failing_transport(mut self) -> Self {
        self.transport_failure = true;
        self
    }

    pub fn requests(&self) -> Vec<ToolRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<(ToolName, ToolMode)> {
        self.requests()
            .into_iter()
            .map(|r| (r.tool_name, r.mode))
            .collect()
    }

    pub fn executed(&self) -> Vec<ToolName> {
        self.calls()
            .into_iter()
            .filter(|(_, mode)| *mode == ToolMode::Execute)
            .map(|(tool, _)| tool)
            .collect()
    }
}

#[async_trait]
impl ToolBackend for ScriptedBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn describe(&self) -> Result<Vec<ToolDescriptor>, BackendError> {
        Ok(self.tools.clone())
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<ToolResponse, BackendError> {
        self.requests.lock().unwrap().push(request.clone());

        let delay = self
            .delays
            .get(request.tool_name.as_str())
            .copied()
            .or(self.default_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.transport_failure {
            return Err(BackendError::Transport("connection reset".into()));
        }

        let key = (request.tool_name.to_string(), request.mode);
        Ok(self.responses.get(&key).cloned().unwrap_or_else(|| {
            if request.mode.is_dry_run() {
                ToolResponse::text(format!("Would run {}", request.tool_name))
            } else {
                ToolResponse::text(format!("Ran {}", request.tool_name))
            }
        }))
    }
}
