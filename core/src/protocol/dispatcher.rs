use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::tools;
use super::types::{
    InitializeResult, RpcErrorObject, RpcRequest, RpcResponse, ServerMetadata, ToolCallResult,
    ToolContent, ToolsListResult,
};
use crate::config::ServerConfig;
use crate::error::RpcErrorCode;
use crate::history::HistoryWriter;
use crate::poller::{PollTask, Poller};

/// Maps requests to responses and owns the poller lifecycle.
///
/// The poller stays idle until the first `initialize`; later `initialize`
/// requests are answered without starting a second task.
pub struct Dispatcher {
    server: ServerConfig,
    history: Arc<HistoryWriter>,
    idle: Option<(Poller, Duration)>,
    task: Option<PollTask>,
}

impl Dispatcher {
    pub fn new(
        server: ServerConfig,
        history: Arc<HistoryWriter>,
        poller: Poller,
        interval: Duration,
    ) -> Self {
        Self {
            server,
            history,
            idle: Some((poller, interval)),
            task: None,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.task.is_some()
    }

    /// Returns the reply for `req`, or `None` for notifications and unknown methods.
    #[tracing::instrument(name = "dispatcher.handle", skip(self, req), fields(method = %req.method))]
    pub async fn handle(&mut self, req: RpcRequest) -> Option<RpcResponse> {
        let reply = match req.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "tools/list" => Ok(self.tools_list()),
            "tools/call" => self.tools_call(req.params.as_ref()).await,
            other => {
                tracing::debug!(method = other, "ignoring unsupported method");
                return None;
            }
        };

        let id = req.id?;
        Some(match reply {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::failure(id, error),
        })
    }

    fn initialize(&mut self) -> Value {
        tracing::info!("initializing history server");
        match self.idle.take() {
            Some((mut poller, interval)) => {
                poller.connect();
                self.task = Some(PollTask::spawn(poller, interval));
            }
            None => tracing::debug!("already initialized, poller left running"),
        }

        let result = InitializeResult {
            capabilities: self.server.capabilities.clone(),
            metadata: ServerMetadata {
                name: self.server.name.clone(),
                version: self.server.version.clone(),
                description: self.server.description.clone(),
            },
        };
        to_value(&result)
    }

    fn tools_list(&self) -> Value {
        to_value(&ToolsListResult {
            tools: tools::tool_descriptors(),
        })
    }

    async fn tools_call(&self, params: Option<&Value>) -> Result<Value, RpcErrorObject> {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if name != tools::GET_RECENT_HISTORY {
            return Err(RpcErrorObject::new(
                RpcErrorCode::InvalidParams,
                format!("unknown tool: {name}"),
            ));
        }

        let days = tools::lookback_days(params.and_then(|p| p.get("arguments")))
            .map_err(|msg| RpcErrorObject::new(RpcErrorCode::InvalidParams, msg))?;
        let logs = self.history.read_recent(days).await.map_err(|e| {
            tracing::error!("{e}");
            RpcErrorObject::new(RpcErrorCode::InternalError, e.to_string())
        })?;

        Ok(to_value(&ToolCallResult {
            content: vec![ToolContent::text(tools::render_recent(&logs, days))],
        }))
    }

    /// Stops the poll task, waiting for an in-flight tick.
    pub async fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.stop().await;
        }
        if let Some((mut poller, _)) = self.idle.take() {
            poller.close();
        }
    }
}

fn to_value<T: serde::Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}
