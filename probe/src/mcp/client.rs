//! MCP client over streamable HTTP (rmcp)
//!
//! Every `RmcpClient` builds its own HTTP transport, so a failed attempt's
//! half-open connection state dies with it.

use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParam, RawContent},
    service::RunningService,
    transport::{
        streamable_http_client::StreamableHttpClientTransportConfig,
        StreamableHttpClientTransport,
    },
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};

use super::transport::{
    ClientFactory, ConnectError, McpSession, SessionError, TransientKind, TransportClient,
};
use super::types::{ContentItem, ToolDescriptor, ToolOutput};
use crate::config::ServerEndpoint;

/// Production factory: one rmcp client per connect attempt
#[derive(Debug, Default, Clone, Copy)]
pub struct RmcpClientFactory;

impl ClientFactory for RmcpClientFactory {
    fn create(&self) -> Box<dyn TransportClient> {
        Box::new(RmcpClient)
    }
}

/// Unconnected client
pub struct RmcpClient;

#[async_trait]
impl TransportClient for RmcpClient {
    async fn connect(
        self: Box<Self>,
        endpoint: &ServerEndpoint,
    ) -> Result<Box<dyn McpSession>, ConnectError> {
        tracing::debug!("Connecting to MCP server: {}", endpoint.server_url);

        let config = StreamableHttpClientTransportConfig::with_uri(endpoint.server_url.as_str())
            .auth_header(endpoint.auth_token.clone());
        let transport = StreamableHttpClientTransport::from_config(config);

        let service = ()
            .serve(transport)
            .await
            .map_err(|e| classify_connect_error(&e))?;

        tracing::debug!(url = %endpoint.server_url, "MCP session initialized");

        Ok(Box::new(RmcpSession { service }))
    }
}

/// Live rmcp session
pub struct RmcpSession {
    service: RunningService<RoleClient, ()>,
}

#[async_trait]
impl McpSession for RmcpSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SessionError> {
        let tools = self
            .service
            .list_all_tools()
            .await
            .map_err(|e| SessionError::Request(error_chain(&e)))?;

        Ok(tools
            .into_iter()
            .map(|t| {
                ToolDescriptor::new(
                    t.name.to_string(),
                    t.description.map(|d| d.to_string()),
                    Some(Value::Object(t.input_schema.as_ref().clone())),
                )
                .with_output_schema(t.output_schema.map(|s| Value::Object(s.as_ref().clone())))
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutput, SessionError> {
        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|e| SessionError::Request(error_chain(&e)))?;

        let content = result
            .content
            .into_iter()
            .map(|c| match c.raw {
                RawContent::Text(text) => ContentItem::Text(text.text),
                other => ContentItem::Other(serde_json::to_value(&other).unwrap_or(Value::Null)),
            })
            .collect();

        Ok(ToolOutput {
            content,
            structured: result.structured_content,
            is_error: result.is_error.unwrap_or(false),
        })
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.service.cancel().await {
            tracing::debug!("Session shutdown task failed: {}", e);
        }
    }
}

/// Classify from the typed reqwest error when the chain carries one, else from the text
fn classify_connect_error(err: &(dyn std::error::Error + 'static)) -> ConnectError {
    let message = error_chain(err);

    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(http) = current.downcast_ref::<reqwest::Error>() {
            if let Some(classified) = http
                .status()
                .and_then(|status| ConnectError::from_status(status.as_u16(), &message))
            {
                return classified;
            }
            let kind = if http.is_timeout() {
                Some(TransientKind::Timeout)
            } else if http.is_connect() {
                Some(TransientKind::ConnectionRefused)
            } else if http.is_request() {
                Some(TransientKind::SendFailed)
            } else {
                None
            };
            if let Some(kind) = kind {
                return ConnectError::Transient { kind, message };
            }
        }
        source = current.source();
    }

    ConnectError::classify(&message)
}

/// Render an error with its sources, `outer: inner: root`
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        rendered.push_str(": ");
        rendered.push_str(&inner.to_string());
        source = inner.source();
    }
    rendered
}
