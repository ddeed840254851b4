//! [`EditorServer`] — the `rmcp` [`ServerHandler`] implementation.
//!
//! Stateless: every `tools/call` dispatches straight into [`crate::engine`]
//! through [`crate::tools`] and carries no session state between calls,
//! matching the typical MCP client assumption that the server itself is not
//! where conversation state lives.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData as McpError;
use schemars::schema_for;
use serde_json::Map as JsonMap;

use crate::{resource, tools};

#[derive(Debug, Clone, Default)]
pub struct EditorServer;

impl EditorServer {
    pub fn new() -> Self {
        Self
    }
}

fn tool_schema<T: schemars::JsonSchema>() -> Arc<JsonMap<String, serde_json::Value>> {
    let schema = serde_json::to_value(schema_for!(T)).unwrap_or_default();
    let object = match schema {
        serde_json::Value::Object(map) => map,
        _ => JsonMap::new(),
    };
    Arc::new(object)
}

fn tool_list() -> Vec<Tool> {
    vec![
        Tool::new(
            Cow::Borrowed("get_text_file_contents"),
            Cow::Borrowed(
                "Reads one or more line ranges from one or more files, returning each range's \
                 exact content plus a whole-file hash and a per-range hash for later \
                 conflict-checked writes.",
            ),
            tool_schema::<tools::GetTextFileContentsInput>(),
        ),
        Tool::new(
            Cow::Borrowed("create_text_file"),
            Cow::Borrowed("Creates a brand-new text file. Fails if the path already exists."),
            tool_schema::<tools::CreateTextFileInput>(),
        ),
        Tool::new(
            Cow::Borrowed("append_text_file_contents"),
            Cow::Borrowed(
                "Appends text to the end of a file, verifying the caller's file_hash first.",
            ),
            tool_schema::<tools::AppendTextFileContentsInput>(),
        ),
        Tool::new(
            Cow::Borrowed("insert_text_file_contents"),
            Cow::Borrowed(
                "Inserts text at a line position (`after` or `before`, exactly one), verifying \
                 the caller's file_hash first.",
            ),
            tool_schema::<tools::InsertTextFileContentsInput>(),
        ),
        Tool::new(
            Cow::Borrowed("delete_text_file_contents"),
            Cow::Borrowed(
                "Deletes one or more line ranges in a single commit, verifying file_hash and \
                 each range's range_hash first.",
            ),
            tool_schema::<tools::DeleteTextFileContentsInput>(),
        ),
        Tool::new(
            Cow::Borrowed("patch_text_file_contents"),
            Cow::Borrowed(
                "Applies a batch of line-range replacements/insertions in a single commit, \
                 rejecting the whole batch on any hash mismatch or overlap.",
            ),
            tool_schema::<tools::PatchTextFileContentsInput>(),
        ),
    ]
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<JsonMap<String, serde_json::Value>>,
) -> Result<T, McpError> {
    let value = serde_json::Value::Object(arguments.unwrap_or_default());
    serde_json::from_value(value)
        .map_err(|error| McpError::invalid_params(format!("invalid arguments: {error}"), None))
}

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    let is_error = value.get("result").and_then(|r| r.as_str()) == Some("error");
    let text = serde_json::to_string(&value)
        .map_err(|error| McpError::internal_error(format!("failed to serialize response: {error}"), None))?;

    Ok(CallToolResult {
        content: vec![Content::text(text)],
        is_error: Some(is_error),
        structured_content: Some(value),
        meta: None,
    })
}

impl rmcp::ServerHandler for EditorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..ServerInfo::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                tools: tool_list(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments;
        let value = match request.name.as_ref() {
            "get_text_file_contents" => {
                tools::get_text_file_contents(parse_arguments(arguments)?)
            }
            "create_text_file" => tools::create_text_file(parse_arguments(arguments)?),
            "append_text_file_contents" => {
                tools::append_text_file_contents(parse_arguments(arguments)?)
            }
            "insert_text_file_contents" => {
                tools::insert_text_file_contents(parse_arguments(arguments)?)
            }
            "delete_text_file_contents" => {
                tools::delete_text_file_contents(parse_arguments(arguments)?)
            }
            "patch_text_file_contents" => {
                tools::patch_text_file_contents(parse_arguments(arguments)?)
            }
            other => {
                return Err(McpError::invalid_params(
                    format!("unknown tool '{other}'"),
                    None,
                ))
            }
        };

        json_result(value)
    }

    async fn read_resource(
        &self,
        request: rmcp::model::ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<rmcp::model::ReadResourceResult, McpError> {
        let parsed = resource::parse(&request.uri)
            .ok_or_else(|| McpError::invalid_params(format!("malformed resource uri '{}'", request.uri), None))?;

        let path = std::path::Path::new(&parsed.path);
        let image = crate::line_store::load(path, crate::encoding::DEFAULT_ENCODING, None)
            .map_err(|error| McpError::invalid_params(error.to_string(), None))?;
        let read = crate::engine::read_range(&image, &parsed.path, parsed.line_start, parsed.line_end)
            .map_err(|error| McpError::invalid_params(error.to_string(), None))?;

        Ok(rmcp::model::ReadResourceResult {
            contents: vec![rmcp::model::ResourceContents::text(
                read.content,
                request.uri.clone(),
            )],
        })
    }
}
