//! Tool result decoding.
//!
//! MCP tool calls return a list of typed content items. The model only
//! consumes text, so [`decode_tool_result`] flattens the list into a single
//! string: text items verbatim, image items as their (already base64) data
//! payload, embedded resources as their text or decoded blob. Fragments are
//! concatenated in order with no separator. Anything the decoder cannot
//! turn into text is an error rather than a silent drop.

use base64::Engine;

use crate::mcp::types::{CallToolResult, Content};

/// Errors raised while decoding a tool result.
#[derive(Debug, thiserror::Error)]
pub enum ToolExecutionError {
    /// The server flagged the result as an error.
    #[error("tool reported an error: {message}")]
    Failed { message: String },

    /// The result carried no content at all.
    #[error("tool returned no content")]
    NoContent,

    /// A content item had a kind the decoder does not understand.
    #[error("unexpected content kind '{kind}'")]
    UnexpectedContent { kind: String },

    /// An embedded resource carried neither text nor blob.
    #[error("resource '{uri}' ({mime_type}) has no text or blob payload")]
    UnexpectedResource { uri: String, mime_type: String },
}

/// Flatten a tool result into a single text payload.
pub fn decode_tool_result(result: &CallToolResult) -> Result<String, ToolExecutionError> {
    if result.is_error() {
        return Err(ToolExecutionError::Failed {
            message: render_error_content(result),
        });
    }
    if result.content.is_empty() {
        return Err(ToolExecutionError::NoContent);
    }

    let mut decoded = String::new();
    for item in &result.content {
        match item {
            Content::Text(text) => decoded.push_str(&text.text),
            Content::Image(image) => decoded.push_str(&image.data),
            Content::Resource(embedded) => {
                let resource = &embedded.resource;
                if let Some(text) = &resource.text {
                    decoded.push_str(text);
                } else if let Some(blob) = &resource.blob {
                    decoded.push_str(&decode_blob(blob));
                } else {
                    return Err(ToolExecutionError::UnexpectedResource {
                        uri: resource.uri.clone(),
                        mime_type: resource
                            .mime_type
                            .clone()
                            .unwrap_or_else(|| "unknown".to_string()),
                    });
                }
            }
            Content::Other(value) => {
                let kind = value
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                return Err(ToolExecutionError::UnexpectedContent { kind });
            }
        }
    }

    Ok(decoded)
}

/// Base64-decode a resource blob into UTF-8 text, falling back to the raw
/// blob string when the payload is not valid base64 or not valid UTF-8.
fn decode_blob(blob: &str) -> String {
    match base64::engine::general_purpose::STANDARD.decode(blob) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| blob.to_string()),
        Err(_) => blob.to_string(),
    }
}

fn render_error_content(result: &CallToolResult) -> String {
    let texts: Vec<&str> = result
        .content
        .iter()
        .filter_map(|item| match item {
            Content::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect();
    if texts.is_empty() {
        serde_json::to_string(&result.content).unwrap_or_else(|_| "unknown error".to_string())
    } else {
        texts.join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::types::{EmbeddedResource, ImageContent, ResourceContent, TextContent};
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Content {
        Content::Text(TextContent {
            text: s.to_string(),
        })
    }

    fn resource(text: Option<&str>, blob: Option<&str>) -> Content {
        Content::Resource(EmbeddedResource {
            resource: ResourceContent {
                uri: "file:///data.bin".to_string(),
                mime_type: Some("application/octet-stream".to_string()),
                text: text.map(String::from),
                blob: blob.map(String::from),
            },
        })
    }

    fn ok_result(content: Vec<Content>) -> CallToolResult {
        CallToolResult {
            content,
            is_error: None,
            structured_content: None,
        }
    }

    #[test]
    fn concatenates_text_in_order_without_separator() {
        let result = ok_result(vec![text("ab"), text("cd")]);
        assert_eq!(decode_tool_result(&result).unwrap(), "abcd");
    }

    #[test]
    fn image_data_passes_through_unchanged() {
        let result = ok_result(vec![Content::Image(ImageContent {
            data: "aGVsbG8=".to_string(),
            mime_type: "image/png".to_string(),
        })]);
        assert_eq!(decode_tool_result(&result).unwrap(), "aGVsbG8=");
    }

    #[test]
    fn resource_text_wins_over_blob() {
        let result = ok_result(vec![resource(Some("readable"), Some("aWdub3JlZA=="))]);
        assert_eq!(decode_tool_result(&result).unwrap(), "readable");
    }

    #[test]
    fn resource_blob_is_base64_decoded() {
        // "hello" in standard base64
        let result = ok_result(vec![resource(None, Some("aGVsbG8="))]);
        assert_eq!(decode_tool_result(&result).unwrap(), "hello");
    }

    #[test]
    fn invalid_blob_falls_back_to_raw_string() {
        let result = ok_result(vec![resource(None, Some("not base64!!"))]);
        assert_eq!(decode_tool_result(&result).unwrap(), "not base64!!");
    }

    #[test]
    fn resource_without_payload_is_an_error() {
        let result = ok_result(vec![resource(None, None)]);
        let err = decode_tool_result(&result).unwrap_err();
        assert_eq!(
            err.to_string(),
            "resource 'file:///data.bin' (application/octet-stream) has no text or blob payload"
        );
    }

    #[test]
    fn error_flag_overrides_content() {
        let result = CallToolResult {
            content: vec![text("disk full")],
            is_error: Some(true),
            structured_content: None,
        };
        let err = decode_tool_result(&result).unwrap_err();
        assert!(matches!(err, ToolExecutionError::Failed { message } if message == "disk full"));
    }

    #[test]
    fn empty_content_is_an_error() {
        let result = ok_result(vec![]);
        assert!(matches!(
            decode_tool_result(&result).unwrap_err(),
            ToolExecutionError::NoContent
        ));
    }

    #[test]
    fn unknown_content_kind_is_an_error_naming_the_kind() {
        let result = ok_result(vec![
            text("before "),
            Content::Other(serde_json::json!({"type": "audio", "data": "..."})),
        ]);
        let err = decode_tool_result(&result).unwrap_err();
        assert!(matches!(err, ToolExecutionError::UnexpectedContent { kind } if kind == "audio"));
    }

    #[test]
    fn mixed_fragments_keep_list_order() {
        let result = ok_result(vec![
            text("a"),
            resource(None, Some("Yg==")), // "b"
            text("c"),
        ]);
        assert_eq!(decode_tool_result(&result).unwrap(), "abc");
    }
}
