//! LLM integration
//!
//! Provides the chat/embedding client trait and an HTTP implementation for
//! OpenAI-compatible and Azure OpenAI services.

mod client;
mod json;

pub use client::{
    APIMetrics, ChatMessage, CompletionOptions, ContentPart, HttpLLMClient, ImageDetail,
    ImageUrl, JsonSchemaFormat, LLMClient, MessageContent, MetricsSnapshot, ResponseFormat,
};
pub use json::extract_json_object;
