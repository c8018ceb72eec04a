//! LINE webhook relay core: envelope parsing, fire-and-forget dispatch, Gemini replies, and
//! LINE delivery. Used by the `line-relay` CLI.

pub mod channels;
pub mod composer;
pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod gateway;
pub mod llm;
pub mod pipeline;
pub mod responder;
