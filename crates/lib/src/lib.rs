//! Parley core library: a multilingual chat pipeline (language detection, sentiment,
//! translation, response generation) behind one HTTP endpoint.

pub mod config;
pub mod context;
pub mod gateway;
pub mod init;
pub mod language;
pub mod llm;
pub mod pipeline;
pub mod providers;
pub mod translate;
