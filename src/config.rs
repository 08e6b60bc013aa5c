use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

use crate::external::LLMConfig;
use crate::parser::{ChunkError, TextChunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LLMConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = LLMConfig::default();

        // Load LLM config
        let llm = LLMConfig {
            endpoint: var_or("LLM_ENDPOINT", &defaults.endpoint),
            api_key: env::var("LLM_API_KEY").ok().filter(|key| !key.is_empty()),
            model: var_or("LLM_MODEL", &defaults.model),
            temperature: var_or("LLM_TEMPERATURE", "0.7")
                .parse()
                .unwrap_or(defaults.temperature),
            top_p: var_or("LLM_TOP_P", "0.9").parse().unwrap_or(defaults.top_p),
            max_tokens: var_or("LLM_MAX_TOKENS", "2000")
                .parse()
                .unwrap_or(defaults.max_tokens),
            timeout_secs: var_or("LLM_TIMEOUT_SECS", "60")
                .parse()
                .unwrap_or(defaults.timeout_secs),
        };
        llm.get_url()?;

        // Load processing config
        let processing = ProcessingConfig {
            chunk_size: var_or("CHUNK_SIZE", "1000")
                .parse()
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: var_or("CHUNK_OVERLAP", "200")
                .parse()
                .unwrap_or(DEFAULT_CHUNK_OVERLAP),
            log_level: var_or("LOG_LEVEL", "info"),
        };

        // Load output config
        let output = OutputConfig {
            output_dir: var_or("OUTPUT_DIR", "./output"),
        };

        Ok(Self {
            llm,
            processing,
            output,
        })
    }

    /// Chunker for uploaded documents
    pub fn chunker(&self) -> Result<TextChunker, ChunkError> {
        TextChunker::new(self.processing.chunk_size, self.processing.chunk_overlap)
    }
}
