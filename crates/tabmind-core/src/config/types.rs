//! Configuration type definitions
//!
//! Every section has defaults, so an empty YAML document (or no file at all)
//! produces a runnable configuration that talks to the hosted relay backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TabmindConfig {
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Markdown file, relative to the config file, that replaces `system_prompt`.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_true")]
    pub tools_enabled: bool,
    /// Number of earlier messages quoted in the instruction payload.
    #[serde(default = "default_history_excerpt_messages")]
    pub history_excerpt_messages: usize,
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            system_prompt_file: None,
            greeting: default_greeting(),
            max_iterations: default_max_iterations(),
            tools_enabled: true,
            history_excerpt_messages: default_history_excerpt_messages(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_context_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: f32,
    /// Compression only fires on conversations longer than this.
    #[serde(default = "default_min_messages")]
    pub min_messages: usize,
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
    #[serde(default = "default_summary_excerpt_chars")]
    pub summary_excerpt_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_context_max_tokens(),
            compression_threshold: default_compression_threshold(),
            min_messages: default_min_messages(),
            keep_recent: default_keep_recent(),
            summary_excerpt_chars: default_summary_excerpt_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `false` talks to the hosted relay, `true` to the OpenAI-compatible endpoint.
    #[serde(default)]
    pub use_custom_endpoint: bool,
    #[serde(default)]
    pub relay: RelayEndpointConfig,
    #[serde(default)]
    pub custom: CustomEndpointConfig,
    #[serde(default)]
    pub parameters: ModelParameters,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            use_custom_endpoint: false,
            relay: RelayEndpointConfig::default(),
            custom: CustomEndpointConfig::default(),
            parameters: ModelParameters::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEndpointConfig {
    #[serde(default = "default_relay_chat_url")]
    pub url: String,
}

impl Default for RelayEndpointConfig {
    fn default() -> Self {
        Self {
            url: default_relay_chat_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomEndpointConfig {
    #[serde(default = "default_custom_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub auth: LlmAuth,
}

impl Default for CustomEndpointConfig {
    fn default() -> Self {
        Self {
            api_base: default_custom_api_base(),
            auth: LlmAuth::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmAuth {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelParameters {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Privileged relay used for search and page fetches. Without it,
    /// searches go straight to the meta-search endpoints and fetches degrade
    /// to a placeholder.
    #[serde(default)]
    pub relay: Option<NetworkRelayConfig>,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default = "default_result_max_chars")]
    pub result_max_chars: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            relay: None,
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            result_max_chars: default_result_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRelayConfig {
    pub base_url: String,
    #[serde(default = "default_relay_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_endpoints")]
    pub endpoints: Vec<SearchEndpointConfig>,
    #[serde(default = "default_endpoint_timeout_secs")]
    pub endpoint_timeout_secs: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    /// Manual search page offered when every backend came up empty.
    #[serde(default = "default_fallback_search_url")]
    pub fallback_search_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoints: default_search_endpoints(),
            endpoint_timeout_secs: default_endpoint_timeout_secs(),
            max_results: default_max_results(),
            snippet_chars: default_snippet_chars(),
            fallback_search_url: default_fallback_search_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchEndpointConfig {
    pub name: String,
    /// URL with a `{query}` placeholder; must answer with SearXNG-style JSON.
    pub url_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_content_chars: default_max_content_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_system_prompt() -> String {
    "You are the assistant of a browser new-tab page. Answer concisely and in the user's language. \
     Use tools only when fresh or external information is needed."
        .to_string()
}

fn default_greeting() -> String {
    "Hi! Ask me anything, I can search the web and read pages for you.".to_string()
}

fn default_max_iterations() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_history_excerpt_messages() -> usize {
    6
}

fn default_excerpt_chars() -> usize {
    300
}

fn default_context_max_tokens() -> usize {
    32_000
}

fn default_compression_threshold() -> f32 {
    0.7
}

fn default_min_messages() -> usize {
    6
}

fn default_keep_recent() -> usize {
    4
}

fn default_summary_excerpt_chars() -> usize {
    100
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_relay_chat_url() -> String {
    "http://127.0.0.1:8787/chat".to_string()
}

fn default_custom_api_base() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_result_max_chars() -> usize {
    6000
}

fn default_relay_timeout_secs() -> u64 {
    20
}

fn default_search_endpoints() -> Vec<SearchEndpointConfig> {
    vec![
        SearchEndpointConfig {
            name: "searx.be".to_string(),
            url_template: "https://searx.be/search?q={query}&format=json".to_string(),
        },
        SearchEndpointConfig {
            name: "search.inetol.net".to_string(),
            url_template: "https://search.inetol.net/search?q={query}&format=json".to_string(),
        },
    ]
}

fn default_endpoint_timeout_secs() -> u64 {
    5
}

fn default_max_results() -> usize {
    5
}

fn default_snippet_chars() -> usize {
    200
}

fn default_fallback_search_url() -> String {
    "https://www.bing.com/search?q={query}".to_string()
}

fn default_max_content_chars() -> usize {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}
