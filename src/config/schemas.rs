/// Configuration schemas, all defined once with defaults
use crate::config_struct;

// ============================================================================
// WEBSERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// HTTP/WebSocket listener configuration
    pub struct WebserverConfig {
        /// IP to bind: 127.0.0.1 = localhost only, 0.0.0.0 = all interfaces
        host: String = "127.0.0.1".to_string(),

        /// Port to bind
        port: u16 = 8080,

        /// WebSocket endpoint clients subscribe through
        ws_path: String = "/mist/ws".to_string(),

        /// Prefix of the collection render route (`<prefix>/{name}`)
        components_path: String = "/mist/components".to_string(),

        /// Hub statistics endpoint
        stats_path: String = "/mist/stats".to_string(),
    }
}

// ============================================================================
// WEBSOCKET CONFIGURATION
// ============================================================================

config_struct! {
    /// Per-connection behavior
    pub struct WebsocketConfig {
        /// Text sent right after the upgrade (empty = none)
        welcome_message: String = r#"{ "msg": "Server Welcome Message" }"#.to_string(),

        /// Outbound queue length per connection
        send_buffer: usize = 64,
    }
}

// ============================================================================
// STORE CONFIGURATION
// ============================================================================

config_struct! {
    /// SQLite document store
    pub struct StoreConfig {
        /// Database file, or ":memory:" for a process-local database
        database_path: String = "data/mist.db".to_string(),
    }
}

// ============================================================================
// TEMPLATES CONFIGURATION
// ============================================================================

config_struct! {
    /// Template assets
    pub struct TemplatesConfig {
        /// Directory holding `<template>.<extension>` files
        directory: String = "templates".to_string(),

        extension: String = "html".to_string(),
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration (data/mist.toml)
    pub struct Config {
        webserver: WebserverConfig = WebserverConfig::default(),
        websocket: WebsocketConfig = WebsocketConfig::default(),
        store: StoreConfig = StoreConfig::default(),
        templates: TemplatesConfig = TemplatesConfig::default(),
    }
}

impl Config {
    /// Parse a TOML document; missing sections and fields keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Bind address for the webserver
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.webserver.host, self.webserver.port)
    }
}
