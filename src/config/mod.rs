/// Configuration system for Mist
///
/// - `macros`: `config_struct!` for single-source structs with defaults
/// - `schemas`: all configuration sections
/// - `utils`: loading, global access and persistence helpers
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{Config, StoreConfig, TemplatesConfig, WebserverConfig, WebsocketConfig};
pub use utils::{
    get_config_clone, load_config, load_config_from_path, save_config,
    with_config, CONFIG_FILE_PATH,
};
