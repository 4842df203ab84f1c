/// Log tags identify the subsystem a message comes from
///
/// Each tag maps to a `--debug-<key>` / `--verbose-<key>` flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Components,
    Clients,
    Pipeline,
    Socket,
    Store,
    Templates,
    Webserver,
    Demo,
    Other(String),
}

impl LogTag {
    /// Key used in --debug-<key> flags and enabled_tags filters
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::Other(name) => name.to_lowercase(),
            _ => self.to_plain_string().to_lowercase(),
        }
    }

    /// Uppercase label without colors (file output)
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Components => "COMPONENTS".to_string(),
            LogTag::Clients => "CLIENTS".to_string(),
            LogTag::Pipeline => "PIPELINE".to_string(),
            LogTag::Socket => "SOCKET".to_string(),
            LogTag::Store => "STORE".to_string(),
            LogTag::Templates => "TEMPLATES".to_string(),
            LogTag::Webserver => "WEBSERVER".to_string(),
            LogTag::Demo => "DEMO".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
