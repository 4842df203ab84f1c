/// Centralized command-line argument handling for the Mist binary
///
/// Arguments are stored once in a process-wide list so every module (logger
/// included) reads the same values. Tests and embedding applications can
/// override the list with `set_cmd_args`.
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::env;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Replace the global argument list
pub fn set_cmd_args(args: Vec<String>) {
    *CMD_ARGS.lock() = args;
}

/// Copy of the current arguments (the lock is not held by callers)
pub fn get_cmd_args() -> Vec<String> {
    CMD_ARGS.lock().clone()
}

/// Checks if a specific argument is present
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Value following a flag, e.g. `--config path/to/mist.toml`
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|value| !value.starts_with("--"))
        .cloned()
}

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

/// Seed the store with demo components and keep mutating it
pub fn is_demo_enabled() -> bool {
    has_arg("--demo")
}

/// Config file override (--config <path>)
pub fn config_path_override() -> Option<String> {
    get_arg_value("--config")
}

/// Port override (--port <port>), takes precedence over the config file
pub fn port_override() -> Option<u16> {
    get_arg_value("--port").and_then(|p| p.parse().ok())
}

pub fn print_help() {
    println!("Mist - live HTML component updates over WebSockets");
    println!();
    println!("USAGE:");
    println!("    mist [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --config <path>           Configuration file (default: data/mist.toml)");
    println!("    --port <port>             Override the configured webserver port");
    println!("    --demo                    Register demo components and mutate them periodically");
    println!("    --help, -h                Show this help message");
    println!();
    println!("LOGGING FLAGS:");
    println!("    --quiet                   Only show warnings and errors");
    println!("    --verbose                 Show everything, including verbose traces");
    println!("    --log-level <level>       error | warning | info | debug | verbose");
    println!("    --log-file                Mirror log output into logs/mist.log");
    println!("    --debug-<tag>             Debug output for one subsystem:");
    println!("                              components, clients, pipeline, socket,");
    println!("                              store, templates, webserver, demo");
    println!("    --verbose-<tag>           Verbose output for one subsystem");
}
