/// File persistence for log lines (logs/mist.log)
use super::config::get_logger_config;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const LOG_DIR: &str = "logs";
const LOG_FILE_NAME: &str = "mist.log";

static LOG_WRITER: Lazy<Mutex<Option<BufWriter<File>>>> = Lazy::new(|| Mutex::new(None));

/// Open the log file when file logging is enabled
pub fn init_file_logging() {
    if !get_logger_config().file_logging {
        return;
    }

    let dir = PathBuf::from(LOG_DIR);
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("Failed to create log directory {}: {}", dir.display(), e);
        return;
    }

    match OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
    {
        Ok(file) => *LOG_WRITER.lock() = Some(BufWriter::new(file)),
        Err(e) => eprintln!("Failed to open log file: {}", e),
    }
}

/// Append a plain (uncolored) line; no-op when file logging is off
pub fn write_to_file(line: &str) {
    if let Some(writer) = LOG_WRITER.lock().as_mut() {
        let _ = writeln!(writer, "{}", line);
    }
}

pub fn flush_file_logging() {
    if let Some(writer) = LOG_WRITER.lock().as_mut() {
        let _ = writer.flush();
    }
}
