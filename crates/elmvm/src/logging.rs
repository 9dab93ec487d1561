use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append-only handle on `debug.log` under the storage root.
///
/// Reopened (recreating the storage root) whenever the file has gone away
/// or the previous write failed.
struct DebugLog {
    path: PathBuf,
    handle: Option<File>,
}

impl DebugLog {
    fn open(path: PathBuf) -> io::Result<Self> {
        let handle = Some(append_to(&path)?);
        Ok(Self { path, handle })
    }

    fn handle(&mut self) -> io::Result<&mut File> {
        if self.handle.is_none() || !self.path.is_file() {
            self.handle = Some(append_to(&self.path)?);
        }
        self.handle
            .as_mut()
            .ok_or_else(|| io::Error::other("debug log handle missing"))
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for DebugLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.handle()?.write(buf);
        if result.is_err() {
            self.handle = None;
        }
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.handle.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Shrink the log to at most half of `max_log_size` once it is larger than
/// `max_log_size`. The oldest records go first and the cut lands on a line
/// start. Returns whether the file was rewritten.
fn cap_log_size(log_path: &Path, max_log_size: u64) -> io::Result<bool> {
    let size = match std::fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if size <= max_log_size {
        return Ok(false);
    }

    let contents = std::fs::read(log_path)?;
    let budget = usize::try_from(max_log_size / 2).unwrap_or(usize::MAX);
    let cut = contents.len().saturating_sub(budget);
    let start = if cut == 0 {
        0
    } else {
        contents[cut - 1..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(contents.len(), |newline| cut + newline)
    };

    std::fs::write(log_path, &contents[start..])?;
    Ok(true)
}

/// Install the global logger.
///
/// Nothing is logged unless `debug_enabled` or `verbose` is set. The file
/// logger writes to `log_path`; `verbose` adds a terminal logger on stderr so
/// stdout stays free for command output.
pub fn init_logging(log_path: &Path, debug_enabled: bool, verbose: bool, max_log_size: u64) {
    if !debug_enabled && !verbose {
        set_logging_enabled(false);
        return;
    }

    let capped = cap_log_size(log_path, max_log_size);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("elmvm")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if verbose {
        loggers.push(TermLogger::new(
            LevelFilter::Debug,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    match DebugLog::open(log_path.to_path_buf()) {
        Ok(writer) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, writer)),
        Err(e) if verbose => eprintln!("debug log {} unavailable: {e}", log_path.display()),
        Err(_) => {}
    }

    let _ = CombinedLogger::init(loggers);
    set_logging_enabled(true);

    log::info!("Debug log: {}", log_path.display());
    match capped {
        Ok(true) => log::info!("Dropped older records, log exceeded {max_log_size} bytes"),
        Ok(false) => {}
        Err(e) => log::warn!("Could not shrink {}: {e}", log_path.display()),
    }
}

pub fn set_logging_enabled(enabled: bool) {
    let level = if enabled {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Off
    };
    log::set_max_level(level);
}
