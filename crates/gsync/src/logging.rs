use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use gsync_platform::AppPaths;
#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};

use crate::settings::AppSettings;

/// `--verbose` also records every tool invocation's raw output.
pub fn log_level(debug_logging: bool, verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Trace
    } else if debug_logging {
        LevelFilter::Debug
    } else {
        LevelFilter::Off
    }
}

/// Move `current` to `previous` once it outgrows `max_size`. One older
/// generation is kept.
fn rotate(current: &Path, previous: &Path, max_size: u64) -> io::Result<bool> {
    match std::fs::metadata(current) {
        Ok(metadata) if metadata.len() > max_size => {
            std::fs::rename(current, previous)?;
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(error) => Err(error),
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Route `log` records from the gsync crates into the app's `debug.log`,
/// plus stderr in debug builds.
pub fn init_logging(paths: &AppPaths, settings: &AppSettings, verbose: bool) {
    let level = log_level(settings.debug_logging, verbose);
    if level == LevelFilter::Off {
        return;
    }

    let log_path = paths.log_file();
    let previous = paths.previous_log_file();
    let rotated = rotate(&log_path, &previous, settings.max_log_size_bytes);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("gsync")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    match open_append(&log_path) {
        Ok(file) => loggers.push(WriteLogger::new(level, config.clone(), file)),
        Err(error) => eprintln!("gsync: cannot open {}: {error}", log_path.display()),
    }

    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto));

    if loggers.is_empty() || CombinedLogger::init(loggers).is_err() {
        return;
    }

    match rotated {
        Ok(true) => log::info!("Previous debug log moved to {}", previous.display()),
        Ok(false) => {}
        Err(error) => log::warn!("Could not rotate {}: {error}", log_path.display()),
    }
    log::debug!("Logging at {level} to {}", log_path.display());
}

#[cfg(test)]
mod tests {
    use gsync_platform::AppPaths;
    use simplelog::LevelFilter;

    use super::{log_level, rotate};

    #[test]
    fn verbose_enables_trace() {
        assert_eq!(log_level(false, true), LevelFilter::Trace);
        assert_eq!(log_level(true, true), LevelFilter::Trace);
        assert_eq!(log_level(true, false), LevelFilter::Debug);
        assert_eq!(log_level(false, false), LevelFilter::Off);
    }

    #[test]
    fn oversized_log_moves_to_previous_generation() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::rooted_at(temp.path());
        paths.ensure_dirs().expect("dirs should be created");
        std::fs::write(paths.previous_log_file(), "oldest\n").expect("log should be written");
        std::fs::write(paths.log_file(), "check-1\ncheck-2\n").expect("log should be written");

        let rotated = rotate(&paths.log_file(), &paths.previous_log_file(), 8)
            .expect("rotation should succeed");

        assert!(rotated);
        assert!(!paths.log_file().exists());
        assert_eq!(
            std::fs::read_to_string(paths.previous_log_file()).expect("log should be readable"),
            "check-1\ncheck-2\n"
        );
    }

    #[test]
    fn small_or_missing_log_stays_put() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let paths = AppPaths::rooted_at(temp.path());
        paths.ensure_dirs().expect("dirs should be created");

        let missing = rotate(&paths.log_file(), &paths.previous_log_file(), 8);
        assert!(matches!(missing, Ok(false)));

        std::fs::write(paths.log_file(), "one\n").expect("log should be written");
        let small = rotate(&paths.log_file(), &paths.previous_log_file(), 1024);

        assert!(matches!(small, Ok(false)));
        assert!(!paths.previous_log_file().exists());
    }
}
