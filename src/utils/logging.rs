use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

/// Writes every log line to stderr and to a log file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Format: `[YYYY-mm-dd HH:MM:SS] [LEVEL] message`. Unknown level names fall
/// back to INFO, and `RUST_LOG` overrides `level`. When `file` is set, lines
/// are appended to it as well as printed.
pub fn init_logger(level: &str, file: Option<&Path>) -> io::Result<()> {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(LevelFilter::from_str(level).unwrap_or(LevelFilter::Info))
        .parse_default_env();

    if let Some(path) = file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(TeeWriter { file })));
    }

    builder.init();
    Ok(())
}
