//! A pluggable log sink for components built on top of this crate.
//!
//! Messages carry a [`LogType`] and a [`LogLevel`]. A [`LogFilter`] decides which of
//! them a sink keeps. [`TracingSink`] is the provided implementation and forwards to
//! [`tracing`] events.

use core::fmt::Write as _;

use bitflags::bitflags;

use crate::sync::Mutex;

bitflags! {
    /// Kinds of log messages. Bits not named here are free for user defined types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LogType: u32 {
        const INFO = 0x0000_0001;
        const WARNING = 0x0000_0002;
        const ERROR = 0x0000_0004;
        const DUMP = 0x0000_0008;
        const TRACE = 0x4000_0000;
        const DEBUG = 0x8000_0000;

        const _ = !0;
    }
}

impl LogType {
    /// Short label used as a message prefix, `USR:nnn` for user defined types.
    pub fn label(self) -> String {
        const NAMED: [(LogType, &str); 6] = [
            (LogType::ERROR, "ERROR"),
            (LogType::WARNING, "WARNING"),
            (LogType::INFO, "INFO"),
            (LogType::DUMP, "DUMP"),
            (LogType::DEBUG, "DEBUG"),
            (LogType::TRACE, "TRACE"),
        ];
        NAMED
            .iter()
            .find(|(ty, _)| self.contains(*ty))
            .map(|(_, label)| (*label).to_owned())
            .unwrap_or_else(|| format!("USR:{:03}", self.bits()))
    }
}

/// Verbosity of a message. Lower is more important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogLevel(pub u8);

impl LogLevel {
    pub const GLOBAL: LogLevel = LogLevel(0);
    pub const NORMAL: LogLevel = LogLevel(127);
    pub const DETAIL: LogLevel = LogLevel(255);
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::NORMAL
    }
}

/// How [`LogSink::binary_dump`] renders bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DumpFormat {
    /// The bytes as (lossy) UTF-8 text.
    Raw,
    /// Sixteen hex bytes per line.
    #[default]
    Hex,
    /// Like [`Hex`](Self::Hex), with a `-` between the two halves of each line.
    Separate,
}

/// Which messages a sink keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFilter {
    pub types: LogType,
    pub max_level: LogLevel,
}

impl LogFilter {
    pub fn new(types: LogType, max_level: LogLevel) -> LogFilter {
        LogFilter { types, max_level }
    }

    pub fn allows(&self, ty: LogType, level: LogLevel) -> bool {
        self.types.intersects(ty) && level <= self.max_level
    }
}

impl Default for LogFilter {
    /// Everything in debug builds, informational messages and problems otherwise.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFilter::new(LogType::all(), LogLevel::DETAIL)
        } else {
            LogFilter::new(LogType::INFO | LogType::WARNING | LogType::ERROR, LogLevel::NORMAL)
        }
    }
}

/// Destination for log messages.
pub trait LogSink: Send + Sync {
    fn write(&self, ty: LogType, level: LogLevel, message: &str);

    /// Logs `data` under `name`, rendered according to `format`.
    fn binary_dump(&self, format: DumpFormat, name: &str, data: &[u8]);
}

/// A [`LogSink`] emitting [`tracing`] events.
///
/// `ERROR`, `WARNING`, `DEBUG` and `TRACE` messages map to the matching tracing
/// levels, everything else is emitted at `INFO`.
#[derive(Debug, Default)]
pub struct TracingSink {
    filter: LogFilter,
    // Keeps the lines of concurrent dumps from interleaving.
    dump_lock: Mutex<()>,
}

impl TracingSink {
    pub fn new(filter: LogFilter) -> TracingSink {
        TracingSink { filter, dump_lock: Mutex::new(()) }
    }

    pub fn filter(&self) -> LogFilter {
        self.filter
    }
}

impl LogSink for TracingSink {
    fn write(&self, ty: LogType, level: LogLevel, message: &str) {
        if !self.filter.allows(ty, level) {
            return;
        }
        let label = ty.label();
        let level = level.0;
        if ty.contains(LogType::ERROR) {
            tracing::error!(ty = %label, level, "{message}");
        } else if ty.contains(LogType::WARNING) {
            tracing::warn!(ty = %label, level, "{message}");
        } else if ty.contains(LogType::DEBUG) {
            tracing::debug!(ty = %label, level, "{message}");
        } else if ty.contains(LogType::TRACE) {
            tracing::trace!(ty = %label, level, "{message}");
        } else {
            tracing::info!(ty = %label, level, "{message}");
        }
    }

    fn binary_dump(&self, format: DumpFormat, name: &str, data: &[u8]) {
        if !self.filter.allows(LogType::DUMP, LogLevel::NORMAL) {
            return;
        }
        let lines = hex_dump_lines(data, format);
        let _guard = match self.dump_lock.lock() {
            Ok(guard) => Some(guard),
            Err(err) => {
                tracing::warn!(%err, "dump lock unavailable, output may interleave");
                None
            }
        };
        tracing::info!(ty = "DUMP", name, len = data.len(), "binary dump");
        for line in lines {
            tracing::info!(ty = "DUMP", name, "{line}");
        }
    }
}

/// Renders `data` as dump lines.
///
/// # Examples
///
/// ```
/// use native_sync::log::{hex_dump_lines, DumpFormat};
///
/// let lines = hex_dump_lines(&[0xde, 0xad, 0xbe, 0xef], DumpFormat::Hex);
/// assert_eq!(lines, ["0000: de ad be ef"]);
/// ```
pub fn hex_dump_lines(data: &[u8], format: DumpFormat) -> Vec<String> {
    if format == DumpFormat::Raw {
        return vec![String::from_utf8_lossy(data).into_owned()];
    }

    data.chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let mut line = format!("{:04x}:", i * 16);
            for (j, byte) in chunk.iter().enumerate() {
                if j == 8 && format == DumpFormat::Separate {
                    line.push_str(" -");
                }
                let _ = write!(line, " {byte:02x}");
            }
            line
        })
        .collect()
}
