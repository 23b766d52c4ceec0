use {
    backtrace::Backtrace,
    log::{Level, Log, Metadata, Record},
    std::{
        cell::RefCell,
        io::{self, Write},
        sync::{
            Arc,
            atomic::{AtomicU32, Ordering::Relaxed},
        },
        time::SystemTime,
    },
    thiserror::Error,
};

thread_local! {
    static BUFFER: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("A logger has already been installed")]
    AlreadyInstalled(#[source] log::SetLoggerError),
}

/// Writes log records to stderr.
pub struct Logger {
    level: AtomicU32,
}

impl Logger {
    pub fn install_stderr(level: Level) -> Result<Arc<Self>, LoggerError> {
        let slf = Arc::new(Self {
            level: AtomicU32::new(level as _),
        });
        log::set_boxed_logger(Box::new(LogWrapper {
            logger: slf.clone(),
        }))
        .map_err(LoggerError::AlreadyInstalled)?;
        log::set_max_level(level.to_level_filter());
        Ok(slf)
    }

    /// Routes panic messages and their backtraces through the logger.
    pub fn install_panic_hook() {
        std::panic::set_hook(Box::new(|p| {
            match p.location() {
                Some(loc) => log::error!(
                    "Panic at {} line {} column {}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                ),
                None => log::error!("Panic at unknown location"),
            }
            if let Some(msg) = p.payload().downcast_ref::<&str>() {
                log::error!("Message: {}", msg);
            }
            if let Some(msg) = p.payload().downcast_ref::<String>() {
                log::error!("Message: {}", msg);
            }
            log::error!("Backtrace:\n{:?}", Backtrace::new());
        }));
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as _, Relaxed);
        log::set_max_level(level.to_level_filter());
    }

    fn enabled(&self, level: Level) -> bool {
        level as u32 <= self.level.load(Relaxed)
    }
}

/// Formats a record as `[<timestamp> <level> <target>] <message>`.
pub fn format_record(buffer: &mut Vec<u8>, now: SystemTime, record: &Record<'_>) -> io::Result<()> {
    writeln!(
        buffer,
        "[{} {:5} {}] {}",
        humantime::format_rfc3339_millis(now),
        record.level(),
        record.target(),
        record.args(),
    )
}

struct LogWrapper {
    logger: Arc<Logger>,
}

impl Log for LogWrapper {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.logger.enabled(metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.logger.enabled(record.level()) {
            return;
        }
        BUFFER.with_borrow_mut(|buffer| {
            buffer.clear();
            if format_record(buffer, SystemTime::now(), record).is_ok() {
                let _ = io::stderr().lock().write_all(buffer);
            }
        });
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}
