pub mod prefix;
#[cfg(test)]
mod tests;

use {
    crate::config::ReportConfig,
    backtrace::Backtrace,
    run_on_drop::on_drop,
    serde::Deserialize,
    std::{
        cell::RefCell,
        fmt::{Display, Formatter},
        rc::Rc,
        sync::atomic::{AtomicBool, AtomicU32, Ordering::Relaxed},
    },
};

static MIN_LEVEL: AtomicU32 = AtomicU32::new(ReportLevel::Warning as u32);
static BACKTRACE_ON_CRITICAL: AtomicBool = AtomicBool::new(false);
static ABORT_ON_CRITICAL: AtomicBool = AtomicBool::new(false);

thread_local! {
    static SINK: RefCell<Option<Rc<dyn ReportSink>>> = const { RefCell::new(None) };
}

/// Severity of a report, ordered from least to most severe.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl ReportLevel {
    pub fn name(self) -> &'static str {
        match self {
            ReportLevel::Debug => "DEBUG",
            ReportLevel::Info => "INFO",
            ReportLevel::Warning => "WARNING",
            ReportLevel::Error => "ERROR",
            ReportLevel::Critical => "CRITICAL",
        }
    }

    /// The `log` level reports of this severity are written with.
    pub fn log_level(self) -> log::Level {
        match self {
            ReportLevel::Debug => log::Level::Debug,
            ReportLevel::Info => log::Level::Info,
            ReportLevel::Warning => log::Level::Warn,
            ReportLevel::Error | ReportLevel::Critical => log::Level::Error,
        }
    }
}

impl Display for ReportLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The component a report originates from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ReportComponent {
    CoreHelper,
    Application,
}

impl ReportComponent {
    /// The tag used as the `log` target.
    pub fn tag(self) -> &'static str {
        match self {
            ReportComponent::CoreHelper => "si_core_helper",
            ReportComponent::Application => "si_application",
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Report<'a> {
    pub message: &'a str,
    pub level: ReportLevel,
    pub component: ReportComponent,
}

impl Report<'_> {
    pub fn to_recorded(&self) -> RecordedReport {
        RecordedReport {
            message: self.message.to_owned(),
            level: self.level,
            component: self.component,
        }
    }
}

/// Receives reports emitted via [`report_message`].
///
/// Implementations must return control to the caller unless they decide to
/// terminate the process.
pub trait ReportSink {
    fn report(&self, report: &Report<'_>);
}

/// Emits a report to the sink of the current thread.
///
/// If no sink has been installed with [`with_sink`] or [`set_sink`], the
/// report is forwarded to [`LogSink`].
pub fn report_message(message: &str, level: ReportLevel, component: ReportComponent) {
    let report = Report {
        message,
        level,
        component,
    };
    // The sink might itself emit reports.
    let sink = SINK.with_borrow(|s| s.clone());
    match sink {
        Some(sink) => sink.report(&report),
        None => LogSink.report(&report),
    }
}

/// Runs `f` with `sink` installed on the current thread.
///
/// The previously installed sink is restored afterwards, even if `f` panics.
pub fn with_sink<R>(sink: Rc<dyn ReportSink>, f: impl FnOnce() -> R) -> R {
    let prev = SINK.replace(Some(sink));
    let _restore = on_drop(move || SINK.set(prev));
    f()
}

/// Installs `sink` on the current thread and returns the previous sink.
pub fn set_sink(sink: Option<Rc<dyn ReportSink>>) -> Option<Rc<dyn ReportSink>> {
    SINK.replace(sink)
}

/// Applies the process-wide settings used by [`LogSink`].
pub fn configure(config: &ReportConfig) {
    MIN_LEVEL.store(config.log_level as u32, Relaxed);
    BACKTRACE_ON_CRITICAL.store(config.backtrace_on_critical, Relaxed);
    ABORT_ON_CRITICAL.store(config.abort_on_critical, Relaxed);
}

/// Whether [`LogSink`] forwards reports of this level.
pub fn is_enabled(level: ReportLevel) -> bool {
    level as u32 >= MIN_LEVEL.load(Relaxed)
}

/// Writes reports through the `log` facade, using the component tag as the
/// target.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn report(&self, report: &Report<'_>) {
        if !is_enabled(report.level) {
            return;
        }
        let target = report.component.tag();
        log::log!(
            target: target,
            report.level.log_level(),
            "{}: {}",
            report.level,
            report.message,
        );
        if report.level != ReportLevel::Critical {
            return;
        }
        if BACKTRACE_ON_CRITICAL.load(Relaxed) {
            log::error!(target: target, "Backtrace:\n{:?}", Backtrace::new());
        }
        if ABORT_ON_CRITICAL.load(Relaxed) {
            log::error!(target: target, "Aborting after a critical report");
            std::process::abort();
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedReport {
    pub message: String,
    pub level: ReportLevel,
    pub component: ReportComponent,
}

/// Collects every report it receives.
#[derive(Default)]
pub struct RecordingSink {
    reports: RefCell<Vec<RecordedReport>>,
}

impl RecordingSink {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }

    pub fn reports(&self) -> Vec<RecordedReport> {
        self.reports.borrow().clone()
    }

    pub fn take(&self) -> Vec<RecordedReport> {
        self.reports.take()
    }
}

impl ReportSink for RecordingSink {
    fn report(&self, report: &Report<'_>) {
        self.reports.borrow_mut().push(report.to_recorded());
    }
}
