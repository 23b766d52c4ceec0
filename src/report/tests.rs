use {
    crate::{
        config::ReportConfig,
        report::{
            self, LogSink, RecordedReport, RecordingSink, Report, ReportComponent, ReportLevel,
            ReportSink, prefix,
        },
    },
    log::{Log, Metadata, Record},
    std::{
        cell::Cell,
        panic::{self, AssertUnwindSafe, Location},
        rc::Rc,
        sync::{Mutex, MutexGuard, Once},
        thread::{self, ThreadId},
    },
};

type Captured = (String, log::Level, String);

static CAPTURED: Mutex<Vec<(ThreadId, Captured)>> = Mutex::new(Vec::new());
static CONFIG: Mutex<()> = Mutex::new(());

/// Records every log record together with the thread that emitted it.
struct Capture;

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let entry = (
            record.target().to_string(),
            record.level(),
            record.args().to_string(),
        );
        CAPTURED
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((thread::current().id(), entry));
    }

    fn flush(&self) {}
}

fn install_capture() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        log::set_boxed_logger(Box::new(Capture)).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
    });
    let id = thread::current().id();
    CAPTURED
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .retain(|(t, _)| *t != id);
}

/// Records logged by the current thread so far.
fn captured() -> Vec<Captured> {
    let id = thread::current().id();
    CAPTURED
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .filter(|(t, _)| *t == id)
        .map(|(_, c)| c.clone())
        .collect()
}

/// Serializes tests that change the process-wide report settings.
fn lock_config() -> MutexGuard<'static, ()> {
    CONFIG.lock().unwrap_or_else(|e| e.into_inner())
}

#[test]
fn levels_are_ordered() {
    assert!(ReportLevel::Debug < ReportLevel::Info);
    assert!(ReportLevel::Info < ReportLevel::Warning);
    assert!(ReportLevel::Warning < ReportLevel::Error);
    assert!(ReportLevel::Error < ReportLevel::Critical);
    assert_eq!(ReportLevel::Critical.log_level(), log::Level::Error);
    assert_eq!(ReportLevel::Warning.log_level(), log::Level::Warn);
    assert_eq!(ReportLevel::Critical.to_string(), "CRITICAL");
}

#[test]
fn component_tags() {
    assert_eq!(ReportComponent::CoreHelper.tag(), "si_core_helper");
    assert_eq!(ReportComponent::Application.tag(), "si_application");
}

#[test]
fn recording_sink_receives_reports() {
    let sink = RecordingSink::new();
    report::with_sink(sink.clone(), || {
        report::report_message("first", ReportLevel::Info, ReportComponent::Application);
        report::report_message("second", ReportLevel::Critical, ReportComponent::CoreHelper);
    });
    assert_eq!(
        sink.take(),
        [
            RecordedReport {
                message: "first".to_string(),
                level: ReportLevel::Info,
                component: ReportComponent::Application,
            },
            RecordedReport {
                message: "second".to_string(),
                level: ReportLevel::Critical,
                component: ReportComponent::CoreHelper,
            },
        ],
    );
    assert!(sink.is_empty());
}

#[test]
fn with_sink_restores_previous_sink() {
    let outer = RecordingSink::new();
    let inner = RecordingSink::new();
    report::with_sink(outer.clone(), || {
        report::with_sink(inner.clone(), || {
            report::report_message("inner", ReportLevel::Error, ReportComponent::Application);
        });
        report::report_message("outer", ReportLevel::Error, ReportComponent::Application);
    });
    report::report_message("none", ReportLevel::Debug, ReportComponent::Application);
    assert_eq!(inner.len(), 1);
    assert_eq!(inner.reports()[0].message, "inner");
    assert_eq!(outer.len(), 1);
    assert_eq!(outer.reports()[0].message, "outer");
}

#[test]
fn with_sink_restores_on_panic() {
    let outer = RecordingSink::new();
    let prev = report::set_sink(Some(outer.clone()));
    assert!(prev.is_none());
    let res = panic::catch_unwind(AssertUnwindSafe(|| {
        report::with_sink(RecordingSink::new(), || panic!("boom"));
    }));
    assert!(res.is_err());
    report::report_message("after", ReportLevel::Warning, ReportComponent::Application);
    assert_eq!(outer.len(), 1);
    report::set_sink(None);
}

#[test]
fn sink_may_report_reentrantly() {
    struct Forward {
        depth: Cell<u32>,
        target: Rc<RecordingSink>,
    }

    impl ReportSink for Forward {
        fn report(&self, report: &Report<'_>) {
            self.target.report(report);
            if self.depth.replace(self.depth.get() + 1) == 0 {
                report::report_message("nested", report.level, report.component);
            }
        }
    }

    let target = RecordingSink::new();
    let sink = Rc::new(Forward {
        depth: Cell::new(0),
        target: target.clone(),
    });
    report::with_sink(sink, || {
        report::report_message("top", ReportLevel::Error, ReportComponent::CoreHelper);
    });
    let messages: Vec<_> = target.take().into_iter().map(|r| r.message).collect();
    assert_eq!(messages, ["top", "nested"]);
}

#[test]
fn configure_sets_minimum_level() {
    let _lock = lock_config();
    report::configure(&ReportConfig {
        log_level: ReportLevel::Error,
        ..Default::default()
    });
    assert!(!report::is_enabled(ReportLevel::Warning));
    assert!(report::is_enabled(ReportLevel::Error));
    assert!(report::is_enabled(ReportLevel::Critical));
    report::configure(&ReportConfig::default());
    assert!(report::is_enabled(ReportLevel::Warning));
    assert!(!report::is_enabled(ReportLevel::Info));
}

#[test]
fn log_sink_uses_component_target() {
    let _lock = lock_config();
    install_capture();
    report::configure(&ReportConfig::default());
    LogSink.report(&Report {
        message: "dropped",
        level: ReportLevel::Info,
        component: ReportComponent::Application,
    });
    LogSink.report(&Report {
        message: "kept",
        level: ReportLevel::Warning,
        component: ReportComponent::Application,
    });
    LogSink.report(&Report {
        message: "critical",
        level: ReportLevel::Critical,
        component: ReportComponent::CoreHelper,
    });
    assert_eq!(
        captured(),
        [
            (
                "si_application".to_string(),
                log::Level::Warn,
                "WARNING: kept".to_string(),
            ),
            (
                "si_core_helper".to_string(),
                log::Level::Error,
                "CRITICAL: critical".to_string(),
            ),
        ],
    );
}

#[test]
fn log_sink_backtrace_on_critical() {
    let _lock = lock_config();
    install_capture();
    report::configure(&ReportConfig {
        backtrace_on_critical: true,
        ..Default::default()
    });
    LogSink.report(&Report {
        message: "error",
        level: ReportLevel::Error,
        component: ReportComponent::CoreHelper,
    });
    LogSink.report(&Report {
        message: "critical",
        level: ReportLevel::Critical,
        component: ReportComponent::CoreHelper,
    });
    report::configure(&ReportConfig::default());
    let records = captured();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].2, "ERROR: error");
    assert_eq!(records[1].2, "CRITICAL: critical");
    assert_eq!(records[2].0, "si_core_helper");
    assert_eq!(records[2].1, log::Level::Error);
    assert!(records[2].2.starts_with("Backtrace:\n"));
}

#[test]
fn report_message_defaults_to_log_sink() {
    let _lock = lock_config();
    install_capture();
    report::configure(&ReportConfig::default());
    report::report_message("unrouted", ReportLevel::Error, ReportComponent::Application);
    assert_eq!(
        captured(),
        [(
            "si_application".to_string(),
            log::Level::Error,
            "ERROR: unrouted".to_string(),
        )],
    );
}

#[test]
fn prefix_names_location() {
    let location = Location::caller();
    assert_eq!(
        prefix::report_prefix(location),
        format!("[{}:{}] ", file!(), location.line()),
    );
}
