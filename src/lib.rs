pub mod config;
pub mod logger;
pub mod optional;
pub mod report;
pub mod utils;

pub use {
    config::{ConfigError, ReportConfig},
    optional::{Optional, OptionalError},
    report::{
        LogSink, RecordedReport, RecordingSink, Report, ReportComponent, ReportLevel, ReportSink,
        report_message, with_sink,
    },
};
