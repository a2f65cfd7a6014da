use std::time::{Duration, Instant};

use log::info;

/// Scoped timing logger.
///
/// - logs a begin/end wrapper for the event
/// - logs total event time when dropped
/// - supports sequential spans (`span()` ends the previous span)
pub struct LogStopwatch {
    name: String,
    started: Instant,
    span: Option<(String, Instant)>,
}

impl LogStopwatch {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        info!("--------- {name} begin ---------");
        Self {
            name,
            started: Instant::now(),
            span: None,
        }
    }

    /// Starts a new span within the event, ending any previous span.
    pub fn span(&mut self, section_name: &str) {
        self.end_span();
        self.span = Some((section_name.to_owned(), Instant::now()));
    }

    /// Ends the current span, if any.
    pub fn end_span(&mut self) {
        if let Some((section, started)) = self.span.take() {
            info!("{}: {} took {:.3?}", self.name, section, started.elapsed());
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for LogStopwatch {
    fn drop(&mut self) {
        self.end_span();
        info!(
            "---------- {} end ({:.3?}) ----------",
            self.name,
            self.started.elapsed()
        );
    }
}
