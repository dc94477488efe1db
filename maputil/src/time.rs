use instant::Instant;

use crate::prettyprint_usize;

fn elapsed_seconds(since: Instant) -> f64 {
    let dt = since.elapsed();
    (dt.as_secs() as f64) + (f64::from(dt.subsec_nanos()) * 1e-9)
}

pub fn prettyprint_time(seconds: f64) -> String {
    if seconds >= 60.0 {
        let minutes = (seconds / 60.0).floor();
        format!("{}m{:.1}s", minutes, seconds - minutes * 60.0)
    } else {
        format!("{:.4}s", seconds)
    }
}

struct TimerSpan {
    name: String,
    started_at: Instant,
}

/// Hierarchical phase timing. Every `start` must be matched by a `stop` with the same name; spans
/// nest. Notes are logged immediately and repeated in the summary when the Timer is finished, so
/// the interesting bits of a long run don't scroll away.
pub struct Timer {
    outermost_name: String,
    results: Vec<String>,
    stack: Vec<TimerSpan>,
    notes: Vec<String>,
    warnings: Vec<String>,
}

impl Timer {
    pub fn new<I: Into<String>>(name: I) -> Timer {
        let name = name.into();
        let mut t = Timer {
            outermost_name: name.clone(),
            results: Vec::new(),
            stack: Vec::new(),
            notes: Vec::new(),
            warnings: Vec::new(),
        };
        t.start(name);
        t
    }

    /// For callers that need a Timer but don't care about the summary.
    pub fn throwaway() -> Timer {
        Timer::new("throwaway")
    }

    pub fn start<I: Into<String>>(&mut self, name: I) {
        let name = name.into();
        debug!("{}...", name);
        self.stack.push(TimerSpan {
            name,
            started_at: Instant::now(),
        });
    }

    pub fn stop<I: Into<String>>(&mut self, name: I) {
        let name = name.into();
        let span = match self.stack.pop() {
            Some(span) => span,
            None => panic!("Timer::stop({}) with nothing started", name),
        };
        assert_eq!(span.name, name, "Timer spans stopped out of order");
        let elapsed = elapsed_seconds(span.started_at);
        let padding = "  ".repeat(self.stack.len());
        let line = format!("{} took {}", name, prettyprint_time(elapsed));
        self.results.push(format!("{}- {}", padding, line));
        info!("{}", line);
    }

    /// Log immediately, but also repeat at the end.
    pub fn note<I: Into<String>>(&mut self, line: I) {
        let line = line.into();
        info!("{}", line);
        self.notes.push(line);
    }

    pub fn warn<I: Into<String>>(&mut self, line: I) {
        let line = line.into();
        warn!("{}", line);
        self.warnings.push(line);
    }

    /// Stop the outermost span and print a summary of everything that happened.
    pub fn done(mut self) {
        let name = self.outermost_name.clone();
        while self.stack.len() > 1 {
            let dangling = self.stack.last().map(|s| s.name.clone()).unwrap_or_default();
            self.warn(format!("{} was never stopped", dangling));
            self.stop(dangling);
        }
        if !self.stack.is_empty() {
            self.stop(name);
        }

        // The outermost span was pushed first but stopped last
        self.results.rotate_right(1);
        info!("");
        for line in &self.results {
            info!("{}", line);
        }
        if !self.notes.is_empty() {
            info!("{} notes:", prettyprint_usize(self.notes.len()));
            for line in &self.notes {
                info!("  {}", line);
            }
        }
        if !self.warnings.is_empty() {
            warn!("{} warnings:", prettyprint_usize(self.warnings.len()));
            for line in &self.warnings {
                warn!("  {}", line);
            }
        }
    }
}
