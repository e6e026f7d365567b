use std::time::Instant;

pub fn elapsed_seconds(since: Instant) -> f64 {
    let dt = since.elapsed();
    (dt.as_secs() as f64) + (f64::from(dt.subsec_nanos()) * 1e-9)
}

pub fn prettyprint_time(seconds: f64) -> String {
    format!("{:.4}s", seconds)
}

struct TimerSpan {
    name: String,
    started_at: Instant,
    nested_time: f64,
}

/// Hierarchial magic. Phases nest with `start`/`stop`; everything goes out through `log`, and
/// notes and warnings are repeated in a summary when the timer is dropped, to avoid having to
/// scroll up and find interesting debug stuff.
pub struct Timer {
    stack: Vec<TimerSpan>,
    results: Vec<String>,
    notes: Vec<String>,
    warnings: Vec<String>,
    outermost_name: String,
}

impl Timer {
    pub fn new<I: Into<String>>(name: I) -> Timer {
        let name = name.into();
        let mut t = Timer {
            stack: Vec::new(),
            results: Vec::new(),
            notes: Vec::new(),
            warnings: Vec::new(),
            outermost_name: name.clone(),
        };
        t.start(name);
        t
    }

    /// For tests and callers that don't care about timing.
    pub fn throwaway() -> Timer {
        Timer::new("throwaway")
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

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Used to end the scope of a timer early.
    pub fn done(self) {}

    pub fn start<I: Into<String>>(&mut self, name: I) {
        let name = name.into();
        debug!("{}...", name);
        self.stack.push(TimerSpan {
            name,
            started_at: Instant::now(),
            nested_time: 0.0,
        });
    }

    pub fn stop<I: AsRef<str>>(&mut self, name: I) {
        let span = match self.stack.pop() {
            Some(span) => span,
            None => panic!("Timer::stop({}) with nothing started", name.as_ref()),
        };
        assert_eq!(span.name, name.as_ref());
        let elapsed = elapsed_seconds(span.started_at);
        let padding = "  ".repeat(self.stack.len());
        let line = format!("{}- {} took {}", padding, span.name, prettyprint_time(elapsed));
        debug!("{}", line);
        if let Some(parent) = self.stack.last_mut() {
            parent.nested_time += elapsed;
        }
        if span.nested_time != 0.0 {
            self.results.push(format!(
                "{}  - ... plus {}",
                padding,
                prettyprint_time(elapsed - span.nested_time)
            ));
        }
        self.results.push(line);
    }
}

impl std::ops::Drop for Timer {
    fn drop(&mut self) {
        let stop_name = self.outermost_name.clone();

        // Spans left open mean an error or panic cut the work short. Don't further blow up.
        match self.stack.len() {
            0 => {}
            1 => {
                self.stop(&stop_name);
            }
            _ => {
                warn!(
                    "dropping Timer with unfinished spans: {:?}",
                    self.stack.iter().map(|s| &s.name).collect::<Vec<_>>()
                );
                return;
            }
        }

        // Spans close innermost-first; print them outermost-first.
        for line in self.results.iter().rev() {
            debug!("{}", line);
        }
        if !self.notes.is_empty() {
            info!("{} notes:", self.notes.len());
            for line in &self.notes {
                info!("{}", line);
            }
        }
        if !self.warnings.is_empty() {
            warn!("{} warnings:", self.warnings.len());
            for line in &self.warnings {
                warn!("{}", line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_spans() {
        let mut timer = Timer::new("outer");
        timer.start("inner");
        timer.warn("something odd");
        timer.stop("inner");
        assert_eq!(timer.warnings().len(), 1);
        timer.done();
    }

    #[test]
    #[should_panic]
    fn mismatched_stop() {
        let mut timer = Timer::new("outer");
        timer.start("inner");
        timer.stop("not inner");
    }
}
