//! Dispatch trace types for debugging rule behavior.
//!
//! With tracing enabled on a [`Digester`](crate::Digester), every rule callback is
//! recorded as a [`TraceStep`]. The trace answers "which rules fired for this element,
//! in which order, under which pattern" without attaching a log subscriber.
//!
//! # Example
//!
//! ```ignore
//! digester.enable_trace();
//! digester.parse_events(events)?;
//! for step in &digester.trace().unwrap().steps {
//!     println!("{step}");
//! }
//! ```

use std::fmt;

/// The callback phase a step records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Element opened.
    Begin,
    /// Element text delivered.
    Body,
    /// Element closed.
    End,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Begin => "begin",
            Self::Body => "body",
            Self::End => "end",
        })
    }
}

/// One rule callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    /// Which callback ran.
    pub phase: Phase,
    /// Element path at the time, `/`-separated.
    pub path: String,
    /// The winning pattern.
    pub pattern: String,
    /// Debug description of the rule (e.g., `ObjectCreate { type_name: "Book", .. }`).
    pub rule: String,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<5} {} [{}] {}",
            self.phase, self.path, self.pattern, self.rule
        )
    }
}

/// Every callback fired for one document, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchTrace {
    /// Steps in execution order.
    pub steps: Vec<TraceStep>,
}

impl DispatchTrace {
    /// Steps recorded for one path.
    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a TraceStep> + 'a {
        self.steps.iter().filter(move |s| s.path == path)
    }

    /// Number of recorded steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn record(&mut self, phase: Phase, path: &str, pattern: &str, rule: &dyn fmt::Debug) {
        self.steps.push(TraceStep {
            phase,
            path: path.to_owned(),
            pattern: pattern.to_owned(),
            rule: format!("{rule:?}"),
        });
    }
}

impl fmt::Display for DispatchTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{step}")?;
        }
        Ok(())
    }
}
