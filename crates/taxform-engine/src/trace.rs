//! Dependency tracing for line evaluation.
//!
//! While a top-level line is being evaluated, every line it pulls in (and
//! every raw input it reads) is recorded as a directed edge from the reader to
//! the thing read. Once the outermost line finishes, the collected edges become
//! the "last completed" trace and the recorder goes idle again.
//!
//! A [`Trace`] belongs to a single [`Evaluation`](crate::Evaluation); nothing is
//! shared between evaluations.
use std::collections::HashSet;
use std::fmt;

/// `from` read `to` while it was being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceEdge {
    pub from: String,
    pub to: String,
}

impl TraceEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for TraceEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for TraceEdge {
    fn from((from, to): (A, B)) -> Self {
        Self::new(from, to)
    }
}

/// Insertion-ordered set of edges.
#[derive(Debug, Clone, Default)]
struct EdgeSet {
    edges: Vec<TraceEdge>,
    seen: HashSet<(String, String)>,
}

impl EdgeSet {
    fn insert(&mut self, from: &str, to: &str) {
        if self.seen.insert((from.to_string(), to.to_string())) {
            self.edges.push(TraceEdge::new(from, to));
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Trace {
    stack: Vec<String>,
    current: Option<EdgeSet>,
    last: Option<Vec<TraceEdge>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while no line is being evaluated.
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Descriptor of the line currently being evaluated.
    pub fn current_line(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub fn begin(&mut self, descriptor: impl Into<String>) {
        let descriptor = descriptor.into();
        let current = self.current.get_or_insert_with(EdgeSet::default);
        if let Some(top) = self.stack.last() {
            current.insert(top, &descriptor);
        }
        self.stack.push(descriptor);
    }

    /// Records a read of something that is not a line (e.g. a raw input
    /// field). Ignored while idle.
    pub fn mark(&mut self, id: &str) {
        let (Some(top), Some(current)) = (self.stack.last(), self.current.as_mut()) else {
            return;
        };
        current.insert(top, id);
    }

    pub fn end(&mut self) {
        self.stack.pop();
        if self.stack.is_empty() {
            if let Some(completed) = self.current.take() {
                self.last = Some(completed.edges);
            }
        }
    }

    /// Edges of the most recently completed top-level evaluation.
    pub fn last_trace(&self) -> Option<&[TraceEdge]> {
        self.last.as_deref()
    }

    pub fn take_last_trace(&mut self) -> Option<Vec<TraceEdge>> {
        self.last.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_lines_produce_parent_child_edges() {
        let mut trace = Trace::new();
        trace.begin("A-1");
        trace.begin("A-2");
        trace.mark("A input: x");
        trace.end();
        assert!(trace.last_trace().is_none(), "still recording");
        trace.end();

        assert!(trace.is_idle());
        assert_eq!(
            trace.last_trace().unwrap(),
            &[
                TraceEdge::new("A-1", "A-2"),
                TraceEdge::new("A-2", "A input: x"),
            ]
        );
    }

    #[test]
    fn duplicate_edges_are_recorded_once() {
        let mut trace = Trace::new();
        trace.begin("A-1");
        for _ in 0..3 {
            trace.begin("B-1");
            trace.end();
        }
        trace.end();
        assert_eq!(trace.last_trace().unwrap(), &[TraceEdge::new("A-1", "B-1")]);
    }

    #[test]
    fn mark_while_idle_is_ignored() {
        let mut trace = Trace::new();
        trace.mark("A input: x");
        assert!(trace.last_trace().is_none());
        assert!(trace.is_idle());
    }

    #[test]
    fn single_line_completes_with_empty_edge_list() {
        let mut trace = Trace::new();
        trace.begin("A-1");
        trace.end();
        assert_eq!(trace.last_trace(), Some(&[][..]));
    }

    #[test]
    fn new_top_level_evaluation_replaces_snapshot() {
        let mut trace = Trace::new();
        trace.begin("A-1");
        trace.begin("A-2");
        trace.end();
        trace.end();

        trace.begin("B-1");
        trace.mark("B input: y");
        trace.end();

        assert_eq!(
            trace.take_last_trace().unwrap(),
            vec![TraceEdge::new("B-1", "B input: y")]
        );
        assert!(trace.last_trace().is_none());
    }
}
