use std::borrow::Cow;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

static DATE_STAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[0-9]{2,4}-[0-9]{1,2}-[0-9]{1,2}:").expect("date stamp pattern compiles")
});
static TASK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s?\[(.?)\]:").expect("task pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SegmentKind {
    Empty,
    DateStamp,
    Task,
    Text,
}

/// One classified line of a note body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    kind: SegmentKind,
    raw_line: String,
    task_marker: Option<String>,
    // byte range of the marker inside `raw_line`, between the brackets
    marker_span: Option<Range<usize>>,
}

impl Segment {
    pub fn classify(line: &str) -> Self {
        if line.is_empty() {
            return Self::plain(SegmentKind::Empty, line);
        }
        if DATE_STAMP_RE.is_match(line) {
            return Self::plain(SegmentKind::DateStamp, line);
        }
        if let Some(marker) = TASK_RE.captures(line).and_then(|caps| caps.get(1)) {
            return Self {
                kind: SegmentKind::Task,
                raw_line: line.to_string(),
                task_marker: Some(marker.as_str().to_string()),
                marker_span: Some(marker.range()),
            };
        }
        Self::plain(SegmentKind::Text, line)
    }

    fn plain(kind: SegmentKind, line: &str) -> Self {
        Self {
            kind,
            raw_line: line.to_string(),
            task_marker: None,
            marker_span: None,
        }
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn raw_line(&self) -> &str {
        &self.raw_line
    }

    pub fn task_marker(&self) -> Option<&str> {
        self.task_marker.as_deref()
    }

    pub fn is_task(&self) -> bool {
        self.kind == SegmentKind::Task
    }

    /// Replaces the completion marker of a task. Returns `false` for
    /// non-task segments, which are left untouched.
    pub fn set_task_marker(&mut self, marker: Option<char>) -> bool {
        if !self.is_task() {
            return false;
        }
        self.task_marker = Some(marker.map(String::from).unwrap_or_default());
        true
    }

    /// The line as it should be written back, reflecting the current marker.
    pub fn content(&self) -> Cow<'_, str> {
        match (&self.marker_span, &self.task_marker) {
            (Some(span), Some(marker)) if marker.as_str() != &self.raw_line[span.clone()] => {
                let mut line = String::with_capacity(self.raw_line.len() + marker.len());
                line.push_str(&self.raw_line[..span.start]);
                line.push_str(marker);
                line.push_str(&self.raw_line[span.end..]);
                Cow::Owned(line)
            }
            _ => Cow::Borrowed(&self.raw_line),
        }
    }
}

pub fn segmentize(body: &str) -> Vec<Segment> {
    if body.is_empty() {
        return vec![Segment::plain(SegmentKind::Empty, "")];
    }
    let body = body.strip_suffix('\n').unwrap_or(body);
    body.split('\n').map(Segment::classify).collect()
}

pub fn desegmentize(segments: &[Segment]) -> String {
    match segments {
        [] => return String::new(),
        [only] if only.kind == SegmentKind::Empty => return String::new(),
        _ => {}
    }
    let last = segments.len() - 1;
    let mut out = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if segment.kind == SegmentKind::Empty {
            out.push('\n');
            continue;
        }
        out.push_str(&segment.content());
        if index < last {
            out.push('\n');
        }
    }
    out
}
