/// Glyph drawn for the sentinel at the bottom of the log.
pub const SENTINEL_GLYPH: &str = "\u{2588}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub index: usize,
    pub text: String,
}

/// Zero-content anchor that sits after the last line. Its position on screen
/// is what tells us whether the user is looking at the bottom of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelMarker {
    pub after_index: usize,
}

/// Split log text on `\n`. An empty string yields a single empty line;
/// callers that care about "no logs" must check the text first.
pub fn split(log_text: &str) -> Vec<LineRecord> {
    log_text
        .split('\n')
        .enumerate()
        .map(|(index, text)| LineRecord {
            index,
            text: text.to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBuffer {
    lines: Vec<LineRecord>,
    sentinel: SentinelMarker,
}

impl LogBuffer {
    pub fn new(log_text: &str) -> Self {
        let lines = split(log_text);
        // split never returns an empty vec
        let sentinel = SentinelMarker {
            after_index: lines.len() - 1,
        };
        Self { lines, sentinel }
    }

    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    pub fn sentinel(&self) -> SentinelMarker {
        self.sentinel
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
