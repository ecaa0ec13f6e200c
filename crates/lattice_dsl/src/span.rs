use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub file: String,
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub col: u32,
}

#[derive(Debug)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .char_indices()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { starts }
    }

    pub(crate) fn line_col(&self, offset: usize) -> (u32, u32) {
        let line = self.starts.partition_point(|start| *start <= offset) - 1;
        let col = offset - self.starts[line];
        (line as u32 + 1, col as u32 + 1)
    }
}

pub(crate) fn make_span(file: &str, span: std::ops::Range<usize>, line_index: &LineIndex) -> Span {
    let (line, col) = line_index.line_col(span.start);
    Span {
        file: file.to_string(),
        start: span.start,
        end: span.end,
        line,
        col,
    }
}
