//! Source locations and span inference.

use core::fmt;

use indextree::NodeId;
use serde::{Deserialize, Serialize};

use crate::debug;
use crate::tree::Ast;

/// A position in source text: 1-based line, 0-based column. Ordered by line, then column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SourceLocation {
    /// Line number
    pub line: u32,
    /// Column number
    pub column: u32,
}

impl SourceLocation {
    /// Create a location.
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Byte offset of this location inside `text`.
    ///
    /// The column counts characters, not bytes. A line past the end clamps to
    /// the last line, and a column past the end of its line clamps to the line end.
    pub fn offset_in(&self, text: &str) -> usize {
        let wanted = self.line.max(1) as usize;
        let mut start = 0;
        let mut found = (0, "", 0);
        for (number, line) in text.split_inclusive('\n').enumerate() {
            found = (start, line.strip_suffix('\n').unwrap_or(line), number + 1);
            if number + 1 == wanted {
                break;
            }
            start += line.len();
        }
        let (start, content, line) = found;
        let column = content
            .char_indices()
            .nth(self.column as usize)
            .map(|(offset, _)| offset);
        if line != wanted || column.is_none() && self.column as usize != content.chars().count()
        {
            debug!(location = %self, "clamping source location");
        }
        start + column.unwrap_or(content.len())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Ast {
    /// Start of the node in the source.
    ///
    /// The explicit start if set, otherwise the earliest start among the children.
    pub fn source_start(&self, id: NodeId) -> Option<SourceLocation> {
        if let Some(start) = self.get(id).source_start {
            return Some(start);
        }
        self.children(id)
            .filter_map(|child| self.source_start(child))
            .min()
    }

    /// End of the node in the source.
    ///
    /// The explicit end if set, otherwise the start of the first following sibling
    /// that has one, otherwise the parent's end.
    pub fn source_end(&self, id: NodeId) -> Option<SourceLocation> {
        if let Some(end) = self.get(id).source_end {
            return Some(end);
        }
        let parent = self.parent(id)?;
        let index = self.index(id)?;
        self.children(parent)
            .skip(index + 1)
            .find_map(|sibling| self.source_start(sibling))
            .or_else(|| self.source_end(parent))
    }

    /// Extract the text covered by a node's span.
    ///
    /// `None` when either end cannot be determined.
    pub fn source_text<'a>(&self, id: NodeId, text: &'a str) -> Option<&'a str> {
        let start = self.source_start(id)?.offset_in(text);
        let end = self.source_end(id)?.offset_in(text);
        Some(&text[start..end.max(start)])
    }

    /// Wrap the text covered by a node's span with `>>>` and `<<<` markers.
    ///
    /// Returns the text unchanged when the span cannot be determined.
    pub fn mark_source(&self, id: NodeId, text: &str) -> String {
        let (Some(start), Some(end)) = (self.source_start(id), self.source_end(id)) else {
            return text.to_owned();
        };
        let start = start.offset_in(text);
        let end = end.offset_in(text).max(start);
        format!("{}>>>{}<<<{}", &text[..start], &text[start..end], &text[end..])
    }
}
