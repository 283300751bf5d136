use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::{Marks, TextNode};

/// Overlay content shown over an empty leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub content: String,
}

impl Placeholder {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// The smallest span of a text node that shares one set of marks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Placeholder>,
}

impl Leaf {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
            placeholder: None,
        }
    }

    pub fn with_marks(mut self, marks: Marks) -> Self {
        self.marks = marks;
        self
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Text and marks equality. The placeholder is deliberately left out.
    pub fn content_eq(&self, other: &Leaf) -> bool {
        self.text == other.text && self.marks == other.marks
    }
}

/// A range-scoped overlay of marks (and optionally a placeholder) applied to
/// a text node at render time. Offsets are byte offsets into the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub range: Range<usize>,
    pub marks: Marks,
    pub placeholder: Option<Placeholder>,
}

impl Decoration {
    pub fn new(range: Range<usize>, marks: Marks) -> Self {
        Self {
            range,
            marks,
            placeholder: None,
        }
    }

    pub fn placeholder(content: impl Into<String>) -> Self {
        Self {
            range: 0..0,
            marks: Marks::default(),
            placeholder: Some(Placeholder::new(content)),
        }
    }

    fn covers(&self, segment: &Range<usize>) -> bool {
        if self.range.is_empty() {
            return segment.is_empty() && self.range.start == segment.start;
        }
        self.range.start <= segment.start && segment.end <= self.range.end && !segment.is_empty()
    }
}

impl TextNode {
    /// Splits this text into leaves at every decoration boundary.
    ///
    /// A decoration applies to each segment it fully covers. A collapsed
    /// decoration only lands on the single segment of an empty text. Without
    /// decorations the text yields exactly one leaf.
    pub fn leaves(&self, decorations: &[Decoration]) -> Vec<Leaf> {
        let len = self.text.len();
        let mut bounds: Vec<usize> = vec![0, len];
        for deco in decorations {
            for ix in [deco.range.start, deco.range.end] {
                let ix = clamp_to_char_boundary(&self.text, ix);
                bounds.push(ix);
            }
        }
        bounds.sort_unstable();
        bounds.dedup();

        let segments: Vec<Range<usize>> = if len == 0 {
            vec![0..0]
        } else {
            bounds.windows(2).map(|w| w[0]..w[1]).collect()
        };

        segments
            .into_iter()
            .map(|segment| {
                let mut leaf = Leaf {
                    text: self.text[segment.clone()].to_string(),
                    marks: self.marks.clone(),
                    placeholder: None,
                };
                for deco in decorations.iter().filter(|d| d.covers(&segment)) {
                    leaf.marks = leaf.marks.merged(&deco.marks);
                    if deco.placeholder.is_some() {
                        leaf.placeholder = deco.placeholder.clone();
                    }
                }
                leaf
            })
            .collect()
    }
}

fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_moves_back_to_char_boundary() {
        let s = "añb";
        assert_eq!(clamp_to_char_boundary(s, 2), 1);
        assert_eq!(clamp_to_char_boundary(s, 3), 3);
        assert_eq!(clamp_to_char_boundary(s, 99), 4);
    }
}
