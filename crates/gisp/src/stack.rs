//! Call frames and the stack trace attached to errors.

use std::fmt;

/// One in-flight call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// The resolved name, or the JSON rendering of a computed head.
    pub label: String,
    /// Position of this call in its parent call array (0 for the root).
    pub index: usize,
    /// Nesting depth, starting at 1 for the outermost call.
    pub depth: usize,
}

impl Frame {
    pub fn new(label: impl Into<String>, index: usize, depth: usize) -> Self {
        Self {
            label: label.into(),
            index,
            depth,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.index)
    }
}

/// A snapshot of the call stack, innermost frame first.
///
/// Rendered as alternating labels and argument positions, so a failure in
/// `foo` reached through `["@", ["@", 1, 1], ["@", ["foo"], 1]]` prints as
/// `foo 1 @ 2 @ 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stack {
    frames: Vec<Frame>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from frames stored outermost first.
    pub(crate) fn capture(active: &[Frame]) -> Self {
        Self {
            frames: active.iter().rev().cloned().collect(),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// The frame where the failure happened.
    pub fn innermost(&self) -> Option<&Frame> {
        self.frames.first()
    }

    /// Labels and indices flattened in rendering order.
    pub fn entries(&self) -> Vec<String> {
        self.frames
            .iter()
            .flat_map(|frame| [frame.label.clone(), frame.index.to_string()])
            .collect()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", frame)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Stack {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_reverses_active_frames() {
        let active = vec![Frame::new("@", 0, 1), Frame::new("@", 2, 2), Frame::new("foo", 1, 3)];
        let stack = Stack::capture(&active);

        assert_eq!(stack.innermost(), Some(&Frame::new("foo", 1, 3)));
        assert_eq!(stack.to_string(), "foo 1 @ 2 @ 0");
        assert_eq!(stack.entries(), vec!["foo", "1", "@", "2", "@", "0"]);
    }

    #[test]
    fn test_empty_stack_renders_empty() {
        assert_eq!(Stack::new().to_string(), "");
        assert!(Stack::capture(&[]).is_empty());
    }
}
