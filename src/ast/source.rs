//! Source text of expression nodes.
//!
//! A node doesn't store its source as one string: it stores the literal
//! text it contributes interleaved with the positions of its children, so
//! the text of a child is never duplicated in its ancestors.

use super::Ast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    Text(String),
    /// Source of the child with this index
    Child(usize),
}

#[derive(Debug, Default)]
pub(crate) struct SourceBuilder {
    fragments: Vec<Fragment>,
}

impl SourceBuilder {
    pub fn new() -> Self {
        SourceBuilder::default()
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        if let Some(Fragment::Text(last)) = self.fragments.last_mut() {
            last.push_str(text);
        } else {
            self.fragments.push(Fragment::Text(text.to_string()));
        }
        self
    }

    pub fn child(&mut self, index: usize) -> &mut Self {
        self.fragments.push(Fragment::Child(index));
        self
    }

    /// A child, in parentheses if `parens` is set.
    pub fn operand(&mut self, index: usize, parens: bool) -> &mut Self {
        if parens {
            self.text("(").child(index).text(")")
        } else {
            self.child(index)
        }
    }

    /// Children `range` separated by `, `.
    pub fn separated(&mut self, range: std::ops::Range<usize>) -> &mut Self {
        let start = range.start;
        for index in range {
            if index != start {
                self.text(", ");
            }
            self.child(index);
        }
        self
    }

    pub fn finish(&mut self) -> Vec<Fragment> {
        std::mem::take(&mut self.fragments)
    }
}

pub(crate) fn write_source(fragments: &[Fragment], children: &[Ast], out: &mut String) {
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => out.push_str(text),
            Fragment::Child(index) => {
                if let Some(child) = children.get(*index) {
                    child.write_source(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_text_is_merged() {
        let fragments = SourceBuilder::new().text("(").child(0).text(")").text(".").text("x").finish();
        assert_eq!(
            fragments,
            vec![
                Fragment::Text("(".into()),
                Fragment::Child(0),
                Fragment::Text(").x".into()),
            ]
        );
    }

    #[test]
    fn test_separated() {
        let fragments = SourceBuilder::new().text("f(").separated(0..3).text(")").finish();
        assert_eq!(fragments.len(), 7);
        assert_eq!(fragments[2], Fragment::Text(", ".into()));
        assert!(SourceBuilder::new().separated(0..0).finish().is_empty());
    }
}
