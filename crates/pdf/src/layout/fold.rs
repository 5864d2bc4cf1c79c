use super::classify::{heading_level, starts_numbered_item};
use super::LINE_TOLERANCE;
use crate::types::{BlockKind, Line, Token};

/// State carried from one line to the next across the whole document.
///
/// Page boundaries do not reset it: a paragraph running off the bottom of one
/// page continues on the next.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FoldState {
    /// `x0` of the most recently classified line.
    pub last_indent: Option<f32>,
    /// `y0` of the most recently classified line.
    pub last_y: Option<f32>,
    /// Block currently open in the token stream.
    pub open: Option<BlockKind>,
}

impl FoldState {
    /// Classify one line and emit its tokens.
    pub fn step<F: FnMut(Token)>(mut self, line: &Line, sink: &mut F) -> Self {
        let text = line.text();
        let x0 = line.x0();
        let y0 = line.y0();

        let same_visual_line = self.last_y.is_some_and(|y| y0 > y - LINE_TOLERANCE);
        let indent_jump = self.last_indent.is_none_or(|x| x0 > x + LINE_TOLERANCE);
        if (!same_visual_line && indent_jump) || starts_numbered_item(&text) {
            // The new paragraph opens with its first text.
            self.close(sink);
        }

        self.last_indent = Some(x0);
        self.last_y = Some(y0);

        if line.is_all_bold() {
            self.close(sink);
            let kind = BlockKind::Heading(heading_level(&text));
            sink(kind.open_token());
            sink(Token::Text(text));
            sink(kind.close_token());
        } else {
            if self.open.is_none() {
                sink(Token::OpenParagraph);
                self.open = Some(BlockKind::Paragraph);
            }
            sink(Token::Text(text));
        }

        self
    }

    /// Close whatever is still open at the end of the document.
    pub fn finish<F: FnMut(Token)>(mut self, sink: &mut F) {
        self.close(sink);
    }

    fn close<F: FnMut(Token)>(&mut self, sink: &mut F) {
        if let Some(block) = self.open.take() {
            sink(block.close_token());
        }
    }
}
