use crate::types::{BlockKind, Token};

/// Folds a token stream into an HTML fragment.
///
/// Text is written exactly as received; escaping is left to whatever
/// consumes the fragment.
#[derive(Debug, Default)]
pub struct MarkupEmitter {
    output: String,
    open: Option<BlockKind>,
}

impl MarkupEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the markup for one token.
    ///
    /// # Panics
    ///
    /// On a close that does not match the open block, or an open while a
    /// block is still open. Either means the reconstructor broke its pairing
    /// guarantee.
    pub fn push(&mut self, token: Token) {
        match token {
            Token::OpenParagraph => self.open_block(BlockKind::Paragraph),
            Token::OpenHeading(level) => self.open_block(BlockKind::Heading(level)),
            Token::CloseParagraph => {
                assert_eq!(
                    self.open.take(),
                    Some(BlockKind::Paragraph),
                    "CloseParagraph without an open paragraph"
                );
                self.output.push_str("</p>\n");
            }
            Token::CloseHeading => match self.open.take() {
                Some(BlockKind::Heading(level)) => {
                    self.output.push_str(&format!("</{level}>\n"));
                }
                other => panic!("CloseHeading while {other:?} is open"),
            },
            Token::Text(text) => {
                self.output.push_str(&text);
                self.output.push('\n');
            }
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn open_block(&mut self, kind: BlockKind) {
        assert!(self.open.is_none(), "{kind:?} opened inside {:?}", self.open);
        match kind {
            BlockKind::Paragraph => self.output.push_str("<p>\n"),
            BlockKind::Heading(level) => self.output.push_str(&format!("<{level}>\n")),
        }
        self.open = Some(kind);
    }
}

/// Render a complete token sequence.
pub fn render_tokens(tokens: impl IntoIterator<Item = Token>) -> String {
    let mut emitter = MarkupEmitter::new();
    for token in tokens {
        emitter.push(token);
    }
    emitter.finish()
}
