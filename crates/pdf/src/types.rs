use std::fmt;

/// A single rendered character with its bounding box and font.
///
/// Coordinates are in PDF user space: origin at the bottom-left of the page,
/// `y` growing upwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub font_name: String,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Glyph {
    pub fn new(text: impl Into<String>, font_name: impl Into<String>, x0: f32, y0: f32) -> Self {
        Glyph {
            text: text.into(),
            font_name: font_name.into(),
            x0,
            y0,
            x1: x0,
            y1: y0,
        }
    }

    /// Set the upper-right corner of the bounding box.
    pub fn with_extent(mut self, x1: f32, y1: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self
    }

    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    pub fn is_bold(&self) -> bool {
        self.font_name.to_lowercase().contains("bold")
    }
}

/// A run of glyphs the extractor grouped onto one baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub glyphs: Vec<Glyph>,
}

impl Line {
    pub fn new(glyphs: Vec<Glyph>) -> Self {
        Line { glyphs }
    }

    /// Left edge of the line's bounding box.
    pub fn x0(&self) -> f32 {
        self.glyphs
            .iter()
            .map(|g| g.x0)
            .min_by(f32::total_cmp)
            .unwrap_or(0.0)
    }

    /// Bottom edge of the line's bounding box.
    pub fn y0(&self) -> f32 {
        self.glyphs
            .iter()
            .map(|g| g.y0)
            .min_by(f32::total_cmp)
            .unwrap_or(0.0)
    }

    /// Glyph values concatenated in glyph order.
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.text.as_str()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.glyphs.iter().all(Glyph::is_whitespace)
    }

    /// Every distinct font on the line names a bold face.
    ///
    /// A line without glyphs is vacuously bold; blank lines are filtered
    /// before this is ever asked.
    pub fn is_all_bold(&self) -> bool {
        self.glyphs.iter().all(Glyph::is_bold)
    }
}

/// One physical page's lines, in extraction order.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub lines: Vec<Line>,
}

impl Page {
    pub fn new(number: usize, lines: Vec<Line>) -> Self {
        Page { number, lines }
    }
}

/// Heading depth, restricted to the three levels a memo outline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const H1: Self = HeadingLevel(1);
    pub const H2: Self = HeadingLevel(2);
    pub const H3: Self = HeadingLevel(3);
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Structural events produced by the layout reconstructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    OpenParagraph,
    Text(String),
    CloseParagraph,
    OpenHeading(HeadingLevel),
    CloseHeading,
}

impl Token {
    pub fn is_open(&self) -> bool {
        matches!(self, Token::OpenParagraph | Token::OpenHeading(_))
    }

    pub fn is_close(&self) -> bool {
        matches!(self, Token::CloseParagraph | Token::CloseHeading)
    }
}

/// The kind of block a token stream currently has open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
}

impl BlockKind {
    pub fn open_token(self) -> Token {
        match self {
            BlockKind::Paragraph => Token::OpenParagraph,
            BlockKind::Heading(level) => Token::OpenHeading(level),
        }
    }

    pub fn close_token(self) -> Token {
        match self {
            BlockKind::Paragraph => Token::CloseParagraph,
            BlockKind::Heading(_) => Token::CloseHeading,
        }
    }
}
