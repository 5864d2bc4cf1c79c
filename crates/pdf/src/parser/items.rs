//! Layout-item tree produced per page by the extractor.
//!
//! Extraction yields heterogeneous nodes; only the text-bearing ones matter
//! downstream. [`collect_lines`] walks the tree and returns the page's
//! [`Line`]s in the order they were encountered.

use crate::types::{Glyph, Line};

/// A node of a page's layout tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    /// A text object (`BT` .. `ET`) holding lines.
    TextBox(Vec<LayoutItem>),
    /// Characters sharing a baseline.
    TextLine(Vec<LayoutItem>),
    /// One positioned character.
    Character(Glyph),
    /// An XObject painted with `Do`.
    Image { name: String },
    /// Anything else the extractor recognised but does not interpret.
    Other,
}

/// Collect every text line found anywhere below `items`.
///
/// A `TextLine` becomes one [`Line`] made of its `Character` leaves (nested
/// lines inside a line are flattened into it). Stray `Character`s outside
/// any line become single-glyph lines. Images and other nodes yield nothing.
pub fn collect_lines(items: &[LayoutItem]) -> Vec<Line> {
    let mut lines = Vec::new();
    for item in items {
        visit(item, &mut lines);
    }
    lines
}

fn visit(item: &LayoutItem, lines: &mut Vec<Line>) {
    match item {
        LayoutItem::TextBox(children) => {
            for child in children {
                visit(child, lines);
            }
        }
        LayoutItem::TextLine(children) => {
            let mut glyphs = Vec::new();
            gather_glyphs(children, &mut glyphs);
            lines.push(Line::new(glyphs));
        }
        LayoutItem::Character(glyph) => lines.push(Line::new(vec![glyph.clone()])),
        LayoutItem::Image { .. } | LayoutItem::Other => {}
    }
}

fn gather_glyphs(items: &[LayoutItem], glyphs: &mut Vec<Glyph>) {
    for item in items {
        match item {
            LayoutItem::Character(glyph) => glyphs.push(glyph.clone()),
            LayoutItem::TextBox(children) | LayoutItem::TextLine(children) => {
                gather_glyphs(children, glyphs)
            }
            LayoutItem::Image { .. } | LayoutItem::Other => {}
        }
    }
}
