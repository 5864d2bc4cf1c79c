//! Content-stream walking: PDF operators in, positioned glyphs out.
//!
//! A simplified text-rendering state machine turns one page's operations
//! into a [`LayoutItem`] tree. Text objects become `TextBox`es, glyphs on a
//! shared baseline become `TextLine`s, painted XObjects become `Image`s.
//!
//! ```text
//! content ops  ->  LayoutItem tree  ->  Line[]
//!   (per page)      extract_page_items   items::collect_lines
//! ```

use super::backend::{get_number_from_value, BackendFontInfo, PageId, PdfBackend, PdfValue};
use super::items::{collect_lines, LayoutItem};
use crate::types::{Glyph, Page};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Glyphs whose baselines differ by more than this start a new line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate character width as a fraction of font size; no glyph metrics
/// are read from the font program.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Minimum horizontal gap (points) between two glyphs before a space is
/// inserted between them.
const MIN_WORD_GAP: f32 = 1.5;

/// A TJ kerning displacement larger than this fraction of a character width
/// is read as a word break.
const KERN_SPACE_FRACTION: f32 = 0.3;

/// The identity 2x3 matrix: [a, b, c, d, e, f].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource key (`/F1`-style).
    font_key: Vec<u8>,
    /// Resolved base-font name for the current font.
    font_name: String,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// Horizontal scaling factor (percent / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
    /// Current transformation matrix, saved and restored by `q` / `Q`.
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
            ctm: IDENTITY_MATRIX,
            ctm_stack: Vec::new(),
        }
    }
}

/// `m1 × m2` for PDF 2x3 matrices.
fn multiply(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn apply(m: &[f32; 6], x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

impl TextState {
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Td / TD: translate the line matrix and reset the text matrix to it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn char_width(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    /// Build the glyph for `text` at the current position, mapped to page
    /// space through the text matrix and the CTM.
    fn glyph_at(&self, text: &str, width: f32) -> Glyph {
        let render = multiply(&self.text_matrix, &self.ctm);
        let (ax, ay) = apply(&render, 0.0, self.text_rise);
        let (bx, by) = apply(&render, width, self.text_rise + self.font_size);
        Glyph::new(text, self.font_name.clone(), ax.min(bx), ay.min(by))
            .with_extent(ax.max(bx), ay.max(by))
    }
}

/// Resolve a font resource key to its [`BackendFontInfo`].
fn resolve_font<'a>(key: &[u8], fonts: &'a [BackendFontInfo]) -> Option<&'a BackendFontInfo> {
    fonts.iter().find(|info| info.name == key)
}

fn decode_string(
    val: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    font_key: &[u8],
) -> String {
    match val {
        PdfValue::Str(bytes) => {
            let decoded = backend.decode_text(page_id, font_key, bytes);
            if decoded.is_empty() {
                super::backend::decode_text_simple(bytes)
            } else {
                decoded
            }
        }
        _ => String::new(),
    }
}

fn numbers(operands: &[PdfValue], n: usize) -> Option<Vec<f32>> {
    let vals: Vec<f32> = operands
        .iter()
        .take(n)
        .filter_map(get_number_from_value)
        .collect();
    (vals.len() == n).then_some(vals)
}

fn matrix(operands: &[PdfValue]) -> Option<[f32; 6]> {
    numbers(operands, 6).map(|v| [v[0], v[1], v[2], v[3], v[4], v[5]])
}

// ---------------------------------------------------------------------------
// Internal: tree assembly
// ---------------------------------------------------------------------------

/// Accumulates the item tree while the state machine runs.
#[derive(Default)]
struct TreeBuilder {
    items: Vec<LayoutItem>,
    open_box: Option<Vec<LayoutItem>>,
    line: Vec<Glyph>,
}

impl TreeBuilder {
    fn begin_box(&mut self) {
        self.end_box();
        self.open_box = Some(Vec::new());
    }

    fn end_box(&mut self) {
        self.flush_line();
        if let Some(lines) = self.open_box.take() {
            if !lines.is_empty() {
                self.items.push(LayoutItem::TextBox(lines));
            }
        }
    }

    fn push_glyph(&mut self, glyph: Glyph) {
        let breaks = self
            .line
            .last()
            .is_some_and(|prev| (prev.y0 - glyph.y0).abs() > Y_TOLERANCE);
        if breaks {
            self.flush_line();
        }
        self.line.push(glyph);
    }

    fn push_item(&mut self, item: LayoutItem) {
        self.end_box();
        self.items.push(item);
    }

    fn flush_line(&mut self) {
        if self.line.is_empty() {
            return;
        }
        let glyphs = assemble_line(std::mem::take(&mut self.line));
        let line = LayoutItem::TextLine(glyphs.into_iter().map(LayoutItem::Character).collect());
        // Text shown outside BT/ET still lands in a box of its own.
        self.open_box.get_or_insert_with(Vec::new).push(line);
    }

    fn finish(mut self) -> Vec<LayoutItem> {
        self.end_box();
        self.items
    }
}

/// Order a line's glyphs left to right and insert space glyphs across word
/// gaps. A space takes the font of the glyph before it.
fn assemble_line(mut glyphs: Vec<Glyph>) -> Vec<Glyph> {
    glyphs.sort_by(|a, b| a.x0.total_cmp(&b.x0));

    let mut out: Vec<Glyph> = Vec::with_capacity(glyphs.len());
    for glyph in glyphs {
        if let Some(prev) = out.last() {
            let gap = glyph.x0 - prev.x1;
            if gap >= MIN_WORD_GAP && !prev.is_whitespace() && !glyph.is_whitespace() {
                let space = Glyph::new(" ", prev.font_name.clone(), prev.x1, prev.y0)
                    .with_extent(glyph.x0, prev.y1);
                out.push(space);
            }
        }
        out.push(glyph);
    }
    out
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Walk a single page's content stream and build its layout tree.
///
/// | Operator | Action |
/// |----------|--------|
/// | `q` `Q` `cm` | Save / restore / concatenate the CTM |
/// | `BT` `ET` | Open / close a text box |
/// | `Tf` | Set font and size |
/// | `Tm` `Td` `TD` `T*` `TL` | Position the text cursor |
/// | `Tc` `Tw` `Tz` `Ts` | Spacing, scaling, rise |
/// | `Tj` `TJ` `'` `"` | Show text |
/// | `Do` | Paint an XObject (recorded as an image) |
/// | `sh` `BI` | Shading / inline image (recorded as other) |
pub fn extract_page_items(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<LayoutItem>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();

    let mut state = TextState::default();
    let mut tree = TreeBuilder::default();

    for op in &ops {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.ctm_stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix(operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }

            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
                tree.begin_box();
            }
            "ET" => tree.end_box(),

            "Tf" => handle_tf(operands, &fonts, &mut state),

            "Tm" => {
                if let Some(m) = matrix(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" => {
                if let Some(v) = numbers(operands, 2) {
                    state.translate_line(v[0], v[1]);
                }
            }
            "TD" => {
                if let Some(v) = numbers(operands, 2) {
                    state.leading = -v[1];
                    state.translate_line(v[0], v[1]);
                }
            }
            "T*" => state.next_line(),
            "TL" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    state.leading = v;
                }
            }

            "Tc" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    state.text_rise = v;
                }
            }

            "Tj" => {
                if let Some(first) = operands.first() {
                    let text = decode_string(first, backend, page_id, &state.font_key);
                    show_text(&text, &mut state, &mut tree);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = operands.first() {
                    handle_tj_array(arr, backend, page_id, &mut state, &mut tree);
                }
            }
            "'" => {
                state.next_line();
                if let Some(first) = operands.first() {
                    let text = decode_string(first, backend, page_id, &state.font_key);
                    show_text(&text, &mut state, &mut tree);
                }
            }
            "\"" => {
                // aw ac string  =>  Tw, Tc, T*, Tj
                if operands.len() >= 3 {
                    if let Some(aw) = get_number_from_value(&operands[0]) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = get_number_from_value(&operands[1]) {
                        state.char_spacing = ac;
                    }
                    state.next_line();
                    let text = decode_string(&operands[2], backend, page_id, &state.font_key);
                    show_text(&text, &mut state, &mut tree);
                }
            }

            "Do" => {
                if let Some(PdfValue::Name(name)) = operands.first() {
                    tree.push_item(LayoutItem::Image {
                        name: String::from_utf8_lossy(name).into_owned(),
                    });
                }
            }
            "sh" | "BI" => tree.push_item(LayoutItem::Other),

            _ => {}
        }
    }

    Ok(tree.finish())
}

/// Extract one page as [`Line`](crate::Line)s in extraction order.
pub fn extract_page(
    backend: &dyn PdfBackend,
    number: usize,
    page_id: PageId,
) -> Result<Page, PdfError> {
    let items = extract_page_items(backend, page_id)?;
    Ok(Page::new(number, collect_lines(&items)))
}

fn handle_tf(operands: &[PdfValue], fonts: &[BackendFontInfo], state: &mut TextState) {
    if operands.len() < 2 {
        return;
    }
    let key = match &operands[0] {
        PdfValue::Name(n) | PdfValue::Str(n) => n.clone(),
        _ => return,
    };
    state.font_size = get_number_from_value(&operands[1]).unwrap_or(0.0);
    state.font_name = resolve_font(&key, fonts)
        .and_then(|info| info.base_font.clone())
        .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());
    state.font_key = key;
}

/// Emit one glyph per character of `text`, advancing the cursor.
fn show_text(text: &str, state: &mut TextState, tree: &mut TreeBuilder) {
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let width = state.char_width();
        tree.push_glyph(state.glyph_at(ch.encode_utf8(&mut buf), width));

        let mut dx = width + state.char_spacing;
        if ch == ' ' {
            dx += state.word_spacing;
        }
        state.advance_x(dx);
    }
}

/// `TJ` arrays mix strings with kerning adjustments in thousandths of a
/// text-space unit; a large enough adjustment reads as a word space.
fn handle_tj_array(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    tree: &mut TreeBuilder,
) {
    let mut last_was_space = true;
    for elem in arr {
        match elem {
            PdfValue::Str(_) => {
                let fragment = decode_string(elem, backend, page_id, &state.font_key);
                if let Some(last) = fragment.chars().next_back() {
                    last_was_space = last.is_whitespace();
                }
                show_text(&fragment, state, tree);
            }
            val => {
                if let Some(adj) = get_number_from_value(val) {
                    let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                    if dx > state.char_width() * KERN_SPACE_FRACTION && !last_was_space {
                        tree.push_glyph(state.glyph_at(" ", dx));
                        last_was_space = true;
                    }
                    state.advance_x(dx);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
