//! Paragraph and heading reconstruction from line geometry.
//!
//! Pages are prepared one at a time ([`prepare_page`]: blank filtering,
//! reading order, running header/footer removal) and their surviving lines
//! are folded, in order, through a single [`FoldState`] spanning the whole
//! document.
//!
//! ```text
//! Page -> prepare_page -> Line[] --+
//! Page -> prepare_page -> Line[] --+--> FoldState::step ... finish -> Token stream
//! ```

pub mod classify;
pub mod fold;
pub mod order;

pub use classify::{heading_level, starts_numbered_item};
pub use fold::FoldState;
pub use order::{
    filter_blank, is_docket_stamp, is_page_number, prepare_page, sort_reading_order,
    suppress_running_lines,
};

use crate::types::{Page, Token};

/// Vertical distance (points) under which two lines share a visual row, and
/// horizontal distance beyond which a left edge counts as indented.
pub const LINE_TOLERANCE: f32 = 12.0;

/// Reconstruct the token stream of a streamed document.
///
/// Each page is pulled, prepared, folded and dropped before the next one is
/// requested. The first page error aborts the run.
pub fn reconstruct<I, E, F>(pages: I, mut sink: F) -> Result<(), E>
where
    I: IntoIterator<Item = Result<Page, E>>,
    F: FnMut(Token),
{
    let state = pages
        .into_iter()
        .try_fold(FoldState::default(), |state, page| {
            let lines = prepare_page(page?);
            Ok::<_, E>(
                lines
                    .iter()
                    .fold(state, |state, line| state.step(line, &mut sink)),
            )
        })?;
    state.finish(&mut sink);
    Ok(())
}

/// Reconstruct already-extracted pages into a token vector.
pub fn reconstruct_pages(pages: impl IntoIterator<Item = Page>) -> Vec<Token> {
    let mut tokens = Vec::new();
    let result: Result<(), std::convert::Infallible> =
        reconstruct(pages.into_iter().map(Ok), |t| tokens.push(t));
    match result {
        Ok(()) => tokens,
        Err(never) => match never {},
    }
}
