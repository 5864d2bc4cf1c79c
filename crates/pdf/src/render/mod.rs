pub mod markup;

pub use markup::{render_tokens, MarkupEmitter};
