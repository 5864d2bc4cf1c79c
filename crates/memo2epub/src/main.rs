use std::path::PathBuf;

use crate::prelude::{println, *};
use clap::Parser;

mod convert;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Rebuild the paragraphs and headings of a court-filed legal memorandum and package them as an EPUB book"
)]
pub struct App {
    /// Path to the source PDF
    input: PathBuf,

    /// Path of the EPUB file to write
    #[arg(long)]
    out: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    let summary = convert::run(&app.input, &app.out)?;
    println!(
        "{} ({} pages, id {})",
        app.out.display(),
        summary.pages,
        summary.identifier
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        App::command().debug_assert();
    }

    #[test]
    fn test_parses_input_and_out() {
        let app = App::try_parse_from(["memo2epub", "memo.pdf", "--out", "memo.epub"]).unwrap();
        assert_eq!(app.input, PathBuf::from("memo.pdf"));
        assert_eq!(app.out, PathBuf::from("memo.epub"));
    }

    #[test]
    fn test_out_is_required() {
        assert!(App::try_parse_from(["memo2epub", "memo.pdf"]).is_err());
    }

    #[test]
    fn test_input_is_required() {
        assert!(App::try_parse_from(["memo2epub", "--out", "memo.epub"]).is_err());
    }

    #[test]
    fn test_unknown_flags_rejected() {
        assert!(App::try_parse_from([
            "memo2epub",
            "memo.pdf",
            "--out",
            "memo.epub",
            "--title",
            "X"
        ])
        .is_err());
    }
}
