use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use memo2epub_core::epub::EpubBook;
use memo2epub_core::fingerprint::fingerprint_file;
use memo_pdf::layout;
use memo_pdf::render::MarkupEmitter;
use memo_pdf::{Document, Page};

use crate::prelude::*;

/// What a finished conversion produced.
#[derive(Debug)]
pub struct Summary {
    pub pages: usize,
    pub identifier: String,
}

/// Convert the PDF at `input` into an EPUB written to `out`.
///
/// The input is read twice: once streamed page by page through layout
/// reconstruction, then again for the fingerprint.
pub fn run(input: &Path, out: &Path) -> Result<Summary> {
    let document =
        Document::open(input).wrap_err_with(|| f!("failed to open {}", input.display()))?;
    log::info!("{}: {} pages", input.display(), document.page_count());

    let mut pages = 0;
    let markup = render_pages(document.pages().inspect(|page| {
        if page.is_ok() {
            pages += 1;
        }
    }))
    .wrap_err_with(|| f!("failed to extract text from {}", input.display()))?;

    let identifier = fingerprint_file(input)
        .wrap_err_with(|| f!("failed to fingerprint {}", input.display()))?;
    log::info!("fingerprint {}", identifier);

    write_book(&EpubBook::new(identifier.clone(), markup), out)?;
    log::info!("wrote {}", out.display());

    Ok(Summary { pages, identifier })
}

/// Reconstruct streamed pages and emit the chapter fragment.
pub fn render_pages<I, E>(pages: I) -> std::result::Result<String, E>
where
    I: IntoIterator<Item = std::result::Result<Page, E>>,
{
    let mut emitter = MarkupEmitter::new();
    layout::reconstruct(pages, |token| emitter.push(token))?;
    Ok(emitter.finish())
}

fn write_book(book: &EpubBook, out: &Path) -> Result<()> {
    let file = File::create(out).wrap_err_with(|| f!("failed to create {}", out.display()))?;
    book.write_to(BufWriter::new(file))
        .wrap_err_with(|| f!("failed to write {}", out.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::io::Read;

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use memo_pdf::{Glyph, Line};
    use zip::ZipArchive;

    const STAMP: &str = "Case 1:21-cv-00555-XYZ Document 17 Filed 09/09/21 Page 3 of 14";

    fn line(font: &str, text: &str, x0: f32, y0: f32) -> Line {
        let glyphs = text
            .chars()
            .enumerate()
            .map(|(i, c)| Glyph::new(c.to_string(), font, x0 + i as f32 * 6.0, y0))
            .collect();
        Line::new(glyphs)
    }

    /// Single-page PDF; each run is `(bold, x, y, text)`.
    fn build_pdf(runs: &[(bool, i64, i64, &str)]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Bold",
        });

        let mut operations: Vec<Operation> = Vec::new();
        for (is_bold, x, y, text) in runs {
            let font = if *is_bold { "F2" } else { "F1" };
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![font.into(), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(*x), Object::Integer(*y)]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => regular, "F2" => bold },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            }),
        );
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn read_entry(path: &Path, name: &str) -> String {
        let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut out = String::new();
        zip.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    // =====================================================================
    // render_pages
    // =====================================================================

    #[test]
    fn test_render_pages_fragment() {
        let page = Page::new(
            3,
            vec![
                line("Times-Roman", STAMP, 72.0, 760.0),
                line("Times-Bold", "I. BACKGROUND", 72.0, 712.0),
                line("Times-Roman", "The motion was filed.", 72.0, 690.0),
                line("Times-Roman", "It was denied.", 72.0, 680.0),
                line("Times-Roman", "3", 306.0, 36.0),
            ],
        );
        let markup = render_pages([Ok::<_, Infallible>(page)]).unwrap();
        assert_eq!(
            markup,
            "<h1>\nI. BACKGROUND\n</h1>\n<p>\nThe motion was filed.\nIt was denied.\n</p>\n"
        );
    }

    #[test]
    fn test_render_pages_empty_document() {
        let markup = render_pages(Vec::<std::result::Result<Page, Infallible>>::new()).unwrap();
        assert_eq!(markup, "");
    }

    #[test]
    fn test_render_pages_propagates_page_error() {
        let pages = vec![
            Ok(Page::new(1, vec![line("Times-Roman", "text", 72.0, 700.0)])),
            Err("bad page"),
        ];
        assert_eq!(render_pages(pages), Err("bad page"));
    }

    // =====================================================================
    // run
    // =====================================================================

    #[test]
    fn test_run_writes_epub() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.pdf");
        let out = dir.path().join("memo.epub");
        std::fs::write(
            &input,
            build_pdf(&[
                (false, 72, 760, STAMP),
                (true, 72, 712, "I. BACKGROUND"),
                (false, 72, 690, "Plaintiff sued in 2021."),
                (false, 72, 680, "Defendant moved to dismiss."),
                (false, 306, 36, "3"),
            ]),
        )
        .unwrap();

        let summary = run(&input, &out).unwrap();
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.identifier, fingerprint_file(&input).unwrap());

        let chapter = read_entry(&out, "EPUB/chap_01.xhtml");
        assert!(chapter.contains(
            "<h1>\nI. BACKGROUND\n</h1>\n<p>\nPlaintiff sued in 2021.\nDefendant moved to dismiss.\n</p>\n"
        ));
        assert!(!chapter.contains("Document 17"));

        let opf = read_entry(&out, "EPUB/content.opf");
        assert!(opf.contains(&summary.identifier));
        assert!(opf.contains("<dc:title>Legal Memo</dc:title>"));
    }

    #[test]
    fn test_run_is_deterministic_in_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.pdf");
        std::fs::write(&input, build_pdf(&[(false, 72, 700, "Body")])).unwrap();

        let first = run(&input, &dir.path().join("a.epub")).unwrap();
        let second = run(&input, &dir.path().join("b.epub")).unwrap();
        assert_eq!(first.identifier, second.identifier);
    }

    #[test]
    fn test_run_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("memo.epub");
        let err = run(&dir.path().join("missing.pdf"), &out).unwrap_err();
        assert!(f!("{err}").contains("failed to open"));
        assert!(!out.exists());
    }

    #[test]
    fn test_run_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.pdf");
        std::fs::write(&input, b"plain text, not a PDF").unwrap();
        assert!(run(&input, &dir.path().join("notes.epub")).is_err());
    }

    #[test]
    fn test_run_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.pdf");
        std::fs::write(&input, build_pdf(&[(false, 72, 700, "Body")])).unwrap();
        let out = dir.path().join("no-such-dir").join("memo.epub");
        let err = run(&input, &out).unwrap_err();
        assert!(f!("{err}").contains("failed to create"));
    }
}
