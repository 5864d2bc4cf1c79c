//! EPUB 3 container assembly.
//!
//! An [`EpubBook`] holds the book metadata and its chapters as raw HTML
//! fragments. [`EpubBook::write_to`] lays out the archive:
//!
//! ```text
//! mimetype                 (stored, first entry)
//! META-INF/container.xml
//! EPUB/content.opf
//! EPUB/nav.xhtml
//! EPUB/toc.ncx
//! EPUB/<chapter>.xhtml
//! EPUB/style/default.css
//! ```
//!
//! Chapter fragments are parsed with an HTML5 parser and re-serialized so the
//! chapter documents are well-formed XHTML whatever the fragment contains.

use std::io::{self, Seek, Write};

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::Html;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DEFAULT_TITLE: &str = "Legal Memo";
pub const DEFAULT_AUTHOR: &str = "Unknown";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_CHAPTER_FILE: &str = "chap_01.xhtml";
pub const STYLESHEET_FILE: &str = "style/default.css";
pub const DEFAULT_STYLESHEET: &str = "body { font-family: serif; }";

const MIMETYPE: &str = "application/epub+zip";
const CONTENT_DIR: &str = "EPUB";

#[derive(Debug, Error)]
pub enum EpubError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// One XHTML document of the book.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    /// Path relative to the content directory, e.g. `chap_01.xhtml`.
    pub file_name: String,
    pub title: String,
    /// HTML fragment placed inside `<body>`.
    pub markup: String,
}

impl Chapter {
    pub fn new(
        file_name: impl Into<String>,
        title: impl Into<String>,
        markup: impl Into<String>,
    ) -> Self {
        Chapter {
            file_name: file_name.into(),
            title: title.into(),
            markup: markup.into(),
        }
    }
}

/// Entry of the table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TocLink {
    pub href: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct EpubBook {
    pub identifier: String,
    pub title: String,
    pub language: String,
    pub author: String,
    pub chapters: Vec<Chapter>,
    pub stylesheet: String,
    pub toc: Vec<TocLink>,
    pub modified: DateTime<Utc>,
}

impl EpubBook {
    /// A single-chapter book with placeholder metadata.
    pub fn new(identifier: impl Into<String>, markup: impl Into<String>) -> Self {
        let mut book = EpubBook {
            identifier: identifier.into(),
            title: DEFAULT_TITLE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            chapters: Vec::new(),
            stylesheet: DEFAULT_STYLESHEET.to_string(),
            toc: Vec::new(),
            modified: Utc::now(),
        };
        book.add_chapter(Chapter::new(DEFAULT_CHAPTER_FILE, DEFAULT_TITLE, markup));
        book
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = modified;
        self
    }

    /// Append a chapter to the spine and link it from the table of contents.
    pub fn add_chapter(&mut self, chapter: Chapter) {
        self.toc.push(TocLink {
            href: chapter.file_name.clone(),
            title: chapter.title.clone(),
        });
        self.chapters.push(chapter);
    }

    /// Write the complete archive to `writer`.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<(), EpubError> {
        let mut zip = ZipWriter::new(writer);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file("mimetype", stored)?;
        zip.write_all(MIMETYPE.as_bytes())?;

        let mut entries = vec![
            ("META-INF/container.xml".to_string(), render_container()),
            (content_path("content.opf"), self.render_opf()),
            (content_path("nav.xhtml"), self.render_nav()),
            (content_path("toc.ncx"), self.render_ncx()),
        ];
        for chapter in &self.chapters {
            entries.push((content_path(&chapter.file_name), self.render_chapter(chapter)));
        }
        entries.push((content_path(STYLESHEET_FILE), self.stylesheet.clone()));

        for (name, body) in entries {
            log::debug!("writing {} ({} bytes)", name, body.len());
            zip.start_file(name, SimpleFileOptions::default())?;
            zip.write_all(body.as_bytes())?;
        }

        zip.finish()?.flush()?;
        Ok(())
    }

    fn render_opf(&self) -> String {
        let mut manifest = String::new();
        let mut spine = String::from("    <itemref idref=\"nav\"/>\n");
        for (i, chapter) in self.chapters.iter().enumerate() {
            let id = chapter_id(i);
            manifest.push_str(&format!(
                "    <item href=\"{}\" id=\"{id}\" media-type=\"application/xhtml+xml\"/>\n",
                encode_double_quoted_attribute(&chapter.file_name)
            ));
            spine.push_str(&format!("    <itemref idref=\"{id}\"/>\n"));
        }

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="id" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="id">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:language>{language}</dc:language>
    <dc:creator id="creator">{author}</dc:creator>
    <meta property="dcterms:modified">{modified}</meta>
  </metadata>
  <manifest>
{manifest}    <item href="{css}" id="style_default" media-type="text/css"/>
    <item href="nav.xhtml" id="nav" media-type="application/xhtml+xml" properties="nav"/>
    <item href="toc.ncx" id="ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>
"#,
            identifier = encode_text(&self.identifier),
            title = encode_text(&self.title),
            language = encode_text(&self.language),
            author = encode_text(&self.author),
            modified = self.modified.format("%Y-%m-%dT%H:%M:%SZ"),
            css = STYLESHEET_FILE,
        )
    }

    fn render_nav(&self) -> String {
        let items: String = self
            .toc
            .iter()
            .map(|link| {
                format!(
                    "      <li><a href=\"{}\">{}</a></li>\n",
                    encode_double_quoted_attribute(&link.href),
                    encode_text(&link.title)
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
  <head>
    <title>{title}</title>
  </head>
  <body>
    <nav epub:type="toc" id="toc" role="doc-toc">
      <h2>{title}</h2>
      <ol>
{items}      </ol>
    </nav>
  </body>
</html>
"#,
            lang = encode_double_quoted_attribute(&self.language),
            title = encode_text(&self.title),
        )
    }

    fn render_ncx(&self) -> String {
        let points: String = self
            .toc
            .iter()
            .enumerate()
            .map(|(i, link)| {
                format!(
                    r#"    <navPoint id="{id}" playOrder="{order}">
      <navLabel>
        <text>{title}</text>
      </navLabel>
      <content src="{href}"/>
    </navPoint>
"#,
                    id = chapter_id(i),
                    order = i + 1,
                    title = encode_text(&link.title),
                    href = encode_double_quoted_attribute(&link.href),
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta content="{identifier}" name="dtb:uid"/>
    <meta content="1" name="dtb:depth"/>
    <meta content="0" name="dtb:totalPageCount"/>
    <meta content="0" name="dtb:maxPageNumber"/>
  </head>
  <docTitle>
    <text>{title}</text>
  </docTitle>
  <navMap>
{points}  </navMap>
</ncx>
"#,
            identifier = encode_double_quoted_attribute(&self.identifier),
            title = encode_text(&self.title),
        )
    }

    fn render_chapter(&self, chapter: &Chapter) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
  <head>
    <title>{title}</title>
    <link href="{css}" rel="stylesheet" type="text/css"/>
  </head>
  <body>
{body}
  </body>
</html>
"#,
            lang = encode_double_quoted_attribute(&self.language),
            title = encode_text(&chapter.title),
            css = stylesheet_href(&chapter.file_name),
            body = to_xhtml(&chapter.markup),
        )
    }
}

/// Re-serialize an HTML fragment as XHTML body content.
///
/// The HTML5 serializer escapes text and closes every element; the one
/// HTML-only entity it writes is `&nbsp;`. Characters XML does not allow
/// (C0 controls other than tab, newline and carriage return, and the
/// noncharacters U+FFFE and U+FFFF) are dropped.
pub fn to_xhtml(fragment: &str) -> String {
    let fragment: String = fragment.chars().filter(|&c| is_xml_char(c)).collect();
    Html::parse_fragment(&fragment)
        .root_element()
        .inner_html()
        .replace("&nbsp;", "&#160;")
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || !(c < ' ' || c == '\u{FFFE}' || c == '\u{FFFF}')
}

fn render_container() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{CONTENT_DIR}/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#
    )
}

fn content_path(name: &str) -> String {
    format!("{CONTENT_DIR}/{name}")
}

fn chapter_id(index: usize) -> String {
    format!("chapter_{}", index + 1)
}

/// Stylesheet path as seen from a chapter, which may sit in a subdirectory.
fn stylesheet_href(chapter_file: &str) -> String {
    let depth = chapter_file.matches('/').count();
    format!("{}{STYLESHEET_FILE}", "../".repeat(depth))
}
