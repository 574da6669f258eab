//! Page and image markers: structured document → tagged Markdown.
//!
//! ## Output shape
//!
//! ```text
//! <PAGINA:001>
//!
//! First paragraph of page one.
//!
//! <IMAGEM:001>
//!
//! <PAGINA:002>
//!
//! <IMAGEM:002>
//! ```
//!
//! * Every page opens with `<PAGINA:nnn>` (1-based), including pages with no
//!   content at all.
//! * Every image gets `<IMAGEM:nnn>` in place. The counter runs across the
//!   whole document and never resets at a page boundary.
//! * Image references the engine left inside text blocks (`![alt](src)`,
//!   `<img ...>`, `[image ...]`, `[figura ...]`, ...) are replaced by markers
//!   from the same counter, in stream order.
//! * Numbers are zero-padded to three digits; wider numbers print in full
//!   (`<PAGINA:1000>`).
//!
//! Everything else passes through unchanged.

use crate::engine::{Block, ExtractedDocument};
use once_cell::sync::Lazy;
use regex::Regex;

/// `<PAGINA:nnn>`
pub fn page_marker(n: usize) -> String {
    format!("<PAGINA:{n:03}>")
}

/// `<IMAGEM:nnn>`
pub fn image_marker(n: usize) -> String {
    format!("<IMAGEM:{n:03}>")
}

/// Markdown image links, HTML `<img>` tags and bracketed figure placeholders.
///
/// Bracketed placeholders match by prefix (`[image_003.png]`, `[Figure2]`,
/// `[imagem 4]`). `<img\b` keeps the pattern from matching an
/// already-inserted `<IMAGEM:`.
static RE_IMAGE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)!\[[^\]]*\]\([^)]+\)|<img\b[^>]*>|\[(?:image|figure|figura)[^\]]*\]",
    )
    .unwrap()
});

/// Markdown plus the counts that went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedDocument {
    pub markdown: String,
    /// Pages emitted (one `<PAGINA>` each).
    pub pages: usize,
    /// Images emitted (one `<IMAGEM>` each).
    pub images: usize,
}

struct MarkerWriter {
    out: String,
    images: usize,
}

impl MarkerWriter {
    fn next_image(&mut self) -> String {
        self.images += 1;
        image_marker(self.images)
    }

    fn replace_refs(&mut self, text: &str) -> String {
        RE_IMAGE_REF
            .replace_all(text, |_: &regex::Captures| self.next_image())
            .into_owned()
    }

    fn push_section(&mut self, section: &str) {
        if !self.out.is_empty() {
            self.out.push_str("\n\n");
        }
        self.out.push_str(section);
    }
}

/// Render `doc` as Markdown with page and image markers.
pub fn render(doc: &ExtractedDocument) -> MarkedDocument {
    let mut w = MarkerWriter {
        out: String::new(),
        images: 0,
    };

    for (idx, page) in doc.pages.iter().enumerate() {
        w.push_section(&page_marker(idx + 1));

        for block in &page.blocks {
            let rendered = match block {
                Block::Text(text) => w.replace_refs(text),
                Block::Table(table) => table.to_markdown(),
                Block::Image => w.next_image(),
            };
            let rendered = rendered.trim_end_matches(['\n', '\r']);
            if !rendered.trim().is_empty() {
                w.push_section(rendered);
            }
        }
    }

    let mut markdown = w.out;
    markdown.push('\n');
    MarkedDocument {
        markdown,
        pages: doc.pages.len(),
        images: w.images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ExtractedPage, Table};

    fn doc(pages: Vec<Vec<Block>>) -> ExtractedDocument {
        ExtractedDocument::new(pages.into_iter().map(ExtractedPage::new).collect())
    }

    #[test]
    fn three_pages_two_images() {
        let d = doc(vec![
            vec![Block::text("Intro"), Block::image()],
            vec![Block::text("Body")],
            vec![Block::image(), Block::text("End")],
        ]);
        let marked = render(&d);
        assert_eq!(
            marked.markdown,
            "<PAGINA:001>\n\nIntro\n\n<IMAGEM:001>\n\n<PAGINA:002>\n\nBody\n\n\
<PAGINA:003>\n\n<IMAGEM:002>\n\nEnd\n"
        );
        assert_eq!(marked.pages, 3);
        assert_eq!(marked.images, 2);
    }

    #[test]
    fn image_counter_does_not_reset_per_page() {
        let d = doc(vec![
            vec![Block::image(), Block::image()],
            vec![Block::image()],
        ]);
        let md = render(&d).markdown;
        assert!(md.contains("<PAGINA:002>\n\n<IMAGEM:003>"));
        assert!(!md.contains("<IMAGEM:004>"));
    }

    #[test]
    fn empty_page_still_gets_marker() {
        let d = doc(vec![vec![], vec![Block::text("   ")], vec![Block::text("x")]]);
        let md = render(&d).markdown;
        assert_eq!(md, "<PAGINA:001>\n\n<PAGINA:002>\n\n<PAGINA:003>\n\nx\n");
    }

    #[test]
    fn inline_references_use_the_same_counter() {
        let d = doc(vec![vec![
            Block::image(),
            Block::text("See ![chart](img/c.png) and <img src=\"a.jpg\"/> then [Figura 3: mapa]."),
            Block::image(),
        ]]);
        let md = render(&d).markdown;
        assert!(md.contains("See <IMAGEM:002> and <IMAGEM:003> then <IMAGEM:004>."));
        assert!(md.contains("<IMAGEM:005>"));
        assert_eq!(render(&d).images, 5);
    }

    #[test]
    fn ordinary_brackets_and_links_pass_through() {
        let text = "A [link](http://x.y) and [imaginary] [note 3] text";
        let d = doc(vec![vec![Block::text(text)]]);
        let marked = render(&d);
        assert!(marked
            .markdown
            .contains("A [link](http://x.y) and [imaginary] [note 3] text"));
        assert_eq!(marked.images, 0);
    }

    #[test]
    fn bracket_placeholders_match_by_prefix() {
        let d = doc(vec![vec![
            Block::text("[image_003.png]"),
            Block::text("[Figure2] and [figuras]"),
            Block::text("[image1] [Imagem 7]"),
        ]]);
        let marked = render(&d);
        assert_eq!(
            marked.markdown,
            "<PAGINA:001>\n\n<IMAGEM:001>\n\n<IMAGEM:002> and <IMAGEM:003>\n\n\
<IMAGEM:004> <IMAGEM:005>\n"
        );
        assert_eq!(marked.images, 5);
    }

    #[test]
    fn tables_render_in_place() {
        let table = Table {
            rows: vec![vec!["a".into(), "b".into()], vec!["1".into(), "2".into()]],
        };
        let d = doc(vec![vec![Block::text("Before"), Block::Table(table)]]);
        assert_eq!(
            render(&d).markdown,
            "<PAGINA:001>\n\nBefore\n\n| a | b |\n| --- | --- |\n| 1 | 2 |\n"
        );
    }

    #[test]
    fn wide_numbers_are_not_truncated() {
        assert_eq!(page_marker(7), "<PAGINA:007>");
        assert_eq!(page_marker(1000), "<PAGINA:1000>");
        assert_eq!(image_marker(42), "<IMAGEM:042>");
    }

    #[test]
    fn empty_document_is_a_single_newline() {
        let marked = render(&ExtractedDocument::default());
        assert_eq!(marked.markdown, "\n");
        assert_eq!(marked.pages, 0);
    }

    #[test]
    fn text_whitespace_inside_blocks_is_kept() {
        let d = doc(vec![vec![Block::text("    code line\n")]]);
        assert_eq!(render(&d).markdown, "<PAGINA:001>\n\n    code line\n");
    }
}
