//! Per-page preparation: blank-line filtering, reading order, and removal of
//! running headers/footers.

use std::sync::OnceLock;

use regex::Regex;

use super::LINE_TOLERANCE;
use crate::types::{Line, Page};

/// Drop lines that carry no visible text.
pub fn filter_blank(lines: Vec<Line>) -> Vec<Line> {
    lines.into_iter().filter(|line| !line.is_blank()).collect()
}

/// Stable sort into reading order: top-to-bottom, then left-to-right.
///
/// After ordering by `y0`, lines are grouped into rows. A row is opened by
/// its highest line and takes every following line whose `y0` lies within
/// [`LINE_TOLERANCE`] of that anchor. Each row is then ordered by `x0`.
pub fn sort_reading_order(lines: &mut [Line]) {
    lines.sort_by(|a, b| b.y0().total_cmp(&a.y0()));

    let mut start = 0;
    while start < lines.len() {
        let anchor = lines[start].y0();
        let end = lines[start..]
            .iter()
            .position(|line| anchor - line.y0() > LINE_TOLERANCE)
            .map_or(lines.len(), |n| start + n);
        lines[start..end].sort_by(|a, b| a.x0().total_cmp(&b.x0()));
        start = end;
    }
}

/// `Case … Document 12 Filed … Page 3 of 9` as stamped by court e-filing.
///
/// The line must end at the page count. Stamps that carry more text after
/// it, such as `Page 3 of 9 PageID #: 123`, are not matched.
pub fn is_docket_stamp(text: &str) -> bool {
    static RE_DOCKET: OnceLock<Regex> = OnceLock::new();
    let re = RE_DOCKET.get_or_init(|| {
        Regex::new(r"^\s*Case\b.*\bDocument\s+\d+\b.*\bFiled\b.*\bPage\s+\d+\s+of\s+\d+\s*$")
            .unwrap()
    });
    re.is_match(text)
}

/// A bare page number, optionally labelled: `3`, `Page 3`, ` page  12 `.
pub fn is_page_number(text: &str) -> bool {
    static RE_PAGE: OnceLock<Regex> = OnceLock::new();
    let re = RE_PAGE.get_or_init(|| Regex::new(r"(?i)^\s*(?:page\s*)?\d+\s*$").unwrap());
    re.is_match(text)
}

/// Remove a docket stamp in first position and a page number in last
/// position. Both positions are judged on the incoming sequence; nothing in
/// between is ever removed.
pub fn suppress_running_lines(mut lines: Vec<Line>) -> Vec<Line> {
    let Some(last) = lines.len().checked_sub(1) else {
        return lines;
    };

    let drop_last = is_page_number(&lines[last].text());
    let drop_first = is_docket_stamp(&lines[0].text());

    if drop_last {
        let footer = lines.remove(last);
        log::debug!("suppressed page footer {:?}", footer.text());
    }
    if drop_first && !(drop_last && last == 0) {
        let header = lines.remove(0);
        log::debug!("suppressed docket stamp {:?}", header.text());
    }
    lines
}

/// Filter, order and strip one page, yielding the lines that take part in
/// paragraph reconstruction.
pub fn prepare_page(page: Page) -> Vec<Line> {
    let total = page.lines.len();
    let mut lines = filter_blank(page.lines);
    sort_reading_order(&mut lines);
    let lines = suppress_running_lines(lines);
    log::debug!(
        "page {}: {} extracted lines, {} kept",
        page.number,
        total,
        lines.len()
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Glyph;

    fn line(text: &str, x0: f32, y0: f32) -> Line {
        let glyphs = text
            .chars()
            .enumerate()
            .map(|(i, c)| Glyph::new(c.to_string(), "Times-Roman", x0 + i as f32 * 6.0, y0))
            .collect();
        Line::new(glyphs)
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(Line::text).collect()
    }

    const STAMP: &str = "Case 1:20-cv-01234-ABC Document 45 Filed 03/04/21 Page 2 of 12";

    // =====================================================================
    // filter_blank
    // =====================================================================

    #[test]
    fn test_filter_blank_drops_whitespace_lines() {
        let lines = vec![
            line("Body", 72.0, 700.0),
            line("   ", 72.0, 690.0),
            Line::new(vec![]),
            line(" x ", 72.0, 680.0),
        ];
        assert_eq!(texts(&filter_blank(lines)), vec!["Body", " x "]);
    }

    #[test]
    fn test_filter_blank_idempotent() {
        let lines = vec![
            line("one", 72.0, 700.0),
            line("\t", 72.0, 690.0),
            line("two", 72.0, 680.0),
        ];
        let once = filter_blank(lines);
        let twice = filter_blank(once.clone());
        assert_eq!(once, twice);
    }

    // =====================================================================
    // sort_reading_order
    // =====================================================================

    #[test]
    fn test_sort_top_to_bottom() {
        let mut lines = vec![
            line("bottom", 72.0, 100.0),
            line("top", 72.0, 700.0),
            line("middle", 72.0, 400.0),
        ];
        sort_reading_order(&mut lines);
        assert_eq!(texts(&lines), vec!["top", "middle", "bottom"]);
    }

    #[test]
    fn test_sort_same_row_left_to_right() {
        let mut lines = vec![
            line("right", 300.0, 701.0),
            line("left", 72.0, 697.0),
        ];
        sort_reading_order(&mut lines);
        assert_eq!(texts(&lines), vec!["left", "right"]);
    }

    #[test]
    fn test_sort_row_straddling_multiple_of_tolerance() {
        // 696 = 58 * 12; the two lines are 0.4 apart.
        let mut lines = vec![
            line("right", 300.0, 696.2),
            line("left", 72.0, 695.8),
        ];
        sort_reading_order(&mut lines);
        assert_eq!(texts(&lines), vec!["left", "right"]);
    }

    #[test]
    fn test_sort_row_measured_from_its_first_line() {
        // 690 is within 12 of 700 and joins its row; 680 is 20 below the
        // anchor and starts the next one, even though it is within 12 of 690.
        let mut lines = vec![
            line("c", 72.0, 680.0),
            line("b", 72.0, 690.0),
            line("d", 300.0, 678.0),
            line("a", 300.0, 700.0),
        ];
        sort_reading_order(&mut lines);
        assert_eq!(texts(&lines), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_sort_tolerance_is_inclusive() {
        let mut lines = vec![line("right", 300.0, 700.0), line("left", 72.0, 688.0)];
        sort_reading_order(&mut lines);
        assert_eq!(texts(&lines), vec!["left", "right"]);
    }

    #[test]
    fn test_sort_stable_for_identical_positions() {
        let mut lines = vec![line("first", 72.0, 700.0), line("second", 72.0, 700.0)];
        sort_reading_order(&mut lines);
        assert_eq!(texts(&lines), vec!["first", "second"]);
    }

    // =====================================================================
    // pattern matchers
    // =====================================================================

    #[test]
    fn test_docket_stamp_pattern() {
        assert!(is_docket_stamp(STAMP));
        assert!(is_docket_stamp(&format!("   {}  ", STAMP)));
        assert!(is_docket_stamp(
            "Case 22-10964-mg Doc Document 1 Filed 07/13/22 Entered Page 1 of 3"
        ));
        assert!(!is_docket_stamp(&STAMP.replace("Case", "case")));
        assert!(!is_docket_stamp("Case law holds that the Document was Filed"));
        assert!(!is_docket_stamp("The Case Document 4 Filed today Page 1 of 2"));
    }

    #[test]
    fn test_docket_stamp_with_trailing_page_id_not_matched() {
        assert!(!is_docket_stamp(&format!("{} PageID #: 123", STAMP)));
    }

    #[test]
    fn test_page_number_pattern() {
        assert!(is_page_number("3"));
        assert!(is_page_number("  17 "));
        assert!(is_page_number("Page 4"));
        assert!(is_page_number("PAGE 4"));
        assert!(is_page_number("page  12"));
        assert!(!is_page_number("Page four"));
        assert!(!is_page_number("3 of 12"));
        assert!(!is_page_number("- 3 -"));
    }

    // =====================================================================
    // suppress_running_lines
    // =====================================================================

    #[test]
    fn test_suppress_first_and_last() {
        let lines = vec![
            line(STAMP, 72.0, 760.0),
            line("Body", 72.0, 700.0),
            line("2", 300.0, 40.0),
        ];
        assert_eq!(texts(&suppress_running_lines(lines)), vec!["Body"]);
    }

    #[test]
    fn test_suppress_is_positional() {
        let lines = vec![
            line("Body one", 72.0, 700.0),
            line(STAMP, 72.0, 680.0),
            line("Body two", 72.0, 660.0),
        ];
        let kept = suppress_running_lines(lines);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[1].text(), STAMP);
    }

    #[test]
    fn test_middle_page_number_retained() {
        let lines = vec![
            line("Body", 72.0, 700.0),
            line("12", 72.0, 680.0),
            line("More", 72.0, 660.0),
        ];
        assert_eq!(suppress_running_lines(lines).len(), 3);
    }

    #[test]
    fn test_docket_stamp_last_is_kept() {
        let lines = vec![line("Body", 72.0, 700.0), line(STAMP, 72.0, 30.0)];
        assert_eq!(suppress_running_lines(lines).len(), 2);
    }

    #[test]
    fn test_single_line_page() {
        assert!(suppress_running_lines(vec![line("9", 300.0, 40.0)]).is_empty());
        assert!(suppress_running_lines(vec![line(STAMP, 72.0, 760.0)]).is_empty());
        assert_eq!(
            suppress_running_lines(vec![line("Only", 72.0, 700.0)]).len(),
            1
        );
    }

    #[test]
    fn test_suppress_empty() {
        assert!(suppress_running_lines(vec![]).is_empty());
    }

    // =====================================================================
    // prepare_page
    // =====================================================================

    #[test]
    fn test_prepare_page_sorts_before_suppressing() {
        // Extraction order puts the footer first and the stamp last.
        let page = Page::new(
            2,
            vec![
                line("2", 300.0, 40.0),
                line("Body", 72.0, 700.0),
                line("  ", 72.0, 720.0),
                line(STAMP, 72.0, 760.0),
            ],
        );
        assert_eq!(texts(&prepare_page(page)), vec!["Body"]);
    }
}
