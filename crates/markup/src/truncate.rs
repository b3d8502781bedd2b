//! Bounded-length, tag-safe text truncation.
//!
//! Listings and search-engine metadata show at most N whitespace-delimited
//! words of a post. For HTML input the cut must not leave markup dangling:
//! every tag still open at the cut point is closed, void elements are never
//! closed, and the ellipsis marker is attached to the final word so the
//! operation is idempotent past the limit.

/// Marker appended when a truncation actually removed words.
pub const ELLIPSIS: &str = "…";

/// Elements that never take a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Truncate plain text to at most `max_words` words. Input with `max_words`
/// words or fewer is returned unchanged, with no marker.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }
    let mut out = words[..max_words].join(" ");
    out.push_str(ELLIPSIS);
    out
}

/// Truncate HTML to at most `max_words` words of visible text, keeping the
/// markup well-formed. Words are runs of non-whitespace text between tags;
/// tags themselves are never counted.
pub fn truncate_html_words(html: &str, max_words: usize) -> String {
    let bytes = html.as_bytes();
    let mut open_tags: Vec<String> = Vec::new();
    let mut words = 0usize;
    let mut in_word = false;
    let mut last_word_end = 0usize;
    let mut cut = None;

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'<' {
            match html[i..].find('>') {
                Some(offset) => {
                    note_tag(&html[i + 1..i + offset], &mut open_tags);
                    i += offset + 1;
                }
                // Dangling '<' with no close: nothing tag-like follows.
                None => break,
            }
            in_word = false;
            continue;
        }
        if b.is_ascii_whitespace() {
            in_word = false;
            i += 1;
            continue;
        }
        if !in_word {
            if words == max_words {
                cut = Some(i);
                break;
            }
            words += 1;
            in_word = true;
        }
        last_word_end = i + 1;
        i += 1;
    }

    let Some(cut) = cut else {
        return html.to_string();
    };

    let mut out = String::with_capacity(cut + 16);
    out.push_str(&html[..last_word_end]);
    out.push_str(ELLIPSIS);

    // Between the last kept word and the cut there is only whitespace and
    // complete tags. Closing tags are kept so the markup stays faithful;
    // tags opened here would be emitted empty, so they are dropped and
    // unwound from the stack instead.
    let mut tail = &html[last_word_end..cut];
    while let Some(start) = tail.find('<') {
        let Some(end) = tail[start..].find('>') else {
            break;
        };
        let chunk = &tail[start..start + end + 1];
        if chunk.starts_with("</") {
            out.push_str(chunk);
        } else {
            let name = tag_name(chunk[1..chunk.len() - 1].trim());
            if let Some(idx) = open_tags.iter().rposition(|t| *t == name) {
                open_tags.remove(idx);
            }
        }
        tail = &tail[start + end + 1..];
    }

    for name in open_tags.iter().rev() {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
    out
}

/// Drop all tags, leaving visible text. Each removed tag becomes a single
/// space so adjacent block elements do not glue words together; callers
/// collapse whitespace as needed.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    loop {
        match rest.find('<') {
            None => {
                out.push_str(rest);
                break;
            }
            Some(start) => {
                out.push_str(&rest[..start]);
                match rest[start..].find('>') {
                    None => break,
                    Some(end) => {
                        out.push(' ');
                        rest = &rest[start + end + 1..];
                    }
                }
            }
        }
    }
    out
}

/// Track an open-tag stack across one tag's interior text (without the
/// angle brackets). Comments, doctypes, void and self-closed elements do
/// not change the stack. A closing tag implicitly closes anything opened
/// after its match, per the HTML parsing rules.
fn note_tag(inner: &str, open_tags: &mut Vec<String>) {
    let inner = inner.trim();
    if inner.starts_with('!') || inner.is_empty() {
        return;
    }
    if let Some(rest) = inner.strip_prefix('/') {
        let name = tag_name(rest);
        if let Some(idx) = open_tags.iter().rposition(|t| *t == name) {
            open_tags.truncate(idx);
        }
        return;
    }
    if inner.ends_with('/') {
        return;
    }
    let name = tag_name(inner);
    if name.is_empty() || VOID_ELEMENTS.contains(&name.as_str()) {
        return;
    }
    open_tags.push(name);
}

fn tag_name(inner: &str) -> String {
    inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_within_limit_is_unchanged() {
        assert_eq!(truncate_words("one two three", 3), "one two three");
        assert_eq!(truncate_words("one two three", 5), "one two three");
    }

    #[test]
    fn plain_truncation_appends_marker() {
        assert_eq!(truncate_words("one two three four", 2), "one two…");
    }

    #[test]
    fn plain_truncation_is_idempotent() {
        let once = truncate_words("alpha beta gamma delta epsilon", 3);
        assert_eq!(truncate_words(&once, 3), once);
    }

    #[test]
    fn html_within_limit_is_unchanged() {
        let html = "<p>one two three</p>";
        assert_eq!(truncate_html_words(html, 3), html);
    }

    #[test]
    fn html_cut_closes_open_tags() {
        assert_eq!(
            truncate_html_words("<p>one two three four</p>", 2),
            "<p>one two…</p>"
        );
    }

    #[test]
    fn html_cut_inside_nested_markup() {
        assert_eq!(
            truncate_html_words("<div><p>one <em>two</em> three four</p></div>", 3),
            "<div><p>one <em>two</em> three…</p></div>"
        );
    }

    #[test]
    fn html_cut_mid_element_closes_it() {
        assert_eq!(
            truncate_html_words("one <b>two three</b> four", 2),
            "one <b>two…</b>"
        );
    }

    #[test]
    fn void_elements_are_not_closed() {
        assert_eq!(
            truncate_html_words("one<br>two three four", 3),
            "one<br>two three…"
        );
    }

    #[test]
    fn unentered_trailing_tag_is_dropped() {
        assert_eq!(truncate_html_words("one two <b>bold words", 2), "one two…");
    }

    #[test]
    fn tags_do_not_count_as_words() {
        let html = "<p><strong>one</strong> two</p>";
        assert_eq!(truncate_html_words(html, 2), html);
    }

    #[test]
    fn html_truncation_is_idempotent() {
        let html = "<p>one <em>two</em> three four five</p>";
        for limit in 1..=6 {
            let once = truncate_html_words(html, limit);
            assert_eq!(truncate_html_words(&once, limit), once, "limit {limit}");
        }
    }

    #[test]
    fn strip_tags_leaves_visible_text() {
        let text = strip_tags("<p>Hi</p> <p>there</p>");
        let collapsed: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(collapsed, ["Hi", "there"]);
    }

    #[test]
    fn strip_tags_separates_adjacent_blocks() {
        let text = strip_tags("<p>one</p><p>two</p>");
        let collapsed: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(collapsed, ["one", "two"]);
    }
}
