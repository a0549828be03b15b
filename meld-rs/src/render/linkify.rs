//! URL and email auto-linking for rendered text
//!
//! Both patterns require the match to be followed by whitespace or one of
//! `.,>)'"]`. That character is checked but stays outside the link, which is
//! how trailing sentence punctuation is kept out of URLs. End of text is not a
//! valid boundary.
//!
//! Replacement works on match positions in a single pass. URL matches win over
//! email matches that overlap them (`http://user@host.com/`).

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Scheme, two or more `word[:.]` groups, then an optional path ending in a
/// word character or slash. Word characters are ASCII only.
const URL_PATTERN: &str = r#"((?:http|https|ftp|gopher)://(?:[0-9A-Za-z_]+[:.]?){2,}(?:/?|[^ \n\r"]+[0-9A-Za-z_/]))[\s.,>)'"\]]"#;

/// Dot-separated atoms starting with a letter or digit, `@`, `label.` groups,
/// then a country code or a generic TLD
const EMAIL_PATTERN: &str = r##"(?i)([a-z0-9][a-z0-9!#$%&'*+/=?^_`{|}~-]*(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+(?:[a-z]{2}|com|org|net|edu|gov|mil|int|arpa|biz|info|name|pro|aero|asia|cat|coop|jobs|mobi|museum|post|tel|travel|xxx))[\s.,>)'"\]]"##;

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(URL_PATTERN).expect("URL pattern is valid"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Url,
    Email,
}

/// A detected link and its byte range in the scanned text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub kind: LinkKind,
    pub range: Range<usize>,
}

impl Link {
    fn overlaps(&self, other: &Range<usize>) -> bool {
        self.range.start < other.end && other.start < self.range.end
    }
}

/// Find every URL and email link in `text`, ordered by position
pub fn find_links(text: &str) -> Vec<Link> {
    let mut links: Vec<Link> = scan(url_regex(), text)
        .map(|range| Link {
            kind: LinkKind::Url,
            range,
        })
        .collect();

    let emails: Vec<Link> = scan(email_regex(), text)
        .filter(|range| !links.iter().any(|url| url.overlaps(range)))
        .map(|range| Link {
            kind: LinkKind::Email,
            range,
        })
        .collect();

    links.extend(emails);
    links.sort_by_key(|link| link.range.start);
    links
}

/// Wrap URLs and email addresses in anchor tags
pub fn linkify(text: &str) -> String {
    let links = find_links(text);
    if links.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + links.len() * 32);
    let mut last = 0;
    for link in links {
        let target = &text[link.range.clone()];
        out.push_str(&text[last..link.range.start]);
        match link.kind {
            LinkKind::Url => {
                out.push_str(&format!(r#"<a href="{0}">{0}</a>"#, target));
            }
            LinkKind::Email => {
                out.push_str(&format!(r#"<a href="mailto:{0}">{0}</a>"#, target));
            }
        }
        last = link.range.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Ranges of capture group 1, resuming each search right after the group so
/// the boundary character can start the next match
fn scan<'a>(re: &'a Regex, text: &'a str) -> impl Iterator<Item = Range<usize>> + 'a {
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= text.len() {
            return None;
        }
        let found = re.captures_at(text, pos)?.get(1)?;
        pos = found.end();
        Some(found.range())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_period_is_not_linked() {
        assert_eq!(
            linkify("Visit http://example.com today."),
            r#"Visit <a href="http://example.com">http://example.com</a> today."#
        );
        assert_eq!(
            linkify("Go to http://example.com."),
            r#"Go to <a href="http://example.com">http://example.com</a>."#
        );
    }

    #[test]
    fn test_email_link() {
        assert_eq!(
            linkify("Contact a.b@example.org now"),
            r#"Contact <a href="mailto:a.b@example.org">a.b@example.org</a> now"#
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "Nothing to see here, just words.\nAnd a second line.";
        assert_eq!(linkify(text), text);
        assert_eq!(linkify(""), "");
    }

    #[test]
    fn test_url_with_path_and_closing_paren() {
        assert_eq!(
            linkify("(see https://docs.example.com/guide/intro) for more"),
            r#"(see <a href="https://docs.example.com/guide/intro">https://docs.example.com/guide/intro</a>) for more"#
        );
    }

    #[test]
    fn test_url_path_trailing_comma_excluded() {
        assert_eq!(
            linkify("Files at ftp://files.example.com/pub/, thanks"),
            r#"Files at <a href="ftp://files.example.com/pub/">ftp://files.example.com/pub/</a>, thanks"#
        );
    }

    #[test]
    fn test_url_with_port_and_query() {
        let text = "Open http://localhost:8000/reset?token=abc123\n";
        assert_eq!(
            linkify(text),
            "Open <a href=\"http://localhost:8000/reset?token=abc123\">http://localhost:8000/reset?token=abc123</a>\n"
        );
    }

    #[test]
    fn test_url_at_end_of_text_is_not_linked() {
        assert_eq!(linkify("http://example.com"), "http://example.com");
    }

    #[test]
    fn test_unknown_scheme_is_not_linked() {
        let text = "mailbox at imap://mail.example.com now";
        assert_eq!(linkify(text), text);
    }

    #[test]
    fn test_repeated_url_is_linked_each_time() {
        let out = linkify("http://a.example.com and http://a.example.com again");
        assert_eq!(out.matches(r#"<a href="http://a.example.com">"#).count(), 2);
    }

    #[test]
    fn test_url_prefix_of_longer_url_is_not_double_linked() {
        let out = linkify("http://example.com then http://example.com/page ok");
        assert_eq!(
            out,
            concat!(
                r#"<a href="http://example.com">http://example.com</a> then "#,
                r#"<a href="http://example.com/page">http://example.com/page</a> ok"#
            )
        );
    }

    #[test]
    fn test_email_inside_url_belongs_to_url() {
        let text = "http://example.com/u/jane@example.org now";
        let links = find_links(text);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind, LinkKind::Url);
        assert_eq!(links[0].range, 0..text.len() - 4);
    }

    #[test]
    fn test_email_tld_rules() {
        assert_eq!(find_links("write jane@mail.example.co.uk, please").len(), 1);
        assert_eq!(find_links("write jane@example.museum today").len(), 1);
        assert_eq!(find_links("write JANE@EXAMPLE.COM today").len(), 1);
        // three-letter labels outside the generic list are not top-level domains
        assert!(find_links("write jane@example.dev today").is_empty());
        // a domain label is required
        assert!(find_links("write jane@localhost today").is_empty());
    }

    #[test]
    fn test_email_local_part_characters() {
        assert_eq!(
            linkify("to o'brien+news@example.net."),
            r#"to <a href="mailto:o'brien+news@example.net">o'brien+news@example.net</a>."#
        );
    }

    #[test]
    fn test_quoted_email_excludes_quotes() {
        assert_eq!(
            linkify("say 'jane@example.com' now"),
            r#"say '<a href="mailto:jane@example.com">jane@example.com</a>' now"#
        );
    }

    #[test]
    fn test_non_ascii_host_is_not_linked() {
        let text = "see http://bücher.de/ now";
        assert_eq!(linkify(text), text);
    }

    #[test]
    fn test_email_followed_by_quote_and_bracket() {
        let links = find_links(r#"["ops@example.com"]"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].range, 2..17);
    }

    #[test]
    fn test_mixed_links_in_order() {
        let text = "Mail help@example.com or visit https://example.com/help.\n";
        let links = find_links(text);
        assert_eq!(
            links.iter().map(|l| l.kind).collect::<Vec<_>>(),
            vec![LinkKind::Email, LinkKind::Url]
        );
        assert_eq!(&text[links[1].range.clone()], "https://example.com/help");
    }
}
