//! Directory listing scanner
//!
//! The ICU repository serves each data directory as an HTML page where every
//! sub-directory is a list item (`<li><a href="2007k/">2007k/</a></li>`).
//! The scanner walks the markup once and yields the text found inside list
//! items, which are the published version identifiers.

use once_cell::sync::Lazy;
use regex::Regex;

use super::SourceError;

/// Parent directory entry present in every listing
const PARENT_DIR: &str = "..";

/// Matches the leading part of a tag body: optional `/` and the tag name
static TAG_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(/?)\s*([A-Za-z][A-Za-z0-9]*)").expect("tag name pattern is valid")
});

/// Scan a listing document and yield version identifiers in document order
///
/// Every call starts a fresh scan. The returned scanner is lazy: nothing is
/// parsed until it is iterated.
pub fn extract_versions(document: &str) -> ListingScanner<'_> {
    ListingScanner::new(document)
}

/// Single-pass scanner over a listing document
///
/// Yields `Ok(identifier)` for each list item entry, or one
/// `Err(SourceError::MalformedListing)` if the markup cannot be tokenized,
/// after which it is exhausted.
#[derive(Debug)]
pub struct ListingScanner<'a> {
    document: &'a str,
    pos: usize,
    in_list_item: bool,
    done: bool,
}

/// One markup token
enum Token<'a> {
    Text(&'a str),
    StartTag(&'a str),
    EndTag(&'a str),
    Other,
}

impl<'a> ListingScanner<'a> {
    fn new(document: &'a str) -> Self {
        Self {
            document,
            pos: 0,
            in_list_item: false,
            done: false,
        }
    }

    /// Read the next token, advancing past it
    fn next_token(&mut self) -> Option<Result<Token<'a>, SourceError>> {
        let document = self.document;
        let rest = &document[self.pos..];
        if rest.is_empty() {
            return None;
        }

        let Some(lt) = rest.find('<') else {
            self.pos = document.len();
            return Some(Ok(Token::Text(rest)));
        };

        if lt > 0 {
            self.pos += lt;
            return Some(Ok(Token::Text(&rest[..lt])));
        }

        let start = self.pos;
        let (terminator, skip) = if rest.starts_with("<!--") {
            ("-->", 4)
        } else {
            (">", 1)
        };

        let Some(end) = rest[skip..].find(terminator) else {
            return Some(Err(SourceError::MalformedListing { offset: start }));
        };

        let body = &rest[1..skip + end];
        self.pos = start + skip + end + terminator.len();

        if skip > 1 {
            return Some(Ok(Token::Other));
        }

        let token = match TAG_NAME.captures(body) {
            Some(caps) => {
                let name = caps.get(2).map_or("", |m| m.as_str());
                if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
                    Token::EndTag(name)
                } else {
                    Token::StartTag(name)
                }
            }
            // <!DOCTYPE ...>, <?xml ...?> and similar
            None => Token::Other,
        };

        Some(Ok(token))
    }
}

impl Iterator for ListingScanner<'_> {
    type Item = Result<String, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while let Some(token) = self.next_token() {
            match token {
                Ok(Token::StartTag(name)) if name.eq_ignore_ascii_case("li") => {
                    self.in_list_item = true;
                }
                Ok(Token::EndTag(name)) if name.eq_ignore_ascii_case("li") => {
                    self.in_list_item = false;
                }
                Ok(Token::Text(text)) if self.in_list_item => {
                    if let Some(identifier) = entry_identifier(text) {
                        return Some(Ok(identifier));
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        self.done = true;
        None
    }
}

/// Turn the text of a list item into an identifier
///
/// Decodes character references before trimming, so an encoded space is
/// trimmed too. Strips one trailing `/` and drops the parent directory entry.
fn entry_identifier(text: &str) -> Option<String> {
    let decoded = decode_entities(text);
    let trimmed = decoded.trim();
    let name = trimmed.strip_suffix('/').unwrap_or(trimmed);

    if name.is_empty() || name == PARENT_DIR {
        return None;
    }

    Some(name.to_string())
}

/// Decode the handful of character references directory listings use
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod listing_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(document: &str) -> Vec<String> {
        extract_versions(document)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_document_order_preserved() {
        let html = r#"<html><body><ul>
  <li><a href="2007h/">2007h/</a></li>
  <li><a href="2007k/">2007k/</a></li>
  <li><a href="../">..</a></li>
  <li><a href="2007j/">2007j/</a></li>
</ul></body></html>"#;

        assert_eq!(collect(html), vec!["2007h", "2007k", "2007j"]);
    }

    #[test]
    fn test_text_outside_list_items_ignored() {
        let html = r#"<html><head><title>Revision 1234: /tzdata/icu</title></head>
<body><h2>Revision 1234: /tzdata/icu</h2>
<ul><li><a href="2007f/">2007f/</a></li></ul>
<hr noshade><em>Powered by Subversion</em></body></html>"#;

        assert_eq!(collect(html), vec!["2007f"]);
    }

    #[test]
    fn test_only_one_trailing_separator_stripped() {
        assert_eq!(collect("<li>2007g//</li>"), vec!["2007g/"]);
        assert_eq!(collect("<li>2007g</li>"), vec!["2007g"]);
    }

    #[test]
    fn test_parent_directory_dropped_with_or_without_separator() {
        assert!(collect("<li>..</li><li>../</li>").is_empty());
    }

    #[test]
    fn test_tag_names_case_insensitive() {
        assert_eq!(collect("<UL><LI>2006a/</LI><Li>2006b/</lI></UL>"), vec!["2006a", "2006b"]);
    }

    #[test]
    fn test_comments_and_doctype_skipped() {
        let html = "<!DOCTYPE html><!-- <li>bogus/</li> --><ul><li>2008a/</li></ul>";
        assert_eq!(collect(html), vec!["2008a"]);
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(collect("<li>a&amp;b/</li>"), vec!["a&b"]);
    }

    #[test]
    fn test_encoded_spaces_trimmed() {
        assert_eq!(
            collect("<li>2007a&nbsp;</li><li>&nbsp;2007b/&nbsp;</li>"),
            vec!["2007a", "2007b"]
        );
    }

    #[test]
    fn test_unterminated_tag_is_malformed() {
        let mut scanner = extract_versions("<ul><li>2007a/</li><li");

        assert_eq!(scanner.next().unwrap().unwrap(), "2007a");
        match scanner.next() {
            Some(Err(SourceError::MalformedListing { offset })) => assert_eq!(offset, 19),
            other => panic!("expected malformed listing, got {other:?}"),
        }
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_scan_is_lazy_and_restartable() {
        let html = "<li>2007a/</li><li>2007b/</li>";

        let mut first = extract_versions(html);
        assert_eq!(first.next().unwrap().unwrap(), "2007a");

        // A new scan starts from the beginning regardless of the first one
        assert_eq!(collect(html), vec!["2007a", "2007b"]);
        assert_eq!(first.next().unwrap().unwrap(), "2007b");
        assert!(first.next().is_none());
    }

    #[test]
    fn test_empty_document() {
        assert!(collect("").is_empty());
    }
}
