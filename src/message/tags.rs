//! IRCv3 message tags.
//!
//! Tags are only ever read by this crate; outgoing client lines carry none.

/// A single `key[=value]` message tag with its value unescaped.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag(pub String, pub Option<String>);

impl Tag {
    /// Tag key, including any `+` client prefix or vendor namespace.
    pub fn key(&self) -> &str {
        &self.0
    }

    /// Unescaped value, if one was present and non-empty.
    pub fn value(&self) -> Option<&str> {
        self.1.as_deref()
    }
}

/// Split the raw tag section (without the leading `@`) into tags.
///
/// Empty keys are skipped; an empty value (`key=`) is the same as no value.
pub(crate) fn parse_tags(raw: &str) -> Vec<Tag> {
    raw.split(';')
        .filter(|t| !t.is_empty())
        .filter_map(|t| {
            let (key, value) = match t.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (t, None),
            };
            if key.is_empty() {
                return None;
            }
            let value = value
                .filter(|v| !v.is_empty())
                .map(unescape_tag_value);
            Some(Tag(key.to_string(), value))
        })
        .collect()
}

/// Reverse the IRCv3 escaping of a tag value.
///
/// `\:` `\s` `\\` `\r` `\n` map to `;`, space, `\`, CR and LF; any other
/// escaped character stands for itself and a dangling `\` is dropped.
pub(crate) fn unescape_tag_value(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut iter = value.chars();
    while let Some(c) = iter.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match iter.next() {
            Some(':') => unescaped.push(';'),
            Some('s') => unescaped.push(' '),
            Some('r') => unescaped.push('\r'),
            Some('n') => unescaped.push('\n'),
            Some(other) => unescaped.push(other),
            None => break,
        }
    }
    unescaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_with_and_without_values() {
        let tags = parse_tags("time=2023-01-01T00:00:00Z;+draft/typing;account=");
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].key(), "time");
        assert_eq!(tags[0].value(), Some("2023-01-01T00:00:00Z"));
        assert_eq!(tags[1].key(), "+draft/typing");
        assert_eq!(tags[1].value(), None);
        assert_eq!(tags[2].value(), None);
    }

    #[test]
    fn test_parse_tags_skips_empty() {
        assert!(parse_tags(";;=x").is_empty());
    }

    #[test]
    fn test_unescape_sequences() {
        assert_eq!(unescape_tag_value("a\\:b\\sc\\\\d\\re\\nf"), "a;b c\\d\re\nf");
    }

    #[test]
    fn test_unescape_dangling_and_unknown() {
        assert_eq!(unescape_tag_value("end\\"), "end");
        assert_eq!(unescape_tag_value("a\\xb"), "axb");
    }
}
