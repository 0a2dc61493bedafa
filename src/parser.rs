//! Link parsing: splits a raw link string into path components with
//! optional kind and hash disambiguation, an absolute/relative flag, and a
//! trailing anchor fragment.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Well-known first segments that mark a link as absolute and carry no
/// hierarchy information of their own.
const BOOKKEEPING_SEGMENTS: &[&str] = &["documentation", "tutorials"];

/// Symbol kind identifiers recognized as disambiguation suffixes.
const KNOWN_KINDS: &[&str] = &[
    "associatedtype",
    "case",
    "class",
    "deinit",
    "dictionary",
    "enum",
    "enum.case",
    "func",
    "func.op",
    "init",
    "ivar",
    "macro",
    "method",
    "module",
    "namespace",
    "property",
    "protocol",
    "struct",
    "subscript",
    "type.method",
    "type.property",
    "type.subscript",
    "typealias",
    "typedef",
    "union",
    "var",
];

/// Source language identifiers that may prefix a kind suffix, as in
/// `-swift.struct`.
const KNOWN_LANGUAGES: &[&str] = &["c", "cpp", "data", "javascript", "objc", "swift"];

/// A disambiguation hash is one to five lowercase base-32-ish characters.
static HASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-z]{1,5}$").expect("hash pattern is valid"));

/// One slash-separated segment of a documentation link.
///
/// `full` is the segment verbatim; `name` is the segment with any recognized
/// disambiguation suffix stripped. `range` is the segment's byte range within
/// the original link body, used for fix-it replacements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathComponent {
    pub full: String,
    pub name: String,
    pub kind: Option<String>,
    pub hash: Option<String>,
    /// Language constraint parsed from a `lang.kind` suffix. Kept separate
    /// from `kind` so lookups by kind alone still match cross-language.
    pub language: Option<String>,
    pub range: Range<usize>,
}

impl PathComponent {
    /// A component with no disambiguation, used for anchors and tests.
    pub fn plain(text: &str, range: Range<usize>) -> Self {
        Self {
            full: text.to_string(),
            name: text.to_string(),
            kind: None,
            hash: None,
            language: None,
            range,
        }
    }

    /// Whether this component carries any disambiguation at all.
    pub fn is_disambiguated(&self) -> bool {
        self.kind.is_some() || self.hash.is_some()
    }
}

/// The result of parsing a raw link string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub components: Vec<PathComponent>,
    /// Anchor component split off a trailing `#fragment`.
    pub fragment: Option<PathComponent>,
    pub is_absolute: bool,
}

/// Parse a raw link into components.
///
/// A path is absolute if it begins with `/` or its first component is one of
/// the well-known bookkeeping names (`documentation`, `tutorials`), which are
/// stripped before resolution. When `collapse_empty` is set, empty segments
/// produced by doubled slashes are dropped; otherwise they survive as empty
/// components and fail resolution with a precise location.
pub fn parse(link: &str, collapse_empty: bool) -> ParsedPath {
    let (path_part, fragment) = split_fragment(link);

    let mut is_absolute = path_part.starts_with('/');
    let mut components = Vec::new();
    let mut offset = 0_usize;

    for segment in path_part.split('/') {
        let range = offset..offset + segment.len();
        offset = range.end + 1;

        if segment.is_empty() {
            if !collapse_empty && !components.is_empty() {
                components.push(PathComponent::plain("", range));
            }
            continue;
        }
        components.push(parse_segment(segment, range));
    }

    // A leading bookkeeping segment marks the link absolute and is dropped.
    if let Some(first) = components.first() {
        if BOOKKEEPING_SEGMENTS.contains(&first.full.as_str()) {
            is_absolute = true;
            components.remove(0);
        }
    }

    ParsedPath {
        components,
        fragment,
        is_absolute,
    }
}

/// Split a trailing `#fragment` off the link, producing the anchor component.
/// The fragment's `full` and `name` are both the text after `#`.
fn split_fragment(link: &str) -> (&str, Option<PathComponent>) {
    let Some(pos) = link.rfind('#') else {
        return (link, None);
    };
    let text = &link[pos + 1..];
    if text.is_empty() || text.contains('/') {
        return (link, None);
    }
    let fragment = PathComponent::plain(text, pos + 1..link.len());
    (&link[..pos], Some(fragment))
}

/// Parse a single segment into `(name, kind?, hash?)`.
///
/// Rules, in order: a segment without `-` is all name; a recognized kind
/// suffix is stripped (and the prefix checked once more for a hash); a valid
/// hash suffix is stripped (and the prefix checked once more for a kind);
/// anything else is taken verbatim since names may legitimately contain
/// hyphens.
pub fn parse_segment(full: &str, range: Range<usize>) -> PathComponent {
    let mut component = PathComponent::plain(full, range);

    let Some((prefix, suffix)) = full.rsplit_once('-') else {
        return component;
    };
    if prefix.is_empty() {
        return component;
    }

    if let Some((language, kind)) = recognized_kind(suffix) {
        component.kind = Some(kind.to_string());
        component.language = language.map(str::to_string);
        component.name = prefix.to_string();
        // The prefix may itself carry a hash: `name-hash-kind`.
        if let Some((inner, candidate)) = prefix.rsplit_once('-') {
            if !inner.is_empty() && is_valid_hash(candidate) {
                component.hash = Some(candidate.to_string());
                component.name = inner.to_string();
            }
        }
        return component;
    }

    if is_valid_hash(suffix) {
        component.hash = Some(suffix.to_string());
        component.name = prefix.to_string();
        // The prefix may itself carry a kind: `name-kind-hash`.
        if let Some((inner, candidate)) = prefix.rsplit_once('-') {
            if let Some((language, kind)) = recognized_kind(candidate) {
                if !inner.is_empty() {
                    component.kind = Some(kind.to_string());
                    component.language = language.map(str::to_string);
                    component.name = inner.to_string();
                }
            }
        }
        return component;
    }

    component
}

/// Check a suffix against the recognized kind identifiers, with an optional
/// `language.` prefix. Returns `(language, kind)` on a match.
fn recognized_kind(suffix: &str) -> Option<(Option<&str>, &str)> {
    if KNOWN_KINDS.contains(&suffix) {
        return Some((None, suffix));
    }
    let (language, kind) = suffix.split_once('.')?;
    if KNOWN_LANGUAGES.contains(&language) && KNOWN_KINDS.contains(&kind) {
        return Some((Some(language), kind));
    }
    None
}

/// Whether a suffix is a valid disambiguation hash.
pub fn is_valid_hash(suffix: &str) -> bool {
    HASH_PATTERN.is_match(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str) -> PathComponent {
        parse_segment(text, 0..text.len())
    }

    #[test]
    fn plain_segment() {
        let c = segment("Foo");
        assert_eq!(c.name, "Foo");
        assert_eq!(c.kind, None);
        assert_eq!(c.hash, None);
    }

    #[test]
    fn kind_suffix() {
        let c = segment("Foo-struct");
        assert_eq!(c.name, "Foo");
        assert_eq!(c.kind.as_deref(), Some("struct"));
        assert_eq!(c.hash, None);
    }

    #[test]
    fn language_prefixed_kind() {
        let c = segment("Foo-swift.struct");
        assert_eq!(c.name, "Foo");
        assert_eq!(c.kind.as_deref(), Some("struct"));
        assert_eq!(c.language.as_deref(), Some("swift"));
    }

    #[test]
    fn dotted_kind_is_not_a_language_prefix() {
        let c = segment("callAsFunction()-func.op");
        assert_eq!(c.name, "callAsFunction()");
        assert_eq!(c.kind.as_deref(), Some("func.op"));
    }

    #[test]
    fn hash_suffix() {
        let c = segment("bar()-4fh2x");
        assert_eq!(c.name, "bar()");
        assert_eq!(c.hash.as_deref(), Some("4fh2x"));
    }

    #[test]
    fn kind_and_hash() {
        let c = segment("Foo-struct-4fh2x");
        assert_eq!(c.name, "Foo");
        assert_eq!(c.kind.as_deref(), Some("struct"));
        assert_eq!(c.hash.as_deref(), Some("4fh2x"));
    }

    #[test]
    fn unknown_suffix_stays_verbatim() {
        let c = segment("well-known-name");
        // "name" is neither a kind nor a valid hash candidate here: it is a
        // hash-shaped word only if it fits the pattern, and 4 characters of
        // lowercase letters do fit, so the last segment is taken as a hash.
        assert_eq!(c.hash.as_deref(), Some("name"));
        assert_eq!(c.name, "well-known");
        // A suffix that can't be a hash survives whole.
        let c = segment("extra-ordinary");
        assert_eq!(c.name, "extra-ordinary");
        assert_eq!(c.kind, None);
        assert_eq!(c.hash, None);
    }

    #[test]
    fn absolute_by_slash_and_by_bookkeeping() {
        assert!(parse("/M/Foo", true).is_absolute);
        let parsed = parse("documentation/M/Foo", true);
        assert!(parsed.is_absolute);
        assert_eq!(parsed.components.len(), 2);
        assert_eq!(parsed.components[0].name, "M");
    }

    #[test]
    fn fragment_is_split_off() {
        let parsed = parse("/M/Foo#overview", true);
        assert_eq!(parsed.components.len(), 2);
        let fragment = parsed.fragment.unwrap();
        assert_eq!(fragment.name, "overview");
        assert_eq!(fragment.full, "overview");
    }

    #[test]
    fn pure_fragment() {
        let parsed = parse("#overview", true);
        assert!(parsed.components.is_empty());
        assert_eq!(parsed.fragment.unwrap().name, "overview");
    }

    #[test]
    fn empty_link() {
        let parsed = parse("", true);
        assert!(parsed.components.is_empty());
        assert!(parsed.fragment.is_none());
        assert!(!parsed.is_absolute);
    }

    #[test]
    fn component_ranges_index_the_original_link() {
        let link = "/M/Foo-struct/bar()";
        let parsed = parse(link, true);
        let foo = &parsed.components[1];
        assert_eq!(&link[foo.range.clone()], "Foo-struct");
    }
}
