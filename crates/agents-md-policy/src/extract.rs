// extract.rs — Directive extraction: raw text → named sections of directives.
//
// Grammar, line by line:
//
//   ## Name          section heading (name lower-cased and trimmed)
//   - key: value     directive (only inside a section)
//   # anything       comment, ignored
//   <blank>          ignored
//
// Text before the first heading is preamble and is discarded. Directive lines
// without a ':' or with an empty key are skipped silently; a malformed line is
// never fatal. A repeated heading replaces the earlier section of that name.

use std::collections::HashMap;

/// Marker that opens a section heading.
pub const SECTION_MARKER: &str = "##";

/// Marker that opens a directive line (after trimming).
pub const BULLET_MARKER: &str = "- ";

/// Marker for comment lines that are not headings.
pub const COMMENT_MARKER: char = '#';

/// Separator between a directive's key and value. Only the first one counts.
pub const SEPARATOR: char = ':';

/// A single `key: value` line within a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Lower-cased, trimmed key.
    pub key: String,
    /// Trimmed value; may itself contain ':'.
    pub value: String,
    /// 1-based source line.
    pub line: usize,
}

/// A named group of directives, in source order.
///
/// Keeps a key index beside the directives so lookups and de-duplication
/// stay linear in the section size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    /// Lower-cased, trimmed heading text (e.g. "trust requirements").
    pub name: String,
    /// 1-based line of the heading.
    pub line: usize,
    directives: Vec<Directive>,
    /// Key → position of its last occurrence in `directives`.
    latest: HashMap<String, usize>,
    /// Position of each key's first occurrence, in source order.
    first_seen: Vec<usize>,
}

impl RawSection {
    fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            line,
            directives: Vec::new(),
            latest: HashMap::new(),
            first_seen: Vec::new(),
        }
    }

    fn push(&mut self, directive: Directive) {
        let position = self.directives.len();
        match self.latest.get_mut(&directive.key) {
            Some(last) => *last = position,
            None => {
                self.latest.insert(directive.key.clone(), position);
                self.first_seen.push(position);
            }
        }
        self.directives.push(directive);
    }

    /// Every directive in source order, duplicates included.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Look up a directive by key. Last writer wins.
    pub fn get(&self, key: &str) -> Option<&Directive> {
        self.latest.get(key).map(|&i| &self.directives[i])
    }

    /// Distinct directives in first-seen key order, each resolved to the
    /// last occurrence of its key.
    pub fn entries(&self) -> impl Iterator<Item = &Directive> + '_ {
        self.first_seen
            .iter()
            .filter_map(|&first| self.get(&self.directives[first].key))
    }
}

/// Ordered map from section name to its directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    sections: Vec<RawSection>,
    by_name: HashMap<String, usize>,
}

impl SectionMap {
    /// Look up a section by its normalized name.
    pub fn get(&self, name: &str) -> Option<&RawSection> {
        self.by_name.get(name).map(|&i| &self.sections[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawSection> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Add a section, replacing (in place) any earlier section of the same name.
    fn with_section(mut self, section: RawSection) -> Self {
        match self.by_name.get(&section.name) {
            Some(&i) => self.sections[i] = section,
            None => {
                self.by_name.insert(section.name.clone(), self.sections.len());
                self.sections.push(section);
            }
        }
        self
    }
}

/// How a single source line is interpreted.
enum LineKind<'a> {
    Heading(&'a str),
    Directive { key: String, value: String },
    Ignored,
}

fn classify(line: &str) -> LineKind<'_> {
    if let Some(rest) = line.strip_prefix(SECTION_MARKER) {
        let name = rest.trim();
        if rest.starts_with(char::is_whitespace) && !name.is_empty() {
            return LineKind::Heading(name);
        }
    }

    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
        return LineKind::Ignored;
    }
    let Some(body) = trimmed.strip_prefix(BULLET_MARKER) else {
        return LineKind::Ignored;
    };
    let Some((key, value)) = body.split_once(SEPARATOR) else {
        return LineKind::Ignored;
    };
    let key = key.trim().to_lowercase();
    if key.is_empty() {
        return LineKind::Ignored;
    }
    LineKind::Directive {
        key,
        value: value.trim().to_string(),
    }
}

/// Split file content into sections. Accepts `\n` and `\r\n` line endings.
pub fn extract(content: &str) -> SectionMap {
    let (map, open) = content.lines().enumerate().fold(
        (SectionMap::default(), None::<RawSection>),
        |(map, open), (idx, line)| {
            let line_no = idx + 1;
            match classify(line) {
                LineKind::Heading(name) => {
                    let map = match open {
                        Some(section) => map.with_section(section),
                        None => map,
                    };
                    (map, Some(RawSection::new(name, line_no)))
                }
                LineKind::Directive { key, value } => match open {
                    Some(mut section) => {
                        section.push(Directive {
                            key,
                            value,
                            line: line_no,
                        });
                        (map, Some(section))
                    }
                    // Preamble.
                    None => (map, None),
                },
                LineKind::Ignored => (map, open),
            }
        },
    );

    match open {
        Some(section) => map.with_section(section),
        None => map,
    }
}
