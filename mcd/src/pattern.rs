use std::ffi::OsStr;
use std::fmt;

use crate::error::ResolveError;

pub const SEPARATOR: char = '/';

/// Where resolution of a pattern starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    CurrentDirectory,
    FilesystemRoot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `..`
    ParentStep,
    /// `.`
    SelfStep,
    /// Anything else, matched as a substring of directory names
    FuzzyToken(String),
}

impl Segment {
    fn from_token(token: &str) -> Self {
        match token {
            ".." => Segment::ParentStep,
            "." => Segment::SelfStep,
            _ => Segment::FuzzyToken(token.to_string()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::ParentStep => f.write_str(".."),
            Segment::SelfStep => f.write_str("."),
            Segment::FuzzyToken(token) => f.write_str(token),
        }
    }
}

/// How a parsed pattern gets searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy<'a> {
    /// Apply segments one after another from the anchor
    Sequential(&'a [Segment]),
    /// Search the subtrees of the working directory and then of each
    /// ancestor until something matches
    ExpandAncestors(&'a str),
    /// Search the whole tree below the filesystem root once
    ScanRoot(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub anchor: Anchor,
    pub segments: Vec<Segment>,
    /// A separator remained after the anchor was stripped
    pub separated: bool,
}

impl Pattern {
    /// Splits a raw pattern into its anchor and segments.
    ///
    /// Empty tokens from doubled or trailing separators are dropped. A
    /// pattern with nothing left after that is rejected.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let (anchor, rest) = match raw.strip_prefix(SEPARATOR) {
            Some(rest) => (Anchor::FilesystemRoot, rest),
            None => (Anchor::CurrentDirectory, raw),
        };

        let segments: Vec<Segment> = rest
            .split(SEPARATOR)
            .filter(|token| !token.is_empty())
            .map(Segment::from_token)
            .collect();

        if segments.is_empty() {
            return Err(ResolveError::InvalidPattern(raw.to_string()));
        }

        Ok(Self {
            anchor,
            segments,
            separated: rest.contains(SEPARATOR),
        })
    }

    pub fn strategy(&self) -> Strategy<'_> {
        match (self.anchor, self.separated, self.segments.as_slice()) {
            (Anchor::CurrentDirectory, false, [Segment::FuzzyToken(token)]) => {
                Strategy::ExpandAncestors(token)
            },
            (Anchor::FilesystemRoot, false, [Segment::FuzzyToken(token)]) => {
                Strategy::ScanRoot(token)
            },
            (_, _, segments) => Strategy::Sequential(segments),
        }
    }
}

/// Case-sensitive substring containment unless `ignore_case` is set, in
/// which case both sides are lowercased first. No wildcard characters.
#[derive(Debug, Clone)]
pub struct Matcher {
    needle: String,
    ignore_case: bool,
}

impl Matcher {
    pub fn new(token: &str, ignore_case: bool) -> Self {
        let needle = if ignore_case {
            token.to_lowercase()
        } else {
            token.to_string()
        };

        Self { needle, ignore_case }
    }

    pub fn matches(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();

        if self.ignore_case {
            name.to_lowercase()
                .contains(&self.needle)
        } else {
            name.contains(&self.needle)
        }
    }
}
