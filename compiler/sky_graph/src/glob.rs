//! Filesystem globbing scoped to one package.
//!
//! Supported syntax: `*` and `?` within a path component, `[abc]`,
//! `[a-z]` and `[!x]` character classes, and `**` as a whole component
//! matching any number of directories. Directories holding a build file
//! belong to another package and are never entered.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::GlobError;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    Star,
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    AnyDirs,
    Name(Vec<Token>),
}

/// A compiled glob pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn new(text: &str) -> Result<Self, GlobError> {
        let invalid = |reason| GlobError::InvalidPattern {
            pattern: text.to_string(),
            reason,
        };
        if text.is_empty() {
            return Err(invalid("empty pattern"));
        }
        if text.starts_with('/') {
            return Err(invalid("absolute paths are not allowed"));
        }
        let mut segments = Vec::new();
        for part in text.split('/') {
            match part {
                "" => return Err(invalid("empty path component")),
                ".." => return Err(invalid("'..' is not allowed")),
                "**" => {
                    if segments.last() != Some(&Segment::AnyDirs) {
                        segments.push(Segment::AnyDirs);
                    }
                }
                _ => segments.push(Segment::Name(tokenize(part).map_err(invalid)?)),
            }
        }
        Ok(Pattern { segments })
    }

    /// Whether the pattern spans more than one path component.
    fn is_path(&self) -> bool {
        self.segments.len() > 1 || self.segments.first() == Some(&Segment::AnyDirs)
    }

    /// Deepest directory level a match can live in; `None` if unbounded.
    fn max_depth(&self) -> Option<usize> {
        if self.segments.contains(&Segment::AnyDirs) {
            None
        } else {
            Some(self.segments.len())
        }
    }

    /// Match a `/`-separated path relative to the glob base.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').collect();
        match_segments(&self.segments, &parts)
    }
}

fn tokenize(part: &str) -> Result<Vec<Token>, &'static str> {
    let mut tokens = Vec::new();
    let mut chars = part.chars().peekable();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '*' => {
                if tokens.last() == Some(&Token::Star) {
                    continue;
                }
                Token::Star
            }
            '?' => Token::AnyChar,
            '[' => {
                let negated = chars.next_if(|&c| c == '!' || c == '^').is_some();
                let mut ranges = Vec::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == ']' && !ranges.is_empty() {
                        closed = true;
                        break;
                    }
                    if chars.next_if_eq(&'-').is_some() {
                        match chars.next_if(|&end| end != ']') {
                            Some(end) if end >= c => ranges.push((c, end)),
                            Some(_) => return Err("reversed character range"),
                            None => {
                                ranges.push((c, c));
                                ranges.push(('-', '-'));
                            }
                        }
                    } else {
                        ranges.push((c, c));
                    }
                }
                if !closed {
                    return Err("unterminated character class");
                }
                Token::Class { negated, ranges }
            }
            c => Token::Literal(c),
        });
    }
    Ok(tokens)
}

fn match_segments(segments: &[Segment], path: &[&str]) -> bool {
    match segments.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDirs, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Name(tokens), rest)) => path.split_first().is_some_and(|(first, tail)| {
            let name: Vec<char> = first.chars().collect();
            match_name(tokens, &name) && match_segments(rest, tail)
        }),
    }
}

fn token_matches(token: &Token, c: char) -> bool {
    match token {
        Token::Literal(l) => *l == c,
        Token::AnyChar => true,
        Token::Star => false,
        Token::Class { negated, ranges } => {
            ranges.iter().any(|(lo, hi)| (*lo..=*hi).contains(&c)) != *negated
        }
    }
}

/// Wildcard match of one path component, backtracking on the last `*`.
fn match_name(tokens: &[Token], name: &[char]) -> bool {
    let (mut t, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while n < name.len() {
        match tokens.get(t) {
            Some(Token::Star) => {
                backtrack = Some((t, n));
                t += 1;
            }
            Some(token) if token_matches(token, name[n]) => {
                t += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star, consumed)) => {
                    t = star + 1;
                    n = consumed + 1;
                    backtrack = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }
    tokens[t..].iter().all(|token| *token == Token::Star)
}

/// Expands glob patterns below a package directory.
#[derive(Clone, Debug, Default)]
pub struct Globber {
    build_file_names: Vec<String>,
}

impl Globber {
    /// `build_file_names` identify subpackage directories.
    pub fn new(build_file_names: Vec<String>) -> Self {
        Globber { build_file_names }
    }

    /// Files under `base` matching any of `includes`, sorted.
    ///
    /// A file is dropped if its relative path matches one of
    /// `path_excludes`, or if its file name matches one of the single
    /// component patterns in `name_excludes`. Files and directories whose
    /// name starts with `.` are skipped unless `hidden` is set. Symlinks to
    /// files are returned; symlinks to directories are never descended
    /// into. Returned paths are relative to `base` and use `/` separators.
    pub fn glob(
        &self,
        base: &Path,
        includes: &[String],
        path_excludes: &[String],
        name_excludes: &[String],
        hidden: bool,
    ) -> Result<Vec<String>, GlobError> {
        let includes = compile(includes)?;
        let path_excludes = compile(path_excludes)?;
        let name_excludes: Vec<Pattern> = compile(name_excludes)?
            .into_iter()
            .filter(|p| !p.is_path())
            .collect();

        let max_depth = includes
            .iter()
            .map(Pattern::max_depth)
            .try_fold(0, |acc, d| d.map(|d| acc.max(d)));

        let mut files = Vec::new();
        self.walk(base, "", 1, max_depth, hidden, &mut files)?;

        let matched: BTreeSet<String> = files
            .into_iter()
            .filter(|rel| includes.iter().any(|p| p.matches(rel)))
            .filter(|rel| !path_excludes.iter().any(|p| p.matches(rel)))
            .filter(|rel| {
                let name = rel.rsplit('/').next().unwrap_or(rel);
                !name_excludes.iter().any(|p| p.matches(name))
            })
            .collect();
        tracing::trace!(base = %base.display(), count = matched.len(), "glob");
        Ok(matched.into_iter().collect())
    }

    fn is_package_dir(&self, dir: &Path) -> bool {
        self.build_file_names
            .iter()
            .any(|name| dir.join(name).is_file())
    }

    fn walk(
        &self,
        dir: &Path,
        prefix: &str,
        depth: usize,
        max_depth: Option<usize>,
        hidden: bool,
        files: &mut Vec<String>,
    ) -> Result<(), GlobError> {
        let entries = fs::read_dir(dir).map_err(|source| GlobError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| GlobError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !hidden && name.starts_with('.') {
                continue;
            }
            let rel = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let path = entry.path();
            let file_type = entry.file_type().map_err(|source| GlobError::Io {
                path: path.clone(),
                source,
            })?;
            // Symlinked directories are not followed; they may loop.
            if file_type.is_symlink() && path.is_dir() {
                continue;
            }
            if file_type.is_dir() {
                if max_depth.is_some_and(|max| depth >= max) || self.is_package_dir(&path) {
                    continue;
                }
                self.walk(&path, &rel, depth + 1, max_depth, hidden, files)?;
            } else {
                files.push(rel);
            }
        }
        Ok(())
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, GlobError> {
    patterns.iter().map(|p| Pattern::new(p)).collect()
}

#[cfg(test)]
mod tests;
