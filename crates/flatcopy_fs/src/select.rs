//! File selection by base name.

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{CopyTreeError, EnumCopyPatternMode};

/// Suffixes picked by [`SelectorExtensions::default`].
pub const DEFAULT_EXTENSIONS: [&str; 2] = [".md", ".rst"];

/// Decides whether a file takes part in the copy, given its base name only.
pub trait FileSelector {
    fn is_selected(&self, name_file: &str) -> bool;
}

impl<F> FileSelector for F
where
    F: Fn(&str) -> bool,
{
    fn is_selected(&self, name_file: &str) -> bool {
        self(name_file)
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region Extensions

/// Selects names ending in one of a fixed set of suffixes (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorExtensions {
    l_suffixes: Vec<String>,
}

impl SelectorExtensions {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            l_suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.l_suffixes
    }
}

impl Default for SelectorExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl FileSelector for SelectorExtensions {
    fn is_selected(&self, name_file: &str) -> bool {
        self.l_suffixes.iter().any(|s| name_file.ends_with(s.as_str()))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
enum TypeCopyPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeCopyPatternSeq {
    fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

/// Include/exclude pattern lists over file base names.
///
/// A name is selected when it matches any include pattern (or no include
/// list is set) and matches no exclude pattern.
#[derive(Debug, Clone, Default)]
pub struct SelectorPatterns {
    patterns_include: Option<TypeCopyPatternSeq>,
    patterns_exclude: Option<TypeCopyPatternSeq>,
}

impl SelectorPatterns {
    pub fn from_raw(
        patterns_include: Option<&[String]>,
        patterns_exclude: Option<&[String]>,
        rule_pattern: EnumCopyPatternMode,
    ) -> Result<Self, CopyTreeError> {
        Ok(Self {
            patterns_include: compile(patterns_include, rule_pattern)?,
            patterns_exclude: compile(patterns_exclude, rule_pattern)?,
        })
    }
}

impl FileSelector for SelectorPatterns {
    fn is_selected(&self, name_file: &str) -> bool {
        let b_included = self
            .patterns_include
            .as_ref()
            .is_none_or(|p| p.is_match(name_file));
        let b_excluded = self
            .patterns_exclude
            .as_ref()
            .is_some_and(|p| p.is_match(name_file));
        b_included && !b_excluded
    }
}

fn compile(
    patterns: Option<&[String]>,
    rule_pattern: EnumCopyPatternMode,
) -> Result<Option<TypeCopyPatternSeq>, CopyTreeError> {
    let Some(patterns) = patterns else {
        return Ok(None);
    };
    if patterns.is_empty() {
        return Ok(None);
    }

    let err_invalid = |e: &dyn std::fmt::Display| {
        CopyTreeError::InvalidPattern(format!("Invalid pattern in include/exclude: {e}"))
    };

    match rule_pattern {
        EnumCopyPatternMode::Literal => Ok(Some(TypeCopyPatternSeq::Literal(patterns.to_vec()))),
        EnumCopyPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| err_invalid(&e))?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            Ok(Some(TypeCopyPatternSeq::Glob(l_glob)))
        }
        EnumCopyPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                l_regex.push(Regex::new(pattern).map_err(|e| err_invalid(&e))?);
            }
            Ok(Some(TypeCopyPatternSeq::Regex(l_regex)))
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
