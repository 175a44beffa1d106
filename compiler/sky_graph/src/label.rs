//! Build labels: `//package/path:name`.

use std::fmt;

use crate::GraphError;

/// Identifies one rule in the build graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildLabel {
    pub package: String,
    pub name: String,
}

impl BuildLabel {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        BuildLabel {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Parse an absolute label, or a `:name` label relative to `current`.
    ///
    /// `//pkg` is shorthand for `//pkg:<last component of pkg>`.
    pub fn parse(text: &str, current: &str) -> Result<Self, GraphError> {
        let invalid = |reason| GraphError::InvalidLabel {
            label: text.to_string(),
            reason,
        };
        if let Some(name) = text.strip_prefix(':') {
            validate_rule_name(name).map_err(|_| invalid("invalid rule name"))?;
            return Ok(BuildLabel::new(current, name));
        }
        let Some(rest) = text.strip_prefix("//") else {
            return Err(invalid("must start with // or :"));
        };
        let (package, name) = match rest.split_once(':') {
            Some((package, name)) => (package, name),
            None => (rest, rest.rsplit('/').next().unwrap_or(rest)),
        };
        validate_package_name(package).map_err(invalid)?;
        validate_rule_name(name).map_err(|_| invalid("invalid rule name"))?;
        Ok(BuildLabel::new(package, name))
    }
}

impl fmt::Display for BuildLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}:{}", self.package, self.name)
    }
}

fn validate_package_name(package: &str) -> Result<(), &'static str> {
    if package.is_empty() {
        return Ok(());
    }
    for segment in package.split('/') {
        match segment {
            "" => return Err("empty path component"),
            "." | ".." => return Err("relative path component"),
            s if s.chars().any(|c| c.is_whitespace() || c == ':') => {
                return Err("invalid character in package path");
            }
            _ => {}
        }
    }
    Ok(())
}

/// Rule names are non-empty and contain no whitespace, `:` or `/`.
pub fn validate_rule_name(name: &str) -> Result<(), GraphError> {
    let invalid = |reason| GraphError::InvalidRuleName {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    if name.chars().any(|c| c.is_whitespace() || c == ':' || c == '/') {
        return Err(invalid("contains whitespace, ':' or '/'"));
    }
    Ok(())
}
