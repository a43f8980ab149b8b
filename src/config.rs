//! Parser configuration.

use smol_str::SmolStr;

/// Knobs for one parse context.
///
/// ```
/// use javelin_syntax::ParserConfig;
///
/// let config = ParserConfig::default()
///     .with_recovery_threshold(10)
///     .with_implicit_classes(false);
/// assert_eq!(config.recovery_threshold, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Consecutive errors allowed at one token before recovery forcibly
    /// consumes it.
    pub recovery_threshold: u32,
    /// Deepest nesting of blocks, class bodies and parenthesized expressions
    /// parsed before the rest of the construct is skipped as one error.
    pub max_nesting_depth: u32,
    /// Deepest nesting of speculative sub-parses.
    pub max_speculation_depth: u32,
    /// Whether top-level methods and fields are gathered into an implicit class.
    pub allow_implicit_classes: bool,
    /// Name given to the implicit class.
    pub implicit_class_name: SmolStr,
    /// Whether doc comments are recorded in the position table.
    pub collect_doc_comments: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            recovery_threshold: 50,
            max_nesting_depth: 128,
            max_speculation_depth: 8,
            allow_implicit_classes: true,
            implicit_class_name: SmolStr::new_static("Main"),
            collect_doc_comments: true,
        }
    }
}

impl ParserConfig {
    pub fn with_recovery_threshold(mut self, threshold: u32) -> Self {
        self.recovery_threshold = threshold;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: u32) -> Self {
        self.max_nesting_depth = depth.max(1);
        self
    }

    pub fn with_max_speculation_depth(mut self, depth: u32) -> Self {
        self.max_speculation_depth = depth;
        self
    }

    pub fn with_implicit_classes(mut self, allow: bool) -> Self {
        self.allow_implicit_classes = allow;
        self
    }

    pub fn with_implicit_class_name(mut self, name: impl Into<SmolStr>) -> Self {
        self.implicit_class_name = name.into();
        self
    }

    pub fn with_doc_comments(mut self, collect: bool) -> Self {
        self.collect_doc_comments = collect;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.recovery_threshold, 50);
        assert!(config.allow_implicit_classes);
        assert_eq!(config.implicit_class_name, "Main");
    }

    #[test]
    fn nesting_depth_is_at_least_one() {
        assert_eq!(ParserConfig::default().with_max_nesting_depth(0).max_nesting_depth, 1);
    }
}
