//! Tri-state result of a lifecycle hook.

/// Outcome of a lifecycle hook.
///
/// `Unset` means the hook is not implemented (or not bound) and counts as
/// success. Only `Failed` ever changes the daemon's course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookOutcome {
    /// No hook ran, or the hook has nothing meaningful to report.
    #[default]
    Unset,
    /// The hook ran and succeeded.
    Passed,
    /// The hook ran and failed.
    Failed,
}

impl HookOutcome {
    /// Build from a plain success flag.
    pub fn from_bool(ok: bool) -> Self {
        if ok { Self::Passed } else { Self::Failed }
    }

    /// Whether the hook explicitly failed.
    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }

    /// Whether the hook was actually run and reported something.
    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    /// `None` for `Unset`, otherwise the success flag.
    pub fn as_option(self) -> Option<bool> {
        match self {
            Self::Unset => None,
            Self::Passed => Some(true),
            Self::Failed => Some(false),
        }
    }
}

impl From<Option<bool>> for HookOutcome {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unset, Self::from_bool)
    }
}

impl From<bool> for HookOutcome {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl std::fmt::Display for HookOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookOutcome::Unset => write!(f, "unset"),
            HookOutcome::Passed => write!(f, "passed"),
            HookOutcome::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        assert_eq!(HookOutcome::default(), HookOutcome::Unset);
    }

    #[test]
    fn test_only_failed_is_failure() {
        assert!(HookOutcome::Failed.is_failed());
        assert!(!HookOutcome::Passed.is_failed());
        assert!(!HookOutcome::Unset.is_failed());
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(HookOutcome::from(None), HookOutcome::Unset);
        assert_eq!(HookOutcome::from(Some(true)), HookOutcome::Passed);
        assert_eq!(HookOutcome::from(Some(false)), HookOutcome::Failed);
        assert_eq!(HookOutcome::Failed.as_option(), Some(false));
        assert_eq!(HookOutcome::Unset.as_option(), None);
    }

    #[test]
    fn test_is_set() {
        assert!(!HookOutcome::Unset.is_set());
        assert!(HookOutcome::from(true).is_set());
    }

    #[test]
    fn test_display() {
        assert_eq!(HookOutcome::Unset.to_string(), "unset");
        assert_eq!(HookOutcome::Passed.to_string(), "passed");
        assert_eq!(HookOutcome::Failed.to_string(), "failed");
    }
}
