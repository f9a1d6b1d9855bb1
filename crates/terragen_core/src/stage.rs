//! Pipeline stage identifiers.

use serde::{Deserialize, Serialize};

/// Stages of the generation pipeline, in data-flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Requirements,
    Architecture,
    Generate,
    Validate,
    Document,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Requirements => "requirements",
            StageId::Architecture => "architecture",
            StageId::Generate => "generate",
            StageId::Validate => "validate",
            StageId::Document => "document",
        }
    }

    /// Get the default order of stages in a run.
    pub fn default_order() -> Vec<StageId> {
        vec![
            StageId::Requirements,
            StageId::Architecture,
            StageId::Generate,
            StageId::Validate,
            StageId::Document,
        ]
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_is_complete() {
        let order = StageId::default_order();
        assert_eq!(order.len(), 5);
        assert_eq!(order.first(), Some(&StageId::Requirements));
        assert_eq!(order.last(), Some(&StageId::Document));
    }
}
