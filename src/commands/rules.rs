use serde::Serialize;
use crate::config::RuleSpec;
use super::CommandType;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidationRule {
    pub id: String,
    pub description: String,
    pub active: bool,
    /// Only ever increases.
    pub violations: u64,
}

impl ValidationRule {
    pub fn from_spec(spec: &RuleSpec) -> Self {
        Self {
            id: spec.id.clone(),
            description: spec.description.clone(),
            active: spec.active,
            violations: 0,
        }
    }

    pub fn applies_to(&self, command_type: CommandType) -> bool {
        CommandType::for_rule(&self.id) == Some(command_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_to_matching_type_only() {
        let rule = ValidationRule::from_spec(&RuleSpec::new("recursive-depth-limit", "depth"));
        assert!(rule.applies_to(CommandType::Recursive));
        assert!(!rule.applies_to(CommandType::Parallel));
        assert_eq!(rule.violations, 0);
    }
}
