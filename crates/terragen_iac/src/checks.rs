//! Local structural checks for Terraform sources.
//!
//! These checks are deterministic, read-only, and need no credentials or
//! external tooling. They catch the failure modes a model most often
//! produces: truncated blocks, unbalanced delimiters, and empty output.

use std::sync::OnceLock;

use regex::Regex;
use terragen_core::Finding;

use crate::bundle::TerraformBundle;

// Matches top-level resource/module/data block openings.
fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"(?m)^\s*(resource|module|data)\s+""#).unwrap())
}

/// Structural checker for Terraform file contents.
#[derive(Debug, Clone, Default)]
pub struct StructuralChecker;

impl StructuralChecker {
    pub fn new() -> Self {
        Self
    }

    /// Check a single file's content.
    pub fn check_file(&self, path: &str, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        let open_braces = content.matches('{').count();
        let close_braces = content.matches('}').count();
        if open_braces != close_braces {
            findings.push(
                Finding::error(
                    path,
                    format!(
                        "unbalanced braces: {} opening, {} closing",
                        open_braces, close_braces
                    ),
                )
                .with_fix("close every block that was opened"),
            );
        }

        let open_brackets = content.matches('[').count();
        let close_brackets = content.matches(']').count();
        if open_brackets != close_brackets {
            findings.push(
                Finding::error(
                    path,
                    format!(
                        "unbalanced brackets: {} opening, {} closing",
                        open_brackets, close_brackets
                    ),
                )
                .with_fix("close every list that was opened"),
            );
        }

        if content.matches('"').count() % 2 != 0 {
            findings.push(
                Finding::error(path, "unmatched quotes detected")
                    .with_fix("terminate the dangling string literal"),
            );
        }

        findings
    }

    /// Check every file in a bundle, plus bundle-level rules.
    pub fn check_bundle(&self, bundle: &TerraformBundle) -> Vec<Finding> {
        let mut findings = Vec::new();

        if bundle.is_empty() {
            findings.push(
                Finding::error("bundle", "bundle contains no modules or environments")
                    .with_fix("generate at least one module or environment"),
            );
            return findings;
        }

        let mut has_block = false;
        for (path, content) in bundle.files() {
            findings.extend(self.check_file(&path, content));
            if block_pattern().is_match(content) {
                has_block = true;
            }
        }

        if !has_block {
            findings.push(
                Finding::error("bundle", "no resource, module, or data blocks found")
                    .with_fix("declare the resources the architecture requires"),
            );
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{TerraformFile, TerraformModule};
    use terragen_core::Severity;

    fn bundle_with(content: &str) -> TerraformBundle {
        TerraformBundle {
            terraform_version: "1.5".to_string(),
            modules: vec![TerraformModule {
                module_name: "vpc".to_string(),
                path: String::new(),
                files: vec![TerraformFile {
                    filename: "main.tf".to_string(),
                    content: content.to_string(),
                }],
            }],
            environments: Default::default(),
        }
    }

    #[test]
    fn test_clean_file_passes() {
        let checker = StructuralChecker::new();
        let bundle =
            bundle_with("resource \"google_compute_network\" \"vpc\" {\n  name = \"vpc\"\n}\n");
        assert!(checker.check_bundle(&bundle).is_empty());
    }

    #[test]
    fn test_unbalanced_braces_flagged() {
        let checker = StructuralChecker::new();
        let findings = checker.check_file("main.tf", "resource \"a\" \"b\" {\n");
        assert!(findings
            .iter()
            .any(|f| f.message.contains("unbalanced braces") && f.severity == Severity::Error));
    }

    #[test]
    fn test_odd_quote_count_flagged() {
        let checker = StructuralChecker::new();
        let findings = checker.check_file("main.tf", "name = \"broken");
        assert!(findings.iter().any(|f| f.message.contains("unmatched quotes")));
    }

    #[test]
    fn test_unbalanced_brackets_flagged() {
        let checker = StructuralChecker::new();
        let findings = checker.check_file("main.tf", "zones = [\"a\", \"b\"");
        assert!(findings.iter().any(|f| f.message.contains("unbalanced brackets")));
    }

    #[test]
    fn test_missing_blocks_flagged() {
        let checker = StructuralChecker::new();
        let bundle = bundle_with("locals {\n  x = 1\n}\n");
        let findings = checker.check_bundle(&bundle);
        assert!(findings
            .iter()
            .any(|f| f.message.contains("no resource, module, or data blocks")));
    }

    #[test]
    fn test_empty_bundle_flagged() {
        let checker = StructuralChecker::new();
        let bundle = TerraformBundle {
            terraform_version: "1.5".to_string(),
            modules: Vec::new(),
            environments: Default::default(),
        };
        let findings = checker.check_bundle(&bundle);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("no modules or environments"));
    }
}
