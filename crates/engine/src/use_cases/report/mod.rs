//! Parent-facing report: an ordered rule list over the progress record.
//!
//! Rules are independent - no rule depends on another having fired - but
//! declaration order decides output order, so any substitute implementation
//! must preserve it.

use chatling_domain::{BadgeId, ScenarioId, UserProgress};

/// Shown when no rule matches.
pub const NOT_STARTED_MESSAGE: &str =
    "The adventure is just beginning. Progress will show up here soon.";

/// One (predicate, message) rule.
pub struct ReportRule {
    pub text: &'static str,
    pub predicate: fn(&UserProgress) -> bool,
}

/// The built-in rule list.
pub fn default_rules() -> Vec<ReportRule> {
    vec![
        ReportRule {
            text: "Has shown interest in the basics of technology and understands \
                   that AI learns from examples (patterns).",
            predicate: |p| p.is_completed(&ScenarioId::from("intro-ia")),
        },
        ReportRule {
            text: "Excellent intuition! Answered the machine-learning questions correctly.",
            predicate: |p| p.score_for(&ScenarioId::from("intro-ia")).unwrap_or(0) >= 80,
        },
        ReportRule {
            text: "Cares about the ethical use of technology. A very mature trait.",
            predicate: |p| p.has_badge(&BadgeId::from("badge-guardian")),
        },
        ReportRule {
            text: "A consistent learner - has completed multiple missions.",
            predicate: |p| p.completed_scenarios.len() >= 3,
        },
    ]
}

/// Evaluates rules against a progress snapshot.
pub struct ParentReport {
    rules: Vec<ReportRule>,
}

impl ParentReport {
    pub fn new(rules: Vec<ReportRule>) -> Self {
        Self { rules }
    }

    /// Collect all matching messages in rule-declaration order, joined into
    /// one block.
    pub fn compute(&self, state: &UserProgress) -> String {
        let comments: Vec<&str> = self
            .rules
            .iter()
            .filter(|rule| (rule.predicate)(state))
            .map(|rule| rule.text)
            .collect();

        if comments.is_empty() {
            NOT_STARTED_MESSAGE.to_string()
        } else {
            comments.join(" ")
        }
    }
}

impl Default for ParentReport {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_progress_reports_not_started() {
        let report = ParentReport::default();
        assert_eq!(
            report.compute(&UserProgress::default()),
            NOT_STARTED_MESSAGE
        );
    }

    #[test]
    fn matches_collect_in_declaration_order() {
        let mut progress = UserProgress::default();
        progress.mark_completed(ScenarioId::from("intro-ia"));
        progress.record_score(ScenarioId::from("intro-ia"), 90);

        let report = ParentReport::default();
        let text = report.compute(&progress);

        let basics = text.find("basics of technology").expect("first rule fired");
        let intuition = text.find("Excellent intuition").expect("second rule fired");
        assert!(basics < intuition);
        assert!(!text.contains("ethical use"));
    }

    #[test]
    fn rules_are_independent() {
        // The count rule can fire without the intro rule
        let mut progress = UserProgress::default();
        progress.mark_completed(ScenarioId::from("a"));
        progress.mark_completed(ScenarioId::from("b"));
        progress.mark_completed(ScenarioId::from("c"));

        let text = ParentReport::default().compute(&progress);
        assert!(text.contains("consistent learner"));
        assert!(!text.contains("basics of technology"));
    }
}
