//! Ordered keyword rules that map free-text model labels onto [`WasteCategory`].
//!
//! Rules are evaluated top to bottom against the lowercased label and the first
//! match wins. Terms match anywhere in the label, including inside longer words.

use regex::Regex;

use crate::model::WasteCategory;

/// Name of the capture group that disqualifies an otherwise matching term.
const VETO_GROUP: &str = "veto";

/// A single `(predicate, category)` pair.
#[derive(Debug, Clone)]
pub struct LabelRule {
    category: WasteCategory,
    include: Regex,
    exclude: Option<Regex>,
}

impl LabelRule {
    fn new(category: WasteCategory, include: &str, exclude: Option<&str>) -> Self {
        Self {
            category,
            include: compile(include),
            exclude: exclude.map(compile),
        }
    }

    /// Category assigned when the rule matches.
    #[must_use]
    pub fn category(&self) -> WasteCategory {
        self.category
    }

    /// Whether the rule accepts an already lowercased label.
    ///
    /// A match of the include pattern counts only when its `veto` group did not
    /// take part, which lets a rule accept "paper" but not "paper cup". After a
    /// vetoed match the scan resumes one character later, so terms inside the
    /// vetoed text ("page" in "paper cupage") are still found.
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        self.includes(label) && !self.exclude.as_ref().is_some_and(|re| re.is_match(label))
    }

    fn includes(&self, label: &str) -> bool {
        let mut start = 0;
        while let Some(caps) = self.include.captures_at(label, start) {
            let Some(whole) = caps.get(0) else {
                return false;
            };
            if caps.name(VETO_GROUP).is_none() {
                return true;
            }
            start = label
                .get(whole.start()..)
                .and_then(|rest| rest.chars().next())
                .map_or(label.len(), |first| whole.start() + first.len_utf8());
            if start >= label.len() {
                return false;
            }
        }
        false
    }
}

// Patterns are literals exercised by the tests below.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("label rule pattern must compile")
}

/// The ordered rule list used to map labels to categories.
#[derive(Debug, Clone)]
pub struct LabelRules {
    rules: Vec<LabelRule>,
}

impl Default for LabelRules {
    fn default() -> Self {
        let rules = vec![
            LabelRule::new(
                WasteCategory::Paper,
                r"newspaper|paper(?P<veto>\s*cup)?|cardboard|carton|corrugated|magazine|notebook|book|page|sheet|paper\s*bag|carton\s*box|cardboard\s*box",
                None,
            ),
            LabelRule::new(
                WasteCategory::Glass,
                r"glass\s*bottle|bottle\s*of\s*glass|glass.*(bottle|jar)|jar|goblet|wineglass|beer\s*bottle|wine\s*bottle|champagne\s*bottle|milk\s*bottle",
                None,
            ),
            LabelRule::new(
                WasteCategory::Metal,
                r"steel|metal|aluminium|aluminum|tin(\s*can)?|soda\s*can|soft\s*drink\s*can|iron|scrap|bolt|screw",
                None,
            ),
            LabelRule::new(
                WasteCategory::Plastic,
                r"plastic|polyethylene|pet\b|polypropylene|water\s*bottle|soda\s*bottle|plastic\s*bottle|pet\s*bottle|disposable\s*cup",
                Some("glass"),
            ),
        ];
        Self { rules }
    }
}

impl LabelRules {
    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[LabelRule] {
        &self.rules
    }

    /// Map a label to its category; [`WasteCategory::Mixed`] when nothing matches.
    #[must_use]
    pub fn categorize(&self, label: &str) -> WasteCategory {
        let normalized = label.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map_or(WasteCategory::Mixed, LabelRule::category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorize(label: &str) -> WasteCategory {
        LabelRules::default().categorize(label)
    }

    #[test]
    fn rules_are_ordered_paper_glass_metal_plastic() {
        let order: Vec<_> = LabelRules::default()
            .rules()
            .iter()
            .map(LabelRule::category)
            .collect();
        assert_eq!(
            order,
            vec![
                WasteCategory::Paper,
                WasteCategory::Glass,
                WasteCategory::Metal,
                WasteCategory::Plastic,
            ]
        );
    }

    #[test]
    fn common_imagenet_labels_map_to_expected_categories() {
        let cases = [
            ("newspaper", WasteCategory::Paper),
            ("carton", WasteCategory::Paper),
            ("comic book", WasteCategory::Paper),
            ("paper towel", WasteCategory::Paper),
            ("beer bottle", WasteCategory::Glass),
            ("wine bottle", WasteCategory::Glass),
            ("goblet", WasteCategory::Glass),
            ("water jug", WasteCategory::Mixed),
            ("beer glass", WasteCategory::Mixed),
            ("tin can", WasteCategory::Metal),
            ("steel drum", WasteCategory::Metal),
            ("screw", WasteCategory::Metal),
            ("water bottle", WasteCategory::Plastic),
            ("pop bottle, soda bottle", WasteCategory::Plastic),
            ("plastic bag", WasteCategory::Plastic),
            ("banana", WasteCategory::Mixed),
        ];
        for (label, expected) in cases {
            assert_eq!(categorize(label), expected, "label {label:?}");
        }
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(categorize("NEWSPAPER"), WasteCategory::Paper);
        assert_eq!(categorize("Plastic Bottle"), WasteCategory::Plastic);
    }

    #[test]
    fn glass_bottle_wins_over_plastic_terms() {
        assert_eq!(categorize("glass bottle"), WasteCategory::Glass);
        assert_eq!(categorize("glass water bottle"), WasteCategory::Glass);
    }

    #[test]
    fn plastic_rule_refuses_labels_mentioning_glass() {
        let rules = LabelRules::default();
        let plastic = &rules.rules()[3];
        assert!(plastic.matches("plastic cup"));
        assert!(!plastic.matches("plastic glass"));
        assert_eq!(categorize("plastic glass"), WasteCategory::Mixed);
    }

    #[test]
    fn paper_cup_is_not_paper() {
        assert_eq!(categorize("paper cup"), WasteCategory::Mixed);
        assert_eq!(categorize("papercup"), WasteCategory::Mixed);
        assert_eq!(categorize("paper cup on newspaper"), WasteCategory::Paper);
        assert_eq!(categorize("paper bag"), WasteCategory::Paper);
    }

    #[test]
    fn terms_inside_a_vetoed_match_still_count() {
        assert_eq!(categorize("paper cupage"), WasteCategory::Paper);
        assert_eq!(categorize("paper cups"), WasteCategory::Mixed);
        assert_eq!(categorize("paper cup, paper cup"), WasteCategory::Mixed);
    }

    #[test]
    fn pet_needs_a_word_end() {
        assert_eq!(categorize("pet bottle"), WasteCategory::Plastic);
        assert_eq!(categorize("petri dish"), WasteCategory::Mixed);
    }

    #[test]
    fn every_label_maps_to_exactly_one_category() {
        for label in ["", " ", "ünïcödé", "???", "tin glass jar paper"] {
            let first = categorize(label);
            assert_eq!(first, categorize(label));
        }
        assert_eq!(categorize(""), WasteCategory::Mixed);
        assert_eq!(categorize("tin glass jar paper"), WasteCategory::Paper);
    }
}
