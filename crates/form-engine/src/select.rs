//! Option matching for `<select>` controls.

use crate::ports::SelectOption;

/// Cascade rule that produced a match. Earlier rules win.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchRule {
    Exact,
    CaseInsensitive,
    Substring,
    Affirmative,
    Negative,
}

const AFFIRMATIVE_TARGETS: &[&str] = &["yes", "true"];
const AFFIRMATIVE_OPTIONS: &[&str] = &["yes", "true", "1"];
const NEGATIVE_TARGETS: &[&str] = &["no", "false"];
const NEGATIVE_OPTIONS: &[&str] = &["no", "false", "0"];

/// Picks the option for `target`, or `None` when no rule applies.
pub fn match_option(options: &[SelectOption], target: &str) -> Option<(usize, MatchRule)> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    let lowered = target.to_lowercase();

    let exact = options
        .iter()
        .position(|opt| opt.value == target || opt.text.trim() == target);
    if let Some(idx) = exact {
        return Some((idx, MatchRule::Exact));
    }

    let folded = options.iter().position(|opt| {
        opt.value.to_lowercase() == lowered || opt.text.trim().to_lowercase() == lowered
    });
    if let Some(idx) = folded {
        return Some((idx, MatchRule::CaseInsensitive));
    }

    let substring = options.iter().position(|opt| {
        [opt.value.trim(), opt.text.trim()]
            .into_iter()
            .filter(|candidate| !candidate.is_empty())
            .map(str::to_lowercase)
            .any(|candidate| candidate.contains(&lowered) || lowered.contains(&candidate))
    });
    if let Some(idx) = substring {
        return Some((idx, MatchRule::Substring));
    }

    if AFFIRMATIVE_TARGETS.contains(&lowered.as_str()) {
        if let Some(idx) = position_in(options, AFFIRMATIVE_OPTIONS) {
            return Some((idx, MatchRule::Affirmative));
        }
    }
    if NEGATIVE_TARGETS.contains(&lowered.as_str()) {
        if let Some(idx) = position_in(options, NEGATIVE_OPTIONS) {
            return Some((idx, MatchRule::Negative));
        }
    }
    None
}

fn position_in(options: &[SelectOption], accepted: &[&str]) -> Option<usize> {
    options.iter().position(|opt| {
        let value = opt.value.trim().to_lowercase();
        let text = opt.text.trim().to_lowercase();
        accepted.contains(&value.as_str()) || accepted.contains(&text.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> Vec<SelectOption> {
        pairs.iter().map(|(v, t)| SelectOption::new(*v, *t)).collect()
    }

    #[test]
    fn affirmative_rule_maps_true_to_yes_option() {
        let options = opts(&[("1", "Yes"), ("0", "No")]);
        assert_eq!(match_option(&options, "true"), Some((0, MatchRule::Affirmative)));
        assert_eq!(match_option(&options, "false"), Some((1, MatchRule::Negative)));
    }

    #[test]
    fn exact_beats_case_insensitive() {
        let options = opts(&[("ca", "california"), ("CA", "California")]);
        assert_eq!(match_option(&options, "California"), Some((1, MatchRule::Exact)));
        assert_eq!(match_option(&options, "CALIFORNIA"), Some((0, MatchRule::CaseInsensitive)));
    }

    #[test]
    fn substring_works_in_both_directions() {
        let options = opts(&[("", "Select one"), ("us", "United States of America")]);
        assert_eq!(match_option(&options, "united states"), Some((1, MatchRule::Substring)));
        let options = opts(&[("", "Select one"), ("bs", "Bachelor")]);
        assert_eq!(
            match_option(&options, "Bachelor of Science"),
            Some((1, MatchRule::Substring))
        );
    }

    #[test]
    fn empty_placeholder_never_matches_by_substring() {
        let options = opts(&[("", ""), ("x", "Other")]);
        assert_eq!(match_option(&options, "Mars"), None);
    }

    #[test]
    fn blank_target_selects_nothing() {
        let options = opts(&[("", "Select"), ("yes", "Yes")]);
        assert_eq!(match_option(&options, "   "), None);
    }
}
