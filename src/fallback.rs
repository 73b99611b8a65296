use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::PlanFields;

static WEEK_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Default plan length when the duration string carries no number.
const DEFAULT_WEEKS: u32 = 4;

/// Ceiling on the week count, 5 years. Keeps the phase arithmetic far
/// away from u32 overflow on absurd inputs.
const MAX_WEEKS: u32 = 260;

/// Parse the week count from a free-text duration like "6 weeks" or
/// "about 12 weeks". Takes the first run of digits; anything without a
/// number ("a couple of months") falls back to 4 weeks. Capped at
/// MAX_WEEKS.
pub fn parse_weeks(duration: &str) -> u32 {
    WEEK_COUNT
        .find(duration)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|&w| w > 0)
        .map(|w| w.min(MAX_WEEKS))
        .unwrap_or(DEFAULT_WEEKS)
}

/// Build a templated study plan without any model call. Pure function:
/// identical inputs always produce byte-identical output, so this is
/// safe to use as the last resort when every model is down.
pub fn generate_fallback_plan(fields: PlanFields<'_>) -> String {
    let weeks = parse_weeks(fields.duration);

    // Phase 1 covers week 1, plus week 2 on longer plans.
    let phase1_end = if weeks > 2 { 2 } else { 1 };
    // Phase 2 runs through 70% of the plan, Phase 3 up to the last week.
    let phase2_start = phase1_end + 1;
    let phase2_end = div_ceil_10(weeks * 7);
    let phase3_start = phase2_end + 1;
    let phase3_end = weeks.saturating_sub(1);

    let mut plan = String::new();

    plan.push_str(&format!("📚 STUDY PLAN: {}\n\n", fields.subject));

    plan.push_str("## Overview\n");
    plan.push_str(&format!(
        "A {}-week study plan for {} at the {} level.\n",
        weeks, fields.subject, fields.level
    ));
    plan.push_str(&format!("Goals: {}\n\n", fields.goals));

    plan.push_str("## Daily Structure\n");
    plan.push_str("- 15 min: review notes from the previous session\n");
    plan.push_str(&format!(
        "- 45 min: focused learning of new {} material\n",
        fields.subject
    ));
    plan.push_str("- 30 min: hands-on practice or exercises\n");
    plan.push_str("- 10 min: summarize what you learned in your own words\n\n");

    plan.push_str("## Weekly Milestones\n");
    plan.push_str(&format!(
        "- {}: Foundations. Survey the core concepts of {}, set up your tools and resources, and map what you already know.\n",
        week_range(1, phase1_end),
        fields.subject
    ));
    if phase2_start <= phase2_end {
        plan.push_str(&format!(
            "- {}: Core practice. Work through the main topics one by one, with exercises after each.\n",
            week_range(phase2_start, phase2_end)
        ));
    }
    if phase3_start <= phase3_end {
        plan.push_str(&format!(
            "- {}: Applied work. Combine topics in a small project that matches your goals.\n",
            week_range(phase3_start, phase3_end)
        ));
    }
    plan.push_str(&format!(
        "- Week {}: Review and assessment. Revisit weak spots, test yourself, and plan next steps.\n\n",
        weeks
    ));

    plan.push_str("## Tips\n");
    plan.push_str("- Study at the same time every day; consistency beats intensity.\n");
    plan.push_str("- Take short breaks every 45-50 minutes.\n");
    plan.push_str("- Explain concepts out loud to check your understanding.\n");
    plan.push_str("- Track your progress weekly against the milestones above.\n");

    plan
}

/// ceil(n / 10) in integer math, used for the 70% phase boundary.
fn div_ceil_10(n: u32) -> u32 {
    (n + 9) / 10
}

/// "Week 3" for a single week, "Week 1-2" for a span.
fn week_range(start: u32, end: u32) -> String {
    if start == end {
        format!("Week {}", start)
    } else {
        format!("Week {}-{}", start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(duration: &str) -> PlanFields<'_> {
        PlanFields {
            subject: "Rust",
            level: "beginner",
            duration,
            goals: "write a CLI tool",
        }
    }

    #[test]
    fn test_parse_weeks_takes_first_digit_run() {
        assert_eq!(parse_weeks("6 weeks"), 6);
        assert_eq!(parse_weeks("about 12 weeks, maybe 14"), 12);
        assert_eq!(parse_weeks("3weeks"), 3);
    }

    #[test]
    fn test_parse_weeks_defaults_to_four() {
        assert_eq!(parse_weeks("a couple of months"), 4);
        assert_eq!(parse_weeks(""), 4);
        assert_eq!(parse_weeks("0 weeks"), 4);
    }

    #[test]
    fn test_huge_week_counts_are_capped() {
        assert_eq!(parse_weeks("700000000 weeks"), 260);
        // Must stay panic-free and still produce a complete plan.
        let plan = generate_fallback_plan(fields("700000000 weeks"));
        assert!(plan.contains("A 260-week study plan"));
        assert!(plan.contains("- Week 260: Review and assessment"));
    }

    #[test]
    fn test_short_plans_have_single_week_phase_one() {
        for duration in ["1 week", "2 weeks"] {
            let plan = generate_fallback_plan(fields(duration));
            assert!(plan.contains("- Week 1: Foundations"), "{}", duration);
            assert!(!plan.contains("Week 1-2"), "{}", duration);
        }
    }

    #[test]
    fn test_longer_plans_have_two_week_phase_one() {
        let plan = generate_fallback_plan(fields("3 weeks"));
        assert!(plan.contains("- Week 1-2: Foundations"));
    }

    #[test]
    fn test_phase_boundaries_for_ten_weeks() {
        let plan = generate_fallback_plan(fields("10 weeks"));
        assert!(plan.contains("- Week 1-2: Foundations"));
        assert!(plan.contains("- Week 3-7: Core practice"));
        assert!(plan.contains("- Week 8-9: Applied work"));
        assert!(plan.contains("- Week 10: Review and assessment"));
    }

    #[test]
    fn test_degenerate_phases_are_omitted() {
        // 4 weeks: phase 2 ends at ceil(2.8) = 3, leaving no room for phase 3.
        let plan = generate_fallback_plan(fields("4 weeks"));
        assert!(plan.contains("- Week 3: Core practice"));
        assert!(!plan.contains("Applied work"));
        assert!(plan.contains("- Week 4: Review and assessment"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = generate_fallback_plan(fields("8 weeks"));
        let b = generate_fallback_plan(fields("8 weeks"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_digits_builds_four_week_plan() {
        let plan = generate_fallback_plan(fields("a few months"));
        assert!(plan.contains("A 4-week study plan"));
        assert!(plan.contains("- Week 4: Review and assessment"));
    }

    #[test]
    fn test_all_four_fields_are_interpolated() {
        let plan = generate_fallback_plan(PlanFields {
            subject: "linear algebra",
            level: "intermediate",
            duration: "5 weeks",
            goals: "pass the qualifier",
        });
        assert!(plan.contains("linear algebra"));
        assert!(plan.contains("intermediate"));
        assert!(plan.contains("5-week"));
        assert!(plan.contains("pass the qualifier"));
    }
}
