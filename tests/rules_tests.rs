//! Unit tests for path patterns and the access rule set.

use authgate::rules::{AccessRule, PathPattern, RuleSet};

#[test]
fn exact_pattern_matches_only_itself() {
    let pattern = PathPattern::parse("/teams");
    assert!(pattern.matches("/teams"));
    assert!(!pattern.matches("/teams/1"));
    assert!(!pattern.matches("/team"));
    assert!(!pattern.matches("/teamsx"));
}

#[test]
fn prefix_pattern_matches_base_and_descendants() {
    let pattern = PathPattern::parse("/oauth2/**");
    assert!(pattern.matches("/oauth2"));
    assert!(pattern.matches("/oauth2/"));
    assert!(pattern.matches("/oauth2/callback"));
    assert!(pattern.matches("/oauth2/callback/deep"));
    assert!(!pattern.matches("/oauth2x"));
    assert!(!pattern.matches("/oauth"));
}

#[test]
fn pattern_display_round_trips() {
    assert_eq!(PathPattern::parse("/teams").to_string(), "/teams");
    assert_eq!(PathPattern::parse("/oauth2/**").to_string(), "/oauth2/**");
}

#[test]
fn first_matching_rule_wins() {
    let rules = RuleSet::new(vec![
        AccessRule::public("/api/**"),
        AccessRule::authenticated("/api/admin"),
    ]);
    // "/api/admin" matches the public prefix rule before the specific one.
    assert!(!rules.match_path("/api/admin").requires_auth);

    let rules = RuleSet::new(vec![
        AccessRule::authenticated("/api/admin"),
        AccessRule::public("/api/**"),
    ]);
    assert!(rules.match_path("/api/admin").requires_auth);
    assert!(!rules.match_path("/api/teams").requires_auth);
}

#[test]
fn unmatched_paths_fall_back_to_authenticated() {
    let rules = RuleSet::public_paths(["/teams", "/games"]);
    let rule = rules.match_path("/admin");
    assert!(rule.requires_auth);
    let rule = rules.match_path("/");
    assert!(rule.requires_auth);
}

#[test]
fn public_paths_factory_builds_public_rules_in_order() {
    let rules = RuleSet::public_paths(["/teams", "/games", "/login", "/oauth2/**"]);
    assert_eq!(rules.rules().len(), 4);
    assert!(rules.rules().iter().all(|r| !r.requires_auth));
    assert!(!rules.match_path("/teams").requires_auth);
    assert!(!rules.match_path("/oauth2/callback").requires_auth);
}
