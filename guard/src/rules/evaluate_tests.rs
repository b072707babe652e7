use super::*;
use crate::rules::model::{Tags, ViolationKind};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn sample_rules() -> Vec<Rule> {
    vec![
        Rule::new("rule-001", "site").with_allowed_values(["us", "en"]),
        Rule::new("rule-002", "environment").with_allowed_values(["dev", "staging", "prod"]),
        Rule::new("rule-003", "cost-center"),
    ]
}

fn instance() -> Resource {
    Resource::new("i-0123456789abcdef0", "ec2:instance")
        .in_region("us-east-1")
        .in_account("123456789012")
}

#[test]
fn missing_tag_is_reported() -> Result<()> {
    let resource = instance().with_tag("Name", "test-instance");
    let rules = vec![Rule::new("rule-001", "site").with_allowed_values(["us", "en"])];

    let report = evaluate(&resource, &rules)?;

    assert!(!report.compliant);
    assert_eq!(
        report.violations,
        vec![Violation {
            rule_id: "rule-001".to_string(),
            tag_key: "site".to_string(),
            kind: ViolationKind::Missing,
            actual_value: None,
            allowed_values: vec!["us".to_string(), "en".to_string()],
        }]
    );
    Ok(())
}

#[test]
fn all_rules_satisfied() -> Result<()> {
    let resource = instance()
        .with_tag("site", "us")
        .with_tag("environment", "dev")
        .with_tag("cost-center", "engineering");

    let report = evaluate(&resource, &sample_rules())?;

    assert!(report.compliant);
    assert!(report.violations.is_empty());
    assert_eq!(report.rules_evaluated, 3);
    assert_eq!(report.rules_supplied, 3);
    assert_eq!(report.resource_id, "i-0123456789abcdef0");
    assert_eq!(report.region, "us-east-1");
    assert_eq!(report.account_id, "123456789012");
    Ok(())
}

#[test]
fn disallowed_value_is_reported_with_actual_value() -> Result<()> {
    let resource = instance().with_tag("site", "fr");
    let rules = vec![Rule::new("rule-001", "site").with_allowed_values(["us", "en"])];

    let report = evaluate(&resource, &rules)?;

    assert!(!report.compliant);
    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.kind, ViolationKind::InvalidValue);
    assert_eq!(violation.actual_value.as_deref(), Some("fr"));
    assert_eq!(violation.allowed_values, vec!["us", "en"]);
    Ok(())
}

#[test]
fn disabled_rule_never_contributes() -> Result<()> {
    let resource = instance();
    let rules = vec![Rule::new("rule-001", "site").disabled()];

    let report = evaluate(&resource, &rules)?;

    assert!(report.compliant);
    assert_eq!(report.rules_evaluated, 0);
    assert_eq!(report.rules_supplied, 1);
    Ok(())
}

#[test]
fn rule_for_other_resource_type_is_skipped() -> Result<()> {
    let resource = instance();
    let rules = vec![Rule::new("bucket-owner", "owner").with_resource_types(["s3:bucket"])];

    let report = evaluate(&resource, &rules)?;

    assert!(report.compliant);
    assert_eq!(report.rules_evaluated, 0);
    Ok(())
}

#[test]
fn rule_for_matching_resource_type_applies() -> Result<()> {
    let resource = Resource::new("my-bucket", "s3:bucket");
    let rules = vec![Rule::new("bucket-owner", "owner").with_resource_types(["ec2:instance", "s3:bucket"])];

    let report = evaluate(&resource, &rules)?;

    assert!(!report.compliant);
    assert_eq!(report.missing_tags(), vec!["owner"]);
    Ok(())
}

#[test]
fn empty_rules_are_trivially_compliant() -> Result<()> {
    let resource = instance().with_tag("site", "us");

    let report = evaluate(&resource, &[])?;

    assert!(report.compliant);
    assert!(report.violations.is_empty());
    assert_eq!(report.rules_evaluated, 0);
    assert_eq!(report.rules_supplied, 0);
    Ok(())
}

#[test]
fn empty_tag_set_fails_every_applicable_rule() -> Result<()> {
    let report = evaluate(&instance(), &sample_rules())?;

    assert!(!report.compliant);
    assert_eq!(report.missing_tags(), vec!["site", "environment", "cost-center"]);
    Ok(())
}

#[test]
fn any_value_accepted_when_allowed_values_empty() -> Result<()> {
    let rules = vec![Rule::new("rule-1", "owner")];

    let report = evaluate(&instance().with_tag("owner", "any-random-value"), &rules)?;
    assert!(report.compliant);

    let report = evaluate(&instance().with_tag("owner", ""), &rules)?;
    assert!(report.compliant);
    Ok(())
}

#[test]
fn empty_value_is_checked_against_allowed_values() -> Result<()> {
    let rules = vec![Rule::new("rule-1", "environment").with_allowed_values(["dev"])];

    let report = evaluate(&instance().with_tag("environment", ""), &rules)?;

    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, ViolationKind::InvalidValue);
    assert_eq!(report.violations[0].actual_value.as_deref(), Some(""));
    Ok(())
}

#[rstest]
#[case::key("Environment", "environment", "dev", ViolationKind::Missing)]
#[case::value("environment", "environment", "Dev", ViolationKind::InvalidValue)]
fn matching_is_case_sensitive(
    #[case] rule_key: &str,
    #[case] tag_key: &str,
    #[case] tag_value: &str,
    #[case] expected: ViolationKind,
) -> Result<()> {
    let rules = vec![Rule::new("rule-1", rule_key).with_allowed_values(["dev", "prod"])];

    let report = evaluate(&instance().with_tag(tag_key, tag_value), &rules)?;

    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].kind, expected);
    Ok(())
}

#[test]
fn violations_follow_rule_order() -> Result<()> {
    let rules = vec![
        Rule::new("r-4", "owner"),
        Rule::new("r-1", "site").with_allowed_values(["us"]),
        Rule::new("r-3", "skipped").disabled(),
        Rule::new("r-2", "environment").with_allowed_values(["prod"]),
        Rule::new("r-0", "team"),
    ];
    let resource = instance()
        .with_tag("environment", "dev")
        .with_tag("site", "fr");

    let report = evaluate(&resource, &rules)?;

    let order = report
        .violations
        .iter()
        .map(|v| (v.rule_id.as_str(), v.kind))
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            ("r-4", ViolationKind::Missing),
            ("r-1", ViolationKind::InvalidValue),
            ("r-2", ViolationKind::InvalidValue),
            ("r-0", ViolationKind::Missing),
        ]
    );
    assert_eq!(report.rules_evaluated, 4);
    assert_eq!(report.rules_supplied, 5);
    Ok(())
}

#[test]
fn one_violation_per_rule() -> Result<()> {
    let rules = vec![
        Rule::new("a", "site").with_allowed_values(["us"]),
        Rule::new("b", "site").with_allowed_values(["en"]),
    ];

    let report = evaluate(&instance().with_tag("site", "us"), &rules)?;

    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].rule_id, "b");
    Ok(())
}

#[test]
fn evaluation_is_deterministic() -> Result<()> {
    let resource = instance()
        .with_tag("Name", "test-instance")
        .with_tag("environment", "invalid-env");
    let rules = sample_rules();

    let first = evaluate(&resource, &rules)?;
    let second = evaluate(&resource, &rules)?;

    assert_eq!(first, second);
    Ok(())
}

#[rstest]
#[case::empty_id(Resource::new("", "ec2:instance"))]
#[case::empty_type(Resource::new("i-123", ""))]
fn invalid_resource_is_rejected(#[case] resource: Resource) {
    let result = evaluate(&resource, &sample_rules());
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn empty_resource_is_rejected_even_without_rules() {
    let result = evaluate(&Resource::new("", ""), &[]);
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[rstest]
#[case::enabled(Rule::new("broken", ""))]
#[case::disabled(Rule::new("broken", "").disabled())]
#[case::other_type(Rule::new("broken", "").with_resource_types(["s3:bucket"]))]
fn rule_with_empty_tag_key_is_rejected(#[case] broken: Rule) {
    let mut rules = sample_rules();
    rules.push(broken);

    let result = evaluate(&instance(), &rules);

    match result {
        Err(Error::InvalidInput(msg)) => assert!(msg.contains("broken")),
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn tags_from_list_reject_duplicates() {
    let tags = vec![
        crate::rules::model::Tag::new("site", "us"),
        crate::rules::model::Tag::new("site", "en"),
    ];
    assert!(matches!(
        Tags::try_from(tags),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn applicable_rules_keeps_input_order() {
    let rules = vec![
        Rule::new("a", "owner").with_resource_types(["s3:bucket"]),
        Rule::new("b", "owner"),
        Rule::new("c", "owner").disabled(),
        Rule::new("d", "owner").with_resource_types(["ec2:instance"]),
    ];

    let ids = applicable_rules("ec2:instance", &rules)
        .map(|r| r.rule_id.as_str())
        .collect::<Vec<_>>();

    assert_eq!(ids, vec!["b", "d"]);
}
