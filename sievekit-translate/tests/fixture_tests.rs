//! Fixture tests for both translation directions
//!
//! Each fixture pairs a simple filter with the exact tree it compiles to.
//! Tests verify:
//! - Compilation reproduces the tree node for node
//! - Decompilation recovers the simple filter, labels included
//! - Trees with no simple rendering degrade to `{}`

use serde_json::json;
use sievekit_test_utils::assertions::{assert_invalid_input, assert_single_node, assert_unsupported};
use sievekit_test_utils::fixtures::*;
use sievekit_test_utils::FilterTree;
use sievekit_translate::SieveTranslator;

fn translator() -> SieveTranslator {
    SieveTranslator::default()
}

// ============================================================================
// SIMPLE ⇄ TREE PAIRS
// ============================================================================

#[test]
fn test_example_a_subject_contains_v1() {
    let t = translator();
    assert_eq!(t.to_tree(&example_a_simple(), Some(1)).unwrap(), example_a_tree());
    assert_eq!(t.from_tree(&example_a_tree()).unwrap(), example_a_simple());
}

#[test]
fn test_default_version_is_v1() {
    assert_eq!(
        translator().to_tree(&example_a_simple(), None).unwrap(),
        example_a_tree()
    );
}

#[test]
fn test_example_b_starts_and_ends_v2() {
    let t = translator();
    let tree = t.to_tree(&starts_ends_simple(), Some(2)).unwrap();
    assert_eq!(tree, starts_ends_tree());
    assert!(tree[4]["Text"].as_str().unwrap().contains("@comparator starts"));
    assert_eq!(t.from_tree(&tree).unwrap(), starts_ends_simple());
}

#[test]
fn test_starts_and_ends_collapse_to_matches_in_v1() {
    let t = translator();
    let tree = t.to_tree(&starts_ends_simple(), Some(1)).unwrap();
    assert_eq!(tree, v1_matches_tree());
    assert_eq!(t.from_tree(&tree).unwrap(), v1_matches_simple());
}

#[test]
fn test_matches_filter_v1_both_ways() {
    let t = translator();
    assert_eq!(t.to_tree(&v1_matches_simple(), Some(1)).unwrap(), v1_matches_tree());
    assert_eq!(t.from_tree(&v1_matches_tree()).unwrap(), v1_matches_simple());
}

#[test]
fn test_attachments_v2() {
    let t = translator();
    assert_eq!(
        t.to_tree(&attachments_simple("contains"), Some(2)).unwrap(),
        attachments_tree()
    );
    assert_eq!(t.from_tree(&attachments_tree()).unwrap(), attachments_simple("contains"));
}

#[test]
fn test_example_c_negated_attachments() {
    let t = translator();
    let tree = t.to_tree(&attachments_simple("!contains"), Some(2)).unwrap();

    assert_eq!(
        tree[4]["Text"],
        json!("/**\r\n * @type and\r\n * @comparator !default\r\n */")
    );
    assert_eq!(
        tree[5]["If"]["Tests"][0],
        json!({
            "Test": { "Headers": ["X-Attached"], "Type": "Exists" },
            "Type": "Not"
        })
    );

    let simple = t.from_tree(&tree).unwrap();
    assert_eq!(simple["Conditions"][0]["Type"]["value"], "attachments");
    assert_eq!(simple["Conditions"][0]["Comparator"]["value"], "!contains");
    assert_eq!(simple, attachments_simple("!contains"));
}

#[test]
fn test_vacation_v2() {
    let t = translator();
    assert_eq!(t.to_tree(&vacation_simple(), Some(2)).unwrap(), vacation_tree());
    assert_eq!(t.from_tree(&vacation_tree()).unwrap(), vacation_simple());
}

#[test]
fn test_vacation_with_empty_args_decompiles() {
    let mut tree = vacation_tree();
    tree[5]["Then"][0]["Args"] = json!([]);
    assert_eq!(translator().from_tree(&tree).unwrap(), vacation_simple());

    tree[5]["Then"][0].as_object_mut().unwrap().remove("Args");
    assert_eq!(translator().from_tree(&tree).unwrap(), vacation_simple());
}

#[test]
fn test_example_e_escaped_variables_v2() {
    let t = translator();
    let tree = t.to_tree(&escape_variables_simple(), Some(2)).unwrap();
    assert_eq!(tree, escape_variables_tree());

    let message = &tree[6]["Then"][5]["Message"];
    assert_eq!(message["Type"], "VariableString");
    assert!(message["Value"].as_str().unwrap().contains("${dollar}{d3_so}"));

    let typed: FilterTree = serde_json::from_value(tree.clone()).unwrap();
    assert_single_node(&typed, "Set");

    assert_eq!(t.from_tree(&tree).unwrap(), escape_variables_simple());
}

#[test]
fn test_legacy_layout_still_decompiles() {
    assert_eq!(
        translator().from_tree(&legacy_escape_variables_tree()).unwrap(),
        escape_variables_simple()
    );
}

#[test]
fn test_v1_escaped_variables_require_variables_extension() {
    let tree = translator()
        .to_tree(&escape_variables_simple(), Some(1))
        .unwrap();
    assert_eq!(
        tree[0],
        json!({ "List": ["fileinto", "imap4flags", "vacation", "variables"], "Type": "Require" })
    );
    assert_eq!(tree[1]["Type"], "Set");
    assert_eq!(tree.as_array().map(Vec::len), Some(3));
}

// ============================================================================
// TREES WITHOUT A SIMPLE RENDERING
// ============================================================================

#[test]
fn test_example_d_reject_is_unsupported() {
    let t = translator();
    assert_unsupported(&t.decompile_value(&reject_tree()));
    assert_eq!(t.from_tree(&reject_tree()).unwrap(), json!({}));
}

#[test]
fn test_spam_guard_alone_is_not_a_rule() {
    let t = translator();
    assert_invalid_input(&t.decompile_value(&spamtest_only_tree()));
    assert_eq!(t.from_tree(&spamtest_only_tree()).unwrap(), json!({}));
}

#[test]
fn test_two_vacation_rules_degrade_to_empty() {
    let t = translator();
    assert_invalid_input(&t.decompile_value(&double_vacation_tree()));
    assert_eq!(t.from_tree(&double_vacation_tree()).unwrap(), json!({}));
}
