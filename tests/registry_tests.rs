//! Integration tests for the layout catalog, selection and rules names.

mod fixtures;

use fixtures::three_layout_registry;
use inputpad::models::{parse_options, ActiveSelection, LayoutVariant};
use inputpad::parser::RulesNames;
use inputpad::services::{partition, LayoutRegistryBuilder, LayoutSelection};

#[test]
fn test_partition_with_only_us_active() {
    let catalog = LayoutRegistryBuilder::default().build(&three_layout_registry());
    let selection = ActiveSelection::from_strings("us", "", "");

    let parts = partition(&catalog, &selection);
    assert_eq!(parts.active, vec![LayoutVariant::layout_only("us")]);
    assert_eq!(
        parts.available,
        vec![
            LayoutVariant::layout_only("de"),
            LayoutVariant::layout_only("jp"),
            LayoutVariant::new("jp", Some("kana")),
        ]
    );
}

#[test]
fn test_empty_variant_matches_plain_layout() {
    let catalog = LayoutRegistryBuilder::default().build(&three_layout_registry());
    let selection = ActiveSelection {
        layouts: vec![LayoutVariant {
            layout: "us".into(),
            variant: Some(String::new()),
        }],
        options: Vec::new(),
    };
    assert_eq!(partition(&catalog, &selection).active, vec![LayoutVariant::layout_only("us")]);

    let selection: ActiveSelection =
        serde_json::from_str(r#"{"layouts":[{"layout":"us","variant":""}],"options":[]}"#).unwrap();
    assert_eq!(partition(&catalog, &selection).active, vec![LayoutVariant::layout_only("us")]);
}

#[test]
fn test_selection_with_raw_empty_variant() {
    let catalog = LayoutRegistryBuilder::default().build(&three_layout_registry());
    let raw_de = LayoutVariant {
        layout: "de".into(),
        variant: Some(String::new()),
    };
    let mut selection = LayoutSelection::new(&catalog, &ActiveSelection::from_strings("us", "", ""));

    selection.add_layout(&raw_de).unwrap();
    assert!(!selection.available().contains(&LayoutVariant::layout_only("de")));
    assert!(selection.add_layout(&LayoutVariant::layout_only("de")).is_err());
    selection.remove_layout(&raw_de).unwrap();
    assert!(selection.available().contains(&LayoutVariant::layout_only("de")));
}

#[test]
fn test_options_round_trip() {
    let options = vec![
        "grp:alt_shift_toggle".to_string(),
        "ctrl:nocaps".to_string(),
        "lv3:ralt_switch".to_string(),
    ];
    let joined = options.join(",");
    assert_eq!(parse_options(&joined), options);
    assert_eq!(parse_options(",ctrl:nocaps,,"), vec!["ctrl:nocaps"]);
}

#[test]
fn test_selection_from_rules_names() {
    let names = RulesNames::parse(b"evdev\0pc105\0us,jp\0,kana\0ctrl:nocaps\0");
    let catalog = LayoutRegistryBuilder::default().build(&three_layout_registry());

    let mut selection = LayoutSelection::new(&catalog, &names.selection());
    assert_eq!(
        selection.active(),
        &[LayoutVariant::layout_only("us"), LayoutVariant::new("jp", Some("kana"))]
    );

    selection.add_layout(&LayoutVariant::layout_only("de")).unwrap();
    let updated = ActiveSelection {
        layouts: selection.active().to_vec(),
        options: names.selection().options,
    };
    let written = RulesNames::from_selection("evdev", "pc105", &updated);
    assert_eq!(written.layouts, "us,jp,de");
    assert_eq!(written.variants, ",kana,");
    assert_eq!(written.options, "ctrl:nocaps");
}
