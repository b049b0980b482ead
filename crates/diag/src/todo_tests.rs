// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::analysis::{AdvisoryLevel, Recommendation};

const SAMPLE: &str = "\
# TODO

## High Priority
- [ ] Fix the login redirect
  > Users land on a 404 after OAuth
- [x] Done item

## Medium Priority
- [ ] Tidy the sidebar

## Next Session
- [ ] Wire up metrics

## Parking Lot
- [ ] Dark mode

## Auto-Detected Issues (from troubleshooting log)
### [2026-07-30] Web App - 6x PORT_IN_USE in the last 7 days
- [ ] Find the process that keeps taking this port

## Support Codes Reference
- [ ] QL-PORT-001 means the port is taken
";

fn recommendation() -> Recommendation {
    Recommendation {
        level: AdvisoryLevel::Critical,
        message: "6x PORT_IN_USE in the last 7 days".to_string(),
        actions: vec!["Find the process that keeps taking this port".to_string()],
        should_auto_todo: true,
    }
}

#[test]
fn scan_collects_unchecked_items_with_sections() {
    let inventory = scan(SAMPLE);
    let texts: Vec<&str> = inventory.items.iter().map(String::as_str).collect();
    assert_eq!(
        texts,
        vec![
            "Fix the login redirect",
            "Tidy the sidebar",
            "Wire up metrics",
            "Dark mode",
            "[Auto] [2026-07-30] Web App - 6x PORT_IN_USE in the last 7 days",
        ]
    );
    assert_eq!(inventory.count, 5);
}

#[test]
fn scan_tracks_priorities_and_markers() {
    let inventory = scan(SAMPLE);
    let by_text = |t: &str| {
        inventory
            .items_with_priority
            .iter()
            .find(|i| i.text.contains(t))
            .unwrap()
            .clone()
    };

    let high = by_text("login redirect");
    assert_eq!(high.priority, Priority::High);
    assert_eq!(high.section, "High Priority");
    assert_eq!(
        high.description.as_deref(),
        Some("Users land on a 404 after OAuth")
    );

    let medium = by_text("sidebar");
    assert_eq!(medium.priority, Priority::Medium);
    assert!(medium.description.is_none());

    let next = by_text("metrics");
    assert!(next.marked_for_implement);
    assert!(!next.marked_parking);

    let parked = by_text("Dark mode");
    assert!(parked.marked_parking);

    let auto = by_text("[Auto]");
    assert!(auto.is_auto_detected);
    assert_eq!(auto.priority, Priority::High);
}

#[test]
fn support_codes_section_is_not_counted() {
    let inventory = scan(SAMPLE);
    assert!(!inventory.items.iter().any(|t| t.contains("QL-PORT-001")));
}

#[test]
fn auto_checkboxes_are_not_counted_as_plain_items() {
    let inventory = scan(SAMPLE);
    assert!(!inventory
        .items
        .iter()
        .any(|t| t == "Find the process that keeps taking this port"));
}

#[test]
fn auto_todo_inserts_under_existing_section() {
    let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
    let updated = insert_auto_todo(SAMPLE, "Web App", today, &recommendation()).unwrap();
    assert!(updated.contains("### [2026-08-01] Web App - 6x PORT_IN_USE"));
    // Inserted inside the auto section, before Support Codes
    let auto_at = updated.find("[2026-08-01] Web App").unwrap();
    let support_at = updated.find("## Support Codes Reference").unwrap();
    assert!(auto_at < support_at);
}

#[test]
fn auto_todo_is_idempotent_per_day_per_app() {
    let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
    let updated = insert_auto_todo(SAMPLE, "Web App", today, &recommendation()).unwrap();
    assert!(insert_auto_todo(&updated, "Web App", today, &recommendation()).is_none());
    // A different app still gets its entry
    assert!(insert_auto_todo(&updated, "Api App", today, &recommendation()).is_some());
}

#[test]
fn auto_todo_creates_section_before_support_codes() {
    let content = "# TODO\n\n## High Priority\n- [ ] x\n\n## Support Codes Reference\n- docs\n";
    let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
    let updated = insert_auto_todo(content, "Web App", today, &recommendation()).unwrap();
    let section_at = updated.find(AUTO_SECTION_HEADER).unwrap();
    let support_at = updated.find("## Support Codes Reference").unwrap();
    assert!(section_at < support_at);
}

#[test]
fn auto_todo_appends_section_when_no_support_codes() {
    let content = "# TODO\n\n## High Priority\n- [ ] x\n";
    let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
    let updated = insert_auto_todo(content, "Web App", today, &recommendation()).unwrap();
    assert!(updated.contains(AUTO_SECTION_HEADER));
    assert!(updated.contains("[2026-08-01] Web App"));
}

#[test]
fn remove_first_matching_takes_description_too() {
    let updated = remove_first_matching(SAMPLE, "login redirect").unwrap();
    assert!(!updated.contains("- [ ] Fix the login redirect"));
    assert!(!updated.contains("Users land on a 404"));
    // Everything else intact
    assert!(updated.contains("- [ ] Tidy the sidebar"));
}

#[test]
fn remove_first_matching_misses_return_none() {
    assert!(remove_first_matching(SAMPLE, "no such item").is_none());
}
