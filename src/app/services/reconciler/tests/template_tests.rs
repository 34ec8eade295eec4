//! Tests for template application onto orders

use super::*;
use crate::app::models::TemplateValue;
use crate::app::services::reconciler::template::TemplateApplier;

fn record_with_two_orders() -> Record {
    let mut record = create_order_record(nypl_branch_acq(), "9780306406157", "33333000000001");
    record.orders[0].vendor_notes = Some("keep me".to_string());
    record.orders.push(Order {
        fund: Some("other-fund".to_string()),
        ..Order::default()
    });
    record
}

#[test]
fn test_overwrites_every_order() {
    let mut record = record_with_two_orders();
    let applied = TemplateApplier::new().apply(&mut record, &create_test_template(&["isbn"]));

    assert_eq!(applied, 4);
    for order in &record.orders {
        assert_eq!(order.fund.as_deref(), Some("10001adbk"));
        assert_eq!(order.copies.as_deref(), Some("2"));
    }
}

#[test]
fn test_empty_values_never_clear_attributes() {
    let mut record = record_with_two_orders();
    let template = Template::new("blanks")
        .with_field("vendor_notes", "")
        .with_field("copies", 0i64)
        .with_field("locations", TemplateValue::List(Vec::new()));

    let applied = TemplateApplier::new().apply(&mut record, &template);

    assert_eq!(applied, 0);
    assert_eq!(record.orders[0].vendor_notes.as_deref(), Some("keep me"));
    assert_eq!(record.orders[0].locations, vec!["mya0n".to_string()]);
}

#[test]
fn test_application_is_idempotent() {
    let template = create_test_template(&["isbn"]);

    let mut once = record_with_two_orders();
    TemplateApplier::new().apply(&mut once, &template);

    let mut twice = record_with_two_orders();
    TemplateApplier::new().apply(&mut twice, &template);
    TemplateApplier::new().apply(&mut twice, &template);

    assert_eq!(once.orders, twice.orders);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let mut record = record_with_two_orders();
    let before = record.orders.clone();
    let template = Template::new("odd").with_field("not_an_order_attribute", "x");

    let applied = TemplateApplier::new().apply(&mut record, &template);

    assert_eq!(applied, 0);
    assert_eq!(record.orders, before);
}

#[test]
fn test_record_without_orders_is_untouched() {
    let mut record = create_test_record(nypl_branch_acq(), "9780306406157", &[]);
    let applied = TemplateApplier::new().apply(&mut record, &create_test_template(&["isbn"]));

    assert_eq!(applied, 0);
    assert!(record.orders.is_empty());
}

#[test]
fn test_list_attributes_accept_text_and_lists() {
    let mut record = record_with_two_orders();
    let template = Template::new("shelving")
        .with_field("locations", vec!["myj0n".to_string(), "myj0v".to_string()])
        .with_field("audience", "j");

    TemplateApplier::new().apply(&mut record, &template);

    assert_eq!(record.orders[0].locations, vec!["myj0n", "myj0v"]);
    assert_eq!(record.orders[1].audience, vec!["j"]);
}
