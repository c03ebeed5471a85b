use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_diagnostic_builder() {
    let diag = Diagnostic::error(ErrorCode::E1001)
        .with_message("Unknown condition: 'NOPE'")
        .with_label(Span::new(10, 14), "not a known condition")
        .with_note("Current section: READ_RESPONSE");

    assert_eq!(diag.primary_span(), Some(Span::new(10, 14)));
    assert_eq!(diag.labels.len(), 1);
    assert_eq!(diag.notes, vec!["Current section: READ_RESPONSE"]);
}

#[test]
fn test_diagnostic_display() {
    let diag = Diagnostic::error(ErrorCode::E1002)
        .with_message("STATUS is not available in the TXN_START section")
        .with_note("Current section: TXN_START");

    assert_eq!(
        diag.to_string(),
        "error [E1002]: STATUS is not available in the TXN_START section\n  = note: Current section: TXN_START"
    );
}

#[test]
fn test_unlabeled_diagnostic() {
    let diag = Diagnostic::error(ErrorCode::E1004).with_message("w");
    assert_eq!(diag.primary_span(), None);
    assert_eq!(diag.to_string(), "error [E1004]: w");
}
