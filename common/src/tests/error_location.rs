use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures the file it was called from.
///
/// **WHY THIS MATTERS**: Every transport and pipeline error carries an ErrorLocation.
/// If the file is wrong, a classified `unauthorized` or `parse_error` can no longer be
/// traced back to the code path that produced it.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` stops being propagated or
/// the file/column fields are swapped.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_and_column() {
    // GIVEN/WHEN: Capturing the current location
    let location = ErrorLocation::from(Location::caller());

    // THEN: File and column are populated
    assert!(location.file.ends_with("error_location.rs"));
    assert!(location.line > 0);
    assert!(location.column > 0);
}

/// **VALUE**: Verifies the bracketed `[file:line:column]` display format.
///
/// **WHY THIS MATTERS**: All error Display impls append the location; log lines are
/// grepped by this exact format.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops the brackets or a
/// component of the location.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A location
    let location = ErrorLocation::from(Location::caller());

    // WHEN: Formatting
    let formatted = location.to_string();

    // THEN: "[file:line:column]"
    let expected = format!("[{}:{}:{}]", location.file, location.line, location.column);
    assert_eq!(formatted, expected);
}

/// **VALUE**: Verifies that `#[track_caller]` helpers report their call site.
///
/// **WHY THIS MATTERS**: Error constructors such as `ApiError::unauthorized()` are
/// `#[track_caller]`; the location must point at the caller, not the constructor.
///
/// **BUG THIS CATCHES**: Would catch if location capture happened inside the helper.
#[test]
fn given_track_caller_helper_when_called_twice_then_lines_differ() {
    #[track_caller]
    fn capture() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    let first = capture();
    let second = capture();

    assert_eq!(first.file, second.file);
    assert_eq!(first.line + 1, second.line, "Lines should be sequential");
}
