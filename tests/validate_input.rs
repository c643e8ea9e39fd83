use gumshoe::engine::interpret;
use gumshoe::settings::Limits;
use gumshoe::validate::validate_query;
use gumshoe::GumshoeError;

fn invalid(message: &str) -> GumshoeError {
    GumshoeError::InvalidInput(message.into())
}

#[test]
fn decodes_a_valid_query() {
    assert_eq!(
        validate_query(Some("valid%20query"), &Limits::default()),
        Ok("valid query".to_string())
    );
    assert_eq!(
        validate_query(Some("  db.crime.count()  "), &Limits::default()),
        Ok("db.crime.count()".to_string()),
        "surrounding whitespace is trimmed"
    );
}

#[test]
fn missing_query_is_required() {
    assert_eq!(validate_query(None, &Limits::default()), Err(invalid("Query is required")));
    assert_eq!(validate_query(Some(""), &Limits::default()), Err(invalid("Query is required")));
}

#[test]
fn oversized_query_is_rejected_before_decoding() {
    let limits = Limits::default();
    assert_eq!(
        validate_query(Some(&"a".repeat(1025)), &limits),
        Err(invalid("Query too large"))
    );
    assert!(validate_query(Some(&"a".repeat(1024)), &limits).is_ok());
    // three encoded bytes per space: fine decoded, too long encoded
    assert_eq!(
        validate_query(Some(&format!("a{}", "%20".repeat(400))), &limits),
        Err(invalid("Query too large"))
    );
}

#[test]
fn whitespace_only_is_bad_input() {
    assert_eq!(validate_query(Some("%20%20%20"), &Limits::default()), Err(invalid("Bad input")));
}

#[test]
fn broken_escapes_are_bad_input() {
    let limits = Limits::default();
    assert_eq!(validate_query(Some("%E0%A4%A"), &limits), Err(invalid("Bad input")));
    assert_eq!(validate_query(Some("100%zz"), &limits), Err(invalid("Bad input")));
    assert_eq!(validate_query(Some("%FF%FE"), &limits), Err(invalid("Bad input")), "not utf-8");
}

#[test]
fn validation_errors_surface_through_interpret() {
    let err = interpret(None, &Limits::default()).unwrap_err();
    assert_eq!(err.to_string(), "Query is required");
}
