//! Tests for error handling

use vigil_core::error::{Result, VigilError};

#[test]
fn test_unknown_function_display()
{
    let error = VigilError::UnknownFunction("zz".to_string());
    let message = format!("{}", error);
    assert!(message.contains("unknown function"));
    assert!(message.contains("zz"));
}

#[test]
fn test_forbidden_attribute_display()
{
    let error = VigilError::ForbiddenAttribute("select".to_string());
    let message = format!("{}", error);
    assert!(message.contains("select"));
    assert!(message.contains("debugger state"));
}

#[test]
fn test_evaluation_message_is_bare()
{
    // Marker text embeds these messages after a '!', so there is no
    // variant-name prefix to strip.
    let error = VigilError::Evaluation("no register named \"xyz\"".to_string());
    assert_eq!(format!("{}", error), "no register named \"xyz\"");

    let error = VigilError::Cast("invalid cast to \"zz\"".to_string());
    assert_eq!(format!("{}", error), "invalid cast to \"zz\"");
}

#[test]
fn test_too_many_arguments_display()
{
    let error = VigilError::TooManyArguments;
    assert!(format!("{}", error).contains("too many arguments"));
}

#[test]
fn test_result_type()
{
    // Test that Result type is properly aliased
    let _result: Result<()> = Ok(());
    let _error_result: Result<()> = Err(VigilError::Parse);
}
