//! Tests for error handling

use std::error::Error as _;

use dienav_core::error::{DwarfError, Result};
use dienav_core::identity::UserId;
use dienav_core::reference::DieRef;

#[test]
fn test_unit_not_found_display()
{
    let error = DwarfError::UnitNotFound(0x1234);
    let message = format!("{}", error);
    assert!(message.contains("0x00001234"));
    assert!(message.contains("No compilation unit"));
}

#[test]
fn test_invalid_reference_display()
{
    let error = DwarfError::InvalidReference(DieRef::new(0x0, 0x44));
    let message = format!("{}", error);
    assert!(message.contains("Invalid reference"));
    assert!(message.contains(&DieRef::new(0x0, 0x44).to_string()));
}

#[test]
fn test_unknown_user_id_display()
{
    let error = DwarfError::UnknownUserId(UserId::from_raw(0x3_0000_0120));
    let message = format!("{}", error);
    assert!(message.contains("0x0000000300000120"));
}

#[test]
fn test_unsupported_type_display()
{
    let error = DwarfError::UnsupportedType {
        offset: 0x80,
        reason: "DW_TAG_variable does not describe a type".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("0x00000080"));
    assert!(message.contains("does not describe a type"));
}

#[test]
fn test_io_error_conversion()
{
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.dSYM");
    let error: DwarfError = io.into();

    match &error {
        DwarfError::Io(_) => {
            // Expected: io::Error converts to the Io variant
        }
        _ => panic!("Expected Io variant"),
    }
    assert!(error.source().is_some());
}

#[test]
fn test_decode_error_keeps_gimli_source()
{
    let error = DwarfError::Decode {
        context: "unit header".to_string(),
        source: gimli::Error::UnexpectedEof(gimli::ReaderOffsetId(0)),
    };
    assert!(format!("{}", error).contains("Failed to decode unit header"));
    assert!(error.source().is_some());
}

#[test]
fn test_result_type()
{
    // Test that Result type is properly aliased
    let _result: Result<()> = Ok(());
    let _error_result: Result<()> = Err(DwarfError::UnitNotFound(0));
}
