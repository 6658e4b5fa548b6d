//! Tests for error handling

use remora_core::error::{ModuleKey, RemoraError, RemoraResult};
use remora_core::types::Address;

#[test]
fn test_field_not_found_lists_every_candidate()
{
    let error = RemoraError::FieldNotFound {
        type_name: "Layout::FlowItem".to_string(),
        candidates: vec!["data".to_string(), "m_data".to_string()],
    };
    let message = error.to_string();
    assert!(message.contains("Layout::FlowItem"));
    assert!(message.contains("\"data\""));
    assert!(message.contains("\"m_data\""));
}

#[test]
fn test_module_not_found_names_the_key()
{
    let by_address = RemoraError::ModuleNotFound(ModuleKey::Address(Address::new(0x2000)));
    assert!(by_address.to_string().contains("0x00002000"));

    let by_name = RemoraError::ModuleNotFound(ModuleKey::Name("edgehtml".to_string()));
    assert!(by_name.to_string().contains("edgehtml"));
}

#[test]
fn test_partial_read_display()
{
    let error = RemoraError::PartialRead {
        address: Address::new(0x1ff6),
        requested: 16,
        read: 10,
    };
    let message = format!("{error}");
    assert!(message.contains("0x00001ff6"));
    assert!(message.contains("16"));
    assert!(message.contains("10"));
}

#[test]
fn test_sequence_limit_display()
{
    let message = RemoraError::SequenceLimitExceeded(100_000).to_string();
    assert!(message.contains("100000"));
}

#[test]
fn test_io_error_converts()
{
    fn open_missing() -> RemoraResult<()>
    {
        std::fs::read("/definitely/not/a/real/path")?;
        Ok(())
    }

    assert!(matches!(open_missing(), Err(RemoraError::Io(_))));
}

#[test]
fn test_result_type()
{
    let _ok: RemoraResult<()> = Ok(());
    let _err: RemoraResult<()> = Err(RemoraError::InvalidArgument("test arg".to_string()));
}
