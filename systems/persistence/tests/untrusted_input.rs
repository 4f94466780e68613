use proptest::prelude::*;
use tile_defence_system_persistence::{GameDataReader, GameDataWriter, SaveError};

#[test]
fn truncated_saves_report_io_errors() {
    let mut writer = GameDataWriter::new(Vec::new(), 3).unwrap();
    writer.write_bytes(&[1, 2, 3, 4, 5]).unwrap();
    let mut bytes = writer.into_inner();
    bytes.truncate(bytes.len() - 2);

    let mut reader = GameDataReader::new(bytes.as_slice(), 3).unwrap();
    assert!(matches!(reader.read_bytes(), Err(SaveError::Io(_))));
    assert!(matches!(
        GameDataReader::new(&bytes[..2], 3),
        Err(SaveError::Io(_))
    ));
}

#[test]
fn oversized_blocks_are_rejected_before_allocating() {
    let mut writer = GameDataWriter::new(Vec::new(), 1).unwrap();
    writer.write_u32(u32::MAX).unwrap();
    let bytes = writer.into_inner();
    let mut reader = GameDataReader::new(bytes.as_slice(), 1).unwrap();
    assert!(matches!(reader.read_bytes(), Err(SaveError::Corrupt(_))));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        if let Ok(mut reader) = GameDataReader::new(bytes.as_slice(), 3) {
            prop_assert!(reader.version() >= 1 && reader.version() <= 3);
            if let Ok(mut section) = reader.read_section() {
                let _ = section.read_rng();
            }
            let _ = reader.read_bool();
            let _ = reader.read_vec2();
        }
    }
}
