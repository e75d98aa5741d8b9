mod common;

use anyhow::Result;

use TxrmIO::codec::encode_u32s;
use TxrmIO::metrics;
use TxrmIO::{MemStorage, OpenMode, Storage, TxrmConfig, TxrmError, TxrmFile, Value};

use common::{write_fixture, Fixture};

fn fixture_storage(count: usize) -> Result<MemStorage> {
    let mut mem = MemStorage::new();
    write_fixture(&mut mem, &Fixture::new(count))?;
    Ok(mem)
}

#[test]
fn every_mismatched_field_is_reported_and_nothing_is_written() -> Result<()> {
    let mem = fixture_storage(10)?;
    let before = mem.clone();
    let mut f = TxrmFile::from_storage(mem, OpenMode::Write, TxrmConfig::default())?;

    f.set_angles(vec![0.0; 9]);
    f.set_meta_value("x_shifts", Value::from_f32s(vec![0.0; 12]))?;

    let err = f.save().err().expect("save must be rejected");
    match err.downcast_ref::<TxrmError>() {
        Some(TxrmError::Validation(v)) => {
            let fields: Vec<&str> = v.iter().map(|x| x.field.as_str()).collect();
            assert_eq!(fields, vec!["angles", "x_shifts"]);
            assert_eq!((v[0].expected, v[0].actual), (10, 9));
            assert_eq!((v[1].expected, v[1].actual), (10, 12));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert_eq!(f.storage(), &before);
    Ok(())
}

#[test]
fn stack_length_and_frame_shape_are_checked() -> Result<()> {
    let mut f = TxrmFile::from_storage(fixture_storage(10)?, OpenMode::Write, TxrmConfig::default())?;
    let wrong = Fixture {
        height: 5,
        ..Fixture::new(10)
    }
    .stack();
    f.set_images(wrong)?;

    let err = f.plan_save().err().expect("shape mismatch must be rejected");
    match err.downcast_ref::<TxrmError>() {
        Some(TxrmError::Validation(v)) => {
            assert_eq!(v.len(), 1);
            assert_eq!(v[0].field, "images.height");
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
    Ok(())
}

#[test]
fn read_sessions_cannot_save() -> Result<()> {
    let mem = fixture_storage(4)?;
    let before = mem.clone();
    let rejected = metrics::snapshot().saves_rejected;

    let mut f = TxrmFile::from_storage(mem, OpenMode::Read, TxrmConfig::default())?;
    let err = f.save().err().expect("read session must not save");
    assert!(matches!(err.downcast_ref::<TxrmError>(), Some(TxrmError::ReadOnly(_))));
    assert!(f.remove_stream("ImageInfo/Angles").is_err());
    assert_eq!(f.storage(), &before);
    assert!(metrics::snapshot().saves_rejected > rejected);
    Ok(())
}

#[test]
fn unknown_pixel_type_code_fails_the_open() -> Result<()> {
    let mut mem = fixture_storage(4)?;
    mem.write_stream("ImageInfo/DataType", &encode_u32s(&[7u32]))?;
    let err = TxrmFile::from_storage(mem, OpenMode::Read, TxrmConfig::default())
        .err()
        .expect("type code 7 is not a pixel format");
    assert!(matches!(
        err.downcast_ref::<TxrmError>(),
        Some(TxrmError::UnsupportedFormat { code: 7, .. })
    ));
    Ok(())
}

#[test]
fn missing_required_field_fails_the_open() -> Result<()> {
    let mut mem = fixture_storage(4)?;
    mem.destroy("ImageInfo/ImageWidth")?;
    let err = TxrmFile::from_storage(mem, OpenMode::Read, TxrmConfig::default())
        .err()
        .expect("image width is required");
    match err.downcast_ref::<TxrmError>() {
        Some(TxrmError::StreamNotFound(p)) => assert_eq!(p, "ImageInfo/ImageWidth"),
        other => panic!("expected StreamNotFound, got {:?}", other),
    }
    Ok(())
}

#[test]
fn optional_fields_absent_from_the_file_are_dropped() -> Result<()> {
    let f = TxrmFile::from_storage(fixture_storage(4)?, OpenMode::Read, TxrmConfig::default())?;
    assert!(!f.state().registry.contains("x_positions"));
    assert!(!f.meta().contains_key("x_positions"));
    assert_eq!(f.pixel_size(), Some(1.5));
    Ok(())
}
