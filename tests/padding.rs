mod common;

use anyhow::Result;

use TxrmIO::classify::mean;
use TxrmIO::codec::{decode_f32s, encode_f32s};
use TxrmIO::consts::{DTORA_DISTANCE_PATH, STORA_DISTANCE_PATH};
use TxrmIO::{MemStorage, OpenMode, Storage, TxrmConfig, TxrmFile, Value};

use common::{write_fixture, Fixture, DETECTOR_DISTANCE, SOURCE_DISTANCE};

const CURRENT_PATH: &str = "ImageInfo/Current";

fn current() -> Vec<f32> {
    (0..10).map(|i| 100.0 + (i % 3) as f32 * 0.01).collect()
}

#[test]
fn growing_pads_const_arrays_with_their_mean() -> Result<()> {
    let mut mem = MemStorage::new();
    write_fixture(&mut mem, &Fixture::new(10))?;
    mem.write_stream(CURRENT_PATH, &encode_f32s(&current()))?;

    let mut f = TxrmFile::from_storage(mem, OpenMode::Write, TxrmConfig::default())?;
    assert!(f.const_arrays().contains_key(CURRENT_PATH));

    let bigger = Fixture::new(12);
    f.set_images(bigger.stack())?;
    f.set_angles(bigger.angles_deg());
    f.set_meta_value("x_shifts", Value::from_f32s(bigger.x_shifts()))?;
    f.set_meta_value("y_shifts", Value::from_f32s(bigger.y_shifts()))?;
    f.set_meta_value("array_ExpTimes", Value::from_f32s(bigger.exposures()))?;
    let report = f.save()?;
    assert_eq!(report.images, 12);

    let saved = decode_f32s(&f.get(CURRENT_PATH)?.unwrap_or_default())?;
    assert_eq!(saved.len(), 12);
    assert_eq!(&saved[..10], &current()[..]);
    let m = mean(&current());
    assert_eq!(saved[10], m);
    assert_eq!(saved[11], m);

    let dtora = decode_f32s(&f.get(DTORA_DISTANCE_PATH)?.unwrap_or_default())?;
    assert_eq!(dtora, vec![DETECTOR_DISTANCE; 12]);
    assert_eq!(f.distances()?, (DETECTOR_DISTANCE, -SOURCE_DISTANCE));
    assert!(f.exists("ImageData1/Image12"));
    Ok(())
}

#[test]
fn shrinking_truncates_const_arrays() -> Result<()> {
    let mut mem = MemStorage::new();
    write_fixture(&mut mem, &Fixture::new(10))?;
    let mut f = TxrmFile::from_storage(mem, OpenMode::Write, TxrmConfig::default())?;
    common::shrink_to(&mut f, 4)?;
    f.save()?;

    let stora = decode_f32s(&f.get(STORA_DISTANCE_PATH)?.unwrap_or_default())?;
    assert_eq!(stora, vec![SOURCE_DISTANCE; 4]);
    Ok(())
}
