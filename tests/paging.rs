mod common;

use anyhow::Result;

use TxrmIO::catalogue::PathCatalogue;
use TxrmIO::codec::decode_f32s;
use TxrmIO::consts::DTORA_DISTANCE_PATH;
use TxrmIO::{MemStorage, OpenMode, Storage, TxrmConfig, TxrmFile};

use common::{shrink_to, write_fixture, Fixture, ENERGY_PATH};

fn open(count: usize) -> Result<TxrmFile<MemStorage>> {
    let mut mem = MemStorage::new();
    write_fixture(&mut mem, &Fixture::new(count))?;
    TxrmFile::from_storage(mem, OpenMode::Write, TxrmConfig::default())
}

#[test]
fn pages_hold_one_hundred_images_each() -> Result<()> {
    let mut f = open(250)?;
    let report = f.save()?;
    assert_eq!(report.pages_written, 3);

    let cat = f.catalogue();
    assert_eq!(cat.under("ImageData1").count(), 100);
    assert_eq!(cat.under("ImageData2").count(), 100);
    assert_eq!(cat.under("ImageData3").count(), 50);
    assert!(cat.is_stream("ImageData3/Image250"));
    assert!(!cat.exists("ImageData4"));
    Ok(())
}

#[test]
fn shrinking_prunes_pages_and_stale_images() -> Result<()> {
    let mut f = open(250)?;
    shrink_to(&mut f, 120)?;
    let report = f.save()?;
    assert_eq!(report.pages_pruned, 1);
    assert_eq!(report.images_pruned, 80);

    let storage = f.into_storage();
    let cat = PathCatalogue::build(&storage)?;
    assert!(!cat.exists("ImageData3"));
    assert_eq!(cat.under("ImageData2").count(), 20);
    assert!(cat.is_stream("ImageData2/Image120"));
    assert!(!cat.is_stream("ImageData2/Image121"));

    let g = TxrmFile::from_storage(storage, OpenMode::Write, TxrmConfig::default())?;
    assert_eq!(g.number_of_images()?, 120);
    assert_eq!(g.images().map(|s| s.len()), Some(120));
    assert_eq!(g.const_arrays().get(ENERGY_PATH).map(|v| v.len()), Some(120));
    assert_eq!(g.const_arrays().get(DTORA_DISTANCE_PATH).map(|v| v.len()), Some(120));
    Ok(())
}

#[test]
fn shrinking_to_a_page_boundary_drops_whole_pages() -> Result<()> {
    let mut f = open(300)?;
    shrink_to(&mut f, 200)?;
    let report = f.save()?;
    assert_eq!(report.pages_written, 2);
    assert_eq!(report.pages_pruned, 1);
    assert_eq!(report.images_pruned, 0);
    assert!(!f.exists("ImageData3"));
    assert!(f.exists("ImageData2/Image200"));
    Ok(())
}

#[test]
fn metadata_only_session_leaves_pages_alone() -> Result<()> {
    let mut mem = MemStorage::new();
    let stack = write_fixture(&mut mem, &Fixture::new(30))?;
    let cfg = TxrmConfig::default().with_eager_images(false);
    let mut f = TxrmFile::from_storage(mem, OpenMode::Write, cfg)?;
    assert!(f.images().is_none());

    f.set_angles(vec![0.5; 30]);
    let report = f.save()?;
    assert_eq!(report.pages_written, 0);
    assert_eq!(report.pages_pruned, 0);

    let mut storage = f.into_storage();
    let raw = storage.read_stream("ImageData1/Image30")?.unwrap_or_default();
    assert_eq!(raw, stack.frame_bytes(29, stack.kind()));
    let angles = storage.read_stream("ImageInfo/Angles")?.unwrap_or_default();
    assert_eq!(decode_f32s(&angles)?, vec![0.5; 30]);
    Ok(())
}
