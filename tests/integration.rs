/// Integration tests for ps2image

use ps2image::format::udf::{self, tag};
use ps2image::*;
use std::fs;
use tempfile::TempDir;

const SECTOR: usize = 2048;

fn sector(image: &[u8], n: usize) -> &[u8] {
    &image[n * SECTOR..(n + 1) * SECTOR]
}

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn u64_at(buf: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap())
}

/// SYSTEM.CNF (16 bytes) and DATA/A.BIN (5000 bytes)
fn sample_source() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("SYSTEM.CNF"), b"BOOT2 = cdrom0:\n").unwrap();
    fs::create_dir(dir.path().join("DATA")).unwrap();
    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    fs::write(dir.path().join("DATA").join("A.BIN"), payload).unwrap();
    dir
}

fn build_sample() -> Vec<u8> {
    let src = sample_source();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("sample.iso");
    Packer::run(src.path(), &dest, VolumeSpec::new("SAMPLE"), &NoProgress).unwrap();
    fs::read(&dest).unwrap()
}

#[test]
fn test_sample_image_layout() {
    let src = sample_source();
    let image = DiscImage::open(src.path()).unwrap();
    let budget = image.budget();

    assert_eq!(budget.directories, 2);
    assert_eq!(budget.files, 2);
    assert_eq!(budget.data_sectors, 4);
    assert_eq!(budget.partition_start, 263);
    assert_eq!(budget.data_start, 271);
    assert_eq!(budget.total_sectors, 288);
    assert_eq!(budget.pad_sectors, 12);
    assert_eq!(budget.partition_len(), 25);
    assert_eq!(image.allocation().next_unique_id, 0x13);

    let tree = image.tree();
    let a_bin = tree.find("DATA/A.BIN").unwrap();
    let loc = image.allocation().location(a_bin);
    assert_eq!(loc.global_sector, 272);
    assert_eq!(loc.lba, 7);
    assert_eq!(loc.local_sector, 9);
}

#[test]
fn test_sample_image_bytes() {
    let bytes = build_sample();
    assert_eq!(bytes.len(), 288 * SECTOR);

    // ISO9660 primary volume descriptor
    let pvd = sector(&bytes, 16);
    assert_eq!(pvd[0], 1);
    assert_eq!(&pvd[1..6], b"CD001");
    assert_eq!(u32_at(pvd, 80), 288);
    assert_eq!(u32_at(pvd, 156 + 2), 261);
    assert_eq!(sector(&bytes, 17)[0], 255);

    // UDF recognition sequence
    assert_eq!(&sector(&bytes, 18)[1..6], b"BEA01");
    assert_eq!(&sector(&bytes, 19)[1..6], b"NSR02");
    assert_eq!(&sector(&bytes, 20)[1..6], b"TEA01");

    // Both volume descriptor sequences
    let expected = [
        tag::PRIMARY_VOLUME,
        tag::IMPLEMENTATION_USE,
        tag::PARTITION,
        tag::LOGICAL_VOLUME,
        tag::UNALLOCATED_SPACE,
        tag::TERMINATING,
    ];
    for base in [32usize, 48] {
        for (i, &ident) in expected.iter().enumerate() {
            let s = sector(&bytes, base + i);
            assert_eq!(udf::tag_identifier(s), ident);
            assert_eq!(udf::tag_location(s), (base + i) as u32);
        }
    }

    // Partition descriptor start and length
    let pd = sector(&bytes, 34);
    assert_eq!(u32_at(pd, 188), 263);
    assert_eq!(u32_at(pd, 192), 25);

    // Integrity descriptor counters
    let lvid = sector(&bytes, 64);
    assert_eq!(udf::tag_identifier(lvid), tag::LOGICAL_VOLUME_INTEGRITY);
    assert_eq!(u64_at(lvid, 40), 0x13);
    assert_eq!(u32_at(lvid, 120), 2);
    assert_eq!(u32_at(lvid, 124), 2);

    // Anchors
    assert_eq!(udf::tag_identifier(sector(&bytes, 256)), tag::ANCHOR_POINTER);
    let last = sector(&bytes, 287);
    assert_eq!(udf::tag_identifier(last), tag::ANCHOR_POINTER);
    assert_eq!(udf::tag_location(last), 287);

    // File set points at the root entry
    let fsd = sector(&bytes, 263);
    assert_eq!(udf::tag_identifier(fsd), tag::FILE_SET);
    assert_eq!(u32_at(fsd, 404), 4);

    // A.BIN identifier inside DATA's identifier block
    let fids = sector(&bytes, 263 + 3);
    let parent_len = udf::parent_identifier_len();
    assert_eq!(udf::tag_identifier(fids), tag::FILE_IDENTIFIER);
    let entry = &fids[parent_len..];
    assert_eq!(udf::tag_identifier(entry), tag::FILE_IDENTIFIER);
    assert_eq!(entry[19], 6);
    assert_eq!(u32_at(entry, 24), 7);
    assert_eq!(&entry[38..44], b"\x08A.BIN");

    // A.BIN file entry and payload
    let fe = sector(&bytes, 263 + 7);
    assert_eq!(udf::tag_identifier(fe), tag::FILE_ENTRY);
    assert_eq!(u64_at(fe, 56), 5000);
    assert_eq!(u32_at(fe, 308), 5000);
    assert_eq!(u32_at(fe, 312), 9);
    let data = &bytes[272 * SECTOR..272 * SECTOR + 5000];
    assert!(data.iter().enumerate().all(|(i, &b)| b == (i % 251) as u8));
    assert!(bytes[272 * SECTOR + 5000..275 * SECTOR].iter().all(|&b| b == 0));
}

#[test]
fn test_every_sector_tag_verifies() {
    let bytes = build_sample();
    let src = sample_source();
    let image = DiscImage::open(src.path()).unwrap();

    for region in image.allocation().regions() {
        let sealed = matches!(
            region.kind,
            RegionKind::MainSequence
                | RegionKind::ReserveSequence
                | RegionKind::Integrity
                | RegionKind::Anchor
                | RegionKind::FileSet
                | RegionKind::DirectoryEntries
                | RegionKind::FileEntries
                | RegionKind::EndOfSession
        );
        if !sealed {
            continue;
        }
        for n in region.start..region.end() {
            let s = sector(&bytes, n as usize);
            if s.iter().all(|&b| b == 0) {
                continue;
            }
            assert!(udf::verify_tag(s), "{} sector {}", region.kind.name(), n);
        }
    }
}

#[test]
fn test_empty_root() {
    let image = DiscImage::create(FileTree::new(), VolumeSpec::default()).unwrap();
    assert_eq!(image.budget().partition_start, 262);
    assert_eq!(image.budget().data_start, 266);
    assert_eq!(image.total_sectors(), 272);

    let bytes = image.write_to(Vec::new(), &NoProgress).unwrap();
    assert_eq!(bytes.len(), 272 * SECTOR);
    let lvid = sector(&bytes, 64);
    assert_eq!(u32_at(lvid, 120), 0);
    assert_eq!(u32_at(lvid, 124), 1);
    assert_eq!(udf::tag_identifier(sector(&bytes, 271)), tag::ANCHOR_POINTER);
}

#[test]
fn test_boot_file_sorted_first_at_root_only() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("AAA.BIN"), b"a").unwrap();
    fs::write(dir.path().join("system.cnf"), b"b").unwrap();
    fs::create_dir(dir.path().join("MOVIES")).unwrap();
    fs::write(dir.path().join("MOVIES").join("SYSTEM.CNF"), b"c").unwrap();
    fs::write(dir.path().join("MOVIES").join("INTRO.PSS"), b"d").unwrap();

    let image = DiscImage::open(dir.path()).unwrap();
    let tree = image.tree();
    let names = |id| -> Vec<String> {
        tree.ordered_children(id, image.spec())
            .into_iter()
            .map(|c| tree.node(c).name().to_string())
            .collect()
    };
    assert_eq!(names(tree.root()), ["system.cnf", "MOVIES", "AAA.BIN"]);
    let movies = tree.find("MOVIES").unwrap();
    assert_eq!(names(movies), ["INTRO.PSS", "SYSTEM.CNF"]);

    // ISO record after the two navigation records names the boot file
    let bytes = image.write_to(Vec::new(), &NoProgress).unwrap();
    let records = sector(&bytes, 261);
    let first = 2 * 48;
    let id_len = records[first + 32] as usize;
    assert_eq!(&records[first + 33..first + 33 + id_len], b"SYSTEM.CNF;1");
}

#[test]
fn test_output_size_is_multiple_of_sixteen_sectors() {
    let dir = TempDir::new().unwrap();
    for (i, size) in [0usize, 1, 2047, 2048, 2049, 70_000].into_iter().enumerate() {
        fs::write(dir.path().join(format!("F{}.BIN", i)), vec![0xAA; size]).unwrap();
    }
    let out = TempDir::new().unwrap();
    let dest = out.path().join("sizes.iso");

    let job = Packer::start(dir.path(), &dest, VolumeSpec::default()).unwrap();
    job.wait().unwrap();
    let len = fs::metadata(&dest).unwrap().len();
    assert_eq!(len % (16 * SECTOR as u64), 0);
}

#[test]
fn test_progress_reaches_finished() {
    let src = sample_source();
    let out = TempDir::new().unwrap();
    let progress = SharedProgress::new();
    Packer::run(src.path(), out.path().join("p.iso"), VolumeSpec::default(), &progress).unwrap();

    let last = progress.poll();
    assert_eq!(last.state, ProgressState::Finished);
    assert_eq!(last.progress, 1.0);
    assert!(last.finished);
}

#[test]
fn test_recording_times() {
    let bytes = build_sample();
    // 2004-09-03 07:33:47, type 1 with a +540 minute offset
    let udf_time = [0x1C, 0x12, 0xD4, 0x07, 9, 3, 7, 33, 47, 0, 0, 0];

    assert_eq!(&sector(&bytes, 32)[376..388], &udf_time);
    assert_eq!(&sector(&bytes, 64)[16..28], &udf_time);
    assert_eq!(&sector(&bytes, 263)[16..28], &udf_time);
    let root_fe = sector(&bytes, 263 + 4);
    assert_eq!(udf::tag_identifier(root_fe), tag::FILE_ENTRY);
    for offset in [72, 84, 96] {
        assert_eq!(&root_fe[offset..offset + 12], &udf_time);
    }

    let pvd = sector(&bytes, 16);
    assert_eq!(&pvd[156 + 18..156 + 25], &[120, 8, 25, 11, 30, 0, 0]);
    assert_eq!(&pvd[813..829], b"2009090307334700");
    assert_eq!(pvd[829], 0x24);

    // "." in the root record block carries the same date
    assert_eq!(&sector(&bytes, 261)[18..25], &[120, 8, 25, 11, 30, 0, 0]);
}
