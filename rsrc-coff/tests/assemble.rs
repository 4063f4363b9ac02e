// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    byteorder::{ByteOrder, LittleEndian, WriteBytesExt},
    rsrc_coff::{
        assemble_resources, package_raw_data, raw_data_symbol, IconGroup, OpenedInputs,
        Registration, ResourceInputs, ResourceType, Result, SizedFile,
    },
    std::{
        io::Write,
        path::{Path, PathBuf},
    },
};

const SECTION_DATA: usize = 20 + 40;

const MANIFEST: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<assembly xmlns="urn:schemas-microsoft-com:asm.v1" manifestVersion="1.0"/>
"#;

fn u16_at(data: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&data[offset..offset + 2])
}

fn u32_at(data: &[u8], offset: usize) -> u32 {
    LittleEndian::read_u32(&data[offset..offset + 4])
}

fn write_file(dir: &Path, name: &str, data: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut fh = std::fs::File::create(&path)?;
    fh.write_all(data)?;

    Ok(path)
}

/// An `.ico` file with square 32 bpp images.
fn ico_file(images: &[(u8, &[u8])]) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.write_u16::<LittleEndian>(0)?;
    data.write_u16::<LittleEndian>(1)?;
    data.write_u16::<LittleEndian>(images.len() as u16)?;

    let mut offset = 6 + 16 * images.len() as u32;
    for (size, pixels) in images {
        data.write_u8(*size)?;
        data.write_u8(*size)?;
        data.write_u8(0)?;
        data.write_u8(0)?;
        data.write_u16::<LittleEndian>(1)?;
        data.write_u16::<LittleEndian>(32)?;
        data.write_u32::<LittleEndian>(pixels.len() as u32)?;
        data.write_u32::<LittleEndian>(offset)?;
        offset += pixels.len() as u32;
    }

    for (_, pixels) in images {
        data.extend_from_slice(pixels);
    }

    Ok(data)
}

/// Entries of the resource directory table at `offset` in the section.
fn table_entries(data: &[u8], offset: usize) -> Vec<(u32, u32)> {
    let table = SECTION_DATA + offset;
    let count = u16_at(data, table + 12) as usize + u16_at(data, table + 14) as usize;

    (0..count)
        .map(|i| {
            let entry = table + 16 + 8 * i;
            (u32_at(data, entry), u32_at(data, entry + 4))
        })
        .collect()
}

/// Walk the resource directory of an object and collect (type, id, payload).
fn resource_leaves(data: &[u8]) -> Vec<(u32, u32, Vec<u8>)> {
    let mut leaves = vec![];

    for (kind, ids) in table_entries(data, 0) {
        assert_ne!(ids & 0x8000_0000, 0);

        for (id, langs) in table_entries(data, (ids & 0x7fff_ffff) as usize) {
            assert_ne!(langs & 0x8000_0000, 0);

            for (lang, data_entry) in table_entries(data, (langs & 0x7fff_ffff) as usize) {
                assert_eq!(lang, 0x0409);
                assert_eq!(data_entry & 0x8000_0000, 0);

                let entry = SECTION_DATA + data_entry as usize;
                let start = SECTION_DATA + u32_at(data, entry) as usize;
                let len = u32_at(data, entry + 4) as usize;
                assert_eq!((start - SECTION_DATA) % 8, 0);

                leaves.push((kind, id, data[start..start + len].to_vec()));
            }
        }
    }

    leaves
}

fn build(inputs: &ResourceInputs, architecture: &str) -> Result<Vec<u8>> {
    let opened = OpenedInputs::open(inputs)?;
    let (coff, _) = assemble_resources(&opened, architecture)?;

    let mut data = Vec::new();
    let written = coff.write_to(&mut data)?;
    assert_eq!(written, data.len() as u64);
    assert_eq!(coff.file_size()?, written);

    Ok(data)
}

#[test]
fn manifest_and_two_images() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let manifest = write_file(dir.path(), "app.manifest", MANIFEST)?;
    let icon = write_file(
        dir.path(),
        "app.ico",
        &ico_file(&[(16, &[0xaa; 40][..]), (32, &[0xbb; 130][..])])?,
    )?;

    let inputs = ResourceInputs {
        manifest: Some(manifest.clone()),
        icons: vec![icon.clone()],
        version: None,
    };
    let opened = OpenedInputs::open(&inputs)?;
    let (coff, report) = assemble_resources(&opened, "386")?;

    assert_eq!(
        coff.resources()
            .iter()
            .map(|r| (r.kind(), r.id()))
            .collect::<Vec<_>>(),
        vec![
            (ResourceType::Manifest, 1),
            (ResourceType::Icon, 2),
            (ResourceType::Icon, 3),
            (ResourceType::GroupIcon, 4),
        ]
    );
    assert_eq!(
        report.registrations(),
        &[
            Registration::Manifest {
                path: manifest,
                id: 1
            },
            Registration::IconGroup {
                path: icon,
                group: IconGroup {
                    group_id: 4,
                    image_ids: vec![2, 3]
                }
            },
        ]
    );

    let mut data = Vec::new();
    coff.write_to(&mut data)?;
    assert_eq!(u16_at(&data, 0), 0x014c);

    let leaves = resource_leaves(&data);
    assert_eq!(
        leaves
            .iter()
            .map(|(kind, id, _)| (*kind, *id))
            .collect::<Vec<_>>(),
        vec![(3, 2), (3, 3), (14, 4), (24, 1)]
    );

    // Images are copied verbatim.
    assert_eq!(leaves[0].2, vec![0xaa; 40]);
    assert_eq!(leaves[1].2, vec![0xbb; 130]);
    assert_eq!(leaves[3].2, MANIFEST);

    // The group lists both images by resource id.
    let group = &leaves[2].2;
    assert_eq!(group.len(), 6 + 2 * 14);
    assert_eq!(u16_at(group, 4), 2);
    assert_eq!(group[6], 16);
    assert_eq!(u32_at(group, 6 + 8), 40);
    assert_eq!(u16_at(group, 6 + 12), 2);
    assert_eq!(group[6 + 14], 32);
    assert_eq!(u32_at(group, 6 + 14 + 8), 130);
    assert_eq!(u16_at(group, 6 + 14 + 12), 3);

    // One relocation per resource.
    assert_eq!(u16_at(&data, 20 + 32), 4);

    Ok(())
}

#[test]
fn icon_without_images() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let manifest = write_file(dir.path(), "app.manifest", MANIFEST)?;
    let icon = write_file(dir.path(), "empty.ico", &ico_file(&[])?)?;

    let opened = OpenedInputs::open(&ResourceInputs {
        manifest: Some(manifest),
        icons: vec![icon.clone()],
        version: None,
    })?;
    let (coff, report) = assemble_resources(&opened, "amd64")?;

    assert_eq!(coff.resources().len(), 1);
    assert_eq!(coff.resources()[0].kind(), ResourceType::Manifest);
    assert_eq!(
        report.registrations()[1],
        Registration::EmptyIconFile { path: icon }
    );

    Ok(())
}

#[test]
fn manifest_only() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let manifest = write_file(dir.path(), "app.manifest", MANIFEST)?;

    let data = build(
        &ResourceInputs {
            manifest: Some(manifest),
            ..Default::default()
        },
        "amd64",
    )?;

    let leaves = resource_leaves(&data);
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].0, 24);
    assert_eq!(leaves[0].1, 1);
    assert_eq!(leaves[0].2, MANIFEST);

    Ok(())
}

#[test]
fn icons_in_listed_order() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let first = write_file(dir.path(), "a.ico", &ico_file(&[(16, &b"first"[..])])?)?;
    let second = write_file(
        dir.path(),
        "b.ico",
        &ico_file(&[(16, &b"second-a"[..]), (48, &b"second-b"[..])])?,
    )?;

    let mut inputs = ResourceInputs::default();
    inputs.add_icon_list(&format!("{},{}", first.display(), second.display()));

    let data = build(&inputs, "arm64")?;
    assert_eq!(u16_at(&data, 0), 0xaa64);

    let leaves = resource_leaves(&data);
    assert_eq!(
        leaves
            .iter()
            .map(|(kind, id, _)| (*kind, *id))
            .collect::<Vec<_>>(),
        vec![(3, 1), (3, 3), (3, 4), (14, 2), (14, 5)]
    );
    assert_eq!(leaves[0].2, b"first");
    assert_eq!(leaves[1].2, b"second-a");
    assert_eq!(leaves[2].2, b"second-b");

    Ok(())
}

#[test]
fn version_resource() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let manifest = write_file(dir.path(), "app.manifest", MANIFEST)?;
    let version = write_file(
        dir.path(),
        "versioninfo.json",
        br#"{"FixedFileInfo": {"FileVersion": {"Major": 2}}}"#,
    )?;

    let data = build(
        &ResourceInputs {
            manifest: Some(manifest),
            icons: vec![],
            version: Some(version),
        },
        "386",
    )?;

    let leaves = resource_leaves(&data);
    assert_eq!(leaves.len(), 2);
    assert_eq!((leaves[0].0, leaves[0].1), (16, 1));
    assert_eq!((leaves[1].0, leaves[1].1), (24, 1));

    let version = &leaves[0].2;
    assert_eq!(u16_at(version, 0) as usize, version.len());
    assert_eq!(u32_at(version, 40), 0xfeef_04bd);
    assert_eq!(u32_at(version, 48), 0x0002_0000);

    Ok(())
}

#[test]
fn identical_inputs_identical_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let manifest = write_file(dir.path(), "app.manifest", MANIFEST)?;
    let icon = write_file(
        dir.path(),
        "app.ico",
        &ico_file(&[(16, &[1; 33][..]), (0, &[2; 7][..])])?,
    )?;
    let version = write_file(
        dir.path(),
        "versioninfo.json",
        br#"{"StringFileInfo": {"CompanyName": "Acme"}}"#,
    )?;

    let inputs = ResourceInputs {
        manifest: Some(manifest),
        icons: vec![icon],
        version: Some(version),
    };

    assert_eq!(build(&inputs, "amd64")?, build(&inputs, "amd64")?);

    Ok(())
}

#[test]
fn raw_data_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let payload = (0..=255u8).cycle().take(70_000).collect::<Vec<_>>();
    let path = write_file(dir.path(), "blob.bin", &payload)?;
    let output = dir.path().join("blob_data.syso");

    let symbol = raw_data_symbol(&output)?;
    assert_eq!(symbol, "blob_data");

    let file = SizedFile::open(&path)?;
    let coff = package_raw_data(&file, &symbol, "amd64")?;

    let mut fh = std::fs::File::create(&output)?;
    coff.write_to(&mut fh)?;
    fh.flush()?;

    let data = std::fs::read(&output)?;
    assert_eq!(u16_at(&data, 0), 0x8664);
    assert_eq!(&data[20..28], b".rdata\0\0");
    assert_eq!(
        &data[SECTION_DATA..SECTION_DATA + payload.len()],
        payload.as_slice()
    );
    assert_eq!(
        &data[SECTION_DATA + payload.len()..SECTION_DATA + payload.len() + 2],
        b"\0\0"
    );

    // Section symbol, begin marker, end marker.
    let symbols = u32_at(&data, 8) as usize;
    assert_eq!(u32_at(&data, 12), 3);
    assert_eq!(u32_at(&data, symbols + 18 + 8), 0);
    assert_eq!(u32_at(&data, symbols + 36 + 8), payload.len() as u32);

    let strings = symbols + 3 * 18;
    assert_eq!(&data[strings + 4..], b"_brsrc_blob_data\0_ersrc_blob_data\0");

    Ok(())
}

#[test]
fn raw_data_symbol_rejects_invalid_names() {
    assert!(raw_data_symbol(Path::new("Blob.syso")).is_err());
    assert!(raw_data_symbol(Path::new("blob-data.syso")).is_err());
    assert!(raw_data_symbol(Path::new("blob.o")).is_err());
}
