#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use flate2::Crc;
use zip::write::SimpleFileOptions;

/// Member of a fixture archive: a file with contents, or a directory.
pub enum Member<'a> {
    File(&'a str, &'a [u8]),
    Dir(&'a str),
}

/// Build a well-formed DEFLATE archive with the `zip` crate.
pub fn write_zip(path: &Path, members: &[Member<'_>]) {
    let mut zw = zip::ZipWriter::new(File::create(path).unwrap());
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for member in members {
        match member {
            Member::File(name, data) => {
                zw.start_file(*name, opts.clone()).unwrap();
                zw.write_all(data).unwrap();
            }
            Member::Dir(name) => {
                zw.add_directory(*name, opts.clone()).unwrap();
            }
        }
    }
    zw.finish().unwrap();
}

/// Assemble a STORED archive byte by byte.
///
/// Member names are written exactly as given, which is what hostile
/// archives need: no writer library gets a chance to tidy them up.
pub fn write_raw_zip(path: &Path, members: &[(&str, &str)]) {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, text) in members {
        let data = text.as_bytes();
        let mut crc = Crc::new();
        crc.update(data);
        let crc = crc.sum();
        let lfh_offset = out.len() as u32;

        out.extend_from_slice(b"PK\x03\x04");
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&0u16.to_le_bytes()); // stored
        out.extend_from_slice(&[0u8; 4]); // time, date
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);

        central.extend_from_slice(b"PK\x01\x02");
        central.extend_from_slice(&0x031eu16.to_le_bytes()); // made by unix
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&[0u8; 4]);
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&[0u8; 8]); // extra, comment, disk, internal attrs
        central.extend_from_slice(&(0o100644u32 << 16).to_le_bytes());
        central.extend_from_slice(&lfh_offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&central);
    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&(members.len() as u16).to_le_bytes());
    out.extend_from_slice(&(members.len() as u16).to_le_bytes());
    out.extend_from_slice(&(central.len() as u32).to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    std::fs::write(path, out).unwrap();
}

/// A well-formed archive cut in half: the central directory is gone.
pub fn write_truncated_zip(path: &Path) {
    let full = path.with_extension("full");
    write_zip(
        &full,
        &[
            Member::File("a.txt", b"alpha alpha alpha"),
            Member::File("b.txt", b"bravo bravo bravo"),
        ],
    );
    let bytes = std::fs::read(&full).unwrap();
    std::fs::remove_file(&full).unwrap();
    std::fs::write(path, &bytes[..bytes.len() / 2]).unwrap();
}

/// Every file below `root`, for "nothing escaped" assertions.
pub fn files_named(root: &Path, name: &str) -> Vec<std::path::PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_name() == name)
        .map(|e| e.into_path())
        .collect()
}
