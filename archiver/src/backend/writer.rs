//! Archive container writers.

use crate::format::ArchiveFormat;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, Write};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Write `files` (relative to `root`) into a new archive at `output`.
///
/// # Errors
///
/// Returns an I/O error if a source file cannot be read or the archive
/// cannot be written.
pub fn write_archive(
    format: ArchiveFormat,
    root: &Utf8Path,
    files: &[Utf8PathBuf],
    output: &Utf8Path,
) -> io::Result<()> {
    let file = File::create(output)?;
    match format {
        ArchiveFormat::Zip => write_zip(file, root, files),
        ArchiveFormat::Tar => write_tar(file, root, files)?.flush(),
        ArchiveFormat::TarGz => {
            let encoder = write_tar(GzEncoder::new(file, Compression::default()), root, files)?;
            encoder.finish()?.flush()
        }
    }
}

fn write_zip(file: File, root: &Utf8Path, files: &[Utf8PathBuf]) -> io::Result<()> {
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for relative in files {
        zip.start_file(relative.as_str(), options)
            .map_err(io::Error::other)?;
        let mut source = File::open(root.join(relative))?;
        io::copy(&mut source, &mut zip)?;
    }
    zip.finish().map_err(io::Error::other)?.flush()
}

fn write_tar<W: Write>(writer: W, root: &Utf8Path, files: &[Utf8PathBuf]) -> io::Result<W> {
    let mut archive = tar::Builder::new(writer);
    for relative in files {
        archive.append_path_with_name(root.join(relative), relative)?;
    }
    archive.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use rstest::rstest;
    use std::io::Read;
    use tempfile::TempDir;

    fn source_tree() -> (TempDir, Utf8PathBuf, Vec<Utf8PathBuf>) {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf8");
        std::fs::create_dir_all(root.join("src")).expect("mkdir");
        std::fs::write(root.join("composer.json"), "{}").expect("write");
        std::fs::write(root.join("src/lib.php"), "<?php").expect("write");
        let files = vec![
            Utf8PathBuf::from("composer.json"),
            Utf8PathBuf::from("src/lib.php"),
        ];
        (dir, root, files)
    }

    fn tar_entries<R: Read>(reader: R) -> Vec<String> {
        let mut archive = tar::Archive::new(reader);
        archive
            .entries()
            .expect("entries")
            .map(|entry| {
                let entry = entry.expect("entry");
                entry.path().expect("path").display().to_string()
            })
            .collect()
    }

    #[test]
    fn zip_contains_relative_entries() {
        let (_guard, root, files) = source_tree();
        let output = root.join("out.zip");

        write_archive(ArchiveFormat::Zip, &root, &files, &output).expect("writes");

        let mut archive = zip::ZipArchive::new(File::open(&output).expect("open")).expect("zip");
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names.len(), 2);
        let mut contents = String::new();
        archive
            .by_name("src/lib.php")
            .expect("entry")
            .read_to_string(&mut contents)
            .expect("read");
        assert_eq!(contents, "<?php");
    }

    #[rstest]
    #[case::tar(ArchiveFormat::Tar)]
    #[case::tar_gz(ArchiveFormat::TarGz)]
    fn tar_formats_contain_relative_entries(#[case] format: ArchiveFormat) {
        let (_guard, root, files) = source_tree();
        let output = root.join(format!("out.{}", format.extension()));

        write_archive(format, &root, &files, &output).expect("writes");

        let file = File::open(&output).expect("open");
        let entries = if format == ArchiveFormat::TarGz {
            tar_entries(GzDecoder::new(file))
        } else {
            tar_entries(file)
        };
        assert_eq!(entries, vec!["composer.json", "src/lib.php"]);
    }

    #[test]
    fn missing_source_file_fails() {
        let (_guard, root, _) = source_tree();
        let output = root.join("out.tar");

        let outcome = write_archive(
            ArchiveFormat::Tar,
            &root,
            &[Utf8PathBuf::from("absent.php")],
            &output,
        );

        assert!(outcome.is_err());
    }
}
