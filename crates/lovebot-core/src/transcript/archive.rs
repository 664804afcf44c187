//! Zip-packaged chat exports.

use std::io::{Cursor, Read};

use serde::Serialize;
use tracing::debug;

use crate::error::{LovebotError, LovebotResult};

use super::parser::{is_export_format, parse, TranscriptEntry};

/// Nested archives deeper than this are ignored.
pub const MAX_NESTING: usize = 3;

/// Largest uncompressed size accepted for a single entry.
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Largest uncompressed size accepted across all entries, nested ones included.
pub const MAX_TOTAL_BYTES: u64 = 256 * 1024 * 1024;

/// Decompression limits for one extraction.
#[derive(Debug, Clone, Copy)]
struct Limits {
    entry_bytes: u64,
    remaining: u64,
}

impl Limits {
    /// Read `entry` fully, failing once it exceeds either limit. The declared
    /// size is checked first but not trusted.
    fn read(&mut self, entry: &mut impl Read, declared: u64, name: &str) -> LovebotResult<Vec<u8>> {
        let cap = self.entry_bytes.min(self.remaining);
        if declared > cap {
            return Err(too_large(name, cap));
        }
        let mut buf = Vec::new();
        entry.take(cap + 1).read_to_end(&mut buf)?;
        let read = buf.len() as u64;
        if read > cap {
            return Err(too_large(name, cap));
        }
        self.remaining -= read;
        Ok(buf)
    }
}

fn too_large(name: &str, limit: u64) -> LovebotError {
    LovebotError::validation(format!(
        "archive entry '{}' expands beyond {} bytes",
        name, limit
    ))
}

/// What happened to one archive entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveEntryReport {
    /// Path inside the archive; nested archives are joined with `!/`.
    pub name: String,
    /// Whether the entry looked like a chat export.
    pub recognized: bool,
    /// Messages parsed from the entry.
    pub parsed: usize,
    /// Messages kept after dropping media placeholders.
    pub imported: usize,
}

/// Text entries extracted from an archive, with their reports.
#[derive(Debug, Default)]
pub struct ExtractedArchive {
    pub entries: Vec<TranscriptEntry>,
    pub reports: Vec<ArchiveEntryReport>,
}

/// Extract and parse every `.txt` entry that independently looks like a chat
/// export, following nested `.zip` entries up to [`MAX_NESTING`] levels.
/// Entries larger than [`MAX_ENTRY_BYTES`], or a total beyond
/// [`MAX_TOTAL_BYTES`], fail the extraction.
pub fn extract_archive(bytes: &[u8]) -> LovebotResult<ExtractedArchive> {
    extract_with_limits(bytes, MAX_ENTRY_BYTES, MAX_TOTAL_BYTES)
}

fn extract_with_limits(
    bytes: &[u8],
    entry_bytes: u64,
    total_bytes: u64,
) -> LovebotResult<ExtractedArchive> {
    let mut out = ExtractedArchive::default();
    let mut limits = Limits {
        entry_bytes,
        remaining: total_bytes,
    };
    walk(bytes, "", 1, &mut limits, &mut out)?;
    Ok(out)
}

fn walk(
    bytes: &[u8],
    prefix: &str,
    depth: usize,
    limits: &mut Limits,
    out: &mut ExtractedArchive,
) -> LovebotResult<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = format!("{}{}", prefix, entry.name());
        let lowered = name.to_lowercase();

        if lowered.ends_with(".zip") {
            if depth >= MAX_NESTING {
                debug!(entry = %name, "Skipping archive nested too deeply");
                continue;
            }
            let declared = entry.size();
            let inner = limits.read(&mut entry, declared, &name)?;
            drop(entry);
            walk(&inner, &format!("{}!/", name), depth + 1, limits, out)?;
        } else if lowered.ends_with(".txt") {
            let declared = entry.size();
            let raw = limits.read(&mut entry, declared, &name)?;
            let text = String::from_utf8_lossy(&raw);

            if !is_export_format(&text) {
                out.reports.push(ArchiveEntryReport {
                    name,
                    recognized: false,
                    parsed: 0,
                    imported: 0,
                });
                continue;
            }

            let parsed = parse(&text);
            let total = parsed.len();
            let kept: Vec<TranscriptEntry> =
                parsed.into_iter().filter(|e| !e.is_media_placeholder).collect();
            out.reports.push(ArchiveEntryReport {
                name,
                recognized: true,
                parsed: total,
                imported: kept.len(),
            });
            out.entries.extend(kept);
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    pub(crate) fn zip_of(files: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in files {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(data).expect("write file");
        }
        writer.finish().expect("finish").into_inner()
    }

    fn chat(sender: &str, n: usize) -> Vec<u8> {
        (0..n)
            .map(|i| format!("[1/1/2024, 10:{:02}:00] {}: message {}", i, sender, i))
            .collect::<Vec<_>>()
            .join("\n")
            .into_bytes()
    }

    #[test]
    fn test_extracts_recognized_text_entries() {
        let bytes = zip_of(&[
            ("_chat.txt", chat("Ana", 4)),
            ("notes.txt", b"shopping list\nmilk\neggs".to_vec()),
            ("photo.jpg", vec![0xff, 0xd8]),
        ]);
        let extracted = extract_archive(&bytes).unwrap();
        assert_eq!(extracted.entries.len(), 4);
        assert_eq!(extracted.reports.len(), 2);
        assert!(extracted.reports.iter().any(|r| r.name == "_chat.txt" && r.recognized));
        assert!(extracted.reports.iter().any(|r| r.name == "notes.txt" && !r.recognized));
    }

    #[test]
    fn test_nested_archives_depth_limited() {
        let level3 = zip_of(&[("deep.txt", chat("Cleo", 3))]);
        let level2 = zip_of(&[("inner.txt", chat("Ben", 3)), ("level3.zip", level3)]);
        let level1 = zip_of(&[("outer.txt", chat("Ana", 3)), ("level2.zip", level2.clone())]);

        let extracted = extract_archive(&level1).unwrap();
        let names: Vec<&str> = extracted.reports.iter().map(|r| r.name.as_str()).collect();
        assert!(names.contains(&"outer.txt"));
        assert!(names.contains(&"level2.zip!/inner.txt"));
        assert!(names.contains(&"level2.zip!/level3.zip!/deep.txt"));

        let too_deep = zip_of(&[("level1.zip", level1)]);
        let extracted = extract_archive(&too_deep).unwrap();
        assert!(!extracted.reports.iter().any(|r| r.name.ends_with("deep.txt")));
    }

    #[test]
    fn test_oversized_entry_rejected() {
        let bytes = zip_of(&[("_chat.txt", chat("Ana", 40))]);
        let err = extract_with_limits(&bytes, 64, MAX_TOTAL_BYTES).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ValInvalidInput);
        assert!(err.to_string().contains("_chat.txt"));

        assert!(extract_with_limits(&bytes, MAX_ENTRY_BYTES, MAX_TOTAL_BYTES).is_ok());
    }

    #[test]
    fn test_total_size_limited_across_nested_archives() {
        let one = chat("Ana", 5);
        let inner = zip_of(&[("b.txt", one.clone())]);
        let bytes = zip_of(&[("a.txt", one.clone()), ("inner.zip", inner.clone())]);
        let needed = (one.len() * 2 + inner.len()) as u64;

        let err = extract_with_limits(&bytes, MAX_ENTRY_BYTES, needed - 1).unwrap_err();
        assert!(err.to_string().contains("expands beyond"));

        let extracted = extract_with_limits(&bytes, MAX_ENTRY_BYTES, needed).unwrap();
        assert_eq!(extracted.entries.len(), 10);
    }

    #[test]
    fn test_compressed_bomb_is_cut_off() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        writer.start_file("_chat.txt", options).unwrap();
        writer.write_all(&vec![b'a'; 1 << 20]).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(bytes.len() < 1 << 16);

        assert!(extract_with_limits(&bytes, 1 << 16, MAX_TOTAL_BYTES).is_err());
    }

    #[test]
    fn test_not_a_zip() {
        assert!(extract_archive(b"definitely not a zip").is_err());
    }
}
