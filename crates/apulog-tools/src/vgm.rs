use std::fs;
use std::io::{Read, stdin};
use std::path::{Path, PathBuf};

use anyhow::Context;
use apulog::chip::{Channel, SAMPLE_RATE};
use apulog::functional::{FunctionalEvent, to_compact, to_functional};
use apulog::vgm::{RawEvent, SimplifyOptions, VgmHeader, decode};
use apulog::{FrameRate, Representation, cycle};
use clap::ValueEnum;
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};
use flate2::read::GzDecoder;

/// Event log flavour printed by `dump`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    Raw,
    Functional,
    Compact,
}

/// Representation names accepted by `cycle --through`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Through {
    Raw,
    Functional,
    Compact,
    Rawsco,
    Exprsco,
    Seprsco,
    Blndsco,
    Notation,
}

impl Through {
    pub fn representation(self, rate: FrameRate) -> Representation {
        match self {
            Through::Raw => Representation::Raw,
            Through::Functional => Representation::Functional,
            Through::Compact => Representation::Compact,
            Through::Rawsco => Representation::RawScore,
            Through::Exprsco => Representation::Expressive(rate),
            Through::Seprsco => Representation::Separated(rate),
            Through::Blndsco => Representation::Blended(rate),
            Through::Notation => Representation::Notation(rate),
        }
    }
}

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Inflate `bytes` when they carry the gzip magic or `compressed` is set.
fn gunzip(bytes: Vec<u8>, compressed: bool, source: &str) -> anyhow::Result<Vec<u8>> {
    if !compressed && !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut out)
        .with_context(|| format!("failed to decompress {}", source))?;
    log::debug!("{}: inflated {} bytes to {}", source, bytes.len(), out.len());
    Ok(out)
}

/// Read a trace from `path`, or from stdin when `path` is `-`.
///
/// `.vgz` files and any input starting with the gzip magic are inflated.
pub fn read_vgm_as_vec(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut bytes = Vec::new();
        stdin()
            .read_to_end(&mut bytes)
            .context("failed to read from stdin")?;
        return gunzip(bytes, false, "stdin");
    }

    let bytes = fs::read(path)
        .with_context(|| format!("failed to read input file: {}", path.display()))?;
    let vgz = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("vgz"));
    gunzip(bytes, vgz, &path.display().to_string())
}

fn display_path(path: &Path) -> String {
    match path.canonicalize() {
        Ok(p) => p.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

fn summarize(header: &VgmHeader, events: &[RawEvent]) -> anyhow::Result<Vec<(String, String)>> {
    let clock = events
        .first()
        .and_then(RawEvent::clock)
        .context("decoded trace has no clock")?;

    let (mut writes, mut waits, mut blocks) = (0usize, 0usize, 0usize);
    for event in events {
        match event {
            RawEvent::RegisterWrite { .. } => writes += 1,
            RawEvent::Wait(_) => waits += 1,
            RawEvent::RawData { .. } => blocks += 1,
            RawEvent::Clock(_) => {}
        }
    }

    let seconds = header.total_samples as f64 / SAMPLE_RATE as f64;
    let mut rows: Vec<(String, String)> = vec![
        ("VGM version".into(), format!("0x{:08X}", header.version)),
        ("clock".into(), format!("{} ({:?})", clock, clock.region())),
        ("data_start".into(), format!("0x{:08X}", header.data_start)),
        ("gd3_offset".into(), format!("0x{:08X}", header.gd3_offset)),
        (
            "total_samples".into(),
            format!("{} ({:.3} s @ 44100Hz)", header.total_samples, seconds),
        ),
        (
            "events".into(),
            format!("writes={} waits={} data_blocks={}", writes, waits, blocks),
        ),
    ];

    match to_functional(events) {
        Ok(functional) => {
            for channel in Channel::ALL {
                let count = functional
                    .iter()
                    .filter(|e| matches!(e, FunctionalEvent::FunctionWrite(w) if w.channel == channel))
                    .count();
                if count > 0 {
                    rows.push((format!("functions.{}", channel), count.to_string()));
                }
            }
        }
        Err(e) => rows.push(("functions".into(), format!("(disassembly failed: {})", e))),
    }
    Ok(rows)
}

/// Info command: decode a trace and print a summary table.
///
/// On decode error this prints a one-line message with the canonicalized path to stderr
/// and returns Ok(()) so callers can continue processing other files.
pub fn info(path: &Path, data: Vec<u8>) -> anyhow::Result<()> {
    let file_str = display_path(path);
    log::info!("{}: {} bytes", file_str, data.len());

    let events = match decode(&data) {
        Ok(events) => events,
        Err(e) => {
            eprintln!("\"{}\": decode error: {}", file_str, e);
            return Ok(());
        }
    };
    let header = VgmHeader::parse(&data)
        .with_context(|| format!("failed to re-read header of {}", file_str))?;

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);
    for (k, v) in summarize(&header, &events)? {
        table.add_row(vec![Cell::new(k), Cell::new(v)]);
    }
    println!("\"{}\"", file_str);
    println!("{table}");
    Ok(())
}

/// Dump command: print the decoded log in the chosen representation.
pub fn dump(path: &Path, data: Vec<u8>, format: DumpFormat) -> anyhow::Result<()> {
    let events =
        decode(&data).with_context(|| format!("failed to decode {}", path.display()))?;
    match format {
        DumpFormat::Raw => events.iter().for_each(|e| println!("{e}")),
        DumpFormat::Functional => to_functional(&events)?
            .iter()
            .for_each(|e| println!("{e}")),
        DumpFormat::Compact => to_compact(&to_functional(&events)?)?
            .iter()
            .for_each(|e| println!("{e}")),
    }
    Ok(())
}

/// Simplify command: sanitize a raw dump and write it to `output`.
pub fn simplify(
    input: &Path,
    output: &Path,
    data: Vec<u8>,
    options: &SimplifyOptions,
) -> anyhow::Result<()> {
    let (bytes, removed) = apulog::vgm::simplify(&data, options)
        .with_context(|| format!("failed to simplify {}", input.display()))?;
    fs::write(output, &bytes)
        .with_context(|| format!("failed to write output file: {}", output.display()))?;
    println!(
        "{} -> {}: removed {} commands ({} -> {} bytes)",
        input.display(),
        output.display(),
        removed,
        data.len(),
        bytes.len()
    );
    Ok(())
}

/// Shorten command: keep a window of events and write it to `output`.
pub fn shorten(
    input: &Path,
    output: &Path,
    data: Vec<u8>,
    max_events: usize,
    start: Option<usize>,
) -> anyhow::Result<()> {
    let bytes = apulog::vgm::shorten(&data, max_events, start)
        .with_context(|| format!("failed to shorten {}", input.display()))?;
    fs::write(output, &bytes)
        .with_context(|| format!("failed to write output file: {}", output.display()))?;
    Ok(())
}

/// Cycle command: run every file through `repr` and report how the result compares.
///
/// Per-file failures are printed to stderr and the remaining files are still processed.
pub fn cycle_files(
    files: &[PathBuf],
    repr: Representation,
    out_dir: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("File"),
        Cell::new("Through"),
        Cell::new("Bytes in"),
        Cell::new("Bytes out"),
        Cell::new("Identical"),
    ]);

    for file in files {
        let file_str = display_path(file);
        log::info!("cycling {} through {}", file_str, repr);
        let data = match read_vgm_as_vec(file) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("\"{}\": {:#}", file_str, e);
                continue;
            }
        };
        let cycled = match cycle(&data, repr) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("\"{}\": {}", file_str, e);
                continue;
            }
        };
        if let Some(dir) = out_dir {
            let name = file.file_stem().map(|s| s.to_string_lossy().into_owned());
            let target = dir.join(format!("{}.{}.vgm", name.as_deref().unwrap_or("stdin"), repr));
            log::debug!("writing {}", target.display());
            if let Err(e) = fs::write(&target, &cycled) {
                eprintln!("\"{}\": failed to write {}: {}", file_str, target.display(), e);
            }
        }
        table.add_row(vec![
            Cell::new(file.display()),
            Cell::new(repr),
            Cell::new(data.len()),
            Cell::new(cycled.len()),
            Cell::new(if cycled == data { "yes" } else { "no" }),
        ]);
    }

    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn scratch(name: &str, bytes: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("apulog-tools-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn reads_plain_and_compressed_files() {
        let payload = b"Vgm \x00\x01\x02";
        let plain = scratch("plain.vgm", payload);
        let packed = scratch("packed.vgz", &gzip(payload));
        let sniffed = scratch("sniffed.vgm", &gzip(payload));

        assert_eq!(read_vgm_as_vec(&plain).unwrap(), payload);
        assert_eq!(read_vgm_as_vec(packed.as_path()).unwrap(), payload);
        assert_eq!(read_vgm_as_vec(&sniffed).unwrap(), payload);
    }

    #[test]
    fn reports_missing_and_corrupt_files() {
        let missing = std::env::temp_dir().join("apulog-tools-missing.vgm");
        assert!(read_vgm_as_vec(&missing).is_err());

        let corrupt = scratch("corrupt.vgz", b"not gzip");
        let err = read_vgm_as_vec(&corrupt).unwrap_err();
        assert!(format!("{err:#}").contains("failed to decompress"));
    }

    #[test]
    fn through_names_map_to_representations() {
        let rate = FrameRate::Fixed(24.0);
        assert_eq!(Through::Rawsco.representation(rate), Representation::RawScore);
        assert_eq!(
            Through::Notation.representation(rate),
            Representation::Notation(rate)
        );
    }
}
