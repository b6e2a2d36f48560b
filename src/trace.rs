use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            AccessKind::Read => "R",
            AccessKind::Write => "W",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceAccess {
    pub kind: AccessKind,
    pub address: u64,
}

#[derive(Debug, Clone)]
pub struct TraceFile {
    pub name: String,
    pub entries: Vec<TraceAccess>,
}

impl TraceFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Unable to open trace file {}", path.display()))?;
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_reader(BufReader::new(file), name)
    }

    /// Parses a trace: an optional line holding the number of references,
    /// then one `<R|W> <address>` pair per line.
    pub fn from_reader(reader: impl BufRead, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut declared: Option<usize> = None;
        let mut seen_entry = false;
        let mut entries = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read line from trace")?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut parts = trimmed.split_whitespace();
            let op = parts
                .next()
                .with_context(|| format!("Trace line {} missing op", idx + 1))?;
            let Some(addr) = parts.next() else {
                if declared.is_none() && !seen_entry {
                    let count = op.parse().with_context(|| {
                        format!("Trace line {}: invalid reference count '{}'", idx + 1, op)
                    })?;
                    declared = Some(count);
                    seen_entry = true;
                    continue;
                }
                bail!("Trace line {} missing address", idx + 1);
            };
            seen_entry = true;
            if parts.next().is_some() {
                bail!("Trace line {} has extra tokens", idx + 1);
            }
            let kind = match op.to_ascii_lowercase().chars().next() {
                Some('r') => AccessKind::Read,
                Some('w') => AccessKind::Write,
                _ => bail!("Trace line {} has invalid op '{}'", idx + 1, op),
            };
            let address = parse_address(addr).with_context(|| {
                format!("Trace line {}: invalid address literal '{}'", idx + 1, addr)
            })?;
            entries.push(TraceAccess { kind, address });
        }

        if let Some(count) = declared {
            if entries.len() < count {
                bail!(
                    "Trace {} declares {} references but only {} follow",
                    name,
                    count,
                    entries.len()
                );
            }
            if entries.len() > count {
                tracing::warn!(
                    trace = %name,
                    declared = count,
                    found = entries.len(),
                    "ignoring references past the declared count"
                );
                entries.truncate(count);
            }
        }
        Ok(Self { name, entries })
    }
}

fn parse_address(token: &str) -> io::Result<u64> {
    let token = token.trim();
    let (digits, radix) = if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        (hex, 16)
    } else if let Some(bin) = token
        .strip_prefix("0b")
        .or_else(|| token.strip_prefix("0B"))
    {
        (bin, 2)
    } else if let Some(oct) = token
        .strip_prefix("0o")
        .or_else(|| token.strip_prefix("0O"))
    {
        (oct, 8)
    } else {
        (token, 10)
    };
    u64::from_str_radix(digits, radix).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn parse(text: &str) -> Result<TraceFile> {
        TraceFile::from_reader(Cursor::new(text), "inline")
    }

    #[test]
    fn parses_counted_trace() {
        let trace = parse("3\nR 0\nw 8\nR 0x10\n").unwrap();
        assert_eq!(
            trace.entries,
            vec![
                TraceAccess {
                    kind: AccessKind::Read,
                    address: 0
                },
                TraceAccess {
                    kind: AccessKind::Write,
                    address: 8
                },
                TraceAccess {
                    kind: AccessKind::Read,
                    address: 16
                },
            ]
        );
    }

    #[test]
    fn header_is_optional() {
        let trace = parse("# comment\n\nR 12\nW 0b101\n").unwrap();
        assert_eq!(trace.entries.len(), 2);
        assert_eq!(trace.entries[0].address, 12);
        assert_eq!(trace.entries[1].address, 5);
    }

    #[test]
    fn addresses_default_to_decimal() {
        let trace = parse("R 10\n").unwrap();
        assert_eq!(trace.entries[0].address, 10);
    }

    #[test]
    fn extra_references_are_dropped() {
        let trace = parse("1\nR 0\nR 8\n").unwrap();
        assert_eq!(trace.entries.len(), 1);
    }

    #[test]
    fn short_trace_is_an_error() {
        let err = parse("4\nR 0\n").unwrap_err();
        assert!(err.to_string().contains("declares 4 references"));
    }

    #[test]
    fn malformed_lines_name_the_line() {
        let err = parse("R 0\nX 4\n").unwrap_err();
        assert_eq!(err.to_string(), "Trace line 2 has invalid op 'X'");
        assert!(parse("R 0 1\n").is_err());
        assert!(parse("R zz\n").is_err());
        assert!(parse("R 0\n7\n").is_err());
    }

    #[test]
    fn empty_file_gives_empty_trace() {
        let trace = parse("0\n").unwrap();
        assert!(trace.entries.is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2\nR 0\nW 8").unwrap();
        let trace = TraceFile::load(file.path()).unwrap();
        assert_eq!(trace.entries.len(), 2);
        assert_eq!(trace.entries[1].kind, AccessKind::Write);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = TraceFile::load("/nonexistent/trace.txt").unwrap_err();
        assert!(err.to_string().starts_with("Unable to open trace file"));
    }
}
