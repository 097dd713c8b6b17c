//! Parser for `key=value` property files.

use std::io::{self, BufRead};

/// Parses `reader` into `(name, value)` pairs.
///
/// Each line loses trailing newlines, carriage returns and spaces, and leading
/// spaces. Comment lines (`#`), lines without `=` and lines starting with `=`
/// are skipped. Nothing else is trimmed, so `a = b` yields the name `"a "`.
pub fn parse_prop_file<R: BufRead>(mut reader: R) -> io::Result<Vec<(String, String)>> {
    let mut entries = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line
            .trim_end_matches(|c: char| c == '\n' || c == '\r' || c == ' ')
            .trim_start_matches(' ');

        if line.starts_with('#') {
            continue;
        }
        match line.find('=') {
            Some(eq) if eq > 0 => {
                entries.push((line[..eq].to_string(), line[eq + 1..].to_string()));
            }
            _ => continue,
        }
    }

    Ok(entries)
}
