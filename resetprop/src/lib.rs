//! # resetprop
//!
//! Command front end for the property resolver.

pub mod commands;

pub use commands::{parse_args, Command, CommandError, Invocation};

use persist_store::FileMetadata;
use prop_area::PropertyArea;
use prop_resolver::PropertyResolver;
use std::io::{self, Write};

/// Runs a parsed command against `resolver`, writing output to `out`.
///
/// Returns the process exit status.
pub fn run<A, M, W>(invocation: &Invocation, resolver: &mut PropertyResolver<A, M>, out: &mut W) -> i32
where
    A: PropertyArea,
    M: FileMetadata + Clone,
    W: Write,
{
    let flags = invocation.flags;
    let result = match &invocation.command {
        Command::List => print_all(resolver, invocation, out),
        Command::Get { name } => match resolver.get(name, flags) {
            Ok(value) => writeln!(out, "{}", value).map(|_| true),
            Err(_) => Ok(false),
        },
        Command::Set { name, value } => {
            Ok(resolver.set(name, value, invocation.set_flags(name)).is_ok())
        }
        Command::Delete { name } => Ok(resolver.delete(name, flags).is_ok()),
        Command::LoadFile { path } => match resolver.load_file(path, flags) {
            Ok(_) => Ok(true),
            Err(err) => {
                log::warn!("{}", err);
                Ok(false)
            }
        },
        Command::Help => Ok(true),
    };

    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            log::warn!("cannot write output: {}", err);
            1
        }
    }
}

fn print_all<A, M, W>(
    resolver: &PropertyResolver<A, M>,
    invocation: &Invocation,
    out: &mut W,
) -> io::Result<bool>
where
    A: PropertyArea,
    M: FileMetadata + Clone,
    W: Write,
{
    for (name, value) in resolver.list_all(invocation.flags) {
        writeln!(out, "[{}]: [{}]", name, value)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use persist_store::StoreConfig;
    use prop_area::MemoryPropertyArea;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn setup(area: MemoryPropertyArea) -> (TempDir, PropertyResolver<MemoryPropertyArea>) {
        let dir = tempdir().unwrap();
        let resolver = PropertyResolver::new(area, StoreConfig::with_dir(dir.path()));
        (dir, resolver)
    }

    fn invoke(
        resolver: &mut PropertyResolver<MemoryPropertyArea>,
        args: &[&str],
    ) -> (i32, String) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let invocation = parse_args(&args).unwrap();
        let mut out = Vec::new();
        let status = run(&invocation, resolver, &mut out);
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_list_format() {
        let area = MemoryPropertyArea::new()
            .with_property("sys.b", "2")
            .unwrap()
            .with_property("sys.a", "1")
            .unwrap();
        let (_dir, mut resolver) = setup(area);

        let (status, out) = invoke(&mut resolver, &[]);

        assert_eq!(status, 0);
        assert_eq!(out, "[sys.a]: [1]\n[sys.b]: [2]\n");
    }

    #[test]
    fn test_get_prints_value_or_fails() {
        let area = MemoryPropertyArea::new().with_property("sys.a", "1").unwrap();
        let (_dir, mut resolver) = setup(area);

        assert_eq!(invoke(&mut resolver, &["sys.a"]), (0, "1\n".to_string()));
        assert_eq!(invoke(&mut resolver, &["sys.missing"]), (1, String::new()));
    }

    #[test]
    fn test_set_then_get_persistent() {
        let (dir, mut resolver) = setup(MemoryPropertyArea::new());

        assert_eq!(invoke(&mut resolver, &["-np", "persist.a", "1"]).0, 0);

        assert_eq!(fs::read(dir.path().join("persist.a")).unwrap(), b"1");
        assert_eq!(
            invoke(&mut resolver, &["-P", "persist.a"]),
            (0, "1\n".to_string())
        );
    }

    #[test]
    fn test_read_only_set_bypasses_service() {
        let area = MemoryPropertyArea::new()
            .with_property("ro.debuggable", "0")
            .unwrap();
        let (_dir, mut resolver) = setup(area);

        assert_eq!(invoke(&mut resolver, &["ro.debuggable", "1"]).0, 0);
        assert_eq!(
            invoke(&mut resolver, &["ro.debuggable"]),
            (0, "1\n".to_string())
        );
    }

    #[test]
    fn test_delete_status() {
        let area = MemoryPropertyArea::new().with_property("sys.a", "1").unwrap();
        let (_dir, mut resolver) = setup(area);

        assert_eq!(invoke(&mut resolver, &["-d", "sys.a"]).0, 0);
        assert_eq!(invoke(&mut resolver, &["-d", "sys.a"]).0, 1);
    }

    #[test]
    fn test_illegal_name_fails() {
        let (_dir, mut resolver) = setup(MemoryPropertyArea::new());
        assert_eq!(invoke(&mut resolver, &["bad..name", "x"]).0, 1);
    }

    #[test]
    fn test_load_file() {
        let (dir, mut resolver) = setup(MemoryPropertyArea::new());
        let props = dir.path().join("boot.prop");
        fs::write(&props, "sys.a=1\nsys.b=2\n").unwrap();
        let props = props.to_string_lossy().into_owned();

        assert_eq!(invoke(&mut resolver, &["-n", "-f", &props]).0, 0);
        assert_eq!(invoke(&mut resolver, &["sys.b"]), (0, "2\n".to_string()));
        assert_eq!(invoke(&mut resolver, &["-f", "/nonexistent/boot.prop"]).0, 1);
    }
}
