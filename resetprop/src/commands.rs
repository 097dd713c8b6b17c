//! # Command Line
//!
//! Turns `resetprop` arguments into an [`Invocation`].
//!
//! ## Grammar
//!
//! - no arguments: list every property
//! - `NAME`: print one property
//! - `NAME VALUE`: set one property
//! - `-f FILE` / `--file FILE`: load `key=value` lines
//! - `-d NAME` / `--delete NAME`: delete one property
//!
//! Short flags combine (`-np`). `-f` and `-d` take the next argument, which
//! must be the last one, and end flag parsing.

use prop_types::PropFlags;
use std::path::PathBuf;
use thiserror::Error;

/// Command line error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Missing argument for {0}")]
    MissingArgument(String),

    #[error("Unexpected argument after {flag}: {arg}")]
    UnexpectedArgument { flag: String, arg: String },

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Too many arguments: {0}")]
    TooManyArguments(usize),
}

/// What to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print every property
    List,

    /// Print one property
    Get { name: String },

    /// Set one property
    Set { name: String, value: String },

    /// Delete one property
    Delete { name: String },

    /// Load properties from a file
    LoadFile { path: PathBuf },

    /// Print usage
    Help,
}

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub flags: PropFlags,
    /// `ro.` names go through the property service instead of bypassing it
    pub ro_use_service: bool,
    pub verbose: bool,
    /// JSON store configuration to load instead of the defaults
    pub config: Option<PathBuf>,
}

impl Invocation {
    /// Flags for setting `name`. `ro.` names bypass the service unless
    /// `-N` was given.
    pub fn set_flags(&self, name: &str) -> PropFlags {
        if prop_types::is_read_only_name(name) && !self.ro_use_service {
            self.flags.bypass_live_registry()
        } else {
            self.flags
        }
    }
}

enum Operand {
    File,
    Delete,
}

/// Parses arguments, not including the program name
pub fn parse_args(args: &[String]) -> Result<Invocation, CommandError> {
    let mut flags = PropFlags::new();
    let mut ro_use_service = false;
    let mut verbose = false;
    let mut config = None;
    let mut operand = None;
    let mut i = 0;

    while i < args.len() && args[i].starts_with('-') {
        let arg = args[i].as_str();

        if let Some(long) = arg.strip_prefix("--") {
            match long {
                "file" => operand = Some(Operand::File),
                "delete" => operand = Some(Operand::Delete),
                "config" => {
                    i += 1;
                    let path = args
                        .get(i)
                        .ok_or_else(|| CommandError::MissingArgument(arg.to_string()))?;
                    config = Some(PathBuf::from(path));
                }
                "help" => return Ok(help(flags)),
                _ => return Err(CommandError::UnknownOption(arg.to_string())),
            }
            if operand.is_some() {
                operand_position(args, i, arg)?;
                i += 1;
                break;
            }
            i += 1;
            continue;
        }

        for c in arg.chars().skip(1) {
            match c {
                'n' => flags = flags.bypass_live_registry(),
                'p' => flags = flags.include_persistent(),
                'P' => flags = flags.persistent_only(),
                'Z' => flags = flags.want_security_label(),
                'N' => ro_use_service = true,
                'v' => verbose = true,
                'f' => operand = Some(Operand::File),
                'd' => operand = Some(Operand::Delete),
                'h' => return Ok(help(flags)),
                other => return Err(CommandError::UnknownOption(format!("-{}", other))),
            }
        }
        i += 1;
        if operand.is_some() {
            operand_position(args, i - 1, arg)?;
            break;
        }
    }

    let rest = &args[i..];
    let command = match operand {
        Some(Operand::Delete) => Command::Delete {
            name: rest[0].clone(),
        },
        Some(Operand::File) => Command::LoadFile {
            path: PathBuf::from(&rest[0]),
        },
        None => match rest {
            [] => Command::List,
            [name] => Command::Get { name: name.clone() },
            [name, value] => Command::Set {
                name: name.clone(),
                value: value.clone(),
            },
            _ => return Err(CommandError::TooManyArguments(rest.len())),
        },
    };

    Ok(Invocation {
        command,
        flags,
        ro_use_service,
        verbose,
        config,
    })
}

/// The operand of the flag at `flag_idx` must be the final argument
fn operand_position(args: &[String], flag_idx: usize, flag: &str) -> Result<(), CommandError> {
    match args.len().checked_sub(flag_idx + 1) {
        Some(1) => Ok(()),
        Some(0) | None => Err(CommandError::MissingArgument(flag.to_string())),
        Some(_) => Err(CommandError::UnexpectedArgument {
            flag: flag.to_string(),
            arg: args[flag_idx + 2].clone(),
        }),
    }
}

fn help(flags: PropFlags) -> Invocation {
    Invocation {
        command: Command::Help,
        flags,
        ro_use_service: false,
        verbose: false,
        config: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Invocation, CommandError> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_args(&args)
    }

    #[test]
    fn test_parse_list() {
        let inv = parse(&[]).unwrap();
        assert_eq!(inv.command, Command::List);
        assert_eq!(inv.flags, PropFlags::new());
    }

    #[test]
    fn test_parse_get_and_set() {
        assert_eq!(
            parse(&["persist.a"]).unwrap().command,
            Command::Get {
                name: "persist.a".to_string()
            }
        );
        assert_eq!(
            parse(&["persist.a", "1"]).unwrap().command,
            Command::Set {
                name: "persist.a".to_string(),
                value: "1".to_string()
            }
        );
    }

    #[test]
    fn test_value_may_start_with_dash() {
        let inv = parse(&["-n", "sys.offset", "-1"]).unwrap();
        assert_eq!(
            inv.command,
            Command::Set {
                name: "sys.offset".to_string(),
                value: "-1".to_string()
            }
        );
    }

    #[test]
    fn test_parse_combined_flags() {
        let inv = parse(&["-npv", "persist.a"]).unwrap();
        assert!(inv.flags.bypass_live_registry);
        assert!(inv.flags.include_persistent);
        assert!(!inv.flags.persistent_only);
        assert!(inv.verbose);
    }

    #[test]
    fn test_persistent_only_implies_persistent() {
        let inv = parse(&["-P"]).unwrap();
        assert!(inv.flags.persistent_only);
        assert!(inv.flags.include_persistent);
    }

    #[test]
    fn test_parse_delete() {
        let expected = Command::Delete {
            name: "persist.a".to_string(),
        };
        assert_eq!(parse(&["-d", "persist.a"]).unwrap().command, expected);
        assert_eq!(parse(&["--delete", "persist.a"]).unwrap().command, expected);

        let inv = parse(&["-pd", "persist.a"]).unwrap();
        assert_eq!(inv.command, expected);
        assert!(inv.flags.include_persistent);
    }

    #[test]
    fn test_flags_after_delete_in_same_arg() {
        let inv = parse(&["-dp", "persist.a"]).unwrap();
        assert!(inv.flags.include_persistent);
    }

    #[test]
    fn test_parse_file() {
        let inv = parse(&["-n", "--file", "/tmp/props"]).unwrap();
        assert_eq!(
            inv.command,
            Command::LoadFile {
                path: PathBuf::from("/tmp/props")
            }
        );
        assert!(inv.flags.bypass_live_registry);
    }

    #[test]
    fn test_operand_must_be_last() {
        assert_eq!(
            parse(&["-d"]),
            Err(CommandError::MissingArgument("-d".to_string()))
        );
        assert_eq!(
            parse(&["-f", "a", "b"]),
            Err(CommandError::UnexpectedArgument {
                flag: "-f".to_string(),
                arg: "b".to_string()
            })
        );
    }

    #[test]
    fn test_parse_config() {
        let inv = parse(&["--config", "/etc/store.json", "-p", "persist.a"]).unwrap();
        assert_eq!(inv.config, Some(PathBuf::from("/etc/store.json")));
        assert!(inv.flags.include_persistent);
        assert_eq!(
            parse(&["--config"]),
            Err(CommandError::MissingArgument("--config".to_string()))
        );
    }

    #[test]
    fn test_parse_help() {
        assert_eq!(parse(&["-h"]).unwrap().command, Command::Help);
        assert_eq!(parse(&["--help", "x"]).unwrap().command, Command::Help);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse(&["-x"]),
            Err(CommandError::UnknownOption("-x".to_string()))
        );
        assert_eq!(
            parse(&["--bogus"]),
            Err(CommandError::UnknownOption("--bogus".to_string()))
        );
        assert_eq!(
            parse(&["a", "b", "c"]),
            Err(CommandError::TooManyArguments(3))
        );
    }

    #[test]
    fn test_read_only_names_bypass_by_default() {
        let inv = parse(&["ro.debuggable", "1"]).unwrap();
        assert!(inv.set_flags("ro.debuggable").bypass_live_registry);
        assert!(!inv.set_flags("sys.usb").bypass_live_registry);

        let inv = parse(&["-N", "ro.debuggable", "1"]).unwrap();
        assert!(!inv.set_flags("ro.debuggable").bypass_live_registry);
    }
}
