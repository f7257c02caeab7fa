//! Command-line argument parsing.
//!
//! Usage:
//!   famms [-dq] [-f[<file>]] [-t<time>] [-e<expr>]…            [<coord>…]
//!   famms [-dq] [-f[<file>]] [-t<time>] (-p<file> | -l<file>) [-c<func>] [<coord>…]

use std::path::PathBuf;

/// Point used when no coordinates are given.
pub const DEFAULT_POINT: [f64; 2] = [1.0, 2.0];

/// Function looked up in a script when `-c` is not given.
pub const DEFAULT_FUNC: &str = "f";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Errors only (`-q`).
    pub quiet: bool,
    /// Which problem file to load.
    pub config: ConfigFile,
    /// Expression components (`-e<expr>`, repeatable).
    pub exprs: Vec<String>,
    /// Evaluation time (`-t<time>`).
    pub time: f64,
    /// Script providing the callable (`-p<file>` / `-l<file>`).
    pub script: Option<Script>,
    /// Function name inside the script (`-c<func>`).
    pub func: Option<String>,
    /// Evaluation point.
    pub point: Vec<f64>,
}

impl Default for CliArgs {
    fn default() -> Self {
        CliArgs {
            debug: false,
            quiet: false,
            config: ConfigFile::default(),
            exprs: Vec::new(),
            time: 0.0,
            script: None,
            func: None,
            point: DEFAULT_POINT.to_vec(),
        }
    }
}

impl CliArgs {
    /// `-c` or [`DEFAULT_FUNC`].
    pub fn func_name(&self) -> &str {
        self.func.as_deref().unwrap_or(DEFAULT_FUNC)
    }
}

/// How to choose the problem file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search the standard locations (see [`find_user_config`]).
    #[default]
    Search,
    /// `-f` with no file argument: no problem file.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Script {
    Python(PathBuf),
    Lua(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

fn is_number(arg: &str) -> bool {
    arg.parse::<f64>().is_ok()
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument; negative coordinates are positional too.
        if !arg.starts_with('-') || arg == "-" || is_number(arg) {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            let flag = chars[j];
            match flag {
                'd' => args.debug = true,
                'q' => args.quiet = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else if i + 1 < argv.len() && !argv[i + 1].starts_with('-') {
                        i += 1;
                        args.config = ConfigFile::Explicit(PathBuf::from(&argv[i]));
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // Flags that take a value, attached or as the next argument.
                'e' | 't' | 'p' | 'l' | 'c' => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(format!("-{flag} requires an argument"));
                    };
                    match flag {
                        'e' => args.exprs.push(value),
                        't' => {
                            args.time = value
                                .parse()
                                .map_err(|_| format!("invalid time: {value}"))?;
                        }
                        'p' => args.script = Some(Script::Python(PathBuf::from(value))),
                        'l' => args.script = Some(Script::Lua(PathBuf::from(value))),
                        _ => args.func = Some(value),
                    }
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    if !args.exprs.is_empty() && args.script.is_some() {
        return Err("-e cannot be combined with -p or -l".to_owned());
    }
    if args.func.is_some() && args.script.is_none() {
        return Err("-c needs a script (-p or -l)".to_owned());
    }

    if !positional.is_empty() {
        args.point = positional
            .iter()
            .map(|p| p.parse::<f64>().map_err(|_| format!("invalid coordinate: {p}")))
            .collect::<Result<_, _>>()?;
    }

    Ok(args)
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the user problem file in the standard locations.
///
/// Order: `~/.fammsrc`, `<config dir>/famms/fammsrc`, `./.fammsrc`,
/// `./fammsrc`.  Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(base) = directories::BaseDirs::new() {
        candidates.push(base.home_dir().join(".fammsrc"));
    }
    if let Some(proj) = directories::ProjectDirs::from("", "", "famms") {
        candidates.push(proj.config_dir().join("fammsrc"));
    }
    candidates.push(PathBuf::from("./.fammsrc"));
    candidates.push(PathBuf::from("./fammsrc"));
    candidates.into_iter().find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn empty_args() {
        let a = parse_argv(&argv(&[])).unwrap();
        assert_eq!(a.point, [1.0, 2.0]);
        assert_eq!(a.time, 0.0);
        assert!(a.exprs.is_empty() && a.script.is_none());
        assert!(matches!(a.config, ConfigFile::Search));
    }

    #[test]
    fn coordinates_including_negative() {
        let a = parse_argv(&argv(&["0.5", "-1.5", "-2e-1"])).unwrap();
        assert_eq!(a.point, [0.5, -1.5, -0.2]);
    }

    #[test]
    fn bad_coordinate() {
        assert!(parse_argv(&argv(&["abc"])).is_err());
    }

    #[test]
    fn bool_flags() {
        let a = parse_argv(&argv(&["-dq"])).unwrap();
        assert!(a.debug && a.quiet);
    }

    #[test]
    fn expressions_repeat() {
        let a = parse_argv(&argv(&["-ex_0^2", "-e", "x_1^2", "3", "4"])).unwrap();
        assert_eq!(a.exprs, ["x_0^2", "x_1^2"]);
        assert_eq!(a.point, [3.0, 4.0]);
    }

    #[test]
    fn time_flag() {
        assert_eq!(parse_argv(&argv(&["-t0.5"])).unwrap().time, 0.5);
        assert_eq!(parse_argv(&argv(&["-t", "-1"])).unwrap().time, -1.0);
        assert!(parse_argv(&argv(&["-tnow"])).is_err());
    }

    #[test]
    fn script_and_func() {
        let a = parse_argv(&argv(&["-p", "src.py", "-cg"])).unwrap();
        assert_eq!(a.script, Some(Script::Python(PathBuf::from("src.py"))));
        assert_eq!(a.func_name(), "g");
        let a = parse_argv(&argv(&["-lsrc.lua"])).unwrap();
        assert_eq!(a.script, Some(Script::Lua(PathBuf::from("src.lua"))));
        assert_eq!(a.func_name(), "f");
    }

    #[test]
    fn conflicting_sources() {
        assert!(parse_argv(&argv(&["-ex_0", "-pf.py"])).is_err());
        assert!(parse_argv(&argv(&["-cg"])).is_err());
    }

    #[test]
    fn missing_value() {
        assert!(parse_argv(&argv(&["-e"])).is_err());
    }

    #[test]
    fn config_skip() {
        let a = parse_argv(&argv(&["-f"])).unwrap();
        assert!(matches!(a.config, ConfigFile::Skip));
    }

    #[test]
    fn config_explicit_embedded() {
        let a = parse_argv(&argv(&["-fheat.famms"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("heat.famms")));
    }

    #[test]
    fn config_explicit_separate() {
        let a = parse_argv(&argv(&["-f", "heat.famms", "1"])).unwrap();
        assert!(matches!(&a.config, ConfigFile::Explicit(p) if p == &PathBuf::from("heat.famms")));
        assert_eq!(a.point, [1.0]);
    }

    #[test]
    fn double_dash() {
        let a = parse_argv(&argv(&["--", "-3"])).unwrap();
        assert_eq!(a.point, [-3.0]);
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["-z"])).is_err());
    }
}
