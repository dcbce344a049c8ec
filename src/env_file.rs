//! `.env` support: `--env-file <path>` on the command line, else `./.env`.
//! Variables already present in the process environment are never overridden.

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LoadedEnvFile {
    pub path: PathBuf,
    pub explicit: bool,
}

/// Parse the command line for `--env-file` and load the chosen file.
pub fn load_from_args<I>(args: I) -> Result<Option<LoadedEnvFile>, String>
where
    I: IntoIterator<Item = std::ffi::OsString>,
{
    match env_file_arg(args)? {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("env file not found: {}", path.display()));
            }
            load(&path)?;
            Ok(Some(LoadedEnvFile { path, explicit: true }))
        }
        None => {
            let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
            let path = cwd.join(".env");
            if !path.is_file() {
                return Ok(None);
            }
            load(&path)?;
            Ok(Some(LoadedEnvFile { path, explicit: false }))
        }
    }
}

fn env_file_arg<I>(args: I) -> Result<Option<PathBuf>, String>
where
    I: IntoIterator<Item = std::ffi::OsString>,
{
    let mut args = args.into_iter();
    let mut found: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        let value = match arg.to_str() {
            Some("--env-file") => args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| "`--env-file` requires a path argument".to_string())?,
            Some(s) if s.starts_with("--env-file=") => {
                let rest = &s["--env-file=".len()..];
                if rest.is_empty() {
                    return Err("`--env-file` requires a path argument".to_string());
                }
                PathBuf::from(rest)
            }
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        };
        if found.replace(value).is_some() {
            return Err("`--env-file` provided more than once".to_string());
        }
    }
    Ok(found)
}

fn load(path: &Path) -> Result<(), String> {
    let contents = fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    for (key, value) in parse(&contents).map_err(|e| format!("{}:{}", path.display(), e))? {
        if std::env::var_os(&key).is_none() {
            // Mutating the process environment is unsafe on some targets; this
            // runs before any other thread is started.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

/// Parse `KEY=value` lines. Errors are prefixed with the 1-based line number.
pub fn parse(contents: &str) -> Result<Vec<(String, String)>, String> {
    let mut vars = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if let Some(pair) = parse_line(line).map_err(|e| format!("{}: {}", index + 1, e))? {
            vars.push(pair);
        }
    }
    Ok(vars)
}

fn parse_line(line: &str) -> Result<Option<(String, String)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let assignment = trimmed.strip_prefix("export ").map(str::trim_start).unwrap_or(trimmed);

    let (key, raw) = assignment
        .split_once('=')
        .ok_or_else(|| "missing '=' in assignment".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("environment variable name cannot be empty".to_string());
    }
    if key.chars().any(char::is_whitespace) {
        return Err(format!("environment variable name contains whitespace: {}", key));
    }

    Ok(Some((key.to_string(), parse_value(raw.trim())?)))
}

fn parse_value(raw: &str) -> Result<String, String> {
    if let Some(rest) = raw.strip_prefix('"') {
        quoted(rest, '"', true)
    } else if let Some(rest) = raw.strip_prefix('\'') {
        quoted(rest, '\'', false)
    } else {
        Ok(raw.split('#').next().unwrap_or_default().trim_end().to_string())
    }
}

fn quoted(input: &str, quote: char, escapes: bool) -> Result<String, String> {
    let mut out = String::new();
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if escapes && ch == '\\' {
            let escaped = chars
                .next()
                .ok_or_else(|| "unterminated escape sequence in double-quoted value".to_string())?;
            out.push(match escaped {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                other => other,
            });
        } else if ch == quote {
            let tail = chars.as_str().trim();
            return if tail.is_empty() || tail.starts_with('#') {
                Ok(out)
            } else {
                Err("unexpected characters after closing quote".to_string())
            };
        } else {
            out.push(ch);
        }
    }
    Err("unterminated quoted value".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn parses_assignments() {
        let vars = parse(
            "# bridge\nexport HUE_IP=10.0.0.2 # lan\nHUE_USERNAME=\"a\\\"b\\n\"\nRUST_LOG='debug # not a comment'\n\nEMPTY=\n",
        )
        .unwrap();
        assert_eq!(
            vars,
            vec![
                ("HUE_IP".to_string(), "10.0.0.2".to_string()),
                ("HUE_USERNAME".to_string(), "a\"b\n".to_string()),
                ("RUST_LOG".to_string(), "debug # not a comment".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn reports_line_numbers() {
        let err = parse("A=1\nB \"x\"\n").unwrap_err();
        assert!(err.starts_with("2:"), "{err}");
        assert!(parse("A=\"open").is_err());
        assert!(parse("A='x' y").is_err());
        assert!(parse("MY KEY=1").is_err());
    }

    #[test]
    fn env_file_argument_forms() {
        assert_eq!(env_file_arg(args(&[])).unwrap(), None);
        assert_eq!(
            env_file_arg(args(&["--env-file", "a.env"])).unwrap(),
            Some(PathBuf::from("a.env"))
        );
        assert_eq!(env_file_arg(args(&["--env-file=b.env"])).unwrap(), Some(PathBuf::from("b.env")));
        assert!(env_file_arg(args(&["--env-file"])).is_err());
        assert!(env_file_arg(args(&["--env-file="])).is_err());
        assert!(env_file_arg(args(&["--env-file=a", "--env-file=b"])).is_err());
        assert!(env_file_arg(args(&["--verbose"])).is_err());
        assert_eq!(env_file_arg(args(&["--", "--verbose"])).unwrap(), None);
    }
}
