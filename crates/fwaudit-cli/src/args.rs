//! Process arguments and shell-command argument splitting.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "fwaudit",
    version,
    about = "Offline firewall policy analyzer — shadowing, redundancy, equivalence and packet tracing over symbolic rule models"
)]
pub struct Cli {
    /// Runtime configuration file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Command script executed before reading stdin.
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Exit after the script instead of entering the shell.
    #[arg(long, requires = "script")]
    pub batch: bool,
}

/// One parsed shell command line: positional words plus the shared flags.
///
/// Flags may appear anywhere after the command words: `-o <file>`
/// redirects table output, `-z <src> <dst>` filters by zone pair, `-any`
/// widens object filters, `-n` adds object names, `-strict` selects
/// strict symmetry.
#[derive(Debug, Default)]
pub struct CommandArgs {
    pub words: Vec<String>,
    pub output: Option<String>,
    pub zones: Option<(String, String)>,
    pub include_any: bool,
    pub with_names: bool,
    pub strict: bool,
}

impl CommandArgs {
    pub fn parse(tokens: &[&str]) -> Result<Self, String> {
        let mut args = CommandArgs::default();
        let mut iter = tokens.iter();

        while let Some(token) = iter.next() {
            match *token {
                "-o" => {
                    if args.output.is_some() {
                        return Err("duplicate -o option".to_string());
                    }
                    let file = iter.next().ok_or("missing filename in option -o")?;
                    args.output = Some((*file).to_string());
                }
                "-z" => {
                    if args.zones.is_some() {
                        return Err("duplicate -z option".to_string());
                    }
                    let src = iter.next().ok_or("missing zone in option -z")?;
                    let dst = iter.next().ok_or("missing zone in option -z")?;
                    args.zones = Some(((*src).to_string(), (*dst).to_string()));
                }
                "-any" => args.include_any = true,
                "-n" => args.with_names = true,
                "-strict" => args.strict = true,
                other if other.starts_with('-') => {
                    return Err(format!("invalid option {other}"));
                }
                word => args.words.push(word.to_string()),
            }
        }

        Ok(args)
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn expect_words(&self, min: usize, usage: &str) -> Result<(), String> {
        if self.words.len() < min {
            Err(format!("usage: {usage}"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_order_independent() {
        let args =
            CommandArgs::parse(&["rules", "-z", "inside", "outside", "-o", "out.csv", "-n"])
                .unwrap();
        assert_eq!(args.words, vec!["rules"]);
        assert_eq!(args.zones, Some(("inside".into(), "outside".into())));
        assert_eq!(args.output.as_deref(), Some("out.csv"));
        assert!(args.with_names);
        assert!(!args.strict);
    }

    #[test]
    fn missing_flag_values_are_reported() {
        assert!(CommandArgs::parse(&["-o"]).is_err());
        assert!(CommandArgs::parse(&["-z", "inside"]).is_err());
        assert!(CommandArgs::parse(&["-x"]).is_err());
    }

    #[test]
    fn duplicate_flags_are_reported() {
        assert!(CommandArgs::parse(&["-o", "a", "-o", "b"]).is_err());
    }
}
