//! Command-line flags.
//!
//! Fragment flags are order-sensitive *across* flags (`-T a --ascii -T b`
//! runs a, strip, b), which a derived struct cannot express on its own: each
//! `Vec` only keeps its own values. So we parse into `ArgMatches` first and
//! use clap's argument indices to rebuild the command-line order, then let the
//! derive fill the plain switches.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::core::script::{ASCII_ONLY, Registry};
use crate::core::types::{Field, Fragment};

/// Batch-edit MP3 tags with per-field expressions
#[derive(Parser, Debug)]
#[command(name = "retag")]
#[command(version, about = "Batch-edit MP3 tags with per-field expressions", long_about = None)]
#[command(after_help = "Expressions see $_ (the field, writable), $file, $length (M:SS) and $seconds.\n\
Example: retag -T 's/^/Podcast: / unless /^Podcast: /' -y 2024 *.mp3")]
pub struct Cli {
    /// Edit the title with an expression
    #[arg(short = 'T', long, value_name = "EXPR")]
    pub title: Vec<String>,

    /// Set the title to TEXT
    #[arg(short = 't', long = "set-title", value_name = "TEXT")]
    pub set_title: Vec<String>,

    /// Edit the artist with an expression
    #[arg(short = 'A', long, value_name = "EXPR")]
    pub artist: Vec<String>,

    /// Set the artist to TEXT
    #[arg(short = 'a', long = "set-artist", value_name = "TEXT")]
    pub set_artist: Vec<String>,

    /// Edit the album with an expression
    #[arg(short = 'L', long, value_name = "EXPR")]
    pub album: Vec<String>,

    /// Set the album to TEXT
    #[arg(short = 'l', long = "set-album", value_name = "TEXT")]
    pub set_album: Vec<String>,

    /// Edit the genre with an expression
    #[arg(short = 'G', long, value_name = "EXPR")]
    pub genre: Vec<String>,

    /// Set the genre to TEXT
    #[arg(short = 'g', long = "set-genre", value_name = "TEXT")]
    pub set_genre: Vec<String>,

    /// Edit the track number with an expression
    #[arg(short = 'K', long, value_name = "EXPR")]
    pub track: Vec<String>,

    /// Set the track number to TEXT
    #[arg(short = 'k', long = "set-track", value_name = "TEXT")]
    pub set_track: Vec<String>,

    /// Edit the comment with an expression
    #[arg(short = 'C', long, value_name = "EXPR")]
    pub comment: Vec<String>,

    /// Set the comment to TEXT
    #[arg(short = 'c', long = "set-comment", value_name = "TEXT")]
    pub set_comment: Vec<String>,

    /// Edit the year with an expression
    #[arg(short = 'Y', long, value_name = "EXPR")]
    pub year: Vec<String>,

    /// Set the year to TEXT
    #[arg(short = 'y', long = "set-year", value_name = "TEXT")]
    pub set_year: Vec<String>,

    /// Strip non-printable and non-ASCII characters from every field, at this
    /// point in the chain
    #[arg(
        long,
        action = ArgAction::Append,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL",
    )]
    pub ascii: Vec<bool>,

    /// Recompute and store the track length (TLEN)
    #[arg(short = 'u', long)]
    pub update_length: bool,

    /// Show what would change, write nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Check that the tag and audio libraries work, then exit
    #[arg(long, overrides_with = "no_check")]
    pub check: bool,

    #[arg(long = "no-check", overrides_with = "check", hide = true)]
    pub no_check: bool,

    /// Only print errors
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Trace internals to stderr
    #[arg(long, overrides_with = "no_debug")]
    pub debug: bool,

    #[arg(long = "no-debug", overrides_with = "debug", hide = true)]
    pub no_debug: bool,

    /// Files to edit (default: *.mp3 in the current directory)
    pub files: Vec<PathBuf>,
}

/// (expression arg id, literal arg id, field)
const FIELD_ARGS: [(&str, &str, Field); 7] = [
    ("title", "set_title", Field::Title),
    ("artist", "set_artist", Field::Artist),
    ("album", "set_album", Field::Album),
    ("genre", "set_genre", Field::Genre),
    ("track", "set_track", Field::Track),
    ("comment", "set_comment", Field::Comment),
    ("year", "set_year", Field::Year),
];

enum Target {
    One(Field),
    All,
}

/// Parse `args` (including the program name) into switches plus a registry
/// filled in command-line order.
pub fn parse_args<I, T>(args: I) -> Result<(Cli, Registry), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Cli::command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    let registry = registry_from_matches(&matches);
    Ok((cli, registry))
}

fn registry_from_matches(matches: &ArgMatches) -> Registry {
    let mut ordered: Vec<(usize, Target, Fragment)> = Vec::new();

    for (expr_id, literal_id, field) in FIELD_ARGS {
        for (index, text) in indexed_values::<String>(matches, expr_id) {
            ordered.push((index, Target::One(field), Fragment::Expression(text)));
        }
        for (index, text) in indexed_values::<String>(matches, literal_id) {
            ordered.push((index, Target::One(field), Fragment::Literal(text)));
        }
    }

    for (index, on) in indexed_values::<bool>(matches, "ascii") {
        if on {
            let fragment = Fragment::Expression(ASCII_ONLY.to_string());
            ordered.push((index, Target::All, fragment));
        }
    }

    ordered.sort_by_key(|(index, ..)| *index);

    let mut registry = Registry::new();
    for (_, target, fragment) in ordered {
        match target {
            Target::One(field) => registry.register(field, fragment),
            Target::All => registry.register_all(fragment),
        }
    }
    registry
}

/// Values of one argument paired with their position on the command line.
fn indexed_values<T>(matches: &ArgMatches, id: &str) -> Vec<(usize, T)>
where
    T: Clone + Send + Sync + 'static,
{
    let indices = matches.indices_of(id);
    let (Some(indices), Some(values)) = (indices, matches.get_many::<T>(id)) else {
        return Vec::new();
    };
    indices.zip(values.cloned()).collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::script::Context;

    fn parse(args: &[&str]) -> (Cli, Registry) {
        parse_args(std::iter::once("retag").chain(args.iter().copied())).unwrap()
    }

    fn expr(s: &str) -> Fragment {
        Fragment::Expression(s.to_string())
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_expression_and_literal_forms() {
        let (_, registry) = parse(&[
            "-T",
            "s/a/b/",
            "-t",
            "Fixed",
            "--set-year",
            "1999",
            "x.mp3",
        ]);
        assert_eq!(
            registry.fragments(Field::Title),
            &[expr("s/a/b/"), Fragment::Literal("Fixed".into())]
        );
        assert_eq!(
            registry.fragments(Field::Year),
            &[Fragment::Literal("1999".into())]
        );
        assert!(registry.fragments(Field::Artist).is_empty());
    }

    #[test]
    fn test_order_is_kept_across_flags() {
        let (_, registry) = parse(&["-t", "one", "-T", "s/$/ two/", "-t", "three"]);
        assert_eq!(
            registry.fragments(Field::Title),
            &[
                Fragment::Literal("one".into()),
                expr("s/$/ two/"),
                Fragment::Literal("three".into()),
            ]
        );
    }

    #[test]
    fn test_ascii_position_follows_command_line() {
        let (_, before) = parse(&["--ascii", "-T", "s/x/é/"]);
        let (_, after) = parse(&["-T", "s/x/é/", "--ascii"]);
        let ctx = Context::new("f.mp3", Duration::ZERO);

        let before = before.compile().unwrap();
        let after = after.compile().unwrap();
        assert_eq!(before.get(Field::Title).apply("x", &ctx), "é");
        assert_eq!(after.get(Field::Title).apply("x", &ctx), "");

        // --ascii reaches every field.
        assert_eq!(after.get(Field::Genre).apply("Caf\u{e9}", &ctx), "Caf");
    }

    #[test]
    fn test_ascii_does_not_swallow_file_argument() {
        let (cli, registry) = parse(&["--ascii", "song.mp3"]);
        assert_eq!(cli.files, vec![PathBuf::from("song.mp3")]);
        assert_eq!(registry.fragments(Field::Year), &[expr(ASCII_ONLY)]);
    }

    #[test]
    fn test_literal_with_metacharacters_is_data() {
        let (_, registry) = parse(&["-c", "$_; last; s/x/y/"]);
        let editors = registry.compile().unwrap();
        let ctx = Context::new("f.mp3", Duration::ZERO);
        assert_eq!(
            editors.get(Field::Comment).apply("old", &ctx),
            "$_; last; s/x/y/"
        );
    }

    #[test]
    fn test_switches() {
        let (cli, _) = parse(&[
            "-n",
            "-q",
            "-u",
            "--debug",
            "--no-debug",
            "--check",
            "a.mp3",
            "b.mp3",
        ]);
        assert!(cli.dry_run);
        assert!(cli.quiet);
        assert!(cli.update_length);
        assert!(!cli.debug);
        assert!(cli.check);
        assert_eq!(cli.files.len(), 2);

        let (cli, _) = parse(&["--check", "--no-check", "--debug"]);
        assert!(!cli.check);
        assert!(cli.debug);
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        assert!(parse_args(["retag", "--titel", "x"]).is_err());
    }
}
