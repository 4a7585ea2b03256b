use clap::Parser;
use render::cli::{Args, Mode};
use render::error::Error;
use std::ffi::OsString;
use std::path::PathBuf;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("render")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_no_args_is_stdin_to_stdout() {
    let parsed = Args::try_parse_from(make_args(&[])).unwrap();

    assert!(!parsed.debug);
    assert!(!parsed.unsafe_ignore_missing_keys);
    assert!(parsed.configs.is_empty());
    assert!(parsed.vars.is_empty());
    assert_eq!(parsed.mode().unwrap(), Mode::File { input: None, output: None });
}

#[test]
fn test_file_mode() {
    let args = make_args(&["--in", "a.yaml.tmpl", "--out", "a.yaml"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(
        parsed.mode().unwrap(),
        Mode::File {
            input: Some(PathBuf::from("a.yaml.tmpl")),
            output: Some(PathBuf::from("a.yaml")),
        }
    );
}

#[test]
fn test_repeated_configs_and_vars_keep_order() {
    let args = make_args(&[
        "--config",
        "first.yaml",
        "--config",
        "second.yaml",
        "--var",
        "a=1",
        "--set",
        "b.c=2",
        "--var=d=e=f",
    ]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.configs, vec![PathBuf::from("first.yaml"), PathBuf::from("second.yaml")]);
    assert_eq!(parsed.vars, vec!["a=1", "b.c=2", "d=e=f"]);
}

#[test]
fn test_outdir_defaults_to_indir() {
    let parsed = Args::try_parse_from(make_args(&["--indir", "templates"])).unwrap();

    assert_eq!(
        parsed.mode().unwrap(),
        Mode::Dir {
            input: PathBuf::from("templates"),
            output: PathBuf::from("templates"),
        }
    );
}

#[test]
fn test_short_flags() {
    let parsed = Args::try_parse_from(make_args(&["-d", "--unsafe-ignore-missing-keys"])).unwrap();

    assert!(parsed.debug);
    assert!(parsed.unsafe_ignore_missing_keys);
}

#[test]
fn test_file_and_dir_flags_conflict() {
    assert!(Args::try_parse_from(make_args(&["--in", "a", "--indir", "b"])).is_err());
    assert!(Args::try_parse_from(make_args(&["--out", "a", "--outdir", "b"])).is_err());
    assert!(Args::try_parse_from(make_args(&["--in", "a", "--outdir", "b"])).is_err());
}

#[test]
fn test_outdir_without_indir_is_usage_conflict() {
    let parsed = Args::try_parse_from(make_args(&["--outdir", "out"])).unwrap();

    assert!(matches!(parsed.mode(), Err(Error::UsageConflict(_))));
}

#[test]
fn test_positional_args_rejected() {
    assert!(Args::try_parse_from(make_args(&["template.tmpl"])).is_err());
}
