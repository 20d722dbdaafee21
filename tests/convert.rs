mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::{FitsColumn, bintable, write_fits};
use fits2cat::template::TemplateError;
use fits2cat::{ConvertOptions, Error, MaskValues, TextPolicy, convert_catalog};
use tempfile::TempDir;
use time::macros::datetime;

fn options(dir: &Path) -> ConvertOptions {
    ConvertOptions::new()
        .with_out_dir(dir)
        .with_build_time(datetime!(2024-01-02 03:04:05.678 UTC))
}

fn sample_file(dir: &Path) -> PathBuf {
    write_fits(dir, "sample.fits", &bintable("CAT", &common::sample_columns()))
}

fn small_file(dir: &Path) -> PathBuf {
    let columns = vec![
        FitsColumn::int32("id", &[1, 2, 3]),
        FitsColumn::float64("flux", &[10.0, 99.0, 20.0]),
    ];
    write_fits(dir, "small.fits", &bintable("CAT", &columns))
}

fn write_header(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("header.txt");
    fs::write(&path, text).unwrap();
    path
}

fn header_names(output: &str) -> Vec<String> {
    let line = output
        .lines()
        .rev()
        .find(|line| line.starts_with('#'))
        .expect("column-name line");
    line.trim_start_matches('#')
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

#[test]
fn writes_templated_header_and_aligned_rows() {
    let dir = TempDir::new().unwrap();
    let input = small_file(dir.path());
    let header = write_header(
        dir.path(),
        "Catalog {file_name} v{version}\nbuilt {build_time}\nmean id {mean($id)}, max flux {max($flux)}, rows {len($flux)}\n",
    );

    let report = convert_catalog(
        &input,
        &options(dir.path()).with_header(header).with_version("2.0"),
    )
    .expect("convert");

    let output_path = dir.path().join("small.cat");
    assert_eq!(report.output_path.as_deref(), Some(output_path.as_path()));
    assert_eq!(report.rows, 3);
    assert_eq!(report.masked_cells, 1);
    assert_eq!(report.resolved_placeholders, 3);
    assert!(report.unresolved_placeholders.is_empty());

    let text = fs::read_to_string(output_path).unwrap();
    assert_eq!(
        text,
        "# Catalog small v2.0\n\
         # built 2024-01-02T03:04:05.678\n\
         # mean id 2.0, max flux 99.0, rows 3\n\
         #\n\
         #id   flux\n  1   10.0\n  2  -99.0\n  3   20.0"
    );
}

#[test]
fn conversion_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let input = sample_file(dir.path());
    let header = write_header(dir.path(), "sum {sum($flux)}\n");
    let options = options(dir.path()).with_header(header);

    convert_catalog(&input, &options).unwrap();
    let first = fs::read(dir.path().join("sample.cat")).unwrap();
    convert_catalog(&input, &options).unwrap();
    let second = fs::read(dir.path().join("sample.cat")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn aggregates_see_values_before_masking() {
    let dir = TempDir::new().unwrap();
    let input = sample_file(dir.path());
    let header = write_header(dir.path(), "n={len($flux)} sum={sum($flux)}\n");
    convert_catalog(&input, &options(dir.path()).with_header(header)).unwrap();

    let text = fs::read_to_string(dir.path().join("sample.cat")).unwrap();
    assert!(text.starts_with("# n=3 sum=139.0\n#\n"), "{text}");
    assert!(text.contains("-99.0"));
}

#[test]
fn custom_mask_values_replace_defaults() {
    let dir = TempDir::new().unwrap();
    let input = small_file(dir.path());
    let mask: MaskValues = "20".parse().unwrap();
    let report = convert_catalog(&input, &options(dir.path()).with_mask_values(mask)).unwrap();
    assert_eq!(report.masked_cells, 1);

    let text = fs::read_to_string(dir.path().join("small.cat")).unwrap();
    assert_eq!(text, "#id   flux\n  1   10.0\n  2   99.0\n  3  -99.0");
}

#[test]
fn excluded_columns_are_dropped() {
    let dir = TempDir::new().unwrap();
    let input = sample_file(dir.path());
    let report = convert_catalog(
        &input,
        &options(dir.path()).with_exclude_columns(["ra", "dec"]),
    )
    .unwrap();
    assert_eq!(report.excluded_columns, 2);

    let text = fs::read_to_string(dir.path().join("sample.cat")).unwrap();
    assert_eq!(header_names(&text), ["id", "flux", "name"]);
}

#[test]
fn unknown_excluded_column_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = sample_file(dir.path());
    let result = convert_catalog(&input, &options(dir.path()).with_exclude_columns(["zzz"]));
    match result {
        Err(Error::UnknownColumn { name }) => assert_eq!(name, "zzz"),
        other => panic!("expected UnknownColumn, got {other:?}"),
    }
    assert!(!dir.path().join("sample.cat").exists());
}

#[test]
fn underscore_policy_rewrites_text() {
    let dir = TempDir::new().unwrap();
    let input = sample_file(dir.path());
    convert_catalog(
        &input,
        &options(dir.path()).with_text_policy(TextPolicy::Underscore),
    )
    .unwrap();

    let text = fs::read_to_string(dir.path().join("sample.cat")).unwrap();
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert!(rows[0].ends_with("alpha_beta"), "{text}");
    assert!(rows[1].ends_with("gamma"));
    assert!(rows[2].ends_with("-99"));
}

#[test]
fn quote_policy_wraps_present_cells() {
    let dir = TempDir::new().unwrap();
    let input = sample_file(dir.path());
    convert_catalog(
        &input,
        &options(dir.path()).with_text_policy(TextPolicy::Quote(vec!["name".to_owned()])),
    )
    .unwrap();

    let text = fs::read_to_string(dir.path().join("sample.cat")).unwrap();
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert!(rows[0].ends_with("\"alpha beta\""), "{text}");
    assert!(rows[2].ends_with(" -99"));
}

#[test]
fn quoting_a_numeric_column_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = sample_file(dir.path());
    let result = convert_catalog(
        &input,
        &options(dir.path()).with_text_policy(TextPolicy::Quote(vec!["flux".to_owned()])),
    );
    assert!(matches!(result, Err(Error::ColumnType { .. })));
    assert!(!dir.path().join("sample.cat").exists());
}

#[test]
fn unresolved_placeholders_stay_verbatim() {
    let dir = TempDir::new().unwrap();
    let input = small_file(dir.path());
    let header = write_header(dir.path(), "bad {sum($nope)} ok {min($id)}\n");
    let report = convert_catalog(&input, &options(dir.path()).with_header(header)).unwrap();

    assert_eq!(report.unresolved_placeholders.len(), 1);
    assert_eq!(
        report.unresolved_placeholders[0].error,
        TemplateError::UndefinedColumn {
            name: "nope".to_owned()
        }
    );
    let text = fs::read_to_string(dir.path().join("small.cat")).unwrap();
    assert!(text.starts_with("# bad {sum($nope)} ok 1\n#\n"), "{text}");
}

#[test]
fn missing_header_file_only_warns() {
    let dir = TempDir::new().unwrap();
    let input = small_file(dir.path());
    let report = convert_catalog(
        &input,
        &options(dir.path()).with_header(dir.path().join("absent.txt")),
    )
    .unwrap();
    assert_eq!(report.resolved_placeholders, 0);

    let text = fs::read_to_string(dir.path().join("small.cat")).unwrap();
    assert!(text.starts_with("#id"));
}

#[test]
fn unreadable_input_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let input = write_fits(dir.path(), "broken.fits", b"not a fits file");
    assert!(convert_catalog(&input, &options(dir.path())).is_err());
    assert!(!dir.path().join("broken.cat").exists());
}

#[test]
fn single_precision_aggregates_print_shortest_digits() {
    let dir = TempDir::new().unwrap();
    let columns = vec![FitsColumn::float32("mag", &[23.45, 0.1, 1.7])];
    let input = write_fits(dir.path(), "mags.fits", &bintable("CAT", &columns));
    let header = write_header(dir.path(), "max={max($mag)} min={min($mag)}\n");
    convert_catalog(&input, &options(dir.path()).with_header(header)).unwrap();

    let text = fs::read_to_string(dir.path().join("mags.cat")).unwrap();
    assert!(text.starts_with("# max=23.45 min=0.1\n#\n"), "{text}");
    assert!(text.ends_with("#  mag\n 23.45\n   0.1\n   1.7"), "{text}");
}
