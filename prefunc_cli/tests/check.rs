mod common;

use prefunc_core::AnyEmptyResult;
use rstest::rstest;
use serde_json::Value;
use similar_asserts::assert_eq;

fn stale_project() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"data/~pack/a.mcfunction",
		"#! def n = 1, 2\nsay <n>\n",
	)?;
	common::write(tmp.path(), "data/~pack/notes.txt", "notes")?;
	Ok(tmp)
}

#[test]
fn check_passes_after_build() -> AnyEmptyResult {
	let tmp = stale_project()?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::prefunc_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("up to date"));

	Ok(())
}

#[test]
fn check_fails_when_output_is_missing() -> AnyEmptyResult {
	let tmp = stale_project()?;

	common::prefunc_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("data/pack/a.mcfunction (missing)"))
		.stderr(predicates::str::contains(
			"data/pack/notes.txt (copy out of date)",
		))
		.stderr(predicates::str::contains(
			"2 file(s) are out of date. Run `prefunc build` to fix.",
		));

	// Checking never writes.
	assert!(!tmp.path().join("data/pack").exists());

	Ok(())
}

#[test]
fn check_shows_diff() -> AnyEmptyResult {
	let tmp = stale_project()?;
	common::write(tmp.path(), "data/pack/a.mcfunction", "say 1\nsay 3\n")?;
	common::write(tmp.path(), "data/pack/notes.txt", "notes")?;

	common::prefunc_cmd()
		.arg("check")
		.arg("--diff")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("data/pack/a.mcfunction (out of date)"))
		.stderr(predicates::str::contains("-say 3"))
		.stderr(predicates::str::contains("+say 2"));

	Ok(())
}

#[rstest]
#[case::stale(false, false)]
#[case::built(true, true)]
fn check_json_output(#[case] build_first: bool, #[case] ok: bool) -> AnyEmptyResult {
	let tmp = stale_project()?;

	if build_first {
		common::prefunc_cmd()
			.arg("build")
			.arg("--path")
			.arg(tmp.path())
			.assert()
			.success();
	}

	let output = common::prefunc_cmd()
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	assert_eq!(output.status.code(), Some(if ok { 0 } else { 1 }));

	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], Value::Bool(ok));

	let stale = json["stale"].as_array().map_or(0, Vec::len);
	assert_eq!(stale, if ok { 0 } else { 1 });

	if !ok {
		assert_eq!(json["stale"][0]["path"], "data/pack/a.mcfunction");
		assert_eq!(json["stale"][0]["missing"], Value::Bool(true));
		assert_eq!(json["stale_copies"][0]["path"], "data/pack/notes.txt");
	}

	Ok(())
}

#[test]
fn check_json_includes_diagnostics() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "data/~pack/a.mcfunction", "say <nope>\n")?;

	let output = common::prefunc_cmd()
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	let json: Value = serde_json::from_slice(&output.stdout)?;
	let diagnostic = &json["diagnostics"][0];

	assert_eq!(diagnostic["file"], "data/~pack/a.mcfunction");
	assert_eq!(diagnostic["line"], 1);
	assert_eq!(diagnostic["error"], Value::Bool(true));
	assert_eq!(diagnostic["detail"]["kind"], "undefined_variable");
	assert_eq!(diagnostic["detail"]["name"], "nope");

	Ok(())
}
