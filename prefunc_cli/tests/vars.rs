mod common;

use predicates::prelude::PredicateBooleanExt;
use prefunc_core::AnyEmptyResult;
use serde_json::Value;
use similar_asserts::assert_eq;

fn project() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"data/~alpha/a.mcfunction",
		"#! def *mob = zombie, creeper\n#! def local = 1\n",
	)?;
	common::write(
		tmp.path(),
		"data/~alpha/b.mcfunction",
		"#! def *id:color = 1:red, 2:green\n",
	)?;
	std::fs::create_dir_all(tmp.path().join("data/~beta"))?;
	Ok(tmp)
}

#[test]
fn vars_lists_globals_per_working_directory() -> AnyEmptyResult {
	let tmp = project()?;

	common::prefunc_cmd()
		.arg("vars")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("data/~alpha"))
		.stdout(predicates::str::contains("  color (2) = red, green"))
		.stdout(predicates::str::contains("  mob (2) = zombie, creeper"))
		.stdout(predicates::str::contains("data/~beta\n  (no global variables)"))
		.stdout(predicates::str::contains("local").not());

	Ok(())
}

#[test]
fn vars_json_output() -> AnyEmptyResult {
	let tmp = project()?;

	let output = common::prefunc_cmd()
		.arg("vars")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());

	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json[0]["name"], "alpha");
	assert_eq!(json[0]["build"], "data/alpha");
	assert_eq!(
		json[0]["variables"]["id"]["values"],
		serde_json::json!(["1", "2"])
	);
	assert_eq!(json[1]["name"], "beta");
	assert_eq!(json[1]["variables"], serde_json::json!({}));

	Ok(())
}
