mod common;

use predicates::prelude::PredicateBooleanExt;
use prefunc_core::AnyEmptyResult;
use similar_asserts::assert_eq;

#[test]
fn build_expands_working_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"data/~pack/functions/load.mcfunction",
		"#! def *team:color = red:red, blue:aqua\nteam add <team>\nteam modify <team> color \
		 <color>\n",
	)?;
	common::write(
		tmp.path(),
		"data/~pack/functions/tick.mcfunction",
		"#! def n = 1, 2\nscoreboard players add <team> t <n>\n",
	)?;
	common::write(tmp.path(), "data/~pack/pack.mcmeta", "{}")?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Wrote 2 file(s) and copied 1 file(s) in 1 working directory.",
		))
		.stdout(predicates::str::contains("Build finished in"));

	let load = std::fs::read_to_string(tmp.path().join("data/pack/functions/load.mcfunction"))?;
	assert_eq!(
		load,
		"team add red\nteam add blue\nteam modify red color red\nteam modify blue color aqua\n"
	);

	let tick = std::fs::read_to_string(tmp.path().join("data/pack/functions/tick.mcfunction"))?;
	assert_eq!(
		tick,
		"scoreboard players add red t 1\nscoreboard players add blue t 2\n"
	);

	let meta = std::fs::read_to_string(tmp.path().join("data/pack/pack.mcmeta"))?;
	assert_eq!(meta, "{}");

	Ok(())
}

#[test]
fn build_dry_run_writes_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "data/~pack/a.mcfunction", "say hi\n")?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"Dry run: would write 1 file(s) and copy 0 file(s):",
		))
		.stdout(predicates::str::contains("write data/pack/a.mcfunction"))
		.stdout(predicates::str::contains("Build finished").not());

	assert!(!tmp.path().join("data/pack").exists());

	Ok(())
}

#[test]
fn build_reports_undefined_variables_and_continues() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"data/~pack/a.mcfunction",
		"say <missing>\nsay kept\n",
	)?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("variable `missing` is not defined"))
		.stderr(predicates::str::contains("data/~pack/a.mcfunction:1"));

	let output = std::fs::read_to_string(tmp.path().join("data/pack/a.mcfunction"))?;
	assert_eq!(output, "say kept\n");

	Ok(())
}

#[test]
fn build_reports_invalid_declarations() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"data/~pack/a.mcfunction",
		"#! def a:b = 1:x, 2\nsay done\n",
	)?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("invalid variable declaration"));

	let output = std::fs::read_to_string(tmp.path().join("data/pack/a.mcfunction"))?;
	assert_eq!(output, "say done\n");

	Ok(())
}

#[test]
fn build_wipes_stale_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "data/~pack/a.mcfunction", "say a")?;
	common::write(tmp.path(), "data/pack/removed.mcfunction", "say old")?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Wiped directory: data/pack"));

	assert!(tmp.path().join("data/pack/a.mcfunction").exists());
	assert!(!tmp.path().join("data/pack/removed.mcfunction").exists());

	Ok(())
}

#[test]
fn build_warns_without_working_directories() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("data/plain"))?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("no working directories found"));

	Ok(())
}

#[test]
fn build_fails_without_data_folder() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("data folder couldn't be found"));

	Ok(())
}

#[test]
fn build_rejects_invalid_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "prefunc.toml", "marker = \"\"\n")?;
	std::fs::create_dir_all(tmp.path().join("data/~pack"))?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("invalid config value for `marker`"));

	Ok(())
}

#[test]
fn build_uses_custom_syntax_from_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"prefunc.toml",
		"data_dir = \"src\"\nextensions = [\"txt\"]\nmarker = \"//\"\nworking_dir_marker = \"_\"\n",
	)?;
	common::write(tmp.path(), "src/_site/index.txt", "// def who = a, b\nhi <who>")?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let output = std::fs::read_to_string(tmp.path().join("src/site/index.txt"))?;
	assert_eq!(output, "hi a\nhi b");

	Ok(())
}

#[test]
fn missing_subcommand_exits_with_usage_code() -> AnyEmptyResult {
	common::prefunc_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("No subcommand specified"));

	Ok(())
}

#[test]
fn build_explains_unreadable_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "data/~pack/ok.mcfunction", "say ok")?;
	std::fs::write(
		tmp.path().join("data/~pack/broken.mcfunction"),
		[0xff, 0xfe, 0x00],
	)?;

	let output = common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	let stderr = String::from_utf8_lossy(&output.stderr);

	assert!(output.status.success());
	assert!(stderr.contains("i/o failure"), "{stderr}");
	assert!(stderr.contains("check that the path exists"), "{stderr}");
	assert_eq!(stderr.matches("i/o failure").count(), 1, "{stderr}");

	Ok(())
}

#[test]
fn build_refuses_doubled_marker_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "data/~a/src.mcfunction", "say src")?;
	common::write(tmp.path(), "data/~~a/other.mcfunction", "say other")?;

	common::prefunc_cmd()
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("prefunc::build_dir_conflict"));

	assert!(tmp.path().join("data/~a/src.mcfunction").exists());

	Ok(())
}
