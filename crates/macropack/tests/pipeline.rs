use std::fs;
use std::path::Path;

use anyhow::Result;
use macropack::app::bundle::BANNER;
use macropack::app::pipeline::{self, BuildOptions, BuildOutcome};
use macropack::domain::literal::parse_put_statement;
use macropack::infra::config::Config;
use tempfile::TempDir;

const SERVICE: &str = "/**\n  @file mm_createwebservice.sas\n**/\n\
                       %macro mm_createwebservice();\n\
                       /* WEBOUT BEGIN */\n\
                       placeholder\n\
                       /* WEBOUT END */\n\
                       %mend;\n";

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn library() -> TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    write(root, "base/mf_b.sas", "%macro mf_b();%mend;\n");
    write(root, "base/mf_a.sas", "%macro mf_a();%mend;\n");
    write(root, "meta/mm_createwebservice.sas", SERVICE);
    write(
        root,
        "meta/mm_webout.sas",
        "/**\n  @file mm_webout.sas\n**/\n%macro mm_webout(action);\n  %put 'meta';\n%mend;\n",
    );
    write(root, "xcmd/mx_run.sas", "%macro mx_run();%mend;\n");
    write(
        root,
        "viya/mv_createwebservice.sas",
        &SERVICE.replace("mm_", "mv_"),
    );
    write(
        root,
        "viya/mv_webout.sas",
        "/**\n**/\n%macro mv_webout();\n%mend;\n",
    );
    write(root, "lua/util.lua", "print(\"hi\")\n-- done\n");
    temp
}

fn options(root: &Path) -> BuildOptions {
    BuildOptions {
        root: root.to_path_buf(),
        ..BuildOptions::default()
    }
}

#[test]
fn builds_wrappers_splices_and_bundles() -> Result<()> {
    let temp = library();
    let root = temp.path();

    let outcome = pipeline::run(&options(root))?;
    // 1 wrapper + 2 spliced targets + 5 bundles + aggregate
    assert_eq!(outcome, BuildOutcome::Published { written: 9 });

    let wrapper = fs::read_to_string(root.join("lua/ml_util.sas"))?;
    let puts: Vec<_> = wrapper
        .lines()
        .filter_map(parse_put_statement)
        .collect();
    assert_eq!(puts, vec!["print(\"hi\")", "-- done"]);
    assert!(wrapper.contains("  put '-- done ';\n"));

    let service = fs::read_to_string(root.join("meta/mm_createwebservice.sas"))?;
    assert!(service.contains(
        "/* WEBOUT BEGIN */\n  put '%macro mm_webout(action); ';\n  put '  %put ''meta''; ';\n  put '%mend; ';\n/* WEBOUT END */\n"
    ));
    assert!(!service.contains("placeholder"));
    assert!(service.starts_with("/**\n  @file mm_createwebservice.sas\n**/\n"));
    assert!(service.ends_with("/* WEBOUT END */\n%mend;\n"));

    let base = fs::read_to_string(root.join("compilebase.sas"))?;
    assert_eq!(base, "%macro mf_a();%mend;\n%macro mf_b();%mend;\n");

    let meta = fs::read_to_string(root.join("compilemeta.sas"))?;
    assert!(meta.starts_with(&service));

    let aggregate = fs::read_to_string(root.join("compileall.sas"))?;
    let expected_body: String = ["base", "meta", "xcmd", "viya", "lua"]
        .iter()
        .map(|folder| fs::read_to_string(root.join(format!("compile{folder}.sas"))).unwrap())
        .collect();
    assert_eq!(aggregate, format!("{BANNER}{expected_body}"));
    Ok(())
}

#[test]
fn rerunning_is_byte_identical() -> Result<()> {
    let temp = library();
    let root = temp.path();
    let names = [
        "lua/ml_util.sas",
        "meta/mm_createwebservice.sas",
        "viya/mv_createwebservice.sas",
        "compilelua.sas",
        "compileall.sas",
    ];

    pipeline::run(&options(root))?;
    let first: Vec<String> = names
        .iter()
        .map(|name| fs::read_to_string(root.join(name)).unwrap())
        .collect();

    pipeline::run(&options(root))?;
    let second: Vec<String> = names
        .iter()
        .map(|name| fs::read_to_string(root.join(name)).unwrap())
        .collect();

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn check_reports_stale_then_clean() -> Result<()> {
    let temp = library();
    let root = temp.path();
    let check = BuildOptions {
        check: true,
        ..options(root)
    };

    let err = pipeline::run(&check).unwrap_err();
    assert!(err.to_string().contains("out of date"));
    assert!(!root.join("compileall.sas").exists());

    pipeline::run(&options(root))?;
    assert_eq!(pipeline::run(&check)?, BuildOutcome::UpToDate { checked: 9 });

    write(root, "lua/util.lua", "print(\"changed\")\n");
    let stale = pipeline::plan(root, &Config::default())?.stale()?;
    assert!(stale.iter().any(|path| path.ends_with("ml_util.sas")));
    assert!(stale.iter().any(|path| path.ends_with("compileall.sas")));
    Ok(())
}

#[test]
fn splice_failure_publishes_nothing() -> Result<()> {
    let temp = library();
    let root = temp.path();
    write(root, "viya/mv_createwebservice.sas", "%macro mv_createwebservice();\n%mend;\n");

    let err = pipeline::run(&options(root)).unwrap_err();
    assert!(format!("{err:#}").contains("begin marker"));
    assert!(!root.join("lua/ml_util.sas").exists());
    assert!(!root.join("compileall.sas").exists());
    assert_eq!(
        fs::read_to_string(root.join("meta/mm_createwebservice.sas"))?,
        SERVICE
    );
    Ok(())
}

#[test]
fn missing_folder_aborts_the_build() -> Result<()> {
    let temp = library();
    let root = temp.path();
    fs::remove_dir_all(root.join("xcmd"))?;

    assert!(pipeline::run(&options(root)).is_err());
    assert!(!root.join("compilebase.sas").exists());
    assert!(!root.join("compileall.sas").exists());
    Ok(())
}

#[test]
fn duplicate_folder_in_workspace_config_is_rejected() -> Result<()> {
    let temp = library();
    let root = temp.path();
    write(
        root,
        "macropack.toml",
        "[bundles]\nfolders = [\"base\", \"meta\", \"xcmd\", \"viya\", \"lua\", \"lua\"]\n",
    );

    let err = pipeline::run(&options(root)).unwrap_err();
    assert!(format!("{err:#}").contains("'lua' is listed more than once"));
    assert!(!root.join("compileall.sas").exists());
    Ok(())
}

#[test]
fn workspace_config_changes_layout() -> Result<()> {
    let temp = library();
    let root = temp.path();
    write(
        root,
        "macropack.toml",
        "splice = []\n\n[bundles]\nfolders = [\"lua\", \"base\"]\naggregate = \"all.sas\"\n",
    );

    pipeline::run(&options(root))?;
    let aggregate = fs::read_to_string(root.join("all.sas"))?;
    let lua = fs::read_to_string(root.join("compilelua.sas"))?;
    let base = fs::read_to_string(root.join("compilebase.sas"))?;
    assert_eq!(aggregate, format!("{BANNER}{lua}{base}"));
    assert!(!root.join("compilemeta.sas").exists());
    assert_eq!(
        fs::read_to_string(root.join("meta/mm_createwebservice.sas"))?,
        SERVICE
    );
    Ok(())
}

#[test]
fn dotted_source_dir_bundles_wrappers_on_first_run() -> Result<()> {
    let temp = library();
    let root = temp.path();
    write(
        root,
        "macropack.toml",
        "splice = []\n\n[wrappers]\nsource_dir = \"./lua\"\n\n[bundles]\nfolders = [\"lua\"]\n",
    );

    pipeline::run(&options(root))?;
    let first = fs::read_to_string(root.join("compilelua.sas"))?;
    assert_eq!(first, fs::read_to_string(root.join("lua/ml_util.sas"))?);
    assert!(first.contains("%macro ml_util();"));

    pipeline::run(&options(root))?;
    let second = fs::read_to_string(root.join("compilelua.sas"))?;
    assert_eq!(first, second);
    Ok(())
}
