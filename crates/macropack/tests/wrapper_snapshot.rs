use insta::assert_snapshot;
use macropack::domain::model::SourceFile;
use macropack::app::wrap::WrapperGenerator;
use macropack::infra::config::Config;

#[test]
fn wrapper_renders() {
    let generator = WrapperGenerator::new(Config::default().wrappers).expect("generator");
    let source = SourceFile::new(
        "lua/mp_json.lua",
        "local json = { _version = \"0.1.2\" }\n\n-- it's encoded   \nreturn json\n",
    );
    let unit = generator.unit_for(&source).expect("unit");
    let rendered = generator.render(&unit).expect("render");
    assert_snapshot!("ml_mp_json", rendered.trim_end());
}
