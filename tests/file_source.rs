//! Loading configuration from files on disk.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use gestalt::builder::GestaltBuilder;
use gestalt::source::FileSource;
use gestalt::GestaltError;

fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) -> Result<String> {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path.to_string_lossy().into_owned())
}

#[test]
fn json_files_load_by_extension() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(
        &dir,
        "app.json",
        r#"{"app": {"name": "demo", "released": "2024-06-01", "workers": 4}}"#,
    )?;

    let gestalt = GestaltBuilder::new()
        .add_source(FileSource::new(path))
        .build()?;
    gestalt.load_configs()?;

    assert_eq!(gestalt.get_config::<String>("app.name")?, "demo");
    assert_eq!(gestalt.get_config::<u32>("app.workers")?, 4);
    assert_eq!(
        gestalt.get_config::<NaiveDate>("app.released")?,
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    );
    Ok(())
}

#[test]
fn custom_date_formats_apply() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(&dir, "app.json", r#"{"released": "01/06/2024"}"#)?;

    let gestalt = GestaltBuilder::new()
        .add_source(FileSource::new(path))
        .local_date_format("%d/%m/%Y")
        .build()?;
    gestalt.load_configs()?;

    assert_eq!(
        gestalt.get_config::<NaiveDate>("released")?,
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    );
    Ok(())
}

#[test]
fn missing_files_fail_the_load() -> Result<()> {
    let gestalt = GestaltBuilder::new()
        .add_source(FileSource::new("/definitely/not/here.json"))
        .build()?;
    assert!(matches!(
        gestalt.load_configs(),
        Err(GestaltError::SourceLoad { .. })
    ));
    Ok(())
}

#[test]
fn file_reload_picks_up_changes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(&dir, "app.json", r#"{"port": 1}"#)?;

    let source = FileSource::new(path.clone());
    use gestalt::source::ConfigSource;
    let source_id = source.id();

    let gestalt = GestaltBuilder::new().add_source(source).build()?;
    gestalt.load_configs()?;
    assert_eq!(gestalt.get_config::<u16>("port")?, 1);

    std::fs::write(&path, r#"{"port": 2}"#)?;
    gestalt.reload_source(source_id)?;
    assert_eq!(gestalt.get_config::<u16>("port")?, 2);
    Ok(())
}
