//! Export: grid pages -> trees -> files.

use std::path::{Path, PathBuf};

use gridsync::{Accumulator, formats::FormatType};
use serde_json::Value;
use tracing::{error, info};

use crate::api::{GridApi, STATUS_OK, STATUS_TOO_MANY_REQUESTS};
use crate::config::{ExportConfig, FileMapping, GridConfig, Settings};
use crate::urls::{records_query, records_url};

/// Fetches every page of `grid` restricted to `column_id` and folds it into `acc`.
///
/// Rate-limited requests are retried after `settings.retry_delay`, up to
/// `settings.max_fetch_retry` times per page. Any other failure is logged
/// and ends the fetch; pages already folded in are kept.
pub fn fetch_grid<A: GridApi>(
    api: &A,
    settings: &Settings,
    grid: &GridConfig,
    column_id: &str,
    mut acc: Accumulator,
) -> Accumulator {
    let mut url = records_url(&settings.base_url, &grid.view_id);
    let mut query = records_query(&[column_id], settings.fetch_limit, 0);
    let mut retries = 0;

    loop {
        let response = match api.get(&url, &query) {
            Ok(response) => response,
            Err(e) => {
                error!("{}", e);
                return acc;
            }
        };

        match response.status {
            STATUS_OK => {
                let page = match serde_json::from_str::<Value>(&response.body) {
                    Ok(Value::Array(page)) => page,
                    Ok(_) => {
                        error!("Request to {} did not return a list of records", url);
                        return acc;
                    }
                    Err(e) => {
                        error!("Request to {} returned invalid JSON: {}", url, e);
                        return acc;
                    }
                };
                acc = acc.build(&page);

                match response.next_url() {
                    Some(next) => {
                        url = next;
                        query.clear();
                        retries = 0;
                    }
                    None => return acc,
                }
            }
            STATUS_TOO_MANY_REQUESTS => {
                if retries >= settings.max_fetch_retry {
                    error!("Request to {} has reached maximum of retries", url);
                    return acc;
                }
                retries += 1;
                std::thread::sleep(settings.retry_delay);
            }
            status => {
                error!(
                    "Request to {} has returned code {}, details: {}",
                    url, status, response.body
                );
                return acc;
            }
        }
    }
}

/// Sets a top-level `name` on JSON output when the mapping declares a language.
fn apply_lang(acc: &mut Accumulator, mapping: &FileMapping) {
    if let (Accumulator::Object(root), Some(lang)) = (acc, &mapping.lang) {
        root.entry("name".to_string())
            .or_insert_with(|| Value::String(lang.clone()));
    }
}

fn write(acc: &Accumulator, path: &Path) -> Result<(), String> {
    acc.write_to(path)
        .map_err(|e| format!("Error writing {}: {}", path.display(), e))?;
    info!("Exported data to {}", path.display());
    Ok(())
}

fn grid_file(directory: &Path, grid: &GridConfig, mapping: &FileMapping) -> PathBuf {
    directory.join(format!("{}_{}", grid.name, mapping.file_name))
}

/// Exports every file mapping, returning the paths written.
///
/// Markup is written per grid as `{grid}_{file}`. JSON goes to one combined
/// `{file}` unless `combine` is off, in which case it is also per grid.
pub fn run_export<A: GridApi>(
    api: &A,
    settings: &Settings,
    export: &ExportConfig,
) -> Result<Vec<PathBuf>, String> {
    let directory = Path::new(&export.directory);
    std::fs::create_dir_all(directory).map_err(|e| {
        format!(
            "Cannot create export directory {}: {}",
            directory.display(),
            e
        )
    })?;

    let mut written = Vec::new();
    for mapping in &export.files.mappings {
        let format = mapping.format()?;
        let fresh = || Accumulator::new(format).map_err(|e| e.to_string());

        if format == FormatType::Json && export.combine {
            let mut acc = fresh()?;
            for grid in &export.grids {
                acc = fetch_grid(api, settings, grid, &mapping.column_id, acc);
            }
            apply_lang(&mut acc, mapping);
            let path = directory.join(&mapping.file_name);
            write(&acc, &path)?;
            written.push(path);
        } else {
            for grid in &export.grids {
                let mut acc = fetch_grid(api, settings, grid, &mapping.column_id, fresh()?);
                apply_lang(&mut acc, mapping);
                let path = grid_file(directory, grid, mapping);
                write(&acc, &path)?;
                written.push(path);
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResponse;
    use crate::config::FilesConfig;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct FakeApi {
        responses: RefCell<VecDeque<ApiResponse>>,
        gets: RefCell<Vec<(String, Vec<(String, String)>)>>,
    }

    impl FakeApi {
        fn new(responses: Vec<ApiResponse>) -> Self {
            FakeApi {
                responses: RefCell::new(responses.into()),
                gets: RefCell::new(Vec::new()),
            }
        }
    }

    impl GridApi for FakeApi {
        fn get(&self, url: &str, query: &[(String, String)]) -> Result<ApiResponse, String> {
            self.gets
                .borrow_mut()
                .push((url.to_string(), query.to_vec()));
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| "no more responses".to_string())
        }

        fn post_json(&self, _url: &str, _body: &str) -> Result<ApiResponse, String> {
            Err("unexpected POST".to_string())
        }
    }

    fn ok(body: Value, next: Option<&str>) -> ApiResponse {
        ApiResponse {
            status: 200,
            link: next.map(|n| format!("<{}>; rel=\"next\"", n)),
            body: body.to_string(),
        }
    }

    fn status(code: u16) -> ApiResponse {
        ApiResponse {
            status: code,
            link: None,
            body: "{\"message\":\"nope\"}".to_string(),
        }
    }

    fn settings(max_fetch_retry: u32) -> Settings {
        Settings {
            base_url: "https://grid.test".to_string(),
            max_fetch_retry,
            fetch_limit: 2,
            import_chunk_size: 10,
            retry_delay: Duration::ZERO,
        }
    }

    fn grid(name: &str) -> GridConfig {
        GridConfig {
            name: name.to_string(),
            view_id: format!("view_{}", name),
            path: None,
            default: false,
        }
    }

    fn record(id: &str, value: &str) -> Value {
        json!({"id": id, "cells": [{"columnId": "col", "value": value}]})
    }

    fn object(acc: Accumulator) -> Value {
        match acc {
            Accumulator::Object(map) => Value::Object(map),
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_follows_next_links() {
        let api = FakeApi::new(vec![
            ok(json!([record("a/x", "1")]), Some("https://grid.test/next")),
            ok(json!([record("a/y", "2")]), None),
        ]);
        let acc = Accumulator::new(FormatType::Json).unwrap();
        let acc = fetch_grid(&api, &settings(3), &grid("ui"), "col", acc);
        assert_eq!(object(acc), json!({"a": {"x": "1", "y": "2"}}));

        let gets = api.gets.borrow();
        assert_eq!(gets[0].0, "https://grid.test/v1/views/view_ui/records");
        assert_eq!(
            gets[0].1,
            vec![
                ("columnIds".to_string(), "col".to_string()),
                ("page".to_string(), r#"{"limit":2,"offset":0}"#.to_string()),
            ]
        );
        assert_eq!(gets[1].0, "https://grid.test/next");
        assert!(gets[1].1.is_empty());
    }

    #[test]
    fn test_fetch_retries_rate_limited_requests() {
        let api = FakeApi::new(vec![
            status(429),
            status(429),
            ok(json!([record("k", "v")]), None),
        ]);
        let acc = fetch_grid(
            &api,
            &settings(2),
            &grid("ui"),
            "col",
            Accumulator::new(FormatType::Json).unwrap(),
        );
        assert_eq!(object(acc), json!({"k": "v"}));
        assert_eq!(api.gets.borrow().len(), 3);
    }

    #[test]
    fn test_fetch_gives_up_after_max_retries() {
        let api = FakeApi::new(vec![
            ok(json!([record("k", "v")]), Some("https://grid.test/next")),
            status(429),
            status(429),
            ok(json!([record("late", "v")]), None),
        ]);
        let acc = fetch_grid(
            &api,
            &settings(1),
            &grid("ui"),
            "col",
            Accumulator::new(FormatType::Json).unwrap(),
        );
        assert_eq!(object(acc), json!({"k": "v"}));
        assert_eq!(api.gets.borrow().len(), 3);
    }

    #[test]
    fn test_fetch_stops_on_error_status() {
        let api = FakeApi::new(vec![status(500), ok(json!([record("k", "v")]), None)]);
        let acc = fetch_grid(
            &api,
            &settings(3),
            &grid("ui"),
            "col",
            Accumulator::new(FormatType::Json).unwrap(),
        );
        assert!(acc.is_empty());
        assert_eq!(api.gets.borrow().len(), 1);
    }

    fn export_config(dir: &Path, combine: bool, mappings: Vec<FileMapping>) -> ExportConfig {
        ExportConfig {
            directory: dir.join("out").to_string_lossy().to_string(),
            combine,
            grids: vec![grid("ui"), grid("menu")],
            files: FilesConfig { mappings },
        }
    }

    fn mapping(file: &str, lang: Option<&str>) -> FileMapping {
        FileMapping {
            file_name: file.to_string(),
            column_id: "col".to_string(),
            lang: lang.map(str::to_string),
        }
    }

    #[test]
    fn test_export_combined_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = export_config(dir.path(), true, vec![mapping("en.json", Some("en"))]);
        let api = FakeApi::new(vec![
            ok(json!([record("ui/title", "Title"), record("name", "grid value")]), None),
            ok(json!([record("menu/open", "Open"), record("ui/title", "Other")]), None),
        ]);

        let written = run_export(&api, &settings(1), &config).unwrap();
        assert_eq!(written, vec![dir.path().join("out").join("en.json")]);

        let value: Value =
            serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"menu": {"open": "Open"}, "name": "grid value", "ui": {"title": "Title"}})
        );
    }

    #[test]
    fn test_export_per_grid_json_sets_lang() {
        let dir = tempfile::tempdir().unwrap();
        let config = export_config(dir.path(), false, vec![mapping("en.json", Some("en"))]);
        let api = FakeApi::new(vec![
            ok(json!([record("a", "1")]), None),
            ok(json!([record("b", "2")]), None),
        ]);

        let written = run_export(&api, &settings(1), &config).unwrap();
        let out = dir.path().join("out");
        assert_eq!(written, vec![out.join("ui_en.json"), out.join("menu_en.json")]);

        let menu: Value =
            serde_json::from_str(&std::fs::read_to_string(&written[1]).unwrap()).unwrap();
        assert_eq!(menu, json!({"b": "2", "name": "en"}));
    }

    #[test]
    fn test_export_markup_per_grid() {
        let dir = tempfile::tempdir().unwrap();
        let config = export_config(dir.path(), true, vec![mapping("en.xml", Some("en"))]);
        let api = FakeApi::new(vec![
            ok(json!([record("a/b", "x")]), None),
            ok(json!([record("c", "y")]), None),
        ]);

        let written = run_export(&api, &settings(1), &config).unwrap();
        let out = dir.path().join("out");
        assert_eq!(written, vec![out.join("ui_en.xml"), out.join("menu_en.xml")]);

        let ui = std::fs::read_to_string(&written[0]).unwrap();
        assert!(ui.contains("<group name=\"a\">"));
        assert!(ui.contains("<phrase name=\"b\" text=\"x\"/>"));
        assert!(!ui.contains("name=\"c\""));
        let menu = std::fs::read_to_string(&written[1]).unwrap();
        assert!(menu.contains("<phrase name=\"c\" text=\"y\"/>"));
    }
}
