//! Integration tests for reqsift-cli
//!
//! These tests drive the commands end to end against files on disk, with the
//! scripted provider standing in for the generation service.

use reqsift_cli::cli::{CatalogArgs, ExtractArgs, LocateArgs, NamedArgs, TocArgs};
use reqsift_cli::commands;
use reqsift_cli::config::{Config, OutputFormat, ProviderKind};
use reqsift_cli::{CliError, Formatter};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SPEC: &str = "\
3.2.1 用户登录功能
a) 标识号: REQ-1.1
b) 说明: 用户通过账号和密码登录系统。
c) 进入条件: 用户打开登录页面。
d) 输入: 用户名、密码。
e) 输出: 登录结果。
f) 处理:
1. 校验输入格式。
2. 比对密码摘要。
g) 性能: 响应时间不超过1秒。
h) 约束与限制: 连续失败5次锁定账号。
";

const TOC: &str = "\
目录
3.2 功能需求 ........ 10
3.2.1 用户登录功能 ........ 11
3.2.2 数据导出功能 ........ 12
";

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn mock_config(response: &str) -> Config {
    let mut config = Config::default();
    config.provider = ProviderKind::Mock;
    config.mock.response = response.to_string();
    config
}

fn formatter() -> Formatter {
    Formatter::new(OutputFormat::Json, false)
}

#[test]
fn test_locate_with_names_from_toc() {
    let dir = TempDir::new().unwrap();
    let args = LocateArgs {
        file: write(&dir, "spec.txt", SPEC),
        names: vec![],
        toc: Some(write(&dir, "toc.txt", TOC)),
        permissive: false,
    };

    assert!(commands::execute_locate(args, &Config::default(), &formatter()).is_ok());
}

#[test]
fn test_locate_without_names_is_rejected() {
    let dir = TempDir::new().unwrap();
    let args = LocateArgs {
        file: write(&dir, "spec.txt", SPEC),
        names: vec![],
        toc: None,
        permissive: true,
    };

    assert!(matches!(
        commands::execute_locate(args, &Config::default(), &formatter()),
        Err(CliError::InvalidInput(_))
    ));
}

#[test]
fn test_toc_command() {
    let dir = TempDir::new().unwrap();
    let args = TocArgs {
        file: write(&dir, "toc.txt", TOC),
    };
    assert!(commands::execute_toc(args, &formatter()).is_ok());
}

#[tokio::test]
async fn test_extract_with_mock_provider() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(
        r#"{"requirements": [{"chapter_number": "3.2.1", "title": "用户登录功能", "content": "a) 标识号: REQ-1.1"}]}"#,
    );
    let args = ExtractArgs {
        file: write(&dir, "spec.txt", SPEC),
        prefixes: vec!["3.2.".to_string()],
        model: None,
        save_session: false,
    };

    assert!(commands::execute_extract(args, &config, &formatter()).await.is_ok());
}

#[tokio::test]
async fn test_named_with_mock_provider() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(r#"{"requirement": {"title": "用户登录功能", "content": "用户通过账号和密码登录系统。"}}"#);
    let args = NamedArgs {
        file: write(&dir, "spec.txt", SPEC),
        names: vec!["用户登录功能".to_string()],
        names_file: None,
        model: Some("other-model".to_string()),
    };

    assert!(commands::execute_named(args, &config, &formatter()).await.is_ok());
}

#[tokio::test]
async fn test_catalog_with_mock_provider() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(r#"{"requirements": [{"chapter": "3.2.1", "name": "用户登录功能"}]}"#);
    let args = CatalogArgs {
        file: write(&dir, "toc.txt", TOC),
        level: Some(3),
        model: None,
    };

    assert!(commands::execute_catalog(args, &config, &formatter()).await.is_ok());
}

#[tokio::test]
async fn test_invalid_extractor_config_fails_before_any_call() {
    let dir = TempDir::new().unwrap();
    let mut config = mock_config(r#"{"requirements": []}"#);
    config.extractor.overlap_units = config.extractor.window_units;
    let args = ExtractArgs {
        file: write(&dir, "spec.txt", SPEC),
        prefixes: vec![],
        model: None,
        save_session: false,
    };

    assert!(matches!(
        commands::execute_extract(args, &config, &formatter()).await,
        Err(CliError::Extractor(_))
    ));
}

#[tokio::test]
async fn test_missing_document() {
    let dir = TempDir::new().unwrap();
    let args = ExtractArgs {
        file: dir.path().join("absent.txt"),
        prefixes: vec![],
        model: None,
        save_session: false,
    };

    assert!(matches!(
        commands::execute_extract(args, &mock_config("{}"), &formatter()).await,
        Err(CliError::Document(_))
    ));
}
