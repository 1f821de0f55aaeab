// ==========================================
// e-curatif - 命令行导入入口
// ==========================================
// 用法: ecuratif-import [db_path] <csv_file>
// 输出: ImportReport JSON（stdout）
// ==========================================

use anyhow::{bail, Context, Result};
use ecuratif::api::DefaultImportApi;
use ecuratif::db::{init_schema, open_sqlite_connection};
use ecuratif::logging;
use std::path::{Path, PathBuf};

/// 默认数据库路径（系统数据目录下）
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ecuratif")
        .join("ecuratif.db")
}

fn parse_args(args: &[String]) -> Result<(PathBuf, PathBuf)> {
    match args {
        [csv] => Ok((default_db_path(), PathBuf::from(csv))),
        [db, csv] => Ok((PathBuf::from(db), PathBuf::from(csv))),
        _ => bail!("用法: ecuratif-import [db_path] <csv_file>"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (db_path, csv_path) = parse_args(&args)?;

    tracing::info!("{} v{}", ecuratif::APP_NAME, ecuratif::VERSION);
    tracing::info!(db_path = %db_path.display(), "使用数据库");

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建目录: {}", parent.display()))?;
    }
    let db_path_str = db_path.to_string_lossy().to_string();

    {
        let conn = open_sqlite_connection(&db_path_str).context("打开数据库失败")?;
        init_schema(&conn).context("初始化数据库结构失败")?;
    }

    let bytes = std::fs::read(&csv_path)
        .with_context(|| format!("读取文件失败: {}", csv_path.display()))?;
    let file_name = declared_name(&csv_path);

    let api = DefaultImportApi::from_db_path(&db_path_str)?;
    let response = api.import_info_csv(&file_name, bytes).await?;

    println!("{}", serde_json::to_string_pretty(&response.report)?);
    eprintln!("{}", response.summary);

    Ok(())
}

fn declared_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let (db, csv) = parse_args(&["a.db".to_string(), "b.csv".to_string()]).unwrap();
        assert_eq!(db, PathBuf::from("a.db"));
        assert_eq!(csv, PathBuf::from("b.csv"));

        let (_, csv) = parse_args(&["only.csv".to_string()]).unwrap();
        assert_eq!(csv, PathBuf::from("only.csv"));

        assert!(parse_args(&[]).is_err());
    }
}
