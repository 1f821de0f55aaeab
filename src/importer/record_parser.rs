// ==========================================
// e-curatif - CSV 记录解析器
// ==========================================
// 文件结构:
// - 第 0 行: 元信息，首格为 Source 名称
// - 第 1 行: 列标题（忽略）
// - 第 2 行起: 数据行
// ==========================================

use crate::importer::error::ParseError;
use csv::ReaderBuilder;
use tracing::debug;

/// 数据起始行（第 0、1 行固定跳过）
pub const FIRST_DATA_ROW: usize = 2;

const UTF8_BOM: &str = "\u{feff}";

/// 原始数据行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row_index: usize,   // 文件内行号（从 0 开始）
    pub cells: Vec<String>, // 原样单元格
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    pub entity_name: String,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParser;

impl RecordParser {
    /// 解析 UTF-8 内容
    pub fn parse(&self, content: &[u8]) -> Result<ParsedFile, ParseError> {
        let text =
            std::str::from_utf8(content).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 行长度由 RowMapper 校验
            .from_reader(text.as_bytes());

        let mut entity_name = None;
        let mut rows = Vec::new();
        let mut blank_rows = 0usize;

        for (row_index, result) in reader.records().enumerate() {
            let record = result?;

            if row_index == 0 {
                let name = record.get(0).map(str::trim).unwrap_or("");
                if name.is_empty() {
                    return Err(ParseError::MissingEntityName);
                }
                entity_name = Some(name.to_string());
                continue;
            }

            if row_index < FIRST_DATA_ROW {
                continue;
            }

            // 跳过完全空白的行（表格导出的尾部空行）
            if record.iter().all(|cell| cell.trim().is_empty()) {
                blank_rows += 1;
                continue;
            }

            rows.push(RawRow {
                row_index,
                cells: record.iter().map(str::to_string).collect(),
            });
        }

        let entity_name = entity_name.ok_or(ParseError::Empty)?;
        debug!(
            entity_name = %entity_name,
            data_rows = rows.len(),
            blank_rows,
            "CSV 解析完成"
        );

        Ok(ParsedFile { entity_name, rows })
    }
}
