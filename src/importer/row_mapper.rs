// ==========================================
// e-curatif - 行映射器
// ==========================================
// 职责: RawRow → CandidateRecord（按 SchemaDescriptor 取列）
// 规则:
// - 先校验列数，不足则 RowShape
// - 文本字段原样提取（不 TRIM）
// - priority 必须为整数，created 必须为 DD/MM/YYYY
// ==========================================

use crate::domain::CandidateRecord;
use crate::importer::error::{ImportError, ImportResult, RowError};
use crate::importer::record_parser::RawRow;
use crate::importer::schema::{InfoField, SchemaDescriptor};
use crate::importer::status_deriver;
use chrono::NaiveDate;

/// 源文件日期格式
pub const CREATED_DATE_FORMAT: &str = "%d/%m/%Y";

/// 预先解析好的列位置
#[derive(Debug, Clone, Copy)]
struct ColumnOffsets {
    agent: usize,
    event: usize,
    created: usize,
    material: usize,
    detail: usize,
    target: usize,
    day_done: usize,
    priority: usize,
    estimate: usize,
    oups: usize,
    brips: usize,
    ameps: usize,
}

#[derive(Debug, Clone)]
pub struct RowMapper {
    schema_version: u32,
    required_width: usize,
    offsets: ColumnOffsets,
}

impl RowMapper {
    /// 校验一次布局并缓存列位置
    pub fn new(schema: &SchemaDescriptor) -> ImportResult<Self> {
        schema.validate().map_err(ImportError::InvalidSchema)?;

        let at = |field: InfoField| {
            schema
                .offset(field)
                .ok_or_else(|| ImportError::InvalidSchema(format!("缺少字段 {}", field.name())))
        };

        Ok(Self {
            schema_version: schema.version(),
            required_width: schema.required_width(),
            offsets: ColumnOffsets {
                agent: at(InfoField::Agent)?,
                event: at(InfoField::Event)?,
                created: at(InfoField::Created)?,
                material: at(InfoField::Material)?,
                detail: at(InfoField::Detail)?,
                target: at(InfoField::Target)?,
                day_done: at(InfoField::DayDone)?,
                priority: at(InfoField::Priority)?,
                estimate: at(InfoField::Estimate)?,
                oups: at(InfoField::Oups)?,
                brips: at(InfoField::Brips)?,
                ameps: at(InfoField::Ameps)?,
            },
        })
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn required_width(&self) -> usize {
        self.required_width
    }

    /// 映射单行
    ///
    /// # 返回
    /// - Ok(CandidateRecord): status 已由 status_deriver 计算
    /// - Err(RowError): RowShape / FieldParse
    pub fn map(&self, row: &RawRow, source_id: i64) -> Result<CandidateRecord, RowError> {
        if row.cells.len() < self.required_width {
            return Err(RowError::RowShape {
                row_index: row.row_index,
                expected: self.required_width,
                actual: row.cells.len(),
            });
        }

        // 宽度已校验，以下索引不会越界
        let cell = |offset: usize| row.cells[offset].clone();
        let o = &self.offsets;

        let priority = parse_priority(&row.cells[o.priority]).ok_or_else(|| {
            RowError::FieldParse {
                row_index: row.row_index,
                field: InfoField::Priority.name(),
                value: row.cells[o.priority].clone(),
            }
        })?;

        let created = parse_created(&row.cells[o.created]).ok_or_else(|| RowError::FieldParse {
            row_index: row.row_index,
            field: InfoField::Created.name(),
            value: row.cells[o.created].clone(),
        })?;

        let target = cell(o.target);
        let day_done = cell(o.day_done);
        let status = status_deriver::derive(&target, &day_done);

        Ok(CandidateRecord {
            row_index: row.row_index,
            source_id,
            agent: cell(o.agent),
            event: cell(o.event),
            created,
            material: cell(o.material),
            detail: cell(o.detail),
            target,
            day_done,
            priority,
            estimate: cell(o.estimate),
            oups: cell(o.oups),
            brips: cell(o.brips),
            ameps: cell(o.ameps),
            status,
        })
    }
}

fn parse_priority(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

/// DD/MM/YYYY，年份必须恰好 4 位（%Y 本身接受任意位数）
fn parse_created(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let year = value.rsplit('/').next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, CREATED_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InfoStatus;
    use crate::importer::schema::INFO_CSV_SCHEMA_V1;

    fn row(row_index: usize, cells: &[&str]) -> RawRow {
        RawRow {
            row_index,
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn full_row(row_index: usize, target: &str, day_done: &str, priority: &str) -> RawRow {
        row(
            row_index,
            &[
                "Dupont", "Fuite", "12/03/2024", "Joint", " détail ", target, "r6", "r7",
                day_done, priority, "2h", "O1", "B1", "A1",
            ],
        )
    }

    #[test]
    fn test_maps_fields_at_offsets() {
        let mapper = RowMapper::new(&INFO_CSV_SCHEMA_V1).unwrap();
        let record = mapper.map(&full_row(2, "Alice", "", "3"), 42).unwrap();

        assert_eq!(record.row_index, 2);
        assert_eq!(record.source_id, 42);
        assert_eq!(record.agent, "Dupont");
        assert_eq!(record.created, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        assert_eq!(record.detail, " détail "); // 原样保留
        assert_eq!(record.target, "Alice");
        assert_eq!(record.priority, 3);
        assert_eq!(record.estimate, "2h");
        assert_eq!(record.ameps, "A1");
        assert_eq!(record.status, InfoStatus::Assigned);
    }

    #[test]
    fn test_short_row_is_row_shape_error() {
        let mapper = RowMapper::new(&INFO_CSV_SCHEMA_V1).unwrap();
        let err = mapper
            .map(&row(5, &["a", "b", "c", "d", "e", "f", "g", "h", "i"]), 1)
            .unwrap_err();

        assert_eq!(
            err,
            RowError::RowShape {
                row_index: 5,
                expected: 14,
                actual: 9
            }
        );
    }

    #[test]
    fn test_non_numeric_priority_is_not_defaulted() {
        let mapper = RowMapper::new(&INFO_CSV_SCHEMA_V1).unwrap();
        let err = mapper.map(&full_row(3, "", "", "abc"), 1).unwrap_err();
        assert_eq!(err.row_index(), 3);
        assert!(matches!(err, RowError::FieldParse { field: "priority", .. }));

        let err = mapper.map(&full_row(4, "", "", ""), 1).unwrap_err();
        assert!(matches!(err, RowError::FieldParse { field: "priority", .. }));
    }

    #[test]
    fn test_malformed_created_date() {
        let mapper = RowMapper::new(&INFO_CSV_SCHEMA_V1).unwrap();
        let mut bad = full_row(6, "", "", "1");
        bad.cells[2] = "2024-03-12".to_string();
        let err = mapper.map(&bad, 1).unwrap_err();
        assert!(matches!(err, RowError::FieldParse { field: "created", .. }));
    }

    #[test]
    fn test_created_requires_four_digit_year() {
        let mapper = RowMapper::new(&INFO_CSV_SCHEMA_V1).unwrap();
        for bad_date in ["12/03/24", "12/03/024", "12/03/20245", "12/03/+024"] {
            let mut row = full_row(7, "", "", "1");
            row.cells[2] = bad_date.to_string();
            let err = mapper.map(&row, 1).unwrap_err();
            assert_eq!(
                err,
                RowError::FieldParse {
                    row_index: 7,
                    field: "created",
                    value: bad_date.to_string()
                }
            );
        }

        let mut row = full_row(8, "", "", "1");
        row.cells[2] = " 01/12/1999 ".to_string();
        let record = mapper.map(&row, 1).unwrap();
        assert_eq!(record.created, NaiveDate::from_ymd_opt(1999, 12, 1).unwrap());
    }

    #[test]
    fn test_unknown_status_is_explicit() {
        let mapper = RowMapper::new(&INFO_CSV_SCHEMA_V1).unwrap();
        let record = mapper.map(&full_row(2, "", "14/03/2024", "1"), 1).unwrap();
        assert_eq!(record.status, InfoStatus::Unknown);
    }
}
