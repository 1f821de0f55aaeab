// ==========================================
// e-curatif - 导入文件列布局
// ==========================================
// 依据: 维护事件导出表格的固定列位置
// 红线: 列位置是文件格式契约，变更必须升级 version
// ==========================================

use std::collections::HashSet;

/// 语义字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoField {
    Agent,
    Event,
    Created,
    Material,
    Detail,
    Target,
    DayDone,
    Priority,
    Estimate,
    Oups,
    Brips,
    Ameps,
}

impl InfoField {
    pub const ALL: [InfoField; 12] = [
        InfoField::Agent,
        InfoField::Event,
        InfoField::Created,
        InfoField::Material,
        InfoField::Detail,
        InfoField::Target,
        InfoField::DayDone,
        InfoField::Priority,
        InfoField::Estimate,
        InfoField::Oups,
        InfoField::Brips,
        InfoField::Ameps,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InfoField::Agent => "agent",
            InfoField::Event => "event",
            InfoField::Created => "created",
            InfoField::Material => "material",
            InfoField::Detail => "detail",
            InfoField::Target => "target",
            InfoField::DayDone => "day_done",
            InfoField::Priority => "priority",
            InfoField::Estimate => "estimate",
            InfoField::Oups => "oups",
            InfoField::Brips => "brips",
            InfoField::Ameps => "ameps",
        }
    }
}

// ==========================================
// SchemaDescriptor - 版本化列布局
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDescriptor {
    version: u32,
    columns: &'static [(InfoField, usize)],
}

/// v1 布局（第 6、7 列保留未用）
pub const INFO_CSV_SCHEMA_V1: SchemaDescriptor = SchemaDescriptor::new(
    1,
    &[
        (InfoField::Agent, 0),
        (InfoField::Event, 1),
        (InfoField::Created, 2),
        (InfoField::Material, 3),
        (InfoField::Detail, 4),
        (InfoField::Target, 5),
        (InfoField::DayDone, 8),
        (InfoField::Priority, 9),
        (InfoField::Estimate, 10),
        (InfoField::Oups, 11),
        (InfoField::Brips, 12),
        (InfoField::Ameps, 13),
    ],
);

impl SchemaDescriptor {
    pub const fn new(version: u32, columns: &'static [(InfoField, usize)]) -> Self {
        Self { version, columns }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn offset(&self, field: InfoField) -> Option<usize> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, offset)| *offset)
    }

    /// 数据行最少列数 = max(offset) + 1
    pub fn required_width(&self) -> usize {
        self.columns
            .iter()
            .map(|(_, offset)| offset + 1)
            .max()
            .unwrap_or(0)
    }

    /// 校验布局完整性
    ///
    /// # 规则
    /// - 每个语义字段恰好出现一次
    /// - 列位置不重复
    pub fn validate(&self) -> Result<(), String> {
        let mut fields = HashSet::new();
        let mut offsets = HashSet::new();

        for (field, offset) in self.columns {
            if !fields.insert(*field) {
                return Err(format!(
                    "v{}: 字段 {} 重复定义",
                    self.version,
                    field.name()
                ));
            }
            if !offsets.insert(*offset) {
                return Err(format!("v{}: 列 {} 被多个字段占用", self.version, offset));
            }
        }

        if let Some(missing) = InfoField::ALL.iter().find(|f| !fields.contains(f)) {
            return Err(format!("v{}: 缺少字段 {}", self.version, missing.name()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_layout() {
        assert!(INFO_CSV_SCHEMA_V1.validate().is_ok());
        assert_eq!(INFO_CSV_SCHEMA_V1.required_width(), 14);
        assert_eq!(INFO_CSV_SCHEMA_V1.offset(InfoField::DayDone), Some(8));
        assert_eq!(INFO_CSV_SCHEMA_V1.offset(InfoField::Priority), Some(9));
    }

    #[test]
    fn test_validate_rejects_duplicate_offset() {
        const BROKEN: SchemaDescriptor = SchemaDescriptor::new(
            99,
            &[(InfoField::Agent, 0), (InfoField::Event, 0)],
        );
        let err = BROKEN.validate().unwrap_err();
        assert!(err.contains("列 0"));
    }

    #[test]
    fn test_validate_rejects_missing_field() {
        const PARTIAL: SchemaDescriptor =
            SchemaDescriptor::new(2, &[(InfoField::Agent, 0), (InfoField::Event, 1)]);
        let err = PARTIAL.validate().unwrap_err();
        assert!(err.contains("缺少字段"));
    }
}
