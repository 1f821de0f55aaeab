// ==========================================
// e-curatif - 导入层
// ==========================================
// 职责: 维护事件 CSV 批量导入
// 流程: 扩展名校验 → 转码 → 解析 → Source 解析 → 行映射 → 落库
// ==========================================

// 模块声明
pub mod artifact_archiver;
pub mod batch_inserter;
pub mod encoding_normalizer;
pub mod error;
pub mod file_type_gate;
pub mod import_pipeline;
pub mod info_importer_trait;
pub mod record_parser;
pub mod row_mapper;
pub mod schema;
pub mod source_resolver;
pub mod status_deriver;

// 重导出核心类型
pub use artifact_archiver::{sanitize_file_name, ArtifactArchiver, StagedArchive};
pub use batch_inserter::{BatchInserter, InsertOutcome};
pub use encoding_normalizer::{EncodingNormalizer, EncodingRsCodec, CANONICAL_ENCODING};
pub use error::{EncodingError, ImportError, ImportResult, ParseError, RowError};
pub use file_type_gate::{FileTypeGate, GateDecision};
pub use import_pipeline::ImportPipeline;
pub use info_importer_trait::{CharsetDetector, ImportCancellation, InfoImporter, Transcoder};
pub use record_parser::{ParsedFile, RawRow, RecordParser, FIRST_DATA_ROW};
pub use row_mapper::{RowMapper, CREATED_DATE_FORMAT};
pub use schema::{InfoField, SchemaDescriptor, INFO_CSV_SCHEMA_V1};
pub use source_resolver::SourceResolver;
