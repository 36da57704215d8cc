// ==========================================
// 参考成本引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 坏行跳过不算错误，只有结构性问题才报错
// ==========================================

use crate::domain::types::EntityKind;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作簿中没有工作表: {0}")]
    EmptyWorkbook(String),

    // ===== 表结构错误 =====
    #[error("缺少必需列 ({kind}): {}", fields.join(", "))]
    MissingRequiredColumns {
        kind: EntityKind,
        fields: Vec<String>,
    },

    // ===== 落库错误 =====
    #[error("落库失败: {0}")]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_names_fields() {
        let err = ImportError::MissingRequiredColumns {
            kind: EntityKind::Resource,
            fields: vec!["code".to_string(), "unit_price".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("RESOURCE"));
        assert!(msg.contains("code, unit_price"));
    }
}
