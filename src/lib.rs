// ==========================================
// 参考成本引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: 按 (期次, 地区, 计价模式) 分区的参考单价库 + 组成成本解析
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 成本解析
pub mod engine;

// 导入层 - 外部报表
pub mod importer;

// 配置层 - 可调参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 界面接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CostingMode, EntityKind, LineType, PriceSource};

// 领域实体
pub use domain::{
    Assembly, BomLineItem, CatalogDraft, CostBreakdown, ImportBatch, PartitionKey,
    PartitionSummary, PriceOverride, ReferenceBatch, ReferenceLookup, ReferenceRecord, Resource,
    ResolvedLine,
};

// 引擎
pub use engine::CompositionResolver;

// 导入
pub use importer::{ImportError, ReferenceImporter};

// 仓储
pub use repository::{ReferenceRepository, ReferenceRepositoryImpl, RepositoryError};

// API
pub use api::{ApiError, ReferenceApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "参考成本引擎";
