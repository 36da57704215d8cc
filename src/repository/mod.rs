// ==========================================
// 参考成本引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含计价规则
// ==========================================
// 职责: 按分区存取参考单价，屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod reference_repo;
pub mod reference_repo_impl;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use reference_repo::ReferenceRepository;
pub use reference_repo_impl::ReferenceRepositoryImpl;
