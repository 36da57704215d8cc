// ==========================================
// 参考成本引擎 - 引擎层
// ==========================================
// 职责: 组成成本解析（回退 / 定价优先级 / 汇总）
// 红线: Engine 不拼 SQL，数据一律经 Repository 读取
// ==========================================

pub mod composition_resolver;

// 重导出核心引擎
pub use composition_resolver::CompositionResolver;
