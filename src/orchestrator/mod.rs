//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量评分和结果汇总，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 检查配置，加载评分标准、模板和提交
//! - 构造唯一的提供方适配器
//! - 写报告，输出全局统计信息
//!
//! ### `batch_processor` - 批量评分器
//! - 控制并发数量（Semaphore）
//! - 持有模型调用闸门和取消令牌
//! - 单个提交失败或 panic 都转为失败记录
//!
//! ### `result_aggregator` - 结果汇总
//! - 拆分成功记录和失败记录
//!
//! ## 层次关系
//!
//! ```text
//! app (加载 / 输出)
//!     ↓
//! batch_processor (处理 Vec<Submission>)
//!     ↓
//! workflow::GradingFlow (处理单个 Submission)
//!     ↓
//! infrastructure::ProviderGate (全局串行的模型调用)
//!     ↓
//! clients (Local / CloudA / CloudB)
//! ```

pub mod app;
pub mod batch_processor;
pub mod result_aggregator;

// 重新导出主要类型
pub use app::App;
pub use batch_processor::{BatchGrader, BatchOptions};
pub use result_aggregator::{aggregate, BatchReport};
