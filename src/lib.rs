//! # Rubric Grader
//!
//! 按评分标准并发批改代码提交的 Rust 程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（模型提供方），只暴露能力
//! - `ProviderGate` - 全局唯一的调用锁，附带截止时间、取消和调用后等待
//!
//! ### ② 提供方适配层（Clients）
//! - `clients/` - 把三种提供方统一成"结构化对话"
//! - `OllamaClient` / `GeminiClient` / `GroqClient`
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个提交"的完整评分流程
//! - `GradingSession` - 逐维度累积分数和反馈
//! - `GradingFlow` - 链式评分 / 零样本评分
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量评分器，管理并发和取消
//! - `orchestrator/result_aggregator` - 汇总成功和失败
//! - `orchestrator/app` - 加载输入、写报告
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ProviderAdapter, ProviderConfig, ProviderMode, StructuredChat};
pub use config::Config;
pub use error::{AppError, AppResult, ProviderError};
pub use infrastructure::ProviderGate;
pub use models::{FailureKind, FailureRecord, GradeRecord, Rubric, StructuredResult, Submission};
pub use orchestrator::{aggregate, App, BatchGrader, BatchOptions, BatchReport};
pub use workflow::{GradingFlow, GradingMode, GradingSession, PromptTemplate};
