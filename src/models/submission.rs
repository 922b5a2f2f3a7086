//! 提交数据
//!
//! 调用方拥有，核心只读

use serde::{Deserialize, Serialize};

/// 单个代码提交
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// 提交标识（通常是文件名）
    pub id: String,
    /// 源代码
    pub code: String,
}

impl Submission {
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
        }
    }
}

/// 从 `(id, code)` 映射构建提交列表，保持迭代顺序
pub fn from_pairs<I, K, V>(pairs: I) -> Vec<Submission>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(id, code)| Submission::new(id, code))
        .collect()
}
