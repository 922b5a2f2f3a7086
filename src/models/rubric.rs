//! 评分标准
//!
//! 评分标准是有序的维度列表，顺序决定了链式评分的先后，整批运行期间只读。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::RubricError;

/// 允许的权重和误差
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// 单个评分维度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricDimension {
    /// 维度名（例如 "Functionality"）
    pub key: String,
    /// 评分要点
    pub criteria: Vec<String>,
    /// 该维度的满分
    pub weight: f64,
}

impl RubricDimension {
    pub fn new(key: impl Into<String>, criteria: Vec<String>, weight: f64) -> Self {
        Self {
            key: key.into(),
            criteria,
            weight,
        }
    }
}

/// 有序的评分标准
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rubric {
    dimensions: Vec<RubricDimension>,
}

impl Rubric {
    /// 从维度列表创建，校验非空、键唯一、权重合法
    pub fn new(dimensions: Vec<RubricDimension>) -> Result<Self, RubricError> {
        if dimensions.is_empty() {
            return Err(RubricError::Empty);
        }

        for (idx, dimension) in dimensions.iter().enumerate() {
            if !dimension.weight.is_finite() || dimension.weight < 0.0 {
                return Err(RubricError::InvalidWeight {
                    dimension: dimension.key.clone(),
                    weight: dimension.weight,
                });
            }
            if dimensions[..idx].iter().any(|d| d.key == dimension.key) {
                return Err(RubricError::DuplicateDimension {
                    key: dimension.key.clone(),
                });
            }
        }

        Ok(Self { dimensions })
    }

    /// 从 JSON 文本解析
    pub fn from_json_str(content: &str) -> Result<Self, RubricError> {
        let value: JsonValue = serde_json::from_str(content).map_err(|e| RubricError::Parse {
            reason: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// 从 TOML 文本解析（每个维度一张表）
    pub fn from_toml_str(content: &str) -> Result<Self, RubricError> {
        let table: toml::Table = toml::from_str(content).map_err(|e| RubricError::Parse {
            reason: e.to_string(),
        })?;
        let value = serde_json::to_value(&table).map_err(|e| RubricError::Parse {
            reason: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// 从顶层以维度名为键的文档解析
    ///
    /// 文档格式：
    /// ```json
    /// { "Functionality": { "criteria": ["..."], "weight": 5.0 } }
    /// ```
    pub fn from_value(value: &JsonValue) -> Result<Self, RubricError> {
        let object = value.as_object().ok_or(RubricError::NotAnObject)?;

        let mut dimensions = Vec::with_capacity(object.len());
        for (key, body) in object {
            dimensions.push(parse_dimension(key, body)?);
        }

        Self::new(dimensions)
    }

    /// 按定义顺序遍历维度
    pub fn iter(&self) -> std::slice::Iter<'_, RubricDimension> {
        self.dimensions.iter()
    }

    pub fn dimensions(&self) -> &[RubricDimension] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RubricDimension> {
        self.dimensions.iter().find(|d| d.key == key)
    }

    /// 所有维度权重之和，即理论满分
    pub fn total_weight(&self) -> f64 {
        self.dimensions.iter().map(|d| d.weight).sum()
    }

    /// 校验权重之和等于期望满分
    ///
    /// 总分按各维度分数求和计算，本身不做归一化，所以权重之和必须就是满分。
    pub fn ensure_total(&self, expected: f64) -> Result<(), RubricError> {
        let actual = self.total_weight();
        if (actual - expected).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RubricError::WeightSumMismatch { expected, actual });
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Rubric {
    type Item = &'a RubricDimension;
    type IntoIter = std::slice::Iter<'a, RubricDimension>;

    fn into_iter(self) -> Self::IntoIter {
        self.dimensions.iter()
    }
}

fn parse_dimension(key: &str, body: &JsonValue) -> Result<RubricDimension, RubricError> {
    let body = body.as_object().ok_or_else(|| RubricError::InvalidField {
        dimension: key.to_string(),
        field: "criteria",
        reason: "维度内容必须是对象".to_string(),
    })?;

    let criteria = body
        .get("criteria")
        .ok_or_else(|| RubricError::MissingField {
            dimension: key.to_string(),
            field: "criteria",
        })?
        .as_array()
        .ok_or_else(|| RubricError::InvalidField {
            dimension: key.to_string(),
            field: "criteria",
            reason: "必须是字符串数组".to_string(),
        })?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| RubricError::InvalidField {
                    dimension: key.to_string(),
                    field: "criteria",
                    reason: format!("非字符串元素: {}", item),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let weight = body
        .get("weight")
        .ok_or_else(|| RubricError::MissingField {
            dimension: key.to_string(),
            field: "weight",
        })?
        .as_f64()
        .ok_or_else(|| RubricError::InvalidField {
            dimension: key.to_string(),
            field: "weight",
            reason: "必须是数字".to_string(),
        })?;

    Ok(RubricDimension::new(key, criteria, weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUBRIC_JSON: &str = r#"{
        "Quality": { "criteria": ["Readable names", "Small functions"], "weight": 3.0 },
        "Functionality": { "criteria": ["Correct output"], "weight": 5 },
        "Efficiency": { "criteria": ["No needless copies"], "weight": 2.0 }
    }"#;

    #[test]
    fn test_json_keeps_document_order() {
        let rubric = Rubric::from_json_str(RUBRIC_JSON).unwrap();
        let keys: Vec<&str> = rubric.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["Quality", "Functionality", "Efficiency"]);
        assert_eq!(rubric.get("Functionality").unwrap().weight, 5.0);
        assert_eq!(rubric.total_weight(), 10.0);
    }

    #[test]
    fn test_toml_keeps_document_order() {
        let content = r#"
[Logic]
criteria = ["Handles edge cases"]
weight = 4.0

[Resources]
criteria = ["Closes files"]
weight = 6
"#;
        let rubric = Rubric::from_toml_str(content).unwrap();
        let keys: Vec<&str> = rubric.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["Logic", "Resources"]);
        assert_eq!(rubric.get("Resources").unwrap().weight, 6.0);
    }

    #[test]
    fn test_missing_weight_is_malformed() {
        let err = Rubric::from_json_str(r#"{"Quality": {"criteria": ["x"]}}"#).unwrap_err();
        assert!(matches!(
            err,
            RubricError::MissingField { ref dimension, field: "weight" } if dimension == "Quality"
        ));
    }

    #[test]
    fn test_missing_criteria_is_malformed() {
        let err = Rubric::from_json_str(r#"{"Quality": {"weight": 2.0}}"#).unwrap_err();
        assert!(matches!(err, RubricError::MissingField { field: "criteria", .. }));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = Rubric::new(vec![RubricDimension::new("A", vec![], -1.0)]).unwrap_err();
        assert!(matches!(err, RubricError::InvalidWeight { .. }));
    }

    #[test]
    fn test_empty_and_non_object_rejected() {
        assert!(matches!(Rubric::from_json_str("{}"), Err(RubricError::Empty)));
        assert!(matches!(
            Rubric::from_json_str("[1, 2]"),
            Err(RubricError::NotAnObject)
        ));
    }

    #[test]
    fn test_duplicate_dimension_rejected() {
        let err = Rubric::new(vec![
            RubricDimension::new("A", vec![], 1.0),
            RubricDimension::new("A", vec![], 2.0),
        ])
        .unwrap_err();
        assert!(matches!(err, RubricError::DuplicateDimension { .. }));
    }

    #[test]
    fn test_ensure_total() {
        let rubric = Rubric::from_json_str(RUBRIC_JSON).unwrap();
        assert!(rubric.ensure_total(10.0).is_ok());
        assert!(matches!(
            rubric.ensure_total(20.0),
            Err(RubricError::WeightSumMismatch { .. })
        ));
    }
}
