//! 编程语言表
//!
//! 扩展名 -> 语言显示名，用于填充 `<PLANGUAGE>` 标签

use phf::phf_map;

static LANGUAGES: phf::Map<&'static str, &'static str> = phf_map! {
    "c" => "C",
    "cpp" => "C++",
    "cc" => "C++",
    "java" => "Java",
    "py" => "Python",
    "js" => "JavaScript",
    "ts" => "TypeScript",
    "go" => "Go",
    "rs" => "Rust",
};

/// 按扩展名获取语言显示名
pub fn display_name(extension: &str) -> Option<&'static str> {
    LANGUAGES.get(extension.to_ascii_lowercase().as_str()).copied()
}
