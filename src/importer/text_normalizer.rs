// ==========================================
// 参考成本引擎 - 文本规范化
// ==========================================
// 职责: 小写 + 去重音 + 空白折叠，供表头识别与搜索共用
// ==========================================

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 规范化文本：NFKD 分解后去掉组合符号，转小写，连续空白折叠为一个空格
///
/// 标点保留不动（搜索 "ii-32" 这类型号需要）
pub fn normalize_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_space = true;
    for ch in value.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
            continue;
        }
        for lower in ch.to_lowercase() {
            out.push(lower);
        }
        prev_space = false;
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// 按非字母数字切分为词（已规范化文本）
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// 纯数字外部代码（^\d+$）
pub fn is_numeric_code(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// 查询词切分：规范化后按空白切分
pub fn query_terms(query: &str) -> Vec<String> {
    normalize_text(query)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_accents_and_case() {
        assert_eq!(normalize_text("  Código   da  COMPOSIÇÃO "), "codigo da composicao");
        assert_eq!(normalize_text("Preço\u{00A0}Unitário"), "preco unitario");
        assert_eq!(normalize_text("CP II-32"), "cp ii-32");
    }

    #[test]
    fn test_tokens_split_on_punctuation() {
        let norm = normalize_text("Custo (R$) DF");
        let toks: Vec<&str> = tokens(&norm).collect();
        assert_eq!(toks, vec!["custo", "r", "df"]);
    }

    #[test]
    fn test_numeric_code() {
        assert!(is_numeric_code("87316"));
        assert!(is_numeric_code(" 00034 "));
        assert!(!is_numeric_code(""));
        assert!(!is_numeric_code("87316A"));
        assert!(!is_numeric_code("Observação"));
        assert!(!is_numeric_code("1.5"));
    }

    #[test]
    fn test_query_terms() {
        assert_eq!(query_terms("  Cimento  PORTLAND "), vec!["cimento", "portland"]);
        assert!(query_terms("   ").is_empty());
    }
}
