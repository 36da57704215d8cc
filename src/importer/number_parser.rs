// ==========================================
// 参考成本引擎 - 数值解析
// ==========================================
// 三种解析器共用；永不报错，无法解析时按 0 处理
// 支持: 前置/后置负号、货币符号、巴西格式（逗号小数点、点千分位）
// ==========================================

/// 解析报表中的数值文本
///
/// - 有逗号: 去掉所有点，逗号换成小数点（"1.234,56" → 1234.56）
/// - 无逗号且点多于一个: 去掉所有点（"1.234.567" → 1234567）
/// - 后置负号视为负数（"158,23 -" → -158.23）
/// - 单独的 "-" 或空文本 → 0
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let mut body = cleaned.as_str();
    let mut negative = false;
    if let Some(rest) = body.strip_prefix('-') {
        negative = true;
        body = rest;
    } else if let Some(rest) = body.strip_suffix('-') {
        negative = true;
        body = rest;
    }

    if body.is_empty() {
        return 0.0;
    }

    let normalized = if body.contains(',') {
        body.replace('.', "").replacen(',', ".", 1)
    } else if body.matches('.').count() > 1 {
        body.replace('.', "")
    } else {
        body.to_string()
    };

    let value = normalized.parse::<f64>().unwrap_or(0.0);
    if !value.is_finite() {
        return 0.0;
    }
    if negative {
        -value
    } else {
        value
    }
}

/// 解析可选数值：空单元格返回 None，其余按 parse_number 处理
pub fn parse_optional_number(raw: &str) -> Option<f64> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(parse_number(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brazilian_format() {
        assert_eq!(parse_number("1.234,56"), 1234.56);
        assert_eq!(parse_number("0,5"), 0.5);
        assert_eq!(parse_number("R$ 12,30"), 12.30);
    }

    #[test]
    fn test_trailing_and_leading_minus() {
        assert_eq!(parse_number("158,23 -"), -158.23);
        assert_eq!(parse_number("-7,5"), -7.5);
    }

    #[test]
    fn test_dash_and_empty_are_zero() {
        assert_eq!(parse_number("-"), 0.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("   "), 0.0);
    }

    #[test]
    fn test_plain_dot_decimal() {
        assert_eq!(parse_number("1234.56"), 1234.56);
        assert_eq!(parse_number("0.0125"), 0.0125);
    }

    #[test]
    fn test_thousands_only_grouping() {
        assert_eq!(parse_number("1.234.567"), 1_234_567.0);
    }

    #[test]
    fn test_garbage_is_zero() {
        assert_eq!(parse_number("n/d"), 0.0);
        assert_eq!(parse_number("abc,def"), 0.0);
    }

    #[test]
    fn test_optional_number() {
        assert_eq!(parse_optional_number(""), None);
        assert_eq!(parse_optional_number("0"), Some(0.0));
        assert_eq!(parse_optional_number("2,5"), Some(2.5));
    }
}
