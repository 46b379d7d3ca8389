//! 测量代码分类：把 `kb3` 这样的原始代码拆成基础代码与序号，再按要素库判定类型。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::feature::{CodeLookup, FeatureKind};
use crate::survey::Sequence;

/// 字母开头、字母结尾的基础代码，后接可选的尾部数字序号。
static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z]+[a-z_A-Z0-9]*[a-zA-Z])(\d+)?$").expect("code pattern is valid")
});

/// 代码拆分结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeToken<'a> {
    Matched {
        base: &'a str,
        differentiator: Option<u64>,
    },
    Unmatched,
}

/// 纯函数：仅按语法拆分代码，不查询要素库。
pub fn split_code(token: &str) -> CodeToken<'_> {
    let Some(captures) = CODE_PATTERN.captures(token) else {
        return CodeToken::Unmatched;
    };
    let Some(base) = captures.get(1) else {
        return CodeToken::Unmatched;
    };
    let differentiator = match captures.get(2) {
        Some(digits) => match digits.as_str().parse::<u64>() {
            Ok(value) => Some(value),
            // 序号超出范围时视为语法不匹配
            Err(_) => return CodeToken::Unmatched,
        },
        None => None,
    };
    CodeToken::Matched {
        base: base.as_str(),
        differentiator,
    }
}

/// 代码同时出现在点表与线表时采用的优先级。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePrecedence {
    /// 点要素优先（与既有数据处理习惯一致）。
    #[default]
    Point,
    Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCode {
    pub base_code: String,
    pub kind: FeatureKind,
    pub sequence: Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// 语法匹配；`kind` 可能为 `Unknown`（两张表都未收录）。
    Matched(ClassifiedCode),
    /// 语法不匹配，调用方自行归入未分类桶。
    Unmatched,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeClassifier {
    precedence: CodePrecedence,
}

impl CodeClassifier {
    pub fn new(precedence: CodePrecedence) -> Self {
        Self { precedence }
    }

    pub fn classify<L>(&self, token: &str, lookup: &L) -> Classification
    where
        L: CodeLookup + ?Sized,
    {
        let CodeToken::Matched {
            base,
            differentiator,
        } = split_code(token)
        else {
            return Classification::Unmatched;
        };

        let kind = match (lookup.is_line_code(base), lookup.is_point_code(base)) {
            (true, true) => match self.precedence {
                CodePrecedence::Point => FeatureKind::Point,
                CodePrecedence::Line => FeatureKind::Line,
            },
            (true, false) => FeatureKind::Line,
            (false, true) => FeatureKind::Point,
            (false, false) => FeatureKind::Unknown,
        };

        let sequence = match (differentiator, kind) {
            (Some(value), _) => Sequence::Explicit(value),
            (None, FeatureKind::Line) => Sequence::Continuous,
            (None, _) => Sequence::Unset,
        };

        Classification::Matched(ClassifiedCode {
            base_code: base.to_string(),
            kind,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Tables {
        lines: HashSet<&'static str>,
        points: HashSet<&'static str>,
    }

    impl CodeLookup for Tables {
        fn is_line_code(&self, code: &str) -> bool {
            self.lines.contains(code)
        }

        fn is_point_code(&self, code: &str) -> bool {
            self.points.contains(code)
        }
    }

    fn tables() -> Tables {
        Tables {
            lines: HashSet::from(["kb", "wmf_fm", "tp"]),
            points: HashSet::from(["bm", "wmf_av", "tp"]),
        }
    }

    fn matched(result: Classification) -> ClassifiedCode {
        match result {
            Classification::Matched(code) => code,
            Classification::Unmatched => panic!("expected a grammar match"),
        }
    }

    #[test]
    fn split_separates_trailing_digits() {
        assert_eq!(
            split_code("kb3"),
            CodeToken::Matched {
                base: "kb",
                differentiator: Some(3)
            }
        );
        assert_eq!(
            split_code("bb"),
            CodeToken::Matched {
                base: "bb",
                differentiator: None
            }
        );
        assert_eq!(
            split_code("wmf_bm12"),
            CodeToken::Matched {
                base: "wmf_bm",
                differentiator: Some(12)
            }
        );
        assert_eq!(
            split_code("a1b2"),
            CodeToken::Matched {
                base: "a1b",
                differentiator: Some(2)
            }
        );
    }

    #[test]
    fn split_rejects_tokens_outside_grammar() {
        assert_eq!(split_code(""), CodeToken::Unmatched);
        assert_eq!(split_code("k"), CodeToken::Unmatched);
        assert_eq!(split_code("12"), CodeToken::Unmatched);
        assert_eq!(split_code("_kb"), CodeToken::Unmatched);
        assert_eq!(split_code("kb-1"), CodeToken::Unmatched);
        assert_eq!(split_code("kb99999999999999999999"), CodeToken::Unmatched);
    }

    #[test]
    fn explicit_digits_become_sequence() {
        let classifier = CodeClassifier::default();
        let tables = tables();
        for (token, base, kind, seq) in [
            ("kb1", "kb", FeatureKind::Line, 1),
            ("kb2", "kb", FeatureKind::Line, 2),
            ("bm7", "bm", FeatureKind::Point, 7),
            ("xyz123", "xyz", FeatureKind::Unknown, 123),
        ] {
            let code = matched(classifier.classify(token, &tables));
            assert_eq!(code.base_code, base);
            assert_eq!(code.kind, kind);
            assert_eq!(code.sequence, Sequence::Explicit(seq));
        }
    }

    #[test]
    fn missing_digits_default_by_kind() {
        let classifier = CodeClassifier::default();
        let tables = tables();

        let line = matched(classifier.classify("kb", &tables));
        assert_eq!(line.kind, FeatureKind::Line);
        assert_eq!(line.sequence, Sequence::Continuous);

        let point = matched(classifier.classify("bm", &tables));
        assert_eq!(point.kind, FeatureKind::Point);
        assert_eq!(point.sequence, Sequence::Unset);

        let unknown = matched(classifier.classify("xyz", &tables));
        assert_eq!(unknown.kind, FeatureKind::Unknown);
        assert_eq!(unknown.sequence, Sequence::Unset);
    }

    #[test]
    fn precedence_decides_codes_in_both_tables() {
        let tables = tables();

        let by_point = matched(CodeClassifier::new(CodePrecedence::Point).classify("tp", &tables));
        assert_eq!(by_point.kind, FeatureKind::Point);
        assert_eq!(by_point.sequence, Sequence::Unset);

        let by_line = matched(CodeClassifier::new(CodePrecedence::Line).classify("tp", &tables));
        assert_eq!(by_line.kind, FeatureKind::Line);
        assert_eq!(by_line.sequence, Sequence::Continuous);
    }

    #[test]
    fn long_digit_runs_stay_explicit_sequences() {
        assert_eq!(
            split_code("kb99999999999"),
            CodeToken::Matched {
                base: "kb",
                differentiator: Some(99_999_999_999)
            }
        );
        let code = matched(CodeClassifier::default().classify("kb99999999999", &tables()));
        assert_eq!(code.base_code, "kb");
        assert_eq!(code.kind, FeatureKind::Line);
        assert_eq!(code.sequence, Sequence::Explicit(99_999_999_999));
        assert_eq!(code.sequence.label_suffix(), "99999999999");
    }

    #[test]
    fn unmatched_and_unknown_are_reported() {
        let classifier = CodeClassifier::default();
        let tables = tables();

        assert_eq!(classifier.classify("9kb", &tables), Classification::Unmatched);

        let unknown = matched(classifier.classify("xyz123", &tables));
        assert_eq!(unknown.kind, FeatureKind::Unknown);

        assert_eq!(matched(classifier.classify("kb4", &tables)).kind, FeatureKind::Line);
    }
}
