//! Brace-balanced extraction of method and class bodies from PHP source text.
//!
//! These are pattern scans, not a PHP parser: a header is located with a regex
//! and its body runs to the matching closing brace. String literals and
//! comments are skipped while counting braces.

use regex::Regex;

/// A `public static function` definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody<'s> {
    pub name: String,

    /// Text between the braces
    pub body: &'s str,

    /// Byte offset of `body` within the file
    pub offset: usize,
}

/// A class definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBody<'s> {
    pub name: String,

    /// Base class as written after `extends`
    pub extends: Option<String>,

    pub body: &'s str,
}

/// 1-indexed line and column of a byte offset
pub fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

/// Index of the `}` matching the `{` at `open`
pub fn matching_brace(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line(bytes, i),
            b'#' if bytes.get(i + 1) != Some(&b'[') => i = skip_line(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = match src[i + 2..].find("*/") {
                    Some(end) => i + 2 + end + 1,
                    None => return None,
                };
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn skip_line(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    i
}

/// All `public static function <name>(...)` definitions in `src`
pub fn find_static_methods<'s>(src: &'s str, name: &str) -> Vec<MethodBody<'s>> {
    let pattern = format!(
        r"public\s+static\s+function\s+({})\s*\([^)]*\)\s*(?::\s*\??[\w\\]+\s*)?\{{",
        regex::escape(name)
    );
    collect_methods(src, &pattern)
}

/// All `public static function <anything><suffix>(...)` definitions in `src`
pub fn find_static_methods_with_suffix<'s>(src: &'s str, suffix: &str) -> Vec<MethodBody<'s>> {
    let pattern = format!(
        r"public\s+static\s+function\s+(\w+{})\s*\([^)]*\)\s*(?::\s*\??[\w\\]+\s*)?\{{",
        regex::escape(suffix)
    );
    collect_methods(src, &pattern)
}

fn collect_methods<'s>(src: &'s str, pattern: &str) -> Vec<MethodBody<'s>> {
    let Ok(re) = Regex::new(pattern) else {
        return Vec::new();
    };

    re.captures_iter(src)
        .filter_map(|caps| {
            let header = caps.get(0)?;
            let open = header.end() - 1;
            let close = matching_brace(src, open)?;
            Some(MethodBody {
                name: caps[1].to_string(),
                body: &src[open + 1..close],
                offset: open + 1,
            })
        })
        .collect()
}

/// All definitions of class `name` in `src`
pub fn find_class<'s>(src: &'s str, name: &str) -> Vec<ClassBody<'s>> {
    let pattern = format!(
        r"(?m)^\s*(?:abstract\s+|final\s+)?class\s+({})\b(?:\s+extends\s+([\w\\]+))?(?:\s+implements\s+[\w\\,\s]+?)?\s*\{{",
        regex::escape(name)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    re.captures_iter(src)
        .filter_map(|caps| {
            let header = caps.get(0)?;
            let open = header.end() - 1;
            let close = matching_brace(src, open)?;
            Some(ClassBody {
                name: caps[1].to_string(),
                extends: caps.get(2).map(|m| m.as_str().to_string()),
                body: &src[open + 1..close],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = r#"<?php
class slots_get_slot extends external_api {
    /**
     * Parameters for get_slot.
     * @return external_function_parameters
     */
    public static function get_slot_parameters(): external_function_parameters {
        return new external_function_parameters([
            'slotid' => new external_value(PARAM_INT, 'ID of the {slot}'),
        ]);
    }

    public static function get_slot(int $slotid): array {
        if ($slotid < 0) { throw new \Exception('}'); }
        return [];
    }

    public static function get_slot_returns() {
        return slot::api_structure(); // }
    }
}
"#;

    #[test]
    fn test_line_col() {
        let src = "ab\ncd\nef";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 4), (2, 2));
        assert_eq!(line_col(src, 100), (3, 3));
    }

    #[test]
    fn test_matching_brace_skips_strings_and_comments() {
        let src = "{ '}' \"}\" // }\n /* } */ { } }";
        assert_eq!(matching_brace(src, 0), Some(src.len() - 1));
        assert_eq!(matching_brace("{ {", 0), None);
        assert_eq!(matching_brace("x", 0), None);
    }

    #[test]
    fn test_find_static_method_with_return_type() {
        let found = find_static_methods(SERVICE, "get_slot_parameters");
        assert_eq!(found.len(), 1);
        assert!(found[0].body.trim().starts_with("return new external_function_parameters(["));
        assert!(found[0].body.trim_end().ends_with("]);"));
        assert_eq!(&SERVICE[found[0].offset..found[0].offset + 1], "\n");
    }

    #[test]
    fn test_find_static_method_exact_name() {
        let found = find_static_methods(SERVICE, "get_slot");
        assert_eq!(found.len(), 1);
        assert!(found[0].body.contains("throw new"));
    }

    #[test]
    fn test_find_by_suffix() {
        let found = find_static_methods_with_suffix(SERVICE, "_returns");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "get_slot_returns");
        assert_eq!(found[0].body.trim(), "return slot::api_structure(); // }");
    }

    #[test]
    fn test_find_class() {
        let src = "<?php\nclass KANBANCOL_TYPE_ORNONE extends KANBANCOL_TYPE {\n    const NONE = '';\n}\n";
        let classes = find_class(src, "KANBANCOL_TYPE_ORNONE");
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].extends.as_deref(), Some("KANBANCOL_TYPE"));
        assert_eq!(classes[0].body.trim(), "const NONE = '';");

        assert!(find_class(src, "KANBANCOL_TYPE").is_empty());
    }
}
