//! Rewrites of binaryen-generated identifiers that the `wat` parser rejects.
//!
//! AssemblyScript names generic instantiations after their type arguments, so the emitted text
//! contains identifiers like `$~lib/map/Map<usize,u32>#get` or `Uint8Array | null`. Commas and
//! spaces are not valid identifier characters for a strict WAT parser. These are point fixes for
//! the names the keccak builds actually produce, not a general identifier sanitizer.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

struct Rule {
    pattern: &'static str,
    replacement: &'static str,
}

const RULES: [Rule; 3] = [
    Rule {
        pattern: r"Uint\d+Array,",
        replacement: "Uint64Array",
    },
    Rule {
        pattern: r"Map<usize,",
        replacement: "Map<usize",
    },
    Rule {
        pattern: r"Uint\d+Array \| null",
        replacement: "UintArrayOrNull",
    },
];

fn compiled() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|rule| Regex::new(rule.pattern).expect("normalize rule regex"))
            .collect()
    })
}

/// Apply every rule in order. Returns the input unchanged (borrowed) when nothing matched.
///
/// A second pass is a no-op as long as each separator appears once, which is all binaryen emits.
/// Doubled separators (`Map<usize,,u32>`) lose one comma per pass.
pub fn normalize(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);
    for (re, rule) in compiled().iter().zip(RULES.iter()) {
        let replaced = match re.replace_all(&out, rule.replacement) {
            Cow::Owned(replaced) => Some(replaced),
            Cow::Borrowed(_) => None,
        };
        if let Some(replaced) = replaced {
            out = Cow::Owned(replaced);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"(module
 (type $i32_i32_=>_none (func (param i32 i32)))
 (func $~lib/typedarray/Uint8Array,u32>#constructor (param $0 i32) (result i32)
 (func $~lib/map/Map<usize,u32>#get (param $0 i32) (param $1 i32) (result i32)
 (func $assembly/main/read (param $0 Uint32Array | null)
 (func $assembly/main/plain (param $0 i32)
)
"#;

    #[test]
    fn rewrites_each_known_quirk() {
        let out = normalize(SAMPLE);
        assert!(out.contains("$~lib/typedarray/Uint64Arrayu32>#constructor"));
        assert!(out.contains("$~lib/map/Map<usizeu32>#get"));
        assert!(out.contains("(param $0 UintArrayOrNull)"));
        assert!(!out.contains("Array,"));
        assert!(!out.contains("Map<usize,"));
        assert!(!out.contains("| null"));
    }

    #[test]
    fn second_pass_is_a_no_op_for_compiler_output() {
        let once = normalize(SAMPLE).into_owned();
        let twice = normalize(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn doubled_separators_lose_one_comma_per_pass() {
        let once = normalize("$~lib/map/Map<usize,,u32>#get").into_owned();
        assert_eq!(once, "$~lib/map/Map<usize,u32>#get");
        assert_eq!(normalize(&once), "$~lib/map/Map<usizeu32>#get");
    }

    #[test]
    fn leaves_clean_input_borrowed() {
        let clean = "(module\n (func $add (param i32 i32) (result i32))\n)\n";
        assert!(matches!(normalize(clean), Cow::Borrowed(s) if s == clean));
    }
}
