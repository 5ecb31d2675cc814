//! Identifier utilities for generated code.
//!
//! Schema names are XML NCNames (`street-address`, `xml.lang`, `Item_1`), which
//! are not valid Rust identifiers in general. Everything the generator emits goes
//! through one of the conversions here:
//!
//! - [`safe_identifier`] for type names (PascalCase, separators dropped)
//! - [`field_name`] for struct fields and methods (snake_case, keywords escaped)
//! - [`AnonymousNames`] for types that have no name in the schema at all

use std::collections::{HashMap, HashSet};

/// Prefix of every type name the allocator hands out for unnamed schema types.
pub const ANON_PREFIX: &str = "Txsd";

/// Prefix of generator-internal holder types (attribute, element, group holders).
pub const ID_PREFIX: &str = "XsdGen";

/// Holder types for attributes and attribute groups. These never get walkers.
pub const ATTR_HOLDER_PREFIX: &str = "XsdGenHasAtt";

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
    "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be written as raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// Whether a declared type name was produced by the generator rather than the schema author.
pub fn is_generated_name(name: &str) -> bool {
    name.starts_with(ANON_PREFIX) || name.starts_with(ID_PREFIX)
}

/// Convert an XML name to a PascalCase Rust type identifier.
///
/// Any character that is not alphanumeric acts as a word separator and is dropped.
/// The first letter of every word is uppercased, the rest is preserved as written.
///
/// # Examples
/// ```
/// use xsdgen_core::naming::safe_identifier;
/// assert_eq!(safe_identifier("address"), "Address");
/// assert_eq!(safe_identifier("street-name"), "StreetName");
/// assert_eq!(safe_identifier("xml.lang"), "XmlLang");
/// assert_eq!(safe_identifier("ObjectMeta"), "ObjectMeta");
/// assert_eq!(safe_identifier("3d"), "N3d");
/// ```
pub fn safe_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if word_start {
                result.extend(c.to_uppercase());
            } else {
                result.push(c);
            }
            word_start = false;
        } else {
            word_start = true;
        }
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, 'N');
    }
    result
}

/// Convert PascalCase, camelCase or separated names to snake_case
///
/// Runs of capitals are kept together as one word (`HTTPProxy` becomes `http_proxy`).
///
/// # Examples
/// ```
/// use xsdgen_core::naming::to_snake_case;
/// assert_eq!(to_snake_case("StreetName"), "street_name");
/// assert_eq!(to_snake_case("street-name"), "street_name");
/// assert_eq!(to_snake_case("HTTPProxy"), "http_proxy");
/// assert_eq!(to_snake_case("TxsdAddress1"), "txsd_address1");
/// ```
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
        }
        result.extend(c.to_lowercase());
    }
    while result.ends_with('_') {
        result.pop();
    }
    result
}

/// snake_case identifier for a struct field or method, with Rust keywords escaped.
///
/// # Examples
/// ```
/// use xsdgen_core::naming::field_name;
/// assert_eq!(field_name("streetName"), "street_name");
/// assert_eq!(field_name("type"), "r#type");
/// assert_eq!(field_name("self"), "self_");
/// assert_eq!(field_name("2nd"), "n2nd");
/// ```
pub fn field_name(name: &str) -> String {
    let mut snake = to_snake_case(name);
    if snake.starts_with(|c: char| c.is_ascii_digit()) {
        snake.insert(0, 'n');
    }
    if NON_RAW_KEYWORDS.contains(&snake.as_str()) {
        snake.push('_');
        snake
    } else if RUST_KEYWORDS.contains(&snake.as_str()) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

/// Allocator of collision-free names for anonymous schema types.
///
/// The first request for a base yields `Txsd<Base>`, every later request for the
/// same base appends the next counter value (`Txsd<Base>1`, `Txsd<Base>2`, ...).
/// Counters never go backwards and every issued name is remembered, so a name is
/// handed out at most once even when two bases would produce the same text
/// (`a` twice vs `a1` once).
#[derive(Debug, Default)]
pub struct AnonymousNames {
    counts: HashMap<String, u64>,
    issued: HashSet<String>,
}

impl AnonymousNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, base: &str) -> String {
        let name = format!("{}{}", ANON_PREFIX, safe_identifier(base));
        let count = self.counts.entry(name.clone()).or_insert(0);
        loop {
            let candidate = if *count > 0 {
                format!("{}{}", name, count)
            } else {
                name.clone()
            };
            *count += 1;
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
