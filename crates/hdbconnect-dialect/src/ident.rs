//! Identifier case folding and quoting.
//!
//! HANA stores unquoted identifiers upper-case. Hosts work with lower-case
//! names for case-insensitive objects, so names coming from the catalog
//! are normalized (`EMPLOYEES` -> `employees`) and names going to the
//! catalog are denormalized (`employees` -> `EMPLOYEES`). Names that only
//! exist in lower case on the server are carried as quoted identifiers.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

/// HANA reserved words (lower-case).
pub const RESERVED_WORDS: &[&str] = &[
    "all",
    "alter",
    "as",
    "before",
    "begin",
    "both",
    "case",
    "char",
    "condition",
    "connect",
    "cross",
    "cube",
    "current_connection",
    "current_date",
    "current_schema",
    "current_time",
    "current_timestamp",
    "current_transaction_isolation_level",
    "current_user",
    "current_utcdate",
    "current_utctime",
    "current_utctimestamp",
    "currval",
    "cursor",
    "declare",
    "distinct",
    "else",
    "elseif",
    "end",
    "except",
    "exception",
    "exec",
    "false",
    "for",
    "from",
    "full",
    "group",
    "having",
    "if",
    "in",
    "inner",
    "inout",
    "intersect",
    "into",
    "is",
    "join",
    "leading",
    "left",
    "limit",
    "loop",
    "minus",
    "natural",
    "nchar",
    "nextval",
    "null",
    "on",
    "order",
    "out",
    "prior",
    "return",
    "returns",
    "reverse",
    "right",
    "rollup",
    "rowid",
    "select",
    "session_user",
    "set",
    "sql",
    "start",
    "sysuuid",
    "table",
    "tablesample",
    "top",
    "trailing",
    "true",
    "union",
    "unknown",
    "using",
    "utctimestamp",
    "values",
    "when",
    "where",
    "while",
    "with",
];

/// A name plus its quoting disposition.
///
/// `From<&str>` produces an unquoted identifier; use [`Identifier::quoted`]
/// for names that must keep their exact case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Identifier {
    name: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    quoted: bool,
}

impl Identifier {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: false,
        }
    }

    /// An identifier that is always emitted inside double quotes.
    #[must_use]
    pub fn quoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoted: true,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_quoted(&self) -> bool {
        self.quoted
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.name
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&Self> for Identifier {
    fn from(ident: &Self) -> Self {
        ident.clone()
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.name == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.name == *other
    }
}

/// Case folding and quoting rules over a reserved-word set.
#[derive(Debug, Clone)]
pub struct IdentifierNormalizer {
    reserved: HashSet<String>,
}

impl IdentifierNormalizer {
    /// Normalizer over the built-in reserved words.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reserved: RESERVED_WORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }

    /// Add reserved words on top of the built-in set.
    #[must_use]
    pub fn with_reserved_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reserved
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    #[must_use]
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(&name.to_lowercase())
    }

    /// Whether `name` cannot be written as a bare identifier.
    #[must_use]
    pub fn requires_quoting(&self, name: &str) -> bool {
        name.is_empty()
            || name.starts_with(|c: char| c.is_ascii_digit())
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            || self.is_reserved(name)
    }

    /// Catalog name -> host identifier.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> Identifier {
        let lower = raw.to_lowercase();
        if raw.to_uppercase() == raw && !self.requires_quoting(&lower) {
            Identifier::new(lower)
        } else if lower == raw {
            Identifier::quoted(raw)
        } else {
            Identifier::new(raw)
        }
    }

    /// Null-propagating [`Self::normalize`].
    #[must_use]
    pub fn normalize_opt(&self, raw: Option<&str>) -> Option<Identifier> {
        raw.map(|r| self.normalize(r))
    }

    /// Host identifier -> catalog name.
    #[must_use]
    pub fn denormalize(&self, ident: &Identifier) -> String {
        let name = ident.as_str();
        if !ident.is_quoted() && name.to_lowercase() == name && !self.requires_quoting(name) {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }

    /// Whether the compiler must wrap `ident` in double quotes.
    #[must_use]
    pub fn needs_quotes(&self, ident: &Identifier) -> bool {
        let name = ident.as_str();
        ident.is_quoted() || self.requires_quoting(name) || name.to_lowercase() != name
    }

    /// Render `ident` for inclusion in SQL text.
    #[must_use]
    pub fn quote(&self, ident: &Identifier) -> String {
        if self.needs_quotes(ident) {
            format!("\"{}\"", ident.as_str().replace('"', "\"\""))
        } else {
            ident.as_str().to_string()
        }
    }
}

impl Default for IdentifierNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> IdentifierNormalizer {
        IdentifierNormalizer::new()
    }

    #[test]
    fn test_reserved_word_count() {
        assert_eq!(RESERVED_WORDS.len(), 82);
        assert!(normalizer().is_reserved("SELECT"));
        assert!(normalizer().is_reserved("current_user"));
        assert!(!normalizer().is_reserved("employees"));
    }

    #[test]
    fn test_requires_quoting() {
        let n = normalizer();
        assert!(n.requires_quoting("my table"));
        assert!(n.requires_quoting("1st"));
        assert!(n.requires_quoting("order"));
        assert!(n.requires_quoting("a-b"));
        assert!(!n.requires_quoting("employees"));
        assert!(!n.requires_quoting("EMP_2024"));
    }

    #[test]
    fn test_normalize_upper_case() {
        let ident = normalizer().normalize("EMPLOYEES");
        assert_eq!(ident, "employees");
        assert!(!ident.is_quoted());
    }

    #[test]
    fn test_normalize_lower_case_is_quoted() {
        let ident = normalizer().normalize("employees");
        assert_eq!(ident, "employees");
        assert!(ident.is_quoted());
    }

    #[test]
    fn test_normalize_mixed_case_unchanged() {
        let ident = normalizer().normalize("MixedCase");
        assert_eq!(ident, "MixedCase");
        assert!(!ident.is_quoted());
    }

    #[test]
    fn test_normalize_reserved_upper_case_stays() {
        let ident = normalizer().normalize("ORDER");
        assert_eq!(ident, "ORDER");
        assert!(!ident.is_quoted());
    }

    #[test]
    fn test_normalize_opt() {
        assert_eq!(normalizer().normalize_opt(None), None);
        assert_eq!(
            normalizer().normalize_opt(Some("ID")),
            Some(Identifier::new("id"))
        );
    }

    #[test]
    fn test_denormalize() {
        let n = normalizer();
        assert_eq!(n.denormalize(&Identifier::new("employees")), "EMPLOYEES");
        assert_eq!(n.denormalize(&Identifier::new("MixedCase")), "MixedCase");
        assert_eq!(n.denormalize(&Identifier::new("order")), "order");
        assert_eq!(n.denormalize(&Identifier::quoted("employees")), "employees");
    }

    #[test]
    fn test_round_trip_upper_case_names() {
        let n = normalizer();
        for raw in ["EMPLOYEES", "ID", "DEPT_NO", "T1", "SYS_TABLE_9"] {
            let ident = n.normalize(raw);
            assert_eq!(ident.as_str(), raw.to_lowercase());
            assert_eq!(n.denormalize(&ident), raw);
        }
    }

    #[test]
    fn test_round_trip_lower_case_names() {
        let n = normalizer();
        for raw in ["employees", "camel_lower", "x"] {
            let ident = n.normalize(raw);
            assert!(ident.is_quoted());
            assert_eq!(n.denormalize(&ident), raw);
        }
    }

    #[test]
    fn test_quote() {
        let n = normalizer();
        assert_eq!(n.quote(&Identifier::new("employees")), "employees");
        assert_eq!(n.quote(&Identifier::new("Employees")), "\"Employees\"");
        assert_eq!(n.quote(&Identifier::new("order")), "\"order\"");
        assert_eq!(n.quote(&Identifier::new("my table")), "\"my table\"");
        assert_eq!(n.quote(&Identifier::quoted("lower")), "\"lower\"");
        assert_eq!(n.quote(&Identifier::new("say\"hi")), "\"say\"\"hi\"");
    }

    #[test]
    fn test_extra_reserved_words() {
        let n = normalizer().with_reserved_words(["Window"]);
        assert!(n.requires_quoting("window"));
        assert_eq!(n.quote(&Identifier::new("window")), "\"window\"");
    }
}
