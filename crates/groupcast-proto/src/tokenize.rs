//! Field splitting for protocol lines.

/// Separator between fields of a protocol line.
pub const FIELD_SEPARATOR: char = ',';

/// Leading marker that distinguishes group names from client names.
pub const GROUP_PREFIX: char = '@';

/// Split a line into its comma-separated fields.
///
/// Interior empty fields are preserved, trailing empty fields are dropped.
/// A line consisting only of separators therefore yields no fields at all,
/// while an empty line yields a single empty field.
///
/// ```rust
/// use groupcast_proto::tokenize;
///
/// assert_eq!(tokenize("MSG,bob,hi"), vec!["MSG", "bob", "hi"]);
/// assert_eq!(tokenize("MSG,bob,,"), vec!["MSG", "bob"]);
/// assert_eq!(tokenize("NAME,,x"), vec!["NAME", "", "x"]);
/// assert!(tokenize(",,,").is_empty());
/// ```
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if line.is_empty() {
        return fields;
    }
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}
