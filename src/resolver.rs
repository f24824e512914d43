//! Picks one version out of a candidate set from a user-typed prefix.

/// Resolves `query` against `candidates`.
///
/// Candidates are sorted with plain string ordering, not semver ordering, and
/// the first one starting with `query` wins. An ambiguous prefix therefore
/// resolves to the lexicographically smallest match: `"7"` against
/// `7.0`, `7.10`, `7.2` yields `7.0`, and `7.10` sorts before `7.9`.
///
/// ```
/// use pvm::resolver::resolve;
///
/// let candidates = ["7.2", "7.10", "7.0"];
/// assert_eq!(resolve("7", candidates).as_deref(), Some("7.0"));
/// assert_eq!(resolve("9", candidates), None);
/// ```
pub fn resolve<I, S>(query: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = candidates
        .into_iter()
        .map(|c| c.as_ref().to_string())
        .collect();
    sorted.sort();
    sorted.into_iter().find(|c| c.starts_with(query))
}
