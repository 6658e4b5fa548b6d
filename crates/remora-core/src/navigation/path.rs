//! Field paths with version aliases.

use std::fmt;

use smallvec::SmallVec;

/// Candidate names for one logical field.
///
/// Binary layouts drift between versions of the debuggee: a field is renamed,
/// or moved into a nested struct. A `FieldPath` lists every known spelling;
/// resolution commits to the first candidate whose first segment exists on
/// the type. Candidates may be dotted (`"data.boxReference.m_pT"`), and each
/// segment dereferences pointers on the way.
///
/// Almost every path has one or two candidates, so they are stored inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath
{
    candidates: SmallVec<[String; 2]>,
}

impl FieldPath
{
    /// Path from explicit candidates, in priority order.
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// Candidates in priority order.
    pub fn candidates(&self) -> &[String]
    {
        &self.candidates
    }

    /// `true` when there is nothing to resolve.
    pub fn is_empty(&self) -> bool
    {
        self.candidates.is_empty()
    }
}

/// First segment of a dotted candidate.
pub(crate) fn first_segment(candidate: &str) -> &str
{
    candidate.split('.').next().unwrap_or(candidate)
}

impl From<&str> for FieldPath
{
    fn from(candidate: &str) -> Self
    {
        Self::new([candidate])
    }
}

impl From<String> for FieldPath
{
    fn from(candidate: String) -> Self
    {
        Self::new([candidate])
    }
}

impl<const N: usize> From<[&str; N]> for FieldPath
{
    fn from(candidates: [&str; N]) -> Self
    {
        Self::new(candidates)
    }
}

impl From<&[&str]> for FieldPath
{
    fn from(candidates: &[&str]) -> Self
    {
        Self::new(candidates.iter().copied())
    }
}

impl From<Vec<String>> for FieldPath
{
    fn from(candidates: Vec<String>) -> Self
    {
        Self::new(candidates)
    }
}

impl From<&FieldPath> for FieldPath
{
    fn from(path: &FieldPath) -> Self
    {
        path.clone()
    }
}

impl fmt::Display for FieldPath
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.candidates.join(" | "))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_conversions_keep_order()
    {
        let path = FieldPath::from(["boxItem", "flowItem"]);
        assert_eq!(path.candidates(), ["boxItem", "flowItem"]);
        assert_eq!(path.to_string(), "boxItem | flowItem");
        assert_eq!(FieldPath::from("next").candidates().len(), 1);
    }

    #[test]
    fn test_first_segment()
    {
        assert_eq!(first_segment("data.next"), "data");
        assert_eq!(first_segment("next"), "next");
    }
}
