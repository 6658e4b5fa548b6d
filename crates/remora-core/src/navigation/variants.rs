//! Closed classification of runtime type names.

/// Result of classifying a runtime type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant<T>
{
    /// The name matched one of the registered rules.
    Known(T),
    /// No rule matched; carries the name that was seen.
    Unrecognized(String),
}

impl<T> Variant<T>
{
    /// The tag, if the name was recognized.
    pub fn known(self) -> Option<T>
    {
        match self {
            Self::Known(tag) => Some(tag),
            Self::Unrecognized(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher
{
    Exact(String),
    Containing(String),
}

impl Matcher
{
    fn matches(&self, name: &str) -> bool
    {
        match self {
            Self::Exact(expected) => name == expected,
            Self::Containing(fragment) => name.contains(fragment.as_str()),
        }
    }
}

/// Maps runtime type names onto a closed set of caller-defined tags.
///
/// Rules are tried in registration order; the first match wins. A name that
/// matches nothing classifies as [`Variant::Unrecognized`], so callers always
/// handle the unknown case explicitly.
///
/// ```rust
/// use remora_core::navigation::{TypeVariants, Variant};
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum Item { Box, Inline }
///
/// let variants = TypeVariants::new()
///     .exact("Layout::PositionedBoxItem", Item::Box)
///     .containing("InlineLayout", Item::Inline);
///
/// assert_eq!(variants.classify("Layout::PositionedBoxItem"), Variant::Known(Item::Box));
/// assert_eq!(variants.classify("Layout::PositionedInlineLayoutItem"), Variant::Known(Item::Inline));
/// assert_eq!(variants.classify("Other"), Variant::Unrecognized("Other".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct TypeVariants<T>
{
    rules: Vec<(Matcher, T)>,
}

impl<T> Default for TypeVariants<T>
{
    fn default() -> Self
    {
        Self { rules: Vec::new() }
    }
}

impl<T: Clone> TypeVariants<T>
{
    /// No rules yet.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Match a type name exactly.
    #[must_use]
    pub fn exact(mut self, type_name: impl Into<String>, tag: T) -> Self
    {
        self.rules.push((Matcher::Exact(type_name.into()), tag));
        self
    }

    /// Match any type name containing `fragment`.
    #[must_use]
    pub fn containing(mut self, fragment: impl Into<String>, tag: T) -> Self
    {
        self.rules.push((Matcher::Containing(fragment.into()), tag));
        self
    }

    /// Classify `type_name`.
    pub fn classify(&self, type_name: &str) -> Variant<T>
    {
        self.rules
            .iter()
            .find(|(matcher, _)| matcher.matches(type_name))
            .map_or_else(|| Variant::Unrecognized(type_name.to_string()), |(_, tag)| Variant::Known(tag.clone()))
    }
}
