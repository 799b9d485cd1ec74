use serde::{Serialize, Serializer};

/// One field of a partial update.
///
/// Update endpoints treat "field absent" and "field set to null" differently:
/// an absent field is left untouched, a null field is cleared. `Patch` keeps
/// the three states apart at the type level.
///
/// Used with `#[serde(default, skip_serializing_if = "Patch::is_unchanged")]`
/// so that `Unchanged` never reaches the wire.
///
/// # Example
///
/// ```
/// use contract_sdk::{ContractUpdate, Patch};
///
/// let update = ContractUpdate {
///     title: Patch::Set("Master Services Agreement".to_string()),
///     description: Patch::Clear,
///     ..Default::default()
/// };
///
/// let body = serde_json::to_value(&update).unwrap();
/// assert_eq!(body["title"], "Master Services Agreement");
/// assert!(body["description"].is_null());
/// assert!(body.get("value").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    /// Leave the field as it is (omitted from the request).
    #[default]
    Unchanged,
    /// Clear the field (sent as `null`).
    Clear,
    /// Replace the field with a new value.
    Set(T),
}

impl<T> Patch<T> {
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    #[must_use]
    pub const fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }

    /// Returns the new value if this patch sets one.
    #[must_use]
    pub const fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Self::Set(value)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Set(value) => value.serialize(serializer),
            Self::Unchanged | Self::Clear => serializer.serialize_none(),
        }
    }
}

/// Sort direction for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
