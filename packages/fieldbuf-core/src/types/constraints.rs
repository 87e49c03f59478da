//! Field constraint flags.

use super::error::ModelError;

/// Whether a field must be present in every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    Required,
    Optional,
}

/// Sort direction of a table's sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Constraint set attached to a field.
///
/// Required and optional are mutually exclusive by construction; at most one
/// sort order can be set. Cross-field rules (sort keys must be required,
/// derived fields must be optional, ...) are checked by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Constraints {
    presence: Presence,
    sort: Option<SortOrder>,
    frequently_used: bool,
    derived: bool,
    large_list: bool,
}

impl Constraints {
    pub const fn new(presence: Presence) -> Self {
        Self {
            presence,
            sort: None,
            frequently_used: false,
            derived: false,
            large_list: false,
        }
    }

    pub const fn required() -> Self {
        Self::new(Presence::Required)
    }

    pub const fn optional() -> Self {
        Self::new(Presence::Optional)
    }

    /// Optional and derived.
    pub const fn derived() -> Self {
        Self::new(Presence::Optional).with_derived()
    }

    pub const fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort = Some(order);
        self
    }

    pub const fn with_frequently_used(mut self) -> Self {
        self.frequently_used = true;
        self
    }

    pub const fn with_derived(mut self) -> Self {
        self.derived = true;
        self
    }

    pub const fn with_large_list(mut self) -> Self {
        self.large_list = true;
        self
    }

    pub const fn presence(&self) -> Presence {
        self.presence
    }

    pub const fn is_required(&self) -> bool {
        matches!(self.presence, Presence::Required)
    }

    pub const fn is_optional(&self) -> bool {
        matches!(self.presence, Presence::Optional)
    }

    pub const fn sort_order(&self) -> Option<SortOrder> {
        self.sort
    }

    pub const fn is_sort_key(&self) -> bool {
        self.sort.is_some()
    }

    pub const fn is_frequently_used(&self) -> bool {
        self.frequently_used
    }

    pub const fn is_derived(&self) -> bool {
        self.derived
    }

    pub const fn is_large_list(&self) -> bool {
        self.large_list
    }

    /// Returns the constraint names as used in schema definitions.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = vec![match self.presence {
            Presence::Required => "required",
            Presence::Optional => "optional",
        }];
        match self.sort {
            Some(SortOrder::Ascending) => names.push("asc_sorted"),
            Some(SortOrder::Descending) => names.push("des_sorted"),
            None => {}
        }
        if self.frequently_used {
            names.push("frequently_used");
        }
        if self.derived {
            names.push("derived");
        }
        if self.large_list {
            names.push("large_list");
        }
        names
    }

    /// Parses constraint names.
    ///
    /// Exactly one of `required` / `optional` must be given, except that
    /// `derived` alone implies `optional`. At most one sort order is allowed.
    ///
    /// # Arguments
    /// * `names` - Constraint names (case-insensitive)
    ///
    /// # Returns
    /// `Result<Constraints, ModelError>` with the parsed set.
    pub fn from_names<'a, I>(names: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut presence = None;
        let mut sort = None;
        let mut frequently_used = false;
        let mut derived = false;
        let mut large_list = false;

        for raw in names {
            let name = raw.trim().to_ascii_lowercase();
            match name.as_str() {
                "required" | "optional" => {
                    let parsed = if name == "required" {
                        Presence::Required
                    } else {
                        Presence::Optional
                    };
                    if presence.replace(parsed).is_some() {
                        return Err(ModelError::ConflictingConstraints {
                            message: "exactly one of required/optional may be set".to_string(),
                        });
                    }
                }
                "asc_sorted" | "des_sorted" => {
                    let parsed = if name == "asc_sorted" {
                        SortOrder::Ascending
                    } else {
                        SortOrder::Descending
                    };
                    if sort.replace(parsed).is_some() {
                        return Err(ModelError::ConflictingConstraints {
                            message: "at most one sort order may be set".to_string(),
                        });
                    }
                }
                "frequently_used" => frequently_used = true,
                "derived" => derived = true,
                "large_list" => large_list = true,
                _ => {
                    return Err(ModelError::UnknownConstraint {
                        name: raw.to_string(),
                    })
                }
            }
        }

        let presence = match (presence, derived) {
            (Some(p), _) => p,
            (None, true) => Presence::Optional,
            (None, false) => {
                return Err(ModelError::ConflictingConstraints {
                    message: "one of required/optional must be set".to_string(),
                })
            }
        };

        Ok(Self {
            presence,
            sort,
            frequently_used,
            derived,
            large_list,
        })
    }
}
