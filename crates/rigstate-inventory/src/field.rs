//! Three-state attribute values
//!
//! A record field is either never observed ([`Field::Absent`]) or observed
//! ([`Field::Present`]). An observed string may still be blank: that means
//! "known but empty" and keeps the field open for a later, better reading.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Payloads that can carry a "known but blank" reading
pub trait Blank {
    /// `true` when the payload holds no information
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

/// A record attribute that is absent or present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Never observed
    Absent,
    /// Observed; the payload may be blank
    Present(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    /// `true` if never observed
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// `true` if observed
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }

    /// Borrow the payload
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        match self {
            Field::Absent => None,
            Field::Present(v) => Some(v),
        }
    }

    /// Overwrite unconditionally
    pub fn set(&mut self, value: T) {
        *self = Field::Present(value);
    }

    /// Assign only if never observed
    pub fn fill_if_absent(&mut self, value: T) {
        if self.is_absent() {
            *self = Field::Present(value);
        }
    }

    /// [`Field::fill_if_absent`] with an optional reading
    pub fn fill_with(&mut self, value: Option<T>) {
        if let Some(v) = value {
            self.fill_if_absent(v);
        }
    }

    /// Overwrite with `value` when it is `Some`; report whether it was
    pub fn update_with(&mut self, value: Option<T>) -> bool {
        match value {
            Some(v) => {
                self.set(v);
                true
            }
            None => false,
        }
    }
}

impl<T: Copy> Field<T> {
    /// Copy the payload out
    #[must_use]
    pub fn copied(&self) -> Option<T> {
        self.get().copied()
    }
}

impl<T: Blank> Field<T> {
    /// `true` if absent or present-but-blank
    #[must_use]
    pub fn is_open(&self) -> bool {
        match self {
            Field::Absent => true,
            Field::Present(v) => v.is_blank(),
        }
    }

    /// Fill-if-empty merge: assign when absent or blank, keep any real value
    pub fn fill(&mut self, value: T) {
        if self.is_open() {
            *self = Field::Present(value);
        }
    }
}

impl Field<String> {
    /// The payload, or `""` when absent
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.get().map_or("", String::as_str)
    }

    /// The payload when it is present and not blank
    #[must_use]
    pub fn non_blank(&self) -> Option<&str> {
        self.get().map(String::as_str).filter(|s| !s.trim().is_empty())
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Field::Absent, Field::Present)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Absent => serializer.serialize_none(),
            Field::Present(v) => serializer.serialize_some(v),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Field::from)
    }
}
