use serde::{Deserialize, Serialize};
use std::fmt;

/// How a [`Person`] relates to the filing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// The primary filer.
    #[serde(rename = "self")]
    Taxpayer,
    Spouse,
    Dependent,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Taxpayer => "taxpayer",
            Relation::Spouse => "spouse",
            Relation::Dependent => "dependent",
        })
    }
}

/// A participant of a return. People are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    name: String,
    relation: Relation,
}

impl Person {
    pub fn new(name: impl Into<String>, relation: Relation) -> Self {
        Self {
            name: name.into(),
            relation,
        }
    }

    pub fn taxpayer(name: impl Into<String>) -> Self {
        Self::new(name, Relation::Taxpayer)
    }

    pub fn spouse(name: impl Into<String>) -> Self {
        Self::new(name, Relation::Spouse)
    }

    pub fn dependent(name: impl Into<String>) -> Self {
        Self::new(name, Relation::Dependent)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }
}

/// Whom a form belongs to.
///
/// Used only by [`TaxReturn::find_forms`](crate::TaxReturn::find_forms) to decide whether a
/// form is visible for the people enrolled on the return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Applies to every filer.
    #[default]
    Everyone,
    /// Belongs to one person; visible only while that person is on the roster.
    Person(Person),
    /// Belongs to the filing unit as a whole; visible only when the return
    /// includes joint forms.
    Joint,
}

impl From<Person> for Owner {
    fn from(person: Person) -> Self {
        Owner::Person(person)
    }
}

impl From<Option<Person>> for Owner {
    fn from(person: Option<Person>) -> Self {
        person.map_or(Owner::Everyone, Owner::Person)
    }
}
