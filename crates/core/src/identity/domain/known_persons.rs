use std::collections::BTreeMap;

pub type PersonId = String;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnownPerson {
    pub id: PersonId,
    pub name: String,
}

/// Host-owned mapping of person IDs to display names.
///
/// The pipeline only reads it; `add`/`remove` are exposed for host
/// configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownPersonsDirectory {
    persons: BTreeMap<PersonId, String>,
}

impl KnownPersonsDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or renames a person. Returns the previous name, if any.
    pub fn add(&mut self, id: impl Into<PersonId>, name: impl Into<String>) -> Option<String> {
        self.persons.insert(id.into(), name.into())
    }

    pub fn remove(&mut self, id: &str) -> Option<KnownPerson> {
        self.persons.remove_entry(id).map(|(id, name)| KnownPerson { id, name })
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.persons.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.persons.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn persons(&self) -> impl Iterator<Item = KnownPerson> + '_ {
        self.persons.iter().map(|(id, name)| KnownPerson {
            id: id.clone(),
            name: name.clone(),
        })
    }
}

impl FromIterator<(PersonId, String)> for KnownPersonsDirectory {
    fn from_iter<I: IntoIterator<Item = (PersonId, String)>>(iter: I) -> Self {
        Self {
            persons: iter.into_iter().collect(),
        }
    }
}
