//! Bot predicates - the identity facts injected into the brain.
//!
//! The set is closed: every predicate the templates may reference is a
//! variant of [`Predicate`], and [`PredicateSet`] carries one non-optional
//! value per variant. A bootstrap therefore cannot forget a key.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::IdentityConfig;
use crate::engine::MatchingEngine;
use crate::identity::DeviceIdentity;

/// Names of the bot predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    Name,
    Species,
    Genus,
    Family,
    Order,
    Class,
    Kingdom,
    Hometown,
    Botmaster,
    Master,
    Age,
}

impl Predicate {
    /// Every predicate, in the order they are applied
    pub const ALL: [Predicate; 11] = [
        Predicate::Name,
        Predicate::Species,
        Predicate::Genus,
        Predicate::Family,
        Predicate::Order,
        Predicate::Class,
        Predicate::Kingdom,
        Predicate::Hometown,
        Predicate::Botmaster,
        Predicate::Master,
        Predicate::Age,
    ];

    /// Key as referenced from templates (`<bot name="genus"/>`)
    pub fn key(&self) -> &'static str {
        match self {
            Predicate::Name => "name",
            Predicate::Species => "species",
            Predicate::Genus => "genus",
            Predicate::Family => "family",
            Predicate::Order => "order",
            Predicate::Class => "class",
            Predicate::Kingdom => "kingdom",
            Predicate::Hometown => "hometown",
            Predicate::Botmaster => "botmaster",
            Predicate::Master => "master",
            Predicate::Age => "age",
        }
    }

    pub fn from_key(key: &str) -> Option<Predicate> {
        Predicate::ALL
            .iter()
            .copied()
            .find(|p| p.key().eq_ignore_ascii_case(key))
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Values for every predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSet {
    pub name: String,
    pub species: String,
    pub genus: String,
    pub family: String,
    pub order: String,
    pub class: String,
    pub kingdom: String,
    pub hometown: String,
    pub botmaster: String,
    pub master: String,
    pub age: String,
}

impl PredicateSet {
    /// Device identity supplies name and species, config supplies the rest
    pub fn from_identity(device: &DeviceIdentity, config: &IdentityConfig) -> Self {
        Self {
            name: device.name.clone(),
            species: device.device_type.clone(),
            genus: config.genus.clone(),
            family: config.family.clone(),
            order: config.order.clone(),
            class: config.class.clone(),
            kingdom: config.kingdom.clone(),
            hometown: config.hometown.clone(),
            botmaster: config.botmaster.clone(),
            master: config.master.clone(),
            age: config.age.clone(),
        }
    }

    pub fn get(&self, predicate: Predicate) -> &str {
        match predicate {
            Predicate::Name => &self.name,
            Predicate::Species => &self.species,
            Predicate::Genus => &self.genus,
            Predicate::Family => &self.family,
            Predicate::Order => &self.order,
            Predicate::Class => &self.class,
            Predicate::Kingdom => &self.kingdom,
            Predicate::Hometown => &self.hometown,
            Predicate::Botmaster => &self.botmaster,
            Predicate::Master => &self.master,
            Predicate::Age => &self.age,
        }
    }

    /// (predicate, value) pairs in application order
    pub fn entries(&self) -> impl Iterator<Item = (Predicate, &str)> + '_ {
        Predicate::ALL.iter().map(move |p| (*p, self.get(*p)))
    }

    /// Push every predicate into the engine
    pub fn apply<E: MatchingEngine>(&self, engine: &mut E) {
        for (predicate, value) in self.entries() {
            debug!("Setting bot predicate {} = {:?}", predicate, value);
            engine.set_predicate(predicate, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PredicateSet {
        let device = DeviceIdentity {
            name: "Marvin".to_string(),
            device_type: "mark-1".to_string(),
        };
        PredicateSet::from_identity(&device, &IdentityConfig::default())
    }

    #[test]
    fn test_all_keys_unique() {
        let mut keys: Vec<&str> = Predicate::ALL.iter().map(|p| p.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Predicate::ALL.len());
    }

    #[test]
    fn test_from_key_roundtrip() {
        for p in Predicate::ALL {
            assert_eq!(Predicate::from_key(p.key()), Some(p));
        }
        assert_eq!(Predicate::from_key("GENUS"), Some(Predicate::Genus));
        assert_eq!(Predicate::from_key("favorite_color"), None);
    }

    #[test]
    fn test_identity_fills_name_and_species() {
        let set = sample();
        assert_eq!(set.get(Predicate::Name), "Marvin");
        assert_eq!(set.get(Predicate::Species), "mark-1");
        assert_eq!(set.get(Predicate::Genus), "Mycroft");
        assert_eq!(set.get(Predicate::Age), "2");
    }

    #[test]
    fn test_entries_cover_every_predicate() {
        let set = sample();
        assert_eq!(set.entries().count(), Predicate::ALL.len());
        assert!(set.entries().all(|(_, v)| !v.is_empty()));
    }
}
