//! Participant registry: maps a unique participant ID to a display name.
//!
//! Entries are created on first successful registration and are never
//! overwritten or removed for the lifetime of the event. A second
//! registration under an existing ID fails, whatever name it carries.

use std::collections::BTreeMap;

use buzzer_types::{Participant, ParticipantId};

use crate::RegistryError;

/// Maximum accepted length of a display name, in characters.
pub const MAX_NAME_LEN: usize = 80;

/// The set of registered participants.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    participants: BTreeMap<ParticipantId, Participant>,
}

impl Registry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            participants: BTreeMap::new(),
        }
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether no participant has registered yet.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Validate a registration without recording it.
    ///
    /// Returns the participant that [`register`](Self::register) would
    /// store. Whitespace around the ID and name is trimmed.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidId`] / [`RegistryError::InvalidName`] for
    /// malformed input, [`RegistryError::AlreadyRegistered`] if the ID is
    /// taken.
    pub fn check(&self, id: &str, name: &str) -> Result<Participant, RegistryError> {
        let participant = validate(id, name)?;
        if self.participants.contains_key(&participant.id) {
            return Err(RegistryError::AlreadyRegistered { id: participant.id });
        }
        Ok(participant)
    }

    /// Register a participant.
    ///
    /// # Errors
    ///
    /// See [`check`](Self::check). On error the registry is unchanged.
    pub fn register(&mut self, id: &str, name: &str) -> Result<Participant, RegistryError> {
        let participant = self.check(id, name)?;
        self.participants
            .insert(participant.id.clone(), participant.clone());
        Ok(participant)
    }

    /// Insert an already-validated participant, e.g. one loaded from
    /// storage. Existing entries win; the entry now held is returned.
    pub fn restore(&mut self, participant: Participant) -> &Participant {
        self.participants
            .entry(participant.id.clone())
            .or_insert(participant)
    }

    /// Look up a participant by ID.
    pub fn lookup(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// All participants as an ID-to-name mapping, ordered by ID.
    pub fn names(&self) -> BTreeMap<ParticipantId, String> {
        self.participants
            .values()
            .map(|p| (p.id.clone(), p.name.clone()))
            .collect()
    }
}

fn validate(id: &str, name: &str) -> Result<Participant, RegistryError> {
    let id = ParticipantId::parse(id).ok_or(RegistryError::InvalidId {
        reason: if id.trim().is_empty() {
            "id must not be empty"
        } else {
            "id is too long"
        },
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(RegistryError::InvalidName {
            reason: "name must not be empty",
        });
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RegistryError::InvalidName {
            reason: "name is too long",
        });
    }

    Ok(Participant {
        id,
        name: name.to_owned(),
    })
}
