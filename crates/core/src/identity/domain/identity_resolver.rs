use crate::shared::observation::FaceObservation;

use super::known_persons::{KnownPersonsDirectory, PersonId};

/// Domain interface for mapping a face observation to a known person.
///
/// Implementations must be pure lookups. A miss is `None`, not an error,
/// so a real embedding matcher can replace the spatial heuristic without
/// touching callers.
pub trait IdentityResolver: Send + Sync {
    fn identify(
        &self,
        face: &FaceObservation,
        directory: &KnownPersonsDirectory,
    ) -> Option<PersonId>;
}
