use crate::domain::ChangeKey;

/// Whether `current` identifies content not yet delivered.
///
/// An empty key is never new, even before anything has been delivered.
pub fn is_new(current: &ChangeKey, last: &ChangeKey) -> bool {
    !current.is_empty() && current != last
}
