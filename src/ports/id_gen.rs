//! ID generator port for producing unique identifiers.

/// Generates unique identifiers.
///
/// Run ids embed a random suffix from this port; substituting a
/// predictable sequence keeps renders reproducible under test.
pub trait IdGenerator: Send + Sync {
    /// Generates a new unique identifier string.
    fn generate_id(&self) -> String;
}
