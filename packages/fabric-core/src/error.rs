//! Error types for the fabric's hash-function family.

/// Errors raised while resolving or configuring a named hash function.
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// A configured hash-function name does not match any known family.
    #[error("unknown hash function: {name}")]
    UnknownHashFunction {
        /// The offending configuration value.
        name: String,
    },
}
