//! Error taxonomy for graph construction.
//!
//! `InsufficientData` and `InsufficientLinks` are recoverable: the engine logs
//! them and substitutes an empty collection. Everything else refuses to build
//! state and is handed back to the caller.

/// Which end of a link referenced a missing node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEnd {
	/// The `source` field.
	Source,
	/// The `target` field.
	Target,
}

impl std::fmt::Display for LinkEnd {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			LinkEnd::Source => f.write_str("source"),
			LinkEnd::Target => f.write_str("target"),
		}
	}
}

/// Errors raised while validating and building graph state.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
	/// No nodes were supplied.
	#[error("you are passing invalid data to the graph: no nodes were provided")]
	InsufficientData,
	/// The link list was missing entirely.
	#[error("you are passing invalid data to the graph: no links were provided (not even an empty list)")]
	InsufficientLinks,
	/// A link points at a node id that does not exist.
	#[error("you provided an invalid links data structure: \"{id}\" is not a valid {end} node id")]
	InvalidLinks {
		/// The dangling node id.
		id: String,
		/// Which end of the link carried it.
		end: LinkEnd,
	},
	/// A link declared a weight that is not a number.
	#[error("links value must be a number, found in link with source \"{from}\" and target \"{to}\"")]
	InvalidLinkValue {
		/// Source id of the offending link.
		from: String,
		/// Target id of the offending link.
		to: String,
	},
	/// The graph was created without an identity.
	#[error("the graph was created without an id, an id is mandatory")]
	MissingIdentity,
	/// The supplied configuration could not be merged with the defaults.
	#[error("invalid graph configuration: {0}")]
	InvalidConfig(#[from] serde_json::Error),
}

/// Convenience alias used across the engine.
pub type Result<T> = std::result::Result<T, GraphError>;
