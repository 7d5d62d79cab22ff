//! Domain models for the notes backend.
//!
//! # Core Concepts
//!
//! - [`Folder`]: A named grouping container. At least one always exists after
//!   startup; deleting one moves its notes to the oldest remaining folder.
//! - [`Note`]: The primary content entity. Owned by a folder (or orphaned when
//!   no folder is left to adopt it), holds rich text and an ordered file list.
//! - [`NoteFile`]: An attachment embedded in a note. It has no life outside
//!   its parent note and is never stored or queried on its own.

mod file;
mod folder;
mod note;

pub use file::*;
pub use folder::*;
pub use note::*;
