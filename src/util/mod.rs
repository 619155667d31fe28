//! Small cross-cutting helpers shared by the storage layers and the CLI.

pub mod fs;
