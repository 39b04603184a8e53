//! Constantes del motor de pipelines.

/// Mensaje usado por `assert_default` cuando el predicado devuelve `false`.
pub const DEFAULT_ASSERT_MESSAGE: &str = "Assertion failed";

/// Mensaje usado cuando un panic no trae payload legible (`&str`/`String`).
pub const UNKNOWN_PANIC_MESSAGE: &str = "step panicked with a non-string payload";
