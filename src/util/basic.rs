// Convenience alias for simple string errors in internal helpers.
// Errors crossing the crate boundary use the typed enums in crate::errors.
pub type SError = String;
