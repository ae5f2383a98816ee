//! Utilidades del sistema
//!
//! Manejo de errores, JWT y helpers de texto.

pub mod errors;
pub mod jwt;
pub mod slug;
