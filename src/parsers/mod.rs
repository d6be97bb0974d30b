//! Coverage report formats. Only the LLVM JSON export is understood.
pub mod llvm;
