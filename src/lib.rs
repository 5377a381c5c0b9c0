pub mod compiler;
pub mod models;

pub use compiler::error::{CompileError, CompileErrorKind};
pub use compiler::compile_route;
pub use models::messages::{CompiledRoute, HopDraft, PoolDraft, RouteCompileRequest};
