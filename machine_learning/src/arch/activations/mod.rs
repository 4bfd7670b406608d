mod act_fn;
mod gelu;

pub use act_fn::ActFn;
pub use gelu::Gelu;
